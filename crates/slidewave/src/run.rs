use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use renderer::{DemoMode, Renderer, RendererConfig};
use slideconfig::SliderConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{CheckArgs, RunArgs};
use crate::paths::{locate_config, ConfigOrigin};

struct LoadedConfig {
    config: SliderConfig,
    origin: ConfigOrigin,
}

impl LoadedConfig {
    /// Relative image paths resolve against the config file's directory.
    fn base_dir(&self) -> Option<PathBuf> {
        self.origin
            .path()
            .and_then(Path::parent)
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<LoadedConfig> {
    let origin = locate_config(explicit);
    let config = match origin.path() {
        Some(path) => SliderConfig::load(path)
            .with_context(|| format!("failed to load slider config {}", path.display()))?,
        None => SliderConfig::builtin(),
    };
    tracing::debug!(%origin, slides = config.slides.len(), "slider config loaded");
    Ok(LoadedConfig { config, origin })
}

pub fn run(args: RunArgs) -> Result<()> {
    let loaded = load_config(args.config.clone())?;
    let renderer_config = build_renderer_config(&args, &loaded);
    tracing::info!(
        config = %loaded.origin,
        slides = renderer_config.slides.len(),
        mode = ?renderer_config.mode,
        "starting slidewave"
    );
    let mut renderer = Renderer::new(renderer_config);
    renderer.run()
}

fn build_renderer_config(args: &RunArgs, loaded: &LoadedConfig) -> RendererConfig {
    let base_dir = loaded.base_dir();
    let config = &loaded.config;
    let defaults = RendererConfig::default();
    RendererConfig {
        surface_size: args.size.unwrap_or(defaults.surface_size),
        mode: if args.hover {
            DemoMode::Hover
        } else {
            DemoMode::Slider
        },
        slides: config.resolved_slides(base_dir.as_deref()),
        displacement: config.displacement_source(base_dir.as_deref()),
        transition_duration: config.transition.duration,
        hover_duration: config.hover.duration,
        intensity: args.intensity.unwrap_or(config.transition.intensity),
        hover_intensity: args.intensity.unwrap_or(config.hover.intensity),
        target_fps: args.fps.filter(|fps| *fps > 0.0),
        antialiasing: args.antialias,
        color_space: args.color_space,
    }
}

/// Validates the configuration and prints the resolved deck.
pub fn check(args: CheckArgs) -> Result<()> {
    let loaded = load_config(args.config)?;
    let base_dir = loaded.base_dir();
    let config = &loaded.config;

    println!("Config: {}", loaded.origin);
    println!(
        "Transition: {:?} (intensity {})",
        config.transition.duration, config.transition.intensity
    );
    println!(
        "Hover: {:?} (intensity {})",
        config.hover.duration, config.hover.intensity
    );
    match config.displacement_source(base_dir.as_deref()) {
        Some(source) => println!("Displacement: {source}"),
        None => println!("Displacement: (placeholder)"),
    }
    println!("Slides:");
    for (index, slide) in config.resolved_slides(base_dir.as_deref()).iter().enumerate() {
        println!(
            "  {index:>2}  strips={} lines={:?}  {}",
            slide.strips, slide.lines, slide.source
        );
    }
    Ok(())
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use renderer::Antialiasing;
    use slideconfig::AssetSource;

    use crate::cli::Cli;

    fn loaded(path: &str, toml: &str) -> LoadedConfig {
        LoadedConfig {
            config: SliderConfig::from_toml_str(toml).unwrap(),
            origin: ConfigOrigin::Explicit(PathBuf::from(path)),
        }
    }

    const DECK: &str = r#"
version = 1
displacement = "disp.png"

[transition]
duration = "1s"
intensity = 0.4

[[slides]]
image = "one.jpg"
lines = ["a", "b"]

[[slides]]
image = "https://example.com/two.jpg"
strips = 2
"#;

    #[test]
    fn relative_sources_follow_config_dir() {
        let loaded = loaded("/decks/demo/slider.toml", DECK);
        let args = Cli::try_parse_from(["slidewave", "/decks/demo/slider.toml"])
            .unwrap()
            .run;
        let config = build_renderer_config(&args, &loaded);
        assert_eq!(config.mode, DemoMode::Slider);
        assert_eq!(
            config.slides[0].source,
            AssetSource::Path(PathBuf::from("/decks/demo/one.jpg"))
        );
        assert_eq!(
            config.slides[1].source,
            AssetSource::Url("https://example.com/two.jpg".into())
        );
        assert_eq!(
            config.displacement,
            Some(AssetSource::Path(PathBuf::from("/decks/demo/disp.png")))
        );
        assert_eq!(config.intensity, 0.4);
        assert_eq!(config.transition_duration.as_secs(), 1);
    }

    #[test]
    fn bare_file_name_has_no_base_dir() {
        assert_eq!(loaded("slider.toml", DECK).base_dir(), None);
    }

    #[test]
    fn cli_flags_override_config() {
        let loaded = loaded("deck.toml", DECK);
        let args = Cli::try_parse_from([
            "slidewave",
            "deck.toml",
            "--hover",
            "--intensity",
            "2",
            "--fps",
            "0",
            "--antialias",
            "8",
        ])
        .unwrap()
        .run;
        let config = build_renderer_config(&args, &loaded);
        assert_eq!(config.mode, DemoMode::Hover);
        assert_eq!(config.intensity, 2.0);
        assert_eq!(config.hover_intensity, 2.0);
        assert_eq!(config.target_fps, None);
        assert_eq!(config.antialiasing, Antialiasing::Samples(8));
        assert_eq!(config.surface_size, RendererConfig::default().surface_size);
    }
}
