use std::path::PathBuf;

use clap::{Parser, Subcommand};
use renderer::{Antialiasing, ColorSpaceMode};

use crate::paths::ENV_CONFIG;

#[derive(Parser, Debug)]
#[command(
    name = "slidewave",
    author,
    version,
    about = "Image slider with a displacement-map transition",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Slider configuration (TOML). Falls back to the user config dir, then
    /// the built-in deck.
    #[arg(value_name = "CONFIG", env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Run the hover demo: the first two slides blend while the pointer is
    /// over the centred plane.
    #[arg(long)]
    pub hover: bool,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_dimensions)]
    pub size: Option<(u32, u32)>,

    /// Anti-aliasing policy: `auto`, `off`, or an MSAA sample count (2, 4, 8, 16).
    /// Counts the GPU cannot do fall back to the largest supported one.
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_antialias,
        default_value = "auto"
    )]
    pub antialias: Antialiasing,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_color_space,
        default_value = "auto"
    )]
    pub color_space: ColorSpaceMode,

    /// Optional FPS cap while animating (0=uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Override the displacement intensity from the config.
    #[arg(long, value_name = "X", value_parser = parse_intensity)]
    pub intensity: Option<f32>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a configuration and print the resolved slide deck.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    #[arg(value_name = "CONFIG", env = ENV_CONFIG)]
    pub config: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

/// MSAA sample counts accepted on the command line. The GPU may support
/// fewer; the renderer then falls back to the largest supported count below.
const MSAA_SAMPLE_COUNTS: [u32; 4] = [2, 4, 8, 16];

pub fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "" => Err("anti-alias mode must not be empty".to_string()),
        "auto" | "max" | "default" => Ok(Antialiasing::Auto),
        "off" | "none" | "disable" | "disabled" => Ok(Antialiasing::Off),
        count => match count.parse::<u32>() {
            Ok(0 | 1) => Ok(Antialiasing::Off),
            Ok(samples) if MSAA_SAMPLE_COUNTS.contains(&samples) => {
                Ok(Antialiasing::Samples(samples))
            }
            Ok(samples) => Err(format!(
                "unsupported sample count {samples}; request 2, 4, 8 or 16 \
                 (lowered to what the GPU supports)"
            )),
            Err(_) => Err(format!(
                "invalid anti-alias mode '{}'; use auto, off or a sample count",
                value.trim()
            )),
        },
    }
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceMode, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("color space must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "auto" => Ok(ColorSpaceMode::Auto),
        "gamma" => Ok(ColorSpaceMode::Gamma),
        "linear" | "srgb" => Ok(ColorSpaceMode::Linear),
        other => Err(format!(
            "unknown color space '{other}'; expected auto, gamma, or linear"
        )),
    }
}

pub fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WxH format, e.g. 1920x1080".to_string())?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{width}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{height}'"))?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".to_string());
    }
    Ok((width, height))
}

pub fn parse_intensity(value: &str) -> Result<f32, String> {
    let intensity: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid intensity '{value}'"))?;
    if !intensity.is_finite() || intensity < 0.0 {
        return Err("intensity must be a finite number >= 0".to_string());
    }
    Ok(intensity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_antialias_variants() {
        assert_eq!(parse_antialias("auto").unwrap(), Antialiasing::Auto);
        assert_eq!(parse_antialias(" OFF ").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("1").unwrap(), Antialiasing::Off);
        assert_eq!(parse_antialias("4").unwrap(), Antialiasing::Samples(4));
        assert!(parse_antialias("3").is_err());
        assert!(parse_antialias("lots").is_err());
        assert!(parse_antialias("").is_err());
    }

    #[test]
    fn unsupported_sample_count_mentions_gpu_fallback() {
        let err = parse_antialias("32").unwrap_err();
        assert!(err.contains("2, 4, 8 or 16"), "{err}");
        assert!(err.contains("GPU supports"), "{err}");
    }

    #[test]
    fn parses_color_space_variants() {
        assert_eq!(parse_color_space("auto").unwrap(), ColorSpaceMode::Auto);
        assert_eq!(parse_color_space("Gamma").unwrap(), ColorSpaceMode::Gamma);
        assert_eq!(parse_color_space("srgb").unwrap(), ColorSpaceMode::Linear);
        assert!(parse_color_space("hdr").is_err());
    }

    #[test]
    fn parses_dimensions() {
        assert_eq!(parse_dimensions("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_dimensions(" 800 X 600 ").unwrap(), (800, 600));
        assert!(parse_dimensions("1280").is_err());
        assert!(parse_dimensions("0x720").is_err());
        assert!(parse_dimensions("widexhigh").is_err());
    }

    #[test]
    fn rejects_negative_intensity() {
        assert_eq!(parse_intensity("0.5").unwrap(), 0.5);
        assert!(parse_intensity("-1").is_err());
        assert!(parse_intensity("nan").is_err());
    }

    #[test]
    fn check_subcommand_takes_optional_config() {
        let cli = Cli::try_parse_from(["slidewave", "check", "deck.toml"]).unwrap();
        match cli.command {
            Some(Command::Check(args)) => {
                assert_eq!(args.config, Some(PathBuf::from("deck.toml")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "slidewave",
            "--hover",
            "--size",
            "640x480",
            "--antialias",
            "off",
            "--fps",
            "30",
        ])
        .unwrap();
        assert!(cli.command.is_none());
        assert!(cli.run.hover);
        assert_eq!(cli.run.size, Some((640, 480)));
        assert_eq!(cli.run.antialias, Antialiasing::Off);
        assert_eq!(cli.run.fps, Some(30.0));
    }
}
