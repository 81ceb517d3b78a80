use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Slides used when no config file is found: image plus caption lines.
const BUILTIN_SLIDES: [(&str, [&str; 2]); 3] = [
    (
        "https://images.pexels.com/photos/2387793/pexels-photo-2387793.jpeg",
        ["Evening", "tide"],
    ),
    (
        "https://images.pexels.com/photos/31979794/pexels-photo-31979794.jpeg",
        ["Quiet", "ridge"],
    ),
    (
        "https://images.pexels.com/photos/18263146/pexels-photo-18263146.jpeg",
        ["Open", "field"],
    ),
];

const BUILTIN_DISPLACEMENT: &str = "displacement-textures/disp1.jpg";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SliderConfig {
    pub version: u32,
    #[serde(default)]
    pub displacement: Option<String>,
    #[serde(default)]
    pub transition: TransitionSettings,
    #[serde(default)]
    pub hover: HoverSettings,
    #[serde(default)]
    pub slides: Vec<SlideEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransitionSettings {
    #[serde(
        default = "default_transition_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub duration: Duration,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            duration: default_transition_duration(),
            intensity: default_intensity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HoverSettings {
    #[serde(
        default = "default_hover_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub duration: Duration,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

impl Default for HoverSettings {
    fn default() -> Self {
        Self {
            duration: default_hover_duration(),
            intensity: default_intensity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlideEntry {
    pub image: String,
    #[serde(default = "default_strips")]
    pub strips: u32,
    #[serde(default)]
    pub lines: Vec<String>,
}

/// Where an image should be fetched from once relative paths are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    Path(PathBuf),
    Url(String),
}

impl AssetSource {
    /// Classifies `raw` as a URL or a filesystem path relative to `base_dir`.
    pub fn resolve(raw: &str, base_dir: Option<&Path>) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return AssetSource::Url(trimmed.to_string());
        }
        let path = PathBuf::from(trimmed);
        match base_dir {
            Some(base) if path.is_relative() => AssetSource::Path(base.join(path)),
            _ => AssetSource::Path(path),
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::Path(path) => write!(f, "{}", path.display()),
            AssetSource::Url(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSlide {
    pub source: AssetSource,
    pub strips: usize,
    pub lines: Vec<String>,
}

fn default_transition_duration() -> Duration {
    Duration::from_secs_f32(2.5)
}

fn default_hover_duration() -> Duration {
    Duration::from_millis(500)
}

fn default_intensity() -> f32 {
    1.0
}

fn default_strips() -> u32 {
    1
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl SliderConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SliderConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Three-slide deck of remote images.
    pub fn builtin() -> Self {
        Self {
            version: 1,
            displacement: Some(BUILTIN_DISPLACEMENT.to_string()),
            transition: TransitionSettings::default(),
            hover: HoverSettings::default(),
            slides: BUILTIN_SLIDES
                .iter()
                .map(|(image, lines)| SlideEntry {
                    image: (*image).to_string(),
                    strips: default_strips(),
                    lines: lines.iter().map(|line| (*line).to_string()).collect(),
                })
                .collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.slides.is_empty() {
            return Err(ConfigError::Invalid(
                "config must define at least one slide".into(),
            ));
        }

        for (index, slide) in self.slides.iter().enumerate() {
            if slide.image.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "slide {index} has an empty image source"
                )));
            }
            if slide.strips == 0 {
                return Err(ConfigError::Invalid(format!(
                    "slide {index} must have at least one image strip"
                )));
            }
        }

        if let Some(displacement) = &self.displacement {
            if displacement.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "displacement texture source may not be empty".into(),
                ));
            }
        }

        if self.transition.duration.is_zero() {
            return Err(ConfigError::Invalid(
                "transition.duration must be greater than zero".into(),
            ));
        }
        if self.hover.duration.is_zero() {
            return Err(ConfigError::Invalid(
                "hover.duration must be greater than zero".into(),
            ));
        }

        for (name, intensity) in [
            ("transition.intensity", self.transition.intensity),
            ("hover.intensity", self.hover.intensity),
        ] {
            if !intensity.is_finite() || intensity < 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be >= 0")));
            }
        }

        Ok(())
    }

    /// Resolves every slide source relative to the directory holding the config.
    pub fn resolved_slides(&self, base_dir: Option<&Path>) -> Vec<ResolvedSlide> {
        self.slides
            .iter()
            .map(|slide| ResolvedSlide {
                source: AssetSource::resolve(&slide.image, base_dir),
                strips: slide.strips as usize,
                lines: slide.lines.clone(),
            })
            .collect()
    }

    pub fn displacement_source(&self, base_dir: Option<&Path>) -> Option<AssetSource> {
        self.displacement
            .as_deref()
            .map(|raw| AssetSource::resolve(raw, base_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1
displacement = "textures/disp1.jpg"

[transition]
duration = "3s"
intensity = 0.6

[hover]
duration = 0.25

[[slides]]
image = "https://images.pexels.com/photos/2387793/pexels-photo-2387793.jpeg"
strips = 3
lines = ["Evening", "tide"]

[[slides]]
image = "images/dunes.jpg"
"#;

    #[test]
    fn parses_sample_config() {
        let config = SliderConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.version, 1);
        assert_eq!(config.slides.len(), 2);
        assert_eq!(config.transition.duration, Duration::from_secs(3));
        assert!((config.transition.intensity - 0.6).abs() < 1e-6);
        assert_eq!(config.hover.duration, Duration::from_millis(250));
        assert!((config.hover.intensity - 1.0).abs() < 1e-6);
        assert_eq!(config.slides[0].strips, 3);
        assert_eq!(config.slides[1].strips, 1);
        assert!(config.slides[1].lines.is_empty());
    }

    #[test]
    fn omitted_sections_use_default_timings() {
        let config = SliderConfig::from_toml_str(
            r#"
version = 1

[[slides]]
image = "a.jpg"
"#,
        )
        .unwrap();
        assert_eq!(config.transition.duration, Duration::from_millis(2500));
        assert_eq!(config.hover.duration, Duration::from_millis(500));
        assert!(config.displacement.is_none());
    }

    #[test]
    fn rejects_empty_deck() {
        let err = SliderConfig::from_toml_str("version = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_version() {
        let err = SliderConfig::from_toml_str(
            r#"
version = 2

[[slides]]
image = "a.jpg"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_strips_and_zero_duration() {
        let strips = SliderConfig::from_toml_str(
            r#"
version = 1

[[slides]]
image = "a.jpg"
strips = 0
"#,
        )
        .unwrap_err();
        assert!(matches!(strips, ConfigError::Invalid(_)));

        let duration = SliderConfig::from_toml_str(
            r#"
version = 1

[transition]
duration = 0

[[slides]]
image = "a.jpg"
"#,
        )
        .unwrap_err();
        assert!(matches!(duration, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_negative_intensity() {
        let err = SliderConfig::from_toml_str(
            r#"
version = 1

[hover]
intensity = -1.0

[[slides]]
image = "a.jpg"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn resolves_relative_paths_against_base() {
        let config = SliderConfig::from_toml_str(SAMPLE).unwrap();
        let base = Path::new("/srv/slides");
        let slides = config.resolved_slides(Some(base));
        assert!(matches!(slides[0].source, AssetSource::Url(_)));
        assert_eq!(
            slides[1].source,
            AssetSource::Path(PathBuf::from("/srv/slides/images/dunes.jpg"))
        );
        assert_eq!(
            config.displacement_source(Some(base)),
            Some(AssetSource::Path(PathBuf::from(
                "/srv/slides/textures/disp1.jpg"
            )))
        );
    }

    #[test]
    fn rejects_unrepresentable_durations() {
        for (section, value) in [("transition", "inf"), ("hover", "1e30")] {
            let input = format!(
                "version = 1\n[{section}]\nduration = {value}\n[[slides]]\nimage = \"a.jpg\"\n"
            );
            let err = SliderConfig::from_toml_str(&input).unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)), "{section} = {value}: {err}");
        }
    }

    #[test]
    fn builtin_deck_is_valid() {
        let config = SliderConfig::builtin();
        config.validate().expect("builtin config validates");
        assert_eq!(config.slides.len(), 3);
    }
}
