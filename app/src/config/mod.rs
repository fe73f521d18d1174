use std::{fs, path::PathBuf};

use error_stack::{Report, Result, ResultExt};
use serde::Deserialize;

mod classifier;
mod server;
mod source;

pub use classifier::ClassifierConfig;
pub use server::{ServerConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TICK_MS};
pub use source::{SourceConfig, DEFAULT_MIN_DETECTION_CONFIDENCE, DEFAULT_SOCKET};

use crate::GError;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub classifier: ClassifierConfig,
    pub source: SourceConfig,
}

impl Config {
    pub fn open(path: PathBuf) -> Result<Self, GError> {
        Self::parse(
            &fs::read_to_string(&path)
                .change_context(GError::ConfigError)
                .attach_printable("Couldn't read the config file")
                .attach_printable_lazy(|| format!("path: {}", path.display()))?,
        )
    }

    /// Falls back to the defaults when no config file is given.
    pub fn open_or_default(path: Option<PathBuf>) -> Result<Self, GError> {
        match path {
            Some(path) => Self::open(path),
            None => Ok(Self::default()),
        }
    }

    pub fn parse(config_toml: &str) -> Result<Self, GError> {
        let config: Config = toml::from_str(config_toml).change_context(GError::ConfigError)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GError> {
        if self.server.tick_ms == 0 {
            return Err(GError::ConfigError).attach_printable("server.tick_ms must be positive");
        }

        for (name, threshold) in [
            ("classifier.thumb_threshold", self.classifier.thumb_threshold),
            ("classifier.finger_threshold", self.classifier.finger_threshold),
        ] {
            if !(threshold > 0.0 && threshold <= 180.0) {
                return Err(GError::ConfigError)
                    .attach_printable(format!("{name} must be within (0, 180], got {threshold}"));
            }
        }

        Ok(())
    }
}

impl TryFrom<PathBuf> for Config {
    type Error = Report<GError>;

    fn try_from(value: PathBuf) -> std::result::Result<Self, Self::Error> {
        Self::open(value)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn parse_config() {
        let config_toml = r#"
        [server]
        host = "0.0.0.0"
        port = 4040
        tick_ms = 50

        [classifier]
        thumb_threshold = 145.0
        finger_threshold = 165.0

        [source]
        socket = "/tmp/mediapipe.sock"
        min_detection_confidence = 0.5"#;

        let config = Config::parse(config_toml).unwrap();

        assert_eq!(config.server.addr(), "0.0.0.0:4040");
        assert_eq!(config.server.tick().as_millis(), 50);
        assert_eq!(config.classifier.thumb_threshold, 145.0);
        assert_eq!(config.classifier.finger_threshold, 165.0);
        assert_eq!(config.source.socket, PathBuf::from("/tmp/mediapipe.sock"));
        assert_eq!(config.source.min_detection_confidence, 0.5);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = Config::parse("[server]\nport = 9000").unwrap();

        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.tick_ms, DEFAULT_TICK_MS);
        assert_eq!(config.classifier, ClassifierConfig::default());
        assert_eq!(config.source, SourceConfig::default());
    }

    #[test]
    fn rejects_zero_tick() {
        assert!(Config::parse("[server]\ntick_ms = 0").is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        assert!(Config::parse("[classifier]\nfinger_threshold = 200.0").is_err());
        assert!(Config::parse("[classifier]\nthumb_threshold = 0.0").is_err());
    }

    #[test]
    fn opens_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[server]\nport = 7000\n").unwrap();

        let config = Config::try_from(file.path().to_path_buf()).unwrap();
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = Config::open(PathBuf::from("/nonexistent/gesture-cast.toml")).unwrap_err();
        assert!(matches!(err.current_context(), GError::ConfigError));
    }
}
