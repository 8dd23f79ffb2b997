//! Configuration system

pub use serde::{Deserialize, Serialize};

use crate::collision::COLLISIONS_EPSILON;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Tunables for the collision subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Push-out distance applied along the slide plane normal
    pub collisions_epsilon: f32,

    /// Retry budget used when the caller does not pick one
    pub default_retry_count: u32,

    /// Resolve queries on a background thread instead of inline
    pub use_worker: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            collisions_epsilon: COLLISIONS_EPSILON,
            default_retry_count: 3,
            use_worker: false,
        }
    }
}

impl Config for CollisionConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let config = CollisionConfig::default();

        assert_eq!(config.collisions_epsilon, COLLISIONS_EPSILON);
        assert_eq!(config.default_retry_count, 3);
        assert!(!config.use_worker);
    }

    #[test]
    fn toml_round_trip() {
        let path = std::env::temp_dir().join(format!("collision_config_{}.toml", std::process::id()));
        let path = path.to_string_lossy().into_owned();

        let config = CollisionConfig {
            collisions_epsilon: 0.002,
            default_retry_count: 5,
            use_worker: true,
        };
        config.save_to_file(&path).unwrap();
        let loaded = CollisionConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn ron_round_trip() {
        let path = std::env::temp_dir().join(format!("collision_config_{}.ron", std::process::id()));
        let path = path.to_string_lossy().into_owned();

        let config = CollisionConfig {
            default_retry_count: 8,
            ..Default::default()
        };
        config.save_to_file(&path).unwrap();
        let loaded = CollisionConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let config = CollisionConfig::default();
        let result = config.save_to_file("collision.yaml");

        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
