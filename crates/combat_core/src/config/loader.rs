use std::fs;
use std::path::Path;

use tracing::info;

use super::types::{ConfigError, SessionConfig};

pub fn load_session_config(path: &Path) -> Result<SessionConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_session_config(&raw)?;
    info!(
        path = %path.display(),
        seed = config.seed,
        weapons = config.weapons.len(),
        obstacles = config.arena.obstacles.len(),
        "session_config_loaded"
    );
    Ok(config)
}

/// Parses and validates a session config; missing sections take their defaults.
pub fn parse_session_config(raw: &str) -> Result<SessionConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let config = match serde_path_to_error::deserialize::<_, SessionConfig>(&mut deserializer) {
        Ok(config) => config,
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            let path = if path.is_empty() { ".".to_string() } else { path };
            return Err(ConfigError::Parse {
                path,
                message: source.to_string(),
            });
        }
    };
    config.validate()?;
    Ok(config)
}
