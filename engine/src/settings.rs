use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use timeguard_shared::config::{INTERVAL_CLASS, QUERY_METHOD};

/// User-tunable knobs of a verification run
#[derive(Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
#[serde(default)]
pub struct Settings {
    /// class whose objects are tracked as intervals
    pub interval_class: String,
    /// method of the interval class that queries a time point
    pub query_method: String,
    /// treat a query whose receiver resolves to no initializer as vacuously safe
    pub allow_unresolved_receivers: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_class: INTERVAL_CLASS.to_string(),
            query_method: QUERY_METHOD.to_string(),
            allow_unresolved_receivers: false,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, missing fields take their defaults
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EngineError::LoadingError(format!("unable to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            EngineError::LoadingError(format!("invalid settings in {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"query_method": "at"}}"#).unwrap();
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.query_method, "at");
        assert_eq!(settings.interval_class, Settings::default().interval_class);
        assert!(!settings.allow_unresolved_receivers);
    }

    #[test]
    fn malformed_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2").unwrap();
        assert!(matches!(
            Settings::load(file.path()),
            Err(EngineError::LoadingError(_))
        ));
    }
}
