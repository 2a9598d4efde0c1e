//! INI file configuration adapter.

use crate::domain::error::ScalpcheckError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

/// Section and key names are case-insensitive; values are trimmed and an
/// empty value reads as absent.
#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScalpcheckError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config
            .load(path)
            .map_err(|reason| ScalpcheckError::ConfigParse {
                file: path.display().to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, ScalpcheckError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| ScalpcheckError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    fn value(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.value(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.value(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.value(section, key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
