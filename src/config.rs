use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Result, ZoneCraftError};
use crate::zone::directory;

/// Runtime configuration, populated from the environment with sane defaults.
#[derive(Debug, Clone)]
pub struct ZoneConfig {
    /// Folder holding the managed zone files
    pub zone_dir: PathBuf,
    /// TTL applied when a record is created without one
    pub default_ttl: u32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            zone_dir: PathBuf::from("./zones"),
            default_ttl: 3600,
        }
    }
}

impl ZoneConfig {
    /// Build configuration from `ZONECRAFT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = env::var("ZONECRAFT_ZONE_DIR") {
            config.zone_dir = PathBuf::from(dir);
        }
        if let Ok(ttl) = env::var("ZONECRAFT_DEFAULT_TTL") {
            config.default_ttl = ttl.parse().map_err(|_| {
                ZoneCraftError::Config(format!("invalid ZONECRAFT_DEFAULT_TTL: '{ttl}'"))
            })?;
        }

        Ok(config)
    }

    pub fn with_zone_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.zone_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Backing file path for a zone origin.
    pub fn zone_file_path(&self, origin: &str) -> PathBuf {
        directory::zone_file_path(&self.zone_dir, origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ZoneConfig::default();
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.zone_dir, PathBuf::from("./zones"));
    }

    #[test]
    fn test_zone_file_path_uses_origin_naming() {
        let config = ZoneConfig::default().with_zone_dir("/var/zones");
        assert_eq!(
            config.zone_file_path("example.com."),
            PathBuf::from("/var/zones/example.com.zone")
        );
    }
}
