//! Engine configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KindredError, Result};
use crate::index::CollectionSettings;
use crate::query::Fuzziness;
use crate::schema::Dynamic;

/// Configuration of an [`Engine`](crate::engine::Engine).
///
/// Can be read from a JSON file; every key is optional.
///
/// ```
/// use kindred::engine::EngineConfig;
/// use kindred::schema::Dynamic;
///
/// let config = EngineConfig::builder()
///     .default_dynamic(Dynamic::Strict)
///     .parallel_threshold(64)
///     .build()
///     .unwrap();
///
/// assert!(config.data_dir.is_none());
/// assert_eq!(config.parallel_threshold, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory collections are persisted in; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    /// Whether commits sync their files to the device.
    pub sync_writes: bool,
    /// Dynamic policy of mappings that do not set one.
    pub default_dynamic: Dynamic,
    /// Candidate count from which searches evaluate documents in parallel.
    pub parallel_threshold: usize,
    /// Fuzziness of DSL fuzzy queries that do not set one.
    pub default_fuzziness: Fuzziness,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            data_dir: None,
            sync_writes: true,
            default_dynamic: Dynamic::True,
            parallel_threshold: 1024,
            default_fuzziness: Fuzziness::Auto,
        }
    }
}

impl EngineConfig {
    /// Create a builder starting from the defaults.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Read a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            KindredError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: EngineConfig = serde_json::from_str(&content).map_err(|e| {
            KindredError::configuration(format!("invalid config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.parallel_threshold == 0 {
            return Err(KindredError::configuration(
                "parallel_threshold must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Get the settings collections of this engine inherit.
    pub fn collection_settings(&self) -> CollectionSettings {
        CollectionSettings {
            default_dynamic: self.default_dynamic,
            parallel_threshold: self.parallel_threshold,
        }
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Persist collections under a directory.
    pub fn data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.data_dir = Some(dir.into());
        self
    }

    /// Set whether commits sync their files.
    pub fn sync_writes(mut self, sync: bool) -> Self {
        self.config.sync_writes = sync;
        self
    }

    /// Set the default dynamic policy.
    pub fn default_dynamic(mut self, dynamic: Dynamic) -> Self {
        self.config.default_dynamic = dynamic;
        self
    }

    /// Set the parallel evaluation threshold.
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.config.parallel_threshold = threshold;
        self
    }

    /// Set the default fuzziness of DSL fuzzy queries.
    pub fn default_fuzziness(mut self, fuzziness: Fuzziness) -> Self {
        self.config.default_fuzziness = fuzziness;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.data_dir.is_none());
        assert!(config.sync_writes);
        assert_eq!(config.default_dynamic, Dynamic::True);
        assert_eq!(config.default_fuzziness, Fuzziness::Auto);
    }

    #[test]
    fn test_builder_rejects_zero_threshold() {
        assert!(EngineConfig::builder().parallel_threshold(0).build().is_err());
    }

    #[test]
    fn test_from_file_partial() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kindred.json");
        fs::write(&path, r#"{"default_dynamic": "strict", "parallel_threshold": 8}"#).unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.default_dynamic, Dynamic::Strict);
        assert_eq!(config.parallel_threshold, 8);
        assert!(config.sync_writes);

        fs::write(&path, "{").unwrap();
        assert!(EngineConfig::from_file(&path).is_err());
    }
}
