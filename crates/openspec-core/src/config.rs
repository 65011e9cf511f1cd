use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ValidationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Treat warnings as failures by default.
    #[serde(default)]
    pub strict: bool,
}

// ---------------------------------------------------------------------------
// ArchiveConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Validate rebuilt specs before writing them.
    #[serde(default = "default_archive_validate")]
    pub validate: bool,
    /// Move the change into the archive without touching specs.
    #[serde(default)]
    pub skip_specs: bool,
}

fn default_archive_validate() -> bool {
    true
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            validate: default_archive_validate(),
            skip_specs: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            validation: ValidationConfig::default(),
            archive: ArchiveConfig::default(),
        }
    }
}

impl Config {
    /// Load `openspec/config.yaml`. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let Some(data) = crate::io::read_optional(&path)? else {
            return Ok(Self::default());
        };
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        if self.version != CONFIG_VERSION {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "unsupported config version {} (expected {CONFIG_VERSION})",
                    self.version
                ),
            });
        }
        if self.archive.skip_specs && !self.archive.validate {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "archive.validate has no effect when archive.skip_specs is set"
                    .to_string(),
            });
        }
        warnings
    }
}
