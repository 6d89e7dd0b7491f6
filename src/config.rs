use crate::error::ConfigError;
use crate::validation::{MAX_TTL, is_valid_zone_fqdn};
use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tool configuration: where the zone data lives and which zones are managed
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Directory holding the YAML zone data
    pub zone_data_directory: PathBuf,

    /// Defaults applied to managed zones without their own settings
    pub defaults: ManagedZoneDefaults,

    /// Zones the tools operate on
    #[serde(default)]
    pub managed_zones: Vec<ManagedZone>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagedZoneDefaults {
    /// Default TTL for records that do not set one
    pub ttl: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagedZone {
    pub fqdn: String,

    /// Zero or absent means "use the default TTL"
    #[serde(default)]
    pub ttl: i64,
}

impl ManagedZone {
    /// The zone's default TTL. Only meaningful after validation.
    pub fn default_ttl(&self) -> u32 {
        u32::try_from(self.ttl).unwrap_or_default()
    }
}

impl ToolConfig {
    /// Read and validate a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Reading configuration from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML content.
    ///
    /// Managed zones without a TTL inherit the default one.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: ToolConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        check_ttl("defaults", self.defaults.ttl)?;

        let mut seen = FxHashSet::default();
        for zone in &mut self.managed_zones {
            if zone.ttl == 0 {
                zone.ttl = self.defaults.ttl;
            }
            if !is_valid_zone_fqdn(&zone.fqdn) {
                return Err(ConfigError::InvalidFqdn(zone.fqdn.clone()));
            }
            check_ttl(&format!("managed zone {}", zone.fqdn), zone.ttl)?;
            if !seen.insert(zone.fqdn.to_ascii_lowercase()) {
                return Err(ConfigError::DuplicateZone(zone.fqdn.clone()));
            }
        }
        Ok(())
    }

    /// Default TTL from the `[defaults]` section
    pub fn default_ttl(&self) -> u32 {
        u32::try_from(self.defaults.ttl).unwrap_or_default()
    }

    /// The managed zone for exactly `fqdn`, if configured
    pub fn managed_zone(&self, fqdn: &str) -> Option<&ManagedZone> {
        self.managed_zones
            .iter()
            .find(|zone| zone.fqdn.eq_ignore_ascii_case(fqdn))
    }

    /// Default TTL to use when querying `fqdn`: the TTL of the closest
    /// enclosing managed zone, or the global default.
    pub fn ttl_for(&self, fqdn: &str) -> u32 {
        let fqdn = fqdn.to_ascii_lowercase();
        self.managed_zones
            .iter()
            .filter(|zone| {
                let apex = zone.fqdn.to_ascii_lowercase();
                fqdn == apex || fqdn.ends_with(&format!(".{}", apex))
            })
            .max_by_key(|zone| zone.fqdn.len())
            .map(ManagedZone::default_ttl)
            .unwrap_or_else(|| self.default_ttl())
    }
}

/// Configured TTLs are defaults themselves, so zero is not allowed here
fn check_ttl(context: &str, ttl: i64) -> Result<(), ConfigError> {
    if ttl <= 0 || ttl > MAX_TTL {
        return Err(ConfigError::InvalidTtl {
            context: context.to_string(),
            ttl,
        });
    }
    Ok(())
}
