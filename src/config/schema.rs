use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Panel configuration.
///
/// Example YAML:
/// ```yaml
/// profile: normalized
/// categories:
///   - { id: tenderness, name: Tenderness }
///   - { id: flavor, name: Flavor, max: 4 }
/// samples: ["Set A", "Set B"]
/// ledger:
///   path: /srv/tasting/ledger.csv
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Scale preset supplying default ranges and the total multiplier
    #[serde(default)]
    pub profile: Profile,

    /// Overrides the profile's per-category multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,

    pub categories: Vec<CategoryConfig>,

    pub samples: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger: Option<LedgerConfig>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// 0-10 per category, totals are raw sums of means
    #[default]
    Standard,
    /// 1-5 per category, each mean scaled by 5
    Normalized,
}

impl Profile {
    pub fn default_min(self) -> u32 {
        match self {
            Profile::Standard => 0,
            Profile::Normalized => 1,
        }
    }

    pub fn default_max(self) -> u32 {
        match self {
            Profile::Standard => 10,
            Profile::Normalized => 5,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Profile::Standard => 1.0,
            Profile::Normalized => 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl CategoryConfig {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            min: None,
            max: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// CSV ledger location (default: ~/.config/tasting-panel/ledger.csv)
    pub path: PathBuf,
}

impl Default for Config {
    /// The blind rib tasting panel: five rib sets, five 0-10 categories.
    fn default() -> Self {
        Self {
            profile: Profile::Standard,
            multiplier: None,
            categories: vec![
                CategoryConfig::new("tenderness", "Tenderness"),
                CategoryConfig::new("flavor", "Flavor"),
                CategoryConfig::new("sauce", "Sauce"),
                CategoryConfig::new("smoke", "Smoke/Char"),
                CategoryConfig::new("appearance", "Appearance"),
            ],
            samples: ["Set A", "Set B", "Set C", "Set D", "Set E"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ledger: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.profile, Profile::Standard);
        assert_eq!(config.categories.len(), 5);
        assert_eq!(config.categories[3].name, "Smoke/Char");
        assert_eq!(config.samples[0], "Set A");
        assert!(config.ledger.is_none());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: Config = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_normalized_profile_parse() {
        let yaml = r#"
profile: normalized
categories:
  - id: tenderness
    name: Tenderness
  - id: flavor
    name: Flavor
    max: 4
samples: ["Set A", "Set B"]
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.profile, Profile::Normalized);
        assert_eq!(config.categories[1].max, Some(4));
        assert!(config.categories[0].min.is_none());
        assert!(config.multiplier.is_none());
    }

    #[test]
    fn test_profile_defaults_to_standard() {
        let yaml = r#"
categories:
  - { id: a, name: A }
samples: ["S1"]
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.profile, Profile::Standard);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
categories: []
samples: []
colour: red
"#;
        assert!(serde_saphyr::from_str::<Config>(yaml).is_err());
    }

    #[test]
    fn test_profile_scales() {
        assert_eq!(Profile::Standard.default_min(), 0);
        assert_eq!(Profile::Standard.default_max(), 10);
        assert_eq!(Profile::Normalized.default_min(), 1);
        assert_eq!(Profile::Normalized.default_max(), 5);
        assert_eq!(Profile::Normalized.multiplier(), 5.0);
    }
}
