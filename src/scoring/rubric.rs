use crate::config::{validate_config, Config};
use crate::error::ValidationError;

/// One rated attribute with its inclusive score range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub min: u32,
    pub max: u32,
}

impl Category {
    /// Check `value` against the range, returning it narrowed to `u32`.
    pub fn check(&self, value: i64) -> Result<u32, ValidationError> {
        if value < i64::from(self.min) || value > i64::from(self.max) {
            return Err(ValidationError::OutOfRange {
                category: self.id.clone(),
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(value as u32)
    }
}

/// The fixed axes of a tasting run: ordered categories, ordered samples and
/// the multiplier applied to each category mean when totalling.
///
/// Built once from a validated [`Config`] and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Rubric {
    categories: Vec<Category>,
    samples: Vec<String>,
    multiplier: f64,
}

impl Rubric {
    pub fn from_config(config: &Config) -> Result<Self, Vec<String>> {
        validate_config(config)?;

        let categories = config
            .categories
            .iter()
            .map(|c| Category {
                id: c.id.clone(),
                name: c.name.clone(),
                min: c.min.unwrap_or(config.profile.default_min()),
                max: c.max.unwrap_or(config.profile.default_max()),
            })
            .collect();

        Ok(Self {
            categories,
            samples: config.samples.clone(),
            multiplier: config.multiplier.unwrap_or(config.profile.multiplier()),
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn sample_index(&self, label: &str) -> Result<usize, ValidationError> {
        self.samples
            .iter()
            .position(|s| s == label)
            .ok_or_else(|| ValidationError::UnknownSample(label.to_string()))
    }

    pub fn category_index(&self, id: &str) -> Result<usize, ValidationError> {
        self.categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ValidationError::UnknownCategory(id.to_string()))
    }

    /// Highest total a sample can reach (e.g. 50 for five 0-10 categories).
    pub fn max_total(&self) -> f64 {
        self.categories
            .iter()
            .map(|c| f64::from(c.max))
            .sum::<f64>()
            * self.multiplier
    }

    /// Every (sample, category) pair in configured order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.samples.len())
            .flat_map(move |s| (0..self.categories.len()).map(move |c| (s, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryConfig, Profile};

    #[test]
    fn test_from_default_config() {
        let rubric = Rubric::from_config(&Config::default()).unwrap();

        assert_eq!(rubric.categories().len(), 5);
        assert_eq!(rubric.samples().len(), 5);
        assert_eq!(rubric.multiplier(), 1.0);
        assert_eq!(rubric.max_total(), 50.0);
    }

    #[test]
    fn test_normalized_profile_ranges() {
        let mut config = Config::default();
        config.profile = Profile::Normalized;
        config.categories = vec![
            CategoryConfig::new("a", "A"),
            CategoryConfig {
                max: Some(3),
                ..CategoryConfig::new("b", "B")
            },
        ];

        let rubric = Rubric::from_config(&config).unwrap();
        assert_eq!(rubric.categories()[0].min, 1);
        assert_eq!(rubric.categories()[0].max, 5);
        assert_eq!(rubric.categories()[1].max, 3);
        assert_eq!(rubric.multiplier(), 5.0);
        assert_eq!(rubric.max_total(), 40.0);
    }

    #[test]
    fn test_multiplier_override() {
        let mut config = Config::default();
        config.multiplier = Some(2.0);
        let rubric = Rubric::from_config(&config).unwrap();
        assert_eq!(rubric.multiplier(), 2.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.samples.clear();
        assert!(Rubric::from_config(&config).is_err());
    }

    #[test]
    fn test_lookup_by_label() {
        let rubric = Rubric::from_config(&Config::default()).unwrap();
        assert_eq!(rubric.sample_index("Set C").unwrap(), 2);
        assert_eq!(rubric.category_index("smoke").unwrap(), 3);
        assert_eq!(
            rubric.sample_index("Set Z").unwrap_err(),
            ValidationError::UnknownSample("Set Z".to_string())
        );
        assert!(rubric.category_index("crunch").is_err());
    }

    #[test]
    fn test_category_check() {
        let category = Category {
            id: "a".to_string(),
            name: "A".to_string(),
            min: 1,
            max: 5,
        };
        assert_eq!(category.check(1).unwrap(), 1);
        assert_eq!(category.check(5).unwrap(), 5);
        assert!(category.check(0).is_err());
        assert!(category.check(6).is_err());
        assert!(category.check(-3).is_err());
    }

    #[test]
    fn test_pairs_in_configured_order() {
        let config = Config {
            categories: vec![CategoryConfig::new("a", "A"), CategoryConfig::new("b", "B")],
            samples: vec!["S1".to_string(), "S2".to_string()],
            ..Config::default()
        };
        let rubric = Rubric::from_config(&config).unwrap();
        let pairs: Vec<_> = rubric.pairs().collect();
        assert_eq!(pairs, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }
}
