use std::collections::HashSet;

use super::schema::Config;

/// Validate panel configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.categories.is_empty() {
        errors.push("categories: at least one category is required".to_string());
    }

    let mut seen_ids = HashSet::new();
    for (i, category) in config.categories.iter().enumerate() {
        if category.id.trim().is_empty() {
            errors.push(format!("categories[{}].id: must not be empty", i));
        } else if !seen_ids.insert(category.id.as_str()) {
            errors.push(format!(
                "categories[{}].id: duplicate id '{}'",
                i, category.id
            ));
        }

        if category.name.trim().is_empty() {
            errors.push(format!("categories[{}].name: must not be empty", i));
        }

        let min = category.min.unwrap_or(config.profile.default_min());
        let max = category.max.unwrap_or(config.profile.default_max());
        if min > max {
            errors.push(format!(
                "categories[{}]: min {} is greater than max {}",
                i, min, max
            ));
        }
    }

    if config.samples.is_empty() {
        errors.push("samples: at least one sample is required".to_string());
    }

    let mut seen_samples = HashSet::new();
    for (i, sample) in config.samples.iter().enumerate() {
        if sample.trim().is_empty() {
            errors.push(format!("samples[{}]: must not be empty", i));
        } else if !seen_samples.insert(sample.as_str()) {
            errors.push(format!("samples[{}]: duplicate sample '{}'", i, sample));
        }
    }

    if let Some(multiplier) = config.multiplier {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            errors.push(format!(
                "multiplier: must be a positive number, got {}",
                multiplier
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CategoryConfig, Profile};

    fn two_by_two() -> Config {
        Config {
            profile: Profile::Standard,
            multiplier: None,
            categories: vec![CategoryConfig::new("a", "A"), CategoryConfig::new("b", "B")],
            samples: vec!["S1".to_string(), "S2".to_string()],
            ledger: None,
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&two_by_two()).is_ok());
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_empty_axes() {
        let mut config = two_by_two();
        config.categories.clear();
        config.samples.clear();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("categories"));
        assert!(errors[1].contains("samples"));
    }

    #[test]
    fn test_duplicate_category_id() {
        let mut config = two_by_two();
        config.categories.push(CategoryConfig::new("a", "Again"));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("categories[2].id"));
    }

    #[test]
    fn test_duplicate_sample() {
        let mut config = two_by_two();
        config.samples.push("S1".to_string());

        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("samples[2]"));
    }

    #[test]
    fn test_inverted_range_uses_profile_defaults() {
        let mut config = two_by_two();
        config.profile = Profile::Normalized;
        // normalized min is 1, so max 0 is inverted
        config.categories[0].max = Some(0);

        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].contains("min 1 is greater than max 0"));
    }

    #[test]
    fn test_bad_multiplier() {
        let mut config = two_by_two();
        config.multiplier = Some(0.0);
        assert!(validate_config(&config).is_err());

        config.multiplier = Some(f64::NAN);
        assert!(validate_config(&config).is_err());

        config.multiplier = Some(2.5);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = two_by_two();
        config.categories[0].name = " ".to_string(); // Error 1
        config.samples[1] = String::new(); // Error 2
        config.multiplier = Some(-1.0); // Error 3

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
