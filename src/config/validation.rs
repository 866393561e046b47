use super::settings::EtlConfig;
use crate::utils::constants::WEIGHT_SUM_TOLERANCE;
use crate::utils::fuzzy::normalize_text;
use std::collections::HashMap;
use validator::Validate;

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &EtlConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Err(field_errors) = config.validate() {
        errors.extend(
            field_errors
                .to_string()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    errors.extend(
        config
            .scoring
            .non_finite_fields()
            .into_iter()
            .map(|field| format!("{}: must be a finite number", field)),
    );

    let weights = &config.scoring.weights;
    let sum = weights.sum();
    if !sum.is_finite() || (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        errors.push(format!(
            "scoring.weights: must sum to 1.0, got {:.6} (proximity={}, zoning={}, capacity={})",
            sum, weights.proximity, weights.zoning, weights.capacity
        ));
    }

    // Each spelling may resolve to exactly one place
    let mut owners: HashMap<String, &str> = HashMap::new();
    for (i, mapping) in config.standardizer.mappings.iter().enumerate() {
        if normalize_text(&mapping.canonical).is_empty() {
            errors.push(format!(
                "standardizer.mappings[{}].canonical: '{}' has no letters or digits",
                i, mapping.canonical
            ));
            continue;
        }

        for spelling in std::iter::once(&mapping.canonical).chain(mapping.variants.iter()) {
            let key = normalize_text(spelling);
            if key.is_empty() {
                errors.push(format!(
                    "standardizer.mappings[{}].variants: '{}' has no letters or digits",
                    i, spelling
                ));
                continue;
            }

            match owners.get(&key) {
                Some(owner) if *owner != mapping.canonical => errors.push(format!(
                    "standardizer.mappings[{}]: '{}' already maps to '{}'",
                    i, spelling, owner
                )),
                Some(_) => {}
                None => {
                    owners.insert(key, &mapping.canonical);
                }
            }
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
    use crate::config::PlaceMapping;

    #[test]
    fn test_valid_default_config() {
        assert!(validate_config(&EtlConfig::default()).is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = EtlConfig::default();
        config.scoring.weights.capacity = 0.5;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("scoring.weights"));
    }

    #[test]
    fn test_equal_thirds_accepted() {
        let mut config = EtlConfig::default();
        config.scoring.weights.proximity = 1.0 / 3.0;
        config.scoring.weights.zoning = 1.0 / 3.0;
        config.scoring.weights.capacity = 1.0 / 3.0;

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_nan_weight_rejected() {
        let mut config = EtlConfig::default();
        config.scoring.weights.zoning = f64::NAN;

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_nan_target_rejected() {
        let mut config = EtlConfig::default();
        config.scoring.target.latitude = f64::NAN;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e == "scoring.target.latitude: must be a finite number"));
    }

    #[test]
    fn test_nan_zoning_and_degenerate_scores_rejected() {
        let mut config = EtlConfig::default();
        config.scoring.zoning.industrial = f64::NAN;
        config.scoring.degenerate_capacity_score = f64::NAN;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.starts_with("scoring.zoning.industrial")));
        assert!(errors
            .iter()
            .any(|e| e.starts_with("scoring.degenerate_capacity_score")));
    }

    #[test]
    fn test_conflicting_variant_rejected() {
        let mut config = EtlConfig::default();
        config
            .standardizer
            .mappings
            .push(PlaceMapping::new("South San Francisco", &["sf"]));

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("already maps to 'San Francisco'")));
    }

    #[test]
    fn test_blank_canonical_rejected() {
        let mut config = EtlConfig::default();
        config.standardizer.mappings.push(PlaceMapping::new("  ", &[]));

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EtlConfig::default();
        config.scoring.weights.capacity = 0.9; // sum error
        config.scoring.max_distance_km = -1.0; // field error

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
