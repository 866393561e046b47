use crate::config::StandardizerConfig;
use crate::models::{MatchMethod, Standardization};
use crate::utils::fuzzy::{best_match, normalize_text};
use std::collections::HashMap;
use tracing::debug;

/// Maps raw place names onto canonical names: exact lookup first, fuzzy
/// ratio against every known spelling second.
pub struct NameStandardizer {
    threshold: u8,
    canonicals: Vec<String>,
    /// Normalized spelling and the index of its canonical, in table order
    variants: Vec<(String, usize)>,
    exact: HashMap<String, usize>,
}

impl NameStandardizer {
    pub fn new(config: &StandardizerConfig) -> Self {
        let mut canonicals = Vec::with_capacity(config.mappings.len());
        let mut variants = Vec::new();
        let mut exact = HashMap::new();

        for mapping in &config.mappings {
            let canonical_index = canonicals.len();
            canonicals.push(mapping.canonical.clone());

            for spelling in std::iter::once(&mapping.canonical).chain(mapping.variants.iter()) {
                let key = normalize_text(spelling);
                if key.is_empty() || exact.contains_key(&key) {
                    continue;
                }
                exact.insert(key.clone(), canonical_index);
                variants.push((key, canonical_index));
            }
        }

        Self {
            threshold: config.threshold,
            canonicals,
            variants,
            exact,
        }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Number of distinct normalized spellings known
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }

    /// Resolve one name. Never fails: names without a confident match come
    /// back unchanged.
    pub fn standardize(&self, raw_name: Option<&str>) -> Standardization {
        let Some(raw) = raw_name else {
            return Standardization {
                name: None,
                method: MatchMethod::Missing,
            };
        };

        let query = normalize_text(raw);
        if query.is_empty() {
            return Standardization {
                name: Some(raw.to_string()),
                method: MatchMethod::Missing,
            };
        }

        if let Some(&index) = self.exact.get(&query) {
            return Standardization {
                name: Some(self.canonicals[index].clone()),
                method: MatchMethod::Exact,
            };
        }

        let best = best_match(&query, self.variants.iter().map(|(v, _)| v.as_str()));
        match best {
            Some((position, score)) if score >= self.threshold => {
                let (variant, index) = &self.variants[position];
                let canonical = &self.canonicals[*index];
                debug!(
                    raw = raw,
                    canonical = canonical.as_str(),
                    variant = variant.as_str(),
                    score,
                    "Fuzzy matched place name"
                );
                Standardization {
                    name: Some(canonical.clone()),
                    method: MatchMethod::Fuzzy {
                        score,
                        matched_variant: variant.clone(),
                    },
                }
            }
            best => Standardization {
                name: Some(raw.to_string()),
                method: MatchMethod::Unmatched {
                    best_score: best.map(|(_, score)| score),
                },
            },
        }
    }

    /// Convenience for callers that only want the resulting name
    pub fn standardize_name(&self, raw_name: &str) -> String {
        self.standardize(Some(raw_name))
            .name
            .unwrap_or_else(|| raw_name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaceMapping;

    fn standardizer() -> NameStandardizer {
        NameStandardizer::new(&StandardizerConfig::default())
    }

    fn with_mappings(threshold: u8, mappings: Vec<PlaceMapping>) -> NameStandardizer {
        NameStandardizer::new(&StandardizerConfig {
            threshold,
            mappings,
        })
    }

    #[test]
    fn test_abbreviation_exact_match() {
        let s = with_mappings(
            80,
            vec![PlaceMapping::new("San Francisco", &["San Francisco", "SF"])],
        );
        let result = s.standardize(Some("SF"));

        assert_eq!(result.name.as_deref(), Some("San Francisco"));
        assert_eq!(result.method, MatchMethod::Exact);
    }

    #[test]
    fn test_no_close_match_returns_input() {
        let s = standardizer();
        let result = s.standardize(Some("Springfield"));

        assert_eq!(result.name.as_deref(), Some("Springfield"));
        assert!(matches!(result.method, MatchMethod::Unmatched { .. }));
    }

    #[test]
    fn test_exact_match_ignores_case_and_spacing() {
        let s = standardizer();
        assert_eq!(s.standardize_name("  san   MATEO county "), "San Mateo");
        assert_eq!(s.standardize_name("kern county"), "Kern");
    }

    #[test]
    fn test_fuzzy_fallback() {
        let s = standardizer();

        let result = s.standardize(Some("San Fransisco"));
        assert_eq!(result.name.as_deref(), Some("San Francisco"));
        assert_eq!(result.method.fuzzy_score(), Some(92));

        let result = s.standardize(Some("San Mateo Cnty"));
        assert_eq!(result.name.as_deref(), Some("San Mateo"));
        assert!(matches!(result.method, MatchMethod::Fuzzy { ref matched_variant, .. } if matched_variant == "san mateo county"));
    }

    #[test]
    fn test_exact_match_short_circuits_fuzzy() {
        // "Oaklands" scores 93 against Oakland, which is listed first
        let s = with_mappings(
            80,
            vec![
                PlaceMapping::new("Oakland", &[]),
                PlaceMapping::new("Alameda", &["Oaklands"]),
            ],
        );
        let result = s.standardize(Some("oaklands"));

        assert_eq!(result.name.as_deref(), Some("Alameda"));
        assert_eq!(result.method, MatchMethod::Exact);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mappings = vec![PlaceMapping::new("Oakland", &[])];

        // ratio("oaklnd", "oakland") == 92
        let at = with_mappings(92, mappings.clone());
        assert_eq!(at.standardize_name("Oaklnd"), "Oakland");

        let above = with_mappings(93, mappings);
        assert_eq!(above.standardize_name("Oaklnd"), "Oaklnd");
    }

    #[test]
    fn test_tie_goes_to_first_mapping() {
        let s = with_mappings(
            75,
            vec![
                PlaceMapping::new("Abcx", &[]),
                PlaceMapping::new("Abcy", &[]),
            ],
        );
        assert_eq!(s.standardize_name("abcz"), "Abcx");
    }

    #[test]
    fn test_idempotent_on_canonical_names() {
        let s = standardizer();
        for canonical in ["San Francisco", "San Mateo", "Oakland", "Kern"] {
            let once = s.standardize_name(canonical);
            let twice = s.standardize_name(&once);
            assert_eq!(once, canonical);
            assert_eq!(twice, once);
        }
    }

    #[test]
    fn test_missing_and_blank_names() {
        let s = standardizer();

        let missing = s.standardize(None);
        assert_eq!(missing.name, None);
        assert_eq!(missing.method, MatchMethod::Missing);

        let blank = s.standardize(Some("   "));
        assert_eq!(blank.name.as_deref(), Some("   "));
        assert_eq!(blank.method, MatchMethod::Missing);
    }

    #[test]
    fn test_duplicate_spellings_indexed_once() {
        let s = with_mappings(
            80,
            vec![PlaceMapping::new("San Francisco", &["San Francisco", "SF", "sf"])],
        );
        assert_eq!(s.variant_count(), 2);
    }
}
