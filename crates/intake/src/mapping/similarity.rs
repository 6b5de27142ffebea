//! Header similarity scoring.

use similar::TextDiff;

use crate::config::MappingConfig;

/// Lowercase, trim, and turn underscores and hyphens into spaces.
pub fn normalize(name: &str) -> String {
    name.to_lowercase().trim().replace(['_', '-'], " ")
}

/// Best similarity between a source header and any of a field's synonyms.
///
/// Exact normalized matches short-circuit with `exact_score`. A substring
/// relation scores at least `substring_score`. Otherwise the character-level
/// match ratio is used.
pub fn similarity(source: &str, synonyms: &[String], config: &MappingConfig) -> f64 {
    let source = normalize(source);
    if source.is_empty() {
        return 0.0;
    }

    let mut best: f64 = 0.0;
    for synonym in synonyms {
        let pattern = normalize(synonym);
        if pattern.is_empty() {
            continue;
        }
        if source == pattern {
            return config.exact_score;
        }
        if source.contains(&pattern) || pattern.contains(&source) {
            best = best.max(config.substring_score);
        }
        best = best.max(ratio(&source, &pattern));
    }
    best
}

/// Character match ratio in [0, 1]: `2 * matches / (len(a) + len(b))`.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    f64::from(TextDiff::from_chars(a, b).ratio())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synonyms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Posting_Date "), "posting date");
        assert_eq!(normalize("Due-Date"), "due date");
    }

    #[test]
    fn test_exact_and_substring() {
        let config = MappingConfig::default();
        let syn = synonyms(&["account number", "acct no"]);
        assert_eq!(similarity("Account_Number", &syn, &config), 1.0);

        let syn = synonyms(&["date"]);
        assert_eq!(similarity("Transaction Date", &syn, &config), 0.9);
    }

    #[test]
    fn test_fuzzy_ratio() {
        let config = MappingConfig::default();
        let syn = synonyms(&["description"]);
        let score = similarity("Descripton", &syn, &config);
        assert!(score > 0.9 && score < 1.0);

        let syn = synonyms(&["vendor name"]);
        assert!(similarity("Qty", &syn, &config) < 0.6);
    }

    #[test]
    fn test_blank_header_scores_zero() {
        let config = MappingConfig::default();
        assert_eq!(similarity("   ", &synonyms(&["amount"]), &config), 0.0);
    }

    #[test]
    fn test_subsequence_ratio_clears_threshold() {
        // 9 shared characters out of 28: above the default 0.6 cut.
        let config = MappingConfig::default();
        let score = ratio("trans amount", "transaction date");
        assert!((score - 18.0 / 28.0).abs() < 1e-3, "ratio was {}", score);
        assert!(similarity("Trans_Amount", &synonyms(&["transaction date"]), &config)
            >= config.similarity_threshold);
    }

    #[test]
    fn test_ratio_bounds() {
        assert_eq!(ratio("abc", "abc"), 1.0);
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }
}
