use std::collections::HashMap;

/// Canonical form of a detector class name: lowercased, trimmed, and
/// resolved through the configured synonym table. Total and idempotent,
/// so detector label drift (casing, stray whitespace) never breaks
/// downstream matching.
pub fn normalize(raw: &str, synonyms: &HashMap<String, String>) -> String {
    let lowered = raw.trim().to_lowercase();
    match synonyms.get(&lowered) {
        Some(canonical) => canonical.clone(),
        None => lowered,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synonyms() -> HashMap<String, String> {
        HashMap::from([("ppe_overall".to_string(), "ppe_coverall".to_string())])
    }

    #[test]
    fn test_normalize_casing_and_whitespace() {
        let syn = synonyms();
        assert_eq!(normalize("MASK", &syn), "mask");
        assert_eq!(normalize("  Glove  ", &syn), "glove");
        assert_eq!(normalize("", &syn), "");
    }

    #[test]
    fn test_normalize_synonyms() {
        let syn = synonyms();
        assert_eq!(normalize("ppe_overall", &syn), "ppe_coverall");
        assert_eq!(normalize("PPE_OVERALL", &syn), "ppe_coverall");
        assert_eq!(normalize("unknown", &syn), "unknown");
    }

    #[test]
    fn test_normalize_idempotent() {
        let syn = synonyms();
        for raw in ["MASK", "  Glove ", "ppe_overall", "weird label"] {
            let once = normalize(raw, &syn);
            assert_eq!(normalize(&once, &syn), once);
        }
    }
}
