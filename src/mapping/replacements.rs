//! Value replacement rules
//!
//! Rules are written one per line as `original|replacement`. A rule matches
//! when the whole value equals `original`.

use indexmap::IndexMap;

/// Parsed replacement rules, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementRules {
    rules: IndexMap<String, String>,
}

impl ReplacementRules {
    /// Parse rule text. Lines without exactly one `|` are ignored; the
    /// replacement is right-trimmed. A later rule for the same original wins.
    pub fn parse(text: &str) -> Self {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut rules = IndexMap::new();

        for line in normalized.split('\n').filter(|l| !l.is_empty()) {
            let parts: Vec<&str> = line.split('|').collect();
            if let [original, replacement] = parts.as_slice() {
                rules.insert(original.to_string(), replacement.trim_end().to_string());
            }
        }

        Self { rules }
    }

    pub fn get(&self, value: &str) -> Option<&str> {
        self.rules.get(value).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

/// Apply form-level and field-level rules to a value.
///
/// A field-level rule for the value takes precedence over a form-level rule
/// for the same value. Empty values stay empty.
pub fn transform_string(
    value: &str,
    form_rules: &ReplacementRules,
    field_rules: &ReplacementRules,
) -> String {
    if value.is_empty() {
        return String::new();
    }

    field_rules
        .get(value)
        .or_else(|| form_rules.get(value))
        .unwrap_or(value)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rules() {
        let rules = ReplacementRules::parse("Y|Yes\r\nN|No  \r\n\r\nbroken line\na|b|c\rM|Maybe");

        assert_eq!(rules.len(), 3);
        assert_eq!(rules.get("Y"), Some("Yes"));
        assert_eq!(rules.get("N"), Some("No"));
        assert_eq!(rules.get("M"), Some("Maybe"));
        assert_eq!(rules.get("a"), None);
    }

    #[test]
    fn test_parse_empty() {
        assert!(ReplacementRules::parse("").is_empty());
    }

    #[test]
    fn test_field_rules_win() {
        let form = ReplacementRules::parse("1|One\n2|Two");
        let field = ReplacementRules::parse("1|Uno");

        assert_eq!(transform_string("1", &form, &field), "Uno");
        assert_eq!(transform_string("2", &form, &field), "Two");
        assert_eq!(transform_string("3", &form, &field), "3");
    }

    #[test]
    fn test_whole_value_match_only() {
        let form = ReplacementRules::parse("1|One");
        let field = ReplacementRules::default();

        assert_eq!(transform_string("10", &form, &field), "10");
        assert_eq!(transform_string("", &form, &field), "");
    }
}
