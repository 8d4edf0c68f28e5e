use std::collections::HashMap;
use regex::{Captures, Regex};
use lazy_static::lazy_static;

lazy_static! {
    /// Matches an escaped brace (`{{` or `}}`) or a named placeholder `{name}`.
    /// Escapes come first in the alternation so `{{name}}` is read as literal braces.
    pub(crate) static ref PLACEHOLDER_MATCH_RE: Regex = Regex::new(r"\{\{|\}\}|\{(\w+)\}").unwrap();
}

/// One token matched by [PLACEHOLDER_MATCH_RE].
enum Token<'a> {
    Escaped(&'static str),
    Placeholder(&'a str),
}

#[inline]
fn classify<'a>(captures: &Captures<'a>) -> Token<'a> {
    match captures.get(1) {
        Some(name) => Token::Placeholder(name.as_str()),
        None if &captures[0] == "{{" => Token::Escaped("{"),
        None => Token::Escaped("}"),
    }
}

/// Replaces all placeholders with their mapped values and unescapes `{{`/`}}`.
///
/// Placeholders absent from the mapping are left untouched, so callers must ensure
/// the mapping is complete when they want a fully rendered prompt.
pub(crate) fn replace_all_placeholders(original: &str, mapping: &HashMap<&str, &str>) -> String {
    let new_string = PLACEHOLDER_MATCH_RE.replace_all(original, |captures: &Captures| {
        match classify(captures) {
            Token::Escaped(brace) => brace.to_string(),
            Token::Placeholder(name) => mapping
                .get(name)
                .map_or_else(|| captures[0].to_string(), |value| value.to_string()),
        }
    });
    new_string.into_owned()
}

/// Returns placeholder names in order of first appearance, without duplicates.
pub fn get_placeholders(string: &str) -> Vec<String> {
    let mut placeholders: Vec<String> = Vec::new();
    for captures in PLACEHOLDER_MATCH_RE.captures_iter(string) {
        if let Token::Placeholder(name) = classify(&captures) {
            if !placeholders.iter().any(|p| p == name) {
                placeholders.push(name.to_string());
            }
        }
    }
    placeholders
}

#[cfg(test)]
mod string_tests {
    use std::collections::HashMap;
    use super::{get_placeholders, replace_all_placeholders};

    #[test]
    fn test_get_keys() {
        let keys = get_placeholders("{a}");
        assert_eq!(vec!["a".to_string()], keys);

        let keys = get_placeholders("{a\n}");
        assert_eq!(0, keys.len());

        let keys = get_placeholders("{b}    {a} {b}");
        assert_eq!(vec!["b".to_string(), "a".to_string()], keys);

        let keys = get_placeholders("{{escaped}} and {\"json\": 1}");
        assert!(keys.is_empty());
    }

    #[test]
    fn test_replace() {
        let string = "{a} and {b} and {a}";
        let mapping = HashMap::from([("a", "alice"), ("b", "bob")]);
        assert_eq!("alice and bob and alice", replace_all_placeholders(string, &mapping));
    }

    #[test]
    fn test_replace_escapes_and_unknowns() {
        let mapping = HashMap::from([("x", "1")]);
        assert_eq!("{x} = 1", replace_all_placeholders("{{x}} = {x}", &mapping));
        assert_eq!("{1}", replace_all_placeholders("{{{x}}}", &mapping));
        assert_eq!("{y} stays", replace_all_placeholders("{y} stays", &mapping));
        assert_eq!("{\"k\": 1}", replace_all_placeholders("{\"k\": 1}", &mapping));
    }
}
