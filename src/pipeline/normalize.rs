//! Canonicalization of extracted text before hashing.

use regex::Regex;

/// Strips formatting noise and time-varying fragments from unit text.
///
/// Normalization runs to a fixpoint, so `normalize(normalize(x)) == normalize(x)`
/// holds even when removing a volatile fragment exposes another one.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    volatile: Vec<Regex>,
}

impl Normalizer {
    /// Create a normalizer that only collapses whitespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer that also drops matches of the given patterns.
    pub fn with_patterns(volatile: Vec<Regex>) -> Self {
        Self { volatile }
    }

    /// Produce the canonical form of `text`.
    pub fn normalize(&self, text: &str) -> String {
        let mut current = collapse_whitespace(text);
        // Replacements only insert spaces: each productive pass either drops
        // non-space chars or splits a token, and tokens never outnumber them.
        loop {
            let mut next = current.clone();
            for pattern in &self.volatile {
                next = pattern.replace_all(&next, " ").into_owned();
            }
            let next = collapse_whitespace(&next);
            if next == current {
                return current;
            }
            current = next;
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last_updated() -> Normalizer {
        Normalizer::with_patterns(vec![
            Regex::new(
                r"(?i)Last updated\s+\d+\s+(second|minute|hour|day|week|month|year)s?\s+ago",
            )
            .unwrap(),
        ])
    }

    #[test]
    fn test_collapses_whitespace() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("  Rate\tlimits\n\n  apply  "), "Rate limits apply");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Normalizer::new().normalize(" \n\t "), "");
    }

    #[test]
    fn test_strips_volatile_fragment() {
        let n = last_updated();
        let a = n.normalize("Orders\nLast updated\n3 days ago\nPlace an order");
        let b = n.normalize("Orders Last updated 1 hour ago Place an order");
        assert_eq!(a, "Orders Place an order");
        assert_eq!(a, b);
    }

    #[test]
    fn test_idempotent() {
        let n = Normalizer::with_patterns(vec![Regex::new("ab").unwrap()]);
        let inputs = [
            "",
            "plain text",
            "  spaced \n\n out  ",
            "aabb",
            "a ab b",
            "x aabbab y",
            "Last updated 2 weeks ago",
        ];
        for input in inputs {
            let once = n.normalize(input);
            assert_eq!(n.normalize(&once), once, "input: {input:?}");
        }

        let n = last_updated();
        for input in inputs {
            let once = n.normalize(input);
            assert_eq!(n.normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_fixpoint_handles_exposed_matches() {
        // Removing the inner "ab" leaves "a b", which matches again.
        let n = Normalizer::with_patterns(vec![Regex::new(r"a\s*b").unwrap()]);
        assert_eq!(n.normalize("x a ab b y"), "x y");
    }

    #[test]
    fn test_empty_matching_pattern_terminates() {
        let n = Normalizer::with_patterns(vec![Regex::new("x*").unwrap()]);
        let once = n.normalize("ab");
        assert_eq!(once, "a b");
        assert_eq!(n.normalize(&once), once);
    }
}
