use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// One regex rewrite in an ordered repair table.
#[derive(Debug)]
pub struct RepairRule {
    pub pattern: Regex,
    pub replacement: &'static str,
    pub reason: &'static str,
}

impl RepairRule {
    /// Panics on an invalid pattern; tables are static and covered by tests.
    pub fn new(pattern: &str, replacement: &'static str, reason: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern)
                .unwrap_or_else(|e| panic!("repair rule {reason:?} should compile: {e}")),
            replacement,
            reason,
        }
    }

    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, self.replacement)
    }
}

/// Applies every rule left to right, each on the previous rule's output.
pub fn apply_rules(rules: &[RepairRule], text: &str) -> String {
    let mut text = text.to_string();
    for rule in rules {
        let changed = match rule.apply(&text) {
            Cow::Owned(changed) => Some(changed),
            Cow::Borrowed(_) => None,
        };
        if let Some(changed) = changed {
            text = changed;
        }
    }
    text
}

/// Fixes for artifacts of joining text across tag boundaries, applied per paragraph.
pub static PUNCTUATION_RULES: LazyLock<Vec<RepairRule>> = LazyLock::new(|| {
    vec![
        RepairRule::new(
            r"\s+([.,:;?!%])",
            "${1}",
            "no whitespace before punctuation",
        ),
        RepairRule::new(r"\s+년생", "년생", "birth-year suffix split from its number"),
        RepairRule::new(
            r"\s+(\d+)%\s*\.",
            " ${1}%.",
            "percentage split from the following period",
        ),
    ]
});
