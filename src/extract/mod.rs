//! Recovering structured results from model completions.
//!
//! Models are asked for JSON but not forced to produce it; real
//! completions mix prose, markdown and half-valid JSON. Extraction is a
//! fixed, ordered list of pure strategies, each `&str -> Option<T>`,
//! composed by [`first_success`]. Partial failures degrade to empty lists
//! or no-op defaults; only a refactor completion with nothing usable at
//! all is an error.
//!
//! # Analysis
//!
//! Each category is located independently by its labeled array
//! (`"security": [...]`); every quoted string inside becomes one finding.
//!
//! # Refactor
//!
//! ```text
//! strict_json     first '{' .. last '}' parsed as an object
//!      │ no non-empty "refactored"
//!      ▼
//! labeled_fields  "refactoredCode": "..." / "improvements": [...] anywhere
//!      │
//!      ▼
//! markdown        fenced block under a "Refactored Code" heading
//!      │
//!      ▼
//! improvements    "Key Improvements" bullets, else any bullets
//! ```

mod analysis;
mod refactor;
pub(crate) mod scan;

pub use analysis::{
    PERFORMANCE_LABELS, SECURITY_LABELS, STYLE_LABELS, extract_analysis,
};
pub use refactor::extract_refactor;

pub(crate) use refactor::extract_refactor_traced;

/// One named extraction strategy.
pub(crate) struct Strategy<T> {
    pub name: &'static str,
    pub run: fn(&str) -> Option<T>,
}

/// What [`first_success`] found.
pub(crate) struct Outcome<T> {
    /// The first strategy whose output was accepted.
    pub accepted: Option<(&'static str, T)>,
    /// Strategies that matched something but were not accepted, in order.
    pub rejected: Vec<(&'static str, T)>,
}

impl<T> Outcome<T> {
    /// Whether any strategy matched anything.
    pub fn matched_any(&self) -> bool {
        self.accepted.is_some() || !self.rejected.is_empty()
    }
}

/// Run `strategies` in order until one returns a value `accept` approves.
///
/// Strategies after the accepted one are not run.
pub(crate) fn first_success<T>(
    text: &str,
    strategies: &[Strategy<T>],
    accept: impl Fn(&T) -> bool,
) -> Outcome<T> {
    let mut rejected = Vec::new();
    for strategy in strategies {
        let Some(found) = (strategy.run)(text) else {
            continue;
        };
        if accept(&found) {
            return Outcome {
                accepted: Some((strategy.name, found)),
                rejected,
            };
        }
        rejected.push((strategy.name, found));
    }
    Outcome {
        accepted: None,
        rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn none(_: &str) -> Option<String> {
        None
    }

    fn empty(_: &str) -> Option<String> {
        Some(String::new())
    }

    fn echo(text: &str) -> Option<String> {
        Some(text.to_string())
    }

    fn boom(_: &str) -> Option<String> {
        panic!("strategy after the accepted one must not run")
    }

    #[test]
    fn first_accepted_wins_and_stops() {
        let strategies = [
            Strategy { name: "none", run: none },
            Strategy { name: "empty", run: empty },
            Strategy { name: "echo", run: echo },
            Strategy { name: "boom", run: boom },
        ];
        let outcome = first_success("hi", &strategies, |s: &String| !s.is_empty());
        let (name, value) = outcome.accepted.unwrap();
        assert_eq!(name, "echo");
        assert_eq!(value, "hi");
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].0, "empty");
    }

    #[test]
    fn nothing_matches() {
        let strategies = [Strategy { name: "none", run: none }];
        let outcome = first_success("hi", &strategies, |_: &String| true);
        assert!(outcome.accepted.is_none());
        assert!(!outcome.matched_any());
    }

    #[test]
    fn matched_but_rejected_counts_as_match() {
        let strategies = [Strategy { name: "empty", run: empty }];
        let outcome = first_success("hi", &strategies, |s: &String| !s.is_empty());
        assert!(outcome.accepted.is_none());
        assert!(outcome.matched_any());
    }
}
