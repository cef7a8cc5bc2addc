//! Refactor extraction.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::scan::{
    bullet_items, fences, labeled_string, labeled_string_array, next_heading, strip_fences,
    trim_blank_lines,
};
use super::{Strategy, first_success};
use crate::types::RefactorResult;
use crate::{MimirError, Result};

const ORIGINAL_KEYS: &[&str] = &["originalCode", "original"];
const REFACTORED_KEYS: &[&str] = &["refactoredCode", "refactored"];

/// "Original Code" / "Refactored Code" heading text; capture 1 is the kind.
static CODE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(original|refactored)[ \t]+code\b").expect("valid code heading regex")
});

/// A "Key Improvements" / "Improvements Made" heading line.
static IMPROVEMENTS_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*)?[ \t]*(?:key[ \t]+improvements|improvements[ \t]+made)\b.*$")
        .expect("valid improvements heading regex")
});

/// Fields recovered by one strategy.
///
/// `original` is only recorded to show the strategy matched; the returned
/// result always carries the caller's code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PartialRefactor {
    pub original: Option<String>,
    pub refactored: Option<String>,
    pub improvements: Vec<String>,
}

impl PartialRefactor {
    fn has_refactored(&self) -> bool {
        self.refactored
            .as_deref()
            .is_some_and(|code| !code.trim().is_empty())
    }

    fn is_empty(&self) -> bool {
        self.original.is_none() && self.refactored.is_none() && self.improvements.is_empty()
    }
}

const MARKDOWN: &str = "markdown";

/// Strategies that can produce refactored code, in the order they are tried.
pub(crate) const REFACTOR_STRATEGIES: &[Strategy<PartialRefactor>] = &[
    Strategy {
        name: "strict_json",
        run: strict_json,
    },
    Strategy {
        name: "labeled_fields",
        run: labeled_fields,
    },
    Strategy {
        name: MARKDOWN,
        run: markdown_blocks,
    },
];

/// Extract a refactoring from a completion for `original` code.
///
/// Fails with [`MimirError::NoStructuredContent`] only when no strategy
/// finds anything at all. When improvements are found but no refactored
/// code, the result is a no-op refactor (`refactored == original`).
pub fn extract_refactor(text: &str, original: &str) -> Result<RefactorResult> {
    extract_refactor_traced(text, original).map(|(result, _)| result)
}

/// [`extract_refactor`], also naming the strategy that supplied the code
/// (`"noop"` when none did).
pub(crate) fn extract_refactor_traced(
    text: &str,
    original: &str,
) -> Result<(RefactorResult, &'static str)> {
    if text.trim().is_empty() {
        return Err(MimirError::NoStructuredContent);
    }

    let outcome = first_success(text, REFACTOR_STRATEGIES, PartialRefactor::has_refactored);
    let matched_any = outcome.matched_any();

    let mut improvements = outcome
        .accepted
        .iter()
        .chain(outcome.rejected.iter())
        .map(|(_, partial)| &partial.improvements)
        .find(|found| !found.is_empty())
        .cloned()
        .unwrap_or_default();
    if improvements.is_empty() {
        // Code taken from a quoted field sits outside any fence, so its
        // list-like lines must not be read as bullets.
        let code_in_fields = outcome
            .accepted
            .iter()
            .chain(outcome.rejected.iter())
            .any(|(name, partial)| *name != MARKDOWN && partial.refactored.is_some());
        improvements = improvements_fallback(text, !code_in_fields);
    }

    let (refactored, strategy) = match outcome.accepted {
        Some((name, partial)) => (partial.refactored.unwrap_or_default(), name),
        None if matched_any || !improvements.is_empty() => (original.to_string(), "noop"),
        None => return Err(MimirError::NoStructuredContent),
    };

    Ok((
        RefactorResult {
            original: original.to_string(),
            refactored,
            improvements,
        },
        strategy,
    ))
}

/// Parse the span from the first `{` to the last `}` as a JSON object.
fn strict_json(text: &str) -> Option<PartialRefactor> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    let value: Value = serde_json::from_str(&text[start..=end]).ok()?;
    let object = value.as_object()?;

    let string_field = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str))
            .map(str::to_string)
    };
    let improvements = object
        .get("improvements")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(PartialRefactor {
        original: string_field(ORIGINAL_KEYS),
        refactored: string_field(REFACTORED_KEYS),
        improvements,
    })
}

/// Find `"refactoredCode": "..."`, `"originalCode": "..."` and
/// `"improvements": [...]` anywhere in the text, tolerating prose around
/// them and invalid JSON such as raw newlines inside strings.
fn labeled_fields(text: &str) -> Option<PartialRefactor> {
    let partial = PartialRefactor {
        original: labeled_string(text, ORIGINAL_KEYS),
        refactored: labeled_string(text, REFACTORED_KEYS),
        improvements: labeled_string_array(text, "improvements").unwrap_or_default(),
    };
    (!partial.is_empty()).then_some(partial)
}

/// Fenced code blocks under "Original Code" / "Refactored Code" headings.
///
/// A fence is attributed to the last such heading between it and the
/// previous fence. Without a refactored heading, the last fence that is
/// not the original block is used. A refactored block that itself holds a
/// `"refactoredCode"` field is unwrapped.
fn markdown_blocks(text: &str) -> Option<PartialRefactor> {
    let blocks = fences(text);
    if blocks.is_empty() {
        return None;
    }

    let mut original = None;
    let mut refactored = None;
    let mut unlabeled = None;
    let mut gap_start = 0;
    for block in &blocks {
        let label = CODE_HEADING
            .captures_iter(&text[gap_start..block.start])
            .last()
            .and_then(|caps| caps.get(1))
            .map(|kind| kind.as_str().to_ascii_lowercase());
        let body = trim_blank_lines(block.body);
        match label.as_deref() {
            Some("original") if original.is_none() => original = Some(body.to_string()),
            Some("refactored") if refactored.is_none() => refactored = Some(unwrap_nested(body)),
            Some(_) => {}
            None => unlabeled = Some(unwrap_nested(body)),
        }
        gap_start = block.end;
    }

    Some(PartialRefactor {
        original,
        refactored: refactored.or(unlabeled),
        improvements: Vec::new(),
    })
}

/// If `block` wraps the code in a JSON field, return the field's value.
fn unwrap_nested(block: &str) -> String {
    labeled_string(block, REFACTORED_KEYS).unwrap_or_else(|| block.to_string())
}

/// Bullets under a "Key Improvements" / "Improvements Made" heading, up to
/// the next heading. Without such a heading, every bullet outside code
/// fences when `scan_anywhere` is set.
fn improvements_fallback(text: &str, scan_anywhere: bool) -> Vec<String> {
    match IMPROVEMENTS_HEADING.find(text) {
        Some(heading) => {
            let body_start = heading.end();
            let body_end = next_heading(text, body_start)
                .map(|(start, _)| start)
                .unwrap_or(text.len());
            bullet_items(&strip_fences(&text[body_start..body_end]))
        }
        None if scan_anywhere => bullet_items(&strip_fences(text)),
        None => Vec::new(),
    }
}
