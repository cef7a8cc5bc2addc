//! Analysis extraction.

use super::scan::labeled_string_array;
use crate::types::AnalysisResult;

/// Keys recognised for the style category, tried in order. The first is
/// the one the analysis prompt asks for.
pub const STYLE_LABELS: &[&str] = &["style and readability", "Style and Readability", "style"];

/// Keys recognised for the performance category.
pub const PERFORMANCE_LABELS: &[&str] = &["performance", "Performance"];

/// Keys recognised for the security category.
pub const SECURITY_LABELS: &[&str] = &["security", "Security"];

/// Extract categorised findings from a completion.
///
/// Never fails. Each category is located on its own, so a missing or
/// malformed block only empties that category. Key matching is
/// case-sensitive against the labels above.
///
/// ```rust
/// let text = r#"{"style and readability": ["Add docstring"], "security": []}"#;
/// let result = mimir::extract::extract_analysis(text);
/// assert_eq!(result.style, vec!["Add docstring"]);
/// assert!(result.performance.is_empty());
/// ```
pub fn extract_analysis(text: &str) -> AnalysisResult {
    AnalysisResult {
        style: findings(text, STYLE_LABELS),
        performance: findings(text, PERFORMANCE_LABELS),
        security: findings(text, SECURITY_LABELS),
    }
}

fn findings(text: &str, labels: &[&str]) -> Vec<String> {
    labels
        .iter()
        .find_map(|label| labeled_string_array(text, label))
        .unwrap_or_default()
}
