//! Low-level text scanning shared by the extraction strategies.
//!
//! Everything here tolerates malformed input: a scan that cannot make
//! sense of its input returns `None` or an empty list, never an error.

use std::str::Chars;
use std::sync::LazyLock;

use regex::Regex;

/// A bullet or numbered list item; capture 1 is the item text.
static BULLET_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[-*+•]|\d+[.)])[ \t]+(.+?)[ \t]*$").expect("valid bullet regex")
});

/// A markdown heading (`# ...`) or a bold-only line (`**...**`).
static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]+\S.*|\*\*[^*\n]+\*\*:?[ \t]*)$")
        .expect("valid heading regex")
});

/// A fenced code block; capture 1 is the body.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[^\n`]*\n(.*?)```").expect("valid fence regex")
});

/// Byte offsets just past `"key"\s*:\s*` for every occurrence of the
/// quoted key in `text`. Key matching is exact and case-sensitive.
pub(crate) fn labeled_value_offsets<'a>(
    text: &'a str,
    key: &str,
) -> impl Iterator<Item = usize> + 'a {
    let needle = format!("\"{key}\"");
    let positions: Vec<usize> = text.match_indices(&needle).map(|(i, _)| i + needle.len()).collect();
    positions.into_iter().filter_map(move |after_key| {
        let rest = &text[after_key..];
        let trimmed = rest.trim_start();
        let colon = trimmed.strip_prefix(':')?;
        let value = colon.trim_start();
        Some(text.len() - value.len())
    })
}

/// The first array of strings labeled `key`, e.g. `"key": ["a", "b"]`.
///
/// Returns every quoted string inside the array, unescaped and trimmed,
/// skipping blanks. Occurrences of the key not followed by an array are
/// ignored.
pub(crate) fn labeled_string_array(text: &str, key: &str) -> Option<Vec<String>> {
    labeled_value_offsets(text, key).find_map(|offset| {
        let value = &text[offset..];
        value.starts_with('[').then(|| quoted_strings_in_array(value))
    })
}

/// The first string value labeled with any of `keys` (tried in order),
/// unescaped. Blank values are skipped.
pub(crate) fn labeled_string(text: &str, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        labeled_value_offsets(text, key).find_map(|offset| {
            let raw = quoted_string_at(&text[offset..])?;
            let value = unescape(raw);
            (!value.trim().is_empty()).then_some(value)
        })
    })
}

/// Raw contents of the quoted string at the start of `text`, without the
/// surrounding quotes. `None` if `text` does not start with a terminated
/// string.
pub(crate) fn quoted_string_at(text: &str) -> Option<&str> {
    let body = text.strip_prefix('"')?;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(&body[..i]),
            _ => {}
        }
    }
    None
}

/// Collect every quoted string inside the array that `text` starts with.
///
/// Nested arrays and objects are walked through (their strings are
/// collected too); the scan ends at the matching `]` or, for truncated
/// output, at end of text. An unterminated trailing string is dropped.
pub(crate) fn quoted_strings_in_array(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    let Some(body) = text.strip_prefix('[') else {
        return items;
    };

    let mut depth = 0usize;
    let mut rest = body;
    while let Some(c) = rest.chars().next() {
        match c {
            '"' => {
                let Some(raw) = quoted_string_at(rest) else {
                    break;
                };
                let item = unescape(raw);
                let item = item.trim();
                if !item.is_empty() {
                    items.push(item.to_string());
                }
                rest = &rest[raw.len() + 2..];
                continue;
            }
            '[' | '{' => depth += 1,
            ']' | '}' => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            _ => {}
        }
        rest = &rest[c.len_utf8()..];
    }
    items
}

/// Decode JSON string escapes.
///
/// Lenient: raw control characters pass through, unknown escapes are
/// kept verbatim, and broken `\u` sequences decode to U+FFFD or are kept
/// as written.
pub(crate) fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('/') => out.push('/'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('u') => match decode_unicode_escape(&mut chars) {
                Some(decoded) => out.push(decoded),
                None => out.push_str("\\u"),
            },
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Decode the four hex digits following `\u`, joining surrogate pairs.
/// Leaves `chars` untouched when the digits are missing.
fn decode_unicode_escape(chars: &mut Chars<'_>) -> Option<char> {
    let rest = chars.as_str();
    let high = u32::from_str_radix(rest.get(..4)?, 16).ok()?;
    *chars = rest[4..].chars();

    if (0xD800..0xDC00).contains(&high) {
        let rest = chars.as_str();
        let low = rest
            .strip_prefix("\\u")
            .and_then(|r| r.get(..4))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .filter(|low| (0xDC00..0xE000).contains(low));
        return match low {
            Some(low) => {
                *chars = rest[6..].chars();
                char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
            }
            None => Some(char::REPLACEMENT_CHARACTER),
        };
    }
    Some(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
}

/// Bullet and numbered list items in `text`, in order.
pub(crate) fn bullet_items(text: &str) -> Vec<String> {
    BULLET_LINE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Byte range of the first heading line at or after `from`.
pub(crate) fn next_heading(text: &str, from: usize) -> Option<(usize, usize)> {
    HEADING_LINE
        .find_at(text, from)
        .map(|m| (m.start(), m.end()))
}

/// A fenced code block: its byte span and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fence<'a> {
    pub start: usize,
    pub end: usize,
    pub body: &'a str,
}

/// Every fenced code block in `text`, in order.
pub(crate) fn fences(text: &str) -> Vec<Fence<'_>> {
    FENCE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let body = caps.get(1)?;
            Some(Fence {
                start: whole.start(),
                end: whole.end(),
                body: body.as_str(),
            })
        })
        .collect()
}

/// `text` with fenced code blocks removed.
pub(crate) fn strip_fences(text: &str) -> String {
    FENCE.replace_all(text, "\n").into_owned()
}

/// Trim leading and trailing blank lines, keeping indentation intact.
pub(crate) fn trim_blank_lines(code: &str) -> &str {
    let code = code.trim_end();
    let first_content = code
        .char_indices()
        .find(|&(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(code.len());
    let line_start = code[..first_content].rfind('\n').map(|i| i + 1).unwrap_or(0);
    &code[line_start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_array_basic() {
        let text = r#"{"Security": ["Validate input", "Escape output"]}"#;
        assert_eq!(
            labeled_string_array(text, "Security").unwrap(),
            vec!["Validate input", "Escape output"]
        );
    }

    #[test]
    fn labeled_array_tolerates_spacing_and_newlines() {
        let text = "\"Performance\"  :\n  [\n  \"Cache results\" ,\n\"Avoid clones\"\n]";
        assert_eq!(
            labeled_string_array(text, "Performance").unwrap(),
            vec!["Cache results", "Avoid clones"]
        );
    }

    #[test]
    fn labeled_array_skips_non_array_occurrence() {
        let text = r#"{"Security": "see below", "Security": ["Use TLS"]}"#;
        assert_eq!(labeled_string_array(text, "Security").unwrap(), vec!["Use TLS"]);
    }

    #[test]
    fn labeled_array_key_is_case_sensitive() {
        let text = r#"{"security": ["Use TLS"]}"#;
        assert!(labeled_string_array(text, "Security").is_none());
    }

    #[test]
    fn array_with_bracket_inside_string() {
        let text = r#"["Index with v[0] safely", "Second"]"#;
        assert_eq!(
            quoted_strings_in_array(text),
            vec!["Index with v[0] safely", "Second"]
        );
    }

    #[test]
    fn array_with_escaped_quote() {
        let text = r#"["Use \"const\" here", "ok"]"#;
        assert_eq!(quoted_strings_in_array(text), vec![r#"Use "const" here"#, "ok"]);
    }

    #[test]
    fn array_stops_at_closing_bracket() {
        let text = r#"["inside"], "outside""#;
        assert_eq!(quoted_strings_in_array(text), vec!["inside"]);
    }

    #[test]
    fn array_truncated_keeps_complete_items() {
        let text = r#"["complete", "trunc"#;
        assert_eq!(quoted_strings_in_array(text), vec!["complete"]);
    }

    #[test]
    fn array_skips_blank_items() {
        let text = r#"["  ", "real", ""]"#;
        assert_eq!(quoted_strings_in_array(text), vec!["real"]);
    }

    #[test]
    fn array_walks_nested_objects() {
        let text = r#"[{"issue": "Long function"}, "Plain"], "after""#;
        assert_eq!(
            quoted_strings_in_array(text),
            vec!["issue", "Long function", "Plain"]
        );
    }

    #[test]
    fn labeled_string_prefers_first_key() {
        let text = r#"{"refactored": "b", "refactoredCode": "a"}"#;
        assert_eq!(
            labeled_string(text, &["refactoredCode", "refactored"]).unwrap(),
            "a"
        );
    }

    #[test]
    fn labeled_string_skips_blank() {
        let text = r#"{"refactoredCode": "  ", "refactored": "x"}"#;
        assert_eq!(
            labeled_string(text, &["refactoredCode", "refactored"]).unwrap(),
            "x"
        );
    }

    #[test]
    fn quoted_string_requires_terminator() {
        assert_eq!(quoted_string_at(r#""abc" tail"#), Some("abc"));
        assert_eq!(quoted_string_at(r#""a\"b""#), Some(r#"a\"b"#));
        assert_eq!(quoted_string_at(r#""unterminated"#), None);
        assert_eq!(quoted_string_at("no quote"), None);
    }

    #[test]
    fn unescape_common_sequences() {
        assert_eq!(unescape(r#"a\nb\tc\"d\\e\/f"#), "a\nb\tc\"d\\e/f");
    }

    #[test]
    fn unescape_unicode_and_surrogates() {
        assert_eq!(unescape(r"\u00e9"), "\u{e9}");
        assert_eq!(unescape(r"\ud83d\ude00"), "\u{1F600}");
        assert_eq!(unescape(r"\ud83d!"), "\u{FFFD}!");
    }

    #[test]
    fn unescape_is_lenient() {
        assert_eq!(unescape(r"\q"), r"\q");
        assert_eq!(unescape(r"\u12"), r"\u12");
        assert_eq!(unescape("raw\nnewline"), "raw\nnewline");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }

    #[test]
    fn bullets_of_all_kinds() {
        let text = "- dash\n* star\n+ plus\n• dot\n1. one\n2) two\nnot a bullet\n-nospace";
        assert_eq!(
            bullet_items(text),
            vec!["dash", "star", "plus", "dot", "one", "two"]
        );
    }

    #[test]
    fn fences_found_in_order() {
        let text = "a\n```rust\nfn a() {}\n```\nb\n```\nfn b() {}\n```\n";
        let found = fences(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].body, "fn a() {}\n");
        assert_eq!(found[1].body, "fn b() {}\n");
        assert!(found[0].end <= found[1].start);
    }

    #[test]
    fn strip_fences_removes_code() {
        let text = "- keep\n```\n- drop\n```\n- keep too";
        assert_eq!(bullet_items(&strip_fences(text)), vec!["keep", "keep too"]);
    }

    #[test]
    fn headings_detected() {
        let text = "intro\n## Next\nbody\n**Bold**\n";
        let (start, _) = next_heading(text, 0).unwrap();
        assert_eq!(&text[start..start + 7], "## Next");
        let (start, _) = next_heading(text, start + 1).unwrap();
        assert!(text[start..].starts_with("**Bold**"));
    }

    #[test]
    fn trim_blank_lines_keeps_indent() {
        assert_eq!(trim_blank_lines("\n\n    indented\n  x\n\n"), "    indented\n  x");
        assert_eq!(trim_blank_lines("   \n"), "");
    }
}
