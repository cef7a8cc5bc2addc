//! Task prompts.
//!
//! Each prompt is a fixed prefix; the code under review is appended after
//! a blank line.

use crate::types::Operation;

/// Prefix for code analysis. Names the JSON keys `extract_analysis` matches.
pub const ANALYSIS_PROMPT: &str = "\
You are an expert code reviewer with deep knowledge of software engineering best practices, \
design patterns, and security principles. Analyze the provided code and provide detailed feedback in the following categories:

1. Style and Readability:
   - Code organization and structure
   - Naming conventions
   - Documentation and comments
   - Code formatting and consistency

2. Performance:
   - Algorithm efficiency
   - Resource usage
   - Potential bottlenecks
   - Optimization opportunities

3. Security:
   - Input validation
   - Data protection
   - Authentication/Authorization
   - Common vulnerabilities

Format your response as a JSON object with exactly these keys: \"style and readability\", \"performance\", \"security\". \
Each key maps to an array of strings. Each suggestion should be specific and actionable.
Code to analyze:";

/// Prefix for refactoring.
pub const REFACTOR_PROMPT: &str = "\
You are an expert software engineer specializing in code refactoring and clean code principles.
Refactor the provided code according to these aspects:

1. Code Quality:
   - Improve code organization
   - Enhance readability
   - Remove code smells

2. Best Practices:
   - Use modern language features
   - Implement proper error handling
   - Add appropriate documentation
   - Follow design patterns where applicable

3. Performance:
   - Optimize algorithms
   - Reduce complexity
   - Improve resource usage

**Output ONLY** a JSON object with exactly these three fields (and nothing else):

{
  \"original\": \"<the original code as a string>\",
  \"refactored\": \"<the refactored code as a string>\",
  \"improvements\": [\"<first improvement>\", \"<second improvement>\", ...]
}

Do not include any explanatory text, headings, or formatting outside of this JSON.
Code to refactor:";

/// System message for vendors that take one.
pub fn system_message(operation: Operation) -> &'static str {
    match operation {
        Operation::Analysis => {
            "You are an expert code reviewer. Provide detailed, actionable feedback in JSON format."
        }
        Operation::Refactor => {
            "You are an expert code refactoring assistant. Provide refactored code with explanations in JSON format."
        }
    }
}

/// Full user prompt for `operation` on `code`.
pub fn build(operation: Operation, code: &str) -> String {
    let prefix = match operation {
        Operation::Analysis => ANALYSIS_PROMPT,
        Operation::Refactor => REFACTOR_PROMPT,
    };
    format!("{prefix}\n\n{code}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_appended_after_blank_line() {
        let prompt = build(Operation::Refactor, "fn f() {}");
        assert!(prompt.starts_with(REFACTOR_PROMPT));
        assert!(prompt.ends_with("Code to refactor:\n\nfn f() {}"));
    }

    #[test]
    fn analysis_prompt_names_extractor_keys() {
        for key in ["\"style and readability\"", "\"performance\"", "\"security\""] {
            assert!(ANALYSIS_PROMPT.contains(key), "missing {key}");
        }
    }

    #[test]
    fn code_is_verbatim() {
        let code = "  line one\n\tline two  \n";
        assert!(build(Operation::Analysis, code).ends_with(code));
    }
}
