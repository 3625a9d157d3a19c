//! Criteria matching for COUNTIF, SUMIF and AVERAGEIF
//!
//! A criteria value can be:
//! - A number: exact match (e.g. 5)
//! - A text string: case-insensitive match (e.g. "apple")
//! - A comparison expression: ">5", ">=10", "<100", "<=50", "<>0", "=5"
//! - Text with wildcards: "*" matches any characters, "?" a single character
//! - Empty string: matches blank cells

use tabula_core::parse_number;

use crate::value::Value;

const EPSILON: f64 = 1e-10;

/// Matches values against a spreadsheet criteria value
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaMatcher {
    criteria_type: CriteriaType,
}

#[derive(Debug, Clone, PartialEq)]
enum CriteriaType {
    /// Exact number match
    Number(f64),
    /// Comparison with a number
    Comparison(ComparisonOp, f64),
    /// Lowercased text pattern, may contain wildcards
    Text(String),
    /// `<>pattern`
    NotText(String),
    /// Match blank values
    Empty,
    /// Error, array, object and function criteria match nothing
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComparisonOp {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl CriteriaMatcher {
    pub fn new(criteria: &Value) -> Self {
        let criteria_type = match criteria {
            Value::Number(n) => CriteriaType::Number(*n),
            Value::Boolean(b) => CriteriaType::Number(if *b { 1.0 } else { 0.0 }),
            Value::Text(s) => Self::parse_text_criteria(s),
            Value::Blank => CriteriaType::Empty,
            Value::Date(d) => CriteriaType::Number(d.timestamp() as f64),
            Value::Error(_) | Value::Array(_) | Value::Object(_) | Value::Function(_) => {
                CriteriaType::Never
            }
        };

        Self { criteria_type }
    }

    fn parse_text_criteria(s: &str) -> CriteriaType {
        let s = s.trim();

        if s.is_empty() {
            return CriteriaType::Empty;
        }

        if let Some(ct) = Self::try_parse_comparison(s) {
            return ct;
        }

        if let Some(n) = parse_number(s) {
            return CriteriaType::Number(n);
        }

        CriteriaType::Text(s.to_lowercase())
    }

    fn try_parse_comparison(s: &str) -> Option<CriteriaType> {
        // Longer operators first
        let (op, rest) = if let Some(rest) = s.strip_prefix(">=") {
            (ComparisonOp::GreaterEqual, rest)
        } else if let Some(rest) = s.strip_prefix("<=") {
            (ComparisonOp::LessEqual, rest)
        } else if let Some(rest) = s.strip_prefix("<>") {
            (ComparisonOp::NotEqual, rest)
        } else if let Some(rest) = s.strip_prefix('>') {
            (ComparisonOp::GreaterThan, rest)
        } else if let Some(rest) = s.strip_prefix('<') {
            (ComparisonOp::LessThan, rest)
        } else if let Some(rest) = s.strip_prefix('=') {
            (ComparisonOp::Equal, rest)
        } else {
            return None;
        };

        let rest = rest.trim();
        if let Some(n) = parse_number(rest) {
            return Some(CriteriaType::Comparison(op, n));
        }

        match op {
            ComparisonOp::Equal if rest.is_empty() => Some(CriteriaType::Empty),
            ComparisonOp::Equal => Some(CriteriaType::Text(rest.to_lowercase())),
            ComparisonOp::NotEqual => Some(CriteriaType::NotText(rest.to_lowercase())),
            // ">A" and friends fall back to a literal text match
            _ => None,
        }
    }

    /// Check if a value matches the criteria
    pub fn matches(&self, value: &Value) -> bool {
        match &self.criteria_type {
            // Only numeric values match: text "5" does not match 5
            CriteriaType::Number(criteria_num) => match numeric(value) {
                Some(n) => (n - criteria_num).abs() < EPSILON,
                None => false,
            },

            CriteriaType::Comparison(op, criteria_num) => {
                let Some(n) = numeric(value) else {
                    // Anything non-numeric is "not equal" to a number
                    return *op == ComparisonOp::NotEqual;
                };
                match op {
                    ComparisonOp::Equal => (n - criteria_num).abs() < EPSILON,
                    ComparisonOp::NotEqual => (n - criteria_num).abs() >= EPSILON,
                    ComparisonOp::LessThan => n < *criteria_num,
                    ComparisonOp::LessEqual => n <= *criteria_num,
                    ComparisonOp::GreaterThan => n > *criteria_num,
                    ComparisonOp::GreaterEqual => n >= *criteria_num,
                }
            }

            CriteriaType::Text(pattern) => match value {
                Value::Text(s) => wildcard_match(pattern, &s.to_lowercase()),
                _ => false,
            },

            CriteriaType::NotText(pattern) => match value {
                Value::Text(s) => !wildcard_match(pattern, &s.to_lowercase()),
                _ => true,
            },

            CriteriaType::Empty => {
                matches!(value, Value::Blank) || matches!(value, Value::Text(s) if s.is_empty())
            }

            CriteriaType::Never => false,
        }
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Date(d) => Some(d.timestamp() as f64),
        _ => None,
    }
}

/// Match with wildcards: `*` = any characters, `?` = single character
fn wildcard_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') && !pattern.contains('?') {
        return pattern == text;
    }

    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut pi = 0;
    let mut ti = 0;
    // Last `*` seen and the text position it was matched at
    let mut star_pi = None;
    let mut star_ti = 0;

    while ti < text.len() {
        if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pattern.len() && pattern[pi] == '*' {
            star_pi = Some(pi);
            star_ti = ti;
            pi += 1;
        } else if let Some(sp) = star_pi {
            pi = sp + 1;
            star_ti += 1;
            ti = star_ti;
        } else {
            return false;
        }
    }

    while pi < pattern.len() && pattern[pi] == '*' {
        pi += 1;
    }

    pi == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::CellError;

    fn text(s: &str) -> Value {
        Value::from(s)
    }

    #[test]
    fn test_number_criteria() {
        let matcher = CriteriaMatcher::new(&Value::Number(5.0));
        assert!(matcher.matches(&Value::Number(5.0)));
        assert!(!matcher.matches(&Value::Number(4.0)));
        assert!(!matcher.matches(&text("5")));

        // Numeric text criteria is still a number match
        let matcher = CriteriaMatcher::new(&text("5"));
        assert!(matcher.matches(&Value::Number(5.0)));
    }

    #[test]
    fn test_comparison_criteria() {
        let matcher = CriteriaMatcher::new(&text(">5"));
        assert!(matcher.matches(&Value::Number(6.0)));
        assert!(!matcher.matches(&Value::Number(5.0)));
        assert!(!matcher.matches(&Value::Number(4.0)));

        let matcher = CriteriaMatcher::new(&text(">=5"));
        assert!(matcher.matches(&Value::Number(6.0)));
        assert!(matcher.matches(&Value::Number(5.0)));
        assert!(!matcher.matches(&Value::Number(4.0)));

        let matcher = CriteriaMatcher::new(&text("<5"));
        assert!(!matcher.matches(&Value::Number(6.0)));
        assert!(!matcher.matches(&Value::Number(5.0)));
        assert!(matcher.matches(&Value::Number(4.0)));

        let matcher = CriteriaMatcher::new(&text("<=5"));
        assert!(!matcher.matches(&Value::Number(6.0)));
        assert!(matcher.matches(&Value::Number(5.0)));
        assert!(matcher.matches(&Value::Number(4.0)));

        let matcher = CriteriaMatcher::new(&text("<>5"));
        assert!(matcher.matches(&Value::Number(6.0)));
        assert!(!matcher.matches(&Value::Number(5.0)));
        assert!(matcher.matches(&text("five")));

        let matcher = CriteriaMatcher::new(&text("=5"));
        assert!(!matcher.matches(&Value::Number(6.0)));
        assert!(matcher.matches(&Value::Number(5.0)));
        assert!(!matcher.matches(&text("5")));
    }

    #[test]
    fn test_text_criteria() {
        let matcher = CriteriaMatcher::new(&text("apple"));
        assert!(matcher.matches(&text("apple")));
        assert!(matcher.matches(&text("APPLE")));
        assert!(matcher.matches(&text("Apple")));
        assert!(!matcher.matches(&text("banana")));
        assert!(!matcher.matches(&Value::Blank));
    }

    #[test]
    fn test_text_comparison_criteria() {
        let matcher = CriteriaMatcher::new(&text("<>apple"));
        assert!(!matcher.matches(&text("Apple")));
        assert!(matcher.matches(&text("banana")));
        assert!(matcher.matches(&Value::Number(1.0)));

        let matcher = CriteriaMatcher::new(&text("=a*"));
        assert!(matcher.matches(&text("avocado")));
        assert!(!matcher.matches(&text("banana")));
    }

    #[test]
    fn test_wildcard_criteria() {
        let matcher = CriteriaMatcher::new(&text("a*"));
        assert!(matcher.matches(&text("apple")));
        assert!(matcher.matches(&text("a")));
        assert!(!matcher.matches(&text("banana")));

        let matcher = CriteriaMatcher::new(&text("a*e"));
        assert!(matcher.matches(&text("apple")));
        assert!(matcher.matches(&text("ae")));
        assert!(!matcher.matches(&text("apples")));

        let matcher = CriteriaMatcher::new(&text("a?ple"));
        assert!(matcher.matches(&text("apple")));
        assert!(!matcher.matches(&text("aple")));
        assert!(!matcher.matches(&text("axxple")));

        let matcher = CriteriaMatcher::new(&text("a?p*"));
        assert!(matcher.matches(&text("apple")));
        assert!(matcher.matches(&text("app")));
        assert!(!matcher.matches(&text("ap")));
    }

    #[test]
    fn test_empty_criteria() {
        let matcher = CriteriaMatcher::new(&text(""));
        assert!(matcher.matches(&Value::Blank));
        assert!(matcher.matches(&text("")));
        assert!(!matcher.matches(&text("text")));
        assert!(!matcher.matches(&Value::Number(0.0)));
    }

    #[test]
    fn test_error_criteria_matches_nothing() {
        let matcher = CriteriaMatcher::new(&Value::Error(CellError::Na));
        assert!(!matcher.matches(&Value::Error(CellError::Na)));
        assert!(!matcher.matches(&Value::Blank));
    }
}
