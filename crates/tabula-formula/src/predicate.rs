//! Predicates applied by reducer functions to the entries of a source value

use crate::ast::BinaryOperator;
use crate::evaluator::compare;
use crate::functions::criteria::CriteriaMatcher;
use crate::value::Value;

/// A filter over values
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches everything
    Any,
    /// `value <op> operand`, using the language's comparison rules
    Compare { op: BinaryOperator, operand: Value },
    /// A spreadsheet criteria value (`">2"`, `"a*"`, 5)
    Criteria(CriteriaMatcher),
}

impl Predicate {
    /// Build a predicate from a criteria argument
    pub fn from_criteria(criteria: &Value) -> Self {
        Predicate::Criteria(CriteriaMatcher::new(criteria))
    }

    /// Does `value` pass the filter?
    ///
    /// A comparison that is not a boolean TRUE (including `#VALUE!` from
    /// mismatched variants) does not match.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Predicate::Any => true,
            Predicate::Compare { op, operand } => {
                matches!(compare(*op, value, operand), Value::Boolean(true))
            }
            Predicate::Criteria(matcher) => matcher.matches(value),
        }
    }
}
