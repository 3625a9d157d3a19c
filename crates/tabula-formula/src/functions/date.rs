//! Date functions
//!
//! Dates are [`Value::Date`] timestamps in UTC rather than serial numbers.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use tabula_core::CellError;

use super::number_arg;
use crate::error::FormulaResult;
use crate::value::Value;

fn to_i32_trunc(n: f64) -> Result<i32, CellError> {
    let n = n.trunc();
    if n < i32::MIN as f64 || n > i32::MAX as f64 {
        return Err(CellError::Num);
    }
    Ok(n as i32)
}

/// DATE(year, month, day)
///
/// Months and days outside their usual range roll over into neighbouring
/// months and years, so `DATE(2024, 13, 1)` is 2025-01-01 and
/// `DATE(2024, 3, 0)` is the last day of February.
pub fn fn_date(args: &[Value]) -> FormulaResult<Value> {
    let mut year = try_value!(number_arg(args, 0, 0.0).and_then(to_i32_trunc));
    let month = try_value!(number_arg(args, 1, 1.0).and_then(to_i32_trunc));
    let day = try_value!(number_arg(args, 2, 1.0).and_then(to_i32_trunc));

    // Years 0..1899 are offsets from 1900
    if (0..1900).contains(&year) {
        year += 1900;
    }
    if !(0..=9999).contains(&year) {
        return Ok(Value::Error(CellError::Num));
    }

    // 0-based month index so negative months borrow from the year
    let total_months = (year as i64) * 12 + (month as i64 - 1);
    let norm_year = total_months.div_euclid(12) as i32;
    let norm_month = total_months.rem_euclid(12) as u32 + 1;

    let Some(first) = NaiveDate::from_ymd_opt(norm_year, norm_month, 1) else {
        return Ok(Value::Error(CellError::Num));
    };
    let Some(date) = first.checked_add_signed(Duration::days(day as i64 - 1)) else {
        return Ok(Value::Error(CellError::Num));
    };
    let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
        return Ok(Value::Error(CellError::Num));
    };

    Ok(Value::Date(Utc.from_utc_datetime(&midnight)))
}

/// NOW(): the current time
pub fn fn_now(_args: &[Value]) -> FormulaResult<Value> {
    Ok(Value::Date(Utc::now()))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::context::Environment;
    use crate::evaluator::evaluate;
    use crate::parser::parse;
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use tabula_core::CellError;

    fn eval(formula: &str) -> Value {
        let env = Environment::builtins();
        evaluate(&parse(formula).unwrap(), &env).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_date() {
        assert_eq!(eval("DATE(2024, 2, 29)"), date(2024, 2, 29));
        assert_eq!(eval("DATE(99, 1, 1)"), date(1999, 1, 1));
    }

    #[test]
    fn test_date_rollover() {
        assert_eq!(eval("DATE(2024, 13, 1)"), date(2025, 1, 1));
        assert_eq!(eval("DATE(2024, 3, 0)"), date(2024, 2, 29));
        assert_eq!(eval("DATE(2024, 0, 1)"), date(2023, 12, 1));
        assert_eq!(eval("DATE(2024, 1, 32)"), date(2024, 2, 1));
    }

    #[test]
    fn test_date_out_of_range() {
        assert_eq!(eval("DATE(10000, 1, 1)"), Value::Error(CellError::Num));
        assert_eq!(eval("DATE(\"x\", 1, 1)"), Value::Error(CellError::Na));
    }

    #[test]
    fn test_date_arithmetic_uses_seconds() {
        assert_eq!(
            eval("DATE(2024, 1, 2) - DATE(2024, 1, 1)"),
            Value::Number(86400.0)
        );
        assert_eq!(eval("DATE(2024, 1, 2) > DATE(2024, 1, 1)"), Value::Boolean(true));
    }

    #[test]
    fn test_now() {
        let Value::Date(now) = eval("NOW()") else {
            panic!("NOW should return a date");
        };
        assert!((Utc::now() - now).num_seconds().abs() < 60);
    }
}
