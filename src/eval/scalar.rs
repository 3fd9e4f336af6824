//! Primitive matchers. Each one checks (or coerces) a single value and
//! returns the canonical form, or the kind of failure; the evaluator attaches
//! path and condition handling.
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use regex::Regex;

use crate::error::FailureKind;
use crate::value::{DATE_FORMAT, Number, Value};

/// Digit strings a lenient `Number` accepts: no sign, no exponent.
static NUMBER_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)?$").unwrap());
static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap());
static DATETIME_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}(\.[0-9]{1,6}Z?)?$").unwrap()
});

/// Tried in order: plain seconds, fractional seconds, fractional seconds + `Z`.
pub const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
];

/// Calendar years start at 1; `0000-..` is not a date.
const MIN_YEAR: i32 = 1;

pub const FALSE_TOKENS: [&str; 5] = ["no", "False", "false", "f", "0"];
pub const TRUE_TOKENS: [&str; 5] = ["yes", "True", "true", "t", "1"];

fn mismatch(expected: impl Into<String>, found: &Value) -> FailureKind {
    FailureKind::TypeMismatch { expected: expected.into(), found: found.type_name() }
}

pub fn string(strict: bool, value: &Value) -> Result<Value, FailureKind> {
    match value {
        Value::String(s) => Ok(Value::String(s.clone())),
        _ if strict => Err(mismatch("string", value)),
        other => Ok(Value::String(other.to_plain_string())),
    }
}

pub fn regex_string(source: &str, regex: &Regex, value: &Value) -> Result<Value, FailureKind> {
    let s = value.as_str().ok_or_else(|| mismatch("string", value))?;
    if regex.is_match(s) {
        Ok(Value::String(s.to_string()))
    } else {
        Err(FailureKind::PatternMismatch { pattern: source.to_string() })
    }
}

pub fn number(min: Option<f64>, max: Option<f64>, strict: bool, value: &Value) -> Result<Value, FailureKind> {
    let n = match value {
        Value::Number(n) => n.canonical(),
        Value::String(s) if !strict && NUMBER_TEXT.is_match(s) => {
            parse_digits(s).ok_or_else(|| mismatch("numeric string", value))?
        }
        Value::String(_) if !strict => return Err(mismatch("numeric string", value)),
        _ => return Err(mismatch("number", value)),
    };
    let x = n.as_f64();
    if min.is_some_and(|lo| x < lo) || max.is_some_and(|hi| x > hi) {
        return Err(FailureKind::RangeError { min, max });
    }
    Ok(Value::Number(n))
}

/// Whole numbers parse exactly; anything that overflows `f64` is rejected
/// rather than becoming an infinity the interchange format can't carry.
fn parse_digits(s: &str) -> Option<Number> {
    if let Ok(u) = s.parse::<u64>() {
        return Some(Number::from_u64(u));
    }
    let parsed = s.parse::<f64>().ok().filter(|x| x.is_finite())?;
    Some(Number::Float(OrderedFloat(parsed)).canonical())
}

pub fn null(value: &Value) -> Result<Value, FailureKind> {
    match value {
        Value::Null => Ok(Value::Null),
        _ => Err(mismatch("null", value)),
    }
}

/// Already-parsed dates pass through, so cleaned output re-cleans unchanged.
pub fn date(value: &Value) -> Result<Value, FailureKind> {
    if let Value::Date(d) = value {
        return Ok(Value::Date(*d));
    }
    let s = value.as_str().ok_or_else(|| mismatch("date string", value))?;
    if !DATE_SHAPE.is_match(s) {
        return Err(FailureKind::FormatError { expected: "date" });
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .filter(|d| d.year() >= MIN_YEAR)
        .map(Value::Date)
        .ok_or(FailureKind::FormatError { expected: "date" })
}

pub fn datetime(value: &Value) -> Result<Value, FailureKind> {
    if let Value::Datetime(d) = value {
        return Ok(Value::Datetime(*d));
    }
    let s = value.as_str().ok_or_else(|| mismatch("datetime string", value))?;
    if !DATETIME_SHAPE.is_match(s) {
        return Err(FailureKind::FormatError { expected: "datetime" });
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .filter(|d| d.year() >= MIN_YEAR)
        .map(Value::Datetime)
        .ok_or(FailureKind::FormatError { expected: "datetime" })
}

pub fn boolean(strict: bool, value: &Value) -> Result<Value, FailureKind> {
    if let Value::Bool(b) = value {
        return Ok(Value::Bool(*b));
    }
    if strict {
        return Err(mismatch("boolean", value));
    }
    match value {
        Value::Null => Ok(Value::Bool(false)),
        Value::String(s) if FALSE_TOKENS.contains(&s.as_str()) => Ok(Value::Bool(false)),
        Value::String(s) if TRUE_TOKENS.contains(&s.as_str()) => Ok(Value::Bool(true)),
        Value::Number(n) if *n == Number::Int(0) => Ok(Value::Bool(false)),
        Value::Number(n) if *n == Number::Int(1) => Ok(Value::Bool(true)),
        _ => Err(mismatch("boolean-like value", value)),
    }
}

pub fn constant(expected: &Value, value: &Value) -> Result<Value, FailureKind> {
    if value != expected {
        return Err(FailureKind::TypeMismatch {
            expected: format!("constant {expected}"),
            found: value.type_name(),
        });
    }
    Ok(expected.clone())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn v(j: serde_json::Value) -> Value {
        Value::from(j)
    }

    #[test]
    fn strict_string_rejects_other_types() {
        assert_eq!(string(true, &v(json!("a"))), Ok(v(json!("a"))));
        assert_eq!(string(true, &v(json!(1))).unwrap_err().name(), "TypeMismatch");
    }

    #[test]
    fn lenient_string_stringifies() {
        assert_eq!(string(false, &v(json!(12))), Ok(v(json!("12"))));
        assert_eq!(string(false, &v(json!(true))), Ok(v(json!("true"))));
        assert_eq!(string(false, &Value::Null), Ok(v(json!("null"))));
    }

    #[test]
    fn regex_requires_full_match() {
        let re = Regex::new("^(?:[a-z]+)$").unwrap();
        assert_eq!(regex_string("[a-z]+", &re, &v(json!("abc"))), Ok(v(json!("abc"))));
        assert_eq!(
            regex_string("[a-z]+", &re, &v(json!("abc1"))),
            Err(FailureKind::PatternMismatch { pattern: "[a-z]+".into() })
        );
        assert_eq!(regex_string("[a-z]+", &re, &v(json!(1))).unwrap_err().name(), "TypeMismatch");
    }

    #[test]
    fn number_bounds_are_inclusive() {
        let check = |x: f64| number(Some(0.0), Some(10.0), false, &Value::from(x));
        assert!(check(0.0).is_ok());
        assert!(check(10.0).is_ok());
        assert_eq!(check(-0.001).unwrap_err().name(), "RangeError");
        assert_eq!(check(10.0001).unwrap_err().name(), "RangeError");
    }

    #[test]
    fn lenient_number_parses_digit_strings() {
        assert_eq!(number(None, None, false, &v(json!("1234"))), Ok(v(json!(1234))));
        assert_eq!(number(None, None, false, &v(json!("12.5"))), Ok(v(json!(12.5))));
        assert_eq!(number(None, None, false, &v(json!("-1"))).unwrap_err().name(), "TypeMismatch");
        assert_eq!(number(None, None, false, &v(json!("1234a"))).unwrap_err().name(), "TypeMismatch");
        assert_eq!(number(None, None, true, &v(json!("1234"))).unwrap_err().name(), "TypeMismatch");
        assert_eq!(number(None, None, false, &v(json!(true))).unwrap_err().name(), "TypeMismatch");
    }

    #[test]
    fn lenient_number_rejects_digit_strings_beyond_f64() {
        let huge = "1".repeat(400);
        assert_eq!(number(None, None, false, &Value::from(huge.as_str())).unwrap_err().name(), "TypeMismatch");
        let huge_fraction = format!("{huge}.5");
        assert!(number(None, None, false, &Value::from(huge_fraction)).is_err());
    }

    #[test]
    fn lenient_number_keeps_large_integers_exact() {
        assert_eq!(
            number(None, None, false, &v(json!("18446744073709551615"))),
            Ok(Value::Number(Number::UInt(u64::MAX)))
        );
        assert_eq!(
            number(None, None, false, &v(json!("9007199254740993"))),
            Ok(Value::Number(Number::Int(9_007_199_254_740_993)))
        );
    }

    #[test]
    fn integral_floats_become_integers() {
        assert!(matches!(
            number(None, None, true, &Value::from(3.0)),
            Ok(Value::Number(Number::Int(3)))
        ));
    }

    #[test]
    fn dates_parse_and_reject_impossible_calendar_days() {
        assert_eq!(
            date(&v(json!("2017-08-10"))),
            Ok(Value::Date(NaiveDate::from_ymd_opt(2017, 8, 10).unwrap()))
        );
        assert_eq!(date(&v(json!("2017-13-10"))), Err(FormatErr::date()));
        assert_eq!(date(&v(json!("2017-8-10"))), Err(FormatErr::date()));
        assert_eq!(date(&v(json!(20170810))).unwrap_err().name(), "TypeMismatch");
        assert_eq!(date(&v(json!("0000-01-01"))), Err(FormatErr::date()));
        assert!(date(&v(json!("0001-01-01"))).is_ok());
        let parsed = date(&v(json!("2017-08-10"))).unwrap();
        assert_eq!(date(&parsed), Ok(parsed.clone()));
    }

    #[test]
    fn datetimes_accept_three_shapes() {
        let expect = |s: &str| datetime(&v(json!(s))).unwrap().as_datetime().unwrap();
        let plain = expect("2000-01-02T10:10:10");
        assert_eq!(plain.format("%H:%M:%S").to_string(), "10:10:10");
        let frac = expect("2000-01-02T10:10:10.123");
        assert_eq!(frac.and_utc().timestamp_subsec_millis(), 123);
        let zulu = expect("2000-01-02T10:10:10.123Z");
        assert_eq!(frac, zulu);
        assert_eq!(datetime(&v(json!("2000-01-02 10:10:10"))), Err(FormatErr::datetime()));
        assert_eq!(datetime(&v(json!("2000-01-02T25:10:10"))), Err(FormatErr::datetime()));
        assert_eq!(datetime(&v(json!("2000-01-02T10:10:10Z"))), Err(FormatErr::datetime()));
        // at most microsecond precision
        assert!(datetime(&v(json!("2000-01-02T10:10:10.123456"))).is_ok());
        assert_eq!(datetime(&v(json!("2000-01-02T10:10:10.1234567"))), Err(FormatErr::datetime()));
        assert_eq!(datetime(&v(json!("2000-01-02T10:10:10.1234567Z"))), Err(FormatErr::datetime()));
        assert_eq!(datetime(&v(json!("0000-01-02T10:10:10"))), Err(FormatErr::datetime()));
    }

    #[test]
    fn lenient_boolean_tokens() {
        for falsy in [json!("no"), json!("false"), json!("False"), json!("f"), json!("0"), json!(0), json!(null)] {
            assert_eq!(boolean(false, &v(falsy)), Ok(Value::Bool(false)));
        }
        for truthy in [json!("yes"), json!("true"), json!("True"), json!("t"), json!("1"), json!(1)] {
            assert_eq!(boolean(false, &v(truthy)), Ok(Value::Bool(true)));
        }
        assert_eq!(boolean(false, &v(json!("maybe"))).unwrap_err().name(), "TypeMismatch");
        assert_eq!(boolean(false, &v(json!(2))).unwrap_err().name(), "TypeMismatch");
        assert_eq!(boolean(true, &v(json!("true"))).unwrap_err().name(), "TypeMismatch");
    }

    #[test]
    fn constant_uses_structural_equality() {
        let expected = v(json!({"a": [1, 2]}));
        assert_eq!(constant(&expected, &v(json!({"a": [1.0, 2]}))), Ok(expected.clone()));
        assert_eq!(constant(&expected, &v(json!({"a": [1]}))).unwrap_err().name(), "TypeMismatch");
    }

    struct FormatErr;

    impl FormatErr {
        fn date() -> FailureKind {
            FailureKind::FormatError { expected: "date" }
        }
        fn datetime() -> FailureKind {
            FailureKind::FormatError { expected: "datetime" }
        }
    }
}
