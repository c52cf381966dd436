//! Built-in datatypes and constraining facets

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use rust_decimal::Decimal;

/// A failed simple-value check, named by its XSD constraint code
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Violation {
    pub code: &'static str,
    pub message: String,
}

impl Violation {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntegerKind {
    Integer,
    Long,
    Int,
    Short,
    Byte,
    NonNegative,
    Positive,
    NonPositive,
    Negative,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
}

impl IntegerKind {
    fn name(&self) -> &'static str {
        match self {
            IntegerKind::Integer => "integer",
            IntegerKind::Long => "long",
            IntegerKind::Int => "int",
            IntegerKind::Short => "short",
            IntegerKind::Byte => "byte",
            IntegerKind::NonNegative => "nonNegativeInteger",
            IntegerKind::Positive => "positiveInteger",
            IntegerKind::NonPositive => "nonPositiveInteger",
            IntegerKind::Negative => "negativeInteger",
            IntegerKind::UnsignedLong => "unsignedLong",
            IntegerKind::UnsignedInt => "unsignedInt",
            IntegerKind::UnsignedShort => "unsignedShort",
            IntegerKind::UnsignedByte => "unsignedByte",
        }
    }

    fn bounds(&self) -> (Option<i128>, Option<i128>) {
        match self {
            IntegerKind::Integer => (None, None),
            IntegerKind::Long => (Some(i64::MIN as i128), Some(i64::MAX as i128)),
            IntegerKind::Int => (Some(i32::MIN as i128), Some(i32::MAX as i128)),
            IntegerKind::Short => (Some(i16::MIN as i128), Some(i16::MAX as i128)),
            IntegerKind::Byte => (Some(i8::MIN as i128), Some(i8::MAX as i128)),
            IntegerKind::NonNegative => (Some(0), None),
            IntegerKind::Positive => (Some(1), None),
            IntegerKind::NonPositive => (None, Some(0)),
            IntegerKind::Negative => (None, Some(-1)),
            IntegerKind::UnsignedLong => (Some(0), Some(u64::MAX as i128)),
            IntegerKind::UnsignedInt => (Some(0), Some(u32::MAX as i128)),
            IntegerKind::UnsignedShort => (Some(0), Some(u16::MAX as i128)),
            IntegerKind::UnsignedByte => (Some(0), Some(u8::MAX as i128)),
        }
    }

    fn accepts(&self, lexical: &str) -> bool {
        let (min, max) = self.bounds();
        if min.is_none() && max.is_none() {
            return true;
        }
        // Out of i128 range means far outside every bounded kind.
        match lexical.trim_start_matches('+').parse::<i128>() {
            Ok(n) => min.map_or(true, |m| n >= m) && max.map_or(true, |m| n <= m),
            Err(_) => {
                let negative = lexical.starts_with('-');
                (negative && min.is_none()) || (!negative && max.is_none())
            }
        }
    }
}

/// XSD built-in simple types the engine understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    AnySimple,
    String,
    NormalizedString,
    /// `token` and every whitespace-collapsed string type checked lexically only
    Token,
    AnyUri,
    Boolean,
    Decimal,
    Integer(IntegerKind),
    Float,
    Double,
    Date,
    DateTime,
    Time,
    HexBinary,
    Base64Binary,
}

impl Builtin {
    /// Maps an `xs:` local name
    pub fn from_local(local: &str) -> Option<Builtin> {
        let builtin = match local {
            "anySimpleType" => Builtin::AnySimple,
            "string" => Builtin::String,
            "normalizedString" => Builtin::NormalizedString,
            "token" | "language" | "Name" | "NCName" | "NMTOKEN" | "NMTOKENS" | "ID" | "IDREF"
            | "IDREFS" | "ENTITY" | "ENTITIES" | "QName" | "NOTATION" | "duration" | "gYear"
            | "gYearMonth" | "gMonth" | "gMonthDay" | "gDay" => Builtin::Token,
            "anyURI" => Builtin::AnyUri,
            "boolean" => Builtin::Boolean,
            "decimal" => Builtin::Decimal,
            "integer" => Builtin::Integer(IntegerKind::Integer),
            "long" => Builtin::Integer(IntegerKind::Long),
            "int" => Builtin::Integer(IntegerKind::Int),
            "short" => Builtin::Integer(IntegerKind::Short),
            "byte" => Builtin::Integer(IntegerKind::Byte),
            "nonNegativeInteger" => Builtin::Integer(IntegerKind::NonNegative),
            "positiveInteger" => Builtin::Integer(IntegerKind::Positive),
            "nonPositiveInteger" => Builtin::Integer(IntegerKind::NonPositive),
            "negativeInteger" => Builtin::Integer(IntegerKind::Negative),
            "unsignedLong" => Builtin::Integer(IntegerKind::UnsignedLong),
            "unsignedInt" => Builtin::Integer(IntegerKind::UnsignedInt),
            "unsignedShort" => Builtin::Integer(IntegerKind::UnsignedShort),
            "unsignedByte" => Builtin::Integer(IntegerKind::UnsignedByte),
            "float" => Builtin::Float,
            "double" => Builtin::Double,
            "date" => Builtin::Date,
            "dateTime" => Builtin::DateTime,
            "time" => Builtin::Time,
            "hexBinary" => Builtin::HexBinary,
            "base64Binary" => Builtin::Base64Binary,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::AnySimple => "anySimpleType",
            Builtin::String => "string",
            Builtin::NormalizedString => "normalizedString",
            Builtin::Token => "token",
            Builtin::AnyUri => "anyURI",
            Builtin::Boolean => "boolean",
            Builtin::Decimal => "decimal",
            Builtin::Integer(kind) => kind.name(),
            Builtin::Float => "float",
            Builtin::Double => "double",
            Builtin::Date => "date",
            Builtin::DateTime => "dateTime",
            Builtin::Time => "time",
            Builtin::HexBinary => "hexBinary",
            Builtin::Base64Binary => "base64Binary",
        }
    }

    /// Applies the type's whiteSpace facet (preserve, replace or collapse)
    pub fn normalize<'v>(&self, raw: &'v str) -> Cow<'v, str> {
        match self {
            Builtin::AnySimple | Builtin::String => Cow::Borrowed(raw),
            Builtin::NormalizedString => {
                if raw.contains(['\t', '\n', '\r']) {
                    Cow::Owned(raw.replace(['\t', '\n', '\r'], " "))
                } else {
                    Cow::Borrowed(raw)
                }
            }
            _ => {
                let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
                if collapsed == raw {
                    Cow::Borrowed(raw)
                } else {
                    Cow::Owned(collapsed)
                }
            }
        }
    }

    /// Checks the lexical space of the type
    pub fn check(&self, raw: &str) -> Result<(), Violation> {
        let value = self.normalize(raw);
        let v = value.as_ref();
        let ok = match self {
            Builtin::AnySimple
            | Builtin::String
            | Builtin::NormalizedString
            | Builtin::Token
            | Builtin::AnyUri => true,
            Builtin::Boolean => matches!(v, "true" | "false" | "1" | "0"),
            Builtin::Decimal => is_decimal_lexical(v) && Decimal::from_str(v).is_ok(),
            Builtin::Integer(kind) => is_integer_lexical(v) && kind.accepts(v),
            Builtin::Float | Builtin::Double => is_float_lexical(v),
            Builtin::Date => is_date(v),
            Builtin::DateTime => is_date_time(v),
            Builtin::Time => is_time(v),
            Builtin::HexBinary => v.len() % 2 == 0 && v.chars().all(|c| c.is_ascii_hexdigit()),
            Builtin::Base64Binary => v
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=' | ' ')),
        };
        if ok {
            Ok(())
        } else {
            Err(Violation::new(
                "cvc-datatype-valid.1.2.1",
                format!("'{}' is not a valid value for '{}'", v, self.name()),
            ))
        }
    }
}

fn is_integer_lexical(v: &str) -> bool {
    let digits = v.strip_prefix(['+', '-']).unwrap_or(v);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_decimal_lexical(v: &str) -> bool {
    let body = v.strip_prefix(['+', '-']).unwrap_or(v);
    let (int, frac) = body.split_once('.').unwrap_or((body, ""));
    (!int.is_empty() || !frac.is_empty())
        && int.chars().all(|c| c.is_ascii_digit())
        && frac.chars().all(|c| c.is_ascii_digit())
}

fn is_float_lexical(v: &str) -> bool {
    matches!(v, "INF" | "+INF" | "-INF" | "NaN")
        || (!v.is_empty()
            && v.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
            && v.parse::<f64>().is_ok())
}

/// Removes a trailing `Z` or `±hh:mm` zone designator
fn strip_timezone(v: &str) -> &str {
    if let Some(rest) = v.strip_suffix('Z') {
        return rest;
    }
    if v.len() > 6 && v.is_char_boundary(v.len() - 6) {
        let (head, zone) = v.split_at(v.len() - 6);
        let b = zone.as_bytes();
        if matches!(b[0], b'+' | b'-')
            && b[1].is_ascii_digit()
            && b[2].is_ascii_digit()
            && b[3] == b':'
            && b[4].is_ascii_digit()
            && b[5].is_ascii_digit()
        {
            return head;
        }
    }
    v
}

fn is_date(v: &str) -> bool {
    let date = strip_timezone(v);
    let b = date.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

fn is_time(v: &str) -> bool {
    let time = strip_timezone(v);
    time.len() >= 8 && NaiveTime::parse_from_str(time, "%H:%M:%S%.f").is_ok()
}

fn is_date_time(v: &str) -> bool {
    if DateTime::parse_from_rfc3339(v).is_ok() {
        return true;
    }
    match v.split_once('T') {
        Some((date, _)) if is_date(date) => {
            NaiveDateTime::parse_from_str(strip_timezone(v), "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        }
        _ => false,
    }
}

/// Regular-expression facet; several `xs:pattern`s in one step are alternatives
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    pub source: String,
    pub regex: Regex,
}

impl Pattern {
    pub fn compile(sources: &[String]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = sources.iter().map(|s| format!("(?:{s})")).collect();
        let regex = Regex::new(&format!("^(?:{})$", alternatives.join("|")))?;
        Ok(Self {
            source: sources.join(" | "),
            regex,
        })
    }
}

/// Constraining facets of one restriction step
#[derive(Debug, Clone, Default)]
pub(crate) struct Facets {
    pub enumeration: Vec<String>,
    pub pattern: Option<Pattern>,
    pub length: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub total_digits: Option<u32>,
    pub fraction_digits: Option<u32>,
}

impl Facets {
    pub fn is_empty(&self) -> bool {
        self.enumeration.is_empty()
            && self.pattern.is_none()
            && self.length.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.total_digits.is_none()
            && self.fraction_digits.is_none()
    }

    /// Checks `raw` after applying `base`'s whitespace rule
    pub fn check(&self, base: Builtin, raw: &str) -> Result<(), Violation> {
        let value = base.normalize(raw);
        let v = value.as_ref();

        if let Some(pattern) = &self.pattern {
            if !pattern.regex.is_match(v) {
                return Err(Violation::new(
                    "cvc-pattern-valid",
                    format!(
                        "Value '{}' is not facet-valid with respect to pattern '{}'",
                        v, pattern.source
                    ),
                ));
            }
        }

        if !self.enumeration.is_empty() && !self.enumeration.iter().any(|e| e == v) {
            return Err(Violation::new(
                "cvc-enumeration-valid",
                format!(
                    "Value '{}' is not facet-valid with respect to enumeration '[{}]'",
                    v,
                    self.enumeration.join(", ")
                ),
            ));
        }

        let len = v.chars().count();
        if let Some(length) = self.length {
            if len != length {
                return Err(Violation::new(
                    "cvc-length-valid",
                    format!("Value '{}' with length = '{}' is not facet-valid with respect to length '{}'", v, len, length),
                ));
            }
        }
        if let Some(min) = self.min_length {
            if len < min {
                return Err(Violation::new(
                    "cvc-minLength-valid",
                    format!("Value '{}' with length = '{}' is not facet-valid with respect to minLength '{}'", v, len, min),
                ));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(Violation::new(
                    "cvc-maxLength-valid",
                    format!("Value '{}' with length = '{}' is not facet-valid with respect to maxLength '{}'", v, len, max),
                ));
            }
        }

        if self.total_digits.is_some() || self.fraction_digits.is_some() {
            if let Ok(decimal) = Decimal::from_str(v) {
                let normalized = decimal.normalize();
                let fraction = normalized.scale();
                let total = normalized.mantissa().unsigned_abs().to_string().len() as u32;
                if let Some(max) = self.total_digits {
                    if total > max {
                        return Err(Violation::new(
                            "cvc-totalDigits-valid",
                            format!("Value '{}' has {} total digits, but the number of total digits has been limited to {}", v, total, max),
                        ));
                    }
                }
                if let Some(max) = self.fraction_digits {
                    if fraction > max {
                        return Err(Violation::new(
                            "cvc-fractionDigits-valid",
                            format!("Value '{}' has {} fraction digits, but the number of fraction digits has been limited to {}", v, fraction, max),
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_lexical_space() {
        assert!(Builtin::Date.check("2024-01-15").is_ok());
        assert!(Builtin::Date.check(" 2024-01-15 ").is_ok());
        assert!(Builtin::Date.check("2024-01-15Z").is_ok());
        assert!(Builtin::Date.check("2024-01-15-03:00").is_ok());
        assert!(Builtin::Date.check("2024-1-5").is_err());
        assert!(Builtin::Date.check("2024-02-30").is_err());
        assert!(Builtin::Date.check("15/01/2024").is_err());
    }

    #[test]
    fn test_date_time_and_time() {
        assert!(Builtin::DateTime.check("2024-01-15T10:30:00").is_ok());
        assert!(Builtin::DateTime.check("2024-01-15T10:30:00.5-03:00").is_ok());
        assert!(Builtin::DateTime.check("2024-01-15").is_err());
        assert!(Builtin::Time.check("10:30:00").is_ok());
        assert!(Builtin::Time.check("10:30").is_err());
    }

    #[test]
    fn test_decimal_and_integer() {
        assert!(Builtin::Decimal.check("150.00").is_ok());
        assert!(Builtin::Decimal.check("-0.5").is_ok());
        assert!(Builtin::Decimal.check("1e5").is_err());
        assert!(Builtin::Decimal.check("1_000").is_err());
        assert!(Builtin::Integer(IntegerKind::Int).check("2147483647").is_ok());
        assert!(Builtin::Integer(IntegerKind::Int).check("2147483648").is_err());
        assert!(Builtin::Integer(IntegerKind::Positive).check("0").is_err());
        assert!(Builtin::Integer(IntegerKind::Integer).check("123456789012345678901234567890123456789012").is_ok());
        assert!(Builtin::Integer(IntegerKind::Integer).check("12.0").is_err());
    }

    #[test]
    fn test_boolean_and_float() {
        assert!(Builtin::Boolean.check("true").is_ok());
        assert!(Builtin::Boolean.check("yes").is_err());
        assert!(Builtin::Double.check("-1.5E3").is_ok());
        assert!(Builtin::Double.check("INF").is_ok());
        assert!(Builtin::Double.check("inf").is_err());
    }

    #[test]
    fn test_whitespace_handling() {
        assert_eq!(Builtin::String.normalize(" a  b "), " a  b ");
        assert_eq!(Builtin::NormalizedString.normalize("a\tb"), "a b");
        assert_eq!(Builtin::Token.normalize("  a \n b "), "a b");
    }

    #[test]
    fn test_pattern_is_anchored() {
        let facets = Facets {
            pattern: Some(Pattern::compile(&[r"\d{3}".to_string()]).unwrap()),
            ..Default::default()
        };
        assert!(facets.check(Builtin::String, "123").is_ok());
        let err = facets.check(Builtin::String, "1234").unwrap_err();
        assert_eq!(err.code, "cvc-pattern-valid");
    }

    #[test]
    fn test_multiple_patterns_are_alternatives() {
        let pattern = Pattern::compile(&["a+".to_string(), "b+".to_string()]).unwrap();
        assert!(pattern.regex.is_match("aaa"));
        assert!(pattern.regex.is_match("bb"));
        assert!(!pattern.regex.is_match("ab"));
    }

    #[test]
    fn test_enumeration_and_lengths() {
        let facets = Facets {
            enumeration: vec!["M".into(), "F".into(), "I".into()],
            ..Default::default()
        };
        assert!(facets.check(Builtin::String, "F").is_ok());
        assert_eq!(facets.check(Builtin::String, "X").unwrap_err().code, "cvc-enumeration-valid");

        let facets = Facets {
            min_length: Some(2),
            max_length: Some(3),
            ..Default::default()
        };
        assert_eq!(facets.check(Builtin::String, "a").unwrap_err().code, "cvc-minLength-valid");
        assert_eq!(facets.check(Builtin::String, "abcd").unwrap_err().code, "cvc-maxLength-valid");
        assert!(facets.check(Builtin::String, "ção").is_ok());
    }

    #[test]
    fn test_digit_facets() {
        let facets = Facets {
            total_digits: Some(5),
            fraction_digits: Some(2),
            ..Default::default()
        };
        assert!(facets.check(Builtin::Decimal, "150.00").is_ok());
        assert!(facets.check(Builtin::Decimal, "999.99").is_ok());
        assert_eq!(facets.check(Builtin::Decimal, "1.005").unwrap_err().code, "cvc-fractionDigits-valid");
        assert_eq!(facets.check(Builtin::Decimal, "123456").unwrap_err().code, "cvc-totalDigits-valid");
    }
}
