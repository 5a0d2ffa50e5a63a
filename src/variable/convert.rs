//! Conversion of client supplied text into typed classical values.

use crate::error::Error;
use crate::variable::{VariableType, VariableValue};
use chumsky::error::Rich;
use chumsky::prelude::{choice, end, just, one_of};
use chumsky::{extra, text, Parser};

type Err<'a> = extra::Err<Rich<'a, char>>;

/// Parsed but not yet evaluated integer literal.
#[derive(Debug, PartialEq)]
struct IntLiteral<'a> {
    negative: bool,
    radix: u32,
    /// Digits with possible `_` separators.
    digits: &'a str,
}

impl IntLiteral<'_> {
    fn eval(&self) -> Option<i64> {
        let digits: String = self.digits.chars().filter(|&c| c != '_').collect();

        // `007` is ambiguous, only zeros may follow a leading zero in base 10
        if self.radix == 10 && digits.starts_with('0') && digits.chars().any(|c| c != '0') {
            return None;
        }

        let magnitude = i128::from_str_radix(&digits, self.radix).ok()?;
        let value = if self.negative { -magnitude } else { magnitude };
        i64::try_from(value).ok()
    }
}

fn digit_groups<'a>(radix: u32) -> impl Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    text::digits(radix)
        .at_least(1)
        .separated_by(just('_'))
        .at_least(1)
        .to_slice()
}

fn prefixed<'a>(
    marker: &'static str,
    radix: u32,
) -> impl Parser<'a, &'a str, (u32, &'a str), Err<'a>> + Clone {
    just('0')
        .ignore_then(one_of(marker))
        .ignore_then(just('_').or_not())
        .ignore_then(digit_groups(radix))
        .map(move |digits| (radix, digits))
}

fn int_literal<'a>() -> impl Parser<'a, &'a str, IntLiteral<'a>, Err<'a>> {
    let sign = one_of("+-").or_not().map(|sign| sign == Some('-'));
    let body = choice((
        prefixed("xX", 16),
        prefixed("oO", 8),
        prefixed("bB", 2),
        digit_groups(10).map(|digits| (10, digits)),
    ));

    sign.then(body)
        .then_ignore(end())
        .map(|(negative, (radix, digits))| IntLiteral {
            negative,
            radix,
            digits,
        })
        .labelled("integer literal")
}

fn parse_bool(raw: &str) -> Result<bool, Error> {
    match raw.to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::InvalidBool),
    }
}

fn parse_int(raw: &str) -> Result<i64, Error> {
    let literal = int_literal()
        .parse(raw)
        .into_result()
        .map_err(|_| Error::InvalidInt)?;
    literal.eval().ok_or(Error::InvalidInt)
}

fn float_literal<'a>() -> impl Parser<'a, &'a str, &'a str, Err<'a>> {
    let digits = digit_groups(10);
    let mantissa = choice((
        digits
            .clone()
            .then(just('.').then(digits.clone().or_not()).or_not())
            .ignored(),
        just('.').then(digits.clone()).ignored(),
    ));
    let exponent = one_of("eE").then(one_of("+-").or_not()).then(digits);

    one_of("+-")
        .or_not()
        .then(mantissa)
        .then(exponent.or_not())
        .to_slice()
        .then_ignore(end())
        .labelled("float literal")
}

fn parse_float(raw: &str) -> Result<f64, Error> {
    let negative = raw.starts_with('-');
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let special = match unsigned.to_ascii_lowercase().as_str() {
        "inf" | "infinity" => Some(f64::INFINITY),
        "nan" => Some(f64::NAN),
        _ => None,
    };
    if let Some(value) = special {
        return Ok(if negative { -value } else { value });
    }

    let literal = float_literal()
        .parse(raw)
        .into_result()
        .map_err(|_| Error::InvalidFloat)?;
    literal
        .replace('_', "")
        .parse::<f64>()
        .map_err(|_| Error::InvalidFloat)
}

/// Convert a raw client value into a value of declared type.
/// Return converted value and its display representation.
///
/// # Arguments
///
/// * `raw_value`: client text, surrounding whitespaces are ignored
/// * `declared_type`: type of the variable that will hold the value
pub fn convert(
    raw_value: &str,
    declared_type: VariableType,
) -> Result<(VariableValue, String), Error> {
    let cleaned = raw_value.trim();
    let value = match declared_type {
        VariableType::Bool => VariableValue::Bool(parse_bool(cleaned)?),
        VariableType::Int => VariableValue::Int(parse_int(cleaned)?),
        VariableType::Float => VariableValue::Float(parse_float(cleaned)?),
        VariableType::Unsupported => return Err(Error::UnsupportedType),
    };
    debug_assert_eq!(value.r#type(), declared_type);

    let display = value.to_string();
    Ok((value, display))
}
