use std::sync::LazyLock;

use regex::Regex;

use crate::constants::FLOAT_FRACTION_DIGITS;
use crate::oem_errors::OemError;

static FLOAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("float pattern")
});

/// Format a floating value in OEM scientific notation.
///
/// The mantissa is always signed and carries [`FLOAT_FRACTION_DIGITS`] fractional digits,
/// the exponent is signed with at least two digits: `+6.77816180000000e+03`.
///
/// Arguments
/// -----------------
/// * `value`: the number to write
///
/// Return
/// ----------
/// * The formatted string.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "+nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+inf" } else { "-inf" }.to_string();
    }

    let raw = format!("{:.*e}", FLOAT_FRACTION_DIGITS, value);
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let mantissa = if value.is_sign_negative() {
        mantissa.to_string()
    } else {
        format!("+{mantissa}")
    };
    let exp_sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{exp_sign}{:02}", exponent.abs())
}

/// Parse a numeric token (plain decimal or exponent form).
///
/// `inf`, `nan` and hexadecimal forms are refused even though `f64::from_str` would
/// take some of them.
pub fn parse_float(text: &str) -> Result<f64, OemError> {
    let text = text.trim();
    if !FLOAT_PATTERN.is_match(text) {
        return Err(OemError::Validation(format!(
            "Invalid numeric value: '{text}'"
        )));
    }
    text.parse::<f64>()
        .map_err(|_| OemError::Validation(format!("Invalid numeric value: '{text}'")))
}

/// Parse a non-negative integer field. Integral floats such as `5.0` are accepted.
pub fn parse_integer(text: &str) -> Result<u32, OemError> {
    let text = text.trim();
    if let Ok(value) = text.parse::<u32>() {
        return Ok(value);
    }
    let value = parse_float(text)?;
    if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
        return Err(OemError::Validation(format!(
            "Expected a non-negative integer, got '{text}'"
        )));
    }
    Ok(value as u32)
}

/// `true` when the token looks like a number. Used by the KVN line classifier.
pub(crate) fn is_float(text: &str) -> bool {
    FLOAT_PATTERN.is_match(text)
}

#[cfg(test)]
mod conversion_test {
    use super::*;

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(6778.1618), "+6.77816180000000e+03");
        assert_eq!(format_float(-0.000125), "-1.25000000000000e-04");
        assert_eq!(format_float(0.0), "+0.00000000000000e+00");
        assert_eq!(format_float(1.5e120), "+1.50000000000000e+120");
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("1.0").unwrap(), 1.0);
        assert_eq!(parse_float("-.5").unwrap(), -0.5);
        assert_eq!(parse_float("+2.5E-3").unwrap(), 2.5e-3);
        assert_eq!(parse_float("7.").unwrap(), 7.0);
        assert!(parse_float("inf").is_err());
        assert!(parse_float("NaN").is_err());
        assert!(parse_float("1.0.0").is_err());
        assert!(parse_float("").is_err());
    }

    #[test]
    fn test_parse_float_reads_formatted_output() {
        let value = -3.141592653589793e-7;
        let back = parse_float(&format_float(value)).unwrap();
        approx::assert_relative_eq!(back, value, max_relative = 1e-14);
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer("7").unwrap(), 7);
        assert_eq!(parse_integer("5.0").unwrap(), 5);
        assert!(parse_integer("5.1").is_err());
        assert!(parse_integer("-3").is_err());
        assert!(parse_integer("five").is_err());
    }
}
