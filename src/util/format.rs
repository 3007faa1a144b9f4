//! Number formatting matching iostream default (`%g`) output.
//!
//! Callback templates are handed to host scripting engines, which expect the
//! same text the host's own C++ stream formatting produces.

/// Significant digits guaranteed for `f64` (`digits10`).
pub const F64_DIGITS: usize = 15;

/// Significant digits guaranteed for `f32` (`digits10`).
pub const F32_DIGITS: usize = 6;

/// Format `value` in general notation with `precision` significant digits.
///
/// Trailing zeros are removed; scientific notation is used when the decimal
/// exponent is below -4 or not below `precision`.
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0".to_string() } else { "0".to_string() };
    }

    let precision = precision.max(1);

    // Round once in scientific form to learn the exponent after rounding.
    let sci = format!("{:.*e}", precision - 1, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= precision as i32 {
        let mantissa = trim_fraction(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        let decimals = (precision as i32 - 1 - exp).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
