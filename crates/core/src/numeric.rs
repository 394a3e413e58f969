//! Numeric coercion for form-style inputs.
//!
//! Form fields arrive as free text. A value is read from its longest
//! leading decimal prefix (`"0.9"` and `"0.9mm"` both read as `0.9`);
//! anything without a leading number, or whose number is not finite,
//! yields `None` so the caller can substitute the field's default.

/// Parse the leading decimal number of `input`.
///
/// Leading whitespace is skipped. Accepts an optional sign, digits with an
/// optional fractional part, and an optional exponent. Returns `None` when
/// no digits are found or the result is not finite.
pub fn parse_float(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse `input`, falling back to `default` when it is absent or not finite.
pub fn coerce_float(input: &str, default: f64) -> f64 {
    parse_float(input).unwrap_or(default)
}
