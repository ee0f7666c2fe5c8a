//! Parsing of Kubernetes resource quantities (`500m`, `128Mi`, `1e3`).

use crate::error::HandlerError;

/// Parses a quantity string into its numeric value in base units
/// (cores for CPU, bytes for memory, plain counts otherwise).
pub fn parse_quantity(raw: &str) -> Result<f64, HandlerError> {
    let invalid = || HandlerError::InvalidQuantity(raw.to_string());

    let s = raw.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-')))
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);
    let base: f64 = number.parse().map_err(|_| invalid())?;

    let binary = |power: i32| -> Result<f64, HandlerError> { Ok(base * 1024.0_f64.powi(power)) };
    let exponent: i32 = match suffix {
        "Ki" => return binary(1),
        "Mi" => return binary(2),
        "Gi" => return binary(3),
        "Ti" => return binary(4),
        "Pi" => return binary(5),
        "Ei" => return binary(6),
        "" => 0,
        "n" => -9,
        "u" => -6,
        "m" => -3,
        "k" => 3,
        "M" => 6,
        "G" => 9,
        "T" => 12,
        "P" => 15,
        "E" => 18,
        exp if exp.starts_with(['e', 'E']) => exp[1..].parse().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    // Divide for negative exponents so values like 250m come out exact.
    if exponent < 0 {
        Ok(base / 10.0_f64.powi(-exponent))
    } else {
        Ok(base * 10.0_f64.powi(exponent))
    }
}
