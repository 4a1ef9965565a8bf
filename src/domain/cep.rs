//! Postal-code (CEP) shaping and the served-range containment lookup.

use crate::domain::model::ServedRange;

/// Digits in a range boundary or base code.
pub const CEP_LEN: usize = 5;
/// Digits in the excluded segment appended to a base code.
pub const SEGMENT_LEN: usize = 3;
/// Digits in a complete CEP, as accepted by the blocked list.
pub const FULL_CEP_LEN: usize = 8;

/// Keeps ASCII digits only and caps the result at `max_len` characters.
pub fn sanitize(input: &str, max_len: usize) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(max_len)
        .collect()
}

/// Left-pads with zeros to `width`, then keeps the first `width` characters.
pub fn normalize(code: &str, width: usize) -> String {
    let padded = format!("{:0>width$}", code, width = width);
    padded.chars().take(width).collect()
}

fn numeric(code: &str) -> Option<u32> {
    code.parse().ok()
}

/// Id of the first served range whose `[start, end]` holds `base`.
///
/// Bounds are compared numerically after normalization. Ranges without an id
/// (never written) and non-numeric bounds never match.
pub fn resolve_enclosing(served: &[ServedRange], base: &str) -> Option<i64> {
    let base = numeric(&normalize(base, CEP_LEN))?;
    served
        .iter()
        .find(|range| {
            match (
                numeric(&normalize(&range.cep_inicial, CEP_LEN)),
                numeric(&normalize(&range.cep_final, CEP_LEN)),
            ) {
                (Some(start), Some(end)) => start <= base && base <= end,
                _ => false,
            }
        })
        .and_then(|range| range.id)
}
