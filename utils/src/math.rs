//! 128-bit fixed-point multiply/divide helpers.
//!
//! Every proportional split in the maintenance engine (budget emission,
//! worker proration, SON pay, dividend shares, fee-bucket percentages) is a
//! `a × b / c` with the product widened to 128 bits. Callers guarantee the
//! factors came from 64-bit share amounts or small rates, so the product
//! itself cannot overflow `u128`.

/// `a * b / c`, truncating. Returns 0 when `c` is 0 — callers treat an empty
/// denominator (no stake, no signed transactions) as "nothing to pay".
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> u128 {
    if c == 0 {
        return 0;
    }
    a.saturating_mul(b) / c
}

/// `ceil(a * b / c)`. Returns 0 when `c` is 0.
pub fn mul_div_ceil(a: u128, b: u128, c: u128) -> u128 {
    if c == 0 {
        return 0;
    }
    let product = a.saturating_mul(b);
    product / c + u128::from(product % c != 0)
}
