//! Square root and division by Newton iteration with doubling precision.
//!
//! Both routines start from an f64 seed of the reciprocal (square root),
//! refine it with one Newton step per precision level, and finish with a
//! step that folds in the numerator so the last level runs on half-size
//! operands. Each step squares or multiplies at the level's full precision
//! and forms its correction at half precision, resizing operands in place
//! with `set_prec`.

use rug::Float;

use super::float::DOUBLE_PREC;

/// Extra bits carried at every level so truncation never eats into the
/// bits the next level relies on.
const GUARD_BITS: u32 = 32;

/// Highest level served directly by the f64 seed. One Newton step from a
/// seed good to ~52 bits must clear twice this.
const SEED_PREC: u32 = 50;

/// Working precisions from the seed level up to `target`, each level at
/// least half of the next.
pub fn precision_schedule(target: u32) -> Vec<u32> {
    let mut levels = vec![target];
    let mut prec = target;
    while prec > SEED_PREC {
        prec = (prec + 1) / 2;
        levels.push(prec);
    }
    levels.reverse();
    levels
}

/// √x to `prec` bits.
pub fn sqrt_u64(x: u64, prec: u32) -> Float {
    if prec <= DOUBLE_PREC {
        return Float::with_val(prec, (x as f64).sqrt());
    }

    let levels = precision_schedule(prec);
    let mut t = Float::with_val(DOUBLE_PREC, (x as f64).sqrt().recip());

    // t -= t * (x*t*t - 1) / 2
    for &p in &levels[1..levels.len() - 1] {
        let (full, half) = (p + GUARD_BITS, p / 2 + GUARD_BITS);
        t.set_prec(full);
        let mut e = Float::with_val(full, t.square_ref());
        e *= x;
        e -= 1u32;
        e.set_prec(half);
        let mut correction = Float::with_val(half, &e * &t);
        correction >>= 1u32;
        t -= &correction;
    }

    // r = x*t;  r -= t * (r*r - x) / 2
    let (full, half) = (prec + GUARD_BITS, prec / 2 + GUARD_BITS);
    t.set_prec(half);
    let r = Float::with_val(half, &t * x);
    let mut residual = Float::with_val(full, r.square_ref());
    residual -= x;
    let mut correction = Float::with_val(half, &t * &residual);
    correction >>= 1u32;
    let mut root = Float::with_val(full, &r - &correction);
    root.set_prec(prec);
    root
}

/// y / x to `prec` bits. `x` must be finite and non-zero.
pub fn div(y: &Float, x: &Float, prec: u32) -> Float {
    let (xf, xe) = x.to_f64_exp();
    if prec <= DOUBLE_PREC {
        let (yf, ye) = y.to_f64_exp();
        let mut quotient = Float::with_val(prec, yf / xf);
        quotient <<= ye - xe;
        return quotient;
    }

    let levels = precision_schedule(prec);
    let mut t = Float::with_val(DOUBLE_PREC, xf.recip());
    t >>= xe;

    // t -= t * (x*t - 1)
    for &p in &levels[1..levels.len() - 1] {
        let (full, half) = (p + GUARD_BITS, p / 2 + GUARD_BITS);
        t.set_prec(full);
        let mut e = Float::with_val(full, x * &t);
        e -= 1u32;
        e.set_prec(half);
        let correction = Float::with_val(half, &e * &t);
        t -= &correction;
    }

    // r = y*t;  r -= t * (x*r - y)
    let (full, half) = (prec + GUARD_BITS, prec / 2 + GUARD_BITS);
    t.set_prec(half);
    let r = Float::with_val(half, y * &t);
    let mut residual = Float::with_val(full, x * &r);
    residual -= y;
    let correction = Float::with_val(half, &t * &residual);
    let mut quotient = Float::with_val(full, &r - &correction);
    quotient.set_prec(prec);
    quotient
}
