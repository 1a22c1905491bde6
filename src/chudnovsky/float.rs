//! Hand-off from the exact series integers to `rug` floats, and back out
//! to decimal digits.

use num_bigint::{BigInt, Sign};
use rug::float::Round;
use rug::integer::Order;
use rug::{Float, Integer};

use crate::error::{Error, Result};

/// Bits in an f64 mantissa.
pub const DOUBLE_PREC: u32 = 53;

pub fn to_integer(x: &BigInt) -> Integer {
    let (sign, digits) = x.to_u32_digits();
    let n = Integer::from_digits(&digits, Order::Lsf);
    if sign == Sign::Minus {
        -n
    } else {
        n
    }
}

/// `x` rounded to `prec` bits.
pub fn from_bigint(x: &BigInt, prec: u32) -> Float {
    Float::with_val(prec, to_integer(x))
}

/// ⌊value · 10^(n−1)⌋ in base 10: the first `n` digits of a value in
/// [1, 10).
pub fn to_digit_string(value: &Float, n: u64) -> Result<String> {
    let exp = u32::try_from(n.saturating_sub(1)).map_err(|_| Error::PrecisionTooLarge(n))?;
    let scale = Integer::from(Integer::u_pow_u(10, exp));
    let scaled = Float::with_val(value.prec(), value * &scale);
    let (digits, _) = scaled.to_integer_round(Round::Down).ok_or(Error::NotFinite)?;
    Ok(digits.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_integer_keeps_sign_and_limbs() {
        for s in ["0", "7", "-7", "18446744073709551617", "-340282366920938463463374607431768211457"] {
            let big: BigInt = s.parse().unwrap();
            assert_eq!(to_integer(&big).to_string(), s);
        }
    }

    #[test]
    fn test_from_bigint_rounds_to_precision() {
        let big = (BigInt::from(1u8) << 200u32) + 1u32;
        let f = from_bigint(&big, 64);
        assert_eq!(f.prec(), 64);
        assert_eq!(f, Float::with_val(64, 1u32) << 200u32);
    }

    #[test]
    fn test_digit_string() {
        let x = Float::with_val(128, Float::with_val(128, 22u32) / 7u32);
        assert_eq!(to_digit_string(&x, 10).unwrap(), "3142857142");
        assert_eq!(to_digit_string(&x, 1).unwrap(), "3");
    }

    #[test]
    fn test_digit_string_of_nan() {
        let nan = Float::with_val(64, rug::float::Special::Nan);
        assert!(matches!(to_digit_string(&nan, 5), Err(Error::NotFinite)));
    }
}
