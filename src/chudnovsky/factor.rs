use std::fmt;

use num_bigint::BigInt;
use num_traits::One;

use super::sieve::Sieve;
use crate::error::Result;

/// Below this many prime powers the integer is built with a plain loop.
const PRODUCT_LEAF: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimePower {
    pub prime: u64,
    pub exp: u64,
}

/// A positive integer kept as prime powers in ascending prime order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Factorization {
    powers: Vec<PrimePower>,
}

impl Factorization {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn powers(&self) -> &[PrimePower] {
        &self.powers
    }

    pub fn len(&self) -> usize {
        self.powers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.powers.is_empty()
    }

    pub fn clear(&mut self) {
        self.powers.clear();
    }

    /// self = base^exp, for odd `base` within the sieve.
    pub fn set_prime_power(&mut self, sieve: &Sieve, base: u64, exp: u64) -> Result<()> {
        self.powers.clear();
        for (prime, e) in sieve.factors(base)? {
            self.powers.push(PrimePower { prime, exp: e * exp });
        }
        Ok(())
    }

    /// self *= base^exp. `scratch` is clobbered.
    pub fn mul_prime_power(
        &mut self,
        sieve: &Sieve,
        base: u64,
        exp: u64,
        scratch: &mut Factorization,
    ) -> Result<()> {
        let mut term = Factorization::new();
        term.set_prime_power(sieve, base, exp)?;
        self.mul_assign(&term, scratch);
        Ok(())
    }

    pub fn multiply(f: &Factorization, g: &Factorization) -> Factorization {
        let mut out = Factorization { powers: Vec::with_capacity(f.len() + g.len()) };
        merge(&mut out.powers, &f.powers, &g.powers);
        out
    }

    /// self *= other, merging through `scratch` and swapping buffers so
    /// neither allocation is dropped.
    pub fn mul_assign(&mut self, other: &Factorization, scratch: &mut Factorization) {
        scratch.powers.clear();
        merge(&mut scratch.powers, &self.powers, &other.powers);
        std::mem::swap(&mut self.powers, &mut scratch.powers);
    }

    /// Lowers the exponent of `prime` by up to `exp`.
    pub fn divide_prime(&mut self, prime: u64, exp: u64) {
        if let Ok(i) = self.powers.binary_search_by_key(&prime, |pp| pp.prime) {
            self.powers[i].exp = self.powers[i].exp.saturating_sub(exp);
            self.compact();
        }
    }

    /// Drops zero exponents.
    pub fn compact(&mut self) {
        self.powers.retain(|pp| pp.exp > 0);
    }

    pub fn to_bigint(&self) -> BigInt {
        product(&self.powers)
    }
}

impl fmt::Display for Factorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for pp in &self.powers {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            if pp.exp == 1 {
                write!(f, "{}", pp.prime)?;
            } else {
                write!(f, "{}^{}", pp.prime, pp.exp)?;
            }
        }
        Ok(())
    }
}

fn merge(out: &mut Vec<PrimePower>, f: &[PrimePower], g: &[PrimePower]) {
    let (mut i, mut j) = (0, 0);
    while i < f.len() && j < g.len() {
        if f[i].prime == g[j].prime {
            out.push(PrimePower { prime: f[i].prime, exp: f[i].exp + g[j].exp });
            i += 1;
            j += 1;
        } else if f[i].prime < g[j].prime {
            out.push(f[i]);
            i += 1;
        } else {
            out.push(g[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&f[i..]);
    out.extend_from_slice(&g[j..]);
}

fn product(powers: &[PrimePower]) -> BigInt {
    if powers.len() <= PRODUCT_LEAF {
        let mut r = BigInt::one();
        for pp in powers {
            r *= BigInt::from(pp.prime).pow(pp.exp as u32);
        }
        r
    } else {
        let mid = powers.len() / 2;
        product(&powers[..mid]) * product(&powers[mid..])
    }
}

/// Divides `p` and `g` by the common factor of `fp` and `fg`, removing the
/// cancelled exponents from both factorizations. Returns the divisor.
pub fn remove_common_factor(
    p: &mut BigInt,
    fp: &mut Factorization,
    g: &mut BigInt,
    fg: &mut Factorization,
) -> BigInt {
    if fp.is_empty() || fg.is_empty() {
        return BigInt::one();
    }

    let mut common = Vec::with_capacity(fp.len().min(fg.len()));
    let (mut i, mut j) = (0, 0);
    while i < fp.powers.len() && j < fg.powers.len() {
        let (a, b) = (&mut fp.powers[i], &mut fg.powers[j]);
        if a.prime == b.prime {
            let c = a.exp.min(b.exp);
            a.exp -= c;
            b.exp -= c;
            common.push(PrimePower { prime: a.prime, exp: c });
            i += 1;
            j += 1;
        } else if a.prime < b.prime {
            i += 1;
        } else {
            j += 1;
        }
    }

    if common.is_empty() {
        return BigInt::one();
    }

    let gcd = product(&common);
    *p /= &gcd;
    *g /= &gcd;
    fp.compact();
    fg.compact();
    gcd
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sieve() -> Sieve {
        Sieve::new(200_001)
    }

    fn random_factorization(s: &Sieve, rng: &mut StdRng, terms: usize) -> Factorization {
        let mut f = Factorization::new();
        let mut scratch = Factorization::new();
        for _ in 0..terms {
            let base = rng.gen_range(0..100_000u64) * 2 + 1;
            let exp = rng.gen_range(1..4u64);
            f.mul_prime_power(s, base, exp, &mut scratch).unwrap();
        }
        f
    }

    #[test]
    fn test_set_prime_power() {
        let s = sieve();
        let mut f = Factorization::new();
        f.set_prime_power(&s, 45, 3).unwrap();
        assert_eq!(
            f.powers(),
            &[PrimePower { prime: 3, exp: 6 }, PrimePower { prime: 5, exp: 3 }]
        );
        assert_eq!(f.to_bigint(), BigInt::from(45u64).pow(3));
        assert_eq!(f.to_string(), "3^6 5^3");
    }

    #[test]
    fn test_set_prime_power_out_of_range() {
        let s = Sieve::new(1_001);
        let mut f = Factorization::new();
        assert!(f.set_prime_power(&s, 1_003, 1).is_err());
        assert!(f.set_prime_power(&s, 10, 1).is_err());
        let mut scratch = Factorization::new();
        assert!(f.mul_prime_power(&s, 12, 2, &mut scratch).is_err());
    }

    #[test]
    fn test_multiply_commutes_and_associates() {
        let s = sieve();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let f = random_factorization(&s, &mut rng, 4);
            let g = random_factorization(&s, &mut rng, 3);
            let h = random_factorization(&s, &mut rng, 5);

            let fg = Factorization::multiply(&f, &g);
            let gf = Factorization::multiply(&g, &f);
            assert_eq!(fg.to_bigint(), gf.to_bigint());
            assert_eq!(fg.to_bigint(), f.to_bigint() * g.to_bigint());

            let left = Factorization::multiply(&fg, &h);
            let right = Factorization::multiply(&f, &Factorization::multiply(&g, &h));
            assert_eq!(left, right);
            assert!(left.powers().windows(2).all(|w| w[0].prime < w[1].prime));
        }
    }

    #[test]
    fn test_mul_assign_reuses_scratch() {
        let s = sieve();
        let mut f = Factorization::new();
        f.set_prime_power(&s, 15, 1).unwrap();
        let mut g = Factorization::new();
        g.set_prime_power(&s, 21, 2).unwrap();
        let mut scratch = Factorization::new();
        f.mul_assign(&g, &mut scratch);
        assert_eq!(f.to_bigint(), BigInt::from(15u64 * 21 * 21));
    }

    #[test]
    fn test_divide_prime_compacts() {
        let s = sieve();
        let mut f = Factorization::new();
        f.set_prime_power(&s, 15, 1).unwrap();
        f.divide_prime(3, 1);
        assert_eq!(f.powers(), &[PrimePower { prime: 5, exp: 1 }]);
        f.divide_prime(7, 1);
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn test_remove_common_factor_round_trip() {
        let s = sieve();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let mut fp = random_factorization(&s, &mut rng, 6);
            let mut fg = random_factorization(&s, &mut rng, 6);
            let p_before = fp.to_bigint() * 64u32;
            let g_before = fg.to_bigint();
            let (mut p, mut g) = (p_before.clone(), g_before.clone());

            let gcd = remove_common_factor(&mut p, &mut fp, &mut g, &mut fg);

            assert_eq!(&p * &gcd, p_before);
            assert_eq!(&g * &gcd, g_before);
            assert_eq!(fp.to_bigint() * 64u32, p);
            assert_eq!(fg.to_bigint(), g);
            assert!(fp.powers().iter().all(|pp| pp.exp > 0));
            assert!(fg.powers().iter().all(|pp| pp.exp > 0));
            // nothing shared is left behind
            assert!(fp
                .powers()
                .iter()
                .all(|a| fg.powers().iter().all(|b| a.prime != b.prime)));
        }
    }

    #[test]
    fn test_remove_common_factor_coprime() {
        let s = sieve();
        let mut fp = Factorization::new();
        fp.set_prime_power(&s, 9, 1).unwrap();
        let mut fg = Factorization::new();
        fg.set_prime_power(&s, 35, 1).unwrap();
        let (mut p, mut g) = (BigInt::from(9), BigInt::from(35));
        let gcd = remove_common_factor(&mut p, &mut fp, &mut g, &mut fg);
        assert_eq!(gcd, BigInt::one());
        assert_eq!((p, g), (BigInt::from(9), BigInt::from(35)));
    }

    #[test]
    fn test_balanced_product_matches_flat() {
        let s = sieve();
        let mut rng = StdRng::seed_from_u64(3);
        let f = random_factorization(&s, &mut rng, 60);
        assert!(f.len() > PRODUCT_LEAF);
        let flat = f
            .powers()
            .iter()
            .fold(BigInt::one(), |acc, pp| acc * BigInt::from(pp.prime).pow(pp.exp as u32));
        assert_eq!(f.to_bigint(), flat);
    }
}
