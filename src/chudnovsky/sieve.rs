use crate::error::{Error, Result};

/// Smallest prime factor of an odd integer, its exponent, and the table
/// index of the cofactor left once that prime power is divided out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SieveEntry {
    pub prime: u64,
    pub exp: u64,
    pub next: usize,
}

/// Factor table over the odd integers `1..=bound`. Odd `n` lives at index
/// `n / 2`; index 0 is the identity.
pub struct Sieve {
    bound: u64,
    table: Vec<SieveEntry>,
}

impl Sieve {
    pub fn new(bound: u64) -> Self {
        let bound = bound.max(1);
        let mut table = vec![SieveEntry::default(); (bound / 2 + 1) as usize];
        table[0] = SieveEntry { prime: 1, exp: 1, next: 0 };

        let root = isqrt(bound);
        let mut i = 3u64;
        while i <= bound {
            let idx = (i / 2) as usize;
            if table[idx].prime == 0 {
                table[idx] = SieveEntry { prime: i, exp: 1, next: 0 };

                if i <= root {
                    // k tracks the index of j / i as j walks the odd multiples
                    let mut j = i * i;
                    let mut k = idx;
                    while j <= bound {
                        let jdx = (j / 2) as usize;
                        if table[jdx].prime == 0 {
                            let cofactor = table[k];
                            table[jdx] = if cofactor.prime == i {
                                SieveEntry { prime: i, exp: cofactor.exp + 1, next: cofactor.next }
                            } else {
                                SieveEntry { prime: i, exp: 1, next: k }
                            };
                        }
                        j += 2 * i;
                        k += 1;
                    }
                }
            }
            i += 2;
        }

        Sieve { bound, table }
    }

    pub fn bound(&self) -> u64 {
        self.bound
    }

    /// Table entry of odd `n`; 1 maps to the identity entry.
    pub fn entry(&self, n: u64) -> Result<SieveEntry> {
        if n % 2 == 0 || n > self.bound {
            return Err(Error::OutOfSieveRange { value: n, bound: self.bound });
        }
        Ok(self.table[(n / 2) as usize])
    }

    /// Prime powers of odd `n` in ascending prime order.
    pub fn factors(&self, n: u64) -> Result<Factors<'_>> {
        let current = self.entry(n)?;
        Ok(Factors { table: &self.table, current })
    }
}

pub struct Factors<'a> {
    table: &'a [SieveEntry],
    current: SieveEntry,
}

impl Iterator for Factors<'_> {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.prime == 1 {
            return None;
        }
        let e = self.current;
        self.current = self.table[e.next];
        Some((e.prime, e.exp))
    }
}

fn isqrt(n: u64) -> u64 {
    let n = n as u128;
    let mut r = (n as f64).sqrt() as u128;
    while r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_prime(n: u64) -> bool {
        n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
    }

    #[test]
    fn test_identity_entry() {
        let s = Sieve::new(101);
        assert_eq!(s.entry(1).unwrap(), SieveEntry { prime: 1, exp: 1, next: 0 });
        assert_eq!(s.factors(1).unwrap().count(), 0);
    }

    #[test]
    fn test_small_factorizations() {
        let s = Sieve::new(10_005);
        let f = |n| s.factors(n).unwrap().collect::<Vec<_>>();
        assert_eq!(f(3), vec![(3, 1)]);
        assert_eq!(f(9), vec![(3, 2)]);
        assert_eq!(f(45), vec![(3, 2), (5, 1)]);
        assert_eq!(f(243), vec![(3, 5)]);
        assert_eq!(f(10_005), vec![(3, 1), (5, 1), (23, 1), (29, 1)]);
        assert_eq!(f(9_409), vec![(97, 2)]);
    }

    #[test]
    fn test_every_odd_value_reconstructs() {
        let bound = 30_001;
        let s = Sieve::new(bound);
        for n in (1..=bound).step_by(2) {
            let mut product = 1u64;
            let mut last = 1u64;
            for (p, e) in s.factors(n).unwrap() {
                assert!(p > last, "primes out of order for {n}");
                assert!(is_prime(p), "{p} listed as a factor of {n} is not prime");
                assert!(e > 0);
                product *= p.pow(e as u32);
                last = p;
            }
            assert_eq!(product, n, "chain of {n} does not reconstruct it");
        }
    }

    #[test]
    fn test_out_of_range() {
        let s = Sieve::new(99);
        assert!(s.entry(99).is_ok());
        match s.factors(101) {
            Err(Error::OutOfSieveRange { value, bound }) => {
                assert_eq!(value, 101);
                assert_eq!(bound, 99);
            }
            _ => panic!("expected OutOfSieveRange"),
        }
    }

    #[test]
    fn test_even_values_are_rejected() {
        let s = Sieve::new(1_001);
        for n in [0, 2, 10, 1_000] {
            assert!(
                matches!(s.factors(n), Err(Error::OutOfSieveRange { value, .. }) if value == n),
                "{n} was accepted"
            );
            assert!(s.entry(n).is_err());
        }
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(15), 3);
        assert_eq!(isqrt(16), 4);
        assert_eq!(isqrt(u32::MAX as u64 * u32::MAX as u64), u32::MAX as u64);
        assert_eq!(isqrt(u64::MAX), u32::MAX as u64);
        assert_eq!(isqrt(u64::MAX - 1), u32::MAX as u64);
    }
}
