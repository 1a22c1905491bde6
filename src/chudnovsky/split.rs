use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use num_bigint::BigInt;
use num_traits::{One, Zero};
use tracing::trace;

use super::factor::{remove_common_factor, Factorization};
use super::sieve::Sieve;
use super::{A, B, C};
use crate::error::{Error, Result};

pub const DEFAULT_SPLIT_RATIO: f64 = 0.5224;
pub const DEFAULT_GCD_LEVEL: u32 = 4;

/// 3·5·23·29, the odd part of C / 2^6.
const C_ODD: u64 = 10_005;
/// C³/24, the constant part of every leaf P.
const C3_OVER_24: u64 = C * C * C / 24;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tuning {
    /// Fraction of a range handed to the left child.
    pub split_ratio: f64,
    /// Recursion level from which common factors are cancelled.
    pub gcd_level: u32,
    /// Levels whose right subtree runs on its own thread.
    pub parallel_depth: u32,
}

impl Tuning {
    /// Rejects a split ratio outside (0, 1) and more threaded levels than
    /// the recursion of depth `depth` has.
    pub fn validate(&self, depth: usize) -> Result<()> {
        let ratio = self.split_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(Error::Config(format!("split ratio {} must lie in (0, 1)", ratio)));
        }
        if self.parallel_depth as usize > depth {
            return Err(Error::Config(format!(
                "parallel depth {} exceeds the recursion depth {}",
                self.parallel_depth, depth
            )));
        }
        Ok(())
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Tuning {
            split_ratio: DEFAULT_SPLIT_RATIO,
            gcd_level: DEFAULT_GCD_LEVEL,
            parallel_depth: 0,
        }
    }
}

/// P, Q, G of one term range. `fp` holds the odd part of `p`, `fg` all of
/// `g` (which is odd).
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub p: BigInt,
    pub q: BigInt,
    pub g: BigInt,
    pub fp: Factorization,
    pub fg: Factorization,
    scratch: Factorization,
}

/// Frames indexed by the number of right-branch descents from the root.
/// A slot is overwritten each time the recursion comes back to it.
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    pub fn with_depth(depth: usize) -> Self {
        let mut frames = Vec::with_capacity(depth);
        frames.resize_with(depth, Frame::default);
        FrameStack { frames }
    }

    fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn slot(&self, i: usize) -> &Frame {
        &self.frames[i]
    }

    fn slot_mut(&mut self, i: usize) -> &mut Frame {
        self.ensure(i);
        &mut self.frames[i]
    }

    fn ensure(&mut self, i: usize) {
        if self.frames.len() <= i {
            self.frames.resize_with(i + 1, Frame::default);
        }
    }

    /// Slot `i` (left child, becomes the parent) and slot `i + 1`.
    fn pair_mut(&mut self, i: usize) -> (&mut Frame, &mut Frame) {
        self.ensure(i + 1);
        let (lo, hi) = self.frames.split_at_mut(i + 1);
        (&mut lo[i], &mut hi[0])
    }

    fn take(&mut self, i: usize) -> Frame {
        std::mem::take(&mut self.frames[i])
    }
}

/// Counters shared by every thread of one splitting run.
#[derive(Debug, Default)]
pub struct SplitStats {
    terms: u64,
    leaves: AtomicU64,
    gcd_calls: AtomicU64,
    gcd_nanos: AtomicU64,
}

impl SplitStats {
    pub fn new(terms: u64) -> Self {
        SplitStats { terms, ..Default::default() }
    }

    pub fn leaves(&self) -> u64 {
        self.leaves.load(Ordering::Relaxed)
    }

    pub fn gcd_calls(&self) -> u64 {
        self.gcd_calls.load(Ordering::Relaxed)
    }

    pub fn gcd_time(&self) -> Duration {
        Duration::from_nanos(self.gcd_nanos.load(Ordering::Relaxed))
    }

    fn leaf_done(&self) {
        let done = self.leaves.fetch_add(1, Ordering::Relaxed) + 1;
        let step = (self.terms / 50).max(1);
        if done % step == 0 {
            trace!(done, terms = self.terms, "binary splitting progress");
        }
    }
}

pub struct Splitter<'s> {
    sieve: &'s Sieve,
    stats: &'s SplitStats,
    tuning: Tuning,
    stack: FrameStack,
}

impl<'s> Splitter<'s> {
    pub fn new(sieve: &'s Sieve, stats: &'s SplitStats, tuning: Tuning, depth: usize) -> Self {
        Splitter { sieve, stats, tuning, stack: FrameStack::with_depth(depth.max(1)) }
    }

    pub fn stack(&self) -> &FrameStack {
        &self.stack
    }

    /// P, Q of the range [0, terms). G is not carried up to the root.
    pub fn run(&mut self, terms: u64) -> Result<&Frame> {
        if terms == 0 {
            let root = self.stack.slot_mut(0);
            root.p = BigInt::one();
            root.q = BigInt::zero();
            root.g = BigInt::one();
            root.fp.clear();
            root.fg.clear();
        } else {
            self.split(0, terms, false, 0, 0)?;
        }
        Ok(self.stack.slot(0))
    }

    /// One node over [a, b) split at `mid` instead of the tuned ratio.
    pub fn run_split_at(&mut self, a: u64, mid: u64, b: u64, need_g: bool) -> Result<&Frame> {
        if !(a < mid && mid < b) {
            return Err(Error::Config(format!("split point {} outside ({}, {})", mid, a, b)));
        }
        self.node(a, mid, b, need_g, 0, 0)?;
        Ok(self.stack.slot(0))
    }

    pub fn into_root(mut self) -> Frame {
        self.stack.take(0)
    }

    fn split_point(&self, a: u64, b: u64) -> u64 {
        let mid = a + ((b - a) as f64 * self.tuning.split_ratio) as u64;
        mid.clamp(a + 1, b - 1)
    }

    fn split(&mut self, a: u64, b: u64, need_g: bool, level: u32, top: usize) -> Result<()> {
        if b - a == 1 {
            return self.leaf(b, top);
        }
        let mid = self.split_point(a, b);
        self.node(a, mid, b, need_g, level, top)
    }

    /// g(b-1,b) = (6b-5)(2b-1)(6b-1)
    /// p(b-1,b) = b^3 * C^3 / 24
    /// q(b-1,b) = (-1)^b * g(b-1,b) * (A + B*b)
    fn leaf(&mut self, b: u64, top: usize) -> Result<()> {
        let sieve = self.sieve;
        let f = self.stack.slot_mut(top);

        f.p = BigInt::from(b);
        f.p *= b;
        f.p *= b;
        f.p *= C3_OVER_24;

        f.g = BigInt::from(2 * b - 1);
        f.g *= 6 * b - 1;
        f.g *= 6 * b - 5;

        f.q = BigInt::from(b) * B + A;
        f.q *= &f.g;
        if b % 2 == 1 {
            f.q = -std::mem::take(&mut f.q);
        }

        // odd part of p: odd(b)^3 * 10005^3 / 3
        f.fp.set_prime_power(sieve, b >> b.trailing_zeros(), 3)?;
        f.fp.mul_prime_power(sieve, C_ODD, 3, &mut f.scratch)?;
        f.fp.divide_prime(3, 1);

        f.fg.set_prime_power(sieve, 2 * b - 1, 1)?;
        f.fg.mul_prime_power(sieve, 6 * b - 1, 1, &mut f.scratch)?;
        f.fg.mul_prime_power(sieve, 6 * b - 5, 1, &mut f.scratch)?;

        self.stats.leaf_done();
        Ok(())
    }

    /// p(a,b) = p(a,m) * p(m,b)
    /// g(a,b) = g(a,m) * g(m,b)
    /// q(a,b) = q(a,m) * p(m,b) + q(m,b) * g(a,m)
    fn node(&mut self, a: u64, mid: u64, b: u64, need_g: bool, level: u32, top: usize) -> Result<()> {
        if level < self.tuning.parallel_depth {
            self.fork(a, mid, b, need_g, level, top)?;
        } else {
            self.split(a, mid, true, level + 1, top)?;
            self.split(mid, b, need_g, level + 1, top + 1)?;
        }

        let gcd_level = self.tuning.gcd_level;
        let stats = self.stats;
        let (left, right) = self.stack.pair_mut(top);

        if level >= gcd_level {
            let start = Instant::now();
            remove_common_factor(&mut right.p, &mut right.fp, &mut left.g, &mut left.fg);
            stats.gcd_nanos.fetch_add(start.elapsed().as_nanos() as u64, Ordering::Relaxed);
            stats.gcd_calls.fetch_add(1, Ordering::Relaxed);
        }

        left.p *= &right.p;
        left.q *= &right.p;
        right.q *= &left.g;
        left.q += &right.q;
        left.fp.mul_assign(&right.fp, &mut left.scratch);

        if need_g {
            left.g *= &right.g;
            left.fg.mul_assign(&right.fg, &mut left.scratch);
        }

        trace!(a, b, p = %left.fp, "p factors");
        if need_g {
            trace!(a, b, g = %left.fg, "g factors");
        }
        Ok(())
    }

    /// Runs the right subtree on a scoped thread with its own stack while
    /// the left subtree runs here, then parks its result in slot `top + 1`.
    fn fork(&mut self, a: u64, mid: u64, b: u64, need_g: bool, level: u32, top: usize) -> Result<()> {
        let (sieve, stats, tuning) = (self.sieve, self.stats, self.tuning);
        let depth = self.stack.len();

        let (left, right) = thread::scope(|scope| {
            let worker = scope.spawn(move || -> Result<Frame> {
                let mut splitter = Splitter::new(sieve, stats, tuning, depth);
                splitter.split(mid, b, need_g, level + 1, 0)?;
                Ok(splitter.into_root())
            });
            let left = self.split(a, mid, true, level + 1, top);
            let right = worker.join().map_err(|_| Error::WorkerPanicked);
            (left, right)
        });

        left?;
        *self.stack.slot_mut(top + 1) = right??;
        Ok(())
    }
}
