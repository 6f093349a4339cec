#![forbid(unsafe_code)]

//! Synthetic comment producer.
//!
//! Emits a steady trickle at the configured rate plus occasional bursts,
//! the way a live chat spikes when something happens on stream. Seeded, so
//! the same seed and frame steps give the same comments.

use std::time::Duration;

use danmaku_core::Rgba;
use danmaku_runtime::DisplayRequest;

const PHRASES: &[&str] = &[
    "first",
    "nice",
    "lol",
    "here we go",
    "clutch",
    "no way",
    "gg",
    "that was close",
    "again!",
    "hello from the back row",
    "wait what",
    "88888",
    "草",
    "弾幕",
    "すごい",
    "kawaii",
    "👏👏👏",
    "pog",
    "is this live?",
    "the music though",
];

const SUFFIXES: &[&str] = &["", "", "", "!", "!!!", " w", " www", " ?", " :)"];

const PALETTE: &[Rgba] = &[
    Rgba::WHITE,
    Rgba::WHITE,
    Rgba::WHITE,
    Rgba::rgb(255, 214, 102),
    Rgba::rgb(120, 220, 255),
    Rgba::rgb(255, 128, 160),
    Rgba::rgb(150, 255, 150),
];

/// Chance per second that a burst starts.
const BURST_CHANCE_PER_SEC: f64 = 0.15;

/// Burst size range, half-open.
const BURST_MIN: u64 = 6;
const BURST_MAX: u64 = 16;

/// Deterministic LCG.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        // LCG parameters from Numerical Recipes
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform in `min..max`; `min` when the range is empty.
    pub fn next_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + (self.next_u64() % (max - min))
    }

    /// Uniform in `[0, 1]`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() as f64) / (u64::MAX as f64)
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_range(0, items.len() as u64) as usize]
    }
}

/// Generates bursty chat traffic.
#[derive(Debug, Clone)]
pub struct Producer {
    rng: SeededRng,
    rate_per_sec: f64,
    budget: f64,
    produced: u64,
}

impl Producer {
    /// A producer emitting `rate_per_sec` comments on average, not counting
    /// bursts. Negative or non-finite rates mean no trickle.
    pub fn new(seed: u64, rate_per_sec: f64) -> Self {
        let rate_per_sec = if rate_per_sec.is_finite() {
            rate_per_sec.max(0.0)
        } else {
            0.0
        };
        Self {
            rng: SeededRng::new(seed),
            rate_per_sec,
            budget: 0.0,
            produced: 0,
        }
    }

    /// Comments produced so far.
    pub fn produced(&self) -> u64 {
        self.produced
    }

    /// One random comment.
    pub fn comment(&mut self) -> DisplayRequest {
        let phrase = self.rng.pick(PHRASES);
        let suffix = self.rng.pick(SUFFIXES);
        let color = *self.rng.pick(PALETTE);
        self.produced += 1;
        DisplayRequest::new(format!("{phrase}{suffix}"), color)
    }

    /// `count` comments at once.
    pub fn burst(&mut self, count: usize) -> Vec<DisplayRequest> {
        (0..count).map(|_| self.comment()).collect()
    }

    /// Comments due after `dt` has passed.
    pub fn poll(&mut self, dt: Duration) -> Vec<DisplayRequest> {
        let secs = dt.as_secs_f64();
        self.budget += self.rate_per_sec * secs;
        let due = self.budget.floor();
        self.budget -= due;
        let mut count = due as usize;
        if self.rng.next_f64() < BURST_CHANCE_PER_SEC * secs {
            count += self.rng.next_range(BURST_MIN, BURST_MAX) as usize;
        }
        self.burst(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_comments() {
        let mut a = Producer::new(7, 10.0);
        let mut b = Producer::new(7, 10.0);
        for _ in 0..50 {
            let step = Duration::from_millis(33);
            assert_eq!(a.poll(step), b.poll(step));
        }
        assert_eq!(a.produced(), b.produced());
    }

    #[test]
    fn trickle_matches_rate() {
        // Tiny steps keep the burst chance near zero per step.
        let mut producer = Producer::new(1, 20.0);
        let mut total = 0;
        for _ in 0..100 {
            total += producer.poll(Duration::from_millis(10)).len();
        }
        // One second at 20/s, plus whatever bursts the seed rolled.
        assert!(total >= 19, "{total}");
    }

    #[test]
    fn zero_rate_is_bursts_only() {
        let mut producer = Producer::new(3, 0.0);
        let mut total = 0u64;
        for _ in 0..1000 {
            let n = producer.poll(Duration::from_millis(100)).len() as u64;
            assert!(n == 0 || (BURST_MIN..BURST_MAX).contains(&n), "{n}");
            total += n;
        }
        assert_eq!(total, producer.produced());
        assert!(total > 0);
    }

    #[test]
    fn hostile_rate_is_ignored() {
        let mut producer = Producer::new(0, f64::NAN);
        assert!(producer.poll(Duration::ZERO).is_empty());
        let mut producer = Producer::new(0, -5.0);
        assert!(producer.poll(Duration::ZERO).is_empty());
    }

    #[test]
    fn comments_are_never_empty() {
        let mut producer = Producer::new(11, 0.0);
        for request in producer.burst(200) {
            assert!(!request.text().is_empty());
            assert_eq!(request.color().a(), 255);
        }
    }

    #[test]
    fn rng_range_is_half_open() {
        let mut rng = SeededRng::new(42);
        for _ in 0..1000 {
            let v = rng.next_range(3, 7);
            assert!((3..7).contains(&v));
        }
        assert_eq!(rng.next_range(5, 5), 5);
        let f = rng.next_f64();
        assert!((0.0..=1.0).contains(&f));
    }
}
