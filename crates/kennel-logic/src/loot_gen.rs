//! Loot spawning rate.
//!
//! The generator accumulates time since the last successful spawn. The
//! chance that at least one spawn attempt succeeded over that window is
//! `1 - (1 - probability)^(elapsed / period)`; the spawn count is that chance
//! scaled by the loot shortage (dogs minus loot on the ground), rounded.

use std::time::Duration;

/// Source of the random scaling factor, expected in `[0, 1]`.
pub type RandomSource = Box<dyn FnMut() -> f64 + Send + Sync>;

pub struct LootGenerator {
    period: Duration,
    probability: f64,
    time_without_loot: Duration,
    random: RandomSource,
}

impl LootGenerator {
    /// Generator with a constant random factor of `1.0`.
    pub fn new(period: Duration, probability: f64) -> Self {
        Self::with_random(period, probability, Box::new(|| 1.0))
    }

    pub fn with_random(period: Duration, probability: f64, random: RandomSource) -> Self {
        Self {
            period,
            probability: probability.clamp(0.0, 1.0),
            time_without_loot: Duration::ZERO,
            random,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Number of loot items to spawn for this tick.
    ///
    /// Never negative and never more than `looter_count - loot_count`.
    pub fn generate(&mut self, time_delta: Duration, loot_count: usize, looter_count: usize) -> usize {
        self.time_without_loot += time_delta;
        let shortage = looter_count.saturating_sub(loot_count);
        if shortage == 0 || self.probability <= 0.0 {
            return 0;
        }

        // A zero period still gets one attempt per tick.
        let ratio = if self.period.is_zero() {
            1.0
        } else {
            self.time_without_loot.as_secs_f64() / self.period.as_secs_f64()
        };
        let chance = (1.0 - (1.0 - self.probability).powf(ratio)) * (self.random)();
        let chance = chance.clamp(0.0, 1.0);

        let generated = ((shortage as f64) * chance).round() as usize;
        let generated = generated.min(shortage);
        if generated > 0 {
            self.time_without_loot = Duration::ZERO;
        }
        generated
    }
}

impl std::fmt::Debug for LootGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LootGenerator")
            .field("period", &self.period)
            .field("probability", &self.probability)
            .field("time_without_loot", &self.time_without_loot)
            .finish()
    }
}
