//! Simulated annealing schedule and acceptance.
//!
//! Temperature starts hot and cools geometrically: after every
//! `temperature_iterations` steps it is multiplied by `cool_down`, and the
//! run ends once `max_iterations` such rounds have elapsed. Fitness is
//! minimized, so a candidate is worse when its value is larger.

use crate::prng::Pcg32;
use crate::types::AnnealingSettings;

/// Metropolis acceptance for minimization.
///
/// Improvements are always accepted and draw nothing. At `T <= 0` anything
/// else is rejected, also without a draw. Otherwise one `next_float()` is
/// consumed and the candidate is accepted with `P = exp(-(candidate -
/// current) / T)`.
pub fn accept(current: f64, candidate: f64, temperature: f64, rng: &mut Pcg32) -> bool {
    let delta = candidate - current;
    if delta < 0.0 {
        return true;
    }
    if temperature <= 0.0 {
        return false;
    }
    let p = (-delta / temperature).exp();
    rng.next_float() < p
}

#[derive(Debug, Clone)]
pub struct AnnealingSchedule {
    settings: AnnealingSettings,
    temperature: f64,
    anneal_iteration: u32,
    temperature_iteration: u32,
}

impl AnnealingSchedule {
    pub fn new(settings: AnnealingSettings) -> Self {
        Self {
            temperature: settings.initial_temperature,
            settings,
            anneal_iteration: 0,
            temperature_iteration: 0,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Cool down if the current temperature round is used up. Returns
    /// false once every round has been run.
    pub fn begin_step(&mut self) -> bool {
        if self.temperature_iteration >= self.settings.temperature_iterations {
            self.anneal_iteration += 1;
            self.temperature_iteration = 0;
            self.temperature *= self.settings.cool_down;
            log::debug!(
                "annealing round {} at temperature {}",
                self.anneal_iteration,
                self.temperature
            );
        }
        self.anneal_iteration < self.settings.max_iterations
    }

    pub fn end_step(&mut self) {
        self.temperature_iteration += 1;
    }

    /// Steps a complete run takes.
    pub fn total_steps(&self) -> u64 {
        self.settings.max_iterations as u64 * self.settings.temperature_iterations.max(1) as u64
    }
}
