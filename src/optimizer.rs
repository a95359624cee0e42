//! Optimizer session: hill climbing and simulated annealing.
//!
//! A session owns the diagram, the sampler with its raster cache, the
//! running normalization maxima and the search state. Each call to
//! [`Optimizer::step`] is one self-contained unit of work; hosts may stop
//! calling it at any time, or hand control to [`Optimizer::run_to_completion`].
//!
//! Candidates are scored on a copy of the parameter array. Only the
//! chosen move is committed to the diagram.

use std::thread;
use std::time::Duration;

use crate::annealing::{accept, AnnealingSchedule};
use crate::diagram::Diagram;
use crate::fitness::{FitnessComponents, Normalizer};
use crate::geometry::EllipseParams;
use crate::moves::{Move, MovePhase};
use crate::prng::{Pcg32, Stream};
use crate::sampler::{AreaSampler, Sample, SampleOptions};
use crate::types::{OptimizerSettings, Strategy};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// A move was committed.
    Moved { ellipse: usize, mv: Move, fitness: f64 },
    /// The step ran but kept the layout.
    Rejected,
    /// No further steps will run.
    Finished,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizerStats {
    pub steps: u32,
    pub evaluated_solutions: u64,
    pub accepted_moves: u32,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

struct Candidate {
    ellipse: usize,
    mv: Move,
    params: EllipseParams,
    fitness: f64,
    components: FitnessComponents,
}

type CompletionFn = Box<dyn FnOnce() + Send>;

pub struct Optimizer {
    diagram: Diagram,
    settings: OptimizerSettings,
    sampler: AreaSampler,
    normalizer: Normalizer,
    phase: MovePhase,
    rng: Pcg32,
    schedule: AnnealingSchedule,
    fitness: f64,
    components: FitnessComponents,
    steps: u32,
    evaluated_solutions: u64,
    accepted_moves: u32,
    finished: bool,
    on_complete: Option<CompletionFn>,
}

impl Optimizer {
    /// Start a session and score the starting layout.
    pub fn new(diagram: Diagram, settings: OptimizerSettings, seed: u64) -> Self {
        let mut optimizer = Self {
            sampler: AreaSampler::new(settings.sampler.clone()),
            schedule: AnnealingSchedule::new(settings.annealing.clone()),
            diagram,
            settings,
            normalizer: Normalizer::new(),
            phase: MovePhase::Primary,
            rng: Pcg32::for_stream(seed, Stream::Optimizer),
            fitness: 0.0,
            components: FitnessComponents::default(),
            steps: 0,
            evaluated_solutions: 0,
            accepted_moves: 0,
            finished: false,
            on_complete: None,
        };
        let params = optimizer.diagram.params();
        let (fitness, components) = optimizer.evaluate(&params);
        optimizer.fitness = fitness;
        optimizer.components = components;
        log::debug!("starting fitness {fitness}");
        optimizer
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn into_diagram(self) -> Diagram {
        self.diagram
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// Scalar fitness of the committed layout.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn components(&self) -> &FitnessComponents {
        &self.components
    }

    pub fn phase(&self) -> MovePhase {
        self.phase
    }

    pub fn temperature(&self) -> f64 {
        self.schedule.temperature()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn stats(&self) -> OptimizerStats {
        let (cache_hits, cache_misses) = self
            .sampler
            .cache()
            .map_or((0, 0), |c| (c.hits(), c.misses()));
        OptimizerStats {
            steps: self.steps,
            evaluated_solutions: self.evaluated_solutions,
            accepted_moves: self.accepted_moves,
            cache_hits,
            cache_misses,
        }
    }

    /// Sample the committed layout without touching the fitness state.
    pub fn sample(&mut self, options: SampleOptions) -> Sample {
        let params = self.diagram.params();
        self.sampler.sample(&params, options)
    }

    /// Register the callback run when the session finishes. It replaces
    /// any earlier one, and runs at once if the session already finished.
    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if self.finished {
            callback();
        } else {
            self.on_complete = Some(Box::new(callback));
        }
    }

    /// Advance the search by one step.
    pub fn step(&mut self) -> StepOutcome {
        if self.finished {
            return StepOutcome::Finished;
        }
        if self.diagram.is_empty() {
            return self.finish();
        }
        if let Some(max) = self.settings.max_steps {
            if self.steps >= max {
                return self.finish();
            }
        }

        let outcome = match self.settings.strategy {
            Strategy::HillClimbing => self.hill_climbing_step(),
            Strategy::SimulatedAnnealing => self.annealing_step(),
        };
        if outcome != StepOutcome::Finished {
            self.steps += 1;
        }
        outcome
    }

    /// Step until finished, sleeping `delay` between steps. `on_step` sees
    /// the session after every step, the final one included.
    pub fn run_to_completion<S, F>(&mut self, delay: Duration, mut on_step: S, on_complete: F)
    where
        S: FnMut(&Optimizer, &StepOutcome),
        F: FnOnce() + Send + 'static,
    {
        self.on_complete(on_complete);
        loop {
            let outcome = self.step();
            on_step(&*self, &outcome);
            if outcome == StepOutcome::Finished {
                break;
            }
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }
    }

    fn finish(&mut self) -> StepOutcome {
        self.finished = true;
        log::info!(
            "optimizer finished after {} steps, {} evaluations, fitness {}",
            self.steps,
            self.evaluated_solutions,
            self.fitness
        );
        if let Some(callback) = self.on_complete.take() {
            callback();
        }
        StepOutcome::Finished
    }

    fn evaluate(&mut self, params: &[EllipseParams]) -> (f64, FitnessComponents) {
        self.evaluated_solutions += 1;
        let options = if self.settings.sampler.track_split_zones {
            SampleOptions::with_fragments()
        } else {
            SampleOptions::areas_only()
        };
        let sample = self.sampler.sample(params, options);
        let components = FitnessComponents::compute(&self.diagram, params, &sample);
        let fitness = self.normalizer.scalar(&components, &self.settings.weights);
        (fitness, components)
    }

    /// Score `mv` applied to ellipse `index`. A collapsing resize scores
    /// infinity and is not sampled.
    fn evaluate_move(&mut self, index: usize, mv: Move) -> Candidate {
        let current = self.diagram.ellipses()[index].params;
        let target_area = self.diagram.target_area(index);
        let Some(next) = mv.apply(&current, target_area, &self.settings.moves) else {
            return Candidate {
                ellipse: index,
                mv,
                params: current,
                fitness: f64::INFINITY,
                components: FitnessComponents::default(),
            };
        };
        let mut params = self.diagram.params();
        params[index] = next;
        self.diagram.mirror_duplicates(&mut params);
        let (fitness, components) = self.evaluate(&params);
        log::trace!("ellipse {index} move {} fitness {fitness}", mv.index());
        Candidate {
            ellipse: index,
            mv,
            params: next,
            fitness,
            components,
        }
    }

    fn commit(&mut self, candidate: Candidate) -> StepOutcome {
        self.diagram.set_params(candidate.ellipse, candidate.params);
        self.fitness = candidate.fitness;
        self.components = candidate.components;
        self.accepted_moves += 1;
        log::debug!(
            "step {}: {} move {} fitness {}",
            self.steps + 1,
            self.diagram.labels()[candidate.ellipse],
            candidate.mv.index(),
            candidate.fitness
        );
        StepOutcome::Moved {
            ellipse: candidate.ellipse,
            mv: candidate.mv,
            fitness: candidate.fitness,
        }
    }

    fn hill_climbing_step(&mut self) -> StepOutcome {
        let mut best: Option<Candidate> = None;
        for i in 0..self.diagram.len() {
            if self.diagram.is_duplicate(i) {
                continue;
            }
            let current = self.diagram.ellipses()[i].params;
            let mut ellipse_best: Option<Candidate> = None;
            for &mv in self.phase.moves() {
                if !mv.applies_to(&current) {
                    continue;
                }
                let candidate = self.evaluate_move(i, mv);
                if ellipse_best
                    .as_ref()
                    .map_or(true, |b| candidate.fitness < b.fitness)
                {
                    ellipse_best = Some(candidate);
                }
            }
            let Some(candidate) = ellipse_best else {
                continue;
            };
            let to_beat = best.as_ref().map_or(self.fitness, |b| b.fitness);
            if candidate.fitness < to_beat {
                best = Some(candidate);
            }
        }

        if let Some(candidate) = best {
            return self.commit(candidate);
        }
        if self.settings.extended_moves_on_convergence && self.phase == MovePhase::Primary {
            log::debug!("hill climbing converged, switching to extended moves");
            self.phase = MovePhase::Extended;
            return StepOutcome::Rejected;
        }
        self.finish()
    }

    fn annealing_step(&mut self) -> StepOutcome {
        if !self.schedule.begin_step() {
            return self.finish();
        }
        let temperature = self.schedule.temperature();
        let mut accepted = None;
        for i in 0..self.diagram.len() {
            if self.diagram.is_duplicate(i) {
                continue;
            }
            let Some(&mv) = self.rng.choose(self.phase.moves()) else {
                continue;
            };
            if !mv.applies_to(&self.diagram.ellipses()[i].params) {
                continue;
            }
            let candidate = self.evaluate_move(i, mv);
            if accept(self.fitness, candidate.fitness, temperature, &mut self.rng) {
                accepted = Some(candidate);
                break;
            }
        }

        let outcome = match accepted {
            Some(candidate) => self.commit(candidate),
            None => {
                if self.phase == MovePhase::Primary {
                    log::debug!("no move accepted, switching to extended moves");
                    self.phase = MovePhase::Extended;
                }
                StepOutcome::Rejected
            }
        };
        self.schedule.end_step();
        outcome
    }
}
