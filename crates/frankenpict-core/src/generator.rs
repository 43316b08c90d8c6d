//! Seeded greedy covering-array generator.
//!
//! Each accepted row comes from a pool of candidates. A candidate fixes the
//! values of one randomly chosen uncovered obligation and fills every other
//! position at random (weighted, exclusion-aware). The best-scoring candidate
//! is hill-climbed one position at a time and appended. Seed rows go first
//! with their bound positions held fixed.
//!
//! Submodels add higher-order subsets to the same coverage tracker, so the
//! greedy loop and the fallback treat their obligations like any other.
//!
//! Every random decision draws from one [`SeededRng`] owned by the run, so a
//! given (space, order, constraints, config, seed) always yields the same
//! rows in the same order.

use serde::{Deserialize, Serialize};

use crate::array::{CoveringArray, Row};
use crate::config::{GeneratorConfig, RefineMode};
use crate::constraint::{ExclusionSet, SeedRow};
use crate::error::{CoverError, Result};
use crate::rng::SeededRng;
use crate::space::ParameterSpace;
use crate::submodel::{Submodel, obligation_count_with_submodels};
use crate::tracker::CoverageTracker;

/// Counters describing one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub obligations_total: u64,
    /// Blocked up front by an exclusion.
    pub obligations_excluded: u64,
    /// Not blocked directly, but no exclusion-free row contains them.
    pub obligations_infeasible: u64,
    pub rows: usize,
    pub seeded_rows: usize,
    pub fallback_rows: usize,
    pub candidates_scored: u64,
    pub refine_moves: u64,
}

/// Immutable generation request. Cheap to share between threads; each
/// [`Generator::run`] owns its own state.
#[derive(Debug, Clone)]
pub struct Generator {
    space: ParameterSpace,
    order: usize,
    exclusions: ExclusionSet,
    seed_rows: Vec<SeedRow>,
    submodels: Vec<Submodel>,
    config: GeneratorConfig,
}

impl Generator {
    /// # Errors
    ///
    /// `InvalidInput` if `order` is zero or exceeds the parameter count.
    pub fn new(space: ParameterSpace, order: usize) -> Result<Self> {
        space.check_order(order)?;
        let exclusions = ExclusionSet::empty(&space);
        Ok(Self {
            space,
            order,
            exclusions,
            seed_rows: Vec::new(),
            submodels: Vec::new(),
            config: GeneratorConfig::default(),
        })
    }

    /// # Errors
    ///
    /// `InvalidInput` if an exclusion is malformed for this space.
    pub fn with_exclusions(mut self, raw: &[Vec<(usize, usize)>]) -> Result<Self> {
        self.exclusions = ExclusionSet::new(&self.space, raw)?;
        Ok(self)
    }

    /// Cover every `order`-subset of `positions` in addition to the model's
    /// own t-subsets. Repeatable; overlapping submodels share subsets.
    ///
    /// # Errors
    ///
    /// `InvalidInput` from [`Submodel::new`].
    pub fn with_submodel(mut self, positions: &[usize], order: usize) -> Result<Self> {
        let submodel = Submodel::new(&self.space, positions, order)?;
        self.submodels.push(submodel);
        Ok(self)
    }

    /// Seed rows are checked against the space and the exclusions when the
    /// generator runs.
    #[must_use]
    pub fn with_seed_rows(mut self, rows: Vec<SeedRow>) -> Self {
        self.seed_rows = rows;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn space(&self) -> &ParameterSpace {
        &self.space
    }

    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    #[must_use]
    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    #[must_use]
    pub fn submodels(&self) -> &[Submodel] {
        &self.submodels
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// # Errors
    ///
    /// See [`Generator::run_with_stats`].
    pub fn run(&self, seed: u64) -> Result<CoveringArray> {
        self.run_with_stats(seed).map(|(array, _)| array)
    }

    /// Build a covering array.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a bad seed row, `Overflow` if the obligation count
    /// exceeds `config.max_obligations`. Both are raised before any
    /// generation work.
    pub fn run_with_stats(&self, seed: u64) -> Result<(CoveringArray, GenerationStats)> {
        for seed_row in &self.seed_rows {
            seed_row.check(&self.space, &self.exclusions)?;
        }
        let obligations =
            obligation_count_with_submodels(&self.space, self.order, &self.submodels)?;
        if obligations > u128::from(self.config.max_obligations) {
            return Err(CoverError::Overflow {
                obligations,
                limit: self.config.max_obligations,
            });
        }

        let tracker =
            CoverageTracker::new(&self.space, self.order, &self.submodels, &self.exclusions);
        let mut run = Run {
            space: &self.space,
            exclusions: &self.exclusions,
            config: &self.config,
            stats: GenerationStats {
                obligations_total: tracker.total(),
                obligations_excluded: tracker.excluded(),
                ..GenerationStats::default()
            },
            tracker,
            rng: SeededRng::new(seed),
            rows: Vec::new(),
        };

        for seed_row in &self.seed_rows {
            run.emit_seeded(seed_row.values());
        }
        while run.tracker.remaining() > 0 {
            if run.emit_greedy() == Step::Stalled {
                run.fallback();
            }
        }

        run.stats.rows = run.rows.len();
        let array = CoveringArray::new(
            self.space.value_counts().to_vec(),
            self.order,
            seed,
            run.rows,
        )
        .with_submodels(self.submodels.clone());
        Ok((array, run.stats))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Accepted,
    /// No row accepted, but at least one obligation was proven infeasible.
    Pruned,
    Stalled,
}

struct Run<'a> {
    space: &'a ParameterSpace,
    exclusions: &'a ExclusionSet,
    config: &'a GeneratorConfig,
    tracker: CoverageTracker,
    rng: SeededRng,
    rows: Vec<Row>,
    stats: GenerationStats,
}

impl Run<'_> {
    fn emit_seeded(&mut self, fixed: &[Option<usize>]) {
        let mut pool = Vec::with_capacity(self.config.candidate_pool);
        for _ in 0..self.config.candidate_pool {
            if let Some(row) = self.draw(fixed) {
                pool.push(row);
            }
        }
        // Seed rows were checked up front, so a completion exists.
        if pool.is_empty()
            && let Some(row) = self.exclusions.complete(self.space, fixed)
        {
            pool.push(row);
        }
        let Some(mut row) = self.select(pool) else {
            return;
        };
        let pinned: Vec<bool> = fixed.iter().map(Option::is_some).collect();
        self.refine(&mut row, &pinned);
        self.accept(row);
        self.stats.seeded_rows += 1;
    }

    fn emit_greedy(&mut self) -> Step {
        let width = self.space.len();
        let mut pool = Vec::with_capacity(self.config.candidate_pool);
        let mut pruned = false;

        for _ in 0..self.config.candidate_pool {
            let Some(anchor) = self.tracker.random_uncovered(&mut self.rng) else {
                break;
            };
            let partial = self.tracker.obligation(anchor).to_partial(width);
            if !self.exclusions.is_empty() && self.exclusions.complete(self.space, &partial).is_none()
            {
                self.tracker.exclude(anchor);
                self.stats.obligations_infeasible += 1;
                pruned = true;
                continue;
            }
            if let Some(row) = self.draw(&partial) {
                pool.push(row);
            }
        }

        match self.select(pool) {
            Some(mut row) if self.tracker.score(&row) > 0 => {
                self.refine(&mut row, &vec![false; width]);
                self.accept(row);
                Step::Accepted
            }
            _ if pruned => Step::Pruned,
            _ => Step::Stalled,
        }
    }

    /// One row per remaining obligation, deterministic, no randomness.
    fn fallback(&mut self) {
        let width = self.space.len();
        for at in self.tracker.uncovered_cells() {
            if !self.tracker.is_uncovered(at) {
                continue;
            }
            let partial = self.tracker.obligation(at).to_partial(width);
            match self.exclusions.complete(self.space, &partial) {
                Some(row) => {
                    self.accept(row);
                    self.stats.fallback_rows += 1;
                }
                None => {
                    self.tracker.exclude(at);
                    self.stats.obligations_infeasible += 1;
                }
            }
        }
    }

    /// Random full row honouring `fixed`. Falls back to the deterministic
    /// completion when the random fill paints itself into a corner.
    fn draw(&mut self, fixed: &[Option<usize>]) -> Option<Vec<usize>> {
        let mut work = fixed.to_vec();
        for position in 0..work.len() {
            if work[position].is_some() {
                continue;
            }
            if self.exclusions.is_empty() {
                work[position] = Some(self.pick_value(position, None));
                continue;
            }
            let mut allowed = Vec::with_capacity(self.space.value_count(position));
            for value in 0..self.space.value_count(position) {
                work[position] = Some(value);
                if !self.exclusions.blocks_at(&work, position) {
                    allowed.push(value);
                }
            }
            if allowed.is_empty() {
                return self.exclusions.complete(self.space, fixed);
            }
            work[position] = Some(self.pick_value(position, Some(&allowed)));
        }
        work.into_iter().collect()
    }

    fn pick_value(&mut self, position: usize, allowed: Option<&[usize]>) -> usize {
        let weights = self.space.weights(position);
        match (allowed, weights) {
            (None, None) => self.rng.below(self.space.value_count(position)),
            (None, Some(w)) => self.rng.weighted(w),
            (Some(values), None) => values[self.rng.below(values.len())],
            (Some(values), Some(w)) => {
                let sub: Vec<u32> = values.iter().map(|&v| w[v]).collect();
                values[self.rng.weighted(&sub)]
            }
        }
    }

    /// Highest score wins; ties go to the next PRNG draw over the tied set.
    fn select(&mut self, pool: Vec<Vec<usize>>) -> Option<Vec<usize>> {
        let scores: Vec<usize> = pool.iter().map(|row| self.tracker.score(row)).collect();
        self.stats.candidates_scored += pool.len() as u64;
        let best = *scores.iter().max()?;
        let mut tied: Vec<Vec<usize>> = pool
            .into_iter()
            .zip(scores)
            .filter(|(_, s)| *s == best)
            .map(|(row, _)| row)
            .collect();
        let pick = self.rng.below(tied.len());
        Some(tied.swap_remove(pick))
    }

    /// Single-position hill climbing. Only strict improvements are kept, so
    /// this terminates even without the pass bound.
    fn refine(&mut self, row: &mut [usize], pinned: &[bool]) {
        if self.config.refine == RefineMode::Off {
            return;
        }
        for _ in 0..self.config.refine_passes {
            let mut improved = false;
            for position in 0..row.len() {
                if pinned[position] {
                    continue;
                }
                let current = row[position];
                let mut best_value = current;
                let mut best_score = self.tracker.score_touching(row, position);
                for value in 0..self.space.value_count(position) {
                    if value == current {
                        continue;
                    }
                    row[position] = value;
                    if self.exclusions.row_blocked_at(row, position) {
                        continue;
                    }
                    let score = self.tracker.score_touching(row, position);
                    if score > best_score {
                        best_score = score;
                        best_value = value;
                    }
                }
                row[position] = best_value;
                if best_value != current {
                    improved = true;
                    self.stats.refine_moves += 1;
                }
            }
            if !improved {
                break;
            }
        }
    }

    fn accept(&mut self, row: Vec<usize>) {
        debug_assert!(self.space.admits(&row));
        debug_assert!(self.exclusions.violation(&row).is_none());
        self.tracker.mark(&row);
        self.rows.push(Row::new(row));
    }
}
