//! Pass-based collapse scheduling
//!
//! Each pass rebuilds the reference lists, evaluates the best edge of every
//! live triangle, and then collapses edges cheapest first from a min-heap.
//! Entries for triangles touched by an earlier collapse in the same pass are
//! re-evaluated when they surface instead of being applied with a stale cost.

use crate::candidate::{Candidate, CandidateEvaluator};
use crate::mesh_state::{MeshState, Triangle};
use crate::options::SimplifyOptions;
use qemcrate_core::Result;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

/// Smallest fraction of the remaining collapses a target pass may apply.
pub(crate) const MIN_PASS_SHARE: f64 = 1.0 / 16.0;

/// What a run is trying to achieve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Mode {
    /// Collapse until at most this many triangles are live.
    Target(usize),
    /// Collapse only edges whose error stays within `epsilon`, until none remain.
    Lossless { epsilon: f64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub collapses: usize,
    pub passes: usize,
    /// The last pass found nothing left to collapse.
    pub converged: bool,
}

struct QueuedCollapse {
    tid: usize,
    stamp: u32,
    candidate: Candidate,
}

impl PartialEq for QueuedCollapse {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for QueuedCollapse {}

impl PartialOrd for QueuedCollapse {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedCollapse {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: smallest cost first, lower triangle id on ties
        other
            .candidate
            .cost
            .total_cmp(&self.candidate.cost)
            .then_with(|| other.tid.cmp(&self.tid))
    }
}

pub(crate) struct CollapseScheduler<'a> {
    options: &'a SimplifyOptions,
    evaluator: CandidateEvaluator,
    aggressiveness: f64,
}

impl<'a> CollapseScheduler<'a> {
    pub fn new(options: &'a SimplifyOptions, aggressiveness: f64) -> Self {
        Self {
            options,
            evaluator: CandidateEvaluator::new(aggressiveness),
            aggressiveness,
        }
    }

    /// Seed quadrics and run passes until the mode is satisfied or a pass
    /// makes no progress.
    pub fn run(&self, state: &mut MeshState, mode: Mode) -> Result<RunSummary> {
        state.rebuild_refs();
        state.seed_quadrics(self.options.border_weight);
        debug!(
            border_vertices = (0..state.vertices.len()).filter(|&v| state.is_border(v)).count(),
            min_normal_dot = self.evaluator.min_normal_dot(),
            border_weight = self.options.border_weight,
            "Seeded vertex quadrics"
        );

        let mut summary = RunSummary::default();
        loop {
            if let Mode::Target(target) = mode {
                if state.live_triangle_count() <= target {
                    break;
                }
            }
            if self.options.max_passes.is_some_and(|max| summary.passes >= max) {
                debug!(passes = summary.passes, "Pass limit reached");
                break;
            }

            state.rebuild_refs();
            let before = state.live_triangle_count();
            let budget = self.pass_budget(before, mode);
            let applied = self.run_pass(state, mode, budget)?;
            summary.passes += 1;
            summary.collapses += applied;

            debug!(
                pass = summary.passes,
                collapses = applied,
                budget = budget,
                triangles_before = before,
                triangles_after = state.live_triangle_count(),
                "Finished collapse pass"
            );

            if applied == 0 {
                summary.converged = true;
                break;
            }
        }
        Ok(summary)
    }

    /// Collapses allowed in the next pass.
    ///
    /// A pass may remove a fraction `a / (a + 7)` of the collapses still
    /// needed, but never less than [`MIN_PASS_SHARE`]. Low aggressiveness
    /// re-evaluates costs more often while the number of passes stays
    /// logarithmic in the work left.
    pub fn pass_budget(&self, live: usize, mode: Mode) -> usize {
        match mode {
            Mode::Lossless { .. } => usize::MAX,
            Mode::Target(target) => {
                let needed = live.saturating_sub(target).div_ceil(2);
                let share =
                    (self.aggressiveness / (self.aggressiveness + 7.0)).max(MIN_PASS_SHARE);
                ((needed as f64 * share).ceil() as usize).max(1)
            }
        }
    }

    fn evaluate(&self, state: &MeshState) -> Vec<Option<Candidate>> {
        let evaluate_one = |(tid, tri): (usize, &Triangle)| {
            if tri.deleted {
                None
            } else {
                self.evaluator.best_edge(state, tid)
            }
        };

        if state.live_triangle_count() >= self.options.parallel_threshold {
            state.triangles.par_iter().enumerate().map(evaluate_one).collect()
        } else {
            state.triangles.iter().enumerate().map(evaluate_one).collect()
        }
    }

    fn run_pass(&self, state: &mut MeshState, mode: Mode, budget: usize) -> Result<usize> {
        for tri in &mut state.triangles {
            tri.dirty = false;
        }

        let mut heap: BinaryHeap<QueuedCollapse> = self
            .evaluate(state)
            .into_iter()
            .enumerate()
            .filter_map(|(tid, c)| c.map(|candidate| QueuedCollapse { tid, stamp: 0, candidate }))
            .collect();

        let mut stamps = vec![0u32; state.triangles.len()];
        let mut settled = vec![false; state.triangles.len()];
        let mut applied = 0;

        while let Some(entry) = heap.pop() {
            if applied >= budget {
                break;
            }
            if let Mode::Target(target) = mode {
                if state.live_triangle_count() <= target {
                    break;
                }
            }

            let tid = entry.tid;
            if state.triangles[tid].deleted || settled[tid] || entry.stamp != stamps[tid] {
                continue;
            }
            if state.triangles[tid].dirty {
                state.triangles[tid].dirty = false;
                stamps[tid] += 1;
                match self.evaluator.best_edge(state, tid) {
                    Some(candidate) => heap.push(QueuedCollapse {
                        tid,
                        stamp: stamps[tid],
                        candidate,
                    }),
                    None => settled[tid] = true,
                }
                continue;
            }
            settled[tid] = true;

            let Candidate { corner, cost, target } = entry.candidate;
            if let Mode::Lossless { epsilon } = mode {
                if cost > epsilon {
                    continue;
                }
            }
            let tri = &state.triangles[tid];
            let (keep, remove) = (tri.v[corner], tri.v[(corner + 1) % 3]);
            if !self.evaluator.is_valid(state, keep, remove, &target) {
                continue;
            }
            state.collapse(keep, remove, target)?;
            applied += 1;
        }
        Ok(applied)
    }
}
