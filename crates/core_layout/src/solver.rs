//! Distribution of a container's span among the windows it holds.
//!
//! Fixed windows get exactly what they ask for. The remaining space (after
//! gaps) is split among auto windows in proportion to their weights; windows
//! whose share falls outside their min/max bounds are frozen at the bound and
//! the rest is redistributed.

use tracing::debug;

/// Weights below this (and non-finite weights) are clamped up to it.
pub const MIN_WEIGHT: f64 = 0.1;

/// Smallest size an auto window is shrunk to when space runs out.
const MIN_SHRUNK_SIZE: f64 = 1.0;

const OVERFLOW_TOLERANCE: f64 = 1e-6;

/// Sizing request of one window along the solved axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverInput {
    pub weight: f64,
    /// Exact size; overrides weight and bounds.
    pub fixed: Option<f64>,
    pub min: f64,
    /// Zero means unbounded.
    pub max: f64,
}

impl SolverInput {
    pub fn auto(weight: f64) -> Self {
        Self {
            weight,
            fixed: None,
            min: 0.0,
            max: 0.0,
        }
    }

    pub fn fixed(size: f64) -> Self {
        Self {
            weight: 1.0,
            fixed: Some(size),
            min: 0.0,
            max: 0.0,
        }
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    fn effective_weight(&self) -> f64 {
        if self.weight.is_finite() {
            self.weight.max(MIN_WEIGHT)
        } else {
            MIN_WEIGHT
        }
    }

    fn bound(&self, size: f64) -> f64 {
        let mut size = size;
        if self.max > 0.0 {
            size = size.min(self.max);
        }
        size.max(self.min.max(0.0))
    }
}

/// Resolved size of one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOutput {
    pub size: f64,
    /// The size was pinned by a min/max bound or by running out of space.
    pub was_constrained: bool,
}

/// Resolve sizes for `inputs` sharing `available` with `gap` between them.
///
/// In tabbed containers the windows overlap, so no gaps are subtracted and
/// every auto window receives the whole span.
pub fn solve(inputs: &[SolverInput], available: f64, gap: f64, tabbed: bool) -> Vec<SolverOutput> {
    if inputs.is_empty() {
        return Vec::new();
    }

    if tabbed {
        return inputs
            .iter()
            .map(|input| match input.fixed {
                Some(size) => SolverOutput {
                    size,
                    was_constrained: false,
                },
                None => {
                    let size = input.bound(available.max(0.0));
                    SolverOutput {
                        size,
                        was_constrained: size != available,
                    }
                }
            })
            .collect();
    }

    let gap = gap.max(0.0);
    let gaps = gap * (inputs.len() - 1) as f64;
    let fixed_total: f64 = inputs.iter().filter_map(|i| i.fixed).sum();
    let auto_space = available - gaps - fixed_total;

    let mut outputs: Vec<SolverOutput> = inputs
        .iter()
        .map(|input| SolverOutput {
            size: input.fixed.unwrap_or(0.0),
            was_constrained: false,
        })
        .collect();

    let autos: Vec<usize> = (0..inputs.len()).filter(|&i| inputs[i].fixed.is_none()).collect();
    if autos.is_empty() {
        return outputs;
    }

    let mut frozen = vec![false; inputs.len()];
    let mut remaining = auto_space;

    // Every round either finishes or freezes at least one window.
    for _ in 0..=autos.len() {
        let open: Vec<usize> = autos.iter().copied().filter(|&i| !frozen[i]).collect();
        if open.is_empty() {
            break;
        }
        let total_weight: f64 = open.iter().map(|&i| inputs[i].effective_weight()).sum();

        let mut total_violation = 0.0;
        let mut shares = Vec::with_capacity(open.len());
        for &i in &open {
            let share = (remaining * inputs[i].effective_weight() / total_weight).max(0.0);
            let bounded = inputs[i].bound(share);
            total_violation += bounded - share;
            shares.push((i, share, bounded));
        }

        let any_violation = shares.iter().any(|&(_, share, bounded)| bounded != share);
        if !any_violation {
            for (i, share, _) in shares {
                outputs[i].size = share;
            }
            break;
        }

        for (i, share, bounded) in shares {
            let freeze = if total_violation > 0.0 {
                bounded > share
            } else if total_violation < 0.0 {
                bounded < share
            } else {
                bounded != share
            };
            if freeze {
                frozen[i] = true;
                outputs[i] = SolverOutput {
                    size: bounded,
                    was_constrained: true,
                };
                remaining -= bounded;
            } else {
                outputs[i].size = share;
            }
        }
    }

    let auto_total: f64 = autos.iter().map(|&i| outputs[i].size).sum();
    let budget = auto_space.max(0.0);
    if auto_space <= 0.0 || auto_total > budget + OVERFLOW_TOLERANCE {
        debug!(
            "Over-constrained container: autos need {:.1}, {:.1} available",
            auto_total, budget
        );
        let factor = if auto_total > 0.0 { budget / auto_total } else { 0.0 };
        for &i in &autos {
            outputs[i] = SolverOutput {
                size: (outputs[i].size * factor).max(MIN_SHRUNK_SIZE),
                was_constrained: true,
            };
        }
    }

    outputs
}
