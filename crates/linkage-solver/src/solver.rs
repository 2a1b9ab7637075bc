use std::time::{Duration, Instant};

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::connectivity::ConnectivityMatrix;
use crate::error::SolveError;
use crate::linkage::{Linkage, Pose};

/// Configuration for the Levenberg-Marquardt pose solver.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Hard cap on outer iterations per solve.
    pub max_iterations: usize,
    /// Converged once the summed squared length deviation falls below this.
    pub tolerance: f64,
    /// Stop as stationary once the squared gradient norm falls below this.
    pub gradient_tolerance: f64,
    pub lambda_initial: f64,
    pub lambda_factor: f64,
    /// Damping increases tried per iteration before giving up on a descent step.
    pub max_damping_steps: usize,
    /// Optional wall-clock cap per solve, checked between iterations. A budget
    /// past the end of the clock's range behaves like `None`.
    pub time_budget: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-18,
            gradient_tolerance: 1e-24,
            lambda_initial: 1e-3,
            lambda_factor: 10.0,
            max_damping_steps: 10,
            time_budget: None,
        }
    }
}

impl SolverConfig {
    /// Tighter tolerances and a larger iteration cap for offline sweeps.
    pub fn precise() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-24,
            gradient_tolerance: 1e-30,
            ..Self::default()
        }
    }

    /// Loose tolerances and a short wall-clock cap for quick previews.
    pub fn preview() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-10,
            gradient_tolerance: 1e-16,
            time_budget: Some(Duration::from_millis(20)),
            ..Self::default()
        }
    }
}

/// Why a solve stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Residual fell below `tolerance`.
    Converged,
    /// Gradient or step vanished with residual still above `tolerance`: a local
    /// minimum, typically an over-constrained linkage or an unreachable pose.
    Stationary,
    /// No damping level produced a descent step. This is the usual exit once
    /// the free joints have settled but a rod between the fixed and driven
    /// joints keeps the residual above `tolerance`.
    Stalled,
    IterationLimit,
    TimeBudget,
}

/// Result of running the pose solver for one drive angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub converged: bool,
    pub iterations: usize,
    /// Summed squared length deviation at the returned pose.
    pub final_residual: f64,
    pub termination: Termination,
}

impl SolveReport {
    fn new(termination: Termination, iterations: usize, final_residual: f64) -> Self {
        Self {
            converged: termination == Termination::Converged,
            iterations,
            final_residual,
            termination,
        }
    }
}

/// A solved pose and how the solver got there.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSolution {
    pub pose: Pose,
    pub report: SolveReport,
}

/// Solves one linkage for arbitrary drive angles.
#[derive(Debug, Clone)]
pub struct PoseSolver<'a> {
    linkage: &'a Linkage,
    config: SolverConfig,
}

impl<'a> PoseSolver<'a> {
    pub fn new(linkage: &'a Linkage, config: SolverConfig) -> Self {
        Self { linkage, config }
    }

    pub fn linkage(&self) -> &'a Linkage {
        self.linkage
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Place the driven joint at drive angle `theta` and relax the free joints
    /// toward their rest lengths, starting from their positions in `seed`.
    ///
    /// The fixed joint is copied from the rest layout and the driven joint is
    /// computed directly, so neither depends on optimizer behaviour. A solve that
    /// cannot reach zero residual still returns its best pose; inspect
    /// [`SolveReport`] or the diagnostics to detect degraded frames.
    pub fn solve(&self, theta: f64, seed: &Pose) -> Result<PoseSolution, SolveError> {
        if !theta.is_finite() {
            return Err(SolveError::NonFiniteAngle(theta));
        }
        let linkage = self.linkage;
        if seed.len() != linkage.joint_count() {
            return Err(SolveError::SeedMismatch {
                expected: linkage.joint_count(),
                actual: seed.len(),
            });
        }
        for &joint in linkage.free_joints() {
            let p = seed[joint];
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(SolveError::NonFiniteSeed { joint });
            }
        }

        let mut base = seed.to_flat();
        let fixed = linkage.fixed_joint();
        let fixed_pos = linkage.fixed_position();
        base[2 * fixed] = fixed_pos.x;
        base[2 * fixed + 1] = fixed_pos.y;
        let driven = linkage.driven_joint();
        let driven_pos = linkage.driven_position(theta);
        base[2 * driven] = driven_pos.x;
        base[2 * driven + 1] = driven_pos.y;

        let problem = Problem {
            connectivity: linkage.connectivity(),
            rest: linkage.rest_lengths().as_slice(),
            free: linkage.free_joints(),
            base,
        };

        let start = problem.gather();
        let (solution, report) = self.minimize(&problem, start);
        let pose = Pose::from_flat(&problem.expand(&solution));

        debug!(
            theta,
            iterations = report.iterations,
            residual = report.final_residual,
            termination = ?report.termination,
            "pose solved"
        );
        Ok(PoseSolution { pose, report })
    }

    /// Levenberg-Marquardt on the rod length residuals `r_i = |C_i p| - L_i`:
    /// solve `(J^T J + lambda * I) dx = J^T r` and step `x -= dx`, shrinking
    /// lambda after a descent step and growing it otherwise.
    fn minimize(&self, problem: &Problem, mut x: DVector<f64>) -> (DVector<f64>, SolveReport) {
        let config = &self.config;
        let n = x.len();
        let mut cost = problem.cost(&x);

        if n == 0 {
            let termination = if cost < config.tolerance {
                Termination::Converged
            } else {
                Termination::Stationary
            };
            return (x, SolveReport::new(termination, 0, cost));
        }

        // A budget too large to represent as an instant means no deadline.
        let deadline = config
            .time_budget
            .and_then(|budget| Instant::now().checked_add(budget));
        let mut lambda = config.lambda_initial;

        for iteration in 0..config.max_iterations {
            if cost < config.tolerance {
                return (x, SolveReport::new(Termination::Converged, iteration, cost));
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return (x, SolveReport::new(Termination::TimeBudget, iteration, cost));
            }

            let (residuals, jacobian) = problem.linearize(&x);
            let gradient = jacobian.tr_mul(&residuals);
            if gradient.norm_squared() < config.gradient_tolerance {
                return (x, SolveReport::new(Termination::Stationary, iteration, cost));
            }
            let normal = jacobian.tr_mul(&jacobian);

            let mut accepted = None;
            for _ in 0..config.max_damping_steps {
                let mut damped = normal.clone();
                for i in 0..n {
                    damped[(i, i)] += lambda;
                }

                if let Some(cholesky) = damped.cholesky() {
                    let step = cholesky.solve(&gradient);
                    let candidate = &x - &step;
                    let candidate_cost = problem.cost(&candidate);

                    if candidate_cost < cost {
                        lambda = (lambda / config.lambda_factor).max(1e-15);
                        accepted = Some((candidate, candidate_cost, step.norm()));
                        break;
                    }
                }
                lambda *= config.lambda_factor;
            }

            let Some((candidate, candidate_cost, step_norm)) = accepted else {
                return (x, SolveReport::new(Termination::Stalled, iteration + 1, cost));
            };
            let scale = x.norm() + f64::EPSILON;
            x = candidate;
            cost = candidate_cost;

            if step_norm <= f64::EPSILON * scale {
                let termination = if cost < config.tolerance {
                    Termination::Converged
                } else {
                    Termination::Stationary
                };
                return (x, SolveReport::new(termination, iteration + 1, cost));
            }
        }

        let termination = if cost < config.tolerance {
            Termination::Converged
        } else {
            Termination::IterationLimit
        };
        (x, SolveReport::new(termination, config.max_iterations, cost))
    }
}

/// Solve a single drive angle with a throwaway [`PoseSolver`].
pub fn solve_pose(
    linkage: &Linkage,
    theta: f64,
    seed: &Pose,
    config: &SolverConfig,
) -> Result<PoseSolution, SolveError> {
    PoseSolver::new(linkage, config.clone()).solve(theta, seed)
}

// ── Least-squares problem ────────────────────────────────────────────────────

/// Rod-length objective over the free joints' coordinates.
///
/// `base` is a full flat joint vector with the fixed and driven joints already
/// placed; the optimizer's `x` holds `[x, y]` for each free joint in `free` order.
struct Problem<'a> {
    connectivity: &'a ConnectivityMatrix,
    rest: &'a [f64],
    free: &'a [usize],
    base: DVector<f64>,
}

impl Problem<'_> {
    fn gather(&self) -> DVector<f64> {
        DVector::from_iterator(
            2 * self.free.len(),
            self.free
                .iter()
                .flat_map(|&j| [self.base[2 * j], self.base[2 * j + 1]]),
        )
    }

    fn expand(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut full = self.base.clone();
        for (k, &j) in self.free.iter().enumerate() {
            full[2 * j] = x[2 * k];
            full[2 * j + 1] = x[2 * k + 1];
        }
        full
    }

    fn cost(&self, x: &DVector<f64>) -> f64 {
        self.connectivity
            .lengths(&self.expand(x))
            .iter()
            .zip(self.rest)
            .map(|(length, rest)| (length - rest).powi(2))
            .sum()
    }

    /// Residuals and their Jacobian with respect to the free coordinates.
    ///
    /// Row `i` is `u_i^T` applied to rod `i`'s two operator rows, where `u_i` is
    /// the unit displacement of rod `i`. Rods with coincident endpoints have no
    /// defined direction and contribute a zero row.
    fn linearize(&self, x: &DVector<f64>) -> (DVector<f64>, DMatrix<f64>) {
        let full = self.expand(x);
        let vectors = self.connectivity.rod_vectors(&full);
        let c = self.connectivity.as_matrix();
        let m = vectors.len();

        let mut residuals = DVector::zeros(m);
        let mut jacobian = DMatrix::zeros(m, 2 * self.free.len());

        for (i, d) in vectors.iter().enumerate() {
            residuals[i] = d.norm() - self.rest[i];
            let Some(u) = d.try_normalize(f64::EPSILON) else {
                continue;
            };
            for (k, &joint) in self.free.iter().enumerate() {
                for axis in 0..2 {
                    let col = 2 * joint + axis;
                    jacobian[(i, 2 * k + axis)] = u.x * c[(2 * i, col)] + u.y * c[(2 * i + 1, col)];
                }
            }
        }
        (residuals, jacobian)
    }
}
