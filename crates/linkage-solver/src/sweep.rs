use std::f64::consts::TAU;

use nalgebra::Point2;
use tracing::{info, instrument};

use crate::error::SolveError;
use crate::linkage::{Linkage, Pose};
use crate::solver::{PoseSolver, SolveReport, SolverConfig};

/// Frames per revolution when nothing else is asked for (5 degrees apart).
pub const DEFAULT_STEPS: usize = 72;

/// Configuration for an evenly spaced full-revolution sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub steps: usize,
    pub solver: SolverConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            solver: SolverConfig::default(),
        }
    }
}

impl SweepConfig {
    pub fn with_steps(steps: usize) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }
}

/// The drive angles a sweep visits.
#[derive(Debug, Clone, PartialEq)]
pub enum AngleSweep {
    /// `count` angles `2*pi*k/count` for `k in 0..count`. The closing angle `2*pi`
    /// is left out since it repeats the first frame.
    Even(usize),
    /// Caller-chosen angles in radians, strictly increasing.
    Explicit(Vec<f64>),
}

impl AngleSweep {
    /// Resolve and validate the angle list.
    pub fn angles(&self) -> Result<Vec<f64>, SolveError> {
        match self {
            AngleSweep::Even(0) => Err(SolveError::EmptySweep),
            AngleSweep::Even(count) => Ok(evenly_spaced(*count)),
            AngleSweep::Explicit(angles) => {
                if angles.is_empty() {
                    return Err(SolveError::EmptySweep);
                }
                if let Some(&bad) = angles.iter().find(|a| !a.is_finite()) {
                    return Err(SolveError::NonFiniteAngle(bad));
                }
                for (index, pair) in angles.windows(2).enumerate() {
                    if pair[1] <= pair[0] {
                        return Err(SolveError::UnorderedAngles {
                            index: index + 1,
                            angle: pair[1],
                        });
                    }
                }
                Ok(angles.clone())
            }
        }
    }
}

/// `count` evenly spaced angles covering one revolution, starting at zero.
pub fn evenly_spaced(count: usize) -> Vec<f64> {
    (0..count)
        .map(|k| TAU * k as f64 / count as f64)
        .collect()
}

// ── Trajectory ───────────────────────────────────────────────────────────────

/// Every joint's position at every swept angle, in angle order.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    angles: Vec<f64>,
    /// `paths[joint][frame]`.
    paths: Vec<Vec<Point2<f64>>>,
    reports: Vec<SolveReport>,
}

impl Trajectory {
    fn with_capacity(joints: usize, frames: usize) -> Self {
        Self {
            angles: Vec::with_capacity(frames),
            paths: (0..joints).map(|_| Vec::with_capacity(frames)).collect(),
            reports: Vec::with_capacity(frames),
        }
    }

    fn push(&mut self, theta: f64, pose: &Pose, report: SolveReport) {
        self.angles.push(theta);
        for (path, &p) in self.paths.iter_mut().zip(pose.positions()) {
            path.push(p);
        }
        self.reports.push(report);
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    pub fn joint_count(&self) -> usize {
        self.paths.len()
    }

    pub fn path(&self, joint: usize) -> Option<&[Point2<f64>]> {
        self.paths.get(joint).map(Vec::as_slice)
    }

    /// All joint paths keyed by joint index.
    pub fn paths(&self) -> impl Iterator<Item = (usize, &[Point2<f64>])> + '_ {
        self.paths.iter().map(Vec::as_slice).enumerate()
    }

    /// Paths of the joints `linkage` marks as tracked. Every joint was solved;
    /// this only narrows what is returned.
    pub fn tracked<'t>(
        &'t self,
        linkage: &'t Linkage,
    ) -> impl Iterator<Item = (usize, &'t [Point2<f64>])> + 't {
        linkage
            .tracked_joints()
            .filter_map(move |joint| self.path(joint).map(|path| (joint, path)))
    }

    /// Reassemble the pose of one frame.
    pub fn pose(&self, frame: usize) -> Option<Pose> {
        if frame >= self.len() {
            return None;
        }
        Some(Pose::new(self.paths.iter().map(|path| path[frame]).collect()))
    }

    pub fn poses(&self) -> impl Iterator<Item = Pose> + '_ {
        (0..self.len()).filter_map(|frame| self.pose(frame))
    }

    pub fn reports(&self) -> &[SolveReport] {
        &self.reports
    }

    /// Frames whose solve did not reach the residual tolerance.
    pub fn degraded_frames(&self) -> usize {
        self.reports.iter().filter(|r| !r.converged).count()
    }
}

// ── Sweeps ───────────────────────────────────────────────────────────────────

/// Solve every angle of `plan` in increasing order, seeding each frame with the
/// previous frame's solution and the first with the rest layout.
#[instrument(skip_all, fields(joints = linkage.joint_count(), rods = linkage.rod_count()))]
pub fn sweep(
    linkage: &Linkage,
    plan: &AngleSweep,
    config: &SolverConfig,
) -> Result<Trajectory, SolveError> {
    let angles = plan.angles()?;
    let solver = PoseSolver::new(linkage, config.clone());
    let mut trajectory = Trajectory::with_capacity(linkage.joint_count(), angles.len());

    let mut seed = linkage.rest_pose();
    for &theta in &angles {
        let solution = solver.solve(theta, &seed)?;
        trajectory.push(theta, &solution.pose, solution.report);
        seed = solution.pose;
    }

    info!(
        frames = trajectory.len(),
        degraded = trajectory.degraded_frames(),
        "sweep complete"
    );
    Ok(trajectory)
}

/// Evenly spaced full-revolution sweep.
pub fn sweep_revolution(linkage: &Linkage, config: &SweepConfig) -> Result<Trajectory, SolveError> {
    sweep(linkage, &AngleSweep::Even(config.steps), &config.solver)
}

/// Like [`sweep`], but every frame is seeded with the rest layout and solved
/// independently on the rayon pool. Output stays in angle order.
///
/// Without warm starts, frames far from the rest layout can settle on the
/// other assembly branch.
#[cfg(feature = "parallel")]
#[instrument(skip_all, fields(joints = linkage.joint_count(), rods = linkage.rod_count()))]
pub fn sweep_parallel(
    linkage: &Linkage,
    plan: &AngleSweep,
    config: &SolverConfig,
) -> Result<Trajectory, SolveError> {
    use rayon::prelude::*;

    let angles = plan.angles()?;
    let solver = PoseSolver::new(linkage, config.clone());
    let seed = linkage.rest_pose();

    let solutions = angles
        .par_iter()
        .map(|&theta| solver.solve(theta, &seed))
        .collect::<Result<Vec<_>, _>>()?;

    let mut trajectory = Trajectory::with_capacity(linkage.joint_count(), angles.len());
    for (&theta, solution) in angles.iter().zip(&solutions) {
        trajectory.push(theta, &solution.pose, solution.report);
    }

    info!(
        frames = trajectory.len(),
        degraded = trajectory.degraded_frames(),
        "parallel sweep complete"
    );
    Ok(trajectory)
}
