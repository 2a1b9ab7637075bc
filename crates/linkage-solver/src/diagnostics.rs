//! Quality and geometry metrics for solved poses.
//!
//! All functions are pure: they read a pose and the linkage and never touch
//! solver state, so they apply equally to single solves and sweep frames.

use nalgebra::Vector2;

use crate::connectivity::ConnectivityMatrix;
use crate::linkage::{Linkage, Pose};
use crate::sweep::Trajectory;

/// Percentage deviation of every rod from the linkage's rest lengths.
///
/// # Panics
///
/// Panics if `pose` does not have one position per joint of the linkage.
pub fn length_errors(linkage: &Linkage, pose: &Pose) -> Vec<f64> {
    length_errors_against(linkage.connectivity(), linkage.rest_lengths(), pose)
}

/// Percentage deviation `(current - rest) / rest * 100` of every rod from `rest`.
///
/// A rod with zero rest length reports 0 while it stays collapsed and
/// `+inf` once its endpoints separate.
///
/// # Panics
///
/// Panics if `pose` does not have one position per column pair of `connectivity`.
pub fn length_errors_against(
    connectivity: &ConnectivityMatrix,
    rest: &[f64],
    pose: &Pose,
) -> Vec<f64> {
    connectivity
        .pose_lengths(pose)
        .iter()
        .zip(rest)
        .map(|(&current, &rest)| percent_error(current, rest))
        .collect()
}

fn percent_error(current: f64, rest: f64) -> f64 {
    if rest == 0.0 {
        if current == 0.0 { 0.0 } else { f64::INFINITY }
    } else {
        (current - rest) / rest * 100.0
    }
}

/// Largest absolute length error in a pose, in percent.
pub fn max_length_error(linkage: &Linkage, pose: &Pose) -> f64 {
    length_errors(linkage, pose)
        .into_iter()
        .map(f64::abs)
        .fold(0.0, f64::max)
}

/// Largest absolute length error over every frame of a sweep, in percent.
pub fn trajectory_max_length_error(linkage: &Linkage, trajectory: &Trajectory) -> f64 {
    trajectory
        .poses()
        .map(|pose| max_length_error(linkage, &pose))
        .fold(0.0, f64::max)
}

/// Distance between each rod's two endpoints in `pose`.
///
/// # Panics
///
/// Panics if `pose` does not have one position per joint of the linkage.
pub fn rod_lengths(linkage: &Linkage, pose: &Pose) -> Vec<f64> {
    linkage
        .rods()
        .iter()
        .map(|rod| (pose[rod.a] - pose[rod.b]).norm())
        .collect()
}

/// Angle at a joint between two rods that meet there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RodAngle {
    pub joint: usize,
    /// Rod indices, in rod order.
    pub rods: (usize, usize),
    /// Radians in `[0, pi]`.
    pub angle: f64,
}

impl RodAngle {
    pub fn degrees(&self) -> f64 {
        self.angle.to_degrees()
    }
}

/// Angles between consecutive incident rods at every joint with two or more rods.
///
/// For a joint with incident rods `r0, r1, r2` (in rod order) this yields the
/// pairs `(r0, r1)` and `(r1, r2)`. Joints are visited in canonical order.
///
/// # Panics
///
/// Panics if `pose` does not have one position per joint of the linkage.
pub fn rod_angles(linkage: &Linkage, pose: &Pose) -> Vec<RodAngle> {
    let mut angles = Vec::new();

    for joint in 0..linkage.joint_count() {
        let incident: Vec<(usize, usize)> = linkage
            .incident_rods(joint)
            .filter_map(|(i, rod)| rod.other(joint).map(|far| (i, far)))
            .collect();

        for pair in incident.windows(2) {
            let (rod_a, far_a) = pair[0];
            let (rod_b, far_b) = pair[1];
            let v1 = pose[far_a] - pose[joint];
            let v2 = pose[far_b] - pose[joint];
            angles.push(RodAngle {
                joint,
                rods: (rod_a, rod_b),
                angle: angle_between(&v1, &v2),
            });
        }
    }
    angles
}

/// Unsigned angle between two vectors, 0 if either has zero length.
pub fn angle_between(v1: &Vector2<f64>, v2: &Vector2<f64>) -> f64 {
    let n1 = v1.norm();
    let n2 = v2.norm();
    if n1 == 0.0 || n2 == 0.0 {
        return 0.0;
    }
    (v1.dot(v2) / (n1 * n2)).clamp(-1.0, 1.0).acos()
}
