use std::ops::Index;

use nalgebra::{DVector, Point2, Vector2};
use tracing::warn;

use crate::connectivity::{ConnectivityMatrix, RestLengths};
use crate::error::ConfigurationError;

// ── Joints and Rods ──────────────────────────────────────────────────────────

/// A joint in its rest layout, with its role flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    pub position: Point2<f64>,
    /// Anchored to the ground at its rest position.
    pub fixed: bool,
    /// Moves on the drive circle.
    pub driven: bool,
    /// Its path is of interest to callers. Does not affect solving.
    pub tracked: bool,
}

impl Joint {
    /// A free joint at `(x, y)`.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point2::new(x, y),
            fixed: false,
            driven: false,
            tracked: false,
        }
    }

    pub fn fixed(x: f64, y: f64) -> Self {
        Self {
            fixed: true,
            ..Self::new(x, y)
        }
    }

    pub fn driven(x: f64, y: f64) -> Self {
        Self {
            driven: true,
            ..Self::new(x, y)
        }
    }

    /// Mark this joint as tracked.
    pub fn tracked(mut self) -> Self {
        self.tracked = true;
        self
    }

    /// Neither fixed nor driven, so the solver owns its position.
    pub fn is_free(&self) -> bool {
        !self.fixed && !self.driven
    }
}

/// A rigid rod between two joints, stored as canonical joint indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rod {
    pub a: usize,
    pub b: usize,
}

impl Rod {
    pub fn new(a: usize, b: usize) -> Self {
        Self { a, b }
    }

    pub fn endpoints(&self) -> (usize, usize) {
        (self.a, self.b)
    }

    pub fn touches(&self, joint: usize) -> bool {
        self.a == joint || self.b == joint
    }

    /// The endpoint opposite `joint`, if the rod touches it.
    pub fn other(&self, joint: usize) -> Option<usize> {
        if self.a == joint {
            Some(self.b)
        } else if self.b == joint {
            Some(self.a)
        } else {
            None
        }
    }
}

// ── Mobility ─────────────────────────────────────────────────────────────────

/// Rod count a planar linkage of `joint_count` joints needs for exactly one
/// degree of freedom: `floor((3 * (N - 1) - 1) / 2)`.
pub fn kutzbach_rod_count(joint_count: usize) -> usize {
    (3 * joint_count.saturating_sub(1)).saturating_sub(1) / 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mobility {
    /// Rod count matches the single-DOF condition.
    Exact,
    UnderConstrained { missing: usize },
    OverConstrained { excess: usize },
}

/// Outcome of the Kutzbach rod-count check. Non-fatal: callers decide whether
/// an over- or under-constrained linkage is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MobilityCheck {
    pub joints: usize,
    pub rods: usize,
    pub expected_rods: usize,
    pub mobility: Mobility,
}

impl MobilityCheck {
    pub fn evaluate(joints: usize, rods: usize) -> Self {
        let expected_rods = kutzbach_rod_count(joints);
        let mobility = if rods == expected_rods {
            Mobility::Exact
        } else if rods < expected_rods {
            Mobility::UnderConstrained {
                missing: expected_rods - rods,
            }
        } else {
            Mobility::OverConstrained {
                excess: rods - expected_rods,
            }
        };
        Self {
            joints,
            rods,
            expected_rods,
            mobility,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.mobility == Mobility::Exact
    }
}

// ── Pose ─────────────────────────────────────────────────────────────────────

/// Positions of every joint for one drive angle, in canonical joint order.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    positions: Vec<Point2<f64>>,
}

impl Pose {
    pub fn new(positions: Vec<Point2<f64>>) -> Self {
        Self { positions }
    }

    /// Rebuild a pose from a flat `[x0, y0, x1, y1, ...]` vector.
    pub fn from_flat(flat: &DVector<f64>) -> Self {
        let positions = flat
            .as_slice()
            .chunks_exact(2)
            .map(|xy| Point2::new(xy[0], xy[1]))
            .collect();
        Self { positions }
    }

    /// Flatten into `[x0, y0, x1, y1, ...]`, the layout the connectivity matrix expects.
    pub fn to_flat(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.positions.len() * 2,
            self.positions.iter().flat_map(|p| [p.x, p.y]),
        )
    }

    pub fn positions(&self) -> &[Point2<f64>] {
        &self.positions
    }

    pub fn get(&self, joint: usize) -> Option<Point2<f64>> {
        self.positions.get(joint).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl Index<usize> for Pose {
    type Output = Point2<f64>;

    fn index(&self, joint: usize) -> &Point2<f64> {
        &self.positions[joint]
    }
}

// ── Linkage ──────────────────────────────────────────────────────────────────

/// A validated planar linkage: joints, rods, drive radius, and the derived
/// connectivity matrix and rest lengths. Immutable once built.
#[derive(Debug, Clone)]
pub struct Linkage {
    joints: Vec<Joint>,
    rods: Vec<Rod>,
    radius: f64,
    fixed: usize,
    driven: usize,
    free: Vec<usize>,
    connectivity: ConnectivityMatrix,
    rest_lengths: RestLengths,
}

impl Linkage {
    /// Validate roles and rod references, then capture the connectivity matrix
    /// and rest lengths from the given layout.
    ///
    /// A rod count that fails the Kutzbach check is not an error; see [`Linkage::mobility`].
    pub fn new(joints: Vec<Joint>, rods: Vec<Rod>, radius: f64) -> Result<Self, ConfigurationError> {
        if !radius.is_finite() {
            return Err(ConfigurationError::NonFiniteRadius(radius));
        }
        for (joint, j) in joints.iter().enumerate() {
            if !j.position.x.is_finite() || !j.position.y.is_finite() {
                return Err(ConfigurationError::NonFiniteJoint {
                    joint,
                    x: j.position.x,
                    y: j.position.y,
                });
            }
        }

        let (fixed, driven) = resolve_roles(&joints)?;
        let connectivity = ConnectivityMatrix::build(joints.len(), &rods)?;
        let rest_pose = Pose::new(joints.iter().map(|j| j.position).collect());
        let rest_lengths = RestLengths::capture(&connectivity, &rest_pose);
        let free = (0..joints.len()).filter(|&i| joints[i].is_free()).collect();

        let linkage = Self {
            joints,
            rods,
            radius,
            fixed,
            driven,
            free,
            connectivity,
            rest_lengths,
        };

        let check = linkage.mobility();
        if !check.is_exact() {
            warn!(
                joints = check.joints,
                rods = check.rods,
                expected_rods = check.expected_rods,
                mobility = ?check.mobility,
                "linkage rod count does not give a single degree of freedom"
            );
        }
        Ok(linkage)
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn rods(&self) -> &[Rod] {
        &self.rods
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    pub fn rod_count(&self) -> usize {
        self.rods.len()
    }

    pub fn fixed_joint(&self) -> usize {
        self.fixed
    }

    pub fn driven_joint(&self) -> usize {
        self.driven
    }

    /// Indices of joints the solver optimizes, ascending.
    pub fn free_joints(&self) -> &[usize] {
        &self.free
    }

    pub fn tracked_joints(&self) -> impl Iterator<Item = usize> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(|(_, j)| j.tracked)
            .map(|(i, _)| i)
    }

    /// First tracked joint, or the driven joint when nothing is tracked.
    pub fn primary_tracked_joint(&self) -> usize {
        self.tracked_joints().next().unwrap_or(self.driven)
    }

    /// Rods touching `joint`, with their rod indices, in rod order.
    pub fn incident_rods(&self, joint: usize) -> impl Iterator<Item = (usize, &Rod)> + '_ {
        self.rods.iter().enumerate().filter(move |(_, r)| r.touches(joint))
    }

    pub fn connectivity(&self) -> &ConnectivityMatrix {
        &self.connectivity
    }

    pub fn rest_lengths(&self) -> &RestLengths {
        &self.rest_lengths
    }

    pub fn mobility(&self) -> MobilityCheck {
        MobilityCheck::evaluate(self.joints.len(), self.rods.len())
    }

    /// The layout the linkage was built from.
    pub fn rest_pose(&self) -> Pose {
        Pose::new(self.joints.iter().map(|j| j.position).collect())
    }

    /// Centre of the drive circle: the driven joint's rest position.
    pub fn drive_center(&self) -> Point2<f64> {
        self.joints[self.driven].position
    }

    pub fn fixed_position(&self) -> Point2<f64> {
        self.joints[self.fixed].position
    }

    /// Where the driven joint sits at drive angle `theta` (radians).
    pub fn driven_position(&self, theta: f64) -> Point2<f64> {
        self.drive_center() + self.radius * Vector2::new(theta.cos(), theta.sin())
    }
}

/// Find the unique fixed and driven joints.
fn resolve_roles(joints: &[Joint]) -> Result<(usize, usize), ConfigurationError> {
    let mut fixed = None;
    let mut driven = None;

    for (i, joint) in joints.iter().enumerate() {
        if joint.fixed && joint.driven {
            return Err(ConfigurationError::FixedAndDriven { joint: i });
        }
        if joint.fixed {
            if let Some(first) = fixed {
                return Err(ConfigurationError::DuplicateFixedJoint { first, second: i });
            }
            fixed = Some(i);
        }
        if joint.driven {
            if let Some(first) = driven {
                return Err(ConfigurationError::DuplicateDrivenJoint { first, second: i });
            }
            driven = Some(i);
        }
    }

    let fixed = fixed.ok_or(ConfigurationError::MissingFixedJoint)?;
    let driven = driven.ok_or(ConfigurationError::MissingDrivenJoint)?;
    Ok((fixed, driven))
}
