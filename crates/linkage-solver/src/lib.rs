//! Kinematic pose solver for planar rigid-rod linkages driven by a single
//! rotating joint.
//!
//! A [`Linkage`] captures its connectivity matrix and rest lengths once. The
//! [`PoseSolver`] places the driven joint on its circle for a given angle and
//! relaxes the free joints back to their rest lengths; [`sweep()`] repeats that
//! over a revolution, and [`diagnostics`] measures how well each pose held up.

pub mod connectivity;
pub mod diagnostics;
pub mod error;
pub mod linkage;
pub mod parts;
pub mod record;
pub mod solver;
pub mod sweep;

pub use connectivity::{ConnectivityMatrix, RestLengths};
pub use error::{ConfigurationError, SolveError};
pub use linkage::{Joint, Linkage, Mobility, MobilityCheck, Pose, Rod, kutzbach_rod_count};
pub use parts::{Part, PartKind, bill_of_materials};
pub use record::{JointRecord, LinkageRecord, RodRecord};
pub use solver::{PoseSolution, PoseSolver, SolveReport, SolverConfig, Termination, solve_pose};
#[cfg(feature = "parallel")]
pub use sweep::sweep_parallel;
pub use sweep::{AngleSweep, DEFAULT_STEPS, SweepConfig, Trajectory, evenly_spaced, sweep, sweep_revolution};
