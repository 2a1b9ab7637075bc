use thiserror::Error;

/// Fatal problems found while building a [`Linkage`](crate::Linkage).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("no joint is marked fixed")]
    MissingFixedJoint,
    #[error("joints {first} and {second} are both marked fixed")]
    DuplicateFixedJoint { first: usize, second: usize },
    #[error("no joint is marked driven")]
    MissingDrivenJoint,
    #[error("joints {first} and {second} are both marked driven")]
    DuplicateDrivenJoint { first: usize, second: usize },
    #[error("joint {joint} is marked both fixed and driven")]
    FixedAndDriven { joint: usize },
    #[error("rod {rod} references joint {joint}, but the linkage has {joint_count} joints")]
    JointOutOfRange {
        rod: usize,
        joint: usize,
        joint_count: usize,
    },
    #[error("rod {rod} connects joint {joint} to itself")]
    SelfLoop { rod: usize, joint: usize },
    #[error("joint {joint} has a non-finite coordinate ({x}, {y})")]
    NonFiniteJoint { joint: usize, x: f64, y: f64 },
    #[error("drive radius {0} is not finite")]
    NonFiniteRadius(f64),
}

/// Rejected arguments to a solve or sweep call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("seed pose has {actual} joints, linkage has {expected}")]
    SeedMismatch { expected: usize, actual: usize },
    #[error("sweep needs at least one angle")]
    EmptySweep,
    #[error("sweep angles must be strictly increasing (angle {index} is {angle})")]
    UnorderedAngles { index: usize, angle: f64 },
    #[error("drive angle {0} is not finite")]
    NonFiniteAngle(f64),
    #[error("seed position of joint {joint} is not finite")]
    NonFiniteSeed { joint: usize },
}
