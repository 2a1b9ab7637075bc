//! Flat record schema exchanged with persistence and export collaborators.
//!
//! Joint and rod order is significant: rods refer to joints by position, so
//! records are never reordered on the way in or out.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::linkage::{Joint, Linkage, Rod};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JointRecord {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub driven: bool,
    #[serde(default)]
    pub tracked: bool,
}

/// Joint index pair, serialized as `[i, j]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RodRecord(pub usize, pub usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkageRecord {
    pub joints: Vec<JointRecord>,
    pub rods: Vec<RodRecord>,
    pub radius: f64,
}

impl From<&Joint> for JointRecord {
    fn from(joint: &Joint) -> Self {
        Self {
            x: joint.position.x,
            y: joint.position.y,
            fixed: joint.fixed,
            driven: joint.driven,
            tracked: joint.tracked,
        }
    }
}

impl From<JointRecord> for Joint {
    fn from(record: JointRecord) -> Self {
        Joint {
            fixed: record.fixed,
            driven: record.driven,
            tracked: record.tracked,
            ..Joint::new(record.x, record.y)
        }
    }
}

impl From<&Linkage> for LinkageRecord {
    fn from(linkage: &Linkage) -> Self {
        Self {
            joints: linkage.joints().iter().map(JointRecord::from).collect(),
            rods: linkage.rods().iter().map(|r| RodRecord(r.a, r.b)).collect(),
            radius: linkage.radius(),
        }
    }
}

impl TryFrom<LinkageRecord> for Linkage {
    type Error = ConfigurationError;

    fn try_from(record: LinkageRecord) -> Result<Self, Self::Error> {
        let joints = record.joints.into_iter().map(Joint::from).collect();
        let rods = record.rods.into_iter().map(|RodRecord(a, b)| Rod::new(a, b)).collect();
        Linkage::new(joints, rods, record.radius)
    }
}

impl LinkageRecord {
    /// Validate and build the linkage this record describes.
    pub fn into_linkage(self) -> Result<Linkage, ConfigurationError> {
        Linkage::try_from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Linkage {
        let joints = vec![
            Joint::new(20.0, 10.0).tracked(),
            Joint::fixed(0.0, 0.0),
            Joint::new(10.0, 20.0),
            Joint::driven(10.0, 0.0),
        ];
        let rods = vec![Rod::new(1, 3), Rod::new(3, 0), Rod::new(0, 2), Rod::new(2, 1)];
        Linkage::new(joints, rods, 5.0).unwrap()
    }

    #[test]
    fn test_json_round_trip_preserves_rest_lengths() {
        let linkage = sample();
        let json = serde_json::to_string(&LinkageRecord::from(&linkage)).unwrap();
        let record: LinkageRecord = serde_json::from_str(&json).unwrap();
        let rebuilt = record.into_linkage().unwrap();

        assert_eq!(rebuilt.fixed_joint(), 1);
        assert_eq!(rebuilt.driven_joint(), 3);
        assert_eq!(rebuilt.rods(), linkage.rods());
        for (a, b) in rebuilt.rest_lengths().iter().zip(linkage.rest_lengths().iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rod_serializes_as_pair() {
        let json = serde_json::to_value(RodRecord(2, 5)).unwrap();
        assert_eq!(json, serde_json::json!([2, 5]));
    }

    #[test]
    fn test_missing_role_flags_default_to_false() {
        let record: JointRecord = serde_json::from_str(r#"{"x": 1.0, "y": 2.0}"#).unwrap();
        assert!(!record.fixed && !record.driven && !record.tracked);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = r#"{"x": 1.0, "y": 2.0, "static": true}"#;
        assert!(serde_json::from_str::<JointRecord>(json).is_err());
    }

    #[test]
    fn test_invalid_record_not_built() {
        let record = LinkageRecord {
            joints: vec![
                JointRecord {
                    x: 0.0,
                    y: 0.0,
                    fixed: true,
                    driven: false,
                    tracked: false,
                },
                JointRecord {
                    x: 1.0,
                    y: 0.0,
                    fixed: false,
                    driven: true,
                    tracked: false,
                },
            ],
            rods: vec![RodRecord(0, 2)],
            radius: 1.0,
        };
        assert!(matches!(
            record.into_linkage(),
            Err(ConfigurationError::JointOutOfRange { rod: 0, joint: 2, .. })
        ));
    }
}
