use std::fmt;

use crate::linkage::Linkage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Joint,
    Rod,
    Drive,
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartKind::Joint => write!(f, "joint"),
            PartKind::Rod => write!(f, "rod"),
            PartKind::Drive => write!(f, "drive"),
        }
    }
}

/// One line of a bill of materials.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub kind: PartKind,
    /// `G{i}` for joints, `S{i}` for rods, `A{i}` for the drive at joint `i`.
    pub label: String,
    /// Joint index for joints and drives, rod index for rods.
    pub index: usize,
    /// Rest length, for rods only.
    pub length: Option<f64>,
}

/// Parts needed to build `linkage`: every joint, then every rod, then the drive.
pub fn bill_of_materials(linkage: &Linkage) -> Vec<Part> {
    let joints = (0..linkage.joint_count()).map(|i| Part {
        kind: PartKind::Joint,
        label: format!("G{i}"),
        index: i,
        length: None,
    });
    let rods = linkage.rest_lengths().iter().enumerate().map(|(i, &length)| Part {
        kind: PartKind::Rod,
        label: format!("S{i}"),
        index: i,
        length: Some(length),
    });
    let driven = linkage.driven_joint();
    let drive = Part {
        kind: PartKind::Drive,
        label: format!("A{driven}"),
        index: driven,
        length: None,
    };

    joints.chain(rods).chain(std::iter::once(drive)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkage::{Joint, Rod};

    #[test]
    fn test_bill_of_materials() {
        let joints = vec![
            Joint::fixed(0.0, 0.0),
            Joint::new(3.0, 4.0),
            Joint::driven(6.0, 0.0),
        ];
        let rods = vec![Rod::new(0, 1), Rod::new(1, 2)];
        let linkage = Linkage::new(joints, rods, 1.0).unwrap();

        let parts = bill_of_materials(&linkage);
        let labels: Vec<&str> = parts.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["G0", "G1", "G2", "S0", "S1", "A2"]);
        assert_eq!(parts[3].length, Some(5.0));
        assert_eq!(parts[5].kind, PartKind::Drive);
        assert_eq!(parts[5].kind.to_string(), "drive");
    }
}
