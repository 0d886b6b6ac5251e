use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::KinvarError;

/// The type of collider a sample was recorded at.
///
/// This selects the default function set used by the
/// [`VariableBuilder`](crate::builder::VariableBuilder): at a lepton collider
/// the longitudinal momentum of the initial state is known, so quantities
/// like 3D opening angles are meaningful, while at a hadron collider physics
/// must be invariant under boosts along the beam axis and only
/// boost-invariant quantities (like absolute pseudorapidity differences) are
/// generated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collider {
    /// A lepton collider: the initial-state longitudinal momentum is known.
    Lepton,
    /// A hadron collider: the initial-state longitudinal momentum is unknown.
    Hadron,
}

impl Display for Collider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collider::Lepton => write!(f, "lepton"),
            Collider::Hadron => write!(f, "hadron"),
        }
    }
}

impl FromStr for Collider {
    type Err = KinvarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lepton" | "lep" | "ee" => Ok(Self::Lepton),
            "hadron" | "had" | "pp" => Ok(Self::Hadron),
            _ => Err(KinvarError::ParseError {
                name: s.to_string(),
                object: "Collider".to_string(),
            }),
        }
    }
}

/// The kind of a vector node (a leaf or a sum).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VectorKind {
    /// A full four-momentum (all components known).
    FourVector,
    /// A transverse-only momentum (longitudinal component unknown).
    Transverse,
}

impl Display for VectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorKind::FourVector => write!(f, "four-vector"),
            VectorKind::Transverse => write!(f, "transverse"),
        }
    }
}

impl FromStr for VectorKind {
    type Err = KinvarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "four-vector" | "fourvector" | "four" | "p4" => Ok(Self::FourVector),
            "transverse" | "2d" | "pt" => Ok(Self::Transverse),
            _ => Err(KinvarError::ParseError {
                name: s.to_string(),
                object: "VectorKind".to_string(),
            }),
        }
    }
}
