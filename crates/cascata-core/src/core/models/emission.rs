use super::flavour::Quark;
use super::ids::{DipoleId, PartonId};
use super::parton::Parton;
use crate::core::kinematics::momentum::FourMomentum;
use serde::{Deserialize, Serialize};

/// Which bounding parton of a dipole an operation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DipoleEnd {
    /// The anti-colour-carrying end (`ipart`).
    Incoming,
    /// The colour-carrying end (`opart`).
    Outgoing,
}

/// The topology change a candidate emission would make.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionKind {
    /// Insert a gluon and a new dipole into the chain.
    Gluon,
    /// Split the gluon at the given end into a quark-antiquark pair,
    /// separating the chain there.
    Split { end: DipoleEnd, flavour: Quark },
    /// Initial-state boson-gluon fusion off a remnant dipole, producing a
    /// quark pair as a separate colour-singlet chain.
    BosonGluonFusion { flavour: Quark },
}

impl EmissionKind {
    pub fn is_initial_state(self) -> bool {
        matches!(self, EmissionKind::BosonGluonFusion { .. })
    }
}

/// One candidate emission, sampled by a model's `generate` and either
/// consumed by `perform` or discarded when a harder candidate wins.
///
/// All sampled variables live here so that `perform` is deterministic:
/// the transverse-momentum-squared scale, the energy fractions of the
/// incoming-side (`x1`) and outgoing-side (`x3`) partons in the dipole
/// frame, the azimuthal orientation, and which end keeps its direction
/// when the recoil is distributed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Emission {
    pub dipole: DipoleId,
    pub kind: EmissionKind,
    pub pt2: f64,
    pub x1: f64,
    pub x3: f64,
    pub azimuth: f64,
    pub keep_incoming: bool,
}

/// What `perform` needs to remember to undo a gluon emission or splitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RevertRecord {
    Gluon {
        new_dipole: DipoleId,
        gluon: PartonId,
        prior_ipart: FourMomentum,
        prior_opart: FourMomentum,
    },
    Split {
        neighbor: DipoleId,
        quark: PartonId,
        antiquark: PartonId,
        removed_gluon: Parton,
        prior_spectator: FourMomentum,
    },
}

/// A performed emission: the consumed candidate, the parton considered
/// emitted, the dipoles whose kinematic boundary changed (the scheduler
/// resets exactly these), and the information required to revert, for
/// models that support reverting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformedEmission {
    pub emission: Emission,
    pub emitted: PartonId,
    pub touched: Vec<DipoleId>,
    pub revert: Option<RevertRecord>,
}
