use super::emission::Emission;
use super::ids::PartonId;
use serde::{Deserialize, Serialize};

/// The candidate cache of a dipole. Cache validity is part of the type:
/// a stale slot must be refilled by `generate` before the dipole can take
/// part in the global scale competition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum EmissionSlot {
    /// Invalidated; a fresh `generate` is required.
    #[default]
    Stale,
    /// `generate` ran and found nothing above the floor in the current
    /// window.
    NoCandidate,
    /// A sampled candidate waiting for the global competition.
    Ready(Emission),
}

impl EmissionSlot {
    pub fn is_stale(&self) -> bool {
        matches!(self, EmissionSlot::Stale)
    }

    pub fn candidate(&self) -> Option<&Emission> {
        match self {
            EmissionSlot::Ready(emission) => Some(emission),
            _ => None,
        }
    }
}

/// A colour dipole between two partons.
///
/// The incoming parton carries the anti-colour and the outgoing parton the
/// colour of the dipole; the dipole defines the colour flow from the one to
/// the other and is the unit that radiates during the evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dipole {
    /// The anti-colour-carrying parton.
    pub ipart: PartonId,
    /// The colour-carrying parton.
    pub opart: PartonId,
    /// The colour index. 0 means no index has been assigned yet; indices
    /// are handed out lazily and deterministically from chain position.
    pub colour_index: i32,
    /// The index of the colour chain (string) this dipole belongs to.
    pub string_index: u32,
    /// Creation sequence number; the deterministic tie-break when two
    /// candidates compete at the same scale.
    pub seq: u64,
    /// The ceiling of the current evolution window, in GeV².
    pub max_scale: f64,
    /// The cached candidate of the last `generate`.
    pub slot: EmissionSlot,
    /// The PDG code of the resonance this dipole comes directly from, if
    /// any. Affects which emission models apply.
    pub resonance: Option<i32>,
}

impl Dipole {
    pub(crate) fn new(ipart: PartonId, opart: PartonId, string_index: u32, seq: u64) -> Self {
        Self {
            ipart,
            opart,
            colour_index: 0,
            string_index,
            seq,
            max_scale: f64::MAX,
            slot: EmissionSlot::default(),
            resonance: None,
        }
    }

    /// Invalidates the cached candidate and lowers the window ceiling, so
    /// the next `generate` starts a fresh search below `pt2max`.
    pub fn reset(&mut self, pt2max: f64) {
        self.max_scale = pt2max;
        self.slot = EmissionSlot::Stale;
    }

    pub fn candidate(&self) -> Option<&Emission> {
        self.slot.candidate()
    }
}
