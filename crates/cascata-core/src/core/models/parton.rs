use super::flavour::Flavour;
use super::ids::DipoleId;
use crate::core::kinematics::momentum::FourMomentum;
use crate::core::particles::registry::ParticleRegistry;
use serde::{Deserialize, Serialize};

/// How a parton entered the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PartonOrigin {
    /// Produced by the hard process the cascade starts from.
    #[default]
    Hard,
    /// Created by an emission during the evolution.
    Emitted,
    /// Leftover beam or initial-state structure terminating a chain.
    Remnant,
}

/// A single parton in the colour chain.
///
/// A parton is linked into the chain through at most two dipoles: `idip`
/// is the dipole on its incoming side (the dipole for which this parton is
/// the colour-carrying, outgoing end) and `odip` the dipole on its outgoing
/// side (for which it is the anti-colour-carrying, incoming end). A parton
/// with no `idip` starts a chain; one with no `odip` ends it. Gluons sit in
/// the interior and carry both links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parton {
    pub flavour: Flavour,
    pub momentum: FourMomentum,
    pub origin: PartonOrigin,
    /// Mass fixed when the parton was generated by a splitting; partons
    /// without one fall back to the particle-data value.
    pub generated_mass: Option<f64>,
    /// The transverse-momentum-squared scale at which the parton was
    /// produced. Hard partons default to an unbounded scale.
    pub scale: f64,
    pub idip: Option<DipoleId>,
    pub odip: Option<DipoleId>,
}

impl Parton {
    /// Creates an unlinked parton with default origin and scale.
    pub fn new(flavour: Flavour, momentum: FourMomentum) -> Self {
        Self {
            flavour,
            momentum,
            origin: PartonOrigin::default(),
            generated_mass: None,
            scale: f64::MAX,
            idip: None,
            odip: None,
        }
    }

    pub fn is_gluon(&self) -> bool {
        self.flavour.is_gluon()
    }

    pub fn is_remnant(&self) -> bool {
        self.origin == PartonOrigin::Remnant
    }

    /// True if no dipole precedes this parton in the colour flow.
    pub fn is_chain_start(&self) -> bool {
        self.idip.is_none()
    }

    /// True if no dipole follows this parton in the colour flow.
    pub fn is_chain_end(&self) -> bool {
        self.odip.is_none()
    }

    /// The on-shell mass used in kinematics: the generated mass when one
    /// was fixed at creation, otherwise the particle-data value.
    pub fn mass(&self, particles: &ParticleRegistry) -> f64 {
        self.generated_mass
            .unwrap_or_else(|| particles.mass_of(self.flavour))
    }
}
