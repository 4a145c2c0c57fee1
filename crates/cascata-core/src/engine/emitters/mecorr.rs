use super::EmissionModel;
use super::qcd::QcdEmitter;
use crate::core::models::emission::{Emission, PerformedEmission};
use crate::core::models::ids::DipoleId;
use crate::core::models::state::DipoleState;
use crate::core::particles::registry::ParticleRegistry;
use crate::core::qcd::coupling::radiation_exponent;
use crate::core::qcd::sudakov::Candidate;
use crate::engine::config::CascadeConfig;
use crate::engine::error::CascadeError;
use rand::RngCore;

/// Headroom factor on the proposal density so the corrected acceptance
/// stays bounded by one.
const ME_PREWEIGHT: f64 = 2.0;

/// Matrix-element correction for dipoles coming directly from a resonance
/// decay.
///
/// The correction is layered over the plain QCD kernel entirely through the
/// `preweight`/`reweight` hooks: the radiation pattern of the generic kernel,
/// whose end weights depend on the end type, is replaced by the exact
/// first-order decay matrix element `(x1^2 + x3^2) / 2` of a colour-singlet
/// vector resonance. All kinematics, chain surgery, and revert support come
/// from the underlying kernel unchanged.
pub struct MeCorrectionEmitter {
    kernel: QcdEmitter,
}

impl MeCorrectionEmitter {
    pub const NAME: &'static str = "me-correction";

    pub fn new(config: &CascadeConfig, particles: &ParticleRegistry) -> Self {
        Self {
            kernel: QcdEmitter::new(config, particles),
        }
    }
}

impl EmissionModel for MeCorrectionEmitter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_handle(&self, state: &DipoleState, dip: DipoleId) -> bool {
        state
            .dipole(dip)
            .is_some_and(|dipole| dipole.resonance.is_some())
    }

    fn overrides(&self, other: &dyn EmissionModel, _: &DipoleState, _: DipoleId) -> bool {
        other.name() == QcdEmitter::NAME
    }

    fn generate(
        &self,
        state: &DipoleState,
        dip: DipoleId,
        pt2min: f64,
        pt2max: f64,
        rng: &mut dyn RngCore,
    ) -> Option<Emission> {
        self.kernel.generate_corrected(
            state,
            dip,
            pt2min,
            pt2max,
            rng,
            self.preweight(state, dip),
            &|candidate| self.reweight(state, dip, candidate),
        )
    }

    fn perform(
        &self,
        state: &mut DipoleState,
        emission: &Emission,
    ) -> Option<PerformedEmission> {
        self.kernel.perform(state, emission)
    }

    fn can_revert(&self) -> bool {
        self.kernel.can_revert()
    }

    fn revert(
        &self,
        state: &mut DipoleState,
        performed: &PerformedEmission,
    ) -> Result<(), CascadeError> {
        self.kernel.revert(state, performed)
    }

    fn preweight(&self, _: &DipoleState, _: DipoleId) -> f64 {
        ME_PREWEIGHT
    }

    fn reweight(&self, state: &DipoleState, dip: DipoleId, candidate: &Candidate) -> f64 {
        let Some(dipole) = state.dipole(dip) else {
            return 1.0;
        };
        let gluon_end = |id| {
            state
                .parton(id)
                .is_some_and(|parton| parton.is_gluon())
        };
        let exp_in = radiation_exponent(gluon_end(dipole.ipart));
        let exp_out = radiation_exponent(gluon_end(dipole.opart));
        let exact = candidate.x1.powi(2) + candidate.x3.powi(2);
        let generic = candidate.x1.powi(exp_in) + candidate.x3.powi(exp_out);
        if generic <= 0.0 {
            return 1.0;
        }
        exact / generic
    }
}
