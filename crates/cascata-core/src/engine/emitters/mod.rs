//! Emission models and their precedence resolution.
//!
//! An [`EmissionModel`] encapsulates one class of physics that can act on a
//! dipole: recognizing the dipoles it applies to, sampling a candidate
//! emission below a scale ceiling, performing it on the state, and (for models
//! that support it) reverting a performed emission exactly. Specialized models
//! coexist with the default QCD behavior through the [`ModelRegistry`], which
//! resolves exactly one winning model per dipole using the `overrides`
//! precedence relation.
//!
//! The built-in models:
//!
//! - [`qcd::QcdEmitter`] - final-state gluon emission and gluon splitting, the
//!   default behavior of every dipole; supports revert
//! - [`dis::DisEmitter`] - remnant-aware variant with extended-source
//!   suppression and boson-gluon fusion; overrides the default on
//!   remnant-bounded dipoles
//! - [`mecorr::MeCorrectionEmitter`] - matrix-element correction for dipoles
//!   from resonance decays, layered over the default kernel through the
//!   `preweight`/`reweight` hooks

pub mod dis;
pub mod mecorr;
pub mod qcd;

use crate::core::models::emission::{Emission, PerformedEmission};
use crate::core::models::ids::DipoleId;
use crate::core::models::state::DipoleState;
use crate::core::particles::registry::ParticleRegistry;
use crate::core::qcd::sudakov::Candidate;
use crate::engine::config::CascadeConfig;
use crate::engine::error::CascadeError;
use rand::RngCore;

/// One pluggable emission physics model.
///
/// The scheduler only ever calls `generate`, `perform`, and `revert` on a
/// model for which `can_handle` returned true for the dipole in question.
/// `can_handle` must be side-effect-free and consistent for the lifetime of
/// the dipole's topology, and `overrides` must be antisymmetric between any
/// two applicable models; a violation of either is a registration defect, not
/// a runtime condition.
pub trait EmissionModel {
    /// A stable identifier, used in diagnostics and precedence decisions.
    fn name(&self) -> &'static str;

    /// Whether this model applies to the given dipole.
    fn can_handle(&self, state: &DipoleState, dip: DipoleId) -> bool;

    /// Precedence tie-break when both this model and `other` can handle the
    /// dipole. Must only be called after both `can_handle` checks succeeded.
    fn overrides(&self, other: &dyn EmissionModel, state: &DipoleState, dip: DipoleId) -> bool;

    /// Samples a candidate emission for the dipole in the window
    /// `(pt2min, pt2max]`, or `None` when no channel produces one.
    /// Does not mutate the state.
    fn generate(
        &self,
        state: &DipoleState,
        dip: DipoleId,
        pt2min: f64,
        pt2max: f64,
        rng: &mut dyn RngCore,
    ) -> Option<Emission>;

    /// Applies a previously generated candidate to the state.
    ///
    /// # Return
    ///
    /// `None` when the sampled point turns out kinematically forbidden; the
    /// caller treats this as no-emission, never as an error. On success the
    /// record lists the dipoles whose kinematic boundary changed.
    fn perform(
        &self,
        state: &mut DipoleState,
        emission: &Emission,
    ) -> Option<PerformedEmission>;

    /// Whether this model can undo its performed emissions.
    fn can_revert(&self) -> bool {
        false
    }

    /// Exact inverse of `perform`. Calling this on a model that does not
    /// advertise revert capability, or a failure to reconstruct the prior
    /// state, is a fatal contract violation.
    fn revert(
        &self,
        state: &mut DipoleState,
        performed: &PerformedEmission,
    ) -> Result<(), CascadeError> {
        let _ = (state, performed);
        Err(CascadeError::ModelContract {
            model: self.name(),
            reason: "revert called on a model without revert capability".to_string(),
        })
    }

    /// Enlargement factor applied to the proposal density of the generic
    /// gluon-emission kernel, so that `reweight` stays bounded by it.
    fn preweight(&self, state: &DipoleState, dip: DipoleId) -> f64 {
        let _ = (state, dip);
        1.0
    }

    /// Correction factor applied to the acceptance probability of a generic
    /// candidate, letting a model adjust the radiation pattern without
    /// re-deriving the kinematics.
    fn reweight(&self, state: &DipoleState, dip: DipoleId, candidate: &Candidate) -> f64 {
        let _ = (state, dip, candidate);
        1.0
    }
}

impl std::fmt::Debug for dyn EmissionModel + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmissionModel").field("name", &self.name()).finish()
    }
}

/// An explicit, ordered collection of emission models.
///
/// The registry is evaluated once per dipole per scheduler iteration and
/// resolves exactly one winning model: among all models whose `can_handle`
/// holds, a model that `overrides` the current winner replaces it; when
/// neither of a pair overrides the other, the earlier-registered model is
/// kept. The winner is therefore independent of invocation order as long as
/// `overrides` is antisymmetric, which the registry enforces.
#[derive(Default)]
pub struct ModelRegistry {
    models: Vec<Box<dyn EmissionModel>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles the built-in model stack for a configuration: the default
    /// QCD emitter, the remnant-aware DIS emitter, and (when enabled) the
    /// matrix-element correction for resonance dipoles.
    pub fn from_config(config: &CascadeConfig, particles: &ParticleRegistry) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(qcd::QcdEmitter::new(config, particles)));
        registry.register(Box::new(dis::DisEmitter::new(config, particles)));
        if config.me_corrections {
            registry.register(Box::new(mecorr::MeCorrectionEmitter::new(config, particles)));
        }
        registry
    }

    pub fn register(&mut self, model: Box<dyn EmissionModel>) {
        self.models.push(model);
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Resolves the winning model for a dipole.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::ModelContract`] when two applicable models both
    /// claim to override each other, which makes the winner ill-defined.
    pub fn winner(
        &self,
        state: &DipoleState,
        dip: DipoleId,
    ) -> Result<Option<&dyn EmissionModel>, CascadeError> {
        let mut winner: Option<&dyn EmissionModel> = None;
        for model in &self.models {
            let model = model.as_ref();
            if !model.can_handle(state, dip) {
                continue;
            }
            match winner {
                None => winner = Some(model),
                Some(current) => {
                    let forward = model.overrides(current, state, dip);
                    let backward = current.overrides(model, state, dip);
                    if forward && backward {
                        return Err(CascadeError::ModelContract {
                            model: model.name(),
                            reason: format!(
                                "'{}' and '{}' both override each other",
                                model.name(),
                                current.name()
                            ),
                        });
                    }
                    if forward {
                        winner = Some(model);
                    }
                }
            }
        }
        Ok(winner)
    }
}
