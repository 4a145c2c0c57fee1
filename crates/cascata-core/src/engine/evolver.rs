use crate::core::models::dipole::EmissionSlot;
use crate::core::models::emission::PerformedEmission;
use crate::core::models::ids::DipoleId;
use crate::core::models::state::DipoleState;
use crate::engine::config::CascadeConfig;
use crate::engine::emitters::ModelRegistry;
use crate::engine::error::CascadeError;
use crate::engine::progress::{Progress, ProgressReporter};
use rand::RngCore;
use tracing::{debug, warn};

/// The veto-algorithm scheduler driving one `DipoleState` from its starting
/// scales down to the cutoff.
///
/// Each iteration refills the candidate slot of every dipole whose window
/// changed, selects the globally hardest candidate, and performs it through
/// the winning model of the registry. The sequence of performed emissions is
/// strictly non-increasing in transverse momentum squared; a kinematically
/// rejected candidate only lowers the window of its own dipole and is retried
/// without re-sampling anyone else.
pub struct Evolver<'a> {
    config: &'a CascadeConfig,
    registry: &'a ModelRegistry,
}

impl<'a> Evolver<'a> {
    pub fn new(config: &'a CascadeConfig, registry: &'a ModelRegistry) -> Self {
        Self { config, registry }
    }

    /// Runs the evolution until every candidate falls at or below the cutoff.
    ///
    /// # Return
    ///
    /// The performed emissions in the order they happened. An empty log means
    /// the phase space was exhausted from the start, which is a valid frozen
    /// state and not an error.
    ///
    /// # Errors
    ///
    /// Only structural defects surface here: an inconsistent `overrides`
    /// relation between registered models, or a candidate left behind by a
    /// model that no longer recognizes its dipole.
    pub fn evolve(
        &self,
        state: &mut DipoleState,
        reporter: &ProgressReporter,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<PerformedEmission>, CascadeError> {
        let cutoff = self.config.pt2_cutoff;
        let mut performed: Vec<PerformedEmission> = Vec::new();
        let mut last_pt2 = f64::MAX;

        reporter.report(Progress::EvolutionStart {
            dipoles: state.n_dipoles(),
        });

        loop {
            if performed.len() >= self.config.max_emissions {
                warn!(
                    max = self.config.max_emissions,
                    "emission budget exhausted before the cutoff was reached"
                );
                break;
            }

            self.refill(state, cutoff, rng)?;

            let Some((dip, pt2)) = select_hardest(state) else {
                break;
            };
            debug_assert!(
                pt2 <= last_pt2 * (1.0 + 1e-9),
                "candidate scale {pt2} above the previous emission {last_pt2}"
            );

            let model = self.registry.winner(state, dip)?.ok_or_else(|| {
                CascadeError::Internal(
                    "cached candidate on a dipole no model recognizes".to_string(),
                )
            })?;
            let emission = *state
                .dipole(dip)
                .and_then(|dipole| dipole.candidate())
                .ok_or_else(|| {
                    CascadeError::Internal("selected dipole lost its candidate".to_string())
                })?;

            match model.perform(state, &emission) {
                None => {
                    // Kinematically forbidden point: no emission, retry this
                    // dipole below the rejected scale.
                    reporter.report(Progress::CandidateRejected { pt2 });
                    debug!(pt2, model = model.name(), "candidate rejected");
                    if let Some(dipole) = state.dipole_mut(dip) {
                        dipole.reset(pt2);
                    }
                }
                Some(record) => {
                    reporter.report(Progress::EmissionPerformed {
                        pt2,
                        kind: emission.kind,
                    });
                    debug!(
                        pt2,
                        model = model.name(),
                        emissions = performed.len() + 1,
                        "emission performed"
                    );
                    for &touched in &record.touched {
                        if let Some(dipole) = state.dipole_mut(touched) {
                            dipole.reset(pt2);
                        }
                    }
                    last_pt2 = pt2;
                    performed.push(record);
                }
            }
        }

        reporter.report(Progress::EvolutionFinish {
            emissions: performed.len(),
        });
        Ok(performed)
    }

    /// Asks the registry winner of every stale dipole for a fresh candidate
    /// in its current window. Untouched dipoles keep their cached candidate.
    fn refill(
        &self,
        state: &mut DipoleState,
        cutoff: f64,
        rng: &mut dyn RngCore,
    ) -> Result<(), CascadeError> {
        for dip in state.dipole_ids_by_creation() {
            let Some(dipole) = state.dipole(dip) else {
                continue;
            };
            if !dipole.slot.is_stale() {
                continue;
            }
            let ceiling = dipole.max_scale;
            let slot = match self.registry.winner(state, dip)? {
                None => EmissionSlot::NoCandidate,
                Some(model) => match model.generate(state, dip, cutoff, ceiling, rng) {
                    Some(emission) => EmissionSlot::Ready(emission),
                    None => EmissionSlot::NoCandidate,
                },
            };
            if let Some(dipole) = state.dipole_mut(dip) {
                dipole.slot = slot;
            }
        }
        Ok(())
    }
}

/// The dipole holding the globally hardest cached candidate. Equal scales are
/// resolved by creation sequence, never by container iteration order.
fn select_hardest(state: &DipoleState) -> Option<(DipoleId, f64)> {
    state
        .dipoles_iter()
        .filter_map(|(id, dipole)| {
            dipole
                .candidate()
                .map(|emission| (emission.pt2, dipole.seq, id))
        })
        .max_by(|a, b| a.0.total_cmp(&b.0).then_with(|| b.1.cmp(&a.1)))
        .map(|(pt2, _, id)| (id, pt2))
}
