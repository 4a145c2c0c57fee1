use super::EmissionModel;
use crate::core::kinematics::frame::{DipoleFrame, solve_three_body};
use crate::core::models::emission::{
    DipoleEnd, Emission, EmissionKind, PerformedEmission, RevertRecord,
};
use crate::core::models::flavour::{Flavour, Quark};
use crate::core::models::ids::DipoleId;
use crate::core::models::state::DipoleState;
use crate::core::particles::registry::ParticleRegistry;
use crate::core::qcd::coupling::{AlphaS, dipole_colour_factor, radiation_exponent};
use crate::core::qcd::sudakov::{Candidate, emission_weight, sample_channel, splitting_weight};
use crate::engine::config::CascadeConfig;
use crate::engine::error::CascadeError;
use rand::{Rng, RngCore};
use std::f64::consts::{PI, TAU};
use tracing::trace;

/// The default pure-QCD behavior of a dipole: final-state gluon emission and
/// gluon splitting into a quark-antiquark pair.
///
/// Every live dipole is handled; specialized models take precedence through
/// `overrides` where their topology applies. Each interior gluon is offered
/// for splitting only through the dipole that holds it as its colour-carrying
/// end, so every gluon competes in exactly one splitting channel per flavour.
pub struct QcdEmitter {
    alpha_s: AlphaS,
    max_flavour: Quark,
    gluon_emission: bool,
    gluon_splitting: bool,
    particles: ParticleRegistry,
}

impl QcdEmitter {
    pub const NAME: &'static str = "qcd";

    pub fn new(config: &CascadeConfig, particles: &ParticleRegistry) -> Self {
        Self {
            alpha_s: config.alpha_s,
            max_flavour: config.max_flavour,
            gluon_emission: config.gluon_emission,
            gluon_splitting: config.gluon_splitting,
            particles: particles.clone(),
        }
    }

    /// Samples the gluon-emission channel with the given correction hooks and
    /// the splitting channels with the plain kernel, returning the hardest
    /// candidate. The hooks let a correction model reshape the radiation
    /// pattern without re-deriving any kinematics: `preweight` enlarges the
    /// proposal density of the gluon channel, `reweight` rescales its
    /// acceptance.
    pub(crate) fn generate_corrected(
        &self,
        state: &DipoleState,
        dip: DipoleId,
        pt2min: f64,
        pt2max: f64,
        rng: &mut dyn RngCore,
        preweight: f64,
        reweight: &dyn Fn(&Candidate) -> f64,
    ) -> Option<Emission> {
        let dipole = state.dipole(dip)?;
        let pi = state.parton(dipole.ipart)?;
        let po = state.parton(dipole.opart)?;
        let s = state.sdip(dip)?;
        if s <= 0.0 {
            return None;
        }
        let w = s.sqrt();
        let alpha_max = self.alpha_s.ceiling(pt2min);
        let mut best: Option<Emission> = None;

        if self.gluon_emission {
            let mi = pi.mass(&self.particles);
            let mo = po.mass(&self.particles);
            let colour = dipole_colour_factor(pi.is_gluon(), po.is_gluon());
            let exp_in = radiation_exponent(pi.is_gluon());
            let exp_out = radiation_exponent(po.is_gluon());
            let c_over = preweight * colour * alpha_max / (2.0 * PI);

            let accept = |c: &Candidate| {
                let e1 = 0.5 * c.x1 * w;
                let e3 = 0.5 * c.x3 * w;
                if e1 < mi || e3 < mo || e1 + e3 > w {
                    return 0.0;
                }
                emission_weight(c.x1, c.x3, exp_in, exp_out) * (self.alpha_s.at(c.pt2) / alpha_max)
                    * reweight(c)
                    / preweight
            };
            if let Some(c) = sample_channel(s, pt2min, pt2max, c_over, accept, rng) {
                let azimuth = rng.random_range(0.0..TAU);
                // Kleiss prescription: the harder end keeps its direction
                // more often.
                let keep_incoming =
                    rng.random::<f64>() * (c.x1 * c.x1 + c.x3 * c.x3) < c.x1 * c.x1;
                best = Some(Emission {
                    dipole: dip,
                    kind: EmissionKind::Gluon,
                    pt2: c.pt2,
                    x1: c.x1,
                    x3: c.x3,
                    azimuth,
                    keep_incoming,
                });
            }
        }

        if self.gluon_splitting && po.is_gluon() {
            let m_spec = pi.mass(&self.particles);
            let c_over = alpha_max / (4.0 * PI);
            for flavour in Quark::ALL {
                if flavour > self.max_flavour {
                    break;
                }
                let mq = self.particles.mass_of(Flavour::Quark(flavour));
                if w < m_spec + 2.0 * mq {
                    continue;
                }
                let accept = |c: &Candidate| {
                    let e1 = 0.5 * c.x1 * w;
                    let e3 = 0.5 * c.x3 * w;
                    let e2 = w - e1 - e3;
                    if e1 < m_spec || e3 < mq || e2 < mq {
                        return 0.0;
                    }
                    let z = c.x3 / (2.0 - c.x1);
                    splitting_weight(z) * (self.alpha_s.at(c.pt2) / alpha_max)
                };
                if let Some(c) = sample_channel(s, pt2min, pt2max, c_over, accept, rng) {
                    if best.as_ref().is_none_or(|b| c.pt2 > b.pt2) {
                        let azimuth = rng.random_range(0.0..TAU);
                        best = Some(Emission {
                            dipole: dip,
                            kind: EmissionKind::Split {
                                end: DipoleEnd::Outgoing,
                                flavour,
                            },
                            pt2: c.pt2,
                            x1: c.x1,
                            x3: c.x3,
                            azimuth,
                            keep_incoming: true,
                        });
                    }
                }
            }
        }

        if let Some(emission) = &best {
            trace!(pt2 = emission.pt2, kind = ?emission.kind, "generated candidate");
        }
        best
    }

    fn perform_gluon(
        &self,
        state: &mut DipoleState,
        emission: &Emission,
    ) -> Option<PerformedEmission> {
        let dipole = state.dipole(emission.dipole)?;
        let pi = state.parton(dipole.ipart)?;
        let po = state.parton(dipole.opart)?;
        let prior_ipart = pi.momentum;
        let prior_opart = po.momentum;
        let masses = [pi.mass(&self.particles), 0.0, po.mass(&self.particles)];

        let frame = DipoleFrame::from_pair(&prior_ipart, &prior_opart)?;
        let three = solve_three_body(
            &frame,
            masses,
            emission.x1,
            emission.x3,
            emission.azimuth,
            emission.keep_incoming,
        )?;

        let (gluon, new_dipole) =
            state.emit_gluon(emission.dipole, three.p2, three.p1, three.p3, emission.pt2)?;
        let touched: Vec<DipoleId> = [
            Some(emission.dipole),
            Some(new_dipole),
            state.prev(emission.dipole),
            state.next(new_dipole),
        ]
        .into_iter()
        .flatten()
        .collect();

        Some(PerformedEmission {
            emission: *emission,
            emitted: gluon,
            touched,
            revert: Some(RevertRecord::Gluon {
                new_dipole,
                gluon,
                prior_ipart,
                prior_opart,
            }),
        })
    }

    fn perform_split(
        &self,
        state: &mut DipoleState,
        emission: &Emission,
        end: DipoleEnd,
        flavour: Quark,
    ) -> Option<PerformedEmission> {
        let dipole = state.dipole(emission.dipole)?;
        let (gluon_id, spectator_id) = match end {
            DipoleEnd::Outgoing => (dipole.opart, dipole.ipart),
            DipoleEnd::Incoming => (dipole.ipart, dipole.opart),
        };
        let gluon = state.parton(gluon_id)?;
        if !gluon.is_gluon() {
            return None;
        }
        let neighbor = match end {
            DipoleEnd::Outgoing => gluon.odip?,
            DipoleEnd::Incoming => gluon.idip?,
        };
        let removed_gluon = gluon.clone();
        let spectator = state.parton(spectator_id)?;
        let prior_spectator = spectator.momentum;
        let m_spec = spectator.mass(&self.particles);
        let mq = self.particles.mass_of(Flavour::Quark(flavour));

        let frame = DipoleFrame::from_pair(&prior_spectator, &removed_gluon.momentum)?;
        let three = solve_three_body(
            &frame,
            [m_spec, mq, mq],
            emission.x1,
            emission.x3,
            emission.azimuth,
            true,
        )?;

        let (quark, antiquark) = state.split_gluon(
            emission.dipole,
            end,
            flavour,
            three.p1,
            three.p3,
            three.p2,
            mq,
            emission.pt2,
        )?;
        let near_neighbor = match end {
            DipoleEnd::Outgoing => state.prev(emission.dipole),
            DipoleEnd::Incoming => state.next(emission.dipole),
        };
        let touched: Vec<DipoleId> = [Some(emission.dipole), Some(neighbor), near_neighbor]
            .into_iter()
            .flatten()
            .collect();

        Some(PerformedEmission {
            emission: *emission,
            emitted: quark,
            touched,
            revert: Some(RevertRecord::Split {
                neighbor,
                quark,
                antiquark,
                removed_gluon,
                prior_spectator,
            }),
        })
    }
}

impl EmissionModel for QcdEmitter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_handle(&self, state: &DipoleState, dip: DipoleId) -> bool {
        state.dipole(dip).is_some()
    }

    fn overrides(&self, _: &dyn EmissionModel, _: &DipoleState, _: DipoleId) -> bool {
        false
    }

    fn generate(
        &self,
        state: &DipoleState,
        dip: DipoleId,
        pt2min: f64,
        pt2max: f64,
        rng: &mut dyn RngCore,
    ) -> Option<Emission> {
        self.generate_corrected(state, dip, pt2min, pt2max, rng, 1.0, &|_| 1.0)
    }

    fn perform(
        &self,
        state: &mut DipoleState,
        emission: &Emission,
    ) -> Option<PerformedEmission> {
        match emission.kind {
            EmissionKind::Gluon => self.perform_gluon(state, emission),
            EmissionKind::Split { end, flavour } => {
                self.perform_split(state, emission, end, flavour)
            }
            EmissionKind::BosonGluonFusion { .. } => None,
        }
    }

    fn can_revert(&self) -> bool {
        true
    }

    fn revert(
        &self,
        state: &mut DipoleState,
        performed: &PerformedEmission,
    ) -> Result<(), CascadeError> {
        let record = performed.revert.as_ref().ok_or_else(|| {
            CascadeError::ModelContract {
                model: self.name(),
                reason: "performed emission carries no revert record".to_string(),
            }
        })?;
        let restored = match record {
            RevertRecord::Gluon {
                prior_ipart,
                prior_opart,
                ..
            } => state.absorb_gluon(performed.emission.dipole, *prior_ipart, *prior_opart),
            RevertRecord::Split {
                neighbor,
                quark,
                antiquark,
                removed_gluon,
                prior_spectator,
            } => {
                let end = match performed.emission.kind {
                    EmissionKind::Split { end, .. } => end,
                    _ => {
                        return Err(CascadeError::ModelContract {
                            model: self.name(),
                            reason: "split revert record on a non-split emission".to_string(),
                        });
                    }
                };
                state
                    .unsplit_gluon(
                        performed.emission.dipole,
                        *neighbor,
                        end,
                        removed_gluon.clone(),
                        *quark,
                        *antiquark,
                        *prior_spectator,
                    )
                    .map(|_| ())
            }
        };
        restored.ok_or_else(|| CascadeError::ModelContract {
            model: self.name(),
            reason: "failed to reconstruct the state prior to the emission".to_string(),
        })
    }
}
