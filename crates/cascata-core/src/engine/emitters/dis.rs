use super::EmissionModel;
use super::qcd::QcdEmitter;
use crate::core::kinematics::frame::{DipoleFrame, solve_three_body, solve_two_body};
use crate::core::models::emission::{Emission, EmissionKind, PerformedEmission};
use crate::core::models::flavour::{Flavour, Quark};
use crate::core::models::ids::DipoleId;
use crate::core::models::parton::PartonOrigin;
use crate::core::models::state::{ChainParton, DipoleState};
use crate::core::particles::registry::ParticleRegistry;
use crate::core::qcd::coupling::{AlphaS, dipole_colour_factor, radiation_exponent};
use crate::core::qcd::sudakov::{Candidate, emission_weight, sample_channel, splitting_weight};
use crate::engine::config::{CascadeConfig, RemnantConfig};
use rand::{Rng, RngCore};
use std::f64::consts::{PI, TAU};
use tracing::trace;

/// The remnant-aware variant of the dipole behavior, applied to dipoles
/// bounded by a beam or initial-state remnant.
///
/// A remnant is an extended source, so its gluon radiation is damped by
/// `min(1, (mu2/pt2)^alpha)` above the inverse-size scale `mu2`; final-state
/// splitting of the dipole's gluon end is disabled; and the boson-gluon-fusion
/// channel may produce a quark pair as a separate colour-singlet chain.
/// Emissions of this model cannot be reverted.
pub struct DisEmitter {
    alpha_s: AlphaS,
    max_flavour: Quark,
    gluon_emission: bool,
    remnant: RemnantConfig,
    particles: ParticleRegistry,
}

impl DisEmitter {
    pub const NAME: &'static str = "dis";

    pub fn new(config: &CascadeConfig, particles: &ParticleRegistry) -> Self {
        Self {
            alpha_s: config.alpha_s,
            max_flavour: config.max_flavour,
            gluon_emission: config.gluon_emission,
            remnant: config.remnant.clone(),
            particles: particles.clone(),
        }
    }

    /// The extended-source damping of radiation off a remnant.
    fn suppression(&self, pt2: f64) -> f64 {
        (self.remnant.suppression_mu2 / pt2)
            .powf(self.remnant.suppression_alpha)
            .min(1.0)
    }

    fn perform_fusion(
        &self,
        state: &mut DipoleState,
        emission: &Emission,
        flavour: Quark,
    ) -> Option<PerformedEmission> {
        let dipole = state.dipole(emission.dipole)?;
        let (ipid, opid) = (dipole.ipart, dipole.opart);
        let pi = state.parton(ipid)?;
        let po = state.parton(opid)?;
        let mi = pi.mass(&self.particles);
        let mo = po.mass(&self.particles);
        let mq = self.particles.mass_of(Flavour::Quark(flavour));

        let frame = DipoleFrame::from_pair(&pi.momentum, &po.momentum)?;
        // The pair enters as one pseudoparticle at threshold mass, then
        // decays back to back in its own rest frame.
        let three = solve_three_body(
            &frame,
            [mi, 2.0 * mq, mo],
            emission.x1,
            emission.x3,
            emission.azimuth,
            emission.keep_incoming,
        )?;
        let hint = three.p1;
        let (p_antiquark, p_quark) = solve_two_body(&three.p2, mq, mq, &hint)?;

        // Build the chainlet before touching the bounding partons, so a
        // rejected point leaves the state unmodified.
        let pair = state
            .add_chain(
                &[
                    ChainParton::new(Flavour::AntiQuark(flavour), p_antiquark)
                        .with_scale(emission.pt2),
                    ChainParton::new(Flavour::Quark(flavour), p_quark).with_scale(emission.pt2),
                ],
                true,
            )
            .ok()?;
        state.parton_mut(ipid)?.momentum = three.p1;
        state.parton_mut(opid)?.momentum = three.p3;
        for &id in &pair {
            let parton = state.parton_mut(id)?;
            parton.origin = PartonOrigin::Emitted;
            parton.generated_mass = Some(mq);
        }
        let quark = pair[1];
        let pair_dipole = state.parton(pair[0])?.odip?;

        let touched: Vec<DipoleId> = [
            Some(emission.dipole),
            Some(pair_dipole),
            state.prev(emission.dipole),
            state.next(emission.dipole),
        ]
        .into_iter()
        .flatten()
        .collect();

        Some(PerformedEmission {
            emission: *emission,
            emitted: quark,
            touched,
            revert: None,
        })
    }
}

impl EmissionModel for DisEmitter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn can_handle(&self, state: &DipoleState, dip: DipoleId) -> bool {
        state.dipole(dip).is_some_and(|dipole| {
            let remnant_end = |id| {
                state
                    .parton(id)
                    .is_some_and(|parton| parton.is_remnant())
            };
            remnant_end(dipole.ipart) || remnant_end(dipole.opart)
        })
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
        let dipole = state.dipole(dip)?;
        let pi = state.parton(dipole.ipart)?;
        let po = state.parton(dipole.opart)?;
        let s = state.sdip(dip)?;
        if s <= 0.0 {
            return None;
        }
        let w = s.sqrt();
        let mi = pi.mass(&self.particles);
        let mo = po.mass(&self.particles);
        let alpha_max = self.alpha_s.ceiling(pt2min);
        let mut best: Option<Emission> = None;

        if self.gluon_emission {
            let colour = dipole_colour_factor(pi.is_gluon(), po.is_gluon());
            let exp_in = radiation_exponent(pi.is_gluon());
            let exp_out = radiation_exponent(po.is_gluon());
            let c_over = colour * alpha_max / (2.0 * PI);
            let accept = |c: &Candidate| {
                let e1 = 0.5 * c.x1 * w;
                let e3 = 0.5 * c.x3 * w;
                if e1 < mi || e3 < mo || e1 + e3 > w {
                    return 0.0;
                }
                emission_weight(c.x1, c.x3, exp_in, exp_out)
                    * (self.alpha_s.at(c.pt2) / alpha_max)
                    * self.suppression(c.pt2)
            };
            if let Some(c) = sample_channel(s, pt2min, pt2max, c_over, accept, rng) {
                let azimuth = rng.random_range(0.0..TAU);
                // The remnant side keeps its direction; for a two-remnant
                // dipole fall back to the Kleiss choice.
                let keep_incoming = match (pi.is_remnant(), po.is_remnant()) {
                    (true, false) => true,
                    (false, true) => false,
                    _ => rng.random::<f64>() * (c.x1 * c.x1 + c.x3 * c.x3) < c.x1 * c.x1,
                };
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

        if self.remnant.boson_gluon_fusion {
            let c_over = alpha_max / (4.0 * PI);
            for flavour in Quark::ALL {
                if flavour > self.max_flavour {
                    break;
                }
                let mq = self.particles.mass_of(Flavour::Quark(flavour));
                if w < mi + mo + 2.0 * mq {
                    continue;
                }
                let accept = |c: &Candidate| {
                    let e1 = 0.5 * c.x1 * w;
                    let e3 = 0.5 * c.x3 * w;
                    let e2 = w - e1 - e3;
                    if e1 < mi || e3 < mo || e2 < 2.0 * mq {
                        return 0.0;
                    }
                    let z = c.x3 / (2.0 - c.x1);
                    splitting_weight(z)
                        * (self.alpha_s.at(c.pt2) / alpha_max)
                        * self.suppression(c.pt2)
                };
                if let Some(c) = sample_channel(s, pt2min, pt2max, c_over, accept, rng) {
                    if best.as_ref().is_none_or(|b| c.pt2 > b.pt2) {
                        let azimuth = rng.random_range(0.0..TAU);
                        best = Some(Emission {
                            dipole: dip,
                            kind: EmissionKind::BosonGluonFusion { flavour },
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
            trace!(pt2 = emission.pt2, kind = ?emission.kind, "generated remnant candidate");
        }
        best
    }

    fn perform(
        &self,
        state: &mut DipoleState,
        emission: &Emission,
    ) -> Option<PerformedEmission> {
        match emission.kind {
            EmissionKind::Gluon => {
                // The chain surgery is identical to the final-state case; the
                // remnant treatment only shaped the sampling.
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
                let (gluon, new_dipole) = state.emit_gluon(
                    emission.dipole,
                    three.p2,
                    three.p1,
                    three.p3,
                    emission.pt2,
                )?;
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
                    revert: None,
                })
            }
            EmissionKind::BosonGluonFusion { flavour } => {
                self.perform_fusion(state, emission, flavour)
            }
            EmissionKind::Split { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kinematics::momentum::FourMomentum;
    use crate::engine::config::CascadeConfigBuilder;
    use nalgebra::Vector3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn remnant_state(w: f64) -> (DipoleState, DipoleId) {
        let mut state = DipoleState::new();
        let half = 0.5 * w;
        state
            .add_chain(
                &[
                    ChainParton::new(
                        Flavour::AntiQuark(Quark::Up),
                        FourMomentum::new(half, Vector3::new(0.0, 0.0, half)),
                    )
                    .remnant(),
                    ChainParton::new(
                        Flavour::Quark(Quark::Up),
                        FourMomentum::new(half, Vector3::new(0.0, 0.0, -half)),
                    ),
                ],
                false,
            )
            .unwrap();
        let dip = state.dipole_ids_by_creation()[0];
        (state, dip)
    }

    fn create_emitter(config: &CascadeConfig) -> DisEmitter {
        DisEmitter::new(config, &ParticleRegistry::new())
    }

    #[test]
    fn handles_remnant_dipoles_and_overrides_the_default() {
        let config = CascadeConfigBuilder::new().pt2_cutoff(1.0).build().unwrap();
        let particles = ParticleRegistry::new();
        let dis = create_emitter(&config);
        let qcd = QcdEmitter::new(&config, &particles);

        let (state, dip) = remnant_state(60.0);
        assert!(dis.can_handle(&state, dip));
        assert!(dis.overrides(&qcd, &state, dip));
        assert!(!qcd.overrides(&dis, &state, dip));

        let mut plain = DipoleState::new();
        let half = 30.0;
        plain
            .add_chain(
                &[
                    ChainParton::new(
                        Flavour::AntiQuark(Quark::Up),
                        FourMomentum::new(half, Vector3::new(0.0, 0.0, half)),
                    ),
                    ChainParton::new(
                        Flavour::Quark(Quark::Up),
                        FourMomentum::new(half, Vector3::new(0.0, 0.0, -half)),
                    ),
                ],
                false,
            )
            .unwrap();
        let plain_dip = plain.dipole_ids_by_creation()[0];
        assert!(!dis.can_handle(&plain, plain_dip));
    }

    #[test]
    fn remnant_suppression_damps_hard_emissions() {
        let config = CascadeConfigBuilder::new().pt2_cutoff(1.0).build().unwrap();
        let emitter = create_emitter(&config);
        assert_eq!(emitter.suppression(0.1), 1.0);
        let soft = emitter.suppression(1.0);
        let hard = emitter.suppression(100.0);
        assert!(soft > hard);
        assert!((hard - 0.0036).abs() < 1e-9);
    }

    #[test]
    fn final_state_splitting_is_disabled() {
        let config = CascadeConfigBuilder::new()
            .pt2_cutoff(0.25)
            .gluon_emission(false)
            .remnant(RemnantConfig {
                boson_gluon_fusion: false,
                ..RemnantConfig::default()
            })
            .build()
            .unwrap();
        let emitter = create_emitter(&config);
        let (state, dip) = remnant_state(40.0);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            assert!(emitter.generate(&state, dip, 0.25, f64::MAX, &mut rng).is_none());
        }
    }

    #[test]
    fn boson_gluon_fusion_builds_a_singlet_chainlet() {
        let config = CascadeConfigBuilder::new()
            .pt2_cutoff(0.25)
            .gluon_emission(false)
            .build()
            .unwrap();
        let emitter = create_emitter(&config);
        let (mut state, dip) = remnant_state(60.0);
        let before = state.total_momentum();
        let mut rng = StdRng::seed_from_u64(19);

        let emission = (0..500)
            .find_map(|_| emitter.generate(&state, dip, 0.25, f64::MAX, &mut rng))
            .expect("fusion channel should fire on a 60 GeV remnant dipole");
        let flavour = match emission.kind {
            EmissionKind::BosonGluonFusion { flavour } => flavour,
            other => panic!("unexpected kind {other:?}"),
        };

        let performed = emitter.perform(&mut state, &emission).unwrap();
        assert!(performed.revert.is_none());
        state.check_integrity().unwrap();
        assert_eq!(state.n_partons(), 4);
        assert_eq!(state.n_dipoles(), 2);
        assert!(state.total_momentum().approx_eq(&before, 1e-6));

        let chains = state.chains();
        assert_eq!(chains.len(), 2);
        let quark = state.parton(performed.emitted).unwrap();
        assert_eq!(quark.flavour, Flavour::Quark(flavour));
        assert_eq!(quark.origin, PartonOrigin::Emitted);
        assert!(quark.generated_mass.is_some());
    }

    #[test]
    fn fusion_cannot_be_reverted() {
        let config = CascadeConfigBuilder::new().pt2_cutoff(1.0).build().unwrap();
        let emitter = create_emitter(&config);
        assert!(!emitter.can_revert());
    }
}
