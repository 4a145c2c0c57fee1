//! Backward reconstruction of emission histories.
//!
//! Given a final `DipoleState`, the functions here enumerate every admissible
//! way of undoing exactly one emission: reabsorbing a gluon into its dipole,
//! or re-merging a conjugate quark-antiquark pair into a gluon. Each undo
//! yields a full predecessor state together with the kinematic variables and
//! weights of the undone step, and repeated application builds the branching
//! tree of possible histories consumed by matrix-element matching.
//!
//! A configuration can have several inverses (the same chain may have come
//! from a gluon emission or from a gluon splitting), which is why every
//! reconstruction returns a list, not a single state. Double counting is
//! avoided by fixed conventions: a gluon is reabsorbed only through the
//! dipole holding it as its colour-carrying end, and a pair is merged only
//! through chain-start antiquarks.

use crate::core::kinematics::frame::solve_two_body;
use crate::core::models::emission::{DipoleEnd, EmissionKind};
use crate::core::models::flavour::Flavour;
use crate::core::models::ids::DipoleId;
use crate::core::models::state::DipoleState;
use crate::core::particles::registry::ParticleRegistry;
use crate::core::qcd::coupling::{AlphaS, dipole_colour_factor, radiation_exponent};
use crate::core::qcd::sudakov::{emission_weight, splitting_weight};
use tracing::debug;

/// The reconstructed variables of an undone emission.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoneEmission {
    pub kind: EmissionKind,
    pub pt2: f64,
    pub x1: f64,
    pub x3: f64,
}

/// One admissible one-emission undo of a state.
#[derive(Debug, Clone)]
pub struct HistoryStep {
    /// The state before the undone emission, fully independent of the
    /// original.
    pub predecessor: DipoleState,
    /// The dipole through which the undo was constructed.
    pub dipole: DipoleId,
    pub undone: UndoneEmission,
    /// The coupling-stripped differential emission density of the undone
    /// step.
    pub emission_probability: f64,
    /// The strong coupling at the scale of the undone step.
    pub coupling: f64,
}

impl HistoryStep {
    /// The full reweighting factor carried by this branch.
    pub fn weight(&self) -> f64 {
        self.emission_probability * self.coupling
    }
}

/// One node of the history tree: a state, the step that produced it from its
/// parent (absent at the root), and all of its own predecessors.
#[derive(Debug, Clone)]
pub struct HistoryNode {
    pub state: DipoleState,
    pub undone: Option<UndoneEmission>,
    pub weight: f64,
    pub children: Vec<HistoryNode>,
}

/// Every admissible one-emission undo reachable through the given dipole.
pub fn construct_step(
    state: &DipoleState,
    dip: DipoleId,
    particles: &ParticleRegistry,
    alpha_s: &AlphaS,
) -> Vec<HistoryStep> {
    let mut steps = Vec::new();
    steps.extend(undo_gluon(state, dip, particles, alpha_s));
    steps.extend(undo_splittings(state, dip, particles, alpha_s));
    steps
}

/// Every admissible one-emission undo of the whole state, in dipole creation
/// order.
pub fn construct_all(
    state: &DipoleState,
    particles: &ParticleRegistry,
    alpha_s: &AlphaS,
) -> Vec<HistoryStep> {
    let mut steps = Vec::new();
    for dip in state.dipole_ids_by_creation() {
        steps.extend(construct_step(state, dip, particles, alpha_s));
    }
    debug!(reconstructions = steps.len(), "constructed predecessor states");
    steps
}

/// Builds the branching tree of predecessor states down to `max_depth`
/// undone emissions. The root carries the original state with unit weight.
pub fn reconstruct_tree(
    state: &DipoleState,
    particles: &ParticleRegistry,
    alpha_s: &AlphaS,
    max_depth: usize,
) -> HistoryNode {
    let mut root = HistoryNode {
        state: state.clone(),
        undone: None,
        weight: 1.0,
        children: Vec::new(),
    };
    expand(&mut root, particles, alpha_s, max_depth);
    root
}

fn expand(
    node: &mut HistoryNode,
    particles: &ParticleRegistry,
    alpha_s: &AlphaS,
    depth: usize,
) {
    if depth == 0 {
        return;
    }
    for step in construct_all(&node.state, particles, alpha_s) {
        let mut child = HistoryNode {
            weight: step.weight(),
            state: step.predecessor,
            undone: Some(step.undone),
            children: Vec::new(),
        };
        expand(&mut child, particles, alpha_s, depth - 1);
        node.children.push(child);
    }
}

/// Undoes the gluon emission that produced the gluon at the colour-carrying
/// end of `dip`, merging the dipole with its successor.
fn undo_gluon(
    state: &DipoleState,
    dip: DipoleId,
    particles: &ParticleRegistry,
    alpha_s: &AlphaS,
) -> Option<HistoryStep> {
    let dipole = state.dipole(dip)?;
    let a_id = dipole.ipart;
    let gluon = state.parton(dipole.opart)?;
    if !gluon.is_gluon() {
        return None;
    }
    let next = gluon.odip?;
    let b_id = state.dipole(next)?.opart;
    // A two-gluon ring cannot lose a gluon without collapsing.
    if b_id == a_id {
        return None;
    }

    let a = state.parton(a_id)?;
    let b = state.parton(b_id)?;
    let total = a.momentum + gluon.momentum + b.momentum;
    let s = total.m2();
    if s <= 0.0 {
        return None;
    }
    let w = s.sqrt();
    let (pa, pb) = solve_two_body(
        &total,
        a.mass(particles),
        b.mass(particles),
        &a.momentum,
    )?;

    let beta = total.velocity();
    let x1 = 2.0 * a.momentum.boosted(&-beta).e / w;
    let x3 = 2.0 * b.momentum.boosted(&-beta).e / w;
    let pt2 = s * (1.0 - x1) * (1.0 - x3);
    if !(pt2 > 0.0) {
        return None;
    }

    let colour = dipole_colour_factor(a.is_gluon(), b.is_gluon());
    let weight = emission_weight(
        x1,
        x3,
        radiation_exponent(a.is_gluon()),
        radiation_exponent(b.is_gluon()),
    );

    let mut predecessor = state.clone();
    predecessor.absorb_gluon(dip, pa, pb)?;
    seal_windows(&mut predecessor, pt2);

    Some(HistoryStep {
        predecessor,
        dipole: dip,
        undone: UndoneEmission {
            kind: EmissionKind::Gluon,
            pt2,
            x1,
            x3,
        },
        emission_probability: colour * weight / ((1.0 - x1) * (1.0 - x3)),
        coupling: alpha_s.at(pt2),
    })
}

/// Undoes gluon splittings by re-merging the chain-start antiquark of `dip`
/// with every kinematically compatible chain-end quark.
fn undo_splittings(
    state: &DipoleState,
    dip: DipoleId,
    particles: &ParticleRegistry,
    alpha_s: &AlphaS,
) -> Vec<HistoryStep> {
    let mut steps = Vec::new();
    let Some(dipole) = state.dipole(dip) else {
        return steps;
    };
    let qbar_id = dipole.ipart;
    let Some(qbar) = state.parton(qbar_id) else {
        return steps;
    };
    if !qbar.flavour.is_antiquark() || !qbar.is_chain_start() {
        return steps;
    }

    for (q_id, q) in state.partons_iter() {
        if q.flavour != qbar.flavour.anti() || !q.is_chain_end() {
            continue;
        }
        let Some(own_dipole) = q.idip else {
            continue;
        };
        if own_dipole == dip {
            continue;
        }
        let Some(spectator) = state
            .dipole(own_dipole)
            .and_then(|d| state.parton(d.ipart))
        else {
            continue;
        };

        let total = spectator.momentum + q.momentum + qbar.momentum;
        let s = total.m2();
        if s <= 0.0 {
            continue;
        }
        let w = s.sqrt();
        let Some((p_spectator, p_gluon)) =
            solve_two_body(&total, spectator.mass(particles), 0.0, &spectator.momentum)
        else {
            continue;
        };

        let beta = total.velocity();
        let x1 = 2.0 * spectator.momentum.boosted(&-beta).e / w;
        let x3 = 2.0 * q.momentum.boosted(&-beta).e / w;
        let pt2 = s * (1.0 - x1) * (1.0 - x3);
        if !(pt2 > 0.0) {
            continue;
        }
        let z = x3 / (2.0 - x1);
        let flavour = match q.flavour {
            Flavour::Quark(flavour) => flavour,
            _ => continue,
        };

        let mut predecessor = state.clone();
        if predecessor
            .merge_pair(q_id, qbar_id, p_gluon, p_spectator)
            .is_none()
        {
            continue;
        }
        seal_windows(&mut predecessor, pt2);

        steps.push(HistoryStep {
            predecessor,
            dipole: dip,
            undone: UndoneEmission {
                kind: EmissionKind::Split {
                    end: DipoleEnd::Outgoing,
                    flavour,
                },
                pt2,
                x1,
                x3,
            },
            emission_probability: splitting_weight(z) / ((1.0 - x1) * (1.0 - x3)),
            coupling: alpha_s.at(pt2),
        });
    }
    steps
}

/// Invalidates every cached candidate of a reconstructed state and records
/// the undone scale as the new evolution ceiling.
fn seal_windows(state: &mut DipoleState, pt2: f64) {
    for dip in state.dipole_ids_by_creation() {
        if let Some(dipole) = state.dipole_mut(dip) {
            dipole.reset(pt2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kinematics::momentum::FourMomentum;
    use crate::core::models::flavour::Quark;
    use crate::core::models::state::ChainParton;
    use crate::engine::config::CascadeConfigBuilder;
    use crate::engine::emitters::EmissionModel;
    use crate::engine::emitters::qcd::QcdEmitter;
    use nalgebra::Vector3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn coupling() -> AlphaS {
        AlphaS::Fixed(0.2)
    }

    fn qqbar_state(w: f64) -> DipoleState {
        let mut state = DipoleState::new();
        let half = 0.5 * w;
        state
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
        state
    }

    /// Evolve one gluon emission onto a q-qbar dipole.
    fn one_emission_state() -> DipoleState {
        let config = CascadeConfigBuilder::new()
            .pt2_cutoff(1.0)
            .gluon_splitting(false)
            .build()
            .unwrap();
        let emitter = QcdEmitter::new(&config, &ParticleRegistry::new());
        let mut state = qqbar_state(91.2);
        let dip = state.dipole_ids_by_creation()[0];
        let mut rng = StdRng::seed_from_u64(37);
        loop {
            if let Some(emission) = emitter.generate(&state, dip, 1.0, f64::MAX, &mut rng) {
                if emitter.perform(&mut state, &emission).is_some() {
                    return state;
                }
            }
        }
    }

    #[test]
    fn two_parton_states_have_no_predecessors() {
        let state = qqbar_state(91.2);
        let particles = ParticleRegistry::new();
        assert!(construct_all(&state, &particles, &coupling()).is_empty());
    }

    #[test]
    fn a_three_parton_chain_has_both_kinds_of_inverse() {
        let state = one_emission_state();
        let particles = ParticleRegistry::new();
        let steps = construct_all(&state, &particles, &coupling());

        // The same q g qbar chain may have come from a gluon emission or
        // from the splitting of a gluon in a two-gluon ring.
        assert_eq!(steps.len(), 2);
        let absorb = steps
            .iter()
            .find(|s| matches!(s.undone.kind, EmissionKind::Gluon))
            .unwrap();
        let merge = steps
            .iter()
            .find(|s| matches!(s.undone.kind, EmissionKind::Split { .. }))
            .unwrap();

        assert_eq!(absorb.predecessor.n_partons(), 2);
        assert_eq!(absorb.predecessor.n_dipoles(), 1);
        absorb.predecessor.check_integrity().unwrap();

        // The merge turns the open chain into a two-gluon ring.
        assert_eq!(merge.predecessor.n_partons(), 2);
        assert_eq!(merge.predecessor.n_dipoles(), 2);
        merge.predecessor.check_integrity().unwrap();
        let chains = merge.predecessor.chains();
        assert_eq!(chains.len(), 1);
        assert!(chains[0].closed);
    }

    #[test]
    fn reconstruction_conserves_momentum_and_reports_the_undone_scale() {
        let state = one_emission_state();
        let particles = ParticleRegistry::new();
        let total = state.total_momentum();

        for step in construct_all(&state, &particles, &coupling()) {
            assert!(step.predecessor.total_momentum().approx_eq(&total, 1e-6));
            assert!(step.undone.pt2 > 0.0);
            assert!(step.undone.x1 <= 1.0 + 1e-9 && step.undone.x3 <= 1.0 + 1e-9);
            let expected = (state.total_momentum().m2()
                * (1.0 - step.undone.x1)
                * (1.0 - step.undone.x3))
                .abs();
            assert!((step.undone.pt2 - expected).abs() < 1e-6 * expected.max(1.0));
            assert!(step.emission_probability > 0.0);
            assert!((step.coupling - 0.2).abs() < 1e-12);
            assert!(step.weight() > 0.0);
        }
    }

    #[test]
    fn gluons_are_reabsorbed_only_through_their_colour_carrying_dipole() {
        let state = one_emission_state();
        let particles = ParticleRegistry::new();
        let dips = state.dipole_ids_by_creation();

        // dips[0] holds the emitted gluon as its colour-carrying end.
        let through_first = construct_step(&state, dips[0], &particles, &coupling());
        assert!(
            through_first
                .iter()
                .any(|s| matches!(s.undone.kind, EmissionKind::Gluon))
        );
        let through_second = construct_step(&state, dips[1], &particles, &coupling());
        assert!(
            through_second
                .iter()
                .all(|s| !matches!(s.undone.kind, EmissionKind::Gluon))
        );
    }

    #[test]
    fn merging_joins_two_separate_chains_through_a_gluon() {
        let mut state = DipoleState::new();
        let build = |state: &mut DipoleState, qbar: Quark, quark: Quark, px: f64| {
            state
                .add_chain(
                    &[
                        ChainParton::new(
                            Flavour::AntiQuark(qbar),
                            FourMomentum::new(20.0, Vector3::new(px, 0.0, 19.0)),
                        ),
                        ChainParton::new(
                            Flavour::Quark(quark),
                            FourMomentum::new(20.0, Vector3::new(-px, 0.0, -19.0)),
                        ),
                    ],
                    false,
                )
                .unwrap();
        };
        build(&mut state, Quark::Down, Quark::Up, 2.0);
        build(&mut state, Quark::Up, Quark::Down, -2.0);
        let particles = ParticleRegistry::new();

        let steps = construct_all(&state, &particles, &coupling());
        // u against u~ and d against d~, one merge each.
        assert_eq!(steps.len(), 2);
        for step in &steps {
            assert!(matches!(step.undone.kind, EmissionKind::Split { .. }));
            assert_eq!(step.predecessor.n_partons(), 3);
            assert_eq!(step.predecessor.chains().len(), 1);
            step.predecessor.check_integrity().unwrap();
        }
    }

    #[test]
    fn lone_pairs_cannot_merge_into_themselves() {
        let state = qqbar_state(40.0);
        let particles = ParticleRegistry::new();
        let dips = state.dipole_ids_by_creation();
        assert!(construct_step(&state, dips[0], &particles, &coupling()).is_empty());
    }

    #[test]
    fn the_history_tree_branches_down_to_the_hard_state() {
        let state = one_emission_state();
        let particles = ParticleRegistry::new();
        let tree = reconstruct_tree(&state, &particles, &coupling(), 2);

        assert!(tree.undone.is_none());
        assert_eq!(tree.weight, 1.0);
        assert_eq!(tree.children.len(), 2);
        for child in &tree.children {
            assert!(child.undone.is_some());
            assert!(child.weight > 0.0);
        }
        // The gluon-absorption branch reaches the irreducible two-parton
        // state and stops there.
        let absorbed = tree
            .children
            .iter()
            .find(|c| matches!(c.undone.as_ref().unwrap().kind, EmissionKind::Gluon))
            .unwrap();
        assert!(absorbed.children.is_empty());
    }
}
