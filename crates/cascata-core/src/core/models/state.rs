use super::dipole::Dipole;
use super::emission::DipoleEnd;
use super::flavour::{Flavour, Quark};
use super::ids::{DipoleId, PartonId};
use super::parton::{Parton, PartonOrigin};
use crate::core::kinematics::momentum::FourMomentum;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Factor separating the string index from the per-string ordinal in a
/// colour index.
const COLOUR_INDEX_DIV: i32 = 1000;

#[derive(Debug, Error, PartialEq)]
pub enum TopologyError {
    #[error("A colour chain needs at least two partons, got {0}")]
    ChainTooShort(usize),
    #[error("A gluon ring needs at least two gluons, got {0}")]
    RingTooSmall(usize),
    #[error("Flavour {0:?} cannot terminate the anti-colour end of a chain")]
    InvalidChainStart(Flavour),
    #[error("Flavour {0:?} cannot terminate the colour end of a chain")]
    InvalidChainEnd(Flavour),
    #[error("Interior chain partons must be gluons, got {0:?}")]
    InteriorNotGluon(Flavour),
    #[error("Dipole between partons {0} and {1} has non-positive invariant mass squared ({2})")]
    DegenerateDipole(usize, usize, f64),
    #[error("Broken cross-reference: {0}")]
    BrokenLink(String),
    #[error("Flavour capability violated: {0}")]
    ColourCapability(String),
    #[error("Colour index {0} assigned to more than one dipole")]
    DuplicateColourIndex(i32),
}

/// Input record for chain construction: one parton of the hard process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainParton {
    pub flavour: Flavour,
    pub momentum: FourMomentum,
    pub origin: PartonOrigin,
    /// Production scale in GeV², honored when the chain is built with
    /// `respect_scale`.
    pub scale: f64,
}

impl ChainParton {
    pub fn new(flavour: Flavour, momentum: FourMomentum) -> Self {
        Self {
            flavour,
            momentum,
            origin: PartonOrigin::Hard,
            scale: f64::MAX,
        }
    }

    /// Marks the parton as a beam/initial-state remnant.
    pub fn remnant(mut self) -> Self {
        self.origin = PartonOrigin::Remnant;
        self
    }

    pub fn with_scale(mut self, pt2: f64) -> Self {
        self.scale = pt2;
        self
    }
}

/// One colour-connected sequence of partons, open (remnant to remnant) or
/// closed (a pure gluon ring).
#[derive(Debug, Clone, PartialEq)]
pub struct ColourChain {
    pub partons: Vec<PartonId>,
    pub closed: bool,
}

/// The full parton/dipole graph of one event.
///
/// The state owns every parton and dipole in slot-map arenas; partons and
/// dipoles refer to each other exclusively through arena handles, so a
/// `clone()` is a deep, self-contained copy of the whole graph with no
/// aliasing to the original.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DipoleState {
    partons: SlotMap<PartonId, Parton>,
    dipoles: SlotMap<DipoleId, Dipole>,
    next_string_index: u32,
    next_seq: u64,
    colour_ordinals: HashMap<u32, i32>,
}

impl DipoleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parton(&self, id: PartonId) -> Option<&Parton> {
        self.partons.get(id)
    }

    pub fn parton_mut(&mut self, id: PartonId) -> Option<&mut Parton> {
        self.partons.get_mut(id)
    }

    pub fn dipole(&self, id: DipoleId) -> Option<&Dipole> {
        self.dipoles.get(id)
    }

    pub fn dipole_mut(&mut self, id: DipoleId) -> Option<&mut Dipole> {
        self.dipoles.get_mut(id)
    }

    pub fn partons_iter(&self) -> impl Iterator<Item = (PartonId, &Parton)> {
        self.partons.iter()
    }

    pub fn dipoles_iter(&self) -> impl Iterator<Item = (DipoleId, &Dipole)> {
        self.dipoles.iter()
    }

    pub fn n_partons(&self) -> usize {
        self.partons.len()
    }

    pub fn n_dipoles(&self) -> usize {
        self.dipoles.len()
    }

    /// All dipole handles ordered by creation sequence. This ordering is
    /// the deterministic tie-break of the evolution scheduler.
    pub fn dipole_ids_by_creation(&self) -> Vec<DipoleId> {
        let mut ids: Vec<(u64, DipoleId)> =
            self.dipoles.iter().map(|(id, d)| (d.seq, id)).collect();
        ids.sort_by_key(|&(seq, _)| seq);
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// The previous dipole in the chain (`ipart`'s incoming side).
    pub fn prev(&self, dip: DipoleId) -> Option<DipoleId> {
        self.partons.get(self.dipoles.get(dip)?.ipart)?.idip
    }

    /// The next dipole in the chain (`opart`'s outgoing side).
    pub fn next(&self, dip: DipoleId) -> Option<DipoleId> {
        self.partons.get(self.dipoles.get(dip)?.opart)?.odip
    }

    /// The squared invariant mass of the dipole.
    pub fn sdip(&self, dip: DipoleId) -> Option<f64> {
        let dipole = self.dipoles.get(dip)?;
        let pi = self.partons.get(dipole.ipart)?.momentum;
        let po = self.partons.get(dipole.opart)?.momentum;
        Some((pi + po).m2())
    }

    /// The total four-momentum of every parton in the state.
    pub fn total_momentum(&self) -> FourMomentum {
        self.partons.values().map(|p| p.momentum).sum()
    }

    /// The remnant partons terminating chains.
    pub fn remnants(&self) -> Vec<PartonId> {
        self.partons
            .iter()
            .filter(|(_, p)| p.is_remnant())
            .map(|(id, _)| id)
            .collect()
    }

    /// The colour index of a dipole, assigning one on first access.
    /// Indices are `string_index * 1000 + ordinal` with the ordinal counting
    /// up per string, which keeps every index unique within its chain.
    pub fn colour_index(&mut self, dip: DipoleId) -> Option<i32> {
        let string_index = self.dipoles.get(dip)?.string_index;
        let dipole = self.dipoles.get_mut(dip)?;
        if dipole.colour_index == 0 {
            let ordinal = self
                .colour_ordinals
                .entry(string_index)
                .and_modify(|o| *o += 1)
                .or_insert(1);
            dipole.colour_index = string_index as i32 * COLOUR_INDEX_DIV + *ordinal;
        }
        Some(dipole.colour_index)
    }

    /// Builds one open colour chain from a hard-process final state.
    ///
    /// The first parton becomes the anti-colour chain start, the last the
    /// colour chain end, and every interior parton must be a gluon. With
    /// `respect_scale`, each dipole's evolution ceiling is capped by the
    /// production scales of its bounding partons in addition to the
    /// kinematic limit `s/4`.
    ///
    /// # Return
    ///
    /// The parton handles in chain order.
    pub fn add_chain(
        &mut self,
        specs: &[ChainParton],
        respect_scale: bool,
    ) -> Result<Vec<PartonId>, TopologyError> {
        if specs.len() < 2 {
            return Err(TopologyError::ChainTooShort(specs.len()));
        }

        let first = &specs[0];
        if !(first.flavour.carries_anticolour() && !first.flavour.carries_colour())
            && first.origin != PartonOrigin::Remnant
        {
            return Err(TopologyError::InvalidChainStart(first.flavour));
        }
        let last = &specs[specs.len() - 1];
        if !(last.flavour.carries_colour() && !last.flavour.carries_anticolour())
            && last.origin != PartonOrigin::Remnant
        {
            return Err(TopologyError::InvalidChainEnd(last.flavour));
        }
        for spec in &specs[1..specs.len() - 1] {
            if !spec.flavour.is_gluon() {
                return Err(TopologyError::InteriorNotGluon(spec.flavour));
            }
        }
        self.validate_pair_masses(specs, false)?;

        let string_index = self.next_string_index;
        self.next_string_index += 1;

        let ids: Vec<PartonId> = specs.iter().map(|s| self.insert_parton(s)).collect();
        for window in ids.windows(2) {
            self.link(window[0], window[1], string_index, respect_scale);
        }
        Ok(ids)
    }

    /// Builds a closed gluon ring (a colour-singlet loop of at least two
    /// gluons).
    pub fn add_ring(
        &mut self,
        specs: &[ChainParton],
        respect_scale: bool,
    ) -> Result<Vec<PartonId>, TopologyError> {
        if specs.len() < 2 {
            return Err(TopologyError::RingTooSmall(specs.len()));
        }
        for spec in specs {
            if !spec.flavour.is_gluon() {
                return Err(TopologyError::InteriorNotGluon(spec.flavour));
            }
        }
        self.validate_pair_masses(specs, true)?;

        let string_index = self.next_string_index;
        self.next_string_index += 1;

        let ids: Vec<PartonId> = specs.iter().map(|s| self.insert_parton(s)).collect();
        for k in 0..ids.len() {
            self.link(ids[k], ids[(k + 1) % ids.len()], string_index, respect_scale);
        }
        Ok(ids)
    }

    fn validate_pair_masses(
        &self,
        specs: &[ChainParton],
        closed: bool,
    ) -> Result<(), TopologyError> {
        let pairs = if closed { specs.len() } else { specs.len() - 1 };
        for k in 0..pairs {
            let next = (k + 1) % specs.len();
            let s = (specs[k].momentum + specs[next].momentum).m2();
            if s <= 0.0 {
                return Err(TopologyError::DegenerateDipole(k, next, s));
            }
        }
        Ok(())
    }

    fn insert_parton(&mut self, spec: &ChainParton) -> PartonId {
        let mut parton = Parton::new(spec.flavour, spec.momentum);
        parton.origin = spec.origin;
        parton.scale = spec.scale;
        self.partons.insert(parton)
    }

    fn link(
        &mut self,
        ipart: PartonId,
        opart: PartonId,
        string_index: u32,
        respect_scale: bool,
    ) -> DipoleId {
        let seq = self.next_seq;
        self.next_seq += 1;

        let mut dipole = Dipole::new(ipart, opart, string_index, seq);
        let s = (self.partons[ipart].momentum + self.partons[opart].momentum).m2();
        let mut ceiling = 0.25 * s;
        if respect_scale {
            ceiling = ceiling
                .min(self.partons[ipart].scale)
                .min(self.partons[opart].scale);
        }
        dipole.max_scale = ceiling;

        let id = self.dipoles.insert(dipole);
        self.partons[ipart].odip = Some(id);
        self.partons[opart].idip = Some(id);
        id
    }

    /// Inserts an emitted gluon into a dipole: the chain `a -- b` becomes
    /// `a -- g -- b` with a new dipole spanning `g -- b`. The bounding
    /// partons take the supplied post-emission momenta.
    ///
    /// # Return
    ///
    /// The gluon and the newly created dipole, or `None` when `dip` is not
    /// a live dipole.
    pub fn emit_gluon(
        &mut self,
        dip: DipoleId,
        p_gluon: FourMomentum,
        p_ipart: FourMomentum,
        p_opart: FourMomentum,
        scale: f64,
    ) -> Option<(PartonId, DipoleId)> {
        let (a, b, string_index) = {
            let dipole = self.dipoles.get(dip)?;
            (dipole.ipart, dipole.opart, dipole.string_index)
        };

        let mut gluon = Parton::new(Flavour::Gluon, p_gluon);
        gluon.origin = PartonOrigin::Emitted;
        gluon.scale = scale;
        let g = self.partons.insert(gluon);

        let seq = self.next_seq;
        self.next_seq += 1;
        let mut new_dipole = Dipole::new(g, b, string_index, seq);
        new_dipole.max_scale = scale;
        let nd = self.dipoles.insert(new_dipole);

        // Rewire: the original dipole keeps its incoming end and adopts the
        // gluon as its colour-carrying end.
        self.dipoles[dip].opart = g;
        self.partons[g].idip = Some(dip);
        self.partons[g].odip = Some(nd);
        self.partons[b].idip = Some(nd);

        self.partons[a].momentum = p_ipart;
        self.partons[b].momentum = p_opart;
        Some((g, nd))
    }

    /// Splits the gluon at one end of a dipole into a quark-antiquark pair
    /// of the given flavour, separating the chain there. Anti-colour flows
    /// on from the original incoming side (the antiquark), colour to the
    /// original outgoing side (the quark); the dipole count is unchanged.
    ///
    /// # Return
    ///
    /// `(quark, antiquark)` handles, or `None` when the requested end is
    /// not an interior gluon.
    pub fn split_gluon(
        &mut self,
        dip: DipoleId,
        end: DipoleEnd,
        flavour: Quark,
        p_spectator: FourMomentum,
        p_quark: FourMomentum,
        p_antiquark: FourMomentum,
        quark_mass: f64,
        scale: f64,
    ) -> Option<(PartonId, PartonId)> {
        let dipole = self.dipoles.get(dip)?;
        let (gluon_id, spectator_id) = match end {
            DipoleEnd::Outgoing => (dipole.opart, dipole.ipart),
            DipoleEnd::Incoming => (dipole.ipart, dipole.opart),
        };
        let gluon = self.partons.get(gluon_id)?;
        if !gluon.is_gluon() {
            return None;
        }
        // The dipole on the far side of the gluon adopts the other pair
        // member.
        let neighbor = match end {
            DipoleEnd::Outgoing => gluon.odip?,
            DipoleEnd::Incoming => gluon.idip?,
        };

        let mut quark = Parton::new(Flavour::Quark(flavour), p_quark);
        quark.origin = PartonOrigin::Emitted;
        quark.generated_mass = Some(quark_mass);
        quark.scale = scale;
        let mut antiquark = Parton::new(Flavour::AntiQuark(flavour), p_antiquark);
        antiquark.origin = PartonOrigin::Emitted;
        antiquark.generated_mass = Some(quark_mass);
        antiquark.scale = scale;

        let q = self.partons.insert(quark);
        let qbar = self.partons.insert(antiquark);

        match end {
            DipoleEnd::Outgoing => {
                // Colour of this dipole continues on the quark, anti-colour
                // of the neighbor on the antiquark.
                self.dipoles[dip].opart = q;
                self.partons[q].idip = Some(dip);
                self.dipoles[neighbor].ipart = qbar;
                self.partons[qbar].odip = Some(neighbor);
            }
            DipoleEnd::Incoming => {
                self.dipoles[dip].ipart = qbar;
                self.partons[qbar].odip = Some(dip);
                self.dipoles[neighbor].opart = q;
                self.partons[q].idip = Some(neighbor);
            }
        }
        self.partons[spectator_id].momentum = p_spectator;
        self.partons.remove(gluon_id);
        Some((q, qbar))
    }

    /// Reabsorbs the gluon at the colour-carrying end of `dip`, merging the
    /// dipole with its successor: `a -- g -- b` becomes `a -- b`. The
    /// successor dipole and the gluon are removed and the bounding partons
    /// take the supplied momenta. Used when reverting an emission and when
    /// reconstructing histories.
    pub fn absorb_gluon(
        &mut self,
        dip: DipoleId,
        p_ipart: FourMomentum,
        p_opart: FourMomentum,
    ) -> Option<()> {
        let dipole = self.dipoles.get(dip)?;
        let a = dipole.ipart;
        let g = dipole.opart;
        let gluon = self.partons.get(g)?;
        if !gluon.is_gluon() {
            return None;
        }
        let nd = gluon.odip?;
        let b = self.dipoles.get(nd)?.opart;

        self.dipoles[dip].opart = b;
        self.partons[b].idip = Some(dip);
        self.partons[a].momentum = p_ipart;
        self.partons[b].momentum = p_opart;

        self.partons.remove(g);
        self.dipoles.remove(nd);
        self.dipoles[dip].slot = Default::default();
        Some(())
    }

    /// Exact inverse of `split_gluon`, used by `revert`: removes the pair
    /// and reinstates the removed gluon at the original end.
    pub fn unsplit_gluon(
        &mut self,
        dip: DipoleId,
        neighbor: DipoleId,
        end: DipoleEnd,
        gluon: Parton,
        quark: PartonId,
        antiquark: PartonId,
        p_spectator: FourMomentum,
    ) -> Option<PartonId> {
        if !self.dipoles.contains_key(dip) || !self.dipoles.contains_key(neighbor) {
            return None;
        }
        self.partons.remove(quark)?;
        self.partons.remove(antiquark)?;

        let g = self.partons.insert(gluon);
        let spectator = match end {
            DipoleEnd::Outgoing => {
                self.dipoles[dip].opart = g;
                self.partons[g].idip = Some(dip);
                self.dipoles[neighbor].ipart = g;
                self.partons[g].odip = Some(neighbor);
                self.dipoles[dip].ipart
            }
            DipoleEnd::Incoming => {
                self.dipoles[dip].ipart = g;
                self.partons[g].odip = Some(dip);
                self.dipoles[neighbor].opart = g;
                self.partons[g].idip = Some(neighbor);
                self.dipoles[dip].opart
            }
        };
        self.partons[spectator].momentum = p_spectator;
        Some(g)
    }

    /// Merges a chain-end quark and a chain-start antiquark back into a
    /// gluon, joining their chains: `... a -- q` and `q~ -- b ...` become
    /// `... a -- g -- b ...`. The spectator `a` absorbs the recoil. Used by
    /// history reconstruction to undo a gluon splitting.
    pub fn merge_pair(
        &mut self,
        quark: PartonId,
        antiquark: PartonId,
        p_gluon: FourMomentum,
        p_spectator: FourMomentum,
    ) -> Option<PartonId> {
        let q = self.partons.get(quark)?;
        let qbar = self.partons.get(antiquark)?;
        if !q.flavour.is_quark() || q.flavour.anti() != qbar.flavour {
            return None;
        }
        if !q.is_chain_end() || !qbar.is_chain_start() {
            return None;
        }
        let dx = q.idip?;
        let d2 = qbar.odip?;
        // A lone q-qbar dipole has no gluon to merge back into.
        if dx == d2 {
            return None;
        }

        let spectator = self.dipoles.get(dx)?.ipart;
        self.partons.remove(quark);
        self.partons.remove(antiquark);

        let mut gluon = Parton::new(Flavour::Gluon, p_gluon);
        gluon.origin = PartonOrigin::Emitted;
        let g = self.partons.insert(gluon);

        self.dipoles[dx].opart = g;
        self.partons[g].idip = Some(dx);
        self.dipoles[d2].ipart = g;
        self.partons[g].odip = Some(d2);
        self.partons[spectator].momentum = p_spectator;
        Some(g)
    }

    /// Walks the chain graph and returns every colour chain, open chains
    /// first (in arena order of their starting parton), then closed rings.
    pub fn chains(&self) -> Vec<ColourChain> {
        let mut chains = Vec::new();
        let mut visited: HashSet<PartonId> = HashSet::new();

        for (start, parton) in self.partons.iter() {
            if !parton.is_chain_start() || visited.contains(&start) {
                continue;
            }
            let mut partons = Vec::new();
            let mut current = start;
            loop {
                visited.insert(current);
                partons.push(current);
                match self.partons[current].odip {
                    Some(dip) => current = self.dipoles[dip].opart,
                    None => break,
                }
            }
            chains.push(ColourChain {
                partons,
                closed: false,
            });
        }

        // Whatever is left and linked must sit on closed gluon rings.
        for (start, _) in self.partons.iter() {
            if visited.contains(&start) {
                continue;
            }
            let mut partons = Vec::new();
            let mut current = start;
            loop {
                if visited.contains(&current) {
                    break;
                }
                visited.insert(current);
                partons.push(current);
                match self.partons[current].odip {
                    Some(dip) => current = self.dipoles[dip].opart,
                    None => break,
                }
            }
            chains.push(ColourChain {
                partons,
                closed: true,
            });
        }
        chains
    }

    /// A human-readable dump of the chain structure, for diagnostics.
    pub fn describe_chains(&self) -> String {
        let mut out = String::new();
        for (k, chain) in self.chains().iter().enumerate() {
            let symbols: Vec<String> = chain
                .partons
                .iter()
                .map(|&id| self.partons[id].flavour.symbol())
                .collect();
            let shape = if chain.closed { "ring" } else { "open" };
            out.push_str(&format!("chain {k} ({shape}): {}\n", symbols.join(" -- ")));
        }
        out
    }

    /// Verifies every structural invariant of the chain graph: existing and
    /// mutually consistent cross-references, colour-capable chain ends,
    /// linked (non-isolated) partons, and unique assigned colour indices.
    ///
    /// # Errors
    ///
    /// Returns the first violation found. Any violation indicates topology
    /// corruption, which callers treat as fatal.
    pub fn check_integrity(&self) -> Result<(), TopologyError> {
        for (did, dipole) in self.dipoles.iter() {
            let a = self.partons.get(dipole.ipart).ok_or_else(|| {
                TopologyError::BrokenLink(format!("dipole {did:?} has a dangling incoming parton"))
            })?;
            let b = self.partons.get(dipole.opart).ok_or_else(|| {
                TopologyError::BrokenLink(format!("dipole {did:?} has a dangling outgoing parton"))
            })?;
            if dipole.ipart == dipole.opart {
                return Err(TopologyError::BrokenLink(format!(
                    "dipole {did:?} connects a parton to itself"
                )));
            }
            if a.odip != Some(did) {
                return Err(TopologyError::BrokenLink(format!(
                    "incoming parton of dipole {did:?} does not link back"
                )));
            }
            if b.idip != Some(did) {
                return Err(TopologyError::BrokenLink(format!(
                    "outgoing parton of dipole {did:?} does not link back"
                )));
            }
            if !a.flavour.carries_anticolour() && !a.is_remnant() {
                return Err(TopologyError::ColourCapability(format!(
                    "{:?} cannot carry the anti-colour end of dipole {did:?}",
                    a.flavour
                )));
            }
            if !b.flavour.carries_colour() && !b.is_remnant() {
                return Err(TopologyError::ColourCapability(format!(
                    "{:?} cannot carry the colour end of dipole {did:?}",
                    b.flavour
                )));
            }
        }

        for (pid, parton) in self.partons.iter() {
            if let Some(dip) = parton.idip {
                let dipole = self.dipoles.get(dip).ok_or_else(|| {
                    TopologyError::BrokenLink(format!("parton {pid:?} points at a dead dipole"))
                })?;
                if dipole.opart != pid {
                    return Err(TopologyError::BrokenLink(format!(
                        "parton {pid:?} is not the outgoing end of its incoming dipole"
                    )));
                }
            }
            if let Some(dip) = parton.odip {
                let dipole = self.dipoles.get(dip).ok_or_else(|| {
                    TopologyError::BrokenLink(format!("parton {pid:?} points at a dead dipole"))
                })?;
                if dipole.ipart != pid {
                    return Err(TopologyError::BrokenLink(format!(
                        "parton {pid:?} is not the incoming end of its outgoing dipole"
                    )));
                }
            }
            if parton.idip.is_none() && parton.odip.is_none() {
                return Err(TopologyError::BrokenLink(format!(
                    "parton {pid:?} is not linked into any chain"
                )));
            }
            if parton.is_gluon() && (parton.idip.is_none() || parton.odip.is_none()) {
                return Err(TopologyError::ColourCapability(format!(
                    "gluon {pid:?} must sit in the interior of a chain"
                )));
            }
        }

        let mut seen = HashSet::new();
        for dipole in self.dipoles.values() {
            if dipole.colour_index != 0 && !seen.insert(dipole.colour_index) {
                return Err(TopologyError::DuplicateColourIndex(dipole.colour_index));
            }
        }
        Ok(())
    }
}
