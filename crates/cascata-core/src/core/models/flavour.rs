use serde::{Deserialize, Serialize};

/// The six quark flavours, ordered by the PDG numbering scheme.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Quark {
    #[default]
    Down,
    Up,
    Strange,
    Charm,
    Bottom,
    Top,
}

impl Quark {
    /// All flavours in PDG order, lightest to heaviest within each doublet.
    pub const ALL: [Quark; 6] = [
        Quark::Down,
        Quark::Up,
        Quark::Strange,
        Quark::Charm,
        Quark::Bottom,
        Quark::Top,
    ];

    /// The PDG Monte Carlo code of the quark (1-6).
    pub fn pdg_code(self) -> i32 {
        match self {
            Quark::Down => 1,
            Quark::Up => 2,
            Quark::Strange => 3,
            Quark::Charm => 4,
            Quark::Bottom => 5,
            Quark::Top => 6,
        }
    }

    /// Looks up a quark from its positive PDG code.
    ///
    /// # Return
    ///
    /// Returns `Some(Quark)` for codes 1-6, otherwise `None`.
    pub fn from_pdg_code(code: i32) -> Option<Quark> {
        match code {
            1 => Some(Quark::Down),
            2 => Some(Quark::Up),
            3 => Some(Quark::Strange),
            4 => Some(Quark::Charm),
            5 => Some(Quark::Bottom),
            6 => Some(Quark::Top),
            _ => None,
        }
    }
}

/// The flavour of a parton taking part in the cascade.
///
/// Only coloured partons appear in a dipole chain: quarks carry a colour
/// charge, antiquarks an anti-colour charge, and gluons both. Which chain
/// positions a parton may occupy follows directly from this classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flavour {
    Quark(Quark),
    AntiQuark(Quark),
    Gluon,
}

impl Flavour {
    /// The signed PDG Monte Carlo code (negative for antiquarks, 21 for gluons).
    pub fn pdg_code(self) -> i32 {
        match self {
            Flavour::Quark(q) => q.pdg_code(),
            Flavour::AntiQuark(q) => -q.pdg_code(),
            Flavour::Gluon => 21,
        }
    }

    /// Looks up a flavour from a signed PDG code.
    pub fn from_pdg_code(code: i32) -> Option<Flavour> {
        match code {
            21 => Some(Flavour::Gluon),
            c if c > 0 => Quark::from_pdg_code(c).map(Flavour::Quark),
            c if c < 0 => Quark::from_pdg_code(-c).map(Flavour::AntiQuark),
            _ => None,
        }
    }

    pub fn is_gluon(self) -> bool {
        matches!(self, Flavour::Gluon)
    }

    pub fn is_quark(self) -> bool {
        matches!(self, Flavour::Quark(_))
    }

    pub fn is_antiquark(self) -> bool {
        matches!(self, Flavour::AntiQuark(_))
    }

    /// True if the parton carries a colour charge and may act as the
    /// colour-carrying (outgoing) end of a dipole.
    pub fn carries_colour(self) -> bool {
        matches!(self, Flavour::Quark(_) | Flavour::Gluon)
    }

    /// True if the parton carries an anti-colour charge and may act as the
    /// anti-colour-carrying (incoming) end of a dipole.
    pub fn carries_anticolour(self) -> bool {
        matches!(self, Flavour::AntiQuark(_) | Flavour::Gluon)
    }

    /// A short human-readable symbol ("u", "s~", "g"), used in chain dumps.
    pub fn symbol(self) -> String {
        let base = |q: Quark| match q {
            Quark::Down => "d",
            Quark::Up => "u",
            Quark::Strange => "s",
            Quark::Charm => "c",
            Quark::Bottom => "b",
            Quark::Top => "t",
        };
        match self {
            Flavour::Quark(q) => base(q).to_string(),
            Flavour::AntiQuark(q) => format!("{}~", base(q)),
            Flavour::Gluon => "g".to_string(),
        }
    }

    /// The charge-conjugate flavour. Gluons are self-conjugate.
    pub fn anti(self) -> Flavour {
        match self {
            Flavour::Quark(q) => Flavour::AntiQuark(q),
            Flavour::AntiQuark(q) => Flavour::Quark(q),
            Flavour::Gluon => Flavour::Gluon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdg_codes_round_trip_for_all_flavours() {
        for q in Quark::ALL {
            assert_eq!(Quark::from_pdg_code(q.pdg_code()), Some(q));
            let quark = Flavour::Quark(q);
            let antiquark = Flavour::AntiQuark(q);
            assert_eq!(Flavour::from_pdg_code(quark.pdg_code()), Some(quark));
            assert_eq!(Flavour::from_pdg_code(antiquark.pdg_code()), Some(antiquark));
        }
        assert_eq!(Flavour::from_pdg_code(21), Some(Flavour::Gluon));
        assert_eq!(Flavour::from_pdg_code(0), None);
        assert_eq!(Flavour::from_pdg_code(7), None);
        assert_eq!(Flavour::from_pdg_code(-22), None);
    }

    #[test]
    fn anti_is_an_involution() {
        for q in Quark::ALL {
            assert_eq!(Flavour::Quark(q).anti().anti(), Flavour::Quark(q));
        }
        assert_eq!(Flavour::Gluon.anti(), Flavour::Gluon);
    }

    #[test]
    fn colour_capabilities_follow_the_representation() {
        assert!(Flavour::Quark(Quark::Up).carries_colour());
        assert!(!Flavour::Quark(Quark::Up).carries_anticolour());
        assert!(!Flavour::AntiQuark(Quark::Up).carries_colour());
        assert!(Flavour::AntiQuark(Quark::Up).carries_anticolour());
        assert!(Flavour::Gluon.carries_colour());
        assert!(Flavour::Gluon.carries_anticolour());
    }
}
