use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// The strong coupling used to weight emission densities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AlphaS {
    /// A constant coupling, mainly for tests and cross-checks.
    Fixed(f64),
    /// One-loop running, `12 pi / ((33 - 2 nf) ln(pt2 / lambda2))`.
    OneLoop { lambda2: f64, nf: u32 },
}

impl AlphaS {
    pub fn at(&self, pt2: f64) -> f64 {
        match *self {
            AlphaS::Fixed(alpha) => alpha,
            AlphaS::OneLoop { lambda2, nf } => {
                let b = (33.0 - 2.0 * nf as f64) / (12.0 * PI);
                // The evolution never probes below the cutoff, which the
                // configuration keeps above lambda2.
                let log = (pt2 / lambda2).ln().max(1e-6);
                1.0 / (b * log)
            }
        }
    }

    /// The largest value the coupling takes in a window bounded below by
    /// `pt2min`. One-loop running decreases with scale, so this is the
    /// value at the floor.
    pub fn ceiling(&self, pt2min: f64) -> f64 {
        self.at(pt2min)
    }
}

/// The colour factor of gluon emission off a dipole: NC/2 when either end
/// is a gluon, 2 CF / 2 for a quark-antiquark dipole.
#[inline]
pub fn dipole_colour_factor(incoming_is_gluon: bool, outgoing_is_gluon: bool) -> f64 {
    if incoming_is_gluon || outgoing_is_gluon {
        1.5
    } else {
        4.0 / 3.0
    }
}

/// The power of the energy fraction in the emission matrix element:
/// 3 for gluon ends, 2 for (anti)quark ends.
#[inline]
pub fn radiation_exponent(is_gluon: bool) -> i32 {
    if is_gluon { 3 } else { 2 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_coupling_is_scale_independent() {
        let alpha = AlphaS::Fixed(0.2);
        assert_eq!(alpha.at(1.0), 0.2);
        assert_eq!(alpha.at(1e4), 0.2);
        assert_eq!(alpha.ceiling(1.0), 0.2);
    }

    #[test]
    fn one_loop_coupling_decreases_with_scale() {
        let alpha = AlphaS::OneLoop {
            lambda2: 0.0484,
            nf: 5,
        };
        let low = alpha.at(1.0);
        let high = alpha.at(8315.0);
        assert!(low > high);
        // alpha_s(mZ^2) should come out near the world average.
        assert!((high - 0.127).abs() < 0.02);
        assert_eq!(alpha.ceiling(1.0), low);
    }

    #[test]
    fn colour_factors_distinguish_gluon_dipoles() {
        assert!((dipole_colour_factor(false, false) - 4.0 / 3.0).abs() < 1e-12);
        assert!((dipole_colour_factor(true, false) - 1.5).abs() < 1e-12);
        assert!((dipole_colour_factor(false, true) - 1.5).abs() < 1e-12);
        assert_eq!(radiation_exponent(true), 3);
        assert_eq!(radiation_exponent(false), 2);
    }
}
