use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A four-momentum in natural units (GeV), stored as energy plus the
/// spatial three-vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FourMomentum {
    pub e: f64,
    pub p: Vector3<f64>,
}

impl FourMomentum {
    pub fn new(e: f64, p: Vector3<f64>) -> Self {
        Self { e, p }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Builds an on-shell momentum from a mass and a three-momentum.
    pub fn from_mass_and_momentum(mass: f64, p: Vector3<f64>) -> Self {
        Self {
            e: (mass * mass + p.norm_squared()).sqrt(),
            p,
        }
    }

    /// A particle of the given mass at rest.
    pub fn at_rest(mass: f64) -> Self {
        Self {
            e: mass,
            p: Vector3::zeros(),
        }
    }

    /// The invariant mass squared, `E² - |p|²`. May be slightly negative
    /// from floating-point cancellation.
    pub fn m2(&self) -> f64 {
        self.e * self.e - self.p.norm_squared()
    }

    /// The invariant mass, with negative `m²` clamped to zero.
    pub fn mass(&self) -> f64 {
        self.m2().max(0.0).sqrt()
    }

    /// The transverse momentum squared with respect to the z axis.
    pub fn pt2(&self) -> f64 {
        self.p.x * self.p.x + self.p.y * self.p.y
    }

    /// The velocity three-vector `p/E`.
    pub fn velocity(&self) -> Vector3<f64> {
        self.p / self.e
    }

    /// Applies a Lorentz boost with velocity `beta`.
    ///
    /// Boosting the rest frame of a system with `beta = P.velocity()`
    /// maps a momentum given in that rest frame into the lab; `-beta`
    /// performs the inverse transformation.
    pub fn boosted(&self, beta: &Vector3<f64>) -> Self {
        let b2 = beta.norm_squared();
        if b2 < 1e-24 {
            return *self;
        }
        let gamma = 1.0 / (1.0 - b2).sqrt();
        let bp = beta.dot(&self.p);
        Self {
            e: gamma * (self.e + bp),
            p: self.p + beta * ((gamma - 1.0) * bp / b2 + gamma * self.e),
        }
    }

    /// Component-wise comparison within an absolute tolerance.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        (self.e - other.e).abs() < tol && (self.p - other.p).norm() < tol
    }
}

impl Add for FourMomentum {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            e: self.e + rhs.e,
            p: self.p + rhs.p,
        }
    }
}

impl AddAssign for FourMomentum {
    fn add_assign(&mut self, rhs: Self) {
        self.e += rhs.e;
        self.p += rhs.p;
    }
}

impl Sub for FourMomentum {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            e: self.e - rhs.e,
            p: self.p - rhs.p,
        }
    }
}

impl SubAssign for FourMomentum {
    fn sub_assign(&mut self, rhs: Self) {
        self.e -= rhs.e;
        self.p -= rhs.p;
    }
}

impl Neg for FourMomentum {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            e: -self.e,
            p: -self.p,
        }
    }
}

impl Sum for FourMomentum {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| acc + x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    #[test]
    fn on_shell_construction_reproduces_the_mass() {
        let p = FourMomentum::from_mass_and_momentum(4.18, Vector3::new(1.0, -2.0, 5.0));
        assert!((p.mass() - 4.18).abs() < TOLERANCE);
    }

    #[test]
    fn invariant_mass_is_unchanged_by_a_boost() {
        let p = FourMomentum::from_mass_and_momentum(1.27, Vector3::new(3.0, 0.5, -1.0));
        let boosted = p.boosted(&Vector3::new(0.4, -0.3, 0.6));
        assert!((boosted.m2() - p.m2()).abs() < 1e-6);
    }

    #[test]
    fn boost_and_inverse_boost_round_trip() {
        let p = FourMomentum::from_mass_and_momentum(0.0, Vector3::new(10.0, 0.0, 2.0));
        let beta = Vector3::new(0.1, 0.7, -0.2);
        let back = p.boosted(&beta).boosted(&-beta);
        assert!(back.approx_eq(&p, 1e-9));
    }

    #[test]
    fn boosting_a_rest_frame_momentum_gives_the_lab_momentum() {
        let w = 91.2;
        let pair = FourMomentum::from_mass_and_momentum(w, Vector3::new(0.0, 0.0, 25.0));
        let rest = FourMomentum::at_rest(w);
        let lab = rest.boosted(&pair.velocity());
        assert!(lab.approx_eq(&pair, 1e-6));
    }

    #[test]
    fn arithmetic_and_sum_accumulate_components() {
        let a = FourMomentum::new(2.0, Vector3::new(1.0, 0.0, 0.0));
        let b = FourMomentum::new(3.0, Vector3::new(0.0, 1.0, -1.0));
        let s: FourMomentum = [a, b].into_iter().sum();
        assert!(s.approx_eq(&(a + b), TOLERANCE));
        assert!((s - b).approx_eq(&a, TOLERANCE));
        assert!((-a + a).approx_eq(&FourMomentum::zero(), TOLERANCE));
    }

    #[test]
    fn pt2_is_transverse_to_the_z_axis() {
        let p = FourMomentum::new(5.0, Vector3::new(3.0, 4.0, 12.0));
        assert!((p.pt2() - 25.0).abs() < TOLERANCE);
    }
}
