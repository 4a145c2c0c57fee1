use super::momentum::FourMomentum;
use nalgebra::{Rotation3, Vector3};

const COS_TOLERANCE: f64 = 1e-9;

/// The rest frame of a dipole, oriented with the anti-colour-carrying
/// (incoming) parton along +z. Momenta generated in this frame are mapped
/// back to the lab by rotating first and boosting second.
#[derive(Debug, Clone)]
pub struct DipoleFrame {
    beta: Vector3<f64>,
    rotation: Rotation3<f64>,
    w: f64,
}

impl DipoleFrame {
    /// Builds the frame from the two bounding momenta. Returns `None` when
    /// the pair has no time-like total momentum to boost into.
    pub fn from_pair(pi: &FourMomentum, po: &FourMomentum) -> Option<Self> {
        let total = *pi + *po;
        let s = total.m2();
        if s <= 0.0 || total.e <= 0.0 {
            return None;
        }
        let beta = total.velocity();
        let pi_cm = pi.boosted(&-beta);
        Some(Self {
            beta,
            rotation: rotation_from_z(&pi_cm.p),
            w: s.sqrt(),
        })
    }

    /// The total invariant mass of the dipole.
    pub fn w(&self) -> f64 {
        self.w
    }

    pub fn to_lab(&self, cm: FourMomentum) -> FourMomentum {
        FourMomentum::new(cm.e, self.rotation * cm.p).boosted(&self.beta)
    }

    pub fn to_cm(&self, lab: &FourMomentum) -> FourMomentum {
        let unboosted = lab.boosted(&-self.beta);
        FourMomentum::new(unboosted.e, self.rotation.inverse() * unboosted.p)
    }
}

fn rotation_from_z(direction: &Vector3<f64>) -> Rotation3<f64> {
    if direction.norm_squared() < 1e-24 {
        return Rotation3::identity();
    }
    match Rotation3::rotation_between(&Vector3::z(), direction) {
        Some(rotation) => rotation,
        // Antiparallel case: any half-turn through an orthogonal axis.
        None => Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI),
    }
}

/// The lab-frame momenta of a three-parton configuration, ordered as
/// (incoming side, emitted, outgoing side).
#[derive(Debug, Clone, Copy)]
pub struct ThreeBody {
    pub p1: FourMomentum,
    pub p2: FourMomentum,
    pub p3: FourMomentum,
}

/// Maps the energy fractions (x1, x3) of a generated emission onto explicit
/// momenta in the dipole frame and returns them boosted to the lab.
///
/// `keep_incoming` selects which original parton direction is preserved:
/// parton 1 stays along +z when true, parton 3 stays along -z otherwise.
/// The recoil is absorbed by the other two momenta.
///
/// # Return
///
/// Returns `None` when the sampled point is kinematically unreachable for
/// the given masses (an energy below its mass shell, or an unphysical
/// opening angle). Callers treat that as "no emission", never as an error.
pub fn solve_three_body(
    frame: &DipoleFrame,
    masses: [f64; 3],
    x1: f64,
    x3: f64,
    azimuth: f64,
    keep_incoming: bool,
) -> Option<ThreeBody> {
    let w = frame.w();
    let e1 = 0.5 * x1 * w;
    let e3 = 0.5 * x3 * w;
    let e2 = w - e1 - e3;

    let [m1, m2, m3] = masses;
    if e1 < m1 || e2 < m2 || e3 < m3 {
        return None;
    }

    let q1 = (e1 * e1 - m1 * m1).max(0.0).sqrt();
    let q2 = (e2 * e2 - m2 * m2).max(0.0).sqrt();
    let q3 = (e3 * e3 - m3 * m3).max(0.0).sqrt();
    if q1 < 1e-12 || q3 < 1e-12 {
        return None;
    }

    let cos13 = (q2 * q2 - q1 * q1 - q3 * q3) / (2.0 * q1 * q3);
    if cos13.abs() > 1.0 + COS_TOLERANCE {
        return None;
    }
    let cos13 = cos13.clamp(-1.0, 1.0);
    let sin13 = (1.0 - cos13 * cos13).max(0.0).sqrt();
    let (sin_phi, cos_phi) = azimuth.sin_cos();

    let (v1, v3) = if keep_incoming {
        (
            Vector3::new(0.0, 0.0, q1),
            q3 * Vector3::new(sin13 * cos_phi, sin13 * sin_phi, cos13),
        )
    } else {
        (
            q1 * Vector3::new(sin13 * cos_phi, sin13 * sin_phi, -cos13),
            Vector3::new(0.0, 0.0, -q3),
        )
    };
    let v2 = -v1 - v3;

    Some(ThreeBody {
        p1: frame.to_lab(FourMomentum::new(e1, v1)),
        p2: frame.to_lab(FourMomentum::new(e2, v2)),
        p3: frame.to_lab(FourMomentum::new(e3, v3)),
    })
}

/// Recombines a system of total momentum `total` into two on-shell bodies,
/// aligning the first along the centre-of-mass direction of `align_with`.
/// Used when undoing an emission during history reconstruction.
pub fn solve_two_body(
    total: &FourMomentum,
    m1: f64,
    m2: f64,
    align_with: &FourMomentum,
) -> Option<(FourMomentum, FourMomentum)> {
    let s = total.m2();
    if s <= 0.0 {
        return None;
    }
    let w = s.sqrt();
    if w < m1 + m2 {
        return None;
    }

    let e1 = 0.5 * (s + m1 * m1 - m2 * m2) / w;
    let q = (e1 * e1 - m1 * m1).max(0.0).sqrt();

    let beta = total.velocity();
    let hint = align_with.boosted(&-beta).p;
    let direction = if hint.norm_squared() > 1e-24 {
        hint.normalize()
    } else {
        Vector3::z()
    };

    let p1 = FourMomentum::new(e1, q * direction);
    let p2 = FourMomentum::new(w - e1, -q * direction);
    Some((p1.boosted(&beta), p2.boosted(&beta)))
}
