use rand::{Rng, RngCore};
use tracing::warn;

/// Proposal guard against a pathological acceptance function.
const MAX_PROPOSALS: usize = 100_000;

/// One sampled phase-space point of a dipole emission: the scale, the
/// rapidity of the emitted parton in the dipole frame, and the implied
/// energy fractions of the incoming-side and outgoing-side partons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub pt2: f64,
    pub y: f64,
    pub x1: f64,
    pub x3: f64,
}

/// Inverts the overestimate Sudakov integral to propose the next, lower
/// scale. With the overestimate density `c ln(s/pt2) / pt2`, the
/// no-emission probability between two scales integrates to
/// `exp(-c/2 (L_new^2 - L_old^2))` with `L = ln(s/pt2)`.
#[inline]
fn propose_scale(s: f64, pt2: f64, c_over: f64, r: f64) -> f64 {
    let l2 = (s / pt2).ln().powi(2) + 2.0 * (1.0 / r).ln() / c_over;
    s * (-l2.sqrt()).exp()
}

/// The dipole emission matrix-element weight `(x1^a + x3^b) / 2`, bounded
/// by one on the physical region.
#[inline]
pub fn emission_weight(x1: f64, x3: f64, exp_in: i32, exp_out: i32) -> f64 {
    0.5 * (x1.powi(exp_in) + x3.powi(exp_out))
}

/// The gluon-splitting weight `z^2 + (1-z)^2`, bounded by one.
#[inline]
pub fn splitting_weight(z: f64) -> f64 {
    z * z + (1.0 - z) * (1.0 - z)
}

/// Runs the veto algorithm for one emission channel.
///
/// Scales are proposed in strictly decreasing order from `pt2max` (capped
/// at the kinematic limit `s/4`) using the overestimate density
/// `c_over ln(s/pt2) / pt2`; for each proposal a rapidity is drawn flat in
/// its allowed range and the point is kept with probability `accept(..)`,
/// which must return the true-to-overestimate density ratio in [0, 1].
///
/// Returns the first accepted candidate, or `None` once the proposals fall
/// to `pt2min` (no emission in this window). A rejected proposal continues
/// the search from the rejected scale, which is what makes the accepted
/// scale follow the Sudakov-implied distribution.
pub fn sample_channel(
    s: f64,
    pt2min: f64,
    pt2max: f64,
    c_over: f64,
    mut accept: impl FnMut(&Candidate) -> f64,
    rng: &mut dyn RngCore,
) -> Option<Candidate> {
    if !(c_over > 0.0) || s <= 0.0 {
        return None;
    }
    let mut pt2 = pt2max.min(0.25 * s);
    if pt2 <= pt2min {
        return None;
    }

    for _ in 0..MAX_PROPOSALS {
        pt2 = propose_scale(s, pt2, c_over, rng.random());
        if pt2 <= pt2min {
            return None;
        }

        let y_max = 0.5 * (s / pt2).ln();
        let y = rng.random_range(-y_max..y_max);
        let ratio = (pt2 / s).sqrt();
        let candidate = Candidate {
            pt2,
            y,
            x1: 1.0 - ratio * (-y).exp(),
            x3: 1.0 - ratio * y.exp(),
        };
        // Points outside x1 + x3 >= 1 have no three-parton kinematics.
        if candidate.x1 + candidate.x3 < 1.0 {
            continue;
        }

        let w = accept(&candidate);
        if w > 1.0 + 1e-9 {
            warn!(weight = w, pt2, "acceptance weight exceeds unity");
        }
        if rng.random::<f64>() < w {
            return Some(candidate);
        }
    }
    warn!("emission channel exhausted its proposal budget");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn accepted_candidates_stay_inside_the_window() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            if let Some(c) = sample_channel(8281.0, 1.0, 8281.0, 0.2, |_| 1.0, &mut rng) {
                assert!(c.pt2 > 1.0);
                assert!(c.pt2 <= 8281.0 / 4.0);
                assert!(c.x1 <= 1.0 && c.x3 <= 1.0);
                assert!(c.x1 + c.x3 >= 1.0);
                assert!((c.pt2 / 8281.0 - (1.0 - c.x1) * (1.0 - c.x3)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn zero_acceptance_never_emits() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(sample_channel(100.0, 1.0, 100.0, 0.3, |_| 0.0, &mut rng).is_none());
    }

    #[test]
    fn empty_window_returns_none_without_drawing() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(sample_channel(100.0, 30.0, 25.0, 0.3, |_| 1.0, &mut rng).is_none());
        // pt2max above s/4 is clamped down to it.
        assert!(sample_channel(100.0, 25.0, 1e6, 0.3, |_| 1.0, &mut rng).is_none());
        assert!(sample_channel(100.0, 1.0, 100.0, 0.0, |_| 1.0, &mut rng).is_none());
    }

    #[test]
    fn identical_streams_give_identical_candidates() {
        let sample = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            sample_channel(8281.0, 1.0, 8281.0, 0.15, |c| 0.5 * (c.x1 + c.x3) / 2.0, &mut rng)
        };
        assert_eq!(sample(99), sample(99));
    }

    #[test]
    fn proposals_decrease_monotonically() {
        let mut last = 2000.0;
        let mut pt2 = last;
        for r in [0.9, 0.5, 0.99, 0.3] {
            pt2 = propose_scale(8281.0, pt2, 0.2, r);
            assert!(pt2 < last);
            last = pt2;
        }
    }

    #[test]
    fn weight_helpers_are_bounded_by_one() {
        assert!((emission_weight(1.0, 1.0, 2, 2) - 1.0).abs() < 1e-12);
        assert!(emission_weight(0.7, 0.8, 2, 3) < 1.0);
        assert!((splitting_weight(0.5) - 0.5).abs() < 1e-12);
        assert!((splitting_weight(0.0) - 1.0).abs() < 1e-12);
        assert!((splitting_weight(1.0) - 1.0).abs() < 1e-12);
    }
}
