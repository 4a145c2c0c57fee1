//! Relativistic kinematics for dipole emissions.
//!
//! Provides the four-momentum algebra used throughout the cascade and the
//! phase-space mappings between sampled emission variables and explicit
//! momenta: the dipole rest frame, the 2 -> 3 mapping used when an emission is
//! performed, and the 3 -> 2 recombination used when one is undone.

pub mod frame;
pub mod momentum;
