//! QCD ingredients of the dipole cascade.
//!
//! The running coupling and colour factors that weight emission densities, and
//! the Sudakov veto samplers that generate candidate emission scales in
//! strictly decreasing order.

pub mod coupling;
pub mod sudakov;
