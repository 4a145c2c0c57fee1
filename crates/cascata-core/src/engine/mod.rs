//! # Engine Module
//!
//! This module implements the evolution engine of the dipole cascade, providing
//! the stateful framework that drives one event from its hard-process chains
//! down to the cutoff scale.
//!
//! ## Overview
//!
//! The engine orchestrates the complete evolution of a `DipoleState`. It manages
//! the registry of emission models, runs the veto-algorithm scheduler that
//! selects and performs the globally hardest candidate emission, and provides
//! the backward traversal that reconstructs emission histories for
//! matrix-element matching.
//!
//! ## Architecture
//!
//! The module is organized into specialized submodules that handle different
//! aspects of the evolution:
//!
//! - **Configuration** ([`config`]) - Cutoff scale, coupling mode, channel
//!   toggles, and remnant treatment
//! - **Emission Models** ([`emitters`]) - The pluggable model contract, its
//!   precedence resolution, and the built-in models
//! - **Scheduler** ([`evolver`]) - The veto-algorithm loop that keeps emissions
//!   in strictly decreasing transverse-momentum order
//! - **History Reconstruction** ([`history`]) - Backward traversal undoing one
//!   emission at a time, with the weights needed for reweighting
//! - **Progress Monitoring** ([`progress`]) - Progress reporting and user
//!   feedback mechanisms
//! - **Error Handling** ([`error`]) - Fatal-only error taxonomy; sampling
//!   rejections are never errors
//!
//! ## Key Capabilities
//!
//! - **Strict ordering** - the performed-emission sequence is non-increasing in
//!   transverse momentum squared, the defining property of the veto algorithm
//! - **Pluggable physics** - specialized models override the default QCD dipole
//!   behavior per topology, resolved through an explicit, ordered registry
//! - **Reversible emissions** - models that support it can undo a performed
//!   emission exactly, enabling history reconstruction
//! - **Deterministic replay** - for a fixed deviate stream the evolution is
//!   fully reproducible, including tie-breaks between equal candidate scales

pub mod config;
pub mod emitters;
pub mod error;
pub mod evolver;
pub mod history;
pub mod progress;
