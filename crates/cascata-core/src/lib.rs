//! # Cascata Core Library
//!
//! A high-performance implementation of the Dipole Cascade Model for QCD parton
//! shower simulation: colour-connected parton pairs (dipoles) stochastically emit
//! further partons in order of decreasing transverse momentum until a cutoff scale
//! is reached.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear
//! separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains the stateless colour-chain data model
//!   (`DipoleState` and its arenas), pure kinematics (`FourMomentum`, dipole
//!   rest-frame mappings), the particle-data registry, and the Sudakov veto
//!   samplers.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer orchestrates the
//!   evolution. It includes the emission-model plug-in contract and registry
//!   (`EmissionModel`, `ModelRegistry`), the veto-algorithm scheduler (`Evolver`),
//!   and the backward history reconstruction used for matrix-element matching.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing
//!   layer. It ties the `engine` and `core` together to evolve one event end to
//!   end, providing a simple and powerful entry point for end-users of the
//!   library.

pub mod core;
pub mod engine;
pub mod workflows;
