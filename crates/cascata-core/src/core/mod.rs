//! # Core Module
//!
//! This module provides the fundamental building blocks and algorithms of the
//! Dipole Cascade Model, serving as the computational core of the library.
//!
//! ## Overview
//!
//! The core module implements the data structures and pure functions required to
//! represent and manipulate colour chains of partons: the arena-owned chain graph,
//! relativistic kinematics, particle data, and the stochastic sampling kernels
//! that drive the evolution.
//!
//! ## Architecture
//!
//! The module is organized into specialized submodules that handle different
//! aspects of the cascade:
//!
//! - **Colour-Chain Representation** ([`models`]) - Partons, dipoles, emissions,
//!   and the `DipoleState` graph that owns them
//! - **Kinematics** ([`kinematics`]) - Four-momentum algebra and the dipole
//!   rest-frame phase-space mappings
//! - **Particle Data** ([`particles`]) - Flavour properties (mass, charge, spin,
//!   colour representation) with file-based overrides
//! - **QCD Ingredients** ([`qcd`]) - The running coupling, colour factors, and
//!   the Sudakov veto samplers
//!
//! ## Scientific Foundation
//!
//! The core module implements the Dipole Cascade Model of QCD radiation:
//!
//! - **Dipole radiation** - gluon emission and gluon splitting off
//!   colour-connected parton pairs
//! - **Sudakov form factors** - no-emission probabilities that implicitly define
//!   the distribution of the next emission scale
//! - **Veto sampling** - overestimate-and-reject generation of emission scales in
//!   strictly decreasing order

pub mod kinematics;
pub mod models;
pub mod particles;
pub mod qcd;
