//! # Core Models Module
//!
//! This module contains the fundamental data structures used to represent colour
//! chains in the cascade, providing the foundation for all evolution operations.
//!
//! ## Overview
//!
//! The models module defines the colour-chain graph: partons linked into dipoles,
//! dipoles linked into chains, and the state object that owns them all. The
//! models are designed to:
//!
//! - **Represent colour flow** - each dipole carries colour from its outgoing to
//!   its incoming parton
//! - **Support safe mutation** - partons and dipoles refer to each other through
//!   arena handles, never through aliased references
//! - **Enable deep cloning** - a `DipoleState` clone is a fully independent copy
//!   of the whole graph
//! - **Maintain type safety** - cache validity and emission lifecycles are part
//!   of the types
//!
//! ## Key Components
//!
//! - [`flavour`] - Quark and gluon flavour codes and their colour capabilities
//! - [`parton`] - A single particle with its momentum and chain links
//! - [`dipole`] - A colour-connected parton pair with its cached candidate slot
//! - [`emission`] - Candidate and performed emission records
//! - [`state`] - The arena-owned chain graph with construction, mutation, and
//!   integrity checking
//! - [`ids`] - Arena handle types for partons and dipoles

pub mod dipole;
pub mod emission;
pub mod flavour;
pub mod ids;
pub mod parton;
pub mod state;
