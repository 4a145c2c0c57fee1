//! # Workflows Module
//!
//! This module provides the high-level entry points that orchestrate a
//! complete cascade evolution.
//!
//! ## Overview
//!
//! Workflows are the top-level API of the library. They encapsulate the whole
//! pipeline for one event: validating the starting chains, assembling the
//! emission-model registry from the configuration, running the evolution to
//! the cutoff, and organizing the results, with progress reporting throughout.
//!
//! ## Architecture
//!
//! - **Cascade Workflow** ([`cascade`]) - Evolves one `DipoleState` end to
//!   end and returns the performed-emission log together with summary
//!   statistics.

pub mod cascade;
