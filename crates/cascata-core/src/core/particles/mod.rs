//! Particle data for the cascade.
//!
//! The registry maps flavour codes to masses, charges, spins, and colour
//! representations. Defaults are built in; tuned shower masses can be loaded
//! from a TOML override file.

pub mod registry;
