use crate::core::models::flavour::Flavour;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

pub const GLUON: i32 = 21;
pub const PHOTON: i32 = 22;
pub const Z0: i32 = 23;
pub const W_PLUS: i32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourRep {
    Singlet,
    Triplet,
    AntiTriplet,
    Octet,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRecord {
    pub name: &'static str,
    /// Mass in GeV.
    pub mass: f64,
    /// Electric charge in units of e/3.
    pub charge_thirds: i8,
    /// Twice the spin.
    pub spin_2j: u8,
    pub colour: ColourRep,
}

// PDG 2024 values, rounded. Quark masses are the MS-bar values except for
// top, where the direct-measurement mass is used.
static PARTICLES: phf::Map<i32, ParticleRecord> = phf::phf_map! {
    1i32 => ParticleRecord { name: "d", mass: 0.00467, charge_thirds: -1, spin_2j: 1, colour: ColourRep::Triplet },
    2i32 => ParticleRecord { name: "u", mass: 0.00216, charge_thirds: 2, spin_2j: 1, colour: ColourRep::Triplet },
    3i32 => ParticleRecord { name: "s", mass: 0.0934, charge_thirds: -1, spin_2j: 1, colour: ColourRep::Triplet },
    4i32 => ParticleRecord { name: "c", mass: 1.27, charge_thirds: 2, spin_2j: 1, colour: ColourRep::Triplet },
    5i32 => ParticleRecord { name: "b", mass: 4.18, charge_thirds: -1, spin_2j: 1, colour: ColourRep::Triplet },
    6i32 => ParticleRecord { name: "t", mass: 172.69, charge_thirds: 2, spin_2j: 1, colour: ColourRep::Triplet },
    21i32 => ParticleRecord { name: "g", mass: 0.0, charge_thirds: 0, spin_2j: 2, colour: ColourRep::Octet },
    22i32 => ParticleRecord { name: "gamma", mass: 0.0, charge_thirds: 0, spin_2j: 2, colour: ColourRep::Singlet },
    23i32 => ParticleRecord { name: "Z0", mass: 91.1876, charge_thirds: 0, spin_2j: 2, colour: ColourRep::Singlet },
    24i32 => ParticleRecord { name: "W+", mass: 80.377, charge_thirds: 3, spin_2j: 2, colour: ColourRep::Singlet },
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OverrideFile {
    #[serde(default)]
    masses: HashMap<String, f64>,
}

/// Particle-data lookup: flavour code to mass, charge, spin and colour
/// representation. Defaults come from the built-in table; masses may be
/// overridden from a TOML file, which is how tuned shower masses enter.
#[derive(Debug, Clone, Default)]
pub struct ParticleRegistry {
    mass_overrides: HashMap<i32, f64>,
}

impl ParticleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, RegistryLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| RegistryLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: OverrideFile =
            toml::from_str(&content).map_err(|e| RegistryLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

        let mut mass_overrides = HashMap::new();
        for (name, mass) in file.masses {
            let code = PARTICLES
                .entries()
                .find(|(_, record)| record.name == name)
                .map(|(code, _)| *code)
                .ok_or(RegistryLoadError::UnknownParticle { name })?;
            mass_overrides.insert(code, mass);
        }
        Ok(Self { mass_overrides })
    }

    /// Looks up the record for a signed PDG code. Antiparticle codes mirror
    /// the particle entry with conjugated charge and colour; the `name`
    /// field stays that of the base particle.
    pub fn record(&self, code: i32) -> Option<ParticleRecord> {
        let base = PARTICLES.get(&code.abs())?;
        let mut record = *base;
        if let Some(&mass) = self.mass_overrides.get(&code.abs()) {
            record.mass = mass;
        }
        if code < 0 {
            record.charge_thirds = -record.charge_thirds;
            record.colour = match record.colour {
                ColourRep::Triplet => ColourRep::AntiTriplet,
                ColourRep::AntiTriplet => ColourRep::Triplet,
                other => other,
            };
        }
        Some(record)
    }

    /// The mass of a cascade parton in GeV.
    pub fn mass_of(&self, flavour: Flavour) -> f64 {
        self.record(flavour.pdg_code())
            .map(|record| record.mass)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Error)]
pub enum RegistryLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Unknown particle name '{name}' in mass overrides")]
    UnknownParticle { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::flavour::Quark;
    use std::io::Write;

    #[test]
    fn default_table_covers_quarks_gluon_and_resonances() {
        let registry = ParticleRegistry::new();
        assert_eq!(registry.mass_of(Flavour::Gluon), 0.0);
        assert!((registry.mass_of(Flavour::Quark(Quark::Bottom)) - 4.18).abs() < 1e-12);
        assert!((registry.record(Z0).unwrap().mass - 91.1876).abs() < 1e-12);
        assert_eq!(registry.record(GLUON).unwrap().colour, ColourRep::Octet);
        assert!(registry.record(7).is_none());
    }

    #[test]
    fn antiparticle_records_conjugate_charge_and_colour() {
        let registry = ParticleRegistry::new();
        let up = registry.record(2).unwrap();
        let antiup = registry.record(-2).unwrap();
        assert_eq!(antiup.charge_thirds, -up.charge_thirds);
        assert_eq!(antiup.colour, ColourRep::AntiTriplet);
        assert_eq!(antiup.mass, up.mass);
    }

    #[test]
    fn antiquark_mass_matches_the_quark_mass() {
        let registry = ParticleRegistry::new();
        assert_eq!(
            registry.mass_of(Flavour::AntiQuark(Quark::Charm)),
            registry.mass_of(Flavour::Quark(Quark::Charm)),
        );
    }

    #[test]
    fn load_applies_mass_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[masses]\nc = 1.5\nb = 4.92").unwrap();

        let registry = ParticleRegistry::load(file.path()).unwrap();
        assert!((registry.mass_of(Flavour::Quark(Quark::Charm)) - 1.5).abs() < 1e-12);
        assert!((registry.mass_of(Flavour::Quark(Quark::Bottom)) - 4.92).abs() < 1e-12);
        // Untouched entries keep their defaults.
        assert!((registry.mass_of(Flavour::Quark(Quark::Strange)) - 0.0934).abs() < 1e-12);
    }

    #[test]
    fn load_rejects_unknown_particle_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[masses]\nxyzzy = 1.0").unwrap();

        let err = ParticleRegistry::load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            RegistryLoadError::UnknownParticle { name } if name == "xyzzy"
        ));
    }

    #[test]
    fn load_reports_missing_files_and_bad_toml() {
        let missing = ParticleRegistry::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(RegistryLoadError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [[[").unwrap();
        assert!(matches!(
            ParticleRegistry::load(file.path()),
            Err(RegistryLoadError::Toml { .. })
        ));
    }
}
