use crate::core::models::flavour::Quark;
use crate::core::qcd::coupling::AlphaS;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("The transverse-momentum cutoff must be positive, got {0}")]
    NonPositiveCutoff(f64),
    #[error("The cutoff ({cutoff}) must lie above the QCD scale squared ({lambda2})")]
    CutoffBelowLambda { cutoff: f64, lambda2: f64 },
    #[error("A fixed coupling must be positive, got {0}")]
    InvalidCoupling(f64),
}

/// Parameters of the extended-source treatment of remnant dipoles: gluon
/// emission off a remnant is damped by `min(1, (mu2 / pt2)^alpha)`, and
/// boson-gluon fusion may be switched off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemnantConfig {
    pub suppression_mu2: f64,
    pub suppression_alpha: f64,
    pub boson_gluon_fusion: bool,
}

impl Default for RemnantConfig {
    fn default() -> Self {
        Self {
            suppression_mu2: 0.36,
            suppression_alpha: 1.0,
            boson_gluon_fusion: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// The absolute evolution cutoff in GeV²; the state freezes when no
    /// candidate lies above it.
    pub pt2_cutoff: f64,
    pub alpha_s: AlphaS,
    /// Heaviest flavour considered for gluon splitting.
    pub max_flavour: Quark,
    pub gluon_emission: bool,
    pub gluon_splitting: bool,
    /// Enables matrix-element corrections on resonance dipoles.
    pub me_corrections: bool,
    pub remnant: RemnantConfig,
    /// Safety valve on the number of performed emissions per event.
    pub max_emissions: usize,
}

#[derive(Default)]
pub struct CascadeConfigBuilder {
    pt2_cutoff: Option<f64>,
    alpha_s: Option<AlphaS>,
    max_flavour: Option<Quark>,
    gluon_emission: Option<bool>,
    gluon_splitting: Option<bool>,
    me_corrections: Option<bool>,
    remnant: Option<RemnantConfig>,
    max_emissions: Option<usize>,
}

impl CascadeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pt2_cutoff(mut self, pt2: f64) -> Self {
        self.pt2_cutoff = Some(pt2);
        self
    }
    pub fn alpha_s(mut self, alpha: AlphaS) -> Self {
        self.alpha_s = Some(alpha);
        self
    }
    pub fn max_flavour(mut self, flavour: Quark) -> Self {
        self.max_flavour = Some(flavour);
        self
    }
    pub fn gluon_emission(mut self, enabled: bool) -> Self {
        self.gluon_emission = Some(enabled);
        self
    }
    pub fn gluon_splitting(mut self, enabled: bool) -> Self {
        self.gluon_splitting = Some(enabled);
        self
    }
    pub fn me_corrections(mut self, enabled: bool) -> Self {
        self.me_corrections = Some(enabled);
        self
    }
    pub fn remnant(mut self, remnant: RemnantConfig) -> Self {
        self.remnant = Some(remnant);
        self
    }
    pub fn max_emissions(mut self, max: usize) -> Self {
        self.max_emissions = Some(max);
        self
    }

    pub fn build(self) -> Result<CascadeConfig, ConfigError> {
        let pt2_cutoff = self
            .pt2_cutoff
            .ok_or(ConfigError::MissingParameter("pt2_cutoff"))?;
        if pt2_cutoff <= 0.0 {
            return Err(ConfigError::NonPositiveCutoff(pt2_cutoff));
        }

        let alpha_s = self.alpha_s.unwrap_or(AlphaS::OneLoop {
            lambda2: 0.0484,
            nf: 5,
        });
        match alpha_s {
            AlphaS::OneLoop { lambda2, .. } if pt2_cutoff <= lambda2 => {
                return Err(ConfigError::CutoffBelowLambda {
                    cutoff: pt2_cutoff,
                    lambda2,
                });
            }
            AlphaS::Fixed(alpha) if alpha <= 0.0 => {
                return Err(ConfigError::InvalidCoupling(alpha));
            }
            _ => {}
        }

        Ok(CascadeConfig {
            pt2_cutoff,
            alpha_s,
            max_flavour: self.max_flavour.unwrap_or(Quark::Bottom),
            gluon_emission: self.gluon_emission.unwrap_or(true),
            gluon_splitting: self.gluon_splitting.unwrap_or(true),
            me_corrections: self.me_corrections.unwrap_or(true),
            remnant: self.remnant.unwrap_or_default(),
            max_emissions: self.max_emissions.unwrap_or(10_000),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_the_cutoff() {
        let err = CascadeConfigBuilder::new().build().unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("pt2_cutoff"));
    }

    #[test]
    fn build_fills_in_defaults() {
        let config = CascadeConfigBuilder::new().pt2_cutoff(1.0).build().unwrap();
        assert_eq!(config.max_flavour, Quark::Bottom);
        assert!(config.gluon_emission);
        assert!(config.gluon_splitting);
        assert!(config.me_corrections);
        assert!(matches!(config.alpha_s, AlphaS::OneLoop { .. }));
        assert_eq!(config.max_emissions, 10_000);
    }

    #[test]
    fn build_rejects_bad_scales() {
        assert_eq!(
            CascadeConfigBuilder::new().pt2_cutoff(0.0).build(),
            Err(ConfigError::NonPositiveCutoff(0.0))
        );
        assert_eq!(
            CascadeConfigBuilder::new()
                .pt2_cutoff(0.01)
                .alpha_s(AlphaS::OneLoop {
                    lambda2: 0.0484,
                    nf: 5
                })
                .build(),
            Err(ConfigError::CutoffBelowLambda {
                cutoff: 0.01,
                lambda2: 0.0484
            })
        );
        assert_eq!(
            CascadeConfigBuilder::new()
                .pt2_cutoff(1.0)
                .alpha_s(AlphaS::Fixed(-0.1))
                .build(),
            Err(ConfigError::InvalidCoupling(-0.1))
        );
    }

    #[test]
    fn channel_toggles_are_honored() {
        let config = CascadeConfigBuilder::new()
            .pt2_cutoff(1.0)
            .gluon_splitting(false)
            .me_corrections(false)
            .max_flavour(Quark::Charm)
            .build()
            .unwrap();
        assert!(!config.gluon_splitting);
        assert!(!config.me_corrections);
        assert_eq!(config.max_flavour, Quark::Charm);
    }
}
