use crate::core::models::emission::PerformedEmission;
use crate::core::models::state::DipoleState;
use crate::core::particles::registry::ParticleRegistry;
use crate::engine::config::CascadeConfig;
use crate::engine::emitters::ModelRegistry;
use crate::engine::error::CascadeError;
use crate::engine::evolver::Evolver;
use crate::engine::progress::{Progress, ProgressReporter};
use rand::RngCore;
use tracing::{info, instrument};

/// The outcome of one evolved event.
#[derive(Debug, Clone)]
pub struct CascadeResult {
    /// Every performed emission, in evolution order (non-increasing scale).
    pub emissions: Vec<PerformedEmission>,
    /// Parton multiplicity of the final state.
    pub n_partons: usize,
    /// Dipole multiplicity of the final state.
    pub n_dipoles: usize,
    /// The scale of the hardest emission, when any happened.
    pub hardest_pt2: Option<f64>,
}

/// Evolves one event from its hard-process chains down to the cutoff.
///
/// The state is validated before and after the evolution; any structural
/// violation aborts the event with a diagnostic rather than producing an
/// inconsistent chain. A state whose phase space is exhausted from the start
/// comes back unchanged with an empty emission log.
#[instrument(skip_all, name = "cascade_workflow")]
pub fn run(
    state: &mut DipoleState,
    config: &CascadeConfig,
    particles: &ParticleRegistry,
    reporter: &ProgressReporter,
    rng: &mut dyn RngCore,
) -> Result<CascadeResult, CascadeError> {
    state.check_integrity()?;
    info!(
        partons = state.n_partons(),
        dipoles = state.n_dipoles(),
        cutoff = config.pt2_cutoff,
        "Starting cascade evolution."
    );

    let registry = ModelRegistry::from_config(config, particles);
    let evolver = Evolver::new(config, &registry);
    let emissions = evolver.evolve(state, reporter, rng)?;

    state.check_integrity()?;
    let result = CascadeResult {
        hardest_pt2: emissions.first().map(|record| record.emission.pt2),
        n_partons: state.n_partons(),
        n_dipoles: state.n_dipoles(),
        emissions,
    };
    info!(
        emissions = result.emissions.len(),
        partons = result.n_partons,
        "Cascade evolution complete."
    );
    reporter.report(Progress::Message(format!(
        "Evolved to {} partons after {} emissions.",
        result.n_partons,
        result.emissions.len()
    )));
    Ok(result)
}
