use grimoire_registry::admissions::{
    AssignmentEngine, InMemoryAdmissionRepository, RequestRegistry, WeightTable,
};
use grimoire_registry::config::AssignmentConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn assignment_engine(config: &AssignmentConfig) -> AssignmentEngine {
    match config.rng_seed {
        Some(seed) => AssignmentEngine::seeded(WeightTable::standard(), seed),
        None => AssignmentEngine::new(WeightTable::standard()),
    }
}

pub(crate) fn in_memory_registry(
    config: &AssignmentConfig,
) -> RequestRegistry<InMemoryAdmissionRepository> {
    RequestRegistry::new(
        Arc::new(InMemoryAdmissionRepository::default()),
        Arc::new(assignment_engine(config)),
    )
}
