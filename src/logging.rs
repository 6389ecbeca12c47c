//! Trazas de diagnóstico para desarrollo, controladas por `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Inicializa el suscriptor de trazas. Las llamadas repetidas no tienen
/// efecto.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
