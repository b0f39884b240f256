//! Plexus builder - constructs a fully configured Plexus instance
//!
//! Used by the main binary and the integration tests.

use std::sync::Arc;

use crate::activations::dashboard::{Dashboard, SecretError, ServiceControl, SessionSecret, Systemctl};
use crate::config::Config;
use crate::plexus::Plexus;

/// Build the plexus with the dashboard activation backed by `systemctl`
///
/// Generates the session secret; failing to reach the system's secure
/// random source is fatal.
pub fn build_plexus(config: &Config) -> Result<Arc<Plexus>, SecretError> {
    let control = Arc::new(Systemctl::from_config(&config.dashboard, &config.timing));
    build_plexus_with(config, control)
}

/// Build the plexus with a caller-supplied service controller
pub fn build_plexus_with(
    config: &Config,
    control: Arc<dyn ServiceControl>,
) -> Result<Arc<Plexus>, SecretError> {
    let secret = SessionSecret::generate()?;
    Ok(Arc::new(
        Plexus::new().register(Dashboard::new(secret, config, control)),
    ))
}
