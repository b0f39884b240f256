use crate::types::Message;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Stream of outbound bus messages produced by one activation call
pub type PlexusStream = Pin<Box<dyn Stream<Item = Message> + Send + 'static>>;

/// Information about an activation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationInfo {
    pub namespace: String,
    pub version: String,
    pub description: String,
    pub methods: Vec<String>,
}

/// Connectivity an activation needs before and while it runs
///
/// The default describes a fully offline activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRequirements {
    /// Wait for internet access before loading
    pub internet_before_load: bool,
    /// Wait for a local network before loading
    pub network_before_load: bool,
    pub requires_internet: bool,
    pub requires_network: bool,
    /// Keeps working (degraded) when internet goes away
    pub no_internet_fallback: bool,
    /// Keeps working (degraded) when the network goes away
    pub no_network_fallback: bool,
}

impl Default for NetworkRequirements {
    fn default() -> Self {
        Self {
            internet_before_load: false,
            network_before_load: false,
            requires_internet: false,
            requires_network: false,
            no_internet_fallback: true,
            no_network_fallback: true,
        }
    }
}
