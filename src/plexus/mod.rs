pub mod plexus;
pub mod types;

pub use plexus::{Activation, Plexus, PlexusError};
pub use types::{ActivationInfo, NetworkRequirements, PlexusStream};
