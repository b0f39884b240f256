pub mod activations;
pub mod builder;
pub mod bus;
pub mod config;
pub mod network;
pub mod plexus;
pub mod types;

// Re-export commonly used items
pub use builder::{build_plexus, build_plexus_with};
pub use config::Config;
pub use types::Message;
