//! Dashboard activation module
//!
//! Controls the `ovos-dashboard@<secret>` service unit and answers the
//! `ovos.PHAL.dashboard.*` bus events.

mod activation;
mod controller;
mod methods;
mod secret;
mod settle;
mod types;


pub use activation::{Dashboard, IpResolver};
pub use controller::{ControlError, ServiceControl, Systemctl};
pub use methods::DashboardMethod;
pub use secret::{Credentials, SecretError, SessionSecret, UnitInstance, PASSWORD_ENV, SECRET_LEN, USERNAME_ENV};
pub use settle::SettlePolicy;
pub use types::{DashboardFault, DashboardInfo, ServiceStatus, STATUS_RESPONSE};
