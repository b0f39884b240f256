//! Dashboard activation - enables, disables and reports the web dashboard
//!
//! No enabled/disabled flag is kept here. Every reply is built from a fresh
//! query to the service manager, which is the only source of truth.

use super::controller::ServiceControl;
use super::methods::DashboardMethod;
use super::secret::{Credentials, SessionSecret, UnitInstance};
use super::settle::SettlePolicy;
use super::types::{DashboardFault, DashboardInfo, ServiceStatus, STATUS_RESPONSE};
use crate::config::Config;
use crate::network;
use crate::plexus::{Activation, NetworkRequirements, PlexusError, PlexusStream};
use crate::types::Message;
use async_stream::stream;
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;

/// Looks up the address put into the dashboard URL
pub type IpResolver = Arc<dyn Fn() -> IpAddr + Send + Sync>;

/// Dashboard session manager
#[derive(Clone)]
pub struct Dashboard {
    credentials: Credentials,
    unit: UnitInstance,
    control: Arc<dyn ServiceControl>,
    settle: SettlePolicy,
    port: u16,
    resolve_ip: IpResolver,
}

impl Dashboard {
    /// Namespace of every handled bus event
    pub const NAMESPACE: &'static str = "ovos.PHAL.dashboard";
    /// Version of the dashboard activation
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    pub fn new(secret: SessionSecret, config: &Config, control: Arc<dyn ServiceControl>) -> Self {
        let dashboard = Self {
            credentials: Credentials::new(config.username.clone(), secret.clone()),
            unit: UnitInstance::new(config.dashboard.unit_template.clone(), secret),
            control,
            settle: SettlePolicy::from_config(&config.timing),
            port: config.dashboard.port,
            resolve_ip: Arc::new(network::local_ip),
        };
        tracing::info!("Dashboard Plugin Initialized");
        dashboard
    }

    /// Replace the local address lookup
    pub fn with_ip_resolver(mut self, resolve_ip: impl Fn() -> IpAddr + Send + Sync + 'static) -> Self {
        self.resolve_ip = Arc::new(resolve_ip);
        self
    }

    pub fn with_settle_policy(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub fn secret(&self) -> &SessionSecret {
        &self.credentials.secret
    }

    /// Current status, re-queried on every call
    pub async fn status(&self) -> DashboardInfo {
        let status = self.control.status(&self.unit).await;
        self.info_for(status)
    }

    /// Start the unit, give it the settle window to come up, then report
    pub async fn enable(&self) -> DashboardInfo {
        tracing::info!("Enabling dashboard ({})", self.unit.redacted());
        if let Err(e) = self.control.start(&self.unit, &self.credentials).await {
            tracing::warn!("Dashboard start request failed: {}", e);
        }
        self.settle
            .settle(self.control.as_ref(), &self.unit, ServiceStatus::Running)
            .await;
        self.status().await
    }

    /// Stop the unit and report once it is down
    ///
    /// If the unit is still up after the settle window the reply says so
    /// with `stop_not_confirmed`. The stop is not retried.
    pub async fn disable(&self) -> DashboardInfo {
        tracing::info!("Disabling dashboard ({})", self.unit.redacted());
        if let Err(e) = self.control.stop(&self.unit).await {
            tracing::warn!("Dashboard stop request failed: {}", e);
        }
        let status = self
            .settle
            .settle(self.control.as_ref(), &self.unit, ServiceStatus::Stopped)
            .await;
        match status {
            ServiceStatus::Stopped => DashboardInfo::stopped(),
            ServiceStatus::Running => {
                tracing::warn!("Dashboard still running after stop request");
                self.info_for(status).with_error(DashboardFault::StopNotConfirmed)
            }
        }
    }

    fn info_for(&self, status: ServiceStatus) -> DashboardInfo {
        match status {
            ServiceStatus::Running => DashboardInfo::running(
                network::dashboard_url((self.resolve_ip)(), self.port),
                self.credentials.username.clone(),
                self.credentials.secret.as_str(),
            ),
            ServiceStatus::Stopped => DashboardInfo::stopped(),
        }
    }

    async fn handle(&self, method: DashboardMethod) -> DashboardInfo {
        match method {
            DashboardMethod::Enable => self.enable().await,
            DashboardMethod::Disable => self.disable().await,
            DashboardMethod::GetStatus => self.status().await,
        }
    }
}

#[async_trait]
impl Activation for Dashboard {
    fn namespace(&self) -> &str {
        Self::NAMESPACE
    }

    fn version(&self) -> &str {
        Self::VERSION
    }

    fn description(&self) -> &str {
        "Enable, disable and report the OVOS web dashboard"
    }

    fn methods(&self) -> Vec<&str> {
        DashboardMethod::ALL.iter().map(|m| m.as_str()).collect()
    }

    fn method_help(&self, method: &str) -> Option<String> {
        DashboardMethod::from_event(method).map(|m| m.description().to_string())
    }

    fn network_requirements(&self) -> NetworkRequirements {
        NetworkRequirements {
            internet_before_load: false,
            network_before_load: true,
            requires_internet: false,
            requires_network: true,
            no_internet_fallback: false,
            no_network_fallback: false,
        }
    }

    async fn call(&self, method: &str, message: Message) -> Result<PlexusStream, PlexusError> {
        let method = DashboardMethod::from_event(method).ok_or_else(|| PlexusError::MethodNotFound {
            activation: Self::NAMESPACE.to_string(),
            method: method.to_string(),
        })?;

        let dashboard = self.clone();
        Ok(Box::pin(stream! {
            let info = dashboard.handle(method).await;
            match message.reply(STATUS_RESPONSE).with_data(&info) {
                Ok(reply) => yield reply,
                Err(e) => tracing::warn!("Failed to encode dashboard status: {}", e),
            }
        }))
    }
}
