use serde::{Deserialize, Serialize};

/// Event published in reply to every dashboard request
pub const STATUS_RESPONSE: &str = "ovos.PHAL.dashboard.status.response";

/// State of the dashboard unit as reported by the service manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Running,
    Stopped,
}

impl ServiceStatus {
    pub fn from_active(active: bool) -> Self {
        if active {
            ServiceStatus::Running
        } else {
            ServiceStatus::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ServiceStatus::Running)
    }
}

/// Why a reply could not report what was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardFault {
    /// Stop was requested but the unit still reports active
    StopNotConfirmed,
}

/// Payload of `ovos.PHAL.dashboard.status.response`
///
/// `url`, `user` and `password` are either all set (`status: true`) or all
/// null (`status: false`); the constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardInfo {
    status: bool,
    url: Option<String>,
    user: Option<String>,
    password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<DashboardFault>,
}

impl DashboardInfo {
    pub fn running(url: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            status: true,
            url: Some(url.into()),
            user: Some(user.into()),
            password: Some(password.into()),
            error: None,
        }
    }

    pub fn stopped() -> Self {
        Self {
            status: false,
            url: None,
            user: None,
            password: None,
            error: None,
        }
    }

    pub fn with_error(mut self, error: DashboardFault) -> Self {
        self.error = Some(error);
        self
    }

    pub fn status(&self) -> bool {
        self.status
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn error(&self) -> Option<DashboardFault> {
        self.error
    }

    /// Whether the all-or-nothing rule holds (relevant for decoded payloads)
    pub fn is_consistent(&self) -> bool {
        let fields = [self.url.is_some(), self.user.is_some(), self.password.is_some()];
        if self.status {
            fields.iter().all(|set| *set)
        } else {
            fields.iter().all(|set| !*set)
        }
    }
}
