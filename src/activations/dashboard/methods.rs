/// Bus events handled by the dashboard activation, relative to its namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardMethod {
    Enable,
    Disable,
    GetStatus,
}

impl DashboardMethod {
    pub const ALL: [DashboardMethod; 3] = [
        DashboardMethod::Enable,
        DashboardMethod::Disable,
        DashboardMethod::GetStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardMethod::Enable => "enable",
            DashboardMethod::Disable => "disable",
            DashboardMethod::GetStatus => "get.status",
        }
    }

    /// Look up a method by its event suffix, e.g. `get.status`
    pub fn from_event(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    pub fn description(&self) -> &'static str {
        match self {
            DashboardMethod::Enable => {
                "Start the dashboard service and reply with its status and login"
            }
            DashboardMethod::Disable => "Stop the dashboard service and reply with its status",
            DashboardMethod::GetStatus => "Reply with the dashboard status and login, if running",
        }
    }
}
