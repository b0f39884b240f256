use super::types::{ActivationInfo, NetworkRequirements, PlexusStream};
use crate::bus::MessageBus;
use crate::types::Message;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Error type for plexus operations
#[derive(Debug, Clone)]
pub enum PlexusError {
    ActivationNotFound(String),
    MethodNotFound { activation: String, method: String },
}

impl std::fmt::Display for PlexusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlexusError::ActivationNotFound(name) => write!(f, "Activation not found: {}", name),
            PlexusError::MethodNotFound { activation, method } => {
                write!(f, "Method not found: {}.{}", activation, method)
            }
        }
    }
}

impl std::error::Error for PlexusError {}

/// Activation trait - implement this to handle a family of bus events
///
/// An activation owns a dotted namespace; every method it lists becomes the
/// bus event `<namespace>.<method>`.
///
/// # Example
/// ```ignore
/// struct Ping;
///
/// #[async_trait]
/// impl Activation for Ping {
///     fn namespace(&self) -> &str { "demo.ping" }
///     fn version(&self) -> &str { "1.0.0" }
///     fn methods(&self) -> Vec<&str> { vec!["request"] }
///     async fn call(&self, method: &str, message: Message) -> Result<PlexusStream, PlexusError> {
///         let reply = message.reply("demo.ping.response");
///         Ok(Box::pin(futures::stream::once(async move { reply })))
///     }
/// }
/// ```
#[async_trait]
pub trait Activation: Send + Sync + 'static {
    /// Activation namespace (e.g., "ovos.PHAL.dashboard")
    fn namespace(&self) -> &str;

    /// Activation version (semantic versioning: "MAJOR.MINOR.PATCH")
    fn version(&self) -> &str;

    /// Activation description (one-line summary)
    fn description(&self) -> &str {
        "No description available"
    }

    /// List handled methods, relative to the namespace
    fn methods(&self) -> Vec<&str>;

    /// Get help text for a specific method
    fn method_help(&self, _method: &str) -> Option<String> {
        None
    }

    /// Connectivity this activation depends on
    fn network_requirements(&self) -> NetworkRequirements {
        NetworkRequirements::default()
    }

    /// Handle one inbound message, returning the messages to publish in reply
    async fn call(&self, method: &str, message: Message) -> Result<PlexusStream, PlexusError>;
}

/// The Plexus - routes bus messages to registered activations
pub struct Plexus {
    activations: HashMap<String, Arc<dyn Activation>>,
}

impl Plexus {
    pub fn new() -> Self {
        Self {
            activations: HashMap::new(),
        }
    }

    /// Register an activation with the plexus
    pub fn register<A: Activation>(mut self, activation: A) -> Self {
        let namespace = activation.namespace().to_string();
        self.activations.insert(namespace, Arc::new(activation));
        self
    }

    /// List every handled bus event ("namespace.method")
    pub fn list_methods(&self) -> Vec<String> {
        let mut methods = Vec::new();
        for (namespace, activation) in &self.activations {
            for method in activation.methods() {
                methods.push(format!("{}.{}", namespace, method));
            }
        }
        methods.sort();
        methods
    }

    /// Get information about all registered activations
    pub fn list_activations(&self) -> Vec<ActivationInfo> {
        let mut activations: Vec<ActivationInfo> = self
            .activations
            .values()
            .map(|a| ActivationInfo {
                namespace: a.namespace().to_string(),
                version: a.version().to_string(),
                description: a.description().to_string(),
                methods: a.methods().iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        activations.sort_by(|a, b| a.namespace.cmp(&b.namespace));
        activations
    }

    /// Get help for a specific bus event
    pub fn get_method_help(&self, event: &str) -> Option<String> {
        let (namespace, method) = self.parse_method(event).ok()?;
        self.activations.get(namespace)?.method_help(method)
    }

    /// Whether any activation must wait for a local network before loading
    pub fn requires_network_before_load(&self) -> bool {
        self.activations
            .values()
            .any(|a| a.network_requirements().network_before_load)
    }

    /// Route a message to the activation that owns its namespace
    pub async fn call(&self, message: Message) -> Result<PlexusStream, PlexusError> {
        let (namespace, method) = self.parse_method(&message.msg_type)?;
        let activation = self
            .activations
            .get(namespace)
            .ok_or_else(|| PlexusError::ActivationNotFound(namespace.to_string()))?;

        if !activation.methods().contains(&method) {
            return Err(PlexusError::MethodNotFound {
                activation: namespace.to_string(),
                method: method.to_string(),
            });
        }

        let method = method.to_string();
        activation.call(&method, message).await
    }

    /// Subscribe to the bus and dispatch every handled event on its own task
    ///
    /// The subscription is taken before this returns, so messages emitted
    /// afterwards are never missed. The returned task ends when the bus closes.
    pub fn spawn(self: Arc<Self>, bus: Arc<dyn MessageBus>) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        let events: HashSet<String> = self.list_methods().into_iter().collect();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(message) => {
                        // A shared bus carries traffic for every plugin; skip the rest.
                        if !events.contains(&message.msg_type) {
                            continue;
                        }
                        let plexus = Arc::clone(&self);
                        let bus = Arc::clone(&bus);
                        tokio::spawn(async move {
                            plexus.dispatch(bus.as_ref(), message).await;
                        });
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Plexus lagged behind the bus, {} messages skipped", skipped);
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("Bus closed, plexus stopping");
                        return;
                    }
                }
            }
        })
    }

    async fn dispatch(&self, bus: &dyn MessageBus, message: Message) {
        let event = message.msg_type.clone();
        tracing::debug!("bus -> {}", event);

        let mut stream = match self.call(message).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Failed to handle {}: {}", event, e);
                return;
            }
        };

        while let Some(reply) = stream.next().await {
            if let Err(e) = bus.emit(reply).await {
                tracing::warn!("Failed to emit reply to {}: {}", event, e);
                return;
            }
        }
    }

    /// Split "namespace.method" using the longest registered namespace
    fn parse_method<'a>(&self, event: &'a str) -> Result<(&'a str, &'a str), PlexusError> {
        self.activations
            .keys()
            .filter_map(|namespace| {
                event
                    .strip_prefix(namespace.as_str())
                    .and_then(|rest| rest.strip_prefix('.'))
                    .filter(|method| !method.is_empty())
                    .map(|method| (&event[..namespace.len()], method))
            })
            .max_by_key(|(namespace, _)| namespace.len())
            .ok_or_else(|| PlexusError::ActivationNotFound(event.to_string()))
    }
}

impl Default for Plexus {
    fn default() -> Self {
        Self::new()
    }
}
