//! Crate-level core types
//!
//! These types are shared by the activations, the plexus and the bus layer.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// A single messagebus event
///
/// Wire format: `{"type": "<event>", "data": {...}, "context": {...}}`.
/// Missing or `null` `data` and `context` deserialize as empty objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Event name, e.g. `ovos.PHAL.dashboard.enable`
    #[serde(rename = "type")]
    pub msg_type: String,

    /// Event payload
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Map<String, Value>,

    /// Routing metadata (source, destination, session, ...)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub context: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Message {
    /// Create a message with empty data and context
    pub fn new(msg_type: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            data: Map::new(),
            context: Map::new(),
        }
    }

    /// Replace the payload with a serializable value
    ///
    /// Values that do not serialize to a JSON object are stored under `"value"`.
    pub fn with_data<T: Serialize>(mut self, data: &T) -> Result<Self, serde_json::Error> {
        self.data = match serde_json::to_value(data)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Ok(self)
    }

    /// Set a single context key
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Build a reply to this message
    ///
    /// The context is carried over with `source` and `destination` swapped so
    /// the bus can route the reply back to the requester.
    pub fn reply(&self, msg_type: impl Into<String>) -> Self {
        let mut context = self.context.clone();
        let source = context.remove("source");
        let destination = context.remove("destination");
        if let Some(destination) = destination {
            context.insert("source".to_string(), destination);
        }
        if let Some(source) = source {
            context.insert("destination".to_string(), source);
        }
        Self {
            msg_type: msg_type.into(),
            data: Map::new(),
            context,
        }
    }

    /// Deserialize the payload into a typed value
    pub fn data_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.data.clone()))
    }

    /// Serialize to the wire format
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg_type)
    }
}

impl FromStr for Message {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s)
    }
}
