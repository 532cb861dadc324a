use crate::constants::protocol::UID_KEY;
use crate::errors::ControlError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Category of fault requested against a target. Determines the agent
/// endpoint path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Stress,
    Network,
    Disk,
    Host,
    Process,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Stress => "stress",
            Action::Network => "network",
            Action::Disk => "disk",
            Action::Host => "host",
            Action::Process => "process",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observed injection state of one target with respect to one experiment.
/// A failed apply leaves the target `NotInjected`; a failed recover leaves it
/// `Injected`, so retrying either direction is always safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Injected,
    NotInjected,
}

/// One addressable target under chaos. `id` is the network address of the
/// target's remote agent and doubles as the target's identity. Records are
/// owned by the upstream selector; the executor only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Immutable description of one experiment instance, produced by the
/// declarative layer and valid for the lifetime of one apply/recover pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSpec {
    pub action: Action,
    /// Free-form parameters for the action. Either a JSON object or a string
    /// holding serialized JSON, as older descriptors carry it.
    pub exp_info: Value,
    /// Unique identifier of this experiment instance; also the recovery key.
    pub uid: String,
}

impl ExperimentSpec {
    /// Body for the inject call: `exp_info` with the experiment uid merged in.
    /// A caller-supplied `uid` key is always overwritten.
    pub fn attack_payload(&self) -> Result<String, ControlError> {
        let mut map = match &self.exp_info {
            Value::Object(map) => map.clone(),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(ControlError::malformed_exp_info(
                        "exp_info must be a JSON object",
                    ))
                }
                Err(err) => {
                    return Err(ControlError::malformed_exp_info(format!(
                        "failed to parse exp_info: {}",
                        err
                    )))
                }
            },
            _ => {
                return Err(ControlError::malformed_exp_info(
                    "exp_info must be a JSON object",
                ))
            }
        };
        map.insert(UID_KEY.to_string(), Value::String(self.uid.clone()));
        serde_json::to_string(&Value::Object(map)).map_err(|err| {
            ControlError::malformed_exp_info(format!("failed to serialize exp_info: {}", err))
        })
    }
}
