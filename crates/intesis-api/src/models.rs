// Wire types for the config and set endpoints
//
// These mirror the JSON exactly; `intesis-core` converts them into its
// domain model (typed service ids, bounds defaults, etc.).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// First element of the `GET api/v1/config` array.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub devices: Vec<RawDevice>,
}

/// One device in the configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDevice {
    /// Device identifier. The cloud sends numeric ids for some models.
    #[serde(deserialize_with = "string_or_number")]
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub services: BTreeMap<String, RawService>,
}

/// Current value and optional range of one service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawService {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
}

/// Body element of `POST api/v2/set`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceChange {
    pub device_id: String,
    pub service_id: String,
    pub value: serde_json::Value,
}

impl ServiceChange {
    pub fn new(
        device_id: impl Into<String>,
        service_id: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            service_id: service_id.into(),
            value,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
