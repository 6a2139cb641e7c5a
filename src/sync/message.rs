//! Message envelopes exchanged with the server.
//!
//! Outbound: `{ "key": <endpoint>, "data": { ... } }`
//!
//! Inbound:  `{ "endpoint": <endpoint>, "status": "success" | "error",
//!              "code": <int>, "data": { ... }, "error_message": <str>? }`

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::ProtocolViolation;
use crate::safety::ActuatorOutputs;
use crate::sensors::SensorSnapshot;

pub const LOGIN_ENDPOINT: &str = "/login";
pub const GET_DATA_ENDPOINT: &str = "/iot/get_data";
pub const POST_DATA_ENDPOINT: &str = "/iot/post_data";

const DEVICE_KIND: &str = "iot";

// ───────────────────────────────────────────────────────────────
// Outbound
// ───────────────────────────────────────────────────────────────

/// Immutable snapshot reported to the server in push mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviceReport {
    #[serde(rename = "te")]
    pub temperature: f32,
    #[serde(rename = "hu")]
    pub humidity: f32,
    #[serde(rename = "wa")]
    pub water_level_pct: u8,
    #[serde(rename = "PuEn", serialize_with = "bool_as_int")]
    pub pump_on: bool,
    #[serde(rename = "DiFo", serialize_with = "bool_as_int")]
    pub dispenser_open: bool,
}

impl DeviceReport {
    /// Build from the sensor snapshot and the actuator decision of the same pass.
    pub fn from_state(snapshot: &SensorSnapshot, outputs: ActuatorOutputs) -> Self {
        Self {
            temperature: snapshot.temperature_c,
            humidity: snapshot.humidity_pct,
            water_level_pct: snapshot.water_level_pct.unwrap_or(0),
            pump_on: outputs.pump_on,
            dispenser_open: outputs.dispenser_open,
        }
    }
}

fn bool_as_int<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

/// Every message the device can send.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Login { device_id: String },
    GetData,
    PostData(DeviceReport),
}

#[derive(Serialize)]
struct Envelope<'a, D: Serialize> {
    key: &'a str,
    data: D,
}

#[derive(Serialize)]
struct LoginData<'a> {
    kind: &'a str,
    device_id: &'a str,
    /// The counterpart server keys devices on this field.
    iot_hwid: &'a str,
}

#[derive(Serialize)]
struct Empty {}

impl Outbound {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Login { .. } => LOGIN_ENDPOINT,
            Self::GetData => GET_DATA_ENDPOINT,
            Self::PostData(_) => POST_DATA_ENDPOINT,
        }
    }

    /// Serialize into the JSON envelope (no frame terminator).
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        let key = self.key();
        match self {
            Self::Login { device_id } => serde_json::to_vec(&Envelope {
                key,
                data: LoginData {
                    kind: DEVICE_KIND,
                    device_id,
                    iot_hwid: device_id,
                },
            }),
            Self::GetData => serde_json::to_vec(&Envelope { key, data: Empty {} }),
            Self::PostData(report) => serde_json::to_vec(&Envelope { key, data: report }),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Inbound
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    GetData,
    PostData,
    Other(String),
}

impl Endpoint {
    pub fn parse(s: &str) -> Self {
        match s {
            LOGIN_ENDPOINT => Self::Login,
            GET_DATA_ENDPOINT => Self::GetData,
            POST_DATA_ENDPOINT => Self::PostData,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Login => LOGIN_ENDPOINT,
            Self::GetData => GET_DATA_ENDPOINT,
            Self::PostData => POST_DATA_ENDPOINT,
            Self::Other(s) => s,
        }
    }
}

/// A reply that passed envelope validation.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub endpoint: Endpoint,
    pub code: i64,
    /// Absent (or non-object) payloads are tolerated.
    pub data: Option<Map<String, Value>>,
}

/// Desired actuator edges carried by a `/iot/get_data` reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorDirective {
    pub should_enable_water_pump: bool,
    pub should_dispense_food: bool,
}

impl InboundMessage {
    /// Decode the payload as an actuator directive.  Each flag is read on
    /// its own: a missing or mistyped field reads as `false` without
    /// affecting the other.
    pub fn directive(&self) -> ActuatorDirective {
        let Some(data) = &self.data else {
            return ActuatorDirective::default();
        };
        let field = |name: &str| data.get(name).and_then(Value::as_bool).unwrap_or(false);
        ActuatorDirective {
            should_enable_water_pump: field("shouldEnableWaterPump"),
            should_dispense_food: field("shouldDispenseFood"),
        }
    }
}

/// Run the envelope gates, in order:
///
/// 1. parses as a JSON object
/// 2. has `status`, integer `code`, and `endpoint`
/// 3. `status == "error"` is rejected (carrying `error_message`)
/// 4. `status` must be exactly `"success"`
/// 5. `code` must lie in `200..300`
/// 6. `data` is optional
///
/// Login and dispatch gates are the session's job.
pub fn validate_inbound(frame: &[u8]) -> Result<InboundMessage, ProtocolViolation> {
    let value: Value = serde_json::from_slice(frame).map_err(|_| ProtocolViolation::Malformed)?;
    let Value::Object(mut obj) = value else {
        return Err(ProtocolViolation::Malformed);
    };

    let status = obj
        .get("status")
        .and_then(Value::as_str)
        .ok_or(ProtocolViolation::MissingField("status"))?
        .to_owned();
    let code = obj
        .get("code")
        .and_then(Value::as_i64)
        .ok_or(ProtocolViolation::MissingField("code"))?;
    let endpoint = obj
        .get("endpoint")
        .and_then(Value::as_str)
        .map(Endpoint::parse)
        .ok_or(ProtocolViolation::MissingField("endpoint"))?;

    if status == "error" {
        let message = obj
            .get("error_message")
            .and_then(Value::as_str)
            .map(str::to_owned);
        return Err(ProtocolViolation::ServerError { code, message });
    }
    if status != "success" {
        return Err(ProtocolViolation::UnexpectedStatus(status));
    }
    if !(200..300).contains(&code) {
        return Err(ProtocolViolation::UnsupportedCode(code));
    }

    let data = match obj.remove("data") {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    };

    Ok(InboundMessage {
        endpoint,
        code,
        data,
    })
}
