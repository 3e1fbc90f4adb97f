//! Bot status payload and the `/api/status` response body

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// One partition of the bot's gateway connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardStatus {
    pub id: u64,
    pub online: bool,
    pub latency_ms: Option<Number>,
}

/// Snapshot reported by the upstream status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotStatusPayload {
    pub online: bool,
    pub started_at: Option<String>,
    pub uptime_seconds: Number,
    pub shard_count: u64,
    pub shards: Vec<ShardStatus>,
}

impl Default for BotStatusPayload {
    fn default() -> Self {
        Self {
            online: false,
            started_at: None,
            uptime_seconds: Number::from(0u64),
            shard_count: 0,
            shards: Vec::new(),
        }
    }
}

impl BotStatusPayload {
    /// Build a payload from whatever JSON the upstream returned.
    ///
    /// Missing or invalid numbers become 0, a missing shard list becomes
    /// empty and `shard_count` falls back to the number of listed shards.
    pub fn from_value(value: &Value) -> Self {
        let shards: Vec<ShardStatus> = value
            .get("shards")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(shard_from_value).collect())
            .unwrap_or_default();

        let shard_count = value
            .get("shard_count")
            .and_then(non_negative_integer)
            .unwrap_or(shards.len() as u64);

        Self {
            online: value
                .get("online")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            started_at: value
                .get("started_at")
                .and_then(Value::as_str)
                .map(str::to_string),
            uptime_seconds: value
                .get("uptime_seconds")
                .and_then(non_negative_number)
                .unwrap_or_else(|| Number::from(0u64)),
            shard_count,
            shards,
        }
    }

    /// Parse an upstream response body, keeping the JSON exactly as received
    pub fn parse(body: &str) -> crate::Result<(Self, Value)> {
        let value: Value = serde_json::from_str(body)?;
        Ok((Self::from_value(&value), value))
    }

    pub fn is_down(&self) -> bool {
        !self.online
    }
}

fn shard_from_value(value: &Value) -> ShardStatus {
    ShardStatus {
        id: value
            .get("id")
            .and_then(non_negative_integer)
            .unwrap_or_default(),
        online: value
            .get("online")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        latency_ms: value
            .get("latency_ms")
            .and_then(Value::as_number)
            .cloned(),
    }
}

fn non_negative_number(value: &Value) -> Option<Number> {
    let n = value.as_number()?;
    match n.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 => Some(n.clone()),
        _ => None,
    }
}

fn non_negative_integer(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// Body returned by `GET /api/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub status: BotStatusPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn success(status: BotStatusPayload) -> Self {
        Self {
            ok: true,
            status,
            error: None,
        }
    }

    /// Zeroed payload carrying an error description
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            status: BotStatusPayload::default(),
            error: Some(error.into()),
        }
    }
}
