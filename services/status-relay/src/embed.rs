//! Discord embed construction for outage and recovery notifications
//!
//! A notification is assembled as one ordered list of fields and then split
//! into pages ("embeds") of at most [`MAX_FIELDS_PER_EMBED`] fields. Every page
//! carries the event timestamp and the footer; only the first carries the
//! summary.

use std::fmt::Debug;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::BotStatusPayload;

pub const MAX_FIELDS_PER_EMBED: usize = 25;
pub const MAX_SHARDS_LISTED: usize = 50;
pub const MAX_ERROR_CHARS: usize = 900;
pub const MAX_FIELD_CHARS: usize = 1000;

const ELLIPSIS: char = '…';

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline: Option<bool>,
}

impl EmbedField {
    fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: Some(inline),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// One notification page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
    pub timestamp: String,
    pub footer: EmbedFooter,
}

impl Embed {
    pub fn field(&self, name: &str) -> Option<&EmbedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Details about the upstream request that led to the event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchMeta {
    pub url: Option<String>,
    pub http_status: Option<u16>,
    pub http_ok: Option<bool>,
    pub error_message: Option<String>,
    pub response_ms: Option<u64>,
}

/// Outage bookkeeping attached to the event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutageMeta {
    pub down_since_unix: Option<i64>,
    pub is_transition: Option<bool>,
}

/// Everything a notification is rendered from
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    pub title: String,
    pub summary: String,
    pub event_unix: i64,
    pub status: Option<BotStatusPayload>,
    /// Upstream JSON as received, shown verbatim in the raw payload field
    pub raw: Option<Value>,
    pub fetch: Option<FetchMeta>,
    pub outage: Option<OutageMeta>,
}

/// Render any value for display.
///
/// `None` renders as `undefined`, JSON null as `null` and an empty string as
/// `(empty)`. Structured values are serialized to JSON, falling back to their
/// debug form when serialization fails.
pub fn safe_string<T>(value: Option<&T>) -> String
where
    T: Serialize + Debug + ?Sized,
{
    let Some(value) = value else {
        return "undefined".to_string();
    };
    match serde_json::to_value(value) {
        Ok(Value::Null) => "null".to_string(),
        Ok(Value::String(s)) if s.is_empty() => "(empty)".to_string(),
        Ok(Value::String(s)) => s,
        Ok(Value::Bool(b)) => b.to_string(),
        Ok(Value::Number(n)) => n.to_string(),
        Ok(structured) => {
            serde_json::to_string(&structured).unwrap_or_else(|_| format!("{:?}", value))
        }
        Err(_) => format!("{:?}", value),
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `…`
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut cut = text[..byte_idx].to_string();
            cut.push(ELLIPSIS);
            cut
        }
        None => text.to_string(),
    }
}

/// Discord relative + full timestamp markup
fn discord_timestamp(unix: i64) -> String {
    format!("<t:{unix}:R>\n<t:{unix}:F>")
}

fn iso_timestamp(unix: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn shard_summary(status: &BotStatusPayload) -> EmbedField {
    let listed = &status.shards[..status.shards.len().min(MAX_SHARDS_LISTED)];
    let text = if listed.is_empty() {
        "(none)".to_string()
    } else {
        listed
            .iter()
            .map(|s| {
                let latency = s
                    .latency_ms
                    .as_ref()
                    .map_or_else(|| "null".to_string(), |n| n.to_string());
                format!("#{}: online={} latency_ms={}", s.id, s.online, latency)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    EmbedField::new(
        format!("Shards (up to {})", listed.len()),
        truncate(&text, MAX_FIELD_CHARS),
        false,
    )
}

fn collect_fields(event: &NotificationEvent) -> Vec<EmbedField> {
    let mut fields = vec![EmbedField::new(
        "Event time",
        discord_timestamp(event.event_unix),
        true,
    )];

    let outage = event.outage.as_ref();
    let down_since = outage
        .and_then(|o| o.down_since_unix)
        .map_or_else(|| "unknown".to_string(), discord_timestamp);
    fields.push(EmbedField::new("Down since", down_since, true));

    if let Some(is_transition) = outage.and_then(|o| o.is_transition) {
        let flag = if is_transition { "yes" } else { "no" };
        fields.push(EmbedField::new("Transition", flag, true));
    }

    if let Some(fetch) = &event.fetch {
        if let Some(url) = fetch.url.as_deref().filter(|u| !u.is_empty()) {
            fields.push(EmbedField::new("Status URL", safe_string(Some(url)), false));
        }
        if let Some(ms) = &fetch.response_ms {
            fields.push(EmbedField::new("Fetch latency (ms)", safe_string(Some(ms)), true));
        }
        if let Some(status) = &fetch.http_status {
            fields.push(EmbedField::new("HTTP status", safe_string(Some(status)), true));
        }
        if let Some(ok) = &fetch.http_ok {
            fields.push(EmbedField::new("HTTP ok", safe_string(Some(ok)), true));
        }
        if let Some(message) = fetch.error_message.as_deref().filter(|m| !m.is_empty()) {
            fields.push(EmbedField::new(
                "Error",
                truncate(message, MAX_ERROR_CHARS),
                false,
            ));
        }
    }

    if let Some(status) = &event.status {
        fields.push(EmbedField::new("Online", safe_string(Some(&status.online)), true));
        fields.push(EmbedField::new(
            "Shard count",
            safe_string(Some(&status.shard_count)),
            true,
        ));
        fields.push(EmbedField::new(
            "Uptime (seconds)",
            safe_string(Some(&status.uptime_seconds)),
            true,
        ));
        let started_at = status
            .started_at
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("null");
        fields.push(EmbedField::new("Started at", started_at, false));
        fields.push(shard_summary(status));
        let raw = match &event.raw {
            Some(raw) => safe_string(Some(raw)),
            None => safe_string(Some(status)),
        };
        fields.push(EmbedField::new(
            "Raw payload (trimmed)",
            truncate(&raw, MAX_FIELD_CHARS),
            false,
        ));
    }

    fields
}

/// Render a notification event into one or more embeds
pub fn build_embeds(event: &NotificationEvent, footer: &str) -> Vec<Embed> {
    paginate(event, footer, collect_fields(event))
}

/// Split `fields` into pages of at most [`MAX_FIELDS_PER_EMBED`]
fn paginate(event: &NotificationEvent, footer: &str, fields: Vec<EmbedField>) -> Vec<Embed> {
    let timestamp = iso_timestamp(event.event_unix);

    fields
        .chunks(MAX_FIELDS_PER_EMBED)
        .enumerate()
        .map(|(idx, chunk)| Embed {
            title: if idx == 0 {
                event.title.clone()
            } else {
                format!("{} (continued {})", event.title, idx + 1)
            },
            description: (idx == 0).then(|| event.summary.clone()),
            fields: chunk.to_vec(),
            timestamp: timestamp.clone(),
            footer: EmbedFooter {
                text: footer.to_string(),
            },
        })
        .collect()
}
