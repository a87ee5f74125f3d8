//! The message envelope (C1): immutable metadata plus a typed payload.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Wire envelope. Immutable after construction — every field is set once by
/// [`MessageBuilder`]; there are no setters on `Message` itself. Equality
/// is by `message_id` only, per the spec.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: String,
    pub message_type: String,
    pub sender_id: String,
    pub reply_to: String,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
    pub content_type: String,
    #[serde(with = "content_base64")]
    pub content: Vec<u8>,
    pub headers: HashMap<String, String>,
    pub require_acknowledgement: bool,
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.message_id == other.message_id
    }
}
impl Eq for Message {}

impl Message {
    /// Starts building a fresh, non-reply message of the given type.
    pub fn builder(message_type: impl Into<String>, sender_id: impl Into<String>) -> MessageBuilder {
        MessageBuilder::new(message_type, sender_id)
    }

    /// Builds a reply: `correlation_id` is set to `self.message_id`.
    pub fn reply(&self, message_type: impl Into<String>, sender_id: impl Into<String>) -> MessageBuilder {
        let mut builder = MessageBuilder::new(message_type, sender_id);
        builder.correlation_id = self.message_id.clone();
        builder
    }

    /// Deserializes `content` as JSON into `T`. Malformed content never
    /// raises — it returns `T::default()`, per the spec's non-raising
    /// contract for payload access.
    pub fn payload<T: DeserializeOwned + Default>(&self) -> T {
        serde_json::from_slice(&self.content).unwrap_or_default()
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }
}

/// Explicit builder for [`Message`], replacing the reflection-based setter
/// pattern the original used: every field is named here, nothing is
/// discovered at runtime.
pub struct MessageBuilder {
    message_type: String,
    sender_id: String,
    reply_to: String,
    correlation_id: String,
    content_type: String,
    content: Vec<u8>,
    headers: HashMap<String, String>,
    require_acknowledgement: bool,
}

impl MessageBuilder {
    pub fn new(message_type: impl Into<String>, sender_id: impl Into<String>) -> Self {
        Self {
            message_type: message_type.into(),
            sender_id: sender_id.into(),
            reply_to: String::new(),
            correlation_id: String::new(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            content: Vec::new(),
            headers: HashMap::new(),
            require_acknowledgement: false,
        }
    }

    pub fn reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = reply_to.into();
        self
    }

    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn require_acknowledgement(mut self, require: bool) -> Self {
        self.require_acknowledgement = require;
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn content(mut self, content: Vec<u8>) -> Self {
        self.content = content;
        self
    }

    /// Serializes `payload` as JSON and sets it as the content, keeping
    /// `content_type` at `application/json`.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.content = serde_json::to_vec(payload).unwrap_or_default();
        self.content_type = DEFAULT_CONTENT_TYPE.to_string();
        self
    }

    pub fn build(self) -> Message {
        Message {
            message_id: Uuid::new_v4().to_string(),
            message_type: self.message_type,
            sender_id: self.sender_id,
            reply_to: self.reply_to,
            correlation_id: self.correlation_id,
            timestamp: Utc::now(),
            content_type: self.content_type,
            content: self.content,
            headers: self.headers,
            require_acknowledgement: self.require_acknowledgement,
        }
    }
}

mod content_base64 {
    use super::BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Default, PartialEq, Debug)]
    struct Ping {
        n: u32,
    }

    #[test]
    fn builder_sets_message_id_and_timestamp_once() {
        let msg = Message::builder("StartHand", "svc-a").build();
        assert!(!msg.message_id.is_empty());
        assert_eq!(msg.correlation_id, "");
        assert_eq!(msg.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn reply_correlates_to_original_message_id() {
        let original = Message::builder("Request", "svc-a").build();
        let response = original.reply("Response", "svc-b").build();
        assert_eq!(response.correlation_id, original.message_id);
    }

    #[test]
    fn equality_is_by_message_id_only() {
        let a = Message::builder("Ping", "svc-a").build();
        let mut b = a.clone();
        b.headers.insert("x".into(), "y".into());
        assert_eq!(a, b);
    }

    #[test]
    fn payload_round_trips_typed_values() {
        let msg = Message::builder("Ping", "svc-a").payload(&Ping { n: 7 }).build();
        let decoded: Ping = msg.payload();
        assert_eq!(decoded, Ping { n: 7 });
    }

    #[test]
    fn malformed_payload_returns_default_instead_of_raising() {
        let msg = Message::builder("Ping", "svc-a").content(b"not json".to_vec()).build();
        let decoded: Ping = msg.payload();
        assert_eq!(decoded, Ping::default());
    }

    #[test]
    fn wire_json_round_trips_by_field_equality() {
        let msg = Message::builder("Ping", "svc-a")
            .header("k", "v")
            .payload(&Ping { n: 3 })
            .build();
        let encoded = serde_json::to_string(&msg).unwrap();
        let decoded: Message = serde_json::from_str(&encoded).unwrap();
        assert_eq!(msg.message_id, decoded.message_id);
        assert_eq!(msg.content, decoded.content);
        assert_eq!(msg.headers, decoded.headers);
    }

    #[test]
    fn wire_json_uses_camel_case_keys_and_base64_content() {
        let msg = Message::builder("Ping", "svc-a").payload(&Ping { n: 3 }).build();
        let value: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("messageId").is_some());
        assert!(value.get("requireAcknowledgement").is_some());
        assert!(value.get("content").unwrap().is_string());
    }
}
