//! Non-destructive listing of a category's queues.
//!
//! Bodies are decoded by their stored content type:
//! - `application/json` → parsed JSON (a parse failure is `MalformedBody`)
//! - `text/*` → string
//! - anything else, or no content type → `{"type":"Buffer","data":[..]}`

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{json, Value};

use crate::relay::error::{RelayError, RelayResult};
use crate::relay::queue::Message;
use crate::routing::Params;

/// One message as it appears in a listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedMessage {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub body: Value,
    pub request_ip: String,
    pub params: Params,
}

impl ListedMessage {
    pub fn decode(message: Message) -> RelayResult<Self> {
        let body = decode_body(&message)?;
        Ok(Self {
            path: message.path,
            content_type: message.content_type,
            body,
            request_ip: message.request_ip,
            params: message.params,
        })
    }
}

/// Every queue of one category, keyed by pattern in registration order.
#[derive(Debug, Default)]
pub struct Listing(Vec<(String, Vec<ListedMessage>)>);

impl Listing {
    /// Decode snapshots taken under the channel lock.
    pub fn decode(snapshots: Vec<(String, Vec<Message>)>) -> RelayResult<Self> {
        snapshots
            .into_iter()
            .map(|(pattern, messages)| -> RelayResult<(String, Vec<ListedMessage>)> {
                let listed = messages
                    .into_iter()
                    .map(ListedMessage::decode)
                    .collect::<RelayResult<Vec<_>>>()?;
                Ok((pattern, listed))
            })
            .collect::<RelayResult<Vec<_>>>()
            .map(Listing)
    }

    /// Tab-indented JSON document.
    pub fn to_pretty_json(&self) -> RelayResult<Vec<u8>> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| RelayError::Encode(e.to_string()))?;
        Ok(out)
    }
}

impl Serialize for Listing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (pattern, messages) in &self.0 {
            map.serialize_entry(pattern, messages)?;
        }
        map.end()
    }
}

fn decode_body(message: &Message) -> RelayResult<Value> {
    let content_type = message.content_type.as_deref().unwrap_or_default();

    if content_type == "application/json" {
        return serde_json::from_slice(&message.body).map_err(|e| RelayError::MalformedBody {
            path: message.path.clone(),
            content_type: content_type.to_string(),
            reason: e.to_string(),
        });
    }

    if is_text(content_type) {
        return Ok(Value::String(
            String::from_utf8_lossy(&message.body).into_owned(),
        ));
    }

    Ok(json!({
        "type": "Buffer",
        "data": message.body.as_ref(),
    }))
}

fn is_text(content_type: &str) -> bool {
    content_type
        .get(..5)
        .is_some_and(|head| head.eq_ignore_ascii_case("text/"))
}
