//! Relay operations.
//!
//! # Responsibilities
//! - Resolve {channel, key, category, prefix} before touching any state
//! - Apply the mutation or queue access under the channel lock
//! - Produce a transport-neutral `RelayResponse`
//!
//! # Resolution Order
//! ```text
//! channel registered?        no → 404
//! key required and wrong?   yes → 403
//! prefix/route present?      no → 404
//! ```
//!
//! # Design Decisions
//! - Registry is passed in explicitly; no hidden global state
//! - Posting never checks the key, even into a private prefix
//! - Rejections carry no metadata headers; resolved requests always carry `channel`

use axum::body::Bytes;
use axum::http::StatusCode;

use crate::observability::metrics;
use crate::relay::channel::{ChannelRegistry, CreateOutcome};
use crate::relay::error::{RelayError, RelayResult};
use crate::relay::listing::Listing;
use crate::relay::prefix::Category;
use crate::relay::queue::Message;
use crate::routing::{Params, RouteMethod};

/// Outcome of a relay operation, ready for the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub channel: Option<String>,
    pub prefix: Option<String>,
    pub request_ip: Option<String>,
    pub params: Option<Params>,
    pub body: Option<Bytes>,
}

impl RelayResponse {
    /// A request that failed resolution or validation.
    pub fn rejected(err: &RelayError) -> Self {
        tracing::debug!(error = %err, status = %err.status(), "Relay request rejected");
        Self {
            status: err.status(),
            channel: None,
            prefix: None,
            request_ip: None,
            params: None,
            body: None,
        }
    }

    /// A request that resolved against `channel_id`.
    pub fn resolved(channel_id: &str, params: Params) -> Self {
        Self {
            status: StatusCode::OK,
            channel: Some(channel_id.to_string()),
            prefix: None,
            request_ip: None,
            params: Some(params),
            body: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_prefix(mut self, path: impl Into<String>) -> Self {
        self.prefix = Some(path.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Report a delivered message: its posted path, source address, captures and body.
    pub fn with_message(mut self, message: Message) -> Self {
        self.prefix = Some(message.path);
        self.request_ip = Some(message.request_ip);
        self.params = Some(message.params);
        self.body = Some(message.body);
        self
    }
}

/// What a poster supplied, beyond the path.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub content_type: Option<String>,
    pub body: Bytes,
    pub request_ip: String,
}

fn finish(result: RelayResult<RelayResponse>) -> RelayResponse {
    result.unwrap_or_else(|err| RelayResponse::rejected(&err))
}

fn channel_params(channel_id: &str) -> Params {
    [("channel", channel_id)].into_iter().collect()
}

/// `GET /create/{channel}?key=`
pub fn create_channel(registry: &ChannelRegistry, channel_id: &str, key: Option<&str>) -> RelayResponse {
    finish(registry.create(channel_id, key).map(|outcome| {
        if outcome == CreateOutcome::Existing {
            tracing::debug!(channel = %channel_id, "Channel already exists, key verified");
        }
        RelayResponse::resolved(channel_id, channel_params(channel_id))
    }))
}

/// `GET /remove/{channel}?key=`
pub fn remove_channel(registry: &ChannelRegistry, channel_id: &str, key: Option<&str>) -> RelayResponse {
    finish(
        registry
            .remove(channel_id, key)
            .map(|()| RelayResponse::resolved(channel_id, channel_params(channel_id))),
    )
}

/// `GET /create/{channel}/{category}?key=&prefix=`
pub fn create_prefix(
    registry: &ChannelRegistry,
    channel_id: &str,
    key: Option<&str>,
    category: Category,
    pattern: &str,
) -> RelayResponse {
    finish(registry.with_channel(channel_id, |channel| {
        channel.authorize(key)?;
        channel.create_prefix(category, pattern);
        Ok(RelayResponse::resolved(channel_id, channel_params(channel_id)))
    }))
}

/// `GET /remove/{channel}/{category}?key=&prefix=`
pub fn remove_prefix(
    registry: &ChannelRegistry,
    channel_id: &str,
    key: Option<&str>,
    category: Category,
    pattern: &str,
) -> RelayResponse {
    finish(registry.with_channel(channel_id, |channel| {
        channel.authorize(key)?;
        channel.remove_prefix(category, pattern)?;
        Ok(RelayResponse::resolved(channel_id, channel_params(channel_id)))
    }))
}

/// `POST /channel/{channel}/{path}`
///
/// `path` is the concrete suffix after `/channel/{channel}/`, verbatim.
pub fn post_message(
    registry: &ChannelRegistry,
    channel_id: &str,
    path: &str,
    incoming: IncomingMessage,
) -> RelayResponse {
    finish(registry.with_channel(channel_id, |channel| {
        let route = channel.route(RouteMethod::Post, path)?;
        let descriptor = route.descriptor;
        let queue = channel.queue_mut(descriptor.category, &descriptor.pattern)?;

        queue.push(Message {
            path: path.to_string(),
            content_type: incoming.content_type,
            body: incoming.body,
            request_ip: incoming.request_ip,
            params: route.params.clone(),
        });
        metrics::record_posted(descriptor.category);

        tracing::debug!(
            channel = %channel_id,
            category = %descriptor.category,
            pattern = %descriptor.pattern,
            path = %path,
            queued = queue.len(),
            "Message posted"
        );
        Ok(RelayResponse::resolved(channel_id, route.params).with_prefix(path))
    }))
}

/// `GET /channel/{channel}/{path}[?key=&prefix=]`
///
/// The route matched by `path` picks the category. A non-empty
/// `prefix_override` selects a different pattern in that category.
pub fn get_message(
    registry: &ChannelRegistry,
    channel_id: &str,
    path: &str,
    key: Option<&str>,
    prefix_override: Option<&str>,
) -> RelayResponse {
    finish(registry.with_channel(channel_id, |channel| {
        let route = channel.route(RouteMethod::Get, path)?;
        let category = route.descriptor.category;
        if category.requires_key() {
            channel.authorize(key)?;
        }

        let pattern = prefix_override
            .filter(|p| !p.is_empty())
            .unwrap_or(route.descriptor.pattern.as_str());
        let queue = channel.queue_mut(category, pattern)?;

        let response = RelayResponse::resolved(channel_id, route.params).with_prefix(path);
        Ok(pop_into(queue.pop_front(), response, category))
    }))
}

/// `GET /channel/{channel}/?key=&prefix=`
///
/// Explicit pattern lookup in the private directory; bypasses route dispatch.
pub fn get_message_by_prefix(
    registry: &ChannelRegistry,
    channel_id: &str,
    key: Option<&str>,
    pattern: &str,
) -> RelayResponse {
    finish(registry.with_channel(channel_id, |channel| {
        channel.authorize(key)?;
        let queue = channel.queue_mut(Category::Private, pattern)?;

        let response = RelayResponse::resolved(channel_id, channel_params(channel_id));
        Ok(pop_into(queue.pop_front(), response, Category::Private))
    }))
}

fn pop_into(message: Option<Message>, response: RelayResponse, category: Category) -> RelayResponse {
    match message {
        Some(message) => {
            metrics::record_delivered(category);
            response.with_message(message)
        }
        None => response.with_status(StatusCode::NOT_FOUND),
    }
}

/// `GET /list/{channel}/{category}?key=`
///
/// Snapshots are taken under the lock; decoding and encoding happen after it is released.
pub fn list_messages(
    registry: &ChannelRegistry,
    channel_id: &str,
    category: Category,
    key: Option<&str>,
) -> RelayResponse {
    let snapshots = registry.with_channel(channel_id, |channel| {
        channel.authorize(key)?;
        Ok(channel
            .directory(category)
            .iter()
            .map(|entry| (entry.pattern().to_string(), entry.queue().snapshot()))
            .collect::<Vec<_>>())
    });

    finish(snapshots.and_then(Listing::decode).and_then(|listing| {
        let body = listing.to_pretty_json()?;
        Ok(RelayResponse::resolved(channel_id, channel_params(channel_id)).with_body(body))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn incoming(body: &'static str) -> IncomingMessage {
        IncomingMessage {
            content_type: Some("application/json".to_string()),
            body: Bytes::from_static(body.as_bytes()),
            request_ip: "127.0.0.1".to_string(),
        }
    }

    fn setup(category: Category, pattern: &str) -> ChannelRegistry {
        let registry = ChannelRegistry::new();
        assert_eq!(create_channel(&registry, "c1", Some("k")).status, StatusCode::OK);
        assert_eq!(
            create_prefix(&registry, "c1", Some("k"), category, pattern).status,
            StatusCode::OK
        );
        registry
    }

    #[test]
    fn test_create_channel_statuses() {
        let registry = ChannelRegistry::new();
        let res = create_channel(&registry, "test", Some("1234"));
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.channel.as_deref(), Some("test"));

        assert_eq!(create_channel(&registry, "test", Some("2345")).status, StatusCode::FORBIDDEN);
        assert_eq!(create_channel(&registry, "test", Some("1234")).status, StatusCode::OK);
        assert_eq!(remove_channel(&registry, "test", Some("1234")).status, StatusCode::OK);
        assert_eq!(remove_channel(&registry, "test", Some("1234")).status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_rejection_has_no_metadata() {
        let registry = ChannelRegistry::new();
        let res = create_prefix(&registry, "nope", None, Category::Public, "a");
        assert_eq!(res, RelayResponse::rejected(&RelayError::ChannelNotFound("nope".into())));
        assert!(res.channel.is_none());
    }

    #[test]
    fn test_public_post_then_get() {
        let registry = setup(Category::Public, "data/:id");

        let res = post_message(&registry, "c1", "data/x1", incoming(r#"{"a":1}"#));
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.prefix.as_deref(), Some("data/x1"));

        let res = get_message(&registry, "c1", "data/x1", None, None);
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body.unwrap(), r#"{"a":1}"#);
        assert_eq!(res.params.unwrap().to_json(), r#"{"id":"x1"}"#);
        assert_eq!(res.request_ip.as_deref(), Some("127.0.0.1"));

        let res = get_message(&registry, "c1", "data/x1", None, None);
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(res.channel.as_deref(), Some("c1"));
        assert!(res.body.is_none());
    }

    #[test]
    fn test_fifo_across_posts() {
        let registry = setup(Category::Public, "data/:id");
        for body in [r#"{"n":1}"#, r#"{"n":2}"#, r#"{"n":3}"#] {
            post_message(&registry, "c1", "data/a", incoming(body));
        }
        for expected in [r#"{"n":1}"#, r#"{"n":2}"#, r#"{"n":3}"#] {
            let res = get_message(&registry, "c1", "data/a", None, None);
            assert_eq!(res.body.unwrap(), expected);
        }
    }

    #[test]
    fn test_private_requires_key_to_read_not_to_post() {
        let registry = setup(Category::Private, "data/:hostId");

        let res = post_message(&registry, "c1", "data/testhost", incoming(r#"{"test":"post1"}"#));
        assert_eq!(res.status, StatusCode::OK);

        assert_eq!(get_message(&registry, "c1", "data/testhost", None, None).status, StatusCode::FORBIDDEN);
        assert_eq!(
            get_message(&registry, "c1", "data/testhost", Some("bad"), None).status,
            StatusCode::FORBIDDEN
        );

        let res = get_message(&registry, "c1", "data/testhost", Some("k"), None);
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body.unwrap(), r#"{"test":"post1"}"#);
    }

    #[test]
    fn test_get_by_prefix_returns_posted_paths_in_order() {
        let registry = setup(Category::Private, "data/*");
        post_message(&registry, "c1", "data/p/q", incoming(r#"{"n":1}"#));
        post_message(&registry, "c1", "data/r", incoming(r#"{"n":2}"#));

        assert_eq!(
            get_message_by_prefix(&registry, "c1", None, "data/*").status,
            StatusCode::FORBIDDEN
        );

        let first = get_message_by_prefix(&registry, "c1", Some("k"), "data/*");
        assert_eq!(first.prefix.as_deref(), Some("data/p/q"));
        assert_eq!(first.params.unwrap().get("0"), Some("p/q"));

        let second = get_message_by_prefix(&registry, "c1", Some("k"), "data/*");
        assert_eq!(second.prefix.as_deref(), Some("data/r"));
        assert_eq!(second.body.unwrap(), r#"{"n":2}"#);

        let empty = get_message_by_prefix(&registry, "c1", Some("k"), "data/*");
        assert_eq!(empty.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_get_by_prefix_is_private_only() {
        let registry = setup(Category::Public, "data/*");
        post_message(&registry, "c1", "data/a", incoming("{}"));
        assert_eq!(
            get_message_by_prefix(&registry, "c1", Some("k"), "data/*").status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_prefix_override_on_routed_get() {
        let registry = setup(Category::Private, "data/*");
        create_prefix(&registry, "c1", Some("k"), Category::Private, "other/:id");
        post_message(&registry, "c1", "other/1", incoming(r#"{"from":"other"}"#));

        let res = get_message(&registry, "c1", "data/x", Some("k"), Some("other/:id"));
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.prefix.as_deref(), Some("other/1"));

        // Empty override falls back to the routed pattern
        let res = get_message(&registry, "c1", "data/x", Some("k"), Some(""));
        assert_eq!(res.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_post_without_route_is_not_found() {
        let registry = setup(Category::Public, "data/:id");
        assert_eq!(
            post_message(&registry, "c1", "other/x", incoming("{}")).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            post_message(&registry, "missing", "data/x", incoming("{}")).status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_recreate_prefix_discards_messages() {
        let registry = setup(Category::Public, "data/:id");
        post_message(&registry, "c1", "data/a", incoming("{}"));
        create_prefix(&registry, "c1", Some("k"), Category::Public, "data/:id");
        assert_eq!(get_message(&registry, "c1", "data/a", None, None).status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_remove_prefix_wrong_key_keeps_route() {
        let registry = setup(Category::Public, "data/:clientId");
        post_message(&registry, "c1", "data/a", incoming(r#"{"kept":true}"#));

        let res = remove_prefix(&registry, "c1", Some("0000"), Category::Public, "data/:clientId");
        assert_eq!(res.status, StatusCode::FORBIDDEN);
        assert_eq!(get_message(&registry, "c1", "data/a", None, None).status, StatusCode::OK);

        let res = remove_prefix(&registry, "c1", Some("k"), Category::Public, "data/:clientId");
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(get_message(&registry, "c1", "data/a", None, None).status, StatusCode::NOT_FOUND);

        let res = remove_prefix(&registry, "c1", Some("k"), Category::Public, "data/:clientId");
        assert_eq!(res.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_remove_channel_then_everything_is_gone() {
        let registry = setup(Category::Public, "pub/:id");
        create_prefix(&registry, "c1", Some("k"), Category::Private, "priv/*");
        post_message(&registry, "c1", "pub/a", incoming("{}"));
        post_message(&registry, "c1", "priv/a", incoming("{}"));

        assert_eq!(remove_channel(&registry, "c1", Some("k")).status, StatusCode::OK);
        assert_eq!(get_message(&registry, "c1", "pub/a", None, None).status, StatusCode::NOT_FOUND);
        assert_eq!(
            get_message_by_prefix(&registry, "c1", Some("k"), "priv/*").status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            list_messages(&registry, "c1", Category::Public, Some("k")).status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_list_is_non_destructive() {
        let registry = setup(Category::Private, "data/*");
        post_message(&registry, "c1", "data/variable/path/1", incoming(r#"{"test":"post1"}"#));
        post_message(&registry, "c1", "data/post3/path", incoming(r#"{"test":"post3"}"#));

        assert_eq!(
            list_messages(&registry, "c1", Category::Private, None).status,
            StatusCode::FORBIDDEN
        );

        let res = list_messages(&registry, "c1", Category::Private, Some("k"));
        assert_eq!(res.status, StatusCode::OK);
        let listing: Value = serde_json::from_slice(&res.body.unwrap()).unwrap();
        assert_eq!(
            listing["data/*"],
            json!([
                {
                    "path": "data/variable/path/1",
                    "contentType": "application/json",
                    "body": {"test": "post1"},
                    "requestIp": "127.0.0.1",
                    "params": {"0": "variable/path/1"}
                },
                {
                    "path": "data/post3/path",
                    "contentType": "application/json",
                    "body": {"test": "post3"},
                    "requestIp": "127.0.0.1",
                    "params": {"0": "post3/path"}
                }
            ])
        );

        let res = get_message_by_prefix(&registry, "c1", Some("k"), "data/*");
        assert_eq!(res.prefix.as_deref(), Some("data/variable/path/1"));
    }

    #[test]
    fn test_list_public_requires_key_too() {
        let registry = setup(Category::Public, "data/:id");
        assert_eq!(
            list_messages(&registry, "c1", Category::Public, None).status,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            list_messages(&registry, "c1", Category::Public, Some("k")).status,
            StatusCode::OK
        );
    }

    #[test]
    fn test_list_malformed_json_body() {
        let registry = setup(Category::Public, "data/:id");
        post_message(&registry, "c1", "data/a", incoming("{broken"));
        assert_eq!(
            list_messages(&registry, "c1", Category::Public, Some("k")).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        // Plain retrieval still delivers the raw bytes
        let res = get_message(&registry, "c1", "data/a", None, None);
        assert_eq!(res.body.unwrap(), "{broken");
    }

    #[test]
    fn test_keyless_channel_private_read() {
        let registry = ChannelRegistry::new();
        create_channel(&registry, "open", None);
        create_prefix(&registry, "open", None, Category::Private, "inbox");
        post_message(&registry, "open", "inbox", incoming("{}"));

        assert_eq!(get_message(&registry, "open", "inbox", None, None).status, StatusCode::OK);
    }

    #[test]
    fn test_same_pattern_in_both_categories() {
        let registry = setup(Category::Public, "data/*");
        create_prefix(&registry, "c1", Some("k"), Category::Private, "data/*");

        remove_prefix(&registry, "c1", Some("k"), Category::Public, "data/*");

        // The private binding survives and is now the one that receives posts
        post_message(&registry, "c1", "data/x", incoming(r#"{"to":"private"}"#));
        let res = get_message_by_prefix(&registry, "c1", Some("k"), "data/*");
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body.unwrap(), r#"{"to":"private"}"#);
    }
}
