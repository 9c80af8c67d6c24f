//! Response conversion.
//!
//! # Responsibilities
//! - Map a `RelayResponse` to status, metadata headers and raw body
//!
//! # Headers
//! - `channel`: channel id of a resolved request
//! - `prefix`: concrete path the message was posted to
//! - `request-ip`: poster's address (retrieval only)
//! - `params`: captures as a JSON object
//!
//! # Design Decisions
//! - Body is returned byte-for-byte as posted; no content-type is added
//! - A value that cannot be a header (control bytes) is dropped, not fatal

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::relay::RelayResponse;

pub const CHANNEL_HEADER: &str = "channel";
pub const PREFIX_HEADER: &str = "prefix";
pub const REQUEST_IP_HEADER: &str = "request-ip";
pub const PARAMS_HEADER: &str = "params";

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body.map(Body::from).unwrap_or_else(Body::empty));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        if let Some(channel) = &self.channel {
            set_header(headers, CHANNEL_HEADER, channel);
        }
        if let Some(prefix) = &self.prefix {
            set_header(headers, PREFIX_HEADER, prefix);
        }
        if let Some(ip) = &self.request_ip {
            set_header(headers, REQUEST_IP_HEADER, ip);
        }
        if let Some(params) = &self.params {
            set_header(headers, PARAMS_HEADER, &params.to_json());
        }

        response
    }
}

fn set_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_bytes(value.as_bytes()) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(name), value);
        }
        Err(_) => tracing::warn!(header = name, "Dropping header value that is not representable"),
    }
}
