//! Typed wrappers over the REST endpoints of each backend.

pub mod auth;
pub mod payment;
pub mod processing;
pub mod quota;
pub mod segmentation;
pub mod subscription;

/// Percent-encodes one path segment, spaces included.
pub(crate) fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
