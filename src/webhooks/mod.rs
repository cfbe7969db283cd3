//! Webhook handling for GitHub push events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA1, `X-Hub-Signature`)
//! - The push event model and branch extraction

pub mod push;
pub mod signature;

pub use push::{PushEvent, branch_from_ref};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
