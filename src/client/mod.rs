//! Typed client for the backend JSON contract.
//!
//! The forwarder never interprets bodies; this module is for callers that
//! do (the `einsum-cli` binary, tests, other Rust front ends).

pub mod api;
pub mod reply;
pub mod submit;

pub use api::{ApiClient, ClientError};
pub use reply::{ApiReply, ReplyError};
pub use submit::Submitter;
