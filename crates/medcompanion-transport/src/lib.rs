//! # medcompanion-transport
//!
//! The production [`ChatTransport`](medcompanion_core::traits::ChatTransport):
//! a blocking `reqwest` client speaking the OpenAI-compatible chat-completions
//! protocol, with server-sent-event decoding for streaming calls.

pub mod http;
pub mod sse;

pub use http::HttpChatTransport;
pub use sse::{SseEvent, SseReader};
