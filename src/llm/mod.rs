//! OpenAI-compatible chat completions: request shape, SSE decoding,
//! the streaming client with its retry policy, and model listing.

pub mod client;
pub mod models;
pub mod request;
pub mod retry;
pub mod sse;

pub use client::{BudgetPrompter, CompletionClient, NoProgress, ProgressSink};
pub use models::list_models;
pub use request::{ChatRequest, RequestShape};
pub use retry::{GenerationResult, RetryReason};
pub use sse::{SseDecoder, SseEvent, StreamDelta, TokenUsage};
