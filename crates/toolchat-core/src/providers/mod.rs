//! Chat completion providers
//!
//! - [`Provider`]: one completion request against a chat completion service
//! - [`HttpProvider`]: OpenAI-style JSON over HTTP (Mistral by default)
//! - [`MockProvider`]: scripted replies for tests
//! - [`ChatClient`]: wraps a provider with [`RetryPolicy`] backoff and cancellation

mod traits;
mod error;
mod http;
mod retry;
mod client;
mod mock;

pub use traits::{Completion, CompletionOptions, Provider, Usage, DEFAULT_TEMPERATURE};
pub use error::{ProviderError, ProviderResult};
pub use http::HttpProvider;
pub use retry::RetryPolicy;
pub use client::ChatClient;
pub use mock::{MockMode, MockProvider, MockReply};
