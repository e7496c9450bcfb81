//! Oracle integration.
//!
//! Defines the `Oracle` trait — the injected request/response function
//! the engine samples from. Transport concerns (HTTP, retries, rate
//! limits, prompt templating) belong to the implementor, not to this
//! crate: a failure returned here is surfaced unchanged to the caller
//! of `collect`.

use std::future::Future;

use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over stochastic oracles.
///
/// Implementors take a prompt and produce one response drawn from the
/// oracle's distribution. Must be safe for concurrent invocation up to
/// the engine's configured in-flight limit.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn query(&self, prompt: &str) -> Result<String>;
}

/// Any async function from prompt to response is an oracle, so callers
/// and tests can pass plain closures instead of defining a type.
#[async_trait]
impl<F, Fut> Oracle for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String>> + Send + 'static,
{
    async fn query(&self, prompt: &str) -> Result<String> {
        (self)(prompt.to_owned()).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
