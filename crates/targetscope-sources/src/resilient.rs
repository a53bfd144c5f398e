//! Live-then-fallback call wrapper.
//!
//! Every live call runs under the configured timeout. Request pacing lives in
//! the live clients, which wait on their provider's shared rate limiter
//! before each HTTP request. Unavailable or malformed answers are logged and
//! the same operation is replayed against the fallback implementation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use targetscope_common::{DataQuality, EngineError, Result};
use tracing::{error, warn};

pub struct Resilient<P: ?Sized> {
    provider: String,
    live: Arc<P>,
    fallback: Arc<P>,
    timeout: Duration,
}

impl<P: ?Sized + Send + Sync> Resilient<P> {
    pub fn new(
        provider: impl Into<String>,
        live: Arc<P>,
        fallback: Arc<P>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider: provider.into(),
            live,
            fallback,
            timeout,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn live(&self) -> &P {
        &self.live
    }

    pub fn fallback(&self) -> &P {
        &self.fallback
    }

    /// Run `op` against the live provider, replaying it on the fallback when
    /// the live call fails recoverably. Returns where the value came from.
    pub async fn call<'a, R, F, Fut>(&'a self, operation: &'static str, op: F) -> Result<(R, DataQuality)>
    where
        F: Fn(&'a P) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let err = match tokio::time::timeout(self.timeout, op(&*self.live)).await {
            Ok(Ok(value)) => return Ok((value, DataQuality::Live)),
            Ok(Err(e)) => e,
            Err(_) => EngineError::unavailable(
                self.provider.as_str(),
                format!("{operation} timed out after {:?}", self.timeout),
            ),
        };

        match &err {
            EngineError::ProviderDataMalformed { .. } => {
                error!(provider = %self.provider, operation, error = %err, "Malformed provider data, using fallback");
            }
            e if e.is_recoverable() => {
                warn!(provider = %self.provider, operation, error = %err, "Provider unavailable, using fallback");
            }
            _ => return Err(err),
        }

        let value = op(&*self.fallback).await?;
        Ok((value, DataQuality::Fallback))
    }
}
