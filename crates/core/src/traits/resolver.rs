//! Inline directive resolution
//!
//! Text tokens may carry brace-delimited directives (`{...}`) that are not
//! meant to be spoken. The resolver decides what replaces each one in the
//! synthesis input and may trigger side effects scheduled at `trigger_time`.

use std::future::Future;
use std::sync::Arc;

use crate::Result;

/// Directive resolver capability
#[async_trait::async_trait]
pub trait TagResolver: Send + Sync {
    /// Resolve one directive
    ///
    /// * `directive` - raw content between the braces
    /// * `index` - 1-based position of the directive within the request
    /// * `trigger_time` - playback offset (seconds) at which the directive applies
    ///
    /// `None` or an empty string drops the directive from the synthesis input.
    async fn resolve(
        &self,
        directive: &str,
        index: u64,
        trigger_time: f64,
    ) -> Result<Option<String>>;
}

#[async_trait::async_trait]
impl<T: TagResolver + ?Sized> TagResolver for Arc<T> {
    async fn resolve(
        &self,
        directive: &str,
        index: u64,
        trigger_time: f64,
    ) -> Result<Option<String>> {
        (**self).resolve(directive, index, trigger_time).await
    }
}

/// Resolver backed by an async closure
pub struct FnTagResolver<F> {
    f: F,
}

impl<F> FnTagResolver<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait::async_trait]
impl<F, Fut> TagResolver for FnTagResolver<F>
where
    F: Fn(String, u64, f64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<String>>> + Send + 'static,
{
    async fn resolve(
        &self,
        directive: &str,
        index: u64,
        trigger_time: f64,
    ) -> Result<Option<String>> {
        (self.f)(directive.to_string(), index, trigger_time).await
    }
}

/// Drops every directive
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTagResolver;

#[async_trait::async_trait]
impl TagResolver for NoopTagResolver {
    async fn resolve(
        &self,
        _directive: &str,
        _index: u64,
        _trigger_time: f64,
    ) -> Result<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_resolver() {
        let resolver = FnTagResolver::new(|directive: String, index: u64, _time: f64| async move {
            Ok::<_, crate::Error>(Some(format!("{}#{}", directive, index)))
        });
        let out = resolver.resolve("wave", 3, 1.5).await.unwrap();
        assert_eq!(out.as_deref(), Some("wave#3"));
    }

    #[tokio::test]
    async fn test_noop_resolver_through_arc() {
        let resolver: Arc<dyn TagResolver> = Arc::new(NoopTagResolver);
        assert_eq!(resolver.resolve("x", 1, 0.0).await.unwrap(), None);
    }
}
