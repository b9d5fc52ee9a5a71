//! Sentence stream pacing
//!
//! Holds sentences back while the audio already pushed to the emitter runs
//! too far ahead of real-time playback, so synthesis that outruns the
//! listener does not pile up unbounded audio downstream.
//!
//! Playback is assumed to start with the first pushed audio. Emitters that
//! do not report that moment fall back to the first time the pacer saw
//! audio, which overstates how far ahead synthesis is.

use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use speechflow_config::PacerConfig;
use speechflow_core::AudioEmitter;
use speechflow_text_processing::SentenceToken;

/// Boxed sentence token stream
pub type TokenStream = Pin<Box<dyn Stream<Item = SentenceToken> + Send>>;

/// Throttles sentence release against reported playback progress
#[derive(Debug, Clone, Default)]
pub struct SentenceStreamPacer {
    config: PacerConfig,
}

impl SentenceStreamPacer {
    pub fn new(config: PacerConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Wrap a sentence stream; pass-through when pacing is disabled
    pub fn wrap<S>(&self, tokens: S, emitter: Arc<dyn AudioEmitter>) -> TokenStream
    where
        S: Stream<Item = SentenceToken> + Send + 'static,
    {
        if !self.config.enabled {
            return Box::pin(tokens);
        }

        let lookahead = self.config.lookahead();
        let poll_interval = self.config.poll_interval();

        Box::pin(async_stream::stream! {
            let mut tokens = Box::pin(tokens);
            let mut clock: Option<Instant> = None;

            while let Some(token) = tokens.next().await {
                loop {
                    let pushed = emitter.pushed_duration();
                    if pushed.is_zero() {
                        break;
                    }
                    let played = emitter.since_first_push().unwrap_or_else(|| {
                        let now = Instant::now();
                        now - *clock.get_or_insert(now)
                    });
                    let buffered = buffered_ahead(pushed, played);
                    if buffered <= lookahead {
                        break;
                    }
                    let wait = (buffered - lookahead).min(poll_interval);
                    tracing::trace!(
                        buffered_ms = buffered.as_millis() as u64,
                        wait_ms = wait.as_millis() as u64,
                        "Pacing sentence stream"
                    );
                    tokio::time::sleep(wait).await;
                }
                yield token;
            }
        })
    }
}

/// Audio ahead of playback, given what was pushed and how long playback ran
pub fn buffered_ahead(pushed: Duration, played: Duration) -> Duration {
    pushed.saturating_sub(played)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BufferedAudioEmitter;
    use futures::stream;
    use speechflow_core::EmitterOptions;

    fn token(text: &str) -> SentenceToken {
        SentenceToken {
            text: text.to_string(),
            segment_id: "seg".to_string(),
        }
    }

    fn emitter_with_audio(seconds: u64) -> Arc<BufferedAudioEmitter> {
        let emitter = Arc::new(BufferedAudioEmitter::new());
        emitter
            .initialize(EmitterOptions {
                request_id: "REQ_pacer".to_string(),
                sample_rate: 1000,
                num_channels: 1,
                mime_type: "audio/pcm".to_string(),
                stream: true,
            })
            .unwrap();
        emitter.start_segment("SEG_pacer").unwrap();
        if seconds > 0 {
            emitter.push(&vec![0u8; seconds as usize * 2000]).unwrap();
        }
        emitter
    }

    fn enabled() -> SentenceStreamPacer {
        SentenceStreamPacer::new(PacerConfig {
            enabled: true,
            lookahead_ms: 5000,
            poll_interval_ms: 100,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_is_pass_through() {
        let emitter = emitter_with_audio(60);
        let pacer = SentenceStreamPacer::default();
        let start = Instant::now();

        let out: Vec<_> = pacer
            .wrap(stream::iter(vec![token("a"), token("b")]), emitter)
            .collect()
            .await;

        assert_eq!(out.len(), 2);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_without_audio() {
        let emitter = emitter_with_audio(0);
        let start = Instant::now();

        let out: Vec<_> = enabled()
            .wrap(stream::iter(vec![token("a"), token("b")]), emitter)
            .collect()
            .await;

        assert_eq!(out, vec![token("a"), token("b")]);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_until_within_lookahead() {
        let emitter = emitter_with_audio(8);
        let start = Instant::now();

        let mut paced = enabled().wrap(stream::iter(vec![token("a")]), emitter);
        assert_eq!(paced.next().await, Some(token("a")));

        // 8s buffered, 5s lookahead: released once 3s have played
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(3), "waited {:?}", waited);
        assert!(waited < Duration::from_millis(3200), "waited {:?}", waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_counted_from_first_push() {
        let emitter = emitter_with_audio(8);
        // synthesis of the first sentence took 2s before the pacer looked
        tokio::time::advance(Duration::from_secs(2)).await;
        let start = Instant::now();

        let mut paced = enabled().wrap(stream::iter(vec![token("b")]), emitter);
        assert_eq!(paced.next().await, Some(token("b")));

        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(1), "waited {:?}", waited);
        assert!(waited < Duration::from_millis(1200), "waited {:?}", waited);
    }

    #[test]
    fn test_buffered_ahead() {
        assert_eq!(
            buffered_ahead(Duration::from_secs(3), Duration::from_secs(1)),
            Duration::from_secs(2)
        );
        assert_eq!(
            buffered_ahead(Duration::from_secs(1), Duration::from_secs(3)),
            Duration::ZERO
        );
    }
}
