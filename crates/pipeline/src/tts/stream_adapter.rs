//! Streaming adapter over one-shot TTS backends
//!
//! `StreamAdapter` turns any [`TtsBackend`] into a streaming one: text
//! arrives incrementally, is segmented into sentences, directives are
//! resolved and timed, and each sentence is synthesized with the wrapped
//! backend. Audio and timed transcript go to an [`AudioEmitter`].
//!
//! One request runs two units inside the caller's task:
//! - forward: drains the input channel into the sentence stream
//! - synthesis: reads (paced) sentences, resolves directives, synthesizes
//!
//! Dropping the `run` future cancels both at their next await point; the
//! sentence stream is closed on every exit path.

use chrono::Utc;
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use speechflow_config::{StreamAdapterConfig, TagTimingConfig};
use speechflow_core::{
    short_id, AudioEmitter, AudioStream, ConnectOptions, EmitterOptions, MetricsObserver,
    PipelineError, Result, TagResolver, TimedString, TtsBackend, TtsCapabilities, TtsMetrics,
};
use speechflow_text_processing::{SentenceStream, SentenceTokenizer};

use super::pacer::{SentenceStreamPacer, TokenStream};
use super::tags::TagTimingEngine;

/// Item on a request's input channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamInput {
    Text(String),
    /// Emit buffered text now, even if it is not a full sentence
    Flush,
}

/// Synthesis request state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdapterState {
    #[default]
    Idle,
    /// Input is still arriving
    Streaming,
    /// Input closed, remaining sentences are being synthesized
    Draining,
    Closed,
    Error,
}

impl AdapterState {
    pub fn is_active(&self) -> bool {
        matches!(self, AdapterState::Streaming | AdapterState::Draining)
    }
}

/// Per-request options
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOptions {
    /// Handed unchanged to the wrapped backend
    pub conn_options: ConnectOptions,
    /// Speaking rate used for directive timing
    pub words_per_sec: f64,
}

impl StreamOptions {
    pub fn new(conn_options: ConnectOptions, words_per_sec: f64) -> Self {
        Self {
            conn_options,
            words_per_sec,
        }
    }

    /// Options derived from adapter configuration
    pub fn from_config(config: &StreamAdapterConfig) -> Self {
        Self::new(config.connect, config.tags.words_per_sec)
    }
}

/// Wraps a one-shot TTS backend into a streaming one
pub struct StreamAdapter {
    wrapped: Arc<dyn TtsBackend>,
    tokenizer: SentenceTokenizer,
    pacer: SentenceStreamPacer,
    config: StreamAdapterConfig,
    observer: Option<Arc<dyn MetricsObserver>>,
}

impl StreamAdapter {
    pub fn new(wrapped: Arc<dyn TtsBackend>, config: StreamAdapterConfig) -> Self {
        Self {
            tokenizer: SentenceTokenizer::new(config.sentence.clone()),
            pacer: SentenceStreamPacer::new(config.pacer.clone()),
            wrapped,
            config,
            observer: None,
        }
    }

    /// Report per-sentence synthesis metrics to `observer`
    pub fn with_metrics_observer(mut self, observer: Arc<dyn MetricsObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &StreamAdapterConfig {
        &self.config
    }

    pub fn wrapped(&self) -> &Arc<dyn TtsBackend> {
        &self.wrapped
    }

    /// Open a streaming synthesis request
    ///
    /// Returns the input handle and the stream to `run` against an emitter.
    pub fn stream<R>(
        &self,
        resolver: R,
        options: StreamOptions,
    ) -> (StreamInputSender, SynthesizeStream<R>)
    where
        R: TagResolver,
    {
        let (tx, rx) = mpsc::channel(self.config.input_buffer.max(1));
        tracing::info!(
            backend = self.wrapped.label(),
            words_per_sec = options.words_per_sec,
            pacing = self.pacer.is_enabled(),
            "Opening synthesis stream"
        );

        let stream = SynthesizeStream {
            wrapped: self.wrapped.clone(),
            tokenizer: self.tokenizer.clone(),
            pacer: self.pacer.clone(),
            observer: self.observer.clone(),
            tags: self.config.tags.clone(),
            mime_type: self.config.mime_type.clone(),
            conn_options: self.config.connect.without_retries(),
            wrapped_conn_options: options.conn_options,
            words_per_sec: options.words_per_sec,
            resolver,
            input: rx,
            state: Arc::new(Mutex::new(AdapterState::Idle)),
        };
        (StreamInputSender { tx }, stream)
    }
}

#[async_trait::async_trait]
impl TtsBackend for StreamAdapter {
    /// One-shot passthrough: no segmentation, no directive handling
    async fn synthesize(&self, text: &str, conn_options: &ConnectOptions) -> Result<AudioStream> {
        self.wrapped.synthesize(text, conn_options).await
    }

    fn sample_rate(&self) -> u32 {
        self.wrapped.sample_rate()
    }

    fn num_channels(&self) -> u16 {
        self.wrapped.num_channels()
    }

    fn capabilities(&self) -> TtsCapabilities {
        TtsCapabilities {
            streaming: true,
            aligned_transcript: true,
        }
    }

    fn label(&self) -> &str {
        self.wrapped.label()
    }

    fn prewarm(&self) {
        self.wrapped.prewarm();
    }
}

/// Input handle of a synthesis request
///
/// Dropping it (or calling `end_input`) closes the input.
#[derive(Debug, Clone)]
pub struct StreamInputSender {
    tx: mpsc::Sender<StreamInput>,
}

impl StreamInputSender {
    /// Queue a text chunk; waits while the input buffer is full
    pub async fn push_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(StreamInput::Text(text.into())).await
    }

    /// Queue a flush marker
    pub async fn flush(&self) -> Result<()> {
        self.send(StreamInput::Flush).await
    }

    /// Close the input
    pub fn end_input(self) {}

    /// The request stopped listening (finished, failed or cancelled)
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, item: StreamInput) -> Result<()> {
        self.tx
            .send(item)
            .await
            .map_err(|_| PipelineError::ChannelClosed.into())
    }
}

/// A streaming synthesis request
pub struct SynthesizeStream<R> {
    wrapped: Arc<dyn TtsBackend>,
    tokenizer: SentenceTokenizer,
    pacer: SentenceStreamPacer,
    observer: Option<Arc<dyn MetricsObserver>>,
    tags: TagTimingConfig,
    mime_type: String,
    conn_options: ConnectOptions,
    wrapped_conn_options: ConnectOptions,
    words_per_sec: f64,
    resolver: R,
    input: mpsc::Receiver<StreamInput>,
    state: Arc<Mutex<AdapterState>>,
}

/// Marks the request closed if `run` is dropped while active
struct StateGuard {
    state: Arc<Mutex<AdapterState>>,
    request_id: String,
}

impl StateGuard {
    fn set(&self, next: AdapterState) {
        *self.state.lock() = next;
    }
}

impl Drop for StateGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.is_active() {
            tracing::warn!(request_id = %self.request_id, "Synthesis stream cancelled");
            *state = AdapterState::Closed;
        }
    }
}

impl<R: TagResolver> SynthesizeStream<R> {
    /// Options of the streaming layer itself (never retries)
    pub fn conn_options(&self) -> ConnectOptions {
        self.conn_options
    }

    pub fn state(&self) -> AdapterState {
        *self.state.lock()
    }

    /// Shared view of the state, readable after `run` consumed the stream
    pub fn state_handle(&self) -> Arc<Mutex<AdapterState>> {
        self.state.clone()
    }

    /// Drive the request to completion
    ///
    /// On success the emitter's segment is flushed (ending it is up to the
    /// caller). On failure audio already pushed stays unflushed.
    pub async fn run(self, emitter: Arc<dyn AudioEmitter>) -> Result<()> {
        let SynthesizeStream {
            wrapped,
            tokenizer,
            pacer,
            observer,
            tags,
            mime_type,
            wrapped_conn_options,
            words_per_sec,
            resolver,
            mut input,
            state,
            ..
        } = self;

        let request_id = short_id("REQ_");
        let guard = StateGuard {
            state,
            request_id: request_id.clone(),
        };

        emitter.initialize(EmitterOptions {
            request_id: request_id.clone(),
            sample_rate: wrapped.sample_rate(),
            num_channels: wrapped.num_channels(),
            mime_type,
            stream: true,
        })?;
        let segment_id = short_id("SEG_");
        emitter.start_segment(&segment_id)?;

        let (mut sentences, tokens) = tokenizer.stream();
        let tokens = pacer.wrap(tokens, emitter.clone());
        guard.set(AdapterState::Streaming);
        tracing::info!(
            request_id = %request_id,
            segment_id = %segment_id,
            "Synthesis stream started"
        );

        let synthesis = SynthesisUnit {
            wrapped: wrapped.as_ref(),
            resolver: &resolver,
            emitter: emitter.as_ref(),
            observer: observer.as_deref(),
            conn_options: &wrapped_conn_options,
            request_id: &request_id,
            segment_id: &segment_id,
        };
        let engine = TagTimingEngine::new(tags).with_words_per_sec(words_per_sec);

        let result = tokio::try_join!(
            forward_input(&mut input, &mut sentences, &guard),
            synthesis.run(tokens, engine),
        );
        sentences.close();

        match result {
            Ok((_, sentence_count)) => {
                emitter.flush()?;
                guard.set(AdapterState::Closed);
                tracing::info!(
                    request_id = %request_id,
                    segment_id = %segment_id,
                    sentences = sentence_count,
                    "Synthesis stream completed"
                );
                Ok(())
            }
            Err(e) => {
                guard.set(AdapterState::Error);
                tracing::error!(request_id = %request_id, error = %e, "Synthesis stream failed");
                Err(e)
            }
        }
    }
}

/// Forward unit: sole writer of the sentence stream
async fn forward_input(
    input: &mut mpsc::Receiver<StreamInput>,
    sentences: &mut SentenceStream,
    guard: &StateGuard,
) -> Result<()> {
    while let Some(item) = input.recv().await {
        match item {
            StreamInput::Text(text) => sentences.push_text(&text)?,
            StreamInput::Flush => sentences.flush()?,
        }
    }
    sentences.end_input()?;

    let mut state = guard.state.lock();
    if *state == AdapterState::Streaming {
        *state = AdapterState::Draining;
    }
    tracing::debug!(request_id = %guard.request_id, "Input closed");
    Ok(())
}

/// Synthesis unit: sole reader of the sentence stream
struct SynthesisUnit<'a, R: ?Sized> {
    wrapped: &'a dyn TtsBackend,
    resolver: &'a R,
    emitter: &'a dyn AudioEmitter,
    observer: Option<&'a dyn MetricsObserver>,
    conn_options: &'a ConnectOptions,
    request_id: &'a str,
    segment_id: &'a str,
}

impl<'a, R: TagResolver + ?Sized> SynthesisUnit<'a, R> {
    /// Returns the number of sentences synthesized
    async fn run(&self, mut tokens: TokenStream, mut engine: TagTimingEngine) -> Result<usize> {
        let mut count = 0;
        while let Some(token) = tokens.next().await {
            let resolved = engine.resolve_token(&token.text, self.resolver).await?;
            if resolved.is_empty() {
                tracing::trace!(request_id = %self.request_id, "Sentence has nothing to speak");
                continue;
            }

            let transcript = TimedString::new(resolved.text.clone(), resolved.start_time);
            self.emitter.push_timed_transcript(transcript)?;
            self.synthesize_sentence(&resolved.text, &mut engine).await?;
            count += 1;
        }
        Ok(count)
    }

    async fn synthesize_sentence(&self, text: &str, engine: &mut TagTimingEngine) -> Result<()> {
        tracing::debug!(
            request_id = %self.request_id,
            chars = text.len(),
            start_time = engine.playback(),
            "Synthesizing sentence"
        );

        let started = Instant::now();
        let mut audio = self.wrapped.synthesize(text, self.conn_options).await?;
        let mut ttfb = None;
        let mut audio_duration = 0.0;
        let mut backend_request_id = None;

        while let Some(chunk) = audio.next().await {
            let chunk = chunk?;
            ttfb.get_or_insert_with(|| started.elapsed().as_secs_f64());
            backend_request_id.get_or_insert_with(|| chunk.request_id.clone());

            let duration = chunk.frame.duration();
            self.emitter.push(chunk.frame.data())?;
            engine.advance(duration);
            audio_duration += duration;
        }

        if let Some(observer) = self.observer {
            observer.on_tts_metrics(&TtsMetrics {
                label: self.wrapped.label().to_string(),
                request_id: backend_request_id.unwrap_or_else(|| self.request_id.to_string()),
                segment_id: Some(self.segment_id.to_string()),
                timestamp: Utc::now(),
                ttfb: ttfb.unwrap_or(0.0),
                duration: started.elapsed().as_secs_f64(),
                audio_duration,
                cancelled: false,
                characters_count: text.chars().count(),
                streamed: false,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BufferedAudioEmitter, SilenceTtsBackend};
    use speechflow_core::NoopTagResolver;

    fn adapter() -> StreamAdapter {
        StreamAdapter::new(
            Arc::new(SilenceTtsBackend::new(16000)),
            StreamAdapterConfig::default(),
        )
    }

    #[test]
    fn test_capabilities_and_format() {
        let adapter = adapter();
        assert_eq!(
            adapter.capabilities(),
            TtsCapabilities {
                streaming: true,
                aligned_transcript: true
            }
        );
        assert_eq!(adapter.sample_rate(), 16000);
        assert_eq!(adapter.num_channels(), 1);
        assert_eq!(adapter.label(), "silence");
    }

    #[test]
    fn test_stream_never_retries() {
        let adapter = adapter();
        let options = StreamOptions::from_config(adapter.config());
        let (_input, stream) = adapter.stream(NoopTagResolver, options);
        assert_eq!(stream.conn_options().max_retry, 0);
        assert_eq!(stream.conn_options().timeout_ms, ConnectOptions::default().timeout_ms);
        assert_eq!(stream.state(), AdapterState::Idle);
    }

    #[tokio::test]
    async fn test_run_with_silence_backend() {
        let adapter = adapter();
        let options = StreamOptions::from_config(adapter.config());
        let (input, stream) = adapter.stream(NoopTagResolver, options);
        let state = stream.state_handle();
        let emitter = Arc::new(BufferedAudioEmitter::new());

        input.push_text("Short. Then a longer sentence follows here.").await.unwrap();
        input.end_input();
        stream.run(emitter.clone()).await.unwrap();

        assert_eq!(*state.lock(), AdapterState::Closed);
        assert_eq!(emitter.flush_count(), 1);
        assert_eq!(emitter.transcripts().len(), 1);
        assert!(emitter.flushed_bytes() > 0);

        let options = emitter.options().unwrap();
        assert!(options.request_id.starts_with("REQ_"));
        assert_eq!(options.mime_type, "audio/pcm");
        assert!(options.stream);
    }

    #[tokio::test]
    async fn test_passthrough_synthesize() {
        let adapter = adapter();
        let frames: Vec<_> = adapter
            .synthesize("ab", &ConnectOptions::default())
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(frames.len(), 1);
    }
}
