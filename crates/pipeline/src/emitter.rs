//! In-memory audio emitter
//!
//! Collects everything a synthesis request produces. Useful for tests and
//! for callers that post-process a whole response before playback.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use speechflow_core::{
    AudioEmitter, EmitterOptions, PipelineError, Result, TimedString, BYTES_PER_SAMPLE,
};

/// One audio segment as recorded by [`BufferedAudioEmitter`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmittedSegment {
    pub id: String,
    /// Audio released by `flush`
    pub flushed: Vec<u8>,
    /// Audio pushed since the last flush
    pub pending: Vec<u8>,
    pub transcripts: Vec<TimedString>,
    pub ended: bool,
}

#[derive(Debug, Default)]
struct EmitterState {
    options: Option<EmitterOptions>,
    segments: Vec<EmittedSegment>,
    /// Index of the open segment
    current: Option<usize>,
    pushed_bytes: usize,
    first_push: Option<Instant>,
    flush_count: usize,
}

impl EmitterState {
    fn options(&self) -> Result<&EmitterOptions> {
        self.options
            .as_ref()
            .ok_or_else(|| PipelineError::NotInitialized.into())
    }

    fn current_segment(&mut self) -> Result<&mut EmittedSegment> {
        self.options()?;
        let index = self
            .current
            .ok_or_else(|| PipelineError::Emitter("no active segment".to_string()))?;
        Ok(&mut self.segments[index])
    }
}

/// Thread-safe emitter that buffers audio and transcripts in memory
#[derive(Debug, Default)]
pub struct BufferedAudioEmitter {
    state: Mutex<EmitterState>,
}

impl BufferedAudioEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options passed to `initialize`
    pub fn options(&self) -> Option<EmitterOptions> {
        self.state.lock().options.clone()
    }

    pub fn segments(&self) -> Vec<EmittedSegment> {
        self.state.lock().segments.clone()
    }

    /// All transcripts across segments, in push order
    pub fn transcripts(&self) -> Vec<TimedString> {
        self.state
            .lock()
            .segments
            .iter()
            .flat_map(|s| s.transcripts.iter().cloned())
            .collect()
    }

    pub fn flush_count(&self) -> usize {
        self.state.lock().flush_count
    }

    /// Bytes pushed since the last flush of the open segment
    pub fn pending_bytes(&self) -> usize {
        let state = self.state.lock();
        state
            .current
            .map(|i| state.segments[i].pending.len())
            .unwrap_or(0)
    }

    /// Bytes released by flushes across all segments
    pub fn flushed_bytes(&self) -> usize {
        self.state.lock().segments.iter().map(|s| s.flushed.len()).sum()
    }
}

impl AudioEmitter for BufferedAudioEmitter {
    fn initialize(&self, options: EmitterOptions) -> Result<()> {
        let mut state = self.state.lock();
        if state.options.is_some() {
            return Err(PipelineError::Emitter("already initialized".to_string()).into());
        }
        tracing::debug!(
            request_id = %options.request_id,
            sample_rate = options.sample_rate,
            num_channels = options.num_channels,
            "Audio emitter initialized"
        );
        state.options = Some(options);
        Ok(())
    }

    fn start_segment(&self, segment_id: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.options()?;
        if state.current.is_some() {
            return Err(PipelineError::Emitter("segment already open".to_string()).into());
        }
        state.segments.push(EmittedSegment {
            id: segment_id.to_string(),
            ..Default::default()
        });
        state.current = Some(state.segments.len() - 1);
        Ok(())
    }

    fn push(&self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        state.current_segment()?.pending.extend_from_slice(data);
        state.pushed_bytes += data.len();
        if !data.is_empty() {
            state.first_push.get_or_insert_with(Instant::now);
        }
        Ok(())
    }

    fn push_timed_transcript(&self, transcript: TimedString) -> Result<()> {
        let mut state = self.state.lock();
        state.current_segment()?.transcripts.push(transcript);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.options()?;
        if let Some(index) = state.current {
            let segment = &mut state.segments[index];
            let pending = std::mem::take(&mut segment.pending);
            segment.flushed.extend(pending);
        }
        state.flush_count += 1;
        Ok(())
    }

    fn end_segment(&self) -> Result<()> {
        let mut state = self.state.lock();
        let segment = state.current_segment()?;
        let pending = std::mem::take(&mut segment.pending);
        segment.flushed.extend(pending);
        segment.ended = true;
        state.current = None;
        Ok(())
    }

    fn pushed_duration(&self) -> Duration {
        let state = self.state.lock();
        let Some(options) = state.options.as_ref() else {
            return Duration::ZERO;
        };
        let bytes_per_sec =
            options.sample_rate as usize * options.num_channels.max(1) as usize * BYTES_PER_SAMPLE;
        if bytes_per_sec == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(state.pushed_bytes as f64 / bytes_per_sec as f64)
    }

    fn since_first_push(&self) -> Option<Duration> {
        self.state.lock().first_push.map(|at| at.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> EmitterOptions {
        EmitterOptions {
            request_id: "REQ_test".to_string(),
            sample_rate: 16000,
            num_channels: 1,
            mime_type: "audio/pcm".to_string(),
            stream: true,
        }
    }

    #[test]
    fn test_requires_initialize() {
        let emitter = BufferedAudioEmitter::new();
        let err = emitter.start_segment("SEG_1").unwrap_err();
        assert_eq!(err.as_pipeline(), Some(&PipelineError::NotInitialized));
        assert!(emitter.push(&[0, 0]).is_err());
        assert_eq!(emitter.pushed_duration(), Duration::ZERO);
    }

    #[test]
    fn test_double_initialize() {
        let emitter = BufferedAudioEmitter::new();
        emitter.initialize(options()).unwrap();
        assert!(matches!(
            emitter.initialize(options()).unwrap_err().as_pipeline(),
            Some(PipelineError::Emitter(_))
        ));
    }

    #[test]
    fn test_push_without_segment() {
        let emitter = BufferedAudioEmitter::new();
        emitter.initialize(options()).unwrap();
        assert!(matches!(
            emitter.push(&[0, 0]).unwrap_err().as_pipeline(),
            Some(PipelineError::Emitter(_))
        ));
    }

    #[test]
    fn test_pending_until_flush() {
        let emitter = BufferedAudioEmitter::new();
        emitter.initialize(options()).unwrap();
        emitter.start_segment("SEG_1").unwrap();
        emitter.push(&[0u8; 3200]).unwrap();
        emitter
            .push_timed_transcript(TimedString::new("hi", 0.0))
            .unwrap();

        assert_eq!(emitter.pending_bytes(), 3200);
        assert_eq!(emitter.flushed_bytes(), 0);
        assert_eq!(emitter.pushed_duration(), Duration::from_millis(100));

        emitter.flush().unwrap();
        assert_eq!(emitter.pending_bytes(), 0);
        assert_eq!(emitter.flushed_bytes(), 3200);
        assert_eq!(emitter.flush_count(), 1);

        emitter.end_segment().unwrap();
        let segments = emitter.segments();
        assert_eq!(segments.len(), 1);
        assert!(segments[0].ended);
        assert_eq!(emitter.transcripts(), vec![TimedString::new("hi", 0.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_since_first_push() {
        let emitter = BufferedAudioEmitter::new();
        emitter.initialize(options()).unwrap();
        emitter.start_segment("SEG_1").unwrap();
        assert_eq!(emitter.since_first_push(), None);

        emitter.push(&[]).unwrap();
        assert_eq!(emitter.since_first_push(), None);

        emitter.push(&[0u8; 320]).unwrap();
        tokio::time::advance(Duration::from_millis(750)).await;
        emitter.push(&[0u8; 320]).unwrap();
        assert_eq!(emitter.since_first_push(), Some(Duration::from_millis(750)));
    }
}
