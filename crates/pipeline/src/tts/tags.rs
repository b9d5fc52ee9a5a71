//! Directive timing
//!
//! Places each inline directive of a sentence on the playback timeline:
//!
//! ```text
//! trigger = elapsed + words_before / words_per_sec + pause_offset
//! ```
//!
//! `elapsed` follows the audio synthesized so far (minus guards),
//! `words_before` counts the spoken words preceding the directive in the
//! same sentence and `pause_offset` accumulates pause directives.

use std::time::Duration;

use speechflow_config::TagTimingConfig;
use speechflow_core::{Error, PipelineError, Result, TagResolver};
use speechflow_text_processing::{
    clean_text_span, parse_pause, split_directives, word_count, TokenPart,
};

/// A resolved directive
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub raw_content: String,
    /// 1-based, increasing across the whole request
    pub index: u64,
    /// Seconds from request start
    pub trigger_time: f64,
    pub pause: Option<Duration>,
}

/// Synthesis input produced from one sentence
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToken {
    /// Cleaned text with directive replacements, empty if nothing to speak
    pub text: String,
    pub directives: Vec<Directive>,
    /// Playback offset of the sentence's first audio
    pub start_time: f64,
}

impl ResolvedToken {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Per-request timing state
#[derive(Debug, Clone)]
pub struct TagTimingEngine {
    config: TagTimingConfig,
    words_per_sec: f64,
    /// Timing baseline, seconds (guard-adjusted)
    elapsed: f64,
    /// Audio actually pushed, seconds
    playback: f64,
    tag_index: u64,
    pause_offset: f64,
}

impl TagTimingEngine {
    pub fn new(config: TagTimingConfig) -> Self {
        let words_per_sec = config.words_per_sec;
        Self {
            config,
            words_per_sec,
            elapsed: 0.0,
            playback: 0.0,
            tag_index: 0,
            pause_offset: 0.0,
        }
    }

    /// Override the speaking rate for this request
    pub fn with_words_per_sec(mut self, words_per_sec: f64) -> Self {
        self.words_per_sec = words_per_sec;
        self
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn playback(&self) -> f64 {
        self.playback
    }

    /// Directives resolved so far
    pub fn tag_index(&self) -> u64 {
        self.tag_index
    }

    pub fn pause_offset(&self) -> f64 {
        self.pause_offset
    }

    /// Account for a synthesized audio frame
    pub fn advance(&mut self, frame_duration: f64) {
        self.elapsed += frame_duration;
        self.playback += frame_duration;
    }

    fn words_to_secs(&self, words: usize) -> f64 {
        if self.words_per_sec > 0.0 {
            words as f64 / self.words_per_sec
        } else {
            0.0
        }
    }

    /// Resolve every directive of `token` and build the synthesis text
    ///
    /// Resolver failures abort the token and are reported as
    /// `TagResolution` errors.
    pub async fn resolve_token<R>(&mut self, token: &str, resolver: &R) -> Result<ResolvedToken>
    where
        R: TagResolver + ?Sized,
    {
        let parts = split_directives(token);
        let total = parts.len();
        let mut pieces: Vec<String> = Vec::with_capacity(total);
        let mut directives = Vec::new();
        let mut words = 0usize;

        for (i, part) in parts.into_iter().enumerate() {
            match part {
                TokenPart::Text(text) => {
                    let clean = clean_text_span(text);
                    if !clean.is_empty() {
                        words += word_count(&clean);
                        pieces.push(clean);
                    }
                }
                TokenPart::Directive(raw) => {
                    // The last directive is always followed by exactly one text part
                    let guard = self.config.last_tag_guard();
                    if i + 2 == total && self.elapsed > guard {
                        self.elapsed -= guard;
                    }

                    self.tag_index += 1;
                    let trigger_time =
                        self.elapsed + self.words_to_secs(words) + self.pause_offset;

                    let replacement = resolver
                        .resolve(raw, self.tag_index, trigger_time)
                        .await
                        .map_err(|e| match e {
                            Error::Pipeline(PipelineError::TagResolution(msg)) => {
                                Error::tag_resolution(msg)
                            }
                            other => Error::tag_resolution(other.to_string()),
                        })?;

                    let pause = parse_pause(raw, &self.config.pause_tag_prefix).or_else(|| {
                        replacement
                            .as_deref()
                            .and_then(|r| parse_pause(r, &self.config.pause_tag_prefix))
                    });

                    tracing::debug!(
                        tag_index = self.tag_index,
                        trigger_time,
                        directive = raw,
                        replaced = replacement.as_deref().map_or(false, |r| !r.is_empty()),
                        "Resolved directive"
                    );

                    if let Some(text) = replacement.filter(|r| !r.is_empty()) {
                        pieces.push(format!(" {} ", text));
                    }
                    if let Some(pause) = pause {
                        self.pause_offset += pause.as_secs_f64();
                    }

                    directives.push(Directive {
                        raw_content: raw.to_string(),
                        index: self.tag_index,
                        trigger_time,
                        pause,
                    });
                }
            }
        }

        Ok(ResolvedToken {
            text: pieces.join(" "),
            directives,
            start_time: self.playback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use speechflow_core::{FnTagResolver, NoopTagResolver};
    use std::sync::Arc;

    fn engine(words_per_sec: f64) -> TagTimingEngine {
        TagTimingEngine::new(TagTimingConfig::default()).with_words_per_sec(words_per_sec)
    }

    type Calls = Arc<Mutex<Vec<(String, u64, f64)>>>;

    fn recording(replacement: Option<&'static str>) -> (impl TagResolver, Calls) {
        let calls: Calls = Arc::default();
        let sink = calls.clone();
        let resolver = FnTagResolver::new(move |raw: String, index: u64, time: f64| {
            sink.lock().push((raw, index, time));
            async move { Ok::<_, Error>(replacement.map(str::to_string)) }
        });
        (resolver, calls)
    }

    #[tokio::test]
    async fn test_pause_directive_timing() {
        let mut engine = engine(2.0);
        let (resolver, calls) = recording(None);

        let token = engine
            .resolve_token(r#"Hello {<trl-break duration="500ms">} world"#, &resolver)
            .await
            .unwrap();

        assert_eq!(token.text, "Hello world");
        assert_eq!(token.directives.len(), 1);
        assert!((token.directives[0].trigger_time - 0.5).abs() < 1e-9);
        assert_eq!(token.directives[0].pause, Some(Duration::from_millis(500)));
        assert!((engine.pause_offset() - 0.5).abs() < 1e-9);

        let calls = calls.lock();
        assert_eq!(calls[0].0, r#"<trl-break duration="500ms">"#);
        assert_eq!(calls[0].1, 1);
    }

    #[tokio::test]
    async fn test_pause_accumulates_within_and_across_tokens() {
        let mut engine = engine(1.0);
        let (resolver, calls) = recording(None);

        engine
            .resolve_token(
                r#"One {<trl-break duration="1s">} two {x} three"#,
                &resolver,
            )
            .await
            .unwrap();
        engine.resolve_token("{y} four", &resolver).await.unwrap();

        let calls = calls.lock();
        let times: Vec<f64> = calls.iter().map(|c| c.2).collect();
        // 1 word; 2 words + 1s pause; 0 words + carried 1s pause
        assert_eq!(times, vec![1.0, 3.0, 1.0]);
        let indices: Vec<u64> = calls.iter().map(|c| c.1).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_last_directive_guard() {
        let mut engine = engine(2.0);
        let (resolver, calls) = recording(None);

        engine.advance(1.0);
        engine.resolve_token("{a} Hi {b} there", &resolver).await.unwrap();

        let calls = calls.lock();
        // first directive uses the raw baseline, the last one is pulled back
        assert!((calls[0].2 - 1.0).abs() < 1e-9);
        assert!((calls[1].2 - 1.4).abs() < 1e-9);
        assert!((engine.elapsed() - 0.9).abs() < 1e-9);
        assert!((engine.playback() - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_guard_not_applied_near_start() {
        let mut engine = engine(2.0);
        engine.advance(0.05);
        engine
            .resolve_token("Hi {a}", &NoopTagResolver)
            .await
            .unwrap();
        assert!((engine.elapsed() - 0.05).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_replacement_is_spoken_and_pause_read_from_it() {
        let mut engine = engine(2.0);
        let (resolver, _) = recording(Some(r#"<trl-break duration="2s">"#));

        let token = engine.resolve_token("Wait {pause} now", &resolver).await.unwrap();
        assert_eq!(token.text, r#"Wait  <trl-break duration="2s">  now"#);
        assert_eq!(token.directives[0].pause, Some(Duration::from_secs(2)));
        assert!((engine.pause_offset() - 2.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_directive_only_token_is_empty() {
        let mut engine = engine(2.0);
        let token = engine.resolve_token("{wave}", &NoopTagResolver).await.unwrap();
        assert!(token.is_empty());
        assert_eq!(token.directives.len(), 1);
        assert_eq!(engine.tag_index(), 1);
    }

    #[tokio::test]
    async fn test_stray_braces_removed() {
        let mut engine = engine(2.0);
        let token = engine.resolve_token("a } b {", &NoopTagResolver).await.unwrap();
        assert_eq!(token.text, "a  b");
        assert!(token.directives.is_empty());
    }

    #[tokio::test]
    async fn test_resolver_error_maps_to_tag_resolution() {
        let mut engine = engine(2.0);
        let resolver = FnTagResolver::new(|_: String, _: u64, _: f64| async move {
            Err::<Option<String>, _>(Error::other("backend gone"))
        });
        let err = engine.resolve_token("Hi {x}", &resolver).await.unwrap_err();
        assert!(matches!(
            err.as_pipeline(),
            Some(PipelineError::TagResolution(msg)) if msg == "backend gone"
        ));
    }

    #[tokio::test]
    async fn test_zero_rate_ignores_words() {
        let mut engine = engine(0.0);
        let (resolver, calls) = recording(None);
        engine.resolve_token("many words here {x}", &resolver).await.unwrap();
        assert_eq!(calls.lock()[0].2, 0.0);
    }

    #[tokio::test]
    async fn test_start_time_tracks_playback() {
        let mut engine = engine(2.0);
        engine.advance(0.75);
        let token = engine.resolve_token("Hi", &NoopTagResolver).await.unwrap();
        assert!((token.start_time - 0.75).abs() < 1e-9);
    }
}
