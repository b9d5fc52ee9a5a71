//! Incremental sentence stream
//!
//! `SentenceStream` is the writer half (push/flush/end) and
//! `SentenceTokens` the reader half. They are connected by an unbounded
//! ordered channel, so the two halves can live in different workers without
//! sharing a buffer.

use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use speechflow_config::SentenceTokenizerConfig;
use speechflow_core::{short_id, PipelineError, Result};

use super::markup::protect_markup;
use super::segmenter::{split_sentences, Sentence};

/// A finalized sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceToken {
    pub text: String,
    /// Changes after every flush that emitted text
    pub segment_id: String,
}

/// Sentence tokenizer
#[derive(Debug, Clone, Default)]
pub struct SentenceTokenizer {
    config: SentenceTokenizerConfig,
}

impl SentenceTokenizer {
    pub fn new(config: SentenceTokenizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SentenceTokenizerConfig {
        &self.config
    }

    /// Segment a complete text
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.split(text).into_iter().map(|s| s.text).collect()
    }

    fn split(&self, text: &str) -> Vec<Sentence> {
        split_sentences(text, self.config.min_sentence_len, self.config.retain_format)
    }

    /// Open an incremental stream
    pub fn stream(&self) -> (SentenceStream, SentenceTokens) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stream = SentenceStream {
            tokenizer: self.clone(),
            in_buf: String::new(),
            out_buf: String::new(),
            segment_id: short_id(""),
            tx: Some(tx),
        };
        (
            stream,
            SentenceTokens {
                rx: UnboundedReceiverStream::new(rx),
            },
        )
    }
}

/// Writer half of an incremental sentence stream
#[derive(Debug)]
pub struct SentenceStream {
    tokenizer: SentenceTokenizer,
    in_buf: String,
    out_buf: String,
    segment_id: String,
    tx: Option<mpsc::UnboundedSender<SentenceToken>>,
}

impl SentenceStream {
    /// Append raw text
    ///
    /// Segmentation only starts once enough context is buffered, and the
    /// last sentence found is always held back since more text may extend it.
    /// Sentences reaching into a markup element whose closing tag has not
    /// arrived yet are held back too, until the element closes or a flush.
    pub fn push_text(&mut self, text: &str) -> Result<()> {
        self.ensure_open()?;
        self.in_buf.push_str(text);

        let config = self.tokenizer.config();
        if self.in_buf.chars().count() < config.stream_context_len {
            return Ok(());
        }

        loop {
            let open_at = protect_markup(&self.in_buf).unclosed_tag();
            let mut sentences = self.tokenizer.split(&self.in_buf);
            if sentences.len() <= 1 {
                break;
            }
            let first = sentences.swap_remove(0);
            if open_at.is_some_and(|at| first.end > at) {
                break;
            }

            if !self.out_buf.is_empty() && !config.retain_format {
                self.out_buf.push(' ');
            }
            self.out_buf.push_str(&first.text);

            if self.out_buf.chars().count() >= config.min_sentence_len {
                let token = std::mem::take(&mut self.out_buf);
                self.emit(token)?;
            }

            self.in_buf.replace_range(..first.end, "");
        }

        tracing::trace!(
            buffered = self.in_buf.len(),
            pending = self.out_buf.len(),
            "Sentence stream buffered text"
        );
        Ok(())
    }

    /// Emit whatever is buffered as a sentence, however short
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;

        if !self.in_buf.is_empty() || !self.out_buf.is_empty() {
            let rest = self.tokenizer.split(&self.in_buf);
            if !rest.is_empty() {
                let sep = if self.tokenizer.config().retain_format { "" } else { " " };
                if !self.out_buf.is_empty() {
                    self.out_buf.push_str(sep);
                }
                let joined = rest.into_iter().map(|s| s.text).collect::<Vec<_>>().join(sep);
                self.out_buf.push_str(&joined);
            }

            let token = std::mem::take(&mut self.out_buf);
            if !token.trim().is_empty() {
                self.emit(token)?;
                self.segment_id = short_id("");
            }
        }

        self.in_buf.clear();
        self.out_buf.clear();
        Ok(())
    }

    /// No more text will be pushed
    pub fn end_input(&mut self) -> Result<()> {
        self.flush()?;
        self.close();
        Ok(())
    }

    /// Close the stream; the reader ends once it has drained
    pub fn close(&mut self) {
        if self.tx.take().is_some() {
            tracing::debug!(segment_id = %self.segment_id, "Sentence stream closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(PipelineError::StreamClosed.into());
        }
        Ok(())
    }

    fn emit(&self, text: String) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(PipelineError::StreamClosed)?;
        tracing::trace!(segment_id = %self.segment_id, chars = text.len(), "Sentence emitted");
        tx.send(SentenceToken {
            text,
            segment_id: self.segment_id.clone(),
        })
        .map_err(|_| PipelineError::ChannelClosed)?;
        Ok(())
    }
}

impl Drop for SentenceStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Reader half of an incremental sentence stream
#[derive(Debug)]
pub struct SentenceTokens {
    rx: UnboundedReceiverStream<SentenceToken>,
}

impl SentenceTokens {
    /// Next sentence, `None` once the writer closed and everything was read
    pub async fn recv(&mut self) -> Option<SentenceToken> {
        self.rx.next().await
    }
}

impl Stream for SentenceTokens {
    type Item = SentenceToken;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}
