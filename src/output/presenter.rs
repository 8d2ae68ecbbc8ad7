//! Console rendering of recognition results.
//!
//! Interim results rewrite a single progress line in place; final results
//! print a permanent block. Pure presentation: nothing here feeds back into
//! session state.

use std::io::{self, Write};
use std::sync::Mutex;
use tracing::warn;

use crate::transport::messages::{ResultStatus, SpeechResult};
use crate::transport::ResultHandler;

pub struct Presenter<W: Write + Send> {
    out: Mutex<W>,
}

impl Presenter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> Presenter<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Consumes the presenter and returns the writer. Used by tests to
    /// inspect what was rendered.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn render(&self, out: &mut W, result: &SpeechResult) -> io::Result<()> {
        match result.status {
            ResultStatus::Recognizing => {
                let text = if result.text.is_empty() {
                    "..."
                } else {
                    &result.text
                };
                write!(out, "\rRecognizing: {text}")?;
                out.flush()?;
            }
            ResultStatus::Recognized => {
                writeln!(out)?;
                writeln!(
                    out,
                    "Final result [{}]:",
                    result.message_id.as_deref().unwrap_or("-")
                )?;
                writeln!(out, "  text: \"{}\"", result.text)?;
                match result.confidence {
                    Some(confidence) => writeln!(out, "  confidence: {confidence:.2}")?,
                    None => writeln!(out, "  confidence: n/a")?,
                }
                match result.duration {
                    Some(duration) => writeln!(out, "  duration: {duration}ms")?,
                    None => writeln!(out, "  duration: n/a")?,
                }
                if !result.translations.is_empty() {
                    writeln!(out, "  translations:")?;
                    for translation in &result.translations {
                        writeln!(out, "    {}: \"{}\"", translation.to, translation.text)?;
                    }
                }
                if let Some(sentiment) = &result.sentiment {
                    writeln!(out, "  sentiment: {} ({})", sentiment.label, sentiment.score)?;
                }
                if let Some(redacted) = &result.redacted_text {
                    if *redacted != result.text {
                        writeln!(out, "  redacted: \"{redacted}\"")?;
                    }
                }
                writeln!(out, "{}", "-".repeat(60))?;
            }
        }
        Ok(())
    }
}

impl<W: Write + Send> ResultHandler for Presenter<W> {
    fn on_speech_result(&self, result: &SpeechResult) {
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = self.render(&mut out, result) {
            warn!(error = %e, "failed to write result");
        }
    }

    fn on_unknown_event(&self, event: &str) {
        warn!(event, "ignoring unrecognized event");
    }
}
