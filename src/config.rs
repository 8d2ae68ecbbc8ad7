use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::audio::transform::TARGET_SAMPLE_RATE;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub stt: SttOptions,
    #[serde(default)]
    pub streaming: StreamingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base endpoint of the speech service.
    pub url: String,
    /// API key, sent in the connection handshake payload, never in the URL.
    pub api_key: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "wss://sdk.verbum.ai".to_string(),
            api_key: String::new(),
        }
    }
}

/// Recognition options forwarded to the service as query parameters.
///
/// Optional fields are only serialized when set, so the service applies its
/// own defaults for anything omitted here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SttOptions {
    /// Language of the audio, e.g. "es-MX"
    pub language: String,
    /// Audio encoding; the client always produces PCM
    pub encoding: String,
    /// Declared sample rate; must match the wire format (8000 Hz)
    pub sample_rate: u32,
    /// Profanity handling: "raw", "masked" or "removed"
    pub profanity_filter: Option<String>,
    /// Speaker diarization
    pub diarization: Option<bool>,
    /// Sentiment analysis on final results
    pub analyze_sentiments: Option<bool>,
    /// Translation target languages
    pub translate_to: Vec<String>,
    /// Translation model ("default" or "gpt4.1")
    pub translate_model: Option<String>,
    /// PII categories to redact
    pub redact: Vec<String>,
    /// Custom tags attached to the session for metrics
    pub tags: BTreeMap<String, String>,
}

impl Default for SttOptions {
    fn default() -> Self {
        let mut tags = BTreeMap::new();
        tags.insert("session".to_string(), format!("mic-{}", uuid::Uuid::new_v4()));

        Self {
            language: "en-US".to_string(),
            encoding: "PCM".to_string(),
            sample_rate: TARGET_SAMPLE_RATE,
            profanity_filter: None,
            diarization: None,
            analyze_sentiments: None,
            translate_to: Vec::new(),
            translate_model: None,
            redact: Vec::new(),
            tags,
        }
    }
}

impl SttOptions {
    /// Serializes the options into query pairs: array values become
    /// comma-joined strings, the tags map becomes a JSON string, scalars
    /// their string form. Percent-encoding happens later when the pairs are
    /// appended to the URL. The API key is deliberately absent.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("language".to_string(), self.language.clone()),
            ("encoding".to_string(), self.encoding.clone()),
            ("sampleRate".to_string(), self.sample_rate.to_string()),
        ];

        if let Some(filter) = &self.profanity_filter {
            pairs.push(("profanityFilter".to_string(), filter.clone()));
        }
        if let Some(diarization) = self.diarization {
            pairs.push(("diarization".to_string(), diarization.to_string()));
        }
        if let Some(sentiments) = self.analyze_sentiments {
            pairs.push(("analyzeSentiments".to_string(), sentiments.to_string()));
        }
        if !self.translate_to.is_empty() {
            pairs.push(("translateTo".to_string(), self.translate_to.join(",")));
        }
        if let Some(model) = &self.translate_model {
            pairs.push(("translateModel".to_string(), model.clone()));
        }
        if !self.redact.is_empty() {
            pairs.push(("redact".to_string(), self.redact.join(",")));
        }
        if !self.tags.is_empty() {
            // BTreeMap keeps the serialized key order stable
            let tags = serde_json::to_string(&self.tags).unwrap_or_default();
            pairs.push(("tags".to_string(), tags));
        }

        pairs
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Audio chunk size in bytes; the capture buffer size derives from this
    pub chunk_size: usize,
    /// Pause between connect and capture start, in milliseconds
    pub settle_delay_ms: u64,
    /// Interval of the orchestrator's liveness poll, in milliseconds
    pub liveness_poll_ms: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            settle_delay_ms: 1000,
            liveness_poll_ms: 1000,
        }
    }
}

impl Config {
    /// Load configuration from an optional file, layered with `VERBUM_*`
    /// environment variables (e.g. `VERBUM_SERVER__API_KEY`). Missing
    /// sections fall back to their defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix("VERBUM").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
