use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::ai::DEFAULT_MAX_AI_TURNS;
use crate::audio::AudioSource;
use crate::nats::NatsClient;
use crate::session::SessionConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub interview: InterviewConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    pub url: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
        }
    }
}

/// Turn-taking parameters applied to every new session
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    pub idle_timeout_ms: u64,
    pub keep_alive_secs: u64,
    pub max_ai_turns: usize,
    pub microphone: MicrophoneSetting,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 10_000,
            keep_alive_secs: 30,
            max_ai_turns: DEFAULT_MAX_AI_TURNS,
            microphone: MicrophoneSetting::Nats,
        }
    }
}

/// Where candidate audio comes from: `"nats"` or `"file:<path.wav>"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum MicrophoneSetting {
    /// Frames published by the candidate's client
    #[default]
    Nats,
    /// Replay a WAV file (demos and load tests)
    File(String),
}

impl TryFrom<String> for MicrophoneSetting {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.trim() {
            "nats" => Ok(MicrophoneSetting::Nats),
            other => match other.strip_prefix("file:") {
                Some(path) if !path.is_empty() => Ok(MicrophoneSetting::File(path.to_string())),
                _ => Err(format!(
                    "unknown microphone '{}', expected \"nats\" or \"file:<path>\"",
                    value
                )),
            },
        }
    }
}

impl MicrophoneSetting {
    /// Backend source for one session on `client`
    pub fn source(&self, client: Arc<NatsClient>) -> AudioSource {
        match self {
            MicrophoneSetting::Nats => AudioSource::Nats(client),
            MicrophoneSetting::File(path) => AudioSource::File(path.clone()),
        }
    }
}

impl InterviewConfig {
    /// Session config carrying these parameters and a fresh interview id
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            idle_timeout: Duration::from_millis(self.idle_timeout_ms),
            keep_alive_interval: Duration::from_secs(self.keep_alive_secs),
            max_ai_turns: self.max_ai_turns,
            ..SessionConfig::default()
        }
    }
}

impl Config {
    /// Load `path` (any format the `config` crate detects) overlaid with
    /// `LOQA__SECTION__KEY` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("LOQA").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
