use async_trait::async_trait;
use thiserror::Error;

use super::voice::VoiceParams;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech output unavailable")]
    Unavailable,
}

/// Text-to-speech or notification sink.
///
/// `speak` resolves once the utterance has been accepted (or has finished,
/// for blocking backends). It may be called while the host UI is hidden.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    async fn speak(&self, text: &str, voice: &VoiceParams) -> Result<(), SpeechError>;

    /// Stop anything queued or playing. Must return immediately.
    fn cancel_all(&self);
}

/// Writes each yell to the log instead of speaking it.
pub struct LogSpeech;

#[async_trait]
impl SpeechOutput for LogSpeech {
    async fn speak(&self, text: &str, voice: &VoiceParams) -> Result<(), SpeechError> {
        log_warn!(
            "YELL [pitch {:.1} rate {:.1} volume {:.1}]: {text}",
            voice.pitch,
            voice.rate,
            voice.volume
        );
        Ok(())
    }

    fn cancel_all(&self) {}
}
