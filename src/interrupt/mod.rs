//! Interruption policy and dispatch: pick a line, speak it.

pub mod messages;
pub mod policy;
pub mod speech;
pub mod voice;

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::error::{MonitorError, MonitorResult};
use crate::settings::YellStyle;

pub use messages::MessageBucket;
pub use policy::{decide, should_interrupt, InterruptDecision};
pub use speech::{LogSpeech, SpeechError, SpeechOutput};
pub use voice::VoiceParams;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// A yell that was handed to the speech output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Yell {
    pub bucket: MessageBucket,
    pub text: String,
    pub style: YellStyle,
}

pub struct Dispatcher {
    speech: Arc<dyn SpeechOutput>,
    rng: Mutex<StdRng>,
}

impl Dispatcher {
    pub fn new(speech: Arc<dyn SpeechOutput>) -> Self {
        Self {
            speech,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic template choice, for tests and replays.
    pub fn with_seed(speech: Arc<dyn SpeechOutput>, seed: u64) -> Self {
        Self {
            speech,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn compose(&self, bucket: MessageBucket) -> &'static str {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        bucket.pick(&mut *rng)
    }

    /// Speak one line from `bucket`, interrupting anything already playing.
    pub async fn dispatch(&self, bucket: MessageBucket, style: YellStyle) -> MonitorResult<Yell> {
        let text = self.compose(bucket);
        let voice = VoiceParams::for_style(style);

        self.speech.cancel_all();
        match self.speech.speak(text, &voice).await {
            Ok(()) => {
                log_info!("yelled ({:?}, {}): {text}", bucket, style.as_str());
                Ok(Yell {
                    bucket,
                    text: text.to_string(),
                    style,
                })
            }
            Err(err) => {
                log_warn!("yell dispatch failed: {err}");
                Err(MonitorError::Dispatch(err.to_string()))
            }
        }
    }

    pub fn cancel_all(&self) {
        self.speech.cancel_all();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    /// Speech output that records every call.
    #[derive(Default)]
    pub struct RecordingSpeech {
        pub spoken: Mutex<Vec<(String, VoiceParams)>>,
        pub cancels: AtomicU32,
        pub fail: AtomicBool,
    }

    impl RecordingSpeech {
        pub fn spoken_count(&self) -> usize {
            self.spoken.lock().unwrap().len()
        }

        pub fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl SpeechOutput for RecordingSpeech {
        async fn speak(&self, text: &str, voice: &VoiceParams) -> Result<(), SpeechError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(SpeechError::Unavailable);
            }
            self.spoken.lock().unwrap().push((text.to_string(), *voice));
            Ok(())
        }

        fn cancel_all(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingSpeech;
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn dispatch_speaks_with_style_voice() {
        let speech = Arc::new(RecordingSpeech::default());
        let dispatcher = Dispatcher::with_seed(speech.clone(), 1);

        let yell = dispatcher
            .dispatch(MessageBucket::NotWorking, YellStyle::DrillSergeant)
            .await
            .unwrap();

        let spoken = speech.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].0, yell.text);
        assert_eq!(spoken[0].1, VoiceParams::for_style(YellStyle::DrillSergeant));
        assert!(MessageBucket::NotWorking.templates().contains(&yell.text.as_str()));
        // Previous utterance is cut off first.
        assert_eq!(speech.cancels.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn speech_failure_is_a_dispatch_error() {
        let speech = Arc::new(RecordingSpeech::default());
        speech.set_failing(true);
        let dispatcher = Dispatcher::with_seed(speech.clone(), 1);

        let result = dispatcher.dispatch(MessageBucket::Both, YellStyle::Coach).await;

        assert!(matches!(result, Err(MonitorError::Dispatch(_))));
        assert_eq!(speech.spoken_count(), 0);
    }

    #[test]
    fn seeded_dispatchers_agree() {
        let a = Dispatcher::with_seed(Arc::new(RecordingSpeech::default()), 42);
        let b = Dispatcher::with_seed(Arc::new(RecordingSpeech::default()), 42);
        for _ in 0..5 {
            assert_eq!(a.compose(MessageBucket::Both), b.compose(MessageBucket::Both));
        }
    }
}
