use serde::Serialize;

use crate::settings::YellStyle;

/// Speech synthesis parameters for one yell style.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceParams {
    pub pitch: f32,
    pub rate: f32,
    pub volume: f32,
    /// Substring to prefer when picking a system voice.
    pub voice_hint: &'static str,
}

impl VoiceParams {
    pub fn for_style(style: YellStyle) -> Self {
        match style {
            YellStyle::DrillSergeant => Self {
                pitch: 1.2,
                rate: 1.3,
                volume: 1.0,
                voice_hint: "male",
            },
            YellStyle::Friendly => Self {
                pitch: 1.0,
                rate: 0.9,
                volume: 0.8,
                voice_hint: "female",
            },
            YellStyle::Motivational => Self {
                pitch: 1.1,
                rate: 1.0,
                volume: 0.9,
                voice_hint: "alex",
            },
            YellStyle::Coach => Self {
                pitch: 1.1,
                rate: 1.1,
                volume: 0.9,
                voice_hint: "en-US",
            },
        }
    }
}
