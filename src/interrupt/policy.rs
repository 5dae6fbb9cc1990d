use std::time::Duration;

use tokio::time::Instant;

use super::messages::MessageBucket;
use crate::focus::GazeDirection;

pub fn should_interrupt(is_work: bool, focused: bool) -> bool {
    !is_work || !focused
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptDecision {
    /// Working and focused.
    Stay,
    /// Would yell, but the last yell was too recent.
    Cooling { remaining: Duration },
    Fire(MessageBucket),
}

/// Decide whether this cycle yells. A session that has never yelled is
/// always past its cooldown; otherwise strictly more than `cooldown` must
/// have passed since `last_yell`.
pub fn decide(
    is_work: bool,
    focused: bool,
    gaze: GazeDirection,
    last_yell: Option<Instant>,
    now: Instant,
    cooldown: Duration,
) -> InterruptDecision {
    let Some(bucket) = MessageBucket::select(is_work, focused, gaze) else {
        return InterruptDecision::Stay;
    };

    if let Some(last) = last_yell {
        let elapsed = now.saturating_duration_since(last);
        if elapsed <= cooldown {
            return InterruptDecision::Cooling {
                remaining: cooldown - elapsed,
            };
        }
    }
    InterruptDecision::Fire(bucket)
}
