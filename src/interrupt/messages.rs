use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::focus::GazeDirection;

/// Which kind of lapse a yell is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBucket {
    NotWorking,
    NotFocused,
    GazeLeft,
    GazeRight,
    GazeUp,
    GazeDown,
    Both,
}

impl MessageBucket {
    /// `None` when there is nothing to yell about.
    pub fn select(is_work: bool, focused: bool, gaze: GazeDirection) -> Option<Self> {
        match (is_work, focused) {
            (true, true) => None,
            (false, false) => Some(MessageBucket::Both),
            (false, true) => Some(MessageBucket::NotWorking),
            (true, false) => Some(match gaze {
                GazeDirection::Left => MessageBucket::GazeLeft,
                GazeDirection::Right => MessageBucket::GazeRight,
                GazeDirection::Up => MessageBucket::GazeUp,
                GazeDirection::Down => MessageBucket::GazeDown,
                GazeDirection::Straight | GazeDirection::Unknown => MessageBucket::NotFocused,
            }),
        }
    }

    pub fn templates(&self) -> &'static [&'static str] {
        match self {
            MessageBucket::NotWorking => NOT_WORKING,
            MessageBucket::NotFocused => NOT_FOCUSED,
            MessageBucket::GazeLeft => GAZE_LEFT,
            MessageBucket::GazeRight => GAZE_RIGHT,
            MessageBucket::GazeUp => GAZE_UP,
            MessageBucket::GazeDown => GAZE_DOWN,
            MessageBucket::Both => BOTH,
        }
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        self.templates()
            .choose(rng)
            .copied()
            .unwrap_or(FALLBACK)
    }
}

const FALLBACK: &str = "Let's get back to the work in front of you.";

const NOT_WORKING: &[&str] = &[
    "Hey! That does not look like work. Back to it!",
    "Is this really what you sat down to do? Close it and get going.",
    "Distraction spotted. Put it away and pick the task back up.",
    "You've wandered off task. Time to get back on it!",
    "Interesting, sure. Is it finishing your work? No. Back to it.",
    "That tab is not your project. Switch back, now!",
];

const NOT_FOCUSED: &[&str] = &[
    "I can't see you looking at the screen. Eyes front!",
    "Your eyes belong on the screen right now.",
    "Still with me? Let's focus on the task.",
    "You look distracted. Shake it off and refocus!",
    "I need your full attention here.",
];

const GAZE_LEFT: &[&str] = &[
    "Looking off to the left? Your work is right in front of you.",
    "Whatever is on your left can wait. Eyes back to the center!",
    "Eyes drifting left. Bring them back to the task.",
];

const GAZE_RIGHT: &[&str] = &[
    "Looking off to the right? Your work is right in front of you.",
    "Whatever is on your right can wait. Eyes back to the center!",
    "Eyes drifting right. Bring them back to the task.",
];

const GAZE_UP: &[&str] = &[
    "Staring at the ceiling won't write it for you. Eyes down on the screen!",
    "Your attention is floating above the screen. Bring it back.",
    "Looking up? The good stuff is right in front of you.",
];

const GAZE_DOWN: &[&str] = &[
    "Looking down? Put the phone away and face the screen!",
    "Your attention has dropped below the screen. Bring it back up.",
    "Whatever is in your lap can wait. Eyes on the work.",
];

const BOTH: &[&str] = &[
    "Off task and not even looking. Let's fix both, right now!",
    "Double trouble: wrong content and no focus. Reset!",
    "Full reset: eyes on the screen, work back up, go!",
    "You're completely off track. Close it, sit up, refocus.",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn bucket_selection() {
        assert_eq!(MessageBucket::select(true, true, GazeDirection::Left), None);
        assert_eq!(
            MessageBucket::select(false, true, GazeDirection::Straight),
            Some(MessageBucket::NotWorking)
        );
        assert_eq!(
            MessageBucket::select(false, false, GazeDirection::Left),
            Some(MessageBucket::Both)
        );
        assert_eq!(
            MessageBucket::select(true, false, GazeDirection::Down),
            Some(MessageBucket::GazeDown)
        );
        assert_eq!(
            MessageBucket::select(true, false, GazeDirection::Unknown),
            Some(MessageBucket::NotFocused)
        );
    }

    #[test]
    fn picks_come_from_the_bucket() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let line = MessageBucket::GazeLeft.pick(&mut rng);
            assert!(GAZE_LEFT.contains(&line));
        }
    }
}
