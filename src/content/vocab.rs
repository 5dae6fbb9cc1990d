//! Fixed vocabularies and rule tables for content scoring.

/// Concept anchors for productive screen content.
pub const WORK_CONCEPTS: &[&str] = &[
    "office", "business", "document", "presentation", "spreadsheet", "meeting", "research",
    "development", "programming", "code", "workplace", "desk", "laptop", "editor", "terminal",
    "console", "script", "developer", "software", "application", "interface", "text editor",
    "window", "screen", "monitor", "display", "ide", "repository", "function", "variable",
    "method", "browser", "website", "framework", "algorithm", "database", "keyboard", "typing",
    "mouse", "cursor", "pointer",
];

/// Concept anchors for leisure content.
pub const NON_WORK_CONCEPTS: &[&str] = &[
    "entertainment", "game", "social media", "relaxation", "streaming", "sports", "food",
    "beverage", "home", "hobby", "music", "movie", "show", "netflix", "hulu", "disney",
    "amazon prime", "hbo", "youtube", "peacock", "paramount", "apple tv", "twitch", "roku",
    "tubi", "crunchyroll", "espn", "sling", "fubo", "discovery", "plex", "gaming", "video game",
    "social", "chat", "news", "shopping", "cooking", "recipe", "travel", "vacation", "fitness",
    "workout", "podcast", "audiobook", "ebook", "comic", "manga", "animation",
];

/// Labels containing one of these get the lower work threshold and the work boost.
pub const ALLOW_LISTED_WORK: &[&str] = &[
    "code", "editor", "terminal", "console", "programming", "development", "browser", "window",
    "application", "software", "ide", "document",
];

/// Labels containing one of these get the lower non-work threshold and boost.
pub const ALLOW_LISTED_NON_WORK: &[&str] = &[
    "netflix", "hulu", "streaming", "game", "youtube", "twitch", "movie", "show",
    "entertainment", "disney", "hbo", "prime video",
];

/// Known streaming services; any label mentioning one is strong non-work evidence.
pub const STREAMING_SERVICES: &[&str] = &[
    "netflix", "hulu", "disney", "prime", "amazon", "hbo", "youtube", "peacock", "paramount",
    "apple tv", "twitch",
];

/// Wider service list used by the streaming UI archetype.
pub const STREAMING_PATTERN_SERVICES: &[&str] = &[
    "netflix", "hulu", "disney", "prime", "amazon", "hbo", "youtube", "peacock", "paramount",
    "apple tv", "twitch", "roku", "tubi", "crunchyroll", "espn", "sling", "fubo", "discovery",
    "plex",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Work,
    NonWork,
}

/// Co-occurring labels that together indicate a kind of screen.
#[derive(Debug, Clone, Copy)]
pub struct ContextRule {
    pub name: &'static str,
    pub elements: &'static [&'static str],
    pub score: f64,
    pub side: Side,
}

const fn rule(
    name: &'static str,
    elements: &'static [&'static str],
    score: f64,
    side: Side,
) -> ContextRule {
    ContextRule {
        name,
        elements,
        score,
        side,
    }
}

pub const CONTEXT_RULES: &[ContextRule] = &[
    rule("writing", &["document", "text", "writing"], 0.8, Side::Work),
    rule("programming", &["code", "programming", "development"], 0.9, Side::Work),
    rule("spreadsheet", &["spreadsheet", "numbers", "chart"], 0.8, Side::Work),
    rule("meeting", &["meeting", "presentation", "conference"], 0.7, Side::Work),
    rule("code editor", &["window", "text", "line"], 0.85, Side::Work),
    rule("text editor", &["editor", "text", "window"], 0.85, Side::Work),
    rule("text panel", &["rectangle", "text", "screen"], 0.7, Side::Work),
    rule("browser", &["browser", "tab", "website"], 0.65, Side::Work),
    rule("application", &["application", "interface", "window"], 0.65, Side::Work),
    rule("web page", &["site", "web", "page"], 0.6, Side::Work),
    rule("typing", &["keyboard", "typing", "text"], 0.7, Side::Work),
    rule("gaming", &["game", "playing", "controller"], 0.9, Side::NonWork),
    rule("social chat", &["social", "media", "chat"], 0.8, Side::NonWork),
    rule("video", &["video", "streaming", "entertainment"], 0.8, Side::NonWork),
    rule("food", &["food", "drink", "restaurant"], 0.7, Side::NonWork),
    rule("video player", &["video", "player", "watch"], 0.85, Side::NonWork),
    rule("episodes", &["movie", "show", "episode"], 0.9, Side::NonWork),
    rule("netflix", &["netflix", "series", "watch"], 0.95, Side::NonWork),
    rule("hulu", &["hulu", "stream", "watch"], 0.95, Side::NonWork),
    rule("disney", &["disney", "plus", "watch"], 0.95, Side::NonWork),
    rule("prime video", &["prime", "video", "amazon"], 0.95, Side::NonWork),
    rule("hbo", &["hbo", "max", "watch"], 0.95, Side::NonWork),
    rule("youtube", &["youtube", "video", "channel"], 0.9, Side::NonWork),
    rule("playback controls", &["play", "pause", "fullscreen"], 0.8, Side::NonWork),
    rule("game hud", &["game", "level", "score"], 0.9, Side::NonWork),
    rule("game mission", &["play", "character", "mission"], 0.9, Side::NonWork),
    rule("social profile", &["post", "feed", "profile"], 0.85, Side::NonWork),
    rule("social reactions", &["friend", "like", "comment"], 0.85, Side::NonWork),
    rule("social notifications", &["timeline", "message", "notification"], 0.85, Side::NonWork),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archetype {
    CodeEditor,
    Spreadsheet,
    Document,
    Browser,
    Application,
    Streaming,
    Gaming,
    Social,
}

impl Archetype {
    pub fn elements(&self) -> &'static [&'static str] {
        match self {
            Archetype::CodeEditor => &[
                "window", "text", "line", "screen", "display", "rectangle", "interface", "toolbar",
            ],
            Archetype::Spreadsheet => &["cell", "grid", "table", "row", "column", "sheet", "data"],
            Archetype::Document => &["page", "text", "line", "paragraph", "document", "content"],
            Archetype::Browser => &["tab", "browser", "webpage", "website", "toolbar", "navigation"],
            Archetype::Application => &["window", "toolbar", "menu", "interface", "button", "panel"],
            Archetype::Streaming => &[
                "video", "player", "stream", "movie", "show", "episode", "series", "watch", "play",
                "pause", "fullscreen", "volume", "playlist", "recommended", "trailer",
            ],
            Archetype::Gaming => &[
                "game", "play", "score", "level", "character", "controller", "mission", "quest",
                "achievement", "leaderboard", "multiplayer", "inventory", "weapon", "enemy",
            ],
            Archetype::Social => &[
                "post", "feed", "profile", "friend", "like", "share", "comment", "message",
                "notification", "timeline", "status", "photo", "video", "story", "chat",
            ],
        }
    }
}

pub const WORK_ARCHETYPES: [Archetype; 5] = [
    Archetype::CodeEditor,
    Archetype::Spreadsheet,
    Archetype::Document,
    Archetype::Browser,
    Archetype::Application,
];

/// True when any label contains `needle` as a substring.
pub fn any_contains(labels: &[String], needle: &str) -> bool {
    labels.iter().any(|label| label.contains(needle))
}

/// Allow-list membership. Terms of three letters or fewer ("ide", "hbo") must
/// appear as a whole word so that "video" does not count as "ide".
pub fn contains_term(label: &str, term: &str) -> bool {
    if term.chars().count() > 3 {
        return label.contains(term);
    }
    label
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == term)
}
