use std::time::Duration;

/// Tunables for work/non-work scoring. Every threshold, weight and boost used
/// by [`score_labels`](super::scoring::score_labels) lives here.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Work confidence above this is classified as work.
    pub confidence_threshold: f64,
    /// Labels below this probability are ignored.
    pub min_label_probability: f64,
    /// UI archetype detection looks a little deeper than per-label scoring.
    pub ui_pattern_probability_factor: f64,

    /// Similarity needed for an ordinary label to count for either side.
    pub similarity_threshold: f64,
    /// Lower bar for labels on the work allow-list.
    pub allow_listed_work_threshold: f64,
    /// Lower bar for labels on the non-work allow-list.
    pub allow_listed_non_work_threshold: f64,
    pub work_boost: f64,
    pub non_work_boost: f64,

    /// Ambiguous labels with at least this work similarity lean slightly to work.
    pub ambiguous_work_floor: f64,
    pub ambiguous_work_factor: f64,

    /// Fraction of the final per-label score taken from the context rules.
    pub context_weight: f64,
    /// Minimum fraction of a rule's elements that must be present.
    pub context_match_ratio: f64,

    pub ui_pattern_match_threshold: f64,
    pub work_pattern_boost: f64,
    pub work_pattern_weight: f64,
    pub streaming_pattern_threshold_factor: f64,
    pub streaming_pattern_boost: f64,
    pub gaming_pattern_boost: f64,
    pub social_pattern_boost: f64,
    pub streaming_pattern_weight: f64,
    pub gaming_pattern_weight: f64,
    pub non_work_pattern_weight: f64,
    pub streaming_service_pattern_floor: f64,
    pub strong_streaming_signal: f64,

    pub code_layout_weight: f64,

    pub dark_screen_brightness: f64,
    pub dark_screen_penalty: f64,
    pub high_variance_floor: f64,
    pub high_variance_factor: f64,
    pub high_variance_cap: f64,
    pub low_variance_ceiling: f64,
    pub low_variance_boost: f64,

    pub streaming_service_boost: f64,

    pub diversity_min_items: usize,
    pub work_diversity_bonus: f64,
    pub non_work_diversity_bonus: f64,
    pub single_signal_factor: f64,

    /// Work score used when nothing on screen produced a signal.
    pub default_work_bias: f64,

    pub cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.60,
            min_label_probability: 0.08,
            ui_pattern_probability_factor: 0.8,

            similarity_threshold: 0.60,
            allow_listed_work_threshold: 0.50,
            allow_listed_non_work_threshold: 0.45,
            work_boost: 1.5,
            non_work_boost: 1.7,

            ambiguous_work_floor: 0.3,
            ambiguous_work_factor: 0.3,

            context_weight: 0.65,
            context_match_ratio: 0.5,

            ui_pattern_match_threshold: 0.4,
            work_pattern_boost: 1.5,
            work_pattern_weight: 0.9,
            streaming_pattern_threshold_factor: 0.8,
            streaming_pattern_boost: 2.0,
            gaming_pattern_boost: 1.8,
            social_pattern_boost: 1.8,
            streaming_pattern_weight: 1.3,
            gaming_pattern_weight: 1.2,
            non_work_pattern_weight: 1.1,
            streaming_service_pattern_floor: 0.75,
            strong_streaming_signal: 0.5,

            code_layout_weight: 1.8,

            dark_screen_brightness: 0.2,
            dark_screen_penalty: 0.1,
            high_variance_floor: 0.35,
            high_variance_factor: 2.0,
            high_variance_cap: 0.5,
            low_variance_ceiling: 0.25,
            low_variance_boost: 0.2,

            streaming_service_boost: 1.0,

            diversity_min_items: 3,
            work_diversity_bonus: 0.2,
            non_work_diversity_bonus: 0.25,
            single_signal_factor: 0.9,

            default_work_bias: 0.55,

            cache_ttl: Duration::from_secs(60),
            cache_capacity: 20,
        }
    }
}
