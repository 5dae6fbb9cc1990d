use crate::perception::{Label, PixelStats};

use super::config::ContentConfig;
use super::similarity::concept_similarity;
use super::vocab::{
    any_contains, contains_term, Archetype, Side, ALLOW_LISTED_NON_WORK, ALLOW_LISTED_WORK, CONTEXT_RULES,
    STREAMING_PATTERN_SERVICES, STREAMING_SERVICES, WORK_ARCHETYPES,
};

/// Outcome of scoring one screenshot's labels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentScore {
    pub is_work: bool,
    /// Share of the evidence pointing at work, in `[0, 1]`.
    pub confidence: f64,
    pub work_score: f64,
    pub non_work_score: f64,
    pub work_items: Vec<String>,
    pub non_work_items: Vec<String>,
    pub matched_rules: Vec<&'static str>,
    /// Human-readable trail of every adjustment, in order.
    pub decisions: Vec<String>,
}

#[derive(Debug, Default)]
struct Tally {
    work: f64,
    non_work: f64,
    work_items: Vec<String>,
    non_work_items: Vec<String>,
    matched_rules: Vec<&'static str>,
    decisions: Vec<String>,
}

impl Tally {
    fn add_work(&mut self, amount: f64, reason: String) {
        self.work += amount;
        self.decisions.push(format!("{reason}: +{amount:.3} work"));
    }

    fn add_non_work(&mut self, amount: f64, reason: String) {
        self.non_work += amount;
        self.decisions.push(format!("{reason}: +{amount:.3} non-work"));
    }
}

/// Fuse classifier labels and pixel statistics into a work/non-work decision.
///
/// Pure and deterministic: the same labels and stats always give the same score.
pub fn score_labels(labels: &[Label], stats: &PixelStats, config: &ContentConfig) -> ContentScore {
    let mut tally = Tally::default();

    let detected: Vec<String> = labels
        .iter()
        .filter(|label| label.probability >= config.min_label_probability)
        .map(|label| label.name.to_lowercase())
        .collect();

    if stats.code_layout.detected {
        let amount = stats.code_layout.confidence * config.code_layout_weight;
        tally.add_work(amount, "code layout".to_string());
        tally.work_items.push("code layout".to_string());
    }

    score_ui_archetypes(labels, config, &mut tally);
    score_individual_labels(labels, config, &mut tally);
    blend_context_rules(&detected, config, &mut tally);
    apply_pixel_adjustments(stats, config, &mut tally);

    let services: Vec<&str> = STREAMING_SERVICES
        .iter()
        .copied()
        .filter(|service| any_contains(&detected, service))
        .collect();
    if !services.is_empty() {
        tally.add_non_work(
            config.streaming_service_boost,
            format!("streaming service ({})", services.join(", ")),
        );
        tally
            .non_work_items
            .extend(services.iter().map(|s| s.to_string()));
    }

    if tally.work_items.len() > config.diversity_min_items {
        let count = tally.work_items.len();
        tally.add_work(config.work_diversity_bonus, format!("{count} distinct work signals"));
    }
    if tally.non_work_items.len() > config.diversity_min_items {
        let count = tally.non_work_items.len();
        tally.add_non_work(
            config.non_work_diversity_bonus,
            format!("{count} distinct non-work signals"),
        );
    }

    if tally.work_items.len() < 2
        && tally.work > 0.0
        && tally.work < 1.0
        && !stats.code_layout.detected
    {
        let before = tally.work;
        tally.work *= config.single_signal_factor;
        tally.decisions.push(format!(
            "single work signal: work {before:.3} -> {:.3}",
            tally.work
        ));
    }

    if tally.work == 0.0 && tally.non_work == 0.0 {
        tally.work = config.default_work_bias;
        tally
            .decisions
            .push(format!("no signal, default work bias {:.2}", config.default_work_bias));
    }

    let total = tally.work + tally.non_work;
    let confidence = if total > 0.0 {
        (tally.work / total).clamp(0.0, 1.0)
    } else {
        config.default_work_bias
    };

    ContentScore {
        is_work: confidence > config.confidence_threshold,
        confidence,
        work_score: tally.work,
        non_work_score: tally.non_work,
        work_items: tally.work_items,
        non_work_items: tally.non_work_items,
        matched_rules: tally.matched_rules,
        decisions: tally.decisions,
    }
}

fn archetype_fraction(archetype: Archetype, classes: &[String]) -> f64 {
    let elements = archetype.elements();
    let matched = elements
        .iter()
        .filter(|element| any_contains(classes, element))
        .count();
    matched as f64 / elements.len() as f64
}

fn score_ui_archetypes(labels: &[Label], config: &ContentConfig, tally: &mut Tally) {
    let floor = config.min_label_probability * config.ui_pattern_probability_factor;
    let classes: Vec<String> = labels
        .iter()
        .filter(|label| label.probability >= floor)
        .map(|label| label.name.to_lowercase())
        .collect();

    let work_patterns: f64 = WORK_ARCHETYPES
        .iter()
        .map(|archetype| {
            let fraction = archetype_fraction(*archetype, &classes);
            if fraction > config.ui_pattern_match_threshold {
                fraction * config.work_pattern_boost
            } else {
                fraction
            }
        })
        .sum::<f64>()
        * config.work_pattern_weight;

    if work_patterns > 0.0 {
        tally.add_work(work_patterns, "work UI patterns".to_string());
    }

    let mut streaming = archetype_fraction(Archetype::Streaming, &classes);
    let mut gaming = archetype_fraction(Archetype::Gaming, &classes);
    let mut social = archetype_fraction(Archetype::Social, &classes);

    let threshold = config.ui_pattern_match_threshold;
    if streaming > threshold * config.streaming_pattern_threshold_factor {
        streaming *= config.streaming_pattern_boost;
    }
    if gaming > threshold {
        gaming *= config.gaming_pattern_boost;
    }
    if social > threshold {
        social *= config.social_pattern_boost;
    }
    if STREAMING_PATTERN_SERVICES
        .iter()
        .any(|service| any_contains(&classes, service))
    {
        streaming = streaming.max(config.streaming_service_pattern_floor);
    }

    let non_work_patterns = (streaming * config.streaming_pattern_weight
        + gaming * config.gaming_pattern_weight
        + social)
        * config.non_work_pattern_weight;

    if non_work_patterns > 0.0 {
        tally.add_non_work(non_work_patterns, "non-work UI patterns".to_string());
    }
    if streaming > config.strong_streaming_signal {
        tally.non_work_items.push("streaming content".to_string());
    }
}

fn score_individual_labels(labels: &[Label], config: &ContentConfig, tally: &mut Tally) {
    for label in labels {
        if label.probability < config.min_label_probability {
            continue;
        }
        let name = label.name.to_lowercase();
        let p = label.probability;

        let allow_work = ALLOW_LISTED_WORK
            .iter()
            .any(|signal| contains_term(&name, signal));
        let allow_non_work = ALLOW_LISTED_NON_WORK
            .iter()
            .any(|signal| contains_term(&name, signal));
        let sim = concept_similarity(&name);

        let work_threshold = if allow_work {
            config.allow_listed_work_threshold
        } else {
            config.similarity_threshold
        };
        let non_work_threshold = if allow_non_work {
            config.allow_listed_non_work_threshold
        } else {
            config.similarity_threshold
        };

        if sim.work > work_threshold && sim.work > sim.non_work {
            let boost = if allow_work { config.work_boost } else { 1.0 };
            tally.add_work(
                p * sim.work * boost,
                format!("\"{name}\" (p={p:.2}, sim={:.2}, boost={boost})", sim.work),
            );
            tally.work_items.push(name);
        } else if sim.non_work > non_work_threshold && sim.non_work > sim.work {
            let boost = if allow_non_work {
                config.non_work_boost
            } else {
                1.0
            };
            tally.add_non_work(
                p * sim.non_work * boost,
                format!("\"{name}\" (p={p:.2}, sim={:.2}, boost={boost})", sim.non_work),
            );
            tally.non_work_items.push(name);
        } else if sim.work > config.ambiguous_work_floor {
            tally.add_work(
                p * sim.work * config.ambiguous_work_factor,
                format!("ambiguous \"{name}\""),
            );
        }
    }
}

fn blend_context_rules(detected: &[String], config: &ContentConfig, tally: &mut Tally) {
    let mut context_work = 0.0;
    let mut context_non_work = 0.0;

    for rule in CONTEXT_RULES {
        let matched = rule
            .elements
            .iter()
            .filter(|element| any_contains(detected, element))
            .count();
        let ratio = matched as f64 / rule.elements.len() as f64;
        if ratio < config.context_match_ratio {
            continue;
        }

        tally.matched_rules.push(rule.name);
        match rule.side {
            Side::Work => context_work += rule.score * ratio,
            Side::NonWork => context_non_work += rule.score * ratio,
        }
    }

    let weight = config.context_weight;
    let (work_before, non_work_before) = (tally.work, tally.non_work);
    tally.work = work_before * (1.0 - weight) + context_work * weight;
    tally.non_work = non_work_before * (1.0 - weight) + context_non_work * weight;
    tally.decisions.push(format!(
        "context rules: work {work_before:.3} -> {:.3}, non-work {non_work_before:.3} -> {:.3}",
        tally.work, tally.non_work
    ));
}

fn apply_pixel_adjustments(stats: &PixelStats, config: &ContentConfig, tally: &mut Tally) {
    if stats.brightness < config.dark_screen_brightness {
        tally.add_non_work(config.dark_screen_penalty, "dark screen".to_string());
    }

    if stats.color_variance > config.high_variance_floor {
        let amount = ((stats.color_variance - config.high_variance_floor)
            * config.high_variance_factor)
            .min(config.high_variance_cap);
        tally.add_non_work(
            amount,
            format!("high color variance {:.3}", stats.color_variance),
        );
    } else if stats.color_variance < config.low_variance_ceiling {
        tally.add_work(
            config.low_variance_boost,
            format!("low color variance {:.3}", stats.color_variance),
        );
    }
}
