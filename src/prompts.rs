//! Prompt templates and the topic/style randomizer.
//!
//! Templates are pure functions of their inputs so they can be tested without
//! touching the provider. The randomization only exists to keep repeated
//! generations from producing visibly repetitive prompts.

use rand::Rng;

/// Topics drawn at random when the caller supplies none.
pub const TOPICS: &[&str] = &[
    "history",
    "science",
    "space",
    "animals",
    "geography",
    "technology",
    "music",
    "food",
    "the human body",
    "language",
];

/// Style words mixed into prompts, up to two per generation.
pub const STYLES: &[&str] = &[
    "fun",
    "educational",
    "surprising",
    "quirky",
    "little-known",
    "mind-blowing",
];

/// Topic and style picked for one prompt.
#[derive(Debug, Clone)]
pub struct PromptFlavor {
    pub topic: String,
    pub style: String,
}

/// Draw a random topic and up to two style words ("fun and educational").
/// A caller-supplied topic always wins over the random draw; style is never
/// overridable. Coinciding style draws collapse to a single word.
pub fn diversify<R: Rng>(rng: &mut R, topic_override: Option<&str>) -> PromptFlavor {
    let topic = match topic_override {
        Some(t) => t.to_string(),
        None => TOPICS[rng.gen_range(0..TOPICS.len())].to_string(),
    };

    let first = STYLES[rng.gen_range(0..STYLES.len())];
    let second = STYLES[rng.gen_range(0..STYLES.len())];
    let style = if first == second {
        first.to_string()
    } else {
        format!("{first} and {second}")
    };

    PromptFlavor { topic, style }
}

/// Prompt for the duplicate-avoiding mode: lists every previously delivered
/// fact and asks the provider not to repeat them.
pub fn unique_fact_prompt(topic: Option<&str>, previous: &[String]) -> String {
    let subject = match topic {
        Some(t) => format!("about {t} "),
        None => String::new(),
    };
    format!(
        "Give me a bite-sized fun and educational fact {subject}that is not in the following list:\n{}\n\n\
         Add a relevant Wikipedia link if you can find one (a bare link, no markdown or other formatting). \
         Keep the response under 250 characters.",
        previous.join("\n")
    )
}

/// Prompt for the unverified mode. The "fact number N of M" phrasing is pure
/// flavor to induce variety; the provider does the picking.
pub fn quick_fact_prompt(flavor: &PromptFlavor, pick: u32, out_of: u32) -> String {
    format!(
        "Imagine {out_of} {} facts about {}. Tell me only fact number {pick}, in one or two sentences. \
         Keep the response under 250 characters.",
        flavor.style, flavor.topic
    )
}

/// Prompt for the structured batch mode: ten candidates, each with a bare
/// link, as a JSON object.
pub fn batch_fact_prompt(flavor: &PromptFlavor) -> String {
    format!(
        "Give me ten {} facts about {}. Respond with a JSON object of the form \
         {{\"facts\": [{{\"fact\": \"...\", \"url\": \"...\"}}]}} where every url is a bare link \
         to a page that backs up the fact (Wikipedia preferred). Keep each fact under 250 characters.",
        flavor.style, flavor.topic
    )
}

/// Prompt for the single-fact verified mode: one fact with an embedded link.
pub fn sourced_fact_prompt(flavor: &PromptFlavor) -> String {
    format!(
        "Give me a bite-sized {} fact about {}. Add a bare link to a page that backs it up \
         (Wikipedia preferred, no markdown or other formatting). Keep the response under 250 characters.",
        flavor.style, flavor.topic
    )
}

/// Prompt for invented "facts". Fiction is unfalsifiable by construction, so
/// no link is requested.
pub fn fiction_prompt(topic: Option<&str>, author: Option<&str>) -> String {
    let mut prompt = String::from("Invent one funny but plausible-sounding fictional fact");
    if let Some(t) = topic {
        prompt.push_str(&format!(" about {t}"));
    }
    if let Some(a) = author {
        prompt.push_str(&format!(", written in the style of {a}"));
    }
    prompt.push_str(". Respond with just the fact, under 250 characters.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn style_is_well_formed(style: &str) -> bool {
        match style.split_once(" and ") {
            Some((a, b)) => a != b && STYLES.contains(&a) && STYLES.contains(&b),
            None => STYLES.contains(&style),
        }
    }

    #[test]
    fn test_topic_override_always_wins() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let flavor = diversify(&mut rng, Some("bananas"));
            assert_eq!(flavor.topic, "bananas");
        }
    }

    #[test]
    fn test_random_topic_comes_from_catalog() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let flavor = diversify(&mut rng, None);
            assert!(TOPICS.contains(&flavor.topic.as_str()));
        }
    }

    #[test]
    fn test_style_joins_and_deduplicates() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let flavor = diversify(&mut rng, None);
            assert!(style_is_well_formed(&flavor.style), "bad style: {}", flavor.style);
        }
    }

    #[test]
    fn test_unique_prompt_lists_previous_facts() {
        let previous = vec!["Bees sleep.".to_string(), "Rome is old.".to_string()];
        let prompt = unique_fact_prompt(None, &previous);
        assert!(prompt.contains("Bees sleep.\nRome is old."));
        assert!(prompt.contains("not in the following list"));
    }

    #[test]
    fn test_unique_prompt_mentions_topic_when_given() {
        let prompt = unique_fact_prompt(Some("volcanoes"), &[]);
        assert!(prompt.contains("about volcanoes"));
    }

    #[test]
    fn test_quick_prompt_carries_the_pick() {
        let flavor = PromptFlavor {
            topic: "space".into(),
            style: "fun".into(),
        };
        let prompt = quick_fact_prompt(&flavor, 3, 10);
        assert!(prompt.contains("10 fun facts about space"));
        assert!(prompt.contains("fact number 3"));
    }

    #[test]
    fn test_batch_prompt_requests_json_shape() {
        let flavor = PromptFlavor {
            topic: "music".into(),
            style: "quirky".into(),
        };
        let prompt = batch_fact_prompt(&flavor);
        assert!(prompt.contains(r#"{"facts": [{"fact": "...", "url": "..."}]}"#));
    }

    #[test]
    fn test_fiction_prompt_variants() {
        assert!(!fiction_prompt(None, None).contains("about"));
        assert!(fiction_prompt(Some("bananas"), None).contains("about bananas"));
        assert!(
            fiction_prompt(Some("bananas"), Some("john silver"))
                .contains("in the style of john silver")
        );
    }
}
