// topic guard - keep the model on dubai real estate

use crate::core::seed::LOCATIONS;

pub const OFF_TOPIC_REPLY: &str =
    "Sorry, I can only help with Dubai real estate property searches.";

const KEYWORDS: &[&str] = &[
    "dubai",
    "property",
    "apartment",
    "villa",
    "townhouse",
    "penthouse",
    "bedroom",
    "aed",
    "possession",
];

pub struct Topic;

impl Topic {
    pub fn is_relevant(query: &str) -> bool {
        let lower = query.to_lowercase();

        KEYWORDS.iter().any(|kw| lower.contains(kw))
            || LOCATIONS
                .iter()
                .any(|loc| lower.contains(&loc.to_lowercase()))
    }
}
