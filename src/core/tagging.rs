//! Keyword-based tag detection.
//!
//! Maps free transcript text to the closed tag set via case-insensitive
//! substring matching. A memory is never left untagged: when nothing
//! matches, the result defaults to `{Growth}`.

use std::collections::BTreeSet;

use crate::domain::MemoryTag;

const DEFAULT_TAG: MemoryTag = MemoryTag::Growth;

/// Trigger keywords per tag. Substring matches, not word-boundary-aware,
/// so stems like "frustrat" and "challeng" cover their inflections.
const KEYWORD_TABLE: [(MemoryTag, &[&str]); 10] = [
    (
        MemoryTag::Language,
        &["say", "said", "word", "talk", "speak", "story", "read"],
    ),
    (
        MemoryTag::MotorSkills,
        &["walk", "run", "jump", "climb", "stack", "tower", "dance", "kick"],
    ),
    (
        MemoryTag::Emotional,
        &["happy", "sad", "angry", "upset", "excited", "proud", "cry", "frustrat"],
    ),
    (
        MemoryTag::Social,
        &["friend", "share", "together", "hello", "teacher", "class", "playdate"],
    ),
    (
        MemoryTag::Milestone,
        &["first time", "for the first time", "learned to", "finally", "milestone"],
    ),
    (
        MemoryTag::Play,
        &["play", "toy", "game", "pretend", "puzzle", "blocks", "building"],
    ),
    (
        MemoryTag::Family,
        &["mom", "dad", "mother", "father", "sister", "brother", "grandma", "grandpa", "family"],
    ),
    (
        MemoryTag::Funny,
        &["funny", "laugh", "giggle", "joke", "silly", "hilarious"],
    ),
    (
        MemoryTag::Growth,
        &["improv", "better", "growing", "progress", "new skill", "without help"],
    ),
    (
        MemoryTag::Challenge,
        &["hard", "difficult", "struggle", "challeng", "tried", "couldn't", "could not", "failed"],
    ),
];

/// Detect tags for a transcript. Never returns an empty set.
pub fn detect_tags(transcript: &str) -> BTreeSet<MemoryTag> {
    let normalized = transcript.to_lowercase();
    let mut tags = BTreeSet::new();

    for (tag, keywords) in KEYWORD_TABLE {
        if keywords.iter().any(|kw| normalized.contains(kw)) {
            tags.insert(tag);
        }
    }

    if tags.is_empty() {
        tags.insert(DEFAULT_TAG);
    }

    tags
}
