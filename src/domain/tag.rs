//! The closed set of topical tags a memory can carry.
//!
//! Tags are a fixed enumeration; lookup accepts either the human label
//! ("Motor Skills") or the canonical name ("MOTOR_SKILLS"), case-insensitively.

use serde::{Deserialize, Serialize};

/// Topical category for a memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTag {
    Language,
    MotorSkills,
    Emotional,
    Social,
    Milestone,
    Play,
    Family,
    Funny,
    Growth,
    Challenge,
}

/// All tags in canonical order (used for sorted rendering)
pub const ALL_TAGS: [MemoryTag; 10] = [
    MemoryTag::Language,
    MemoryTag::MotorSkills,
    MemoryTag::Emotional,
    MemoryTag::Social,
    MemoryTag::Milestone,
    MemoryTag::Play,
    MemoryTag::Family,
    MemoryTag::Funny,
    MemoryTag::Growth,
    MemoryTag::Challenge,
];

impl MemoryTag {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Language => "Language",
            Self::MotorSkills => "Motor Skills",
            Self::Emotional => "Emotional",
            Self::Social => "Social",
            Self::Milestone => "Milestone",
            Self::Play => "Play",
            Self::Family => "Family",
            Self::Funny => "Funny",
            Self::Growth => "Growth",
            Self::Challenge => "Challenge",
        }
    }

    /// Canonical enumeration name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Language => "LANGUAGE",
            Self::MotorSkills => "MOTOR_SKILLS",
            Self::Emotional => "EMOTIONAL",
            Self::Social => "SOCIAL",
            Self::Milestone => "MILESTONE",
            Self::Play => "PLAY",
            Self::Family => "FAMILY",
            Self::Funny => "FUNNY",
            Self::Growth => "GROWTH",
            Self::Challenge => "CHALLENGE",
        }
    }

    /// Resolve a tag from its label or canonical name, case-insensitively
    pub fn from_label(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        ALL_TAGS.into_iter().find(|tag| {
            tag.label().eq_ignore_ascii_case(trimmed) || tag.name().eq_ignore_ascii_case(trimmed)
        })
    }
}
