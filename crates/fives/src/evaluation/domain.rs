use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Highest score any single category can receive.
pub const MAX_CATEGORY_SCORE: u8 = 10;
/// Sort, Set in Order and Shine never drop below this value.
pub const MIN_FOUNDATION_SCORE: u8 = 1;
/// Standardize and Sustain only count once the foundation reaches this sum.
pub const BASE_SCORE_THRESHOLD: u32 = 22;
/// Five categories at ten points each.
pub const MAX_TOTAL_SCORE: u32 = 50;

/// Identifier wrapper for a physical workspace under evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkspaceId(pub String);

/// Identifier wrapper for the company owning workspaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompanyId(pub String);

/// Identifier wrapper for a stored evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvaluationId(pub String);

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for EvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The five 5S pillars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Sort,
    SetInOrder,
    Shine,
    Standardize,
    Sustain,
}

impl Category {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Sort,
            Self::SetInOrder,
            Self::Shine,
            Self::Standardize,
            Self::Sustain,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Sort => "Sort",
            Self::SetInOrder => "Set in Order",
            Self::Shine => "Shine",
            Self::Standardize => "Standardize",
            Self::Sustain => "Sustain",
        }
    }

    /// Field name the classifier must use for this category.
    pub const fn raw_key(self) -> &'static str {
        match self {
            Self::Sort => "sortScore",
            Self::SetInOrder => "setInOrderScore",
            Self::Shine => "shineScore",
            Self::Standardize => "standardizeScore",
            Self::Sustain => "sustainScore",
        }
    }

    /// Sort, Set in Order and Shine gate eligibility for the other two.
    pub const fn is_foundation(self) -> bool {
        matches!(self, Self::Sort | Self::SetInOrder | Self::Shine)
    }

    pub const fn floor(self) -> u8 {
        if self.is_foundation() {
            MIN_FOUNDATION_SCORE
        } else {
            0
        }
    }

    pub const fn range(self) -> RangeInclusive<u8> {
        self.floor()..=MAX_CATEGORY_SCORE
    }
}

/// Per-category 5S scores.
///
/// Values produced by [`crate::evaluation::scoring::validate_and_normalize`] always
/// satisfy the category ranges and the disqualification rule. Records read back from
/// storage may predate the rule, so display paths go through
/// [`crate::evaluation::scoring::adjusted_scores`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub sort: u8,
    pub set_in_order: u8,
    pub shine: u8,
    pub standardize: u8,
    pub sustain: u8,
}

impl Score {
    pub const fn new(sort: u8, set_in_order: u8, shine: u8, standardize: u8, sustain: u8) -> Self {
        Self {
            sort,
            set_in_order,
            shine,
            standardize,
            sustain,
        }
    }

    pub const fn get(&self, category: Category) -> u8 {
        match category {
            Category::Sort => self.sort,
            Category::SetInOrder => self.set_in_order,
            Category::Shine => self.shine,
            Category::Standardize => self.standardize,
            Category::Sustain => self.sustain,
        }
    }

    pub fn set(&mut self, category: Category, value: u8) {
        match category {
            Category::Sort => self.sort = value,
            Category::SetInOrder => self.set_in_order = value,
            Category::Shine => self.shine = value,
            Category::Standardize => self.standardize = value,
            Category::Sustain => self.sustain = value,
        }
    }

    /// Sum of the three foundation categories.
    pub fn base_score(&self) -> u32 {
        u32::from(self.sort) + u32::from(self.set_in_order) + u32::from(self.shine)
    }

    pub fn is_disqualified(&self) -> bool {
        self.base_score() < BASE_SCORE_THRESHOLD
    }

    /// Raw sum of all five fields, without re-applying the disqualification rule.
    pub(crate) fn raw_sum(&self) -> u32 {
        self.base_score() + u32::from(self.standardize) + u32::from(self.sustain)
    }
}

/// Pre-encoded photo payload (typically a `data:` URL with base64 content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoPayload(pub String);

impl PhotoPayload {
    /// Non-string JSON entries become empty payloads and are dropped during shaping.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(raw) => Self(raw.clone()),
            _ => Self(String::new()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for PhotoPayload {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PhotoPayload {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
