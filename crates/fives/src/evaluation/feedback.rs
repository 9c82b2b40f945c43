use serde::Serialize;

use super::domain::{Category, Score};
use super::scoring::{adjusted_scores, percentage_score, total_score};

/// Lower bound (inclusive) of the high category band.
pub const HIGH_BAND_MIN: u8 = 8;
/// Lower bound (inclusive) of the medium category band.
pub const MEDIUM_BAND_MIN: u8 = 5;

const FOUNDATION_NOTE: &str = "The first three S's (Sort, Set in Order, and Shine) need to be \
stabilized before implementing Standardize and Sustain. Focus on improving these fundamental \
aspects first.";

/// Qualitative band for a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryBand {
    High,
    Medium,
    Low,
    /// Standardize/Sustain withheld because the foundation is below threshold.
    Disqualified,
}

impl CategoryBand {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "Strong",
            Self::Medium => "Developing",
            Self::Low => "Weak",
            Self::Disqualified => "Not yet eligible",
        }
    }
}

/// Overall band over the percentage score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallTier {
    Excellent,
    Good,
    NeedsImprovement,
    ActionRequired,
}

impl OverallTier {
    /// Boundaries: `>= 80`, `>= 60`, `>= 40`, below 40.
    pub const fn from_percentage(percentage: u8) -> Self {
        if percentage >= 80 {
            Self::Excellent
        } else if percentage >= 60 {
            Self::Good
        } else if percentage >= 40 {
            Self::NeedsImprovement
        } else {
            Self::ActionRequired
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good progress",
            Self::NeedsImprovement => "Needs improvement",
            Self::ActionRequired => "Immediate action required",
        }
    }

    pub const fn summary(self) -> &'static str {
        match self {
            Self::Excellent => {
                "Excellent work! Your workspace demonstrates strong adherence to 5S principles. \
                 Keep maintaining these high standards."
            }
            Self::Good => {
                "Good progress! There's room for improvement, but you're on the right track. \
                 Focus on areas with lower scores."
            }
            Self::NeedsImprovement => {
                "Your workspace needs significant improvements. Review each principle and \
                 create an action plan."
            }
            Self::ActionRequired => {
                "Immediate action is required. Consider implementing 5S principles from the \
                 ground up."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryFeedback {
    pub category: Category,
    pub label: &'static str,
    pub score: u8,
    pub band: CategoryBand,
    pub band_label: &'static str,
    pub commentary: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackReport {
    pub total_score: u32,
    pub percentage_score: u8,
    pub tier: OverallTier,
    pub tier_label: &'static str,
    pub summary: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foundation_note: Option<&'static str>,
    pub categories: Vec<CategoryFeedback>,
}

pub fn category_band(category: Category, score: &Score) -> CategoryBand {
    let value = score.get(category);
    if !category.is_foundation() && score.is_disqualified() {
        CategoryBand::Disqualified
    } else if value >= HIGH_BAND_MIN {
        CategoryBand::High
    } else if value >= MEDIUM_BAND_MIN {
        CategoryBand::Medium
    } else {
        CategoryBand::Low
    }
}

/// Builds per-category commentary and the overall summary for a finalized score.
pub fn derive_feedback(score: &Score) -> FeedbackReport {
    let adjusted = adjusted_scores(score);
    let total = total_score(&adjusted);
    let percentage = percentage_score(total);
    let tier = OverallTier::from_percentage(percentage);

    let categories = Category::ordered()
        .into_iter()
        .map(|category| {
            let band = category_band(category, &adjusted);
            CategoryFeedback {
                category,
                label: category.label(),
                score: adjusted.get(category),
                band,
                band_label: band.label(),
                commentary: commentary(category, band),
            }
        })
        .collect();

    FeedbackReport {
        total_score: total,
        percentage_score: percentage,
        tier,
        tier_label: tier.label(),
        summary: tier.summary(),
        foundation_note: adjusted.is_disqualified().then_some(FOUNDATION_NOTE),
        categories,
    }
}

fn commentary(category: Category, band: CategoryBand) -> &'static str {
    use self::CategoryBand::{Disqualified, High, Low, Medium};
    use super::domain::Category::{SetInOrder, Shine, Sort, Standardize, Sustain};

    match (category, band) {
        (_, Disqualified) => {
            "Withheld until Sort, Set in Order and Shine together reach the eligibility threshold."
        }
        (Sort, High) => "Only necessary items are present; clutter is well controlled.",
        (Sort, Medium) => "Some unneeded items remain. Red-tag and remove what is not used daily.",
        (Sort, Low) => "The area is cluttered. Separate necessary from unnecessary items first.",
        (SetInOrder, High) => "Items have clear, labelled homes and are easy to retrieve.",
        (SetInOrder, Medium) => "Storage exists but locations are inconsistent or unlabelled.",
        (SetInOrder, Low) => "Items lack assigned places. Define and mark a home for each tool.",
        (Shine, High) => "Surfaces and equipment are clean and well maintained.",
        (Shine, Medium) => "Cleaning is irregular; dust or debris is visible in places.",
        (Shine, Low) => "The area is dirty. Establish a daily cleaning routine.",
        (Standardize, High) => "Visual standards and checklists are consistently applied.",
        (Standardize, Medium) => "Some standards exist but are not applied everywhere.",
        (Standardize, Low) => "No visible standards. Document the expected state of the area.",
        (Sustain, High) => "5S habits are embedded and routinely audited.",
        (Sustain, Medium) => "Practices are followed intermittently. Schedule regular audits.",
        (Sustain, Low) => "Improvements are not maintained. Assign ownership and review cadence.",
    }
}
