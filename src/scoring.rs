//! Score banding shared by every surface that renders a score label.
//!
//! The rubric prompt, the results page, and the results email all read the
//! same thresholds from here; the label text differs per surface but the
//! band boundaries must never diverge.

/// Lower bound of the valid score range.
pub const SCORE_MIN: i32 = 0;
/// Upper bound of the valid score range.
pub const SCORE_MAX: i32 = 100;

/// Allowed categories for an analysis recommendation.
pub const RECOMMENDATION_CATEGORIES: [&str; 5] =
    ["Design", "Performance", "SEO", "Mobile", "Content"];

/// Bounds on the number of recommendations a valid analysis carries.
pub const MIN_RECOMMENDATIONS: usize = 4;
pub const MAX_RECOMMENDATIONS: usize = 8;

/// A score band. Thresholds: 86-100, 71-85, 41-70, 0-40.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Excellent,
    Good,
    NeedsImprovement,
    Critical,
}

impl ScoreBand {
    /// Classifies a score. Scores outside [0, 100] are clamped into the
    /// nearest band so a label can always be rendered.
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 86 => ScoreBand::Excellent,
            s if s >= 71 => ScoreBand::Good,
            s if s >= 41 => ScoreBand::NeedsImprovement,
            _ => ScoreBand::Critical,
        }
    }

    /// Inclusive score range covered by this band.
    pub fn range(&self) -> (i32, i32) {
        match self {
            ScoreBand::Excellent => (86, 100),
            ScoreBand::Good => (71, 85),
            ScoreBand::NeedsImprovement => (41, 70),
            ScoreBand::Critical => (0, 40),
        }
    }

    /// Guideline text used in the scoring prompt.
    pub fn rubric_guideline(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent (be conservative with high scores)",
            ScoreBand::Good => "Good but room for optimization",
            ScoreBand::NeedsImprovement => "Needs improvement, missing opportunities",
            ScoreBand::Critical => "Critical issues that are losing business",
        }
    }

    /// Label shown on the results page.
    pub fn results_label(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::Good => "Good, but...",
            ScoreBand::NeedsImprovement => "Needs Improvement",
            ScoreBand::Critical => "Critical - Losing Business",
        }
    }

    /// Label used in the results email.
    pub fn email_label(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Strong Foundation",
            ScoreBand::Good => "Missing Easy Wins",
            ScoreBand::NeedsImprovement => "Losing Ground to Competitors",
            ScoreBand::Critical => "Bleeding Clients Daily",
        }
    }

    /// All bands, highest first. Drives the prompt guideline block.
    pub fn all() -> [ScoreBand; 4] {
        [
            ScoreBand::Excellent,
            ScoreBand::Good,
            ScoreBand::NeedsImprovement,
            ScoreBand::Critical,
        ]
    }
}

/// Renders the "Scoring Guidelines" block for the rubric prompt, lowest
/// band first to match the original instruction ordering.
pub fn scoring_guidelines() -> String {
    let mut bands = ScoreBand::all();
    bands.reverse();
    bands
        .iter()
        .map(|band| {
            let (lo, hi) = band.range();
            format!("- {}-{}: {}", lo, hi, band.rubric_guideline())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
