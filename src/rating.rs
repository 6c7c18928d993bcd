//! Human-facing labels for raw metric values.

/// Speed band for a WPM figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
pub enum SpeedTier {
    Beginner,
    Average,
    Good,
    Excellent,
    Professional,
}

impl SpeedTier {
    pub fn from_wpm(wpm: u32) -> Self {
        match wpm {
            0..=29 => SpeedTier::Beginner,
            30..=49 => SpeedTier::Average,
            50..=69 => SpeedTier::Good,
            70..=89 => SpeedTier::Excellent,
            _ => SpeedTier::Professional,
        }
    }
}

/// Description of a flow score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
pub enum FlowLevel {
    Calm,
    #[strum(serialize = "Light Breeze")]
    LightBreeze,
    #[strum(serialize = "Moderate Breeze")]
    ModerateBreeze,
    #[strum(serialize = "Strong Breeze")]
    StrongBreeze,
    #[strum(serialize = "Hurricane Force")]
    HurricaneForce,
}

impl FlowLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => FlowLevel::HurricaneForce,
            60..=79 => FlowLevel::StrongBreeze,
            40..=59 => FlowLevel::ModerateBreeze,
            20..=39 => FlowLevel::LightBreeze,
            _ => FlowLevel::Calm,
        }
    }
}

/// Overall verdict combining speed, accuracy and (optionally) flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum_macros::Display)]
pub enum PerformanceRating {
    #[strum(serialize = "Needs Practice")]
    NeedsPractice,
    Average,
    Good,
    Excellent,
}

impl PerformanceRating {
    /// When `flow` is `None` only speed and accuracy are considered.
    pub fn rate(wpm: u32, accuracy: u32, flow: Option<u32>) -> Self {
        const BANDS: [(u32, u32, u32, PerformanceRating); 3] = [
            (60, 95, 80, PerformanceRating::Excellent),
            (40, 90, 60, PerformanceRating::Good),
            (20, 85, 40, PerformanceRating::Average),
        ];

        BANDS
            .iter()
            .find(|(min_wpm, min_acc, min_flow, _)| {
                wpm >= *min_wpm && accuracy >= *min_acc && flow.map_or(true, |f| f >= *min_flow)
            })
            .map(|(_, _, _, rating)| *rating)
            .unwrap_or(PerformanceRating::NeedsPractice)
    }
}

/// `M:SS` rendering of a second count
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
