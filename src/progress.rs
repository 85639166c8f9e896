//! Traffic-light classification of stored progress values.
//!
//! Progress is whatever the store holds for an objective or key result. It is
//! never recomputed from `current_value / target_value`.

use serde::Serialize;

use crate::models::Okr;

pub const HEALTHY_AT: f64 = 75.0;
pub const CAUTION_AT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressHealth {
    Healthy,
    Caution,
    OffTrack,
}

impl ProgressHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Caution => "caution",
            Self::OffTrack => "off-track",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Healthy => "progress-green",
            Self::Caution => "progress-yellow",
            Self::OffTrack => "progress-red",
        }
    }
}

/// Same thresholds at objective and key-result level. NaN reads as off-track.
pub fn classify(progress: f64) -> ProgressHealth {
    if progress >= HEALTHY_AT {
        ProgressHealth::Healthy
    } else if progress >= CAUTION_AT {
        ProgressHealth::Caution
    } else {
        ProgressHealth::OffTrack
    }
}

/// Width of a progress bar in percent.
pub fn bar_width(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyResultProgress {
    pub id: String,
    pub percent: f64,
    pub health: ProgressHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectiveProgress {
    pub percent: f64,
    pub health: ProgressHealth,
    pub key_results: Vec<KeyResultProgress>,
}

pub fn assess(okr: &Okr) -> ObjectiveProgress {
    ObjectiveProgress {
        percent: okr.progress,
        health: classify(okr.progress),
        key_results: okr
            .key_results
            .iter()
            .map(|kr| KeyResultProgress {
                id: kr.id.clone(),
                percent: kr.progress,
                health: classify(kr.progress),
            })
            .collect(),
    }
}
