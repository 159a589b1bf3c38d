// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Coarse traffic density of a route segment.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CongestionCategory {
    /// No traffic signal was available for the segment.
    #[default]
    Unknown = 0,
    Low = 1,
    Moderate = 2,
    Heavy = 3,
    Severe = 4,
}

impl CongestionCategory {
    /// Marker/line color used to present this category, as a CSS hex string:
    /// neutral gray, green, yellow, orange and red respectively.
    pub fn color(self) -> &'static str {
        match self {
            Self::Unknown => "#9e9e9e",
            Self::Low => "#4caf50",
            Self::Moderate => "#ffeb3b",
            Self::Heavy => "#ff9800",
            Self::Severe => "#f44336",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::Heavy => "heavy",
            Self::Severe => "severe",
        }
    }
}

impl std::fmt::Display for CongestionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speed-related annotations of a single route segment,
/// used by [classify] when no explicit congestion signal is present.
///
/// Non-finite values are treated as absent.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SegmentContext {
    /// Observed speed, in meters per second.
    pub speed_mps: Option<f64>,

    /// Speed limit, in meters per second.
    pub max_speed_mps: Option<f64>,

    /// Length of the segment, in meters.
    pub distance_m: Option<f64>,

    /// Travel time over the segment, in seconds.
    pub duration_s: Option<f64>,
}

impl SegmentContext {
    /// Speed over the segment: the observed speed, or else distance over duration.
    pub fn effective_speed(&self) -> Option<f64> {
        if let Some(speed) = finite(self.speed_mps) {
            return Some(speed);
        }

        match (finite(self.distance_m), finite(self.duration_s)) {
            (Some(distance), Some(duration)) if duration > 0.0 => Some(distance / duration),
            _ => None,
        }
    }
}

#[inline]
fn finite(x: Option<f64>) -> Option<f64> {
    x.filter(|v| v.is_finite())
}

/// Normalizes heterogeneous traffic signals of a segment into a [CongestionCategory].
///
/// Signals are tried in order, and the first one which resolves wins:
/// 1. a case-insensitive substring match on `label`
///    ("severe", "heavy", "moderate"/"slow", "light"/"free"/"low"),
/// 2. `numeric` code: 1 → low, 2 → moderate, 3 → heavy, 4 → severe,
/// 3. the effective speed from `context` - relative to the speed limit if one is known,
///    absolute (in km/h) otherwise.
///
/// Returns [CongestionCategory::Unknown] if nothing resolves.
pub fn classify(
    label: Option<&str>,
    numeric: Option<i64>,
    context: Option<&SegmentContext>,
) -> CongestionCategory {
    if let Some(category) = label.and_then(classify_label) {
        return category;
    }

    if let Some(category) = numeric.and_then(classify_numeric) {
        return category;
    }

    context
        .and_then(classify_speed)
        .unwrap_or(CongestionCategory::Unknown)
}

fn classify_label(label: &str) -> Option<CongestionCategory> {
    let label = label.to_lowercase();
    if label.contains("severe") {
        Some(CongestionCategory::Severe)
    } else if label.contains("heavy") {
        Some(CongestionCategory::Heavy)
    } else if label.contains("moderate") || label.contains("slow") {
        Some(CongestionCategory::Moderate)
    } else if label.contains("light") || label.contains("free") || label.contains("low") {
        Some(CongestionCategory::Low)
    } else {
        None
    }
}

fn classify_numeric(code: i64) -> Option<CongestionCategory> {
    match code {
        1 => Some(CongestionCategory::Low),
        2 => Some(CongestionCategory::Moderate),
        3 => Some(CongestionCategory::Heavy),
        4 => Some(CongestionCategory::Severe),
        _ => None,
    }
}

fn classify_speed(context: &SegmentContext) -> Option<CongestionCategory> {
    let speed = context.effective_speed()?;

    let category = match finite(context.max_speed_mps).filter(|&max| max > 0.0) {
        Some(max_speed) => {
            let ratio = speed / max_speed;
            if ratio <= 0.25 {
                CongestionCategory::Severe
            } else if ratio <= 0.40 {
                CongestionCategory::Heavy
            } else if ratio <= 0.65 {
                CongestionCategory::Moderate
            } else {
                CongestionCategory::Low
            }
        }

        None => {
            let kmh = speed * 3.6;
            if kmh <= 10.0 {
                CongestionCategory::Severe
            } else if kmh <= 20.0 {
                CongestionCategory::Heavy
            } else if kmh <= 35.0 {
                CongestionCategory::Moderate
            } else {
                CongestionCategory::Low
            }
        }
    };

    Some(category)
}
