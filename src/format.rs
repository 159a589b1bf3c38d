// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Human-readable presentation of navigation data.

use crate::route::Maneuver;

/// Formats a distance in meters, e.g. "12.5 km", "25 km", "340 m" or "7 m".
///
/// Distances of at least a kilometer are shown with one decimal place below 10 km.
/// Shorter distances are rounded to 10 meters from 100 meters, and to a whole meter
/// (at least one) below that.
pub fn format_distance(meters: f64) -> String {
    if meters >= 10_000.0 {
        format!("{:.0} km", meters / 1000.0)
    } else if meters >= 1000.0 {
        format!("{:.1} km", meters / 1000.0)
    } else if meters >= 100.0 {
        format!("{} m", (meters / 10.0).round() as i64 * 10)
    } else {
        format!("{} m", (meters.round() as i64).max(1))
    }
}

/// Formats a duration in seconds, e.g. "1h 5m" or "12m".
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).max(0.0);
    let hours = (minutes / 60.0).floor();
    let rest = (minutes % 60.0).round();
    if hours > 0.0 {
        format!("{}h {}m", hours as i64, rest as i64)
    } else {
        format!("{}m", rest as i64)
    }
}

fn direction(modifier: Option<&str>) -> &'static str {
    match modifier.map(|m| m.to_lowercase()).as_deref() {
        Some("left") => "left",
        Some("right") => "right",
        Some("slight left") => "slightly left",
        Some("slight right") => "slightly right",
        Some("sharp left") => "sharp left",
        Some("sharp right") => "sharp right",
        Some("uturn") => "around",
        _ => "straight",
    }
}

/// Renders an English instruction for a [Maneuver], e.g. "Turn left onto Main Street, then go 300 m".
///
/// `name` is the name of the road traveled on after the maneuver, and `distance` (meters)
/// is the length of the step which the maneuver starts. Unknown maneuver types fall back
/// to the API's own instruction text.
pub fn describe_maneuver(maneuver: &Maneuver, name: Option<&str>, distance: Option<f64>) -> String {
    let onto = match name {
        Some(n) if !n.is_empty() && !n.eq_ignore_ascii_case("unnamed road") => format!(" onto {n}"),
        _ => String::default(),
    };
    let dist = distance
        .filter(|&d| d.is_finite() && d > 0.0)
        .map(format_distance);
    let then = |prefix: &str| {
        dist.as_ref()
            .map(|d| format!("{prefix}{d}"))
            .unwrap_or_default()
    };

    let modifier = maneuver.modifier.as_deref();
    let dir = direction(modifier);
    let is_straight = dir == "straight";
    let exit = maneuver.exit;

    match maneuver.kind.as_deref().map(|k| k.to_lowercase()).as_deref() {
        Some("depart") => format!("Depart{onto}"),
        Some("arrive") => "Arrive at your destination".to_string(),
        Some("continue") if is_straight => format!("Continue straight{}{onto}", then(" for ")),
        Some("continue") => format!("Continue {dir}{}{onto}", then(" for ")),
        Some("turn") if modifier == Some("uturn") => format!("Make a U-turn{onto}"),
        Some("turn") => format!("Turn {dir}{onto}{}", then(", then go ")),
        Some("new name") => format!("Continue{onto}{}", then(" for ")),
        Some("merge") => format!("Merge{onto}{}", then(" and go ")),
        Some("on ramp") => format!("Take the ramp{onto}{}", then(" and go ")),
        Some("off ramp") => format!("Take the exit{onto}{}", then(" and go ")),
        Some("fork") => format!("Keep {dir} at the fork{onto}{}", then(" for ")),
        Some("end of road") => {
            format!("At the end of the road, turn {dir}{onto}{}", then(" and go "))
        }
        Some("roundabout") | Some("rotary") => match exit {
            Some(n) => format!("Enter the roundabout and take exit {n}{onto}"),
            None => format!("Enter the roundabout{onto}"),
        },
        Some("roundabout turn") => match exit {
            Some(n) => format!("At the roundabout, turn {dir} at exit {n}{onto}"),
            None => format!("At the roundabout, turn {dir}{onto}"),
        },
        Some("exit roundabout") | Some("exit rotary") => format!("Exit the roundabout{onto}"),
        Some("use lane") => "Use the indicated lane".to_string(),
        Some("notification") => "Keep going".to_string(),
        _ => maneuver
            .instruction
            .as_deref()
            .filter(|i| !i.is_empty())
            .unwrap_or("Continue along the route")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maneuver(kind: &str, modifier: Option<&str>) -> Maneuver {
        Maneuver {
            kind: Some(kind.to_string()),
            modifier: modifier.map(|m| m.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn distances() {
        assert_eq!(format_distance(0.2), "1 m");
        assert_eq!(format_distance(7.4), "7 m");
        assert_eq!(format_distance(99.0), "99 m");
        assert_eq!(format_distance(344.0), "340 m");
        assert_eq!(format_distance(1000.76), "1.0 km");
        assert_eq!(format_distance(9940.0), "9.9 km");
        assert_eq!(format_distance(12_600.0), "13 km");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0.0), "0m");
        assert_eq!(format_duration(720.0), "12m");
        assert_eq!(format_duration(3900.0), "1h 5m");
        assert_eq!(format_duration(7200.0), "2h 0m");
    }

    #[test]
    fn maneuvers() {
        assert_eq!(
            describe_maneuver(&maneuver("turn", Some("left")), Some("Main Street"), Some(300.0)),
            "Turn left onto Main Street, then go 300 m"
        );
        assert_eq!(
            describe_maneuver(&maneuver("turn", Some("uturn")), None, Some(300.0)),
            "Make a U-turn"
        );
        assert_eq!(
            describe_maneuver(&maneuver("new name", Some("straight")), Some("Hang Bai"), Some(1000.76)),
            "Continue onto Hang Bai for 1.0 km"
        );
        assert_eq!(
            describe_maneuver(&maneuver("continue", Some("slight right")), None, Some(50.0)),
            "Continue slightly right for 50 m"
        );
        assert_eq!(
            describe_maneuver(&maneuver("depart", None), Some("unnamed road"), None),
            "Depart"
        );
        assert_eq!(
            describe_maneuver(&maneuver("arrive", Some("left")), Some("Main Street"), Some(0.0)),
            "Arrive at your destination"
        );
    }

    #[test]
    fn roundabouts() {
        let mut m = maneuver("roundabout", None);
        m.exit = Some(2);
        assert_eq!(
            describe_maneuver(&m, Some("Ring Road"), None),
            "Enter the roundabout and take exit 2 onto Ring Road"
        );

        assert_eq!(
            describe_maneuver(&maneuver("exit rotary", None), None, None),
            "Exit the roundabout"
        );
    }

    #[test]
    fn unknown_maneuver_uses_api_instruction() {
        let mut m = maneuver("teleport", None);
        assert_eq!(describe_maneuver(&m, None, None), "Continue along the route");

        m.instruction = Some("Board the ferry".to_string());
        assert_eq!(describe_maneuver(&m, None, None), "Board the ferry");

        assert_eq!(
            describe_maneuver(&Maneuver::default(), None, None),
            "Continue along the route"
        );
    }
}
