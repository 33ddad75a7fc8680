use anyhow::Context;
use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

// IANA zone, so EST/EDT switches follow the tz database.
const DEFAULT_ZONE: Tz = chrono_tz::America::Toronto;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vibe {
    pub season: Season,
    pub time_of_day: TimeOfDay,
    pub alert: &'static str,
}

pub fn derive_vibe(local: NaiveDateTime) -> Vibe {
    let season = match local.month() {
        12 | 1 | 2 => Season::Winter,
        3..=5 => Season::Spring,
        6..=8 => Season::Summer,
        _ => Season::Fall,
    };

    let time_of_day = match local.hour() {
        5..=11 => TimeOfDay::Morning,
        12..=16 => TimeOfDay::Afternoon,
        17..=20 => TimeOfDay::Evening,
        _ => TimeOfDay::Night,
    };

    let alert = match (season, time_of_day) {
        (Season::Winter, TimeOfDay::Night) => {
            "No heat tonight? Our after-hours furnace crews are dispatching now."
        }
        (Season::Winter, _) => "Cold snap across the GTA: same-day furnace repair available.",
        (Season::Summer, TimeOfDay::Night) => {
            "AC quit on a hot night? After-hours cooling techs are on call."
        }
        (Season::Summer, _) => "Heat wave alert: book AC repair before the rush.",
        (Season::Spring, _) => "Spring AC tune-up season: beat the summer backlog.",
        (Season::Fall, _) => "Furnace tune-up season: get winter-ready before the first freeze.",
    };

    Vibe {
        season,
        time_of_day,
        alert,
    }
}

pub fn derive_vibe_at<Z: TimeZone>(now_utc: DateTime<Utc>, zone: &Z) -> Vibe {
    derive_vibe(now_utc.with_timezone(zone).naive_local())
}

/// Zone used for the vibe banner. `VIBE_TIMEZONE` takes an IANA name.
pub fn local_zone() -> anyhow::Result<Tz> {
    parse_zone(std::env::var("VIBE_TIMEZONE").ok().as_deref())
}

fn parse_zone(name: Option<&str>) -> anyhow::Result<Tz> {
    match name.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid VIBE_TIMEZONE: {name}")),
        None => Ok(DEFAULT_ZONE),
    }
}
