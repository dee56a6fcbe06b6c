//! Deterministic aspect/portrait derivation engine. Pure derivation
//! functions transform raw chart payloads into compact, ranked
//! representations; the async wrappers fetch payloads through the
//! `ChartProvider` seam and memoize model-generated records.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::debug;

use crate::traits::ChartProvider;

mod cache;
mod generate;
mod prompts;
mod types;

pub use cache::MemoCache;
pub use generate::StructuredGenerator;
pub use types::{
    AspectClass, DailyTransit, EngineError, KeyAspect, NatalChart, Placement, Portrait,
    PortraitSection, RankedAspect,
};

/// The five aspect types that matter for both portraits and transits.
const KEY_ASPECT_TYPES: [&str; 5] = ["Conjunction", "Opposition", "Square", "Trine", "Sextile"];

/// The fixed planet set kept in natal profiles.
const PLANETS: [&str; 10] = [
    "Sun", "Moon", "Mercury", "Venus", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune", "Pluto",
];

/// Maximum orb per transiting body. Fast-moving personal bodies get wide
/// orbs; slow outer bodies only matter when the aspect is near exact.
static ORB_RULES: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("Moon", 1.5),
        ("Sun", 2.5),
        ("Mercury", 2.5),
        ("Venus", 2.5),
        ("Mars", 2.5),
        ("Jupiter", 1.0),
        ("Saturn", 1.0),
        ("Uranus", 1.0),
        ("Neptune", 1.0),
        ("Pluto", 1.0),
        ("Chiron", 1.0),
        ("True North Node", 1.0),
        ("True South Node", 1.0),
        ("Lilith", 1.5),
        ("Ascendant", 2.5),
        ("Midheaven", 2.5),
    ])
});

/// Orb limit for transiting bodies not in the table.
const DEFAULT_ORB_LIMIT: f64 = 2.5;

/// Round to `places` decimals, half away from zero (`f64::round` scaled).
/// All degree/orb rounding in the engine goes through this so exact-value
/// comparisons stay consistent.
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Orb values arrive as numbers from some providers and numeric strings
/// from others.
fn orb_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Derive the natal profile, filtered key aspects, and house-cusp map from
/// a raw natal planet-position payload.
///
/// Fails with [`EngineError::ChartProvider`] when the payload's status
/// indicator is not `"ok"`. Bodies outside the fixed planet set are
/// dropped; `"Ascendant"` and `"Mid Heaven"` angles map to the
/// `Ascendant`/`MidHeaven` profile entries (no house). Aspect order is
/// preserved from the payload.
pub fn derive_profile(payload: &Value) -> Result<NatalChart, EngineError> {
    if payload["status"] != "ok" {
        return Err(EngineError::ChartProvider(payload.to_string()));
    }

    let data = &payload["data"];
    let empty = Vec::new();
    let planet_positions = data["planet_positions"].as_array().unwrap_or(&empty);
    let angles = data["angles"].as_array().unwrap_or(&empty);
    let aspects = data["aspects"].as_array().unwrap_or(&empty);
    let houses = data["houses"].as_array().unwrap_or(&empty);

    let mut profile = HashMap::new();

    for p in planet_positions {
        let Some(name) = p["name"].as_str() else {
            continue;
        };
        if !PLANETS.contains(&name) {
            continue;
        }
        profile.insert(
            name.to_string(),
            Placement {
                sign: p["zodiac"]["name"].as_str().unwrap_or_default().to_string(),
                house: p["house_number"].as_i64(),
                degree: round_to(p["degree"].as_f64().unwrap_or(0.0), 1),
            },
        );
    }

    for a in angles {
        let key = match a["name"].as_str() {
            Some("Ascendant") => "Ascendant",
            Some("Mid Heaven") => "MidHeaven",
            _ => continue,
        };
        profile.insert(
            key.to_string(),
            Placement {
                sign: a["zodiac"]["name"].as_str().unwrap_or_default().to_string(),
                house: None,
                degree: round_to(a["degree"].as_f64().unwrap_or(0.0), 1),
            },
        );
    }

    let mut key_aspects = Vec::new();
    for asp in aspects {
        let Some(aspect_type) = asp["aspect"]["name"].as_str() else {
            continue;
        };
        if !KEY_ASPECT_TYPES.contains(&aspect_type) {
            continue;
        }
        let (Some(p1), Some(p2), Some(orb)) = (
            asp["planet_one"]["name"].as_str(),
            asp["planet_two"]["name"].as_str(),
            orb_value(&asp["orb"]),
        ) else {
            continue;
        };
        key_aspects.push(KeyAspect {
            planet_one: p1.to_string(),
            planet_two: p2.to_string(),
            aspect_type: aspect_type.to_string(),
            orb: round_to(orb, 2),
        });
    }

    let mut house_cusps = HashMap::new();
    for h in houses {
        let (Some(number), Some(sign)) = (
            h["number"].as_i64(),
            h["start_cusp"]["zodiac"]["name"].as_str(),
        ) else {
            continue;
        };
        house_cusps.insert(number.to_string(), sign.to_string());
    }

    Ok(NatalChart {
        profile,
        key_aspects,
        house_cusps,
    })
}

/// Rank transit-to-natal aspects from a raw transit payload.
///
/// Entries missing a body name, aspect type, or orb are discarded, as are
/// types outside the key-aspect set and orbs beyond the transiting body's
/// limit (`ORB_RULES`, keyed by `planet_one`). Each class is sorted
/// ascending by orb — the sort is stable, so equal orbs keep payload
/// order — and the result is the first `top_k` Hard entries followed by
/// the first `top_k` Soft entries, not globally re-sorted.
pub fn rank_transit_aspects(payload: &Value, top_k: usize) -> Vec<RankedAspect> {
    let empty = Vec::new();
    let raw = payload["data"]["transit_natal_aspects"]
        .as_array()
        .unwrap_or(&empty);

    let mut hard = Vec::new();
    let mut soft = Vec::new();

    for item in raw {
        let (Some(transit_planet), Some(natal_planet), Some(aspect_name), Some(orb)) = (
            item["planet_one"]["name"].as_str(),
            item["planet_two"]["name"].as_str(),
            item["aspect"]["name"].as_str(),
            orb_value(&item["orb"]),
        ) else {
            continue;
        };

        if !KEY_ASPECT_TYPES.contains(&aspect_name) {
            continue;
        }

        let orb_limit = ORB_RULES
            .get(transit_planet)
            .copied()
            .unwrap_or(DEFAULT_ORB_LIMIT);
        if orb > orb_limit {
            continue;
        }

        let class = if aspect_name == "Square" || aspect_name == "Opposition" {
            AspectClass::Hard
        } else {
            AspectClass::Soft
        };
        let entry = RankedAspect {
            event: format!(
                "Transit {} {} Natal {}",
                transit_planet, aspect_name, natal_planet
            ),
            orb: round_to(orb, 2),
            class,
        };
        match class {
            AspectClass::Hard => hard.push(entry),
            AspectClass::Soft => soft.push(entry),
        }
    }

    let by_orb =
        |a: &RankedAspect, b: &RankedAspect| a.orb.partial_cmp(&b.orb).unwrap_or(Ordering::Equal);
    hard.sort_by(by_orb);
    soft.sort_by(by_orb);

    hard.truncate(top_k);
    soft.truncate(top_k);
    hard.extend(soft);
    hard
}

/// Tropical sun sign for a calendar date.
pub fn sun_sign(date: NaiveDate) -> &'static str {
    match (date.month(), date.day()) {
        (3, 21..) | (4, ..=19) => "Aries",
        (4, 20..) | (5, ..=20) => "Taurus",
        (5, 21..) | (6, ..=20) => "Gemini",
        (6, 21..) | (7, ..=22) => "Cancer",
        (7, 23..) | (8, ..=22) => "Leo",
        (8, 23..) | (9, ..=22) => "Virgo",
        (9, 23..) | (10, ..=22) => "Libra",
        (10, 23..) | (11, ..=21) => "Scorpio",
        (11, 22..) | (12, ..=21) => "Sagittarius",
        (12, 22..) | (1, ..=19) => "Capricorn",
        (1, 20..) | (2, ..=18) => "Aquarius",
        _ => "Pisces",
    }
}

/// Memo key for a generated daily transit: the full semantic argument
/// tuple, including the optional caller-supplied portrait (hashed by
/// field value).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DailyTransitKey {
    birth_datetime: String,
    birth_coordinates: String,
    transit_datetime: String,
    current_coordinates: String,
    portrait: Option<Portrait>,
}

/// The astrological data engine: chart derivation plus memoized
/// model-generated portraits and daily transits.
pub struct ZodiacEngine {
    chart: Arc<dyn ChartProvider>,
    generator: StructuredGenerator,
    transit_top_k: usize,
    portraits: MemoCache<(String, String), Portrait>,
    daily_transits: MemoCache<DailyTransitKey, DailyTransit>,
}

impl ZodiacEngine {
    pub fn new(
        chart: Arc<dyn ChartProvider>,
        generator: StructuredGenerator,
        transit_top_k: usize,
    ) -> Self {
        Self {
            chart,
            generator,
            transit_top_k,
            portraits: MemoCache::new(),
            daily_transits: MemoCache::new(),
        }
    }

    /// Fetch and derive the natal chart for a datetime + coordinates pair.
    pub async fn natal_chart(
        &self,
        datetime: &str,
        coordinates: &str,
    ) -> anyhow::Result<NatalChart> {
        let payload = self.chart.natal_planet_position(datetime, coordinates).await?;
        let chart = derive_profile(&payload)?;
        debug!(
            bodies = chart.profile.len(),
            aspects = chart.key_aspects.len(),
            "Derived natal chart"
        );
        Ok(chart)
    }

    /// Fetch and rank the transit aspects for a user at a specific time.
    pub async fn transit_natal_aspects(
        &self,
        birth_datetime: &str,
        birth_coordinates: &str,
        transit_datetime: &str,
        current_coordinates: &str,
    ) -> anyhow::Result<Vec<RankedAspect>> {
        let payload = self
            .chart
            .transit_planet_position(
                birth_datetime,
                birth_coordinates,
                transit_datetime,
                current_coordinates,
            )
            .await?;
        Ok(rank_transit_aspects(&payload, self.transit_top_k))
    }
}
