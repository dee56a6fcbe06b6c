use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One body's placement in the natal profile. Angles (Ascendant/MidHeaven)
/// carry no house number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub sign: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house: Option<i64>,
    /// Rounded to 1 decimal place, half away from zero.
    pub degree: f64,
}

/// A natal aspect kept by the key-aspect filter. Order is the payload's
/// insertion order; portraits are never re-ranked.
///
/// Serialized field names match the wire shape the model sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyAspect {
    #[serde(rename = "p1")]
    pub planet_one: String,
    #[serde(rename = "p2")]
    pub planet_two: String,
    #[serde(rename = "type")]
    pub aspect_type: String,
    /// Rounded to 2 decimal places.
    pub orb: f64,
}

/// Derived natal chart: per-body placements, filtered aspects, and the
/// sign on each house's starting cusp (keyed `"1"`..`"12"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatalChart {
    pub profile: HashMap<String, Placement>,
    pub key_aspects: Vec<KeyAspect>,
    pub house_cusps: HashMap<String, String>,
}

/// Hard aspects produce tension (Square, Opposition); everything else
/// kept by the filter is Soft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectClass {
    Hard,
    Soft,
}

/// A transit aspect that survived the orb filter, ranked by significance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAspect {
    /// `"Transit <P1> <AspectType> Natal <P2>"`.
    pub event: String,
    pub orb: f64,
    #[serde(rename = "type")]
    pub class: AspectClass,
}

/// One named section of the generated portrait.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortraitSection {
    pub content: String,
    /// One sentence.
    pub summary: String,
}

/// The model-generated natal portrait. Exactly these four sections; any
/// other shape fails validation and triggers a retry. Hashed and compared
/// by field value so it can participate in memo-cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Portrait {
    pub core_identity: PortraitSection,
    pub psychological_dynamics: PortraitSection,
    pub drive_career_values: PortraitSection,
    pub growth_pathway: PortraitSection,
}

/// The model-generated "daily vibe check".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DailyTransit {
    pub headline: String,
    pub mood_word: String,
    pub the_tension: String,
    pub the_shift: String,
    pub pro_tip: String,
}

/// Classified engine error — tells the caller which derivation or
/// generation step failed.
#[derive(Debug)]
pub enum EngineError {
    /// The chart payload's status indicator was not success.
    ChartProvider(String),
    /// The model never produced a schema-conforming portrait.
    PortraitGeneration { attempts: u32 },
    /// The model never produced a schema-conforming daily transit.
    DailyTransitGeneration { attempts: u32 },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ChartProvider(msg) => write!(f, "Chart provider error: {}", msg),
            EngineError::PortraitGeneration { attempts } => write!(
                f,
                "Failed to generate a valid portrait after {} attempts",
                attempts
            ),
            EngineError::DailyTransitGeneration { attempts } => write!(
                f,
                "Failed to generate a valid daily transit after {} attempts",
                attempts
            ),
        }
    }
}

impl std::error::Error for EngineError {}
