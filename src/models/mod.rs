use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Price ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceSample {
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn arrow(self) -> &'static str {
        match self {
            Direction::Up => "↗",
            Direction::Down => "↘",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Prediction {
    pub predicted_price: f64,
    pub direction: Direction,
    /// Magnitude only, two decimals; `direction` carries the sign.
    pub change_percent: f64,
    pub confidence_score: u8,
    pub timeframe_label: &'static str,
    pub narrative_quote: &'static str,
    pub generated_at: DateTime<Utc>,
}

// ── Champion catalog ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub display_name: String,
    pub title: String,
    pub image_ref: String,
    /// Distinct role tags in source order.
    pub tags: Vec<String>,
    pub difficulty_score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=3 => Difficulty::Easy,
            4..=6 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        };
        f.write_str(s)
    }
}

impl CatalogEntry {
    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_score(self.difficulty_score)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

// ── Champion detail ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AbilitySlot {
    Q,
    W,
    E,
    R,
}

impl AbilitySlot {
    pub const ALL: [AbilitySlot; 4] = [AbilitySlot::Q, AbilitySlot::W, AbilitySlot::E, AbilitySlot::R];
}

impl fmt::Display for AbilitySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassiveAbility {
    pub name: String,
    /// Rich text as served by the catalog source (may contain markup).
    pub description: String,
    pub image_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ability {
    pub slot: AbilitySlot,
    pub name: String,
    pub description: String,
    pub image_ref: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeScores {
    pub attack: u8,
    pub defense: u8,
    pub magic: u8,
    pub difficulty: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailRecord {
    pub id: String,
    pub display_name: String,
    pub title: String,
    pub tags: Vec<String>,
    pub lore: String,
    pub passive: PassiveAbility,
    pub abilities: Vec<Ability>,
    pub ally_tips: Vec<String>,
    pub enemy_tips: Vec<String>,
    pub attributes: AttributeScores,
}

// ── Raw wire types (Data Dragon) ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImage {
    #[serde(default)]
    pub full: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInfo {
    #[serde(default)]
    pub attack: f64,
    #[serde(default)]
    pub defense: f64,
    #[serde(default)]
    pub magic: f64,
    #[serde(default)]
    pub difficulty: f64,
}

/// One value of the `champion.json` `data` map
#[derive(Debug, Clone, Deserialize)]
pub struct RawChampion {
    /// Falls back to the map key when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub info: RawInfo,
    #[serde(default)]
    pub image: RawImage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSpell {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: RawImage,
}

/// One value of the `champion/{id}.json` `data` map
#[derive(Debug, Clone, Deserialize)]
pub struct RawChampionDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub lore: String,
    pub passive: RawSpell,
    pub spells: Vec<RawSpell>,
    #[serde(default)]
    pub allytips: Vec<String>,
    #[serde(default)]
    pub enemytips: Vec<String>,
    #[serde(default)]
    pub info: RawInfo,
}
