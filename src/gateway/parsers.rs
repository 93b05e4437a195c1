use crate::models::{
    Ability, AbilitySlot, AttributeScores, CatalogEntry, DetailRecord, PassiveAbility,
    RawChampion, RawChampionDetail, RawInfo,
};
use serde_json::Value;
use tracing::warn;

use super::FetchError;

// ── Price ─────────────────────────────────────────────────────────────────────

const PRICE_POINTER: &str = "/market_data/current_price/usd";

/// Extract `market_data.current_price.usd`; it must be a positive number.
pub fn parse_current_price(body: &Value) -> Result<f64, FetchError> {
    let price = body
        .pointer(PRICE_POINTER)
        .and_then(Value::as_f64)
        .ok_or(FetchError::MissingField("market_data.current_price.usd"))?;

    if !price.is_finite() || price <= 0.0 {
        return Err(FetchError::MissingField("market_data.current_price.usd"));
    }
    Ok(price)
}

// ── Catalog ───────────────────────────────────────────────────────────────────

/// Score fields arrive as JSON numbers; clamp into 0..=10.
fn score(v: f64) -> u8 {
    v.round().clamp(0.0, 10.0) as u8
}

fn attributes(info: &RawInfo) -> AttributeScores {
    AttributeScores {
        attack: score(info.attack),
        defense: score(info.defense),
        magic: score(info.magic),
        difficulty: score(info.difficulty),
    }
}

fn distinct(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

fn data_map(body: &Value) -> Result<&serde_json::Map<String, Value>, FetchError> {
    body.get("data")
        .and_then(Value::as_object)
        .ok_or(FetchError::MissingField("data"))
}

/// Parse `champion.json` into entries, keeping the source order of the `data` map.
///
/// Malformed entries are skipped with a warning; a missing `data` map fails the fetch.
pub fn parse_catalog(body: &Value) -> Result<Vec<CatalogEntry>, FetchError> {
    let data = data_map(body)?;
    let mut entries = Vec::with_capacity(data.len());

    for (key, value) in data {
        let raw: RawChampion = match serde_json::from_value(value.clone()) {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping catalog entry {}: {}", key, e);
                continue;
            }
        };

        entries.push(CatalogEntry {
            difficulty_score: score(raw.info.difficulty),
            id: raw.id.unwrap_or_else(|| key.clone()),
            display_name: raw.name,
            title: raw.title,
            image_ref: raw.image.full,
            tags: distinct(raw.tags),
        });
    }

    Ok(entries)
}

/// Parse `champion/{id}.json`; the record must be keyed by the requested id.
pub fn parse_detail(body: &Value, id: &str) -> Result<DetailRecord, FetchError> {
    let value = data_map(body)?
        .get(id)
        .ok_or(FetchError::MissingField("data.<id>"))?;
    let raw: RawChampionDetail = serde_json::from_value(value.clone())?;

    if raw.spells.len() < AbilitySlot::ALL.len() {
        return Err(FetchError::MissingField("spells"));
    }
    if raw.spells.len() > AbilitySlot::ALL.len() {
        warn!("{}: {} spells, keeping the first 4", id, raw.spells.len());
    }

    let abilities = AbilitySlot::ALL
        .iter()
        .zip(raw.spells)
        .map(|(slot, spell)| Ability {
            slot: *slot,
            name: spell.name,
            description: spell.description,
            image_ref: spell.image.full,
        })
        .collect();

    Ok(DetailRecord {
        attributes: attributes(&raw.info),
        id: raw.id,
        display_name: raw.name,
        title: raw.title,
        tags: distinct(raw.tags),
        lore: raw.lore,
        passive: PassiveAbility {
            name: raw.passive.name,
            description: raw.passive.description,
            image_ref: raw.passive.image.full,
        },
        abilities,
        ally_tips: raw.allytips,
        enemy_tips: raw.enemytips,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spell(name: &str) -> Value {
        json!({ "name": name, "description": "Deals <b>damage</b>.", "image": { "full": format!("{name}.png") } })
    }

    #[test]
    fn test_parse_current_price() {
        let body = json!({ "market_data": { "current_price": { "usd": 104696.5, "eur": 1.0 } } });
        assert_eq!(parse_current_price(&body).unwrap(), 104696.5);
    }

    #[test]
    fn test_price_missing_market_data_is_fetch_failure() {
        let err = parse_current_price(&json!({ "id": "bitcoin" })).unwrap_err();
        assert!(matches!(err, FetchError::MissingField(_)));
    }

    #[test]
    fn test_price_must_be_positive() {
        let body = json!({ "market_data": { "current_price": { "usd": 0 } } });
        assert!(parse_current_price(&body).is_err());
        let body = json!({ "market_data": { "current_price": { "usd": "100" } } });
        assert!(parse_current_price(&body).is_err());
    }

    #[test]
    fn test_parse_catalog_keeps_source_order() {
        let body = json!({ "data": {
            "Zed": { "id": "Zed", "name": "Zed", "title": "the Master of Shadows",
                     "tags": ["Assassin"], "info": { "difficulty": 7 }, "image": { "full": "Zed.png" } },
            "Ahri": { "id": "Ahri", "name": "Ahri", "title": "the Nine-Tailed Fox",
                      "tags": ["Mage", "Assassin", "Mage"], "info": { "difficulty": 5 }, "image": { "full": "Ahri.png" } },
            "Broken": { "title": "no id or name" }
        }});

        let entries = parse_catalog(&body).unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["Zed", "Ahri"]);
        assert_eq!(entries[1].tags, ["Mage", "Assassin"]);
        assert_eq!(entries[1].difficulty_score, 5);
        assert_eq!(entries[0].image_ref, "Zed.png");
    }

    #[test]
    fn test_catalog_id_defaults_to_map_key() {
        let body = json!({ "data": {
            "MonkeyKing": { "name": "Wukong", "title": "the Monkey King", "tags": ["Fighter"] }
        }});

        let entries = parse_catalog(&body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "MonkeyKing");
        assert_eq!(entries[0].display_name, "Wukong");
    }

    #[test]
    fn test_catalog_without_data_fails() {
        assert!(matches!(
            parse_catalog(&json!({ "type": "champion" })),
            Err(FetchError::MissingField("data"))
        ));
    }

    #[test]
    fn test_parse_detail() {
        let body = json!({ "data": { "Ahri": {
            "id": "Ahri", "name": "Ahri", "title": "the Nine-Tailed Fox", "tags": ["Mage"],
            "lore": "Innately connected to the magic of the spirit realm...",
            "passive": spell("Essence Theft"),
            "spells": [spell("Orb"), spell("Fox-Fire"), spell("Charm"), spell("Spirit Rush")],
            "allytips": ["a", "b", "c", "d"],
            "enemytips": [],
            "info": { "attack": 3, "defense": 4, "magic": 8, "difficulty": 5 }
        }}});

        let d = parse_detail(&body, "Ahri").unwrap();
        assert_eq!(d.passive.name, "Essence Theft");
        assert_eq!(d.abilities.len(), 4);
        assert_eq!(d.abilities[3].slot, AbilitySlot::R);
        assert_eq!(d.abilities[3].name, "Spirit Rush");
        assert_eq!(d.ally_tips.len(), 4);
        assert_eq!(
            d.attributes,
            AttributeScores { attack: 3, defense: 4, magic: 8, difficulty: 5 }
        );
    }

    #[test]
    fn test_detail_keyed_by_other_id_fails() {
        let body = json!({ "data": { "Garen": {} } });
        assert!(parse_detail(&body, "Ahri").is_err());
    }

    #[test]
    fn test_detail_with_too_few_spells_fails() {
        let body = json!({ "data": { "Ahri": {
            "id": "Ahri", "name": "Ahri", "passive": spell("p"), "spells": [spell("Orb")]
        }}});
        assert!(matches!(parse_detail(&body, "Ahri"), Err(FetchError::MissingField("spells"))));
    }
}
