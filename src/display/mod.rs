//! Terminal rendering of widget state.

use crate::catalog::detail::DetailState;
use crate::catalog::{BrowserView, CatalogQuery};
use crate::gateway::{DataDragonClient, FetchError};
use crate::models::{CatalogEntry, DetailRecord};
use crate::price::PriceView;
use crate::utils::{bar, fmt_countdown, fmt_usd, strip_markup};

const RULE: &str = "─────────────────────────────────────────────";
/// Tips shown per side in the detail view.
const MAX_TIPS: usize = 3;

pub fn render_price(view: &PriceView) -> String {
    let mut out = Vec::new();
    out.push(RULE.to_string());
    out.push("  BTC price prediction".to_string());
    out.push(RULE.to_string());

    match &view.latest {
        Some(sample) => {
            let busy = if view.busy { "  (updating…)" } else { "" };
            out.push(format!("  Current  : {}{}", fmt_usd(sample.price), busy));
        }
        None if view.busy => out.push("  Current  : loading…".to_string()),
        None => out.push("  Current  : unavailable".to_string()),
    }
    if let Some(at) = view.last_updated {
        out.push(format!("  Updated  : {}", at.format("%H:%M:%S")));
    }
    out.push(format!("  Next in  : {}", fmt_countdown(view.remaining_secs)));

    if let Some(p) = &view.prediction {
        out.push(String::new());
        out.push(format!("  \"{}\"", p.narrative_quote));
        out.push(format!(
            "  Predicted: {} {} {:.2}%  ({})",
            fmt_usd(p.predicted_price),
            p.direction.arrow(),
            p.change_percent,
            p.timeframe_label
        ));
        out.push(format!(
            "  Confidence: {}% {}",
            p.confidence_score,
            bar(f64::from(p.confidence_score), 20)
        ));
        out.push(format!("  Generated: {}", p.generated_at.format("%Y-%m-%d %H:%M:%S")));
    }

    if !view.history.is_empty() {
        out.push(String::new());
        out.push(format!(
            "  Price movement ({}/{} samples, oldest first)",
            view.history.len(),
            view.history.capacity()
        ));
        for (sample, height) in view.history.iter().zip(view.history.bar_heights()) {
            out.push(format!(
                "  {}  {:>10}  {}",
                sample.observed_at.format("%H:%M:%S"),
                fmt_usd(sample.price),
                bar(height, 20)
            ));
        }
    }

    out.push(RULE.to_string());
    out.push("  Not financial advice. [r] refresh  [q] quit".to_string());
    out.join("\n")
}

fn entry_line(e: &CatalogEntry) -> String {
    let tags: Vec<&str> = e.tags.iter().take(2).map(String::as_str).collect();
    format!(
        "  {:<14} {:<30} {:<18} {}",
        e.display_name,
        e.title,
        tags.join(", "),
        e.difficulty()
    )
}

pub fn render_list(entries: &[CatalogEntry], query: &CatalogQuery) -> String {
    let mut out = vec![
        format!(
            "Found {} champions (search: {:?}, role: {})",
            entries.len(),
            query.search,
            query.role
        ),
        RULE.to_string(),
    ];
    out.extend(entries.iter().map(entry_line));
    out.join("\n")
}

fn score_line(label: &str, score: u8) -> String {
    format!("  {:<10} {:>2}/10 {}", label, score, bar(f64::from(score) * 10.0, 10))
}

pub fn render_detail(d: &DetailRecord) -> String {
    let mut out = vec![
        RULE.to_string(),
        format!("  {} — {}", d.display_name, d.title),
        format!("  {}", d.tags.join(", ")),
        RULE.to_string(),
        score_line("Attack", d.attributes.attack),
        score_line("Defense", d.attributes.defense),
        score_line("Magic", d.attributes.magic),
        score_line("Difficulty", d.attributes.difficulty),
        String::new(),
        format!("  {}", d.lore),
        String::new(),
        format!("  Passive: {}", d.passive.name),
        format!("    {}", strip_markup(&d.passive.description)),
    ];

    for ability in &d.abilities {
        out.push(format!("  {}: {}", ability.slot, ability.name));
        out.push(format!("    {}", strip_markup(&ability.description)));
    }

    if !d.ally_tips.is_empty() {
        out.push(String::new());
        out.push(format!("  Playing as {}", d.display_name));
        out.extend(d.ally_tips.iter().take(MAX_TIPS).map(|t| format!("    • {}", t)));
    }
    if !d.enemy_tips.is_empty() {
        out.push(String::new());
        out.push(format!("  Playing against {}", d.display_name));
        out.extend(d.enemy_tips.iter().take(MAX_TIPS).map(|t| format!("    • {}", t)));
    }

    out.join("\n")
}

/// Artwork URLs for a champion, one per line.
pub fn render_assets(
    dragon: &DataDragonClient,
    d: &DetailRecord,
    entry: Option<&CatalogEntry>,
) -> Result<String, FetchError> {
    let mut out = vec![String::new(), "  Artwork".to_string()];
    if let Some(e) = entry {
        out.push(format!("    icon     {}", dragon.champion_icon_url(&e.image_ref)?));
    }
    out.push(format!("    splash   {}", dragon.splash_url(&d.id)?));
    out.push(format!("    passive  {}", dragon.passive_icon_url(&d.passive.image_ref)?));
    for ability in &d.abilities {
        out.push(format!("    {:<8} {}", ability.slot, dragon.spell_icon_url(&ability.image_ref)?));
    }
    Ok(out.join("\n"))
}

pub fn render_browser(view: &BrowserView) -> String {
    match view {
        BrowserView::Loading => "Summoning champions…".to_string(),
        BrowserView::List { entries, query } => render_list(entries, query),
        BrowserView::Detail { entry, state } => {
            let name = entry
                .as_ref()
                .map(|e| e.display_name.clone())
                .unwrap_or_default();
            match state {
                DetailState::Loaded(d) => render_detail(d),
                DetailState::Loading { id } => format!("Loading {}…", id),
                DetailState::Failed { id, error } => format!(
                    "Could not load {} ({}): {}. Try `open` again or `back`.",
                    id, name, error
                ),
                DetailState::Empty => String::new(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::filter::RoleFilter;
    use crate::models::PriceSample;
    use crate::price::history::PriceHistory;
    use chrono::Utc;

    #[test]
    fn test_list_shows_two_tags_and_difficulty() {
        let entry = CatalogEntry {
            id: "Ahri".into(),
            display_name: "Ahri".into(),
            title: "the Nine-Tailed Fox".into(),
            image_ref: "Ahri.png".into(),
            tags: vec!["Mage".into(), "Assassin".into(), "Support".into()],
            difficulty_score: 5,
        };
        let query = CatalogQuery { search: String::new(), role: RoleFilter::All };
        let text = render_list(&[entry], &query);

        assert!(text.starts_with("Found 1 champions"));
        assert!(text.contains("Mage, Assassin"));
        assert!(!text.contains("Support"));
        assert!(text.contains("Medium"));
    }

    #[test]
    fn test_price_view_shows_window_fill() {
        let mut history = PriceHistory::new(24);
        for price in [100.0, 150.0] {
            history.push(PriceSample { price, observed_at: Utc::now() });
        }
        let view = PriceView {
            latest: history.latest().copied(),
            prediction: None,
            history,
            busy: false,
            last_updated: None,
            last_error: None,
            remaining_secs: 3599,
        };
        let text = render_price(&view);

        assert!(text.contains("2/24 samples"));
        assert!(text.contains("$150"));
        assert!(text.contains("00:59:59"));
    }

    #[test]
    fn test_failed_detail_suggests_recovery() {
        let view = BrowserView::Detail {
            entry: None,
            state: DetailState::Failed { id: "Ahri".into(), error: "HTTP 404".into() },
        };
        let text = render_browser(&view);
        assert!(text.contains("Could not load Ahri"));
        assert!(text.contains("back"));
    }
}
