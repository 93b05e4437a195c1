//! Randomised placeholder "prediction". It has no predictive value; the draws
//! are isolated behind [`RandomSource`] so tests can script them.

use crate::models::{Direction, Prediction};
use chrono::Utc;

/// Half-open unit draws, `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

impl<R: rand::Rng + ?Sized> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.r#gen::<f64>()
    }
}

pub const VOLATILITY: f64 = 0.15;
pub const TREND_STEP: f64 = 0.05;
/// Draws above this trend upward (60% of the unit interval).
pub const UP_THRESHOLD: f64 = 0.4;
pub const CONFIDENCE_MIN: u8 = 75;
pub const CONFIDENCE_MAX: u8 = 95;
pub const TIMEFRAMES: [&str; 2] = ["24 hours", "next week"];

pub const QUOTES: [&str; 8] = [
    "Bitcoin will reach new heights as institutional adoption accelerates.",
    "The fundamentals are stronger than ever. BTC is digital gold.",
    "Market cycles are natural. Long-term vision is what matters.",
    "Regulation brings clarity, and clarity brings confidence.",
    "The next bull run will surprise everyone with its magnitude.",
    "Bitcoin's scarcity will drive unprecedented price discovery.",
    "Global economic uncertainty makes Bitcoin more attractive.",
    "We're still early in the crypto revolution.",
];

fn pick<T: Copy>(rng: &mut (impl RandomSource + ?Sized), items: &[T]) -> T {
    let idx = (rng.next_unit() * items.len() as f64) as usize;
    items[idx.min(items.len() - 1)]
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Draw order: trend, noise, timeframe, confidence, quote.
pub fn generate(current_price: f64, rng: &mut (impl RandomSource + ?Sized)) -> Prediction {
    let trend = if rng.next_unit() > UP_THRESHOLD { 1.0 } else { -1.0 };
    let noise = (rng.next_unit() - 0.5) * VOLATILITY;
    let predicted_price = current_price * (1.0 + trend * TREND_STEP + noise);

    let timeframe_label = pick(rng, &TIMEFRAMES);
    let span = f64::from(CONFIDENCE_MAX - CONFIDENCE_MIN + 1);
    let confidence_score =
        (CONFIDENCE_MIN + (rng.next_unit() * span) as u8).min(CONFIDENCE_MAX);
    let narrative_quote = pick(rng, &QUOTES);

    let direction = if predicted_price > current_price {
        Direction::Up
    } else {
        Direction::Down
    };
    let change = (predicted_price - current_price) / current_price * 100.0;

    Prediction {
        predicted_price,
        direction,
        change_percent: round2(change.abs()),
        confidence_score,
        timeframe_label,
        narrative_quote,
        generated_at: Utc::now(),
    }
}
