//! Headless price-prediction and champion-browser widgets.
//!
//! Both widgets share one shape: fetch, derive presentation state, keep it
//! fresh (a countdown for prices, a selection for champion details), and
//! expose snapshots for a renderer.

pub mod catalog;
pub mod config;
pub mod display;
pub mod fetch;
pub mod gateway;
pub mod models;
pub mod price;
pub mod scheduler;
pub mod utils;
