//! Price widget: polls the price source, keeps a sliding history window and
//! regenerates the prediction after every successful fetch.

pub mod history;
pub mod predictor;

use crate::config::PriceConfig;
use crate::fetch::{FetchCycle, ReadySignal};
use crate::gateway::{FetchError, PriceSource};
use crate::models::{PriceSample, Prediction};
use crate::scheduler::{Countdown, CountdownScheduler, Refresh, SchedulerHandle};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::info;

use self::history::PriceHistory;
use self::predictor::{RandomSource, generate};

struct Derived {
    history: PriceHistory,
    prediction: Option<Prediction>,
    rng: Box<dyn RandomSource + Send>,
}

fn lock(derived: &Mutex<Derived>) -> MutexGuard<'_, Derived> {
    derived.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything a renderer needs, copied out of the widget.
#[derive(Debug, Clone)]
pub struct PriceView {
    pub latest: Option<PriceSample>,
    pub prediction: Option<Prediction>,
    pub history: PriceHistory,
    pub busy: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub remaining_secs: u64,
}

pub struct PriceWidget {
    cycle: FetchCycle<PriceSample>,
    derived: Arc<Mutex<Derived>>,
    countdown: Arc<Countdown>,
    ready: ReadySignal,
}

impl PriceWidget {
    pub fn new(
        source: Arc<dyn PriceSource>,
        config: &PriceConfig,
        rng: Box<dyn RandomSource + Send>,
    ) -> Arc<Self> {
        let derived = Arc::new(Mutex::new(Derived {
            history: PriceHistory::new(config.history_capacity),
            prediction: None,
            rng,
        }));

        let sink = Arc::clone(&derived);
        let cycle = FetchCycle::new("price", move || {
            let source = Arc::clone(&source);
            async move {
                let price = source.current_price().await?;
                Ok::<_, FetchError>(PriceSample {
                    price,
                    observed_at: Utc::now(),
                })
            }
        })
        .on_ready(move |sample: &PriceSample| {
            let mut guard = lock(&sink);
            let d = &mut *guard;
            d.history.push(*sample);
            d.prediction = Some(generate(sample.price, d.rng.as_mut()));
        });

        Arc::new(Self {
            cycle,
            derived,
            countdown: Arc::new(Countdown::new(config.refresh_interval_secs)),
            ready: ReadySignal::new(),
        })
    }

    /// Initial load. Marks the widget ready whether or not the fetch succeeded.
    pub async fn init(&self) {
        let _ = self.refresh().await;
        self.ready.mark();
    }

    pub async fn wait_ready(&self) {
        self.ready.wait().await;
    }

    /// User-triggered refresh. Restarts the countdown so the scheduler does
    /// not fire right behind it.
    pub async fn refresh(&self) -> Result<Arc<PriceSample>, FetchError> {
        self.countdown.reset();
        self.cycle.refresh().await
    }

    /// Start the countdown. The returned handle owns the timer.
    pub fn start(self: &Arc<Self>) -> SchedulerHandle {
        let target: Arc<dyn Refresh> = self.clone();
        CountdownScheduler::spawn(Arc::clone(&self.countdown), target)
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.cycle.subscribe()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.countdown.remaining()
    }

    pub fn view(&self) -> PriceView {
        let snap = self.cycle.snapshot();
        let d = lock(&self.derived);
        PriceView {
            latest: snap.value.as_deref().copied(),
            prediction: d.prediction.clone(),
            history: d.history.clone(),
            busy: snap.busy,
            last_updated: snap.last_updated,
            last_error: snap.last_error,
            remaining_secs: self.countdown.remaining(),
        }
    }
}

#[async_trait]
impl Refresh for PriceWidget {
    async fn refresh_due(&self) {
        info!("Scheduled price refresh");
        let _ = self.cycle.refresh().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Replays prices in order; `None` is a failed fetch. Repeats the last
    /// entry once the script runs out.
    struct ScriptedPrices {
        script: Mutex<VecDeque<Option<f64>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedPrices {
        fn new(script: &[Option<f64>]) -> Arc<Self> {
            Self::slow(script, Duration::ZERO)
        }

        fn slow(script: &[Option<f64>], delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.iter().copied().collect()),
                calls: AtomicUsize::new(0),
                delay,
            })
        }
    }

    #[async_trait]
    impl PriceSource for ScriptedPrices {
        async fn current_price(&self) -> Result<f64, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            let mut script = self.script.lock().unwrap();
            let next = if script.len() > 1 {
                script.pop_front().flatten()
            } else {
                script.front().copied().flatten()
            };
            next.ok_or(FetchError::MissingField("market_data"))
        }
    }

    fn widget(source: Arc<ScriptedPrices>, interval: u64) -> Arc<PriceWidget> {
        let config = PriceConfig {
            refresh_interval_secs: interval,
            ..PriceConfig::default()
        };
        PriceWidget::new(source, &config, Box::new(StdRng::seed_from_u64(1)))
    }

    #[tokio::test]
    async fn test_init_fetches_and_predicts() {
        let source = ScriptedPrices::new(&[Some(100_000.0)]);
        let w = widget(source.clone(), 3600);
        w.init().await;
        w.wait_ready().await;

        let view = w.view();
        assert_eq!(view.latest.map(|s| s.price), Some(100_000.0));
        assert_eq!(view.history.len(), 1);
        assert!(view.prediction.is_some());
        assert!(!view.busy);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_init_still_signals_ready() {
        let w = widget(ScriptedPrices::new(&[None]), 3600);
        w.init().await;
        w.wait_ready().await;

        let view = w.view();
        assert!(view.latest.is_none());
        assert!(view.prediction.is_none());
        assert!(view.last_error.is_some());
    }

    #[tokio::test]
    async fn test_failure_keeps_stale_price_and_prediction() {
        let w = widget(ScriptedPrices::new(&[Some(50.0), None]), 3600);
        w.refresh().await.unwrap();
        let before = w.view().prediction.unwrap();

        assert!(w.refresh().await.is_err());
        let view = w.view();
        assert_eq!(view.latest.map(|s| s.price), Some(50.0));
        assert_eq!(view.prediction, Some(before));
        assert_eq!(view.history.len(), 1);
    }

    #[tokio::test]
    async fn test_each_success_replaces_prediction() {
        let w = widget(ScriptedPrices::new(&[Some(10.0), Some(20.0)]), 3600);
        w.refresh().await.unwrap();
        w.refresh().await.unwrap();

        let view = w.view();
        let p = view.prediction.unwrap();
        // Prediction tracks the latest price band, not the first.
        assert!(p.predicted_price > 20.0 * 0.87 && p.predicted_price < 20.0 * 1.13);
    }

    #[tokio::test]
    async fn test_history_is_bounded_window() {
        let prices: Vec<Option<f64>> = (1..=30).map(|i| Some(i as f64)).collect();
        let w = widget(ScriptedPrices::new(&prices), 3600);
        for _ in 0..30 {
            w.refresh().await.unwrap();
        }

        let view = w.view();
        assert_eq!(view.history.len(), 24);
        assert_eq!(view.history.iter().next().map(|s| s.price), Some(7.0));
        assert_eq!(view.history.latest().map(|s| s.price), Some(30.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_refresh_fires_each_interval() {
        let source = ScriptedPrices::new(&[Some(1.0)]);
        let w = widget(source.clone(), 5);
        w.init().await;
        let handle = w.start();

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(w.view().history.len(), 3);

        handle.stop().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_resets_countdown() {
        let source = ScriptedPrices::new(&[Some(1.0)]);
        let w = widget(source.clone(), 5);
        let _handle = w.start();

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(w.remaining_secs(), 1);
        w.refresh().await.unwrap();
        assert_eq!(w.remaining_secs(), 5);

        // The tick that would have fired only decrements.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(w.remaining_secs(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopping_mid_fetch_clears_busy() {
        let source = ScriptedPrices::slow(&[Some(1.0)], Duration::from_secs(10));
        let w = widget(source.clone(), 2);
        let handle = w.start();

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(w.view().busy);

        handle.stop().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        let view = w.view();
        assert!(!view.busy);
        assert!(view.latest.is_none());

        // A restarted widget polls normally again.
        let _handle = w.start();
        tokio::time::sleep(Duration::from_millis(12_500)).await;
        assert!(w.view().latest.is_some());
    }
}
