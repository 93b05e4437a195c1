//! Selection-keyed detail loader.
//!
//! Each selection gets a generation number. A response is stored only if its
//! generation is still current, so a slow fetch for an earlier selection can
//! never overwrite the detail of a newer one.

use crate::gateway::CatalogSource;
use crate::models::DetailRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    /// Nothing selected: the list view is showing.
    Empty,
    Loading { id: String },
    Loaded(Arc<DetailRecord>),
    /// Last fetch for the selection failed; reselect or go back.
    Failed { id: String, error: String },
}

struct LoaderState {
    selected: Option<String>,
    generation: u64,
    state: DetailState,
    cache: Option<HashMap<String, Arc<DetailRecord>>>,
}

pub struct DetailLoader {
    source: Arc<dyn CatalogSource>,
    inner: Mutex<LoaderState>,
}

impl DetailLoader {
    pub fn new(source: Arc<dyn CatalogSource>, cache_details: bool) -> Self {
        Self {
            source,
            inner: Mutex::new(LoaderState {
                selected: None,
                generation: 0,
                state: DetailState::Empty,
                cache: cache_details.then(HashMap::new),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoaderState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Select `id` and fetch its detail.
    ///
    /// Returns the record if it was stored, `None` if the fetch failed or a
    /// newer selection superseded it.
    pub async fn select(&self, id: &str) -> Option<Arc<DetailRecord>> {
        let generation = {
            let mut st = self.lock();

            if st.selected.as_deref() == Some(id) {
                match &st.state {
                    DetailState::Loaded(record) => return Some(Arc::clone(record)),
                    // Already on its way; the in-flight request will store it.
                    DetailState::Loading { .. } => return None,
                    _ => {}
                }
            }

            st.generation += 1;
            st.selected = Some(id.to_string());

            if let Some(record) = st.cache.as_ref().and_then(|c| c.get(id)).cloned() {
                debug!("{}: detail served from cache", id);
                st.state = DetailState::Loaded(Arc::clone(&record));
                return Some(record);
            }

            st.state = DetailState::Loading { id: id.to_string() };
            st.generation
        };

        info!("Loading detail for {}", id);
        let mut pending = PendingLoad {
            loader: self,
            id,
            generation,
            finished: false,
        };
        let result = self.source.champion_detail(id).await;
        pending.finished = true;

        let mut st = self.lock();
        if st.generation != generation {
            debug!("{}: discarding superseded detail response", id);
            return None;
        }

        match result {
            Ok(record) if record.id == id => {
                let record = Arc::new(record);
                if let Some(cache) = st.cache.as_mut() {
                    cache.insert(id.to_string(), Arc::clone(&record));
                }
                st.state = DetailState::Loaded(Arc::clone(&record));
                Some(record)
            }
            Ok(record) => {
                warn!("{}: detail response carried id {}", id, record.id);
                st.state = DetailState::Failed {
                    id: id.to_string(),
                    error: format!("response for {}", record.id),
                };
                None
            }
            Err(e) => {
                warn!("{}: detail fetch failed: {}", id, e);
                st.state = DetailState::Failed {
                    id: id.to_string(),
                    error: e.to_string(),
                };
                None
            }
        }
    }

    /// Back to the list. Any in-flight response is discarded on arrival.
    pub fn deselect(&self) {
        let mut st = self.lock();
        st.generation += 1;
        st.selected = None;
        st.state = DetailState::Empty;
    }

    pub fn selected(&self) -> Option<String> {
        self.lock().selected.clone()
    }

    pub fn state(&self) -> DetailState {
        self.lock().state.clone()
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.lock().state, DetailState::Loading { .. })
    }

    pub fn detail(&self) -> Option<Arc<DetailRecord>> {
        match &self.lock().state {
            DetailState::Loaded(record) => Some(Arc::clone(record)),
            _ => None,
        }
    }
}

/// Marks the selection's load as failed if the `select` future is dropped
/// before the response arrives, so the same id can be reselected.
struct PendingLoad<'a> {
    loader: &'a DetailLoader,
    id: &'a str,
    generation: u64,
    finished: bool,
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut st = self.loader.lock();
        if st.generation == self.generation && matches!(st.state, DetailState::Loading { .. }) {
            debug!("{}: detail request cancelled", self.id);
            st.state = DetailState::Failed {
                id: self.id.to_string(),
                error: "request cancelled".to_string(),
            };
        }
    }
}
