//! Champion browser: loads the catalog once, filters it in memory and drills
//! down into one selected champion at a time.

pub mod detail;
pub mod filter;

use crate::config::CatalogConfig;
use crate::fetch::{FetchCycle, ReadySignal};
use crate::gateway::CatalogSource;
use crate::models::{CatalogEntry, DetailRecord};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{info, warn};

use self::detail::{DetailLoader, DetailState};
use self::filter::{RoleFilter, filter};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: String,
    pub role: RoleFilter,
}

/// What the browser is showing right now.
#[derive(Debug, Clone)]
pub enum BrowserView {
    /// Catalog not loaded yet.
    Loading,
    List {
        entries: Vec<CatalogEntry>,
        query: CatalogQuery,
    },
    Detail {
        entry: Option<CatalogEntry>,
        state: DetailState,
    },
}

pub struct ChampionBrowser {
    catalog: FetchCycle<Vec<CatalogEntry>>,
    details: DetailLoader,
    query: Mutex<CatalogQuery>,
    ready: ReadySignal,
}

impl ChampionBrowser {
    pub fn new(source: Arc<dyn CatalogSource>, config: &CatalogConfig) -> Self {
        let catalog_source = Arc::clone(&source);
        let catalog = FetchCycle::new("catalog", move || {
            let source = Arc::clone(&catalog_source);
            async move { source.champions().await }
        })
        .on_ready(|entries: &Vec<CatalogEntry>| info!("Catalog loaded: {} champions", entries.len()));

        Self {
            catalog,
            details: DetailLoader::new(source, config.cache_details),
            query: Mutex::new(CatalogQuery::default()),
            ready: ReadySignal::new(),
        }
    }

    fn query_lock(&self) -> MutexGuard<'_, CatalogQuery> {
        self.query.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Load the catalog once; ready fires whether or not it succeeded.
    pub async fn init(&self) {
        let _ = self.catalog.refresh().await;
        self.ready.mark();
    }

    pub async fn wait_ready(&self) {
        self.ready.wait().await;
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.catalog.subscribe()
    }

    pub fn entries(&self) -> Arc<Vec<CatalogEntry>> {
        self.catalog.value().unwrap_or_default()
    }

    pub fn set_search(&self, term: &str) {
        self.query_lock().search = term.to_string();
    }

    pub fn set_role(&self, role: RoleFilter) {
        self.query_lock().role = role;
    }

    pub fn query(&self) -> CatalogQuery {
        self.query_lock().clone()
    }

    /// Entries passing the current query, catalog order preserved.
    pub fn visible(&self) -> Vec<CatalogEntry> {
        let entries = self.entries();
        let q = self.query();
        filter(&entries, &q.search, &q.role).into_iter().cloned().collect()
    }

    pub fn find(&self, id: &str) -> Option<CatalogEntry> {
        self.entries().iter().find(|e| e.id == id).cloned()
    }

    /// Open the detail view for `id`.
    pub async fn open(&self, id: &str) -> Option<Arc<DetailRecord>> {
        if self.catalog.value().is_some() && self.find(id).is_none() {
            warn!("{} is not in the catalog", id);
        }
        self.details.select(id).await
    }

    /// Return to the list view.
    pub fn back(&self) {
        self.details.deselect();
    }

    pub fn view(&self) -> BrowserView {
        if let Some(id) = self.details.selected() {
            return BrowserView::Detail {
                entry: self.find(&id),
                state: self.details.state(),
            };
        }

        if !self.ready.is_ready() {
            return BrowserView::Loading;
        }
        BrowserView::List {
            entries: self.visible(),
            query: self.query(),
        }
    }
}
