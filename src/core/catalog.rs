use crate::core::filter::{apply_filters, country_facets, search, sort_by_name};
use crate::core::write_queue::WriteQueue;
use crate::core::{
    CountryFacet, FilterState, LoadState, RemoteCatalogSource, SelectionPersistence, StoreWarning,
    University,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

pub const LOAD_ALL_ERROR: &str = "Oops! We couldn't load the universities. Please try again.";
pub const LOAD_COUNTRY_ERROR: &str =
    "Oops! We couldn't load the universities for the selected country. Please try again.";

/// Everything a view needs to render the browse screen.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub load_state: LoadState,
    /// Full catalog from the last successful full fetch, sorted by name.
    pub all_universities: Vec<Arc<University>>,
    pub country_facets: Vec<CountryFacet>,
    pub filtered: Vec<Arc<University>>,
    pub filter: FilterState,
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self {
            load_state: LoadState::Idle,
            all_universities: Vec::new(),
            country_facets: Vec::new(),
            filtered: Vec::new(),
            filter: FilterState::default(),
        }
    }
}

/// Owns the catalog, the country facets, the active filters and the
/// filtered view.
///
/// Every fetch takes a ticket when it starts. A response whose ticket is no
/// longer the latest does not touch the view or the load state, so the view
/// always follows the most recently started request rather than the last one
/// to finish. A successful full fetch still refreshes the catalog and facets.
pub struct CatalogStore {
    source: Arc<dyn RemoteCatalogSource>,
    persistence: Arc<dyn SelectionPersistence>,
    writes: WriteQueue,
    country_key: String,
    state: watch::Sender<CatalogSnapshot>,
    warnings: broadcast::Sender<StoreWarning>,
    latest_ticket: AtomicU64,
}

impl CatalogStore {
    pub fn new(
        source: Arc<dyn RemoteCatalogSource>,
        persistence: Arc<dyn SelectionPersistence>,
        country_key: impl Into<String>,
    ) -> Self {
        let (warnings, _) = broadcast::channel(16);
        let (state, _) = watch::channel(CatalogSnapshot::default());
        let writes = WriteQueue::spawn(persistence.clone(), warnings.clone());

        Self {
            source,
            persistence,
            writes,
            country_key: country_key.into(),
            state,
            warnings,
            latest_ticket: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CatalogSnapshot> {
        self.state.subscribe()
    }

    pub fn warnings(&self) -> broadcast::Receiver<StoreWarning> {
        self.warnings.subscribe()
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.state.borrow().clone()
    }

    pub fn load_state(&self) -> LoadState {
        self.state.borrow().load_state.clone()
    }

    pub fn filtered(&self) -> Vec<Arc<University>> {
        self.state.borrow().filtered.clone()
    }

    pub fn filter(&self) -> FilterState {
        self.state.borrow().filter.clone()
    }

    pub fn country_facets(&self) -> Vec<CountryFacet> {
        self.state.borrow().country_facets.clone()
    }

    /// Waits for pending writes of the remembered country.
    pub async fn flush(&self) {
        self.writes.flush().await;
    }

    /// Loads the full catalog, then restores the remembered country. A
    /// remembered country is served by a country-scoped fetch.
    pub async fn initialize(&self) {
        tracing::info!("Initializing catalog");
        self.load_all(true).await;
    }

    /// Remembers `country` and fetches its universities from the source.
    /// An empty country means "all" and reloads the full catalog.
    pub async fn set_selected_country(&self, country: &str) {
        tracing::info!("Selecting country {:?}", country);
        self.writes.enqueue(&self.country_key, country.to_string());
        self.state
            .send_modify(|s| s.filter.selected_country = country.to_string());

        if country.is_empty() {
            self.load_all(false).await;
        } else {
            self.load_country(country).await;
        }
    }

    /// Repeats the fetch behind the current view: the full catalog when no
    /// country is selected, the country-scoped fetch otherwise.
    pub async fn reload_catalog(&self) {
        let country = self.state.borrow().filter.selected_country.clone();
        tracing::info!("Reloading catalog (country: {:?})", country);

        if country.is_empty() {
            self.load_all(false).await;
        } else {
            self.load_country(&country).await;
        }
    }

    /// Local recomputation from the full catalog; never touches the network.
    pub fn set_search_term(&self, term: &str) {
        self.state.send_modify(|s| {
            s.filter.search_term = term.to_string();
            s.filtered = apply_filters(&s.all_universities, &s.filter);
        });
        tracing::debug!(
            "Search {:?} matched {} universities",
            term,
            self.state.borrow().filtered.len()
        );
    }

    fn begin_fetch(&self) -> u64 {
        let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|s| s.load_state = LoadState::Loading);
        ticket
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.latest_ticket.load(Ordering::SeqCst) == ticket
    }

    async fn load_all(&self, restore_selection: bool) {
        let ticket = self.begin_fetch();
        let result = self.source.fetch_all().await;

        let mut all: Vec<Arc<University>> = match result {
            Ok(list) => list.into_iter().map(Arc::new).collect(),
            Err(e) => {
                tracing::warn!("Full catalog fetch failed: {}", e);
                if self.is_current(ticket) {
                    self.state.send_modify(|s| {
                        s.load_state = LoadState::Error(LOAD_ALL_ERROR.to_string())
                    });
                }
                return;
            }
        };
        sort_by_name(&mut all);
        let facets = country_facets(&all);
        tracing::info!(
            "Loaded {} universities across {} countries",
            all.len(),
            facets.len() - 1
        );

        // The catalog and facets are kept even when a newer request owns the view.
        self.state.send_modify(|s| {
            s.all_universities = all;
            s.country_facets = facets;
        });

        if !self.is_current(ticket) {
            tracing::debug!("Newer request owns the view, skipping it (ticket {})", ticket);
            return;
        }

        let remembered = if restore_selection {
            self.remembered_country().await
        } else {
            None
        };

        if !self.is_current(ticket) {
            tracing::debug!("Selection changed while restoring, keeping newer view");
            return;
        }

        match remembered {
            Some(country) => {
                tracing::info!("Restoring remembered country {:?}", country);
                self.state
                    .send_modify(|s| s.filter.selected_country = country.clone());
                self.load_country(&country).await;
            }
            None => self.state.send_modify(|s| {
                s.filtered = search(&s.all_universities, &s.filter.search_term);
                s.load_state = LoadState::Ready;
            }),
        }
    }

    async fn load_country(&self, country: &str) {
        let ticket = self.begin_fetch();
        let result = self.source.fetch_by_country(country).await;

        if !self.is_current(ticket) {
            tracing::debug!(
                "Discarding stale response for {:?} (ticket {})",
                country,
                ticket
            );
            return;
        }

        match result {
            Ok(list) => {
                let mut universities: Vec<Arc<University>> =
                    list.into_iter().map(Arc::new).collect();
                sort_by_name(&mut universities);
                tracing::info!("Loaded {} universities for {:?}", universities.len(), country);

                self.state.send_modify(|s| {
                    s.filtered = search(&universities, &s.filter.search_term);
                    s.load_state = LoadState::Ready;
                });
            }
            Err(e) => {
                tracing::warn!("Fetch for {:?} failed: {}", country, e);
                self.state.send_modify(|s| {
                    s.load_state = LoadState::Error(LOAD_COUNTRY_ERROR.to_string())
                });
            }
        }
    }

    async fn remembered_country(&self) -> Option<String> {
        match self.persistence.get(&self.country_key).await {
            Ok(Some(country)) if !country.is_empty() => Some(country),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Could not read remembered country: {}", e);
                let _ = self.warnings.send(StoreWarning::HydrationFailed {
                    key: self.country_key.clone(),
                    message: e.to_string(),
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use crate::utils::error::{CatalogError, Result};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Source serving canned lists and recording every call.
    #[derive(Default)]
    struct MockSource {
        all: Vec<University>,
        by_country: HashMap<String, Vec<University>>,
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    impl MockSource {
        fn with_all(all: Vec<University>) -> Self {
            Self {
                all,
                ..Default::default()
            }
        }

        fn with_country(mut self, country: &str, list: Vec<University>) -> Self {
            self.by_country.insert(country.to_string(), list);
            self
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl RemoteCatalogSource for MockSource {
        async fn fetch_all(&self) -> Result<Vec<University>> {
            self.calls.lock().unwrap().push("all".to_string());
            if self.fail {
                return Err(CatalogError::HttpStatus {
                    status: 500,
                    url: "mock".to_string(),
                });
            }
            Ok(self.all.clone())
        }

        async fn fetch_by_country(&self, country: &str) -> Result<Vec<University>> {
            self.calls.lock().unwrap().push(format!("country:{}", country));
            if self.fail {
                return Err(CatalogError::HttpStatus {
                    status: 500,
                    url: "mock".to_string(),
                });
            }
            Ok(self.by_country.get(country).cloned().unwrap_or_default())
        }
    }

    fn names(list: &[Arc<University>]) -> Vec<&str> {
        list.iter().map(|u| u.name.as_str()).collect()
    }

    fn sample() -> Vec<University> {
        vec![
            University::new("Zeta U", "Canada"),
            University::new("Alpha U", "Canada"),
            University::new("Beta Institute", "Brazil"),
            University::new("Gamma College", "Canada"),
        ]
    }

    fn store(source: Arc<MockSource>, persistence: Arc<MemoryStore>) -> CatalogStore {
        CatalogStore::new(source, persistence, "selectedCountry")
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let store = store(
            Arc::new(MockSource::with_all(sample())),
            Arc::new(MemoryStore::new()),
        );
        assert_eq!(store.load_state(), LoadState::Idle);
        assert!(store.filtered().is_empty());
    }

    #[tokio::test]
    async fn test_initial_load_sorts_by_name() {
        let source = Arc::new(MockSource::with_all(vec![
            University::new("Zeta U", "US"),
            University::new("Alpha U", "US"),
        ]));
        let store = store(source.clone(), Arc::new(MemoryStore::new()));

        store.initialize().await;

        assert_eq!(store.load_state(), LoadState::Ready);
        assert_eq!(names(&store.filtered()), vec!["Alpha U", "Zeta U"]);
        assert_eq!(source.calls(), vec!["all"]);
    }

    #[tokio::test]
    async fn test_initial_load_derives_facets() {
        let source = Arc::new(MockSource::with_all(vec![
            University::new("A", "Canada"),
            University::new("B", "Brazil"),
            University::new("C", "Canada"),
        ]));
        let store = store(source, Arc::new(MemoryStore::new()));

        store.initialize().await;

        let labels: Vec<String> = store.country_facets().into_iter().map(|f| f.label).collect();
        assert_eq!(labels, vec!["All", "Brazil", "Canada"]);
    }

    #[tokio::test]
    async fn test_remembered_country_triggers_scoped_fetch() {
        let source = Arc::new(
            MockSource::with_all(sample()).with_country(
                "Canada",
                vec![University::new("Zeta U", "Canada"), University::new("Alpha U", "Canada")],
            ),
        );
        let persistence = Arc::new(MemoryStore::with_entry("selectedCountry", "Canada"));
        let store = store(source.clone(), persistence);

        store.initialize().await;

        assert_eq!(source.calls(), vec!["all", "country:Canada"]);
        assert_eq!(store.filter().selected_country, "Canada");
        assert_eq!(names(&store.filtered()), vec!["Alpha U", "Zeta U"]);
        assert_eq!(store.load_state(), LoadState::Ready);
    }

    #[tokio::test]
    async fn test_empty_remembered_country_is_no_selection() {
        let source = Arc::new(MockSource::with_all(sample()));
        let persistence = Arc::new(MemoryStore::with_entry("selectedCountry", ""));
        let store = store(source.clone(), persistence);

        store.initialize().await;

        assert_eq!(source.calls(), vec!["all"]);
        assert_eq!(store.filtered().len(), 4);
    }

    #[tokio::test]
    async fn test_fetch_failure_enters_error_state() {
        let store = store(Arc::new(MockSource::failing()), Arc::new(MemoryStore::new()));

        store.initialize().await;

        assert_eq!(store.load_state(), LoadState::Error(LOAD_ALL_ERROR.to_string()));
        assert!(store.snapshot().all_universities.is_empty());
        assert!(store.country_facets().is_empty());
    }

    #[tokio::test]
    async fn test_set_selected_country_persists_and_refetches() {
        let source = Arc::new(
            MockSource::with_all(sample())
                .with_country("Brazil", vec![University::new("Beta Institute", "Brazil")]),
        );
        let persistence = Arc::new(MemoryStore::new());
        let store = store(source.clone(), persistence.clone());
        store.initialize().await;

        store.set_selected_country("Brazil").await;
        store.flush().await;

        assert_eq!(source.calls(), vec!["all", "country:Brazil"]);
        assert_eq!(names(&store.filtered()), vec!["Beta Institute"]);
        assert_eq!(
            persistence.get("selectedCountry").await.unwrap().as_deref(),
            Some("Brazil")
        );
    }

    #[tokio::test]
    async fn test_selecting_all_reloads_full_catalog() {
        let source = Arc::new(MockSource::with_all(sample()));
        let store = store(source.clone(), Arc::new(MemoryStore::new()));
        store.initialize().await;
        store.set_selected_country("Brazil").await;

        store.set_selected_country("").await;

        assert_eq!(source.calls(), vec!["all", "country:Brazil", "all"]);
        assert_eq!(store.filtered().len(), 4);
    }

    #[tokio::test]
    async fn test_reload_without_country_refetches_everything() {
        let source = Arc::new(MockSource::with_all(sample()));
        let store = store(source.clone(), Arc::new(MemoryStore::new()));
        store.initialize().await;
        let facets_before = store.country_facets();

        store.reload_catalog().await;

        assert_eq!(source.calls(), vec!["all", "all"]);
        assert_eq!(store.country_facets(), facets_before);
        assert_eq!(store.load_state(), LoadState::Ready);
    }

    #[tokio::test]
    async fn test_reload_with_country_uses_scoped_fetch() {
        let source = Arc::new(MockSource::with_all(sample()));
        let store = store(source.clone(), Arc::new(MemoryStore::new()));
        store.initialize().await;
        store.set_selected_country("Canada").await;

        store.reload_catalog().await;

        assert_eq!(source.calls(), vec!["all", "country:Canada", "country:Canada"]);
    }

    #[tokio::test]
    async fn test_search_is_local_and_country_scoped() {
        let source = Arc::new(MockSource::with_all(sample()));
        let store = store(source.clone(), Arc::new(MemoryStore::new()));
        store.initialize().await;
        store.set_selected_country("Canada").await;
        let calls_before = source.calls().len();

        store.set_search_term("U");

        assert_eq!(source.calls().len(), calls_before);
        assert_eq!(names(&store.filtered()), vec!["Alpha U", "Zeta U"]);

        store.set_search_term("");
        assert_eq!(
            names(&store.filtered()),
            vec!["Alpha U", "Gamma College", "Zeta U"]
        );
    }

    #[tokio::test]
    async fn test_search_before_load_is_empty() {
        let store = store(
            Arc::new(MockSource::with_all(sample())),
            Arc::new(MemoryStore::new()),
        );
        store.set_search_term("alpha");
        assert!(store.filtered().is_empty());
        assert_eq!(store.filter().search_term, "alpha");
    }

    #[tokio::test]
    async fn test_subscribers_observe_ready_state() {
        let store = store(
            Arc::new(MockSource::with_all(sample())),
            Arc::new(MemoryStore::new()),
        );
        let mut rx = store.subscribe();

        store.initialize().await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().load_state, LoadState::Ready);
    }

    /// Source whose country fetches block until released.
    struct GatedSource {
        gates: HashMap<String, Arc<Notify>>,
        all_gate: Option<Arc<Notify>>,
        all: Vec<University>,
    }

    impl GatedSource {
        fn new(countries: &[&str]) -> Self {
            Self {
                gates: countries
                    .iter()
                    .map(|c| (c.to_string(), Arc::new(Notify::new())))
                    .collect(),
                all_gate: None,
                all: Vec::new(),
            }
        }

        fn with_gated_catalog(mut self, all: Vec<University>) -> Self {
            self.all_gate = Some(Arc::new(Notify::new()));
            self.all = all;
            self
        }

        fn release_catalog(&self) {
            if let Some(gate) = &self.all_gate {
                gate.notify_one();
            }
        }

        fn release(&self, country: &str) {
            self.gates[country].notify_one();
        }
    }

    #[async_trait::async_trait]
    impl RemoteCatalogSource for GatedSource {
        async fn fetch_all(&self) -> Result<Vec<University>> {
            if let Some(gate) = &self.all_gate {
                gate.notified().await;
            }
            Ok(self.all.clone())
        }

        async fn fetch_by_country(&self, country: &str) -> Result<Vec<University>> {
            self.gates[country].notified().await;
            Ok(vec![University::new(format!("{} University", country), country)])
        }
    }

    #[tokio::test]
    async fn test_latest_initiated_selection_wins() {
        let source = Arc::new(GatedSource::new(&["Brazil", "Canada"]));
        let store = CatalogStore::new(source.clone(), Arc::new(MemoryStore::new()), "selectedCountry");

        // Canada is selected last but its response arrives first.
        tokio::join!(
            store.set_selected_country("Brazil"),
            store.set_selected_country("Canada"),
            async {
                tokio::task::yield_now().await;
                source.release("Canada");
                tokio::task::yield_now().await;
                source.release("Brazil");
            }
        );

        assert_eq!(store.filter().selected_country, "Canada");
        assert_eq!(names(&store.filtered()), vec!["Canada University"]);
        assert_eq!(store.load_state(), LoadState::Ready);
    }

    #[tokio::test]
    async fn test_catalog_kept_when_selection_overtakes_first_load() {
        let source = Arc::new(GatedSource::new(&["Canada"]).with_gated_catalog(vec![
            University::new("Zeta U", "Canada"),
            University::new("Alpha U", "Canada"),
            University::new("Beta College", "Brazil"),
        ]));
        let store = CatalogStore::new(source.clone(), Arc::new(MemoryStore::new()), "selectedCountry");

        // Canada is picked and answered while the full catalog is still loading.
        tokio::join!(store.initialize(), async {
            tokio::task::yield_now().await;
            source.release("Canada");
            store.set_selected_country("Canada").await;
            source.release_catalog();
        });

        let snapshot = store.snapshot();
        assert_eq!(snapshot.all_universities.len(), 3);
        let labels: Vec<String> = snapshot.country_facets.into_iter().map(|f| f.label).collect();
        assert_eq!(labels, vec!["All", "Brazil", "Canada"]);
        assert_eq!(names(&snapshot.filtered), vec!["Canada University"]);
        assert_eq!(snapshot.load_state, LoadState::Ready);

        store.set_search_term("");
        assert_eq!(names(&store.filtered()), vec!["Alpha U", "Zeta U"]);
    }
}
