//! Search box of the word page.
//!
//! Keystrokes are debounced for [`SEARCH_DEBOUNCE`]; only the latest request
//! may publish results. A blank query clears the results without touching the
//! network and a failed request publishes an empty list.
use std::{sync::Arc, time::Duration};

use models::VocabularyEntry;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{api::VocabApi, debounce::Debouncer};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    q: String,
    exclude: Vec<String>,
}

impl SearchQuery {
    /// `None` for a blank query.
    pub fn new<I>(q: &str, exclude: I) -> Option<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let q = q.trim();
        if q.is_empty() {
            return None;
        }

        let mut ids: Vec<String> = Vec::new();
        for id in exclude {
            if !id.is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }

        Some(Self {
            q: q.to_string(),
            exclude: ids,
        })
    }

    pub fn q(&self) -> &str {
        &self.q
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    pub fn params(&self) -> [(&'static str, String); 2] {
        [("q", self.q.clone()), ("exclude", self.exclude.join(","))]
    }
}

pub struct SearchBox<A> {
    api: Arc<A>,
    debouncer: Debouncer,
    results: Arc<watch::Sender<Vec<VocabularyEntry>>>,
}

impl<A: VocabApi> SearchBox<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self::with_delay(api, SEARCH_DEBOUNCE)
    }

    pub fn with_delay(api: Arc<A>, delay: Duration) -> Self {
        let (results, _) = watch::channel(Vec::new());

        Self {
            api,
            debouncer: Debouncer::new(delay),
            results: Arc::new(results),
        }
    }

    pub fn input<I>(&mut self, raw: &str, exclude: I)
    where
        I: IntoIterator<Item = String>,
    {
        let Some(query) = SearchQuery::new(raw, exclude) else {
            self.clear();
            return;
        };

        let api = self.api.clone();
        let results = self.results.clone();

        self.debouncer.call(move |ticket| async move {
            let found = api.search(&query).await.unwrap_or_else(|e| {
                warn!("Search for {:?} failed: {e}", query.q());
                Vec::new()
            });

            if ticket.is_current() {
                results.send_replace(found);
            } else {
                debug!("Dropping superseded results for {:?}", query.q());
            }
        });
    }

    /// Cancels pending work and empties the results.
    pub fn clear(&mut self) {
        self.debouncer.cancel();
        self.results.send_replace(Vec::new());
    }

    pub fn results(&self) -> Vec<VocabularyEntry> {
        self.results.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<VocabularyEntry>> {
        self.results.subscribe()
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use tokio::time::sleep;

    use super::*;
    use crate::api::fake::{Call, FakeApi};

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_query_builder() {
        assert_eq!(SearchQuery::new("   ", ids(&["a"])), None);

        let query = SearchQuery::new(" jo ", ids(&["a", "b", "a", ""])).unwrap();
        assert_eq!(query.q(), "jo");
        assert_eq!(query.exclude(), ["a", "b"]);
        assert_eq!(query.params()[1], ("exclude", "a,b".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_collapse_into_one_call() {
        let api = Arc::new(FakeApi::default());
        let abc = api.add("abc");
        api.add("abd");
        let mut search = SearchBox::new(api.clone());

        for q in ["a", "ab", "abc"] {
            search.input(q, ids(&["owner"]));
            sleep(Duration::from_millis(50)).await;
        }
        sleep(Duration::from_millis(400)).await;

        assert_eq!(
            api.calls(),
            [Call::Search("abc".to_string(), ids(&["owner"]))]
        );
        assert_eq!(search.results(), [abc]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_skips_network() {
        let api = Arc::new(FakeApi::default());
        api.add("run");
        let mut search = SearchBox::new(api.clone());

        search.input("ru", Vec::new());
        sleep(Duration::from_millis(400)).await;
        assert_eq!(search.results().len(), 1);

        search.input("  ", Vec::new());
        sleep(Duration::from_millis(400)).await;

        assert!(search.results().is_empty());
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_publishes_empty() {
        let api = Arc::new(FakeApi::default());
        api.add("run");
        let mut search = SearchBox::new(api.clone());

        search.input("run", Vec::new());
        sleep(Duration::from_millis(400)).await;
        assert_eq!(search.results().len(), 1);

        api.fail_searches.store(true, Ordering::SeqCst);
        search.input("runs", Vec::new());
        sleep(Duration::from_millis(400)).await;

        assert!(search.results().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_discards_pending_search() {
        let api = Arc::new(FakeApi::default());
        api.add("run");
        let mut search = SearchBox::new(api.clone());

        search.input("run", Vec::new());
        search.clear();
        sleep(Duration::from_millis(400)).await;

        assert!(api.calls().is_empty());
        assert!(search.results().is_empty());
    }
}
