//! Word page state machine.
//!
//! `Clean -> Dirty` on the first toggle, `Dirty -> Committing` on commit,
//! back to `Clean` once the server state is reloaded. A failed commit goes
//! back to `Dirty` with the selections kept.
//!
//! Additions are batched and only sent on [`WordView::commit`]. Turning off
//! a saved relation is sent right away by relation id and reloads the page,
//! dropping anything still pending.
use std::sync::Arc;

use models::{VocabularyEntry, WordSnapshot};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    api::VocabApi,
    error::ClientError,
    reconciler::{EntryState, PendingSelection, Phase, SimilarWord},
    search::SearchBox,
};

pub struct WordView<A> {
    api: Arc<A>,
    snapshot: WordSnapshot,
    selection: PendingSelection,
    search: SearchBox<A>,
    first_pass: bool,
}

impl<A: VocabApi> WordView<A> {
    pub async fn load(api: Arc<A>, id: &str) -> Result<Self, ClientError> {
        let search = SearchBox::new(api.clone());
        Self::load_with(api, search, id).await
    }

    pub async fn load_with(api: Arc<A>, search: SearchBox<A>, id: &str) -> Result<Self, ClientError> {
        let snapshot = api.load_word(id).await?;

        let mut view = Self {
            api,
            selection: PendingSelection::new(snapshot.similar_words.clone()),
            snapshot,
            search,
            first_pass: true,
        };
        view.reconcile().await?;

        Ok(view)
    }

    pub fn owner(&self) -> &VocabularyEntry {
        &self.snapshot.vocabulary
    }

    pub fn snapshot(&self) -> &WordSnapshot {
        &self.snapshot
    }

    pub fn phase(&self) -> Phase {
        self.selection.phase()
    }

    pub fn selection(&self) -> &PendingSelection {
        &self.selection
    }

    pub fn merged_view(&self) -> Vec<SimilarWord> {
        self.selection.merged_view()
    }

    /// The word itself, its saved relations and its pending selections.
    pub fn exclude_ids(&self) -> Vec<String> {
        let mut ids = vec![self.snapshot.vocabulary.id.clone()];
        ids.extend(
            self.selection
                .confirmed()
                .iter()
                .map(|relation| relation.related_id.clone()),
        );
        ids.extend(self.selection.selected().iter().cloned());
        ids
    }

    pub fn search(&mut self, q: &str) {
        let exclude = self.exclude_ids();
        self.search.input(q, exclude);
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
    }

    pub fn search_results(&self) -> Vec<VocabularyEntry> {
        self.search.results()
    }

    pub fn subscribe_results(&self) -> watch::Receiver<Vec<VocabularyEntry>> {
        self.search.subscribe()
    }

    /// Toggles a search result or a saved relation.
    pub async fn toggle(&mut self, id: &str) -> Result<Option<EntryState>, ClientError> {
        self.selection.remember(&self.search.results());

        let Some(state) = self.selection.toggle(id) else {
            debug!("Ignoring toggle of unknown id {id}");
            return Ok(None);
        };

        if state == EntryState::ConfirmedRemoved {
            let relation_id = self.selection.relation_id(id).map(str::to_string);

            if let Some(relation_id) = relation_id {
                if let Err(e) = self.send_removal(&relation_id).await {
                    self.selection.toggle(id);
                    return Err(e);
                }
                self.reload_after_removal(&relation_id).await?;
                return Ok(Some(self.selection.state_of(id)));
            }
        }

        Ok(Some(state))
    }

    /// Commit boundary. Sends every selected id as one batch.
    ///
    /// Returns whether a batch was sent.
    pub async fn commit(&mut self) -> Result<bool, ClientError> {
        self.reconcile().await
    }

    pub async fn remove_relation(&mut self, relation_id: &str) -> Result<(), ClientError> {
        self.send_removal(relation_id).await?;
        self.reload_after_removal(relation_id).await
    }

    async fn send_removal(&self, relation_id: &str) -> Result<(), ClientError> {
        self.api.remove_relation(relation_id).await.map_err(|e| {
            warn!("Error removing relation {relation_id}: {e}");
            e
        })?;

        info!("Removed relation {relation_id}");
        Ok(())
    }

    /// The server already dropped the relation, so a failed reload still
    /// takes it out of the local view.
    async fn reload_after_removal(&mut self, relation_id: &str) -> Result<(), ClientError> {
        if let Err(e) = self.reload().await {
            warn!("Reload after removing relation {relation_id} failed: {e}");
            self.selection.forget(relation_id);
            self.snapshot
                .similar_words
                .retain(|relation| relation.id != relation_id);
            return Err(e);
        }

        Ok(())
    }

    /// Refetches the authoritative state, dropping pending selections.
    pub async fn reload(&mut self) -> Result<&WordSnapshot, ClientError> {
        let snapshot = self.api.load_word(&self.snapshot.vocabulary.id).await?;

        self.selection.reset(snapshot.similar_words.clone());
        self.snapshot = snapshot;

        Ok(&self.snapshot)
    }

    /// Switches to another word. Pending searches from the old page are
    /// cancelled before anything else happens.
    pub async fn navigate(&mut self, id: &str) -> Result<(), ClientError> {
        self.search.clear();

        let snapshot = self.api.load_word(id).await?;
        self.selection.reset(snapshot.similar_words.clone());
        self.snapshot = snapshot;
        self.first_pass = true;

        self.reconcile().await?;
        Ok(())
    }

    async fn reconcile(&mut self) -> Result<bool, ClientError> {
        if std::mem::take(&mut self.first_pass) {
            debug!("Skipping first pass for {}", self.owner().id);
            return Ok(false);
        }

        let Some(batch) = self.selection.begin_commit() else {
            return Ok(false);
        };

        let owner = self.snapshot.vocabulary.id.clone();
        if let Err(e) = self.api.save_selection(&owner, &batch).await {
            warn!("Failed to save similar words for {owner}: {e}");
            self.selection.commit_failed();
            return Err(e);
        }

        info!("Saved {} similar words for {owner}", batch.len());

        if let Err(e) = self.reload().await {
            self.selection.commit_failed();
            return Err(e);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::atomic::Ordering, time::Duration};

    use tokio::time::sleep;

    use super::*;
    use crate::{
        api::fake::{Call, FakeApi},
        reconciler::RelationKey,
    };

    async fn settle() {
        sleep(Duration::from_millis(400)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_without_action_never_commits() {
        let api = Arc::new(FakeApi::default());
        let run = api.add("run");

        let mut view = WordView::load(api.clone(), &run.id).await.unwrap();
        assert!(!view.commit().await.unwrap());

        assert!(api.saves().is_empty());
        assert_eq!(view.phase(), Phase::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_then_commit_sends_one_batch() {
        let api = Arc::new(FakeApi::default());
        let run = api.add("run");
        let jog = api.add("jog");
        let jogger = api.add("jogger");

        let mut view = WordView::load(api.clone(), &run.id).await.unwrap();
        view.search("jo");
        settle().await;

        view.toggle(&jog.id).await.unwrap();
        view.toggle(&jogger.id).await.unwrap();
        assert_eq!(view.phase(), Phase::Dirty);
        assert!(matches!(view.merged_view()[0].key, RelationKey::Pending(_)));

        assert!(view.commit().await.unwrap());

        assert_eq!(
            api.saves(),
            [Call::Save(run.id.clone(), vec![jog.id.clone(), jogger.id.clone()])]
        );
        assert_eq!(view.phase(), Phase::Clean);
        assert!(
            view.merged_view()
                .iter()
                .all(|word| matches!(word.key, RelationKey::Persisted(_)))
        );
        assert_eq!(view.snapshot().similar_words.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_excludes_owner_related_and_pending() {
        let api = Arc::new(FakeApi::default());
        let run = api.add("run");
        let rune = api.add("rune");
        let runner = api.add("runner");
        api.link(&run.id, &rune.id);

        let mut view = WordView::load(api.clone(), &run.id).await.unwrap();
        view.search("run");
        settle().await;
        assert_eq!(view.search_results(), [runner.clone()]);

        view.toggle(&runner.id).await.unwrap();
        view.search("runn");
        settle().await;

        assert_eq!(
            api.calls().last(),
            Some(&Call::Search(
                "runn".to_string(),
                vec![run.id.clone(), rune.id.clone(), runner.id.clone()]
            ))
        );
        assert!(view.search_results().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_commit_stays_dirty() {
        let api = Arc::new(FakeApi::default());
        let run = api.add("run");
        let jog = api.add("jog");

        let mut view = WordView::load(api.clone(), &run.id).await.unwrap();
        view.search("jog");
        settle().await;
        view.toggle(&jog.id).await.unwrap();

        api.fail_saves.store(true, Ordering::SeqCst);
        assert!(view.commit().await.is_err());
        assert_eq!(view.phase(), Phase::Dirty);
        assert!(view.selection().selected().contains(&jog.id));

        api.fail_saves.store(false, Ordering::SeqCst);
        assert!(view.commit().await.unwrap());
        assert_eq!(api.saves().len(), 2);
        assert_eq!(view.phase(), Phase::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_turning_off_saved_relation_removes_immediately() {
        let api = Arc::new(FakeApi::default());
        let run = api.add("run");
        let jog = api.add("jog");
        let dash = api.add("dash");
        let relation = api.link(&run.id, &jog.id);

        let mut view = WordView::load(api.clone(), &run.id).await.unwrap();
        view.search("dash");
        settle().await;
        view.toggle(&dash.id).await.unwrap();

        let state = view.toggle(&jog.id).await.unwrap();

        assert_eq!(state, Some(EntryState::Inactive));
        assert!(api.calls().contains(&Call::Remove(relation)));
        assert!(api.saves().is_empty());
        assert!(view.merged_view().is_empty());
        assert_eq!(view.phase(), Phase::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_removal_restores_relation() {
        let api = Arc::new(FakeApi::default());
        let run = api.add("run");
        let jog = api.add("jog");
        api.link(&run.id, &jog.id);

        let mut view = WordView::load(api.clone(), &run.id).await.unwrap();
        api.relations.lock().clear();

        assert!(view.toggle(&jog.id).await.is_err());
        assert_eq!(view.selection().state_of(&jog.id), EntryState::ConfirmedActive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removal_sticks_when_reload_fails() {
        let api = Arc::new(FakeApi::default());
        let run = api.add("run");
        let jog = api.add("jog");
        let relation = api.link(&run.id, &jog.id);

        let mut view = WordView::load(api.clone(), &run.id).await.unwrap();
        api.entries.lock().retain(|entry| entry.id != run.id);

        let err = view.toggle(&jog.id).await.unwrap_err();

        assert!(err.is_not_found());
        assert!(api.calls().contains(&Call::Remove(relation)));
        assert!(api.relations.lock().is_empty());
        assert_eq!(view.selection().state_of(&jog.id), EntryState::Inactive);
        assert!(view.merged_view().is_empty());
        assert!(view.snapshot().similar_words.is_empty());
        assert_eq!(view.phase(), Phase::Clean);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_discards_stale_search() {
        let api = Arc::new(FakeApi::default());
        let run = api.add("run");
        let jog = api.add("jog");
        api.add("rune");

        let mut view = WordView::load(api.clone(), &run.id).await.unwrap();
        view.search("ru");
        view.navigate(&jog.id).await.unwrap();
        settle().await;

        assert_eq!(view.owner().id, jog.id);
        assert!(view.search_results().is_empty());
        assert!(
            !api.calls()
                .iter()
                .any(|call| matches!(call, Call::Search(..)))
        );
        assert!(!view.commit().await.unwrap());
        assert!(api.saves().is_empty());
    }
}
