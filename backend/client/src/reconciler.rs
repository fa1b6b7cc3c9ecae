//! Pending selections of one word page.
//!
//! The page keeps three sets over entry ids:
//! - `confirmed`: relations loaded from the server
//! - `selected`: wanted, not saved yet
//! - `removed`: confirmed relations the user turned off, not saved yet
//!
//! The displayed list is `(confirmed - removed) ∪ (selected - confirmed)`,
//! computed by [`merged_view`]. `selected` and `removed` never share an id.
use indexmap::IndexSet;
use models::{RelatedWord, VocabularyEntry};

/// Identity of a displayed similar word.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelationKey {
    /// Relation id assigned by the server.
    Persisted(String),
    /// Not saved yet, keyed by the related entry id.
    Pending(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarWord {
    pub key: RelationKey,
    pub related: VocabularyEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    ConfirmedActive,
    ConfirmedRemoved,
    PendingSelected,
    Inactive,
}

impl EntryState {
    pub fn is_active(self) -> bool {
        matches!(self, EntryState::ConfirmedActive | EntryState::PendingSelected)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Clean,
    Dirty,
    Committing,
}

pub fn merged_view(
    confirmed: &[RelatedWord],
    selected: &IndexSet<String>,
    removed: &IndexSet<String>,
    candidates: &[VocabularyEntry],
) -> Vec<SimilarWord> {
    let mut merged: Vec<SimilarWord> = confirmed
        .iter()
        .filter(|relation| !removed.contains(&relation.related_id))
        .map(|relation| SimilarWord {
            key: RelationKey::Persisted(relation.id.clone()),
            related: relation.related.clone(),
        })
        .collect();

    for id in selected {
        if confirmed.iter().any(|relation| &relation.related_id == id) {
            continue;
        }

        if let Some(entry) = candidates.iter().find(|entry| &entry.id == id) {
            merged.push(SimilarWord {
                key: RelationKey::Pending(id.clone()),
                related: entry.clone(),
            });
        }
    }

    merged
}

#[derive(Debug, Clone)]
pub struct PendingSelection {
    confirmed: Vec<RelatedWord>,
    selected: IndexSet<String>,
    removed: IndexSet<String>,
    candidates: Vec<VocabularyEntry>,
    phase: Phase,
}

impl PendingSelection {
    pub fn new(confirmed: Vec<RelatedWord>) -> Self {
        Self {
            confirmed,
            selected: IndexSet::new(),
            removed: IndexSet::new(),
            candidates: Vec::new(),
            phase: Phase::Clean,
        }
    }

    pub fn confirmed(&self) -> &[RelatedWord] {
        &self.confirmed
    }

    pub fn selected(&self) -> &IndexSet<String> {
        &self.selected
    }

    pub fn removed(&self) -> &IndexSet<String> {
        &self.removed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Search results seen on this page, so pending selections can still be
    /// displayed after the search box moves on.
    pub fn remember<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = &'a VocabularyEntry>,
    {
        for entry in entries {
            if !self.candidates.iter().any(|known| known.id == entry.id) {
                self.candidates.push(entry.clone());
            }
        }
    }

    pub fn relation_id(&self, related_id: &str) -> Option<&str> {
        self.confirmed
            .iter()
            .find(|relation| relation.related_id == related_id)
            .map(|relation| relation.id.as_str())
    }

    pub fn state_of(&self, id: &str) -> EntryState {
        match (self.relation_id(id).is_some(), self.removed.contains(id)) {
            (true, false) => EntryState::ConfirmedActive,
            (true, true) => EntryState::ConfirmedRemoved,
            (false, _) if self.selected.contains(id) => EntryState::PendingSelected,
            (false, _) => EntryState::Inactive,
        }
    }

    /// Flips `id` between active and inactive. Ids that are neither
    /// confirmed nor among the remembered candidates are ignored.
    ///
    /// Turning a removed confirmed id back on only clears it from `removed`;
    /// it is never added to `selected`.
    pub fn toggle(&mut self, id: &str) -> Option<EntryState> {
        let confirmed = self.relation_id(id).is_some();
        if !confirmed && !self.candidates.iter().any(|entry| entry.id == id) {
            return None;
        }

        if self.state_of(id).is_active() {
            if !self.selected.shift_remove(id) && confirmed {
                self.removed.insert(id.to_string());
            }
        } else if !self.removed.shift_remove(id) {
            self.selected.insert(id.to_string());
        }

        self.settle_phase();
        Some(self.state_of(id))
    }

    /// Drops a relation the server no longer has. Returns whether it was known.
    pub fn forget(&mut self, relation_id: &str) -> bool {
        let Some(index) = self
            .confirmed
            .iter()
            .position(|relation| relation.id == relation_id)
        else {
            return false;
        };

        let relation = self.confirmed.remove(index);
        self.removed.shift_remove(&relation.related_id);
        self.settle_phase();
        true
    }

    pub fn merged_view(&self) -> Vec<SimilarWord> {
        merged_view(
            &self.confirmed,
            &self.selected,
            &self.removed,
            &self.candidates,
        )
    }

    /// Ids to submit, moving to `Committing`. `None` when nothing is selected.
    pub fn begin_commit(&mut self) -> Option<Vec<String>> {
        if self.selected.is_empty() {
            return None;
        }

        self.phase = Phase::Committing;
        Some(self.selected.iter().cloned().collect())
    }

    /// Keeps the pending sets for the user to retry.
    pub fn commit_failed(&mut self) {
        self.phase = Phase::Dirty;
    }

    fn settle_phase(&mut self) {
        self.phase = match self.selected.is_empty() && self.removed.is_empty() {
            true => Phase::Clean,
            false => Phase::Dirty,
        };
    }

    /// Replaces everything with freshly loaded relations.
    pub fn reset(&mut self, confirmed: Vec<RelatedWord>) {
        *self = Self::new(confirmed);
    }
}
