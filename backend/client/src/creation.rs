//! Dictionary-assisted word creation.
//!
//! Typing schedules a lookup after [`LOOKUP_DEBOUNCE`] of quiet. A failed
//! lookup leaves the candidate empty and the next keystroke tries again.
//! Submitting requires a candidate with a definition.
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use models::{
    DictionaryData,
    remote::{DictionaryClient, LookupError},
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{api::VocabApi, debounce::Debouncer, error::ClientError};

pub const LOOKUP_DEBOUNCE: Duration = Duration::from_millis(500);

#[async_trait]
pub trait DictionaryLookup: Send + Sync + 'static {
    async fn lookup(&self, word: &str) -> Result<DictionaryData, LookupError>;
}

#[async_trait]
impl DictionaryLookup for DictionaryClient {
    async fn lookup(&self, word: &str) -> Result<DictionaryData, LookupError> {
        DictionaryClient::lookup(self, word).await
    }
}

pub struct CreationForm<D> {
    dictionary: Arc<D>,
    input: String,
    debouncer: Debouncer,
    candidate: Arc<watch::Sender<Option<DictionaryData>>>,
}

impl<D: DictionaryLookup> CreationForm<D> {
    pub fn new(dictionary: Arc<D>) -> Self {
        let (candidate, _) = watch::channel(None);

        Self {
            dictionary,
            input: String::new(),
            debouncer: Debouncer::new(LOOKUP_DEBOUNCE),
            candidate: Arc::new(candidate),
        }
    }

    pub fn input(&mut self, word: &str) {
        self.input = word.to_string();

        let word = word.trim().to_string();
        if word.is_empty() {
            self.debouncer.cancel();
            self.candidate.send_replace(None);
            return;
        }

        let dictionary = self.dictionary.clone();
        let candidate = self.candidate.clone();

        self.debouncer.call(move |ticket| async move {
            let found = match dictionary.lookup(&word).await {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!("Error fetching dictionary data for {word}: {e}");
                    None
                }
            };

            if ticket.is_current() {
                candidate.send_replace(found);
            }
        });
    }

    pub fn text(&self) -> &str {
        &self.input
    }

    pub fn candidate(&self) -> Option<DictionaryData> {
        self.candidate.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<DictionaryData>> {
        self.candidate.subscribe()
    }

    pub fn can_submit(&self) -> bool {
        !self.input.trim().is_empty()
            && self
                .candidate
                .borrow()
                .as_ref()
                .and_then(DictionaryData::first_definition)
                .is_some()
    }

    pub async fn submit<A: VocabApi>(&self, api: &A) -> Result<(), ClientError> {
        if !self.can_submit() {
            return Err(ClientError::NotReady);
        }

        let Some(data) = self.candidate() else {
            return Err(ClientError::NotReady);
        };

        api.create_entry(self.input.trim(), &data).await?;
        info!("Item created successfully: {}", self.input.trim());

        Ok(())
    }
}
