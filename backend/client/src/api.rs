use async_trait::async_trait;
use models::{
    ApiResponse, DictionaryData, RelatedFromSnapshot, RemoveRelation, VocabularyEntry,
    WordSnapshot,
};
use reqwest::{Client, Response, redirect::Policy};
use tracing::debug;

use crate::{error::ClientError, search::SearchQuery};

/// Calls the client makes against the vocabulary server.
#[async_trait]
pub trait VocabApi: Send + Sync + 'static {
    async fn list_words(&self) -> Result<Vec<VocabularyEntry>, ClientError>;

    async fn load_word(&self, id: &str) -> Result<WordSnapshot, ClientError>;

    async fn related_from(&self, id: &str) -> Result<RelatedFromSnapshot, ClientError>;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<VocabularyEntry>, ClientError>;

    async fn toggle_relation(&self, owner: &str, related: &str) -> Result<(), ClientError>;

    /// Batch upsert of every selected id for `owner`.
    async fn save_selection(&self, owner: &str, selected: &[String]) -> Result<(), ClientError>;

    async fn remove_relation(&self, relation_id: &str) -> Result<(), ClientError>;

    async fn create_entry(&self, word: &str, data: &DictionaryData) -> Result<(), ClientError>;

    async fn delete_word(&self, id: &str) -> Result<(), ClientError>;
}

pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        // Redirects mark success on the form actions, there is nothing to follow.
        let client = Client::builder().redirect(Policy::none()).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() || status.is_redirection() {
        return Ok(response);
    }

    let message = response
        .json::<ApiResponse>()
        .await
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_else(|| status.to_string());

    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

async fn acknowledge(response: Response) -> Result<(), ClientError> {
    let status = response.status().as_u16();
    let body: ApiResponse = check(response).await?.json().await?;

    match body.error {
        Some(message) => Err(ClientError::Server { status, message }),
        None => Ok(()),
    }
}

#[async_trait]
impl VocabApi for HttpApi {
    async fn list_words(&self) -> Result<Vec<VocabularyEntry>, ClientError> {
        let response = self.client.get(self.url("/api/words")).send().await?;

        Ok(check(response).await?.json().await?)
    }

    async fn load_word(&self, id: &str) -> Result<WordSnapshot, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/words/{id}")))
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn related_from(&self, id: &str) -> Result<RelatedFromSnapshot, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/words/{id}/related-from")))
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<VocabularyEntry>, ClientError> {
        debug!("Searching {:?} excluding {} ids", query.q(), query.exclude().len());

        let response = self
            .client
            .get(self.url("/api/search"))
            .query(&query.params())
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn toggle_relation(&self, owner: &str, related: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url(&format!("/vocabulary/{owner}")))
            .form(&[("relatedId", related)])
            .send()
            .await?;

        acknowledge(response).await
    }

    async fn save_selection(&self, owner: &str, selected: &[String]) -> Result<(), ClientError> {
        let selected_ids = serde_json::to_string(selected)?;

        let response = self
            .client
            .post(self.url(&format!("/vocabulary/{owner}")))
            .form(&[("selectedIds", selected_ids.as_str())])
            .send()
            .await?;

        acknowledge(response).await
    }

    async fn remove_relation(&self, relation_id: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.url("/api/remove-relation"))
            .json(&RemoveRelation {
                relation_id: relation_id.to_string(),
            })
            .send()
            .await?;

        acknowledge(response).await
    }

    async fn create_entry(&self, word: &str, data: &DictionaryData) -> Result<(), ClientError> {
        let dictionary_data = serde_json::to_string(data)?;

        let response = self
            .client
            .post(self.url("/create"))
            .form(&[("newItem", word), ("dictionaryData", dictionary_data.as_str())])
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn delete_word(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url("/api/delete-word"))
            .form(&[("vocabularyId", id)])
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }
}
