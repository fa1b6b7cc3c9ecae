use models::DictionaryData;
use serde::Deserialize;

use crate::error::AppError::{self, MalformedPayload};

/// Body of the word page action: a single toggle or a batch of selections.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RelationForm {
    pub related_id: Option<String>,
    pub selected_ids: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RelationAction {
    Toggle(String),
    Upsert(Vec<String>),
}

impl RelationForm {
    pub fn action(&self) -> Result<RelationAction, AppError> {
        if let Some(raw) = non_blank(&self.selected_ids) {
            return parse_selected_ids(raw).map(RelationAction::Upsert);
        }

        non_blank(&self.related_id)
            .map(|id| RelationAction::Toggle(id.to_string()))
            .ok_or_else(|| AppError::validation("relatedId or selectedIds is required"))
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateForm {
    pub new_item: Option<String>,
    pub dictionary_data: Option<String>,
}

pub struct NewEntry {
    pub word: String,
    pub phonetic: Option<String>,
    pub definition: Option<String>,
}

impl CreateForm {
    pub fn entry(&self) -> Result<NewEntry, AppError> {
        let typed = non_blank(&self.new_item).ok_or_else(|| AppError::validation("word is required"))?;
        let raw = non_blank(&self.dictionary_data)
            .ok_or_else(|| AppError::validation("dictionary data is required"))?;

        let data: DictionaryData = serde_json::from_str(raw).map_err(|_| MalformedPayload)?;

        let word = match data.word.trim() {
            "" => typed.to_string(),
            word => word.to_string(),
        };

        Ok(NewEntry {
            definition: data.first_definition().map(str::to_string),
            phonetic: data.phonetic.filter(|p| !p.trim().is_empty()),
            word,
        })
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteForm {
    pub vocabulary_id: String,
}

pub fn parse_selected_ids(raw: &str) -> Result<Vec<String>, AppError> {
    let ids: Vec<String> = serde_json::from_str(raw).map_err(|_| MalformedPayload)?;

    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !id.is_empty() && !unique.contains(&id) {
            unique.push(id);
        }
    }

    Ok(unique)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
