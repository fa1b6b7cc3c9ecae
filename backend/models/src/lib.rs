//! # Models
//!
//! Records and payloads shared by the server, the client and the tester.
//!
//! ## Records
//! - Entry: a single word with optional phonetic and definition
//! - Relation: directed `(vocabularyId, relatedId)` pair, at most one per ordered pair
//!
//! ## Wire format
//! - JSON with camelCase field names
//! - Mutations answer with `{success: true}` or `{error: string}`
use serde::{Deserialize, Serialize};

pub mod remote;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub id: String,
    pub word: String,
    pub phonetic: Option<String>,
    pub definition: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub id: String,
    pub vocabulary_id: String,
    pub related_id: String,
}

/// Outgoing relation joined with its target entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelatedWord {
    pub id: String,
    pub vocabulary_id: String,
    pub related_id: String,
    pub related: VocabularyEntry,
}

/// Incoming relation joined with its owner entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelatedFrom {
    pub id: String,
    pub vocabulary_id: String,
    pub related_id: String,
    pub vocabulary: VocabularyEntry,
}

/// Authoritative state of one word page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WordSnapshot {
    pub vocabulary: VocabularyEntry,
    pub similar_words: Vec<RelatedWord>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelatedFromSnapshot {
    pub vocabulary: VocabularyEntry,
    pub related_from_words: Vec<RelatedFrom>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self {
            success: Some(true),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRelation {
    pub relation_id: String,
}

/// Dictionary candidate reviewed before creating an entry.
///
/// Accepts both the flat `{word, phonetic, definition}` shape and the nested
/// `meanings[].definitions[]` shape returned by the public dictionary API.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryData {
    pub word: String,
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meanings: Vec<Meaning>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Meaning {
    #[serde(default)]
    pub definitions: Vec<Definition>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Definition {
    pub definition: String,
}

impl DictionaryData {
    pub fn first_definition(&self) -> Option<&str> {
        self.definition
            .as_deref()
            .or_else(|| {
                self.meanings
                    .first()
                    .and_then(|meaning| meaning.definitions.first())
                    .map(|definition| definition.definition.as_str())
            })
            .filter(|definition| !definition.trim().is_empty())
    }
}
