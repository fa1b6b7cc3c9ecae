use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{
        Path, Query, State,
        rejection::{FormRejection, JsonRejection},
    },
    response::{IntoResponse, Redirect},
};
use models::{
    ApiResponse, RelatedFromSnapshot, RemoveRelation, VocabularyEntry, WordSnapshot,
};
use tracing::{info, warn};

use crate::{
    error::AppError,
    search::{SearchParams, search_words},
    state::State as AppState,
    utils::{CreateForm, DeleteForm, RelationAction, RelationForm},
};

pub type SharedState = Arc<AppState>;

pub async fn list_handler(
    State(state): State<SharedState>,
) -> Result<Json<Vec<VocabularyEntry>>, AppError> {
    let entries = state.with_database(|db| db.list_entries()).await?;

    Ok(Json(entries))
}

pub async fn word_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<WordSnapshot>, AppError> {
    let snapshot = state
        .with_database(move |db| {
            Ok(WordSnapshot {
                vocabulary: db.get_entry(&id)?,
                similar_words: db.similar_words(&id)?,
            })
        })
        .await?;

    Ok(Json(snapshot))
}

pub async fn related_from_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<RelatedFromSnapshot>, AppError> {
    let snapshot = state
        .with_database(move |db| {
            Ok(RelatedFromSnapshot {
                vocabulary: db.get_entry(&id)?,
                related_from_words: db.related_from(&id)?,
            })
        })
        .await?;

    Ok(Json(snapshot))
}

pub async fn relation_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    form: Result<Form<RelationForm>, FormRejection>,
) -> Result<Json<ApiResponse>, AppError> {
    let Form(form) = form?;

    match form.action()? {
        RelationAction::Toggle(related_id) => {
            let (owner, related) = (id.clone(), related_id.clone());
            let linked = state
                .with_database(move |db| db.toggle_relation(&owner, &related))
                .await?;
            info!("Toggled {id} -> {related_id}, linked: {linked}");
        }
        RelationAction::Upsert(related_ids) => {
            let (owner, selected) = (id.clone(), related_ids.clone());
            let inserted = state
                .with_database(move |db| db.upsert_relations(&owner, &selected))
                .await?;
            info!("Saved {} selections for {id}, {inserted} new", related_ids.len());
        }
    }

    Ok(Json(ApiResponse::ok()))
}

pub async fn search_handler(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<VocabularyEntry>> {
    let results = state
        .with_database(move |db| Ok(search_words(db, &params)))
        .await
        .unwrap_or_else(|e| {
            warn!("Search task failed: {e}");
            Vec::new()
        });

    Json(results)
}

pub async fn remove_relation_handler(
    State(state): State<SharedState>,
    payload: Result<Json<RemoveRelation>, JsonRejection>,
) -> Result<Json<ApiResponse>, AppError> {
    let Json(payload) = payload?;

    let relation_id = payload.relation_id.clone();
    state
        .with_database(move |db| db.delete_relation(&relation_id))
        .await?;
    info!("Removed relation {}", payload.relation_id);

    Ok(Json(ApiResponse::ok()))
}

pub async fn delete_word_handler(
    State(state): State<SharedState>,
    form: Result<Form<DeleteForm>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Form(form) = form?;

    state
        .with_database(move |db| db.delete_entry(&form.vocabulary_id))
        .await?;

    Ok(Redirect::to("/"))
}

pub async fn create_handler(
    State(state): State<SharedState>,
    form: Result<Form<CreateForm>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Form(form) = form?;
    let entry = form.entry()?;

    let created = state
        .with_database(move |db| {
            db.create_entry(
                &entry.word,
                entry.phonetic.as_deref(),
                entry.definition.as_deref(),
            )
        })
        .await?;
    info!("Item created successfully: {}", created.word);

    Ok(Redirect::to("/"))
}
