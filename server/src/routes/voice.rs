//! Voice-catalog handlers. Listings expand the category reference into
//! `{id, title}` at read time; a deleted category surfaces as null.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::Principal;
use crate::catalog::{self, NewVoice};
use crate::error::AppError;
use crate::models::Voice;
use crate::state::AppState;
use crate::uploads;

#[derive(Serialize)]
pub struct CategoryRef {
    pub id: String,
    pub title: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceView {
    pub id: String,
    pub author: String,
    pub voicename: String,
    pub note: Option<String>,
    pub category: Option<CategoryRef>,
    pub audio: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

async fn voice_views(state: &AppState, voices: Vec<Voice>) -> Result<Vec<VoiceView>, AppError> {
    let titles: HashMap<String, String> = state
        .store
        .list_categories()
        .await?
        .into_iter()
        .map(|c| (c.id, c.title))
        .collect();

    Ok(voices
        .into_iter()
        .map(|v| {
            let category = titles.get(&v.category).map(|title| CategoryRef {
                id: v.category.clone(),
                title: title.clone(),
            });
            VoiceView {
                id: v.id,
                author: v.author,
                voicename: v.voicename,
                note: v.note,
                category,
                audio: v.audio,
                created_at: v.created_at,
            }
        })
        .collect())
}

pub async fn add_voice(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Voice>), AppError> {
    principal.admin_id()?;

    let (fields, audio) =
        uploads::read_form(multipart, &uploads::audio(), &state.config.upload_dir).await?;
    let audio = audio.ok_or_else(|| AppError::Validation("No audio file uploaded!".to_string()))?;

    let new = NewVoice {
        author: uploads::required_field(&fields, "author")?,
        voicename: uploads::required_field(&fields, "voicename")?,
        note: fields.get("note").cloned(),
        category_id: uploads::required_field(&fields, "category")?,
        audio,
    };

    let voice = catalog::create_voice(state.store.as_ref(), new).await?;
    Ok((StatusCode::CREATED, Json(voice)))
}

pub async fn all_voices(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<VoiceView>>, AppError> {
    principal.admin_id()?;

    let voices = state.store.list_voices(None).await?;
    Ok(Json(voice_views(&state, voices).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceQuery {
    pub category_id: Option<String>,
}

/// Public listing, optionally filtered to one category.
pub async fn voices_by_category(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VoiceQuery>,
) -> Result<Json<Vec<VoiceView>>, AppError> {
    let voices = state
        .store
        .list_voices(query.category_id.as_deref())
        .await?;

    Ok(Json(voice_views(&state, voices).await?))
}

pub async fn delete_voice(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    principal.admin_id()?;

    catalog::delete_voice(state.store.as_ref(), &id).await?;
    Ok(Json(json!({ "message": "Voice deleted successfully" })))
}
