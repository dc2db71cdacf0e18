//! Form handlers. Each one makes exactly one store call on the blocking
//! pool and renders the page with the result.

use super::error::UiError;
use super::page::{Outcome, Tab, render};
use super::{AppState, PAGE_TITLE};
use crate::models::{Chunk, DenseQuery, DistanceMetric, VECTOR, parse_vector};
use crate::services::{ChunkStore, filename_condition};
use crate::storage::SqliteEngine;
use crate::{Error, Result};
use axum::Form;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use std::sync::Arc;

/// Default number of vector search hits.
const DEFAULT_VECTOR_TOP_K: usize = 3;
/// Default number of full-text hits.
const DEFAULT_TEXT_TOP_K: usize = 10;

type HandlerResult = std::result::Result<Html<String>, UiError>;

/// `?tab=` selector.
#[derive(Debug, Deserialize)]
pub struct TabQuery {
    tab: Option<String>,
}

/// Insert form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InsertForm {
    file_uuid: String,
    filename: String,
    chunk_text: String,
    vector: String,
}

/// Delete form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteForm {
    condition: String,
}

/// Vector search form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchForm {
    vector: String,
    filename: String,
    top_k: String,
    metric: String,
}

/// Full-text search form.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TextSearchForm {
    query: String,
    top_k: String,
}

/// Runs one store call on the blocking pool.
async fn blocking<T, F>(state: &AppState, tab: Tab, f: F) -> std::result::Result<T, UiError>
where
    T: Send + 'static,
    F: FnOnce(&ChunkStore<SqliteEngine>) -> Result<T> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    let joined = tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|e| UiError::new(tab, Error::operation("ui_task", e)))?;
    joined.map_err(|e| UiError::new(tab, e))
}

fn page(tab: Tab, outcome: &Outcome) -> Html<String> {
    Html(render(PAGE_TITLE, tab, outcome))
}

fn parse_top_k(input: &str, default: usize) -> Result<usize> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(default);
    }
    input
        .parse()
        .map_err(|_| Error::InvalidInput(format!("top_k '{input}' is not a number")))
}

fn column_names(state: &AppState) -> Vec<String> {
    state
        .store
        .settings()
        .schema
        .column_names()
        .map(ToString::to_string)
        .collect()
}

/// `GET /`
pub async fn index(Query(query): Query<TabQuery>) -> Html<String> {
    let tab = query.tab.as_deref().map_or(Tab::Insert, Tab::from_id);
    page(tab, &Outcome::Empty)
}

/// `POST /insert`
pub async fn insert(State(state): State<AppState>, Form(form): Form<InsertForm>) -> HandlerResult {
    let tab = Tab::Insert;
    let vector = parse_vector(&form.vector).map_err(|e| UiError::new(tab, e))?;
    let chunk = Chunk {
        chunk_text: form.chunk_text,
        file_uuid: form.file_uuid,
        filename: form.filename,
        vector,
    };
    blocking(&state, tab, move |store| store.insert_chunk(chunk)).await?;
    Ok(page(tab, &Outcome::Message("Inserted 1 chunk.".to_string())))
}

/// `POST /delete`
pub async fn delete(State(state): State<AppState>, Form(form): Form<DeleteForm>) -> HandlerResult {
    let tab = Tab::Delete;
    let deleted = blocking(&state, tab, move |store| store.delete(&form.condition)).await?;
    Ok(page(tab, &Outcome::Message(format!("Deleted {deleted} row(s)."))))
}

/// `POST /search`
pub async fn search(State(state): State<AppState>, Form(form): Form<SearchForm>) -> HandlerResult {
    let tab = Tab::Search;
    let parsed = (|| -> Result<DenseQuery> {
        let vector = parse_vector(&form.vector)?;
        let top_k = parse_top_k(&form.top_k, DEFAULT_VECTOR_TOP_K)?;
        let metric = if form.metric.trim().is_empty() {
            DistanceMetric::default()
        } else {
            form.metric.parse()?
        };
        let query = DenseQuery::new(VECTOR, vector, metric, top_k);
        Ok(match filename_condition(&form.filename) {
            Some(condition) => query.with_filter(condition),
            None => query,
        })
    })();
    let query = parsed.map_err(|e| UiError::new(tab, e))?;
    let score_label = query.metric.score_label();

    let hits = blocking(&state, tab, move |store| store.search_dense(&query)).await?;
    Ok(page(
        tab,
        &Outcome::Scored {
            columns: column_names(&state),
            score_label,
            hits,
        },
    ))
}

/// `POST /search/text`
pub async fn search_text(
    State(state): State<AppState>,
    Form(form): Form<TextSearchForm>,
) -> HandlerResult {
    let tab = Tab::TextSearch;
    let top_k =
        parse_top_k(&form.top_k, DEFAULT_TEXT_TOP_K).map_err(|e| UiError::new(tab, e))?;
    let hits = blocking(&state, tab, move |store| {
        store.search_by_text(&form.query, top_k)
    })
    .await?;
    Ok(page(
        tab,
        &Outcome::Scored {
            columns: column_names(&state),
            score_label: "score",
            hits,
        },
    ))
}

/// `POST /list`
pub async fn list(State(state): State<AppState>) -> HandlerResult {
    let tab = Tab::List;
    let rows = blocking(&state, tab, ChunkStore::list_all).await?;
    Ok(page(
        tab,
        &Outcome::Records {
            columns: column_names(&state),
            rows,
        },
    ))
}

/// `POST /list/files`
pub async fn list_files(State(state): State<AppState>) -> HandlerResult {
    let tab = Tab::List;
    let files = blocking(&state, tab, ChunkStore::list_by_filename).await?;
    Ok(page(tab, &Outcome::Files(files)))
}

/// `POST /drop-table`
pub async fn drop_table(State(state): State<AppState>) -> HandlerResult {
    let tab = Tab::DropTable;
    blocking(&state, tab, ChunkStore::drop_table).await?;
    let table = &state.store.settings().table;
    Ok(page(
        tab,
        &Outcome::Message(format!("Dropped table '{table}'.")),
    ))
}

/// `POST /drop-workspace`
pub async fn drop_workspace(State(state): State<AppState>) -> HandlerResult {
    let tab = Tab::DropWorkspace;
    blocking(&state, tab, ChunkStore::drop_workspace).await?;
    Ok(page(tab, &Outcome::Message("Dropped workspace.".to_string())))
}

/// `POST /recreate`
pub async fn recreate(State(state): State<AppState>) -> HandlerResult {
    let tab = Tab::DropTable;
    blocking(&state, tab, |store| {
        store.ensure_table()?;
        store.ensure_index()
    })
    .await?;
    let table = &state.store.settings().table;
    Ok(page(
        tab,
        &Outcome::Message(format!("Table '{table}' is ready.")),
    ))
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics are disabled").into_response(),
    }
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}
