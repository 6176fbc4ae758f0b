use axum::body::Bytes;
use axum::extract::{Form, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use log::{debug, error, info};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::engine::dex::{current_pokemon, partition_caught, progress, sort_by_catch_order, SortMode};
use crate::web::app::AppState;
use crate::web::views;

const DEFAULT_TITLE_SIZE: i64 = 32;

/// Failure to persist state. Logged, reported as a bare 500.
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "failed to save tracker state").into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectForm {
    #[serde(default)]
    pub generation: String,
    #[serde(default)]
    pub game: String,
}

#[derive(Debug, Deserialize)]
pub struct TrackerForm {
    #[serde(default)]
    pub action: String,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SortQuery {
    pub sort: Option<String>,
}

/// Integer field of a JSON body; accepts numbers and numeric strings.
fn int_field(body: &Value, field: &str) -> Option<i64> {
    match body.get(field)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_body(body: &Bytes) -> Option<Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("Ignoring malformed JSON body: {}", e);
            None
        }
    }
}

fn tracker_url(sort: SortMode) -> String {
    format!("/tracker?sort={}", sort.as_str())
}

pub async fn index_handler() -> Redirect {
    Redirect::to("/tracker")
}

pub async fn select_page_handler(State(state): State<AppState>) -> Html<String> {
    let tracker = &state.tracker;
    let current = tracker.load_state();
    let generations = tracker.catalog().generation_names();
    let games = tracker.catalog().games_for(&current.generation);
    Html(views::select_page(&generations, &games, &current))
}

pub async fn select_handler(
    State(state): State<AppState>,
    Form(form): Form<SelectForm>,
) -> Result<Redirect, AppError> {
    let tracker = &state.tracker;
    let _guard = tracker.begin_update().await;
    let mut current = tracker.load_state();
    if current.select(tracker.catalog(), form.generation.trim(), form.game.trim()) {
        info!("Selected {} / {}", current.generation, current.game);
        tracker.save_state(&current)?;
    }
    Ok(Redirect::to("/tracker"))
}

pub async fn tracker_page_handler(
    State(state): State<AppState>,
    Query(query): Query<SortQuery>,
) -> Html<String> {
    let tracker = &state.tracker;
    let sort = SortMode::parse(query.sort.as_deref());
    let (mut current, game_list) = tracker.load_with_list().await;
    let mut dex = tracker.dex_list(Some(&current.generation)).await;
    if sort == SortMode::Catch {
        sort_by_catch_order(&mut dex, &game_list);
    }
    let pokemon = current_pokemon(&mut current, &game_list);
    let caught = current.is_caught(pokemon.id);
    let (uncaught_list, caught_list) = partition_caught(dex, &current);
    Html(views::tracker_page(&views::TrackerView {
        state: &current,
        pokemon: &pokemon,
        caught,
        uncaught_list: &uncaught_list,
        caught_list: &caught_list,
        sort,
    }))
}

pub async fn tracker_action_handler(
    State(state): State<AppState>,
    Form(form): Form<TrackerForm>,
) -> Result<Redirect, AppError> {
    let tracker = &state.tracker;
    let sort = SortMode::parse(form.sort.as_deref());
    let _guard = tracker.begin_update().await;
    let (mut current, game_list) = tracker.load_with_list().await;

    match form.action.as_str() {
        "next" => {
            current.next(game_list.len());
        }
        "prev" => {
            current.prev();
        }
        "toggle" if !game_list.is_empty() => {
            let pokemon = current_pokemon(&mut current, &game_list);
            let flag = current.toggle(pokemon.id);
            info!("{} (#{}) marked {}", pokemon.name, pokemon.id, if flag { "caught" } else { "uncaught" });
        }
        other => debug!("Ignoring tracker action '{}'", other),
    }

    tracker.save_state(&current)?;
    Ok(Redirect::to(&tracker_url(sort)))
}

pub async fn set_current_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let Some(id) = parse_body(&body).and_then(|v| int_field(&v, "id")) else {
        return Ok(StatusCode::NO_CONTENT);
    };
    let Ok(id) = u32::try_from(id) else {
        return Ok(StatusCode::NO_CONTENT);
    };

    let tracker = &state.tracker;
    let _guard = tracker.begin_update().await;
    let (mut current, game_list) = tracker.load_with_list().await;
    if current.set_current(id, &game_list) {
        tracker.save_state(&current)?;
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_title_size_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let Some(body) = parse_body(&body) else {
        return Ok(StatusCode::NO_CONTENT);
    };
    let size = match body.get("size") {
        None => DEFAULT_TITLE_SIZE,
        Some(_) => match int_field(&body, "size") {
            Some(size) => size,
            None => return Ok(StatusCode::NO_CONTENT),
        },
    };

    let tracker = &state.tracker;
    let _guard = tracker.begin_update().await;
    let mut current = tracker.load_state();
    current.set_title_size(size);
    tracker.save_state(&current)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn display_page_handler(State(state): State<AppState>) -> Html<String> {
    let tracker = &state.tracker;
    let (mut current, game_list) = tracker.load_with_list().await;
    let pokemon = current_pokemon(&mut current, &game_list);
    let dex = tracker.dex_list(Some(&current.generation)).await;
    Html(views::display_page(&pokemon, &progress(&current, &dex)))
}

pub async fn current_index_handler(State(state): State<AppState>) -> impl IntoResponse {
    let tracker = &state.tracker;
    let (current, _) = tracker.load_with_list().await;
    let dex = tracker.dex_list(Some(&current.generation)).await;
    Json(progress(&current, &dex))
}

pub async fn games_handler(
    State(state): State<AppState>,
    Path(generation): Path<String>,
) -> impl IntoResponse {
    Json(json!({ "games": state.tracker.catalog().games_for(&generation) }))
}

pub async fn static_handler(Path(file): Path<String>) -> Response {
    match views::static_asset(&file) {
        Some((content_type, body)) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_field() {
        let body = json!({"id": 25, "size": "40", "bad": "x", "float": 12.0});
        assert_eq!(int_field(&body, "id"), Some(25));
        assert_eq!(int_field(&body, "size"), Some(40));
        assert_eq!(int_field(&body, "bad"), None);
        assert_eq!(int_field(&body, "float"), Some(12));
        assert_eq!(int_field(&body, "missing"), None);
    }
}
