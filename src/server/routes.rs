use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tokio::fs;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use super::{error::AppError, state::AppState};
use crate::library::{
    manage, paths::resolve_within, Catalog, Chapter, Course, CourseUpdate, NewCourse,
    METADATA_FILE,
};

#[derive(Debug, Default, Deserialize)]
pub struct CourseQuery {
    /// Free-text search over title, description and instructor
    pub q: Option<String>,
    /// Category name; `all` or empty means no filter
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewChapter {
    pub name: String,
}

pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CourseQuery>,
) -> Result<Json<Vec<Course>>, AppError> {
    let catalog = Catalog::build(state.content_root(), &state.scan_options).await?;

    let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));

    if q.is_none() && category.is_none() {
        return Ok(Json(catalog.courses));
    }

    Ok(Json(catalog.query(q, category).into_iter().cloned().collect()))
}

pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Course>, AppError> {
    find_course(&state, &id).await.map(Json)
}

pub async fn create_course(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewCourse>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let id = manage::create_course(state.content_root(), request).await?;
    let course = find_course(&state, &id).await?;

    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn update_course(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<CourseUpdate>,
) -> Result<Json<Course>, AppError> {
    manage::update_course(state.content_root(), &id, update).await?;
    find_course(&state, &id).await.map(Json)
}

pub async fn create_chapter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<NewChapter>,
) -> Result<(StatusCode, Json<Chapter>), AppError> {
    let name = manage::create_chapter(state.content_root(), &id, &request.name).await?;

    Ok((
        StatusCode::CREATED,
        Json(Chapter {
            name,
            lectures: Vec::new(),
        }),
    ))
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, AppError> {
    let catalog = Catalog::build(state.content_root(), &state.scan_options).await?;
    Ok(Json(catalog.categories()))
}

/// Stream a lecture file. Segments arrive percent-decoded by the router.
pub async fn serve_media(
    State(state): State<Arc<AppState>>,
    Path((course, chapter, file)): Path<(String, String, String)>,
    request: Request,
) -> Result<Response, AppError> {
    let not_found = || AppError::NotFound(format!("{course}/{chapter}/{file}"));
    let segments = [course.as_str(), chapter.as_str(), file.as_str()];
    let resolved = resolve_within(state.content_root(), &segments)
        .await?
        .ok_or_else(not_found)?;

    // Only serve what the catalog would list
    if chapter == METADATA_FILE || segments.iter().any(|s| state.scan_options.is_ignored(s)) {
        return Err(not_found());
    }

    match fs::metadata(&resolved).await {
        Ok(metadata) if metadata.is_file() => {}
        _ => return Err(not_found()),
    }

    debug!("Serving {}", resolved.display());

    let response = match ServeFile::new(&resolved).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    Ok(response.into_response())
}

async fn find_course(state: &AppState, id: &str) -> Result<Course, AppError> {
    Catalog::build_course(state.content_root(), id, &state.scan_options)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("course {id}")))
}
