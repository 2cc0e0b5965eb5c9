use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State, rejection::PathRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use maud::Markup;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::{
    error::Error,
    fetcher::ContentFetcher,
    progress::{Advance, ProgressStore},
    schedule::{Day, ScheduleStore},
    views,
};

/// Everything a request needs, shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub schedule: Arc<ScheduleStore>,
    pub progress: Arc<ProgressStore>,
    pub fetcher: ContentFetcher,
}

impl AppState {
    pub fn new(schedule: ScheduleStore, progress: ProgressStore, fetcher: ContentFetcher) -> Self {
        Self {
            schedule: Arc::new(schedule),
            progress: Arc::new(progress),
            fetcher,
        }
    }
}

/// Any segment that does not extract cleanly counts as an invalid day.
fn parse_day(day: Result<Path<String>, PathRejection>) -> Result<Day, Error> {
    let Path(day) = day.map_err(|e| {
        debug!("rejected day segment: {}", e);
        Error::InvalidDay
    })?;
    day.parse()
}

pub async fn overview(State(state): State<AppState>) -> Result<Markup, Error> {
    let progress = state.progress.load().await?;
    let schedule = state.schedule.load().await?;
    let today = progress
        .today()
        .and_then(|day| schedule.get(day).map(|entry| (day, entry)));
    Ok(views::overview(&progress, today))
}

pub async fn day_detail(
    State(state): State<AppState>,
    day: Result<Path<String>, PathRejection>,
) -> Result<Markup, Error> {
    let day = parse_day(day)?;
    let entry = state.schedule.get(day).await?;
    let progress = state.progress.load().await?;
    let text = state.fetcher.fetch(&entry.book, &entry.chapter).await;
    Ok(views::day_detail(&progress.day_view(day), &entry, &text))
}

/// Always redirects to the board; out-of-order requests are ignored.
pub async fn mark_done(
    State(state): State<AppState>,
    day: Result<Path<String>, PathRejection>,
) -> Result<Response, Error> {
    let day = parse_day(day)?;
    if let Advance::Accepted(record) = state.progress.mark_done(day).await? {
        debug!("progress now at day {}", record.last_completed_day);
    }
    Ok((StatusCode::FOUND, [(header::LOCATION, "/")]).into_response())
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Page not found")
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(overview))
        .route("/day/{day}", get(day_detail))
        .route("/mark_done/{day}", post(mark_done))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
