//! HTTP surface: the HTML form, a JSON twin of it and a health check.

pub mod page;

use std::{fmt, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::{
    charts::{ChartError, ChartSize, Charts},
    config::ServerConfig,
    input,
    normality::StatsError,
    report::StatisticsReport,
};

#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
}

/// Everything computed for one accepted submission.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub report: StatisticsReport,
    pub charts: Charts,
}

impl Analysis {
    pub fn run(values: &[f64], size: ChartSize) -> Result<Self, AppError> {
        let report = StatisticsReport::compute(values)?;
        let charts = Charts::render(values, size)?;
        Ok(Self { report, charts })
    }
}

#[derive(Debug)]
pub enum AppError {
    Stats(StatsError),
    Chart(ChartError),
    Task(tokio::task::JoinError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Stats(err) => write!(f, "statistics failed: {err}"),
            AppError::Chart(err) => write!(f, "chart rendering failed: {err}"),
            AppError::Task(err) => write!(f, "analysis task failed: {err}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<StatsError> for AppError {
    fn from(err: StatsError) -> Self {
        AppError::Stats(err)
    }
}

impl From<ChartError> for AppError {
    fn from(err: ChartError) -> Self {
        AppError::Chart(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("{self}");
        (StatusCode::INTERNAL_SERVER_ERROR, "analysis failed").into_response()
    }
}

/// Run the analysis off the async workers; chart rendering is CPU bound.
async fn analyze(values: Vec<f64>, size: ChartSize) -> Result<Analysis, AppError> {
    tokio::task::spawn_blocking(move || Analysis::run(&values, size))
        .await
        .map_err(AppError::Task)?
}

pub fn router(config: ServerConfig) -> Router {
    let max_body_bytes = config.max_body_bytes;
    let state = AppState {
        config: Arc::new(config),
    };

    Router::new()
        .route("/", get(show_form).post(submit_form))
        .route("/api/analyze", post(analyze_json))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct NumbersForm {
    #[serde(default)]
    pub numbers: String,
}

async fn show_form() -> Html<String> {
    Html(page::render(&page::Page::default()))
}

async fn submit_form(
    State(state): State<AppState>,
    Form(form): Form<NumbersForm>,
) -> Result<Html<String>, AppError> {
    let values = match input::parse_numbers(&form.numbers) {
        Ok(values) => values,
        Err(err) => {
            debug!("rejected submission: {err}");
            return Ok(Html(page::render(&page::Page {
                numbers: &form.numbers,
                error: Some(err.to_string()),
                analysis: None,
            })));
        },
    };

    let analysis = analyze(values, state.config.chart_size).await?;
    info!(n = analysis.report.n, "analyzed submission");
    Ok(Html(page::render(&page::Page {
        numbers: &form.numbers,
        error: None,
        analysis: Some(&analysis),
    })))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub numbers: String,
}

#[derive(Serialize)]
struct AnalyzeResponse<'a> {
    results: &'a StatisticsReport,
    histogram_png: &'a str,
    qq_png: &'a str,
}

async fn analyze_json(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Response, AppError> {
    let values = match input::parse_numbers(&request.numbers) {
        Ok(values) => values,
        Err(err) => {
            debug!("rejected api request: {err}");
            let body = json!({ "error": err.to_string() });
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response());
        },
    };

    let analysis = analyze(values, state.config.chart_size).await?;
    info!(n = analysis.report.n, "analyzed api request");
    let body = AnalyzeResponse {
        results: &analysis.report,
        histogram_png: &analysis.charts.histogram,
        qq_png: &analysis.charts.qq_plot,
    };
    Ok(Json(body).into_response())
}
