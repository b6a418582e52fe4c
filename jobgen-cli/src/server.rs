use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use jobgen::flows::{self, JobPost, LatexDocument, ModerationVerdict, UserProfile};
use jobgen::{AllProvidersFailed, FlowError, Orchestrator};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::Instrument;

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub orchestrator: Orchestrator,
}

pub fn router(orchestrator: Orchestrator) -> Router {
    let state = Arc::new(AppState { orchestrator });
    Router::new()
        .route("/health", get(health))
        .route("/v1/providers", get(list_providers))
        .route("/v1/generate", post(generate))
        .route("/v1/resume", post(resume))
        .route("/v1/cover-letter", post(cover_letter))
        .route("/v1/job-posts/validate", post(validate_job_post))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(host: &str, port: u16, orchestrator: Orchestrator) -> anyhow::Result<()> {
    let configured = orchestrator.configured_providers().len();
    if configured == 0 {
        tracing::warn!("no provider has a credential; generation requests will fail");
    }
    let app = router(orchestrator);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(configured, "jobgen listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

pub enum ApiError {
    BadRequest(String),
    Generation(AllProvidersFailed),
    Flow(FlowError),
}

impl From<AllProvidersFailed> for ApiError {
    fn from(e: AllProvidersFailed) -> Self {
        ApiError::Generation(e)
    }
}

impl From<FlowError> for ApiError {
    fn from(e: FlowError) -> Self {
        match e {
            FlowError::Generation(inner) => ApiError::Generation(inner),
            other => ApiError::Flow(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, "invalid_request", m),
            ApiError::Generation(e) => {
                let kind = if e.nothing_attempted() {
                    "no_providers_configured"
                } else {
                    "all_providers_failed"
                };
                (StatusCode::BAD_GATEWAY, kind, e.to_string())
            }
            ApiError::Flow(e) => (StatusCode::BAD_GATEWAY, "invalid_ai_reply", e.to_string()),
        };
        (status, Json(json!({ "error": { "type": kind, "message": message } }))).into_response()
    }
}

fn request_span(route: &'static str) -> tracing::Span {
    tracing::info_span!("request", route, id = %uuid::Uuid::new_v4())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Serialize)]
struct ProviderInfo {
    name: String,
    configured: bool,
}

async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<ProviderInfo>> {
    let data = state
        .orchestrator
        .providers()
        .iter()
        .map(|p| ProviderInfo {
            name: p.name().to_string(),
            configured: p.is_configured(),
        })
        .collect();
    Json(data)
}

#[derive(Deserialize)]
struct GenerateRequest {
    prompt: String,
}

#[derive(Serialize)]
struct GenerateResponse {
    text: String,
    provider: String,
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    if req.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".into()));
    }
    let generation = state
        .orchestrator
        .generate_detailed(&req.prompt)
        .instrument(request_span("generate"))
        .await?;
    Ok(Json(GenerateResponse {
        text: generation.text,
        provider: generation.provider,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRequest {
    profile_data: UserProfile,
    job_description: String,
    /// Return an error instead of the template document.
    #[serde(default)]
    no_fallback: bool,
}

impl DocumentRequest {
    fn check(&self) -> Result<(), ApiError> {
        if self.job_description.trim().is_empty() {
            return Err(ApiError::BadRequest("jobDescription must not be empty".into()));
        }
        Ok(())
    }
}

async fn resume(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DocumentRequest>,
) -> Result<Json<LatexDocument>, ApiError> {
    req.check()?;
    let orch = &state.orchestrator;
    let doc = async {
        if req.no_fallback {
            flows::tailor_resume(orch, &req.profile_data, &req.job_description).await
        } else {
            Ok(flows::tailor_resume_or_fallback(orch, &req.profile_data, &req.job_description).await)
        }
    }
    .instrument(request_span("resume"))
    .await?;
    Ok(Json(doc))
}

async fn cover_letter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DocumentRequest>,
) -> Result<Json<LatexDocument>, ApiError> {
    req.check()?;
    let orch = &state.orchestrator;
    let doc = async {
        if req.no_fallback {
            flows::generate_cover_letter(orch, &req.profile_data, &req.job_description).await
        } else {
            Ok(flows::generate_cover_letter_or_fallback(orch, &req.profile_data, &req.job_description).await)
        }
    }
    .instrument(request_span("cover_letter"))
    .await?;
    Ok(Json(doc))
}

async fn validate_job_post(
    State(state): State<Arc<AppState>>,
    Json(post): Json<JobPost>,
) -> Result<Json<ModerationVerdict>, ApiError> {
    let verdict = flows::validate_job_description(&state.orchestrator, &post)
        .instrument(request_span("validate_job_post"))
        .await?;
    Ok(Json(verdict))
}
