// http server mode - run the assistant as an api

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::core::{AgentInfo, Analyst, CompanyAnalysis, CompanyDocument, SessionId, Sessions, Turn};
use crate::{App, Error};

struct AppState {
    sessions: Arc<Sessions>,
    analyst: Arc<Analyst>,
}

impl From<App> for AppState {
    fn from(app: App) -> Self {
        Self {
            sessions: app.sessions,
            analyst: app.analyst,
        }
    }
}

#[derive(Deserialize)]
struct MessageRequest {
    text: String,
}

#[derive(Serialize)]
struct SessionCreated {
    session_id: SessionId,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    companies: Vec<CompanyDocument>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    message: &'static str,
    individual_analyses: Vec<CompanyAnalysis>,
    comparative_analysis: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

pub struct Server;

impl Server {
    pub fn router(app: App) -> Router {
        let state = Arc::new(AppState::from(app));

        Router::new()
            .route("/health", get(health))
            .route("/agents", get(agents))
            .route("/sessions", post(create_session))
            .route("/sessions/{id}", get(export))
            .route("/sessions/{id}/messages", post(submit))
            .route("/sessions/{id}/reset", post(reset))
            .route("/analyze-companies", post(analyze))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    pub async fn run(app: App, host: &str, port: u16) -> Result<(), Error> {
        let router = Self::router(app);

        let addr = format!("{host}:{port}");
        info!(%addr, "server listening");

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

// caller mistakes get the message, everything else gets logged and a generic reply
fn reject(e: Error) -> (StatusCode, Json<ErrorResponse>) {
    if e.is_rejection() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        );
    }

    error!(error = %e, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal error, please try again later".to_string(),
        }),
    )
}

fn session_id(raw: &str) -> Result<SessionId, (StatusCode, Json<ErrorResponse>)> {
    raw.parse().map_err(reject)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn agents(State(state): State<Arc<AppState>>) -> Json<Vec<AgentInfo>> {
    Json(state.sessions.assistant().agents().info())
}

async fn create_session() -> Json<SessionCreated> {
    Json(SessionCreated {
        session_id: SessionId::generate(),
    })
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> ApiResult<Turn> {
    let id = session_id(&id)?;
    let turn = state.sessions.submit(&id, &req.text).await.map_err(reject)?;
    Ok(Json(turn))
}

async fn reset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let id = session_id(&id)?;
    state.sessions.reset(&id).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn export(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult<Vec<Turn>> {
    let id = session_id(&id)?;
    Ok(Json(state.sessions.export(&id).await))
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult<AnalyzeResponse> {
    let report = state.analyst.analyze(req.companies).await.map_err(reject)?;

    Ok(Json(AnalyzeResponse {
        message: "Analysis completed successfully",
        individual_analyses: report.individual,
        comparative_analysis: report.comparative,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GenerationError;
    use crate::core::guard::GENERIC_FAILURE;
    use crate::{Generator, PolicySet};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    const PROVIDER_DETAIL: &str = "upstream said: invalid x-api-key sk-live-1234";

    // replies in order, None fails the call with a provider error
    struct Canned(Mutex<VecDeque<Option<&'static str>>>);

    #[async_trait::async_trait]
    impl Generator for Canned {
        async fn generate(&self, _system: &str, _user: &str) -> Result<String, GenerationError> {
            let next = self.0.lock().unwrap().pop_front().flatten();
            next.map(str::to_string).ok_or(GenerationError::Provider {
                status: 401,
                body: PROVIDER_DETAIL.to_string(),
            })
        }
    }

    fn state(replies: impl IntoIterator<Item = Option<&'static str>>) -> State<Arc<AppState>> {
        let generator = Arc::new(Canned(Mutex::new(replies.into_iter().collect())));
        let app = App::with_generator(generator, PolicySet::defaults(), Duration::from_secs(1)).unwrap();
        State(Arc::new(AppState::from(app)))
    }

    fn companies(names: [&str; 4]) -> Json<AnalyzeRequest> {
        Json(AnalyzeRequest {
            companies: names
                .into_iter()
                .map(|name| CompanyDocument {
                    name: Some(name.to_string()),
                    text: format!("{name} annual report"),
                })
                .collect(),
        })
    }

    #[tokio::test]
    async fn test_analyze_keeps_document_order() {
        let replies = ["| zeta |", "| acme |", "| beta |", "| gamma |", "| all |"];
        let state = state(replies.map(Some));

        let Ok(Json(response)) = analyze(state, companies(["Zeta", "Acme", "Beta", "Gamma"])).await
        else {
            panic!("analysis should succeed");
        };

        let json = serde_json::to_value(&response).unwrap();
        let analyses = json["individual_analyses"].as_array().unwrap();
        assert_eq!(analyses.len(), 4);
        let names: Vec<&str> = analyses.iter().map(|a| a["company"].as_str().unwrap()).collect();
        assert_eq!(names, ["Zeta", "Acme", "Beta", "Gamma"]);
        assert_eq!(analyses[0]["analysis"], "| zeta |");
        assert_eq!(json["comparative_analysis"], "| all |");
    }

    #[tokio::test]
    async fn test_analyze_rejects_duplicate_names() {
        let state = state([]);

        let Err((status, Json(body))) = analyze(state, companies(["Zeta", "Acme", "Acme", "Beta"])).await
        else {
            panic!("duplicate names should be rejected");
        };

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("Acme"));
    }

    #[tokio::test]
    async fn test_analyze_failure_hides_provider_detail() {
        let state = state([Some("| zeta |"), None]);

        let Err((status, Json(body))) = analyze(state, companies(["Zeta", "Acme", "Beta", "Gamma"])).await
        else {
            panic!("a failed generation should fail the analysis");
        };

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal error, please try again later");
        assert!(!body.error.contains("sk-live"));
    }

    #[tokio::test]
    async fn test_malformed_session_id_is_bad_request() {
        let request = Json(MessageRequest {
            text: "What is a bond?".to_string(),
        });
        let Err((status, _)) = submit(state([]), Path("../etc".to_string()), request).await else {
            panic!("submit should reject the id");
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let Err((status, Json(body))) = export(state([]), Path("has space".to_string())).await else {
            panic!("export should reject the id");
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.contains("has space"));
    }

    #[tokio::test]
    async fn test_empty_message_is_bad_request() {
        let request = Json(MessageRequest {
            text: "  ".to_string(),
        });
        let Err((status, _)) = submit(state([]), Path("s1".to_string()), request).await else {
            panic!("an empty message should be rejected");
        };
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_failure_hides_provider_detail() {
        let request = Json(MessageRequest {
            text: "What is a bond?".to_string(),
        });

        let Ok(Json(turn)) = submit(state([None]), Path("s1".to_string()), request).await else {
            panic!("a failed generation still records a turn");
        };

        assert_eq!(turn.content, GENERIC_FAILURE);
        assert!(!turn.content.contains("sk-live"));
    }

    #[test]
    fn test_internal_errors_are_generic() {
        let (status, Json(body)) = reject(Error::Generation(GenerationError::Provider {
            status: 500,
            body: PROVIDER_DETAIL.to_string(),
        }));

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.error.contains("sk-live"));
    }
}
