use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use extreme_air_core::domain::strategy::StrategyResult;
use extreme_air_core::llm::error::StrategyError;
use extreme_air_core::llm::gemini::GeminiClient;
use extreme_air_core::llm::generator::StrategyGenerator;
use extreme_air_core::time::vibe::{self, Vibe};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = extreme_air_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let generator = match GeminiClient::from_settings(&settings) {
        Ok(client) => {
            tracing::info!(model = client.model(), "Gemini client configured");
            Some(StrategyGenerator::new(Arc::new(client)))
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "Gemini client unavailable; starting API in degraded mode");
            None
        }
    };

    let zone = vibe::local_zone()?;
    let state = AppState { generator, zone };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/strategies", post(create_strategy))
        .route("/vibe", get(get_vibe))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    generator: Option<StrategyGenerator>,
    zone: chrono_tz::Tz,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStrategyBody {
    client_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiStrategy {
    request_id: Uuid,
    provider: &'static str,
    strategy: StrategyResult,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: &'static str,
    message: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

async fn create_strategy(
    State(state): State<AppState>,
    body: Result<Json<CreateStrategyBody>, JsonRejection>,
) -> ApiResult<ApiStrategy> {
    let Json(body) = body.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "invalid_request",
                message: rejection.body_text(),
            }),
        )
    })?;

    let Some(generator) = &state.generator else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError {
                error: "unavailable",
                message: "strategy generation is not configured".to_string(),
            }),
        ));
    };

    let request_id = Uuid::new_v4();
    let strategy = generator
        .generate_strategy(&body.client_name)
        .await
        .map_err(|e| {
            if !matches!(e, StrategyError::InvalidRequest { .. }) {
                tracing::error!(%request_id, kind = e.kind(), error = %e, "strategy request failed");
                sentry::capture_error(&e);
            }
            error_response(&e)
        })?;

    Ok(Json(ApiStrategy {
        request_id,
        provider: generator.provider().as_str(),
        strategy,
    }))
}

async fn get_vibe(State(state): State<AppState>) -> Json<Vibe> {
    Json(vibe::derive_vibe_at(chrono::Utc::now(), &state.zone))
}

fn error_response(err: &StrategyError) -> (StatusCode, Json<ApiError>) {
    let status = match err {
        StrategyError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        StrategyError::Transport { .. }
        | StrategyError::EmptyResponse { .. }
        | StrategyError::SchemaValidation { .. } => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ApiError {
            error: err.kind(),
            message: err.to_string(),
        }),
    )
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &extreme_air_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
