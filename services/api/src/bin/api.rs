//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{HttpAnalysisAdapter, HttpFollowupAdapter},
    config::Config,
    error::ApiError,
    web::{self, conversation::ConversationHandle, rest::ApiDoc, state::AppState},
};
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use resume_tailor_core::ConversationController;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    let analysis_adapter = Arc::new(HttpAnalysisAdapter::new(
        http_client.clone(),
        &config.analyzer_base_url,
    ));
    let followup_adapter = Arc::new(HttpFollowupAdapter::new(
        http_client,
        &config.analyzer_base_url,
    ));
    info!(analyzer = %config.analyzer_base_url, "Analysis service adapters ready.");

    // --- 3. Build the Shared AppState ---
    let controller = ConversationController::new(analysis_adapter, followup_adapter);
    let app_state = Arc::new(AppState {
        config: config.clone(),
        conversation: ConversationHandle::new(controller),
    });

    // --- 4. Configure CORS ---
    let allowed_origin = config
        .cors_allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| {
            ApiError::Internal(format!(
                "Invalid CORS origin '{}': {}",
                config.cors_allowed_origin, e
            ))
        })?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    // --- 5. Create the Web Router ---
    let app = web::router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
