//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, OpenAiChatAdapter, PgChangeFeed},
    config::Config,
    error::ApiError,
    notify::NotificationHub,
    web::{
        announcements::{create_announcement_handler, list_announcements_handler},
        auth::{
            federated_callback_handler, federated_handler, login_handler, logout_handler,
            signup_handler,
        },
        chat::chat_handler,
        middleware::require_auth,
        notifications::{list_notifications_handler, mark_all_read_handler, mark_read_handler},
        profile::{access_handler, get_profile_handler, update_profile_handler},
        rest::ApiDoc,
        state::AppState,
        tickets::{create_ticket_handler, list_tickets_handler, update_ticket_status_handler},
    },
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use campus_portal_core::session::SessionGate;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
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

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(
        db_pool.clone(),
        config.federated_auth_url.clone(),
    ));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(&config.openai_api_key);
    let openai_client = Client::with_config(openai_config);
    let chat_adapter = Arc::new(OpenAiChatAdapter::new(
        openai_client,
        config.chat_model.clone(),
    ));

    let feed = Arc::new(PgChangeFeed::new(config.database_url.clone()));
    let hub = NotificationHub::new(feed);
    hub.spawn_announcement_fanout();

    let gate = Arc::new(SessionGate::new(db_adapter.clone(), db_adapter.clone()));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        gate,
        store: db_adapter,
        chat: chat_adapter,
        hub,
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {e}")))?,
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/federated", get(federated_handler))
        .route("/auth/callback", get(federated_callback_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/profile", get(get_profile_handler).put(update_profile_handler))
        .route("/access", get(access_handler))
        .route("/notifications", get(list_notifications_handler))
        .route("/notifications/{id}/read", post(mark_read_handler))
        .route("/notifications/read-all", post(mark_all_read_handler))
        .route("/tickets", get(list_tickets_handler).post(create_ticket_handler))
        .route("/tickets/{id}/status", put(update_ticket_status_handler))
        .route(
            "/announcements",
            get(list_announcements_handler).post(create_announcement_handler),
        )
        .route("/chat", post(chat_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state.clone());

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    app_state.hub.shutdown();

    Ok(())
}
