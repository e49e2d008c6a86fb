//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, FsStorage},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, me_handler, signup_handler},
        blog, library, notes, quickref,
        middleware::{optional_auth, require_auth},
        rest::ApiDoc,
        state::{AppState, AuthEvents},
        tickets::Tickets,
        viewer_ws_handler,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
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
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Storage ---
    let storage = Arc::new(FsStorage::new(config.storage_root.clone()));
    info!("Serving files from {}", config.storage_root.display());

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        storage,
        config: config.clone(),
        tickets: Arc::new(Tickets::new()),
        auth_events: AuthEvents::new(),
    });

    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|_| ApiError::Internal(format!("Invalid CORS_ORIGIN '{}'", config.cors_origin)))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required). Logout and /auth/me read the
    // session cookie themselves so a stale cookie still gets an answer.
    let public_routes = Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/me", get(me_handler))
        .route("/blog/posts", get(blog::list_published_posts_handler))
        .route("/blog/posts/{slug}", get(blog::get_post_handler))
        .route("/library/pdfs/{id}", get(library::get_pdf_handler))
        .route("/library/file/{token}", get(library::serve_file_handler))
        .route("/library/upload/{token}", put(library::upload_via_ticket_handler))
        .route("/quickref", get(quickref::list_quick_refs_handler));

    // The library listing is public but progress-aware for signed-in users.
    let library_listing = Router::new()
        .route("/library", get(library::list_pdfs_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            optional_auth,
        ));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/blog/manage", get(blog::manage_posts_handler))
        .route("/blog/manage", post(blog::create_post_handler))
        .route("/blog/manage/{id}", put(blog::update_post_handler))
        .route("/blog/manage/{id}", delete(blog::delete_post_handler))
        .route("/library/pdfs", post(library::upload_pdf_handler))
        .route("/library/upload-url", post(library::create_upload_url_handler))
        .route("/library/pdfs/metadata", post(library::register_pdf_handler))
        .route("/library/pdfs/{id}", put(library::update_pdf_handler))
        .route("/library/pdfs/{id}", delete(library::delete_pdf_handler))
        .route("/library/progress", get(library::progress_list_handler))
        .route("/library/viewer", get(viewer_ws_handler))
        .route(
            "/library/pdfs/{id}/notes",
            get(notes::list_page_notes_handler).post(notes::create_note_handler),
        )
        .route("/notes", get(notes::search_notes_handler))
        .route("/notes/pdfs", get(notes::notes_pdfs_handler))
        .route("/notes/{id}", put(notes::update_note_handler))
        .route("/notes/{id}", delete(notes::delete_note_handler))
        .route("/quickref", post(quickref::create_quick_ref_handler))
        .route("/quickref/{id}", put(quickref::update_quick_ref_handler))
        .route("/quickref/{id}", delete(quickref::delete_quick_ref_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(library_listing)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes + 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

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

    Ok(())
}
