use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, Level};

mod db;
mod domain;
mod rest;

use domain::calendar::CalendarService;
use domain::meta::MetaService;
use domain::tasks::TaskService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Setting up database");
    let db = db::DbConnection::init().await?;

    // Services share one explicitly constructed connection handle; it lives
    // for the whole process and closes with it
    let state = rest::AppState::new(
        TaskService::new(db.clone()),
        MetaService::new(db),
        CalendarService::new(),
    );

    // CORS setup to allow a dev frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    // Set up our application routes
    let api_routes = Router::new()
        .route(
            "/tasks",
            get(rest::list_tasks)
                .post(rest::create_task)
                .delete(rest::delete_task),
        )
        .route("/day-meta", get(rest::get_day_meta).post(rest::put_day_meta))
        .route(
            "/month-meta",
            get(rest::get_month_meta).post(rest::put_month_meta),
        )
        .route("/calendar/current-date", get(rest::current_date))
        .route("/calendar/window", get(rest::near_today_window))
        .route("/calendar/:year/:month", get(rest::calendar_month));

    // Define our main application router
    let app = Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(PathBuf::from("static")))
        .layer(cors)
        .with_state(state);

    // Start the server
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
