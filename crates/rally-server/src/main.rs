use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use rally_api::middleware::require_auth;
use rally_api::{AppState, AppStateInner, reconcile, registrations, teams, votes};
use rally_notify::Notifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rally=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("RALLY_DB_PATH").unwrap_or_else(|_| "rally.db".into());
    let host = std::env::var("RALLY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("RALLY_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = Arc::new(rally_db::Database::open(&PathBuf::from(&db_path))?);

    // Notifications: the drain task is where delivery (push, email) hooks
    // in. It runs outside every transaction; a slow or failing consumer
    // never affects the write path.
    let notifier = Notifier::new();
    let mut notifications = notifier.subscribe();
    tokio::spawn(async move {
        while let Ok(notification) = notifications.recv().await {
            info!(?notification, "notification ready for delivery");
        }
    });

    // Shared state
    let state: AppState = Arc::new(AppStateInner::new(db, notifier));

    // Routes — every operation requires an authenticated identity
    let app = Router::new()
        .route("/events", post(registrations::create_event))
        .route("/events/{event_id}/registrations", post(registrations::register))
        .route("/registrations/{registration_id}/cancel", post(registrations::cancel))
        .route("/registrations/{registration_id}/attended", post(registrations::mark_attended))
        .route("/teams", post(teams::create_team))
        .route("/teams/{team_id}/join", post(teams::join))
        .route("/teams/{team_id}/leave", post(teams::leave))
        .route("/teams/{team_id}/leader", post(teams::transfer_leadership))
        .route("/teams/{team_id}", delete(teams::disband))
        .route("/teams/{team_id}/messages", post(teams::post_message))
        .route("/votes", post(votes::cast_vote))
        .route("/questions/{question_id}/answers", post(votes::post_answer))
        .route("/answers/{answer_id}", delete(votes::delete_answer))
        .route("/answers/{answer_id}/accept", post(votes::accept_answer))
        .route("/reconcile/events/{event_id}", post(reconcile::event))
        .route("/reconcile/teams/{team_id}", post(reconcile::team))
        .route("/reconcile/posts/{post_id}", post(reconcile::post))
        .route("/reconcile/comments/{comment_id}", post(reconcile::comment))
        .route("/reconcile/questions/{question_id}", post(reconcile::question))
        .layer(middleware::from_fn(require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Rally server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
