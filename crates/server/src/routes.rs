use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, warn, Level};

use common::types::Health;
use configs::AuthConfig;
use service::registry::{Hero, HeroDraft, HeroRegistry};

use crate::auth;
use crate::errors::ApiError;
use crate::observability;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HeroRegistry>,
    pub greeting: String,
    pub auth: AuthConfig,
}

#[derive(Serialize)]
struct HeroList {
    heroes: Vec<Hero>,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    debug!("root endpoint accessed");
    Json(serde_json::json!({"message": state.greeting}))
}

async fn list_heroes(State(state): State<AppState>) -> Json<HeroList> {
    let heroes = state.registry.list().await;
    info!(count = heroes.len(), "returning hero list");
    Json(HeroList { heroes })
}

async fn get_hero(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Hero>, ApiError> {
    debug!(hero_id = id, "hero lookup");
    match state.registry.get(id).await {
        Ok(hero) => {
            info!(hero_id = id, hero_name = %hero.name, "found hero by id");
            Ok(Json(hero))
        }
        Err(e) => {
            warn!(hero_id = id, "hero not found by id");
            Err(e.into())
        }
    }
}

async fn create_hero(
    State(state): State<AppState>,
    Json(draft): Json<HeroDraft>,
) -> Result<(StatusCode, Json<Hero>), ApiError> {
    debug!(hero_name = %draft.name, "create hero requested");
    let hero = state.registry.create(draft).await?;
    observability::HEROES_CREATED_TOTAL.inc();
    Ok((StatusCode::CREATED, Json(hero)))
}

async fn metrics() -> (StatusCode, String) {
    observability::encode_metrics()
}

/// Build the full application router: open routes, key-guarded hero routes,
/// and the observability layers around everything.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    // only list/create carry the API-key check; lookup by id stays open
    let guarded = Router::new()
        .route("/heroes", get(list_heroes).post(create_hero))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::check_api_key,
        ));

    let open = Router::new()
        .route("/", get(root))
        .route("/heroes/:id", get(get_hero))
        .route("/health", get(health))
        .route("/metrics", get(metrics));

    open.merge(guarded)
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(observability::track_metrics))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
