use std::net::SocketAddr;

use axum::Router;
use configs::{AuthConfig, AuthMode};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::routes::{self, AppState};
use service::registry::HeroRegistry;

struct TestApp {
    base_url: String,
}

async fn start_server(auth: AuthConfig) -> anyhow::Result<TestApp> {
    // isolated store file per test run
    let hero_file = format!("target/test-data/{}/heroes.json", Uuid::new_v4());
    let registry = HeroRegistry::open(hero_file).await?;

    let state = AppState {
        registry,
        greeting: "Hello from the Hero Registry!".into(),
        auth,
    };
    let app: Router = routes::build_router(state, CorsLayer::very_permissive());

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url })
}

fn open_auth() -> AuthConfig {
    // default sentinel key: the check is skipped entirely
    AuthConfig::default()
}

fn keyed_auth(mode: AuthMode) -> AuthConfig {
    AuthConfig { api_key: "k-123".into(), mode }
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

#[tokio::test]
async fn e2e_root_greeting() -> anyhow::Result<()> {
    let app = start_server(open_auth()).await?;
    let res = client().get(format!("{}/", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["message"], "Hello from the Hero Registry!");
    Ok(())
}

#[tokio::test]
async fn e2e_health() -> anyhow::Result<()> {
    let app = start_server(open_auth()).await?;
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_seeded_roster_and_lookup() -> anyhow::Result<()> {
    let app = start_server(open_auth()).await?;
    let c = client();

    let res = c.get(format!("{}/heroes", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    let heroes = body["heroes"].as_array().expect("heroes array");
    assert_eq!(heroes.len(), 3);
    assert_eq!(heroes[0]["name"], "Iron Man");

    let res = c.get(format!("{}/heroes/2", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let hero = res.json::<serde_json::Value>().await?;
    assert_eq!(hero["name"], "Captain America");
    assert_eq!(hero["secret_identity"], "Steve Rogers");

    let res = c.get(format!("{}/heroes/99", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    let body = res.json::<serde_json::Value>().await?;
    assert!(body["error"].as_str().unwrap().contains("not found"));
    Ok(())
}

#[tokio::test]
async fn e2e_create_hero_echoes_assigned_id() -> anyhow::Result<()> {
    let app = start_server(open_auth()).await?;
    let c = client();

    let res = c
        .post(format!("{}/heroes", app.base_url))
        .json(&json!({"name": "Spider-Man", "secret_identity": "Peter Parker"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CREATED);
    let hero = res.json::<serde_json::Value>().await?;
    assert_eq!(hero["id"], 4);
    assert_eq!(hero["name"], "Spider-Man");
    assert_eq!(hero["secret_identity"], "Peter Parker");

    // the new hero lands at the end of the list
    let res = c.get(format!("{}/heroes", app.base_url)).send().await?;
    let body = res.json::<serde_json::Value>().await?;
    let heroes = body["heroes"].as_array().expect("heroes array");
    assert_eq!(heroes.last().unwrap()["id"], 4);
    Ok(())
}

#[tokio::test]
async fn e2e_create_rejects_empty_fields() -> anyhow::Result<()> {
    let app = start_server(open_auth()).await?;
    let res = client()
        .post(format!("{}/heroes", app.base_url))
        .json(&json!({"name": "", "secret_identity": "Nobody"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn e2e_enforcing_mode_rejects_bad_key() -> anyhow::Result<()> {
    let app = start_server(keyed_auth(AuthMode::Enforcing)).await?;
    let c = client();

    // missing key
    let res = c.get(format!("{}/heroes", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);

    // wrong key on create
    let res = c
        .post(format!("{}/heroes", app.base_url))
        .header("X-API-Key", "wrong")
        .json(&json!({"name": "Vision", "secret_identity": "Vision"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);

    // correct key
    let res = c
        .get(format!("{}/heroes", app.base_url))
        .header("X-API-Key", "k-123")
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    // lookup by id is not key-guarded
    let res = c.get(format!("{}/heroes/1", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn e2e_observing_mode_lets_bad_key_through() -> anyhow::Result<()> {
    let app = start_server(keyed_auth(AuthMode::Observing)).await?;
    let res = client()
        .get(format!("{}/heroes", app.base_url))
        .header("X-API-Key", "wrong")
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn e2e_metrics_exposition() -> anyhow::Result<()> {
    let app = start_server(open_auth()).await?;
    let c = client();

    // at least one tracked request before scraping
    let _ = c.get(format!("{}/health", app.base_url)).send().await?;

    let res = c.get(format!("{}/metrics", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.text().await?;
    assert!(body.contains("hero_registry_requests_total"));
    assert!(body.contains("hero_registry_request_duration_seconds"));
    Ok(())
}
