//! End-to-end over a real socket and Postgres. Skipped unless `DATABASE_URL` is set.

use std::net::SocketAddr;
use std::sync::Arc;

use migration::MigratorTrait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use service::attachments::DietPlanStore;
use service::client::repository::{ClientStore, SeaOrmClientStore};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::routes::{self, ServerState};

struct Spawned {
    base: String,
    coach_id: i32,
}

async fn spawn() -> anyhow::Result<Option<Spawned>> {
    if std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip: DATABASE_URL not set");
        return Ok(None);
    }
    let db = models::db::connect().await?;
    migration::Migrator::up(&db, None).await?;
    let coach = models::coach::create(&db, "E2E Coach").await?;

    let root = std::env::temp_dir().join(format!("clients_e2e_{}", Uuid::new_v4()));
    let store: Arc<dyn ClientStore> = Arc::new(SeaOrmClientStore::new(db, DietPlanStore::new(root)));
    let app = routes::build_router(ServerState::new(store), CorsLayer::very_permissive());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(Some(Spawned { base: format!("http://{addr}"), coach_id: coach.id }))
}

#[tokio::test]
async fn client_lifecycle_over_http() -> anyhow::Result<()> {
    let Some(srv) = spawn().await? else { return Ok(()) };
    let http = reqwest::Client::new();
    let mail = format!("e2e_{}@example.com", Uuid::new_v4().simple());

    let health = http.get(format!("{}/health", srv.base)).send().await?;
    assert_eq!(health.status(), StatusCode::OK);

    let resp = http
        .post(format!("{}/api/clients", srv.base))
        .json(&json!({
            "mail_address": mail,
            "password": "E2ePass123",
            "name": "Jan",
            "last_name": "Kowalski",
            "coach_id": srv.coach_id,
            "admin": true
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await?;
    assert_eq!(created["status"], "SUCCESS");
    let id = created["data"]["id"].as_i64().unwrap();
    assert!(created["data"].get("admin").is_none());
    assert!(created["data"].get("password_digest").is_none());

    let dup = http
        .post(format!("{}/api/clients", srv.base))
        .json(&json!({
            "mail_address": mail,
            "password": "E2ePass123",
            "name": "Jan",
            "last_name": "Kowalski",
            "coach_id": srv.coach_id
        }))
        .send()
        .await?;
    assert_eq!(dup.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let dup: Value = dup.json().await?;
    assert_eq!(dup["data"]["mail_address"], json!(["has already been taken"]));

    let upd = http
        .put(format!("{}/api/clients/{id}", srv.base))
        .json(&json!({"is_active": true}))
        .send()
        .await?;
    assert_eq!(upd.status(), StatusCode::OK);
    let upd: Value = upd.json().await?;
    assert_eq!(upd["data"]["is_active"], true);
    assert_eq!(upd["data"]["mail_address"], mail);

    let listed: Value = http
        .get(format!("{}/api/clients?is_active=true", srv.base))
        .send()
        .await?
        .json()
        .await?;
    let rows = listed["data"].as_array().unwrap();
    assert!(rows.iter().any(|c| c["id"] == id));
    assert!(rows.iter().all(|c| c["is_active"] == true));

    let del = http.delete(format!("{}/api/clients/{id}", srv.base)).send().await?;
    assert_eq!(del.status(), StatusCode::OK);

    let gone = http.get(format!("{}/api/clients/{id}", srv.base)).send().await?;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let again = http.delete(format!("{}/api/clients/{id}", srv.base)).send().await?;
    assert_eq!(again.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}
