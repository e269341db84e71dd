use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, ServerState};
use service::{
    attachments::DietPlanStore,
    client::repository::{ClientStore, SeaOrmClientStore},
    runtime,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Wire storage, database and routes from a loaded config, then serve until
/// `shutdown` resolves.
pub async fn run<F>(cfg: AppConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    runtime::ensure_storage_root(&cfg.storage.clients_root).await?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    if std::env::var("AUTO_MIGRATE").is_ok() {
        migration::Migrator::up(&db, None).await?;
        info!("migrations applied");
    }

    let attachments = DietPlanStore::new(&cfg.storage.clients_root);
    let store: Arc<dyn ClientStore> = Arc::new(SeaOrmClientStore::new(db, attachments));
    let app = routes::build_router(ServerState::new(store), build_cors());

    let addr: SocketAddr = cfg.server.bind_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, clients_root = %cfg.storage.clients_root, "client api listening");
    serve(listener, app, shutdown).await
}

/// Serve on an already bound listener; in-flight requests finish before returning.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!("client api drained");
    Ok(())
}
