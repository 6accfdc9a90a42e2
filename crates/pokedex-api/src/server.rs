use std::future::Future;
use std::sync::Arc;

use axum::Router;
use pokedex_store::{DocumentStore, MemoryStore, load_documents};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::ServerError;
use crate::routes;
use crate::state::AppState;

/// Full application: routes, request tracing, and CORS open to every origin.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Open the collection described by `config` and apply the seed file if the
/// collection is empty.
pub fn open_store(config: &Config) -> Result<MemoryStore, ServerError> {
    let store = match &config.data_file {
        Some(path) => MemoryStore::open(path)?,
        None => MemoryStore::new(),
    };

    if let Some(seed) = &config.seed {
        if store.is_empty() {
            let seed_error = |source| ServerError::Seed {
                path: seed.display().to_string(),
                source,
            };
            let docs = load_documents(seed).map_err(seed_error)?;
            let inserted = store.insert_many(docs).map_err(seed_error)?;
            tracing::info!(path = %seed.display(), documents = inserted, "seeded collection");
        } else {
            tracing::info!(
                path = %seed.display(),
                documents = store.len(),
                "collection not empty, skipping seed"
            );
        }
    }

    Ok(store)
}

pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}

/// Acquire the store, serve until a shutdown signal, then drain and close
/// the store.
pub async fn run(config: Config) -> Result<(), ServerError> {
    let store: Arc<dyn DocumentStore> = Arc::new(open_store(&config)?);
    let state = AppState::new(Arc::clone(&store));

    let listener = TcpListener::bind(&config.addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.addr.clone(),
            source,
        })?;
    tracing::info!(addr = %config.addr, "pokedex-api listening");

    let served = serve(listener, app(state), shutdown_signal()).await;
    close_after_serve(store.as_ref(), served)
}

/// Close the store whether or not serving succeeded. A serve error takes
/// precedence over a close error.
fn close_after_serve(
    store: &dyn DocumentStore,
    served: Result<(), ServerError>,
) -> Result<(), ServerError> {
    tracing::info!("server stopped, closing store");
    let closed = store.close();
    served?;
    closed?;
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
