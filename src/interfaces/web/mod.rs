mod error;
mod handlers;
mod router;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    http::{StatusCode, Uri, header},
    response::IntoResponse,
};
use include_dir::{Dir, include_dir};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use crate::core::catalog::Catalog;
use crate::core::config::ConfigStore;
use crate::core::engine::EngineApi;
use crate::core::lifecycle::LifecycleComponent;

use router::build_router;

static PUBLIC_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/public");

/// Everything a handler may touch.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) engine: Arc<dyn EngineApi>,
    pub(crate) config: ConfigStore,
    pub(crate) catalog: Arc<Catalog>,
    /// Browser-facing engine URL that webhook links are built on.
    pub(crate) webhook_base: String,
    pub(crate) port: u16,
}

pub struct WebServer {
    state: AppState,
    addr: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl WebServer {
    pub(crate) fn new(state: AppState, addr: String) -> Self {
        Self {
            state,
            addr,
            shutdown_tx: None,
            handle: None,
        }
    }
}

async fn web_static_handler(uri: Uri) -> impl IntoResponse {
    let mut path = uri.path().trim_start_matches('/');
    if path.is_empty() {
        path = "index.html";
    }

    // Unknown paths are client-side routes.
    let (path, file) = match PUBLIC_DIR.get_file(path) {
        Some(file) => (path, file),
        None => match PUBLIC_DIR.get_file("index.html") {
            Some(file) => ("index.html", file),
            None => return (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
        },
    };
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    (
        [(header::CONTENT_TYPE, mime.as_ref().to_string())],
        file.contents(),
    )
        .into_response()
}

#[async_trait]
impl LifecycleComponent for WebServer {
    async fn on_init(&mut self) -> Result<()> {
        info!("Web dashboard initializing...");
        Ok(())
    }

    async fn on_start(&mut self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("binding {}", self.addr))?;
        let local = listener.local_addr()?;
        let app = build_router(self.state.clone());
        let (tx, rx) = oneshot::channel::<()>();

        info!("Workflow hub running at http://{}", local);
        self.shutdown_tx = Some(tx);
        self.handle = Some(tokio::spawn(async move {
            let shutdown = async {
                let _ = rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!("Web server crashed: {}", e);
            }
        }));
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<()> {
        info!("Web dashboard shutting down...");
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        Ok(())
    }
}
