use crate::cache::StalePolicy;
use crate::config::Config;
use crate::flickr::FlickrClient;
use crate::gallery::GalleryCache;
use crate::page::PageRegistry;
use crate::state::AppState;
use crate::utils::fmt_duration;
use crate::web::create_router;
use anyhow::Context;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Main application struct containing all necessary components
pub struct App {
    config: Config,
    app_state: AppState,
}

impl App {
    /// Build the Flickr client, the shared cache and the page registry.
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        let client =
            FlickrClient::new(config.client_config()).context("Failed to create Flickr client")?;

        let stale = if config.serve_stale {
            StalePolicy::ServeStale
        } else {
            StalePolicy::Discard
        };
        let gallery_cache = GalleryCache::new(Arc::new(client), config.expires_in, stale);
        let pages = PageRegistry::new(config.pages.clone(), config.default_user.clone());

        for page in pages.pages() {
            info!(
                page = %page.id,
                url = %page.url,
                owner = pages.owner_for(&page.id).unwrap_or("-"),
                "gallery page configured"
            );
        }
        if pages.pages().is_empty() {
            warn!("No gallery pages configured; only the JSON API will be useful");
        }

        info!(
            expires_in = fmt_duration(config.expires_in),
            serve_stale = config.serve_stale,
            requests_per_second = config.requests_per_second.get(),
            "gallery cache configured"
        );

        Ok(App {
            app_state: AppState::new(gallery_cache, pages),
            config,
        })
    }

    /// Serve until a shutdown signal arrives, then drain within the
    /// configured budget.
    pub async fn run(self) -> ExitCode {
        self.app_state
            .gallery_cache
            .spawn_purge(self.config.expires_in);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(error = ?e, %addr, "Failed to bind web server");
                return ExitCode::FAILURE;
            }
        };
        info!(%addr, "web server listening");

        let router = create_router(self.app_state, self.config.request_timeout);
        let shutdown_timeout = self.config.shutdown_timeout;
        let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();

        let server = axum::serve(listener, router).with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        });
        let server = tokio::spawn(async move { server.await });

        // Wait for the server to stop on its own or for the drain budget to
        // run out once shutdown has begun.
        let drained = async {
            if signalled_rx.await.is_ok() {
                info!(timeout = fmt_duration(shutdown_timeout), "shutting down");
                tokio::time::sleep(shutdown_timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = server => match result {
                Ok(Ok(())) => {
                    info!("web server stopped");
                    ExitCode::SUCCESS
                }
                Ok(Err(e)) => {
                    error!(error = ?e, "web server failed");
                    ExitCode::FAILURE
                }
                Err(e) => {
                    error!(error = ?e, "web server task panicked");
                    ExitCode::FAILURE
                }
            },
            _ = drained => {
                warn!("graceful shutdown timed out; exiting with requests in flight");
                ExitCode::FAILURE
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = ?e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
