use crate::config::{BookingConfig, StoreBackend};
use crate::services::{
    EmailProvider, EmailService, LocalStorage, LogEmailService, MongoDb, Storage, Stores,
};
use crate::{build_router, AppState};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: BookingConfig) -> Result<Self, AppError> {
        let (stores, db) = match config.store.backend {
            StoreBackend::Mongo => {
                let uri = config.store.mongodb_uri.as_deref().ok_or_else(|| {
                    AppError::ConfigError(anyhow::anyhow!("MONGODB_URI is required"))
                })?;
                let db = MongoDb::connect(uri, &config.store.mongodb_database).await?;
                db.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;
                (Stores::mongo(&db), Some(db))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                (Stores::in_memory(), None)
            }
        };

        let storage: Arc<dyn Storage> = Arc::new(
            LocalStorage::new(&config.uploads.local_path)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to initialize local storage at {}: {}",
                        config.uploads.local_path,
                        e
                    );
                    e
                })?,
        );

        let email: Arc<dyn EmailProvider> = match &config.smtp {
            Some(smtp) => Arc::new(EmailService::new(smtp).map_err(AppError::from)?),
            None => {
                tracing::warn!("SMTP not configured; password reset links will only be logged");
                Arc::new(LogEmailService)
            }
        };

        let state = AppState::new(&config, stores, storage, email, db);

        if let (Some(email), Some(password)) = (&config.auth.admin_email, &config.auth.admin_password)
        {
            state
                .auth
                .bootstrap_superadmin(email, password.expose_secret().clone())
                .await
                .map_err(AppError::from)?;
        }

        let app = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, "Listening");

        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
