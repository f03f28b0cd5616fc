//! Server lifecycle: bind, serve in the background, stop gracefully.

use std::net::SocketAddr;
use std::sync::Arc;

use mock_gcm_core::Engine;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::{Error, Result};
use crate::{ServerConfig, create_router};

struct Running {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

/// A mock gateway that can be started and stopped from a test.
///
/// The engine outlives restarts, so configuration and received messages
/// survive a `stop`/`start` cycle until [`Engine::clear`] is called.
pub struct MockGcmServer {
    config: ServerConfig,
    engine: Arc<Engine>,
    running: Option<Running>,
}

impl MockGcmServer {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let engine = Arc::new(Engine::new(&config.api_key));
        Self::with_engine(config, engine)
    }

    /// Serve an existing engine, e.g. one already configured from a preset.
    #[must_use]
    pub const fn with_engine(config: ServerConfig, engine: Arc<Engine>) -> Self {
        Self {
            config,
            engine,
            running: None,
        }
    }

    /// The engine behind this server, for configuration and inspection.
    #[must_use]
    pub const fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Address actually bound, while running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.local_addr)
    }

    /// Bind the listener and start serving in the background.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRunning`] if started twice, or an IO error if
    /// the address cannot be bound.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        if self.running.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let listener = TcpListener::bind(&self.config.bind_address).await?;
        let local_addr = listener.local_addr()?;
        let app = create_router(Arc::clone(&self.engine));
        let (shutdown, signal) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = signal.await;
                })
                .await
        });

        info!(%local_addr, "Mock GCM listening");
        self.running = Some(Running {
            local_addr,
            shutdown,
            task,
        });
        Ok(local_addr)
    }

    /// Stop accepting connections and wait for in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRunning`] if the server was not started, or the
    /// error the serving task ended with.
    pub async fn stop(&mut self) -> Result<()> {
        let running = self.running.take().ok_or(Error::NotRunning)?;
        // The serving task may already be gone, in which case there is no one to signal.
        let _ = running.shutdown.send(());
        running.task.await??;
        info!(local_addr = %running.local_addr, "Mock GCM stopped");
        Ok(())
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.running
            .as_ref()
            .is_none_or(|running| running.task.is_finished())
    }
}

impl Drop for MockGcmServer {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(());
        }
    }
}

impl std::fmt::Debug for MockGcmServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGcmServer")
            .field("config", &self.config)
            .field("local_addr", &self.local_addr())
            .finish_non_exhaustive()
    }
}
