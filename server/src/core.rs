use crate::bus::ZmqSubscriber;
use crate::config::Config;
use crate::http::{self, AppState};
use crate::store::FrameStore;
use crate::worker::{FixedBackoff, IngestStats, IngestionWorker};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Notify;

pub fn start(config: Config) -> Result<(), ServerError> {
    let store = Arc::new(FrameStore::new(config.capacity));
    let stats = Arc::new(IngestStats::default());
    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_notify = Arc::new(Notify::new());

    {
        let shutdown_flag = Arc::clone(&shutdown_flag);
        let shutdown_notify = Arc::clone(&shutdown_notify);
        ctrlc::set_handler(move || {
            log::info!("Interrupt received. Shutting down.");
            shutdown_flag.store(true, Ordering::Release);
            shutdown_notify.notify_one();
        })
        .map_err(ServerError::CtrlcError)?;
    }

    let worker = IngestionWorker::new(
        ZmqSubscriber::new(
            &config.bus_endpoint,
            config.receive_timeout,
            config.max_message_size,
        ),
        FixedBackoff::new(config.backoff),
        Arc::clone(&store),
        config.wire_format,
        Arc::clone(&stats),
        Arc::clone(&shutdown_flag),
    );
    let worker_handle = thread::Builder::new()
        .name("ingestion".to_string())
        .spawn(move || worker.run())
        .map_err(ServerError::ThreadSpawnError)?;

    let state = AppState::new(store, stats, config.poll_interval);
    let result = serve(config, state, shutdown_notify);

    // The worker checks the flag after every receive timeout.
    shutdown_flag.store(true, Ordering::Release);
    if worker_handle.join().is_err() {
        log::error!("Ingestion worker panicked.");
    }

    result
}

fn serve(config: Config, state: AppState, shutdown: Arc<Notify>) -> Result<(), ServerError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ServerError::RuntimeError)?;

    runtime.block_on(async move {
        let listener = TcpListener::bind(config.address)
            .await
            .map_err(ServerError::ListenerBindError)?;
        log::info!("Listening on http://{}", config.address);

        http::serve(listener, state, shutdown)
            .await
            .map_err(ServerError::ServeError)?;

        log::info!("HTTP server stopped.");
        Ok(())
    })
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind the HTTP listener.")]
    ListenerBindError(std::io::Error),

    #[error("Failed to build the async runtime.")]
    RuntimeError(std::io::Error),

    #[error("HTTP server failed.")]
    ServeError(std::io::Error),

    #[error("Failed to install the interrupt handler.")]
    CtrlcError(ctrlc::Error),

    #[error("Failed to spawn the ingestion thread.")]
    ThreadSpawnError(std::io::Error),
}

impl ServerError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            ServerError::ListenerBindError(err)
            | ServerError::RuntimeError(err)
            | ServerError::ServeError(err)
            | ServerError::ThreadSpawnError(err) => Some(err.to_string()),
            ServerError::CtrlcError(err) => Some(err.to_string()),
        }
    }
}
