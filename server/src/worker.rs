use crate::bus::Transport;
use crate::decoder::{self, WireFormat};
use crate::frame::Frame;
use crate::store::FrameStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Wait applied after a transport failure, before subscribing again.
pub trait Backoff {
    fn pause(&self);
}

/// Same interval after every failure, retried forever.
pub struct FixedBackoff {
    interval: Duration,
}

impl FixedBackoff {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Backoff for FixedBackoff {
    fn pause(&self) {
        thread::sleep(self.interval);
    }
}

/// Counters written by the worker, read by the HTTP stats endpoint.
#[derive(Default)]
pub struct IngestStats {
    received: AtomicU64,
    appended: AtomicU64,
    decode_failures: AtomicU64,
    transport_failures: AtomicU64,
}

impl IngestStats {
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn appended(&self) -> u64 {
        self.appended.load(Ordering::Relaxed)
    }

    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    pub fn transport_failures(&self) -> u64 {
        self.transport_failures.load(Ordering::Relaxed)
    }
}

/// Outcome of one pass of the ingestion loop.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Appended(u64),
    Idle,
    Dropped,
    Retried,
}

/// The only writer of the frame store.
pub struct IngestionWorker<T: Transport, B: Backoff> {
    transport: T,
    backoff: B,
    store: Arc<FrameStore>,
    wire_format: WireFormat,
    stats: Arc<IngestStats>,

    shutdown_flag: Arc<AtomicBool>,
}

impl<T: Transport, B: Backoff> IngestionWorker<T, B> {
    pub fn new(
        transport: T, backoff: B, store: Arc<FrameStore>, wire_format: WireFormat,
        stats: Arc<IngestStats>, shutdown_flag: Arc<AtomicBool>,
    ) -> Self {
        Self {
            transport,
            backoff,
            store,
            wire_format,
            stats,
            shutdown_flag,
        }
    }

    pub fn run(mut self) {
        log::info!("Ingestion worker started. Wire format: {}.", self.wire_format);

        while !self.shutdown_flag.load(Ordering::Acquire) {
            self.step();
        }

        log::info!("Shutting down ingestion worker.");
    }

    pub fn step(&mut self) -> Step {
        // The store is not touched until the message is fully decoded.
        let bytes = match self.transport.receive() {
            Ok(Some(value)) => value,
            Ok(None) => return Step::Idle,
            Err(err) => {
                self.stats.transport_failures.fetch_add(1, Ordering::Relaxed);
                match err.additional_info() {
                    Some(info) => log::error!("{} {}. Retrying.", err, info),
                    None => log::error!("{} Retrying.", err),
                }

                self.backoff.pause();
                if let Err(err) = self.transport.reconnect() {
                    log::error!("Resubscribe failed: {}", err);
                }
                return Step::Retried;
            },
        };
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let fields = match decoder::decode(&bytes, self.wire_format) {
            Ok(value) => value,
            Err(err) => {
                self.stats.decode_failures.fetch_add(1, Ordering::Relaxed);
                match err.additional_info() {
                    Some(info) => log::warn!("{} {}. Message dropped.", err, info),
                    None => log::warn!("{} Message dropped.", err),
                }
                return Step::Dropped;
            },
        };

        let frame = Frame::new(fields, captured_at());
        let id = self.store.append(frame);
        self.stats.appended.fetch_add(1, Ordering::Relaxed);
        log::trace!("Frame #{} stored.", id);

        Step::Appended(id)
    }
}

fn captured_at() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
