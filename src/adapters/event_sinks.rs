//! Telemetry event sinks.
//!
//! [`LogEventSink`] writes one structured log record per event under the
//! `gddo_event` target, [`HttpEventSink`] batches events and POSTs them as
//! JSON arrays to a collector, and [`NullEventSink`] drops them.

use std::{sync::Arc, time::Duration};

use eyre::{Context, Result};
use reqwest::Client;
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
    time::Instant,
};

use crate::{
    config::models::TelemetryConfig, core::event::GddoEvent, ports::event_sink::EventSink,
};

/// Tracing target of the per-request event records.
pub const EVENT_LOG_TARGET: &str = "gddo_event";

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: GddoEvent) {
        let header = serde_json::to_string(&event.header).unwrap_or_default();
        tracing::info!(
            target: EVENT_LOG_TARGET,
            host = %event.host,
            path = %event.path,
            url = %event.url,
            is_robot = event.is_robot,
            latency_ms = event.latency.as_micros() as f64 / 1000.0,
            redirect_host = %event.redirect_host,
            header = %header,
            "gddo event"
        );
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: GddoEvent) {}
}

/// Ships events to an HTTP collector from a background task.
///
/// `emit` never waits: when the buffer is full the event is dropped and a
/// warning is logged. The task flushes whenever a batch fills up or the flush
/// interval elapses, and drains the buffer once every sender is gone.
#[derive(Debug, Clone)]
pub struct HttpEventSink {
    tx: mpsc::Sender<GddoEvent>,
}

impl HttpEventSink {
    /// Start the delivery task. Must be called from within a Tokio runtime.
    pub fn spawn(
        endpoint: String,
        buffer_size: usize,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Result<(Self, JoinHandle<()>)> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build telemetry HTTP client")?;
        let (tx, rx) = mpsc::channel(buffer_size.max(1));

        let handle = tokio::spawn(Self::run(
            client,
            endpoint,
            rx,
            batch_size.max(1),
            flush_interval,
        ));

        Ok((Self { tx }, handle))
    }

    async fn run(
        client: Client,
        endpoint: String,
        mut rx: mpsc::Receiver<GddoEvent>,
        batch_size: usize,
        flush_interval: Duration,
    ) {
        let mut batch = Vec::with_capacity(batch_size);
        let mut interval =
            tokio::time::interval_at(Instant::now() + flush_interval, flush_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(event) => {
                        batch.push(event);
                        if batch.len() >= batch_size {
                            Self::flush(&client, &endpoint, &mut batch).await;
                        }
                    }
                    None => {
                        Self::flush(&client, &endpoint, &mut batch).await;
                        tracing::debug!("Telemetry channel closed, delivery task exiting");
                        return;
                    }
                },
                _ = interval.tick() => {
                    Self::flush(&client, &endpoint, &mut batch).await;
                }
            }
        }
    }

    async fn flush(client: &Client, endpoint: &str, batch: &mut Vec<GddoEvent>) {
        if batch.is_empty() {
            return;
        }
        let events = std::mem::take(batch);
        match client.post(endpoint).json(&events).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!("Delivered {} telemetry events", events.len());
            }
            Ok(resp) => {
                tracing::warn!(
                    "Telemetry collector rejected {} events with status {}",
                    events.len(),
                    resp.status()
                );
            }
            Err(e) => {
                tracing::warn!("Failed to deliver {} telemetry events: {}", events.len(), e);
            }
        }
    }
}

impl EventSink for HttpEventSink {
    fn emit(&self, event: GddoEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(url = %event.url, "Telemetry buffer full, dropping event");
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(url = %event.url, "Telemetry task stopped, dropping event");
            }
        }
    }
}

/// Build the sink named by `config`. The join handle, when present, resolves
/// once the sink and every clone of it are dropped and pending events are
/// flushed.
pub fn build_event_sink(
    config: &TelemetryConfig,
) -> Result<(Arc<dyn EventSink>, Option<JoinHandle<()>>)> {
    match config {
        TelemetryConfig::Disabled => Ok((Arc::new(NullEventSink), None)),
        TelemetryConfig::Log => Ok((Arc::new(LogEventSink), None)),
        TelemetryConfig::Http {
            endpoint,
            buffer_size,
            batch_size,
            flush_interval_ms,
        } => {
            let (sink, handle) = HttpEventSink::spawn(
                endpoint.clone(),
                *buffer_size,
                *batch_size,
                Duration::from_millis(*flush_interval_ms),
            )?;
            tracing::info!(endpoint = %endpoint, "Shipping telemetry events over HTTP");
            Ok((Arc::new(sink), Some(handle)))
        }
    }
}
