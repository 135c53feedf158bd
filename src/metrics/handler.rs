use crate::config::MetricsPushConfig;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use prometheus_reqwest_remote_write::WriteRequest;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

const USER_AGENT: &str = concat!("coffer/", env!("CARGO_PKG_VERSION"));

/// Registers a counter in the default registry.
pub fn counter(name: &str, help: &str) -> Counter {
    let counter = Counter::with_opts(Opts::new(name, help)).expect("valid counter options");
    prometheus::register(Box::new(counter.clone())).expect("counter registered once");
    counter
}

fn histogram(name: &str, help: &str, buckets: Vec<f64>) -> Histogram {
    let histogram = Histogram::with_opts(HistogramOpts::new(name, help).buckets(buckets))
        .expect("valid histogram options");
    prometheus::register(Box::new(histogram.clone())).expect("histogram registered once");
    histogram
}

/// Buckets for in-memory or single-row reads: 10µs up to ~40ms.
pub fn histogram_fast_ops(name: &str, help: &str) -> Histogram {
    histogram(name, help, prometheus::exponential_buckets(0.00001, 2.0, 13).unwrap_or_default())
}

/// Buckets for operations that commit a store transaction: 100µs up to ~3s.
pub fn histogram_slow_ops(name: &str, help: &str) -> Histogram {
    histogram(name, help, prometheus::exponential_buckets(0.0001, 2.0, 15).unwrap_or_default())
}

/// Renders every metric of `registry` in the prometheus text format.
pub fn render(registry: &Registry) -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Could not encode metric families: {0}")]
    Encode(Box<dyn std::error::Error + Send + Sync>),
    #[error("Remote write request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Remote write rejected with {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Periodically ships a registry to a prometheus remote-write endpoint.
pub struct MetricsPusher {
    client: reqwest::Client,
    remote_write_url: String,
    interval: Duration,
    registry: Registry,
}

impl MetricsPusher {
    pub fn new(config: MetricsPushConfig, registry: Registry) -> Self {
        MetricsPusher {
            client: reqwest::Client::new(),
            remote_write_url: config.remote_write_url,
            // A zero period would make tokio's interval panic.
            interval: Duration::from_secs(config.push_interval_seconds.max(1)),
            registry,
        }
    }

    pub async fn push(&self) -> Result<(), PushError> {
        let families = self.registry.gather();
        debug!("Pushing {} metric families", families.len());

        let request = WriteRequest::from_metric_families(families, None)
            .map_err(PushError::Encode)?
            .build_http_request(self.client.clone(), &self.remote_write_url, USER_AGENT)?;

        let response = self.client.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Rejected { status, body });
        }
        Ok(())
    }

    /// Pushes on every tick until `shutdown_receiver` fires. Failed pushes are
    /// logged and retried on the next tick.
    pub async fn run(self, mut shutdown_receiver: broadcast::Receiver<()>) {
        info!(
            "Pushing metrics to {} every {:?}",
            self.remote_write_url, self.interval
        );
        let mut ticks = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if let Err(e) = self.push().await {
                        error!("Failed to push metrics: {}", e);
                    }
                }
                _ = shutdown_receiver.recv() => {
                    info!("Shutting down metrics pusher");
                    break;
                }
            }
        }
    }
}
