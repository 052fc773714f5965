//! Prometheus collectors and the `/metrics` endpoint.

use std::future::Future;
use std::net::SocketAddr;

use lazy_static::lazy_static;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

#[cfg(test)]
mod metrics_test;

lazy_static! {
    pub static ref ACTIVE_PATHS: IntGauge =
        IntGauge::new("active_paths", "Number of paths currently running")
            .expect("metric can not be created");

    pub static ref ACTIVE_SESSIONS: IntGauge =
        IntGauge::new("active_sessions", "Number of deployed heuristic sessions")
            .expect("metric can not be created");

    pub static ref TRANSIT_EMITTED: IntCounterVec = IntCounterVec::new(
        Opts::new("transit_emitted", "Data units emitted by extractors"),
        &["network", "data_type"]
    )
    .expect("metric can not be created");

    pub static ref RPC_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("rpc_failures", "Failed extractor polls"),
        &["network"]
    )
    .expect("metric can not be created");

    pub static ref HEURISTIC_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("heuristic_failures", "Heuristic assessments that errored or panicked"),
        &["heuristic"]
    )
    .expect("metric can not be created");

    pub static ref ALERTS_GENERATED: IntCounterVec = IntCounterVec::new(
        Opts::new("alerts_generated", "Alerts produced by the engine"),
        &["heuristic", "severity"]
    )
    .expect("metric can not be created");

    pub static ref ALERTS_SUPPRESSED: IntCounterVec = IntCounterVec::new(
        Opts::new("alerts_suppressed", "Alerts dropped by session cooldown"),
        &["heuristic"]
    )
    .expect("metric can not be created");

    pub static ref ALERTS_DELIVERED: IntCounterVec = IntCounterVec::new(
        Opts::new("alerts_delivered", "Alerts accepted by a destination"),
        &["destination"]
    )
    .expect("metric can not be created");

    pub static ref ALERT_DELIVERY_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("alert_delivery_failures", "Alerts a destination failed to accept"),
        &["destination"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry =
        Registry::new_custom(Some("chainwatch".to_string()), None).expect("registry can be created");
}

/// Registers every collector with `registry`. Already registered collectors
/// are skipped.
pub fn register_custom_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ACTIVE_PATHS.clone()),
        Box::new(ACTIVE_SESSIONS.clone()),
        Box::new(TRANSIT_EMITTED.clone()),
        Box::new(RPC_FAILURES.clone()),
        Box::new(HEURISTIC_FAILURES.clone()),
        Box::new(ALERTS_GENERATED.clone()),
        Box::new(ALERTS_SUPPRESSED.clone()),
        Box::new(ALERTS_DELIVERED.clone()),
        Box::new(ALERT_DELIVERY_FAILURES.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            if !matches!(e, prometheus::Error::AlreadyReg) {
                error!("could not register collector: {}", e);
            }
        }
    }
}

/// Binds the `/metrics` endpoint on `port`.
///
/// The port is bound before this returns, so a taken port surfaces here as
/// `Error::Fatal`. The returned future serves until `shutdown` fires.
pub fn bind_server(
    port: u16,
    shutdown: CancellationToken,
) -> crate::Result<(SocketAddr, impl Future<Output = ()> + Send + 'static)> {
    register_custom_metrics(&REGISTRY);

    let metrics_route = warp::path!("metrics").and_then(metrics_handler);

    let (addr, server) = warp::serve(metrics_route)
        .try_bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            shutdown.cancelled().await;
        })
        .map_err(|e| crate::Error::Fatal(format!("cannot bind metrics port {port}: {e}")))?;
    info!(%addr, "metrics server listening");
    Ok((addr, server))
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    Ok(gather_text(&REGISTRY))
}

/// Text exposition of every metric family in `registry`
pub fn gather_text(registry: &Registry) -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    };
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
