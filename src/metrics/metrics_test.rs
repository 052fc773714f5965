use tokio_util::sync::CancellationToken;

use super::*;
use crate::Error;

fn create_test_registry() -> Registry {
    let registry = Registry::new_custom(Some("chainwatch".to_string()), None).unwrap();
    register_custom_metrics(&registry);
    registry
}

#[test]
fn test_custom_registry() {
    let registry = create_test_registry();

    ALERTS_GENERATED.with_label_values(&["large_transfer", "high"]).inc();
    let metrics = &registry.gather();
    assert!(!metrics.is_empty());

    let metric_names: Vec<_> = metrics.iter().map(|m| m.get_name()).collect();
    assert!(
        metric_names.contains(&"chainwatch_alerts_generated"),
        "Missing chainwatch_alerts_generated"
    );
}

#[test]
fn test_counter_increment() {
    ALERTS_SUPPRESSED.with_label_values(&["counter_test"]).reset();

    ALERTS_SUPPRESSED.with_label_values(&["counter_test"]).inc();
    ALERTS_SUPPRESSED.with_label_values(&["counter_test"]).inc();

    let value = ALERTS_SUPPRESSED.with_label_values(&["counter_test"]).get();
    assert_eq!(value, 2, "Counter should increment correctly");
}

#[test]
fn registering_twice_is_harmless() {
    let registry = create_test_registry();
    register_custom_metrics(&registry);
    ACTIVE_PATHS.set(0);
    assert!(!registry.gather().is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint_format() {
    let registry = create_test_registry();
    RPC_FAILURES.with_label_values(&["layer1"]).inc();

    let metrics_route = warp::path!("metrics").map(move || gather_text(&registry));

    let response = warp::test::request()
        .method("GET")
        .path("/metrics")
        .reply(&metrics_route)
        .await;

    assert_eq!(response.status(), 200);
    let body = String::from_utf8(response.body().to_vec()).unwrap();
    assert!(body.contains("chainwatch_rpc_failures"));
}

#[tokio::test]
async fn binding_a_taken_port_fails_before_serving() {
    let shutdown = CancellationToken::new();
    let (addr, server) = bind_server(0, shutdown.clone()).unwrap();
    let handle = tokio::spawn(server);

    let err = bind_server(addr.port(), CancellationToken::new()).err().unwrap();
    assert!(matches!(err, Error::Fatal(msg) if msg.contains("cannot bind metrics port")));

    shutdown.cancel();
    handle.await.unwrap();
}
