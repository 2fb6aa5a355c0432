use fire_telemetry::{
    metrics, record_change_submitted, record_notification, TelemetryMetrics,
};

#[test]
fn fresh_metrics_start_at_zero() {
    let metrics = TelemetryMetrics::new();
    assert_eq!(metrics.snapshot(), Default::default());
}

#[test]
fn global_counters_only_grow() {
    let before = metrics().snapshot();
    record_change_submitted();
    record_notification(0);
    record_notification(3);
    let after = metrics().snapshot();

    assert!(after.changes_submitted >= before.changes_submitted + 1);
    assert!(after.notifications_published >= before.notifications_published + 2);
    assert!(after.notifications_dropped >= before.notifications_dropped + 1);
}
