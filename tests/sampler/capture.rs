//! Capture Tests
//!
//! Thresholds, transaction scoping and buffer inspection.

use crate::*;

// =============================================================================
// THRESHOLD TESTS
// =============================================================================

#[test]
fn test_zero_duration_dropped_positive_kept() {
    let sampler = create_sampler(SamplerConfig::raw_without_plans());
    let ctx = ContextId::next();

    sampler.on_start_transaction(ctx, Utc::now(), None);
    assert!(!sampler.notice_sql(ctx, "select 1", "Database/a/select", QueryContext::default(), Duration::ZERO));
    assert!(sampler.notice_sql(ctx, "select 2", "Database/b/select", QueryContext::default(), secs(0.001)));

    let texts = sampler
        .with_transaction(ctx, |txn| {
            txn.observations
                .iter()
                .map(|o| o.query_text.clone())
                .collect::<Vec<_>>()
        })
        .unwrap();
    assert_eq!(texts, vec!["select 2"]);
}

#[test]
fn test_threshold_is_exclusive() {
    let sampler = create_sampler(SamplerConfig {
        min_report_threshold: 0.5,
        explain_enabled: false,
        ..Default::default()
    });
    let ctx = ContextId::next();

    sampler.on_start_transaction(ctx, Utc::now(), None);
    assert!(!sampler.notice_sql(ctx, "select 1", "Database/a/select", QueryContext::default(), secs(0.5)));
    assert!(sampler.notice_sql(ctx, "select 1", "Database/a/select", QueryContext::default(), secs(0.51)));
    sampler.on_finishing_transaction(ctx, "txn");

    let traces = sampler.harvest();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].call_count, 1);
}

// =============================================================================
// TRANSACTION SCOPE TESTS
// =============================================================================

#[test]
fn test_notice_outside_transaction_is_noop() {
    let sampler = create_sampler(SamplerConfig::raw_without_plans());
    let ctx = ContextId::next();

    assert!(!sampler.notice_sql(ctx, "select 1", "Database/a/select", QueryContext::default(), secs(1.0)));
    sampler.on_finishing_transaction(ctx, "txn");

    assert!(sampler.with_transaction(ctx, |_| ()).is_none());
    assert_eq!(sampler.pending(), 0);
}

#[test]
fn test_restart_replaces_buffer() {
    let sampler = create_sampler(SamplerConfig::raw_without_plans());
    let ctx = ContextId::next();

    sampler.on_start_transaction(ctx, Utc::now(), Some("/first".to_string()));
    sampler.notice_sql(ctx, "select 1", "Database/a/select", QueryContext::default(), secs(1.0));
    sampler.on_start_transaction(ctx, Utc::now(), Some("/second".to_string()));
    sampler.on_finishing_transaction(ctx, "txn");

    assert_eq!(sampler.with_transaction(ctx, |t| t.len()), Some(0));
    assert_eq!(sampler.pending(), 0);
}

#[test]
fn test_finished_transaction_stays_inspectable() {
    let sampler = create_sampler(SamplerConfig::raw_without_plans());
    let ctx = run_transaction(
        &sampler,
        "WebTransaction/Controller/c/a",
        "/c/a",
        &[("select * from test", "Database/test/select", 1.0)],
    );

    let (name, path, count) = sampler
        .with_transaction(ctx, |t| (t.name().to_string(), t.request_path().to_string(), t.len()))
        .unwrap();
    assert_eq!(name, "WebTransaction/Controller/c/a");
    assert_eq!(path, "/c/a");
    assert_eq!(count, 1);
}

#[test]
fn test_fresh_context_per_request_does_not_accumulate() {
    let sampler = create_sampler(SamplerConfig::raw_without_plans());
    let big_sql = format!("select '{}'", "x".repeat(10_000));
    let first = run_transaction(&sampler, "txn", "/", &[(big_sql.as_str(), "Database/a/select", 1.0)]);

    for _ in 0..5_000 {
        run_transaction(&sampler, "txn", "/", &[("select 1", "Database/b/select", 0.01)]);
    }

    assert!(sampler.retained_transactions() <= slowsql_concurrency::DEFAULT_FINISHED_RETENTION);
    assert!(sampler.with_transaction(first, |t| t.len()).is_none());
}

#[test]
fn test_transaction_info_flows_into_trace() {
    let sampler = create_sampler(SamplerConfig::raw_without_plans());
    let ctx = ContextId::next();

    sampler.on_start_transaction(ctx, Utc::now(), None);
    sampler.set_transaction_info(ctx, "/orders/7", "abc123");
    sampler.notice_sql(ctx, "select * from orders", "Database/orders/select", QueryContext::default(), secs(1.0));
    sampler.on_finishing_transaction(ctx, "WebTransaction/Controller/orders/show");

    assert_eq!(sampler.with_transaction(ctx, |t| t.guid.clone()).unwrap(), "abc123");
    let traces = sampler.harvest();
    assert_eq!(traces[0].uri, "/orders/7");
}

#[test]
fn test_suspended_capture_records_nothing() {
    let sampler = create_sampler(SamplerConfig::raw_without_plans());
    let ctx = ContextId::next();

    sampler.on_start_transaction(ctx, Utc::now(), None);
    sampler.set_sql_recorded(ctx, false);
    assert!(!sampler.notice_sql(ctx, "select 1", "Database/a/select", QueryContext::default(), secs(1.0)));
    sampler.set_sql_recorded(ctx, true);
    assert!(sampler.notice_sql(ctx, "select 2", "Database/a/select", QueryContext::default(), secs(1.0)));
    sampler.on_finishing_transaction(ctx, "txn");

    assert_eq!(sampler.harvest()[0].call_count, 1);
}

#[test]
fn test_unnamed_operation_skipped() {
    let sampler = create_sampler(SamplerConfig::raw_without_plans());
    run_transaction(&sampler, "txn", "/", &[("select 1", "", 1.0)]);
    assert_eq!(sampler.pending(), 0);
}

#[test]
fn test_disabled_sampler_ignores_everything() {
    let sampler = create_sampler(SamplerConfig::disabled());
    let ctx = run_transaction(&sampler, "txn", "/", &[("select 1", "Database/a/select", 1.0)]);

    assert!(sampler.with_transaction(ctx, |_| ()).is_none());
    assert!(sampler.harvest_wire().is_empty());
}
