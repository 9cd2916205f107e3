//! Aggregation Tests
//!
//! Merge arithmetic and the choice of representative statement.

use crate::*;
use proptest::prelude::*;

// =============================================================================
// MERGE TESTS
// =============================================================================

#[test]
fn test_merge_two_costs() {
    let sampler = create_sampler(SamplerConfig::raw_without_plans());
    run_transaction(&sampler, "txn", "/a", &[("select * from test", "Database/test/select", 1.0)]);
    run_transaction(&sampler, "txn", "/b", &[("select * from test", "Database/test/select", 2.0)]);

    let traces = sampler.harvest();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].call_count, 2);
    assert_eq!(traces[0].total_cost, 3.0);
    assert_eq!(traces[0].min_cost, 1.0);
    assert_eq!(traces[0].max_cost, 2.0);
}

#[test]
fn test_slowest_statement_is_representative() {
    let sampler = create_sampler(SamplerConfig::raw_without_plans());
    run_transaction(&sampler, "first", "/first", &[("select * from t where id = 1", "Database/t/select", 1.0)]);
    run_transaction(&sampler, "second", "/second", &[("select * from t where id = 2", "Database/t/select", 3.0)]);
    run_transaction(&sampler, "third", "/third", &[("select * from t where id = 3", "Database/t/select", 2.0)]);

    let trace = sampler.pending_trace("Database/t/select").unwrap();
    assert_eq!(trace.representative_sql, "select * from t where id = 2");
    assert_eq!(trace.path, "second");
    assert_eq!(trace.uri, "/second");
}

#[test]
fn test_equal_max_keeps_existing_representative() {
    let sampler = create_sampler(SamplerConfig::raw_without_plans());
    run_transaction(&sampler, "first", "/first", &[("select 'a'", "Database/t/select", 2.0)]);
    run_transaction(&sampler, "second", "/second", &[("select 'b'", "Database/t/select", 2.0)]);

    let trace = sampler.pending_trace("Database/t/select").unwrap();
    assert_eq!(trace.representative_sql, "select 'a'");
    assert_eq!(trace.path, "first");
}

#[test]
fn test_different_literals_share_operation() {
    let sampler = create_sampler(SamplerConfig {
        explain_enabled: false,
        ..Default::default()
    });
    run_transaction(
        &sampler,
        "txn",
        "/",
        &[
            ("select * from users where id = 1", "Database/users/select", 1.0),
            ("select * from users where id = 2", "Database/users/select", 1.0),
            ("select * from users where name = 'x'", "Database/users/select", 1.0),
        ],
    );

    let traces = sampler.harvest();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].call_count, 3);
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    #[test]
    fn prop_aggregate_matches_inputs(costs in prop::collection::vec(1u32..5_000, 1..40)) {
        let sampler = create_sampler(SamplerConfig::raw_without_plans());
        let queries: Vec<(String, f64)> = costs
            .iter()
            .map(|ms| (format!("select {}", ms), f64::from(*ms) / 1000.0))
            .collect();

        // Split the observations over a few transactions
        for chunk in queries.chunks(7) {
            let batch: Vec<(&str, &str, f64)> = chunk
                .iter()
                .map(|(sql, cost)| (sql.as_str(), "Database/t/select", *cost))
                .collect();
            run_transaction(&sampler, "txn", "/", &batch);
        }

        let traces = sampler.harvest();
        prop_assert_eq!(traces.len(), 1);
        let trace = &traces[0];

        let sum: f64 = queries.iter().map(|(_, c)| c).sum();
        let max = queries.iter().map(|(_, c)| *c).fold(f64::MIN, f64::max);
        let min = queries.iter().map(|(_, c)| *c).fold(f64::MAX, f64::min);

        prop_assert_eq!(trace.call_count, costs.len() as u64);
        prop_assert!((trace.total_cost - sum).abs() < 1e-6);
        prop_assert!(trace.min_cost <= trace.max_cost);
        prop_assert!((trace.max_cost - max).abs() < 1e-9);
        prop_assert!((trace.min_cost - min).abs() < 1e-9);
    }
}
