//! Logging Tests
//!
//! Recovered failures are reported through `tracing` rather than returned.

use crate::*;
use serde_json::Value;
use slowsql_wire::EncodeError;
use std::io;

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs(f: impl FnOnce()) -> String {
    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    buf.contents()
}

struct BrokenEncoder;

impl PlanEncoder for BrokenEncoder {
    fn encode(&self, _params: &Value) -> std::result::Result<Value, EncodeError> {
        Err(EncodeError::Unexpected("plan too large".into()))
    }

    fn empty(&self) -> Value {
        Value::String("empty".into())
    }
}

#[test]
fn test_probe_failure_is_logged() {
    let sampler = create_sampler(SamplerConfig::default());
    let probe = FakeProbe::failing(ExplainError::Unsupported("near EXPLAIN".into()));

    let logs = capture_logs(|| {
        run_transaction_with(
            &sampler,
            "txn",
            "/",
            QueryContext::default().with_probe(probe.clone()),
            &[("select * from test", "Database/test/select", 1.0)],
        );
    });

    assert!(logs.contains("WARN"));
    assert!(logs.contains("Plan collection failed"));
    assert!(logs.contains("Database/test/select"));
    assert_eq!(sampler.pending(), 1);
}

#[test]
fn test_encode_failure_falls_back_and_is_logged() {
    let sampler = Sampler::builder().encoder(BrokenEncoder).build().unwrap();
    let probe = FakeProbe::table(&["id"], vec![vec![Value::from(1)]]);
    run_transaction_with(
        &sampler,
        "txn",
        "/",
        QueryContext::default().with_probe(probe),
        &[("select * from test", "Database/test/select", 1.0)],
    );

    let mut wire = Vec::new();
    let logs = capture_logs(|| wire = sampler.harvest_wire());

    assert_eq!(wire.len(), 1);
    assert_eq!(wire[0].params, Value::String("empty".into()));
    assert!(logs.contains("Failed to encode plan"));
}

#[test]
fn test_failed_delivery_is_logged() {
    let sampler = create_sampler(SamplerConfig::raw_without_plans());
    run_transaction(&sampler, "txn", "/", &[("select 1", "Database/a/select", 1.0)]);

    let offline = |_: &[WireTrace]| -> std::result::Result<(), TransportError> {
        Err(TransportError::new("connection refused"))
    };
    let logs = capture_logs(|| {
        sampler.harvest_and_send(&offline);
    });

    assert!(logs.contains("requeueing"));
    assert!(logs.contains("connection refused"));
}

#[test]
fn test_harvester_logs_full_interval() {
    let sampler = Arc::new(create_sampler(SamplerConfig::raw_without_plans()));
    let transport = Arc::new(RecordingTransport::default());

    let mut harvester = None;
    let logs = capture_logs(|| {
        harvester = Some(Harvester::spawn(sampler, transport, Duration::from_micros(1_500_250)).unwrap());
    });
    drop(harvester);

    assert!(logs.contains("Harvester started"));
    assert!(logs.contains("interval=1.50025s"));
}
