// tests/harness_tests.rs
use async_trait::async_trait;
use daisy_chain::config::{HarnessConfig, ProbeConfig};
use daisy_chain::harness::{self, Harness, HarnessError};
use daisy_chain::launcher::{LaunchCommand, LaunchError, SpawnedProcess, Spawner};
use daisy_chain::probe::ProbeError;
use mockito::Matcher;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Records every command instead of starting it.
#[derive(Clone, Default)]
struct RecordingSpawner {
    launched: Arc<Mutex<Vec<(LaunchCommand, Instant)>>>,
    fail_port: Option<u16>,
}

impl RecordingSpawner {
    fn failing_on(port: u16) -> Self {
        Self {
            fail_port: Some(port),
            ..Self::default()
        }
    }

    fn launched(&self) -> Vec<(LaunchCommand, Instant)> {
        self.launched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Spawner for RecordingSpawner {
    async fn spawn(&self, command: &LaunchCommand) -> Result<SpawnedProcess, LaunchError> {
        self.launched
            .lock()
            .unwrap()
            .push((command.clone(), Instant::now()));

        if self.fail_port == Some(command.port) {
            return Err(LaunchError::Spawn {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"),
            });
        }
        Ok(SpawnedProcess { pid: Some(4242) })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Default chain with short delays, probing `probe_port`.
fn fast_config(probe_port: u16) -> HarnessConfig {
    HarnessConfig {
        launch_delay_ms: 20,
        settle_delay_ms: 40,
        probe: ProbeConfig {
            port: probe_port,
            timeout_secs: 2,
            ..ProbeConfig::default()
        },
        ..HarnessConfig::default()
    }
}

fn port_of(server: &mockito::ServerGuard) -> u16 {
    server
        .host_with_port()
        .parse::<std::net::SocketAddr>()
        .unwrap()
        .port()
}

#[tokio::test]
async fn test_run_launches_in_order_and_probes_once() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_query(Matcher::UrlEncoded("value".into(), "d".into()))
        .with_body("d\n")
        .expect(1)
        .create_async()
        .await;

    let spawner = RecordingSpawner::default();
    let harness = Harness::new(fast_config(port_of(&server)), spawner.clone());

    let report = harness.run().await.unwrap();

    let triples: Vec<Vec<String>> = spawner
        .launched()
        .iter()
        .map(|(cmd, _)| cmd.chain_args().to_vec())
        .collect();
    assert_eq!(
        triples,
        vec![
            vec!["one", "8000", "none"],
            vec!["one", "8001", "8000"],
            vec!["one", "8002", "8001"],
        ]
    );

    assert_eq!(report.response.lines, vec!["d"]);
    assert!(report.launches.iter().all(|l| l.pid == Some(4242)));
    assert!(report.readiness.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_printed_output_is_only_the_response() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/")
        .match_query(Matcher::UrlEncoded("value".into(), "d".into()))
        .with_body(r#"{"URL":"127.0.0.1:8002","Value":"d"}"#)
        .create_async()
        .await;

    // Logs from the run go to this subscriber's writer, never to the output.
    let logs = tracing::subscriber::set_default(daisy_chain::logging::subscriber(
        true,
        std::io::sink,
    ));
    let harness = Harness::new(fast_config(port_of(&server)), RecordingSpawner::default());
    let report = harness.run().await.unwrap();
    drop(logs);

    let mut stdout = Vec::new();
    harness::write_lines(&report.response.lines, &mut stdout).unwrap();

    assert_eq!(
        String::from_utf8(stdout).unwrap(),
        "{\"URL\":\"127.0.0.1:8002\",\"Value\":\"d\"}\n"
    );
}

#[tokio::test]
async fn test_probe_waits_for_all_delays() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_body("ok")
        .create_async()
        .await;

    let config = fast_config(port_of(&server));
    let planned = config.planned_delay();
    assert_eq!(planned, Duration::from_millis(3 * 20 + 40));

    let spawner = RecordingSpawner::default();
    let harness = Harness::new(config, spawner.clone());
    let report = harness.run().await.unwrap();

    assert!(report.probe_after >= planned);

    let launched = spawner.launched();
    for pair in launched.windows(2) {
        assert!(pair[1].1.duration_since(pair[0].1) >= Duration::from_millis(20));
    }
}

#[tokio::test]
async fn test_spawn_failure_does_not_stop_the_run() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_body("still probed")
        .expect(1)
        .create_async()
        .await;

    let spawner = RecordingSpawner::failing_on(8001);
    let harness = Harness::new(fast_config(port_of(&server)), spawner.clone());

    let report = harness.run().await.unwrap();

    assert_eq!(spawner.launched().len(), 3);
    assert!(report.launches[1].error.is_some());
    assert!(report.launches[0].error.is_none());
    assert!(report.launches[2].error.is_none());
    assert_eq!(report.response.lines, vec!["still probed"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_target_fails_the_run() {
    // Bind then drop to get a port nobody listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let harness = Harness::new(fast_config(port), RecordingSpawner::default());
    let err = harness.run().await.unwrap_err();

    assert!(matches!(err, HarnessError::Probe(ProbeError::Connect { .. })));
}

#[tokio::test]
async fn test_error_status_fails_the_run() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_status(502)
        .create_async()
        .await;

    let harness = Harness::new(fast_config(port_of(&server)), RecordingSpawner::default());
    let err = harness.run().await.unwrap_err();

    assert!(matches!(
        err,
        HarnessError::Probe(ProbeError::Status { status: 502, .. })
    ));
}

#[tokio::test]
async fn test_readiness_polls_every_instance() {
    let mut server = mockito::Server::new_async().await;
    let port = port_of(&server);
    let health = server
        .mock("GET", "/health")
        .with_body("OK")
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_body("ready")
        .create_async()
        .await;

    let mut config = fast_config(port);
    config.instances.truncate(1);
    config.instances[0].port = port;
    config.readiness.enabled = true;
    config.readiness.timeout_secs = 1;

    let harness = Harness::new(config, RecordingSpawner::default());
    let report = harness.run().await.unwrap();

    assert_eq!(report.readiness.len(), 1);
    assert!(report.readiness[0].ready);
    health.assert_async().await;
}
