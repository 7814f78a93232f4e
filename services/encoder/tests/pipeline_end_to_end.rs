//! Track events from a line source through the pipeline to a simulated
//! encoder over real TCP

use rds_encoder_service::{run_consumer, LineSource, Sanitizer, TrackPipeline};
use rds_network::{DeviceLink, LinkConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

/// Accepts one connection, answers `OK` to everything and records each line
async fn simulated_encoder() -> (u16, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let received = Arc::new(Mutex::new(Vec::new()));

    let log = received.clone();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        while reader.read_line(&mut line).await.unwrap_or(0) > 0 {
            log.lock().unwrap().push(line.trim_end().to_string());
            line.clear();
            if reader.get_mut().write_all(b"OK\r\n").await.is_err() {
                break;
            }
        }
    });

    (port, received)
}

async fn connected_link(port: u16) -> Arc<DeviceLink> {
    let link = Arc::new(DeviceLink::new(LinkConfig {
        poll_interval: Duration::from_millis(20),
        initial_backoff: Duration::from_millis(50),
        ..LinkConfig::new("127.0.0.1", port)
    }));
    link.start();

    timeout(Duration::from_secs(5), async {
        while !link.is_connected() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("link did not connect");
    link
}

#[tokio::test]
async fn test_radiohead_reaches_the_encoder() {
    let (port, received) = simulated_encoder().await;
    let link = connected_link(port).await;
    let pipeline = TrackPipeline::new(link.clone(), Sanitizer::without_filter());

    let input: &[u8] = br#"{"artist":"Radiohead","song":"Karma Police","duration":258}
"#;
    let mut source = LineSource::new(input, "test");
    let summary = run_consumer(&mut source, &pipeline, CancellationToken::new()).await;

    assert_eq!(summary.received, 1);
    assert_eq!(summary.delivered, 1);
    assert_eq!(
        *received.lock().unwrap(),
        vec![
            "TEXT=RADIOHEAD - KARMA POLICE".to_string(),
            "RT+TAG=04,0,9,01,12,12,1,4".to_string(),
        ]
    );

    link.stop().await;
}

#[tokio::test]
async fn test_bad_events_are_dropped_and_the_rest_delivered() {
    let (port, received) = simulated_encoder().await;
    let link = connected_link(port).await;
    let pipeline = TrackPipeline::new(link.clone(), Sanitizer::without_filter());

    let input: &[u8] = b"not json\n\
{\"artist\":\"Sigur R\xc3\xb3s\",\"song\":\"Hopp\xc3\xadpolla\",\"duration\":270}\n\
{\"song\":\"No Artist Here\"}\n";
    let mut source = LineSource::new(input, "test");
    let summary = run_consumer(&mut source, &pipeline, CancellationToken::new()).await;

    assert_eq!(summary.received, 3);
    assert_eq!(summary.delivered, 1);
    assert_eq!(summary.dropped, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(
        *received.lock().unwrap(),
        vec![
            "TEXT=SIGUR ROS - HOPPIPOLLA".to_string(),
            "RT+TAG=04,0,9,01,12,10,1,4".to_string(),
        ]
    );

    link.stop().await;
}

#[tokio::test]
async fn test_oversized_line_is_skipped() {
    let (port, received) = simulated_encoder().await;
    let link = connected_link(port).await;
    let pipeline = TrackPipeline::new(link.clone(), Sanitizer::without_filter());

    let mut input = vec![b'['; 100_000];
    input.extend_from_slice(b"\n{\"artist\":\"Radiohead\",\"song\":\"Karma Police\"}\n");
    let mut source = LineSource::new(input.as_slice(), "test");
    let summary = run_consumer(&mut source, &pipeline, CancellationToken::new()).await;

    assert_eq!(summary.received, 2);
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.delivered, 1);
    assert_eq!(
        received.lock().unwrap().first().map(String::as_str),
        Some("TEXT=RADIOHEAD - KARMA POLICE")
    );

    link.stop().await;
}

#[tokio::test]
async fn test_offline_encoder_counts_failures() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let link = Arc::new(DeviceLink::new(LinkConfig::new("127.0.0.1", port)));
    let pipeline = TrackPipeline::new(link.clone(), Sanitizer::without_filter());

    let input: &[u8] = b"{\"artist\":\"A\",\"song\":\"B\"}\n{\"artist\":\"C\",\"song\":\"D\"}\n";
    let mut source = LineSource::new(input, "test");
    let summary = run_consumer(&mut source, &pipeline, CancellationToken::new()).await;

    assert_eq!(summary.received, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.delivered, 0);
}

#[tokio::test]
async fn test_cancelled_consumer_stops_waiting() {
    let (port, _received) = simulated_encoder().await;
    let link = connected_link(port).await;
    let pipeline = TrackPipeline::new(link.clone(), Sanitizer::without_filter());

    // A source that never yields anything
    let (_writer, reader) = tokio::io::duplex(64);
    let mut source = LineSource::new(BufReader::new(reader), "idle");

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let summary = timeout(
        Duration::from_secs(1),
        run_consumer(&mut source, &pipeline, shutdown),
    )
    .await
    .expect("consumer ignored cancellation");
    assert_eq!(summary.received, 0);

    link.stop().await;
}
