use std::path::Path;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use peep::dashboard::{now_ms, DashboardServer};
use peep::domain::{DashboardSettings, METRICS_FILE_NAME};

fn settings(dir: &Path) -> DashboardSettings {
    DashboardSettings {
        port: 0,
        metrics_path: dir.join(METRICS_FILE_NAME),
        static_dir: dir.join("static"),
    }
}

fn snapshot(timestamp_ms: i64) -> String {
    format!(
        r#"{{"alloc":2048,"totalAlloc":8192,"sys":65536,"numGC":2,"pauseTotal":5000,"cpuPercent":3.5,"timestampMs":{timestamp_ms}}}"#
    )
}

/// Minimal HTTP/1.1 GET returning (status line, content type, body).
async fn get(server: &DashboardServer, path: &str) -> (String, String, String) {
    let mut stream = TcpStream::connect(("127.0.0.1", server.local_addr().port())).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let status = head.lines().next().unwrap().to_string();
    let content_type = head
        .lines()
        .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-type:").map(|v| v.trim().to_string()))
        .unwrap_or_default();
    (status, content_type, body.to_string())
}

#[tokio::test]
async fn test_no_snapshot_yet_returns_empty_object() {
    let dir = tempfile::tempdir().unwrap();
    let server = DashboardServer::start(&settings(dir.path())).await.unwrap();

    let (status, content_type, body) = get(&server, "/metrics").await;
    assert!(status.contains("200"), "{status}");
    assert_eq!(content_type, "application/json");
    assert_eq!(body, "{}");

    server.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_stale_snapshot_returns_empty_object() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    std::fs::write(&settings.metrics_path, snapshot(now_ms() - 3000)).unwrap();
    let server = DashboardServer::start(&settings).await.unwrap();

    let (_, _, body) = get(&server, "/metrics").await;
    assert_eq!(body, "{}");

    server.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_fresh_snapshot_is_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    let raw = snapshot(now_ms());
    std::fs::write(&settings.metrics_path, &raw).unwrap();
    let server = DashboardServer::start(&settings).await.unwrap();

    let (_, _, body) = get(&server, "/metrics").await;
    assert_eq!(body, raw);

    // Overwritten in place, the next request sees the new value.
    std::fs::write(&settings.metrics_path, "garbage").unwrap();
    let (_, _, body) = get(&server, "/metrics").await;
    assert_eq!(body, "{}");

    server.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_static_directory_is_served() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings(dir.path());
    std::fs::create_dir_all(&settings.static_dir).unwrap();
    std::fs::write(settings.static_dir.join("index.html"), "<html>dashboard</html>").unwrap();
    let server = DashboardServer::start(&settings).await.unwrap();

    let (status, _, body) = get(&server, "/").await;
    assert!(status.contains("200"), "{status}");
    assert_eq!(body, "<html>dashboard</html>");

    let (status, _, _) = get(&server, "/missing.js").await;
    assert!(status.contains("404"), "{status}");

    server.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_port_in_use_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let first = DashboardServer::start(&settings(dir.path())).await.unwrap();
    let mut taken = settings(dir.path());
    taken.port = first.local_addr().port();

    let err = DashboardServer::start(&taken).await.unwrap_err();
    assert!(err.to_string().contains("failed to bind dashboard"));

    first.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn test_shutdown_is_bounded_by_pending_connection() {
    let dir = tempfile::tempdir().unwrap();
    let server = DashboardServer::start(&settings(dir.path())).await.unwrap();

    // Headers never finish, so the connection stays in flight.
    let mut stream = TcpStream::connect(("127.0.0.1", server.local_addr().port())).await.unwrap();
    stream.write_all(b"GET /metrics HTTP/1.1\r\nHost: x\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    server.shutdown(Duration::from_millis(300)).await;
    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_secs(2), "shutdown took {elapsed:?}");

    drop(stream);
}
