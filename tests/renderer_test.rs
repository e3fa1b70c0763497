mod common;

use std::time::Duration;

use anyhow::Result;
use common::{SupplyChain, test_service};
use packledger::application::{AppError, ReportQuery};
use packledger::domain::Quantities;
use packledger::io::RendererClient;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve a single HTTP response and hand back the request body it received.
async fn serve_once(
    status: &'static str,
    content_type: &'static str,
    body: &'static [u8],
) -> Result<(String, JoinHandle<Vec<u8>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];

        let body_start = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers were read");
            request.extend_from_slice(&chunk[..n]);
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&request[..body_start]).to_ascii_lowercase();
        let content_length: usize = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);

        while request.len() < body_start + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before body was read");
            request.extend_from_slice(&chunk[..n]);
        }

        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(body).await.unwrap();
        socket.shutdown().await.unwrap();

        request[body_start..].to_vec()
    });

    Ok((base_url, handle))
}

fn client(base_url: &str) -> Result<RendererClient> {
    Ok(RendererClient::new(base_url, Duration::from_secs(5))?)
}

#[tokio::test]
async fn test_export_report_returns_rendered_document() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let chain = SupplyChain::create(&service).await?;
    chain.supply(&service, "Water", Quantities::cases(2)).await?;

    let (base_url, server) = serve_once("200 OK", "application/pdf", b"%PDF-1.4 report").await?;
    let service = service.with_renderer(client(&base_url)?);

    let document = service
        .export_report(&ReportQuery::all().with_period("December 2024"))
        .await?;
    assert_eq!(document, b"%PDF-1.4 report");

    let sent: serde_json::Value = serde_json::from_slice(&server.await?)?;
    assert_eq!(sent["account_name"], "All Accounts");
    assert_eq!(sent["period"], "December 2024");
    assert_eq!(sent["records"][0]["level"], "Water");
    assert_eq!(sent["records"][0]["supply"], 48);
    assert_eq!(sent["records"][0]["disposal"], 0);

    Ok(())
}

#[tokio::test]
async fn test_renderer_error_status() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (base_url, server) = serve_once("500 Internal Server Error", "text/plain", b"boom").await?;
    let service = service.with_renderer(client(&base_url)?);

    let result = service.export_report(&ReportQuery::all()).await;
    assert!(matches!(result, Err(AppError::UpstreamUnavailable(_))));
    server.await?;

    Ok(())
}

#[tokio::test]
async fn test_renderer_unreachable() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    drop(listener);

    let service = service.with_renderer(client(&base_url)?);
    let result = service.export_report(&ReportQuery::all()).await;
    assert!(matches!(result, Err(AppError::UpstreamUnavailable(_))));

    Ok(())
}

#[tokio::test]
async fn test_no_renderer_configured() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(matches!(
        service.export_report(&ReportQuery::all()).await,
        Err(AppError::UpstreamUnavailable(_))
    ));
    assert!(matches!(
        service.insights().await,
        Err(AppError::UpstreamUnavailable(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_insights_sends_recent_activity() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let chain = SupplyChain::create(&service).await?;
    chain.supply(&service, "Water", Quantities::cases(1)).await?;
    chain.ship(&service, "Soda", Quantities::units(6)).await?;

    let (base_url, server) = serve_once(
        "200 OK",
        "application/json",
        br#"{"summary":"steady supply"}"#,
    )
    .await?;
    let service = service.with_renderer(client(&base_url)?);

    let insights = service.insights().await?;
    assert_eq!(insights["summary"], "steady supply");

    let sent: serde_json::Value = serde_json::from_slice(&server.await?)?;
    assert_eq!(sent["context"], "supply_chain_analysis");
    let data: Vec<&str> = sent["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(data.len(), 2);
    assert!(data.contains(&"supply: Water"));
    assert!(data.contains(&"transfer: Soda"));

    Ok(())
}

#[tokio::test]
async fn test_insights_plain_text_reply() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (base_url, server) = serve_once("200 OK", "text/plain", b"nothing to report").await?;
    let service = service.with_renderer(client(&base_url)?);

    let insights = service.insights().await?;
    assert_eq!(insights, serde_json::Value::String("nothing to report".to_string()));
    server.await?;

    Ok(())
}

#[tokio::test]
async fn test_insights_non_object_json_reply() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let (base_url, server) = serve_once("200 OK", "application/json", b"[1,2,3]").await?;
    let service = service.with_renderer(client(&base_url)?);

    let insights = service.insights().await?;
    assert_eq!(insights, serde_json::Value::String("[1,2,3]".to_string()));
    server.await?;

    Ok(())
}
