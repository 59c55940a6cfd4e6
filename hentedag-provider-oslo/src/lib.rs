//! Provider implementation for Oslo scraping the municipality's pickup page.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError, RequestBuilder};

use hentedag_core::{
    model::Schedule,
    ports::{PortError, SchedulePort},
};

mod parser;

pub use parser::{parse_pickup_date, parse_schedule};

/// Pickup page queried with `?street=<street>`.
pub const BASE_URL: &str = "https://www.oslo.kommune.no/avfall-og-gjenvinning/avfallshenting/";

/// Upper bound for a single page request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Schedule backend reading the Oslo pickup page.
pub struct OsloSchedulePort {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl OsloSchedulePort {
    /// Create a new schedule port bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: BASE_URL.to_owned(),
            timeout: FETCH_TIMEOUT,
        }
    }

    /// Query a different page, e.g. a mirror or a local test server.
    #[must_use]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl SchedulePort for OsloSchedulePort {
    async fn fetch_schedule(&self, address: &str, street: &str) -> Result<Schedule, PortError> {
        log::debug!("GET {} street={street}", self.base_url);

        let req = self
            .client
            .get(&self.base_url)
            .query(&[("street", street)])
            .timeout(self.timeout);

        let html = fetch_html(req).await?;
        parse_schedule(&html, address)
    }
}

/// Build the HTTP client used for the pickup page.
///
/// # Errors
///
/// Returns [`PortError::Network`] when the TLS backend cannot be initialised.
pub fn http_client() -> Result<Client, PortError> {
    Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .map_err(PortError::from)
}

// Small helper to fetch a page body with status and timeout handling.
async fn fetch_html(req: RequestBuilder) -> Result<String, PortError> {
    let response = req.send().await.map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(PortError::Status(status.as_u16()));
    }

    response.text().await.map_err(transport_error)
}

fn transport_error(err: ReqwestError) -> PortError {
    if err.is_timeout() {
        PortError::Timeout
    } else {
        PortError::Network(err)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    const STORGATA: &str = include_str!("../fixtures/storgata.html");

    /// Serve a single canned response and hand back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local address");

        let handle = tokio::spawn(async move {
            let (mut socket, _peer) = listener.accept().await.expect("accept connection");
            let mut buf = vec![0_u8; 8192];
            let read = socket.read(&mut buf).await.expect("read request");
            let request = String::from_utf8_lossy(buf.get(..read).unwrap_or_default()).into_owned();

            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: text/html; charset=utf-8\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            request
        });

        (format!("http://{addr}/avfallshenting/"), handle)
    }

    fn port_for(url: &str) -> OsloSchedulePort {
        OsloSchedulePort::new(http_client().expect("client builds")).with_base_url(url)
    }

    #[tokio::test]
    async fn fetches_and_parses_page() {
        let (url, server) = serve_once("200 OK", STORGATA).await;

        let schedule = port_for(&url)
            .fetch_schedule("Storgata 1", "Storgata 1")
            .await
            .expect("schedule loads");

        assert_eq!(schedule.categories(), vec!["Restavfall", "Papir"], "rows");
        let request = server.await.expect("server task");
        assert!(
            request.starts_with("GET /avfallshenting/?street=Storgata+1 "),
            "street is sent as query parameter: {request}"
        );
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_error() {
        let (url, server) = serve_once("503 Service Unavailable", "").await;

        let err = port_for(&url)
            .fetch_schedule("Storgata 1", "Storgata 1")
            .await
            .expect_err("server error");

        assert!(matches!(err, PortError::Status(503)), "{err}");
        assert!(err.is_fetch(), "status is a fetch error");
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local address");
        let server = tokio::spawn(async move {
            let (_socket, _peer) = listener.accept().await.expect("accept connection");
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = port_for(&format!("http://{addr}/"))
            .with_timeout(Duration::from_millis(200))
            .fetch_schedule("Storgata 1", "Storgata 1")
            .await
            .expect_err("no response in time");

        assert!(matches!(err, PortError::Timeout), "{err}");
        server.abort();
    }

    #[test]
    fn defaults_to_oslo_page() {
        let port = OsloSchedulePort::new(Client::new());

        assert_eq!(port.base_url, BASE_URL, "base url");
        assert_eq!(port.timeout, Duration::from_secs(10), "ten second timeout");
    }
}
