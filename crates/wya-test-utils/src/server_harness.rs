//! Test server harness for E2E testing
//!
//! Provides `TestServer` for spawning real wya? server instances in tests.

use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use wya_service::auth::{AuthGate, HttpKeySetFetcher};
use wya_service::config::Config;
use wya_service::observability::metrics::init_metrics_recorder;
use wya_service::routes::{self, AppState};

use crate::test_ids::{TEST_CLIENT_ID, TEST_REGION, TEST_USER_POOL_ID};

static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Process-wide metrics handle; the recorder can only be installed once.
fn test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

/// Test harness for spawning the service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_whoami() -> Result<()> {
///     let jwks = MockJwksServer::start(jwks_json(&[&keypair])).await;
///     let server = TestServer::spawn(&jwks.jwks_url(), "access").await?;
///
///     let response = reqwest::Client::new()
///         .get(format!("{}/whoami", server.url()))
///         .bearer_auth(token)
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawn a server for the test pool, fetching keys from `jwks_url`.
    pub async fn spawn(jwks_url: &str, token_use: &str) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("COGNITO_REGION".to_string(), TEST_REGION.to_string()),
            (
                "COGNITO_USER_POOL_ID".to_string(),
                TEST_USER_POOL_ID.to_string(),
            ),
            ("COGNITO_CLIENT_ID".to_string(), TEST_CLIENT_ID.to_string()),
            ("COGNITO_TOKEN_USE".to_string(), token_use.to_string()),
            ("COGNITO_JWKS_URL".to_string(), jwks_url.to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let auth_gate = Arc::new(AuthGate::new(
            config.auth_policy(),
            Arc::new(HttpKeySetFetcher::new()),
        ));

        let state = Arc::new(AppState {
            config: config.clone(),
            auth_gate,
        });

        let app = routes::build_routes(state, test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
