//! Redis connection management and health check implementation
//!
//! This module provides the connection used by the Redis store adapter,
//! including tiered health checks and a readiness wait for freshly started
//! servers.

use crate::error::{CacheError, Result};
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Configuration for health check behavior
#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    /// Health check method to use
    pub method: HealthCheckMethod,
    /// Timeout for connection and health check operations
    pub timeout: Duration,
    /// Whether to enable retry logic
    pub enable_retries: bool,
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Delay between retry attempts
    pub retry_delay: Duration,
    /// Whether to fall back from INFO to PING
    pub enable_fallback: bool,
    /// Response time threshold for degraded state (in milliseconds)
    pub degraded_threshold_ms: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            method: HealthCheckMethod::Ping,
            timeout: Duration::from_secs(5),
            enable_retries: true,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
            enable_fallback: true,
            degraded_threshold_ms: 1000,
        }
    }
}

/// Health check method variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthCheckMethod {
    /// `PING` expecting `PONG` (fastest, minimal overhead)
    Ping,
    /// `INFO server` (version and instance id diagnostics)
    Info,
}

/// Health status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Store is healthy and responsive
    Healthy,
    /// Store is responsive but slow (above degraded threshold)
    Degraded,
    /// Store is not responsive or erroring
    Unhealthy,
}

impl HealthStatus {
    /// Convert to HTTP status code equivalent
    pub fn to_http_status_code(&self) -> u16 {
        match self {
            HealthStatus::Healthy => 200,
            HealthStatus::Degraded => 200,
            HealthStatus::Unhealthy => 503,
        }
    }

    /// Check if status is healthy or degraded (operational)
    pub fn is_operational(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded)
    }
}

/// Detailed health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Overall health status
    pub status: HealthStatus,
    /// Response time in milliseconds
    pub response_time_ms: u64,
    /// Server version reported by INFO (if available)
    pub server_version: Option<String>,
    /// Server run id reported by INFO (if available)
    pub server_id: Option<String>,
    /// Timestamp of the health check
    pub timestamp: DateTime<Utc>,
    /// Error message (if unhealthy)
    pub error: Option<String>,
    /// Additional metadata
    pub metadata: HealthCheckMetadata,
}

/// Additional metadata for health check results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckMetadata {
    /// Health check method used
    pub check_method: HealthCheckMethod,
    /// Whether this was a retry attempt
    pub was_retry: bool,
    /// Number of retry attempts made
    pub retry_count: u32,
    /// Whether fallback was used
    pub used_fallback: bool,
}

impl HealthCheckResult {
    fn healthy(
        response_time: Duration,
        server_version: Option<String>,
        server_id: Option<String>,
        method: HealthCheckMethod,
        degraded_threshold_ms: u64,
    ) -> Self {
        let response_time_ms = response_time.as_millis() as u64;
        let status = if response_time_ms > degraded_threshold_ms {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Self {
            status,
            response_time_ms,
            server_version,
            server_id,
            timestamp: Utc::now(),
            error: None,
            metadata: HealthCheckMetadata {
                check_method: method,
                was_retry: false,
                retry_count: 0,
                used_fallback: false,
            },
        }
    }

    fn unhealthy(response_time: Duration, error: &str, method: HealthCheckMethod) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            response_time_ms: response_time.as_millis() as u64,
            server_version: None,
            server_id: None,
            timestamp: Utc::now(),
            error: Some(error.to_string()),
            metadata: HealthCheckMetadata {
                check_method: method,
                was_retry: false,
                retry_count: 0,
                used_fallback: false,
            },
        }
    }

    fn with_metadata_update(mut self, retry_count: u32, used_fallback: bool) -> Self {
        self.metadata.was_retry = retry_count > 0;
        self.metadata.retry_count = retry_count;
        self.metadata.used_fallback = used_fallback;
        self
    }
}

/// Managed Redis connection (auto-reconnecting, cheap to clone)
#[derive(Clone)]
pub struct RedisConnection {
    manager: ConnectionManager,
    health_config: HealthCheckConfig,
}

impl RedisConnection {
    /// Connect with default health check configuration
    ///
    /// # Example
    /// ```no_run
    /// use babylon_cache::RedisConnection;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let conn = RedisConnection::new("redis://localhost:6379").await?;
    ///     assert!(conn.health_check().await?);
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(url: &str) -> Result<Self> {
        Self::with_config(url, HealthCheckConfig::default()).await
    }

    /// Connect with custom health check configuration
    pub async fn with_config(url: &str, health_config: HealthCheckConfig) -> Result<Self> {
        info!("Connecting to Redis at {}", redact_url(url));

        let client = Client::open(url).map_err(|e| CacheError::ConfigError(e.to_string()))?;

        let manager = with_timeout(
            health_config.timeout,
            "connect",
            ConnectionManager::new(client),
        )
        .await?
        .map_err(|e| CacheError::ConnectionError(e.to_string()))?;

        info!("Successfully connected to Redis");

        Ok(Self {
            manager,
            health_config,
        })
    }

    /// Poll `PING` until the server answers or `total_timeout` elapses.
    ///
    /// Intended for freshly started servers (CI, containers) that accept
    /// connections a little after the process is up.
    pub async fn wait_until_ready(
        url: &str,
        total_timeout: Duration,
        interval: Duration,
    ) -> Result<Self> {
        let deadline = Instant::now() + total_timeout;
        let mut attempt = 1u32;
        let mut last_error: Option<CacheError> = None;

        let config = HealthCheckConfig {
            timeout: interval.max(Duration::from_millis(100)),
            ..HealthCheckConfig::default()
        };

        while Instant::now() < deadline {
            match Self::with_config(url, config.clone()).await {
                Ok(conn) => match conn.health_check().await {
                    Ok(true) => {
                        info!("Redis is ready (attempt {})", attempt);
                        return Ok(conn);
                    }
                    Ok(false) => {
                        last_error = Some(CacheError::ConnectionError(
                            "unexpected PING reply".to_string(),
                        ))
                    }
                    Err(e) => last_error = Some(e),
                },
                Err(e) => last_error = Some(e),
            }

            debug!("Redis not ready yet (attempt {})", attempt);
            attempt += 1;
            tokio::time::sleep(interval).await;
        }

        error!(
            "Redis did not become ready within {:?}: {}",
            total_timeout,
            last_error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt made".to_string())
        );
        Err(CacheError::TimeoutError {
            timeout_seconds: total_timeout.as_secs(),
            context: "waiting for redis readiness".to_string(),
        })
    }

    /// Simple health check using PING
    ///
    /// Returns `Ok(true)` when the server answers `PONG`.
    pub async fn health_check(&self) -> Result<bool> {
        debug!("Executing simple health check (PING)");

        let mut conn = self.manager.clone();
        let reply: String = with_timeout(
            self.health_config.timeout,
            "PING",
            redis::cmd("PING").query_async(&mut conn),
        )
        .await?
        .map_err(|e| CacheError::ConnectionError(e.to_string()))?;

        let healthy = reply.eq_ignore_ascii_case("PONG");
        if healthy {
            debug!("Simple health check passed");
        } else {
            warn!("PING returned unexpected reply: {}", reply);
        }
        Ok(healthy)
    }

    /// Detailed health check using `INFO server`
    ///
    /// Never fails: errors are captured in the returned result.
    pub async fn health_check_detailed(&self) -> HealthCheckResult {
        debug!("Executing detailed health check (INFO server)");
        let start = Instant::now();

        let mut conn = self.manager.clone();
        let outcome: Result<String> = match with_timeout(
            self.health_config.timeout,
            "INFO",
            redis::cmd("INFO").arg("server").query_async(&mut conn),
        )
        .await
        {
            Ok(reply) => reply.map_err(CacheError::from),
            Err(e) => Err(e),
        };
        let elapsed = start.elapsed();

        match outcome {
            Ok(info) => {
                debug!("Detailed health check passed ({}ms)", elapsed.as_millis());
                HealthCheckResult::healthy(
                    elapsed,
                    parse_info_field(&info, "redis_version"),
                    parse_info_field(&info, "run_id"),
                    HealthCheckMethod::Info,
                    self.health_config.degraded_threshold_ms,
                )
            }
            Err(e) => {
                error!("Detailed health check failed: {}", e);
                HealthCheckResult::unhealthy(
                    elapsed,
                    &format!("INFO failed: {}", e),
                    HealthCheckMethod::Info,
                )
            }
        }
    }

    /// Execute health check with retry logic and fallback
    ///
    /// INFO is commonly disabled on managed deployments; with fallback enabled
    /// a failing INFO is retried as PING.
    pub async fn health_check_with_retry(&self) -> HealthCheckResult {
        let mut retry_count = 0;
        let mut used_fallback = false;
        let max_retries = if self.health_config.enable_retries {
            self.health_config.max_retries
        } else {
            0
        };

        loop {
            let start = Instant::now();

            let result = match self.health_config.method {
                HealthCheckMethod::Ping => self.ping_result(start).await,
                HealthCheckMethod::Info => {
                    let detailed = self.health_check_detailed().await;
                    if detailed.status.is_operational() || !self.health_config.enable_fallback {
                        detailed
                    } else {
                        warn!("INFO failed, falling back to PING");
                        used_fallback = true;
                        self.ping_result(start).await
                    }
                }
            };

            if result.status.is_operational() || retry_count >= max_retries {
                return result.with_metadata_update(retry_count, used_fallback);
            }

            retry_count += 1;
            warn!(
                "Health check failed (attempt {}/{}), retrying after {:?}",
                retry_count,
                max_retries + 1,
                self.health_config.retry_delay
            );
            tokio::time::sleep(self.health_config.retry_delay).await;
        }
    }

    async fn ping_result(&self, start: Instant) -> HealthCheckResult {
        match self.health_check().await {
            Ok(true) => HealthCheckResult::healthy(
                start.elapsed(),
                None,
                None,
                HealthCheckMethod::Ping,
                self.health_config.degraded_threshold_ms,
            ),
            Ok(false) => HealthCheckResult::unhealthy(
                start.elapsed(),
                "unexpected PING reply",
                HealthCheckMethod::Ping,
            ),
            Err(e) => {
                HealthCheckResult::unhealthy(start.elapsed(), &e.to_string(), HealthCheckMethod::Ping)
            }
        }
    }

    /// Clone of the underlying connection manager for issuing commands
    pub fn manager(&self) -> ConnectionManager {
        self.manager.clone()
    }

    /// Get the current health check configuration
    pub fn health_config(&self) -> &HealthCheckConfig {
        &self.health_config
    }
}

async fn with_timeout<F, T>(timeout: Duration, context: &str, fut: F) -> Result<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| CacheError::TimeoutError {
            timeout_seconds: timeout.as_secs(),
            context: context.to_string(),
        })
}

/// Extract `field:value` from an INFO reply
fn parse_info_field(info: &str, field: &str) -> Option<String> {
    info.lines().find_map(|line| {
        let (name, value) = line.trim().split_once(':')?;
        (name == field).then(|| value.trim().to_string())
    })
}

/// Strip credentials from a connection URL before logging it
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
