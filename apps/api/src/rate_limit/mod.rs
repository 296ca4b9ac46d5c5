//! Per-client fixed-window limiter for the CV-processing endpoints.
//!
//! Every extract, analyze and submit request costs up to two model calls, so these
//! routes are throttled per client. Counters live in Redis so all instances share them.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use redis::aio::ConnectionManager;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

const KEY_PREFIX: &str = "careers:ratelimit:cv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts one request for `client` and decides whether it may proceed.
    async fn check(&self, client: &str) -> Result<RateDecision, redis::RedisError>;
}

/// Holds one multiplexed connection that reconnects on its own after failures.
#[derive(Clone)]
pub struct RedisRateLimiter {
    connection: ConnectionManager,
    limit: u64,
    window: Duration,
}

impl RedisRateLimiter {
    pub async fn new(
        client: redis::Client,
        limit: u64,
        window: Duration,
    ) -> Result<Self, redis::RedisError> {
        let connection = ConnectionManager::new(client).await?;
        Ok(Self {
            connection,
            limit,
            window,
        })
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, client: &str) -> Result<RateDecision, redis::RedisError> {
        let key = format!("{KEY_PREFIX}:{client}");
        let window_secs = self.window.as_secs().max(1);
        let mut conn = self.connection.clone();

        // SET NX starts the window on the first hit; later hits only increment.
        let (count, ttl): (u64, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&key)
            .arg(0)
            .arg("EX")
            .arg(window_secs)
            .arg("NX")
            .ignore()
            .incr(&key, 1)
            .ttl(&key)
            .query_async(&mut conn)
            .await?;

        Ok(decide(count, ttl, self.limit, window_secs))
    }
}

fn decide(count: u64, ttl: i64, limit: u64, window_secs: u64) -> RateDecision {
    if count <= limit {
        return RateDecision::Allowed;
    }
    let retry_after_secs = u64::try_from(ttl)
        .ok()
        .filter(|t| *t > 0)
        .unwrap_or(window_secs);
    RateDecision::Limited { retry_after_secs }
}

/// Middleware for the CV routes. Fails open when Redis is unreachable.
pub async fn limit_cv_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_key(&request, state.config.trust_forwarded_for);

    match state.rate_limiter.check(&client).await {
        Ok(RateDecision::Allowed) => {}
        Ok(RateDecision::Limited { retry_after_secs }) => {
            warn!("Rate limit exceeded for client {client} on {}", request.uri().path());
            return Err(AppError::RateLimited { retry_after_secs });
        }
        Err(e) => warn!("Rate limiter unavailable, letting request through: {e}"),
    }

    Ok(next.run(request).await)
}

fn client_key(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .and_then(|ip| ip.parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
