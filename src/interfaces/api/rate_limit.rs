//! Per-client-IP request quota.

use super::error::ApiError;
use super::state::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// Keyed limiter allowing `max_requests` per `window` for each client IP.
pub fn ip_rate_limiter(window: Duration, max_requests: u32) -> IpRateLimiter {
    RateLimiter::keyed(quota_from_window(window, max_requests))
}

// Full burst up front, replenished evenly across the window.
fn quota_from_window(window: Duration, max_requests: u32) -> Quota {
    let burst = NonZeroU32::new(max_requests.max(1)).unwrap_or(NonZeroU32::MIN);
    let seconds_per_cell = (window.as_secs_f64() / f64::from(burst.get())).max(0.001);

    Quota::with_period(Duration::from_secs_f64(seconds_per_cell))
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}

/// Axum middleware: reject clients over quota with 429.
pub async fn limit_by_ip(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = client_ip(&request);

    if state.limiter.check_key(&ip).is_err() {
        debug!("API: rate limit exceeded for {}", ip);
        return Err(ApiError::RateLimited);
    }
    Ok(next.run(request).await)
}

// Requests served without connect info (e.g. in-process tests) share one bucket.
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_allows_burst_then_blocks() {
        let limiter = ip_rate_limiter(Duration::from_secs(900), 3);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.check_key(&ip).is_ok());
        }
        assert!(limiter.check_key(&ip).is_err());
    }

    #[test]
    fn test_quota_is_per_ip() {
        let limiter = ip_rate_limiter(Duration::from_secs(900), 1);
        let first: IpAddr = "10.0.0.1".parse().unwrap();
        let second: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check_key(&first).is_ok());
        assert!(limiter.check_key(&first).is_err());
        assert!(limiter.check_key(&second).is_ok());
    }

    #[test]
    fn test_zero_max_requests_still_allows_one() {
        let limiter = ip_rate_limiter(Duration::from_secs(60), 0);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(limiter.check_key(&ip).is_ok());
    }
}
