/*
#################################################################################
# See LICENSE.md for full license information.                                  #
# License: MIT                                                                  #
# Software: Shillzzz Community Backend                                          #
#################################################################################
*/
//! SOL/USD price with a process-local cache.
//!
//! A fresh price is served for `ttl`; after that the next caller refetches with a bounded
//! timeout. Failures fall back to the last good price, or to the configured default when
//! nothing has been fetched yet.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::error::Result;

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_SOL_USD: f64 = 100.0;

#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn sol_usd(&self) -> Result<f64>;
}

#[derive(Debug, Clone, Copy)]
struct Cached {
    price: f64,
    fetched_at: Instant,
}

pub struct PriceCache {
    source: Arc<dyn PriceSource>,
    ttl: Duration,
    timeout: Duration,
    fallback: f64,
    cached: Mutex<Option<Cached>>,
}

impl std::fmt::Debug for PriceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceCache")
            .field("ttl", &self.ttl)
            .field("timeout", &self.timeout)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl PriceCache {
    pub fn new(source: Arc<dyn PriceSource>) -> PriceCache {
        PriceCache::with_settings(source, DEFAULT_TTL, DEFAULT_FETCH_TIMEOUT, DEFAULT_SOL_USD)
    }

    pub fn with_settings(
        source: Arc<dyn PriceSource>,
        ttl: Duration,
        timeout: Duration,
        fallback: f64,
    ) -> PriceCache {
        PriceCache {
            source,
            ttl,
            timeout,
            fallback,
            cached: Mutex::new(None),
        }
    }

    /// Current SOL/USD price. Never fails.
    pub async fn sol_usd(&self) -> f64 {
        let mut cached = self.cached.lock().await;
        if let Some(c) = *cached {
            if c.fetched_at.elapsed() < self.ttl {
                return c.price;
            }
        }

        match tokio::time::timeout(self.timeout, self.source.sol_usd()).await {
            Ok(Ok(price)) if price.is_finite() && price > 0.0 => {
                *cached = Some(Cached {
                    price,
                    fetched_at: Instant::now(),
                });
                price
            }
            Ok(Ok(price)) => {
                log::warn!("price source returned unusable SOL/USD price {price}");
                self.last_good(&cached)
            }
            Ok(Err(e)) => {
                log::warn!("failed to fetch SOL/USD price: {e}");
                self.last_good(&cached)
            }
            Err(_) => {
                log::warn!("SOL/USD price fetch timed out after {:?}", self.timeout);
                self.last_good(&cached)
            }
        }
    }

    fn last_good(&self, cached: &Option<Cached>) -> f64 {
        cached.map(|c| c.price).unwrap_or(self.fallback)
    }
}

/// A source that always answers with the same price.
#[derive(Debug, Clone, Copy)]
pub struct StaticPrice(pub f64);

#[async_trait]
impl PriceSource for StaticPrice {
    async fn sol_usd(&self) -> Result<f64> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GungnirError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        answers: std::sync::Mutex<Vec<Option<f64>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(mut answers: Vec<Option<f64>>) -> Arc<Scripted> {
            answers.reverse();
            Arc::new(Scripted {
                answers: std::sync::Mutex::new(answers),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PriceSource for Scripted {
        async fn sol_usd(&self) -> Result<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answers.lock().unwrap().pop().flatten() {
                Some(p) => Ok(p),
                None => Err(GungnirError::Upstream("price api down".into())),
            }
        }
    }

    struct Hanging;

    #[async_trait]
    impl PriceSource for Hanging {
        async fn sol_usd(&self) -> Result<f64> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(1.0)
        }
    }

    #[tokio::test]
    async fn serves_cached_price_within_ttl() {
        let source = Scripted::new(vec![Some(150.0), Some(200.0)]);
        let cache = PriceCache::new(source.clone());
        assert_eq!(cache.sol_usd().await, 150.0);
        assert_eq!(cache.sol_usd().await, 150.0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn falls_back_to_last_good_price() {
        let source = Scripted::new(vec![Some(150.0), None]);
        let cache = PriceCache::with_settings(
            source.clone(),
            Duration::ZERO,
            DEFAULT_FETCH_TIMEOUT,
            DEFAULT_SOL_USD,
        );
        assert_eq!(cache.sol_usd().await, 150.0);
        assert_eq!(cache.sol_usd().await, 150.0);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn falls_back_to_default_without_history() {
        let cache = PriceCache::new(Scripted::new(vec![None]));
        assert_eq!(cache.sol_usd().await, DEFAULT_SOL_USD);
    }

    #[tokio::test]
    async fn slow_source_times_out() {
        let cache = PriceCache::with_settings(
            Arc::new(Hanging),
            DEFAULT_TTL,
            Duration::from_millis(20),
            42.0,
        );
        assert_eq!(cache.sol_usd().await, 42.0);
    }
}
