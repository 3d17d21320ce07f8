use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::sync::Cache;

use crate::aircraft_service::{AircraftResult, AircraftService};
use crate::analytics::*;
use crate::config::AnalyticsConfig;

/// Cache keys for the ranking queries. The service generation is part of the
/// key, so any write makes earlier entries unreachable.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
enum CacheKey {
    TopAircraft(usize, u64),
    TopOperators(usize, u64),
}

/// Cached long-flight rankings over the aircraft service
#[derive(Clone)]
pub struct AnalyticsCache {
    service: Arc<AircraftService>,
    config: AnalyticsConfig,
    top_aircraft_cache: Cache<CacheKey, Vec<Output>>,
    top_operators_cache: Cache<CacheKey, Vec<RankedOperator>>,
}

impl AnalyticsCache {
    pub fn new(service: Arc<AircraftService>, config: AnalyticsConfig) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_secs);

        Self {
            service,
            top_aircraft_cache: Cache::builder().max_capacity(50).time_to_live(ttl).build(),
            top_operators_cache: Cache::builder().max_capacity(50).time_to_live(ttl).build(),
            config,
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn get_top_aircraft(&self, requested: Option<usize>) -> AircraftResult<Vec<Output>> {
        let start = Instant::now();
        let n = self.config.resolve_top_n(requested);
        let key = CacheKey::TopAircraft(n.get(), self.service.generation());

        if let Some(cached) = self.top_aircraft_cache.get(&key) {
            metrics::counter!("analytics.cache.hit").increment(1);
            return Ok(cached);
        }

        metrics::counter!("analytics.cache.miss").increment(1);
        let result = top_n_by_long_flight_percentage(
            self.service.store(),
            self.config.long_flight_threshold_secs,
            n,
        )?;
        self.top_aircraft_cache.insert(key, result.clone());

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("analytics.query.top_aircraft_ms").record(duration_ms);
        Ok(result)
    }

    pub fn get_top_operators(
        &self,
        requested: Option<usize>,
    ) -> AircraftResult<Vec<RankedOperator>> {
        let start = Instant::now();
        let n = self.config.resolve_top_n(requested);
        let key = CacheKey::TopOperators(n.get(), self.service.generation());

        if let Some(cached) = self.top_operators_cache.get(&key) {
            metrics::counter!("analytics.cache.hit").increment(1);
            return Ok(cached);
        }

        metrics::counter!("analytics.cache.miss").increment(1);
        let result = top_operators(
            self.service.store(),
            self.config.long_flight_threshold_secs,
            n,
        )?;
        self.top_operators_cache.insert(key, result.clone());

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("analytics.query.top_operators_ms").record(duration_ms);
        Ok(result)
    }
}
