use log::debug;
use rand::Rng;

use crate::errors::{ClientError, ClientResult};
use crate::load_balancer::tracker::ServerTracker;

/// Trait defining the interface for server selection strategies
///
/// Implementations of this trait determine which live server receives
/// the next request.
pub trait LoadBalancingStrategy {
    /// Select a server from the live candidates
    ///
    /// # Parameters
    /// * `candidates` - Trackers of the servers currently considered alive
    ///
    /// # Returns
    /// * Index into the candidates slice of the selected server
    fn select_server(&mut self, candidates: &[&ServerTracker]) -> usize;
}

/// Strategy that walks the candidates in order, wrapping around
#[derive(Debug, Default)]
pub struct RoundRobinStrategy {
    next: usize,
}

impl RoundRobinStrategy {
    /// Creates a new RoundRobinStrategy
    pub fn new() -> Self {
        Self { next: 0 }
    }
}

impl LoadBalancingStrategy for RoundRobinStrategy {
    /// # Panics
    /// Panics if `candidates` is empty
    fn select_server(&mut self, candidates: &[&ServerTracker]) -> usize {
        if candidates.is_empty() {
            panic!("RoundRobinStrategy::select_server called with empty candidates slice");
        }

        let index = self.next % candidates.len();
        self.next = self.next.wrapping_add(1);

        debug!(
            "RoundRobinStrategy: Selected index {} ({}) from {} live servers",
            index, candidates[index].server, candidates.len()
        );

        index
    }
}

/// Strategy that selects a random server from the live pool.
#[derive(Debug, Default)]
pub struct RandomStrategy;

impl RandomStrategy {
    /// Creates a new RandomStrategy
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancingStrategy for RandomStrategy {
    /// # Panics
    /// * Panics if `candidates` is empty.
    fn select_server(&mut self, candidates: &[&ServerTracker]) -> usize {
        if candidates.is_empty() {
            panic!("RandomStrategy::select_server called with empty candidates slice");
        }

        let index = rand::rng().random_range(0..candidates.len());

        debug!(
            "RandomStrategy: Selected random index {} ({}) from {} live servers",
            index, candidates[index].server, candidates.len()
        );

        index
    }
}

/// Build a strategy from its configuration name
pub fn strategy_from_name(name: &str) -> ClientResult<Box<dyn LoadBalancingStrategy + Send>> {
    match name.to_lowercase().as_str() {
        "round_robin" => Ok(Box::new(RoundRobinStrategy::new())),
        "random" => Ok(Box::new(RandomStrategy::new())),
        other => Err(ClientError::Configuration(format!(
            "Unknown strategy '{}'",
            other
        ))),
    }
}
