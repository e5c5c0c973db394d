use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};

use crate::config::ClientConfig;
use crate::errors::{ClientError, ClientResult};
use crate::load_balancer::server::Server;
use crate::load_balancer::strategies::{self, LoadBalancingStrategy};
use crate::load_balancer::tracker::{ServerStats, ServerTracker};

/// Client-side load balancer consulted once per attempt
///
/// Implementations own their server list and its synchronisation; callers
/// only ask for a server and report how the attempt went.
pub trait LoadBalancer {
    /// Pick a live server, `None` when nothing is reachable
    fn choose_server(&self, key: Option<&str>) -> Option<Server>;
    /// Take a server out of rotation
    fn mark_server_down(&self, server: &Server);
    /// Servers currently considered alive
    fn reachable_servers(&self) -> Vec<Server>;
    /// Note that an attempt against `server` started
    fn record_start(&self, _server: &Server) {}
    /// Report the outcome of an attempt against `server`
    fn record_result(&self, _server: &Server, _duration: Duration, _success: bool) {}
    /// End an attempt that failed before anything was sent to `server`
    fn record_release(&self, _server: &Server) {}
    /// Statistics snapshot, one entry per known server
    fn stats(&self) -> Vec<ServerStats> {
        Vec::new()
    }
}

/// Load balancer over a static server list
pub struct BaseLoadBalancer {
    name: String,
    trackers: Mutex<Vec<ServerTracker>>,
    strategy: Mutex<Box<dyn LoadBalancingStrategy + Send>>,
}

impl BaseLoadBalancer {
    pub fn new(name: impl Into<String>, servers: Vec<Server>, strategy: Box<dyn LoadBalancingStrategy + Send>) -> Self {
        let name = name.into();
        if servers.is_empty() {
            warn!("Load balancer '{}' created with no servers.", name);
        }
        Self {
            name,
            trackers: Mutex::new(servers.into_iter().map(ServerTracker::new).collect()),
            strategy: Mutex::new(strategy),
        }
    }

    /// Build from a client's resolved configuration (servers + strategy)
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let servers = config
            .servers
            .iter()
            .map(|entry| {
                entry.parse::<Server>().map_err(|e| {
                    ClientError::Configuration(format!(
                        "Invalid server '{}' for client {}: {}",
                        entry, config.client_name, e
                    ))
                })
            })
            .collect::<ClientResult<Vec<_>>>()?;
        let strategy = strategies::strategy_from_name(&config.strategy)?;
        Ok(Self::new(config.client_name.clone(), servers, strategy))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Put a server back into rotation
    pub fn mark_server_up(&self, server: &Server) {
        self.update(server, |tracker| tracker.alive = true);
    }

    /// Number of known servers, alive or not
    pub fn server_count(&self) -> usize {
        self.lock_trackers().len()
    }

    // Statistics are advisory; a poisoned lock still holds usable data.
    fn lock_trackers(&self) -> MutexGuard<'_, Vec<ServerTracker>> {
        self.trackers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update<F: FnOnce(&mut ServerTracker)>(&self, server: &Server, f: F) {
        let mut trackers = self.lock_trackers();
        if let Some(tracker) = trackers.iter_mut().find(|t| t.server == *server) {
            f(tracker);
        }
    }
}

impl LoadBalancer for BaseLoadBalancer {
    fn choose_server(&self, key: Option<&str>) -> Option<Server> {
        let trackers = self.lock_trackers();
        let candidates: Vec<&ServerTracker> = trackers.iter().filter(|t| t.alive).collect();
        if candidates.is_empty() {
            warn!("Load balancer '{}' has no live servers (key: {:?})", self.name, key);
            return None;
        }

        let index = {
            let mut strategy = self.strategy.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            strategy.select_server(&candidates)
        };
        let server = candidates[index].server.clone();
        debug!("Load balancer '{}' chose {} (key: {:?})", self.name, server, key);
        Some(server)
    }

    fn mark_server_down(&self, server: &Server) {
        warn!("Load balancer '{}' marking {} down", self.name, server);
        self.update(server, |tracker| tracker.alive = false);
    }

    fn reachable_servers(&self) -> Vec<Server> {
        self.lock_trackers()
            .iter()
            .filter(|t| t.alive)
            .map(|t| t.server.clone())
            .collect()
    }

    fn record_start(&self, server: &Server) {
        self.update(server, ServerTracker::record_start);
    }

    fn record_result(&self, server: &Server, duration: Duration, success: bool) {
        self.update(server, |tracker| tracker.record_result(duration, success));
    }

    fn record_release(&self, server: &Server) {
        self.update(server, ServerTracker::release);
    }

    fn stats(&self) -> Vec<ServerStats> {
        self.lock_trackers().iter().map(ServerTracker::stats).collect()
    }
}
