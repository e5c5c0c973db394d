use std::time::{Duration, Instant};

use crate::constants;
use crate::load_balancer::server::Server;

/// A server with its health flag and call statistics
#[derive(Debug, Clone)]
pub struct ServerTracker {
    pub server: Server,
    pub alive: bool,
    pub last_used: Instant,
    pub response_times: Vec<Duration>,
    pub active_requests: usize,
    pub request_count: usize,
    pub error_count: usize,
}

impl ServerTracker {
    /// Create a tracker for a server, initially alive
    pub fn new(server: Server) -> Self {
        Self {
            server,
            alive: true,
            last_used: Instant::now(),
            response_times: Vec::new(),
            active_requests: 0,
            request_count: 0,
            error_count: 0,
        }
    }

    /// Note that a request was sent to this server
    pub fn record_start(&mut self) {
        self.last_used = Instant::now();
        self.active_requests += 1;
    }

    /// Record the outcome of a request for load balancer statistics
    ///
    /// # Parameters
    /// * `duration` - How long the request took
    /// * `success` - Whether the server answered with a successful response
    pub fn record_result(&mut self, duration: Duration, success: bool) {
        self.active_requests = self.active_requests.saturating_sub(1);
        self.request_count += 1;

        if success {
            self.response_times.push(duration);
            if self.response_times.len() > constants::RESPONSE_TIME_WINDOW {
                self.response_times.remove(0);
            }
        } else {
            self.error_count += 1;
        }
    }

    /// Drop an in-flight request that never reached the server
    pub fn release(&mut self) {
        self.active_requests = self.active_requests.saturating_sub(1);
    }

    /// Calculate the average response time from recent successful requests
    ///
    /// # Returns
    /// * Average duration, or zero if no requests recorded
    pub fn avg_response_time(&self) -> Duration {
        if self.response_times.is_empty() {
            return Duration::from_millis(0);
        }
        let total: Duration = self.response_times.iter().sum();
        total / self.response_times.len() as u32
    }

    /// Calculate the error rate as a percentage
    ///
    /// # Returns
    /// * Error rate from 0.0 to 100.0, or 0.0 if no requests
    pub fn error_rate(&self) -> f64 {
        if self.request_count > 0 {
            (self.error_count as f64 / self.request_count as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Snapshot of this tracker's statistics
    pub fn stats(&self) -> ServerStats {
        ServerStats {
            server: self.server.host_port(),
            alive: self.alive,
            active_requests: self.active_requests,
            request_count: self.request_count,
            error_count: self.error_count,
            error_rate: self.error_rate(),
            avg_response_time: self.avg_response_time(),
        }
    }
}

/// Per-server statistics as seen by the load balancer
#[derive(Debug, Clone, PartialEq)]
pub struct ServerStats {
    pub server: String,
    pub alive: bool,
    pub active_requests: usize,
    pub request_count: usize,
    pub error_count: usize,
    pub error_rate: f64,
    pub avg_response_time: Duration,
}
