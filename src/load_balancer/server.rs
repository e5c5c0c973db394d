use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A physical server a logical client name resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    host: String,
    port: u16,
    zone: Option<String>,
    metadata: HashMap<String, String>,
}

impl Server {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            zone: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// "host:port", the server's identity in stats and logs
    pub fn host_port(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host_port())
    }
}

/// Parses "host:port", "[v6]:port", or a bare host (port 80).
impl FromStr for Server {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty server entry".to_string());
        }

        if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| format!("unterminated IPv6 host in '{}'", s))?;
            let port = match tail.strip_prefix(':') {
                Some(port) => parse_port(port)?,
                None if tail.is_empty() => 80,
                None => return Err(format!("unexpected '{}' after IPv6 host", tail)),
            };
            return Ok(Server::new(host, port));
        }

        match s.rsplit_once(':') {
            Some((host, _)) if host.contains(':') => {
                Err(format!("IPv6 host '{}' must be written in brackets", s))
            }
            Some((host, port)) if !host.is_empty() => Ok(Server::new(host, parse_port(port)?)),
            Some(_) => Err(format!("missing host in '{}'", s)),
            None => Ok(Server::new(s, 80)),
        }
    }
}

fn parse_port(port: &str) -> Result<u16, String> {
    port.parse::<u16>()
        .map_err(|_| format!("invalid port '{}'", port))
}
