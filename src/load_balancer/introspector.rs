use std::collections::HashMap;

use log::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::constants;
use crate::errors::{ClientError, ClientResult};
use crate::load_balancer::server::Server;

const SECURE_METADATA_KEY: &str = "secure";

/// Inspects servers for facts the load balancer itself does not track
pub trait ServerIntrospector {
    /// Whether the server must be reached over a secure scheme
    fn is_secure(&self, server: &Server) -> bool;
    /// Metadata published for the server
    fn metadata(&self, server: &Server) -> HashMap<String, String>;
}

/// Treats a server as secure when it listens on one of the secure ports or
/// publishes `secure = "true"` in its metadata
#[derive(Debug, Clone)]
pub struct DefaultServerIntrospector {
    secure_ports: Vec<u16>,
}

impl DefaultServerIntrospector {
    pub fn new(secure_ports: Vec<u16>) -> Self {
        Self { secure_ports }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.secure_ports.clone())
    }
}

impl Default for DefaultServerIntrospector {
    fn default() -> Self {
        Self::new(constants::DEFAULT_SECURE_PORTS.to_vec())
    }
}

impl ServerIntrospector for DefaultServerIntrospector {
    fn is_secure(&self, server: &Server) -> bool {
        self.secure_ports.contains(&server.port())
            || self
                .metadata(server)
                .get(SECURE_METADATA_KEY)
                .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    fn metadata(&self, server: &Server) -> HashMap<String, String> {
        server.metadata().clone()
    }
}

/// The client's explicit `is_secure` setting wins over the introspector.
pub fn is_secure(config: &ClientConfig, introspector: &dyn ServerIntrospector, server: &Server) -> bool {
    config
        .is_secure
        .unwrap_or_else(|| introspector.is_secure(server))
}

fn secure_scheme_for(scheme: &str) -> Option<&'static str> {
    match scheme {
        "http" => Some("https"),
        "ws" => Some("wss"),
        _ => None,
    }
}

/// Upgrade `http`/`ws` to `https`/`wss` when the selected server is secure.
///
/// Everything else in the URI is left untouched; already secure or unknown
/// schemes come back as they are.
pub fn update_to_secure_connection_if_needed(
    original: &Url,
    config: &ClientConfig,
    introspector: &dyn ServerIntrospector,
    server: &Server,
) -> ClientResult<Url> {
    let Some(secure) = secure_scheme_for(original.scheme()) else {
        return Ok(original.clone());
    };
    if !is_secure(config, introspector, server) {
        return Ok(original.clone());
    }

    let mut upgraded = original.clone();
    upgraded.set_scheme(secure).map_err(|_| {
        ClientError::InvalidUri(format!("Cannot switch '{}' to {}", original, secure))
    })?;
    debug!("Upgraded {} to {} for secure server {}", original, upgraded, server);
    Ok(upgraded)
}
