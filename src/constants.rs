// Timeouts
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10_000;

// Retries
pub const DEFAULT_MAX_AUTO_RETRIES: usize = 0;
pub const DEFAULT_MAX_AUTO_RETRIES_NEXT_SERVER: usize = 1;
pub const DEFAULT_OK_TO_RETRY_ON_ALL_OPERATIONS: bool = false;

// Servers
pub const DEFAULT_SECURE_PORTS: [u16; 2] = [443, 8443];
pub const DEFAULT_STRATEGY: &str = "round_robin";
pub const RESPONSE_TIME_WINDOW: usize = 10;

// Fallback wrapping
pub const METHOD_KEY_SEPARATOR: &str = "#";
