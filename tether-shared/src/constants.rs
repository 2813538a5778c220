//! Shared constants between the tether server and its clients
//!
//! Route shapes and protocol tokens must agree on both sides of the connection.

/// HTTP routes
pub mod routes {
    /// Liveness probe
    pub const PING: &str = "/ping";

    /// Process creation
    pub const PROCESSES: &str = "/processes";

    /// Raw stdout attach for a stream id
    pub const STREAM_STDOUT: &str = "/streams/{streamid}/stdout";

    /// Raw stderr attach for a stream id
    pub const STREAM_STDERR: &str = "/streams/{streamid}/stderr";

    /// Concrete stdout path for `id`.
    pub fn stdout_path(id: u32) -> String {
        format!("/streams/{}/stdout", id)
    }

    /// Concrete stderr path for `id`.
    pub fn stderr_path(id: u32) -> String {
        format!("/streams/{}/stderr", id)
    }
}

/// Connection upgrade protocol
pub mod upgrade {
    /// Token clients send in the `Upgrade` header to request a raw stream
    pub const PROTOCOL: &str = "tether-stream";
}

/// Output streaming defaults
pub mod streaming {
    /// Maximum bytes read from a process pipe per chunk
    pub const CHUNK_SIZE: usize = 1024;

    /// Default chunk capacity of each producer channel
    pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

    /// Default time a stopped stream stays drainable
    pub const DEFAULT_GRACE_TIME_MS: u64 = 10_000;
}

/// Network defaults
pub mod network {
    /// Default listen URI for the server
    pub const DEFAULT_LISTEN: &str = "tcp://127.0.0.1:7777";
}

#[cfg(test)]
mod tests {
    use super::routes;

    #[test]
    fn concrete_paths_match_route_shapes() {
        assert_eq!(
            routes::stdout_path(7),
            routes::STREAM_STDOUT.replace("{streamid}", "7")
        );
        assert_eq!(
            routes::stderr_path(7),
            routes::STREAM_STDERR.replace("{streamid}", "7")
        );
    }
}
