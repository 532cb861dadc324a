pub mod network {
    pub const TIMEOUT_ATTACK_REQUEST_MS: u64 = 30_000;
    pub const TIMEOUT_CLUSTER_REQUEST_MS: u64 = 30_000;
}

pub mod pool {
    pub const DEFAULT_MAX_CLIENT_NUM: usize = 30;
}

pub mod protocol {
    pub const ATTACK_PATH: &str = "/api/attack";
    // Existing agents match on this exact header; the value itself carries no meaning.
    pub const TAG_HEADER: &str = "X-Custom-Header";
    pub const TAG_HEADER_VALUE: &str = "myvalue";
    pub const BEARER_PREFIX: &str = "Bearer ";
    pub const UID_KEY: &str = "uid";
}
