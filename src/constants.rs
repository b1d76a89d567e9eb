pub mod network {
    pub const TIMEOUT_REQUEST_MS: u64 = 30_000;
    pub const MAX_REDIRECTS: usize = 10;
    pub const USER_AGENT: &str = concat!("reqlab/", env!("CARGO_PKG_VERSION"));
    /// Methods whose body is never transmitted.
    pub const BODYLESS_METHODS: &[&str] = &["GET", "HEAD", "OPTIONS"];
}

pub mod history {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 500;
}

pub mod share {
    pub const TOKEN_BYTES: usize = 24;
}

pub mod limits {
    pub const LOG_SUBSTRING_LENGTH: usize = 200;
    pub const MAX_NAME_LENGTH: usize = 200;
}

pub mod storage {
    pub const DB_FILE_NAME: &str = "reqlab.db";
    pub const APP_DIR_NAME: &str = "reqlab";
}
