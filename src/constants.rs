/// This crate's version, reported to the remote service via a user-agent header.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const SDK_KEY_PROXY_PREFIX: &str = "configcat-proxy/";
pub const CONFIG_FILE_NAME: &str = "config_v6.json";
/// External-cache key prefix. Part of the shared-cache wire contract; must stay
/// byte-for-byte stable so caches written by other implementations are reused.
pub const CACHE_KEY_PREFIX: &str = "python_";

#[cfg(test)]
pub mod test_constants {
    pub const MOCK_PATH: &str = "/configuration-files/key/config_v6.json";
    pub const MOCK_KEY: &str = "key";
}
