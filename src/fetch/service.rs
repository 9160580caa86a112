use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{info, warn};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::builder::Options;
use crate::constants::{CACHE_KEY_PREFIX, CONFIG_FILE_NAME};
use crate::errors::ClientError;
use crate::fetch::fetcher::{FetchResponse, Fetcher};
use crate::hooks::Hooks;
use crate::model::config::{entry_from_cached_json, Config, ConfigEntry};
use crate::model::enums::DataGovernance;
use crate::modes::PollingMode;
use crate::utils::sha1;

/// Describes the availability of the config JSON data a [`crate::Client`] currently has access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCacheState {
    /// No config JSON is available yet, neither from the cache nor from the network.
    NoFlagData,
    /// A config JSON is available, but it may not be up to date (e.g. it came from the cache and is stale).
    HasCachedFlagDataOnly,
    /// An up-to-date config JSON is available.
    HasUpToDateFlagData,
}

pub enum ServiceResult {
    Ok(ConfigResult),
    Err(ClientError, ConfigResult),
}

pub struct ConfigResult {
    config: Arc<Config>,
    fetch_time: DateTime<Utc>,
}

impl ConfigResult {
    fn new(config: Arc<Config>, fetch_time: DateTime<Utc>) -> Self {
        Self { config, fetch_time }
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn fetch_time(&self) -> &DateTime<Utc> {
        &self.fetch_time
    }
}

struct ServiceState {
    fetcher: Fetcher,
    cached_entry: Arc<tokio::sync::Mutex<ConfigEntry>>,
    cache_key: String,
    offline: AtomicBool,
    initialized: AtomicBool,
    init: Once,
    init_wait: Semaphore,
}

impl ServiceState {
    fn initialized(&self, hooks: &Hooks) {
        self.init.call_once(|| {
            self.initialized.store(true, Ordering::SeqCst);
            self.init_wait.add_permits(1);
            hooks.invoke_on_ready();
        });
    }
}

pub struct ConfigService {
    state: Arc<ServiceState>,
    options: Arc<Options>,
    cancellation_token: CancellationToken,
    close: Once,
}

impl ConfigService {
    const GLOBAL_CDN_URL: &'static str = "https://cdn-global.configcat.com";
    const EU_CDN_URL: &'static str = "https://cdn-eu.configcat.com";

    pub fn new(opts: Arc<Options>) -> Result<Self, ClientError> {
        let url = if let Some(base_url) = opts.base_url() {
            base_url.to_owned()
        } else {
            match *opts.data_governance() {
                DataGovernance::Global => Self::GLOBAL_CDN_URL.to_owned(),
                DataGovernance::Eu => Self::EU_CDN_URL.to_owned(),
            }
        };
        let fetcher = Fetcher::new(
            url,
            opts.base_url().is_some(),
            opts.sdk_key(),
            opts.polling_mode().mode_identifier(),
            *opts.http_timeout(),
        );
        let service = Self {
            state: Arc::new(ServiceState {
                cache_key: sha1(
                    format!("{CACHE_KEY_PREFIX}{CONFIG_FILE_NAME}_{}", opts.sdk_key()).as_str(),
                ),
                fetcher,
                offline: AtomicBool::new(opts.offline()),
                initialized: AtomicBool::new(false),
                init: Once::new(),
                init_wait: Semaphore::new(0),
                cached_entry: Arc::new(tokio::sync::Mutex::new(ConfigEntry::default())),
            }),
            options: opts,
            cancellation_token: CancellationToken::new(),
            close: Once::new(),
        };
        match service.options.polling_mode() {
            PollingMode::AutoPoll(interval) if !service.options.offline() => {
                service.start_poll(*interval);
            }
            _ => service.state.initialized(service.options.hooks()),
        }
        Ok(service)
    }

    pub async fn config(&self) -> ConfigResult {
        let initialized = self.state.initialized.load(Ordering::SeqCst);
        let threshold = match self.options.polling_mode() {
            PollingMode::LazyLoad(cache_ttl) => Utc::now() - *cache_ttl,
            PollingMode::AutoPoll(interval) if !initialized => Utc::now() - *interval,
            _ => DateTime::<Utc>::MIN_UTC,
        };
        let prefer_cached = match self.options.polling_mode() {
            PollingMode::LazyLoad(_) => false,
            _ => initialized,
        };
        let result = fetch_if_older(&self.state, &self.options, threshold, prefer_cached).await;
        match result {
            ServiceResult::Ok(config_result) | ServiceResult::Err(_, config_result) => {
                config_result
            }
        }
    }

    pub async fn refresh(&self) -> Result<(), ClientError> {
        let result =
            fetch_if_older(&self.state, &self.options, DateTime::<Utc>::MAX_UTC, false).await;
        match result {
            ServiceResult::Ok(_) => Ok(()),
            ServiceResult::Err(err, _) => Err(err),
        }
    }

    pub fn close(&self) {
        self.close.call_once(|| self.cancellation_token.cancel());
    }

    pub fn set_mode(&self, offline: bool) {
        let previous = self.state.offline.swap(offline, Ordering::SeqCst);
        if previous != offline {
            let mode = if offline { "OFFLINE" } else { "ONLINE" };
            info!(event_id = 5200; "Switched to {mode} mode.");
        }
    }

    pub fn is_offline(&self) -> bool {
        self.state.offline.load(Ordering::SeqCst)
    }

    pub async fn wait_for_init(&self) -> ClientCacheState {
        if !self.state.initialized.load(Ordering::SeqCst) {
            _ = self.state.init_wait.acquire().await;
        }
        self.determine_cache_state().await
    }

    async fn determine_cache_state(&self) -> ClientCacheState {
        let mut entry = self.state.cached_entry.lock().await;

        if let PollingMode::AutoPoll(interval) = self.options.polling_mode() {
            if !entry.is_empty() && Utc::now() - entry.fetch_time < *interval {
                return ClientCacheState::HasUpToDateFlagData;
            }
            return if entry.is_empty() {
                ClientCacheState::NoFlagData
            } else {
                ClientCacheState::HasCachedFlagDataOnly
            };
        }

        let from_cache =
            read_cache(&self.state, &self.options, &entry.config_json).unwrap_or_default();
        if !from_cache.is_empty() && *entry != from_cache {
            *entry = from_cache;
        }
        if let PollingMode::LazyLoad(interval) = self.options.polling_mode() {
            if !entry.is_empty() && Utc::now() - entry.fetch_time < *interval {
                return ClientCacheState::HasUpToDateFlagData;
            }
        }
        if entry.is_empty() {
            ClientCacheState::NoFlagData
        } else {
            ClientCacheState::HasCachedFlagDataOnly
        }
    }

    fn start_poll(&self, interval: Duration) {
        let state = Arc::clone(&self.state);
        let opts = Arc::clone(&self.options);
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            let mut int = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = int.tick() => {
                        fetch_if_older(&state, &opts, Utc::now() - (interval / 2), false).await;
                    },
                    () = token.cancelled() => break
                }
            }
        });
    }
}

impl Drop for ConfigService {
    fn drop(&mut self) {
        self.close();
    }
}

async fn fetch_if_older(
    state: &Arc<ServiceState>,
    options: &Arc<Options>,
    threshold: DateTime<Utc>,
    prefer_cached: bool,
) -> ServiceResult {
    let mut entry = state.cached_entry.lock().await;

    let from_cache = read_cache(state, options, &entry.config_json).unwrap_or_default();

    if !from_cache.is_empty() && *entry != from_cache {
        *entry = from_cache;
        options
            .hooks()
            .invoke_on_config_changed(&entry.config.settings);
    }

    if entry.fetch_time > threshold || state.offline.load(Ordering::SeqCst) || prefer_cached {
        state.initialized(options.hooks());
        return ServiceResult::Ok(ConfigResult::new(entry.config.clone(), entry.fetch_time));
    }

    let response = state.fetcher.fetch(&entry.etag).await;
    state.initialized(options.hooks());
    match response {
        FetchResponse::Fetched(new_entry) => {
            *entry = new_entry;
            options
                .hooks()
                .invoke_on_config_changed(&entry.config.settings);
            options
                .cache()
                .write(&state.cache_key, entry.serialize().as_str());
            ServiceResult::Ok(ConfigResult::new(entry.config.clone(), entry.fetch_time))
        }
        FetchResponse::NotModified => {
            *entry = entry.with_time(Utc::now());
            options
                .cache()
                .write(&state.cache_key, entry.serialize().as_str());
            ServiceResult::Ok(ConfigResult::new(entry.config.clone(), entry.fetch_time))
        }
        FetchResponse::Failed(err, transient) => {
            options.hooks().invoke_on_error(err.to_string().as_str());
            if !transient && !entry.is_empty() {
                *entry = entry.with_time(Utc::now());
                options
                    .cache()
                    .write(&state.cache_key, entry.serialize().as_str());
            }
            ServiceResult::Err(
                err,
                ConfigResult::new(entry.config.clone(), entry.fetch_time),
            )
        }
    }
}

fn read_cache(
    state: &Arc<ServiceState>,
    options: &Arc<Options>,
    from_memory_str: &str,
) -> Option<ConfigEntry> {
    let from_cache_str = options.cache().read(&state.cache_key).unwrap_or_default();
    if from_cache_str.is_empty() || from_cache_str.as_str() == from_memory_str {
        return None;
    }
    let parsed = entry_from_cached_json(from_cache_str.as_str());
    match parsed {
        Ok(entry) => Some(entry),
        Err(err) => {
            warn!(event_id = 2200; "Error occurred while reading the cache. ({err})");
            None
        }
    }
}
