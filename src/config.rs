//! Environment configuration.

use std::env;
use std::time::Duration;

use chat_api::{ChatApiConfig, DEFAULT_BASE_URL};

pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub log_filter: Option<String>,
    pub debug: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: None,
            log_filter: None,
            debug: false,
        }
    }
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_string_opt("STREAM_TRANSCRIPT_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            timeout: env_u64_opt("STREAM_TRANSCRIPT_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            log_filter: env_string_opt("STREAM_TRANSCRIPT_LOG"),
            debug: env_flag("STREAM_TRANSCRIPT_DEBUG"),
        }
    }

    /// Filter directive for the log subscriber; debug mode wins.
    pub fn log_directive(&self) -> &str {
        if self.debug {
            return "debug";
        }
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    pub fn api_config(&self) -> ChatApiConfig {
        let config = ChatApiConfig::new(self.base_url.trim());
        match self.timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config,
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_u64_opt(key: &str) -> Option<u64> {
    env_string_opt(key).and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::EnvConfig;
    use std::env;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults_point_at_local_backend() {
        let _lock = env_lock();
        let _g1 = set_env_guard("STREAM_TRANSCRIPT_BASE_URL", None);
        let _g2 = set_env_guard("STREAM_TRANSCRIPT_TIMEOUT_SECS", None);
        let _g3 = set_env_guard("STREAM_TRANSCRIPT_LOG", None);
        let _g4 = set_env_guard("STREAM_TRANSCRIPT_DEBUG", None);

        let config = EnvConfig::from_env();
        assert_eq!(config.base_url, "http://127.0.0.1:5006");
        assert!(config.timeout.is_none());
        assert_eq!(config.log_directive(), "info");
        assert!(!config.debug);
    }

    #[test]
    fn env_values_are_applied() {
        let _lock = env_lock();
        let _g1 = set_env_guard("STREAM_TRANSCRIPT_BASE_URL", Some("http://chat.local:8080"));
        let _g2 = set_env_guard("STREAM_TRANSCRIPT_TIMEOUT_SECS", Some("30"));
        let _g3 = set_env_guard("STREAM_TRANSCRIPT_LOG", Some("stream_transcript=trace"));
        let _g4 = set_env_guard("STREAM_TRANSCRIPT_DEBUG", None);

        let config = EnvConfig::from_env();
        assert_eq!(config.base_url, "http://chat.local:8080");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.log_directive(), "stream_transcript=trace");

        let api = config.api_config();
        assert_eq!(api.base_url, "http://chat.local:8080");
        assert_eq!(api.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn debug_flag_overrides_log_filter() {
        let _lock = env_lock();
        let _g1 = set_env_guard("STREAM_TRANSCRIPT_LOG", Some("warn"));
        let _g2 = set_env_guard("STREAM_TRANSCRIPT_DEBUG", Some("1"));

        let config = EnvConfig::from_env();
        assert!(config.debug);
        assert_eq!(config.log_directive(), "debug");
    }

    #[test]
    fn invalid_or_zero_timeout_is_ignored() {
        let _lock = env_lock();
        {
            let _g = set_env_guard("STREAM_TRANSCRIPT_TIMEOUT_SECS", Some("soon"));
            assert!(EnvConfig::from_env().timeout.is_none());
        }
        let _g = set_env_guard("STREAM_TRANSCRIPT_TIMEOUT_SECS", Some("0"));
        assert!(EnvConfig::from_env().timeout.is_none());
    }
}
