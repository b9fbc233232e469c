use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_DB_URL: &str = "sqlite://console.db?mode=rwc";

/// 控制台配置，来自 `.env` 与环境变量
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub leave_api_url: String,
    pub proxy: Option<String>,
    pub timeout: Duration,
    pub db_url: String,
    pub session_file: Option<PathBuf>,
    pub download_dir: PathBuf,
    pub leave_page_size: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            leave_api_url: format!("{}/leave-requests", DEFAULT_API_URL),
            proxy: None,
            timeout: Duration::from_secs(30),
            db_url: DEFAULT_DB_URL.to_string(),
            session_file: None,
            download_dir: PathBuf::from("."),
            leave_page_size: 10,
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// 可注入的取值函数，便于测试
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = ConsoleConfig::default();

        let api_url = get("ADMIN_API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        let leave_api_url = get("LEAVE_API_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("{}/leave-requests", api_url));
        let proxy = get("ADMIN_API_PROXY").map(|p| {
            if p.contains("://") {
                p
            } else {
                format!("socks5h://{}", p)
            }
        });
        let timeout = get("ADMIN_API_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let leave_page_size = get("LEAVE_PAGE_SIZE")
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.leave_page_size);

        Self {
            api_url,
            leave_api_url,
            proxy,
            timeout,
            db_url: get("CONSOLE_DB_URL").unwrap_or(defaults.db_url),
            session_file: get("ADMIN_SESSION_FILE").map(PathBuf::from),
            download_dir: get("BACKUP_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            leave_page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_point_at_local_backend() {
        let cfg = ConsoleConfig::from_lookup(|_| None);
        assert_eq!(cfg, ConsoleConfig::default());
        assert_eq!(cfg.leave_api_url, "http://localhost:5000/leave-requests");
    }

    #[test]
    fn leave_url_follows_api_url() {
        let cfg = ConsoleConfig::from_lookup(lookup(&[("ADMIN_API_URL", "https://att.example.edu/api/")]));
        assert_eq!(cfg.api_url, "https://att.example.edu/api");
        assert_eq!(cfg.leave_api_url, "https://att.example.edu/api/leave-requests");
    }

    #[test]
    fn proxy_scheme_and_bad_numbers() {
        let cfg = ConsoleConfig::from_lookup(lookup(&[
            ("ADMIN_API_PROXY", "127.0.0.1:1080"),
            ("ADMIN_API_TIMEOUT_SECS", "0"),
            ("LEAVE_PAGE_SIZE", "abc"),
            ("LEAVE_API_URL", "http://leave:7000"),
        ]));
        assert_eq!(cfg.proxy.as_deref(), Some("socks5h://127.0.0.1:1080"));
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.leave_page_size, 10);
        assert_eq!(cfg.leave_api_url, "http://leave:7000");
    }
}
