use std::{env, fmt, fs, net::SocketAddr, path::Path};

use crate::{errors::Error, Result};

const DEFAULT_KEEPALIVE_ADDR: &str = "0.0.0.0:8080";

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone)]
pub struct Config {
    pub bot_token: String,

    // Keep-alive HTTP endpoint
    pub keepalive_enabled: bool,
    pub keepalive_addr: SocketAddr,

    // Telegram adapter
    pub retry_on_flood: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup("BOT_TOKEN")
            .and_then(non_empty)
            .or_else(|| lookup("TELEGRAM_BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("BOT_TOKEN environment variable is required".to_string())
            })?;

        let keepalive_enabled = parse_bool(lookup("KEEPALIVE_ENABLED")).unwrap_or(true);
        let raw_addr = lookup("KEEPALIVE_ADDR")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_KEEPALIVE_ADDR.to_string());
        let keepalive_addr = raw_addr.trim().parse::<SocketAddr>().map_err(|e| {
            Error::Config(format!("KEEPALIVE_ADDR is not a socket address ({raw_addr}): {e}"))
        })?;

        let retry_on_flood = parse_bool(lookup("DELIVERY_RETRY_ON_FLOOD")).unwrap_or(true);

        Ok(Self {
            bot_token: bot_token.trim().to_string(),
            keepalive_enabled,
            keepalive_addr,
            retry_on_flood,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &format_args!("<{} chars>", self.bot_token.len()))
            .field("keepalive_enabled", &self.keepalive_enabled)
            .field("keepalive_addr", &self.keepalive_addr)
            .field("retry_on_flood", &self.retry_on_flood)
            .finish()
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let map = vars(pairs);
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn missing_token_is_fatal() {
        assert!(matches!(load(&[]), Err(Error::Config(_))));
        assert!(matches!(load(&[("BOT_TOKEN", "   ")]), Err(Error::Config(_))));
    }

    #[test]
    fn defaults() {
        let cfg = load(&[("BOT_TOKEN", "123:abc")]).unwrap();
        assert_eq!(cfg.bot_token, "123:abc");
        assert!(cfg.keepalive_enabled);
        assert_eq!(cfg.keepalive_addr, "0.0.0.0:8080".parse().unwrap());
        assert!(cfg.retry_on_flood);
    }

    #[test]
    fn telegram_token_is_a_fallback() {
        let cfg = load(&[("TELEGRAM_BOT_TOKEN", "t")]).unwrap();
        assert_eq!(cfg.bot_token, "t");
    }

    #[test]
    fn keepalive_overrides() {
        let cfg = load(&[
            ("BOT_TOKEN", "t"),
            ("KEEPALIVE_ENABLED", "off"),
            ("KEEPALIVE_ADDR", "127.0.0.1:9000"),
            ("DELIVERY_RETRY_ON_FLOOD", "0"),
        ])
        .unwrap();
        assert!(!cfg.keepalive_enabled);
        assert_eq!(cfg.keepalive_addr.port(), 9000);
        assert!(!cfg.retry_on_flood);

        assert!(matches!(
            load(&[("BOT_TOKEN", "t"), ("KEEPALIVE_ADDR", "nope")]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = load(&[("BOT_TOKEN", "super-secret")]).unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<12 chars>"));
    }

    #[test]
    fn dotenv_parsing() {
        let parsed = parse_dotenv("# comment\nBOT_TOKEN=\"abc\"\n\nKEEPALIVE_ADDR = '1.2.3.4:5'\nbroken\n");
        assert_eq!(
            parsed,
            vec![
                ("BOT_TOKEN".to_string(), "abc".to_string()),
                ("KEEPALIVE_ADDR".to_string(), "1.2.3.4:5".to_string()),
            ]
        );
    }
}
