//! Server settings read from the environment.

use camel_core::GameConfig;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_BOT_DELAY_MS: u64 = 1500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on (`SERVER_ADDR`)
    pub addr: SocketAddr,
    /// Pause before a bot acts (`CAMEL_BOT_DELAY_MS`)
    pub bot_delay: Duration,
    /// Rules for every game hosted by this server
    /// (`CAMEL_DEBUG_ROLLS`, `CAMEL_STARTING_COINS`)
    pub game: GameConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = parse_or(&lookup, "SERVER_ADDR", || {
            DEFAULT_ADDR.parse().map_err(|_| ConfigError::Invalid {
                key: "SERVER_ADDR",
                value: DEFAULT_ADDR.to_string(),
            })
        })?;
        let bot_delay_ms = parse_or(&lookup, "CAMEL_BOT_DELAY_MS", || Ok(DEFAULT_BOT_DELAY_MS))?;
        let starting_coins = parse_or(&lookup, "CAMEL_STARTING_COINS", || Ok(0))?;

        let allow_forced_rolls = match lookup("CAMEL_DEBUG_ROLLS").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "CAMEL_DEBUG_ROLLS",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            addr,
            bot_delay: Duration::from_millis(bot_delay_ms),
            game: GameConfig {
                starting_coins,
                allow_forced_rolls,
            },
        })
    }
}

fn parse_or<F, T, D>(lookup: &F, key: &'static str, default: D) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    D: FnOnce() -> Result<T, ConfigError>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.bot_delay, Duration::from_millis(1500));
        assert_eq!(config.game, GameConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SERVER_ADDR", "127.0.0.1:9000"),
            ("CAMEL_BOT_DELAY_MS", "0"),
            ("CAMEL_DEBUG_ROLLS", "true"),
            ("CAMEL_STARTING_COINS", "3"),
        ])
        .unwrap();

        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.bot_delay, Duration::ZERO);
        assert!(config.game.allow_forced_rolls);
        assert_eq!(config.game.starting_coins, 3);
    }

    #[test]
    fn test_bad_values_rejected() {
        assert_eq!(
            config_from(&[("CAMEL_BOT_DELAY_MS", "soon")]),
            Err(ConfigError::Invalid {
                key: "CAMEL_BOT_DELAY_MS",
                value: "soon".to_string()
            })
        );
        assert!(config_from(&[("CAMEL_DEBUG_ROLLS", "maybe")]).is_err());
        assert!(config_from(&[("SERVER_ADDR", "nowhere")]).is_err());
    }
}
