use anyhow::{Context, Result};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SUGGEST_BASE: &str = "https://v3.sg.media-imdb.com/suggestion";
const DEFAULT_EMBED_BASE: &str = "https://vidsrc.xyz/embed";
const DEFAULT_SEARCH_EMBED: &str = "https://www.bing.com/search?q=";

#[derive(Debug, Clone)]
pub struct Config {
    pub films_path: PathBuf,
    pub tv_path: PathBuf,
    pub bind: SocketAddr,
    pub alt_source: AltSourceConfig,
}

/// Endpoints used by the alternate video source lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltSourceConfig {
    pub suggest_base: String,
    pub embed_base: String,
    pub search_embed: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());
        let var_or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let films_path = PathBuf::from(var_or("GRAMKOMPLIT_FILMS_PATH", "film.json"));
        let tv_path = PathBuf::from(var_or("GRAMKOMPLIT_TV_PATH", "tv.json"));

        let host: IpAddr = var_or("GRAMKOMPLIT_BIND", "0.0.0.0")
            .trim()
            .parse()
            .context("GRAMKOMPLIT_BIND must be an IP address")?;
        let port = match var("PORT") {
            Some(p) => p.trim().parse::<u16>().context("PORT must be a valid port number")?,
            None => DEFAULT_PORT,
        };

        let alt_source = AltSourceConfig {
            suggest_base: var_or("GRAMKOMPLIT_SUGGEST_BASE", DEFAULT_SUGGEST_BASE),
            embed_base: var_or("GRAMKOMPLIT_EMBED_BASE", DEFAULT_EMBED_BASE),
            search_embed: var_or("GRAMKOMPLIT_SEARCH_EMBED", DEFAULT_SEARCH_EMBED),
        };

        Ok(Self {
            films_path,
            tv_path,
            bind: SocketAddr::new(host, port),
            alt_source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.films_path, PathBuf::from("film.json"));
        assert_eq!(config.tv_path, PathBuf::from("tv.json"));
        assert_eq!(config.bind, "0.0.0.0:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(
            config.alt_source,
            AltSourceConfig {
                suggest_base: DEFAULT_SUGGEST_BASE.to_string(),
                embed_base: DEFAULT_EMBED_BASE.to_string(),
                search_embed: DEFAULT_SEARCH_EMBED.to_string(),
            }
        );
    }

    #[test]
    fn overrides_and_blank_values() {
        let config = config(&[
            ("GRAMKOMPLIT_FILMS_PATH", "/data/films.json"),
            ("GRAMKOMPLIT_TV_PATH", "  "),
            ("GRAMKOMPLIT_BIND", "127.0.0.1"),
            ("PORT", "8080"),
            ("GRAMKOMPLIT_EMBED_BASE", "http://embed.local"),
        ])
        .unwrap();
        assert_eq!(config.films_path, PathBuf::from("/data/films.json"));
        assert_eq!(config.tv_path, PathBuf::from("tv.json"));
        assert_eq!(config.bind, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.alt_source.embed_base, "http://embed.local");
        assert_eq!(config.alt_source.suggest_base, DEFAULT_SUGGEST_BASE);
    }

    #[test]
    fn invalid_port_is_rejected() {
        for port in ["abc", "70000", "-1"] {
            let err = config(&[("PORT", port)]).unwrap_err();
            assert!(err.to_string().contains("PORT"), "{port}: {err}");
        }
    }

    #[test]
    fn invalid_bind_is_rejected() {
        let err = config(&[("GRAMKOMPLIT_BIND", "localhost")]).unwrap_err();
        assert!(err.to_string().contains("GRAMKOMPLIT_BIND"), "{err}");
    }
}
