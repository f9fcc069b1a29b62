//! Alternate video source lookup through the public IMDb title suggestion endpoint.
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::catalog::{Kind, Title};
use crate::config::AltSourceConfig;

#[async_trait]
pub trait SuggestApi: Send + Sync {
    async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>>;
}

/// One entry of the suggestion list. Field names follow the endpoint's
/// one-letter keys.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Suggestion {
    pub id: String,
    #[serde(rename = "l", default)]
    pub label: Option<String>,
    #[serde(rename = "y", default)]
    pub year: Option<i64>,
    #[serde(rename = "q", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    #[serde(default)]
    d: Vec<Suggestion>,
}

#[derive(Debug, Clone)]
pub struct SuggestClient {
    client: Client,
    base: String,
}

impl SuggestClient {
    pub fn new(base: impl Into<String>) -> Result<Self> {
        let user_agent = format!("gramkomplit/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .user_agent(user_agent)
            .build()
            .context("Failed to build suggestion HTTP client")?;
        Ok(Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("{} -> {}", url, status));
        }
        Ok(text)
    }
}

#[async_trait]
impl SuggestApi for SuggestClient {
    async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>> {
        let url = suggestion_url(&self.base, query)
            .ok_or_else(|| anyhow!("Empty title, nothing to look up"))?;
        let body = self.get_text(&url).await?;
        parse_suggestions(&body)
    }
}

/// `{base}/{first letter}/{encoded lowercase query}.json`
pub fn suggestion_url(base: &str, query: &str) -> Option<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    let first = query
        .chars()
        .find(|c| c.is_ascii_alphanumeric())
        .unwrap_or('x');
    Some(format!(
        "{}/{}/{}.json",
        base.trim_end_matches('/'),
        first,
        urlencoding::encode(&query)
    ))
}

/// Accepts plain JSON or the older JSONP form `imdb$name({...})`.
pub fn parse_suggestions(body: &str) -> Result<Vec<Suggestion>> {
    let body = body.trim();
    let json = if body.starts_with('{') {
        body
    } else {
        let start = body.find('(').ok_or_else(|| anyhow!("Unrecognised suggestion body"))?;
        let end = body.rfind(')').filter(|e| *e > start).unwrap_or(body.len());
        &body[start + 1..end]
    };
    let parsed: SuggestResponse = serde_json::from_str(json).context("JSON parse failed")?;
    Ok(parsed.d)
}

/// Exact title match (ignoring case) within a year either side, else the
/// first title result. Only `tt` ids are considered.
pub fn pick_best<'a>(
    candidates: &'a [Suggestion],
    title: &str,
    year: Option<i64>,
) -> Option<&'a Suggestion> {
    let wanted = title.trim().to_lowercase();
    let titles = || candidates.iter().filter(|c| c.id.starts_with("tt"));
    titles()
        .find(|c| {
            let label_matches = c
                .label
                .as_deref()
                .map(|l| l.trim().to_lowercase() == wanted)
                .unwrap_or(false);
            let year_matches = match (year, c.year) {
                (Some(want), Some(got)) => (want - got).abs() <= 1,
                (None, _) => true,
                (Some(_), None) => false,
            };
            label_matches && year_matches
        })
        .or_else(|| titles().next())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Suggestion,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AltSource {
    pub source: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    pub embed_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct AltSourceResolver {
    api: Arc<dyn SuggestApi>,
    config: AltSourceConfig,
}

impl AltSourceResolver {
    pub fn new(api: Arc<dyn SuggestApi>, config: AltSourceConfig) -> Self {
        Self { api, config }
    }

    /// Never fails: lookup errors come back as a search embed with `error` set.
    pub async fn resolve(&self, title: &Title, kind: Kind) -> AltSource {
        let year = title.year.as_ref().and_then(|y| y.as_number());
        let Some(name) = title.title.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            return self.fallback(&title.slug, year, "Title has no name to look up".to_string());
        };

        match self.lookup(name, year).await {
            Ok(found) => {
                info!("Alternate source for '{}': {}", name, found.id);
                AltSource {
                    source: SourceKind::Suggestion,
                    embed_url: self.embed_url(kind, &found.id),
                    imdb_id: Some(found.id),
                    error: None,
                }
            }
            Err(e) => {
                warn!("Alternate source lookup failed for '{}': {:#}", name, e);
                self.fallback(name, year, e.to_string())
            }
        }
    }

    async fn lookup(&self, name: &str, year: Option<i64>) -> Result<Suggestion> {
        let candidates = self.api.suggest(name).await?;
        pick_best(&candidates, name, year)
            .cloned()
            .ok_or_else(|| anyhow!("No suggestion matched '{}'", name))
    }

    pub fn embed_url(&self, kind: Kind, imdb_id: &str) -> String {
        let segment = match kind {
            Kind::Film => "movie",
            Kind::Tv => "tv",
        };
        format!(
            "{}/{}/{}",
            self.config.embed_base.trim_end_matches('/'),
            segment,
            imdb_id
        )
    }

    fn fallback(&self, name: &str, year: Option<i64>, error: String) -> AltSource {
        let terms = match year {
            Some(y) => format!("{name} {y}"),
            None => name.to_string(),
        };
        AltSource {
            source: SourceKind::Fallback,
            imdb_id: None,
            embed_url: format!("{}{}", self.config.search_embed, urlencoding::encode(&terms)),
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Year;

    fn suggestion(id: &str, label: &str, year: Option<i64>) -> Suggestion {
        Suggestion {
            id: id.to_string(),
            label: Some(label.to_string()),
            year,
            kind: Some("feature".to_string()),
        }
    }

    struct FakeSuggest(Result<Vec<Suggestion>, String>);

    #[async_trait]
    impl SuggestApi for FakeSuggest {
        async fn suggest(&self, _query: &str) -> Result<Vec<Suggestion>> {
            self.0.clone().map_err(|e| anyhow!(e))
        }
    }

    fn resolver(result: Result<Vec<Suggestion>, String>) -> AltSourceResolver {
        AltSourceResolver::new(
            Arc::new(FakeSuggest(result)),
            AltSourceConfig {
                suggest_base: "http://suggest.test".to_string(),
                embed_base: "http://embed.test/".to_string(),
                search_embed: "http://search.test/?q=".to_string(),
            },
        )
    }

    fn film(name: &str, year: i64) -> Title {
        Title {
            slug: "film".to_string(),
            title: Some(name.to_string()),
            year: Some(Year::Number(year)),
            ..Default::default()
        }
    }

    #[test]
    fn builds_suggestion_url() {
        assert_eq!(
            suggestion_url("http://s/", "The Raid").as_deref(),
            Some("http://s/t/the%20raid.json")
        );
        assert_eq!(
            suggestion_url("http://s", "'71").as_deref(),
            Some("http://s/7/%2771.json")
        );
        assert_eq!(suggestion_url("http://s", "  "), None);
    }

    #[test]
    fn parses_plain_and_wrapped_bodies() {
        let plain = r#"{"d":[{"id":"tt1899353","l":"The Raid","y":2011,"q":"feature"}],"q":"the raid","v":1}"#;
        let parsed = parse_suggestions(plain).unwrap();
        assert_eq!(parsed, vec![suggestion("tt1899353", "The Raid", Some(2011))]);

        let wrapped = format!("imdb$the_raid({plain})");
        assert_eq!(parse_suggestions(&wrapped).unwrap(), parsed);

        assert!(parse_suggestions("not json").is_err());
        assert!(parse_suggestions(r#"{"v":1}"#).unwrap().is_empty());
    }

    #[test]
    fn picks_exact_title_near_year() {
        let candidates = vec![
            suggestion("nm0000001", "The Raid", Some(2011)),
            suggestion("tt0000001", "The Raid 2", Some(2014)),
            suggestion("tt0000002", "The Raid", Some(2001)),
            suggestion("tt0000003", "the raid", Some(2012)),
        ];
        let best = pick_best(&candidates, "The Raid", Some(2011)).unwrap();
        assert_eq!(best.id, "tt0000003");

        let first = pick_best(&candidates, "Serbuan Maut", Some(2011)).unwrap();
        assert_eq!(first.id, "tt0000001");

        assert!(pick_best(&candidates[..1], "The Raid", None).is_none());
    }

    #[tokio::test]
    async fn resolves_embed_for_match() {
        let r = resolver(Ok(vec![suggestion("tt1899353", "The Raid", Some(2011))]));
        let film = film("The Raid", 2012);
        let alt = r.resolve(&film, Kind::Film).await;
        assert_eq!(alt.source, SourceKind::Suggestion);
        assert_eq!(alt.imdb_id.as_deref(), Some("tt1899353"));
        assert_eq!(alt.embed_url, "http://embed.test/movie/tt1899353");

        let alt = r.resolve(&film, Kind::Tv).await;
        assert_eq!(alt.embed_url, "http://embed.test/tv/tt1899353");
    }

    #[tokio::test]
    async fn falls_back_to_search_on_failure() {
        let r = resolver(Err("network down".to_string()));
        let alt = r.resolve(&film("The Raid", 2011), Kind::Film).await;
        assert_eq!(alt.source, SourceKind::Fallback);
        assert_eq!(alt.imdb_id, None);
        assert_eq!(alt.embed_url, "http://search.test/?q=The%20Raid%202011");
        assert_eq!(alt.error.as_deref(), Some("network down"));

        let r = resolver(Ok(Vec::new()));
        let alt = r.resolve(&film("Nothing", 2011), Kind::Film).await;
        assert_eq!(alt.source, SourceKind::Fallback);
        assert!(alt.error.is_some());
    }
}
