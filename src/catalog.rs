use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{error, info, warn};

use crate::stats::{self, Stats};

/// Which of the two collections a title lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Kind {
    #[default]
    Film,
    Tv,
}

impl Kind {
    /// Anything other than `tv` means films.
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "tv" => Kind::Tv,
            _ => Kind::Film,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            Kind::Film => "film",
            Kind::Tv => "tv",
        }
    }

    pub fn api_segment(&self) -> &'static str {
        match self {
            Kind::Film => "films",
            Kind::Tv => "tv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Kind::Film => "Films",
            Kind::Tv => "TV Series",
        }
    }
}

/// Release year as found in the dataset: either a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Year {
    Number(i64),
    Text(String),
}

impl Year {
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Year::Number(n) => Cow::Owned(n.to_string()),
            Year::Text(t) => Cow::Borrowed(t.trim()),
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Year::Number(n) => Some(*n),
            Year::Text(t) => t.trim().parse().ok(),
        }
    }

    /// `2021`, `2021.0`, `"2021"` and `" 2021 "` all compare equal.
    pub fn loosely_equals(&self, raw: &str) -> bool {
        let raw = raw.trim();
        if self.as_text() == raw {
            return true;
        }
        let this = match self {
            Year::Number(n) => Some(*n as f64),
            Year::Text(t) => t.trim().parse::<f64>().ok(),
        };
        match (this, raw.parse::<f64>().ok()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Year::Number(i)),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Some(Year::Number(f as i64))
                    }
                    _ => Some(Year::Text(n.to_string())),
                },
            },
            Value::String(s) if !s.trim().is_empty() => Some(Year::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl Serialize for Year {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Year::Number(n) => serializer.serialize_i64(*n),
            Year::Text(t) => serializer.serialize_str(t),
        }
    }
}

/// A film or TV series record.
///
/// The typed fields are a lenient reading of `raw`: `null`, missing and empty
/// values all read as `None`, numbers and arrays read as text. They are only
/// used for filtering and rendering. Serializing a `Title` writes `raw`, the
/// record exactly as it appeared in the dataset.
#[derive(Debug, Clone, Default)]
pub struct Title {
    pub slug: String,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub year: Option<Year>,
    pub country: Option<String>,
    pub rating: Option<String>,
    pub duration: Option<String>,
    pub director: Option<String>,
    pub cast: Option<String>,
    pub synopsis: Option<String>,
    pub poster: Option<String>,
    pub tags: Vec<String>,
    pub video_player_url: Option<String>,
    pub raw: Map<String, Value>,
}

impl Title {
    pub fn from_map(raw: Map<String, Value>) -> Self {
        let text = |key: &str| raw.get(key).and_then(value_to_text);
        let slug = text("slug").unwrap_or_default();
        let title = text("title");
        let genre = text("genre");
        let year = raw.get("year").and_then(Year::from_value);
        let country = text("country");
        let rating = text("rating");
        let duration = text("duration");
        let director = text("director");
        let cast = text("cast");
        let synopsis = text("synopsis");
        let poster = text("poster");
        let tags = raw.get("tags").map(tags_from_value).unwrap_or_default();
        let video_player_url = text("videoPlayerUrl");
        Self {
            slug,
            title,
            genre,
            year,
            country,
            rating,
            duration,
            director,
            cast,
            synopsis,
            poster,
            tags,
            video_player_url,
            raw,
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// Comma separated genre tokens, trimmed, empties dropped.
    pub fn genre_tokens(&self) -> impl Iterator<Item = &str> {
        self.genre
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn rating_value(&self) -> Option<f64> {
        self.rating.as_deref().and_then(parse_leading_float)
    }

    /// Poster URL unless it is missing or one of the broken `.../undefined` links.
    pub fn poster_url(&self) -> Option<&str> {
        self.poster
            .as_deref()
            .filter(|p| !p.contains("undefined"))
    }
}

/// Parses the numeric prefix of `input` (`"7.5/10"` -> 7.5). `None` when
/// there is no leading number at all.
pub fn parse_leading_float(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if has_digits || frac_end > frac_start {
            has_digits = true;
            end = frac_end;
        }
    }
    if !has_digits {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

impl<'de> Deserialize<'de> for Title {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Map::<String, Value>::deserialize(d).map(Title::from_map)
    }
}

impl Serialize for Title {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null | Value::Object(_) => return None,
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_to_text)
            .collect::<Vec<_>>()
            .join(", "),
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn tags_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_to_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Both collections, loaded once and never mutated.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    films: Vec<Title>,
    tv: Vec<Title>,
    stats: Stats,
}

impl Catalog {
    pub fn new(films: Vec<Title>, tv: Vec<Title>) -> Self {
        let stats = stats::compute(&films, &tv);
        Self { films, tv, stats }
    }

    /// Reads both dataset files concurrently. A file that cannot be read or
    /// parsed yields an empty collection.
    pub async fn load(films_path: &Path, tv_path: &Path) -> Self {
        let (films, tv) = tokio::join!(load_collection(films_path), load_collection(tv_path));
        info!("Loaded {} films", films.len());
        info!("Loaded {} TV series", tv.len());
        Self::new(films, tv)
    }

    pub fn collection(&self, kind: Kind) -> &[Title] {
        match kind {
            Kind::Film => &self.films,
            Kind::Tv => &self.tv,
        }
    }

    pub fn films(&self) -> &[Title] {
        &self.films
    }

    pub fn tv(&self) -> &[Title] {
        &self.tv
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }
}

pub async fn load_collection(path: &Path) -> Vec<Title> {
    match read_collection(path).await {
        Ok(items) => {
            warn_duplicate_slugs(path, &items);
            items
        }
        Err(e) => {
            error!("Error loading data from {}: {:#}", path.display(), e);
            Vec::new()
        }
    }
}

pub async fn read_collection(path: &Path) -> Result<Vec<Title>> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {} failed", path.display()))?;
    parse_collection(&raw)
}

pub fn parse_collection(raw: &[u8]) -> Result<Vec<Title>> {
    serde_json::from_slice(raw).context("JSON parse failed")
}

fn warn_duplicate_slugs(path: &Path, items: &[Title]) {
    let mut seen = HashSet::new();
    for item in items {
        if item.slug.is_empty() {
            warn!("Title without slug in {}: {}", path.display(), item.display_title());
        } else if !seen.insert(item.slug.as_str()) {
            warn!("Duplicate slug '{}' in {}, first entry wins", item.slug, path.display());
        }
    }
}
