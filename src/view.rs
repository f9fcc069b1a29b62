//! Server-rendered HTML pages. Everything here is a pure function of its
//! arguments; handlers build a [`ViewState`] from the request and pass it in.
use crate::alt_source::{AltSource, SourceKind};
use crate::catalog::{Kind, Title};
use crate::detail::Detail;
use crate::query::{ListQuery, Page, Pagination};
use crate::stats::Stats;

const SITE_NAME: &str = "Gramkomplit";
const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/200x300?text=No+Poster";
const PAGE_WINDOW: usize = 5;

/// What the index page is showing: which collection and which query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub kind: Kind,
    pub query: ListQuery,
}

impl ViewState {
    pub fn new(kind: Kind, query: ListQuery) -> Self {
        Self { kind, query }
    }

    /// Query string reproducing this state at `page`.
    pub fn href(&self, page: usize) -> String {
        let mut pairs = vec![
            ("type", self.kind.as_param().to_string()),
            ("page", page.to_string()),
        ];
        let q = &self.query;
        if let Some(text) = &q.text {
            pairs.push(("q", text.clone()));
        }
        if let Some(genre) = &q.filters.genre {
            pairs.push(("genre", genre.clone()));
        }
        if let Some(year) = &q.filters.year {
            pairs.push(("year", year.clone()));
        }
        if let Some(country) = &q.filters.country {
            pairs.push(("country", country.clone()));
        }
        if let Some(rating) = q.filters.min_rating {
            pairs.push(("rating", rating.to_string()));
        }
        format!("/?{}", encode_pairs(&pairs))
    }
}

fn encode_pairs(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn detail_href(kind: Kind, slug: &str) -> String {
    format!(
        "/detail.html?slug={}&type={}",
        urlencoding::encode(slug),
        kind.as_param()
    )
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="id">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{}</title>
<link rel="stylesheet" href="/css/style.css">
</head>
<body>
<header class="navbar">
  <a class="logo" href="/">{}</a>
  <nav>
    <a class="nav-link" href="/?type=film">Films</a>
    <a class="nav-link" href="/?type=tv">TV Series</a>
  </nav>
</header>
{}
</body>
</html>
"#,
        escape(title),
        SITE_NAME,
        body
    )
}

fn card(kind: Kind, title: &Title, max_tags: usize) -> String {
    let poster = title.poster_url().unwrap_or(PLACEHOLDER_POSTER);
    let name = escape(title.display_title());
    let mut meta = String::new();
    if let Some(rating) = &title.rating {
        meta.push_str(&format!(
            r#"<span class="film-card-rating">⭐ {}</span>"#,
            escape(rating)
        ));
    }
    if let Some(year) = &title.year {
        meta.push_str(&format!("<span>{}</span>", escape(&year.as_text())));
    }
    let tags = if title.tags.is_empty() || max_tags == 0 {
        String::new()
    } else {
        let spans: String = title
            .tags
            .iter()
            .take(max_tags)
            .map(|t| format!(r#"<span class="tag">{}</span>"#, escape(t)))
            .collect();
        format!(r#"<div class="film-card-tags">{spans}</div>"#)
    };
    format!(
        r#"<a href="{href}" class="film-card">
  <img src="{poster}" alt="{name}" class="film-poster" loading="lazy">
  <div class="film-card-content">
    <h3 class="film-card-title">{name}</h3>
    <div class="film-card-meta">{meta}</div>
    {tags}
  </div>
</a>"#,
        href = escape(&detail_href(kind, &title.slug)),
        poster = escape(poster),
        name = name,
        meta = meta,
        tags = tags,
    )
}

/// Grid of cards, or the empty-result message.
pub fn render_grid(kind: Kind, items: &[&Title]) -> String {
    if items.is_empty() {
        return r#"<div class="films-grid"><p class="empty">No titles found.</p></div>"#
            .to_string();
    }
    let cards: Vec<String> = items.iter().map(|t| card(kind, t, 2)).collect();
    format!(r#"<div class="films-grid">{}</div>"#, cards.join("\n"))
}

/// Page numbers shown around `page`: up to five, starting two before it.
pub fn page_window(page: usize, total_pages: usize) -> std::ops::RangeInclusive<usize> {
    let start = page.saturating_sub(2).max(1);
    let end = total_pages.min(start + PAGE_WINDOW - 1);
    start..=end
}

pub fn render_pagination(state: &ViewState, pagination: &Pagination) -> String {
    if pagination.total_pages <= 1 {
        return String::new();
    }
    let mut buttons = Vec::new();
    buttons.push(nav_button(
        "←",
        pagination.has_prev.then(|| state.href(pagination.page - 1)),
    ));
    for i in page_window(pagination.page, pagination.total_pages) {
        let class = if i == pagination.page {
            "page-btn active"
        } else {
            "page-btn"
        };
        buttons.push(format!(
            r#"<a class="{class}" href="{}">{i}</a>"#,
            escape(&state.href(i))
        ));
    }
    buttons.push(nav_button(
        "→",
        pagination.has_next.then(|| state.href(pagination.page + 1)),
    ));
    format!(r#"<div class="pagination">{}</div>"#, buttons.join(""))
}

fn nav_button(label: &str, href: Option<String>) -> String {
    match href {
        Some(href) => format!(r#"<a class="page-btn" href="{}">{label}</a>"#, escape(&href)),
        None => format!(r#"<span class="page-btn disabled">{label}</span>"#),
    }
}

fn facet_dropdown(kind: Kind, name: &str, label: &str, values: &[String]) -> String {
    let links: String = values
        .iter()
        .map(|v| {
            let href = format!(
                "/?{}",
                encode_pairs(&[("type", kind.as_param().to_string()), (name, v.clone())])
            );
            format!(r#"<a href="{}">{}</a>"#, escape(&href), escape(v))
        })
        .collect();
    format!(
        r#"<div class="dropdown"><span>{label}</span><div class="dropdown-content">{links}</div></div>"#
    )
}

fn select(name: &str, values: &[String], selected: Option<&str>) -> String {
    let options: String = values
        .iter()
        .map(|v| {
            let mark = if Some(v.as_str()) == selected {
                " selected"
            } else {
                ""
            };
            format!(r#"<option value="{0}"{mark}>{0}</option>"#, escape(v))
        })
        .collect();
    format!(r#"<select name="{name}"><option value="">All</option>{options}</select>"#)
}

fn filter_form(state: &ViewState, stats: &Stats) -> String {
    let q = &state.query;
    let years: Vec<String> = stats.years.iter().map(|y| y.as_text().into_owned()).collect();
    let rating = q
        .filters
        .min_rating
        .map(|r| r.to_string())
        .unwrap_or_default();
    format!(
        r#"<form class="filter-sidebar" action="/" method="get">
  <input type="hidden" name="type" value="{kind}">
  <input type="search" name="q" placeholder="Search titles" value="{text}">
  {genre}
  {year}
  {country}
  <input type="number" name="rating" min="0" max="10" step="0.5" placeholder="Min rating" value="{rating}">
  <button type="submit">Apply</button>
  <a href="/?type={kind}">Reset</a>
</form>"#,
        kind = state.kind.as_param(),
        text = escape(q.text.as_deref().unwrap_or_default()),
        genre = select("genre", &stats.genres, q.filters.genre.as_deref()),
        year = select("year", &years, q.filters.year.as_deref()),
        country = select("country", &stats.countries, q.filters.country.as_deref()),
        rating = escape(&rating),
    )
}

pub fn render_index(state: &ViewState, page: &Page<'_>, stats: &Stats) -> String {
    let years: Vec<String> = stats.years.iter().map(|y| y.as_text().into_owned()).collect();
    let body = format!(
        r#"<section class="hero">
  <h1>{label}</h1>
  <p id="stats">{films} Films • {tv} TV Series</p>
  <div class="dropdowns">{genres}{years}{countries}</div>
</section>
{form}
<main>
{grid}
{pagination}
</main>"#,
        label = state.kind.label(),
        films = stats.total_films,
        tv = stats.total_tv,
        genres = facet_dropdown(state.kind, "genre", "Genre", &stats.genres),
        years = facet_dropdown(state.kind, "year", "Year", &years),
        countries = facet_dropdown(state.kind, "country", "Country", &stats.countries),
        form = filter_form(state, stats),
        grid = render_grid(state.kind, &page.items),
        pagination = render_pagination(state, &page.pagination),
    );
    layout(&format!("{} - {}", state.kind.label(), SITE_NAME), &body)
}

fn iframe(src: &str) -> String {
    format!(
        r#"<iframe src="{}" allowfullscreen allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture"></iframe>"#,
        escape(src)
    )
}

fn player(kind: Kind, title: &Title, alternate: Option<&AltSource>) -> String {
    let alt_href = format!("{}&server=alt", detail_href(kind, &title.slug));
    let switch = format!(
        r#"<a class="server-switch" href="{}">Try another server</a>"#,
        escape(&alt_href)
    );
    match alternate {
        Some(alt) => {
            let notice = match (&alt.source, &alt.error) {
                (SourceKind::Fallback, Some(err)) => format!(
                    r#"<p class="player-error">Alternate server not found ({}). Showing a web search instead.</p>"#,
                    escape(err)
                ),
                _ => String::new(),
            };
            format!(
                r#"<div class="video-player">{}</div>{notice}"#,
                iframe(&alt.embed_url)
            )
        }
        None => match &title.video_player_url {
            Some(url) => format!(
                r#"<div class="video-player">{}</div>{switch}"#,
                iframe(url)
            ),
            None => format!(
                r#"<div class="video-player"><p class="player-missing">Video player unavailable</p></div>{switch}"#
            ),
        },
    }
}

fn or_dash(value: Option<&str>) -> String {
    escape(value.unwrap_or("-"))
}

/// Detail page. `alternate` replaces the dataset's embed when the visitor
/// asked for another server.
pub fn render_detail(kind: Kind, detail: &Detail<'_>, alternate: Option<&AltSource>) -> String {
    let t = detail.title;
    let rating = t
        .rating
        .as_deref()
        .map(|r| format!("⭐ {}", escape(r)))
        .unwrap_or_default();
    let year = t
        .year
        .as_ref()
        .map(|y| escape(&y.as_text()))
        .unwrap_or_default();
    let tags: String = t
        .tags
        .iter()
        .map(|tag| format!(r#"<span class="tag">{}</span>"#, escape(tag)))
        .collect();
    let synopsis = t
        .synopsis
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("Synopsis not available.");
    let related = if detail.related.is_empty() {
        String::new()
    } else {
        let cards: Vec<String> = detail.related.iter().map(|r| card(kind, r, 0)).collect();
        format!(
            r#"<section class="related"><h2>Related</h2><div class="films-grid">{}</div></section>"#,
            cards.join("\n")
        )
    };

    let body = format!(
        r#"<main class="detail">
{player}
<h1 id="filmTitle">{name}</h1>
<div class="meta"><span>{rating}</span><span>{year}</span><span>{duration}</span></div>
<div class="tags">{tags}</div>
<dl>
  <dt>Genre</dt><dd>{genre}</dd>
  <dt>Country</dt><dd>{country}</dd>
  <dt>Director</dt><dd>{director}</dd>
  <dt>Cast</dt><dd>{cast}</dd>
</dl>
<p class="synopsis">{synopsis}</p>
{related}
</main>"#,
        player = player(kind, t, alternate),
        name = escape(t.display_title()),
        duration = escape(t.duration.as_deref().unwrap_or_default()),
        genre = or_dash(t.genre.as_deref()),
        country = or_dash(t.country.as_deref()),
        director = or_dash(t.director.as_deref()),
        cast = or_dash(t.cast.as_deref()),
        synopsis = escape(synopsis),
    );
    layout(&format!("{} - {}", t.display_title(), SITE_NAME), &body)
}

pub fn render_not_found() -> String {
    layout(
        &format!("Not found - {SITE_NAME}"),
        r#"<main class="not-found">
<h2>Title not found</h2>
<p>The title you are looking for does not exist or has been removed.</p>
<a href="/">← Back to home</a>
</main>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Year;
    use crate::query::{paginate, Filters};

    fn title(slug: &str) -> Title {
        Title {
            slug: slug.to_string(),
            title: Some(format!("<{slug}>")),
            rating: Some("7.5".to_string()),
            year: Some(Year::Number(2020)),
            tags: vec!["HD".to_string(), "Sub".to_string(), "New".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn grid_cards_escape_and_limit_tags() {
        let t = title("a");
        let html = render_grid(Kind::Tv, &[&t]);
        assert!(html.contains("&lt;a&gt;"));
        assert!(html.contains("/detail.html?slug=a&amp;type=tv"));
        assert!(html.contains(PLACEHOLDER_POSTER));
        assert!(html.contains("⭐ 7.5"));
        assert!(html.contains("Sub"));
        assert!(!html.contains("New"));
        assert!(render_grid(Kind::Film, &[]).contains("No titles found."));
    }

    #[test]
    fn page_window_bounds() {
        assert_eq!(page_window(1, 10), 1..=5);
        assert_eq!(page_window(6, 10), 4..=8);
        assert_eq!(page_window(10, 10), 8..=10);
        assert_eq!(page_window(2, 3), 1..=3);
    }

    #[test]
    fn pagination_links_keep_state() {
        let data: Vec<Title> = (0..50).map(|i| title(&format!("t{i}"))).collect();
        let refs: Vec<&Title> = data.iter().collect();
        let state = ViewState::new(
            Kind::Film,
            ListQuery {
                text: Some("night fall".to_string()),
                filters: Filters {
                    genre: Some("Drama".to_string()),
                    ..Default::default()
                },
                page: 2,
                page_size: 20,
            },
        );
        let page = paginate(refs, 2, 20);
        let html = render_pagination(&state, &page.pagination);
        assert!(html.contains(
            "page-btn active\" href=\"/?type=film&amp;page=2&amp;q=night%20fall&amp;genre=Drama\">2<"
        ));
        assert!(html.contains("page=1&amp;"));
        assert!(html.contains("page=3&amp;"));
        assert!(!html.contains("disabled"));

        let single = paginate(data.iter().take(3).collect(), 1, 20);
        assert!(render_pagination(&state, &single.pagination).is_empty());
    }

    #[test]
    fn detail_defaults_and_alternate_player() {
        let t = Title {
            slug: "x".to_string(),
            ..Default::default()
        };
        let detail = Detail {
            title: &t,
            related: Vec::new(),
        };
        let html = render_detail(Kind::Film, &detail, None);
        assert!(html.contains("Untitled"));
        assert!(html.contains("Video player unavailable"));
        assert!(html.contains("Synopsis not available."));
        assert!(html.contains("<dd>-</dd>"));
        assert!(html.contains("server=alt"));

        let alt = AltSource {
            source: SourceKind::Fallback,
            imdb_id: None,
            embed_url: "https://search/?q=x".to_string(),
            error: Some("offline".to_string()),
        };
        let html = render_detail(Kind::Film, &detail, Some(&alt));
        assert!(html.contains(r#"<iframe src="https://search/?q=x""#));
        assert!(html.contains("offline"));
    }
}
