use serde::Serialize;

use crate::catalog::Title;

pub const RELATED_LIMIT: usize = 6;

/// A record plus its related titles, serialized flat as `{...title, related}`.
#[derive(Debug, Clone, Serialize)]
pub struct Detail<'a> {
    #[serde(flatten)]
    pub title: &'a Title,
    pub related: Vec<&'a Title>,
}

/// First record with this slug.
pub fn find_by_slug<'a>(collection: &'a [Title], slug: &str) -> Option<&'a Title> {
    collection.iter().find(|t| t.slug == slug)
}

/// Titles sharing a genre with `source`, in collection order, at most
/// [`RELATED_LIMIT`].
///
/// The check is one-sided: a candidate qualifies when one of its genre tokens
/// occurs anywhere in the source's raw genre string, so "Action" relates to a
/// source tagged "Action-Adventure".
pub fn related<'a>(collection: &'a [Title], source: &Title) -> Vec<&'a Title> {
    let Some(source_genre) = source.genre.as_deref().filter(|g| !g.trim().is_empty()) else {
        return Vec::new();
    };
    collection
        .iter()
        .filter(|candidate| candidate.slug != source.slug)
        .filter(|candidate| {
            candidate
                .genre_tokens()
                .any(|token| source_genre.contains(token))
        })
        .take(RELATED_LIMIT)
        .collect()
}

pub fn resolve<'a>(collection: &'a [Title], slug: &str) -> Option<Detail<'a>> {
    let title = find_by_slug(collection, slug)?;
    Some(Detail {
        title,
        related: related(collection, title),
    })
}
