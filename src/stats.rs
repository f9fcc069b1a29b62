use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use crate::catalog::{Title, Year};

/// Facet lists used to populate the filter dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_films: usize,
    #[serde(rename = "totalTV")]
    pub total_tv: usize,
    pub genres: Vec<String>,
    pub years: Vec<Year>,
    pub countries: Vec<String>,
}

pub fn compute(films: &[Title], tv: &[Title]) -> Stats {
    let mut genres = BTreeSet::new();
    let mut countries = BTreeSet::new();
    let mut seen_years = HashSet::new();
    let mut years = Vec::new();

    for item in films.iter().chain(tv) {
        genres.extend(item.genre_tokens().map(str::to_string));
        if let Some(country) = item.country.as_deref().map(str::trim) {
            if !country.is_empty() {
                countries.insert(country.to_string());
            }
        }
        if let Some(year) = &item.year {
            // 2020 and "2020" are the same facet value
            let key = year
                .as_number()
                .map(|n| n.to_string())
                .unwrap_or_else(|| year.as_text().into_owned());
            if !key.is_empty() && seen_years.insert(key) {
                years.push(year.clone());
            }
        }
    }

    years.sort_by(newest_first);

    Stats {
        total_films: films.len(),
        total_tv: tv.len(),
        genres: genres.into_iter().collect(),
        years,
        countries: countries.into_iter().collect(),
    }
}

fn newest_first(a: &Year, b: &Year) -> Ordering {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.as_text().cmp(&a.as_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(genre: &str, year: Option<Year>, country: &str) -> Title {
        Title {
            slug: "x".to_string(),
            genre: Some(genre.to_string()).filter(|g| !g.is_empty()),
            year,
            country: Some(country.to_string()).filter(|c| !c.is_empty()),
            ..Default::default()
        }
    }

    #[test]
    fn facets_are_unique_and_sorted() {
        let films = vec![
            title("Drama, Action", Some(Year::Number(2020)), "USA "),
            title("Action,Comedy, ", Some(Year::Text("2022".to_string())), "Indonesia"),
        ];
        let tv = vec![
            title("Drama", Some(Year::Text("2020".to_string())), " USA"),
            title("", Some(Year::Text("TBA".to_string())), ""),
            title("Thriller", None, "Korea"),
        ];
        let stats = compute(&films, &tv);
        assert_eq!(stats.total_films, 2);
        assert_eq!(stats.total_tv, 3);
        assert_eq!(stats.genres, vec!["Action", "Comedy", "Drama", "Thriller"]);
        assert_eq!(stats.countries, vec!["Indonesia", "Korea", "USA"]);
        assert_eq!(
            stats.years,
            vec![
                Year::Text("2022".to_string()),
                Year::Number(2020),
                Year::Text("TBA".to_string()),
            ]
        );
    }

    #[test]
    fn serializes_with_total_tv_key() {
        let stats = compute(&[], &[]);
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["totalFilms"], 0);
        assert_eq!(value["totalTV"], 0);
        assert!(value["genres"].as_array().unwrap().is_empty());
    }
}
