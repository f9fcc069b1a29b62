//! Load the film and TV datasets and print field coverage plus the facet stats.
//! Usage:
//!   cargo run --bin catalog_props
//!   cargo run --bin catalog_props -- <film.json> <tv.json>
//! Defaults come from GRAMKOMPLIT_FILMS_PATH / GRAMKOMPLIT_TV_PATH (.env supported).

use anyhow::Result;
use dotenvy::dotenv;
use gramkomplit::catalog::{read_collection, Title};
use gramkomplit::config::Config;
use gramkomplit::stats;
use std::env;
use std::path::PathBuf;

fn coverage(label: &str, items: &[Title]) {
    let count = |f: fn(&Title) -> bool| items.iter().filter(|t| f(t)).count();
    println!("{} ({} titles)", label, items.len());
    println!("  title          {}", count(|t| t.title.is_some()));
    println!("  genre          {}", count(|t| t.genre.is_some()));
    println!("  year           {}", count(|t| t.year.is_some()));
    println!("  country        {}", count(|t| t.country.is_some()));
    println!("  rating         {}", count(|t| t.rating_value().is_some()));
    println!("  poster         {}", count(|t| t.poster_url().is_some()));
    println!("  videoPlayerUrl {}", count(|t| t.video_player_url.is_some()));
    println!("  tags           {}", count(|t| !t.tags.is_empty()));
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;
    let args: Vec<String> = env::args().skip(1).collect();
    let films_path = args.first().map(PathBuf::from).unwrap_or(config.films_path);
    let tv_path = args.get(1).map(PathBuf::from).unwrap_or(config.tv_path);

    // Fail loudly here; the server would just serve an empty collection.
    let films = read_collection(&films_path).await?;
    let tv = read_collection(&tv_path).await?;

    coverage(&films_path.display().to_string(), &films);
    coverage(&tv_path.display().to_string(), &tv);

    let stats = stats::compute(&films, &tv);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
