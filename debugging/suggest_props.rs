//! Run the alternate source lookup for a title and print every candidate plus the pick.
//! Usage:
//!   cargo run --bin suggest_props -- "<title>" [year] [film|tv]

use anyhow::{Context, Result};
use dotenvy::dotenv;
use gramkomplit::alt_source::{pick_best, AltSourceResolver, SuggestApi, SuggestClient};
use gramkomplit::catalog::{Kind, Title, Year};
use gramkomplit::config::Config;
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin suggest_props -- \"<title>\" [year] [film|tv]");
        std::process::exit(1);
    }
    let name = args[1].clone();
    let year: Option<i64> = match args.get(2) {
        Some(y) => Some(y.parse().context("year must be an integer")?),
        None => None,
    };
    let kind = Kind::from_param(args.get(3).map(String::as_str));

    let config = Config::from_env()?;
    let client = Arc::new(SuggestClient::new(config.alt_source.suggest_base.clone())?);

    let candidates = client.suggest(&name).await?;
    for c in &candidates {
        println!(
            "{:<12} {:<6} {:<12} {}",
            c.id,
            c.year.map(|y| y.to_string()).unwrap_or_default(),
            c.kind.as_deref().unwrap_or("-"),
            c.label.as_deref().unwrap_or("-")
        );
    }
    match pick_best(&candidates, &name, year) {
        Some(best) => println!("pick: {}", best.id),
        None => println!("pick: none"),
    }

    let resolver = AltSourceResolver::new(client, config.alt_source);
    let title = Title {
        slug: "lookup".to_string(),
        title: Some(name),
        year: year.map(Year::Number),
        ..Default::default()
    };
    let alt = resolver.resolve(&title, kind).await;
    println!("{}", serde_json::to_string_pretty(&alt)?);
    Ok(())
}
