//! Word bigram model built on a conditional counter map.
//!
//! Run with: `cargo run --example bigrams [path/to/text]`
//!
//! Counts which word follows which, normalizes each row into a conditional
//! distribution, and prints the most likely successor of every word.
//! Set `RUST_LOG=tallykit=trace` to watch the cache recomputations.

use std::error::Error;

use tallykit::builder::{CounterBuilder, MapKind};
use tallykit::counter_map::CounterMap;

const SAMPLE: &str = "the king moved the bishop and the queen moved the king \
                      the bishop took the pawn and the king took the bishop";

fn bigram_model(text: &str) -> CounterMap<String, String> {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|word| !word.is_empty())
        .collect();

    let mut model = CounterBuilder::new()
        .backing(MapKind::BTree)
        .build_map::<String, String>();
    for pair in words.windows(2) {
        model.increment_count(pair[0].clone(), pair[1].clone(), 1.0);
    }
    model
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE.to_string(),
    };

    let mut model = bigram_model(&text);
    println!("{} distinct words, {} bigrams", model.len(), model.total_count());
    if model.len() <= 16 {
        println!("{model}");
    }

    model.conditional_normalize();
    for (word, successors) in &model {
        if successors.is_empty() {
            continue;
        }
        let best = successors.max_value();
        println!(
            "{word:>12} -> {best:<12} p={:.3}",
            successors.get_count(&best)
        );
    }
    Ok(())
}
