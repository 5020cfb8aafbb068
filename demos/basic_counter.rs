//! Counter basics: counting, cache policies, arithmetic, and backings.
//!
//! Run with: `cargo run --example basic_counter`

use std::collections::BTreeMap;

use tallykit::prelude::*;

fn main() {
    let mut pieces: Counter<&str> = ["king", "queen", "bishop", "bishop"].into_iter().collect();
    println!("pieces:      {pieces}");
    println!("total:       {}", pieces.total_count());
    println!("most common: {}", pieces.max_value());

    // Relaxed: mutations invalidate, the next total re-sums.
    pieces.increment_count("pawn", 8.0);
    println!("synced after increment (relaxed): {}", pieces.is_total_synced());
    println!("total:       {}", pieces.total_count());

    // Persistent: mutations keep the cached total exact.
    pieces.set_cache_policy(CachePolicy::Persistent);
    pieces.increment_count("rook", 2.0);
    println!("synced after increment (persistent): {}", pieces.is_total_synced());

    let doubled = &pieces * 2.0;
    println!("doubled:     {doubled}");

    // Same contents on an ordered backing compare equal and print sorted.
    let mut ordered: Counter<&str> = Counter::from_map(AnyMap::from_backing(BTreeMap::new()));
    ordered += &pieces;
    println!("ordered:     {ordered}");
    println!("equal:       {}", ordered == pieces);

    ordered.normalize();
    println!("normalized:  {ordered}");
    let scaled = &pieces / pieces.total_count();
    println!("matches scaled copy: {}", ordered.equals(&scaled, 1e-9));

    match ordered.counts().at(&"knight") {
        Ok(count) => println!("knight: {count}"),
        Err(err) => println!("lookup failed: {err}"),
    }
}
