#![no_main]

use libfuzzer_sys::fuzz_target;
use tallykit::counter::Counter;
use tallykit::ds::CachePolicy;

// Fuzz cache coherency of Counter totals
//
// Applies random increment/set/remove/scale operations under both cache
// policies and checks the reported total against a fresh re-sum.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let policy = if data[0] & 1 == 0 {
        CachePolicy::Relaxed
    } else {
        CachePolicy::Persistent
    };
    let mut counter: Counter<u8> = Counter::new();
    counter.set_cache_policy(policy);

    for chunk in data[1..].chunks_exact(3) {
        let value = chunk[1] % 32;
        // Small integral amounts keep float sums exact.
        let amount = f64::from(chunk[2] % 8);

        let mutated = match chunk[0] % 6 {
            0 => {
                counter.increment_count(value, amount);
                true
            }
            1 => {
                counter.set_count(value, amount);
                true
            }
            2 => counter.remove(&value).is_some(),
            3 => {
                counter += amount;
                true
            }
            4 => {
                // Sign flips stay exact and bounded.
                counter *= -1.0;
                true
            }
            5 => {
                counter.reset_cache();
                false
            }
            _ => unreachable!(),
        };

        if policy == CachePolicy::Relaxed && mutated {
            assert!(!counter.is_total_synced());
        }
        if policy == CachePolicy::Persistent && mutated {
            assert!(counter.is_total_synced());
        }

        let resum: f64 = counter.iter().map(|(_, count)| *count).sum();
        assert_eq!(counter.total_count(), resum);
        assert!(counter.is_total_synced());
    }
});
