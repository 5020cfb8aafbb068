#![no_main]

use std::collections::{BTreeMap, HashMap};

use libfuzzer_sys::fuzz_target;
use tallykit::counter::Count;
use tallykit::counter_map::CounterMap;
use tallykit::factory::MapTypeCounterFactory;
use tallykit::store::AnyMap;

// Fuzz arbitrary operation sequences on CounterMap
//
// Mirrors every operation into a nested HashMap model and checks lookups,
// key lifetimes, and the cached grand total.
fuzz_target!(|data: &[u8]| {
    let mut map: CounterMap<u8, u8> = CounterMap::from_parts(
        AnyMap::from_backing(BTreeMap::new()),
        &MapTypeCounterFactory::<HashMap<u8, Count>>::new(),
    );
    let mut model: HashMap<u8, HashMap<u8, Count>> = HashMap::new();

    for chunk in data.chunks_exact(4) {
        let key = chunk[1] % 8;
        let value = chunk[2] % 8;
        let amount = f64::from(chunk[3] % 4);

        match chunk[0] % 5 {
            0 => {
                map.increment_count(key, value, amount);
                *model.entry(key).or_default().entry(value).or_default() += amount;
            }
            1 => {
                map.set_count(key, value, amount);
                model.entry(key).or_default().insert(value, amount);
            }
            2 => {
                // Removing a value keeps its key
                let expected = model.get_mut(&key).and_then(|inner| inner.remove(&value));
                assert_eq!(map.remove_value(&key, &value), expected);
            }
            3 => {
                assert_eq!(map.remove(&key), model.remove(&key).is_some());
            }
            4 => {
                map.ensure_counter(key);
                model.entry(key).or_default();
            }
            _ => unreachable!(),
        }

        assert_eq!(map.len(), model.len());
        assert_eq!(map.contains(&key), model.contains_key(&key));
        assert_eq!(map.len_of(&key), model.get(&key).map_or(0, HashMap::len));
        let expected_count = model
            .get(&key)
            .and_then(|inner| inner.get(&value))
            .copied()
            .unwrap_or(0.0);
        assert_eq!(map.get_count(&key, &value), expected_count);

        let total: Count = model.values().flat_map(HashMap::values).sum();
        assert_eq!(map.total_count(), total);
    }
});
