#![no_main]

use std::collections::{BTreeMap, HashMap};

use libfuzzer_sys::fuzz_target;
use tallykit::store::AnyMap;

// Fuzz arbitrary operation sequences on AnyMap
//
// Drives a BTreeMap-backed AnyMap and a plain HashMap model with the same
// insert/upsert/erase/clear stream and checks they agree after every step.
fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let mut map: AnyMap<u8, u32> = AnyMap::from_backing(BTreeMap::new());
    let mut model: HashMap<u8, u32> = HashMap::new();

    let mut idx = 0;
    while idx + 1 < data.len() {
        let op = data[idx] % 6;
        let key = data[idx + 1];

        match op {
            0 => {
                // Insert never overwrites
                let expected_new = !model.contains_key(&key);
                let (value, inserted) = map.insert(key, u32::from(key));
                assert_eq!(inserted, expected_new);
                assert_eq!(*value, *model.entry(key).or_insert(u32::from(key)));
            }
            1 => {
                // Upsert and bump
                *map.get_or_insert_default(key) += 1;
                *model.entry(key).or_default() += 1;
            }
            2 => {
                // Erase reports 0 or 1
                let expected = usize::from(model.remove(&key).is_some());
                assert_eq!(map.erase(&key), expected);
            }
            3 => {
                // Checked lookup agrees with model
                assert_eq!(map.at(&key).ok(), model.get(&key));
                assert_eq!(map.count(&key), usize::from(model.contains_key(&key)));
            }
            4 => {
                // Copies compare equal across backings
                let hashed: AnyMap<u8, u32> = AnyMap::from(model.clone());
                assert_eq!(map, hashed);
                assert_eq!(hashed, map);
            }
            5 => {
                if key % 16 == 0 {
                    map.clear();
                    model.clear();
                }
            }
            _ => unreachable!(),
        }

        assert_eq!(map.len(), model.len());
        assert_eq!(map.is_empty(), model.is_empty());
        idx += 2;
    }

    assert_eq!(map.iter().count(), model.len());
    for (key, value) in &map {
        assert_eq!(model.get(key), Some(value));
    }
});
