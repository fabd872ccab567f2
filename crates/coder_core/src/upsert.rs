use std::collections::HashMap;
use std::hash::Hash;

/// Key-based merge of `new_records` into an ordered collection.
///
/// Records whose key is `None` are skipped. A record whose key already exists
/// replaces the existing one in place; any other record is appended. When
/// several new records share a key the last one wins. Neither input is
/// modified, and applying the same records twice equals applying them once.
pub fn upsert<T, K, I, F>(collection: &[T], new_records: I, key_of: F) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> Option<K>,
{
    let mut merged = collection.to_vec();
    let mut positions: HashMap<K, usize> = HashMap::with_capacity(merged.len());
    for (index, record) in merged.iter().enumerate() {
        if let Some(key) = key_of(record) {
            positions.entry(key).or_insert(index);
        }
    }

    for record in new_records {
        let Some(key) = key_of(&record) else {
            continue;
        };
        match positions.get(&key) {
            Some(&index) => merged[index] = record,
            None => {
                positions.insert(key, merged.len());
                merged.push(record);
            }
        }
    }

    merged
}
