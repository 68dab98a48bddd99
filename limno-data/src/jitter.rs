use crate::axis::label_key;
use std::collections::HashMap;

/// Step added per repeat of a depth reading.
pub const JITTER_STEP: f64 = 0.01;

/// Make repeated depth readings unique.
///
/// The k-th repeat of a value (k = 0 for its first occurrence) becomes
/// `value + 0.01 * k`. First occurrences and ordering are untouched. The
/// counting is keyed on the raw input value, so shifted repeats may still
/// land on a later reading.
pub fn jitter_duplicates(values: &[f64]) -> Vec<f64> {
    let mut seen: HashMap<u64, u32> = HashMap::new();
    values
        .iter()
        .map(|v| {
            let count = seen.entry(label_key(*v)).or_insert(0);
            let adjusted = if *count == 0 {
                *v
            } else {
                v + JITTER_STEP * f64::from(*count)
            };
            *count += 1;
            adjusted
        })
        .collect()
}
