//! Lexical diversity
//!
//! Type-token ratio (TTR) and moving-average type-token ratio (MATTR) over a
//! sequence of normalized forms.

use std::collections::{HashMap, HashSet};

/// Type-token ratio: distinct forms over total forms, 0 for an empty sequence
pub fn ttr<S: AsRef<str>>(tokens: &[S]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let types: HashSet<&str> = tokens.iter().map(AsRef::as_ref).collect();
    types.len() as f64 / tokens.len() as f64
}

/// Number of distinct forms in a sequence
pub fn type_count<S: AsRef<str>>(tokens: &[S]) -> usize {
    tokens.iter().map(AsRef::as_ref).collect::<HashSet<&str>>().len()
}

/// Moving-average type-token ratio.
///
/// Slides a window of `window_length` tokens one token at a time and averages
/// the TTR of every window. With `tokens.len() <= window_length` there is a
/// single window covering the whole sequence and the result is exactly
/// [`ttr`]. A `window_length` of 0 is treated as 1.
pub fn mattr<S: AsRef<str>>(tokens: &[S], window_length: usize) -> f64 {
    let window = window_length.max(1);
    if tokens.len() <= window {
        return ttr(tokens);
    }

    // Distinct-type counts maintained incrementally as the window slides
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in &tokens[..window] {
        *counts.entry(token.as_ref()).or_insert(0) += 1;
    }

    let windows = window_count(tokens.len(), window);
    let mut distinct_sum = counts.len();

    for start in 1..windows {
        let leaving = tokens[start - 1].as_ref();
        let emptied = match counts.get_mut(leaving) {
            Some(count) => {
                *count -= 1;
                *count == 0
            }
            None => false,
        };
        if emptied {
            counts.remove(leaving);
        }
        *counts.entry(tokens[start + window - 1].as_ref()).or_insert(0) += 1;
        distinct_sum += counts.len();
    }

    // Mean of distinct/window over all windows
    distinct_sum as f64 / window as f64 / windows as f64
}

/// Number of MATTR windows for a sequence length
pub fn window_count(token_count: usize, window_length: usize) -> usize {
    let window = window_length.max(1);
    token_count.saturating_sub(window).saturating_add(1).max(1)
}
