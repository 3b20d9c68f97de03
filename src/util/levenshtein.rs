//! Edit distance algorithms used by fuzzy matching.
//!
//! Distances are computed over `char`s, not bytes, so non-ASCII terms count
//! one edit per character.

use std::cmp::min;

/// Calculate the edit distance with a maximum threshold for early termination.
///
/// With `transpositions` set, swapping two adjacent characters counts as a
/// single edit (optimal string alignment distance). Returns `None` as soon as
/// the distance is known to exceed `threshold`.
#[allow(clippy::needless_range_loop)]
pub fn edit_distance_within(
    s1: &str,
    s2: &str,
    threshold: usize,
    transpositions: bool,
) -> Option<usize> {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let (len1, len2) = (a.len(), b.len());

    // Early termination if length difference exceeds threshold
    if len1.abs_diff(len2) > threshold {
        return None;
    }
    if len1 == 0 || len2 == 0 {
        return Some(len1.max(len2));
    }

    // Three rows: two back for transpositions, previous, current.
    let mut before_prev = vec![0; len2 + 1];
    let mut prev_row: Vec<usize> = (0..=len2).collect();
    let mut curr_row = vec![0; len2 + 1];

    for i in 1..=len1 {
        curr_row[0] = i;
        let mut min_in_row = i;

        for j in 1..=len2 {
            let cost = usize::from(a[i - 1] != b[j - 1]);

            let mut value = min(
                min(
                    prev_row[j] + 1,     // deletion
                    curr_row[j - 1] + 1, // insertion
                ),
                prev_row[j - 1] + cost, // substitution
            );

            if transpositions && i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                value = min(value, before_prev[j - 2] + 1);
            }

            curr_row[j] = value;
            min_in_row = min(min_in_row, value);
        }

        if min_in_row > threshold {
            return None;
        }

        std::mem::swap(&mut before_prev, &mut prev_row);
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    let distance = prev_row[len2];
    (distance <= threshold).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_distance() {
        assert_eq!(edit_distance_within("", "", 0, false), Some(0));
        assert_eq!(edit_distance_within("", "a", 1, false), Some(1));
        assert_eq!(edit_distance_within("a", "", 1, false), Some(1));
        assert_eq!(edit_distance_within("ab", "ac", 1, false), Some(1));
    }

    #[test]
    fn test_edit_distance_within() {
        assert_eq!(edit_distance_within("kitten", "sitting", 3, false), Some(3));
        assert_eq!(edit_distance_within("kitten", "sitting", 2, false), None);
        assert_eq!(edit_distance_within("frederic", "frederic", 0, true), Some(0));
        assert_eq!(edit_distance_within("a", "abc", 1, true), None);
        assert_eq!(edit_distance_within("a", "ab", 1, true), Some(1));
        assert_eq!(edit_distance_within("", "ab", 2, true), Some(2));
    }

    #[test]
    fn test_transpositions() {
        assert_eq!(edit_distance_within("search", "serach", 2, false), Some(2));
        assert_eq!(edit_distance_within("search", "serach", 1, true), Some(1));
        assert_eq!(edit_distance_within("frederic", "frdeeric", 1, true), Some(1));
        assert_eq!(edit_distance_within("ab", "ba", 1, true), Some(1));
        assert_eq!(edit_distance_within("ab", "ba", 1, false), None);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        assert_eq!(edit_distance_within("café", "cafe", 1, false), Some(1));
        assert_eq!(edit_distance_within("résumé", "resume", 2, true), Some(2));
    }
}
