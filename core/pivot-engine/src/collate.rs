//! FILENAME: core/pivot-engine/src/collate.rs
//! Text folding and Norwegian collation for labels.
//!
//! The dashboard labels are Norwegian, so plain byte order is wrong:
//! `æ`, `ø` and `å` sort after `z`, in that order, and case is ignored at
//! the primary level. Byte order is the final tiebreak so the ordering is total.

use std::cmp::Ordering;

/// Lower-cases for case-insensitive matching.
pub fn fold_case(s: &str) -> String {
    s.to_lowercase()
}

/// Primary collation weight of one lower-cased character.
fn weight(c: char) -> (u32, u32) {
    match c {
        'æ' | 'ä' => ('z' as u32 + 1, 0),
        'ø' | 'ö' => ('z' as u32 + 2, 0),
        'å' => ('z' as u32 + 3, 0),
        'á' | 'à' | 'â' => ('a' as u32, 1),
        'é' | 'è' | 'ê' => ('e' as u32, 1),
        'ó' | 'ò' | 'ô' => ('o' as u32, 1),
        'ü' => ('y' as u32, 1),
        other => (other as u32, 0),
    }
}

/// Compares two labels the way a Norwegian reader expects.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    let fa = fold_case(a);
    let fb = fold_case(b);

    let primary = fa
        .chars()
        .map(|c| weight(c).0)
        .cmp(fb.chars().map(|c| weight(c).0));
    if primary != Ordering::Equal {
        return primary;
    }

    let accents = fa
        .chars()
        .map(|c| weight(c).1)
        .cmp(fb.chars().map(|c| weight(c).1));
    accents.then_with(|| a.cmp(b))
}
