//! Merge of the recent and discovery thread candidate pools.
//!
//! Recent items are ground-truth fresh content; discovery only
//! back-fills with items not already surfaced. The merge is therefore a
//! simple concatenation, recent first, with id-level deduplication where
//! the first occurrence wins.

use std::collections::HashSet;

/// Concatenates `recent` then `discover`, dropping any element whose key
/// was already seen. For an id present in both pools the recent copy's
/// fields win.
pub fn merge_pools<T, K, F>(recent: Vec<T>, discover: Vec<T>, key: F) -> Vec<T>
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(recent.len() + discover.len());
    for item in recent.into_iter().chain(discover) {
        if seen.insert(key(&item)) {
            merged.push(item);
        }
    }
    merged
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: &'static str,
        views: i64,
    }

    fn row(id: &'static str, views: i64) -> Row {
        Row { id, views }
    }

    #[test]
    fn output_has_no_duplicate_ids() {
        let recent = vec![row("a", 1), row("b", 1), row("c", 1)];
        let discover = vec![row("b", 9), row("d", 9), row("a", 9)];
        let merged = merge_pools(recent, discover, |r| r.id);
        let ids: Vec<_> = merged.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn recent_copy_wins_on_collision() {
        let recent = vec![row("x", 1)];
        let discover = vec![row("x", 999)];
        let merged = merge_pools(recent, discover, |r| r.id);
        assert_eq!(merged, vec![row("x", 1)]);
    }

    #[test]
    fn either_pool_may_be_empty() {
        let merged = merge_pools(vec![], vec![row("a", 0)], |r: &Row| r.id);
        assert_eq!(merged.len(), 1);
        let merged = merge_pools(vec![row("a", 0)], vec![], |r: &Row| r.id);
        assert_eq!(merged.len(), 1);
        let merged: Vec<Row> = merge_pools(vec![], vec![], |r: &Row| r.id);
        assert!(merged.is_empty());
    }
}
