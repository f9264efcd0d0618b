use std::collections::HashMap;

use crate::types::border::ScoreBorder;
use crate::types::skiplist::{Element, NodeId, Skiplist};

/// A set of unique members ordered by score, ties broken by member.
///
/// The skip list answers order and rank questions, the map answers "what is the score of this
/// member" in O(1). Every mutation goes through both so they always hold the same members.
#[derive(Clone, Debug, Default)]
pub struct SortedSet {
    scores: HashMap<String, f64>,
    skiplist: Skiplist,
}

impl SortedSet {
    pub fn new() -> SortedSet {
        SortedSet::default()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Adds `member` or updates its score. Returns `true` only when the member is new.
    pub fn add(&mut self, member: &str, score: f64) -> bool {
        match self.scores.get_mut(member) {
            Some(current) => {
                if *current != score {
                    self.skiplist.remove(member, *current);
                    self.skiplist.insert(member.to_string(), score);
                    *current = score;
                }
                false
            }
            None => {
                self.skiplist.insert(member.to_string(), score);
                self.scores.insert(member.to_string(), score);
                true
            }
        }
    }

    pub fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => {
                self.skiplist.remove(member, score);
                true
            }
            None => false,
        }
    }

    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// 0-based rank of `member`, counted from the highest score when `desc` is set.
    pub fn rank(&self, member: &str, desc: bool) -> Option<usize> {
        let score = self.scores.get(member)?;
        let rank = self.skiplist.rank(member, *score);
        if rank == 0 {
            return None;
        }

        if desc {
            Some(self.skiplist.len() - rank)
        } else {
            Some(rank - 1)
        }
    }

    /// Elements whose 0-based rank lies in `[start, stop]`. Negative indices count from the end.
    pub fn range(&self, start: i64, stop: i64, desc: bool) -> Vec<Element> {
        let size = self.len() as i64;
        let start = if start < 0 { start + size } else { start }.max(0);
        let stop = if stop < 0 { stop + size } else { stop }.min(size - 1);
        if start >= size || start > stop {
            return vec![];
        }

        let (start, count) = (start as usize, (stop - start + 1) as usize);
        let first = if desc {
            self.skiplist.by_rank(self.len() - start)
        } else {
            self.skiplist.by_rank(start + 1)
        };

        self.walk(first, desc).take(count).cloned().collect()
    }

    /// Elements with scores inside `[min, max]`, skipping the first `offset` matches and returning
    /// at most `limit` of them. A negative `limit` means no limit.
    pub fn range_by_score(
        &self,
        min: &ScoreBorder,
        max: &ScoreBorder,
        offset: i64,
        limit: i64,
        desc: bool,
    ) -> Vec<Element> {
        if limit == 0 || offset < 0 {
            return vec![];
        }

        let first = if desc {
            self.skiplist.last_in_score_range(min, max)
        } else {
            self.skiplist.first_in_score_range(min, max)
        };
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        self.walk(first, desc)
            .skip(offset as usize)
            .take_while(|element| min.less(element.score) && max.greater(element.score))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Number of members with scores inside `[min, max]`.
    pub fn count(&self, min: &ScoreBorder, max: &ScoreBorder) -> usize {
        let first = self.skiplist.first_in_score_range(min, max);

        self.walk(first, false)
            .take_while(|element| max.greater(element.score))
            .count()
    }

    /// Removes members with scores inside `[min, max]`, returning how many were removed.
    pub fn remove_by_score(&mut self, min: &ScoreBorder, max: &ScoreBorder) -> usize {
        let removed = self.skiplist.remove_range_by_score(min, max, 0);
        for element in removed.iter() {
            self.scores.remove(&element.member);
        }
        removed.len()
    }

    /// Removes members whose 0-based rank lies in `[start, stop)`, returning how many were removed.
    pub fn remove_by_rank(&mut self, start: usize, stop: usize) -> usize {
        let removed = self.skiplist.remove_range_by_rank(start + 1, stop + 1);
        for element in removed.iter() {
            self.scores.remove(&element.member);
        }
        removed.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> + '_ {
        self.skiplist.iter()
    }

    fn walk(&self, from: Option<NodeId>, desc: bool) -> impl Iterator<Item = &Element> + '_ {
        std::iter::successors(from, move |id| {
            if desc {
                self.skiplist.prev(*id)
            } else {
                self.skiplist.next(*id)
            }
        })
        .map(|id| self.skiplist.element(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zset(pairs: &[(&str, f64)]) -> SortedSet {
        let mut set = SortedSet::new();
        for (member, score) in pairs {
            set.add(member, *score);
        }
        set
    }

    fn members(elements: Vec<Element>) -> Vec<String> {
        elements.into_iter().map(|e| e.member).collect()
    }

    #[test]
    fn add_reports_new_members_only() {
        let mut set = SortedSet::new();

        assert!(set.add("a", 1.0));
        assert!(!set.add("a", 1.0));
        assert!(!set.add("a", 5.0));
        assert_eq!(set.score("a"), Some(5.0));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn update_moves_member() {
        let mut set = zset(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        set.add("a", 10.0);

        assert_eq!(members(set.range(0, -1, false)), vec!["b", "c", "a"]);
        assert_eq!(set.rank("a", false), Some(2));
    }

    #[test]
    fn rank_ascending_and_descending() {
        let set = zset(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);

        assert_eq!(set.rank("a", false), Some(0));
        assert_eq!(set.rank("b", false), Some(1));
        assert_eq!(set.rank("a", true), Some(2));
        assert_eq!(set.rank("c", true), Some(0));
        assert_eq!(set.rank("zz", false), None);
    }

    #[test]
    fn range_with_negative_and_overflowing_indices() {
        let set = zset(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);

        assert_eq!(members(set.range(0, -1, false)), vec!["a", "b", "c", "d"]);
        assert_eq!(members(set.range(1, 2, false)), vec!["b", "c"]);
        assert_eq!(members(set.range(-2, 100, false)), vec!["c", "d"]);
        assert_eq!(members(set.range(0, 1, true)), vec!["d", "c"]);
        assert_eq!(members(set.range(-1, -1, true)), vec!["a"]);
        assert!(set.range(4, 10, false).is_empty());
        assert!(set.range(2, 1, false).is_empty());
    }

    #[test]
    fn range_by_score_with_offset_and_limit() {
        let set = zset(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0), ("e", 5.0)]);
        let all = (ScoreBorder::NegativeInfinity, ScoreBorder::PositiveInfinity);

        assert_eq!(
            members(set.range_by_score(&all.0, &all.1, 0, -1, false)),
            vec!["a", "b", "c", "d", "e"]
        );
        assert_eq!(
            members(set.range_by_score(
                &ScoreBorder::exclusive(1.0),
                &ScoreBorder::inclusive(4.0),
                1,
                2,
                false
            )),
            vec!["c", "d"]
        );
        assert_eq!(
            members(set.range_by_score(
                &ScoreBorder::inclusive(2.0),
                &ScoreBorder::inclusive(4.0),
                0,
                -1,
                true
            )),
            vec!["d", "c", "b"]
        );
        assert!(set.range_by_score(&all.0, &all.1, 0, 0, false).is_empty());
        assert!(set.range_by_score(&all.0, &all.1, 10, -1, false).is_empty());
    }

    #[test]
    fn count_scores() {
        let set = zset(&[("a", 1.0), ("b", 2.0), ("c", 2.0), ("d", 4.0)]);

        assert_eq!(
            set.count(&ScoreBorder::inclusive(2.0), &ScoreBorder::inclusive(2.0)),
            2
        );
        assert_eq!(
            set.count(&ScoreBorder::exclusive(1.0), &ScoreBorder::PositiveInfinity),
            3
        );
        assert_eq!(
            set.count(&ScoreBorder::inclusive(5.0), &ScoreBorder::PositiveInfinity),
            0
        );
    }

    #[test]
    fn removals_keep_map_and_skiplist_in_sync() {
        let mut set = zset(&[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0), ("e", 5.0)]);

        assert!(set.remove("c"));
        assert!(!set.remove("c"));
        assert_eq!(set.len(), set.skiplist.len());

        assert_eq!(
            set.remove_by_score(&ScoreBorder::inclusive(4.0), &ScoreBorder::PositiveInfinity),
            2
        );
        assert_eq!(set.len(), set.skiplist.len());
        assert_eq!(set.score("d"), None);

        assert_eq!(set.remove_by_rank(0, 1), 1);
        assert_eq!(set.len(), set.skiplist.len());
        assert_eq!(members(set.range(0, -1, false)), vec!["b"]);
    }

    #[test]
    fn len_tracks_both_structures() {
        let mut set = SortedSet::new();
        for i in 0..100 {
            set.add(&format!("m{}", i % 40), i as f64);
            assert_eq!(set.len(), set.skiplist.len());
        }
        for i in 0..20 {
            set.remove(&format!("m{i}"));
            assert_eq!(set.len(), set.skiplist.len());
        }
        assert_eq!(set.len(), 20);
    }
}
