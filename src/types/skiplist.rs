//! Skip list ordered by `(score, member)`, with per-level spans so that ranks can be computed in
//! O(log n).
//!
//! Nodes are stored in an arena and addressed by index. The header is not a node: it is a
//! separate fixed array of [`MAX_LEVEL`] levels, so it never has to carry a fake element.

use crate::types::border::ScoreBorder;

pub const MAX_LEVEL: usize = 16;

pub type NodeId = usize;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub member: String,
    pub score: f64,
}

#[derive(Clone, Copy, Debug, Default)]
struct Level {
    forward: Option<NodeId>,
    /// Number of level-0 nodes jumped over by `forward`. For the last node of a level this is the
    /// number of nodes after it.
    span: usize,
}

#[derive(Clone, Debug, Default)]
struct Node {
    element: Element,
    backward: Option<NodeId>,
    levels: Vec<Level>,
}

/// Position during a descent: either the header or a real node.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Cursor {
    Header,
    Node(NodeId),
}

#[derive(Clone, Debug)]
pub struct Skiplist {
    header: [Level; MAX_LEVEL],
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    tail: Option<NodeId>,
    length: usize,
    level: usize,
}

impl Default for Skiplist {
    fn default() -> Self {
        Self::new()
    }
}

impl Skiplist {
    pub fn new() -> Skiplist {
        Skiplist {
            header: [Level::default(); MAX_LEVEL],
            nodes: Vec::new(),
            free: Vec::new(),
            tail: None,
            length: 0,
            level: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn insert(&mut self, member: String, score: f64) -> NodeId {
        let mut update = [Cursor::Header; MAX_LEVEL];
        let mut rank = [0usize; MAX_LEVEL];

        let mut x = Cursor::Header;
        for i in (0..self.level).rev() {
            rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
            while let Some(next) = self.level_at(x, i).forward {
                if !precedes(self.element(next), score, &member) {
                    break;
                }
                rank[i] += self.level_at(x, i).span;
                x = Cursor::Node(next);
            }
            update[i] = x;
        }

        let level = random_level();
        if level > self.level {
            for i in self.level..level {
                rank[i] = 0;
                update[i] = Cursor::Header;
                self.header[i].span = self.length;
            }
            self.level = level;
        }

        let id = self.alloc(Node {
            element: Element { member, score },
            backward: None,
            levels: vec![Level::default(); level],
        });

        for i in 0..level {
            let pred = *self.level_at(update[i], i);
            let distance = rank[0] - rank[i];

            self.nodes[id].levels[i] = Level {
                forward: pred.forward,
                span: pred.span - distance,
            };
            let pred = self.level_at_mut(update[i], i);
            pred.forward = Some(id);
            pred.span = distance + 1;
        }

        // Levels above the new node now jump over one more node.
        for (i, pred) in update.iter().enumerate().take(self.level).skip(level) {
            self.level_at_mut(*pred, i).span += 1;
        }

        self.nodes[id].backward = match update[0] {
            Cursor::Header => None,
            Cursor::Node(pred) => Some(pred),
        };
        match self.nodes[id].levels[0].forward {
            Some(next) => self.nodes[next].backward = Some(id),
            None => self.tail = Some(id),
        }

        self.length += 1;
        id
    }

    pub fn remove(&mut self, member: &str, score: f64) -> bool {
        let mut update = [Cursor::Header; MAX_LEVEL];

        let mut x = Cursor::Header;
        for i in (0..self.level).rev() {
            while let Some(next) = self.level_at(x, i).forward {
                if !precedes(self.element(next), score, member) {
                    break;
                }
                x = Cursor::Node(next);
            }
            update[i] = x;
        }

        match self.level_at(x, 0).forward {
            Some(id) if self.element(id).score == score && self.element(id).member == member => {
                self.remove_node(id, &update);
                true
            }
            _ => false,
        }
    }

    /// 1-based rank of the element, or 0 if it is not in the list.
    pub fn rank(&self, member: &str, score: f64) -> usize {
        let mut rank = 0;

        let mut x = Cursor::Header;
        for i in (0..self.level).rev() {
            while let Some(next) = self.level_at(x, i).forward {
                let element = self.element(next);
                let at_or_before = element.score < score
                    || (element.score == score && element.member.as_str() <= member);
                if !at_or_before {
                    break;
                }
                rank += self.level_at(x, i).span;
                x = Cursor::Node(next);
            }

            if let Cursor::Node(id) = x {
                let element = self.element(id);
                if element.member == member && element.score == score {
                    return rank;
                }
            }
        }
        0
    }

    /// Node at the 1-based `rank`.
    pub(crate) fn by_rank(&self, rank: usize) -> Option<NodeId> {
        let mut traversed = 0;

        let mut x = Cursor::Header;
        for i in (0..self.level).rev() {
            while let Some(next) = self.level_at(x, i).forward {
                let span = self.level_at(x, i).span;
                if traversed + span > rank {
                    break;
                }
                traversed += span;
                x = Cursor::Node(next);
            }

            if traversed == rank {
                if let Cursor::Node(id) = x {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Whether at least one element could fall inside `[min, max]`.
    fn has_in_range(&self, min: &ScoreBorder, max: &ScoreBorder) -> bool {
        if !ScoreBorder::is_satisfiable(min, max) {
            return false;
        }
        match (self.first(), self.tail) {
            (Some(first), Some(last)) => {
                min.less(self.element(last).score) && max.greater(self.element(first).score)
            }
            _ => false,
        }
    }

    /// Lowest-ranked node whose score is inside `[min, max]`.
    pub(crate) fn first_in_score_range(
        &self,
        min: &ScoreBorder,
        max: &ScoreBorder,
    ) -> Option<NodeId> {
        if !self.has_in_range(min, max) {
            return None;
        }

        let mut x = Cursor::Header;
        for i in (0..self.level).rev() {
            while let Some(next) = self.level_at(x, i).forward {
                if min.less(self.element(next).score) {
                    break;
                }
                x = Cursor::Node(next);
            }
        }

        let id = self.level_at(x, 0).forward?;
        max.greater(self.element(id).score).then_some(id)
    }

    /// Highest-ranked node whose score is inside `[min, max]`.
    pub(crate) fn last_in_score_range(
        &self,
        min: &ScoreBorder,
        max: &ScoreBorder,
    ) -> Option<NodeId> {
        if !self.has_in_range(min, max) {
            return None;
        }

        let mut x = Cursor::Header;
        for i in (0..self.level).rev() {
            while let Some(next) = self.level_at(x, i).forward {
                if !max.greater(self.element(next).score) {
                    break;
                }
                x = Cursor::Node(next);
            }
        }

        match x {
            Cursor::Node(id) if min.less(self.element(id).score) => Some(id),
            _ => None,
        }
    }

    /// Removes elements with scores inside `[min, max]`, lowest first, stopping after `limit`
    /// removals when `limit` is non-zero.
    pub fn remove_range_by_score(
        &mut self,
        min: &ScoreBorder,
        max: &ScoreBorder,
        limit: usize,
    ) -> Vec<Element> {
        let mut update = [Cursor::Header; MAX_LEVEL];

        let mut x = Cursor::Header;
        for i in (0..self.level).rev() {
            while let Some(next) = self.level_at(x, i).forward {
                if min.less(self.element(next).score) {
                    break;
                }
                x = Cursor::Node(next);
            }
            update[i] = x;
        }

        let mut removed = vec![];
        let mut cursor = self.level_at(x, 0).forward;
        while let Some(id) = cursor {
            if !max.greater(self.element(id).score) {
                break;
            }
            cursor = self.nodes[id].levels[0].forward;
            removed.push(self.remove_node(id, &update));
            if limit > 0 && removed.len() == limit {
                break;
            }
        }
        removed
    }

    /// Removes elements whose 1-based rank lies in `[start, stop)`.
    pub fn remove_range_by_rank(&mut self, start: usize, stop: usize) -> Vec<Element> {
        let mut update = [Cursor::Header; MAX_LEVEL];
        let mut traversed = 0;

        let mut x = Cursor::Header;
        for i in (0..self.level).rev() {
            while let Some(next) = self.level_at(x, i).forward {
                let span = self.level_at(x, i).span;
                if traversed + span >= start {
                    break;
                }
                traversed += span;
                x = Cursor::Node(next);
            }
            update[i] = x;
        }

        let mut removed = vec![];
        let mut rank = traversed + 1;
        let mut cursor = self.level_at(x, 0).forward;
        while let Some(id) = cursor {
            if rank >= stop {
                break;
            }
            cursor = self.nodes[id].levels[0].forward;
            removed.push(self.remove_node(id, &update));
            rank += 1;
        }
        removed
    }

    pub(crate) fn first(&self) -> Option<NodeId> {
        self.header[0].forward
    }

    pub(crate) fn last(&self) -> Option<NodeId> {
        self.tail
    }

    pub(crate) fn next(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].levels[0].forward
    }

    pub(crate) fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].backward
    }

    pub(crate) fn element(&self, id: NodeId) -> &Element {
        &self.nodes[id].element
    }

    /// Elements in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> + '_ {
        std::iter::successors(self.first(), |id| self.next(*id)).map(|id| self.element(id))
    }

    /// Unlinks `id` given its predecessor at every level, and returns its element.
    fn remove_node(&mut self, id: NodeId, update: &[Cursor; MAX_LEVEL]) -> Element {
        let levels = std::mem::take(&mut self.nodes[id].levels);

        for (i, pred) in update.iter().enumerate().take(self.level) {
            let pred = self.level_at_mut(*pred, i);
            if pred.forward == Some(id) {
                pred.span = pred.span + levels[i].span - 1;
                pred.forward = levels[i].forward;
            } else {
                pred.span -= 1;
            }
        }

        let backward = self.nodes[id].backward.take();
        match levels[0].forward {
            Some(next) => self.nodes[next].backward = backward,
            None => self.tail = backward,
        }

        while self.level > 1 && self.header[self.level - 1].forward.is_none() {
            self.level -= 1;
        }
        self.length -= 1;

        self.free.push(id);
        std::mem::take(&mut self.nodes[id].element)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn level_at(&self, at: Cursor, i: usize) -> &Level {
        match at {
            Cursor::Header => &self.header[i],
            Cursor::Node(id) => &self.nodes[id].levels[i],
        }
    }

    fn level_at_mut(&mut self, at: Cursor, i: usize) -> &mut Level {
        match at {
            Cursor::Header => &mut self.header[i],
            Cursor::Node(id) => &mut self.nodes[id].levels[i],
        }
    }
}

/// Whether `element` sorts strictly before `(score, member)`.
fn precedes(element: &Element, score: f64, member: &str) -> bool {
    element.score < score || (element.score == score && element.member.as_str() < member)
}

/// Geometric level: 1 with probability 1/2, 2 with 1/4, and so on, capped at [`MAX_LEVEL`].
fn random_level() -> usize {
    let mut level = 1;
    while level < MAX_LEVEL && rand::random::<bool>() {
        level += 1;
    }
    level
}
