//! Doubly linked list used for list-typed values.
//!
//! Nodes live in an arena (`Vec<Node>`) and link to each other by index, so the list owns every
//! node and hands out no references that outlive a call. Slots freed by removals are recycled
//! through a free list.

use bytes::Bytes;

type NodeId = usize;

#[derive(Debug, Clone)]
struct Node {
    value: Bytes,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct List {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl List {
    pub fn new() -> List {
        List::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pushes every value to the head, one after the other, so the last value ends up first.
    pub fn lpush(&mut self, values: impl IntoIterator<Item = Bytes>) {
        for value in values {
            self.push_front(value);
        }
    }

    pub fn rpush(&mut self, values: impl IntoIterator<Item = Bytes>) {
        for value in values {
            self.push_back(value);
        }
    }

    pub fn push_front(&mut self, value: Bytes) {
        let id = self.alloc(value, None, self.head);
        match self.head {
            Some(head) => self.nodes[head].prev = Some(id),
            None => self.tail = Some(id),
        }
        self.head = Some(id);
        self.len += 1;
    }

    pub fn push_back(&mut self, value: Bytes) {
        let id = self.alloc(value, self.tail, None);
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.len += 1;
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len,
        }
    }

    /// Elements in the closed index range `[start, stop]`. Negative indices count from the tail.
    pub fn range(&self, start: i64, stop: i64) -> Vec<Bytes> {
        let Some((start, stop)) = self.resolve_range(start, stop) else {
            return vec![];
        };

        let mut values = Vec::with_capacity(stop - start + 1);
        let mut cursor = self.node_at(start);
        while let Some(id) = cursor {
            if values.len() == stop - start + 1 {
                break;
            }
            values.push(self.nodes[id].value.clone());
            cursor = self.nodes[id].next;
        }
        values
    }

    pub fn index(&self, index: i64) -> Option<Bytes> {
        let index = self.resolve_index(index)?;
        self.node_at(index).map(|id| self.nodes[id].value.clone())
    }

    /// Replaces the element at `index`. Returns `false` when the index is out of range.
    pub fn set(&mut self, index: i64, value: Bytes) -> bool {
        match self.resolve_index(index).and_then(|index| self.node_at(index)) {
            Some(id) => {
                self.nodes[id].value = value;
                true
            }
            None => false,
        }
    }

    /// Inserts `value` next to the first element equal to `pivot`. Returns the new length, or -1
    /// when the pivot is not in the list.
    pub fn insert(&mut self, pivot: &[u8], value: Bytes, before: bool) -> i64 {
        let Some(pivot) = self.find(pivot) else {
            return -1;
        };

        if before {
            let prev = self.nodes[pivot].prev;
            let id = self.alloc(value, prev, Some(pivot));
            self.nodes[pivot].prev = Some(id);
            match prev {
                Some(prev) => self.nodes[prev].next = Some(id),
                None => self.head = Some(id),
            }
        } else {
            let next = self.nodes[pivot].next;
            let id = self.alloc(value, Some(pivot), next);
            self.nodes[pivot].next = Some(id);
            match next {
                Some(next) => self.nodes[next].prev = Some(id),
                None => self.tail = Some(id),
            }
        }

        self.len += 1;
        self.len as i64
    }

    /// Removes occurrences of `value`:
    /// * `count > 0`: the first `count` occurrences, scanning from head to tail.
    /// * `count < 0`: the last `|count|` occurrences, scanning from tail to head.
    /// * `count == 0`: every occurrence.
    ///
    /// Returns the number of removed elements.
    pub fn remove(&mut self, count: i64, value: &[u8]) -> usize {
        let limit = match count {
            0 => usize::MAX,
            count => count.unsigned_abs() as usize,
        };
        let from_tail = count < 0;

        let mut removed = 0;
        let mut cursor = if from_tail { self.tail } else { self.head };
        while let Some(id) = cursor {
            if removed == limit {
                break;
            }
            cursor = if from_tail {
                self.nodes[id].prev
            } else {
                self.nodes[id].next
            };
            if self.nodes[id].value.as_ref() == value {
                self.unlink(id);
                removed += 1;
            }
        }
        removed
    }

    /// Keeps only the closed index range `[start, stop]`. An empty or invalid range clears the
    /// list.
    pub fn trim(&mut self, start: i64, stop: i64) {
        let Some((start, stop)) = self.resolve_range(start, stop) else {
            self.clear();
            return;
        };

        let from_tail = self.len - 1 - stop;
        self.pop_front(start);
        self.pop_back(from_tail);
    }

    /// Pops up to `count` elements from the head, in head-to-tail order.
    pub fn pop_front(&mut self, count: usize) -> Vec<Bytes> {
        let mut popped = Vec::with_capacity(count.min(self.len));
        while popped.len() < count {
            let Some(head) = self.head else { break };
            popped.push(self.unlink(head));
        }
        popped
    }

    /// Pops up to `count` elements from the tail, in tail-to-head order.
    pub fn pop_back(&mut self, count: usize) -> Vec<Bytes> {
        let mut popped = Vec::with_capacity(count.min(self.len));
        while popped.len() < count {
            let Some(tail) = self.tail else { break };
            popped.push(self.unlink(tail));
        }
        popped
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Resolves a possibly negative `[start, stop]` pair against the current length. Negative
    /// indices count from the tail, `start` is clamped to 0 and `stop` to the last element.
    /// Returns `None` when no element falls inside the range.
    fn resolve_range(&self, start: i64, stop: i64) -> Option<(usize, usize)> {
        let len = self.len as i64;
        let start = if start < 0 { start + len } else { start }.max(0);
        let stop = if stop < 0 { stop + len } else { stop }.min(len - 1);

        if start > stop || start >= len {
            return None;
        }
        Some((start as usize, stop as usize))
    }

    fn resolve_index(&self, index: i64) -> Option<usize> {
        let len = self.len as i64;
        let index = if index < 0 { index + len } else { index };
        (0..len).contains(&index).then_some(index as usize)
    }

    /// Walks to the node at `index` from whichever end is closer.
    fn node_at(&self, index: usize) -> Option<NodeId> {
        if index >= self.len {
            return None;
        }

        if index <= self.len / 2 {
            let mut cursor = self.head;
            for _ in 0..index {
                cursor = cursor.and_then(|id| self.nodes[id].next);
            }
            cursor
        } else {
            let mut cursor = self.tail;
            for _ in 0..(self.len - 1 - index) {
                cursor = cursor.and_then(|id| self.nodes[id].prev);
            }
            cursor
        }
    }

    fn find(&self, value: &[u8]) -> Option<NodeId> {
        let mut cursor = self.head;
        while let Some(id) = cursor {
            if self.nodes[id].value.as_ref() == value {
                return Some(id);
            }
            cursor = self.nodes[id].next;
        }
        None
    }

    fn alloc(&mut self, value: Bytes, prev: Option<NodeId>, next: Option<NodeId>) -> NodeId {
        let node = Node { value, prev, next };
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

    /// Detaches a node from its neighbours, releases its slot and returns its value.
    fn unlink(&mut self, id: NodeId) -> Bytes {
        let Node { prev, next, .. } = self.nodes[id];

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }

        let value = std::mem::take(&mut self.nodes[id].value);
        self.nodes[id].prev = None;
        self.nodes[id].next = None;
        self.free.push(id);
        self.len -= 1;

        if self.len == 0 {
            self.clear();
        }
        value
    }
}

pub struct Iter<'a> {
    list: &'a List,
    cursor: Option<NodeId>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let node = &self.list.nodes[id];
        self.cursor = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}
