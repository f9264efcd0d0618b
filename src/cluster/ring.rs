use std::collections::HashMap;

/// Virtual points placed on the ring for every node.
pub const REPLICAS: usize = 4;

/// Consistent-hash ring mapping keys to node identifiers.
///
/// Every node owns [`REPLICAS`] points, hashed with crc32 from `"{i}{node}"`. A key belongs to the
/// node owning the first point at or after the key's hash, wrapping around to the first point.
#[derive(Debug, Clone, Default)]
pub struct HashRing {
    replicas: usize,
    points: Vec<u32>,
    owners: HashMap<u32, String>,
}

impl HashRing {
    pub fn new() -> HashRing {
        HashRing::with_replicas(REPLICAS)
    }

    pub fn with_replicas(replicas: usize) -> HashRing {
        HashRing {
            replicas,
            points: vec![],
            owners: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn add_node(&mut self, node: &str) {
        if node.is_empty() {
            return;
        }

        for i in 0..self.replicas {
            let point = crc32fast::hash(format!("{}{}", i, node).as_bytes());
            // On a collision the last node added owns the point.
            if self.owners.insert(point, node.to_string()).is_none() {
                self.points.push(point);
            }
        }

        self.points.sort_unstable();
    }

    pub fn add_nodes<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for node in nodes {
            self.add_node(node.as_ref());
        }
    }

    /// Node responsible for `key`, or `None` while the ring is empty.
    pub fn pick_node(&self, key: &str) -> Option<&str> {
        if self.points.is_empty() {
            return None;
        }

        let hash = crc32fast::hash(partition_key(key).as_bytes());
        let mut idx = self.points.partition_point(|point| *point < hash);
        if idx == self.points.len() {
            idx = 0;
        }

        self.owners.get(&self.points[idx]).map(String::as_str)
    }
}

/// The part of `key` that is hashed: the text between the first `{` and the following `}` when
/// it is not empty, otherwise the whole key.
fn partition_key(key: &str) -> &str {
    let Some(open) = key.find('{') else {
        return key;
    };

    match key[open + 1..].find('}') {
        Some(len) if len > 0 => &key[open + 1..open + 1 + len],
        _ => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(nodes: &[&str]) -> HashRing {
        let mut ring = HashRing::new();
        ring.add_nodes(nodes);
        ring
    }

    #[test]
    fn empty_ring() {
        let ring = HashRing::new();

        assert!(ring.is_empty());
        assert_eq!(ring.pick_node("key"), None);
    }

    #[test]
    fn single_node_owns_everything() {
        let ring = ring(&["127.0.0.1:6379"]);

        for key in ["a", "b", "user:1", "{tag}x", ""] {
            assert_eq!(ring.pick_node(key), Some("127.0.0.1:6379"));
        }
    }

    #[test]
    fn pick_is_deterministic() {
        let nodes = ["127.0.0.1:7001", "127.0.0.1:7002", "127.0.0.1:7003"];
        let a = ring(&nodes);
        let b = ring(&["127.0.0.1:7003", "127.0.0.1:7001", "127.0.0.1:7002"]);

        for i in 0..200 {
            let key = format!("key:{}", i);
            let picked = a.pick_node(&key);
            assert!(picked.is_some());
            assert_eq!(picked, a.pick_node(&key));
            assert_eq!(picked, b.pick_node(&key));
        }
    }

    #[test]
    fn places_replicas_per_node() {
        let ring = ring(&["a", "b"]);

        assert_eq!(ring.points.len(), 2 * REPLICAS);
        assert!(ring.points.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn empty_node_is_ignored() {
        let ring = ring(&["", "a"]);

        assert_eq!(ring.points.len(), REPLICAS);
    }

    #[test]
    fn hash_tags_colocate_keys() {
        let ring = ring(&["127.0.0.1:7001", "127.0.0.1:7002", "127.0.0.1:7003"]);
        let owner = ring.pick_node("user");

        for key in ["{user}:name", "{user}:email", "x{user}y", "{user}"] {
            assert_eq!(ring.pick_node(key), owner);
        }
    }

    #[test]
    fn partition_keys() {
        assert_eq!(partition_key("plain"), "plain");
        assert_eq!(partition_key("{tag}rest"), "tag");
        assert_eq!(partition_key("a{tag}b{other}"), "tag");
        assert_eq!(partition_key("{}empty"), "{}empty");
        assert_eq!(partition_key("{unclosed"), "{unclosed");
        assert_eq!(partition_key("}{x}"), "x");
    }

    #[test]
    fn wraps_past_the_last_point() {
        let ring = ring(&["a", "b", "c"]);
        let first_owner = ring.owners.get(&ring.points[0]).map(String::as_str);

        // A key hashing past the last point belongs to the owner of the first point.
        let key = (0..10_000)
            .map(|i| format!("k{}", i))
            .find(|key| crc32fast::hash(key.as_bytes()) > *ring.points.last().unwrap())
            .expect("some key hashes past the last point");

        assert_eq!(ring.pick_node(&key), first_owner);
    }

    #[test]
    fn adding_a_node_moves_few_keys() {
        let before = ring(&["a", "b", "c"]);
        let after = ring(&["a", "b", "c", "d"]);

        for i in 0..500 {
            let key = format!("key:{}", i);
            let (old, new) = (before.pick_node(&key), after.pick_node(&key));
            // Keys either stay put or move to the new node.
            assert!(old == new || new == Some("d"));
        }
    }
}
