use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error as ThisError;

use crate::ttl::Ttl;
use crate::types::{Element, List, ScoreBorder, SortedSet};

/// The Store owns every key of the keyspace together with its value and optional expiration.
///
/// All access goes through [`Store::lock`], which holds one mutex for the whole map: a command
/// takes the lock once and every operation it performs, including walking a list or a skip list,
/// happens under it. The store is cheap to clone and share between connections.
///
/// Expiration is lazy. Nothing sweeps expired keys in the background; a lookup that finds an
/// expired value treats it as missing.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<State>>,
}

impl Store {
    pub fn new() -> Store {
        Store::default()
    }

    pub fn lock(&self) -> InnerStoreLocked<'_> {
        let state = self.inner.lock().unwrap();
        InnerStoreLocked { state }
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum StoreError {
    #[error("ERR no such key")]
    KeyNotExists,
    #[error("ERR key expired")]
    KeyExpired,
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    TypeMismatch,
    #[error("ERR index out of range")]
    IndexOutOfRange,
}

type Key = String;

#[derive(Debug, Clone)]
pub enum Data {
    String(Bytes),
    List(List),
    SortedSet(SortedSet),
}

#[derive(Debug, Clone)]
pub struct Value {
    pub data: Data,
    pub ttl: Option<Ttl>,
}

impl Value {
    pub fn new(data: Data) -> Value {
        Value { data, ttl: None }
    }

    pub fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|ttl| ttl.is_expired())
    }
}

#[derive(Default)]
pub struct State {
    keys: HashMap<Key, Value>,
}

pub struct InnerStoreLocked<'a> {
    state: MutexGuard<'a, State>,
}

impl<'a> InnerStoreLocked<'a> {
    /// Stores a string value, replacing whatever the key held before, including its TTL.
    pub fn set(&mut self, key: String, data: Bytes) {
        self.state.keys.insert(key, Value::new(Data::String(data)));
    }

    /// Reads a string value. An expired key yields [`StoreError::KeyExpired`] and stays in the
    /// map; removing it is up to the caller.
    pub fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        let value = self.state.keys.get(key).ok_or(StoreError::KeyNotExists)?;
        if value.is_expired() {
            return Err(StoreError::KeyExpired);
        }
        match &value.data {
            Data::String(data) => Ok(data.clone()),
            _ => Err(StoreError::TypeMismatch),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.state.keys.remove(key)
    }

    /// Whether the key holds a live, unexpired value of any type.
    pub fn exists(&self, key: &str) -> bool {
        self.state
            .keys
            .get(key)
            .is_some_and(|value| !value.is_expired())
    }

    /// Live keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.state
            .keys
            .iter()
            .filter(|(_, value)| !value.is_expired())
            .map(|(key, _)| key)
    }

    /// Expires the key `seconds` from now. Returns `false` when the key is not live.
    pub fn set_ttl(&mut self, key: &str, seconds: i64) -> bool {
        self.set_deadline(key, Ttl::from_seconds(seconds))
    }

    /// Replaces the expiration of a live key. Returns `false` when the key is not live.
    pub fn set_deadline(&mut self, key: &str, ttl: Ttl) -> bool {
        match self.live_mut(key) {
            Some(value) => {
                value.ttl = Some(ttl);
                true
            }
            None => false,
        }
    }

    /// Remaining life of the key in whole seconds, -1 if it has no TTL, -2 if it does not exist.
    pub fn remaining_life(&self, key: &str) -> i64 {
        match self.state.keys.get(key) {
            Some(value) if value.is_expired() => -2,
            Some(Value { ttl: Some(ttl), .. }) => ttl.remaining_seconds(),
            Some(_) => -1,
            None => -2,
        }
    }

    /// Removes the TTL of a live key. Returns `true` only if there was one.
    pub fn persist(&mut self, key: &str) -> bool {
        self.live_mut(key)
            .and_then(|value| value.ttl.take())
            .is_some()
    }

    pub fn lpush(&mut self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError> {
        let list = self.list_or_insert(key)?;
        list.lpush(values);
        Ok(list.len())
    }

    pub fn rpush(&mut self, key: &str, values: Vec<Bytes>) -> Result<usize, StoreError> {
        let list = self.list_or_insert(key)?;
        list.rpush(values);
        Ok(list.len())
    }

    pub fn lrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>, StoreError> {
        Ok(self
            .list_mut(key)?
            .map(|list| list.range(start, stop))
            .unwrap_or_default())
    }

    pub fn llen(&mut self, key: &str) -> Result<usize, StoreError> {
        Ok(self.list_mut(key)?.map(|list| list.len()).unwrap_or(0))
    }

    pub fn lindex(&mut self, key: &str, index: i64) -> Result<Option<Bytes>, StoreError> {
        Ok(self.list_mut(key)?.and_then(|list| list.index(index)))
    }

    /// Returns the new length, -1 if the pivot was not found, 0 if the key does not exist.
    pub fn linsert(
        &mut self,
        key: &str,
        before: bool,
        pivot: &[u8],
        value: Bytes,
    ) -> Result<i64, StoreError> {
        Ok(self
            .list_mut(key)?
            .map(|list| list.insert(pivot, value, before))
            .unwrap_or(0))
    }

    pub fn lrem(&mut self, key: &str, count: i64, value: &[u8]) -> Result<usize, StoreError> {
        let removed = match self.list_mut(key)? {
            Some(list) => list.remove(count, value),
            None => return Ok(0),
        };
        self.remove_if_empty(key);
        Ok(removed)
    }

    pub fn ltrim(&mut self, key: &str, start: i64, stop: i64) -> Result<(), StoreError> {
        if let Some(list) = self.list_mut(key)? {
            list.trim(start, stop);
        }
        self.remove_if_empty(key);
        Ok(())
    }

    pub fn lset(&mut self, key: &str, index: i64, value: Bytes) -> Result<(), StoreError> {
        let list = self.list_mut(key)?.ok_or(StoreError::KeyNotExists)?;
        if list.set(index, value) {
            Ok(())
        } else {
            Err(StoreError::IndexOutOfRange)
        }
    }

    pub fn lpop(&mut self, key: &str, count: usize) -> Result<Vec<Bytes>, StoreError> {
        let popped = match self.list_mut(key)? {
            Some(list) => list.pop_front(count),
            None => return Ok(vec![]),
        };
        self.remove_if_empty(key);
        Ok(popped)
    }

    pub fn rpop(&mut self, key: &str, count: usize) -> Result<Vec<Bytes>, StoreError> {
        let popped = match self.list_mut(key)? {
            Some(list) => list.pop_back(count),
            None => return Ok(vec![]),
        };
        self.remove_if_empty(key);
        Ok(popped)
    }

    /// Adds or updates every `(score, member)` pair. Returns how many members were new.
    pub fn zadd(&mut self, key: &str, pairs: Vec<(f64, String)>) -> Result<usize, StoreError> {
        let zset = self.zset_or_insert(key)?;
        Ok(pairs
            .into_iter()
            .filter(|(score, member)| zset.add(member, *score))
            .count())
    }

    pub fn zrange(
        &mut self,
        key: &str,
        start: i64,
        stop: i64,
        desc: bool,
    ) -> Result<Vec<Element>, StoreError> {
        Ok(self
            .zset_mut(key)?
            .map(|zset| zset.range(start, stop, desc))
            .unwrap_or_default())
    }

    pub fn zrange_by_score(
        &mut self,
        key: &str,
        min: &ScoreBorder,
        max: &ScoreBorder,
        offset: i64,
        limit: i64,
        desc: bool,
    ) -> Result<Vec<Element>, StoreError> {
        Ok(self
            .zset_mut(key)?
            .map(|zset| zset.range_by_score(min, max, offset, limit, desc))
            .unwrap_or_default())
    }

    pub fn zcard(&mut self, key: &str) -> Result<usize, StoreError> {
        Ok(self.zset_mut(key)?.map(|zset| zset.len()).unwrap_or(0))
    }

    pub fn zrem(&mut self, key: &str, members: &[String]) -> Result<usize, StoreError> {
        let removed = match self.zset_mut(key)? {
            Some(zset) => members.iter().filter(|member| zset.remove(member)).count(),
            None => return Ok(0),
        };
        self.remove_if_empty(key);
        Ok(removed)
    }

    pub fn zcount(
        &mut self,
        key: &str,
        min: &ScoreBorder,
        max: &ScoreBorder,
    ) -> Result<usize, StoreError> {
        Ok(self
            .zset_mut(key)?
            .map(|zset| zset.count(min, max))
            .unwrap_or(0))
    }

    pub fn zrank(
        &mut self,
        key: &str,
        member: &str,
        desc: bool,
    ) -> Result<Option<usize>, StoreError> {
        Ok(self.zset_mut(key)?.and_then(|zset| zset.rank(member, desc)))
    }

    /// Drops the key if it has expired. Returns whether it did.
    fn purge_expired(&mut self, key: &str) -> bool {
        let expired = self
            .state
            .keys
            .get(key)
            .is_some_and(|value| value.is_expired());
        if expired {
            self.state.keys.remove(key);
        }
        expired
    }

    fn live_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.purge_expired(key);
        self.state.keys.get_mut(key)
    }

    fn list_mut(&mut self, key: &str) -> Result<Option<&mut List>, StoreError> {
        match self.live_mut(key) {
            None => Ok(None),
            Some(Value {
                data: Data::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(StoreError::TypeMismatch),
        }
    }

    fn list_or_insert(&mut self, key: &str) -> Result<&mut List, StoreError> {
        self.purge_expired(key);
        let value = self
            .state
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Value::new(Data::List(List::new())));
        match &mut value.data {
            Data::List(list) => Ok(list),
            _ => Err(StoreError::TypeMismatch),
        }
    }

    fn zset_mut(&mut self, key: &str) -> Result<Option<&mut SortedSet>, StoreError> {
        match self.live_mut(key) {
            None => Ok(None),
            Some(Value {
                data: Data::SortedSet(zset),
                ..
            }) => Ok(Some(zset)),
            Some(_) => Err(StoreError::TypeMismatch),
        }
    }

    fn zset_or_insert(&mut self, key: &str) -> Result<&mut SortedSet, StoreError> {
        self.purge_expired(key);
        let value = self
            .state
            .keys
            .entry(key.to_string())
            .or_insert_with(|| Value::new(Data::SortedSet(SortedSet::new())));
        match &mut value.data {
            Data::SortedSet(zset) => Ok(zset),
            _ => Err(StoreError::TypeMismatch),
        }
    }

    /// Lists and sorted sets that lose their last element disappear from the keyspace.
    fn remove_if_empty(&mut self, key: &str) {
        let empty = match self.state.keys.get(key).map(|value| &value.data) {
            Some(Data::List(list)) => list.is_empty(),
            Some(Data::SortedSet(zset)) => zset.is_empty(),
            _ => false,
        };
        if empty {
            self.state.keys.remove(key);
        }
    }
}
