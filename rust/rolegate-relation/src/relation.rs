use crate::{CompositeKey, RolegateRelationError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A many-to-many relation kept as a forward and a backward sorted index.
///
/// The pair `(a, b)` is stored under `CompositeKey::new(a, b)` in the forward
/// index and under `CompositeKey::new(b, a)` in the backward index. Both
/// entries point at the same payload allocation. A pair is present in the
/// forward index if and only if its mirror is present in the backward index,
/// and each pair appears at most once.
///
/// Use `Relation<()>` for a plain set of pairs.
#[derive(Debug, Clone)]
pub struct Relation<P> {
    forward: BTreeMap<CompositeKey, Arc<P>>,
    backward: BTreeMap<CompositeKey, Arc<P>>,
}

impl<P> Default for Relation<P> {
    fn default() -> Self {
        Self {
            forward: BTreeMap::new(),
            backward: BTreeMap::new(),
        }
    }
}

impl<P> Relation<P> {
    /// Creates an empty relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Relates `a` to `b`, attaching `payload` to the pair.
    ///
    /// Fails with [`RolegateRelationError::AlreadyLinked`] if the pair is
    /// already present in either index; the relation is left untouched.
    pub fn link(&mut self, a: u32, b: u32, payload: P) -> Result<Arc<P>, RolegateRelationError> {
        let forward_key = CompositeKey::new(a, b);
        let backward_key = forward_key.swapped();

        if self.forward.contains_key(&forward_key) || self.backward.contains_key(&backward_key) {
            return Err(RolegateRelationError::AlreadyLinked { a, b });
        }

        let payload = Arc::new(payload);
        self.forward.insert(forward_key, payload.clone());
        self.backward.insert(backward_key, payload.clone());

        tracing::trace!(a, b, "linked");
        Ok(payload)
    }

    /// Removes the pair `(a, b)` from both indices and returns its payload.
    ///
    /// Fails with [`RolegateRelationError::NotLinked`] if the pair is absent
    /// from either index; the relation is left untouched.
    pub fn unlink(&mut self, a: u32, b: u32) -> Result<Arc<P>, RolegateRelationError> {
        let forward_key = CompositeKey::new(a, b);
        let backward_key = forward_key.swapped();

        if !self.backward.contains_key(&backward_key) {
            return Err(RolegateRelationError::NotLinked { a, b });
        }
        let Some(payload) = self.forward.remove(&forward_key) else {
            return Err(RolegateRelationError::NotLinked { a, b });
        };
        self.backward.remove(&backward_key);

        tracing::trace!(a, b, "unlinked");
        Ok(payload)
    }

    /// Returns true if `(a, b)` is present in the forward index.
    pub fn contains(&self, a: u32, b: u32) -> bool {
        self.forward.contains_key(&CompositeKey::new(a, b))
    }

    /// The payload attached to `(a, b)`, if the pair is linked.
    pub fn get(&self, a: u32, b: u32) -> Option<&Arc<P>> {
        self.forward.get(&CompositeKey::new(a, b))
    }

    /// Every `b` related to `a`, in ascending order.
    pub fn forward_neighbors(&self, a: u32) -> impl Iterator<Item = u32> + '_ {
        self.forward
            .range(CompositeKey::span(a))
            .map(|(key, _)| key.low())
    }

    /// Every `a` related to `b`, in ascending order.
    pub fn backward_neighbors(&self, b: u32) -> impl Iterator<Item = u32> + '_ {
        self.backward
            .range(CompositeKey::span(b))
            .map(|(key, _)| key.low())
    }

    /// Every `b` related to `a` together with the pair's payload, in
    /// ascending order of `b`.
    pub fn forward_entries(&self, a: u32) -> impl Iterator<Item = (u32, &Arc<P>)> + '_ {
        self.forward
            .range(CompositeKey::span(a))
            .map(|(key, payload)| (key.low(), payload))
    }

    /// Every `a` related to `b` together with the pair's payload, in
    /// ascending order of `a`.
    pub fn backward_entries(&self, b: u32) -> impl Iterator<Item = (u32, &Arc<P>)> + '_ {
        self.backward
            .range(CompositeKey::span(b))
            .map(|(key, payload)| (key.low(), payload))
    }

    /// Removes every pair whose first coordinate is `a` from both indices.
    /// Returns the number of pairs removed.
    pub fn purge_forward(&mut self, a: u32) -> usize {
        let neighbors = self.forward_neighbors(a).collect::<Vec<_>>();
        for b in &neighbors {
            self.forward.remove(&CompositeKey::new(a, *b));
            self.backward.remove(&CompositeKey::new(*b, a));
        }
        tracing::trace!(a, removed = neighbors.len(), "purged forward");
        neighbors.len()
    }

    /// Removes every pair whose second coordinate is `b` from both indices.
    /// Returns the number of pairs removed.
    pub fn purge_backward(&mut self, b: u32) -> usize {
        let neighbors = self.backward_neighbors(b).collect::<Vec<_>>();
        for a in &neighbors {
            self.forward.remove(&CompositeKey::new(*a, b));
            self.backward.remove(&CompositeKey::new(b, *a));
        }
        tracing::trace!(b, removed = neighbors.len(), "purged backward");
        neighbors.len()
    }

    /// Number of pairs in the forward index.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns true if the relation holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty() && self.backward.is_empty()
    }

    /// Number of entries in the backward index. Equal to [`Relation::len`]
    /// whenever the relation is consistent.
    pub fn backward_len(&self) -> usize {
        self.backward.len()
    }

    /// All forward rows in key order.
    pub fn forward_rows(&self) -> impl Iterator<Item = (CompositeKey, &Arc<P>)> + '_ {
        self.forward.iter().map(|(key, payload)| (*key, payload))
    }

    /// All backward rows in key order.
    pub fn backward_rows(&self) -> impl Iterator<Item = (CompositeKey, &Arc<P>)> + '_ {
        self.backward.iter().map(|(key, payload)| (*key, payload))
    }

    /// Looks a row up by its key in the forward index.
    pub fn forward_get(&self, key: CompositeKey) -> Option<&Arc<P>> {
        self.forward.get(&key)
    }

    /// Looks a row up by its key in the backward index.
    pub fn backward_get(&self, key: CompositeKey) -> Option<&Arc<P>> {
        self.backward.get(&key)
    }
}
