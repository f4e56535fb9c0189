use crate::{Identifier, RolegateRegistryError};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

struct Entry<V> {
    name: String,
    value: V,
}

/// A bijective table between identifiers and unique names, with a value
/// attached to each entry.
///
/// New identifiers are allocated sequentially: one past the largest live
/// identifier, or `0` when the table is empty.
pub struct Directory<I, V> {
    by_id: BTreeMap<u32, Entry<V>>,
    by_name: BTreeMap<String, u32>,
    kind: PhantomData<I>,
}

impl<I, V> Default for Directory<I, V> {
    fn default() -> Self {
        Self {
            by_id: BTreeMap::new(),
            by_name: BTreeMap::new(),
            kind: PhantomData,
        }
    }
}

impl<I, V> Directory<I, V>
where
    I: Identifier,
{
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// The identifier the next [`Directory::insert`] would allocate.
    pub fn next_id(&self) -> Result<I, RolegateRegistryError> {
        match self.by_id.last_key_value() {
            None => Ok(I::from(0)),
            Some((last, _)) => last
                .checked_add(1)
                .map(I::from)
                .ok_or(RolegateRegistryError::IdentifiersExhausted(I::KIND)),
        }
    }

    /// Allocates an identifier for `name` and stores `value` under it.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: V,
    ) -> Result<I, RolegateRegistryError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(RolegateRegistryError::DuplicateName {
                kind: I::KIND,
                name,
            });
        }

        let id = self.next_id()?;
        self.by_name.insert(name.clone(), id.into());
        self.by_id.insert(id.into(), Entry { name, value });
        Ok(id)
    }

    /// Removes an entry, returning its name and value.
    pub fn remove(&mut self, id: I) -> Option<(String, V)> {
        let entry = self.by_id.remove(&id.into())?;
        self.by_name.remove(&entry.name);
        Some((entry.name, entry.value))
    }

    /// Returns true if `id` names a live entry.
    pub fn exists(&self, id: I) -> bool {
        self.by_id.contains_key(&id.into())
    }

    /// Fails with [`RolegateRegistryError::NotFound`] unless `id` names a
    /// live entry.
    pub fn require(&self, id: I) -> Result<(), RolegateRegistryError> {
        if self.exists(id) {
            Ok(())
        } else {
            Err(RolegateRegistryError::NotFound {
                kind: I::KIND,
                id: id.into(),
            })
        }
    }

    /// The name of an entry.
    pub fn name_of(&self, id: I) -> Option<&str> {
        self.by_id.get(&id.into()).map(|entry| entry.name.as_str())
    }

    /// The identifier of the entry going by `name`.
    pub fn id_of(&self, name: &str) -> Option<I> {
        self.by_name.get(name).copied().map(I::from)
    }

    /// The identifier of the entry going by `name`, failing with
    /// [`RolegateRegistryError::MissingIdentifier`] when there is none.
    pub fn resolve(&self, name: &str) -> Result<I, RolegateRegistryError> {
        self.id_of(name)
            .ok_or_else(|| RolegateRegistryError::MissingIdentifier {
                kind: I::KIND,
                name: name.to_string(),
            })
    }

    /// The value stored under an entry.
    pub fn get(&self, id: I) -> Option<&V> {
        self.by_id.get(&id.into()).map(|entry| &entry.value)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All entries in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &str)> + '_ {
        self.by_id
            .iter()
            .map(|(id, entry)| (I::from(*id), entry.name.as_str()))
    }

    pub(crate) fn id_rows(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.by_id
            .iter()
            .map(|(id, entry)| (*id, entry.name.as_str()))
    }

    pub(crate) fn name_rows(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.by_name.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub(crate) fn name_count(&self) -> usize {
        self.by_name.len()
    }

    #[cfg(test)]
    pub(crate) fn rename_unchecked(&mut self, name: &str, id: u32) {
        self.by_name.insert(name.to_string(), id);
    }
}

impl<I, V> Debug for Directory<I, V>
where
    I: Identifier + Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
