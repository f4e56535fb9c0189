//! Shared state guarded by a reader-writer lock.

/// Shared interior mutability cell backed by a [`parking_lot::RwLock`].
///
/// Readers may proceed concurrently with each other, while a writer holds
/// exclusive access for the whole of its critical section. Every compound
/// update performed under [`SharedCell::write`] is therefore observed by
/// readers either entirely or not at all.
///
/// # Example
/// ```
/// use rolegate_common::SharedCell;
///
/// let cell = SharedCell::new(42);
///
/// // Reading
/// {
///     let value = cell.read();
///     assert_eq!(*value, 42);
/// }
///
/// // Writing
/// {
///     let mut value = cell.write();
///     *value = 100;
/// }
///
/// assert_eq!(*cell.read(), 100);
/// ```
#[derive(Debug, Default)]
pub struct SharedCell<T>(parking_lot::RwLock<T>);

impl<T> SharedCell<T> {
    /// Creates a new SharedCell with the given value
    pub fn new(value: T) -> Self {
        Self(parking_lot::RwLock::new(value))
    }

    /// Acquires a read lock, blocking until it can be acquired
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, T> {
        self.0.read()
    }

    /// Acquires a write lock, blocking until it can be acquired
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, T> {
        self.0.write()
    }
}
