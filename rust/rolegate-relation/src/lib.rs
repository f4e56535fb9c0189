#![warn(missing_docs)]

//! Many-to-many relations stored as a pair of sorted indices.
//!
//! A [`Relation`] keeps every `(a, b)` pair twice: once in a _forward_ index
//! keyed by [`CompositeKey::new(a, b)`](CompositeKey::new), and once in a
//! _backward_ index keyed by `CompositeKey::new(b, a)`. Because a composite
//! key places its first id in the high 32 bits, all keys sharing a first id
//! sit next to each other in key order. "Every `b` related to `a`" is then a
//! single range scan over the forward index, and "every `a` related to `b`"
//! is the same scan over the backward index.
//!
//! ```
//! use rolegate_relation::Relation;
//!
//! let mut membership = Relation::<()>::default();
//!
//! membership.link(1, 5, ()).unwrap();
//! membership.link(2, 5, ()).unwrap();
//! membership.link(1, 6, ()).unwrap();
//!
//! assert_eq!(membership.forward_neighbors(1).collect::<Vec<_>>(), vec![5, 6]);
//! assert_eq!(membership.backward_neighbors(5).collect::<Vec<_>>(), vec![1, 2]);
//!
//! // Pairs are a set: linking twice is reported, not merged
//! assert!(membership.link(1, 5, ()).is_err());
//! ```
//!
//! Rows may carry a payload. The payload is stored once, behind an
//! [`Arc`](std::sync::Arc), and both indices point at the same allocation so
//! that the two directions can never disagree about it.
//!
//! `Relation` performs no locking of its own. Owners that share a relation
//! across threads are expected to wrap it (together with whatever else must
//! change in the same step) in a single lock.

mod key;
pub use key::*;

mod error;
pub use error::*;

mod relation;
pub use relation::*;
