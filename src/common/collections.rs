//! Hashing collections used throughout the crate.
//!
//! FxHash is noticeably faster than SipHash for the small integer keys we
//! index by (window ids, zone ids, work-area ids).

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<T> = rustc_hash::FxHashSet<T>;

pub use std::collections::BTreeMap;
pub use std::collections::BTreeSet;
pub use std::collections::hash_map;
