//! Functionality for lazy-loading sequences off disk into memory.
//!
//! The main functionality is the very generic [`LazyLoader`]. This is generic over the loading
//! function and the key type. It mainly handles loading data into a [`RefCell`].
//!
use std::cell::{Ref, RefCell};

use crate::error::SeqDistError;
use crate::INTERNAL_ERROR_MESSAGE;

/// A lazy-loader function that takes a reader type `R` and
/// uses it to load in data of type `T`.
type LoaderFunc<R, T, K> = Box<dyn Fn(&mut R, &K) -> Result<T, SeqDistError>>;

/// Lazy loader, which uses [`RefCell`] to store mutable reader and data, used for lazy loading and
/// storing one key's worth of data data.
///
/// Generic key types allow for keys to be region tuples, etc.
///
/// # Generics
///  * `R`: the reader type.
///  * `T`: the data type.
///  * `K`: the key type.
pub struct LazyLoader<R, T, K>
where
    K: std::fmt::Debug,
    T: std::fmt::Debug,
{
    key: RefCell<Option<K>>,
    reader: RefCell<R>,
    loader: LoaderFunc<R, T, K>,
    data: RefCell<Option<T>>,
}

impl<R, T, K: std::fmt::Debug> std::fmt::Debug for LazyLoader<R, T, K>
where
    K: std::fmt::Debug,
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyLoader")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<R, T, K> LazyLoader<R, T, K>
where
    K: std::fmt::Debug,
    T: std::fmt::Debug,
    K: Clone + PartialEq,
{
    pub fn new<F>(reader: R, loader: F) -> LazyLoader<R, T, K>
    where
        F: Fn(&mut R, &K) -> Result<T, SeqDistError> + 'static,
    {
        LazyLoader {
            key: RefCell::new(None),
            reader: RefCell::new(reader),
            loader: Box::new(loader),
            data: RefCell::new(None),
        }
    }

    /// Return a `bool` indicating whether the specified `key` is cached.
    pub fn is_loaded(&self, key: &K) -> bool {
        let loaded_key = self.key.borrow();
        match &*loaded_key {
            None => false,
            Some(existing_key) => *key == *existing_key,
        }
    }

    /// The key of the cached data, if any.
    pub fn loaded_key(&self) -> Option<K> {
        self.key.borrow().clone()
    }

    fn load(&self, key: &K) -> Result<T, SeqDistError> {
        let mut reader = self.reader.borrow_mut();
        (self.loader)(&mut reader, key)
    }

    /// Clear out the cache.
    pub fn clear(&self) {
        *self.data.borrow_mut() = None;
        *self.key.borrow_mut() = None;
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_none()
    }

    /// Load the data corresponding to `key`, replacing whatever was cached,
    /// unless `key` is already loaded.
    pub fn get_data(&self, key: &K) -> Result<Ref<T>, SeqDistError> {
        if !self.is_loaded(key) {
            let new_data = self.load(key)?;
            *self.data.borrow_mut() = Some(new_data);
            *self.key.borrow_mut() = Some(key.clone());
        }

        let data_ref = self.data.borrow();
        Ok(Ref::map(data_ref, |opt| {
            opt.as_ref().unwrap_or_else(|| {
                panic!(
                    "Data should be loaded at this point, but it's not available.\n{}",
                    INTERNAL_ERROR_MESSAGE
                )
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::LazyLoader;
    use crate::error::SeqDistError;
    use std::collections::HashMap;

    #[test]
    fn test_lazyloader_caches_one_key() {
        let mut store = HashMap::new();
        store.insert("chr1".to_string(), vec![1u8, 2, 3]);
        store.insert("chr2".to_string(), vec![4u8]);

        let lazy = LazyLoader::new(store, |store, key: &String| {
            store
                .get(key)
                .cloned()
                .ok_or(SeqDistError::MissingSequenceName(key.clone()))
        });
        assert!(lazy.is_empty());

        assert_eq!(*lazy.get_data(&"chr1".to_string()).unwrap(), vec![1, 2, 3]);
        assert!(lazy.is_loaded(&"chr1".to_string()));

        assert_eq!(*lazy.get_data(&"chr2".to_string()).unwrap(), vec![4]);
        assert!(!lazy.is_loaded(&"chr1".to_string()));
        assert_eq!(lazy.loaded_key(), Some("chr2".to_string()));

        assert!(lazy.get_data(&"chrX".to_string()).is_err());
        // a failed load leaves the previous data in place
        assert!(lazy.is_loaded(&"chr2".to_string()));

        lazy.clear();
        assert!(lazy.is_empty());
        assert_eq!(lazy.loaded_key(), None);
    }
}
