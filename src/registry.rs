//! Process-wide cache of type descriptors, keyed on [`TypeId`].

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::schema::{Schema, TypeDescriptor};

type Cache = RwLock<HashMap<TypeId, &'static TypeDescriptor>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Returns the descriptor of `T`, building and caching it on first use.
///
/// `T::describe` runs without holding the lock, since describing a wrapper type resolves the
/// descriptor of the wrapped type. If two threads race on the same type, the first insert wins.
pub fn descriptor_of<T: Schema>() -> &'static TypeDescriptor {
    let id = TypeId::of::<T>();
    if let Some(descriptor) = cache().read().get(&id) {
        return descriptor;
    }
    let built = T::describe();
    log::trace!("registering descriptor for {}", built.name());
    *cache().write().entry(id).or_insert_with(|| built.leak())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_is_cached() {
        let first = descriptor_of::<Vec<i32>>();
        let second = descriptor_of::<Vec<i32>>();
        assert!(std::ptr::eq(first, second));
        assert!(cache().read().contains_key(&TypeId::of::<Vec<i32>>()));
    }
}
