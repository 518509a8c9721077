//! Object pool for transient containers.
//!
//! Dispatch builds a short-lived handler list for every call. The pool keeps
//! released lists (with their capacity) on a free stack so steady-state
//! dispatch does not allocate.
//!
//! The pool is not synchronized. Keep one per thread (see
//! [`registry`](crate::registry)) or wrap it in a lock.

use crate::error::PoolError;
use std::{rc::Rc, sync::Arc};
use tracing::error;

/// Identity check used to detect a double release.
pub trait Poolable {
    /// Whether `self` and `other` are the same instance.
    fn same_instance(&self, other: &Self) -> bool;
}

impl<T> Poolable for Vec<T> {
    fn same_instance(&self, other: &Self) -> bool {
        // An empty Vec has a dangling pointer shared by every other empty Vec.
        self.capacity() != 0 && std::ptr::eq(self.as_ptr(), other.as_ptr())
    }
}

impl<T: ?Sized> Poolable for Arc<T> {
    fn same_instance(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Poolable for Rc<T> {
    fn same_instance(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

type Callback<T> = Box<dyn Fn(&mut T) + Send + Sync>;

/// A free-list pool of reusable instances.
pub struct ObjectPool<T> {
    free: Vec<T>,
    count_all: usize,
    on_get: Option<Callback<T>>,
    on_release: Option<Callback<T>>,
}

impl<T: Poolable + Default> ObjectPool<T> {
    /// Create an empty pool without callbacks.
    pub fn new() -> Self {
        Self {
            free: Vec::new(),
            count_all: 0,
            on_get: None,
            on_release: None,
        }
    }

    /// Set the callback run on every instance handed out by [`get`](Self::get).
    pub fn on_get(mut self, callback: impl Fn(&mut T) + Send + Sync + 'static) -> Self {
        self.on_get = Some(Box::new(callback));
        self
    }

    /// Set the callback run on every instance given back by [`release`](Self::release).
    pub fn on_release(mut self, callback: impl Fn(&mut T) + Send + Sync + 'static) -> Self {
        self.on_release = Some(Box::new(callback));
        self
    }

    /// Take a free instance, or construct a new one if none is free.
    pub fn get(&mut self) -> T {
        let mut item = match self.free.pop() {
            Some(item) => item,
            None => {
                self.count_all += 1;
                T::default()
            }
        };
        if let Some(on_get) = &self.on_get {
            on_get(&mut item);
        }
        item
    }

    /// Return an instance to the pool.
    ///
    /// Releasing the instance that is already on top of the free stack is
    /// reported and rejected; the free list is left untouched.
    pub fn release(&mut self, mut item: T) -> Result<(), PoolError> {
        if self.free.last().is_some_and(|top| top.same_instance(&item)) {
            error!(error = %PoolError::DoubleRelease, "pool release rejected");
            return Err(PoolError::DoubleRelease);
        }
        if let Some(on_release) = &self.on_release {
            on_release(&mut item);
        }
        self.free.push(item);
        Ok(())
    }
}

impl<T> ObjectPool<T> {
    /// Total number of instances this pool has constructed.
    pub fn count_all(&self) -> usize {
        self.count_all
    }

    /// Number of instances currently handed out.
    pub fn count_active(&self) -> usize {
        self.count_all.saturating_sub(self.free.len())
    }

    /// Number of instances waiting on the free stack.
    pub fn count_inactive(&self) -> usize {
        self.free.len()
    }
}

impl<T: Poolable + Default> Default for ObjectPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A pool of `Vec<T>` that clears lists as they are released.
pub type ListPool<T> = ObjectPool<Vec<T>>;

impl<T: 'static> ObjectPool<Vec<T>> {
    /// Create a list pool that clears every released list.
    pub fn for_lists() -> Self {
        Self::new().on_release(|list: &mut Vec<T>| list.clear())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_reuses_released_instance() {
        let mut pool = ListPool::<u32>::for_lists();
        let mut list = pool.get();
        list.extend([1, 2, 3]);
        let capacity = list.capacity();
        pool.release(list).unwrap();

        let reused = pool.get();
        assert!(reused.is_empty());
        assert_eq!(reused.capacity(), capacity);
        assert_eq!(pool.count_all(), 1);
        assert_eq!(pool.count_active(), 1);
    }

    #[test]
    fn test_counts() {
        let mut pool = ListPool::<u8>::for_lists();
        let a = pool.get();
        let b = pool.get();
        assert_eq!(pool.count_all(), 2);
        assert_eq!(pool.count_active(), 2);
        pool.release(a).unwrap();
        assert_eq!(pool.count_inactive(), 1);
        assert_eq!(pool.count_active(), 1);
        pool.release(b).unwrap();
        assert_eq!(pool.count_inactive(), 2);
    }

    #[test]
    fn test_double_release_detected() {
        let mut pool: ObjectPool<Arc<Mutex<Vec<i32>>>> =
            ObjectPool::new().on_release(|shared: &mut Arc<Mutex<Vec<i32>>>| shared.lock().unwrap().clear());
        let shared = pool.get();
        shared.lock().unwrap().push(5);
        let alias = Arc::clone(&shared);

        pool.release(shared).unwrap();
        assert_eq!(pool.release(alias), Err(PoolError::DoubleRelease));
        assert_eq!(pool.count_inactive(), 1);

        // The single free instance comes back once, then a fresh one is built.
        let first = pool.get();
        let second = pool.get();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(pool.count_all(), 2);
    }

    #[test]
    fn test_on_get_callback() {
        let mut pool = ListPool::<i32>::for_lists().on_get(|list| list.reserve(16));
        let list = pool.get();
        assert!(list.capacity() >= 16);
    }

    #[test]
    fn test_empty_vecs_are_distinct() {
        let a: Vec<u8> = Vec::new();
        let b: Vec<u8> = Vec::new();
        assert!(!a.same_instance(&b));
    }
}
