//! Free-list object pool for high-churn entities
//!
//! The pool never enforces a ceiling; owners check their live count before
//! acquiring.

/// Reusable storage for values of type `T`
pub struct Pool<T> {
    free: Vec<T>,
    created: usize,
    factory: fn() -> T,
    reset: fn(&mut T),
}

impl<T> Pool<T> {
    pub fn new(factory: fn() -> T, reset: fn(&mut T)) -> Self {
        Self {
            free: Vec::new(),
            created: 0,
            factory,
            reset,
        }
    }

    /// Reuse a released value, or build a fresh one
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(obj) => obj,
            None => {
                self.created += 1;
                (self.factory)()
            }
        }
    }

    /// Reset and keep for reuse
    pub fn release(&mut self, mut obj: T) {
        (self.reset)(&mut obj);
        self.free.push(obj);
    }

    /// Values waiting on the free list
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Total values ever built by the factory
    pub fn created(&self) -> usize {
        self.created
    }
}

impl<T> std::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("free", &self.free.len())
            .field("created", &self.created)
            .finish()
    }
}
