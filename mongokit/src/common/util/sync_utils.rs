use parking_lot::RwLock;
use std::sync::Arc;

/// State shared between clones of a handle, behind a read-write lock.
pub type Atomic<T> = Arc<RwLock<T>>;

pub fn atomic<T>(value: T) -> Atomic<T> {
    Arc::new(RwLock::new(value))
}

/// Scoped access to an [Atomic]; the guard never outlives the closure.
pub trait Guarded<T> {
    fn read_with<R>(&self, f: impl FnOnce(&T) -> R) -> R;

    fn write_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

impl<T> Guarded<T> for Atomic<T> {
    #[inline]
    fn read_with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.read())
    }

    #[inline]
    fn write_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.write())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_and_write_through_closures() {
        let names = atomic(vec!["main".to_string()]);
        names.write_with(|names| names.push("reporting".to_string()));
        assert_eq!(names.read_with(|names| names.len()), 2);
    }

    #[test]
    fn clones_share_state() {
        let counter = atomic(0u32);
        let other = counter.clone();
        other.write_with(|n| *n += 1);
        assert_eq!(counter.read_with(|n| *n), 1);
    }
}
