use std::cell::RefCell;
use std::sync::Mutex;

/// Exclusive access to a shared matrix during parallel assembly.
///
/// The matrix itself performs no locking.  An implementation hands out
/// `&mut M` for the duration of `f`: [`Mutex`] for assembly from
/// several threads, [`RefCell`] for single threaded code sharing the
/// matrix between owners.
pub trait Synchronization<M> {
    fn with_exclusive<R>(&self, f: impl FnOnce(&mut M) -> R) -> R;
}

impl<M> Synchronization<M> for Mutex<M> {
    fn with_exclusive<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        // a panicking writer leaves at most a partially added element
        let mut guard = match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl<M> Synchronization<M> for RefCell<M> {
    fn with_exclusive<R>(&self, f: impl FnOnce(&mut M) -> R) -> R {
        f(&mut self.borrow_mut())
    }
}
