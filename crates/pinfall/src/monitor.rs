//! Lock and wait helpers shared by every station monitor.
//!
//! A poisoned monitor means an actor thread panicked while inside a station.
//! The state is still consistent at every await point, so we log and carry on
//! with the inner value; the panic itself resurfaces when the driver joins
//! the offending thread.

use std::sync::{Condvar, Mutex, MutexGuard};

pub(crate) fn lock<'a, T>(monitor: &'static str, mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(monitor, "Monitor lock poisoned - continuing with inner state");
            poisoned.into_inner()
        }
    }
}

/// Park on `condvar` once. Callers always recheck their predicate afterwards,
/// so a spurious wakeup is indistinguishable from a real one.
pub(crate) fn wait<'a, T>(
    monitor: &'static str,
    condvar: &Condvar,
    guard: MutexGuard<'a, T>,
) -> MutexGuard<'a, T> {
    match condvar.wait(guard) {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(monitor, "Monitor poisoned while waiting - continuing with inner state");
            poisoned.into_inner()
        }
    }
}
