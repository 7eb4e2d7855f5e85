//! Shared helpers for tests that touch process-global state.

use std::env;
use std::sync::{Mutex, MutexGuard, PoisonError};

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with the given environment overrides applied.
///
/// Each `(name, Some(value))` pair sets the variable and `(name, None)`
/// unsets it. The previous values come back when `f` returns or panics,
/// and concurrent callers are serialized so parallel tests never observe
/// each other's overrides.
pub fn with_scoped_env<T>(overrides: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
    let _guard = EnvGuard::apply(overrides);
    f()
}

/// Restores the saved variables on drop, before releasing the lock.
struct EnvGuard {
    restore: Vec<(String, Option<String>)>,
    _serialized: MutexGuard<'static, ()>,
}

impl EnvGuard {
    fn apply(overrides: &[(&str, Option<&str>)]) -> Self {
        // A panicking test must not wedge every later env test, so a
        // poisoned lock is still usable.
        let serialized = ENV_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);

        let mut restore: Vec<(String, Option<String>)> = Vec::with_capacity(overrides.len());
        for &(name, value) in overrides {
            // Only the first occurrence of a name holds its original value.
            if !restore.iter().any(|(saved, _)| saved == name) {
                restore.push((name.to_string(), env::var(name).ok()));
            }
            match value {
                Some(v) => env::set_var(name, v),
                None => env::remove_var(name),
            }
        }

        Self {
            restore,
            _serialized: serialized,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in self.restore.drain(..) {
            match value {
                Some(v) => env::set_var(&name, v),
                None => env::remove_var(&name),
            }
        }
    }
}
