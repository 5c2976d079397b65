use std::mem;
use std::ops::{Deref, DerefMut};

use tracing::trace;

use super::{HostOs, Os};

/// Holds the active [`Os`] implementation.
///
/// Starts out as [`HostOs`]. Tests swap in another implementation for the
/// length of a scope with [`Registry::swap`].
pub struct Registry {
    current: Box<dyn Os>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Box::new(HostOs::new()))
    }
}

impl Registry {
    pub fn new(os: Box<dyn Os>) -> Self {
        Self { current: os }
    }

    /// The active implementation.
    pub fn os(&self) -> &dyn Os {
        self.current.as_ref()
    }

    pub fn os_mut(&mut self) -> &mut dyn Os {
        self.current.as_mut()
    }

    /// Make `os` active until the returned guard is dropped.
    ///
    /// The previous implementation is restored when the guard goes out of
    /// scope, including during unwinding. The guard borrows the registry,
    /// so nested swaps go through the outer guard and are undone in
    /// reverse order.
    pub fn swap(&mut self, os: Box<dyn Os>) -> SwapGuard<'_> {
        trace!("swap os");
        let previous = mem::replace(&mut self.current, os);
        SwapGuard {
            registry: self,
            previous,
        }
    }

    /// Replace the active implementation for good, returning the old one.
    pub fn replace(&mut self, os: Box<dyn Os>) -> Box<dyn Os> {
        mem::replace(&mut self.current, os)
    }
}

/// Scope of a [`Registry::swap`]. Restores the previous implementation on drop.
#[must_use = "the swapped-in implementation is only active while this guard is held"]
pub struct SwapGuard<'a> {
    registry: &'a mut Registry,
    previous: Box<dyn Os>,
}

impl SwapGuard<'_> {
    /// The implementation that was active before the swap.
    pub fn previous(&self) -> &dyn Os {
        self.previous.as_ref()
    }
}

impl Deref for SwapGuard<'_> {
    type Target = Registry;

    fn deref(&self) -> &Registry {
        self.registry
    }
}

impl DerefMut for SwapGuard<'_> {
    fn deref_mut(&mut self) -> &mut Registry {
        self.registry
    }
}

impl Drop for SwapGuard<'_> {
    fn drop(&mut self) {
        trace!("restore os");
        mem::swap(&mut self.registry.current, &mut self.previous);
    }
}
