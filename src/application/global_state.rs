//! The process-wide client context slot
//!
//! Code under test that cannot take a context explicitly reads the active
//! one from here. Install and restore are a plain save-and-replace: restoring
//! contexts out of order is not detected.

use crate::domain::ClientContext;
use parking_lot::{
    const_reentrant_mutex, const_rwlock, ReentrantMutex, ReentrantMutexGuard, RwLock,
};
use std::sync::Arc;

static ACTIVE: RwLock<Option<Arc<ClientContext>>> = const_rwlock(None);

static FIXTURE_SERIAL: ReentrantMutex<()> = const_reentrant_mutex(());

/// Serializes fixtures across threads; the owning thread may nest them
pub(crate) fn serial_guard() -> ReentrantMutexGuard<'static, ()> {
    FIXTURE_SERIAL.lock()
}

pub struct GlobalStateSwapper;

impl GlobalStateSwapper {
    /// Make `ctx` the active context, returning the one it replaced
    pub fn install(ctx: Arc<ClientContext>) -> Option<Arc<ClientContext>> {
        ACTIVE.write().replace(ctx)
    }

    /// Put `previous` back, returning whatever was active
    pub fn restore(previous: Option<Arc<ClientContext>>) -> Option<Arc<ClientContext>> {
        std::mem::replace(&mut *ACTIVE.write(), previous)
    }

    pub fn active() -> Option<Arc<ClientContext>> {
        ACTIVE.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FixtureParameters, DEFAULT_SERVER_URI};

    fn context(home: &str) -> Arc<ClientContext> {
        Arc::new(ClientContext::new(FixtureParameters::new(
            home,
            DEFAULT_SERVER_URI,
        )))
    }

    #[test]
    fn test_install_and_restore() {
        let _serial = serial_guard();
        let original = GlobalStateSwapper::active();

        let first = context("/tmp/first");
        let replaced = GlobalStateSwapper::install(Arc::clone(&first));
        assert_eq!(
            replaced.as_ref().map(Arc::as_ptr),
            original.as_ref().map(Arc::as_ptr)
        );
        assert!(Arc::ptr_eq(&GlobalStateSwapper::active().unwrap(), &first));

        let second = context("/tmp/second");
        let saved = GlobalStateSwapper::install(Arc::clone(&second));
        assert!(Arc::ptr_eq(saved.as_ref().unwrap(), &first));

        let removed = GlobalStateSwapper::restore(saved);
        assert!(Arc::ptr_eq(&removed.unwrap(), &second));
        assert!(Arc::ptr_eq(&GlobalStateSwapper::active().unwrap(), &first));

        GlobalStateSwapper::restore(original);
    }

    #[test]
    fn test_serial_guard_is_reentrant() {
        let _outer = serial_guard();
        let _inner = serial_guard();
    }
}
