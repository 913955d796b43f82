//! The currently active set of flags, shared between evaluation and whatever refreshes flags from
//! the repository or cache.
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, warn};

use crate::{
    flag::{FlagDefinition, FlagScope},
    FlagSnapshot, Result,
};

/// Holds the active [`FlagSnapshot`] together with a version that is bumped on every publish.
///
/// Snapshots are never edited in place. A refresh builds a new snapshot and publishes it with
/// [`set_snapshot`](FlagStore::set_snapshot); readers that already hold the previous one keep using
/// it until they are done.
#[derive(Default)]
pub struct FlagStore {
    current: RwLock<Published>,
}

#[derive(Default)]
struct Published {
    version: u64,
    snapshot: Option<Arc<FlagSnapshot>>,
}

impl FlagStore {
    pub fn new() -> Self {
        FlagStore::default()
    }

    /// The active snapshot, or `None` if nothing has been published yet.
    pub fn get_snapshot(&self) -> Option<Arc<FlagSnapshot>> {
        self.read(|current| current.snapshot.clone())
    }

    /// Version of the active snapshot. `0` until the first publish.
    pub fn version(&self) -> u64 {
        self.read(|current| current.version)
    }

    /// An owned copy of one flag from the active snapshot, e.g. to edit it through
    /// [`management`](crate::flag::management) before publishing a new snapshot.
    ///
    /// Same results as [`FlagSnapshot::get_flag`]; `Ok(None)` also covers "nothing published".
    pub fn get_flag(&self, scope: FlagScope, key: &str) -> Result<Option<FlagDefinition>> {
        let Some(snapshot) = self.get_snapshot() else {
            return Ok(None);
        };
        let flag = snapshot.get_flag(scope, key)?;
        Ok(flag.cloned())
    }

    /// Publish `snapshot`, replacing the active one, and return its version.
    pub fn set_snapshot(&self, snapshot: impl Into<Arc<FlagSnapshot>>) -> u64 {
        let snapshot = snapshot.into();
        let flags = snapshot.len();
        let unparsable = flags - snapshot.flags().count();

        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let replaced = current.snapshot.as_ref().map_or(0, |previous| previous.len());
        if flags == 0 && replaced > 0 {
            warn!(target: "propel", replaced; "publishing an empty flag snapshot");
        }
        if unparsable > 0 {
            warn!(target: "propel", unparsable; "publishing a snapshot with unparsable flags");
        }

        current.version += 1;
        current.snapshot = Some(snapshot);
        debug!(target: "propel", version = current.version, flags; "published flag snapshot");
        current.version
    }

    fn read<R>(&self, f: impl FnOnce(&Published) -> R) -> R {
        // Publishing only swaps whole values, so a poisoned lock still holds a usable snapshot.
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        f(&current)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::FlagStore;
    use crate::{
        flag::{FlagDefinition, FlagScope},
        Error, FlagSnapshot,
    };

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn dark_mode(scope: FlagScope) -> FlagDefinition {
        FlagDefinition::new("dark-mode", scope, "Dark mode").unwrap()
    }

    #[test]
    fn can_publish_from_another_thread() {
        init();
        let store = Arc::new(FlagStore::new());

        assert!(store.get_snapshot().is_none());
        assert_eq!(store.version(), 0);

        {
            let store = store.clone();
            let _ = std::thread::spawn(move || {
                store.set_snapshot(FlagSnapshot::from_flags([dark_mode(FlagScope::Global)]))
            })
            .join();
        }

        assert_eq!(store.version(), 1);
        let snapshot = store.get_snapshot().unwrap();
        assert!(snapshot
            .get_flag(FlagScope::Global, "dark-mode")
            .unwrap()
            .is_some());
    }

    #[test]
    fn readers_keep_their_snapshot_across_publishes() {
        init();
        let store = FlagStore::new();
        assert_eq!(
            store.set_snapshot(FlagSnapshot::from_flags([dark_mode(FlagScope::Global)])),
            1
        );
        let held = store.get_snapshot().unwrap();

        assert_eq!(
            store.set_snapshot(Arc::new(FlagSnapshot::from_flags([dark_mode(
                FlagScope::Application
            )]))),
            2
        );

        assert!(held.get_flag(FlagScope::Global, "dark-mode").unwrap().is_some());
        assert!(store
            .get_flag(FlagScope::Global, "dark-mode")
            .unwrap()
            .is_none());
        assert!(store
            .get_flag(FlagScope::Application, "dark-mode")
            .unwrap()
            .is_some());

        // An empty snapshot is published like any other.
        assert_eq!(store.set_snapshot(FlagSnapshot::default()), 3);
        assert!(store.get_snapshot().unwrap().is_empty());
    }

    #[test]
    fn get_flag_returns_an_owned_copy() {
        init();
        let store = FlagStore::new();
        assert!(store
            .get_flag(FlagScope::Global, "dark-mode")
            .unwrap()
            .is_none());

        store.set_snapshot(
            FlagSnapshot::from_json(
                br#"{"flags": [
                    {"key": "dark-mode"},
                    {"key": "broken", "configuration": {"activeEvaluationModes": "ON"}}
                ]}"#,
            )
            .unwrap(),
        );

        let mut flag = store
            .get_flag(FlagScope::Global, "dark-mode")
            .unwrap()
            .unwrap();
        flag.turn_on();
        assert_ne!(
            Some(&flag),
            store
                .get_snapshot()
                .unwrap()
                .get_flag(FlagScope::Global, "dark-mode")
                .unwrap()
        );

        assert!(matches!(
            store.get_flag(FlagScope::Global, "broken"),
            Err(Error::FlagParseError)
        ));
    }
}
