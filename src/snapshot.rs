//! An immutable set of flag definitions, as supplied by a repository or cache.
use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    flag::{FlagDefinition, FlagScope, TryParse},
    Error, Result,
};

/// Identity of a flag: keys are unique per scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlagId {
    pub scope: FlagScope,
    pub key: String,
}

/// A snapshot of flag definitions, indexed by [`FlagId`].
///
/// Loading is lenient: a flag whose definition fails to parse is kept (as long as its key can be
/// read) so that lookups report [`Error::FlagParseError`] for it, while every other flag stays
/// usable.
#[derive(Debug, Default)]
pub struct FlagSnapshot {
    flags: HashMap<FlagId, TryParse<FlagDefinition>>,
}

#[derive(Deserialize)]
struct SnapshotWire {
    flags: Vec<TryParse<FlagDefinition>>,
}

impl FlagSnapshot {
    /// Build a snapshot from already-parsed definitions.
    pub fn from_flags(flags: impl IntoIterator<Item = FlagDefinition>) -> FlagSnapshot {
        Self::from_entries(flags.into_iter().map(TryParse::Parsed))
    }

    /// Parse a snapshot from JSON of the form `{"flags": [...]}`.
    pub fn from_json(json: &[u8]) -> Result<FlagSnapshot> {
        let wire: SnapshotWire = serde_json::from_slice(json)?;
        Ok(Self::from_entries(wire.flags))
    }

    pub fn from_reader(reader: impl Read) -> Result<FlagSnapshot> {
        let wire: SnapshotWire = serde_json::from_reader(reader)?;
        Ok(Self::from_entries(wire.flags))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<FlagSnapshot> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    fn from_entries(entries: impl IntoIterator<Item = TryParse<FlagDefinition>>) -> FlagSnapshot {
        let mut flags = HashMap::new();
        for entry in entries {
            let Some(id) = entry_id(&entry) else {
                warn!(target: "propel", "skipping a flag without a key");
                continue;
            };
            let flag_key = id.key.clone();
            if matches!(entry, TryParse::ParseFailed(_)) {
                warn!(target: "propel",
                      flag_key = flag_key.as_str();
                      "failed to parse flag definition");
            }
            if flags.insert(id, entry).is_some() {
                warn!(target: "propel",
                      flag_key = flag_key.as_str();
                      "duplicate flag in snapshot, keeping the last definition");
            }
        }
        FlagSnapshot { flags }
    }

    /// Look up a flag.
    ///
    /// Returns `Ok(None)` if the flag does not exist and [`Error::FlagParseError`] if it exists but
    /// its definition could not be parsed.
    pub fn get_flag(&self, scope: FlagScope, key: &str) -> Result<Option<&FlagDefinition>> {
        let id = FlagId {
            scope,
            key: key.to_owned(),
        };
        match self.flags.get(&id) {
            None => Ok(None),
            Some(TryParse::Parsed(flag)) => Ok(Some(flag)),
            Some(TryParse::ParseFailed(_)) => Err(Error::FlagParseError),
        }
    }

    /// Ids of all flags, including those that failed to parse.
    pub fn flag_ids(&self) -> impl Iterator<Item = &FlagId> {
        self.flags.keys()
    }

    /// Successfully parsed flags.
    pub fn flags(&self) -> impl Iterator<Item = &FlagDefinition> {
        self.flags
            .values()
            .filter_map(Option::<&FlagDefinition>::from)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

fn entry_id(entry: &TryParse<FlagDefinition>) -> Option<FlagId> {
    let (scope, key) = match entry {
        TryParse::Parsed(flag) => (flag.scope(), flag.key()),
        TryParse::ParseFailed(json) => {
            let key = json.get("key")?.as_str()?;
            let scope = json
                .get("scope")
                .and_then(|scope| FlagScope::deserialize(scope).ok())
                .unwrap_or_default();
            (scope, key)
        }
    };
    if key.trim().is_empty() {
        return None;
    }
    Some(FlagId {
        scope,
        key: key.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::{FlagId, FlagSnapshot};
    use crate::{
        flag::{FlagDefinition, FlagScope},
        Error,
    };

    #[test]
    fn one_bad_flag_does_not_hide_the_others() {
        let _ = env_logger::builder().is_test(true).try_init();
        let snapshot = FlagSnapshot::from_json(
            br#"{"flags": [
                {"key": "good"},
                {"key": "bad", "scope": "APPLICATION", "configuration": {"activeEvaluationModes": "ON"}},
                {"configuration": {}},
                {"key": ""}
            ]}"#,
        )
        .unwrap();

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get_flag(FlagScope::Global, "good").unwrap().is_some());
        assert!(matches!(
            snapshot.get_flag(FlagScope::Application, "bad"),
            Err(Error::FlagParseError)
        ));
        assert!(snapshot.get_flag(FlagScope::Global, "bad").unwrap().is_none());
        assert_eq!(snapshot.flags().count(), 1);
        assert!(snapshot.flag_ids().any(|id| *id
            == FlagId {
                scope: FlagScope::Application,
                key: "bad".to_owned()
            }));
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(matches!(
            FlagSnapshot::from_json(b"{\"flags\": 42}"),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            FlagSnapshot::from_path("tests/data/does-not-exist.json"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn from_flags_keys_by_scope() {
        let snapshot = FlagSnapshot::from_flags([
            FlagDefinition::new("dark-mode", FlagScope::Global, "Dark mode").unwrap(),
            FlagDefinition::new("dark-mode", FlagScope::Application, "Dark mode").unwrap(),
        ]);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn loads_test_data() {
        let snapshot = FlagSnapshot::from_path("tests/data/flags.json").unwrap();
        assert!(!snapshot.is_empty());
        assert_eq!(snapshot.flags().count(), snapshot.len());
    }
}
