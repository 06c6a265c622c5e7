use crate::model::WellbeingState;
use std::cell::RefCell;
use std::collections::HashMap;
use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

pub const DEFAULT_STORAGE_KEY: &str = "octo-state";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Client-local key-value storage: named entries holding text.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per entry under `dir`.
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(key);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.entry_path(key);
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io_err(&tmp))?;
        if let Err(e) = atomic_rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(io_err(&path)(e));
        }
        Ok(())
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

/// Replaces `to` with `from`. Both must be on the same filesystem.
pub(crate) fn atomic_rename(from: &Path, to: &Path) -> io::Result<()> {
    fs::rename(from, to)
}

/// In-process storage, mostly for tests and headless sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        storage
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefaultReason {
    Absent,
    Malformed(String),
    Unreadable(String),
}

/// What `load` found: a decoded record, or defaults and the reason why.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadOutcome {
    Decoded(WellbeingState),
    Defaulted(DefaultReason),
}

impl LoadOutcome {
    pub fn into_state(self) -> WellbeingState {
        match self {
            LoadOutcome::Decoded(st) => st,
            LoadOutcome::Defaulted(_) => WellbeingState::default(),
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, LoadOutcome::Defaulted(_))
    }
}

/// Decodes persisted text, merging known fields over the defaults key by key.
///
/// Only text that is not a JSON object counts as malformed. A known key that
/// is missing or has the wrong type keeps its default; unknown keys are ignored.
pub fn decode_state(raw: &str) -> LoadOutcome {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return LoadOutcome::Defaulted(DefaultReason::Malformed(e.to_string())),
    };
    let Some(fields) = value.as_object() else {
        return LoadOutcome::Defaulted(DefaultReason::Malformed(
            "expected a JSON object".to_string(),
        ));
    };

    let mut st = WellbeingState::default();
    if let Some(hunger) = meter_field(fields, "hunger") {
        st.hunger = hunger;
    }
    if let Some(happiness) = meter_field(fields, "happiness") {
        st.happiness = happiness;
    }
    match fields.get("toys") {
        None => {}
        Some(v) => match v.as_u64() {
            Some(n) => st.toys = u32::try_from(n).unwrap_or(u32::MAX),
            None => tracing::warn!(key = "toys", value = %v, "ignoring mistyped field"),
        },
    }
    st.clamp_meters();
    LoadOutcome::Decoded(st)
}

fn meter_field(fields: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<f32> {
    let v = fields.get(key)?;
    let n = v.as_f64();
    if n.is_none() {
        tracing::warn!(key, value = %v, "ignoring mistyped field");
    }
    n.map(|n| n as f32)
}

pub fn encode_state(state: &WellbeingState) -> Result<String, StoreError> {
    Ok(serde_json::to_string(state)?)
}

/// Owns the working copy of the record and the storage entry behind it.
pub struct StateStore<S: KeyValueStorage> {
    storage: S,
    key: String,
    state: WellbeingState,
}

impl<S: KeyValueStorage> StateStore<S> {
    /// Opens the store, loading the persisted record or falling back to defaults.
    pub fn open(storage: S, key: impl Into<String>) -> (Self, LoadOutcome) {
        let key = key.into();
        let outcome = load_outcome(&storage, &key);
        match &outcome {
            LoadOutcome::Decoded(st) => tracing::debug!(key = %key, ?st, "loaded state"),
            LoadOutcome::Defaulted(DefaultReason::Absent) => {
                tracing::debug!(key = %key, "no saved state, using defaults")
            }
            LoadOutcome::Defaulted(reason) => {
                tracing::warn!(key = %key, ?reason, "saved state unusable, using defaults")
            }
        }
        let state = outcome.clone().into_state();
        (
            Self {
                storage,
                key,
                state,
            },
            outcome,
        )
    }

    /// Re-reads the entry from storage. Never fails; bad data yields defaults.
    pub fn load(&self) -> WellbeingState {
        load_outcome(&self.storage, &self.key).into_state()
    }

    pub fn load_outcome(&self) -> LoadOutcome {
        load_outcome(&self.storage, &self.key)
    }

    pub fn save(&self, state: &WellbeingState) -> Result<(), StoreError> {
        let text = encode_state(state)?;
        self.storage.set(&self.key, &text)
    }

    pub fn current(&self) -> &WellbeingState {
        &self.state
    }

    pub fn current_mut(&mut self) -> &mut WellbeingState {
        &mut self.state
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

fn load_outcome<S: KeyValueStorage>(storage: &S, key: &str) -> LoadOutcome {
    match storage.get(key) {
        Ok(Some(raw)) => decode_state(&raw),
        Ok(None) => LoadOutcome::Defaulted(DefaultReason::Absent),
        Err(e) => LoadOutcome::Defaulted(DefaultReason::Unreadable(e.to_string())),
    }
}
