use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::domain::entities::record::Store;
use crate::usecase::ports::store::{RepoError, StoreRepository};

/// Store persisted as a single pretty-printed JSON document.
pub struct JsonStoreRepo {
    pub store_path: PathBuf,
}

impl JsonStoreRepo {
    pub fn new(store_path: PathBuf) -> Self {
        Self { store_path }
    }
}

impl StoreRepository for JsonStoreRepo {
    fn load(&self) -> Result<Store, RepoError> {
        load_store(&self.store_path).map_err(|err| RepoError::Message(format!("{err:#}")))
    }

    fn save(&self, store: &Store) -> Result<(), RepoError> {
        save_store(&self.store_path, store).map_err(|err| RepoError::Message(format!("{err:#}")))
    }
}

fn load_store(store_path: &Path) -> Result<Store> {
    if !store_path.exists() {
        return Ok(Store::new());
    }

    let text = fs::read_to_string(store_path)
        .with_context(|| format!("failed to read store: {}", store_path.display()))?;
    let mut store: Store = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse store: {}", store_path.display()))?;

    let dropped = store.drop_invalid_keys();
    if dropped > 0 {
        log::warn!("ignored {dropped} store entries with an empty key");
    }
    Ok(store)
}

fn save_store(store_path: &Path, store: &Store) -> Result<()> {
    if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    store
        .serialize(&mut serializer)
        .context("failed to serialize store")?;

    fs::write(store_path, buffer)
        .with_context(|| format!("failed to write store: {}", store_path.display()))?;
    Ok(())
}
