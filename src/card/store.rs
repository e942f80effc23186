//! Schema Card Store (C6, spec §4.6): process-local holder of the current
//! card, with a portable, versioned byte format and an optional on-disk
//! cache.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::card::types::SchemaCard;
use crate::error::CortexError;

const FORMAT_VERSION: u8 = 1;

/// Encode a card to its portable byte form: a version byte followed by a
/// bincode payload, so a future format change can be detected on read
/// instead of silently producing garbage.
pub fn to_bytes(card: &SchemaCard) -> Result<Vec<u8>, CortexError> {
    let mut out = vec![FORMAT_VERSION];
    let body = bincode::serialize(card)
        .map_err(|e| CortexError::Validation(format!("schema card encode failed: {e}")))?;
    out.extend(body);
    Ok(out)
}

pub fn from_bytes(bytes: &[u8]) -> Result<SchemaCard, CortexError> {
    let (version, body) = bytes
        .split_first()
        .ok_or_else(|| CortexError::Validation("empty schema card byte stream".to_string()))?;
    if *version != FORMAT_VERSION {
        return Err(CortexError::Validation(format!(
            "unsupported schema card format version {version}, expected {FORMAT_VERSION}"
        )));
    }
    bincode::deserialize(body)
        .map_err(|e| CortexError::Validation(format!("schema card decode failed: {e}")))
}

/// Holds the current Schema Card. The store itself requires no
/// persistence (spec §4.6); an optional cache directory makes the card
/// survive a process restart without a full re-reflection.
pub struct SchemaCardStore {
    current: RwLock<Option<SchemaCard>>,
    cache_dir: Option<PathBuf>,
}

impl SchemaCardStore {
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        Self { current: RwLock::new(None), cache_dir }
    }

    pub fn get(&self) -> Option<SchemaCard> {
        self.current.read().expect("schema card lock poisoned").clone()
    }

    pub fn put(&self, card: SchemaCard) {
        if let Some(dir) = &self.cache_dir {
            if let Err(e) = Self::persist(dir, &card) {
                tracing::warn!(error = %e, "failed to persist schema card to cache dir");
            }
        }
        *self.current.write().expect("schema card lock poisoned") = Some(card);
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    pub fn fingerprint(&self) -> Option<String> {
        self.current
            .read()
            .expect("schema card lock poisoned")
            .as_ref()
            .map(|c| c.connection_fingerprint.clone())
    }

    fn persist(dir: &Path, card: &SchemaCard) -> Result<(), CortexError> {
        std::fs::create_dir_all(dir)?;
        let bytes = to_bytes(card)?;
        let path = dir.join(format!("{}.card", card.connection_fingerprint));
        let mut file = std::fs::File::create(path)?;
        file.write_all(&bytes)?;
        Ok(())
    }

    /// Load a previously persisted card for `fingerprint` from `dir`, if
    /// present. Used at startup to warm-start instead of a cold reflect.
    pub fn load_cached(dir: &Path, fingerprint: &str) -> Result<Option<SchemaCard>, CortexError> {
        let path = dir.join(format!("{fingerprint}.card"));
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(path)?;
        Ok(Some(from_bytes(&bytes)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::types::BuildMeta;
    use std::collections::HashMap;

    fn sample_card() -> SchemaCard {
        SchemaCard {
            dialect: "postgres".to_string(),
            connection_fingerprint: "abc123".to_string(),
            schemas: vec!["public".to_string()],
            subject_areas: HashMap::new(),
            tables: HashMap::new(),
            fk_edges: vec![],
            built_at: chrono::Utc::now(),
            reflection_hash: "deadbeef".to_string(),
            build_meta: BuildMeta { version: "0.1.0".to_string(), feature_flags: vec![] },
        }
    }

    #[test]
    fn round_trips_through_bytes() {
        let card = sample_card();
        let bytes = to_bytes(&card).unwrap();
        let decoded = from_bytes(&bytes).unwrap();
        assert_eq!(decoded.reflection_hash, card.reflection_hash);
        assert_eq!(decoded.connection_fingerprint, card.connection_fingerprint);
    }

    #[test]
    fn rejects_unknown_format_version() {
        let mut bytes = to_bytes(&sample_card()).unwrap();
        bytes[0] = 99;
        assert!(from_bytes(&bytes).is_err());
    }

    #[test]
    fn store_get_put_round_trip() {
        let store = SchemaCardStore::new(None);
        assert!(store.get().is_none());
        store.put(sample_card());
        assert_eq!(store.fingerprint().as_deref(), Some("abc123"));
    }

    #[test]
    fn persists_and_reloads_from_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaCardStore::new(Some(dir.path().to_path_buf()));
        store.put(sample_card());
        let reloaded = SchemaCardStore::load_cached(dir.path(), "abc123").unwrap();
        assert!(reloaded.is_some());
        assert_eq!(reloaded.unwrap().reflection_hash, "deadbeef");
    }
}
