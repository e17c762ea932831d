//! AbilityDb: canonical facade for the ability catalog.
//!
//! Provides in-memory indexes and simple normalization so callers don't need
//! to guess file names or embed heuristics. Built once at startup; read-only
//! afterwards.

use crate::ability::AbilitySpec;
use crate::loader;
use anyhow::{Result, bail};
use std::collections::HashMap;
use std::path::PathBuf;

fn workspace_root() -> PathBuf {
    let here = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // Prefer workspace root (two levels up) if it contains data/
    let ws = here.join("..").join("..");
    if ws.join("data").is_dir() { ws } else { here }
}

#[derive(Default)]
pub struct AbilityDb {
    abilities: HashMap<String, AbilitySpec>,
    canon: Vec<String>,
}

impl AbilityDb {
    /// Best-effort load of every `data/abilities/*.json`; entries that fail
    /// to parse or validate are skipped.
    pub fn load_default() -> Self {
        let mut db = AbilityDb::default();
        let dir = workspace_root().join("data/abilities");
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return db;
        };
        for ent in entries.flatten() {
            let path = ent.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if let Ok(spec) = loader::load_ability_spec(format!("abilities/{name}")) {
                db.index(spec);
            }
        }
        db
    }

    /// Build a catalog from in-memory specs; rejects invalid or duplicate
    /// entries instead of skipping them.
    pub fn from_specs(specs: Vec<AbilitySpec>) -> Result<Self> {
        let mut db = AbilityDb::default();
        for spec in specs {
            spec.validate()?;
            if db.abilities.contains_key(&spec.id) {
                bail!("duplicate ability id: {}", spec.id);
            }
            db.index(spec);
        }
        Ok(db)
    }

    fn index(&mut self, spec: AbilitySpec) {
        let canon = spec.id.clone();
        let name_key = spec.name.to_ascii_lowercase().replace(' ', "_");
        let last = canon.rsplit('.').next().unwrap_or(&canon).to_string();
        self.canon.push(canon.clone());
        self.abilities.insert(last, spec.clone());
        self.abilities.insert(name_key, spec.clone());
        self.abilities.insert(canon, spec);
    }

    pub fn get(&self, id: &str) -> Option<&AbilitySpec> {
        if let Some(s) = self.abilities.get(id) {
            return Some(s);
        }
        let last = id.rsplit('.').next().unwrap_or(id);
        if let Some(s) = self.abilities.get(last) {
            return Some(s);
        }
        let name_key = id.to_ascii_lowercase().replace(' ', "_");
        self.abilities.get(&name_key)
    }

    /// Canonical ids, in load order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.canon.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.canon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canon.is_empty()
    }
}
