//! StateStore: redb-backed persistence for CellGrid.
//!
//! Provides typed CRUD over realm, space, stack, and cell metadata and over
//! infra records. Every operation runs in its own redb transaction. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing and dry runs).

use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use cell_core::{Cell, NameChain, Realm, Space, Stack};

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

type Table = TableDefinition<'static, &'static str, &'static [u8]>;

/// Closure factory turning any redb error into `StateError::Storage`.
fn storage<E: Display>(op: &'static str) -> impl FnOnce(E) -> StateError {
    move |e| StateError::Storage {
        op,
        reason: e.to_string(),
    }
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(|e| StateError::Open(e.to_string()))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store.
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(|e| StateError::Open(e.to_string()))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(storage("begin_write"))?;
        for table in [REALMS, SPACES, STACKS, CELLS, INFRA] {
            txn.open_table(table).map_err(storage("open_table"))?;
        }
        txn.commit().map_err(storage("commit"))?;
        Ok(())
    }

    // ── Generic helpers ────────────────────────────────────────────

    fn put<T: Serialize>(&self, table: Table, key: &str, value: &T) -> StateResult<()> {
        let bytes = serde_json::to_vec(value).map_err(|e| StateError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let txn = self.db.begin_write().map_err(storage("begin_write"))?;
        {
            let mut t = txn.open_table(table).map_err(storage("open_table"))?;
            t.insert(key, bytes.as_slice()).map_err(storage("insert"))?;
        }
        txn.commit().map_err(storage("commit"))?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, table: Table, key: &str) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(storage("begin_read"))?;
        let t = txn.open_table(table).map_err(storage("open_table"))?;
        match t.get(key).map_err(storage("get"))? {
            Some(guard) => Ok(Some(decode(key, guard.value())?)),
            None => Ok(None),
        }
    }

    /// All values whose key starts with `prefix`, in key order.
    fn scan<T: DeserializeOwned>(&self, table: Table, prefix: &str) -> StateResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(storage("begin_read"))?;
        let t = txn.open_table(table).map_err(storage("open_table"))?;
        let mut results = Vec::new();
        for entry in t.iter().map_err(storage("iter"))? {
            let (key, value) = entry.map_err(storage("iter"))?;
            if key.value().starts_with(prefix) {
                results.push(decode(key.value(), value.value())?);
            }
        }
        Ok(results)
    }

    fn remove(&self, table: Table, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(storage("begin_write"))?;
        let existed;
        {
            let mut t = txn.open_table(table).map_err(storage("open_table"))?;
            existed = t.remove(key).map_err(storage("remove"))?.is_some();
        }
        txn.commit().map_err(storage("commit"))?;
        Ok(existed)
    }

    /// Remove every key in `table` matching `matches`. Returns number removed.
    fn remove_where(&self, table: Table, matches: impl Fn(&str) -> bool) -> StateResult<u32> {
        // Collect keys in a read transaction first.
        let keys: Vec<String> = {
            let txn = self.db.begin_read().map_err(storage("begin_read"))?;
            let t = txn.open_table(table).map_err(storage("open_table"))?;
            let mut keys = Vec::new();
            for entry in t.iter().map_err(storage("iter"))? {
                let (key, _) = entry.map_err(storage("iter"))?;
                if matches(key.value()) {
                    keys.push(key.value().to_string());
                }
            }
            keys
        };
        if keys.is_empty() {
            return Ok(0);
        }
        let txn = self.db.begin_write().map_err(storage("begin_write"))?;
        {
            let mut t = txn.open_table(table).map_err(storage("open_table"))?;
            for key in &keys {
                t.remove(key.as_str()).map_err(storage("remove"))?;
            }
        }
        txn.commit().map_err(storage("commit"))?;
        Ok(keys.len() as u32)
    }

    // ── Realms ─────────────────────────────────────────────────────

    /// Insert or update a realm.
    pub fn put_realm(&self, realm: &Realm) -> StateResult<()> {
        let key = realm.chain().key();
        self.put(REALMS, &key, realm)?;
        debug!(%key, "realm stored");
        Ok(())
    }

    pub fn get_realm(&self, name: &str) -> StateResult<Option<Realm>> {
        self.get(REALMS, name)
    }

    pub fn list_realms(&self) -> StateResult<Vec<Realm>> {
        self.scan(REALMS, "")
    }

    /// Delete a realm by name. Returns true if it existed.
    pub fn delete_realm(&self, name: &str) -> StateResult<bool> {
        let existed = self.remove(REALMS, name)?;
        debug!(realm = %name, existed, "realm deleted");
        Ok(existed)
    }

    // ── Spaces ─────────────────────────────────────────────────────

    pub fn put_space(&self, space: &Space) -> StateResult<()> {
        let key = space.chain().key();
        self.put(SPACES, &key, space)?;
        debug!(%key, "space stored");
        Ok(())
    }

    pub fn get_space(&self, realm: &str, name: &str) -> StateResult<Option<Space>> {
        self.get(SPACES, &NameChain::space(realm, name).key())
    }

    /// List the spaces of a realm.
    pub fn list_spaces(&self, realm: &str) -> StateResult<Vec<Space>> {
        self.scan(SPACES, &format!("{realm}/"))
    }

    pub fn delete_space(&self, realm: &str, name: &str) -> StateResult<bool> {
        let key = NameChain::space(realm, name).key();
        let existed = self.remove(SPACES, &key)?;
        debug!(%key, existed, "space deleted");
        Ok(existed)
    }

    // ── Stacks ─────────────────────────────────────────────────────

    pub fn put_stack(&self, stack: &Stack) -> StateResult<()> {
        let key = stack.chain().key();
        self.put(STACKS, &key, stack)?;
        debug!(%key, "stack stored");
        Ok(())
    }

    pub fn get_stack(&self, realm: &str, space: &str, name: &str) -> StateResult<Option<Stack>> {
        self.get(STACKS, &NameChain::stack(realm, space, name).key())
    }

    /// List the stacks of a space.
    pub fn list_stacks(&self, realm: &str, space: &str) -> StateResult<Vec<Stack>> {
        self.scan(STACKS, &format!("{realm}/{space}/"))
    }

    pub fn delete_stack(&self, realm: &str, space: &str, name: &str) -> StateResult<bool> {
        let key = NameChain::stack(realm, space, name).key();
        let existed = self.remove(STACKS, &key)?;
        debug!(%key, existed, "stack deleted");
        Ok(existed)
    }

    // ── Cells ──────────────────────────────────────────────────────

    pub fn put_cell(&self, cell: &Cell) -> StateResult<()> {
        let key = cell.chain().key();
        self.put(CELLS, &key, cell)?;
        debug!(%key, containers = cell.spec.containers.len(), "cell stored");
        Ok(())
    }

    pub fn get_cell(
        &self,
        realm: &str,
        space: &str,
        stack: &str,
        name: &str,
    ) -> StateResult<Option<Cell>> {
        self.get(CELLS, &NameChain::cell(realm, space, stack, name).key())
    }

    /// List the cells of a stack.
    pub fn list_cells(&self, realm: &str, space: &str, stack: &str) -> StateResult<Vec<Cell>> {
        self.scan(CELLS, &format!("{realm}/{space}/{stack}/"))
    }

    pub fn delete_cell(&self, realm: &str, space: &str, stack: &str, name: &str) -> StateResult<bool> {
        let key = NameChain::cell(realm, space, stack, name).key();
        let existed = self.remove(CELLS, &key)?;
        debug!(%key, existed, "cell deleted");
        Ok(existed)
    }

    // ── Subtrees ───────────────────────────────────────────────────

    /// Remove all metadata at or beneath `chain` across every level.
    ///
    /// Returns the number of entries removed.
    pub fn delete_subtree(&self, chain: &NameChain) -> StateResult<u32> {
        let root = chain.key();
        let under = |key: &str| key == root || key.starts_with(&format!("{root}/"));
        let mut removed = 0;
        for table in [REALMS, SPACES, STACKS, CELLS] {
            removed += self.remove_where(table, &under)?;
        }
        debug!(key = %root, removed, "metadata subtree deleted");
        Ok(removed)
    }

    // ── Infra records ──────────────────────────────────────────────

    /// Insert or update an infra record.
    pub fn put_infra(&self, record: &InfraRecord) -> StateResult<()> {
        let key = record.table_key();
        self.put(INFRA, &key, record)?;
        debug!(%key, owner = %record.owner, state = ?record.state, "infra record stored");
        Ok(())
    }

    pub fn get_infra(&self, kind: InfraKind, identity: &str) -> StateResult<Option<InfraRecord>> {
        self.get(INFRA, &kind.key(identity))
    }

    pub fn infra_exists(&self, kind: InfraKind, identity: &str) -> StateResult<bool> {
        Ok(self.get_infra(kind, identity)?.is_some())
    }

    /// List infra records owned by `owner` or anything beneath it.
    pub fn list_infra_owned_by(&self, owner: &str) -> StateResult<Vec<InfraRecord>> {
        let all: Vec<InfraRecord> = self.scan(INFRA, "")?;
        Ok(all.into_iter().filter(|r| r.owned_by(owner)).collect())
    }

    /// Delete an infra record. Returns true if it existed.
    pub fn delete_infra(&self, kind: InfraKind, identity: &str) -> StateResult<bool> {
        let key = kind.key(identity);
        let existed = self.remove(INFRA, &key)?;
        debug!(%key, existed, "infra record deleted");
        Ok(existed)
    }
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> StateResult<T> {
    serde_json::from_slice(bytes).map_err(|e| StateError::Decode {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
