//! Local, file-backed collaborator.
//!
//! [`JsonBackend`] keeps accounts, the current session and every table in one
//! human-readable JSON file, and stores uploaded blobs as plain files next to
//! it. The data file is written atomically (write-to-temp + rename) so a crash
//! never leaves it half-written.
//!
//! # Layout
//!
//! ```text
//! <root>/backend.json              accounts, session, tables
//! <root>/storage/<bucket>/<path>   uploaded blobs
//! ```
//!
//! Error messages mirror the hosted service's wording so the user sees the
//! same text whichever collaborator is configured.

use super::capability::{Backend, Query};
use crate::domain::error::{MascotasError, Result};
use crate::domain::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Minimum password length accepted at sign-up.
const MIN_PASSWORD_LEN: usize = 6;

/// A registered account. Passwords are stored as salted SHA-256 digests.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    id: String,
    email: String,
    password_digest: String,
    created_at: DateTime<Utc>,
}

/// Top-level structure serialized to the data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BackendData {
    version: u32,

    /// Accounts keyed by normalized email.
    #[serde(default)]
    accounts: HashMap<String, Account>,

    /// Account id of the signed-in identity.
    #[serde(default)]
    current_session: Option<String>,

    /// Rows per table name.
    #[serde(default)]
    tables: HashMap<String, Vec<Value>>,
}

impl Default for BackendData {
    fn default() -> Self {
        Self {
            version: 1,
            accounts: HashMap::new(),
            current_session: None,
            tables: HashMap::new(),
        }
    }
}

/// JSON file collaborator.
///
/// The whole dataset lives in memory. A mutation is applied to a copy,
/// written out, and only then swapped in, so a failed write leaves nothing
/// behind. This type is `Send` but not `Sync`; it is owned by the single worker
/// thread.
pub struct JsonBackend {
    file_path: PathBuf,
    blob_root: PathBuf,
    data: BackendData,
}

impl JsonBackend {
    /// Opens or creates the store at `file_path`. Blobs go to a `storage`
    /// directory beside it.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or an
    /// existing file is not valid JSON.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mascotas::backend::JsonBackend;
    /// use std::path::PathBuf;
    ///
    /// let backend = JsonBackend::new(PathBuf::from("/tmp/mascotas/backend.json"))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(file_path: PathBuf) -> Result<Self> {
        tracing::debug!(path = ?file_path, "initializing JSON backend");

        let root = file_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        std::fs::create_dir_all(&root)?;

        let data = if file_path.exists() {
            Self::load_from_file(&file_path)?
        } else {
            tracing::debug!("initializing new empty backend");
            BackendData::default()
        };

        tracing::debug!(
            accounts = data.accounts.len(),
            tables = data.tables.len(),
            signed_in = data.current_session.is_some(),
            "backend initialized"
        );

        Ok(Self {
            file_path,
            blob_root: root.join("storage"),
            data,
        })
    }

    fn load_from_file(path: &Path) -> Result<BackendData> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| MascotasError::Storage(format!("failed to parse JSON: {e}")))
    }

    fn save_to_file(&self, data: &BackendData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| MascotasError::Storage(format!("failed to serialize JSON: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;

        tracing::trace!(path = ?self.file_path, "backend saved");
        Ok(())
    }

    /// Runs `change` on a copy of the dataset and keeps the copy only if it
    /// succeeds and reaches disk.
    fn transact<T>(&mut self, change: impl FnOnce(&mut BackendData) -> Result<T>) -> Result<T> {
        let mut staged = self.data.clone();
        let output = change(&mut staged)?;
        self.save_to_file(&staged)?;
        self.data = staged;
        Ok(output)
    }

    fn blob_path(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_))
        });
        if bucket.is_empty() || path.is_empty() || escapes || bucket.contains(['/', '\\']) {
            return Err(MascotasError::Backend(format!("Invalid key: {bucket}/{path}")));
        }
        Ok(self.blob_root.join(bucket).join(relative))
    }

    fn identity_of(account: &Account) -> Identity {
        Identity::new(account.id.clone(), account.email.clone())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn digest_password(account_id: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(account_id.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Primary key as text. Hosted tables often use numeric identity keys.
fn row_id(row: &Value) -> Option<String> {
    match row.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

impl Backend for JsonBackend {
    fn sign_up(&mut self, email: &str, password: &str) -> Result<Identity> {
        let key = normalize_email(email);
        let _span = tracing::debug_span!("json_sign_up", email = %key).entered();

        if key.is_empty() || !key.contains('@') {
            return Err(MascotasError::Backend(
                "Unable to validate email address: invalid format".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(MascotasError::Backend(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters."
            )));
        }
        if self.data.accounts.contains_key(&key) {
            return Err(MascotasError::Backend("User already registered".to_string()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let account = Account {
            password_digest: digest_password(&id, password),
            id,
            email: key.clone(),
            created_at: Utc::now(),
        };
        let identity = Self::identity_of(&account);
        self.transact(|data| {
            data.accounts.insert(key, account);
            Ok(())
        })?;

        tracing::debug!(user_id = %identity.id, "account created");
        Ok(identity)
    }

    fn sign_in_with_password(&mut self, email: &str, password: &str) -> Result<Identity> {
        let key = normalize_email(email);
        let _span = tracing::debug_span!("json_sign_in", email = %key).entered();

        let account = self
            .data
            .accounts
            .get(&key)
            .filter(|account| account.password_digest == digest_password(&account.id, password))
            .ok_or_else(|| MascotasError::Backend("Invalid login credentials".to_string()))?;

        let identity = Self::identity_of(account);
        let session = identity.id.clone();
        self.transact(|data| {
            data.current_session = Some(session);
            Ok(())
        })?;

        tracing::debug!(user_id = %identity.id, "signed in");
        Ok(identity)
    }

    fn sign_out(&mut self) -> Result<()> {
        let _span = tracing::debug_span!("json_sign_out").entered();

        if self.data.current_session.is_some() {
            self.transact(|data| {
                data.current_session = None;
                Ok(())
            })?;
        }
        Ok(())
    }

    fn current_session(&self) -> Result<Option<Identity>> {
        let Some(id) = &self.data.current_session else {
            return Ok(None);
        };
        Ok(self
            .data
            .accounts
            .values()
            .find(|account| &account.id == id)
            .map(Self::identity_of))
    }

    fn upload(&mut self, bucket: &str, path: &str, content_type: &str, bytes: &[u8]) -> Result<()> {
        let _span = tracing::debug_span!("json_upload",
            bucket = %bucket,
            path = %path,
            content_type = %content_type,
            size = bytes.len()
        )
        .entered();

        let target = self.blob_path(bucket, path)?;
        if target.exists() {
            return Err(MascotasError::Backend("The resource already exists".to_string()));
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, bytes)?;

        tracing::debug!(target = ?target, "blob stored");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("file://{}", self.blob_root.join(bucket).join(path).display())
    }

    fn insert(&mut self, table: &str, mut row: Value) -> Result<Vec<Value>> {
        let _span = tracing::debug_span!("json_insert", table = %table).entered();

        let Some(object) = row.as_object_mut() else {
            return Err(MascotasError::Backend(format!("{table}: row must be an object")));
        };
        if !object.contains_key("id") {
            object.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        }

        let id = row_id(&row);
        self.transact(|data| {
            let rows = data.tables.entry(table.to_string()).or_default();
            if id.is_some() && rows.iter().any(|existing| row_id(existing) == id) {
                return Err(MascotasError::Backend(format!(
                    "duplicate key value violates unique constraint \"{table}_pkey\""
                )));
            }
            rows.push(row.clone());
            Ok(())
        })?;

        tracing::debug!(row_count = self.data.tables.get(table).map_or(0, Vec::len), "row inserted");
        Ok(vec![row])
    }

    fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        let _span = tracing::debug_span!("json_select", table = %table).entered();

        let rows = self
            .data
            .tables
            .get(table)
            .map(|rows| query.apply(rows))
            .unwrap_or_default();

        tracing::debug!(count = rows.len(), "rows selected");
        Ok(rows)
    }

    fn upsert(&mut self, table: &str, row: Value) -> Result<Vec<Value>> {
        let _span = tracing::debug_span!("json_upsert", table = %table).entered();

        let Some(id) = row_id(&row) else {
            return Err(MascotasError::Backend(format!("{table}: upsert requires an id")));
        };

        let stored = self.transact(|data| {
            let rows = data.tables.entry(table.to_string()).or_default();
            let stored = match rows.iter_mut().find(|existing| row_id(existing).as_ref() == Some(&id)) {
                Some(existing) => {
                    if let (Some(target), Some(patch)) = (existing.as_object_mut(), row.as_object()) {
                        for (column, value) in patch {
                            target.insert(column.clone(), value.clone());
                        }
                    }
                    existing.clone()
                }
                None => {
                    rows.push(row.clone());
                    row
                }
            };
            Ok(vec![stored])
        })?;

        tracing::debug!(id = %id, "row upserted");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn backend() -> (TempDir, JsonBackend) {
        let dir = TempDir::new().unwrap();
        let backend = JsonBackend::new(dir.path().join("backend.json")).unwrap();
        (dir, backend)
    }

    #[test]
    fn sign_up_then_sign_in_sets_the_session() {
        let (_dir, mut backend) = backend();
        let created = backend.sign_up("Ana@Example.org", "secreto").unwrap();
        assert_eq!(created.email, "ana@example.org");
        assert_eq!(backend.current_session().unwrap(), None);

        let signed_in = backend.sign_in_with_password("ana@example.org", "secreto").unwrap();
        assert_eq!(signed_in.id, created.id);
        assert_eq!(backend.current_session().unwrap(), Some(created));
    }

    #[test]
    fn duplicate_sign_up_is_rejected() {
        let (_dir, mut backend) = backend();
        backend.sign_up("ana@example.org", "secreto").unwrap();
        let err = backend.sign_up("ana@example.org", "otro123").unwrap_err();
        assert_eq!(err.to_string(), "User already registered");
    }

    #[test]
    fn wrong_password_is_rejected() {
        let (_dir, mut backend) = backend();
        backend.sign_up("ana@example.org", "secreto").unwrap();
        let err = backend.sign_in_with_password("ana@example.org", "nope").unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn session_survives_reopen_and_sign_out_clears_it() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backend.json");
        {
            let mut backend = JsonBackend::new(path.clone()).unwrap();
            backend.sign_up("ana@example.org", "secreto").unwrap();
            backend.sign_in_with_password("ana@example.org", "secreto").unwrap();
        }

        let mut reopened = JsonBackend::new(path).unwrap();
        assert!(reopened.current_session().unwrap().is_some());
        reopened.sign_out().unwrap();
        assert!(reopened.current_session().unwrap().is_none());
    }

    #[test]
    fn insert_assigns_id_and_rejects_duplicates() {
        let (_dir, mut backend) = backend();
        let stored = backend.insert("reports", json!({"name": "Firulais"})).unwrap();
        let id = stored[0]["id"].as_str().unwrap().to_string();
        assert!(!id.is_empty());

        let err = backend.insert("reports", json!({"id": id, "name": "Otro"})).unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
    }

    #[test]
    fn upsert_merges_into_existing_row() {
        let (_dir, mut backend) = backend();
        backend
            .insert("profiles", json!({"id": "u1", "display_name": "", "email": "a@b.c"}))
            .unwrap();
        let stored = backend
            .upsert("profiles", json!({"id": "u1", "display_name": "Ana"}))
            .unwrap();
        assert_eq!(stored[0]["display_name"], "Ana");
        assert_eq!(stored[0]["email"], "a@b.c");

        let all = backend.select("profiles", &Query::all()).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn upload_writes_blob_once() {
        let (dir, mut backend) = backend();
        backend.upload("pet-photos", "a.png", "image/png", &[1, 2, 3]).unwrap();
        let blob = dir.path().join("storage/pet-photos/a.png");
        assert_eq!(std::fs::read(blob).unwrap(), vec![1, 2, 3]);

        assert!(backend.upload("pet-photos", "a.png", "image/png", &[4]).is_err());
        assert!(backend.public_url("pet-photos", "a.png").ends_with("storage/pet-photos/a.png"));
    }

    #[test]
    fn failed_write_leaves_no_trace() {
        let (dir, mut backend) = backend();
        let tmp = dir.path().join("backend.tmp");
        std::fs::create_dir(&tmp).unwrap();

        assert!(backend.insert("reports", json!({"name": "Firulais"})).is_err());
        assert!(backend.select("reports", &Query::all()).unwrap().is_empty());
        assert!(backend.sign_up("ana@example.org", "secreto").is_err());
        assert!(backend.sign_in_with_password("ana@example.org", "secreto").is_err());

        std::fs::remove_dir(&tmp).unwrap();
        backend.insert("reports", json!({"name": "Firulais"})).unwrap();
        assert_eq!(backend.select("reports", &Query::all()).unwrap().len(), 1);

        let reopened = JsonBackend::new(dir.path().join("backend.json")).unwrap();
        assert_eq!(reopened.select("reports", &Query::all()).unwrap().len(), 1);
    }

    #[test]
    fn numeric_ids_count_as_primary_keys() {
        let (_dir, mut backend) = backend();
        backend.insert("reports", json!({"id": 42, "name": "Firulais"})).unwrap();
        let err = backend.insert("reports", json!({"id": 42, "name": "Otro"})).unwrap_err();
        assert!(err.to_string().contains("duplicate key"));

        let stored = backend.upsert("reports", json!({"id": 42, "status": "found"})).unwrap();
        assert_eq!(stored[0]["name"], "Firulais");
        assert_eq!(stored[0]["status"], "found");
    }

    #[test]
    fn upload_rejects_escaping_paths() {
        let (_dir, mut backend) = backend();
        assert!(backend.upload("pet-photos", "../evil.png", "image/png", &[1]).is_err());
    }
}
