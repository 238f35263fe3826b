//! Collaborator capability interface.
//!
//! This module defines the [`Backend`] trait: the exact set of calls the
//! workflows need from the backend-as-a-service, and nothing more. It is not a
//! generic ORM. Rows travel as `serde_json::Value` objects so the trait stays
//! table-agnostic; workflows (de)serialize their own typed rows.

use crate::domain::error::Result;
use crate::domain::Identity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// Table holding published reports.
pub const REPORTS_TABLE: &str = "reports";

/// Table holding one profile row per identity.
pub const PROFILES_TABLE: &str = "profiles";

/// Blob bucket for report photos.
pub const PHOTO_BUCKET: &str = "pet-photos";

/// Equality filter on one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

/// Sort order on one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// Optional filters and ordering for [`Backend::select`].
///
/// # Examples
///
/// ```
/// use mascotas::backend::Query;
///
/// let query = Query::all().eq("user_id", "u1").order_by_desc("published_at");
/// assert_eq!(query.filters.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order: Option<Order>,
}

impl Query {
    /// Every row, collaborator order.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds an equality filter.
    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Orders by `column`, newest/largest first.
    #[must_use]
    pub fn order_by_desc(mut self, column: impl Into<String>) -> Self {
        self.order = Some(Order {
            column: column.into(),
            descending: true,
        });
        self
    }

    /// Whether a row passes every filter.
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|filter| row.get(&filter.column) == Some(&filter.value))
    }

    /// Filters and sorts rows in memory.
    #[must_use]
    pub fn apply(&self, rows: &[Value]) -> Vec<Value> {
        let mut selected: Vec<Value> = rows.iter().filter(|row| self.matches(row)).cloned().collect();

        if let Some(order) = &self.order {
            selected.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }

        selected
    }
}

/// Orders JSON scalars: numbers numerically, strings lexically, missing last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// Capabilities the application requires from its backend-as-a-service.
///
/// Every method maps to a single request/response call. Implementations
/// report collaborator-side refusals as
/// [`MascotasError::Backend`](crate::domain::MascotasError::Backend) carrying
/// the message to show the user.
///
/// # Implementations
///
/// - [`JsonBackend`](crate::backend::JsonBackend): local file-backed store
///   used on the worker thread
///
/// The hosted service is reached asynchronously through
/// [`remote`](crate::backend::remote) instead of through this trait, because
/// plugin HTTP requests complete as events rather than return values.
pub trait Backend: Send {
    /// Registers a new account and returns its identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered or the store fails.
    fn sign_up(&mut self, email: &str, password: &str) -> Result<Identity>;

    /// Authenticates and makes the identity the current session.
    ///
    /// # Errors
    ///
    /// Returns an error on unknown email or wrong password.
    fn sign_in_with_password(&mut self, email: &str, password: &str) -> Result<Identity>;

    /// Ends the current session. Succeeds when no session exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn sign_out(&mut self) -> Result<()>;

    /// Identity of the current session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn current_session(&self) -> Result<Option<Identity>>;

    /// Stores a blob under `bucket/path`.
    ///
    /// # Errors
    ///
    /// Returns an error if an object already exists at that path.
    fn upload(&mut self, bucket: &str, path: &str, content_type: &str, bytes: &[u8]) -> Result<()>;

    /// Public URL of a stored blob. Never fails; the object may not exist.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Inserts a row and returns the stored representation.
    ///
    /// # Errors
    ///
    /// Returns an error if a row with the same `id` already exists.
    fn insert(&mut self, table: &str, row: Value) -> Result<Vec<Value>>;

    /// Selects rows matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>>;

    /// Inserts or replaces the row with the same `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the row has no `id` or the store fails.
    fn upsert(&mut self, table: &str, row: Value) -> Result<Vec<Value>>;
}
