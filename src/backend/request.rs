//! Serializable collaborator requests and responses.
//!
//! Workflows never call the collaborator directly. They return a
//! [`BackendRequest`] (an operation plus the [`Purpose`] naming the step
//! waiting for it); the plugin runtime executes it on the worker or over HTTP
//! and feeds the [`BackendResponse`] back as an event. The purpose is how the
//! event handler routes a response to its owning workflow.

use super::capability::{Backend, Query};
use crate::domain::error::Result;
use crate::domain::Identity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Workflow step that issued a request and awaits its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Purpose {
    RestoreSession,
    Login,
    RegisterSignUp,
    RegisterSignIn,
    RegisterProfile,
    SignOut,
    SubmitUpload,
    SubmitPublicUrl,
    SubmitInsert,
    ListReports,
    ProfileFetch,
    ProfileCreate,
    ProfileStats,
    ProfileUpdate,
}

/// One capability call with its arguments.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendOp {
    SignUp {
        email: String,
        password: String,
    },
    SignIn {
        email: String,
        password: String,
    },
    SignOut,
    CurrentSession,
    Upload {
        bucket: String,
        path: String,
        content_type: String,
        #[serde(with = "base64_bytes")]
        bytes: Vec<u8>,
    },
    PublicUrl {
        bucket: String,
        path: String,
    },
    Insert {
        table: String,
        row: Value,
    },
    Select {
        table: String,
        query: Query,
    },
    Upsert {
        table: String,
        row: Value,
    },
}

impl BackendOp {
    /// Capability name, safe to log.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SignUp { .. } => "auth.sign_up",
            Self::SignIn { .. } => "auth.sign_in_with_password",
            Self::SignOut => "auth.sign_out",
            Self::CurrentSession => "auth.current_session",
            Self::Upload { .. } => "storage.upload",
            Self::PublicUrl { .. } => "storage.public_url",
            Self::Insert { .. } => "table.insert",
            Self::Select { .. } => "table.select",
            Self::Upsert { .. } => "table.upsert",
        }
    }
}

impl std::fmt::Debug for BackendOp {
    /// Prints the capability and its target, never credentials or blobs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SignUp { email, .. } | Self::SignIn { email, .. } => {
                write!(f, "{}({email})", self.name())
            }
            Self::Upload { bucket, path, bytes, .. } => {
                write!(f, "{}({bucket}/{path}, {} bytes)", self.name(), bytes.len())
            }
            Self::PublicUrl { bucket, path } => write!(f, "{}({bucket}/{path})", self.name()),
            Self::Insert { table, .. } | Self::Upsert { table, .. } => {
                write!(f, "{}({table})", self.name())
            }
            Self::Select { table, query } => write!(f, "{}({table}, {query:?})", self.name()),
            Self::SignOut | Self::CurrentSession => f.write_str(self.name()),
        }
    }
}

/// Successful result of a [`BackendOp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendOutput {
    /// Result of any auth call. `None` means no session.
    Session(Option<Identity>),
    /// Blob stored at `path` within its bucket.
    Uploaded { path: String },
    PublicUrl(String),
    Rows(Vec<Value>),
}

/// A request tagged with the step awaiting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendRequest {
    pub purpose: Purpose,
    pub op: BackendOp,
}

impl BackendRequest {
    #[must_use]
    pub const fn new(purpose: Purpose, op: BackendOp) -> Self {
        Self { purpose, op }
    }

    /// Runs the request against a synchronous collaborator.
    ///
    /// Errors are flattened into the response's message so they can cross
    /// the worker boundary as plain data.
    pub fn execute(self, backend: &mut dyn Backend) -> BackendResponse {
        let _span = tracing::debug_span!("backend_execute",
            purpose = ?self.purpose,
            op = self.op.name()
        )
        .entered();

        let result = execute(backend, self.op).map_err(|e| {
            tracing::debug!(error = %e, "collaborator call failed");
            e.user_message()
        });

        BackendResponse {
            purpose: self.purpose,
            result,
        }
    }
}

/// Response routed back to the workflow named by `purpose`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendResponse {
    pub purpose: Purpose,
    pub result: std::result::Result<BackendOutput, String>,
}

impl BackendResponse {
    pub fn ok(purpose: Purpose, output: BackendOutput) -> Self {
        Self {
            purpose,
            result: Ok(output),
        }
    }

    pub fn err(purpose: Purpose, message: impl Into<String>) -> Self {
        Self {
            purpose,
            result: Err(message.into()),
        }
    }

    /// Rows of a table call.
    ///
    /// # Errors
    ///
    /// Returns the collaborator message, or a description of the mismatch if
    /// the output is of another kind.
    pub fn into_rows(self) -> std::result::Result<Vec<Value>, String> {
        match self.result? {
            BackendOutput::Rows(rows) => Ok(rows),
            other => Err(unexpected(self.purpose, &other)),
        }
    }

    /// Session of an auth call.
    ///
    /// # Errors
    ///
    /// Returns the collaborator message or an output-mismatch description.
    pub fn into_session(self) -> std::result::Result<Option<Identity>, String> {
        match self.result? {
            BackendOutput::Session(identity) => Ok(identity),
            other => Err(unexpected(self.purpose, &other)),
        }
    }

    /// Stored path of an upload.
    ///
    /// # Errors
    ///
    /// Returns the collaborator message or an output-mismatch description.
    pub fn into_uploaded(self) -> std::result::Result<String, String> {
        match self.result? {
            BackendOutput::Uploaded { path } => Ok(path),
            other => Err(unexpected(self.purpose, &other)),
        }
    }

    /// URL of a public-URL call.
    ///
    /// # Errors
    ///
    /// Returns the collaborator message or an output-mismatch description.
    pub fn into_url(self) -> std::result::Result<String, String> {
        match self.result? {
            BackendOutput::PublicUrl(url) => Ok(url),
            other => Err(unexpected(self.purpose, &other)),
        }
    }
}

fn unexpected(purpose: Purpose, output: &BackendOutput) -> String {
    tracing::warn!(purpose = ?purpose, output = ?output, "unexpected collaborator output");
    format!("Respuesta inesperada del servidor ({purpose:?})")
}

/// Dispatches one operation to the matching capability.
///
/// # Errors
///
/// Propagates the collaborator's error.
pub fn execute(backend: &mut dyn Backend, op: BackendOp) -> Result<BackendOutput> {
    match op {
        BackendOp::SignUp { email, password } => backend
            .sign_up(&email, &password)
            .map(|identity| BackendOutput::Session(Some(identity))),
        BackendOp::SignIn { email, password } => backend
            .sign_in_with_password(&email, &password)
            .map(|identity| BackendOutput::Session(Some(identity))),
        BackendOp::SignOut => backend.sign_out().map(|()| BackendOutput::Session(None)),
        BackendOp::CurrentSession => backend.current_session().map(BackendOutput::Session),
        BackendOp::Upload {
            bucket,
            path,
            content_type,
            bytes,
        } => backend
            .upload(&bucket, &path, &content_type, &bytes)
            .map(|()| BackendOutput::Uploaded { path }),
        BackendOp::PublicUrl { bucket, path } => {
            Ok(BackendOutput::PublicUrl(backend.public_url(&bucket, &path)))
        }
        BackendOp::Insert { table, row } => backend.insert(&table, row).map(BackendOutput::Rows),
        BackendOp::Select { table, query } => {
            backend.select(&table, &query).map(BackendOutput::Rows)
        }
        BackendOp::Upsert { table, row } => backend.upsert(&table, row).map(BackendOutput::Rows),
    }
}

/// Serde adapter encoding byte buffers as standard base64 strings.
///
/// Photos cross the plugin/worker boundary inside JSON messages; a base64
/// string is a third of the size of a JSON number array.
pub mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
