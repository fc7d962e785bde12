//! Core types for repo-drop

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;

/// Number of random bytes behind every correlation token
pub const TOKEN_BYTES: usize = 32;

/// Opaque, unguessable correlation token
///
/// Doubles as the OAuth `state` parameter (CSRF nonce) and as the key the
/// callback uses to find its [`Task`]. Generated from the operating system
/// CSPRNG, so uniqueness across concurrent flows comes from the randomness
/// source rather than from any ordering.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskToken(String);

impl TaskToken {
    /// Generate a fresh token from [`TOKEN_BYTES`] random bytes, hex-encoded
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);

        Self(hex::encode(bytes))
    }

    /// Wrap a value received from the outside (e.g., a callback `state`)
    pub fn from_untrusted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The full token value, for building the redirect URL
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, safe to put in logs
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Debug for TaskToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskToken({}…)", self.short())
    }
}

/// Payload a flow commits: base64 file bytes and their MIME type
///
/// The bytes stay in their transport encoding from generation to storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Standard base64 of the file contents
    pub data: String,
    /// MIME type reported by whoever produced the bytes
    pub mime_type: String,
}

impl Artifact {
    /// Artifact with an explicit MIME type
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// PNG artifact, as used for the configured default image
    pub fn png(data: impl Into<String>) -> Self {
        Self::new(data, "image/png")
    }

    /// File extension for known image types
    pub fn extension(&self) -> Option<&'static str> {
        match self.mime_type.to_ascii_lowercase().as_str() {
            "image/png" => Some("png"),
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/gif" => Some("gif"),
            "image/webp" => Some("webp"),
            _ => None,
        }
    }
}

/// In-flight unit of work correlating a redirect with its later callback
///
/// Created when a flow starts, read exactly once by the callback that carries
/// its token, never mutated.
#[derive(Clone, Debug)]
pub struct Task {
    /// Correlation token / OAuth state
    pub token: TaskToken,
    /// Payload to commit
    pub artifact: Artifact,
    /// Repository name the artifact is committed into
    pub target_resource: String,
    /// When the task was registered (monotonic, drives expiry)
    pub created_at: Instant,
}

impl Task {
    /// Returns true once the task has been waiting longer than `ttl`
    pub fn is_expired(&self, ttl: std::time::Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }
}

/// Bearer token obtained from the code exchange
///
/// Lives only for the duration of one callback pipeline. `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a freshly exchanged access token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw bearer value, for the `Authorization` header only
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The account acting on the user's behalf
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// Account login, used as the repository owner
    pub login: String,
}

/// Result of a successful content write
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitOutcome {
    /// Repository owner (the resolved identity)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Path of the written file
    pub path: String,
    /// Browser URL of the written file, when the provider returned one
    pub html_url: Option<String>,
    /// Commit SHA, when the provider returned one
    pub commit_sha: Option<String>,
}

/// Everything the success page needs once a flow completes
#[derive(Clone, Debug)]
pub struct Completion {
    /// What was written where
    pub outcome: CommitOutcome,
    /// The artifact that was committed, for the inline preview
    pub artifact: Artifact,
}

/// Where a flow is in its lifecycle
///
/// Not stored anywhere; the flow controller records transitions in its
/// tracing span so a stuck or failed flow can be located in the logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowStage {
    /// Task registered, redirect not yet issued
    Created,
    /// Redirect issued, user is authenticating with the provider
    AwaitingCallback,
    /// Valid callback received
    CodeReceived,
    /// Code exchange in flight
    Exchanging,
    /// Access token parsed
    CredentialObtained,
    /// Identity call in flight
    ResolvingIdentity,
    /// Login parsed
    IdentityResolved,
    /// Content write in flight
    Persisting,
    /// Artifact committed
    Completed,
    /// Terminated with an error
    Failed,
}

impl FlowStage {
    /// Stable lowercase name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStage::Created => "created",
            FlowStage::AwaitingCallback => "awaiting_callback",
            FlowStage::CodeReceived => "code_received",
            FlowStage::Exchanging => "exchanging",
            FlowStage::CredentialObtained => "credential_obtained",
            FlowStage::ResolvingIdentity => "resolving_identity",
            FlowStage::IdentityResolved => "identity_resolved",
            FlowStage::Persisting => "persisting",
            FlowStage::Completed => "completed",
            FlowStage::Failed => "failed",
        }
    }
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
