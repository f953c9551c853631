//! Shared types between the PRD Guru server and its UI clients
//!
//! Everything here crosses the HTTP/WebSocket boundary as camelCase JSON and
//! is exported to TypeScript with ts-rs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

// ============================================================================
// Document
// ============================================================================

/// A product requirements document.
///
/// `id` is `None` until the document store assigns one on first save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "prd.ts")]
pub struct Document {
    pub id: Option<String>,
    pub title: String,
    pub objective: String,
    pub description: String,
    pub functional_requirements: String,
    pub non_functional_requirements: String,
    pub dependencies: String,
    pub acceptance_criteria: String,
}

/// The editable text fields of a [`Document`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub enum DocumentField {
    Title,
    Objective,
    Description,
    FunctionalRequirements,
    NonFunctionalRequirements,
    Dependencies,
    AcceptanceCriteria,
}

impl DocumentField {
    pub const ALL: [DocumentField; 7] = [
        DocumentField::Title,
        DocumentField::Objective,
        DocumentField::Description,
        DocumentField::FunctionalRequirements,
        DocumentField::NonFunctionalRequirements,
        DocumentField::Dependencies,
        DocumentField::AcceptanceCriteria,
    ];

    /// Wire name, as used in patches and JSON bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Objective => "objective",
            Self::Description => "description",
            Self::FunctionalRequirements => "functionalRequirements",
            Self::NonFunctionalRequirements => "nonFunctionalRequirements",
            Self::Dependencies => "dependencies",
            Self::AcceptanceCriteria => "acceptanceCriteria",
        }
    }

    /// Storage column name.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Objective => "objective",
            Self::Description => "description",
            Self::FunctionalRequirements => "functional_requirements",
            Self::NonFunctionalRequirements => "non_functional_requirements",
            Self::Dependencies => "dependencies",
            Self::AcceptanceCriteria => "acceptance_criteria",
        }
    }

    /// Human-readable section heading.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Objective => "Objective",
            Self::Description => "Description",
            Self::FunctionalRequirements => "Functional Requirements",
            Self::NonFunctionalRequirements => "Non-Functional Requirements",
            Self::Dependencies => "Dependencies",
            Self::AcceptanceCriteria => "Acceptance Criteria",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == key)
    }
}

impl std::fmt::Display for DocumentField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of applying a [`Patch`] to a [`Document`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Fields whose value changed, in field order.
    pub changed: Vec<DocumentField>,
    /// Patch keys that do not name a document field.
    pub ignored: Vec<String>,
}

impl Document {
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub fn field(&self, field: DocumentField) -> &str {
        match field {
            DocumentField::Title => &self.title,
            DocumentField::Objective => &self.objective,
            DocumentField::Description => &self.description,
            DocumentField::FunctionalRequirements => &self.functional_requirements,
            DocumentField::NonFunctionalRequirements => &self.non_functional_requirements,
            DocumentField::Dependencies => &self.dependencies,
            DocumentField::AcceptanceCriteria => &self.acceptance_criteria,
        }
    }

    fn field_mut(&mut self, field: DocumentField) -> &mut String {
        match field {
            DocumentField::Title => &mut self.title,
            DocumentField::Objective => &mut self.objective,
            DocumentField::Description => &mut self.description,
            DocumentField::FunctionalRequirements => &mut self.functional_requirements,
            DocumentField::NonFunctionalRequirements => &mut self.non_functional_requirements,
            DocumentField::Dependencies => &mut self.dependencies,
            DocumentField::AcceptanceCriteria => &mut self.acceptance_criteria,
        }
    }

    /// Unconditional overwrite of one field.
    pub fn set_field(&mut self, field: DocumentField, value: impl Into<String>) {
        *self.field_mut(field) = value.into();
    }

    /// Apply an assistant patch. Empty values never clear existing content and
    /// unknown keys are skipped; everything else overwrites (last write wins).
    pub fn apply_patch(&mut self, patch: &Patch) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        for (key, value) in patch.iter() {
            let Some(field) = DocumentField::from_key(key) else {
                outcome.ignored.push(key.clone());
                continue;
            };
            if value.is_empty() {
                continue;
            }
            if self.field(field) != value {
                self.set_field(field, value.clone());
                outcome.changed.push(field);
            }
        }
        outcome.changed.sort();
        outcome
    }
}

/// A document as returned by the store, with its timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct PersistedDocument {
    #[serde(flatten)]
    pub document: Document,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Patch
// ============================================================================

/// Partial field update extracted from one assistant reply.
///
/// Keys are wire names; unrecognised keys are carried through and ignored at
/// merge time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(transparent)]
#[ts(export, export_to = "prd.ts")]
pub struct Patch(pub BTreeMap<String, String>);

impl Patch {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Patch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ============================================================================
// Conversation
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "prd.ts")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in a session's chat log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct Turn {
    /// Monotonic within a session; log order is id order.
    #[ts(type = "number")]
    pub id: u64,
    pub role: TurnRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Change notifications pushed to session observers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "prd.ts")]
pub enum SessionEvent {
    TurnAppended {
        turn: Turn,
    },
    FieldUpdated {
        field: DocumentField,
        value: String,
    },
    SessionReset,
    DocumentLoaded {
        document: Document,
    },
    DocumentSaved {
        id: String,
    },
}

// ============================================================================
// API bodies
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct CreateSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub document: Document,
    pub turns: Vec<Turn>,
    pub busy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct SendMessageResponse {
    pub reply: Turn,
    pub patch: Option<Patch>,
    pub requires_upgrade: bool,
    pub document: Document,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct UpdateFieldRequest {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct LoadDocumentRequest {
    pub document_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct SaveDocumentResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct DocumentPreview {
    pub markdown: String,
    pub html: String,
}

// ============================================================================
// Settings & billing
// ============================================================================

/// Hosted model providers a user can bring a key for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "prd.ts")]
pub enum Provider {
    Anthropic,
    OpenAi,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Anthropic, Provider::OpenAi, Provider::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct SetApiKeyRequest {
    pub provider: Provider,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct ApiKeyStatus {
    pub provider: Provider,
    pub has_api_key: bool,
    pub masked_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "prd.ts")]
pub struct SubscriptionStatus {
    pub is_subscribed: bool,
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
}
