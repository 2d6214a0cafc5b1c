//! Approval workflows (leave, expense, procurement, travel).
//!
//! Status transitions are owned by the backend; the console only maps the
//! backend's status strings and never validates a transition locally.

use serde::{Serialize, Serializer};

use crate::error::CoreError;
use crate::page::PageQuery;
use crate::types::{DbId, Timestamp};

pub const KIND_LEAVE: &str = "leave";
pub const KIND_EXPENSE: &str = "expense";
pub const KIND_PROCUREMENT: &str = "procurement";
pub const KIND_TRAVEL: &str = "travel";

/// Business process a workflow instance belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowKind {
    Leave,
    Expense,
    Procurement,
    Travel,
    /// A process key the console has no dedicated form for.
    Other(String),
}

impl WorkflowKind {
    /// Map a backend process key, case-insensitively.
    pub fn from_backend(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            KIND_LEAVE => Self::Leave,
            KIND_EXPENSE | "reimbursement" => Self::Expense,
            KIND_PROCUREMENT | "purchase" => Self::Procurement,
            KIND_TRAVEL | "business_trip" => Self::Travel,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Leave => KIND_LEAVE,
            Self::Expense => KIND_EXPENSE,
            Self::Procurement => KIND_PROCUREMENT,
            Self::Travel => KIND_TRAVEL,
            Self::Other(key) => key,
        }
    }
}

impl Serialize for WorkflowKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Where an instance sits in its approval chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Pending,
    Processing,
    Approved,
    Rejected,
}

impl WorkflowStatus {
    /// Map the backend's status string or numeric code.
    ///
    /// Unrecognized values map to `Pending`.
    pub fn from_backend(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "processing" | "running" | "in_progress" | "active" | "1" => Self::Processing,
            "approved" | "completed" | "finished" | "passed" | "2" => Self::Approved,
            "rejected" | "terminated" | "refused" | "3" => Self::Rejected,
            _ => Self::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the backend has finished with this instance.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

/// A workflow instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workflow {
    pub id: DbId,
    pub kind: WorkflowKind,
    pub title: String,
    pub applicant_id: DbId,
    pub applicant_name: String,
    pub status: WorkflowStatus,
    pub current_approver: Option<String>,
    /// Kind-specific form fields, passed through untouched.
    pub form: serde_json::Value,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

/// An approval step waiting on the current user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowTask {
    pub id: String,
    /// Owning workflow, when the backend links the task to a business row.
    pub workflow_id: Option<DbId>,
    pub name: String,
    pub workflow_title: String,
    pub assignee: String,
    pub created_at: Option<Timestamp>,
}

/// Query for the paged workflow list.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<WorkflowKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_id: Option<DbId>,
}

/// Payload for starting a new workflow instance.
#[derive(Debug, Clone, Serialize)]
pub struct StartWorkflow {
    #[serde(rename = "type")]
    pub kind: WorkflowKind,
    pub title: String,
    pub form: serde_json::Value,
}

impl StartWorkflow {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("Workflow title is required".into()));
        }
        if !self.form.is_object() {
            return Err(CoreError::Validation(
                "Workflow form must be a JSON object".into(),
            ));
        }
        if let WorkflowKind::Other(key) = &self.kind {
            if key.is_empty() {
                return Err(CoreError::Validation("Workflow type is required".into()));
            }
        }
        Ok(())
    }
}

/// Body for approve/reject calls.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TaskDecision {
    pub fn with_comment(comment: impl Into<String>) -> Self {
        let comment = comment.into();
        Self {
            comment: (!comment.trim().is_empty()).then_some(comment),
        }
    }
}
