//! Workflow instances and approval tasks.
//!
//! Approve/reject are forwarded to the backend as-is; whether a transition
//! is allowed is decided there.

use oa_core::error::CoreError;
use oa_core::page::Page;
use oa_core::roles::PERM_WORKFLOW_APPROVE;
use oa_core::types::{DbId, Timestamp};
use oa_core::workflow::{
    StartWorkflow, TaskDecision, Workflow, WorkflowKind, WorkflowQuery, WorkflowStatus,
    WorkflowTask,
};
use reqwest::Method;
use serde::de::Error as _;
use serde::Deserialize;

use crate::de;
use crate::envelope::PageDto;
use crate::error::ApiResult;
use crate::transport::ApiClient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowDto {
    #[serde(deserialize_with = "de::id")]
    id: DbId,
    #[serde(default, rename = "type", deserialize_with = "de::string")]
    kind: String,
    #[serde(default, deserialize_with = "de::string")]
    process_key: String,
    #[serde(default, deserialize_with = "de::string")]
    process_definition_key: String,
    #[serde(default, deserialize_with = "de::string")]
    title: String,
    #[serde(default, deserialize_with = "de::string")]
    name: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    applicant_id: Option<DbId>,
    #[serde(default, deserialize_with = "de::opt_id")]
    user_id: Option<DbId>,
    #[serde(default, deserialize_with = "de::opt_id")]
    start_user_id: Option<DbId>,
    #[serde(default, deserialize_with = "de::string")]
    applicant_name: String,
    #[serde(default, deserialize_with = "de::string")]
    start_user_name: String,
    #[serde(default, deserialize_with = "de::string")]
    user_name: String,
    #[serde(default, deserialize_with = "de::string")]
    status: String,
    #[serde(default, deserialize_with = "de::string")]
    current_approver: String,
    #[serde(default, deserialize_with = "de::string")]
    assignee: String,
    #[serde(default)]
    form: serde_json::Value,
    #[serde(default)]
    form_data: serde_json::Value,
    #[serde(default)]
    variables: serde_json::Value,
    #[serde(default, alias = "createdAt", deserialize_with = "de::timestamp")]
    create_time: Option<Timestamp>,
    #[serde(default, deserialize_with = "de::timestamp")]
    start_time: Option<Timestamp>,
    #[serde(default, alias = "updatedAt", deserialize_with = "de::timestamp")]
    update_time: Option<Timestamp>,
}

impl From<WorkflowDto> for Workflow {
    fn from(dto: WorkflowDto) -> Self {
        let form = [dto.form, dto.form_data, dto.variables]
            .into_iter()
            .find(|v| !v.is_null())
            .unwrap_or(serde_json::Value::Null);
        let form = match form {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            // Some backends store the form as a JSON string column.
            serde_json::Value::String(raw) => {
                serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
            }
            other => other,
        };
        let kind = de::first_text([dto.kind, dto.process_key, dto.process_definition_key]);
        let approver = de::first_text([dto.current_approver, dto.assignee]);
        Self {
            id: dto.id,
            kind: WorkflowKind::from_backend(&kind),
            title: de::first_text([dto.title, dto.name]),
            applicant_id: dto
                .applicant_id
                .or(dto.user_id)
                .or(dto.start_user_id)
                .unwrap_or_default(),
            applicant_name: de::first_text([dto.applicant_name, dto.start_user_name, dto.user_name]),
            status: WorkflowStatus::from_backend(&dto.status),
            current_approver: (!approver.is_empty()).then_some(approver),
            form,
            created_at: dto.create_time.or(dto.start_time),
            updated_at: dto.update_time,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDto {
    #[serde(default, deserialize_with = "de::string")]
    id: String,
    #[serde(default, deserialize_with = "de::string")]
    task_id: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    workflow_id: Option<DbId>,
    #[serde(default, deserialize_with = "de::opt_id")]
    business_key: Option<DbId>,
    #[serde(default, deserialize_with = "de::opt_id")]
    instance_id: Option<DbId>,
    #[serde(default, alias = "taskName", deserialize_with = "de::string")]
    name: String,
    #[serde(default, deserialize_with = "de::string")]
    workflow_title: String,
    #[serde(default, deserialize_with = "de::string")]
    title: String,
    #[serde(default, deserialize_with = "de::string")]
    process_title: String,
    #[serde(default, deserialize_with = "de::string")]
    assignee: String,
    #[serde(default, alias = "createdAt", deserialize_with = "de::timestamp")]
    create_time: Option<Timestamp>,
}

impl TaskDto {
    /// A task must carry an id under one of its spellings.
    fn into_task(self) -> Result<WorkflowTask, serde_json::Error> {
        let id = de::first_text([self.id, self.task_id]);
        if id.trim().is_empty() {
            return Err(serde_json::Error::missing_field("id"));
        }
        Ok(WorkflowTask {
            id,
            workflow_id: self.workflow_id.or(self.business_key).or(self.instance_id),
            name: self.name,
            workflow_title: de::first_text([self.workflow_title, self.title, self.process_title]),
            assignee: self.assignee,
            created_at: self.create_time,
        })
    }
}

impl ApiClient {
    pub async fn list_workflows(&self, query: &WorkflowQuery) -> ApiResult<Page<Workflow>> {
        let request = self.request(Method::GET, "/api/workflows").await.query(query);
        let page: PageDto<WorkflowDto> = self.execute(request).await?;
        Ok(page.into_page().map(Workflow::from))
    }

    pub async fn get_workflow(&self, id: DbId) -> ApiResult<Workflow> {
        let request = self
            .request(Method::GET, &format!("/api/workflows/{id}"))
            .await;
        let dto: Option<WorkflowDto> = self.execute(request).await?;
        dto.map(Workflow::from)
            .ok_or_else(|| CoreError::NotFound { entity: "workflow", id }.into())
    }

    /// Submit a new leave/expense/procurement/travel application.
    pub async fn start_workflow(&self, payload: &StartWorkflow) -> ApiResult<()> {
        payload.validate()?;
        let request = self
            .request(Method::POST, "/api/workflows")
            .await
            .json(payload);
        self.execute_unit(request).await?;
        tracing::info!(kind = payload.kind.as_str(), title = %payload.title, "Workflow started");
        Ok(())
    }

    /// Approval steps waiting on the signed-in user.
    pub async fn pending_tasks(&self) -> ApiResult<Vec<WorkflowTask>> {
        let request = self
            .request(Method::GET, "/api/workflows/tasks/pending")
            .await;
        let listing: PageDto<TaskDto> = self.execute(request).await?;
        let tasks = listing
            .into_records()
            .into_iter()
            .map(TaskDto::into_task)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    pub async fn approve_task(&self, task_id: &str, decision: &TaskDecision) -> ApiResult<()> {
        self.decide_task(task_id, "approve", decision).await
    }

    pub async fn reject_task(&self, task_id: &str, decision: &TaskDecision) -> ApiResult<()> {
        self.decide_task(task_id, "reject", decision).await
    }

    /// Withdraw one of the signed-in user's own applications.
    pub async fn withdraw_workflow(&self, id: DbId) -> ApiResult<()> {
        let request = self
            .request(Method::POST, &format!("/api/workflows/{id}/withdraw"))
            .await;
        self.execute_unit(request).await
    }

    async fn decide_task(&self, task_id: &str, action: &str, decision: &TaskDecision) -> ApiResult<()> {
        if task_id.trim().is_empty() {
            return Err(CoreError::Validation("Task id is required".into()).into());
        }
        self.authorize(PERM_WORKFLOW_APPROVE).await?;
        let request = self
            .request(Method::POST, &format!("/api/workflows/tasks/{task_id}/{action}"))
            .await
            .json(decision);
        self.execute_unit(request).await?;
        tracing::info!(task_id, action, "Workflow task decided");
        Ok(())
    }
}
