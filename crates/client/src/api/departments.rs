//! Departments and roles.
//!
//! The backend returns departments either as a flat list with parent ids or
//! as a ready-made tree. Both are accepted; the cache always holds the flat
//! form.

use oa_core::department::{build_tree, flatten_tree, Department, DepartmentPayload, Role};
use oa_core::roles::PERM_DEPT_MANAGE;
use oa_core::types::DbId;
use reqwest::Method;
use serde::Deserialize;

use crate::cache::{KEY_DEPARTMENTS, KEY_ROLES};
use crate::de;
use crate::envelope::PageDto;
use crate::error::{ApiError, ApiResult};
use crate::transport::ApiClient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DepartmentDto {
    #[serde(alias = "deptId", deserialize_with = "de::id")]
    id: DbId,
    #[serde(default, deserialize_with = "de::string")]
    name: String,
    #[serde(default, deserialize_with = "de::string")]
    dept_name: String,
    #[serde(default, deserialize_with = "de::opt_id")]
    parent_id: Option<DbId>,
    #[serde(default, deserialize_with = "de::opt_string")]
    leader: Option<String>,
    #[serde(default, alias = "orderNum", deserialize_with = "de::i32_or_zero")]
    sort: i32,
    #[serde(default, deserialize_with = "de::vec_or_empty")]
    children: Vec<DepartmentDto>,
}

impl From<DepartmentDto> for Department {
    fn from(dto: DepartmentDto) -> Self {
        Self {
            id: dto.id,
            name: de::first_text([dto.name, dto.dept_name]),
            parent_id: dto.parent_id,
            leader: dto.leader,
            sort: dto.sort,
            children: dto.children.into_iter().map(Department::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RoleDto {
    #[serde(alias = "roleId", deserialize_with = "de::id")]
    id: DbId,
    #[serde(default, alias = "roleName", deserialize_with = "de::string")]
    name: String,
    #[serde(default, deserialize_with = "de::string")]
    code: String,
    #[serde(default, deserialize_with = "de::string")]
    role_code: String,
    #[serde(default, deserialize_with = "de::string")]
    role_key: String,
}

impl From<RoleDto> for Role {
    fn from(dto: RoleDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            code: de::first_text([dto.code, dto.role_code, dto.role_key]),
        }
    }
}

/// Flatten a backend department listing, tree-shaped or not.
///
/// Children nested in a tree get their parent id from the enclosing node
/// when the backend left it out.
fn flatten_listing(nodes: Vec<Department>) -> Vec<Department> {
    fn fill_parent_ids(nodes: &mut [Department]) {
        for node in nodes {
            let id = node.id;
            for child in &mut node.children {
                child.parent_id.get_or_insert(id);
            }
            fill_parent_ids(&mut node.children);
        }
    }

    let mut nodes = nodes;
    fill_parent_ids(&mut nodes);
    flatten_tree(nodes)
}

impl ApiClient {
    /// All departments as a flat list. Served from the query cache.
    pub async fn list_departments(&self) -> ApiResult<Vec<Department>> {
        self.cache()
            .get_or_fetch(KEY_DEPARTMENTS, || async {
                let request = self.request(Method::GET, "/api/departments").await;
                let listing: PageDto<DepartmentDto> = self.execute(request).await?;
                let nodes = listing
                    .into_records()
                    .into_iter()
                    .map(Department::from)
                    .collect();
                Ok::<_, ApiError>(flatten_listing(nodes))
            })
            .await
    }

    /// All departments arranged as a tree.
    pub async fn department_tree(&self) -> ApiResult<Vec<Department>> {
        Ok(build_tree(self.list_departments().await?))
    }

    pub async fn create_department(&self, payload: &DepartmentPayload) -> ApiResult<()> {
        self.authorize(PERM_DEPT_MANAGE).await?;
        payload.validate()?;
        let request = self
            .request(Method::POST, "/api/departments")
            .await
            .json(payload);
        self.execute_unit(request).await?;
        self.cache().invalidate(KEY_DEPARTMENTS).await;
        Ok(())
    }

    pub async fn update_department(&self, id: DbId, payload: &DepartmentPayload) -> ApiResult<()> {
        self.authorize(PERM_DEPT_MANAGE).await?;
        payload.validate()?;
        let request = self
            .request(Method::PUT, &format!("/api/departments/{id}"))
            .await
            .json(payload);
        self.execute_unit(request).await?;
        self.cache().invalidate(KEY_DEPARTMENTS).await;
        Ok(())
    }

    pub async fn delete_department(&self, id: DbId) -> ApiResult<()> {
        self.authorize(PERM_DEPT_MANAGE).await?;
        let request = self
            .request(Method::DELETE, &format!("/api/departments/{id}"))
            .await;
        self.execute_unit(request).await?;
        self.cache().invalidate(KEY_DEPARTMENTS).await;
        Ok(())
    }

    /// All roles, for the role picker. Served from the query cache.
    pub async fn list_roles(&self) -> ApiResult<Vec<Role>> {
        self.cache()
            .get_or_fetch(KEY_ROLES, || async {
                let request = self.request(Method::GET, "/api/roles").await;
                let listing: PageDto<RoleDto> = self.execute(request).await?;
                Ok::<_, ApiError>(listing.into_records().into_iter().map(Role::from).collect())
            })
            .await
    }
}
