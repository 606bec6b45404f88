//! Typed API operations

use std::sync::Arc;

use cm_contracts::{
    validate_id, Contract, CreateProjectContract, EmployeeStatusContract, MaterialPatchContract,
    UpdateProjectContract,
};
use cm_core::{ApiResponse, CmError, CmResult, ListParams, FALLBACK_ERROR_MESSAGE};
use cm_models::{
    Employee, EmployeePerformance, EmployeeStatusSnapshot, EmployeeStatusUpdate, Material,
    MaterialAvailability, MaterialPatch, Project, ProjectCreateInput, ProjectProgressReport,
    ProjectUpdateInput,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::session::{MemorySession, SessionProvider};
use crate::transport::{ApiRequest, Method, RawResponse, Transport};

/// Upper bound the backend accepts for `limit` on the materials list
pub const MATERIALS_MAX_LIMIT: u32 = 100;

/// Client for the construction-management REST API.
///
/// Cloning is cheap; clones share the transport and session.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionProvider>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("has_session", &self.has_session())
            .finish()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<dyn SessionProvider>) -> Self {
        Self { transport, session }
    }

    /// Client without a session; requests carry no bearer token
    pub fn anonymous(transport: Arc<dyn Transport>) -> Self {
        Self::new(transport, Arc::new(MemorySession::anonymous()))
    }

    pub fn has_session(&self) -> bool {
        self.session.is_authenticated()
    }

    // ---------------------------------------------------------------- employees

    pub async fn list_employees(&self, params: &ListParams) -> CmResult<ApiResponse<Vec<Employee>>> {
        self.execute(ApiRequest::get("/api/employees").with_query(params.to_query()))
            .await
    }

    pub async fn get_employee(&self, id: &str) -> CmResult<ApiResponse<Employee>> {
        check_path_id("employee_id", id)?;
        self.execute(ApiRequest::get(format!("/api/employees/{id}")))
            .await
    }

    pub async fn get_employee_status(&self, id: &str) -> CmResult<ApiResponse<EmployeeStatusSnapshot>> {
        check_path_id("employee_id", id)?;
        self.execute(ApiRequest::get(format!("/api/employees/{id}/status")))
            .await
    }

    pub async fn update_employee_status(
        &self,
        id: &str,
        update: &EmployeeStatusUpdate,
    ) -> CmResult<ApiResponse<EmployeeStatusSnapshot>> {
        check_path_id("employee_id", id)?;
        EmployeeStatusContract::new().validate(update)?;
        let request = ApiRequest::new(Method::Put, format!("/api/employees/{id}/status"))
            .with_body(to_body(update)?);
        self.execute(request).await
    }

    pub async fn get_employee_performance(&self, id: &str) -> CmResult<ApiResponse<EmployeePerformance>> {
        check_path_id("employee_id", id)?;
        self.execute(ApiRequest::get(format!("/api/employees/{id}/performance")))
            .await
    }

    // ---------------------------------------------------------------- projects

    pub async fn list_projects(&self, params: &ListParams) -> CmResult<ApiResponse<Vec<Project>>> {
        self.execute(ApiRequest::get("/api/projects").with_query(params.to_query()))
            .await
    }

    pub async fn get_project(&self, id: &str) -> CmResult<ApiResponse<Project>> {
        check_path_id("project_id", id)?;
        self.execute(ApiRequest::get(format!("/api/projects/{id}")))
            .await
    }

    pub async fn create_project(&self, input: &ProjectCreateInput) -> CmResult<ApiResponse<Project>> {
        CreateProjectContract::new().validate(input)?;
        let request = ApiRequest::new(Method::Post, "/api/projects").with_body(to_body(input)?);
        self.execute(request).await
    }

    pub async fn update_project(
        &self,
        id: &str,
        input: &ProjectUpdateInput,
    ) -> CmResult<ApiResponse<Project>> {
        check_path_id("project_id", id)?;
        UpdateProjectContract::new().validate(input)?;
        let request = ApiRequest::new(Method::Patch, format!("/api/projects/{id}"))
            .with_body(to_body(input)?);
        self.execute(request).await
    }

    pub async fn get_project_progress(&self, id: &str) -> CmResult<ApiResponse<ProjectProgressReport>> {
        check_path_id("project_id", id)?;
        self.execute(ApiRequest::get(format!("/api/projects/{id}/progress")))
            .await
    }

    // ---------------------------------------------------------------- materials

    pub async fn list_materials(&self, params: &ListParams) -> CmResult<ApiResponse<Vec<Material>>> {
        let params = params.clone().clamped(MATERIALS_MAX_LIMIT);
        self.execute(ApiRequest::get("/api/materials").with_query(params.to_query()))
            .await
    }

    pub async fn get_material(&self, id: &str) -> CmResult<ApiResponse<Material>> {
        check_path_id("material_id", id)?;
        self.execute(ApiRequest::get(format!("/api/materials/{id}")))
            .await
    }

    pub async fn get_material_availability(&self) -> CmResult<ApiResponse<Vec<MaterialAvailability>>> {
        self.execute(ApiRequest::get("/api/materials/availability"))
            .await
    }

    pub async fn update_material(
        &self,
        id: &str,
        patch: &MaterialPatch,
    ) -> CmResult<ApiResponse<Material>> {
        check_path_id("material_id", id)?;
        MaterialPatchContract::new().validate(patch)?;
        let request = ApiRequest::new(Method::Patch, format!("/api/materials/{id}"))
            .with_body(to_body(patch)?);
        self.execute(request).await
    }

    // ---------------------------------------------------------------- plumbing

    async fn execute<R: DeserializeOwned>(&self, request: ApiRequest) -> CmResult<ApiResponse<R>> {
        let token = self.session.current().map(|s| s.access_token);
        let request = request.with_bearer(token);
        let (method, path) = (request.method, request.path.clone());

        debug!(%method, %path, "sending request");
        let response = self.transport.send(request).await.inspect_err(|e| {
            warn!(%method, %path, error = %e, "request failed");
        })?;

        if !response.is_success() {
            let message = error_message(&response);
            warn!(%method, %path, status = response.status, %message, "request rejected");
            return Ok(ApiResponse::rejected(response.status, message));
        }

        serde_json::from_str(&response.body)
            .map(ApiResponse::success)
            .map_err(|e| {
                warn!(%method, %path, error = %e, "undecodable response body");
                CmError::Decode(format!("{method} {path}: {e}"))
            })
    }
}

fn check_path_id(field: &str, id: &str) -> CmResult<()> {
    validate_id(field, id).map_err(CmError::from)
}

fn to_body<T: Serialize>(value: &T) -> CmResult<Value> {
    serde_json::to_value(value).map_err(|e| CmError::Internal(format!("unserializable body: {e}")))
}

/// Error text for a non-2xx response.
///
/// JSON bodies carrying a `detail` (string, or a list of `{msg}` entries)
/// yield that detail; any other non-blank body is used verbatim.
fn error_message(response: &RawResponse) -> String {
    let body = response.body.trim();
    if body.is_empty() {
        return FALLBACK_ERROR_MESSAGE.to_string();
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        match map.get("detail") {
            Some(Value::String(detail)) if !detail.trim().is_empty() => return detail.clone(),
            Some(Value::Array(items)) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if !messages.is_empty() {
                    return messages.join("; ");
                }
            }
            _ => {}
        }
    }

    body.to_string()
}
