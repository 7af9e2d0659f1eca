//! Employee management endpoints

use super::{ApiResponse, push_param};
use crate::auth_client::ApiClient;
use crate::error::Result;
use crate::request::{ApiRequest, FormData};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Staff,
    Admin,
    Supervisor,
    /// Any role this client does not know about
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Admin => "admin",
            Self::Supervisor => "supervisor",
            Self::Unknown => "unknown",
        }
    }

    /// Admins manage every employee and every document
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Employee as returned by the management endpoints
///
/// The backend sends either PascalCase or snake_case keys depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Employee {
    #[serde(rename = "ID", alias = "id")]
    pub id: String,
    #[serde(alias = "name")]
    pub name: String,
    #[serde(alias = "username")]
    pub username: String,
    #[serde(alias = "role")]
    pub role: Role,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, alias = "updated_at", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Employee as returned by the profile endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub username: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(default)]
    pub message: String,
    pub profile: Profile,
}

/// Fields for creating an employee
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeInput {
    pub name: String,
    pub username: String,
    pub password: Option<String>,
    pub role: Role,
}

impl EmployeeInput {
    fn to_form(&self) -> FormData {
        FormData::new()
            .text("name", self.name.as_str())
            .text("username", self.username.as_str())
            .text_opt("password", self.password.as_deref())
            .text("role", self.role.as_str())
    }
}

/// Partial update of an employee; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
}

impl EmployeeUpdate {
    fn to_form(&self) -> FormData {
        FormData::new()
            .text_opt("name", self.name.as_deref())
            .text_opt("username", self.username.as_deref())
            .text_opt("role", self.role.map(|r| r.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Filters and paging for the employee list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl EmployeeFilter {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        // Zero means "not set", the backend applies its own default
        push_param(&mut params, "limit", self.limit.filter(|l| *l > 0));
        push_param(&mut params, "page", self.page.filter(|p| *p > 0));
        push_param(&mut params, "name", self.name.as_deref());
        push_param(&mut params, "role", self.role.map(|r| r.as_str()));
        push_param(&mut params, "start_date", self.start_date.as_deref());
        push_param(&mut params, "end_date", self.end_date.as_deref());
        push_param(&mut params, "sort_by", self.sort_by.as_deref());
        push_param(&mut params, "sort_order", self.sort_order.map(|o| o.as_str()));
        params
    }
}

impl ApiClient {
    pub async fn create_employee(&self, input: &EmployeeInput) -> Result<ApiResponse<Employee>> {
        let request = ApiRequest::post("/api/employee/").form(input.to_form());
        self.execute(request).await
    }

    pub async fn search_employees(&self, name: &str) -> Result<ApiResponse<Vec<Employee>>> {
        let request = ApiRequest::get("/api/employee/search").query([("name", name)]);
        self.execute(request).await
    }

    pub async fn list_employees(
        &self,
        filter: &EmployeeFilter,
    ) -> Result<ApiResponse<Vec<Employee>>> {
        let request = ApiRequest::get("/api/employee/").query(filter.query_pairs());
        self.execute(request).await
    }

    pub async fn get_employee(&self, id: &str) -> Result<ApiResponse<Employee>> {
        self.execute(ApiRequest::get(format!("/api/employee/{id}"))).await
    }

    pub async fn update_employee(
        &self,
        id: &str,
        update: &EmployeeUpdate,
    ) -> Result<ApiResponse<Employee>> {
        let request = ApiRequest::patch(format!("/api/employee/{id}")).form(update.to_form());
        self.execute(request).await
    }

    pub async fn delete_employee(&self, id: &str) -> Result<ApiResponse<serde_json::Value>> {
        self.execute(ApiRequest::delete(format!("/api/employee/{id}"))).await
    }

    /// Profile of the signed-in employee
    pub async fn profile(&self) -> Result<ProfileResponse> {
        self.execute(ApiRequest::get("/api/employee/me")).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<ApiResponse<Employee>> {
        let form = FormData::new()
            .text("name", update.name.as_str())
            .text("username", update.username.as_str());
        self.execute(ApiRequest::patch("/api/employee/me").form(form)).await
    }

    pub async fn change_password(
        &self,
        input: &ChangePasswordInput,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let form = FormData::new()
            .text("current_password", input.current_password.as_str())
            .text("new_password", input.new_password.as_str())
            .text("confirm_password", input.confirm_password.as_str());
        let request = ApiRequest::patch("/api/employee/me/change-password").form(form);
        self.execute(request).await
    }
}
