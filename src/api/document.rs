//! Document archive endpoints

use super::{ApiResponse, push_param};
use crate::auth_client::ApiClient;
use crate::error::Result;
use crate::request::{ApiRequest, FileUpload, FormData};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOwner {
    pub name: String,
    pub username: String,
}

/// Archived document belonging to an employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub subject: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    pub file_url: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub user: Option<DocumentOwner>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedDocuments {
    #[serde(default)]
    pub documents: Vec<Document>,
    pub pagination: Pagination,
}

/// Document created or edited by an administrator on behalf of an employee
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentAdminInput {
    pub subject: String,
    pub user_id: Option<String>,
    pub employee_id: Option<String>,
    pub file: Option<FileUpload>,
}

impl DocumentAdminInput {
    fn to_form(&self) -> FormData {
        // Blank owner ids would unassign the document, so they are not sent
        FormData::new()
            .text("subject", self.subject.as_str())
            .text_opt("user_id", self.user_id.as_deref())
            .text_opt("employee_id", self.employee_id.as_deref())
            .file_opt("file", self.file.clone())
    }
}

/// Document uploaded or edited by its owner
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSelfInput {
    pub subject: String,
    pub file: Option<FileUpload>,
}

impl DocumentSelfInput {
    fn to_form(&self) -> FormData {
        FormData::new()
            .text("subject", self.subject.as_str())
            .file_opt("file", self.file.clone())
    }
}

/// Filters and paging for document lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub limit: Option<u32>,
    pub page: Option<u32>,
    pub subject: Option<String>,
    /// Only honoured by the organization-wide list
    pub user_id: Option<String>,
    /// Only honoured by the organization-wide list
    pub employee_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DocumentFilter {
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut params = self.common_pairs();
        push_param(&mut params, "user_id", self.user_id.as_deref());
        push_param(&mut params, "employee_id", self.employee_id.as_deref());
        params
    }

    /// Filters that apply to the signed-in employee's own documents
    pub fn own_query_pairs(&self) -> Vec<(String, String)> {
        self.common_pairs()
    }

    fn common_pairs(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        push_param(&mut params, "limit", self.limit.filter(|l| *l > 0));
        push_param(&mut params, "page", self.page.filter(|p| *p > 0));
        push_param(&mut params, "subject", self.subject.as_deref());
        push_param(&mut params, "start_date", self.start_date.as_deref());
        push_param(&mut params, "end_date", self.end_date.as_deref());
        params
    }
}

impl ApiClient {
    /// Create a document for any employee (admin)
    pub async fn create_document(
        &self,
        input: &DocumentAdminInput,
    ) -> Result<ApiResponse<Document>> {
        let request = ApiRequest::post("/api/document_staff/").form(input.to_form());
        self.execute(request).await
    }

    /// Upload a document owned by the signed-in employee
    pub async fn upload_my_document(
        &self,
        input: &DocumentSelfInput,
    ) -> Result<ApiResponse<Document>> {
        let request = ApiRequest::post("/api/document_staff/upload").form(input.to_form());
        self.execute(request).await
    }

    /// List documents organization-wide (admin)
    pub async fn list_documents(
        &self,
        filter: &DocumentFilter,
    ) -> Result<ApiResponse<PaginatedDocuments>> {
        let request = ApiRequest::get("/api/document_staff/").query(filter.query_pairs());
        self.execute(request).await
    }

    pub async fn list_my_documents(
        &self,
        filter: &DocumentFilter,
    ) -> Result<ApiResponse<PaginatedDocuments>> {
        let request =
            ApiRequest::get("/api/document_staff/my-documents").query(filter.own_query_pairs());
        self.execute(request).await
    }

    /// Edit any document (admin); the file is replaced only when one is given
    pub async fn update_document(
        &self,
        id: &str,
        input: &DocumentAdminInput,
    ) -> Result<ApiResponse<Document>> {
        let request =
            ApiRequest::patch(format!("/api/document_staff/{id}")).form(input.to_form());
        self.execute(request).await
    }

    pub async fn update_my_document(
        &self,
        id: &str,
        input: &DocumentSelfInput,
    ) -> Result<ApiResponse<Document>> {
        let request = ApiRequest::patch(format!("/api/document_staff/my-documents/{id}"))
            .form(input.to_form());
        self.execute(request).await
    }

    pub async fn delete_document(&self, id: &str) -> Result<ApiResponse<serde_json::Value>> {
        self.execute(ApiRequest::delete(format!("/api/document_staff/{id}"))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_form_skips_blank_owner_ids() {
        let input = DocumentAdminInput {
            subject: "Employment contract".to_string(),
            user_id: Some(" ".to_string()),
            employee_id: Some("emp-3".to_string()),
            file: None,
        };
        let form = input.to_form();

        assert_eq!(form.get_text("subject"), Some("Employment contract"));
        assert!(!form.has_field("user_id"));
        assert_eq!(form.get_text("employee_id"), Some("emp-3"));
        assert!(!form.has_field("file"));
    }

    #[test]
    fn test_own_list_ignores_owner_filters() {
        let filter = DocumentFilter {
            page: Some(2),
            subject: Some("payslip".to_string()),
            user_id: Some("u-1".to_string()),
            ..Default::default()
        };

        assert!(filter.query_pairs().contains(&("user_id".to_string(), "u-1".to_string())));
        assert_eq!(
            filter.own_query_pairs(),
            vec![
                ("page".to_string(), "2".to_string()),
                ("subject".to_string(), "payslip".to_string()),
            ]
        );
    }

    #[test]
    fn test_paginated_documents_wire_format() {
        let page: PaginatedDocuments = serde_json::from_value(serde_json::json!({
            "documents": [{
                "id": "d-1",
                "subject": "KTP scan",
                "file_url": "https://files.example/d-1.pdf",
                "created_at": "2025-03-01",
                "updated_at": "2025-03-02",
                "user": { "name": "Siti", "username": "siti" }
            }],
            "pagination": {
                "current_page": 1,
                "per_page": 10,
                "total_items": 1,
                "total_pages": 1
            }
        }))
        .unwrap();

        assert_eq!(page.documents.len(), 1);
        assert_eq!(page.documents[0].user.as_ref().unwrap().username, "siti");
        assert!(page.documents[0].file_name.is_none());
        assert_eq!(page.pagination.total_pages, 1);
    }
}
