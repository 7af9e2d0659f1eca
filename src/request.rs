//! Replayable request descriptions
//!
//! A request that runs into an expired session is sent again after the tokens are
//! refreshed, so it is kept as plain data and turned into a `reqwest` request once per
//! attempt.

use crate::error::{ClientError, Result};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use std::path::Path;

/// File attached to a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Read a file from disk, naming the upload after the file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ClientError::Configuration(format!("{} has no file name", path.display()))
            })?;
        let bytes = std::fs::read(path)?;
        Ok(Self::new(file_name, bytes))
    }

    fn to_part(&self) -> Result<Part> {
        let part = Part::bytes(self.bytes.clone()).file_name(self.file_name.clone());
        match &self.mime_type {
            Some(mime) => Ok(part.mime_str(mime)?),
            None => Ok(part),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FormValue {
    Text(String),
    File(FileUpload),
}

/// Multipart form fields, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), FormValue::Text(value.into())));
        self
    }

    /// Add a text field only when a non-blank value is present
    pub fn text_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value.map(Into::into) {
            Some(value) if !value.trim().is_empty() => self.text(name, value),
            _ => self,
        }
    }

    pub fn file(mut self, name: impl Into<String>, file: FileUpload) -> Self {
        self.fields.push((name.into(), FormValue::File(file)));
        self
    }

    pub fn file_opt(self, name: impl Into<String>, file: Option<FileUpload>) -> Self {
        match file {
            Some(file) => self.file(name, file),
            None => self,
        }
    }

    /// Text value of the first field with this name
    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(n, v)| match v {
            FormValue::Text(t) if n == name => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Build a fresh multipart form for one attempt
    pub fn to_multipart(&self) -> Result<Form> {
        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = match value {
                FormValue::Text(text) => form.text(name.clone(), text.clone()),
                FormValue::File(file) => form.part(name.clone(), file.to_part()?),
            };
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Form(FormData),
}

/// A request against the archive API, relative to the configured base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Send without the refresh protocol (login, logout, refresh itself)
    pub skip_refresh: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            skip_refresh: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn form(self, form: FormData) -> Self {
        self.body(RequestBody::Form(form))
    }

    pub fn json(self, value: serde_json::Value) -> Self {
        self.body(RequestBody::Json(value))
    }

    pub fn skip_refresh(mut self) -> Self {
        self.skip_refresh = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_optional_fields() {
        let form = FormData::new()
            .text("subject", "Contract")
            .text_opt("user_id", Some("  "))
            .text_opt("employee_id", Some("emp-7"))
            .text_opt("role", None::<String>)
            .file_opt("file", None);

        assert_eq!(form.get_text("subject"), Some("Contract"));
        assert!(!form.has_field("user_id"));
        assert_eq!(form.get_text("employee_id"), Some("emp-7"));
        assert!(!form.has_field("role"));
        assert!(!form.has_field("file"));
    }

    #[test]
    fn test_form_is_rebuilt_per_attempt() {
        let form = FormData::new()
            .text("subject", "Payslip")
            .file(
                "file",
                FileUpload::new("payslip.pdf", b"%PDF-1.4".to_vec())
                    .with_mime_type("application/pdf"),
            );

        // Building twice must not consume the description
        assert!(form.to_multipart().is_ok());
        assert!(form.to_multipart().is_ok());
    }

    #[test]
    fn test_invalid_mime_type() {
        let form = FormData::new().file(
            "file",
            FileUpload::new("a.bin", vec![0u8]).with_mime_type("not a mime"),
        );
        assert!(matches!(
            form.to_multipart(),
            Err(ClientError::HttpRequest(_))
        ));
    }

    #[test]
    fn test_upload_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.txt");
        std::fs::write(&path, "hello").unwrap();

        let upload = FileUpload::from_path(&path).unwrap();
        assert_eq!(upload.file_name, "memo.txt");
        assert_eq!(upload.bytes, b"hello");
    }

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::get("/api/employee/search")
            .query([("name", "ana")])
            .skip_refresh();

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.query, vec![("name".to_string(), "ana".to_string())]);
        assert_eq!(request.body, RequestBody::Empty);
        assert!(request.skip_refresh);
    }
}
