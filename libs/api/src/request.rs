//! Replayable request descriptions
//!
//! A [`reqwest::RequestBuilder`] cannot be cloned once it carries a multipart
//! body, and the pipeline must be able to send the same request twice (once
//! with the stale token, once after a refresh). Requests are therefore kept as
//! plain data and turned into a builder on every attempt.

use std::path::Path;

use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};

/// A file to upload
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.mime.starts_with("video/")
    }
}

/// One multipart form field
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, upload: Upload },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormField::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(name: impl Into<String>, upload: Upload) -> Self {
        FormField::File {
            name: name.into(),
            upload,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Body {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<FormField>),
}

/// Method, path, query and body of an API call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Body,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
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

    /// Append a query parameter; values are percent-encoded when sent
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Use a JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body).map_err(ApiError::Encode)?;
        self.body = Body::Json(value);
        Ok(self)
    }

    /// Use a multipart body
    pub fn multipart(mut self, fields: Vec<FormField>) -> Self {
        self.body = Body::Multipart(fields);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Turn the description into a builder for one attempt
    pub(crate) fn build(
        &self,
        http: &Client,
        base_url: &str,
        access_token: Option<&str>,
    ) -> ApiResult<RequestBuilder> {
        let url = format!("{}{}", base_url, self.path);
        let mut builder = http.request(self.method.clone(), url);

        if !self.query.is_empty() {
            builder = builder.query(&self.query);
        }
        if let Some(token) = access_token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        builder = match &self.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Multipart(fields) => builder.multipart(build_form(fields)?),
        };

        Ok(builder)
    }
}

fn build_form(fields: &[FormField]) -> ApiResult<Form> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name.clone(), value.clone()),
            FormField::File { name, upload } => {
                let part = Part::bytes(upload.bytes.clone())
                    .file_name(upload.file_name.clone())
                    .mime_str(&upload.mime)?;
                form.part(name.clone(), part)
            }
        };
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_attaches_bearer_header() {
        let http = Client::new();
        let request = ApiRequest::get("/users/me/")
            .build(&http, "http://localhost:8000/api", Some("abc"))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:8000/api/users/me/");
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer abc"
        );
    }

    #[test]
    fn test_build_without_token_has_no_header() {
        let http = Client::new();
        let request = ApiRequest::get("/posts/")
            .query("page", 2)
            .build(&http, "http://localhost:8000/api", None)
            .unwrap()
            .build()
            .unwrap();

        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert_eq!(request.url().query(), Some("page=2"));
    }

    #[test]
    fn test_query_values_are_encoded() {
        let http = Client::new();
        let request = ApiRequest::get("/users/search/")
            .query("q", "ann & bob")
            .build(&http, "http://localhost:8000/api", None)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().query(), Some("q=ann+%26+bob"));
    }

    #[test]
    fn test_upload_from_path_guesses_mime() {
        let dir = std::env::temp_dir().join(format!("pickme-upload-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cat.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let upload = Upload::from_path(&path).unwrap();
        assert_eq!(upload.file_name, "cat.png");
        assert_eq!(upload.mime, "image/png");
        assert!(upload.is_image());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
