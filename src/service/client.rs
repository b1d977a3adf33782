use crate::common::{ApiConfig, Credentials, FaceGateError, Result};
use crate::core::detection::Embedding;
use crate::core::session::{FaceApi, StudentRecord};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Blocking HTTP client for the classroom API. Stateless between calls;
/// every request carries Basic auth from the supplied credentials.
pub struct ApiClient {
    base_url: String,
    credentials: Credentials,
    http: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct RegisterFacePayload<'a> {
    user_id: &'a str,
    embedding: &'a [f32],
}

#[derive(Serialize)]
struct SearchFacePayload<'a> {
    #[serde(rename = "groupId")]
    group_id: &'a str,
    embedding: &'a [f32],
    k: usize,
}

#[derive(Serialize)]
struct AttendancePayload<'a> {
    name: &'a str,
    #[serde(rename = "lastName")]
    last_name: &'a str,
    grade: &'a str,
    group: &'a str,
    area: &'a str,
    id: i64,
    #[serde(rename = "emailUser")]
    email_user: &'a str,
}

#[derive(Deserialize)]
struct AttendanceResponse {
    response: bool,
}

#[derive(Serialize)]
struct DeleteFacePayload<'a> {
    user_id: &'a str,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            http,
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        Self::new(
            api.base_url.clone(),
            Credentials::from(api),
            Duration::from_secs(api.timeout_seconds),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn post_json<T: Serialize>(&self, path: &str, payload: &T) -> Result<reqwest::blocking::Response> {
        let response = self
            .http
            .post(self.url(path))
            .basic_auth(&self.credentials.email, Some(&self.credentials.password))
            .json(payload)
            .send()?;

        Ok(response.error_for_status()?)
    }

    /// Remove a stored embedding. Fire and forget; the server does not
    /// commit to a response body for this endpoint.
    pub fn delete_face(&self, student_id: &str) -> Result<()> {
        self.post_json(
            "/deleteFaceStudent",
            &DeleteFacePayload {
                user_id: student_id,
            },
        )?;
        tracing::info!(student_id, "face record deleted");
        Ok(())
    }
}

impl FaceApi for ApiClient {
    fn register_face(&self, student_id: &str, embedding: &Embedding) -> Result<()> {
        self.post_json(
            "/registerFaceStudent",
            &RegisterFacePayload {
                user_id: student_id,
                embedding,
            },
        )?;
        tracing::info!(student_id, "face embedding registered");
        Ok(())
    }

    fn search_face(
        &self,
        group_id: &str,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Option<StudentRecord>> {
        let response = self.post_json(
            "/searchFaceStudent",
            &SearchFacePayload {
                group_id,
                embedding,
                k: top_k,
            },
        )?;

        // The server answers with either an identity object or an empty
        // body/object; a present, non-null id marks a match.
        let body: serde_json::Value = response.json()?;
        if body.get("id").is_some_and(|id| !id.is_null()) {
            let student: StudentRecord = serde_json::from_value(body).map_err(|e| {
                FaceGateError::Api(format!("malformed identity in search response: {}", e))
            })?;
            Ok(Some(student))
        } else {
            Ok(None)
        }
    }

    fn register_attendance(&self, student: &StudentRecord) -> Result<bool> {
        let response = self.post_json(
            "/attendance",
            &AttendancePayload {
                name: &student.first_name,
                last_name: &student.last_name,
                grade: &student.grade,
                group: &student.group,
                area: &student.area,
                id: student.id,
                email_user: &self.credentials.email,
            },
        )?;

        let body: AttendanceResponse = response.json()?;
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_payload_uses_server_field_names() {
        let embedding = vec![0.5f32; 3];
        let value = serde_json::to_value(RegisterFacePayload {
            user_id: "42",
            embedding: &embedding,
        })
        .unwrap();

        assert_eq!(value["user_id"], "42");
        assert_eq!(value["embedding"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn search_payload_uses_server_field_names() {
        let embedding = vec![0.1f32; 2];
        let value = serde_json::to_value(SearchFacePayload {
            group_id: "9",
            embedding: &embedding,
            k: 20,
        })
        .unwrap();

        assert_eq!(value["groupId"], "9");
        assert_eq!(value["k"], 20);
        assert!(value.get("group_id").is_none());
    }

    #[test]
    fn attendance_payload_uses_server_field_names() {
        let value = serde_json::to_value(AttendancePayload {
            name: "Ana",
            last_name: "Lopez",
            grade: "3",
            group: "B",
            area: "Programacion",
            id: 7,
            email_user: "teacher@example.com",
        })
        .unwrap();

        assert_eq!(value["name"], "Ana");
        assert_eq!(value["lastName"], "Lopez");
        assert_eq!(value["emailUser"], "teacher@example.com");
        assert_eq!(value["id"], 7);
        assert!(value.get("last_name").is_none());
    }

    #[test]
    fn attendance_response_parses() {
        let body: AttendanceResponse = serde_json::from_str(r#"{"response": true}"#).unwrap();
        assert!(body.response);
    }
}
