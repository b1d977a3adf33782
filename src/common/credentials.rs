use crate::common::config::ApiConfig;

/// Basic-auth identity for the classroom API. Built once by the caller and
/// handed to the submission client, never read from ambient state.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl From<&ApiConfig> for Credentials {
    fn from(api: &ApiConfig) -> Self {
        Self::new(api.email.clone(), api.password.clone())
    }
}
