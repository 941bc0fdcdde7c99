use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod admin;
pub(crate) mod assignment;
pub(crate) mod auth;
pub(crate) mod certificate;
pub(crate) mod course;
pub(crate) mod lab;
pub(crate) mod learning_path;
pub(crate) mod progress;
pub(crate) mod user;
pub(crate) mod workshop;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}
