pub(crate) mod admin;
pub(crate) mod assignments;
pub(crate) mod auth;
pub(crate) mod catalog;
pub(crate) mod certificates;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod labs;
pub(crate) mod learning_paths;
pub(crate) mod pagination;
pub(crate) mod progress;
pub(crate) mod rate_limit;
pub(crate) mod router;
pub(crate) mod users;
pub(crate) mod validation;
pub(crate) mod workshops;
