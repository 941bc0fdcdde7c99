pub(crate) mod assignments;
pub(crate) mod certificates;
pub(crate) mod course_content;
pub(crate) mod courses;
pub(crate) mod enrollments;
pub(crate) mod health;
pub(crate) mod labs;
pub(crate) mod learning_paths;
pub(crate) mod module_progress;
pub(crate) mod quiz_attempts;
pub(crate) mod stats;
pub(crate) mod users;
pub(crate) mod workshops;
