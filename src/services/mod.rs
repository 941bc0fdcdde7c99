pub(crate) mod assignment_review;
pub(crate) mod certificate_issuer;
pub(crate) mod certificate_numbers;
pub(crate) mod enrollment_ledger;
pub(crate) mod lab_sandbox;
pub(crate) mod learning_paths;
pub(crate) mod progress_tracker;
pub(crate) mod quiz_evaluator;
pub(crate) mod quiz_policy;
pub(crate) mod workflow;
