use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::models::{Course, Lab};
use crate::db::types::UserRole;
use crate::repositories::stats::PlatformTotals;

#[derive(Debug, Deserialize)]
pub(crate) struct UserListQuery {
    pub(crate) role: Option<UserRole>,
    pub(crate) search: Option<String>,
    pub(crate) page: Option<i64>,
    pub(crate) limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatsResponse {
    pub(crate) total_users: i64,
    pub(crate) total_learners: i64,
    pub(crate) total_trainers: i64,
    pub(crate) total_courses: i64,
    pub(crate) published_courses: i64,
    pub(crate) total_workshops: i64,
    pub(crate) active_workshops: i64,
    pub(crate) total_labs: i64,
    pub(crate) published_labs: i64,
    pub(crate) total_enrollments: i64,
    pub(crate) total_lab_completions: i64,
    pub(crate) total_certificates: i64,
    pub(crate) total_learning_paths: i64,
}

impl From<PlatformTotals> for StatsResponse {
    fn from(totals: PlatformTotals) -> Self {
        Self {
            total_users: totals.total_users,
            total_learners: totals.total_learners,
            total_trainers: totals.total_trainers,
            total_courses: totals.total_courses,
            published_courses: totals.published_courses,
            total_workshops: totals.total_workshops,
            active_workshops: totals.active_workshops,
            total_labs: totals.total_labs,
            published_labs: totals.published_labs,
            total_enrollments: totals.total_enrollments,
            total_lab_completions: totals.total_lab_completions,
            total_certificates: totals.total_certificates,
            total_learning_paths: totals.total_learning_paths,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TopCourse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) enrolled_count: i32,
    pub(crate) completions_count: i32,
}

impl TopCourse {
    pub(crate) fn from_db(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            enrolled_count: course.enrolled_count,
            completions_count: course.completions_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TopLab {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) completions_count: i32,
}

impl TopLab {
    pub(crate) fn from_db(lab: Lab) -> Self {
        Self { id: lab.id, title: lab.title, completions_count: lab.completions_count }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalyticsResponse {
    pub(crate) top_courses: Vec<TopCourse>,
    pub(crate) top_labs: Vec<TopLab>,
    pub(crate) users_by_role: BTreeMap<&'static str, i64>,
}
