//! Catalog authoring shared by `/admin` and `/trainer`.
//!
//! Admins see and edit every item; trainers only the items they created.

mod courses;
mod helpers;
mod labs;
mod workshops;

use axum::{routing::get, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route(
            "/courses/:course_id",
            get(courses::get_course).put(courses::update_course).delete(courses::delete_course),
        )
        .route("/labs", get(labs::list_labs).post(labs::create_lab))
        .route("/labs/:lab_id", get(labs::get_lab).put(labs::update_lab).delete(labs::delete_lab))
        .route("/workshops", get(workshops::list_workshops).post(workshops::create_workshop))
        .route(
            "/workshops/:workshop_id",
            get(workshops::get_workshop)
                .put(workshops::update_workshop)
                .delete(workshops::delete_workshop),
        )
}
