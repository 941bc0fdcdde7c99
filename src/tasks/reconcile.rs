//! Cached counters (`enrolled_count`, `completions_count`, `registered_count`)
//! are bumped inline by the API; this pass rebuilds them from the ledger rows.

use sqlx::PgPool;

use crate::core::metrics;
use crate::repositories;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReconcileReport {
    pub(crate) courses: u64,
    pub(crate) labs: u64,
    pub(crate) workshops: u64,
}

impl ReconcileReport {
    pub(crate) fn total(&self) -> u64 {
        self.courses + self.labs + self.workshops
    }
}

pub(crate) async fn reconcile_counters(pool: &PgPool) -> Result<ReconcileReport, sqlx::Error> {
    let report = ReconcileReport {
        courses: repositories::stats::reconcile_course_counters(pool).await?,
        labs: repositories::stats::reconcile_lab_counters(pool).await?,
        workshops: repositories::stats::reconcile_workshop_counters(pool).await?,
    };

    metrics::record_counter_drift("courses", report.courses);
    metrics::record_counter_drift("labs", report.labs);
    metrics::record_counter_drift("workshops", report.workshops);

    if report.total() > 0 {
        tracing::warn!(
            courses = report.courses,
            labs = report.labs,
            workshops = report.workshops,
            "Counter drift corrected"
        );
    } else {
        tracing::debug!("Counters consistent");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::UserRole;
    use crate::test_support;

    #[test]
    fn report_total_sums_tables() {
        let report = ReconcileReport { courses: 2, labs: 1, workshops: 0 };
        assert_eq!(report.total(), 3);
        assert_eq!(ReconcileReport::default().total(), 0);
    }

    #[tokio::test]
    async fn drifted_enrollment_counter_is_repaired() {
        let Some(ctx) = test_support::setup_test_context().await else {
            return;
        };
        let pool = ctx.state.db();

        let trainer = test_support::insert_user(pool, "trainer@example.com", UserRole::Trainer).await;
        let learner = test_support::insert_user(pool, "learner@example.com", UserRole::Learner).await;
        let course = test_support::insert_course(pool, &trainer.id, "drift", 1, 0).await;
        test_support::enroll(pool, &learner, &course.id).await;

        sqlx::query("UPDATE courses SET enrolled_count = 42 WHERE id = $1")
            .bind(&course.id)
            .execute(pool)
            .await
            .expect("corrupt counter");

        let report = reconcile_counters(pool).await.expect("reconcile");
        assert_eq!(report.courses, 1);

        let repaired = repositories::courses::find_by_id(pool, &course.id)
            .await
            .expect("load course")
            .expect("course exists");
        assert_eq!(repaired.enrolled_count, 1);

        let again = reconcile_counters(pool).await.expect("reconcile");
        assert_eq!(again.total(), 0);
    }
}
