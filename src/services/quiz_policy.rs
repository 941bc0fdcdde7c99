//! Pure scoring rules shared by progress and quiz evaluation.
//!
//! Percentages are kept as integer tenths of a point so that the displayed
//! one-decimal value and the pass decision can never disagree.

use std::collections::{BTreeMap, HashSet};

use crate::core::config::QuizSettings;
use crate::db::models::{QuizAnswer, QuizQuestion};

/// A percentage rounded half-up to one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Percent {
    tenths: i64,
}

impl Percent {
    pub(crate) const ZERO: Percent = Percent { tenths: 0 };

    pub(crate) fn from_ratio(part: i64, whole: i64) -> Self {
        if whole <= 0 || part <= 0 {
            return Self::ZERO;
        }
        let part = part.min(whole);
        Self { tenths: (part * 2000 + whole) / (2 * whole) }
    }

    pub(crate) fn from_value(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self::ZERO;
        }
        Self { tenths: (value * 10.0).round() as i64 }
    }

    pub(crate) fn value(self) -> f64 {
        self.tenths as f64 / 10.0
    }

    pub(crate) fn is_complete(self) -> bool {
        self.tenths >= 1000
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct QuizPolicy {
    max_attempts: u32,
    pass_threshold: Percent,
}

impl QuizPolicy {
    pub(crate) fn new(max_attempts: u32, pass_threshold: f64) -> Self {
        Self { max_attempts, pass_threshold: Percent::from_value(pass_threshold) }
    }

    pub(crate) fn from_settings(settings: &QuizSettings) -> Self {
        Self::new(settings.max_attempts, settings.pass_threshold)
    }

    pub(crate) fn max_attempts(&self) -> i64 {
        i64::from(self.max_attempts)
    }

    pub(crate) fn passes(&self, score: Percent) -> bool {
        score >= self.pass_threshold
    }

    pub(crate) fn attempts_remaining(&self, used: i64) -> i64 {
        (self.max_attempts() - used).max(0)
    }

    pub(crate) fn has_attempts_left(&self, used: i64) -> bool {
        used < self.max_attempts()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradedQuiz {
    pub(crate) answers: Vec<QuizAnswer>,
    pub(crate) correct_answers: i64,
    pub(crate) total_questions: i64,
    pub(crate) score: Percent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SubmissionProblem {
    /// Question ids that were never answered, in course order.
    Missing(Vec<String>),
    /// Answer keys that are not questions of this course.
    Unknown(Vec<String>),
}

/// Grades a full submission. An out-of-range option index counts as wrong.
pub(crate) fn grade(
    questions: &[QuizQuestion],
    submitted: &BTreeMap<String, i32>,
) -> Result<GradedQuiz, SubmissionProblem> {
    let known: HashSet<&str> = questions.iter().map(|question| question.id.as_str()).collect();

    let unknown: Vec<String> =
        submitted.keys().filter(|id| !known.contains(id.as_str())).cloned().collect();
    if !unknown.is_empty() {
        return Err(SubmissionProblem::Unknown(unknown));
    }

    let missing: Vec<String> = questions
        .iter()
        .filter(|question| !submitted.contains_key(&question.id))
        .map(|question| question.id.clone())
        .collect();
    if !missing.is_empty() {
        return Err(SubmissionProblem::Missing(missing));
    }

    let mut answers = Vec::with_capacity(questions.len());
    let mut correct = 0;
    for question in questions {
        let selected = submitted[&question.id];
        if selected == question.correct_answer {
            correct += 1;
        }
        answers.push(QuizAnswer { question_id: question.id.clone(), selected });
    }

    let total = questions.len() as i64;
    Ok(GradedQuiz {
        answers,
        correct_answers: correct,
        total_questions: total,
        score: Percent::from_ratio(correct, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn question(id: &str, correct: i32) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            course_id: "course".to_string(),
            question: format!("Question {id}?"),
            options: Json(vec!["a".into(), "b".into(), "c".into()]),
            correct_answer: correct,
            order_index: 0,
        }
    }

    fn answers(pairs: &[(&str, i32)]) -> BTreeMap<String, i32> {
        pairs.iter().map(|(id, value)| (id.to_string(), *value)).collect()
    }

    #[test]
    fn ratio_rounds_to_one_decimal() {
        assert_eq!(Percent::from_ratio(1, 3).value(), 33.3);
        assert_eq!(Percent::from_ratio(2, 3).value(), 66.7);
        assert_eq!(Percent::from_ratio(3, 3).value(), 100.0);
        assert_eq!(Percent::from_ratio(0, 3).value(), 0.0);
        assert_eq!(Percent::from_ratio(1, 0).value(), 0.0);
        assert_eq!(Percent::from_ratio(1, 8).value(), 12.5);
        assert!(Percent::from_ratio(3, 3).is_complete());
        assert!(!Percent::from_ratio(2, 3).is_complete());
    }

    #[test]
    fn pass_threshold_boundary() {
        let policy = QuizPolicy::new(2, 80.0);
        assert!(policy.passes(Percent::from_value(80.0)));
        assert!(!policy.passes(Percent::from_value(79.9)));
        assert!(policy.passes(Percent::from_ratio(4, 5)));
        assert!(!policy.passes(Percent::from_ratio(3, 4)));
    }

    #[test]
    fn attempts_remaining_never_negative() {
        let policy = QuizPolicy::new(2, 80.0);
        assert_eq!(policy.attempts_remaining(0), 2);
        assert_eq!(policy.attempts_remaining(1), 1);
        assert_eq!(policy.attempts_remaining(2), 0);
        assert_eq!(policy.attempts_remaining(5), 0);
        assert!(policy.has_attempts_left(1));
        assert!(!policy.has_attempts_left(2));
    }

    #[test]
    fn grade_counts_correct_answers() {
        let questions = vec![question("q1", 0), question("q2", 2), question("q3", 1)];
        let graded = grade(&questions, &answers(&[("q1", 0), ("q2", 1), ("q3", 1)])).unwrap();

        assert_eq!(graded.correct_answers, 2);
        assert_eq!(graded.total_questions, 3);
        assert_eq!(graded.score.value(), 66.7);
        assert_eq!(graded.answers[1], QuizAnswer { question_id: "q2".into(), selected: 1 });
    }

    #[test]
    fn grade_reports_missing_in_course_order() {
        let questions = vec![question("q1", 0), question("q2", 0), question("q3", 0)];
        let problem = grade(&questions, &answers(&[("q2", 0)])).unwrap_err();
        assert_eq!(problem, SubmissionProblem::Missing(vec!["q1".into(), "q3".into()]));
    }

    #[test]
    fn grade_rejects_foreign_questions() {
        let questions = vec![question("q1", 0)];
        let problem = grade(&questions, &answers(&[("q1", 0), ("other", 1)])).unwrap_err();
        assert_eq!(problem, SubmissionProblem::Unknown(vec!["other".into()]));
    }

    #[test]
    fn out_of_range_option_is_wrong() {
        let questions = vec![question("q1", 0), question("q2", 1)];
        let graded = grade(&questions, &answers(&[("q1", 7), ("q2", -1)])).unwrap();
        assert_eq!(graded.correct_answers, 0);
        assert_eq!(graded.score, Percent::ZERO);
    }
}
