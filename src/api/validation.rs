use crate::api::errors::ApiError;

/// Lowercase ASCII slug from free text: alphanumerics kept, runs of anything else become `-`.
pub(crate) fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for ch in value.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

pub(crate) fn validate_slug(slug: &str) -> Result<(), ApiError> {
    let valid = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Slug may only contain lowercase letters, digits and dashes".to_string(),
        ))
    }
}

/// Uses the explicit slug when given, otherwise derives one from the title.
pub(crate) fn resolve_slug(explicit: Option<&str>, title: &str) -> Result<String, ApiError> {
    let slug = match explicit {
        Some(slug) => slug.trim().to_string(),
        None => slugify(title),
    };
    validate_slug(&slug)?;
    Ok(slug)
}

pub(crate) fn validate_question_options(
    options: &[String],
    correct_answer: i32,
) -> Result<(), ApiError> {
    let in_range = usize::try_from(correct_answer).is_ok_and(|index| index < options.len());
    if in_range {
        Ok(())
    } else {
        Err(ApiError::BadRequest("correct_answer must point at one of the options".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Intro to Rust: Ownership & Borrowing "), "intro-to-rust-ownership-borrowing");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn resolve_slug_validates_explicit_values() {
        assert_eq!(resolve_slug(None, "Docker 101").unwrap(), "docker-101");
        assert!(resolve_slug(Some("Bad Slug"), "x").is_err());
        assert!(resolve_slug(None, "!!!").is_err());
    }

    #[test]
    fn correct_answer_must_be_in_range() {
        let options = vec!["a".to_string(), "b".to_string()];
        assert!(validate_question_options(&options, 1).is_ok());
        assert!(validate_question_options(&options, 2).is_err());
        assert!(validate_question_options(&options, -1).is_err());
    }
}
