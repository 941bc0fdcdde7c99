use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::Certificate;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CertificateResponse {
    pub(crate) id: String,
    pub(crate) certificate_number: String,
    pub(crate) user_id: String,
    pub(crate) course_id: String,
    pub(crate) user_name: String,
    pub(crate) course_title: String,
    pub(crate) quiz_score: f64,
    pub(crate) issued_at: String,
}

impl CertificateResponse {
    pub(crate) fn from_db(certificate: Certificate) -> Self {
        Self {
            id: certificate.id,
            certificate_number: certificate.certificate_number,
            user_id: certificate.user_id,
            course_id: certificate.course_id,
            user_name: certificate.user_name,
            course_title: certificate.course_title,
            quiz_score: certificate.quiz_score,
            issued_at: format_primitive(certificate.issued_at),
        }
    }
}

/// Public verification result. Only `valid` is present for unknown numbers.
#[derive(Debug, Serialize)]
pub(crate) struct VerifyResponse {
    pub(crate) valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) certificate_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) course_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) issued_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) quiz_score: Option<f64>,
}

impl VerifyResponse {
    pub(crate) fn from_lookup(certificate: Option<Certificate>) -> Self {
        match certificate {
            Some(certificate) => Self {
                valid: true,
                certificate_number: Some(certificate.certificate_number),
                user_name: Some(certificate.user_name),
                course_title: Some(certificate.course_title),
                issued_at: Some(format_primitive(certificate.issued_at)),
                quiz_score: Some(certificate.quiz_score),
            },
            None => Self {
                valid: false,
                certificate_number: None,
                user_name: None,
                course_title: None,
                issued_at: None,
                quiz_score: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_certificate_serializes_only_validity() {
        let body = serde_json::to_value(VerifyResponse::from_lookup(None)).unwrap();
        assert_eq!(body, serde_json::json!({"valid": false}));
    }
}
