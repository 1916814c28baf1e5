use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::domain::DocumentSignature;
use crate::workflows::error::WorkflowError;

/// Random digit string of the requested length.
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Exact code comparison first, then the validity window measured from `otp_sent_at`.
pub fn verify(
    signature: &DocumentSignature,
    code: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<(), WorkflowError> {
    let expected = signature
        .otp_code
        .as_deref()
        .ok_or(WorkflowError::InvalidCode)?;
    if expected != code {
        return Err(WorkflowError::InvalidCode);
    }

    let sent_at = signature.otp_sent_at.ok_or(WorkflowError::InvalidCode)?;
    if now - sent_at > ttl {
        return Err(WorkflowError::ExpiredCode);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::directory::UserRef;
    use crate::workflows::documents::SignerRole;
    use crate::workflows::ids::{DocumentId, UserId};
    use chrono::TimeZone;

    fn signature(code: &str, sent_at: DateTime<Utc>) -> DocumentSignature {
        let mut signature = DocumentSignature::requested(
            DocumentId(1),
            UserRef {
                id: UserId(1),
                phone: "+77010000001".into(),
            },
            SignerRole::Employer,
        );
        signature.otp_code = Some(code.to_string());
        signature.otp_sent_at = Some(sent_at);
        signature
    }

    #[test]
    fn codes_have_requested_length_and_digits_only() {
        let code = generate_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(generate_code(8).len(), 8);
    }

    #[test]
    fn accepts_code_up_to_the_end_of_the_window() {
        let sent = Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap();
        let signature = signature("123456", sent);
        let ttl = Duration::minutes(5);

        assert!(verify(&signature, "123456", sent + Duration::minutes(5), ttl).is_ok());
        assert!(matches!(
            verify(&signature, "123456", sent + Duration::minutes(6), ttl),
            Err(WorkflowError::ExpiredCode)
        ));
    }

    #[test]
    fn mismatch_is_reported_before_expiry() {
        let sent = Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap();
        let signature = signature("123456", sent);
        assert!(matches!(
            verify(&signature, "654321", sent + Duration::hours(1), Duration::minutes(5)),
            Err(WorkflowError::InvalidCode)
        ));
        assert!(matches!(
            verify(&signature, " 123456", sent, Duration::minutes(5)),
            Err(WorkflowError::InvalidCode)
        ));
    }
}
