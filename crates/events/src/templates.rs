//! Notification templates and their plain-text rendering.

use serde_json::Value;

use crate::sender::{NotificationError, Recipient};

/// Sent to a teacher whose leave was approved.
pub const LEAVE_APPROVED: &str = "leave_approved";
/// Sent to a teacher whose leave was rejected.
pub const LEAVE_REJECTED: &str = "leave_rejected";
/// Sent to the substitute named on an approved leave.
pub const SUBSTITUTE_FOR_LEAVE: &str = "substitute_for_leave";
/// Sent to a substitute assigned to a single period.
pub const SUBSTITUTE_FOR_PERIOD: &str = "substitute_for_period";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}

fn field<'a>(payload: &'a Value, key: &str) -> &'a str {
    payload.get(key).and_then(Value::as_str).unwrap_or("-")
}

pub fn render(
    template_id: &str,
    recipient: &Recipient,
    payload: &Value,
) -> Result<RenderedMessage, NotificationError> {
    let message = match template_id {
        LEAVE_APPROVED => RenderedMessage {
            subject: "Izin Anda disetujui".to_string(),
            body: format!(
                "Yth. {},\n\nPengajuan izin Anda ({}) untuk {} s.d. {} telah disetujui.\nGuru pengganti: {}.",
                recipient.name,
                field(payload, "reason_label"),
                field(payload, "start_date"),
                field(payload, "end_date"),
                field(payload, "substitute_teacher_name"),
            ),
        },
        LEAVE_REJECTED => RenderedMessage {
            subject: "Izin Anda ditolak".to_string(),
            body: format!(
                "Yth. {},\n\nPengajuan izin Anda untuk {} s.d. {} ditolak.\nAlasan: {}",
                recipient.name,
                field(payload, "start_date"),
                field(payload, "end_date"),
                field(payload, "rejection_reason"),
            ),
        },
        SUBSTITUTE_FOR_LEAVE => RenderedMessage {
            subject: "Penugasan guru pengganti".to_string(),
            body: format!(
                "Yth. {},\n\nAnda ditugaskan menggantikan {} pada {} s.d. {} ({} jam pelajaran).",
                recipient.name,
                field(payload, "teacher_name"),
                field(payload, "start_date"),
                field(payload, "end_date"),
                payload
                    .get("substituted_periods")
                    .and_then(Value::as_i64)
                    .unwrap_or(0),
            ),
        },
        SUBSTITUTE_FOR_PERIOD => RenderedMessage {
            subject: "Penugasan guru pengganti".to_string(),
            body: format!(
                "Yth. {},\n\nAnda ditugaskan menggantikan {} di kelas {} ({}) pada {} pukul {}-{}.",
                recipient.name,
                field(payload, "teacher_name"),
                field(payload, "class_section_name"),
                field(payload, "subject_name"),
                field(payload, "date"),
                field(payload, "start_time"),
                field(payload, "end_time"),
            ),
        },
        other => return Err(NotificationError::UnknownTemplate(other.to_string())),
    };
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budi() -> Recipient {
        Recipient {
            user_id: 1,
            name: "Budi".into(),
            email: Some("budi@sekolah.test".into()),
        }
    }

    #[test]
    fn rejection_body_includes_reason() {
        let payload = serde_json::json!({
            "start_date": "2026-03-09",
            "end_date": "2026-03-11",
            "rejection_reason": "Jadwal ujian",
        });
        let message = render(LEAVE_REJECTED, &budi(), &payload).unwrap();
        assert_eq!(message.subject, "Izin Anda ditolak");
        assert!(message.body.contains("Alasan: Jadwal ujian"));
        assert!(message.body.starts_with("Yth. Budi"));
    }

    #[test]
    fn missing_fields_render_as_dash() {
        let message = render(LEAVE_APPROVED, &budi(), &serde_json::json!({})).unwrap();
        assert!(message.body.contains("Guru pengganti: -."));
    }

    #[test]
    fn unknown_template_is_an_error() {
        let err = render("welcome", &budi(), &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, NotificationError::UnknownTemplate(t) if t == "welcome"));
    }
}
