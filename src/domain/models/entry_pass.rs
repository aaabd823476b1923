use crate::domain::models::{event::EventDetails, registration::RegistrationRecord};

/// Plain-text pass the attendee downloads from the confirmation page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPass {
    pub file_name: String,
    pub body: String,
}

impl EntryPass {
    pub fn render(record: &RegistrationRecord, event: &EventDetails) -> Self {
        let body = format!(
            "{title} - ENTRY PASS\n\
             \n\
             Participant: {name}\n\
             Registration ID: {id}\n\
             Email: {email}\n\
             Phone: {phone}\n\
             Amount Paid: Rs. {amount}\n\
             \n\
             Event Details:\n\
             - Dates: {dates}\n\
             - Venue: {venue}\n\
             - Reporting: {start_time}\n\
             - Status: CONFIRMED\n\
             \n\
             This serves as your official entry pass.\n\
             Please present this document at the venue.\n\
             \n\
             Organized by: {organizers}\n",
            title = event.title,
            name = record.name,
            id = record.registration_id,
            email = record.email,
            phone = record.phone,
            amount = record.payment_amount,
            dates = event.dates,
            venue = event.venue,
            start_time = event.start_time,
            organizers = event.organizers,
        );

        Self {
            file_name: format!("AI_Workshop_Pass_{}.txt", record.registration_id),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::models::registration::{IdProof, RegistrationInput};

    #[test]
    fn pass_carries_attendee_and_event_fields() {
        let mut input = RegistrationInput::new();
        input.set_name("Asha Verma");
        input.set_email("asha@example.com");
        input.set_phone("9876543210");
        input.set_registration_number("12345678");
        input.attach_id_proof(IdProof {
            file_name: "id.png".to_string(),
            content_type: None,
            size: None,
        });
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let record =
            RegistrationRecord::completed(&input, "pay_123".to_string(), 999, String::new(), at);

        let pass = EntryPass::render(&record, &EventDetails::default());

        assert_eq!(
            pass.file_name,
            format!("AI_Workshop_Pass_{}.txt", record.registration_id)
        );
        assert!(
            pass.file_name
                .starts_with(&format!("AI_Workshop_Pass_WS{}-", at.timestamp_millis()))
        );
        assert!(pass.body.starts_with("AI WORKSHOP 2025 - ENTRY PASS"));
        assert!(pass.body.contains("Participant: Asha Verma"));
        assert!(pass.body.contains(&format!("Registration ID: {}", record.registration_id)));
        assert!(pass.body.contains("Phone: 9876543210"));
        assert!(pass.body.contains("Amount Paid: Rs. 999"));
        assert!(pass.body.contains("Venue: NIT Jalandhar & Mohali"));
    }
}
