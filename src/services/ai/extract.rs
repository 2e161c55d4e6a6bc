use chrono::Local;

use crate::models::{Booking, ExtractedFields};
use crate::services::ai::{LlmProvider, Message};

const SYSTEM_PROMPT: &str = r#"You are the field-extraction engine for a dental clinic's automated receptionist. The caller is booking an appointment over voice; you receive the transcript of their latest utterance plus the fields already collected.

Return ONLY valid JSON (no markdown, no explanation) with this exact structure:
{
  "doctor": "doctor name as the caller said it, or null",
  "name": "the caller's own name, or null",
  "phone": "phone number converted to digits only, or null",
  "service": "requested service, or null",
  "date": "requested date as YYYY-MM-DD, or null",
  "time": "requested time as 24-hour HH:MM, or null",
  "duration_minutes": null,
  "confirm": true, false, or null
}

Rules:
- Report ONLY what the caller said in this utterance; use null for everything else. Never invent values and never repeat already-collected fields.
- If the caller provides several fields at once, report them all.
- Spoken numbers become digits ("zero one five..." -> "015..."). Keep every digit of a phone number.
- Resolve relative dates ("tomorrow", "next Tuesday") against today's date given in the message.
- Convert times like "3:30 pm" to "15:30".
- Set "confirm" ONLY when the caller is answering whether to go ahead with the booking: true for yes/okay/go ahead, false for no/wait/change something.
- If the caller says "wait", "hold on", or the utterance is unclear or small talk, return all nulls.
- Never include anything except the JSON object described above.
"#;

pub async fn extract_fields(
    llm: &dyn LlmProvider,
    doctors: &[String],
    booking: &Booking,
    utterance: &str,
) -> anyhow::Result<ExtractedFields> {
    let collected = serde_json::to_string(booking)?;
    let today = Local::now().format("%Y-%m-%d (%A)").to_string();

    let prompt = format!(
        "Valid doctors: {doctors:?}\n\
         Today is {today}.\n\
         Already collected: {collected}\n\
         Caller said: \"{utterance}\"\n\
         Return JSON as specified."
    );

    let messages = [Message {
        role: "user".to_string(),
        content: prompt,
    }];

    let response = llm.chat(SYSTEM_PROMPT, &messages).await?;

    parse_extraction(&response)
}

fn parse_extraction(response: &str) -> anyhow::Result<ExtractedFields> {
    if let Ok(fields) = serde_json::from_str::<ExtractedFields>(response) {
        return Ok(fields);
    }

    // Strip markdown code fences
    let cleaned = response
        .trim()
        .strip_prefix("```json")
        .or_else(|| response.trim().strip_prefix("```"))
        .unwrap_or(response.trim());
    let cleaned = cleaned.strip_suffix("```").unwrap_or(cleaned).trim();

    if let Ok(fields) = serde_json::from_str::<ExtractedFields>(cleaned) {
        return Ok(fields);
    }

    // Last resort: find a JSON object embedded in surrounding prose
    if let Some(start) = cleaned.find('{') {
        if let Some(end) = cleaned.rfind('}') {
            if let Ok(fields) = serde_json::from_str::<ExtractedFields>(&cleaned[start..=end]) {
                return Ok(fields);
            }
        }
    }

    anyhow::bail!("model response is not the expected JSON: {response}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_json() {
        let json = r#"{"doctor":"Dr. Hasan Rahman","name":"Peter Griffin","phone":"01553702359","service":null,"date":"2026-09-10","time":"15:30","duration_minutes":null,"confirm":null}"#;
        let fields = parse_extraction(json).unwrap();
        assert_eq!(fields.doctor.as_deref(), Some("Dr. Hasan Rahman"));
        assert_eq!(fields.patient_name.as_deref(), Some("Peter Griffin"));
        assert_eq!(fields.time.as_deref(), Some("15:30"));
        assert!(fields.service.is_none());
    }

    #[test]
    fn test_parse_partial_json() {
        let fields = parse_extraction(r#"{"confirm":true}"#).unwrap();
        assert_eq!(fields.confirm, Some(true));
        assert!(fields.doctor.is_none());
    }

    #[test]
    fn test_parse_markdown_fenced_json() {
        let raw = "```json\n{\"doctor\":\"house\"}\n```";
        let fields = parse_extraction(raw).unwrap();
        assert_eq!(fields.doctor.as_deref(), Some("house"));
    }

    #[test]
    fn test_parse_embedded_json() {
        let raw = "Here is the extraction: {\"phone\":\"01553702359\"} as requested.";
        let fields = parse_extraction(raw).unwrap();
        assert_eq!(fields.phone.as_deref(), Some("01553702359"));
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        assert!(parse_extraction("I could not understand the caller").is_err());
    }
}
