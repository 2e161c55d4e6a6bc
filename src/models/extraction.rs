use serde::{Deserialize, Serialize};

/// Raw field values pulled out of one utterance by the language model.
/// Everything is optional and still untrusted text at this point; the
/// conversation layer sanitizes and types each value before it touches a
/// booking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedFields {
    pub doctor: Option<String>,
    #[serde(rename = "name")]
    pub patient_name: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub duration_minutes: Option<i64>,
    /// Set when the caller answers the final confirmation question:
    /// true for "yes, book it", false for "no".
    pub confirm: Option<bool>,
}
