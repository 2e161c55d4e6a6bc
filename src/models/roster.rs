use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::availability::WorkingHours;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub hours: WorkingHours,
}

/// The fixed set of doctors a caller can book with. Loaded once at startup
/// and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Roster {
    pub doctors: Vec<Doctor>,
}

/// Outcome of matching a spoken doctor reference against the roster.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Matched(String),
    Ambiguous(Vec<String>),
    NotFound,
}

impl Roster {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let roster: Roster = serde_json::from_str(s)?;
        if roster.doctors.is_empty() {
            anyhow::bail!("roster must contain at least one doctor");
        }
        let mut seen = BTreeSet::new();
        for doctor in &roster.doctors {
            if doctor.name.trim().is_empty() {
                anyhow::bail!("doctor name must not be empty");
            }
            if !seen.insert(doctor.name.to_lowercase()) {
                anyhow::bail!("duplicate doctor name: {}", doctor.name);
            }
            doctor.hours.validate()?;
        }
        Ok(roster)
    }

    /// The roster the original clinic ran with: three dentists, open every
    /// day from 14:00 to 23:59.
    pub fn default_clinic() -> Self {
        let hours = WorkingHours {
            days: ["mon", "tue", "wed", "thu", "fri", "sat", "sun"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            start: "14:00".to_string(),
            end: "23:59".to_string(),
        };
        let doctor = |name: &str, aliases: &[&str]| Doctor {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            hours: hours.clone(),
        };
        Roster {
            doctors: vec![
                doctor("Dr. Jesan Ahmed", &["jesan", "ahmed"]),
                doctor("Dr. Hasan Rahman", &["hasan", "rahman"]),
                doctor("Dr. Gregory House", &["gregory", "greg", "house"]),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.doctors.iter().map(|d| d.name.clone()).collect()
    }

    /// Match free-text doctor input, in order: exact canonical name, exact
    /// alias, then token prefix against name/alias tokens. One survivor is a
    /// match; several are reported back for disambiguation, never silently
    /// picked from.
    pub fn resolve(&self, text: &str) -> Resolution {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Resolution::NotFound;
        }

        for doctor in &self.doctors {
            if normalize(&doctor.name) == normalized {
                return Resolution::Matched(doctor.name.clone());
            }
        }

        for doctor in &self.doctors {
            if doctor.aliases.iter().any(|a| normalize(a) == normalized) {
                return Resolution::Matched(doctor.name.clone());
            }
        }

        // Token prefixes, ignoring very short fragments ("dr" is already
        // stripped by normalize).
        let user_tokens: Vec<&str> = normalized.split(' ').filter(|t| t.len() >= 3).collect();
        if user_tokens.is_empty() {
            return Resolution::NotFound;
        }

        let mut matches = BTreeSet::new();
        for doctor in &self.doctors {
            let mut doctor_tokens: Vec<String> =
                normalize(&doctor.name).split(' ').map(str::to_string).collect();
            for alias in &doctor.aliases {
                doctor_tokens.extend(normalize(alias).split(' ').map(str::to_string));
            }
            if user_tokens
                .iter()
                .any(|ut| doctor_tokens.iter().any(|dt| dt.starts_with(ut)))
            {
                matches.insert(doctor.name.clone());
            }
        }

        match matches.len() {
            0 => Resolution::NotFound,
            1 => Resolution::Matched(matches.into_iter().next().unwrap()),
            _ => Resolution::Ambiguous(matches.into_iter().collect()),
        }
    }
}

/// Lowercase, drop the "dr"/"dr." honorific and punctuation, collapse
/// whitespace.
fn normalize(s: &str) -> String {
    let lowered = s.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|t| *t != "dr")
        .collect::<Vec<_>>()
        .join(" ")
}
