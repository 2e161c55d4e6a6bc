use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// A doctor's weekly working window: the days they see patients and the
/// daily start/end times ("HH:MM", end inclusive).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHours {
    pub days: Vec<String>,
    pub start: String,
    pub end: String,
}

impl WorkingHours {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.days.is_empty() {
            anyhow::bail!("working hours must list at least one day");
        }
        for day in &self.days {
            parse_weekday(day)?;
        }
        let start = parse_time(&self.start)?;
        let end = parse_time(&self.end)?;
        if start >= end {
            anyhow::bail!("working hours start {} is not before end {}", self.start, self.end);
        }
        Ok(())
    }

    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        let weekday = date.format("%a").to_string().to_lowercase();
        self.days.iter().any(|d| d.to_lowercase() == weekday)
    }

    /// True when both the start and the end of a slot fall inside the window
    /// on that day. A slot running past midnight never fits.
    pub fn covers(&self, date: NaiveDate, time: NaiveTime, duration_minutes: i64) -> bool {
        if !self.is_open_on(date) {
            return false;
        }
        let (Ok(start), Ok(end)) = (parse_time(&self.start), parse_time(&self.end)) else {
            return false;
        };
        let begins = date.and_time(time);
        let finishes = begins + Duration::minutes(duration_minutes);
        begins >= date.and_time(start) && finishes <= date.and_time(end)
    }

    pub fn to_human_readable(&self) -> String {
        let day_order = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

        let mut days: Vec<String> = self.days.iter().map(|d| d.to_lowercase()).collect();
        days.sort_by_key(|d| day_order.iter().position(|o| *o == d).unwrap_or(7));
        days.dedup();

        if days.len() == 7 {
            return format!("every day {}-{}", self.start, self.end);
        }

        let days = days
            .iter()
            .map(|d| capitalize(d))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{days}: {}-{}", self.start, self.end)
    }
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().to_string() + &c.as_str().to_lowercase(),
    }
}

fn parse_weekday(s: &str) -> anyhow::Result<()> {
    match s.to_lowercase().as_str() {
        "mon" | "tue" | "wed" | "thu" | "fri" | "sat" | "sun" => Ok(()),
        _ => Err(anyhow::anyhow!("invalid weekday: {s}")),
    }
}

fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| anyhow::anyhow!("invalid time format: {s}"))
}
