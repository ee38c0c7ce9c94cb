use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use serde_json::Value;

const LISTING_URL_PREFIX: &str = "/hostels/";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A hostel as it appears in the provider catalog
#[derive(Debug, Clone)]
pub struct HostelListing {
    pub slug: String,
    pub record: Value,
}

impl HostelListing {
    /// Build a listing from a raw catalog entry, deriving the slug from its `url`
    pub fn from_record(record: Value) -> Result<Self, String> {
        let url = record
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| "catalog entry has no url".to_string())?;
        let slug = slug_from_url(url)?;
        Ok(Self { slug, record })
    }

    /// Best-effort label for log lines about entries that never got a slug
    pub fn label(record: &Value) -> String {
        record
            .get("url")
            .or_else(|| record.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string()
    }
}

/// `/hostels/<slug>` -> `<slug>`
pub fn slug_from_url(url: &str) -> Result<String, String> {
    let slug = url
        .strip_prefix(LISTING_URL_PREFIX)
        .ok_or_else(|| format!("listing url {:?} does not start with {}", url, LISTING_URL_PREFIX))?
        .trim_end_matches('/');

    if !is_path_safe(slug) {
        return Err(format!("listing url {:?} has an unusable slug", url));
    }
    Ok(slug.to_string())
}

/// Single path component that cannot escape the raw dump directory
pub fn is_path_safe(component: &str) -> bool {
    !component.is_empty()
        && component != "."
        && component != ".."
        && !component.contains(['/', '\\'])
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostelDetails {
    pub hostel_id: String,
    pub hostel_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: String,
}

/// Check-in/check-out pair used to open a search session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl SessionWindow {
    /// One night starting on `day`
    pub fn one_night(day: NaiveDate) -> Self {
        Self {
            check_in: day,
            check_out: day + Duration::days(1),
        }
    }

    pub fn tonight() -> Self {
        Self::one_night(chrono::Local::now().date_naive())
    }

    pub fn check_in_str(&self) -> String {
        self.check_in.format(DATE_FORMAT).to_string()
    }

    pub fn check_out_str(&self) -> String {
        self.check_out.format(DATE_FORMAT).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Room {
    #[serde(rename = "roomUniqueId")]
    pub room_id: String,
    #[serde(rename = "roomName")]
    pub room_name: String,
}

/// One night of one room, as reported by the provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DayAvailability {
    pub date: String,
    #[serde(default)]
    pub unit: Value,
    #[serde(default)]
    pub price: Value,
}

/// One output row
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityRecord {
    pub hostel_name: String,
    pub room_name: String,
    pub date: String,
    pub unit: Value,
    pub price: Value,
}

impl AvailabilityRecord {
    pub const CSV_HEADER: [&'static str; 5] = ["Hostel Name", "Room Name", "Date", "Unit", "Price"];

    pub fn new(hostel_name: &str, room_name: &str, day: DayAvailability) -> Self {
        Self {
            hostel_name: hostel_name.to_string(),
            room_name: room_name.to_string(),
            date: day.date,
            unit: day.unit,
            price: day.price,
        }
    }

    pub fn to_csv_record(&self) -> Vec<String> {
        vec![
            self.hostel_name.clone(),
            self.room_name.clone(),
            self.date.clone(),
            cell_text(&self.unit),
            cell_text(&self.price),
        ]
    }
}

/// Strings verbatim, null empty, everything else in its JSON spelling
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
