//! Lost-pet report domain model.
//!
//! A [`Report`] is one published listing in the `reports` table. Reports are
//! created by the submission workflow and are otherwise read-only from this
//! client: only `status` ever changes, and it changes on the collaborator's
//! side. [`NewReport`] is the row the client inserts; the collaborator assigns
//! the `id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Number of seconds in one minute.
const SECONDS_PER_MINUTE: i64 = 60;

/// Number of seconds in one hour.
const SECONDS_PER_HOUR: i64 = 3600;

/// Number of seconds in one day.
const SECONDS_PER_DAY: i64 = 86400;

/// Kind of animal a report is about.
///
/// Serialised as lowercase English on the wire; [`PetType::label`] gives the
/// Spanish name shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetType {
    #[default]
    Dog,
    Cat,
    Bird,
    Rabbit,
    Hamster,
    Other,
}

impl PetType {
    /// All pet types in selector order.
    pub const ALL: [Self; 6] = [
        Self::Dog,
        Self::Cat,
        Self::Bird,
        Self::Rabbit,
        Self::Hamster,
        Self::Other,
    ];

    /// Wire value as stored in the `type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dog => "dog",
            Self::Cat => "cat",
            Self::Bird => "bird",
            Self::Rabbit => "rabbit",
            Self::Hamster => "hamster",
            Self::Other => "other",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dog => "Perro",
            Self::Cat => "Gato",
            Self::Bird => "Ave",
            Self::Rabbit => "Conejo",
            Self::Hamster => "Hámster",
            Self::Other => "Otro",
        }
    }

    /// Next type in selector order, wrapping around.
    #[must_use]
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous type in selector order, wrapping around.
    #[must_use]
    pub fn previous(self) -> Self {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Lifecycle state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Lost,
    Found,
    Other,
}

impl ReportStatus {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lost => "Perdido",
            Self::Found => "Encontrado",
            Self::Other => "Otro",
        }
    }
}

/// A published lost-pet report as returned by the `reports` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Text or numeric identity key, kept as text.
    #[serde(deserialize_with = "id_as_text")]
    pub id: String,
    #[serde(rename = "type")]
    pub pet_type: PetType,
    pub name: String,
    #[serde(default)]
    pub breed: Option<String>,
    pub description: String,
    pub photo_url: String,
    pub location: String,
    pub contact: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub status: ReportStatus,
    /// Identity that published the report, if it was signed in.
    #[serde(default)]
    pub user_id: Option<String>,
}

fn id_as_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

impl Report {
    /// Returns a human-readable string describing how long ago the report was
    /// published, relative to `now`.
    ///
    /// - Less than 1 minute: "recién"
    /// - Less than 1 hour: "hace 5 min"
    /// - Less than 1 day: "hace 3 h"
    /// - Otherwise: "hace 7 d"
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{Duration, Utc};
    /// use mascotas::domain::{NewReport, PetType};
    ///
    /// let now = Utc::now();
    /// let report = NewReport {
    ///     pet_type: PetType::Cat,
    ///     name: "Michi".into(),
    ///     breed: None,
    ///     description: "Gato atigrado".into(),
    ///     photo_url: "https://example.org/michi.jpg".into(),
    ///     location: "Macul".into(),
    ///     contact: "+56 9 1234 5678".into(),
    ///     published_at: now - Duration::minutes(5),
    ///     status: Default::default(),
    ///     user_id: None,
    /// }
    /// .into_report("r-1");
    /// assert_eq!(report.published_ago(now), "hace 5 min");
    /// ```
    #[must_use]
    pub fn published_ago(&self, now: DateTime<Utc>) -> String {
        let diff = (now - self.published_at).num_seconds();

        if diff < SECONDS_PER_MINUTE {
            "recién".to_string()
        } else if diff < SECONDS_PER_HOUR {
            let mins = diff / SECONDS_PER_MINUTE;
            format!("hace {mins} min")
        } else if diff < SECONDS_PER_DAY {
            let hours = diff / SECONDS_PER_HOUR;
            format!("hace {hours} h")
        } else {
            let days = diff / SECONDS_PER_DAY;
            format!("hace {days} d")
        }
    }
}

/// Row inserted by the submission workflow. The collaborator assigns `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReport {
    #[serde(rename = "type")]
    pub pet_type: PetType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    pub description: String,
    pub photo_url: String,
    pub location: String,
    pub contact: String,
    pub published_at: DateTime<Utc>,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl NewReport {
    /// Attaches an id, producing the stored shape.
    #[must_use]
    pub fn into_report(self, id: impl Into<String>) -> Report {
        Report {
            id: id.into(),
            pet_type: self.pet_type,
            name: self.name,
            breed: self.breed,
            description: self.description,
            photo_url: self.photo_url,
            location: self.location,
            contact: self.contact,
            published_at: self.published_at,
            status: self.status,
            user_id: self.user_id,
        }
    }
}
