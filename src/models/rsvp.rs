use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::group::AccessGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn as_str(self) -> &'static str {
        match self {
            YesNo::Yes => "yes",
            YesNo::No => "no",
        }
    }

    fn parse(field: &'static str, value: &str) -> Result<Self, RsvpError> {
        match value.trim().to_lowercase().as_str() {
            "yes" | "true" => Ok(YesNo::Yes),
            "no" | "false" => Ok(YesNo::No),
            _ => Err(RsvpError::InvalidValue {
                field,
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RsvpError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("unknown group: {0}")]
    UnknownGroup(String),
    #[error("return date is before arrival date")]
    ReturnBeforeArrival,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Body of `POST /api/rsvp`, exactly as the form posts it.
#[derive(Debug, Default, Deserialize)]
pub struct RsvpRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub attending: Option<String>,
    pub needs_pickup: Option<String>,
    #[serde(default, deserialize_with = "blank_date")]
    pub arrival_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_date")]
    pub return_date: Option<NaiveDate>,
    pub bringing_guest: Option<String>,
    pub outfit_help: Option<String>,
    pub whatsapp: Option<String>,
    pub group: Option<String>,
}

/// Date inputs post `""` when left empty.
fn blank_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// A submission that passed validation; every non-null column has a value.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRsvp {
    pub name: String,
    pub email: String,
    pub attending: YesNo,
    pub needs_pickup: YesNo,
    pub arrival_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub bringing_guest: YesNo,
    pub outfit_help: YesNo,
    pub whatsapp: String,
    pub group: AccessGroup,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn optional_flag(field: &'static str, value: Option<String>) -> Result<YesNo, RsvpError> {
    match non_empty(value) {
        Some(v) => YesNo::parse(field, &v),
        None => Ok(YesNo::No),
    }
}

impl RsvpRequest {
    pub fn validate(self) -> Result<NewRsvp, RsvpError> {
        let name = non_empty(self.name).ok_or(RsvpError::MissingField("name"))?;
        let attending = non_empty(self.attending)
            .ok_or(RsvpError::MissingField("attending"))
            .and_then(|v| YesNo::parse("attending", &v))?;
        let group_raw = non_empty(self.group).ok_or(RsvpError::MissingField("group"))?;
        let group = group_raw
            .parse::<AccessGroup>()
            .map_err(|_| RsvpError::UnknownGroup(group_raw.clone()))?;

        if attending == YesNo::No {
            return Ok(NewRsvp {
                name,
                email: non_empty(self.email).unwrap_or_default(),
                attending,
                needs_pickup: YesNo::No,
                arrival_date: None,
                return_date: None,
                bringing_guest: YesNo::No,
                outfit_help: YesNo::No,
                whatsapp: non_empty(self.whatsapp).unwrap_or_default(),
                group,
            });
        }

        let email = non_empty(self.email).ok_or(RsvpError::MissingField("email"))?;
        if !email.contains('@') {
            return Err(RsvpError::InvalidValue {
                field: "email",
                value: email,
            });
        }
        let whatsapp = non_empty(self.whatsapp).ok_or(RsvpError::MissingField("whatsapp"))?;
        let needs_pickup = optional_flag("needs_pickup", self.needs_pickup)?;

        let (arrival_date, return_date) = if needs_pickup == YesNo::Yes {
            let arrival = self.arrival_date.ok_or(RsvpError::MissingField("arrival_date"))?;
            let departure = self.return_date.ok_or(RsvpError::MissingField("return_date"))?;
            if departure < arrival {
                return Err(RsvpError::ReturnBeforeArrival);
            }
            (Some(arrival), Some(departure))
        } else {
            (None, None)
        };

        Ok(NewRsvp {
            name,
            email,
            attending,
            needs_pickup,
            arrival_date,
            return_date,
            bringing_guest: optional_flag("bringing_guest", self.bringing_guest)?,
            outfit_help: optional_flag("outfit_help", self.outfit_help)?,
            whatsapp,
            group,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rsvp {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub attending: String,
    pub needs_pickup: String,
    pub arrival_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub bringing_guest: String,
    pub outfit_help: String,
    pub whatsapp: String,
    pub access_group: String,
    pub created_at: DateTime<Utc>,
}
