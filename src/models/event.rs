use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::group::{AccessGroup, FALLBACK_ORDER};

/// Text that is either shared by every audience or written per group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupText {
    Plain(String),
    PerGroup(BTreeMap<AccessGroup, String>),
}

impl GroupText {
    pub fn plain(text: &str) -> Self {
        GroupText::Plain(text.to_string())
    }

    pub fn per_group(entries: &[(AccessGroup, &str)]) -> Self {
        GroupText::PerGroup(
            entries
                .iter()
                .map(|(group, text)| (*group, text.to_string()))
                .collect(),
        )
    }

    /// Exact group first, then `FALLBACK_ORDER`. `None` when nothing matches.
    pub fn resolve_strict(&self, group: AccessGroup) -> Option<&str> {
        match self {
            GroupText::Plain(text) => Some(text),
            GroupText::PerGroup(map) => map
                .get(&group)
                .or_else(|| FALLBACK_ORDER.iter().find_map(|g| map.get(g)))
                .map(String::as_str),
        }
    }

    /// Same as [`resolve_strict`](Self::resolve_strict) but a total miss yields `""`.
    pub fn resolve(&self, group: AccessGroup) -> &str {
        self.resolve_strict(group).unwrap_or("")
    }
}

/// The group-dependent fields of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Title,
    Description,
    Location,
}

impl EventField {
    pub const ALL: [EventField; 3] = [EventField::Title, EventField::Description, EventField::Location];

    pub fn name(self) -> &'static str {
        match self {
            EventField::Title => "title",
            EventField::Description => "description",
            EventField::Location => "location",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: String,
    pub date: NaiveDate,
    /// Display string, e.g. "7:00 PM onwards".
    pub time: String,
    pub location: GroupText,
    pub map_query: String,
    pub allowed_groups: Vec<AccessGroup>,
    pub title: GroupText,
    pub description: GroupText,
    pub outfits: Vec<String>,
}

impl Event {
    pub fn is_visible_to(&self, group: AccessGroup) -> bool {
        self.allowed_groups.contains(&group)
    }

    pub fn field(&self, field: EventField) -> &GroupText {
        match field {
            EventField::Title => &self.title,
            EventField::Description => &self.description,
            EventField::Location => &self.location,
        }
    }
}

/// An event with its text already resolved for one group.
#[derive(Debug, Clone, Serialize)]
pub struct EventView {
    pub id: String,
    pub date: NaiveDate,
    pub time: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub map_url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outfits: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct EventListQuery {
    /// "date" re-sorts chronologically; anything else keeps catalog order.
    pub sort: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NavItem {
    pub key: String,
    pub label: String,
    /// Contains a `{group}` placeholder.
    pub href: String,
    pub allowed_groups: Vec<AccessGroup>,
}

impl NavItem {
    pub fn is_visible_to(&self, group: AccessGroup) -> bool {
        self.allowed_groups.contains(&group)
    }

    pub fn href_for(&self, group: AccessGroup) -> String {
        self.href.replace("{group}", group.key())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavLink {
    pub key: String,
    pub label: String,
    pub href: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::group::AccessGroup::*;

    #[test]
    fn plain_text_ignores_group() {
        let text = GroupText::plain("Dinner with both families");
        for group in AccessGroup::ALL {
            assert_eq!(text.resolve(group), "Dinner with both families");
        }
    }

    #[test]
    fn exact_group_wins_over_fallback() {
        let text = GroupText::per_group(&[(Friends, "for friends"), (Guests, "for guests")]);
        assert_eq!(text.resolve(Guests), "for guests");
    }

    #[test]
    fn missing_group_inherits_friends_first() {
        let text = GroupText::per_group(&[(Bride, "bride"), (Groom, "groom"), (Friends, "friends")]);
        assert_eq!(text.resolve(Invitees), "friends");
        assert_eq!(text.resolve(Guests), "friends");
    }

    #[test]
    fn fallback_walks_bride_then_groom() {
        let text = GroupText::per_group(&[(Groom, "groom"), (Bride, "bride")]);
        assert_eq!(text.resolve(Guests), "bride");

        let text = GroupText::per_group(&[(Groom, "groom"), (Guests, "guests")]);
        assert_eq!(text.resolve(Invitees), "groom");
    }

    #[test]
    fn total_miss_is_empty_or_none() {
        let text = GroupText::PerGroup(BTreeMap::new());
        assert_eq!(text.resolve(Bride), "");
        assert_eq!(text.resolve_strict(Bride), None);
    }

    #[test]
    fn nav_href_substitutes_group_key() {
        let item = NavItem {
            key: "events".into(),
            label: "Events".into(),
            href: "/{group}/events".into(),
            allowed_groups: vec![Friends],
        };
        assert_eq!(item.href_for(Friends), "/friends/events");
    }
}
