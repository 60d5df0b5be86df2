//! The fixed event and navigation tables, plus the group-scoped views over them.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use serde::Serialize;

use crate::models::{
    event::{Event, EventField, EventView, GroupText, NavItem, NavLink},
    group::AccessGroup::{self, Bride, Friends, Groom, Guests, Invitees},
};

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";

/// The ceremony that the countdown runs to.
pub const WEDDING_EVENT_ID: &str = "phere";

fn day(year: i32, month: u32, date: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, date).expect("catalog dates are valid")
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

lazy_static! {
    static ref EVENTS: Vec<Event> = vec![
        Event {
            id: "haldi".into(),
            date: day(2026, 12, 10),
            time: "10:00 AM".into(),
            location: GroupText::per_group(&[
                (Bride, "Sharma Residence, Civil Lines, Jaipur"),
                (Groom, "Kapoor Residence, Malviya Nagar, Jaipur"),
                (Friends, "Sharma Residence, Civil Lines, Jaipur"),
            ]),
            map_query: "Civil Lines, Jaipur".into(),
            allowed_groups: vec![Bride, Groom, Friends],
            title: GroupText::per_group(&[
                (Bride, "Haldi at the Bride's Home"),
                (Groom, "Haldi at the Groom's Home"),
                (Friends, "Haldi"),
            ]),
            description: GroupText::per_group(&[
                (Bride, "Turmeric, marigolds and the aunties' songs. Family arrives by 9:30 to set up."),
                (Groom, "A quiet morning ceremony with the Kapoor family before the festivities begin."),
                (Friends, "Come ready to get messy: turmeric paste is applied by everyone, to everyone."),
            ]),
            outfits: owned(&["Yellow kurta or saree", "Clothes you don't mind staining"]),
        },
        Event {
            id: "mehndi".into(),
            date: day(2026, 12, 10),
            time: "3:00 PM onwards".into(),
            location: GroupText::plain("Garden Lawn, Raj Vilas, Jaipur"),
            map_query: "Raj Vilas Jaipur".into(),
            allowed_groups: vec![Bride, Groom, Friends],
            title: GroupText::plain("Mehndi"),
            description: GroupText::per_group(&[
                (Bride, "Henna artists from 3 PM. The bride's design takes four hours, so snacks are on us."),
                (Groom, "Join the bride's side for henna, chai and an afternoon of music."),
                (Friends, "Henna, chai and a dholki. Sit with the bride while her design dries."),
            ]),
            outfits: owned(&["Green or pastel lehenga", "Light cotton kurta"]),
        },
        Event {
            id: "sangeet".into(),
            date: day(2026, 12, 10),
            time: "7:30 PM".into(),
            location: GroupText::plain("Durbar Hall, Raj Vilas, Jaipur"),
            map_query: "Raj Vilas Jaipur".into(),
            allowed_groups: vec![Bride, Groom, Friends, Invitees],
            title: GroupText::plain("Sangeet Night"),
            description: GroupText::per_group(&[
                (Bride, "Family performances start at 8. Rehearsal at 5 PM in the hall."),
                (Groom, "The Kapoors take the stage second. Rehearsal at 5 PM in the hall."),
                (Friends, "Dinner, performances from both families and a dance floor that stays open late."),
            ]),
            outfits: Vec::new(),
        },
        Event {
            id: "baraat-welcome".into(),
            date: day(2026, 12, 11),
            time: "6:00 PM".into(),
            location: GroupText::plain("Main Gate, Raj Vilas, Jaipur"),
            map_query: "Raj Vilas Jaipur".into(),
            allowed_groups: vec![Bride],
            title: GroupText::plain("Welcoming the Baraat"),
            description: GroupText::plain(
                "Receive the groom's procession at the gate with aarti, garlands and the milni.",
            ),
            outfits: Vec::new(),
        },
        Event {
            id: "baraat".into(),
            date: day(2026, 12, 11),
            time: "5:00 PM".into(),
            location: GroupText::plain("Procession from Hotel Clarks Amer to Raj Vilas"),
            map_query: "Hotel Clarks Amer Jaipur".into(),
            allowed_groups: vec![Groom, Friends, Invitees, Guests],
            title: GroupText::per_group(&[
                (Groom, "Baraat Procession"),
                (Friends, "Baraat: Dance the Groom In"),
                (Guests, "Baraat"),
            ]),
            description: GroupText::per_group(&[
                (Groom, "The groom rides out at 5 sharp. Family gathers in the hotel lobby at 4:30."),
                (Friends, "Band, dhol and a horse. Dance the groom all the way to the venue."),
                (Guests, "The groom's procession leaves the hotel at 5 PM. Join anywhere along the route."),
            ]),
            outfits: owned(&["Sherwani or bandhgala", "Comfortable shoes for dancing"]),
        },
        Event {
            id: "phere".into(),
            date: day(2026, 12, 11),
            time: "9:00 PM".into(),
            location: GroupText::plain("Mandap, Raj Vilas, Jaipur"),
            map_query: "Raj Vilas Jaipur".into(),
            allowed_groups: AccessGroup::ALL.to_vec(),
            title: GroupText::plain("Phere: The Wedding Ceremony"),
            description: GroupText::per_group(&[
                (Bride, "Family seating is in the first three rows. The kanyadaan follows the seven rounds."),
                (Groom, "Family seating is in the first three rows on the right of the mandap."),
                (Friends, "Seven rounds around the sacred fire. The ceremony runs late, dinner is served throughout."),
            ]),
            outfits: owned(&["Formal Indian wear", "Jewel tones"]),
        },
        Event {
            id: "family-reception".into(),
            date: day(2026, 12, 12),
            time: "12:30 PM".into(),
            location: GroupText::plain("Courtyard, Raj Vilas, Jaipur"),
            map_query: "Raj Vilas Jaipur".into(),
            allowed_groups: vec![Bride, Groom],
            title: GroupText::plain("Family Lunch"),
            description: GroupText::plain(
                "A relaxed lunch for both families to meet properly after the ceremonies.",
            ),
            outfits: Vec::new(),
        },
        Event {
            id: "reception".into(),
            date: day(2026, 12, 12),
            time: "7:30 PM".into(),
            location: GroupText::plain("Rambagh Palace Lawns, Jaipur"),
            map_query: "Rambagh Palace Jaipur".into(),
            allowed_groups: vec![Friends, Invitees, Guests],
            title: GroupText::plain("Wedding Reception"),
            description: GroupText::plain(
                "Dinner and dancing to celebrate the newlyweds. Shuttles leave Raj Vilas from 7 PM.",
            ),
            outfits: owned(&["Cocktail or Indo-western"]),
        },
    ];

    static ref NAV_ITEMS: Vec<NavItem> = vec![
        nav("home", "Home", "/{group}", &AccessGroup::ALL),
        nav("events", "Events", "/{group}/events", &AccessGroup::ALL),
        nav("outfits", "What to Wear", "/{group}/outfits", &AccessGroup::ALL),
        nav("travel", "Travel & Stay", "/{group}/travel", &[Friends, Invitees, Guests]),
        nav("rsvp", "RSVP", "/{group}/rsvp", &[Friends, Invitees, Guests]),
        nav("gallery", "Gallery", "/{group}/gallery", &AccessGroup::ALL),
    ];
}

fn nav(key: &str, label: &str, href: &str, groups: &[AccessGroup]) -> NavItem {
    NavItem {
        key: key.into(),
        label: label.into(),
        href: href.into(),
        allowed_groups: groups.to_vec(),
    }
}

pub fn events() -> &'static [Event] {
    &EVENTS
}

pub fn nav_items() -> &'static [NavItem] {
    &NAV_ITEMS
}

/// Catalog order is preserved.
pub fn filter_events(events: &[Event], group: AccessGroup) -> Vec<&Event> {
    events.iter().filter(|e| e.is_visible_to(group)).collect()
}

pub fn filter_nav(items: &[NavItem], group: AccessGroup) -> Vec<&NavItem> {
    items.iter().filter(|n| n.is_visible_to(group)).collect()
}

/// Stable: events on the same day keep their catalog order.
pub fn sort_by_date(events: &mut [&Event]) {
    events.sort_by_key(|e| e.date);
}

pub fn find_event<'a>(events: &'a [Event], id: &str, group: AccessGroup) -> Option<&'a Event> {
    events.iter().find(|e| e.id == id && e.is_visible_to(group))
}

pub fn resolve_property(event: &Event, group: AccessGroup, field: EventField) -> &str {
    event.field(field).resolve(group)
}

pub fn map_url(query: &str) -> String {
    reqwest::Url::parse_with_params(MAPS_SEARCH_URL, &[("api", "1"), ("query", query)])
        .map(|url| url.to_string())
        .unwrap_or_default()
}

pub fn event_view(event: &Event, group: AccessGroup) -> EventView {
    EventView {
        id: event.id.clone(),
        date: event.date,
        time: event.time.clone(),
        title: resolve_property(event, group, EventField::Title).to_string(),
        description: resolve_property(event, group, EventField::Description).to_string(),
        location: resolve_property(event, group, EventField::Location).to_string(),
        map_url: map_url(&event.map_query),
        outfits: event.outfits.clone(),
    }
}

pub fn nav_links(items: &[NavItem], group: AccessGroup) -> Vec<NavLink> {
    filter_nav(items, group)
        .into_iter()
        .map(|item| NavLink {
            key: item.key.clone(),
            label: item.label.clone(),
            href: item.href_for(group),
        })
        .collect()
}

pub fn wedding_day() -> Option<NaiveDate> {
    events()
        .iter()
        .find(|e| e.id == WEDDING_EVENT_ID)
        .map(|e| e.date)
}

/// A gap found while authoring the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogIssue {
    pub event_id: String,
    pub group: Option<AccessGroup>,
    pub problem: String,
}

/// Strict counterpart to the end-user resolver: every allowed group must reach
/// a non-empty value for every text field, ids must be unique and every event
/// must be visible to someone.
pub fn validate_catalog(events: &[Event]) -> Vec<CatalogIssue> {
    let mut issues = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for event in events {
        if !seen.insert(event.id.as_str()) {
            issues.push(CatalogIssue {
                event_id: event.id.clone(),
                group: None,
                problem: "duplicate event id".into(),
            });
        }
        if event.allowed_groups.is_empty() {
            issues.push(CatalogIssue {
                event_id: event.id.clone(),
                group: None,
                problem: "no allowed groups".into(),
            });
        }
        for &group in &event.allowed_groups {
            for field in EventField::ALL {
                let resolved = event.field(field).resolve_strict(group);
                if resolved.map_or(true, |v| v.trim().is_empty()) {
                    issues.push(CatalogIssue {
                        event_id: event.id.clone(),
                        group: Some(group),
                        problem: format!("{} does not resolve", field.name()),
                    });
                }
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn ids(events: &[&Event]) -> Vec<String> {
        events.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn shipped_catalog_is_complete() {
        assert_eq!(validate_catalog(events()), Vec::new());
    }

    #[test]
    fn every_allowed_group_sees_title_and_description() {
        for event in events() {
            for &group in &event.allowed_groups {
                assert!(!resolve_property(event, group, EventField::Title).is_empty(), "{}", event.id);
                assert!(!resolve_property(event, group, EventField::Description).is_empty(), "{}", event.id);
            }
        }
    }

    #[test]
    fn mehndi_is_hidden_from_guests() {
        let mehndi = events().iter().find(|e| e.id == "mehndi").unwrap();
        assert_eq!(mehndi.allowed_groups, vec![Bride, Groom, Friends]);
        assert!(!ids(&filter_events(events(), Guests)).contains(&"mehndi".to_string()));
        assert!(find_event(events(), "mehndi", Guests).is_none());
    }

    #[test]
    fn family_reception_description_is_shared() {
        let event = events().iter().find(|e| e.id == "family-reception").unwrap();
        let expected = "A relaxed lunch for both families to meet properly after the ceremonies.";
        for group in AccessGroup::ALL {
            assert_eq!(resolve_property(event, group, EventField::Description), expected);
        }
    }

    #[test]
    fn invitees_inherit_friends_copy() {
        let sangeet = events().iter().find(|e| e.id == "sangeet").unwrap();
        assert_eq!(
            resolve_property(sangeet, Invitees, EventField::Description),
            resolve_property(sangeet, Friends, EventField::Description),
        );
    }

    #[test]
    fn unlisted_group_filters_to_nothing() {
        let only_bride: Vec<Event> = events()
            .iter()
            .filter(|e| e.allowed_groups == vec![Bride])
            .cloned()
            .collect();
        assert!(!only_bride.is_empty());
        assert!(filter_events(&only_bride, Guests).is_empty());
    }

    #[test]
    fn filtering_keeps_catalog_order() {
        let guests = ids(&filter_events(events(), Guests));
        assert_eq!(guests, vec!["baraat", "phere", "reception"]);
    }

    #[test]
    fn sort_by_date_is_stable() {
        let mut friends = filter_events(events(), Friends);
        friends.reverse();
        sort_by_date(&mut friends);
        let dates: Vec<_> = friends.iter().map(|e| e.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        // same-day events keep the (reversed) input order
        assert_eq!(ids(&friends[..3]), vec!["sangeet", "mehndi", "haldi"]);
    }

    #[test]
    fn nav_is_filtered_and_templated() {
        let links = nav_links(nav_items(), Bride);
        assert!(links.iter().all(|l| l.key != "rsvp"));
        let events_link = links.iter().find(|l| l.key == "events").unwrap();
        assert_eq!(events_link.href, "/bride/events");

        let guest_keys: Vec<_> = nav_links(nav_items(), Guests).into_iter().map(|l| l.key).collect();
        assert!(guest_keys.contains(&"rsvp".to_string()));
    }

    #[test]
    fn event_view_resolves_for_group() {
        let haldi = events().iter().find(|e| e.id == "haldi").unwrap();
        let view = event_view(haldi, Groom);
        assert_eq!(view.title, "Haldi at the Groom's Home");
        assert_eq!(view.location, "Kapoor Residence, Malviya Nagar, Jaipur");
        assert!(view.map_url.starts_with(MAPS_SEARCH_URL));
        assert!(view.map_url.contains("query=Civil+Lines%2C+Jaipur"));
    }

    #[test]
    fn validation_reports_unreachable_text() {
        let mut broken = events()[0].clone();
        broken.id = "broken".into();
        broken.title = GroupText::PerGroup(BTreeMap::new());
        broken.allowed_groups = vec![Guests];
        let issues = validate_catalog(&[broken.clone(), broken]);
        assert!(issues.iter().any(|i| i.problem == "duplicate event id"));
        assert!(issues
            .iter()
            .any(|i| i.group == Some(Guests) && i.problem == "title does not resolve"));
    }

    #[test]
    fn wedding_day_is_the_phere_date() {
        assert_eq!(wedding_day(), Some(day(2026, 12, 11)));
    }
}
