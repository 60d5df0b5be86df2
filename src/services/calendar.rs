//! Single-event iCalendar export.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, Utc};

use crate::{
    models::{
        event::{Event, EventField},
        group::AccessGroup,
    },
    services::catalog,
};

const MAX_LINE_OCTETS: usize = 75;

/// Reads the clock time at the start of a free-text time such as
/// "7:30 PM", "19:00" or "3 pm onwards". A bare hour without a meridiem
/// is too ambiguous and yields `None`.
pub fn parse_clock(time: &str) -> Option<NaiveTime> {
    let text = time.trim().to_ascii_lowercase();
    let bytes = text.as_bytes();
    let mut i = 0;

    let hour_start = i;
    while i < bytes.len() && i - hour_start < 2 && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == hour_start {
        return None;
    }
    let mut hour: u32 = text[hour_start..i].parse().ok()?;

    let mut minute = None;
    if bytes.get(i) == Some(&b':') {
        let m = text.get(i + 1..i + 3)?;
        if !m.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        minute = Some(m.parse::<u32>().ok()?);
        i += 3;
    }

    let rest = text[i..].trim_start().replace('.', "");
    let meridiem = if rest.starts_with("am") {
        Some(false)
    } else if rest.starts_with("pm") {
        Some(true)
    } else {
        None
    };

    match meridiem {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            hour %= 12;
            if pm {
                hour += 12;
            }
        }
        None if minute.is_none() => return None,
        None => {}
    }

    NaiveTime::from_hms_opt(hour, minute.unwrap_or(0), 0)
}

/// RFC 5545 TEXT escaping.
fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Folds a content line to 75 octets without splitting a UTF-8 sequence.
fn fold_line(line: &str, out: &mut String) {
    let mut width = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            width = 1;
        }
        out.push(c);
        width += len;
    }
    out.push_str("\r\n");
}

fn stamp(dt: NaiveDateTime) -> String {
    dt.format("%Y%m%dT%H%M%S").to_string()
}

/// Calendar entry for one event as seen by `group`. Timed events last one
/// hour and are written in UTC, read from the venue's local clock at
/// `venue_offset`; events whose time cannot be read become all-day entries.
pub fn event_ics(
    event: &Event,
    group: AccessGroup,
    uid_domain: &str,
    venue_offset: FixedOffset,
    now: DateTime<Utc>,
) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//wedding-api//events//EN".to_string(),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}-{}@{}", event.id, group.key(), uid_domain),
        format!("DTSTAMP:{}Z", stamp(now.naive_utc())),
    ];

    match parse_clock(&event.time) {
        Some(clock) => {
            let start = event.date.and_time(clock)
                - Duration::seconds(i64::from(venue_offset.local_minus_utc()));
            lines.push(format!("DTSTART:{}Z", stamp(start)));
            lines.push(format!("DTEND:{}Z", stamp(start + Duration::hours(1))));
        }
        None => {
            let next = event.date.succ_opt().unwrap_or(event.date);
            lines.push(format!("DTSTART;VALUE=DATE:{}", event.date.format("%Y%m%d")));
            lines.push(format!("DTEND;VALUE=DATE:{}", next.format("%Y%m%d")));
        }
    }

    let field = |f| escape_text(catalog::resolve_property(event, group, f));
    lines.push(format!("SUMMARY:{}", field(EventField::Title)));
    lines.push(format!("DESCRIPTION:{}", field(EventField::Description)));
    lines.push(format!("LOCATION:{}", field(EventField::Location)));
    lines.push(format!("URL:{}", catalog::map_url(&event.map_query)));
    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());

    let mut out = String::new();
    for line in &lines {
        fold_line(line, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(330 * 60).unwrap()
    }

    fn hm(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    #[test]
    fn parses_common_time_strings() {
        assert_eq!(parse_clock("7:30 PM"), hm(19, 30));
        assert_eq!(parse_clock("10:00 AM"), hm(10, 0));
        assert_eq!(parse_clock("12:30 PM"), hm(12, 30));
        assert_eq!(parse_clock("12:15 am"), hm(0, 15));
        assert_eq!(parse_clock("3:00 PM onwards"), hm(15, 0));
        assert_eq!(parse_clock("3 p.m."), hm(15, 0));
        assert_eq!(parse_clock("19:00"), hm(19, 0));
    }

    #[test]
    fn unreadable_times_are_none() {
        assert_eq!(parse_clock("Evening"), None);
        assert_eq!(parse_clock("7 onwards"), None);
        assert_eq!(parse_clock("13 PM"), None);
        assert_eq!(parse_clock("25:00"), None);
        assert_eq!(parse_clock(""), None);
    }

    #[test]
    fn escapes_and_folds() {
        assert_eq!(escape_text("a,b;c\\d\ne"), "a\\,b\\;c\\\\d\\ne");

        let mut out = String::new();
        fold_line(&"x".repeat(160), &mut out);
        let parts: Vec<&str> = out.trim_end_matches("\r\n").split("\r\n").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].len(), 75);
        assert!(parts[1].starts_with(' '));
        assert!(parts.iter().all(|p| p.len() <= 75));
    }

    #[test]
    fn timed_event_lasts_one_hour() {
        let event = catalog::events().iter().find(|e| e.id == "sangeet").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap();
        let ics = event_ics(event, AccessGroup::Friends, "wedding.example", ist(), now);

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert!(ics.contains("UID:sangeet-friends@wedding.example\r\n"));
        assert!(ics.contains("DTSTAMP:20261015T080000Z\r\n"));
        // 7:30 PM in Jaipur
        assert!(ics.contains("DTSTART:20261210T140000Z\r\n"));
        assert!(ics.contains("DTEND:20261210T150000Z\r\n"));
        assert!(ics.contains("SUMMARY:Sangeet Night\r\n"));
    }

    #[test]
    fn early_morning_falls_on_previous_utc_day() {
        let mut event = catalog::events().iter().find(|e| e.id == "haldi").unwrap().clone();
        event.time = "2:00 AM".into();
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap();
        let ics = event_ics(&event, AccessGroup::Bride, "wedding.example", ist(), now);
        assert!(ics.contains("DTSTART:20261209T203000Z\r\n"));

        let utc = FixedOffset::east_opt(0).unwrap();
        let ics = event_ics(&event, AccessGroup::Bride, "wedding.example", utc, now);
        assert!(ics.contains("DTSTART:20261210T020000Z\r\n"));
    }

    #[test]
    fn untimed_event_is_all_day() {
        let mut event = catalog::events().iter().find(|e| e.id == "phere").unwrap().clone();
        event.time = "After sunset".into();
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap();
        let ics = event_ics(&event, AccessGroup::Guests, "wedding.example", ist(), now);
        assert!(ics.contains("DTSTART;VALUE=DATE:20261211\r\n"));
        assert!(ics.contains("DTEND;VALUE=DATE:20261212\r\n"));
    }
}
