use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{FixedOffset, Utc};
use serde_json::{json, Value};

use crate::{
    middleware::group::VisitorGroup,
    models::{
        event::{EventListQuery, EventView, NavLink},
        group::{AccessGroup, GroupInfo},
        outfit::OutfitTile,
        theme::GroupTheme,
    },
    services::{
        calendar, catalog,
        countdown::{self, Countdown},
        outfits, theme,
    },
    AppState,
};

type ApiError = (StatusCode, Json<Value>);

fn not_found() -> ApiError {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Page not found" })))
}

pub async fn list_groups() -> Json<Vec<GroupInfo>> {
    Json(AccessGroup::ALL.into_iter().map(GroupInfo::from).collect())
}

pub async fn list_events(
    VisitorGroup(group): VisitorGroup,
    Query(query): Query<EventListQuery>,
) -> Json<Vec<EventView>> {
    let mut visible = catalog::filter_events(catalog::events(), group);
    if query.sort.as_deref() == Some("date") {
        catalog::sort_by_date(&mut visible);
    }
    Json(visible.into_iter().map(|e| catalog::event_view(e, group)).collect())
}

/// `{id}` is taken from the map alongside `{group}`, which the extractor
/// has already validated.
pub async fn get_event(
    VisitorGroup(group): VisitorGroup,
    Path((_, id)): Path<(String, String)>,
) -> Result<Json<EventView>, ApiError> {
    catalog::find_event(catalog::events(), &id, group)
        .map(|e| Json(catalog::event_view(e, group)))
        .ok_or_else(not_found)
}

pub async fn event_calendar(
    State(state): State<AppState>,
    VisitorGroup(group): VisitorGroup,
    Path((_, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let event = catalog::find_event(catalog::events(), &id, group).ok_or_else(not_found)?;
    let domain = uid_domain(&state.config.app_base_url);
    let body = calendar::event_ics(event, group, &domain, venue_offset(&state)?, Utc::now());
    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.ics\"", event.id),
            ),
        ],
        body,
    ))
}

fn uid_domain(base_url: &str) -> String {
    reqwest::Url::parse(base_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "localhost".to_string())
}

pub async fn list_nav(VisitorGroup(group): VisitorGroup) -> Json<Vec<NavLink>> {
    Json(catalog::nav_links(catalog::nav_items(), group))
}

pub async fn get_theme(VisitorGroup(group): VisitorGroup) -> Json<GroupTheme> {
    Json(theme::theme_for(group))
}

pub async fn list_outfits(VisitorGroup(group): VisitorGroup) -> Json<Vec<OutfitTile>> {
    let visible = catalog::filter_events(catalog::events(), group);
    Json(outfits::outfit_tiles(&visible, group))
}

fn venue_offset(state: &AppState) -> Result<FixedOffset, ApiError> {
    state.config.venue_offset().ok_or_else(|| {
        tracing::error!(
            "VENUE_UTC_OFFSET_MINUTES out of range: {}",
            state.config.venue_utc_offset_minutes
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Venue time zone misconfigured" })),
        )
    })
}

pub async fn get_countdown(State(state): State<AppState>) -> Result<Json<Countdown>, ApiError> {
    let target = catalog::wedding_day().ok_or_else(|| {
        tracing::error!("Wedding day event missing from catalog");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Countdown unavailable" })),
        )
    })?;
    Ok(Json(countdown::countdown(target, venue_offset(&state)?, Utc::now())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uid_domain_uses_host() {
        assert_eq!(uid_domain("https://wedding.example.com/app"), "wedding.example.com");
        assert_eq!(uid_domain("http://localhost:3000"), "localhost");
        assert_eq!(uid_domain("not a url"), "localhost");
    }
}
