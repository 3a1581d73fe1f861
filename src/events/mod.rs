//! Public events listing.
//!
//! # Responsibilities
//! - Parse and bound the `limit`, `offset`, `type` and `space` query parameters
//! - Return upcoming published events with pagination info
//! - Mark successful responses cacheable for a short shared window
//!
//! # Design Decisions
//! - A `limit` above `events.max_limit` is rejected rather than clamped
//! - Past and unpublished events never appear, whatever the filters

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header::CACHE_CONTROL, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::config::EventsConfig;
use crate::http::response::{ApiError, ApiResponse};
use crate::http::server::AppState;
use crate::storage::{Event, EventQuery};

/// Raw query string values; parsed by hand so bad numbers get the envelope.
#[derive(Debug, Default, Deserialize)]
pub struct EventsParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub space: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
    pub total: usize,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct EventListing {
    pub events: Vec<Event>,
    pub pagination: Pagination,
}

fn parse_count(name: &str, raw: Option<&str>, default: usize) -> Result<usize, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => s
            .parse::<usize>()
            .map_err(|_| ApiError::invalid_parameter(format!("{name} must be a non-negative integer"))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Turn query parameters into a bounded store query.
pub fn build_query(params: EventsParams, config: &EventsConfig) -> Result<EventQuery, ApiError> {
    let limit = parse_count("limit", params.limit.as_deref(), config.default_limit)?;
    if limit == 0 {
        return Err(ApiError::invalid_parameter("limit must be at least 1"));
    }
    if limit > config.max_limit {
        return Err(ApiError::invalid_parameter(format!(
            "limit cannot exceed {}",
            config.max_limit
        )));
    }
    let offset = parse_count("offset", params.offset.as_deref(), 0)?;

    Ok(EventQuery {
        limit,
        offset,
        event_type: non_empty(params.event_type),
        space: non_empty(params.space),
    })
}

/// `GET /api/events`
pub async fn list_events(
    State(state): State<AppState>,
    params: Result<Query<EventsParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::invalid_parameter(e.body_text()))?;
    let config = &state.config.events;
    let query = build_query(params, config)?;
    let today = chrono::Local::now().date_naive();

    let page = state
        .events
        .published_events(&query, today)
        .await
        .map_err(ApiError::internal)?;

    let listing = EventListing {
        pagination: Pagination {
            limit: query.limit,
            offset: query.offset,
            total: page.total,
            has_more: query.offset + page.events.len() < page.total,
        },
        events: page.events,
    };

    let cache = format!(
        "public, s-maxage={}, stale-while-revalidate",
        config.cache_max_age_secs
    );
    let mut response = ApiResponse::ok(listing).into_response();
    if let Ok(value) = HeaderValue::from_str(&cache) {
        response.headers_mut().insert(CACHE_CONTROL, value);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::ErrorKind;

    fn params(limit: Option<&str>, offset: Option<&str>) -> EventsParams {
        EventsParams {
            limit: limit.map(str::to_string),
            offset: offset.map(str::to_string),
            ..EventsParams::default()
        }
    }

    #[test]
    fn test_defaults() {
        let query = build_query(EventsParams::default(), &EventsConfig::default()).unwrap();
        assert_eq!(query.limit, 50);
        assert_eq!(query.offset, 0);
        assert!(query.event_type.is_none());
    }

    #[test]
    fn test_limit_bounds() {
        let config = EventsConfig::default();
        assert_eq!(build_query(params(Some("100"), None), &config).unwrap().limit, 100);

        for bad in ["101", "0", "-1", "ten"] {
            let err = build_query(params(Some(bad), None), &config).unwrap_err();
            assert_eq!(err.kind, ErrorKind::InvalidParameter, "{bad}");
        }
    }

    #[test]
    fn test_filters_are_trimmed() {
        let query = build_query(
            EventsParams {
                event_type: Some(" Live Music ".into()),
                space: Some("   ".into()),
                ..EventsParams::default()
            },
            &EventsConfig::default(),
        )
        .unwrap();
        assert_eq!(query.event_type.as_deref(), Some("Live Music"));
        assert!(query.space.is_none());
        assert!(build_query(params(None, Some("x")), &EventsConfig::default()).is_err());
    }
}
