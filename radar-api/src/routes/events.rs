//! Event discovery and ranking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use radar_core::Event;
use radar_polymarket::{EventFilter, EventOrder, EventPreset};
use radar_ranking::RankedEvent;
use radar_services::{BatchOutcome, EventDetails};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{bad_request, error_response};
use crate::AppState;

/// Events fetched to build the trending pool
const TRENDING_POOL: u32 = 100;
const DEFAULT_TRENDING: usize = 20;
const MAX_BATCH_IDS: usize = 200;

/// Query parameters for listing events
#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    /// Preset tab (all, trending, expiring, new, crypto, politics, sports)
    pub preset: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub tag_id: Option<u32>,
    pub tag_slug: Option<String>,
    /// Sort key (volume, volume24hr, liquidity, startDate, endDate, createdAt, competitive)
    pub order: Option<String>,
    pub ascending: Option<bool>,
    pub closed: Option<bool>,
    pub liquidity_min: Option<f64>,
    pub volume_min: Option<f64>,
    /// Page through every matching event (up to `max`)
    #[serde(default)]
    pub all: bool,
    pub max: Option<usize>,
}

impl ListEventsQuery {
    fn to_filter(&self) -> Result<EventFilter, String> {
        let mut filter = match &self.preset {
            Some(preset) => preset.parse::<EventPreset>()?.filter(self.limit.unwrap_or(50)),
            None => EventFilter::default(),
        };
        if let Some(limit) = self.limit {
            filter.limit = Some(limit);
        }
        if self.offset.is_some() {
            filter.offset = self.offset;
        }
        if self.tag_id.is_some() {
            filter.tag_id = self.tag_id;
        }
        if self.tag_slug.is_some() {
            filter.tag_slug = self.tag_slug.clone();
        }
        if let Some(order) = &self.order {
            filter.order = Some(order.parse::<EventOrder>()?);
        }
        if let Some(ascending) = self.ascending {
            filter.ascending = ascending;
        }
        if self.closed.is_some() {
            filter.closed = self.closed;
        }
        filter.liquidity_min = self.liquidity_min.or(filter.liquidity_min);
        filter.volume_min = self.volume_min.or(filter.volume_min);
        Ok(filter)
    }
}

/// Query parameters for trending events
#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<usize>,
    pub preset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<Event>,
    pub count: usize,
    pub from_fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    pub events: Vec<RankedEvent>,
    pub count: usize,
    pub from_fallback: bool,
}

#[derive(Debug, Serialize)]
pub struct EventDetailsResponse {
    #[serde(flatten)]
    pub details: EventDetails,
    pub from_fallback: bool,
}

/// Create event routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/trending", get(trending_events))
        .route("/events/rank", post(rank_events))
        .route("/events/batch", post(batch_events))
        .route("/events/{id}", get(get_event))
}

async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListEventsQuery>,
) -> Response {
    info!("Listing events with params: {:?}", params);

    let filter = match params.to_filter() {
        Ok(filter) => filter,
        Err(e) => return bad_request(e).into_response(),
    };

    let result = if params.all {
        state.service.discover_all_events(&filter, params.max).await
    } else {
        state.service.discover_events(&filter).await
    };

    match result {
        Ok(fetched) => {
            let count = fetched.data.len();
            info!(count, from_fallback = fetched.from_fallback, "Returning events");
            (
                StatusCode::OK,
                Json(EventsResponse {
                    events: fetched.data,
                    count,
                    from_fallback: fetched.from_fallback,
                }),
            )
                .into_response()
        }
        Err(e) => error_response("Failed to list events", e).into_response(),
    }
}

async fn trending_events(
    State(state): State<AppState>,
    Query(params): Query<TrendingQuery>,
) -> Response {
    let preset = match params.preset.as_deref().map(str::parse::<EventPreset>) {
        Some(Ok(preset)) => preset,
        Some(Err(e)) => return bad_request(e).into_response(),
        None => EventPreset::Trending,
    };
    let top_n = params.limit.unwrap_or(DEFAULT_TRENDING);
    let filter = preset.filter(TRENDING_POOL);

    match state.service.discover_trending(&filter, top_n).await {
        Ok(fetched) => {
            let count = fetched.data.len();
            Json(TrendingResponse {
                events: fetched.data,
                count,
                from_fallback: fetched.from_fallback,
            })
            .into_response()
        }
        Err(e) => error_response("Failed to rank trending events", e).into_response(),
    }
}

async fn get_event(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    info!("Getting event {}", id);
    match state.service.fetch_event_with_markets(&id).await {
        Ok(fetched) => Json(EventDetailsResponse {
            details: fetched.data,
            from_fallback: fetched.from_fallback,
        })
        .into_response(),
        Err(e) => error_response(&format!("Failed to get event {}", id), e).into_response(),
    }
}

/// Rank caller-supplied events without touching the upstream API
async fn rank_events(
    State(state): State<AppState>,
    Json(events): Json<Vec<Event>>,
) -> Json<Vec<RankedEvent>> {
    Json(state.service.rank_events(events))
}

async fn batch_events(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Response {
    if request.ids.len() > MAX_BATCH_IDS {
        return bad_request(format!("At most {} ids per batch", MAX_BATCH_IDS)).into_response();
    }
    let outcome: BatchOutcome = state.service.fetch_events_batch(&request.ids).await;
    Json(outcome).into_response()
}
