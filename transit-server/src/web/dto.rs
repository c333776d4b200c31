//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::feed::{FeedFile, Route, Stop, StopTime, Trip};
use crate::store::{FeedItem, ImportReport, MapCenter, TransitStore};

/// A route in responses.
#[derive(Debug, Serialize)]
pub struct RouteResult {
    pub id: String,
    pub short_name: String,
    pub long_name: String,
    pub description: String,
    pub route_type: u32,
    pub url: Option<String>,
    pub agency_id: String,
    /// Fill colour as "#RRGGBB"
    pub color: String,
    /// Text colour as "#RRGGBB", black when the feed gives none
    pub text_color: String,
}

impl RouteResult {
    pub fn from_route(route: &Route) -> Self {
        Self {
            id: route.id.clone(),
            short_name: route.short_name.clone(),
            long_name: route.long_name.clone(),
            description: route.description.clone(),
            route_type: route.route_type,
            url: route.url.as_ref().map(|u| u.to_string()),
            agency_id: route.agency_id.clone(),
            color: route.color.to_css(),
            text_color: route.text_color_or_default().to_css(),
        }
    }
}

/// A stop in responses.
#[derive(Debug, Serialize)]
pub struct StopResult {
    pub id: String,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl StopResult {
    pub fn from_stop(stop: &Stop) -> Self {
        Self {
            id: stop.id.clone(),
            name: stop.name.clone(),
            description: stop.description.clone(),
            latitude: stop.latitude,
            longitude: stop.longitude,
        }
    }
}

/// A trip in responses.
#[derive(Debug, Serialize)]
pub struct TripResult {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    pub headsign: String,
    /// 0 or 1
    pub direction_id: u8,
    pub block_id: String,
    pub shape_id: String,
}

impl TripResult {
    pub fn from_trip(trip: &Trip) -> Self {
        Self {
            id: trip.id.clone(),
            route_id: trip.route_id.clone(),
            service_id: trip.service_id.clone(),
            headsign: trip.headsign.clone(),
            direction_id: trip.direction.code(),
            block_id: trip.block_id.clone(),
            shape_id: trip.shape_id.clone(),
        }
    }
}

/// A stop time in responses.
#[derive(Debug, Serialize)]
pub struct StopTimeResult {
    pub trip_id: String,
    pub stop_id: String,
    pub stop_sequence: u32,
    /// As written in the feed
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_headsign: String,
    pub pickup_type: u8,
    pub drop_off_type: u8,
}

impl StopTimeResult {
    pub fn from_stop_time(st: &StopTime) -> Self {
        Self {
            trip_id: st.trip_id.clone(),
            stop_id: st.stop_id.clone(),
            stop_sequence: st.stop_sequence,
            arrival_time: st.arrival_time.clone(),
            departure_time: st.departure_time.clone(),
            stop_headsign: st.stop_headsign.clone(),
            pickup_type: st.pickup_type.code(),
            drop_off_type: st.drop_off_type.code(),
        }
    }
}

/// One entry of a search result, tagged by `kind`.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemResult {
    Section { label: String },
    Route(RouteResult),
    Stop(StopResult),
    Trip(TripResult),
    StopTime(StopTimeResult),
}

impl ItemResult {
    pub fn from_item(item: &FeedItem) -> Self {
        match item {
            FeedItem::Section(label) => ItemResult::Section {
                label: label.clone(),
            },
            FeedItem::Route(route) => ItemResult::Route(RouteResult::from_route(route)),
            FeedItem::Stop(stop) => ItemResult::Stop(StopResult::from_stop(stop)),
            FeedItem::Trip(trip) => ItemResult::Trip(TripResult::from_trip(trip)),
            FeedItem::StopTime(st) => ItemResult::StopTime(StopTimeResult::from_stop_time(st)),
        }
    }
}

/// Response to a stop or route search.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<ItemResult>,
}

impl SearchResponse {
    pub fn from_items(items: &[FeedItem]) -> Self {
        Self {
            items: items.iter().map(ItemResult::from_item).collect(),
        }
    }
}

/// Size and layout of one table.
#[derive(Debug, Serialize)]
pub struct TableSummary {
    pub file: &'static str,
    pub records: usize,
    /// Fields declared by the imported header, in order
    pub fields: Vec<String>,
}

/// Map centre hint.
#[derive(Debug, Serialize)]
pub struct MapCenterResult {
    pub latitude: f64,
    pub longitude: f64,
}

impl MapCenterResult {
    pub fn from_center(center: MapCenter) -> Self {
        Self {
            latitude: center.latitude,
            longitude: center.longitude,
        }
    }
}

/// Overview of everything the store holds.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub has_routes: bool,
    pub has_stops: bool,
    pub has_trips: bool,
    pub has_stop_times: bool,
    pub tables: Vec<TableSummary>,
    pub map_center: Option<MapCenterResult>,
}

impl SummaryResponse {
    pub fn from_store(store: &TransitStore) -> Self {
        let tables = [
            FeedFile::Routes,
            FeedFile::Stops,
            FeedFile::Trips,
            FeedFile::StopTimes,
        ]
        .into_iter()
        .map(|kind| TableSummary {
            file: kind.file_name(),
            records: store.table_len(kind),
            fields: store.fields(kind).as_slice().to_vec(),
        })
        .collect();

        Self {
            has_routes: store.has_routes(),
            has_stops: store.has_stops(),
            has_trips: store.has_trips(),
            has_stop_times: store.has_stop_times(),
            tables,
            map_center: store.map_center().map(MapCenterResult::from_center),
        }
    }
}

/// Request to import a file from the data directory.
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// Bare file name, e.g. "routes.txt"
    pub file: String,
}

/// Result of an import.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub file: &'static str,
    pub imported: usize,
    pub skipped: usize,
}

impl ImportResponse {
    pub fn from_report(report: &ImportReport) -> Self {
        Self {
            file: report.kind.file_name(),
            imported: report.imported,
            skipped: report.skipped,
        }
    }
}

/// Result of an export.
#[derive(Debug, Serialize)]
pub struct ExportResponse {
    /// Paths of the files written
    pub files: Vec<String>,
}

/// Request to change one field of a record.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    /// Feed field name, e.g. "route_long_name"
    pub field: String,
    /// New value, as it would appear in the feed file
    pub value: String,
}

/// Identifies a stop time by its stop and trip.
#[derive(Debug, Deserialize)]
pub struct StopTimeQuery {
    pub stop_id: String,
    pub trip_id: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
