//! Cross-table queries.
//!
//! Stop times are the only link between stops and trips, and they carry no
//! index of their own, so each query makes one pass over them and then walks
//! trips in table order. Results never contain duplicates and keep the order
//! in which entities were first reached.

use std::collections::{HashMap, HashSet};

use chrono::Duration;
use tracing::debug;

use super::notify::FeedItem;
use super::{TransitError, TransitStore};
use crate::feed::{FeedFile, Route, ServiceTime, Stop, StopTime, Trip};

/// Arrival time of a stop time, or `None` (logged) if it cannot be read.
fn arrival(st: &StopTime) -> Option<ServiceTime> {
    let time = st.arrival();
    if time.is_none() {
        debug!(
            trip_id = %st.trip_id,
            stop_id = %st.stop_id,
            arrival_time = %st.arrival_time,
            "ignoring stop time with unreadable arrival"
        );
    }
    time
}

impl TransitStore {
    /// Routes with at least one trip calling at `stop_id`.
    pub fn routes_containing_stop(&self, stop_id: &str) -> Vec<&Route> {
        let mut seen = HashSet::new();
        self.stop_times
            .iter()
            .filter(|st| st.stop_id == stop_id)
            .filter_map(|st| self.trips.get(&st.trip_id))
            .filter_map(|trip| self.routes.get(&trip.route_id))
            .filter(|route| seen.insert(route.id.as_str()))
            .collect()
    }

    /// Stops called at by any trip of `route_id`.
    ///
    /// Trips are visited in table order and each trip's stops in stop-time
    /// order.
    pub fn stops_on_route(&self, route_id: &str) -> Vec<&Stop> {
        let mut calls: HashMap<&str, Vec<&str>> = self
            .trips
            .iter()
            .filter(|trip| trip.route_id == route_id)
            .map(|trip| (trip.id.as_str(), Vec::new()))
            .collect();
        for st in self.stop_times.iter() {
            if let Some(stops) = calls.get_mut(st.trip_id.as_str()) {
                stops.push(&st.stop_id);
            }
        }

        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for trip in self.trips.iter().filter(|trip| trip.route_id == route_id) {
            for stop_id in &calls[trip.id.as_str()] {
                if let Some(stop) = self.stops.get(stop_id)
                    && seen.insert(stop.id.as_str())
                {
                    result.push(stop);
                }
            }
        }
        result
    }

    /// Trips of `route_id` that still have an arrival at or after the
    /// current local time.
    pub fn future_trips_on_route(&self, route_id: &str) -> Vec<&Trip> {
        self.future_trips_on_route_at(route_id, ServiceTime::now())
    }

    /// Trips of `route_id` with any arrival not earlier than `now`.
    pub fn future_trips_on_route_at(&self, route_id: &str, now: ServiceTime) -> Vec<&Trip> {
        let running: HashSet<&str> = self
            .stop_times
            .iter()
            .filter(|st| arrival(st).is_some_and(|t| now.duration_until(t) >= Duration::zero()))
            .map(|st| st.trip_id.as_str())
            .collect();

        self.trips
            .iter()
            .filter(|trip| trip.route_id == route_id && running.contains(trip.id.as_str()))
            .collect()
    }

    /// The next trip to arrive at `stop_id` for each route serving it, as of
    /// the current local time.
    pub fn upcoming_trips(&self, stop_id: &str) -> Vec<&Trip> {
        self.upcoming_trips_at(stop_id, ServiceTime::now())
    }

    /// The next trip to arrive at `stop_id` for each route serving it.
    ///
    /// For every route, trips are examined in table order and the one with
    /// the smallest non-negative wait from `now` wins; on a tie the later
    /// trip replaces the earlier. Routes whose trips have all passed the
    /// stop are left out, so there is at most one trip per route.
    pub fn upcoming_trips_at(&self, stop_id: &str, now: ServiceTime) -> Vec<&Trip> {
        let mut arrivals: HashMap<&str, Vec<ServiceTime>> = HashMap::new();
        for st in self.stop_times.iter().filter(|st| st.stop_id == stop_id) {
            if let Some(time) = arrival(st) {
                arrivals.entry(st.trip_id.as_str()).or_default().push(time);
            }
        }

        let mut result = Vec::new();
        for route in self.routes_containing_stop(stop_id) {
            let mut best: Option<(&Trip, Duration)> = None;
            for trip in self.trips.iter().filter(|trip| trip.route_id == route.id) {
                let Some(times) = arrivals.get(trip.id.as_str()) else {
                    continue;
                };
                for &time in times {
                    let wait = now.duration_until(time);
                    if wait < Duration::zero() {
                        continue;
                    }
                    if best.is_none_or(|(_, soonest)| wait <= soonest) {
                        best = Some((trip, wait));
                    }
                }
            }
            if let Some((trip, wait)) = best {
                debug!(route_id = %route.id, trip_id = %trip.id, wait_secs = wait.num_seconds(), "next trip");
                result.push(trip);
            }
        }
        result
    }

    /// Look up a stop and everything that serves it, and show the result
    /// to subscribers.
    ///
    /// The payload is the stop, then a heading and the routes serving it,
    /// then a heading and the next trip of each of those routes.
    pub fn search_by_stop(&mut self, stop_id: &str) -> Result<Vec<FeedItem>, TransitError> {
        self.search_by_stop_at(stop_id, ServiceTime::now())
    }

    pub fn search_by_stop_at(
        &mut self,
        stop_id: &str,
        now: ServiceTime,
    ) -> Result<Vec<FeedItem>, TransitError> {
        let stop = self.stop(stop_id).ok_or_else(|| TransitError::UnknownEntity {
            kind: FeedFile::Stops,
            id: stop_id.to_string(),
        })?;

        let mut items = vec![FeedItem::Stop(stop.clone())];
        items.push(FeedItem::section(format!("All Routes containing stop {}", stop.id)));
        items.extend(
            self.routes_containing_stop(stop_id)
                .into_iter()
                .cloned()
                .map(FeedItem::Route),
        );
        items.push(FeedItem::section(format!("Upcoming Trips for stop {}", stop.id)));
        items.extend(
            self.upcoming_trips_at(stop_id, now)
                .into_iter()
                .cloned()
                .map(FeedItem::Trip),
        );

        self.notify_subscribers(&items);
        Ok(items)
    }

    /// Look up a route with its stops and remaining trips, and show the
    /// result to subscribers.
    pub fn search_by_route(&mut self, route_id: &str) -> Result<Vec<FeedItem>, TransitError> {
        self.search_by_route_at(route_id, ServiceTime::now())
    }

    pub fn search_by_route_at(
        &mut self,
        route_id: &str,
        now: ServiceTime,
    ) -> Result<Vec<FeedItem>, TransitError> {
        let route = self.route(route_id).ok_or_else(|| TransitError::UnknownEntity {
            kind: FeedFile::Routes,
            id: route_id.to_string(),
        })?;

        let mut items = vec![FeedItem::Route(route.clone())];
        items.push(FeedItem::section(format!("All stops on route {}:", route.id)));
        items.extend(
            self.stops_on_route(route_id)
                .into_iter()
                .cloned()
                .map(FeedItem::Stop),
        );
        items.push(FeedItem::section(format!("All future trips on route {}:", route.id)));
        items.extend(
            self.future_trips_on_route_at(route_id, now)
                .into_iter()
                .cloned()
                .map(FeedItem::Trip),
        );

        self.notify_subscribers(&items);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SubscriberError;
    use std::sync::{Arc, Mutex};

    /// Two routes sharing stop B.
    ///
    /// Route R1: trips T1 (A 08:00, B 08:10) and T2 (A 09:00, B 09:10).
    /// Route R2: trip T3 (B 08:30, C 08:40).
    /// Route R3: no trips.
    fn store() -> TransitStore {
        let mut store = TransitStore::new();
        let feed = [
            (
                FeedFile::Routes,
                "route_id,route_color\nR1,FF0000\nR2,00FF00\nR3,0000FF\n",
            ),
            (
                FeedFile::Stops,
                "stop_id,stop_name,stop_lat,stop_lon\nA,Alpha,1,1\nB,Bravo,2,2\nC,Charlie,3,3\n",
            ),
            (
                FeedFile::Trips,
                "route_id,trip_id\nR1,T1\nR1,T2\nR2,T3\n",
            ),
            (
                FeedFile::StopTimes,
                "trip_id,stop_id,stop_sequence,arrival_time\n\
                 T1,A,1,08:00:00\n\
                 T1,B,2,08:10:00\n\
                 T3,B,1,08:30:00\n\
                 T3,C,2,08:40:00\n\
                 T2,A,1,09:00:00\n\
                 T2,B,2,09:10:00\n",
            ),
        ];
        for (kind, text) in feed {
            store.import_from_reader(kind, text.as_bytes()).unwrap();
        }
        store
    }

    fn ids<'a, T: 'a>(items: impl IntoIterator<Item = &'a T>, id: impl Fn(&T) -> &str) -> Vec<String> {
        items.into_iter().map(|t| id(t).to_string()).collect()
    }

    #[test]
    fn routes_containing_stop_deduplicates() {
        let store = store();
        assert_eq!(ids(store.routes_containing_stop("B"), |r| r.id.as_str()), ["R1", "R2"]);
        assert_eq!(ids(store.routes_containing_stop("A"), |r| r.id.as_str()), ["R1"]);
        assert!(store.routes_containing_stop("Z").is_empty());
    }

    #[test]
    fn stops_on_route_in_first_seen_order() {
        let store = store();
        assert_eq!(ids(store.stops_on_route("R1"), |s| s.id.as_str()), ["A", "B"]);
        assert_eq!(ids(store.stops_on_route("R2"), |s| s.id.as_str()), ["B", "C"]);
        assert!(store.stops_on_route("R3").is_empty());
    }

    #[test]
    fn dangling_references_are_ignored() {
        let mut store = store();
        store
            .import_from_reader(
                FeedFile::StopTimes,
                "trip_id,stop_id,stop_sequence\nT1,A,1\nT1,GHOST,2\nGHOST,A,1\n".as_bytes(),
            )
            .unwrap();
        assert_eq!(ids(store.stops_on_route("R1"), |s| s.id.as_str()), ["A"]);
        assert_eq!(ids(store.routes_containing_stop("A"), |r| r.id.as_str()), ["R1"]);
    }

    #[test]
    fn future_trips_include_exact_arrival() {
        let store = store();
        let at = |h, m| ServiceTime::from_hms(h, m, 0);
        assert_eq!(ids(store.future_trips_on_route_at("R1", at(7, 0)), |t| t.id.as_str()), ["T1", "T2"]);
        assert_eq!(ids(store.future_trips_on_route_at("R1", at(8, 10)), |t| t.id.as_str()), ["T1", "T2"]);
        assert_eq!(ids(store.future_trips_on_route_at("R1", at(8, 11)), |t| t.id.as_str()), ["T2"]);
        assert!(store.future_trips_on_route_at("R1", at(9, 11)).is_empty());
    }

    #[test]
    fn upcoming_trips_one_per_route() {
        let store = store();
        let at = |h, m| ServiceTime::from_hms(h, m, 0);

        assert_eq!(ids(store.upcoming_trips_at("B", at(8, 0)), |t| t.id.as_str()), ["T1", "T3"]);
        assert_eq!(ids(store.upcoming_trips_at("B", at(8, 20)), |t| t.id.as_str()), ["T2", "T3"]);
        assert_eq!(ids(store.upcoming_trips_at("B", at(8, 45)), |t| t.id.as_str()), ["T2"]);
        assert!(store.upcoming_trips_at("B", at(10, 0)).is_empty());
    }

    #[test]
    fn upcoming_trips_tie_goes_to_later_trip() {
        let mut store = store();
        store
            .import_from_reader(
                FeedFile::StopTimes,
                "trip_id,stop_id,stop_sequence,arrival_time\nT1,B,1,08:10:00\nT2,B,1,08:10:00\n"
                    .as_bytes(),
            )
            .unwrap();
        let trips = store.upcoming_trips_at("B", ServiceTime::from_hms(8, 0, 0));
        assert_eq!(ids(trips, |t| t.id.as_str()), ["T2"]);
    }

    #[test]
    fn unreadable_times_are_skipped() {
        let mut store = store();
        store
            .import_from_reader(
                FeedFile::StopTimes,
                "trip_id,stop_id,stop_sequence,arrival_time\nT1,B,1,soon\nT2,B,1,\nT3,B,1,23:00:00\n"
                    .as_bytes(),
            )
            .unwrap();
        let now = ServiceTime::from_hms(8, 0, 0);
        assert_eq!(ids(store.upcoming_trips_at("B", now), |t| t.id.as_str()), ["T3"]);
        assert!(store.future_trips_on_route_at("R1", now).is_empty());
    }

    #[test]
    fn post_midnight_arrivals_are_upcoming() {
        let mut store = store();
        store
            .import_from_reader(
                FeedFile::StopTimes,
                "trip_id,stop_id,stop_sequence,arrival_time\nT1,B,1,24:30:00\n".as_bytes(),
            )
            .unwrap();
        let now = ServiceTime::from_hms(23, 50, 0);
        assert_eq!(ids(store.upcoming_trips_at("B", now), |t| t.id.as_str()), ["T1"]);
    }

    #[test]
    fn search_by_stop_payload_and_notification() {
        let mut store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |items: &[FeedItem]| -> Result<(), SubscriberError> {
            sink.lock().unwrap().push(items.to_vec());
            Ok(())
        });

        let items = store
            .search_by_stop_at("B", ServiceTime::from_hms(8, 20, 0))
            .unwrap();
        let text: Vec<String> = items.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            text,
            [
                "Stop B",
                "All Routes containing stop B",
                "Route R1",
                "Route R2",
                "Upcoming Trips for stop B",
                "Trip T2",
                "Trip T3",
            ]
        );
        assert_eq!(seen.lock().unwrap().last(), Some(&items));

        assert!(matches!(
            store.search_by_stop("nowhere"),
            Err(TransitError::UnknownEntity { kind: FeedFile::Stops, .. })
        ));
    }

    #[test]
    fn search_by_route_payload() {
        let mut store = store();
        let items = store
            .search_by_route_at("R1", ServiceTime::from_hms(8, 30, 0))
            .unwrap();
        let text: Vec<String> = items.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            text,
            [
                "Route R1",
                "All stops on route R1:",
                "Stop A",
                "Stop B",
                "All future trips on route R1:",
                "Trip T2",
            ]
        );
        assert!(store.search_by_route("R404").unwrap_err().is_not_found());
    }
}
