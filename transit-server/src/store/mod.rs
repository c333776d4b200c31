//! The in-memory transit store.
//!
//! [`TransitStore`] owns one table per feed file, imports and exports those
//! files, answers point lookups and cross-table queries, and tells its
//! subscribers when something worth showing has changed.
//!
//! The store is a plain value with no internal locking. Callers that share
//! it between threads wrap it in a single mutex (see [`crate::web`]).

mod error;
mod notify;
mod query;
mod table;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use tracing::{debug, info};

use crate::feed::{FeedFile, FieldList, Keyed, Record, Route, SchemaError, Stop, StopTime, Trip};

pub use error::TransitError;
pub use notify::{FeedItem, Subscriber, SubscriberError, SubscriberId, Subscribers};
pub use table::{KeyedTable, RekeyError, Table};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Outcome of importing one feed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub kind: FeedFile,
    /// Data lines that produced a record.
    pub imported: usize,
    /// Data lines that were malformed and dropped.
    pub skipped: usize,
}

/// Suggested centre for a map of all stops.
///
/// This is a running average where each new stop moves the centre halfway
/// towards itself, so later stops weigh more than earlier ones. It is not
/// the arithmetic mean of all stop positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCenter {
    pub latitude: f64,
    pub longitude: f64,
}

impl MapCenter {
    fn seed(stop: &Stop) -> Self {
        Self {
            latitude: stop.latitude,
            longitude: stop.longitude,
        }
    }

    fn blend(self, stop: &Stop) -> Self {
        Self {
            latitude: (self.latitude + stop.latitude) / 2.0,
            longitude: (self.longitude + stop.longitude) / 2.0,
        }
    }
}

/// All routes, stops, trips and stop times of one feed.
#[derive(Debug, Default)]
pub struct TransitStore {
    routes: KeyedTable<Route>,
    stops: KeyedTable<Stop>,
    trips: KeyedTable<Trip>,
    stop_times: Table<StopTime>,
    map_center: Option<MapCenter>,
    subscribers: Subscribers,
}

impl TransitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import one feed file, replacing the table it belongs to.
    ///
    /// The file kind is chosen by exact file name. A header that does not
    /// match its schema aborts the import and leaves the table empty;
    /// malformed data lines are skipped and counted in the report.
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<ImportReport, TransitError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let kind = FeedFile::from_file_name(name).ok_or_else(|| TransitError::UnsupportedFile {
            name: name.to_string(),
        })?;

        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TransitError::NotFound {
                path: path.to_path_buf(),
            },
            _ => TransitError::io(path.display().to_string(), e),
        })?;

        let report = self.import_from_reader(kind, BufReader::new(file))?;
        info!(
            file = %path.display(),
            imported = report.imported,
            skipped = report.skipped,
            "imported feed file"
        );
        Ok(report)
    }

    /// Import feed data of a known kind from any line source.
    pub fn import_from_reader<R: BufRead>(
        &mut self,
        kind: FeedFile,
        reader: R,
    ) -> Result<ImportReport, TransitError> {
        self.clear_table(kind);

        let file = kind.file_name();
        let mut lines = reader.split(b'\n');
        let header = match lines.next() {
            Some(line) => {
                let line = line.map_err(|e| TransitError::io(file, e))?;
                decode_line(line)
                    .map_err(|e| TransitError::io(file, io::Error::new(ErrorKind::InvalidData, e)))?
            }
            None => return Err(SchemaError::MissingHeader { file }.into()),
        };
        let header = header.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&header);
        let fields = kind.schema().validate(header)?;

        // Rows go into a fresh table that replaces the old one only once the
        // whole file has been read.
        let (imported, skipped) = match kind {
            FeedFile::Routes => {
                let mut routes = KeyedTable::default();
                routes.set_header(header, fields.clone());
                let counts = read_rows(lines, &fields, |route: Route| {
                    routes.insert(route);
                })?;
                self.routes = routes;
                counts
            }
            FeedFile::Stops => {
                let mut stops = KeyedTable::default();
                stops.set_header(header, fields.clone());
                let mut center: Option<MapCenter> = None;
                let counts = read_rows(lines, &fields, |stop: Stop| {
                    center = Some(match center {
                        None => MapCenter::seed(&stop),
                        Some(c) => c.blend(&stop),
                    });
                    stops.insert(stop);
                })?;
                self.stops = stops;
                self.map_center = center;
                counts
            }
            FeedFile::Trips => {
                let mut trips = KeyedTable::default();
                trips.set_header(header, fields.clone());
                let counts = read_rows(lines, &fields, |trip: Trip| {
                    trips.insert(trip);
                })?;
                self.trips = trips;
                counts
            }
            FeedFile::StopTimes => {
                let mut stop_times = Table::default();
                stop_times.set_header(header, fields.clone());
                let counts = read_rows(lines, &fields, |st: StopTime| {
                    stop_times.push(st);
                })?;
                self.stop_times = stop_times;
                counts
            }
        };

        if kind == FeedFile::Routes {
            self.refresh_subscribers();
        }

        Ok(ImportReport {
            kind,
            imported,
            skipped,
        })
    }

    fn clear_table(&mut self, kind: FeedFile) {
        match kind {
            FeedFile::Routes => self.routes.clear(),
            FeedFile::Stops => {
                self.stops.clear();
                self.map_center = None;
            }
            FeedFile::Trips => self.trips.clear(),
            FeedFile::StopTimes => self.stop_times.clear(),
        }
    }

    /// Write every non-empty table into `dir`, one file per table.
    ///
    /// Returns the paths written. A failure part way through leaves the
    /// files already written in place.
    pub fn export(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, TransitError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Err(TransitError::NotADirectory {
                path: dir.to_path_buf(),
                reason: "directory does not exist",
            });
        }
        if !dir.is_dir() {
            return Err(TransitError::NotADirectory {
                path: dir.to_path_buf(),
                reason: "not a directory",
            });
        }

        let mut written = Vec::new();
        for kind in FeedFile::ALL {
            if self.table_len(kind) == 0 {
                continue;
            }
            let path = dir.join(kind.file_name());
            self.export_table(kind, &path)?;
            written.push(path);
        }
        info!(dir = %dir.display(), files = written.len(), "exported feed");
        Ok(written)
    }

    /// Write one table to `path`, replacing any existing file.
    pub fn export_table(&self, kind: FeedFile, path: impl AsRef<Path>) -> Result<(), TransitError> {
        let path = path.as_ref();
        match kind {
            FeedFile::Routes => write_table(self.routes.as_table(), kind, path),
            FeedFile::Stops => write_table(self.stops.as_table(), kind, path),
            FeedFile::Trips => write_table(self.trips.as_table(), kind, path),
            FeedFile::StopTimes => write_table(&self.stop_times, kind, path),
        }
    }

    pub fn export_routes(&self, path: impl AsRef<Path>) -> Result<(), TransitError> {
        self.export_table(FeedFile::Routes, path)
    }

    pub fn export_stops(&self, path: impl AsRef<Path>) -> Result<(), TransitError> {
        self.export_table(FeedFile::Stops, path)
    }

    pub fn export_trips(&self, path: impl AsRef<Path>) -> Result<(), TransitError> {
        self.export_table(FeedFile::Trips, path)
    }

    pub fn export_stop_times(&self, path: impl AsRef<Path>) -> Result<(), TransitError> {
        self.export_table(FeedFile::StopTimes, path)
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.stops.get(id)
    }

    pub fn trip(&self, id: &str) -> Option<&Trip> {
        self.trips.get(id)
    }

    /// The first stop time for this stop and trip, in import order.
    pub fn stop_time(&self, stop_id: &str, trip_id: &str) -> Option<&StopTime> {
        self.stop_times
            .find(|st| st.stop_id == stop_id && st.trip_id == trip_id)
    }

    pub fn has_routes(&self) -> bool {
        !self.routes.is_empty()
    }

    pub fn has_stops(&self) -> bool {
        !self.stops.is_empty()
    }

    pub fn has_trips(&self) -> bool {
        !self.trips.is_empty()
    }

    pub fn has_stop_times(&self) -> bool {
        !self.stop_times.is_empty()
    }

    pub fn routes(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    pub fn stops(&self) -> std::slice::Iter<'_, Stop> {
        self.stops.iter()
    }

    pub fn trips(&self) -> std::slice::Iter<'_, Trip> {
        self.trips.iter()
    }

    pub fn stop_times(&self) -> std::slice::Iter<'_, StopTime> {
        self.stop_times.iter()
    }

    /// Number of records held for a file kind.
    pub fn table_len(&self, kind: FeedFile) -> usize {
        match kind {
            FeedFile::Routes => self.routes.len(),
            FeedFile::Stops => self.stops.len(),
            FeedFile::Trips => self.trips.len(),
            FeedFile::StopTimes => self.stop_times.len(),
        }
    }

    /// The field list a table was imported with.
    pub fn fields(&self, kind: FeedFile) -> &FieldList {
        match kind {
            FeedFile::Routes => self.routes.fields(),
            FeedFile::Stops => self.stops.fields(),
            FeedFile::Trips => self.trips.fields(),
            FeedFile::StopTimes => self.stop_times.fields(),
        }
    }

    /// Where to centre a map of all stops, once stops are imported.
    pub fn map_center(&self) -> Option<MapCenter> {
        self.map_center
    }

    pub fn mean_latitude(&self) -> Option<f64> {
        self.map_center.map(|c| c.latitude)
    }

    pub fn mean_longitude(&self) -> Option<f64> {
        self.map_center.map(|c| c.longitude)
    }

    /// Edit one field of a route.
    ///
    /// Changing `route_id` moves the route to its new key; an id already
    /// used by another route is refused. On any error the route is left
    /// unchanged.
    pub fn update_route(&mut self, id: &str, field: &str, value: &str) -> Result<(), TransitError> {
        update_keyed(&mut self.routes, FeedFile::Routes, id, field, value)
    }

    pub fn update_stop(&mut self, id: &str, field: &str, value: &str) -> Result<(), TransitError> {
        update_keyed(&mut self.stops, FeedFile::Stops, id, field, value)
    }

    pub fn update_trip(&mut self, id: &str, field: &str, value: &str) -> Result<(), TransitError> {
        update_keyed(&mut self.trips, FeedFile::Trips, id, field, value)
    }

    /// Edit one field of the first stop time for this stop and trip.
    pub fn update_stop_time(
        &mut self,
        stop_id: &str,
        trip_id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), TransitError> {
        let st = self
            .stop_times
            .find_mut(|st| st.stop_id == stop_id && st.trip_id == trip_id)
            .ok_or_else(|| TransitError::UnknownEntity {
                kind: FeedFile::StopTimes,
                id: format!("{trip_id}/{stop_id}"),
            })?;
        st.update_field(field, value)
            .map_err(|e| TransitError::field(FeedFile::StopTimes, e))?;
        debug!(trip_id, stop_id, field, "updated stop time");
        Ok(())
    }

    /// Register a subscriber, priming it with the current route list.
    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) -> SubscriberId {
        let priming: Vec<FeedItem> = self.routes().cloned().map(FeedItem::Route).collect();
        self.subscribers.add(Box::new(subscriber), &priming)
    }

    /// Returns false if the subscriber was not registered.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.subscribers.remove(id)
    }

    /// Deliver `items` to every subscriber, returning the number that failed.
    pub fn notify_subscribers(&mut self, items: &[FeedItem]) -> usize {
        self.subscribers.notify(items)
    }

    /// Send the full route list to every subscriber.
    pub fn refresh_subscribers(&mut self) {
        let mut items = vec![FeedItem::section("All Routes:")];
        items.extend(self.routes.iter().cloned().map(FeedItem::Route));
        self.subscribers.notify(&items);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// Parse every remaining line, handing valid records to `accept`.
///
/// Returns how many lines were accepted and how many were skipped.
fn read_rows<T, I>(
    lines: I,
    fields: &FieldList,
    mut accept: impl FnMut(T),
) -> Result<(usize, usize), TransitError>
where
    T: Record,
    I: Iterator<Item = io::Result<Vec<u8>>>,
{
    let file = T::SCHEMA.file;
    let (mut imported, mut skipped) = (0, 0);
    // Line 1 is the header
    for (n, line) in lines.enumerate() {
        let line = line.map_err(|e| TransitError::io(file, e))?;
        let line = match decode_line(line) {
            Ok(line) => line,
            Err(e) => {
                debug!(file, line = n + 2, error = %e, "skipping line that is not UTF-8");
                skipped += 1;
                continue;
            }
        };
        match T::parse(fields, &line) {
            Ok(record) => {
                accept(record);
                imported += 1;
            }
            Err(e) => {
                debug!(file, line = n + 2, error = %e, "skipping malformed line");
                skipped += 1;
            }
        }
    }
    Ok((imported, skipped))
}

/// Decode one raw line, dropping a trailing carriage return.
fn decode_line(mut bytes: Vec<u8>) -> Result<String, FromUtf8Error> {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    String::from_utf8(bytes)
}

fn write_table<T: Record>(table: &Table<T>, kind: FeedFile, path: &Path) -> Result<(), TransitError> {
    if table.is_empty() {
        return Err(TransitError::EmptyTable { kind });
    }
    let context = || path.display().to_string();
    let file = File::create(path).map_err(|e| TransitError::io(context(), e))?;
    let mut out = BufWriter::new(file);
    table
        .write_to(&mut out)
        .and_then(|()| out.flush())
        .map_err(|e| TransitError::io(context(), e))?;
    debug!(file = %path.display(), rows = table.len(), "wrote table");
    Ok(())
}

fn update_keyed<T>(
    table: &mut KeyedTable<T>,
    kind: FeedFile,
    id: &str,
    field: &str,
    value: &str,
) -> Result<(), TransitError>
where
    T: Record + Keyed + Clone,
{
    let unknown = || TransitError::UnknownEntity {
        kind,
        id: id.to_string(),
    };
    let mut record = table.get(id).cloned().ok_or_else(unknown)?;
    record
        .update_field(field, value)
        .map_err(|e| TransitError::field(kind, e))?;
    table.replace(id, record).map_err(|e| match e {
        RekeyError::Missing => unknown(),
        RekeyError::Taken => TransitError::KeyConflict {
            kind,
            id: value.to_string(),
            reason: "id already in use",
        },
    })?;
    debug!(%kind, id, field, "updated record");
    Ok(())
}
