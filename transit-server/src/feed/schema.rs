//! Feed file kinds, their field schemas, and header validation.

use std::fmt;

use super::error::SchemaError;
use super::tokenizer::split_record;

/// The required and optional field names governing one file kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// File name the schema applies to, used in error messages.
    pub file: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl Schema {
    /// Returns true if `field` is named by this schema.
    pub fn knows(&self, field: &str) -> bool {
        self.required.contains(&field) || self.optional.contains(&field)
    }

    /// Validate a header line against this schema.
    ///
    /// See [`validate_header`].
    pub fn validate(&self, header: &str) -> Result<FieldList, SchemaError> {
        validate_header(self.file, self.required, self.optional, header)
    }
}

pub const ROUTES: Schema = Schema {
    file: "routes.txt",
    required: &["route_id", "route_color"],
    optional: &[
        "route_short_name",
        "route_long_name",
        "route_desc",
        "route_type",
        "route_url",
        "route_text_color",
        "agency_id",
    ],
};

pub const STOPS: Schema = Schema {
    file: "stops.txt",
    required: &["stop_id", "stop_lat", "stop_lon", "stop_name"],
    optional: &["stop_desc"],
};

pub const TRIPS: Schema = Schema {
    file: "trips.txt",
    required: &["route_id", "trip_id"],
    optional: &[
        "trip_headsign",
        "direction_id",
        "block_id",
        "shape_id",
        "service_id",
    ],
};

pub const STOP_TIMES: Schema = Schema {
    file: "stop_times.txt",
    required: &["trip_id", "stop_id", "stop_sequence"],
    optional: &[
        "stop_headsign",
        "pickup_type",
        "drop_off_type",
        "arrival_time",
        "departure_time",
    ],
};

/// The four supported feed files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedFile {
    Routes,
    Stops,
    Trips,
    StopTimes,
}

impl FeedFile {
    /// All kinds, in the order tables are written on export.
    pub const ALL: [FeedFile; 4] = [
        FeedFile::Stops,
        FeedFile::StopTimes,
        FeedFile::Routes,
        FeedFile::Trips,
    ];

    /// Identify a feed file by its exact file name.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_server::feed::FeedFile;
    ///
    /// assert_eq!(FeedFile::from_file_name("stops.txt"), Some(FeedFile::Stops));
    /// assert_eq!(FeedFile::from_file_name("Stops.txt"), None);
    /// assert_eq!(FeedFile::from_file_name("agency.txt"), None);
    /// ```
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.file_name() == name)
    }

    /// The file name this kind is read from and written to.
    pub fn file_name(&self) -> &'static str {
        self.schema().file
    }

    pub fn schema(&self) -> &'static Schema {
        match self {
            FeedFile::Routes => &ROUTES,
            FeedFile::Stops => &STOPS,
            FeedFile::Trips => &TRIPS,
            FeedFile::StopTimes => &STOP_TIMES,
        }
    }
}

impl fmt::Display for FeedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// The ordered list of fields a header actually declared.
///
/// Once produced by [`validate_header`], the list governs how every data
/// line from the same file is read and how records are written back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldList(Vec<String>);

impl FieldList {
    /// Build a field list without validating it against a schema.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|f| f == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Validate a header line against a file's required and optional fields.
///
/// Fails if a required field is missing or if any header field is unknown.
/// On success, returns the header's fields in their original order.
///
/// # Examples
///
/// ```
/// use transit_server::feed::validate_header;
///
/// let fields = validate_header(
///     "stops.txt",
///     &["stop_id", "stop_name"],
///     &["stop_desc"],
///     "stop_desc,stop_name,stop_id",
/// )
/// .unwrap();
/// assert_eq!(fields.as_slice(), ["stop_desc", "stop_name", "stop_id"]);
///
/// // Unknown fields are rejected
/// assert!(validate_header("stops.txt", &["stop_id"], &[], "stop_id,stop_code").is_err());
/// ```
pub fn validate_header(
    file: &'static str,
    required: &[&'static str],
    optional: &[&'static str],
    header: &str,
) -> Result<FieldList, SchemaError> {
    let fields =
        split_record(header).map_err(|source| SchemaError::Tokenize { file, source })?;

    let missing: Vec<&'static str> = required
        .iter()
        .copied()
        .filter(|req| !fields.iter().any(|f| f == req))
        .collect();
    if !missing.is_empty() {
        return Err(SchemaError::MissingRequired { file, missing });
    }

    if let Some(unexpected) = fields
        .iter()
        .find(|f| !required.contains(&f.as_str()) && !optional.contains(&f.as_str()))
    {
        return Err(SchemaError::UnexpectedField {
            file,
            field: unexpected.clone(),
        });
    }

    Ok(FieldList(fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_route_header_is_valid() {
        let header = "route_id,agency_id,route_short_name,route_long_name,route_desc,route_type,route_url,route_color,route_text_color";
        let fields = ROUTES.validate(header).unwrap();
        assert_eq!(fields.len(), 9);
    }

    #[test]
    fn minimum_route_header_is_valid() {
        let fields = ROUTES.validate("route_id,route_color").unwrap();
        assert_eq!(fields.as_slice(), ["route_id", "route_color"]);
    }

    #[test]
    fn misspelled_field_is_rejected() {
        let header = "route_id,agency_id,route_short_name,route_long_nae,route_desc,route_type,route_url,route_color,route_text_color";
        assert_eq!(
            ROUTES.validate(header),
            Err(SchemaError::UnexpectedField {
                file: "routes.txt",
                field: "route_long_nae".into(),
            })
        );
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let header = "route_id,agency_id,route_short_name,route_long_name,route_desc,route_type,route_url,route_text_color";
        let err = ROUTES.validate(header).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingRequired {
                file: "routes.txt",
                missing: vec!["route_color"],
            }
        );
        assert!(err.to_string().contains("routes.txt"));
    }

    #[test]
    fn differently_ordered_stop_header_keeps_order() {
        let fields = STOPS
            .validate("stop_desc,stop_lon,stop_id,stop_lat,stop_name")
            .unwrap();
        assert_eq!(
            fields.as_slice(),
            ["stop_desc", "stop_lon", "stop_id", "stop_lat", "stop_name"]
        );
    }

    #[test]
    fn empty_header_is_rejected() {
        assert!(STOPS.validate("").is_err());
    }

    #[test]
    fn stop_times_header_with_all_fields() {
        let header = "trip_id,arrival_time,departure_time,stop_id,stop_sequence,stop_headsign,pickup_type,drop_off_type";
        let fields = STOP_TIMES.validate(header).unwrap();
        assert_eq!(fields.len(), 8);
        assert_eq!(
            fields.iter().filter(|f| !STOP_TIMES.required.contains(f)).count(),
            5
        );
    }

    #[test]
    fn stop_times_header_with_required_only() {
        let fields = STOP_TIMES.validate("trip_id,stop_id,stop_sequence").unwrap();
        assert_eq!(fields.as_slice(), ["trip_id", "stop_id", "stop_sequence"]);
    }

    #[test]
    fn quoted_header_fields_are_unquoted() {
        let fields = TRIPS.validate(r#""route_id","trip_id""#).unwrap();
        assert_eq!(fields.as_slice(), ["route_id", "trip_id"]);
    }

    #[test]
    fn unterminated_header_quote_is_rejected() {
        assert!(matches!(
            TRIPS.validate(r#"route_id,"trip_id"#),
            Err(SchemaError::Tokenize { file: "trips.txt", .. })
        ));
    }

    #[test]
    fn file_kind_lookup_is_exact() {
        assert_eq!(FeedFile::from_file_name("routes.txt"), Some(FeedFile::Routes));
        assert_eq!(FeedFile::from_file_name("trips.txt"), Some(FeedFile::Trips));
        assert_eq!(
            FeedFile::from_file_name("stop_times.txt"),
            Some(FeedFile::StopTimes)
        );
        assert_eq!(FeedFile::from_file_name("ROUTES.TXT"), None);
        assert_eq!(FeedFile::from_file_name("routes.csv"), None);
    }

    #[test]
    fn schema_knows_its_fields() {
        assert!(TRIPS.knows("shape_id"));
        assert!(TRIPS.knows("trip_id"));
        assert!(!TRIPS.knows("stop_id"));
    }
}
