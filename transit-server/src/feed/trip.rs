//! Trip records from `trips.txt`.

use std::fmt;

use super::error::FieldError;
use super::record::{Keyed, Record, integer_or_default, required};
use super::schema::{Schema, TRIPS};

/// Which way a trip travels along its route.
///
/// The feed only distinguishes two directions; their meaning is up to the
/// agency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Outbound,
    Inbound,
}

impl Direction {
    /// Parse the feed's `direction_id` code (0 or 1).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Direction::Outbound),
            1 => Some(Direction::Inbound),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Direction::Outbound => 0,
            Direction::Inbound => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One run of a vehicle along a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    pub headsign: String,
    pub direction: Direction,
    pub block_id: String,
    pub shape_id: String,
}

impl Record for Trip {
    const SCHEMA: &'static Schema = &TRIPS;

    fn blank() -> Self {
        Self {
            id: String::new(),
            route_id: String::new(),
            service_id: String::new(),
            headsign: String::new(),
            direction: Direction::default(),
            block_id: String::new(),
            shape_id: String::new(),
        }
    }

    fn assign(&mut self, field: &str, value: &str) -> Result<(), FieldError> {
        match field {
            "trip_id" => self.id = required("trip_id", value)?,
            "route_id" => self.route_id = required("route_id", value)?,
            "service_id" => self.service_id = value.to_string(),
            "trip_headsign" => self.headsign = value.to_string(),
            "direction_id" => {
                let code = integer_or_default("direction_id", value)?;
                self.direction = Direction::from_code(code).ok_or_else(|| FieldError::Code {
                    field: "direction_id",
                    value: value.to_string(),
                    allowed: "0 or 1",
                })?;
            }
            "block_id" => self.block_id = value.to_string(),
            "shape_id" => self.shape_id = value.to_string(),
            _ => {
                return Err(FieldError::Unknown {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    fn field_text(&self, field: &str) -> String {
        match field {
            "trip_id" => self.id.clone(),
            "route_id" => self.route_id.clone(),
            "service_id" => self.service_id.clone(),
            "trip_headsign" => self.headsign.clone(),
            "direction_id" => self.direction.to_string(),
            "block_id" => self.block_id.clone(),
            "shape_id" => self.shape_id.clone(),
            _ => String::new(),
        }
    }

    fn check_required(&self) -> Result<(), FieldError> {
        if self.id.is_empty() {
            return Err(FieldError::Required { field: "trip_id" });
        }
        if self.route_id.is_empty() {
            return Err(FieldError::Required { field: "route_id" });
        }
        Ok(())
    }
}

impl Keyed for Trip {
    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FieldList;

    fn header() -> FieldList {
        FieldList::new([
            "route_id",
            "service_id",
            "trip_id",
            "trip_headsign",
            "direction_id",
            "block_id",
            "shape_id",
        ])
    }

    #[test]
    fn valid_line() {
        let trip = Trip::parse(&header(), "64,17-SEP_SUN,21736564_2535,60TH-VLIET,0,64102,17-SEP_64_0_23").unwrap();
        assert_eq!(trip.route_id, "64");
        assert_eq!(trip.id, "21736564_2535");
        assert_eq!(trip.headsign, "60TH-VLIET");
        assert_eq!(trip.direction, Direction::Outbound);
        assert_eq!(trip.shape_id, "17-SEP_64_0_23");
    }

    #[test]
    fn direction_defaults_when_empty() {
        let trip = Trip::parse(&header(), "64,svc,t1,,,,").unwrap();
        assert_eq!(trip.direction, Direction::Outbound);
        assert_eq!(trip.direction.code(), 0);
    }

    #[test]
    fn direction_must_be_zero_or_one() {
        assert_eq!(
            Trip::parse(&header(), "64,svc,t1,,1,,").unwrap().direction,
            Direction::Inbound
        );
        assert!(!Trip::is_valid_line(&header(), "64,svc,t1,,2,,"));
        assert!(!Trip::is_valid_line(&header(), "64,svc,t1,,east,,"));
    }

    #[test]
    fn required_ids() {
        assert!(!Trip::is_valid_line(&header(), ",svc,t1,,0,,"));
        assert!(!Trip::is_valid_line(&header(), "64,svc,,,0,,"));
    }

    #[test]
    fn minimal_header() {
        let f = FieldList::new(["route_id", "trip_id"]);
        let trip = Trip::parse(&f, "R1,T1").unwrap();
        assert_eq!(trip.to_line(&f), "R1,T1");
    }

    #[test]
    fn to_line_writes_direction_code() {
        let line = "64,svc,t1,\"North, then West\",1,b,s";
        let trip = Trip::parse(&header(), line).unwrap();
        assert_eq!(trip.to_line(&header()), line);
    }
}
