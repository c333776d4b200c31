//! Stop-time records from `stop_times.txt`.

use std::fmt;

use super::error::FieldError;
use super::record::{Record, integer, integer_or_default, required};
use super::schema::{STOP_TIMES, Schema};
use super::time::ServiceTime;

/// How riders may board or alight at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoardingType {
    /// Regularly scheduled (code 0).
    #[default]
    Regular,
    /// Not available (code 1).
    NotAvailable,
    /// Must phone the agency (code 2).
    PhoneAgency,
    /// Must coordinate with the driver (code 3).
    CoordinateWithDriver,
}

impl BoardingType {
    /// Parse a pickup or drop-off code (0-3).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(BoardingType::Regular),
            1 => Some(BoardingType::NotAvailable),
            2 => Some(BoardingType::PhoneAgency),
            3 => Some(BoardingType::CoordinateWithDriver),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            BoardingType::Regular => 0,
            BoardingType::NotAvailable => 1,
            BoardingType::PhoneAgency => 2,
            BoardingType::CoordinateWithDriver => 3,
        }
    }
}

impl fmt::Display for BoardingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A scheduled visit of one trip to one stop.
///
/// Arrival and departure times are kept as written: they are not checked
/// on import, only when edited (see [`Record::check_update`]) and when a
/// time-relative query reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub stop_sequence: u32,
    pub arrival_time: String,
    pub departure_time: String,
    pub stop_headsign: String,
    pub pickup_type: BoardingType,
    pub drop_off_type: BoardingType,
}

impl StopTime {
    /// The arrival time, if it is a readable time.
    pub fn arrival(&self) -> Option<ServiceTime> {
        ServiceTime::parse(&self.arrival_time).ok()
    }

    /// The departure time, if it is a readable time.
    pub fn departure(&self) -> Option<ServiceTime> {
        ServiceTime::parse(&self.departure_time).ok()
    }
}

fn boarding_type(field: &'static str, value: &str) -> Result<BoardingType, FieldError> {
    let code = integer_or_default(field, value)?;
    BoardingType::from_code(code).ok_or_else(|| FieldError::Code {
        field,
        value: value.to_string(),
        allowed: "0, 1, 2 or 3",
    })
}

impl Record for StopTime {
    const SCHEMA: &'static Schema = &STOP_TIMES;

    fn blank() -> Self {
        Self {
            trip_id: String::new(),
            stop_id: String::new(),
            stop_sequence: 0,
            arrival_time: String::new(),
            departure_time: String::new(),
            stop_headsign: String::new(),
            pickup_type: BoardingType::default(),
            drop_off_type: BoardingType::default(),
        }
    }

    fn assign(&mut self, field: &str, value: &str) -> Result<(), FieldError> {
        match field {
            "trip_id" => self.trip_id = required("trip_id", value)?,
            "stop_id" => self.stop_id = required("stop_id", value)?,
            "stop_sequence" => self.stop_sequence = integer("stop_sequence", value)?,
            "arrival_time" => self.arrival_time = value.to_string(),
            "departure_time" => self.departure_time = value.to_string(),
            "stop_headsign" => self.stop_headsign = value.to_string(),
            "pickup_type" => self.pickup_type = boarding_type("pickup_type", value)?,
            "drop_off_type" => self.drop_off_type = boarding_type("drop_off_type", value)?,
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
            "trip_id" => self.trip_id.clone(),
            "stop_id" => self.stop_id.clone(),
            "stop_sequence" => self.stop_sequence.to_string(),
            "arrival_time" => self.arrival_time.clone(),
            "departure_time" => self.departure_time.clone(),
            "stop_headsign" => self.stop_headsign.clone(),
            "pickup_type" => self.pickup_type.to_string(),
            "drop_off_type" => self.drop_off_type.to_string(),
            _ => String::new(),
        }
    }

    fn check_required(&self) -> Result<(), FieldError> {
        if self.trip_id.is_empty() {
            return Err(FieldError::Required { field: "trip_id" });
        }
        if self.stop_id.is_empty() {
            return Err(FieldError::Required { field: "stop_id" });
        }
        Ok(())
    }

    fn check_update(field: &str, value: &str) -> Result<(), FieldError> {
        let field = match field {
            "arrival_time" => "arrival_time",
            "departure_time" => "departure_time",
            _ => return Ok(()),
        };
        ServiceTime::parse_hms(value).map_err(|_| FieldError::Time {
            field,
            value: value.to_string(),
        })?;
        Ok(())
    }
}
