//! Stop records from `stops.txt`.

use super::error::FieldError;
use super::record::{Keyed, Record, number, required};
use super::schema::{STOPS, Schema};

/// A place where vehicles pick up or drop off riders.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Record for Stop {
    const SCHEMA: &'static Schema = &STOPS;

    fn blank() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    fn assign(&mut self, field: &str, value: &str) -> Result<(), FieldError> {
        match field {
            "stop_id" => self.id = required("stop_id", value)?,
            "stop_name" => self.name = required("stop_name", value)?,
            "stop_desc" => self.description = value.to_string(),
            "stop_lat" => self.latitude = number("stop_lat", value)?,
            "stop_lon" => self.longitude = number("stop_lon", value)?,
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
            "stop_id" => self.id.clone(),
            "stop_name" => self.name.clone(),
            "stop_desc" => self.description.clone(),
            "stop_lat" => self.latitude.to_string(),
            "stop_lon" => self.longitude.to_string(),
            _ => String::new(),
        }
    }

    fn check_required(&self) -> Result<(), FieldError> {
        if self.id.is_empty() {
            return Err(FieldError::Required { field: "stop_id" });
        }
        if self.name.is_empty() {
            return Err(FieldError::Required { field: "stop_name" });
        }
        Ok(())
    }
}

impl Keyed for Stop {
    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FieldList;

    fn header() -> FieldList {
        FieldList::new(["stop_id", "stop_name", "stop_desc", "stop_lat", "stop_lon"])
    }

    #[test]
    fn valid_line() {
        let stop = Stop::parse(&header(), "1801,S92 & ORCHARD #1801,,43.0138967,-88.0272162").unwrap();
        assert_eq!(stop.id, "1801");
        assert_eq!(stop.name, "S92 & ORCHARD #1801");
        assert_eq!(stop.description, "");
        assert_eq!(stop.latitude, 43.0138967);
        assert_eq!(stop.longitude, -88.0272162);
    }

    #[test]
    fn too_few_values() {
        assert!(!Stop::is_valid_line(&header(), "1802,D33 & CHERRY #2366,22.1230221"));
    }

    #[test]
    fn empty_line() {
        assert!(!Stop::is_valid_line(&header(), ""));
    }

    #[test]
    fn required_text_fields() {
        assert!(!Stop::is_valid_line(&header(), ",Name,,1,2"));
        assert!(!Stop::is_valid_line(&header(), "1,,,1,2"));
    }

    #[test]
    fn coordinates_must_be_numbers() {
        assert!(!Stop::is_valid_line(&header(), "1,Name,,north,2"));
        assert!(!Stop::is_valid_line(&header(), "1,Name,,1,"));
    }

    #[test]
    fn to_line_follows_header_order() {
        let f = FieldList::new(["stop_lon", "stop_id", "stop_lat", "stop_name"]);
        let stop = Stop::parse(&f, "-88.5,7,43.25,\"Main, 1st\"").unwrap();
        assert_eq!(stop.to_line(&f), "-88.5,7,43.25,\"Main, 1st\"");
    }

    #[test]
    fn update_coordinates() {
        let mut stop = Stop::parse(&header(), "1,Name,,1,2").unwrap();
        stop.update_field("stop_lat", "44.5").unwrap();
        assert_eq!(stop.latitude, 44.5);
        assert!(stop.update_field("stop_lon", "east").is_err());
        assert_eq!(stop.longitude, 2.0);
    }
}
