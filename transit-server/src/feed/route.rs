//! Route records from `routes.txt`.

use std::fmt;

use url::Url;

use super::color::RouteColor;
use super::error::FieldError;
use super::record::{Keyed, Record, integer, required};
use super::schema::{ROUTES, Schema};

/// A route's web page, kept exactly as written in the feed.
///
/// The text must parse as an absolute URL; it is stored verbatim so that
/// export does not normalise it (e.g. by appending a trailing slash).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RouteUrl(String);

impl RouteUrl {
    /// Validate an absolute URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_server::feed::RouteUrl;
    ///
    /// assert!(RouteUrl::parse("https://example.com").is_ok());
    /// assert!(RouteUrl::parse("https/example.com").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, url::ParseError> {
        Url::parse(s)?;
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RouteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteUrl({})", self.0)
    }
}

impl fmt::Display for RouteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A transit route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: String,
    pub short_name: String,
    pub long_name: String,
    pub description: String,
    /// GTFS route type code (0 tram, 1 subway, 3 bus, ...).
    pub route_type: u32,
    pub url: Option<RouteUrl>,
    pub agency_id: String,
    pub color: RouteColor,
    /// Unset when the feed leaves it out or empty; see [`Route::text_color_or_default`].
    pub text_color: Option<RouteColor>,
}

impl Route {
    /// The colour to draw route text in, black unless the feed says otherwise.
    pub fn text_color_or_default(&self) -> RouteColor {
        self.text_color.unwrap_or(RouteColor::BLACK)
    }
}

fn color(field: &'static str, value: &str) -> Result<RouteColor, FieldError> {
    RouteColor::parse(value).map_err(|_| FieldError::Color {
        field,
        value: value.to_string(),
    })
}

impl Record for Route {
    const SCHEMA: &'static Schema = &ROUTES;

    fn blank() -> Self {
        Self {
            id: String::new(),
            short_name: String::new(),
            long_name: String::new(),
            description: String::new(),
            route_type: 0,
            url: None,
            agency_id: String::new(),
            color: RouteColor::WHITE,
            text_color: None,
        }
    }

    fn assign(&mut self, field: &str, value: &str) -> Result<(), FieldError> {
        match field {
            "route_id" => self.id = required("route_id", value)?,
            "route_short_name" => self.short_name = value.to_string(),
            "route_long_name" => self.long_name = value.to_string(),
            "route_desc" => self.description = value.to_string(),
            "route_type" => self.route_type = integer("route_type", value)?,
            "route_url" => {
                self.url = if value.is_empty() {
                    None
                } else {
                    let url = RouteUrl::parse(value).map_err(|_| FieldError::Url {
                        field: "route_url",
                        value: value.to_string(),
                    })?;
                    Some(url)
                }
            }
            "agency_id" => self.agency_id = value.to_string(),
            "route_color" => self.color = color("route_color", value)?,
            "route_text_color" => {
                self.text_color = if value.is_empty() {
                    None
                } else {
                    Some(color("route_text_color", value)?)
                }
            }
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
            "route_id" => self.id.clone(),
            "route_short_name" => self.short_name.clone(),
            "route_long_name" => self.long_name.clone(),
            "route_desc" => self.description.clone(),
            "route_type" => self.route_type.to_string(),
            "route_url" => self
                .url
                .as_ref()
                .map(|u| u.as_str().to_string())
                .unwrap_or_default(),
            "agency_id" => self.agency_id.clone(),
            "route_color" => self.color.to_string(),
            "route_text_color" => self
                .text_color
                .map(|c| c.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    fn check_required(&self) -> Result<(), FieldError> {
        if self.id.is_empty() {
            return Err(FieldError::Required { field: "route_id" });
        }
        Ok(())
    }
}

impl Keyed for Route {
    fn key(&self) -> &str {
        &self.id
    }
}
