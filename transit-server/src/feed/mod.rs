//! Feed file formats and the typed records read from them.
//!
//! A feed is a directory of delimited text files. This module knows the
//! four files the store supports, validates their headers, and turns each
//! data line into a [`Route`], [`Stop`], [`Trip`] or [`StopTime`]. Nothing
//! here touches the file system; types enforce their invariants at
//! construction, so code that receives them can trust their validity.

mod color;
mod error;
mod record;
mod route;
mod schema;
mod stop;
mod stop_time;
mod time;
mod tokenizer;
mod trip;

pub use color::{InvalidColor, RouteColor};
pub use error::{FieldError, RecordError, SchemaError, TimeError, TokenizeError};
pub use record::{Keyed, Record};
pub use route::{Route, RouteUrl};
pub use schema::{FeedFile, FieldList, ROUTES, STOP_TIMES, STOPS, Schema, TRIPS, validate_header};
pub use stop::Stop;
pub use stop_time::{BoardingType, StopTime};
pub use time::{ServiceTime, time_difference};
pub use tokenizer::{DELIMITER, join_record, split_record};
pub use trip::{Direction, Trip};
