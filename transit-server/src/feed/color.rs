//! Route colour type.

use std::fmt;

use rgb::RGB8;

/// Error returned when parsing an invalid colour.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color: {reason}")]
pub struct InvalidColor {
    reason: &'static str,
}

/// A route colour, written in feeds as six hex digits without a leading `#`.
///
/// Parsing accepts either case; formatting always produces uppercase, so a
/// colour read from a feed is written back unchanged apart from case.
///
/// # Examples
///
/// ```
/// use transit_server::feed::RouteColor;
///
/// let green = RouteColor::parse("00ff00").unwrap();
/// assert_eq!(green.to_string(), "00FF00");
/// assert_eq!(green.to_css(), "#00FF00");
///
/// assert!(RouteColor::parse("#00FF00").is_err());
/// assert!(RouteColor::parse("0F0").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteColor(RGB8);

impl RouteColor {
    /// Default fill colour for a route that does not specify one.
    pub const WHITE: RouteColor = RouteColor(RGB8 {
        r: 255,
        g: 255,
        b: 255,
    });

    /// Default text colour for a route that does not specify one.
    pub const BLACK: RouteColor = RouteColor(RGB8 { r: 0, g: 0, b: 0 });

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self(RGB8::new(r, g, b))
    }

    /// Parse a colour from exactly six hex digits.
    pub fn parse(s: &str) -> Result<Self, InvalidColor> {
        if s.len() != 6 {
            return Err(InvalidColor {
                reason: "must be exactly 6 hex digits",
            });
        }
        let channel = |i: usize| {
            s.get(i..i + 2)
                .filter(|pair| pair.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
        };
        match (channel(0), channel(2), channel(4)) {
            (Some(r), Some(g), Some(b)) => Ok(Self::new(r, g, b)),
            _ => Err(InvalidColor {
                reason: "must contain only hex digits",
            }),
        }
    }

    /// Returns the red, green and blue channels.
    pub fn rgb(&self) -> RGB8 {
        self.0
    }

    /// Returns the colour in CSS form, e.g. `#00FF00`.
    pub fn to_css(&self) -> String {
        format!("#{self}")
    }
}

impl fmt::Debug for RouteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteColor({self})")
    }
}

impl fmt::Display for RouteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.0.r, self.0.g, self.0.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_colors() {
        assert_eq!(RouteColor::parse("FFFFFF").unwrap(), RouteColor::WHITE);
        assert_eq!(RouteColor::parse("000000").unwrap(), RouteColor::BLACK);
        assert_eq!(
            RouteColor::parse("12abEF").unwrap(),
            RouteColor::new(0x12, 0xAB, 0xEF)
        );
    }

    #[test]
    fn reject_wrong_length() {
        assert!(RouteColor::parse("").is_err());
        assert!(RouteColor::parse("FFF").is_err());
        assert!(RouteColor::parse("FFFFFFF").is_err());
    }

    #[test]
    fn reject_non_hex() {
        assert!(RouteColor::parse("GGGGGG").is_err());
        assert!(RouteColor::parse("100%no").is_err());
        assert!(RouteColor::parse("#FFFFF").is_err());
        assert!(RouteColor::parse("+1FFFF").is_err());
        assert!(RouteColor::parse("FF+FFF").is_err());
        // Six bytes, but not six characters
        assert!(RouteColor::parse("F\u{e9}FFF").is_err());
        assert_eq!(
            RouteColor::parse("ggffff").unwrap_err().to_string(),
            RouteColor::parse("GGGGGG").unwrap_err().to_string()
        );
    }

    #[test]
    fn display_is_uppercase() {
        let color = RouteColor::parse("00ff0a").unwrap();
        assert_eq!(color.to_string(), "00FF0A");
        assert_eq!(format!("{:?}", color), "RouteColor(00FF0A)");
    }
}
