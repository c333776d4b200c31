//! Record tokenizer for comma-delimited feed lines.
//!
//! Values may be wrapped in double quotes, in which case the delimiter may
//! appear inside them and a doubled quote (`""`) stands for one literal
//! quote. Unquoted values are trimmed; quoted interiors are kept verbatim.

use super::error::TokenizeError;

/// Field delimiter used by every feed file.
pub const DELIMITER: char = ',';

const QUOTE: char = '"';

/// Split one raw line into its field values.
///
/// A line with N-1 delimiters outside quotes always yields N values, so an
/// empty line yields one empty value and a trailing delimiter yields a
/// trailing empty value.
///
/// # Examples
///
/// ```
/// use transit_server::feed::split_record;
///
/// let values = split_record(r#"30X, "Some thing, you know" ,00FF00"#).unwrap();
/// assert_eq!(values, vec!["30X", "Some thing, you know", "00FF00"]);
///
/// assert_eq!(split_record("a,").unwrap(), vec!["a", ""]);
/// assert!(split_record(r#"a,"unterminated"#).is_err());
/// ```
pub fn split_record(line: &str) -> Result<Vec<String>, TokenizeError> {
    let mut values = Vec::new();
    let mut rest = line;

    loop {
        let trimmed = rest.trim_start();
        let (value, next) = match trimmed.strip_prefix(QUOTE) {
            Some(quoted) => {
                let (mut value, remainder) = read_quoted(quoted, values.len())?;
                let (tail, next) = split_at_delimiter(remainder);
                // Anything between the closing quote and the delimiter is kept.
                value.push_str(tail.trim());
                (value, next)
            }
            None => {
                let (field, next) = split_at_delimiter(rest);
                (field.trim().to_string(), next)
            }
        };

        values.push(value);
        match next {
            Some(next) => rest = next,
            None => return Ok(values),
        }
    }
}

/// Join field values back into one line, quoting where a plain value would
/// not survive [`split_record`] unchanged.
///
/// # Examples
///
/// ```
/// use transit_server::feed::join_record;
///
/// assert_eq!(join_record(["30X", "a, b", ""]), r#"30X,"a, b","#);
/// ```
pub fn join_record<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for (i, value) in values.into_iter().enumerate() {
        if i > 0 {
            line.push(DELIMITER);
        }
        push_value(&mut line, value.as_ref());
    }
    line
}

fn push_value(line: &mut String, value: &str) {
    let needs_quotes =
        value.contains(DELIMITER) || value.contains(QUOTE) || value.trim() != value;
    if !needs_quotes {
        line.push_str(value);
        return;
    }

    line.push(QUOTE);
    for c in value.chars() {
        if c == QUOTE {
            line.push(QUOTE);
        }
        line.push(c);
    }
    line.push(QUOTE);
}

/// Read a quoted interior up to its closing quote.
///
/// `s` starts just after the opening quote. Returns the unescaped value and
/// the text following the closing quote.
fn read_quoted(s: &str, field: usize) -> Result<(String, &str), TokenizeError> {
    let mut value = String::new();
    let mut chars = s.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != QUOTE {
            value.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, QUOTE))) {
            chars.next();
            value.push(QUOTE);
            continue;
        }
        return Ok((value, &s[i + QUOTE.len_utf8()..]));
    }

    Err(TokenizeError::UnterminatedQuote { field })
}

fn split_at_delimiter(s: &str) -> (&str, Option<&str>) {
    match s.find(DELIMITER) {
        Some(i) => (&s[..i], Some(&s[i + DELIMITER.len_utf8()..])),
        None => (s, None),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// N-1 delimiters in a quote-free line always give N values
        #[test]
        fn value_count_follows_delimiters(fields in proptest::collection::vec("[a-z0-9 _.:]{0,8}", 1..10)) {
            let line = fields.join(",");
            let values = split_record(&line).unwrap();
            prop_assert_eq!(values.len(), fields.len());
        }

        /// Joined values split back into the same values
        #[test]
        fn join_then_split_preserves_values(values in proptest::collection::vec(r##"[a-zA-Z0-9 ,"#:]{0,10}"##, 1..8)) {
            let line = join_record(&values);
            prop_assert_eq!(split_record(&line).unwrap(), values);
        }
    }
}
