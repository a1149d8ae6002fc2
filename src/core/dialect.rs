use serde::{Deserialize, Serialize};

use crate::error::{Result, TabularError};

/// Scalar formatting conventions applied to numbers.
///
/// Only the textual rendering of numeric values depends on the locale. Dates
/// always use a round-trippable ISO-8601 form and the delimiter/quote handling
/// never looks at the locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Locale {
    /// Informational language tag, empty for the invariant locale.
    pub tag: String,
    /// Character placed between the integral and fractional part of a float.
    pub decimal_separator: char,
}

impl Locale {
    /// The locale-independent conventions used unless told otherwise.
    pub fn invariant() -> Locale {
        Locale {
            tag: String::new(),
            decimal_separator: '.',
        }
    }

    pub fn new(tag: &str, decimal_separator: char) -> Locale {
        Locale {
            tag: tag.to_string(),
            decimal_separator,
        }
    }

    pub fn is_invariant(&self) -> bool {
        self.decimal_separator == '.'
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::invariant()
    }
}

/// The textual conventions governing one encoding run.
///
/// Every field is public and may be changed freely before a write starts.
/// Writers call [`Dialect::validate`] before the first byte reaches the sink,
/// so a malformed dialect fails with [`TabularError::Configuration`] instead
/// of producing ambiguous output.
///
/// The defaults (`;` delimiter, `"` quote, `\r\n` terminator) are picked so
/// that the output opens directly in spreadsheet tools using a semicolon list
/// separator.
///
/// # Examples
///
/// ```
/// use tabular_csv::core::dialect::Dialect;
///
/// let dialect = Dialect::from_json_str(r#"{ "delimiter": ",", "quote_all_fields": true }"#).unwrap();
///
/// assert_eq!(dialect.delimiter, ",");
/// assert_eq!(dialect.quote, "\"");
/// assert!(dialect.quote_all_fields);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dialect {
    /// Field separator.
    pub delimiter: String,
    /// Quoting string.
    pub quote: String,
    /// Row separator.
    pub line_terminator: String,
    /// Text written in place of null values.
    pub null_substitution: Option<String>,
    /// Text replacing embedded line terminators. When absent, embedded
    /// terminators force quoting instead.
    pub newline_substitution: Option<String>,
    /// Quote every field, even when not needed.
    pub quote_all_fields: bool,
    /// Order columns lexicographically instead of by declaration/key order.
    pub sort_columns: bool,
    /// Number formatting conventions.
    pub locale: Locale,
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect {
            delimiter: ";".to_string(),
            quote: "\"".to_string(),
            line_terminator: "\r\n".to_string(),
            null_substitution: None,
            newline_substitution: None,
            quote_all_fields: false,
            sort_columns: false,
            locale: Locale::invariant(),
        }
    }
}

impl Dialect {
    /// Comma separated, CRLF terminated.
    pub fn rfc4180() -> Dialect {
        Dialect {
            delimiter: ",".to_string(),
            ..Dialect::default()
        }
    }

    /// Tab separated, LF terminated.
    pub fn tab_separated() -> Dialect {
        Dialect {
            delimiter: "\t".to_string(),
            line_terminator: "\n".to_string(),
            ..Dialect::default()
        }
    }

    /// Parses a dialect from JSON. Missing fields keep their default value.
    pub fn from_json_str(json: &str) -> Result<Dialect> {
        let dialect: Dialect = serde_json::from_str(json)?;
        Ok(dialect)
    }

    /// Checks that delimiter, quote and terminator are non-empty and that
    /// none of them contains another, which would make the output ambiguous.
    pub fn validate(&self) -> Result<()> {
        let markers = [
            ("delimiter", &self.delimiter),
            ("quote", &self.quote),
            ("line terminator", &self.line_terminator),
        ];

        for (name, marker) in markers {
            if marker.is_empty() {
                return Err(TabularError::Configuration(format!("{} is empty", name)));
            }
        }

        for (i, (name, marker)) in markers.iter().enumerate() {
            for (other_name, other) in markers.iter().skip(i + 1) {
                if marker.contains(other.as_str()) || other.contains(marker.as_str()) {
                    return Err(TabularError::Configuration(format!(
                        "{} {:?} overlaps {} {:?}",
                        name, marker, other_name, other
                    )));
                }
            }
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct DialectBuilder {
    dialect: Dialect,
}

impl DialectBuilder {
    pub fn new() -> DialectBuilder {
        DialectBuilder {
            dialect: Dialect::default(),
        }
    }

    pub fn delimiter(mut self, delimiter: &str) -> DialectBuilder {
        self.dialect.delimiter = delimiter.to_string();
        self
    }

    pub fn quote(mut self, quote: &str) -> DialectBuilder {
        self.dialect.quote = quote.to_string();
        self
    }

    pub fn line_terminator(mut self, line_terminator: &str) -> DialectBuilder {
        self.dialect.line_terminator = line_terminator.to_string();
        self
    }

    pub fn null_substitution(mut self, substitution: &str) -> DialectBuilder {
        self.dialect.null_substitution = Some(substitution.to_string());
        self
    }

    pub fn newline_substitution(mut self, substitution: &str) -> DialectBuilder {
        self.dialect.newline_substitution = Some(substitution.to_string());
        self
    }

    pub fn quote_all_fields(mut self, yes: bool) -> DialectBuilder {
        self.dialect.quote_all_fields = yes;
        self
    }

    pub fn sort_columns(mut self, yes: bool) -> DialectBuilder {
        self.dialect.sort_columns = yes;
        self
    }

    pub fn locale(mut self, locale: Locale) -> DialectBuilder {
        self.dialect.locale = locale;
        self
    }

    /// Validates and returns the dialect.
    pub fn build(self) -> Result<Dialect> {
        self.dialect.validate()?;
        Ok(self.dialect)
    }
}
