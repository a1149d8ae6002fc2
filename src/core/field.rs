use super::{dialect::Dialect, value::Value};

/// Encodes a raw value as a single field: formats it under the dialect's
/// locale, then applies [`encode_field`].
pub fn encode_value(value: &Value, dialect: &Dialect) -> String {
    let text = value.format(&dialect.locale);
    encode_field(text.as_deref(), dialect)
}

/// Escapes already formatted text so it can be placed between delimiters.
///
/// `None` is a null value: it is replaced by the null substitution when one is
/// configured, otherwise it becomes an empty field, or an empty quoted pair
/// when every field is quoted. An explicit empty string under
/// `quote_all_fields` also yields a quoted pair, so the two only differ when a
/// null substitution is set.
///
/// The field is quoted when it contains the quote, the delimiter, a `\n`,
/// a `\r\n` or the configured terminator, or when `quote_all_fields` is set.
/// Quotes inside a quoted field are doubled.
///
/// # Examples
///
/// ```
/// use tabular_csv::core::{dialect::Dialect, field::encode_field};
///
/// let dialect = Dialect::default();
///
/// assert_eq!(encode_field(Some("plain"), &dialect), "plain");
/// assert_eq!(encode_field(Some("A;B"), &dialect), "\"A;B\"");
/// assert_eq!(encode_field(Some("C\"D"), &dialect), "\"C\"\"D\"");
/// assert_eq!(encode_field(None, &dialect), "");
/// ```
pub fn encode_field(value: Option<&str>, dialect: &Dialect) -> String {
    match value.or(dialect.null_substitution.as_deref()) {
        Some(value) => escape(value, dialect, dialect.quote_all_fields),
        None if dialect.quote_all_fields => dialect.quote.repeat(2),
        None => String::new(),
    }
}

/// Encodes a column name for the header line. Header names are always
/// quoted, with the same newline substitution and quote doubling as fields.
pub fn encode_header(name: &str, dialect: &Dialect) -> String {
    escape(name, dialect, true)
}

fn escape(value: &str, dialect: &Dialect, force_quote: bool) -> String {
    let value = match &dialect.newline_substitution {
        Some(substitution) => substitute_newlines(value, &dialect.line_terminator, substitution),
        None => value.to_string(),
    };

    let contains_quote = value.contains(dialect.quote.as_str());

    let needs_quote = contains_quote
        || force_quote
        || value.contains(dialect.delimiter.as_str())
        || value.contains('\n')
        || value.contains("\r\n")
        || value.contains(dialect.line_terminator.as_str());

    if !needs_quote {
        return value;
    }

    let mut field = String::with_capacity(value.len() + 2 * dialect.quote.len());
    field.push_str(&dialect.quote);
    if contains_quote {
        field.push_str(&value.replace(dialect.quote.as_str(), &dialect.quote.repeat(2)));
    } else {
        field.push_str(&value);
    }
    field.push_str(&dialect.quote);
    field
}

/// Replaces every line break with `substitution`. At each position the
/// configured terminator is tried first, then `\r\n`, then `\n`.
fn substitute_newlines(value: &str, line_terminator: &str, substitution: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while !rest.is_empty() {
        let matched = [line_terminator, "\r\n", "\n"]
            .into_iter()
            .find(|newline| !newline.is_empty() && rest.starts_with(newline));

        match matched {
            Some(newline) => {
                result.push_str(substitution);
                rest = &rest[newline.len()..];
            }
            None => {
                let mut chars = rest.chars();
                if let Some(c) = chars.next() {
                    result.push(c);
                }
                rest = chars.as_str();
            }
        }
    }

    result
}
