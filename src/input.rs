use std::fmt;

pub const MIN_VALUES: usize = 10;
pub const MAX_VALUES: usize = 15;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputError {
    /// The field was empty or only whitespace.
    Required,
    /// A token that is not a finite number.
    InvalidNumber(String),
    /// The number of parsed values is outside `MIN_VALUES..=MAX_VALUES`.
    Count(usize),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Required => write!(f, "This field is required."),
            InputError::InvalidNumber(token) => write!(f, "Invalid number: {token}"),
            InputError::Count(_) => write!(
                f,
                "Please enter between {MIN_VALUES} and {MAX_VALUES} numbers."
            ),
        }
    }
}

impl std::error::Error for InputError {}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ',' || c == ';'
}

/// Split free text on runs of whitespace, commas and semicolons.
pub fn tokenize(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(is_separator).filter(|token| !token.is_empty())
}

fn parse_token(token: &str) -> Result<f64, InputError> {
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(InputError::InvalidNumber(token.to_string())),
    }
}

/// Parse a submitted list of numbers, keeping the order they were written in.
///
/// The first token that is not a finite number rejects the whole submission.
/// The count is only checked once every token parsed.
pub fn parse_numbers(raw: &str) -> Result<Vec<f64>, InputError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(InputError::Required);
    }

    let values = tokenize(raw).map(parse_token).collect::<Result<Vec<_>, _>>()?;

    if !(MIN_VALUES..=MAX_VALUES).contains(&values.len()) {
        return Err(InputError::Count(values.len()));
    }
    Ok(values)
}
