//! Tag name validation.
//!
//! Valid tags:
//! - Not blank once surrounding whitespace is trimmed
//! - At most [`MAX_TAG_LEN`] characters
//! - No commas (comma-separated lists are how callers pass several tags)
//! - No control characters

pub const MAX_TAG_LEN: usize = 50;

/// Validates a tag name and returns it trimmed.
///
/// # Examples
/// ```
/// use stashapp::tags::validation::validate_tag_name;
///
/// assert_eq!(validate_tag_name("  sunset ").unwrap(), "sunset");
/// assert!(validate_tag_name("Golden Hour").is_ok());
///
/// assert!(validate_tag_name("").is_err());
/// assert!(validate_tag_name("   ").is_err());
/// assert!(validate_tag_name("a,b").is_err());
/// ```
pub fn validate_tag_name(name: &str) -> Result<&str, TagValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TagValidationError::Empty);
    }

    let len = name.chars().count();
    if len > MAX_TAG_LEN {
        return Err(TagValidationError::TooLong(len));
    }

    if let Some(ch) = name.chars().find(|c| *c == ',' || c.is_control()) {
        return Err(TagValidationError::InvalidCharacter(ch));
    }

    Ok(name)
}

/// Error type for tag name validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    /// Tag name is empty or only whitespace
    Empty,
    /// Tag name is longer than [`MAX_TAG_LEN`] characters
    TooLong(usize),
    /// Tag name contains a comma or a control character
    InvalidCharacter(char),
}

impl std::fmt::Display for TagValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValidationError::Empty => write!(f, "tag name cannot be empty"),
            TagValidationError::TooLong(len) => write!(
                f,
                "tag name is {} characters long (max {})",
                len, MAX_TAG_LEN
            ),
            TagValidationError::InvalidCharacter(ch) => {
                write!(f, "tag name contains invalid character {:?}", ch)
            }
        }
    }
}

impl std::error::Error for TagValidationError {}
