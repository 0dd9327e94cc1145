/// Input format checks
///
/// These run before any network call: a failing check blocks the
/// submission outright.
///
/// - CPF (driver document): exactly 11 digits once the mask is removed
/// - client document: CPF (11) or CNPJ (14) digits
/// - plate: legacy `ABC1234` or Mercosul `ABC1D23`
/// - CEP (postal code): exactly 8 digits
///
/// # Example
///
/// ```
/// use frota_shared::validation::{validate_document, validate_plate};
///
/// assert_eq!(validate_document("123.456.789-01").unwrap(), "12345678901");
/// assert!(validate_document("1234567890").is_err());
/// assert_eq!(validate_plate("abc-1d23").unwrap(), "ABC1D23");
/// ```

/// Validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Driver document is not 11 digits
    #[error("Document must have exactly 11 digits, got {0}")]
    Document(usize),

    /// Client document is neither 11 nor 14 digits
    #[error("Document must have 11 (CPF) or 14 (CNPJ) digits, got {0}")]
    ClientDocument(usize),

    /// Plate does not follow either format
    #[error("Invalid plate: {0}")]
    Plate(String),

    /// Postal code is not 8 digits
    #[error("Postal code must have exactly 8 digits, got {0}")]
    PostalCode(usize),

    /// Required field is blank
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Field holds an out-of-range value
    #[error("{field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Document(_) | ValidationError::ClientDocument(_) => "document",
            ValidationError::Plate(_) => "plate",
            ValidationError::PostalCode(_) => "postal_code",
            ValidationError::Required { field } | ValidationError::Invalid { field, .. } => *field,
        }
    }
}

/// Strips everything but ASCII digits
pub fn digits_only(input: &str) -> String {
    input.chars().filter(char::is_ascii_digit).collect()
}

/// Validates a driver document (CPF), returning the bare digits
pub fn validate_document(input: &str) -> Result<String, ValidationError> {
    let digits = digits_only(input);
    if digits.len() != 11 {
        return Err(ValidationError::Document(digits.len()));
    }
    Ok(digits)
}

/// Validates a client document (CPF or CNPJ), returning the bare digits
pub fn validate_client_document(input: &str) -> Result<String, ValidationError> {
    let digits = digits_only(input);
    match digits.len() {
        11 | 14 => Ok(digits),
        n => Err(ValidationError::ClientDocument(n)),
    }
}

/// Validates a postal code (CEP), returning the bare digits
pub fn validate_postal_code(input: &str) -> Result<String, ValidationError> {
    let digits = digits_only(input);
    if digits.len() != 8 {
        return Err(ValidationError::PostalCode(digits.len()));
    }
    Ok(digits)
}

/// Validates a vehicle plate, returning it upper-cased without separators
pub fn validate_plate(input: &str) -> Result<String, ValidationError> {
    let plate: String = input
        .chars()
        .filter(|c| !matches!(*c, '-' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let bytes = plate.as_bytes();
    let valid = bytes.len() == 7
        && bytes[..3].iter().all(u8::is_ascii_uppercase)
        && bytes[3].is_ascii_digit()
        && (bytes[4].is_ascii_digit() || bytes[4].is_ascii_uppercase())
        && bytes[5..].iter().all(u8::is_ascii_digit);

    if valid {
        Ok(plate)
    } else {
        Err(ValidationError::Plate(input.to_string()))
    }
}

/// Rejects blank values, returning the trimmed text
pub fn require(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_accepts_exactly_eleven_digits() {
        assert_eq!(validate_document("12345678901").unwrap(), "12345678901");
        assert_eq!(validate_document("123.456.789-01").unwrap(), "12345678901");
    }

    #[test]
    fn test_document_rejects_other_lengths() {
        for input in ["", "1", "1234567890", "123456789012", "12345678901234"] {
            assert_eq!(
                validate_document(input),
                Err(ValidationError::Document(input.len()))
            );
        }
    }

    #[test]
    fn test_client_document() {
        assert!(validate_client_document("12345678901").is_ok());
        assert!(validate_client_document("12.345.678/0001-90").is_ok());
        assert_eq!(
            validate_client_document("123"),
            Err(ValidationError::ClientDocument(3))
        );
    }

    #[test]
    fn test_postal_code() {
        assert_eq!(validate_postal_code("01310-100").unwrap(), "01310100");
        assert!(validate_postal_code("0131010").is_err());
    }

    #[test]
    fn test_plate_formats() {
        assert_eq!(validate_plate("abc1234").unwrap(), "ABC1234");
        assert_eq!(validate_plate("ABC-1D23").unwrap(), "ABC1D23");
        assert!(validate_plate("AB1234").is_err());
        assert!(validate_plate("1BC1234").is_err());
        assert!(validate_plate("ABC12D4").is_err());
        assert!(validate_plate("").is_err());
    }

    #[test]
    fn test_require() {
        assert_eq!(require("name", "  Ana ").unwrap(), "Ana");
        assert_eq!(
            require("name", "   "),
            Err(ValidationError::Required { field: "name" })
        );
    }

    #[test]
    fn test_field_names() {
        assert_eq!(ValidationError::Document(3).field(), "document");
        assert_eq!(ValidationError::Plate("x".into()).field(), "plate");
        assert_eq!(ValidationError::Required { field: "name" }.field(), "name");
    }
}
