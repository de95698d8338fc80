use crate::errors::AppError;
use crate::models::{ClientQuery, IdentificationType, RequestContext};
use regex::Regex;
use std::sync::LazyLock;

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("digits regex is valid"));

const CEDULA_LENGTH: usize = 11;
const RNC_LENGTHS: [usize; 2] = [9, 11];

/// Validates an inbound query and freezes it into a [`RequestContext`].
///
/// A missing session id is replaced by a fresh UUID so every log line of
/// the request can still be correlated.
pub fn validate(query: ClientQuery) -> Result<RequestContext, AppError> {
    let number = query
        .identification_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::BadRequest("identificationNumber is required".to_string()))?;

    let raw_type = query
        .identification_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("identificationType is required".to_string()))?;

    let identification_type = IdentificationType::parse(raw_type).ok_or_else(|| {
        AppError::BadRequest(format!(
            "identificationType must be Cedula or RNC, got '{}'",
            raw_type
        ))
    })?;

    if !DIGITS.is_match(number) {
        return Err(AppError::BadRequest(
            "identificationNumber must contain digits only".to_string(),
        ));
    }

    let length_ok = match identification_type {
        IdentificationType::Cedula => number.len() == CEDULA_LENGTH,
        IdentificationType::Rnc => RNC_LENGTHS.contains(&number.len()),
    };
    if !length_ok {
        return Err(AppError::BadRequest(format!(
            "identificationNumber has invalid length {} for {}",
            number.len(),
            identification_type
        )));
    }

    let session_id = query
        .session_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    Ok(RequestContext {
        identification_number: number.to_string(),
        identification_type,
        force_update: query.force_update.unwrap_or(false),
        include_binary_photo: query.include_binary_photo.unwrap_or(false),
        session_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(number: &str, type_: &str) -> ClientQuery {
        ClientQuery {
            identification_number: Some(number.to_string()),
            identification_type: Some(type_.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_cedula() {
        let ctx = validate(query(" 40233832993 ", "Cedula")).unwrap();
        assert_eq!(ctx.identification_number, "40233832993");
        assert_eq!(ctx.identification_type, IdentificationType::Cedula);
        assert!(!ctx.force_update);
        assert!(!ctx.include_binary_photo);
        assert!(!ctx.session_id.is_empty());
    }

    #[test]
    fn test_valid_rnc_lengths() {
        assert!(validate(query("101199662", "RNC")).is_ok());
        assert!(validate(query("40233832993", "rnc")).is_ok());
        assert!(validate(query("1011996", "RNC")).is_err());
    }

    #[test]
    fn test_session_id_passthrough() {
        let mut q = query("40233832993", "Cedula");
        q.session_id = Some("abc-123".to_string());
        assert_eq!(validate(q).unwrap().session_id, "abc-123");
    }

    #[test]
    fn test_rejections() {
        assert!(validate(ClientQuery::default()).is_err());
        assert!(validate(query("402-3383299", "Cedula")).is_err());
        assert!(validate(query("4023383299", "Cedula")).is_err());
        assert!(validate(query("40233832993", "Passport")).is_err());
        assert!(validate(query("40233832993", "")).is_err());
    }

    #[test]
    fn test_rejections_are_bad_requests() {
        let err = validate(query("abc", "Cedula")).unwrap_err();
        assert_eq!(err.status_code().as_u16(), 400);
    }
}
