use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical placeholder for unknown or absent dates.
///
/// Callers parse dates positionally, so this exact value must be emitted
/// whenever a source has no usable date.
pub const DATE_SENTINEL: &str = "0001-01-01T00:00:00";

// ============ Request Models ============

/// Kind of identification document being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentificationType {
    /// National personal identification number.
    Cedula,
    /// Business/juridical taxpayer number.
    #[serde(rename = "RNC")]
    Rnc,
}

impl IdentificationType {
    /// Wire name of the identification type.
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentificationType::Cedula => "Cedula",
            IdentificationType::Rnc => "RNC",
        }
    }

    /// Parses the inbound type name, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "cedula" | "cédula" => Some(IdentificationType::Cedula),
            "rnc" => Some(IdentificationType::Rnc),
            _ => None,
        }
    }
}

impl fmt::Display for IdentificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw inbound query, as received on the HTTP surface.
///
/// Every field is optional here; `validation::validate` decides what is
/// acceptable and produces a [`RequestContext`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientQuery {
    /// Identification number (digits only once validated).
    pub identification_number: Option<String>,
    /// "Cedula" or "RNC".
    pub identification_type: Option<String>,
    /// Skip the master registry and go straight to the civil registry.
    #[serde(default)]
    pub force_update: Option<bool>,
    /// Ask the registries for the binary photo.
    #[serde(default)]
    pub include_binary_photo: Option<bool>,
    /// Correlation identifier, passed through to logs.
    pub session_id: Option<String>,
}

/// Immutable per-request input consumed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub identification_number: String,
    pub identification_type: IdentificationType,
    pub force_update: bool,
    pub include_binary_photo: bool,
    /// Opaque correlation id. Never inspected, only logged.
    pub session_id: String,
}

impl RequestContext {
    /// The identification block sent to every registry for this request.
    pub fn identification(&self) -> Identification {
        Identification {
            number: self.identification_number.clone(),
            type_: self.identification_type.as_str().to_string(),
        }
    }
}

// ============ Routing ============

/// Routing decision derived from identification type and force-update flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingClass {
    /// RNC lookups, served by the legal-entity registry.
    LegalEntity,
    /// Cedula lookups served by the master registry, escalating on not-found.
    MasterLookup,
    /// Forced Cedula refresh from the civil registry.
    FallbackLookup,
}

impl fmt::Display for RoutingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoutingClass::LegalEntity => "legal_entity",
            RoutingClass::MasterLookup => "master_lookup",
            RoutingClass::FallbackLookup => "fallback_lookup",
        };
        f.write_str(name)
    }
}

/// Registry whose payload can be normalized into a canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    LegalEntity,
    MasterRegistry,
    FallbackRegistry,
}

impl SourceKind {
    /// Higher wins when more than one source produced data.
    ///
    /// Civil registry data is the freshest, then the master registry, then
    /// the legal-entity registry.
    pub fn precedence(&self) -> u8 {
        match self {
            SourceKind::FallbackRegistry => 3,
            SourceKind::MasterRegistry => 2,
            SourceKind::LegalEntity => 1,
        }
    }

    /// Identification type implied by the source.
    pub fn identification_type(&self) -> IdentificationType {
        match self {
            SourceKind::LegalEntity => IdentificationType::Rnc,
            SourceKind::MasterRegistry | SourceKind::FallbackRegistry => {
                IdentificationType::Cedula
            }
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::LegalEntity => "legal_entity",
            SourceKind::MasterRegistry => "master_registry",
            SourceKind::FallbackRegistry => "fallback_registry",
        };
        f.write_str(name)
    }
}

// ============ Canonical Output ============

/// Identification block shared by the canonical record and gateway requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    /// Identification number.
    #[serde(default)]
    pub number: String,
    /// "Cedula" or "RNC".
    #[serde(rename = "type", default)]
    pub type_: String,
}

/// Unified client record returned to callers.
///
/// Every field is always serialized. Inapplicable text fields are empty
/// strings and unknown dates are [`DATE_SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalClientRecord {
    pub identification: Identification,
    /// Given names, or the business name for legal entities.
    pub names: String,
    pub first_last_name: String,
    pub second_last_name: String,
    /// ISO-8601 local date-time or the sentinel.
    pub birth_date: String,
    pub birth_place: String,
    pub old_id_card: String,
    pub gender: String,
    pub marital_status: String,
    pub category: String,
    pub disqualification_reason: String,
    pub cancellation_reason_code: String,
    pub status: String,
    /// Same sentinel convention as `birth_date`.
    pub cancellation_date: String,
    pub photo_url: String,
    /// Base64 photo, or empty.
    pub photo_binary: String,
}

impl CanonicalClientRecord {
    /// A record with every text field empty and every date at the sentinel.
    pub fn empty() -> Self {
        Self {
            identification: Identification::default(),
            names: String::new(),
            first_last_name: String::new(),
            second_last_name: String::new(),
            birth_date: DATE_SENTINEL.to_string(),
            birth_place: String::new(),
            old_id_card: String::new(),
            gender: String::new(),
            marital_status: String::new(),
            category: String::new(),
            disqualification_reason: String::new(),
            cancellation_reason_code: String::new(),
            status: String::new(),
            cancellation_date: DATE_SENTINEL.to_string(),
            photo_url: String::new(),
            photo_binary: String::new(),
        }
    }
}

impl Default for CanonicalClientRecord {
    fn default() -> Self {
        Self::empty()
    }
}

/// Error body: the canonical record with every field blank, plus the error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(flatten)]
    pub record: CanonicalClientRecord,
    pub error: String,
    /// Equal to the HTTP status of the response.
    pub error_code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, error_code: u16) -> Self {
        Self {
            record: CanonicalClientRecord::empty(),
            error: error.into(),
            error_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identification_type_parse() {
        assert_eq!(
            IdentificationType::parse("Cedula"),
            Some(IdentificationType::Cedula)
        );
        assert_eq!(
            IdentificationType::parse(" cedula "),
            Some(IdentificationType::Cedula)
        );
        assert_eq!(IdentificationType::parse("rnc"), Some(IdentificationType::Rnc));
        assert_eq!(
            IdentificationType::parse("CÉDULA"),
            Some(IdentificationType::Cedula)
        );
        assert_eq!(
            IdentificationType::parse("Cédula"),
            Some(IdentificationType::Cedula)
        );
        assert_eq!(IdentificationType::parse("passport"), None);
        assert_eq!(IdentificationType::parse(""), None);
    }

    #[test]
    fn test_empty_record_uses_sentinels() {
        let record = CanonicalClientRecord::empty();
        assert_eq!(record.birth_date, DATE_SENTINEL);
        assert_eq!(record.cancellation_date, DATE_SENTINEL);
        assert!(record.names.is_empty());
        assert!(record.photo_binary.is_empty());
    }

    #[test]
    fn test_record_serializes_every_field() {
        let value = serde_json::to_value(CanonicalClientRecord::empty()).unwrap();
        let object = value.as_object().unwrap();

        for key in [
            "identification",
            "names",
            "firstLastName",
            "secondLastName",
            "birthDate",
            "birthPlace",
            "oldIdCard",
            "gender",
            "maritalStatus",
            "category",
            "disqualificationReason",
            "cancellationReasonCode",
            "status",
            "cancellationDate",
            "photoUrl",
            "photoBinary",
        ] {
            assert!(object.contains_key(key), "missing key {}", key);
        }
        assert_eq!(value["identification"]["type"], "");
    }

    #[test]
    fn test_error_response_flattens_record() {
        let value = serde_json::to_value(ErrorResponse::new("boom", 502)).unwrap();
        assert_eq!(value["error"], "boom");
        assert_eq!(value["errorCode"], 502);
        assert_eq!(value["birthDate"], DATE_SENTINEL);
        assert_eq!(value["names"], "");
    }

    #[test]
    fn test_source_precedence_order() {
        assert!(SourceKind::FallbackRegistry.precedence() > SourceKind::MasterRegistry.precedence());
        assert!(SourceKind::MasterRegistry.precedence() > SourceKind::LegalEntity.precedence());
    }
}
