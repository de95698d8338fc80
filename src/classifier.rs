use crate::models::{IdentificationType, RoutingClass};

/// Maps an identification type and force-update flag to a routing class.
///
/// RNC numbers always go to the legal-entity registry; the force-update flag
/// only matters for Cedula lookups.
pub fn classify(identification_type: IdentificationType, force_update: bool) -> RoutingClass {
    match (identification_type, force_update) {
        (IdentificationType::Rnc, _) => RoutingClass::LegalEntity,
        (IdentificationType::Cedula, false) => RoutingClass::MasterLookup,
        (IdentificationType::Cedula, true) => RoutingClass::FallbackLookup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_table() {
        assert_eq!(
            classify(IdentificationType::Rnc, false),
            RoutingClass::LegalEntity
        );
        assert_eq!(
            classify(IdentificationType::Rnc, true),
            RoutingClass::LegalEntity
        );
        assert_eq!(
            classify(IdentificationType::Cedula, false),
            RoutingClass::MasterLookup
        );
        assert_eq!(
            classify(IdentificationType::Cedula, true),
            RoutingClass::FallbackLookup
        );
    }
}
