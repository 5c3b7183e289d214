use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Resolved user context of one legal entity, as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalEntityTarget {
    #[serde(alias = "externalServiceAgreementId")]
    pub external_service_agreement_id: String,
    #[serde(alias = "externalLegalEntityId")]
    pub external_legal_entity_id: String,
    #[serde(alias = "numberOfUsers")]
    pub number_of_users: u32,
}

impl LegalEntityTarget {
    pub fn new(
        external_service_agreement_id: impl Into<String>,
        external_legal_entity_id: impl Into<String>,
        number_of_users: u32,
    ) -> Self {
        Self {
            external_service_agreement_id: external_service_agreement_id.into(),
            external_legal_entity_id: external_legal_entity_id.into(),
            number_of_users,
        }
    }
}

/// Parses a JSON array of legal entity targets and rejects entries with blank ids.
pub fn parse_targets(raw: &str) -> Result<Vec<LegalEntityTarget>, DomainError> {
    let targets: Vec<LegalEntityTarget> = serde_json::from_str(raw)
        .map_err(|error| DomainError::InvalidInput(format!("legal entity list: {error}")))?;

    for (index, target) in targets.iter().enumerate() {
        if target.external_service_agreement_id.trim().is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "legal entity #{index} has an empty external service agreement id"
            )));
        }
        if target.external_legal_entity_id.trim().is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "legal entity #{index} has an empty external legal entity id"
            )));
        }
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::{parse_targets, LegalEntityTarget};
    use crate::errors::DomainError;

    #[test]
    fn accepts_snake_and_camel_case_keys() {
        let targets = parse_targets(
            r#"[
                {"external_service_agreement_id": "sa-1", "external_legal_entity_id": "le-1", "number_of_users": 5},
                {"externalServiceAgreementId": "sa-2", "externalLegalEntityId": "le-2", "numberOfUsers": 2}
            ]"#,
        )
        .expect("targets should parse");

        assert_eq!(
            targets,
            vec![LegalEntityTarget::new("sa-1", "le-1", 5), LegalEntityTarget::new("sa-2", "le-2", 2)]
        );
    }

    #[test]
    fn blank_ids_are_rejected_with_position() {
        let error = parse_targets(
            r#"[{"external_service_agreement_id": " ", "external_legal_entity_id": "le-1", "number_of_users": 1}]"#,
        )
        .expect_err("blank service agreement id must fail");

        assert!(matches!(error, DomainError::InvalidInput(ref message) if message.contains("#0")));
    }

    #[test]
    fn malformed_json_is_invalid_input() {
        let error = parse_targets("{not json").expect_err("malformed input must fail");
        assert!(matches!(error, DomainError::InvalidInput(_)));
    }
}
