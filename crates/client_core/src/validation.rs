//! Form checks that run before anything is sent to the gateway.

use floor_shared::{domain::SelectOption, protocol::LoginCredentials};

use crate::error::ValidationError;

pub const MAX_OPERATORS: usize = 3;

/// Keypad input for up to three operators. Blank entries are skipped; slot
/// order follows entry order.
pub fn validate_credentials<S: AsRef<str>>(
    identifiers: &[S],
) -> Result<LoginCredentials, ValidationError> {
    let mut accepted: Vec<String> = Vec::with_capacity(MAX_OPERATORS);
    for raw in identifiers.iter().map(|raw| raw.as_ref().trim()) {
        if raw.is_empty() {
            continue;
        }
        if !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidIdentifier(raw.to_string()));
        }
        if accepted.iter().any(|existing| existing == raw) {
            return Err(ValidationError::DuplicateIdentifier(raw.to_string()));
        }
        accepted.push(raw.to_string());
    }
    accepted.truncate(MAX_OPERATORS);

    let mut accepted = accepted.into_iter();
    let identifier1 = accepted.next().ok_or(ValidationError::MissingOperator)?;
    Ok(LoginCredentials {
        identifier1,
        identifier2: accepted.next(),
        identifier3: accepted.next(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCardForm {
    pub warehouse: Option<String>,
    pub sector: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidNewCard {
    pub warehouse: String,
    pub sector: String,
}

impl NewCardForm {
    pub fn new(warehouse: impl Into<String>, sector: impl Into<String>) -> Self {
        Self {
            warehouse: Some(warehouse.into()),
            sector: Some(sector.into()),
        }
    }

    /// Both radio groups must hold one of the offered values.
    pub fn validate(
        &self,
        warehouses: &[SelectOption],
        sectors: &[SelectOption],
    ) -> Result<ValidNewCard, ValidationError> {
        let warehouse = non_blank(&self.warehouse).ok_or(ValidationError::MissingWarehouse)?;
        if !offers(warehouses, warehouse) {
            return Err(ValidationError::UnknownWarehouse(warehouse.to_string()));
        }
        let sector = non_blank(&self.sector).ok_or(ValidationError::MissingSector)?;
        if !offers(sectors, sector) {
            return Err(ValidationError::UnknownSector(sector.to_string()));
        }
        Ok(ValidNewCard {
            warehouse: warehouse.to_string(),
            sector: sector.to_string(),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn offers(options: &[SelectOption], value: &str) -> bool {
    options.iter().any(|option| option.value == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(value: &str) -> SelectOption {
        SelectOption {
            value: value.to_string(),
            label: value.to_uppercase(),
        }
    }

    #[test]
    fn credentials_keep_entry_order_and_skip_blanks() {
        let credentials = validate_credentials(&["  ", "1234", "", "77"]).expect("valid");
        assert_eq!(credentials.identifier1, "1234");
        assert_eq!(credentials.identifier2.as_deref(), Some("77"));
        assert_eq!(credentials.identifier3, None);
    }

    #[test]
    fn credentials_require_one_numeric_identifier() {
        assert_eq!(
            validate_credentials::<&str>(&[]),
            Err(ValidationError::MissingOperator)
        );
        assert_eq!(
            validate_credentials(&["12a"]),
            Err(ValidationError::InvalidIdentifier("12a".into()))
        );
        assert_eq!(
            validate_credentials(&["5", "5"]),
            Err(ValidationError::DuplicateIdentifier("5".into()))
        );
    }

    #[test]
    fn new_card_form_rejects_values_outside_the_offered_options() {
        let warehouses = [option("A"), option("B")];
        let sectors = [option("1")];

        assert_eq!(
            NewCardForm::default().validate(&warehouses, &sectors),
            Err(ValidationError::MissingWarehouse)
        );
        assert_eq!(
            NewCardForm::new("C", "1").validate(&warehouses, &sectors),
            Err(ValidationError::UnknownWarehouse("C".into()))
        );
        assert_eq!(
            NewCardForm::new("A", "9").validate(&warehouses, &sectors),
            Err(ValidationError::UnknownSector("9".into()))
        );
        assert_eq!(
            NewCardForm::new("A", "1").validate(&warehouses, &sectors),
            Ok(ValidNewCard {
                warehouse: "A".into(),
                sector: "1".into()
            })
        );
    }
}
