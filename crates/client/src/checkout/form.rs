//! Shipping address form validation.
//!
//! Validation runs entirely client-side; an invalid form never reaches the
//! network. Failures are reported per field so the UI can attach messages
//! to inputs.

use crate::models::Address;

/// Minimum length of the recipient's full name.
const MIN_FULL_NAME_LENGTH: usize = 3;

/// The shipping address as entered (or patched from a saved address).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressForm {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone_number: String,
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field the message belongs to.
    pub field: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl AddressForm {
    /// Pre-fill the form from a saved address.
    #[must_use]
    pub fn from_address(address: &Address) -> Self {
        Self {
            full_name: address.full_name.clone(),
            street: address.street.clone(),
            city: address.city.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            phone_number: address.phone_number.clone(),
        }
    }

    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns one [`FieldError`] per failing field. All fields are
    /// required; the full name must be at least three characters and the
    /// postal code exactly five digits.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if self.full_name.trim().is_empty() {
            errors.push(required("fullName"));
        } else if self.full_name.trim().len() < MIN_FULL_NAME_LENGTH {
            errors.push(FieldError {
                field: "fullName",
                message: format!("must be at least {MIN_FULL_NAME_LENGTH} characters"),
            });
        }
        if self.street.trim().is_empty() {
            errors.push(required("street"));
        }
        if self.city.trim().is_empty() {
            errors.push(required("city"));
        }
        if self.postal_code.trim().is_empty() {
            errors.push(required("postalCode"));
        } else if !is_postal_code(&self.postal_code) {
            errors.push(FieldError {
                field: "postalCode",
                message: "must be exactly 5 digits".to_owned(),
            });
        }
        if self.country.trim().is_empty() {
            errors.push(required("country"));
        }
        if self.phone_number.trim().is_empty() {
            errors.push(required("phoneNumber"));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// The single-line shipping string the order service stores.
    #[must_use]
    pub fn shipping_line(&self) -> String {
        format!(
            "{}, {} {}, {} - Tel: {}",
            self.street, self.postal_code, self.city, self.country, self.phone_number
        )
    }

    /// Convert into a saveable address (no id; the backend assigns one).
    #[must_use]
    pub fn to_address(&self) -> Address {
        Address {
            id: None,
            full_name: self.full_name.clone(),
            street: self.street.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
            phone_number: self.phone_number.clone(),
            is_default: None,
        }
    }
}

fn required(field: &'static str) -> FieldError {
    FieldError {
        field,
        message: "is required".to_owned(),
    }
}

fn is_postal_code(raw: &str) -> bool {
    raw.len() == 5 && raw.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> AddressForm {
        AddressForm {
            full_name: "Amina El Fassi".to_owned(),
            street: "3 Rue des Consuls".to_owned(),
            city: "Rabat".to_owned(),
            postal_code: "10020".to_owned(),
            country: "Morocco".to_owned(),
            phone_number: "+212600000000".to_owned(),
        }
    }

    #[test]
    fn test_valid_form_passes() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let errors = AddressForm::default().validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["fullName", "street", "city", "postalCode", "country", "phoneNumber"]
        );
    }

    #[test]
    fn test_short_name_rejected() {
        let mut form = valid_form();
        form.full_name = "Al".to_owned();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().unwrap().field, "fullName");
    }

    #[test]
    fn test_postal_code_must_be_five_digits() {
        for bad in ["1234", "123456", "1002A", "10 20"] {
            let mut form = valid_form();
            form.postal_code = bad.to_owned();
            let errors = form.validate().unwrap_err();
            assert_eq!(errors.first().unwrap().field, "postalCode", "case: {bad}");
        }
    }

    #[test]
    fn test_shipping_line_format() {
        assert_eq!(
            valid_form().shipping_line(),
            "3 Rue des Consuls, 10020 Rabat, Morocco - Tel: +212600000000"
        );
    }

    #[test]
    fn test_from_address_roundtrip() {
        let address = valid_form().to_address();
        assert_eq!(AddressForm::from_address(&address), valid_form());
    }
}
