//! Saved shipping addresses.

use serde::{Deserialize, Serialize};

use souk_core::AddressId;

/// A structured shipping address from the user's saved list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AddressId>,
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl Address {
    /// One-line display form used in saved-address pickers.
    #[must_use]
    pub fn display_line(&self) -> String {
        format!(
            "{} - {}, {} {}, {}",
            self.full_name, self.street, self.postal_code, self.city, self.country
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_line() {
        let address = Address {
            id: None,
            full_name: "Amina El Fassi".to_owned(),
            street: "3 Rue des Consuls".to_owned(),
            city: "Rabat".to_owned(),
            postal_code: "10020".to_owned(),
            country: "Morocco".to_owned(),
            phone_number: "+212600000000".to_owned(),
            is_default: None,
        };
        assert_eq!(
            address.display_line(),
            "Amina El Fassi - 3 Rue des Consuls, 10020 Rabat, Morocco"
        );
    }

    #[test]
    fn test_new_address_serializes_without_id() {
        let address = Address {
            id: None,
            full_name: "A".to_owned(),
            street: "S".to_owned(),
            city: "C".to_owned(),
            postal_code: "10000".to_owned(),
            country: "Morocco".to_owned(),
            phone_number: "+212".to_owned(),
            is_default: None,
        };
        let json = serde_json::to_value(&address).unwrap();
        assert!(json.get("id").is_none());
    }
}
