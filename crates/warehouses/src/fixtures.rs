//! Shared test data.

use crate::address::{Address, ContactPerson};
use crate::warehouse::WarehouseDetails;

pub(crate) fn valid_details() -> WarehouseDetails {
    named_details("hq", "HQ")
}

pub(crate) fn named_details(name: &str, title: &str) -> WarehouseDetails {
    WarehouseDetails {
        name: name.to_string(),
        title: title.to_string(),
        contact_person: ContactPerson {
            name: "Asha Rao".to_string(),
            phone: "9876543210".to_string(),
            alternative_phone: None,
            email: Some("asha@example.com".to_string()),
        },
        address: Address {
            full_address: "12 Dock Road".to_string(),
            landmark: None,
            city: "Pune".to_string(),
            state: "Maharashtra".to_string(),
            pincode: "411001".to_string(),
            country: "India".to_string(),
        },
        return_address: None,
        gstin: None,
        support_contact: None,
        notes: None,
    }
}
