use serde::{Deserialize, Serialize};

use parcelhub_core::{FieldErrors, ValueObject};

use crate::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_TEXT_LEN, optional_email, optional_phone, optional_text,
    required_phone, required_pincode, required_text,
};

/// Postal address, shared by the pickup address and the optional return address.
///
/// Missing JSON fields deserialize as empty so validation can report them as
/// `required` instead of failing the whole request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub full_address: String,
    pub landmark: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
}

impl ValueObject for Address {}

impl Address {
    /// Trimmed/normalized copy; failures are recorded under `prefix.<field>`.
    pub fn normalized(&self, prefix: &str, errors: &mut FieldErrors) -> Address {
        Address {
            full_address: required_text(
                errors,
                &format!("{prefix}.full_address"),
                &self.full_address,
                MAX_ADDRESS_LEN,
            ),
            landmark: optional_text(
                errors,
                &format!("{prefix}.landmark"),
                self.landmark.as_deref(),
                MAX_TEXT_LEN,
            ),
            city: required_text(errors, &format!("{prefix}.city"), &self.city, MAX_TEXT_LEN),
            state: required_text(errors, &format!("{prefix}.state"), &self.state, MAX_TEXT_LEN),
            pincode: required_pincode(errors, &format!("{prefix}.pincode"), &self.pincode),
            country: required_text(errors, &format!("{prefix}.country"), &self.country, MAX_TEXT_LEN),
        }
    }
}

/// Person the courier calls at pickup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactPerson {
    pub name: String,
    /// 10 national digits once normalized.
    pub phone: String,
    pub alternative_phone: Option<String>,
    pub email: Option<String>,
}

impl ValueObject for ContactPerson {}

impl ContactPerson {
    pub fn normalized(&self, prefix: &str, errors: &mut FieldErrors) -> ContactPerson {
        ContactPerson {
            name: required_text(errors, &format!("{prefix}.name"), &self.name, MAX_NAME_LEN),
            phone: required_phone(errors, &format!("{prefix}.phone"), &self.phone),
            alternative_phone: optional_phone(
                errors,
                &format!("{prefix}.alternative_phone"),
                self.alternative_phone.as_deref(),
            ),
            email: optional_email(errors, &format!("{prefix}.email"), self.email.as_deref()),
        }
    }
}

/// Customer-facing support channel printed on labels and return notices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportContact {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ValueObject for SupportContact {}

impl SupportContact {
    /// `None` when both channels are blank.
    pub fn normalized(&self, prefix: &str, errors: &mut FieldErrors) -> Option<SupportContact> {
        let contact = SupportContact {
            email: optional_email(errors, &format!("{prefix}.email"), self.email.as_deref()),
            phone: optional_phone(errors, &format!("{prefix}.phone"), self.phone.as_deref()),
        };
        (contact.email.is_some() || contact.phone.is_some()).then_some(contact)
    }
}
