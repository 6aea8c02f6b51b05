use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, SupplierId};

/// Contact information for a supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ContactInfo {
    fn normalized(self) -> DomainResult<Self> {
        let email = clean(self.email);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(DomainError::validation(format!("invalid email address: {email}")));
            }
        }
        Ok(Self {
            contact_person: clean(self.contact_person),
            email,
            phone: clean(self.phone),
            address: clean(self.address),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
}

impl Entity for Supplier {
    type Id = SupplierId;

    fn id(&self) -> SupplierId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// Command: register a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
}

impl NewSupplier {
    pub fn into_supplier(self, id: SupplierId, now: DateTime<Utc>) -> DomainResult<Supplier> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        Ok(Supplier {
            id,
            name: self.name.trim().to_string(),
            contact: self.contact.normalized()?,
            created_at: now,
        })
    }
}

/// Command: update supplier details. `None` keeps the existing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub contact: Option<ContactInfo>,
}

impl SupplierPatch {
    pub fn apply(self, supplier: &mut Supplier) -> DomainResult<()> {
        let name = match self.name {
            Some(name) if name.trim().is_empty() => {
                return Err(DomainError::validation("name cannot be empty"));
            }
            Some(name) => name.trim().to_string(),
            None => supplier.name.clone(),
        };
        let contact = match self.contact {
            Some(contact) => contact.normalized()?,
            None => supplier.contact.clone(),
        };
        supplier.name = name;
        supplier.contact = contact;
        Ok(())
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> NewSupplier {
        NewSupplier {
            name: "Acme Wholesale".into(),
            contact: ContactInfo {
                contact_person: Some("Dana".into()),
                email: Some(" orders@acme.test ".into()),
                phone: Some("".into()),
                address: None,
            },
        }
    }

    #[test]
    fn register_normalizes_contact() {
        let s = acme().into_supplier(SupplierId::new(), Utc::now()).unwrap();
        assert_eq!(s.contact.email.as_deref(), Some("orders@acme.test"));
        assert_eq!(s.contact.phone, None);
    }

    #[test]
    fn register_requires_name() {
        let mut cmd = acme();
        cmd.name = " ".into();
        assert_eq!(
            cmd.into_supplier(SupplierId::new(), Utc::now()).unwrap_err(),
            DomainError::validation("name is required")
        );
    }

    #[test]
    fn register_rejects_malformed_email() {
        let mut cmd = acme();
        cmd.contact.email = Some("not-an-email".into());
        assert!(cmd.into_supplier(SupplierId::new(), Utc::now()).is_err());
    }

    #[test]
    fn patch_keeps_contact_when_absent() {
        let mut s = acme().into_supplier(SupplierId::new(), Utc::now()).unwrap();
        SupplierPatch {
            name: Some("Acme Ltd".into()),
            contact: None,
        }
        .apply(&mut s)
        .unwrap();
        assert_eq!(s.name, "Acme Ltd");
        assert_eq!(s.contact.contact_person.as_deref(), Some("Dana"));
    }
}
