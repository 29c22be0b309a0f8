// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{Patient, PetType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientField {
    ClientName,
    Phone,
    PetName,
    PetAge,
}

impl PatientField {
    pub const ALL: [Self; 4] = [Self::ClientName, Self::Phone, Self::PetName, Self::PetAge];

    pub const fn label(self) -> &'static str {
        match self {
            Self::ClientName => "Client Name",
            Self::Phone => "Phone",
            Self::PetName => "Pet Name",
            Self::PetAge => "Pet Age",
        }
    }

    pub const fn placeholder(self) -> &'static str {
        match self {
            Self::ClientName => "Enter client name",
            Self::Phone => "Enter phone number",
            Self::PetName => "Enter pet name",
            Self::PetAge => "e.g., 5 years",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatientFormInput {
    pub client_name: String,
    pub phone: String,
    pub pet_name: String,
    pub pet_age: String,
    pub pet_type: Option<PetType>,
}

impl PatientFormInput {
    pub fn from_patient(patient: &Patient) -> Self {
        Self {
            client_name: patient.client_name.clone(),
            phone: patient.phone.clone(),
            pet_name: patient.pet_name.clone(),
            pet_age: patient.pet_age.clone(),
            pet_type: Some(patient.pet_type),
        }
    }

    pub fn field(&self, field: PatientField) -> &str {
        match field {
            PatientField::ClientName => &self.client_name,
            PatientField::Phone => &self.phone,
            PatientField::PetName => &self.pet_name,
            PatientField::PetAge => &self.pet_age,
        }
    }

    pub fn field_mut(&mut self, field: PatientField) -> &mut String {
        match field {
            PatientField::ClientName => &mut self.client_name,
            PatientField::Phone => &mut self.phone,
            PatientField::PetName => &mut self.pet_name,
            PatientField::PetAge => &mut self.pet_age,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<()> {
        for field in PatientField::ALL {
            if self.field(field).trim().is_empty() {
                bail!(
                    "{} is required -- fill it in and retry",
                    field.label().to_ascii_lowercase()
                );
            }
        }
        if self.pet_type.is_none() {
            bail!("pet type is required -- choose a pet type and retry");
        }
        Ok(())
    }

    /// Validated copy with surrounding whitespace removed from every field.
    pub fn normalized(&self) -> Result<Self> {
        self.validate()?;
        Ok(Self {
            client_name: self.client_name.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            pet_name: self.pet_name.trim().to_owned(),
            pet_age: self.pet_age.trim().to_owned(),
            pet_type: self.pet_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{PatientField, PatientFormInput};
    use crate::PetType;

    fn complete_form() -> PatientFormInput {
        PatientFormInput {
            client_name: "Alice Smith".to_owned(),
            phone: "1234567890".to_owned(),
            pet_name: "Max".to_owned(),
            pet_age: "5 years".to_owned(),
            pet_type: Some(PetType::Dog),
        }
    }

    #[test]
    fn complete_form_validates() {
        assert!(complete_form().validate().is_ok());
    }

    #[test]
    fn blank_after_trim_is_rejected() {
        let mut form = complete_form();
        form.pet_name = "   ".to_owned();
        let error = form.validate().expect_err("blank pet name should fail");
        assert!(error.to_string().contains("pet name is required"));
    }

    #[test]
    fn missing_pet_type_is_rejected() {
        let form = PatientFormInput {
            pet_type: None,
            ..complete_form()
        };
        let error = form.validate().expect_err("missing pet type should fail");
        assert!(error.to_string().contains("pet type is required"));
        assert!(!form.is_complete());
    }

    #[test]
    fn normalized_trims_every_field() -> anyhow::Result<()> {
        let mut form = complete_form();
        form.client_name = "  Alice Smith ".to_owned();
        form.field_mut(PatientField::PetAge).push(' ');
        let normalized = form.normalized()?;
        assert_eq!(normalized.client_name, "Alice Smith");
        assert_eq!(normalized.pet_age, "5 years");
        Ok(())
    }
}
