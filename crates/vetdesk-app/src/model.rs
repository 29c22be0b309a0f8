// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::PatientId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PetType {
    Dog,
    Cat,
    Bird,
    Fish,
    Other,
}

impl PetType {
    pub const ALL: [Self; 5] = [Self::Dog, Self::Cat, Self::Bird, Self::Fish, Self::Other];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dog => "Dog",
            Self::Cat => "Cat",
            Self::Bird => "Bird",
            Self::Fish => "Fish",
            Self::Other => "Other",
        }
    }

    /// Next entry of [`PetType::ALL`], wrapping. `None` starts at the first type.
    pub fn cycle(current: Option<Self>) -> Self {
        let Some(current) = current else {
            return Self::ALL[0];
        };
        let index = Self::ALL
            .iter()
            .position(|pet_type| *pet_type == current)
            .unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub client_name: String,
    pub pet_name: String,
    pub phone: String,
    pub pet_age: String,
    pub pet_type: PetType,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[cfg(test)]
mod tests {
    use super::{Patient, PetType};
    use crate::PatientId;

    #[test]
    fn pet_type_wire_names_match_labels() {
        for pet_type in PetType::ALL {
            let encoded = serde_json::to_string(&pet_type).expect("serialize pet type");
            assert_eq!(encoded, format!("\"{}\"", pet_type.as_str()));
        }
        assert!(serde_json::from_str::<PetType>("\"dog\"").is_err());
    }

    #[test]
    fn pet_type_cycle_wraps_and_starts_at_first() {
        assert_eq!(PetType::cycle(None), PetType::Dog);
        assert_eq!(PetType::cycle(Some(PetType::Dog)), PetType::Cat);
        assert_eq!(PetType::cycle(Some(PetType::Other)), PetType::Dog);
    }

    #[test]
    fn patient_json_uses_camel_case_and_optional_timestamps() -> anyhow::Result<()> {
        let raw = r#"{
            "id": 2,
            "clientName": "Jane Doe",
            "petName": "Charlie",
            "phone": "1234567890",
            "petAge": "5 years",
            "petType": "Cat",
            "createdAt": "2026-02-19T12:34:56Z"
        }"#;
        let patient: Patient = serde_json::from_str(raw)?;
        assert_eq!(patient.id, PatientId::new(2));
        assert_eq!(patient.client_name, "Jane Doe");
        assert_eq!(patient.pet_type, PetType::Cat);
        assert!(patient.created_at.is_some());
        assert!(patient.updated_at.is_none());
        Ok(())
    }
}
