// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use time::OffsetDateTime;
use tracing::{debug, info};
use vetdesk_app::{Patient, PatientFormInput, PatientId, PetType};

#[derive(Debug, Deserialize)]
struct RosterFile {
    patients: Vec<Patient>,
}

/// Reads a roster shaped like `{"patients": [...]}`.
pub fn load_roster(path: &Path) -> Result<Vec<Patient>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read roster file {}", path.display()))?;
    let roster = parse_roster(&raw)
        .with_context(|| format!("import roster {}", path.display()))?;
    info!(path = %path.display(), patients = roster.len(), "roster imported");
    Ok(roster)
}

pub fn parse_roster(raw: &str) -> Result<Vec<Patient>> {
    let file: RosterFile = serde_json::from_str(raw)
        .context("decode JSON; expected an object with a \"patients\" array")?;

    let mut seen = BTreeSet::new();
    for patient in &file.patients {
        if !seen.insert(patient.id) {
            bail!(
                "duplicate patient id {}; every patient needs a unique id",
                patient.id.get()
            );
        }
    }
    Ok(file.patients)
}

/// Keeps the roster in memory for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryRuntime {
    patients: Vec<Patient>,
    next_id: i64,
}

impl MemoryRuntime {
    pub fn new(patients: Vec<Patient>) -> Self {
        let next_id = patients
            .iter()
            .map(|patient| patient.id.get())
            .max()
            .unwrap_or(0)
            + 1;
        Self { patients, next_id }
    }

    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }
}

fn pet_type_of(input: &PatientFormInput) -> Result<PetType> {
    input
        .pet_type
        .ok_or_else(|| anyhow!("pet type is required -- choose a pet type and retry"))
}

impl vetdesk_tui::PatientRuntime for MemoryRuntime {
    fn load_patients(&mut self) -> Result<Vec<Patient>> {
        Ok(self.patients.clone())
    }

    fn create_patient(&mut self, input: &PatientFormInput) -> Result<Patient> {
        let input = input.normalized()?;
        let pet_type = pet_type_of(&input)?;
        let now = OffsetDateTime::now_utc();
        let patient = Patient {
            id: PatientId::new(self.next_id),
            client_name: input.client_name,
            pet_name: input.pet_name,
            phone: input.phone,
            pet_age: input.pet_age,
            pet_type,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.next_id += 1;
        self.patients.push(patient.clone());
        debug!(id = patient.id.get(), "patient created");
        Ok(patient)
    }

    fn update_patient(&mut self, id: PatientId, input: &PatientFormInput) -> Result<Patient> {
        let input = input.normalized()?;
        let pet_type = pet_type_of(&input)?;
        let patient = self
            .patients
            .iter_mut()
            .find(|patient| patient.id == id)
            .ok_or_else(|| anyhow!("patient {} no longer exists; reload and retry", id.get()))?;

        patient.client_name = input.client_name;
        patient.pet_name = input.pet_name;
        patient.phone = input.phone;
        patient.pet_age = input.pet_age;
        patient.pet_type = pet_type;
        patient.updated_at = Some(OffsetDateTime::now_utc());
        Ok(patient.clone())
    }

    fn delete_patient(&mut self, id: PatientId) -> Result<()> {
        let before = self.patients.len();
        self.patients.retain(|patient| patient.id != id);
        if self.patients.len() == before {
            bail!("patient {} no longer exists; reload and retry", id.get());
        }
        Ok(())
    }
}
