// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::macros::datetime;
use time::{Duration, OffsetDateTime};
use vetdesk_app::{Patient, PatientId, PetType};

const DEMO_EPOCH: OffsetDateTime = datetime!(2026-01-05 09:00:00 UTC);

const DEMO_PATIENTS: [(&str, &str, &str, &str, PetType); 14] = [
    ("Avery Walker", "Biscuit", "5124417702", "4 years", PetType::Dog),
    ("Jordan Hill", "Milo", "2065550143", "2 years", PetType::Cat),
    ("Taylor Evans", "Kiwi", "3038812290", "8 months", PetType::Bird),
    ("Riley Lopez", "Rex", "6082734415", "11 years", PetType::Dog),
    ("Morgan Gray", "Bubbles", "9194026631", "1 year", PetType::Fish),
    ("Casey Ward", "Luna", "4125519048", "7 years", PetType::Cat),
    ("alex young", "Hopper", "5036627713", "3 years", PetType::Other),
    ("Quinn Diaz", "Maple", "2087731256", "6 years", PetType::Dog),
    ("Parker Reed", "Cleo", "5128840917", "13 years", PetType::Cat),
    ("Drew Turner", "Sunny", "2069925580", "5 years", PetType::Bird),
    ("Kai Flores", "Scout", "3031148862", "10 months", PetType::Dog),
    ("Elliot Price", "Nemo", "6085506274", "2 years", PetType::Fish),
    ("Robin Foster", "Olive", "9197763309", "9 years", PetType::Cat),
    ("Rowan Brooks", "Spike", "4122289941", "15 years", PetType::Other),
];

/// Fixed roster shown by `--demo`, ids `1..=14`.
pub fn demo_roster() -> Vec<Patient> {
    DEMO_PATIENTS
        .iter()
        .zip(1_i64..)
        .map(|(&(client, pet, phone, age, pet_type), id)| {
            let created_at = DEMO_EPOCH + Duration::days(id * 3);
            Patient {
                id: PatientId::new(id),
                client_name: client.to_owned(),
                pet_name: pet.to_owned(),
                phone: phone.to_owned(),
                pet_age: age.to_owned(),
                pet_type,
                created_at: Some(created_at),
                updated_at: Some(created_at),
            }
        })
        .collect()
}
