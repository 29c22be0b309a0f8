// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};
use vetdesk_app::{Patient, PatientFormInput, PatientId, PetType};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const DOG_NAMES: [&str; 10] = [
    "Biscuit", "Rex", "Maple", "Bruno", "Pepper", "Scout", "Rosie", "Duke", "Hazel", "Buster",
];
const CAT_NAMES: [&str; 10] = [
    "Milo", "Luna", "Cleo", "Tiger", "Olive", "Simba", "Nala", "Jasper", "Willow", "Smokey",
];
const BIRD_NAMES: [&str; 6] = ["Kiwi", "Sunny", "Pip", "Mango", "Echo", "Blue"];
const FISH_NAMES: [&str; 6] = ["Bubbles", "Nemo", "Finn", "Goldie", "Splash", "Coral"];
const OTHER_NAMES: [&str; 6] = ["Hopper", "Spike", "Nibbles", "Shelly", "Peanut", "Ziggy"];

const AREA_CODES: [&str; 8] = ["512", "206", "303", "608", "919", "412", "503", "208"];

/// Fixed instant all generated timestamps count back from.
const REFERENCE_NOW: OffsetDateTime = datetime!(2026-01-01 00:00:00 UTC);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

#[derive(Debug, Clone)]
pub struct ClinicFaker {
    rng: DeterministicRng,
}

impl ClinicFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn client_name(&mut self) -> String {
        format!("{} {}", self.pick(&FIRST_NAMES), self.pick(&LAST_NAMES))
    }

    pub fn pet_type(&mut self) -> PetType {
        // Dogs and cats dominate a small practice's roster.
        match self.rng.int_n(10) {
            0..=3 => PetType::Dog,
            4..=6 => PetType::Cat,
            7 => PetType::Bird,
            8 => PetType::Fish,
            _ => PetType::Other,
        }
    }

    pub fn pet_name(&mut self, pet_type: PetType) -> String {
        let names: &[&str] = match pet_type {
            PetType::Dog => &DOG_NAMES,
            PetType::Cat => &CAT_NAMES,
            PetType::Bird => &BIRD_NAMES,
            PetType::Fish => &FISH_NAMES,
            PetType::Other => &OTHER_NAMES,
        };
        self.pick(names).to_owned()
    }

    pub fn phone(&mut self) -> String {
        let area = self.pick(&AREA_CODES);
        let exchange = 200 + self.rng.int_n(800);
        let line = self.rng.int_n(10_000);
        format!("{area}{exchange:03}{line:04}")
    }

    pub fn pet_age(&mut self) -> String {
        if self.rng.int_n(5) == 0 {
            let months = 1 + self.rng.int_n(11);
            let unit = if months == 1 { "month" } else { "months" };
            return format!("{months} {unit}");
        }
        let years = 1 + self.rng.int_n(16);
        let unit = if years == 1 { "year" } else { "years" };
        format!("{years} {unit}")
    }

    pub fn form_input(&mut self) -> PatientFormInput {
        let pet_type = self.pet_type();
        PatientFormInput {
            client_name: self.client_name(),
            phone: self.phone(),
            pet_name: self.pet_name(pet_type),
            pet_age: self.pet_age(),
            pet_type: Some(pet_type),
        }
    }

    pub fn patient(&mut self, id: i64) -> Patient {
        let pet_type = self.pet_type();
        let created_at = REFERENCE_NOW - Duration::hours(self.rng.int_n(24 * 365) as i64);
        Patient {
            id: PatientId::new(id),
            client_name: self.client_name(),
            pet_name: self.pet_name(pet_type),
            phone: self.phone(),
            pet_age: self.pet_age(),
            pet_type,
            created_at: Some(created_at),
            updated_at: Some(created_at),
        }
    }

    /// Patients with ids `1..=count`.
    pub fn patients(&mut self, count: usize) -> Vec<Patient> {
        (1..=count as i64).map(|id| self.patient(id)).collect()
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

/// Small hand-written roster for assertions that need known values.
pub fn sample_patients() -> Vec<Patient> {
    [
        (1, "Jane Doe", "Charlie", "1234567890", "5 years", PetType::Cat),
        (2, "Bob Stone", "Rex", "5550001111", "3 years", PetType::Dog),
        (3, "amy lin", "Kiwi", "5552223333", "8 months", PetType::Bird),
        (4, "Carl Ng", "Milo", "5554445555", "12 years", PetType::Cat),
        (5, "Dana Fox", "Bubbles", "5556667777", "1 year", PetType::Fish),
    ]
    .into_iter()
    .map(|(id, client, pet, phone, age, pet_type)| Patient {
        id: PatientId::new(id),
        client_name: client.to_owned(),
        pet_name: pet.to_owned(),
        phone: phone.to_owned(),
        pet_age: age.to_owned(),
        pet_type,
        created_at: Some(REFERENCE_NOW),
        updated_at: Some(REFERENCE_NOW),
    })
    .collect()
}

pub fn temp_roster_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("patients.json");
    Ok((dir, path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}
