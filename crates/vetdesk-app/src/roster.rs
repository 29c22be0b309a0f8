// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::cmp::Ordering;

use crate::filter::Searchable;
use crate::model::{Patient, PetType};
use crate::sort::Column;

impl Searchable for Patient {
    type Category = PetType;

    fn category(&self) -> PetType {
        self.pet_type
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.client_name.as_str(),
            self.phone.as_str(),
            self.pet_name.as_str(),
            self.pet_age.as_str(),
            self.pet_type.as_str(),
        ]
    }
}

/// Dashboard columns in display order.
pub fn patient_columns() -> Vec<Column<Patient>> {
    vec![
        Column::new("clientName", "Client Name", |patient: &Patient| {
            patient.client_name.clone()
        })
        .sortable(by_client_name),
        Column::new("phone", "Phone", |patient: &Patient| patient.phone.clone())
            .rendered(|value, _, _| format_phone(value)),
        Column::new("petName", "Pet Name", |patient: &Patient| {
            patient.pet_name.clone()
        })
        .sortable(by_pet_name),
        Column::new("petAge", "Pet Age", |patient: &Patient| patient.pet_age.clone())
            .sortable(by_pet_age),
        Column::new("petType", "Pet Type", |patient: &Patient| {
            patient.pet_type.as_str().to_owned()
        })
        .sortable(by_pet_type),
    ]
}

fn compare_text(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}

fn by_client_name(left: &Patient, right: &Patient) -> Ordering {
    compare_text(&left.client_name, &right.client_name)
}

fn by_pet_name(left: &Patient, right: &Patient) -> Ordering {
    compare_text(&left.pet_name, &right.pet_name)
}

fn by_pet_age(left: &Patient, right: &Patient) -> Ordering {
    leading_integer(&left.pet_age).cmp(&leading_integer(&right.pet_age))
}

fn by_pet_type(left: &Patient, right: &Patient) -> Ordering {
    left.pet_type.as_str().cmp(right.pet_type.as_str())
}

/// Integer prefix of free text such as "5 years"; anything else reads as 0.
pub fn leading_integer(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end]
        .parse::<i64>()
        .map(|value| sign * value)
        .unwrap_or(0)
}

/// Ten-digit numbers render as `(555) 123-4567`; anything else is shown as typed.
pub fn format_phone(raw: &str) -> String {
    let digits = raw
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();
    if digits.len() != 10 || raw.chars().any(|ch| ch.is_alphabetic()) {
        return raw.to_owned();
    }
    format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
}

/// Distinct pet types present in `rows`, ordered by name.
pub fn available_pet_types(rows: &[Patient]) -> Vec<PetType> {
    let mut types = Vec::new();
    for patient in rows {
        if !types.contains(&patient.pet_type) {
            types.push(patient.pet_type);
        }
    }
    types.sort_by_key(|pet_type| pet_type.as_str());
    types
}
