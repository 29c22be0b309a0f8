// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Single-column sort cycling over a row list.
//!
//! A column with a comparator is sortable. Activating it walks the cycle
//! ascending, descending, unsorted. Descending order is the ascending
//! (stable) order reversed as a whole, so rows that compare equal appear in
//! the opposite of their input order.

use std::cmp::Ordering;

use tracing::debug;

pub type Comparator<T> = fn(&T, &T) -> Ordering;
pub type Accessor<T> = fn(&T) -> String;
pub type Renderer<T> = fn(&str, &T, &'static str) -> String;

pub struct Column<T> {
    pub key: &'static str,
    pub title: &'static str,
    pub value: Accessor<T>,
    pub comparator: Option<Comparator<T>>,
    pub renderer: Option<Renderer<T>>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Column<T> {}

impl<T> std::fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("sortable", &self.is_sortable())
            .finish()
    }
}

impl<T> Column<T> {
    pub const fn new(key: &'static str, title: &'static str, value: Accessor<T>) -> Self {
        Self {
            key,
            title,
            value,
            comparator: None,
            renderer: None,
        }
    }

    pub fn sortable(mut self, comparator: Comparator<T>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn rendered(mut self, renderer: Renderer<T>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub const fn is_sortable(&self) -> bool {
        self.comparator.is_some()
    }

    pub fn display(&self, row: &T) -> String {
        let value = (self.value)(row);
        match self.renderer {
            Some(renderer) => renderer(&value, row, self.key),
            None => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Next,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: &'static str,
    pub direction: SortDirection,
}

/// Active sort column and direction. Either both are set or neither is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    active: Option<SortSpec>,
}

impl SortState {
    pub const UNSORTED: Self = Self { active: None };

    pub const fn by(key: &'static str, direction: SortDirection) -> Self {
        Self {
            active: Some(SortSpec { key, direction }),
        }
    }

    pub const fn spec(self) -> Option<SortSpec> {
        self.active
    }

    pub fn key(self) -> Option<&'static str> {
        self.active.map(|spec| spec.key)
    }

    pub fn direction(self) -> Option<SortDirection> {
        self.active.map(|spec| spec.direction)
    }

    pub fn direction_for(self, key: &str) -> Option<SortDirection> {
        self.active
            .filter(|spec| spec.key == key)
            .map(|spec| spec.direction)
    }

    pub const fn is_unsorted(self) -> bool {
        self.active.is_none()
    }
}

pub fn cycle<T>(state: SortState, column: &Column<T>) -> SortState {
    if !column.is_sortable() {
        return state;
    }

    let next = match state.active {
        Some(SortSpec {
            key,
            direction: SortDirection::Asc,
        }) if key == column.key => SortState::by(key, SortDirection::Desc),
        Some(SortSpec {
            key,
            direction: SortDirection::Desc,
        }) if key == column.key => SortState::UNSORTED,
        _ => SortState::by(column.key, SortDirection::Asc),
    };
    debug!(column = column.key, from = ?state.spec(), to = ?next.spec(), "sort cycled");
    next
}

/// Rows in display order. Unsorted state, or a key whose column lost its
/// comparator, yields the caller's order.
pub fn render<'a, T>(rows: &'a [T], columns: &[Column<T>], state: &SortState) -> Vec<&'a T> {
    let mut ordered = rows.iter().collect::<Vec<&T>>();
    let Some(spec) = state.active else {
        return ordered;
    };
    let Some(comparator) = columns
        .iter()
        .find(|column| column.key == spec.key)
        .and_then(|column| column.comparator)
    else {
        return ordered;
    };

    ordered.sort_by(|left, right| comparator(left, right));
    if spec.direction == SortDirection::Desc {
        ordered.reverse();
    }
    ordered
}

pub fn cycle_among_sortable<T>(
    state: SortState,
    columns: &[Column<T>],
    direction: CycleDirection,
) -> SortState {
    let sortable = columns
        .iter()
        .filter(|column| column.is_sortable())
        .collect::<Vec<_>>();
    if sortable.is_empty() {
        return state;
    }

    let len = sortable.len();
    let current = state
        .key()
        .and_then(|key| sortable.iter().position(|column| column.key == key));
    let next = match (direction, current) {
        (CycleDirection::Next, None) => 0,
        (CycleDirection::Next, Some(index)) => (index + 1) % len,
        (CycleDirection::Previous, None | Some(0)) => len - 1,
        (CycleDirection::Previous, Some(index)) => index - 1,
    };

    // Selecting by keyboard behaves like a fresh header click.
    cycle(SortState::UNSORTED, sortable[next])
}
