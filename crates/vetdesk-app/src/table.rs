// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::focus::{FocusNavigator, RowAction};
use crate::sort::{self, Column, CycleDirection, SortState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCommand {
    FocusNextRow,
    FocusPreviousRow,
    TriggerAction(RowAction),
    CycleSortColumns(CycleDirection),
    ClearFocus,
}

/// Sort state plus row focus over one table. Every call takes the caller's
/// current rows, so the controller never holds a stale copy.
#[derive(Debug, Clone)]
pub struct TableController<T> {
    columns: Vec<Column<T>>,
    sort: SortState,
    focus: FocusNavigator,
}

impl<T> TableController<T> {
    pub fn new(columns: Vec<Column<T>>) -> Self {
        Self {
            columns,
            sort: SortState::UNSORTED,
            focus: FocusNavigator::default(),
        }
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub const fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn displayed<'a>(&self, rows: &'a [T]) -> Vec<&'a T> {
        sort::render(rows, &self.columns, &self.sort)
    }

    /// Header click. Unknown and unsortable keys leave the state alone.
    pub fn handle_sort(&mut self, key: &str, rows: &[T]) -> SortState {
        if let Some(column) = self.columns.iter().find(|column| column.key == key) {
            self.sort = sort::cycle(self.sort, column);
        }
        self.reconcile(rows);
        self.sort
    }

    pub fn cycle_sort_columns(&mut self, direction: CycleDirection, rows: &[T]) -> SortState {
        self.sort = sort::cycle_among_sortable(self.sort, &self.columns, direction);
        self.reconcile(rows);
        self.sort
    }

    pub fn focus_next_row(&mut self, rows: &[T]) {
        self.focus.focus_next(rows.len());
    }

    pub fn focus_previous_row(&mut self, rows: &[T]) {
        self.focus.focus_previous(rows.len());
    }

    pub const fn current_focused_row(&self) -> Option<usize> {
        self.focus.current_index()
    }

    pub fn clear_focus(&mut self) {
        self.focus.clear();
    }

    /// Resolves the focused index against the sorted order of `rows`.
    pub fn trigger_action<F>(&self, action: RowAction, rows: &[T], callback: F) -> bool
    where
        F: FnOnce(&T, RowAction),
    {
        let displayed = self.displayed(rows);
        self.focus
            .trigger_action(action, &displayed, |row, action| callback(*row, action))
    }

    pub fn focused<'a>(&self, rows: &'a [T]) -> Option<&'a T> {
        let index = self.focus.current_index()?;
        self.displayed(rows).get(index).copied()
    }

    /// Call whenever the row set changes.
    pub fn reconcile(&mut self, rows: &[T]) {
        self.focus.clamp(rows.len());
    }

    /// Applies a command; row actions are routed to `on_action`.
    pub fn apply<F>(&mut self, command: TableCommand, rows: &[T], on_action: F) -> bool
    where
        F: FnOnce(&T, RowAction),
    {
        match command {
            TableCommand::FocusNextRow => self.focus_next_row(rows),
            TableCommand::FocusPreviousRow => self.focus_previous_row(rows),
            TableCommand::TriggerAction(action) => {
                return self.trigger_action(action, rows, on_action);
            }
            TableCommand::CycleSortColumns(direction) => {
                self.cycle_sort_columns(direction, rows);
            }
            TableCommand::ClearFocus => self.clear_focus(),
        }
        true
    }
}
