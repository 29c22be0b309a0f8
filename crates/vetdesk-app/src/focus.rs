// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
}

impl RowAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

/// Roving focus over the displayed rows. `None` means no row has focus;
/// otherwise the index is always below the row count it was last clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusNavigator {
    index: Option<usize>,
}

impl FocusNavigator {
    pub const fn current_index(&self) -> Option<usize> {
        self.index
    }

    pub fn focus_next(&mut self, len: usize) {
        if len == 0 {
            self.index = None;
            return;
        }
        let next = self.index.map_or(0, |index| index.saturating_add(1));
        self.index = Some(next.min(len - 1));
    }

    pub fn focus_previous(&mut self, len: usize) {
        if len == 0 {
            self.index = None;
            return;
        }
        let previous = self.index.map_or(0, |index| index.saturating_sub(1));
        self.index = Some(previous.min(len - 1));
    }

    pub fn clear(&mut self) {
        self.index = None;
    }

    pub fn clamp(&mut self, len: usize) {
        self.index = match self.index {
            Some(_) if len == 0 => None,
            Some(index) => Some(index.min(len - 1)),
            None => None,
        };
    }

    /// Runs `callback` on the focused row of `rows`, which must be the
    /// displayed order. Returns whether the callback ran.
    pub fn trigger_action<R, F>(&self, action: RowAction, rows: &[R], callback: F) -> bool
    where
        F: FnOnce(&R, RowAction),
    {
        let Some(row) = self.index.and_then(|index| rows.get(index)) else {
            return false;
        };
        debug!(action = action.label(), index = ?self.index, "row action");
        callback(row, action);
        true
    }
}
