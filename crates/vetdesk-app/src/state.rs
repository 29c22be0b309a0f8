// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::PatientId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    AddForm,
    EditForm(PatientId),
    DeleteConfirm(PatientId),
    Help,
    PetTypeFilter,
}

impl Overlay {
    /// Overlays that take over the keyboard; the filter dropdown does not.
    pub const fn is_blocking(self) -> bool {
        !matches!(self, Self::PetTypeFilter)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    pub overlay: Option<Overlay>,
    pub status_line: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCommand {
    OpenOverlay(Overlay),
    CloseOverlay,
    ToggleFilter,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    OverlayOpened(Overlay),
    OverlayClosed(Overlay),
    StatusUpdated(String),
    StatusCleared,
}

impl DashboardState {
    pub fn dispatch(&mut self, command: DashboardCommand) -> Vec<DashboardEvent> {
        match command {
            DashboardCommand::OpenOverlay(overlay) => self.open(overlay),
            DashboardCommand::CloseOverlay => self.close().into_iter().collect(),
            DashboardCommand::ToggleFilter => {
                if self.overlay == Some(Overlay::PetTypeFilter) {
                    self.close().into_iter().collect()
                } else {
                    self.open(Overlay::PetTypeFilter)
                }
            }
            DashboardCommand::SetStatus(message) => {
                self.status_line = Some(message.clone());
                vec![DashboardEvent::StatusUpdated(message)]
            }
            DashboardCommand::ClearStatus => {
                self.status_line = None;
                vec![DashboardEvent::StatusCleared]
            }
        }
    }

    pub const fn is_any_modal_open(&self) -> bool {
        self.overlay.is_some()
    }

    /// Form, delete confirmation, or help is open.
    pub fn blocks_table_shortcuts(&self) -> bool {
        self.overlay.is_some_and(Overlay::is_blocking)
    }

    pub fn is_filter_open(&self) -> bool {
        self.overlay == Some(Overlay::PetTypeFilter)
    }

    fn open(&mut self, overlay: Overlay) -> Vec<DashboardEvent> {
        // One overlay at a time; opening replaces whatever was up.
        let mut events = self.close().into_iter().collect::<Vec<_>>();
        self.overlay = Some(overlay);
        events.push(DashboardEvent::OverlayOpened(overlay));
        events
    }

    fn close(&mut self) -> Option<DashboardEvent> {
        self.overlay.take().map(DashboardEvent::OverlayClosed)
    }
}
