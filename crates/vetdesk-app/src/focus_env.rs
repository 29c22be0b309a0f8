// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::ids::{ContainerId, ElementId, ListenerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Button,
    Input,
    Select,
    TextArea,
    Generic,
}

impl ElementKind {
    pub const fn is_text_entry(self) -> bool {
        matches!(self, Self::Input | Self::TextArea)
    }

    pub const fn is_interactive(self) -> bool {
        !matches!(self, Self::Generic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementInfo {
    pub id: ElementId,
    pub kind: ElementKind,
    pub disabled: bool,
    pub tab_index: Option<i32>,
}

impl ElementInfo {
    pub const fn new(id: ElementId, kind: ElementKind) -> Self {
        Self {
            id,
            kind,
            disabled: false,
            tab_index: None,
        }
    }

    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub const fn with_tab_index(mut self, tab_index: i32) -> Self {
        self.tab_index = Some(tab_index);
        self
    }

    /// Enabled interactive elements, plus anything with an explicit
    /// non-negative tab index.
    pub const fn is_focusable(&self) -> bool {
        let explicit = match self.tab_index {
            Some(index) => index >= 0,
            None => false,
        };
        (self.kind.is_interactive() && !self.disabled) || explicit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerScope {
    Global,
    Container(ContainerId),
}

/// Capabilities the keyboard components need from whatever surface renders
/// the elements.
pub trait FocusEnvironment {
    /// Every element inside the container, in traversal order.
    fn elements_in(&self, container: ContainerId) -> Vec<ElementInfo>;
    fn active_element(&self) -> Option<ElementId>;
    fn focus(&mut self, element: ElementId);
    fn blur(&mut self);
    fn subscribe(&mut self, scope: ListenerScope) -> ListenerId;
    fn unsubscribe(&mut self, listener: ListenerId);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryFocusEnv {
    containers: BTreeMap<ContainerId, Vec<ElementInfo>>,
    active: Option<ElementId>,
    listeners: Vec<(ListenerId, ListenerScope)>,
    next_listener: i64,
}

impl MemoryFocusEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the container's contents.
    pub fn mount(&mut self, container: ContainerId, elements: Vec<ElementInfo>) {
        self.containers.insert(container, elements);
    }

    pub fn unmount(&mut self, container: ContainerId) {
        let Some(elements) = self.containers.remove(&container) else {
            return;
        };
        if self
            .active
            .is_some_and(|active| elements.iter().any(|element| element.id == active))
        {
            self.active = None;
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementInfo> {
        self.containers
            .values()
            .flat_map(|elements| elements.iter())
            .find(|element| element.id == id)
    }

    pub fn set_disabled(&mut self, id: ElementId, disabled: bool) {
        if let Some(element) = self
            .containers
            .values_mut()
            .flat_map(|elements| elements.iter_mut())
            .find(|element| element.id == id)
        {
            element.disabled = disabled;
        }
    }

    pub fn active_kind(&self) -> Option<ElementKind> {
        self.active
            .and_then(|active| self.element(active))
            .map(|element| element.kind)
    }

    pub fn listeners(&self) -> &[(ListenerId, ListenerScope)] {
        &self.listeners
    }

    pub fn listener_count(&self, scope: ListenerScope) -> usize {
        self.listeners
            .iter()
            .filter(|(_, registered)| *registered == scope)
            .count()
    }
}

impl FocusEnvironment for MemoryFocusEnv {
    fn elements_in(&self, container: ContainerId) -> Vec<ElementInfo> {
        self.containers.get(&container).cloned().unwrap_or_default()
    }

    fn active_element(&self) -> Option<ElementId> {
        self.active
    }

    fn focus(&mut self, element: ElementId) {
        if self.element(element).is_some() {
            self.active = Some(element);
        }
    }

    fn blur(&mut self) {
        self.active = None;
    }

    fn subscribe(&mut self, scope: ListenerScope) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId::new(self.next_listener);
        self.listeners.push((id, scope));
        id
    }

    fn unsubscribe(&mut self, listener: ListenerId) {
        self.listeners.retain(|(id, _)| *id != listener);
    }
}
