// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::debug;

use crate::focus_env::{ElementInfo, FocusEnvironment, ListenerScope};
use crate::ids::{ContainerId, ElementId, ListenerId};
use crate::shortcuts::Key;

pub fn focusable_elements<E: FocusEnvironment + ?Sized>(
    env: &E,
    container: ContainerId,
) -> Vec<ElementInfo> {
    env.elements_in(container)
        .into_iter()
        .filter(ElementInfo::is_focusable)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKey {
    /// Not an arrow, the scope is inactive, or nothing inside can take focus.
    Ignored,
    /// The arrow was consumed and its default suppressed.
    Consumed { focused: ElementId },
}

impl ScopeKey {
    pub const fn is_consumed(self) -> bool {
        matches!(self, Self::Consumed { .. })
    }
}

/// Arrow-key traversal confined to one container, such as an open overlay.
#[derive(Debug)]
pub struct RovingFocusScope {
    container: ContainerId,
    subscription: Option<ListenerId>,
}

impl RovingFocusScope {
    pub const fn new(container: ContainerId) -> Self {
        Self {
            container,
            subscription: None,
        }
    }

    pub const fn container(&self) -> ContainerId {
        self.container
    }

    pub const fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn activate<E: FocusEnvironment + ?Sized>(&mut self, env: &mut E) {
        if self.subscription.is_none() {
            self.subscription = Some(env.subscribe(ListenerScope::Container(self.container)));
        }
    }

    pub fn deactivate<E: FocusEnvironment + ?Sized>(&mut self, env: &mut E) {
        if let Some(subscription) = self.subscription.take() {
            env.unsubscribe(subscription);
        }
    }

    pub fn handle_key<E: FocusEnvironment + ?Sized>(&self, env: &mut E, key: Key) -> ScopeKey {
        if !self.is_active() || !key.is_arrow() {
            return ScopeKey::Ignored;
        }

        let elements = focusable_elements(env, self.container);
        if elements.is_empty() {
            return ScopeKey::Ignored;
        }

        let len = elements.len();
        let current = env
            .active_element()
            .and_then(|active| elements.iter().position(|element| element.id == active));
        let next = match (key, current) {
            (Key::Down | Key::Right, None) => 0,
            (Key::Down | Key::Right, Some(index)) => (index + 1) % len,
            (_, None | Some(0)) => len - 1,
            (_, Some(index)) => index - 1,
        };

        let target = elements[next].id;
        env.focus(target);
        debug!(
            container = self.container.get(),
            element = target.get(),
            "roving focus moved"
        );
        ScopeKey::Consumed { focused: target }
    }
}
