// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::debug;

use crate::focus_env::{FocusEnvironment, ListenerScope};
use crate::ids::ListenerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Tab,
    Enter,
    Escape,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
}

impl Key {
    /// Case-insensitive for characters, exact otherwise.
    pub fn matches(self, other: Self) -> bool {
        match (self, other) {
            (Self::Char(left), Self::Char(right)) => {
                left == right || left.to_lowercase().eq(right.to_lowercase())
            }
            _ => self == other,
        }
    }

    pub const fn is_arrow(self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::Left | Self::Right)
    }

    pub fn label(self) -> String {
        match self {
            Self::Char(' ') => "Space".to_owned(),
            Self::Char(ch) => ch.to_string(),
            Self::Up => "↑".to_owned(),
            Self::Down => "↓".to_owned(),
            Self::Left => "←".to_owned(),
            Self::Right => "→".to_owned(),
            Self::Tab => "Tab".to_owned(),
            Self::Enter => "Enter".to_owned(),
            Self::Escape => "Esc".to_owned(),
            Self::Backspace => "Backspace".to_owned(),
            Self::Delete => "Del".to_owned(),
            Self::Home => "Home".to_owned(),
            Self::End => "End".to_owned(),
            Self::PageUp => "PgUp".to_owned(),
            Self::PageDown => "PgDn".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputTarget {
    #[default]
    Document,
    TextEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub target: InputTarget,
}

impl KeyInput {
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            target: InputTarget::Document,
        }
    }

    pub const fn with_ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = ctrl;
        self
    }

    pub const fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    pub const fn on(mut self, target: InputTarget) -> Self {
        self.target = target;
        self
    }
}

/// Keys that still reach the rules while a text field has focus.
const TEXT_EXEMPT_KEYS: [Key; 2] = [Key::Char('/'), Key::Char('?')];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutRule<A> {
    pub key: Key,
    pub ctrl: Option<bool>,
    pub shift: Option<bool>,
    pub action: A,
    pub prevent_default: bool,
    pub enabled: bool,
}

impl<A> ShortcutRule<A> {
    pub const fn new(key: Key, action: A) -> Self {
        Self {
            key,
            ctrl: None,
            shift: None,
            action,
            prevent_default: true,
            enabled: true,
        }
    }

    pub fn ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = Some(ctrl);
        self
    }

    pub fn shift(mut self, shift: bool) -> Self {
        self.shift = Some(shift);
        self
    }

    pub fn prevent_default(mut self, prevent_default: bool) -> Self {
        self.prevent_default = prevent_default;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Unspecified modifiers match either state.
    pub fn matches(&self, input: &KeyInput) -> bool {
        self.enabled
            && self.key.matches(input.key)
            && self.ctrl.is_none_or(|ctrl| ctrl == input.ctrl)
            && self.shift.is_none_or(|shift| shift == input.shift)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// No subscription is held, so the key never reached the rules.
    Inactive,
    /// A text field swallowed the key.
    Suppressed,
    Unmatched,
    Handled { default_prevented: bool },
}

impl Dispatch {
    pub const fn default_prevented(self) -> bool {
        matches!(
            self,
            Self::Handled {
                default_prevented: true
            }
        )
    }

    pub const fn is_handled(self) -> bool {
        matches!(self, Self::Handled { .. })
    }
}

/// Owns one global key subscription. The rule list is passed on every
/// dispatch so `enabled` flags and actions are always current.
#[derive(Debug, Default)]
pub struct ShortcutDispatcher {
    subscription: Option<ListenerId>,
}

impl ShortcutDispatcher {
    pub const fn new() -> Self {
        Self { subscription: None }
    }

    pub const fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn activate<E: FocusEnvironment + ?Sized>(&mut self, env: &mut E) {
        if self.subscription.is_none() {
            self.subscription = Some(env.subscribe(ListenerScope::Global));
        }
    }

    pub fn deactivate<E: FocusEnvironment + ?Sized>(&mut self, env: &mut E) {
        if let Some(subscription) = self.subscription.take() {
            env.unsubscribe(subscription);
        }
    }

    pub fn dispatch<A, F>(&self, rules: &[ShortcutRule<A>], input: &KeyInput, handler: F) -> Dispatch
    where
        F: FnOnce(&A, &KeyInput),
    {
        if !self.is_active() {
            return Dispatch::Inactive;
        }
        if input.target == InputTarget::TextEntry && !TEXT_EXEMPT_KEYS.contains(&input.key) {
            return Dispatch::Suppressed;
        }

        let Some((index, rule)) = rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(input))
        else {
            return Dispatch::Unmatched;
        };

        debug!(
            rule = index,
            key = %input.key.label(),
            shift = input.shift,
            "shortcut matched"
        );
        handler(&rule.action, input);
        Dispatch::Handled {
            default_prevented: rule.prevent_default,
        }
    }
}
