// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use vetdesk_app::{
    Column, ContainerId, CycleDirection, DEFAULT_SEARCH_DEBOUNCE, DashboardCommand,
    DashboardEvent, DashboardState, DebouncedFilter, ElementId, ElementInfo, ElementKind,
    FocusEnvironment, InputTarget, Key, KeyInput, MemoryFocusEnv, Overlay, Patient, PatientField,
    PatientFormInput, PatientId, PetType, RovingFocusScope, RowAction, ShortcutDispatcher,
    ShortcutRule, SortDirection, SortState, TableCommand, TableController, available_pet_types,
    patient_columns,
};

const EVENT_POLL: Duration = Duration::from_millis(120);
const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(4);

const MAIN_CONTAINER: ContainerId = ContainerId::new(1);
const FORM_CONTAINER: ContainerId = ContainerId::new(2);
const DELETE_CONTAINER: ContainerId = ContainerId::new(3);
const HELP_CONTAINER: ContainerId = ContainerId::new(4);
const FILTER_CONTAINER: ContainerId = ContainerId::new(5);

const SEARCH_INPUT: ElementId = ElementId::new(1);
const FORM_FIELD_BASE: i64 = 10;
const FORM_PET_TYPE: ElementId = ElementId::new(14);
const FORM_CANCEL: ElementId = ElementId::new(15);
const FORM_SAVE: ElementId = ElementId::new(16);
const DELETE_CANCEL: ElementId = ElementId::new(20);
const DELETE_CONFIRM: ElementId = ElementId::new(21);
const HELP_CLOSE: ElementId = ElementId::new(30);
const FILTER_ALL: ElementId = ElementId::new(40);
const FILTER_OPTION_BASE: i64 = 41;

const SORT_MARK_NONE: &str = "↕";
const SORT_MARK_ASC: &str = "▲";
const SORT_MARK_DESC: &str = "▼";

pub trait PatientRuntime {
    fn load_patients(&mut self) -> Result<Vec<Patient>>;
    fn create_patient(&mut self, input: &PatientFormInput) -> Result<Patient>;
    fn update_patient(&mut self, id: PatientId, input: &PatientFormInput) -> Result<Patient>;
    fn delete_patient(&mut self, id: PatientId) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuiOptions {
    pub search_debounce: Duration,
    pub status_timeout: Duration,
}

impl Default for TuiOptions {
    fn default() -> Self {
        Self {
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DashboardAction {
    ShowHelp,
    FocusSearch,
    AddPatient,
    ToggleFilter,
    Table(TableCommand),
    SortColumn(usize),
    Dismiss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FormUiState {
    input: PatientFormInput,
    target: Option<PatientId>,
    error: Option<String>,
}

#[derive(Debug)]
struct ViewData {
    patients: Vec<Patient>,
    filter: DebouncedFilter<PetType>,
    table: TableController<Patient>,
    env: MemoryFocusEnv,
    dispatcher: ShortcutDispatcher,
    overlay_scope: Option<RovingFocusScope>,
    form: Option<FormUiState>,
    filter_options: Vec<PetType>,
    status_token: u64,
    options: TuiOptions,
}

impl ViewData {
    fn new(options: TuiOptions) -> Self {
        let mut env = MemoryFocusEnv::new();
        env.mount(
            MAIN_CONTAINER,
            vec![ElementInfo::new(SEARCH_INPUT, ElementKind::Input)],
        );
        let mut dispatcher = ShortcutDispatcher::new();
        dispatcher.activate(&mut env);

        Self {
            patients: Vec::new(),
            filter: DebouncedFilter::new(options.search_debounce),
            table: TableController::new(patient_columns()),
            env,
            dispatcher,
            overlay_scope: None,
            form: None,
            filter_options: Vec::new(),
            status_token: 0,
            options,
        }
    }
}

pub fn run_app<R: PatientRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    options: TuiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = refresh_view_data(runtime, &mut view_data) {
        warn!(error = %format!("{error:#}"), "initial load failed");
        state.dispatch(DashboardCommand::SetStatus(format!(
            "load failed: {error:#}"
        )));
    }
    info!(patients = view_data.patients.len(), "dashboard ready");

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);
        if view_data.filter.tick(Instant::now()) {
            reconcile_rows(&mut view_data);
        }

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let timeout = poll_timeout(&view_data, Instant::now());
        let has_event = match event::poll(timeout).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) => {
                if handle_key_event(
                    state,
                    runtime,
                    &mut view_data,
                    &internal_tx,
                    key,
                    Instant::now(),
                ) {
                    break;
                }
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    view_data.dispatcher.deactivate(&mut view_data.env);
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

/// Wakes early enough to commit a pending search.
fn poll_timeout(view_data: &ViewData, now: Instant) -> Duration {
    view_data
        .filter
        .next_deadline()
        .map_or(EVENT_POLL, |deadline| {
            deadline.saturating_duration_since(now).min(EVENT_POLL)
        })
}

fn process_internal_events(
    state: &mut DashboardState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(DashboardCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64, after: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(after);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut DashboardState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(DashboardCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(
        internal_tx,
        view_data.status_token,
        view_data.options.status_timeout,
    );
}

fn refresh_view_data<R: PatientRuntime>(runtime: &mut R, view_data: &mut ViewData) -> Result<()> {
    let patients = runtime.load_patients().context("load patients")?;
    view_data.filter_options = available_pet_types(&patients);
    view_data.patients = patients;
    reconcile_rows(view_data);
    Ok(())
}

fn reload_after_change<R: PatientRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) -> bool {
    match refresh_view_data(runtime, view_data) {
        Ok(()) => true,
        Err(error) => {
            warn!(error = %format!("{error:#}"), "reload failed");
            emit_status(state, view_data, internal_tx, format!("reload failed: {error:#}"));
            false
        }
    }
}

/// Rows after category and search filtering, before sorting.
fn visible_patients(view_data: &ViewData) -> Vec<Patient> {
    view_data
        .filter
        .filtered_rows(&view_data.patients)
        .into_iter()
        .cloned()
        .collect()
}

fn reconcile_rows(view_data: &mut ViewData) {
    let rows = visible_patients(view_data);
    view_data.table.reconcile(&rows);
}

fn key_input(key: KeyEvent, env: &MemoryFocusEnv) -> Option<KeyInput> {
    let mut shift = key.modifiers.contains(KeyModifiers::SHIFT);
    let mapped = match key.code {
        KeyCode::Char(ch) => Key::Char(ch),
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => {
            shift = true;
            Key::Tab
        }
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        _ => return None,
    };
    let target = if env.active_kind().is_some_and(ElementKind::is_text_entry) {
        InputTarget::TextEntry
    } else {
        InputTarget::Document
    };
    Some(
        KeyInput::new(mapped)
            .with_ctrl(key.modifiers.contains(KeyModifiers::CONTROL))
            .with_shift(shift)
            .on(target),
    )
}

/// Rebuilt for every key so each `enabled` flag reflects the current state.
fn dashboard_shortcuts(
    state: &DashboardState,
    has_rows: bool,
    column_count: usize,
) -> Vec<ShortcutRule<DashboardAction>> {
    let idle = !state.is_any_modal_open();
    let table_keys = !state.blocks_table_shortcuts();

    let mut rules = vec![
        ShortcutRule::new(Key::Char('?'), DashboardAction::ShowHelp).enabled(idle),
        ShortcutRule::new(Key::Char('/'), DashboardAction::FocusSearch).enabled(idle),
        ShortcutRule::new(Key::Char('n'), DashboardAction::AddPatient).enabled(idle),
        ShortcutRule::new(Key::Char('f'), DashboardAction::ToggleFilter).enabled(idle),
        ShortcutRule::new(
            Key::Down,
            DashboardAction::Table(TableCommand::FocusNextRow),
        )
        .enabled(idle && has_rows),
        ShortcutRule::new(
            Key::Up,
            DashboardAction::Table(TableCommand::FocusPreviousRow),
        )
        .enabled(idle && has_rows),
        ShortcutRule::new(
            Key::Char('e'),
            DashboardAction::Table(TableCommand::TriggerAction(RowAction::Edit)),
        )
        .enabled(idle),
        ShortcutRule::new(
            Key::Char('d'),
            DashboardAction::Table(TableCommand::TriggerAction(RowAction::Delete)),
        )
        .enabled(idle),
        ShortcutRule::new(
            Key::Tab,
            DashboardAction::Table(TableCommand::CycleSortColumns(CycleDirection::Next)),
        )
        .shift(false)
        .enabled(table_keys),
        ShortcutRule::new(
            Key::Tab,
            DashboardAction::Table(TableCommand::CycleSortColumns(CycleDirection::Previous)),
        )
        .shift(true)
        .enabled(table_keys),
        ShortcutRule::new(Key::Escape, DashboardAction::Dismiss)
            .prevent_default(false)
            .enabled(table_keys),
    ];

    // No pointer in a terminal: digits stand in for header clicks.
    rules.extend(
        (0..column_count.min(9))
            .zip('1'..='9')
            .map(|(index, digit)| {
                ShortcutRule::new(Key::Char(digit), DashboardAction::SortColumn(index))
                    .enabled(idle)
            }),
    );
    rules
}

fn handle_key_event<R: PatientRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
    now: Instant,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    let Some(input) = key_input(key, &view_data.env) else {
        return false;
    };

    if let Some(scope) = &view_data.overlay_scope
        && scope.handle_key(&mut view_data.env, input.key).is_consumed()
    {
        return false;
    }

    if input.key == Key::Escape && state.blocks_table_shortcuts() {
        close_overlay(state, view_data);
        return false;
    }

    let has_rows = !visible_patients(view_data).is_empty();
    let rules = dashboard_shortcuts(state, has_rows, view_data.table.columns().len());
    let mut fired = None;
    let outcome = view_data
        .dispatcher
        .dispatch(&rules, &input, |action, _| fired = Some(*action));
    if let Some(action) = fired {
        run_dashboard_action(state, view_data, internal_tx, action);
    }
    if outcome.default_prevented() {
        return false;
    }

    handle_default_key(state, runtime, view_data, internal_tx, input, now);
    false
}

fn run_dashboard_action(
    state: &mut DashboardState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    action: DashboardAction,
) {
    match action {
        DashboardAction::ShowHelp => open_overlay(state, view_data, Overlay::Help),
        DashboardAction::FocusSearch => view_data.env.focus(SEARCH_INPUT),
        DashboardAction::AddPatient => open_form(state, view_data, None),
        DashboardAction::ToggleFilter => {
            release_overlay_scope(view_data);
            let events = state.dispatch(DashboardCommand::ToggleFilter);
            if events.contains(&DashboardEvent::OverlayOpened(Overlay::PetTypeFilter)) {
                mount_overlay(view_data, Overlay::PetTypeFilter);
            }
        }
        DashboardAction::Table(command) => {
            run_table_command(state, view_data, internal_tx, command);
        }
        DashboardAction::SortColumn(index) => {
            let Some(key) = view_data.table.columns().get(index).map(|column| column.key) else {
                return;
            };
            let rows = visible_patients(view_data);
            let before = view_data.table.sort_state();
            let after = view_data.table.handle_sort(key, &rows);
            if before != after {
                let message = sort_status_text(view_data.table.columns(), after);
                emit_status(state, view_data, internal_tx, message);
            }
        }
        DashboardAction::Dismiss => {
            if state.is_filter_open() {
                close_overlay(state, view_data);
            } else {
                view_data.table.clear_focus();
            }
        }
    }
}

fn run_table_command(
    state: &mut DashboardState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: TableCommand,
) {
    let rows = visible_patients(view_data);
    let mut requested = None;
    view_data.table.apply(command, &rows, |patient, action| {
        requested = Some((patient.clone(), action));
    });

    match (command, requested) {
        (_, Some((patient, RowAction::Edit))) => open_form(state, view_data, Some(&patient)),
        (_, Some((patient, RowAction::Delete))) => {
            open_overlay(state, view_data, Overlay::DeleteConfirm(patient.id));
        }
        (TableCommand::TriggerAction(action), None) => {
            let message = format!("focus a row to {}", action.label());
            emit_status(state, view_data, internal_tx, message);
        }
        (TableCommand::CycleSortColumns(_), None) => {
            let message = sort_status_text(view_data.table.columns(), view_data.table.sort_state());
            emit_status(state, view_data, internal_tx, message);
        }
        _ => {}
    }
}

fn sort_status_text(columns: &[Column<Patient>], sort: SortState) -> String {
    let Some(spec) = sort.spec() else {
        return "unsorted".to_owned();
    };
    let title = columns
        .iter()
        .find(|column| column.key == spec.key)
        .map_or(spec.key, |column| column.title);
    format!("sorted by {title} {}", spec.direction.label())
}

const fn container_for(overlay: Overlay) -> ContainerId {
    match overlay {
        Overlay::AddForm | Overlay::EditForm(_) => FORM_CONTAINER,
        Overlay::DeleteConfirm(_) => DELETE_CONTAINER,
        Overlay::Help => HELP_CONTAINER,
        Overlay::PetTypeFilter => FILTER_CONTAINER,
    }
}

fn form_field_element(field: PatientField) -> ElementId {
    let offset = PatientField::ALL
        .iter()
        .position(|candidate| *candidate == field)
        .unwrap_or(0);
    ElementId::new(FORM_FIELD_BASE + offset as i64)
}

fn form_field_for(element: ElementId) -> Option<PatientField> {
    let offset = element.get().checked_sub(FORM_FIELD_BASE)?;
    usize::try_from(offset)
        .ok()
        .and_then(|offset| PatientField::ALL.get(offset).copied())
}

fn filter_option_element(index: usize) -> ElementId {
    ElementId::new(FILTER_OPTION_BASE + index as i64)
}

/// `Some(None)` is the "all types" entry.
fn filter_choice_for(element: ElementId, options: &[PetType]) -> Option<Option<PetType>> {
    if element == FILTER_ALL {
        return Some(None);
    }
    let offset = element.get().checked_sub(FILTER_OPTION_BASE)?;
    usize::try_from(offset)
        .ok()
        .and_then(|offset| options.get(offset).copied())
        .map(Some)
}

fn overlay_elements(overlay: Overlay, filter_options: &[PetType]) -> Vec<ElementInfo> {
    match overlay {
        Overlay::AddForm | Overlay::EditForm(_) => PatientField::ALL
            .iter()
            .map(|field| ElementInfo::new(form_field_element(*field), ElementKind::Input))
            .chain([
                ElementInfo::new(FORM_PET_TYPE, ElementKind::Select),
                ElementInfo::new(FORM_CANCEL, ElementKind::Button),
                ElementInfo::new(FORM_SAVE, ElementKind::Button),
            ])
            .collect(),
        Overlay::DeleteConfirm(_) => vec![
            ElementInfo::new(DELETE_CANCEL, ElementKind::Button),
            ElementInfo::new(DELETE_CONFIRM, ElementKind::Button),
        ],
        Overlay::Help => vec![ElementInfo::new(HELP_CLOSE, ElementKind::Button)],
        Overlay::PetTypeFilter => std::iter::once(ElementInfo::new(FILTER_ALL, ElementKind::Button))
            .chain(
                (0..filter_options.len())
                    .map(|index| ElementInfo::new(filter_option_element(index), ElementKind::Button)),
            )
            .collect(),
    }
}

fn initial_focus(overlay: Overlay, view_data: &ViewData) -> ElementId {
    match overlay {
        Overlay::AddForm | Overlay::EditForm(_) => form_field_element(PatientField::ClientName),
        Overlay::DeleteConfirm(_) => DELETE_CANCEL,
        Overlay::Help => HELP_CLOSE,
        Overlay::PetTypeFilter => view_data
            .filter
            .selected_category()
            .and_then(|selected| {
                view_data
                    .filter_options
                    .iter()
                    .position(|option| option == selected)
            })
            .map_or(FILTER_ALL, filter_option_element),
    }
}

fn open_overlay(state: &mut DashboardState, view_data: &mut ViewData, overlay: Overlay) {
    release_overlay_scope(view_data);
    state.dispatch(DashboardCommand::OpenOverlay(overlay));
    mount_overlay(view_data, overlay);
}

/// Mounts the overlay's elements and binds a roving scope to them.
fn mount_overlay(view_data: &mut ViewData, overlay: Overlay) {
    let container = container_for(overlay);
    view_data
        .env
        .mount(container, overlay_elements(overlay, &view_data.filter_options));
    let mut scope = RovingFocusScope::new(container);
    scope.activate(&mut view_data.env);
    view_data.overlay_scope = Some(scope);

    let focus = initial_focus(overlay, view_data);
    view_data.env.focus(focus);
    debug!(?overlay, "overlay opened");
}

fn close_overlay(state: &mut DashboardState, view_data: &mut ViewData) {
    state.dispatch(DashboardCommand::CloseOverlay);
    release_overlay_scope(view_data);
    view_data.form = None;
}

fn release_overlay_scope(view_data: &mut ViewData) {
    if let Some(mut scope) = view_data.overlay_scope.take() {
        scope.deactivate(&mut view_data.env);
        view_data.env.unmount(scope.container());
    }
}

fn open_form(state: &mut DashboardState, view_data: &mut ViewData, patient: Option<&Patient>) {
    let (overlay, form) = match patient {
        Some(patient) => (
            Overlay::EditForm(patient.id),
            FormUiState {
                input: PatientFormInput::from_patient(patient),
                target: Some(patient.id),
                error: None,
            },
        ),
        None => (
            Overlay::AddForm,
            FormUiState {
                input: PatientFormInput::default(),
                target: None,
                error: None,
            },
        ),
    };
    open_overlay(state, view_data, overlay);
    view_data.form = Some(form);
    sync_save_button(view_data);
}

/// Save stays disabled, and out of arrow traversal, until the form validates.
fn sync_save_button(view_data: &mut ViewData) {
    let complete = view_data
        .form
        .as_ref()
        .is_some_and(|form| form.input.is_complete());
    view_data.env.set_disabled(FORM_SAVE, !complete);
}

fn is_disabled(view_data: &ViewData, element: ElementId) -> bool {
    view_data
        .env
        .element(element)
        .is_some_and(|info| info.disabled)
}

/// What the focused element does with a key no shortcut claimed.
fn handle_default_key<R: PatientRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    input: KeyInput,
    now: Instant,
) {
    let Some(active) = view_data.env.active_element() else {
        return;
    };

    if active == SEARCH_INPUT {
        edit_search(view_data, input, now);
        return;
    }

    if let Some(field) = form_field_for(active) {
        edit_form_field(state, runtime, view_data, internal_tx, field, input);
        return;
    }

    match input.key {
        Key::Char(' ') if active == FORM_PET_TYPE => cycle_form_pet_type(view_data),
        Key::Char(ch) if active == FORM_PET_TYPE && !input.ctrl => {
            pick_pet_type_by_initial(view_data, ch);
        }
        Key::Enter if active == FORM_PET_TYPE => {
            submit_form(state, runtime, view_data, internal_tx);
        }
        Key::Enter | Key::Char(' ') => {
            activate_element(state, runtime, view_data, internal_tx, active);
        }
        Key::Tab => move_within_overlay(view_data, input.shift),
        _ => {}
    }
}

fn edit_search(view_data: &mut ViewData, input: KeyInput, now: Instant) {
    match input.key {
        Key::Char(ch) if !input.ctrl => {
            let mut query = view_data.filter.raw_query().to_owned();
            query.push(ch);
            view_data.filter.set_query(query, now);
        }
        Key::Backspace => {
            let mut query = view_data.filter.raw_query().to_owned();
            query.pop();
            view_data.filter.set_query(query, now);
        }
        Key::Enter | Key::Escape => view_data.env.blur(),
        _ => {}
    }
}

fn edit_form_field<R: PatientRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    field: PatientField,
    input: KeyInput,
) {
    match input.key {
        Key::Char(ch) if !input.ctrl => {
            if let Some(form) = view_data.form.as_mut() {
                form.input.field_mut(field).push(ch);
                form.error = None;
            }
            sync_save_button(view_data);
        }
        Key::Backspace => {
            if let Some(form) = view_data.form.as_mut() {
                form.input.field_mut(field).pop();
                form.error = None;
            }
            sync_save_button(view_data);
        }
        Key::Enter => submit_form(state, runtime, view_data, internal_tx),
        Key::Tab => move_within_overlay(view_data, input.shift),
        _ => {}
    }
}

/// Tab inside an overlay walks the same order as the arrows.
fn move_within_overlay(view_data: &mut ViewData, backwards: bool) {
    let key = if backwards { Key::Up } else { Key::Down };
    if let Some(scope) = &view_data.overlay_scope {
        scope.handle_key(&mut view_data.env, key);
    }
}

fn cycle_form_pet_type(view_data: &mut ViewData) {
    if let Some(form) = view_data.form.as_mut() {
        form.input.pet_type = Some(PetType::cycle(form.input.pet_type));
        form.error = None;
    }
    sync_save_button(view_data);
}

fn pick_pet_type_by_initial(view_data: &mut ViewData, initial: char) {
    let Some(pet_type) = PetType::ALL.into_iter().find(|pet_type| {
        pet_type
            .as_str()
            .chars()
            .next()
            .is_some_and(|first| first.eq_ignore_ascii_case(&initial))
    }) else {
        return;
    };
    if let Some(form) = view_data.form.as_mut() {
        form.input.pet_type = Some(pet_type);
        form.error = None;
    }
    sync_save_button(view_data);
}

fn activate_element<R: PatientRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    element: ElementId,
) {
    match element {
        FORM_CANCEL | DELETE_CANCEL | HELP_CLOSE => close_overlay(state, view_data),
        FORM_SAVE => {
            if !is_disabled(view_data, FORM_SAVE) {
                submit_form(state, runtime, view_data, internal_tx);
            }
        }
        FORM_PET_TYPE => cycle_form_pet_type(view_data),
        DELETE_CONFIRM => confirm_delete(state, runtime, view_data, internal_tx),
        _ => {
            if let Some(choice) = filter_choice_for(element, &view_data.filter_options) {
                choose_category(state, view_data, internal_tx, choice);
            }
        }
    }
}

fn choose_category(
    state: &mut DashboardState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    choice: Option<PetType>,
) {
    view_data.filter.set_category(choice);
    close_overlay(state, view_data);
    reconcile_rows(view_data);
    let label = choice.map_or("all pet types", PetType::as_str);
    emit_status(state, view_data, internal_tx, format!("showing {label}"));
}

fn submit_form<R: PatientRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(form) = view_data.form.as_ref() else {
        return;
    };
    let target = form.target;
    let input = match form.input.normalized() {
        Ok(input) => input,
        Err(error) => {
            let message = error.to_string();
            if let Some(form) = view_data.form.as_mut() {
                form.error = Some(message.clone());
            }
            emit_status(state, view_data, internal_tx, message);
            return;
        }
    };

    let saved = match target {
        Some(id) => runtime.update_patient(id, &input),
        None => runtime.create_patient(&input),
    };
    match saved {
        Ok(patient) => {
            info!(id = patient.id.get(), created = target.is_none(), "patient saved");
            close_overlay(state, view_data);
            if reload_after_change(state, runtime, view_data, internal_tx) {
                let verb = if target.is_some() { "updated" } else { "added" };
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("{} {verb}", patient.pet_name),
                );
            }
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "save failed");
            emit_status(state, view_data, internal_tx, format!("save failed: {error:#}"));
        }
    }
}

fn confirm_delete<R: PatientRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(Overlay::DeleteConfirm(id)) = state.overlay else {
        return;
    };
    let pet_name = view_data
        .patients
        .iter()
        .find(|patient| patient.id == id)
        .map_or_else(|| "patient".to_owned(), |patient| patient.pet_name.clone());

    match runtime.delete_patient(id) {
        Ok(()) => {
            info!(id = id.get(), "patient deleted");
            close_overlay(state, view_data);
            if reload_after_change(state, runtime, view_data, internal_tx) {
                emit_status(state, view_data, internal_tx, format!("{pet_name} deleted"));
            }
        }
        Err(error) => {
            warn!(error = %format!("{error:#}"), "delete failed");
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("delete failed: {error:#}"),
            );
        }
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &DashboardState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let search_style = if view_data.env.active_element() == Some(SEARCH_INPUT) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    };
    let search = Paragraph::new(search_bar_text(view_data))
        .style(search_style)
        .block(Block::default().title("vetdesk").borders(Borders::ALL));
    frame.render_widget(search, layout[0]);

    render_patient_table(frame, layout[1], view_data);

    let status_widget = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, layout[2]);

    let Some(overlay) = state.overlay else {
        return;
    };
    let active = view_data.env.active_element();
    let (title, body, area) = match overlay {
        Overlay::AddForm | Overlay::EditForm(_) => {
            let Some(form) = &view_data.form else {
                return;
            };
            let title = if form.target.is_some() {
                "edit patient"
            } else {
                "add patient"
            };
            (
                title,
                render_form_text(form, active),
                centered_rect(60, 60, frame.area()),
            )
        }
        Overlay::DeleteConfirm(id) => {
            let patient = view_data.patients.iter().find(|patient| patient.id == id);
            (
                "delete patient",
                render_delete_text(patient, active),
                centered_rect(50, 30, frame.area()),
            )
        }
        Overlay::Help => (
            "keyboard shortcuts",
            help_overlay_text().to_owned(),
            centered_rect(70, 60, frame.area()),
        ),
        Overlay::PetTypeFilter => (
            "pet type",
            render_filter_text(view_data, active),
            centered_rect(30, 40, frame.area()),
        ),
    };
    frame.render_widget(Clear, area);
    let widget = Paragraph::new(body).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(widget, area);
}

fn search_bar_text(view_data: &ViewData) -> String {
    let cursor = if view_data.env.active_element() == Some(SEARCH_INPUT) {
        "▏"
    } else {
        ""
    };
    let category = view_data
        .filter
        .selected_category()
        .map_or("All", |pet_type| pet_type.as_str());
    format!(
        "search: {}{cursor}  |  type: {category}",
        view_data.filter.raw_query()
    )
}

fn render_patient_table(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let rows = visible_patients(view_data);
    let displayed = view_data.table.displayed(&rows);
    let block = Block::default()
        .title(table_title(view_data, displayed.len()))
        .borders(Borders::ALL);

    if displayed.is_empty() {
        let empty = Paragraph::new(empty_table_message(view_data)).block(block);
        frame.render_widget(empty, area);
        return;
    }

    let columns = view_data.table.columns();
    let sort = view_data.table.sort_state();
    let header = Row::new(columns.iter().enumerate().map(|(index, column)| {
        Cell::from(header_label(index, column, sort)).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let focused = view_data.table.current_focused_row();
    let body = displayed.iter().enumerate().map(|(index, patient)| {
        let style = if focused == Some(index) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(
            columns
                .iter()
                .map(|column| Cell::from(column.display(patient)))
                .collect::<Vec<_>>(),
        )
        .style(style)
    });

    let widths = vec![Constraint::Min(10); columns.len().max(1)];
    let table = Table::new(body, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(table, area);
}

fn header_label(index: usize, column: &Column<Patient>, sort: SortState) -> String {
    let mut label = format!("{} {}", index + 1, column.title);
    if column.is_sortable() {
        let marker = match sort.direction_for(column.key) {
            Some(SortDirection::Asc) => SORT_MARK_ASC,
            Some(SortDirection::Desc) => SORT_MARK_DESC,
            None => SORT_MARK_NONE,
        };
        label.push(' ');
        label.push_str(marker);
    }
    label
}

fn table_title(view_data: &ViewData, shown: usize) -> String {
    format!("patients {shown}/{}", view_data.patients.len())
}

fn empty_table_message(view_data: &ViewData) -> &'static str {
    if view_data.patients.is_empty() {
        "No patients yet. Press n to add one."
    } else {
        "No patients match this search"
    }
}

fn focus_marker(active: Option<ElementId>, element: ElementId) -> &'static str {
    if active == Some(element) { "›" } else { " " }
}

fn button_label(label: &str, active: Option<ElementId>, element: ElementId) -> String {
    if active == Some(element) {
        format!("[>{label}<]")
    } else {
        format!("[ {label} ]")
    }
}

fn render_form_text(form: &FormUiState, active: Option<ElementId>) -> String {
    let mut lines = PatientField::ALL
        .iter()
        .map(|field| {
            let element = form_field_element(*field);
            let value = form.input.field(*field);
            let shown = if value.is_empty() && active != Some(element) {
                format!("({})", field.placeholder())
            } else if active == Some(element) {
                format!("{value}▏")
            } else {
                value.to_owned()
            };
            format!(
                "{} {}: {shown}",
                focus_marker(active, element),
                field.label()
            )
        })
        .collect::<Vec<_>>();

    let pet_type = form
        .input
        .pet_type
        .map_or("(space to choose)", PetType::as_str);
    lines.push(format!(
        "{} Pet Type: {pet_type}",
        focus_marker(active, FORM_PET_TYPE)
    ));
    lines.push(String::new());
    let save = if form.target.is_some() { "Update" } else { "Add" };
    lines.push(format!(
        "  {}  {}",
        button_label("Cancel", active, FORM_CANCEL),
        button_label(save, active, FORM_SAVE)
    ));
    if let Some(error) = &form.error {
        lines.push(String::new());
        lines.push(format!("  {error}"));
    }
    lines.join("\n")
}

fn render_delete_text(patient: Option<&Patient>, active: Option<ElementId>) -> String {
    let subject = patient.map_or_else(
        || "this patient".to_owned(),
        |patient| format!("{} ({})", patient.pet_name, patient.client_name),
    );
    [
        format!("Delete {subject}?"),
        "This cannot be undone.".to_owned(),
        String::new(),
        format!(
            "  {}  {}",
            button_label("Cancel", active, DELETE_CANCEL),
            button_label("Delete", active, DELETE_CONFIRM)
        ),
    ]
    .join("\n")
}

fn render_filter_text(view_data: &ViewData, active: Option<ElementId>) -> String {
    let selected = view_data.filter.selected_category();
    let check = |chosen: bool| if chosen { "●" } else { "○" };

    let mut lines = vec![format!(
        "{} {} All types",
        focus_marker(active, FILTER_ALL),
        check(selected.is_none())
    )];
    lines.extend(
        view_data
            .filter_options
            .iter()
            .enumerate()
            .map(|(index, pet_type)| {
                format!(
                    "{} {} {}",
                    focus_marker(active, filter_option_element(index)),
                    check(selected == Some(pet_type)),
                    pet_type.as_str()
                )
            }),
    );
    lines.join("\n")
}

fn help_overlay_text() -> &'static str {
    "general: ? help | / search | f pet type filter | n add patient | ctrl+q quit\n\
table: ↑/↓ focus row | e edit row | d delete row | esc clear focus\n\
sort: tab/shift+tab cycle column | 1-9 sort by header\n\
search: type to filter | backspace erase | enter/esc leave\n\
dialogs: arrows or tab move | enter activate | space choose | esc close"
}

fn status_text(state: &DashboardState) -> String {
    // Blocking overlays carry their own hints.
    if state.blocks_table_shortcuts() {
        return state.status_line.clone().unwrap_or_default();
    }
    let default = "? help | / search | n add | f filter | ↑/↓ row | e edit | d del | tab sort | ctrl+q quit";
    match &state.status_line {
        Some(status) => format!("{status} | {default}"),
        None => default.to_owned(),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        DELETE_CANCEL, DELETE_CONFIRM, FILTER_ALL, FILTER_CONTAINER, FORM_CANCEL, FORM_CONTAINER,
        FORM_PET_TYPE, FORM_SAVE, FormUiState, InternalEvent, PatientRuntime, SEARCH_INPUT, TuiOptions,
        ViewData, filter_option_element, form_field_element, handle_key_event, header_label,
        poll_timeout, refresh_view_data, render_delete_text, render_form_text, status_text,
        visible_patients,
    };
    use anyhow::bail;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};
    use vetdesk_app::{
        DashboardState, FocusEnvironment, ListenerScope, Overlay, Patient, PatientField,
        PatientFormInput, PatientId, PetType, SortDirection, SortState, patient_columns,
    };
    use vetdesk_testkit::sample_patients;

    #[derive(Debug, Default)]
    struct TestRuntime {
        patients: Vec<Patient>,
        next_id: i64,
        created: Vec<PatientFormInput>,
        updated: Vec<(PatientId, PatientFormInput)>,
        deleted: Vec<PatientId>,
        fail_saves: bool,
    }

    impl TestRuntime {
        fn with_samples() -> Self {
            Self {
                patients: sample_patients(),
                next_id: 100,
                ..Self::default()
            }
        }

        fn patient_from(id: PatientId, input: &PatientFormInput) -> Patient {
            Patient {
                id,
                client_name: input.client_name.clone(),
                pet_name: input.pet_name.clone(),
                phone: input.phone.clone(),
                pet_age: input.pet_age.clone(),
                pet_type: input.pet_type.unwrap_or(PetType::Other),
                created_at: None,
                updated_at: None,
            }
        }
    }

    impl PatientRuntime for TestRuntime {
        fn load_patients(&mut self) -> anyhow::Result<Vec<Patient>> {
            Ok(self.patients.clone())
        }

        fn create_patient(&mut self, input: &PatientFormInput) -> anyhow::Result<Patient> {
            if self.fail_saves {
                bail!("roster is read-only");
            }
            self.next_id += 1;
            let patient = Self::patient_from(PatientId::new(self.next_id), input);
            self.created.push(input.clone());
            self.patients.push(patient.clone());
            Ok(patient)
        }

        fn update_patient(
            &mut self,
            id: PatientId,
            input: &PatientFormInput,
        ) -> anyhow::Result<Patient> {
            if self.fail_saves {
                bail!("roster is read-only");
            }
            let patient = Self::patient_from(id, input);
            if let Some(existing) = self.patients.iter_mut().find(|existing| existing.id == id) {
                *existing = patient.clone();
            }
            self.updated.push((id, input.clone()));
            Ok(patient)
        }

        fn delete_patient(&mut self, id: PatientId) -> anyhow::Result<()> {
            self.patients.retain(|patient| patient.id != id);
            self.deleted.push(id);
            Ok(())
        }
    }

    fn internal_tx() -> mpsc::Sender<InternalEvent> {
        let (tx, _rx) = mpsc::channel();
        tx
    }

    fn setup_with(mut runtime: TestRuntime) -> (DashboardState, TestRuntime, ViewData) {
        let mut view_data = ViewData::new(TuiOptions::default());
        refresh_view_data(&mut runtime, &mut view_data).expect("load should work");
        (DashboardState::default(), runtime, view_data)
    }

    fn setup() -> (DashboardState, TestRuntime, ViewData) {
        setup_with(TestRuntime::with_samples())
    }

    fn press_at(
        state: &mut DashboardState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        code: KeyCode,
        modifiers: KeyModifiers,
        now: Instant,
    ) -> bool {
        handle_key_event(
            state,
            runtime,
            view_data,
            &internal_tx(),
            KeyEvent::new(code, modifiers),
            now,
        )
    }

    fn press(
        state: &mut DashboardState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        code: KeyCode,
    ) -> bool {
        let modifiers = match code {
            KeyCode::BackTab => KeyModifiers::SHIFT,
            _ => KeyModifiers::NONE,
        };
        press_at(state, runtime, view_data, code, modifiers, Instant::now())
    }

    fn type_text(
        state: &mut DashboardState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        text: &str,
    ) {
        for ch in text.chars() {
            press(state, runtime, view_data, KeyCode::Char(ch));
        }
    }

    fn visible_ids(view_data: &ViewData) -> Vec<i64> {
        let rows = visible_patients(view_data);
        view_data
            .table
            .displayed(&rows)
            .iter()
            .map(|patient| patient.id.get())
            .collect()
    }

    #[test]
    fn ctrl_q_quits() {
        let (mut state, mut runtime, mut view_data) = setup();
        assert!(press_at(
            &mut state,
            &mut runtime,
            &mut view_data,
            KeyCode::Char('q'),
            KeyModifiers::CONTROL,
            Instant::now(),
        ));
    }

    #[test]
    fn dashboard_holds_one_global_subscription() {
        let (_, _, view_data) = setup();
        assert_eq!(view_data.env.listener_count(ListenerScope::Global), 1);
    }

    #[test]
    fn arrows_move_row_focus_and_clamp() {
        let (mut state, mut runtime, mut view_data) = setup();
        assert_eq!(view_data.table.current_focused_row(), None);

        for _ in 0..7 {
            press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        }
        assert_eq!(view_data.table.current_focused_row(), Some(4));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Up);
        assert_eq!(view_data.table.current_focused_row(), Some(3));
    }

    #[test]
    fn empty_roster_disables_row_navigation() {
        let (mut state, mut runtime, mut view_data) = setup_with(TestRuntime::default());
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        assert_eq!(view_data.table.current_focused_row(), None);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('e'));
        assert_eq!(state.overlay, None);
        assert_eq!(state.status_line.as_deref(), Some("focus a row to edit"));
    }

    #[test]
    fn digit_sorts_by_header_and_edit_targets_sorted_row() {
        let (mut state, mut runtime, mut view_data) = setup();

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('1'));
        assert_eq!(
            view_data.table.sort_state(),
            SortState::by("clientName", SortDirection::Asc)
        );
        assert_eq!(visible_ids(&view_data), [3, 2, 4, 5, 1]);

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('e'));
        assert_eq!(state.overlay, Some(Overlay::EditForm(PatientId::new(3))));
        let form = view_data.form.as_ref().expect("form should be open");
        assert_eq!(form.input.client_name, "amy lin");
        assert_eq!(
            view_data.env.active_element(),
            Some(form_field_element(PatientField::ClientName))
        );
    }

    #[test]
    fn unsortable_header_digit_is_a_noop() {
        let (mut state, mut runtime, mut view_data) = setup();
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('2'));
        assert!(view_data.table.sort_state().is_unsorted());
        assert_eq!(visible_ids(&view_data), [1, 2, 3, 4, 5]);
    }

    #[test]
    fn tab_and_shift_tab_cycle_sortable_columns() {
        let (mut state, mut runtime, mut view_data) = setup();

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        assert_eq!(
            view_data.table.sort_state(),
            SortState::by("clientName", SortDirection::Asc)
        );
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        assert_eq!(
            view_data.table.sort_state(),
            SortState::by("petName", SortDirection::Asc)
        );

        press(&mut state, &mut runtime, &mut view_data, KeyCode::BackTab);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::BackTab);
        assert_eq!(
            view_data.table.sort_state(),
            SortState::by("petType", SortDirection::Asc)
        );
        assert_eq!(
            state.status_line.as_deref(),
            Some("sorted by Pet Type asc")
        );
    }

    #[test]
    fn search_waits_for_quiet_period() {
        let (mut state, mut runtime, mut view_data) = setup();
        let base = Instant::now();

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('/'));
        assert_eq!(view_data.env.active_element(), Some(SEARCH_INPUT));

        for (offset, ch) in [(0, 'r'), (50, 'e'), (100, 'x')] {
            press_at(
                &mut state,
                &mut runtime,
                &mut view_data,
                KeyCode::Char(ch),
                KeyModifiers::NONE,
                base + Duration::from_millis(offset),
            );
        }
        assert_eq!(view_data.filter.raw_query(), "rex");
        assert_eq!(state.overlay, None, "typed e must not open the editor");
        assert_eq!(visible_ids(&view_data).len(), 5);

        assert!(!view_data.filter.tick(base + Duration::from_millis(299)));
        assert!(view_data.filter.tick(base + Duration::from_millis(300)));
        assert_eq!(visible_ids(&view_data), [2]);
    }

    #[test]
    fn poll_timeout_tracks_pending_search() {
        let (mut state, mut runtime, mut view_data) = setup();
        let base = Instant::now();
        assert_eq!(poll_timeout(&view_data, base), Duration::from_millis(120));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('/'));
        press_at(
            &mut state,
            &mut runtime,
            &mut view_data,
            KeyCode::Char('m'),
            KeyModifiers::NONE,
            base,
        );
        assert_eq!(
            poll_timeout(&view_data, base + Duration::from_millis(150)),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn escape_leaves_search_then_shortcuts_work_again() {
        let (mut state, mut runtime, mut view_data) = setup();
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('/'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        assert_eq!(state.overlay, None);
        assert_eq!(view_data.filter.raw_query(), "n");

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);
        assert_eq!(view_data.env.active_element(), None);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        assert_eq!(state.overlay, Some(Overlay::AddForm));
    }

    #[test]
    fn question_mark_opens_help_even_from_search() {
        let (mut state, mut runtime, mut view_data) = setup();
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('/'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('?'));
        assert_eq!(state.overlay, Some(Overlay::Help));
        assert_eq!(view_data.filter.raw_query(), "");

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        assert_eq!(state.overlay, Some(Overlay::Help));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);
        assert_eq!(state.overlay, None);
        assert!(view_data.overlay_scope.is_none());
    }

    #[test]
    fn filter_dropdown_picks_category_with_arrows() {
        let (mut state, mut runtime, mut view_data) = setup();
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('f'));
        assert_eq!(state.overlay, Some(Overlay::PetTypeFilter));
        assert_eq!(view_data.env.active_element(), Some(FILTER_ALL));
        assert_eq!(
            view_data
                .env
                .listener_count(ListenerScope::Container(FILTER_CONTAINER)),
            1
        );
        assert_eq!(
            view_data.filter_options,
            [PetType::Bird, PetType::Cat, PetType::Dog, PetType::Fish]
        );

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        assert_eq!(
            view_data.env.active_element(),
            Some(filter_option_element(1))
        );
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(state.overlay, None);
        assert_eq!(view_data.filter.selected_category(), Some(&PetType::Cat));
        assert_eq!(visible_ids(&view_data), [1, 4]);
        assert_eq!(
            view_data
                .env
                .listener_count(ListenerScope::Container(FILTER_CONTAINER)),
            0
        );
    }

    #[test]
    fn escape_closes_filter_before_clearing_row_focus() {
        let (mut state, mut runtime, mut view_data) = setup();
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('f'));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);
        assert_eq!(state.overlay, None);
        assert_eq!(view_data.table.current_focused_row(), Some(0));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);
        assert_eq!(view_data.table.current_focused_row(), None);
    }

    #[test]
    fn delete_flow_confirms_and_reclamps_focus() {
        let (mut state, mut runtime, mut view_data) = setup();
        for _ in 0..5 {
            press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        }
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('d'));
        assert_eq!(state.overlay, Some(Overlay::DeleteConfirm(PatientId::new(5))));
        assert_eq!(view_data.env.active_element(), Some(DELETE_CANCEL));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Right);
        assert_eq!(view_data.env.active_element(), Some(DELETE_CONFIRM));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(runtime.deleted, [PatientId::new(5)]);
        assert_eq!(state.overlay, None);
        assert_eq!(view_data.patients.len(), 4);
        assert_eq!(view_data.table.current_focused_row(), Some(3));
        assert_eq!(state.status_line.as_deref(), Some("Bubbles deleted"));
    }

    #[test]
    fn deleting_under_a_sort_keeps_sort_and_clamps_focus() {
        let (mut state, mut runtime, mut view_data) = setup();
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('1'));
        let sorted = SortState::by("clientName", SortDirection::Asc);
        assert_eq!(view_data.table.sort_state(), sorted);
        assert_eq!(visible_ids(&view_data), [3, 2, 4, 5, 1]);

        for _ in 0..5 {
            press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        }
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('d'));
        assert_eq!(state.overlay, Some(Overlay::DeleteConfirm(PatientId::new(1))));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Right);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(runtime.deleted, [PatientId::new(1)]);
        assert_eq!(view_data.table.sort_state(), sorted);
        assert_eq!(visible_ids(&view_data), [3, 2, 4, 5]);
        assert_eq!(view_data.table.current_focused_row(), Some(3));
    }

    #[test]
    fn delete_cancel_keeps_patient() {
        let (mut state, mut runtime, mut view_data) = setup();
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('d'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        assert!(runtime.deleted.is_empty());
        assert_eq!(state.overlay, None);
    }

    #[test]
    fn add_form_requires_pet_type_then_saves() {
        let (mut state, mut runtime, mut view_data) = setup();
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        assert_eq!(state.overlay, Some(Overlay::AddForm));

        type_text(&mut state, &mut runtime, &mut view_data, "Zoe Diaz");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        type_text(&mut state, &mut runtime, &mut view_data, "5551112222");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        type_text(&mut state, &mut runtime, &mut view_data, "Pip");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        type_text(&mut state, &mut runtime, &mut view_data, "2 years");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(state.overlay, Some(Overlay::AddForm));
        assert!(runtime.created.is_empty());
        let error = view_data
            .form
            .as_ref()
            .and_then(|form| form.error.clone())
            .expect("validation error should show");
        assert!(error.contains("pet type is required"), "{error}");

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Tab);
        assert_eq!(view_data.env.active_element(), Some(FORM_PET_TYPE));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('b'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(state.overlay, None);
        assert_eq!(runtime.created.len(), 1);
        assert_eq!(runtime.created[0].client_name, "Zoe Diaz");
        assert_eq!(runtime.created[0].pet_type, Some(PetType::Bird));
        assert_eq!(view_data.patients.len(), 6);
        assert_eq!(state.status_line.as_deref(), Some("Pip added"));
        assert_eq!(
            view_data
                .env
                .listener_count(ListenerScope::Container(FORM_CONTAINER)),
            0
        );
    }

    #[test]
    fn save_stays_out_of_reach_until_form_is_complete() {
        let (mut state, mut runtime, mut view_data) = setup();
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Up);
        assert_eq!(view_data.env.active_element(), Some(FORM_CANCEL));

        view_data.env.focus(FORM_SAVE);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);
        assert_eq!(state.overlay, Some(Overlay::AddForm));
        assert!(runtime.created.is_empty());

        view_data.env.focus(form_field_element(PatientField::ClientName));
        for (text, next) in [
            ("Zoe Diaz", KeyCode::Down),
            ("5551112222", KeyCode::Down),
            ("Pip", KeyCode::Down),
            ("2 years", KeyCode::Down),
        ] {
            type_text(&mut state, &mut runtime, &mut view_data, text);
            press(&mut state, &mut runtime, &mut view_data, next);
        }
        assert_eq!(view_data.env.active_element(), Some(FORM_PET_TYPE));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('c'));

        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        assert_eq!(view_data.env.active_element(), Some(FORM_SAVE));

        view_data.env.focus(form_field_element(PatientField::PetAge));
        for _ in 0.."2 years".len() {
            press(&mut state, &mut runtime, &mut view_data, KeyCode::Backspace);
        }
        view_data.env.focus(form_field_element(PatientField::ClientName));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Up);
        assert_eq!(view_data.env.active_element(), Some(FORM_CANCEL));

        view_data.env.focus(form_field_element(PatientField::PetAge));
        type_text(&mut state, &mut runtime, &mut view_data, "3 years");
        view_data.env.focus(form_field_element(PatientField::ClientName));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Up);
        assert_eq!(view_data.env.active_element(), Some(FORM_SAVE));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(state.overlay, None);
        assert_eq!(runtime.created.len(), 1);
        assert_eq!(runtime.created[0].pet_type, Some(PetType::Cat));
        assert_eq!(runtime.created[0].pet_age, "3 years");
    }

    #[test]
    fn edit_form_updates_focused_patient() {
        let (mut state, mut runtime, mut view_data) = setup();
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('e'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Backspace);
        type_text(&mut state, &mut runtime, &mut view_data, "h");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(runtime.updated.len(), 1);
        assert_eq!(runtime.updated[0].0, PatientId::new(1));
        assert_eq!(runtime.updated[0].1.client_name, "Jane Doh");
        assert_eq!(state.status_line.as_deref(), Some("Charlie updated"));
    }

    #[test]
    fn escape_cancels_form_and_releases_scope() {
        let (mut state, mut runtime, mut view_data) = setup();
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('n'));
        type_text(&mut state, &mut runtime, &mut view_data, "x");
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Esc);

        assert_eq!(state.overlay, None);
        assert!(view_data.form.is_none());
        assert!(runtime.created.is_empty());
        assert_eq!(view_data.env.active_element(), None);
        assert_eq!(
            view_data
                .env
                .listener_count(ListenerScope::Container(FORM_CONTAINER)),
            0
        );
    }

    #[test]
    fn save_failure_keeps_form_open() {
        let runtime = TestRuntime {
            fail_saves: true,
            ..TestRuntime::with_samples()
        };
        let (mut state, mut runtime, mut view_data) = setup_with(runtime);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Down);
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Char('e'));
        press(&mut state, &mut runtime, &mut view_data, KeyCode::Enter);

        assert_eq!(state.overlay, Some(Overlay::EditForm(PatientId::new(1))));
        let status = state.status_line.clone().unwrap_or_default();
        assert!(status.contains("save failed"), "{status}");
        assert!(status.contains("read-only"), "{status}");
    }

    #[test]
    fn status_text_hides_hints_while_blocking_overlay_is_open() {
        let mut state = DashboardState::default();
        assert!(status_text(&state).contains("/ search"));

        state.overlay = Some(Overlay::Help);
        assert!(!status_text(&state).contains("/ search"));

        state.overlay = Some(Overlay::PetTypeFilter);
        assert!(status_text(&state).contains("/ search"));
    }

    #[test]
    fn header_labels_mark_sort_state() {
        let columns = patient_columns();
        let sorted = SortState::by("clientName", SortDirection::Desc);
        assert_eq!(header_label(0, &columns[0], sorted), "1 Client Name ▼");
        assert_eq!(header_label(1, &columns[1], sorted), "2 Phone");
        assert_eq!(header_label(2, &columns[2], sorted), "3 Pet Name ↕");
    }

    #[test]
    fn delete_text_names_pet_and_client() {
        let patients = sample_patients();
        let text = render_delete_text(patients.first(), Some(DELETE_CONFIRM));
        assert!(text.starts_with("Delete Charlie (Jane Doe)?"));
        assert!(text.contains("[>Delete<]"));
        assert!(text.contains("[ Cancel ]"));
    }

    #[test]
    fn form_text_shows_placeholders_and_error() {
        let form = FormUiState {
            input: PatientFormInput::default(),
            target: None,
            error: Some("client name is required -- fill it in and retry".to_owned()),
        };
        let text = render_form_text(&form, Some(form_field_element(PatientField::Phone)));
        assert!(text.contains("(Enter client name)"));
        assert!(text.contains("› Phone: ▏"));
        assert!(text.contains("[ Add ]"));
        assert!(text.contains("client name is required"));
    }
}
