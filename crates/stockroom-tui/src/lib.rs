// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use stockroom_app::{
    AppCommand, AppMode, AppState, BulkEditor, BulkOutcome, CancelReason, Category, EditOutcome,
    FieldEditor, Item, ItemCache, ItemField, ItemId, ItemPage, ItemStatus, ItemsApi, LoadKind,
    LoadOutcome, PageRequest, SelectionSet, StatusValue,
};
use time::macros::format_description;
use tracing::{debug, warn};

const HALF_PAGE_ROWS: isize = 10;
const FULL_PAGE_ROWS: isize = 20;
/// Rows left below the viewport when the next page is requested.
const LOAD_MORE_THRESHOLD: usize = 5;
const STATUS_ROWS: u16 = 3;
// Table borders plus the header row.
const TABLE_CHROME_ROWS: u16 = 3;
const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);

pub trait AppRuntime: ItemsApi {
    /// Fetches one page and reports it on `tx`. The default runs the request
    /// inline; interactive runtimes move it to a worker thread.
    fn spawn_page_fetch(&mut self, request: PageRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self
            .fetch_items(request.take, request.cursor)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::PageLoaded { request, result })
            .map_err(|_| anyhow!("page event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    PageLoaded {
        request: PageRequest,
        result: std::result::Result<ItemPage, String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableColumn {
    Select,
    Field(ItemField),
}

const COLUMNS: [TableColumn; 8] = [
    TableColumn::Select,
    TableColumn::Field(ItemField::Name),
    TableColumn::Field(ItemField::Brand),
    TableColumn::Field(ItemField::Size),
    TableColumn::Field(ItemField::Color),
    TableColumn::Field(ItemField::Category),
    TableColumn::Field(ItemField::Price),
    TableColumn::Field(ItemField::Status),
];

impl TableColumn {
    const fn label(self) -> &'static str {
        match self {
            Self::Select => "sel",
            Self::Field(field) => field.label(),
        }
    }

    const fn width(self) -> Constraint {
        match self {
            Self::Select => Constraint::Length(3),
            Self::Field(ItemField::Name) => Constraint::Min(18),
            Self::Field(ItemField::Brand) | Self::Field(ItemField::Category) => {
                Constraint::Min(12)
            }
            Self::Field(ItemField::Size) => Constraint::Length(8),
            Self::Field(ItemField::Color) => Constraint::Length(10),
            Self::Field(ItemField::Price) => Constraint::Length(11),
            Self::Field(ItemField::Status) => Constraint::Length(13),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableCommand {
    MoveRow(isize),
    MoveColumn(isize),
    MoveHalfPageDown,
    MoveHalfPageUp,
    MoveFullPageDown,
    MoveFullPageUp,
    JumpFirstRow,
    JumpLastRow,
    JumpFirstColumn,
    JumpLastColumn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct TableUiState {
    selected_row: usize,
    selected_col: usize,
    scroll_offset: usize,
    viewport_rows: usize,
}

#[derive(Debug, Default)]
struct ViewData {
    cache: ItemCache,
    selection: SelectionSet,
    bulk: BulkEditor,
    editor: Option<FieldEditor>,
    categories: Vec<Category>,
    table: TableUiState,
    help_visible: bool,
    status_token: u64,
    // A bulk update landed while a reload was already running; reload again
    // once it finishes so the new statuses show.
    refresh_queued: bool,
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    cache: ItemCache,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        cache,
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Ok(size) = terminal.size() {
        set_viewport_rows(&mut view_data, size.height);
    }
    bootstrap(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        match terminal.size() {
            Ok(size) => {
                if set_viewport_rows(&mut view_data, size.height) {
                    maybe_load_more(state, runtime, &mut view_data, &internal_tx);
                }
            }
            Err(error) => {
                result = Err(error).context("read terminal size");
                break;
            }
        }

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
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
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn bootstrap<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match runtime.fetch_categories() {
        Ok(categories) => view_data.categories = categories,
        Err(error) => {
            let error = format!("{error:#}");
            warn!(%error, "category load failed; category edits disabled");
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("categories unavailable: {error}"),
            );
        }
    }
    start_initial_load(state, runtime, view_data, internal_tx);
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::PageLoaded { request, result } => {
                handle_page_loaded(state, runtime, view_data, tx, request, result);
            }
        }
    }
}

fn handle_page_loaded<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    request: PageRequest,
    result: std::result::Result<ItemPage, String>,
) {
    let anchor = focused_item_id(view_data);
    let outcome = view_data
        .cache
        .complete(request, result.map_err(anyhow::Error::msg));
    if outcome == LoadOutcome::Stale {
        return;
    }
    restore_cursor(view_data, anchor);
    report_load_outcome(state, view_data, tx, &outcome);

    if request.kind == LoadKind::Initial && view_data.refresh_queued {
        view_data.refresh_queued = false;
        start_initial_load(state, runtime, view_data, tx);
        return;
    }
    // A page that added nothing must not chain another request, or a server
    // repeating its cursor would be polled in a loop.
    if matches!(
        outcome,
        LoadOutcome::Replaced { .. } | LoadOutcome::Appended { added: 1.., .. }
    ) {
        maybe_load_more(state, runtime, view_data, tx);
    }
}

fn report_load_outcome(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    outcome: &LoadOutcome,
) {
    if let LoadOutcome::Failed { error, exhausted } = outcome {
        let message = if *exhausted {
            format!("load failed: {error}; press r to reload")
        } else {
            format!("load failed: {error}")
        };
        emit_status(state, view_data, tx, message);
    }
}

fn start_initial_load<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let Some(request) = view_data.cache.begin_initial_load() else {
        return;
    };
    dispatch_page_request(state, runtime, view_data, tx, request);
}

fn maybe_load_more<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    if !viewport_near_end(view_data) {
        return;
    }
    let Some(request) = view_data.cache.begin_load_more() else {
        return;
    };
    dispatch_page_request(state, runtime, view_data, tx, request);
}

fn dispatch_page_request<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    request: PageRequest,
) {
    debug!(
        token = request.token,
        cursor = request.cursor,
        kind = ?request.kind,
        "requesting item page"
    );
    if let Err(error) = runtime.spawn_page_fetch(request, tx.clone()) {
        let outcome = view_data.cache.complete(request, Err(error));
        report_load_outcome(state, view_data, tx, &outcome);
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    match state.mode {
        AppMode::Edit => {
            handle_editor_key(state, runtime, view_data, internal_tx, key);
            return false;
        }
        AppMode::Bulk => {
            handle_bulk_key(state, runtime, view_data, internal_tx, key);
            return false;
        }
        AppMode::Nav => {}
    }

    if let Some(command) = table_command_for_key(key) {
        apply_table_command(view_data, command);
        maybe_load_more(state, runtime, view_data, internal_tx);
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char(' '), _) => {
            if let Some(id) = focused_item_id(view_data) {
                view_data.selection.toggle(id);
            }
        }
        (KeyCode::Enter, _) | (KeyCode::Char('e'), KeyModifiers::NONE) => {
            open_editor(state, view_data, internal_tx);
        }
        (KeyCode::Char('b'), KeyModifiers::NONE) => {
            if view_data.selection.is_empty() {
                emit_status(state, view_data, internal_tx, "select rows with space first");
            } else {
                view_data.bulk.open();
                state.dispatch(AppCommand::OpenBulk);
            }
        }
        (KeyCode::Char('x'), KeyModifiers::NONE) => {
            if !view_data.selection.is_empty() {
                view_data.selection.clear();
                emit_status(state, view_data, internal_tx, "selection cleared");
            }
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            emit_status(state, view_data, internal_tx, "reloading");
            start_initial_load(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
        }
        _ => {}
    }
    false
}

fn table_command_for_key(key: KeyEvent) -> Option<TableCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(TableCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(TableCommand::MoveRow(-1)),
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => Some(TableCommand::MoveColumn(-1)),
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) => Some(TableCommand::MoveColumn(1)),
        (KeyCode::Char('d'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TableCommand::MoveHalfPageDown)
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(TableCommand::MoveHalfPageUp)
        }
        (KeyCode::PageDown, _) => Some(TableCommand::MoveFullPageDown),
        (KeyCode::PageUp, _) => Some(TableCommand::MoveFullPageUp),
        (KeyCode::Char('g'), _) | (KeyCode::Home, _) => Some(TableCommand::JumpFirstRow),
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => Some(TableCommand::JumpLastRow),
        (KeyCode::Char('^'), _) => Some(TableCommand::JumpFirstColumn),
        (KeyCode::Char('$'), _) => Some(TableCommand::JumpLastColumn),
        _ => None,
    }
}

fn apply_table_command(view_data: &mut ViewData, command: TableCommand) {
    match command {
        TableCommand::MoveRow(delta) => move_row(view_data, delta),
        TableCommand::MoveColumn(delta) => move_col(view_data, delta),
        TableCommand::MoveHalfPageDown => move_row(view_data, HALF_PAGE_ROWS),
        TableCommand::MoveHalfPageUp => move_row(view_data, -HALF_PAGE_ROWS),
        TableCommand::MoveFullPageDown => move_row(view_data, FULL_PAGE_ROWS),
        TableCommand::MoveFullPageUp => move_row(view_data, -FULL_PAGE_ROWS),
        TableCommand::JumpFirstRow => view_data.table.selected_row = 0,
        TableCommand::JumpLastRow => {
            view_data.table.selected_row = view_data.cache.len().saturating_sub(1);
        }
        TableCommand::JumpFirstColumn => view_data.table.selected_col = 0,
        TableCommand::JumpLastColumn => view_data.table.selected_col = COLUMNS.len() - 1,
    }
    ensure_cursor_visible(view_data);
}

fn open_editor(state: &mut AppState, view_data: &mut ViewData, tx: &Sender<InternalEvent>) {
    let Some(item) = focused_item(view_data).cloned() else {
        emit_status(state, view_data, tx, "no row to edit");
        return;
    };
    let TableColumn::Field(field) = COLUMNS[view_data.table.selected_col] else {
        view_data.selection.toggle(item.id);
        return;
    };

    match FieldEditor::open(&item, field, &view_data.categories) {
        Ok(editor) => {
            view_data.editor = Some(editor);
            state.dispatch(AppCommand::EnterEdit);
        }
        Err(error) => emit_status(state, view_data, tx, format!("{error:#}")),
    }
}

fn handle_editor_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view_data.editor = None;
            state.dispatch(AppCommand::ExitToNav);
            emit_status(state, view_data, tx, "edit cancelled");
            return;
        }
        KeyCode::Enter => {
            submit_editor(state, runtime, view_data, tx);
            return;
        }
        _ => {}
    }

    let Some(editor) = view_data.editor.as_mut() else {
        state.dispatch(AppCommand::ExitToNav);
        return;
    };
    let choice = editor.is_choice();
    match (key.code, key.modifiers) {
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            editor.clear();
        }
        (KeyCode::Tab, _) | (KeyCode::Right, _) | (KeyCode::Down, _) => editor.cycle(1),
        (KeyCode::BackTab, _) | (KeyCode::Left, _) | (KeyCode::Up, _) => editor.cycle(-1),
        (KeyCode::Char('l' | 'j'), _) if choice => editor.cycle(1),
        (KeyCode::Char('h' | 'k'), _) if choice => editor.cycle(-1),
        (KeyCode::Backspace, _) => editor.backspace(),
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            editor.push_char(ch);
        }
        _ => {}
    }
}

fn submit_editor<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    state.dispatch(AppCommand::ExitToNav);
    let Some(editor) = view_data.editor.take() else {
        return;
    };

    let field = editor.field().label();
    let message = match editor.submit(&mut view_data.cache, &*runtime) {
        EditOutcome::Unchanged => "no change".to_owned(),
        EditOutcome::Cancelled(CancelReason::InvalidNumber) => {
            format!("{field} must be a number; edit cancelled")
        }
        EditOutcome::Updated(item) => format!("saved {field} of item {}", item.id),
        EditOutcome::Failed(error) => format!("update failed: {error}"),
    };
    emit_status(state, view_data, tx, message);
}

fn handle_bulk_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view_data.bulk.close();
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Enter => submit_bulk(state, runtime, view_data, tx),
        KeyCode::Char('h' | 'k') | KeyCode::Left | KeyCode::Up | KeyCode::BackTab => {
            view_data.bulk.cycle_status(-1);
        }
        KeyCode::Char('l' | 'j') | KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
            view_data.bulk.cycle_status(1);
        }
        _ => {}
    }
}

fn submit_bulk<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let anchor = focused_item_id(view_data);
    let outcome = view_data.bulk.submit(
        &mut view_data.selection,
        &mut view_data.cache,
        &*runtime,
    );

    match outcome {
        BulkOutcome::Skipped => {
            view_data.bulk.close();
            state.dispatch(AppCommand::ExitToNav);
            emit_status(state, view_data, tx, "nothing selected");
        }
        BulkOutcome::Applied {
            count,
            status,
            refresh,
        } => {
            state.dispatch(AppCommand::ExitToNav);
            restore_cursor(view_data, anchor);
            let noun = if count == 1 { "item" } else { "items" };
            let message = match &refresh {
                LoadOutcome::Failed { error, .. } => {
                    format!("{count} {noun} set to {}; reload failed: {error}", status.label())
                }
                _ => format!("{count} {noun} set to {}", status.label()),
            };
            emit_status(state, view_data, tx, message);
            match refresh {
                LoadOutcome::Skipped => view_data.refresh_queued = true,
                LoadOutcome::Replaced { .. } => maybe_load_more(state, runtime, view_data, tx),
                _ => {}
            }
        }
        BulkOutcome::Failed(error) => {
            emit_status(state, view_data, tx, format!("bulk update failed: {error}"));
        }
    }
}

fn focused_item(view_data: &ViewData) -> Option<&Item> {
    view_data.cache.items().get(view_data.table.selected_row)
}

fn focused_item_id(view_data: &ViewData) -> Option<ItemId> {
    focused_item(view_data).map(|item| item.id)
}

/// Puts the cursor back on `anchor` after the working set changed, or on the
/// next surviving row when that item was evicted.
fn restore_cursor(view_data: &mut ViewData, anchor: Option<ItemId>) {
    if let Some(id) = anchor {
        let (Ok(index) | Err(index)) = view_data
            .cache
            .items()
            .binary_search_by_key(&id, |item| item.id);
        view_data.table.selected_row = index;
    }
    clamp_table_cursor(view_data);
}

fn move_row(view_data: &mut ViewData, delta: isize) {
    let row_count = view_data.cache.len();
    if row_count == 0 {
        view_data.table.selected_row = 0;
        return;
    }

    let current = view_data.table.selected_row;
    let next = if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize)
    };
    view_data.table.selected_row = next.min(row_count.saturating_sub(1));
}

fn move_col(view_data: &mut ViewData, delta: isize) {
    let current = view_data.table.selected_col as isize;
    let last = COLUMNS.len() as isize - 1;
    view_data.table.selected_col = (current + delta).clamp(0, last) as usize;
}

fn clamp_table_cursor(view_data: &mut ViewData) {
    let row_count = view_data.cache.len();
    view_data.table.selected_row = view_data
        .table
        .selected_row
        .min(row_count.saturating_sub(1));
    view_data.table.selected_col = view_data.table.selected_col.min(COLUMNS.len() - 1);
    ensure_cursor_visible(view_data);
}

fn viewport_rows(view_data: &ViewData) -> usize {
    view_data.table.viewport_rows.max(1)
}

fn ensure_cursor_visible(view_data: &mut ViewData) {
    let viewport = viewport_rows(view_data);
    let row = view_data.table.selected_row;
    let table = &mut view_data.table;
    if row < table.scroll_offset {
        table.scroll_offset = row;
    } else if row >= table.scroll_offset + viewport {
        table.scroll_offset = row + 1 - viewport;
    }
    let max_offset = view_data.cache.len().saturating_sub(viewport);
    table.scroll_offset = table.scroll_offset.min(max_offset);
}

/// Returns true when the body height changed.
fn set_viewport_rows(view_data: &mut ViewData, terminal_height: u16) -> bool {
    let rows = usize::from(terminal_height.saturating_sub(STATUS_ROWS + TABLE_CHROME_ROWS));
    if rows == view_data.table.viewport_rows {
        return false;
    }
    view_data.table.viewport_rows = rows;
    ensure_cursor_visible(view_data);
    true
}

/// Index range of the rows that fit on screen; only these are built.
fn visible_range(view_data: &ViewData) -> Range<usize> {
    let len = view_data.cache.len();
    let start = view_data.table.scroll_offset.min(len);
    let end = start.saturating_add(viewport_rows(view_data)).min(len);
    start..end
}

fn viewport_near_end(view_data: &ViewData) -> bool {
    let len = view_data.cache.len();
    len - visible_range(view_data).end <= LOAD_MORE_THRESHOLD
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(STATUS_ROWS)])
        .split(frame.area());

    render_table(frame, layout[0], view_data);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[1]);

    if view_data.bulk.is_open() {
        let area = centered_rect(44, 40, frame.area());
        frame.render_widget(Clear, area);
        let modal = Paragraph::new(render_bulk_overlay_text(view_data)).block(
            Block::default()
                .title("bulk status")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(modal, area);
    }

    if view_data.help_visible {
        let area = centered_rect(72, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &ViewData) {
    let header = Row::new(COLUMNS.iter().map(|column| {
        Cell::from(column.label()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let range = visible_range(view_data);
    let first_row = range.start;
    let rows = view_data.cache.items()[range]
        .iter()
        .enumerate()
        .map(|(offset, item)| {
            let selected_row = first_row + offset == view_data.table.selected_row;
            let cells = COLUMNS
                .iter()
                .enumerate()
                .map(|(column_index, column)| {
                    let editing = view_data.editor.as_ref().filter(|editor| {
                        editor.item_id() == item.id && TableColumn::Field(editor.field()) == *column
                    });
                    if let Some(editor) = editing {
                        return Cell::from(editor_cell_text(editor)).style(
                            Style::default()
                                .fg(Color::Black)
                                .bg(Color::Yellow)
                                .add_modifier(Modifier::BOLD),
                        );
                    }

                    let mut style = cell_style(*column, item);
                    if selected_row {
                        style = style.bg(Color::DarkGray);
                    }
                    if selected_row && column_index == view_data.table.selected_col {
                        style = Style::default()
                            .fg(Color::Black)
                            .bg(Color::Cyan)
                            .add_modifier(Modifier::BOLD);
                    }
                    Cell::from(cell_text(*column, item, &view_data.selection)).style(style)
                })
                .collect::<Vec<_>>();
            Row::new(cells)
        });

    let table = Table::new(rows, COLUMNS.map(TableColumn::width))
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(view_data))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn table_title(view_data: &ViewData) -> String {
    let paging = if view_data.cache.is_loading() {
        "loading"
    } else if view_data.cache.has_more() {
        "more"
    } else {
        "end"
    };
    let mut title = format!(
        "stockroom | {} loaded | {} selected | {paging}",
        view_data.cache.len(),
        view_data.selection.len()
    );
    if let Some(loaded_at) = view_data.cache.loaded_at()
        && let Ok(clock) = loaded_at.format(&format_description!("[hour]:[minute]"))
    {
        title.push_str(&format!(" | loaded {clock} UTC"));
    }
    title
}

fn cell_text(column: TableColumn, item: &Item, selection: &SelectionSet) -> String {
    match column {
        TableColumn::Select => {
            if selection.contains(item.id) {
                "[x]".to_owned()
            } else {
                "[ ]".to_owned()
            }
        }
        TableColumn::Field(ItemField::Name) => item.name.clone(),
        TableColumn::Field(ItemField::Brand) => item.brand.clone(),
        TableColumn::Field(ItemField::Size) => item.size.clone(),
        TableColumn::Field(ItemField::Color) => item.color.clone(),
        TableColumn::Field(ItemField::Category) => item.category.clone(),
        TableColumn::Field(ItemField::Price) => format_money(price_cents(item.price)),
        TableColumn::Field(ItemField::Status) => item.status.label().to_owned(),
    }
}

fn cell_style(column: TableColumn, item: &Item) -> Style {
    match column {
        TableColumn::Field(ItemField::Status) => Style::default().fg(status_color(&item.status)),
        _ => Style::default(),
    }
}

fn status_color(status: &StatusValue) -> Color {
    match status.known() {
        Some(ItemStatus::InStock) => Color::Green,
        Some(ItemStatus::LastUnits) => Color::Yellow,
        Some(ItemStatus::OutOfStock) => Color::Red,
        None => Color::Reset,
    }
}

fn editor_cell_text(editor: &FieldEditor) -> String {
    if editor.is_choice() {
        format!("< {} >", editor.display())
    } else {
        format!("{}_", editor.display())
    }
}

fn price_cents(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let absolute = cents.unsigned_abs();
    let dollars = absolute / 100;
    let cents_component = absolute % 100;
    format!("{sign}${dollars}.{cents_component:02}")
}

fn render_bulk_overlay_text(view_data: &ViewData) -> String {
    let count = view_data.selection.len();
    let noun = if count == 1 { "item" } else { "items" };
    let mut lines = vec![format!("set status for {count} selected {noun}"), String::new()];
    for status in ItemStatus::ALL {
        let marker = if status == view_data.bulk.status() {
            "(*)"
        } else {
            "( )"
        };
        lines.push(format!("  {marker} {}", status.label()));
    }
    lines.push(String::new());
    lines.push("h/l choose | enter apply | esc cancel".to_owned());
    lines.join("\n")
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return String::new();
    }

    let (mode, hints) = match state.mode {
        AppMode::Nav => (
            "NAV",
            "j/k/h/l g/G pg | space select | enter edit | b bulk | x clear | r reload | ? help | q",
        ),
        AppMode::Edit => ("EDIT", "type | tab cycle | ctrl+u clear | enter save | esc cancel"),
        AppMode::Bulk => ("BULK", "h/l status | enter apply | esc cancel"),
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit\n\
nav: j/k rows | h/l columns | g/G first/last | ^/$ first/last column\n\
nav: pgup/pgdn ctrl+d/u page | space toggle row | x clear selection\n\
nav: enter/e edit cell | b bulk status | r reload | ? help | q quit\n\
edit: type to change | ctrl+u clear | tab or h/l cycle choices | enter save | esc cancel\n\
bulk: h/l or j/k choose status | enter apply | esc cancel"
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
        AppRuntime, InternalEvent, ViewData, bootstrap, format_money, handle_key_event,
        price_cents, process_internal_events, render, set_viewport_rows, status_color,
        status_text, table_title, visible_range,
    };
    use anyhow::{Result, anyhow};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::style::Color;
    use std::sync::mpsc::{self, Receiver, Sender};
    use stockroom_app::{
        AppMode, AppState, CacheConfig, Category, CategoryId, Item, ItemCache, ItemId, ItemPage,
        ItemPatch, ItemStatus, ItemsApi, LoadKind, PageRequest, StatusValue,
    };
    use stockroom_testkit::{ApiCall, CallKind, MemoryInventory, sample_items};

    #[derive(Default)]
    struct TestRuntime {
        inventory: MemoryInventory,
        defer_pages: bool,
        deferred: Vec<PageRequest>,
        // Answer every page request with the first page and its cursor.
        repeat_first_page: bool,
    }

    impl TestRuntime {
        fn new(inventory: MemoryInventory) -> Self {
            Self {
                inventory,
                ..Self::default()
            }
        }

        fn deliver(&mut self, tx: &Sender<InternalEvent>, request: PageRequest) {
            let result = self
                .inventory
                .fetch_items(request.take, request.cursor)
                .map_err(|error| error.to_string());
            tx.send(InternalEvent::PageLoaded { request, result })
                .expect("channel open");
        }
    }

    impl ItemsApi for TestRuntime {
        fn fetch_items(&self, take: usize, cursor: i64) -> Result<ItemPage> {
            let cursor = if self.repeat_first_page { 0 } else { cursor };
            self.inventory.fetch_items(take, cursor)
        }

        fn update_item(&self, id: ItemId, patch: &ItemPatch) -> Result<Item> {
            self.inventory.update_item(id, patch)
        }

        fn bulk_update_status(&self, ids: &[ItemId], status: ItemStatus) -> Result<()> {
            self.inventory.bulk_update_status(ids, status)
        }

        fn fetch_categories(&self) -> Result<Vec<Category>> {
            self.inventory.fetch_categories()
        }
    }

    impl AppRuntime for TestRuntime {
        fn spawn_page_fetch(
            &mut self,
            request: PageRequest,
            tx: Sender<InternalEvent>,
        ) -> Result<()> {
            if self.defer_pages {
                self.deferred.push(request);
                return Ok(());
            }
            let result = self
                .fetch_items(request.take, request.cursor)
                .map_err(|error| format!("{error:#}"));
            tx.send(InternalEvent::PageLoaded { request, result })
                .map_err(|_| anyhow!("page event channel closed"))
        }
    }

    struct Harness {
        state: AppState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: Sender<InternalEvent>,
        rx: Receiver<InternalEvent>,
    }

    impl Harness {
        fn start(inventory: MemoryInventory) -> Self {
            Self::start_with_cache(inventory, ItemCache::default())
        }

        fn start_with_cache(inventory: MemoryInventory, cache: ItemCache) -> Self {
            let (tx, rx) = mpsc::channel();
            let mut harness = Self {
                state: AppState::default(),
                runtime: TestRuntime::new(inventory),
                view_data: ViewData {
                    cache,
                    ..ViewData::default()
                },
                tx,
                rx,
            };
            harness.view_data.table.viewport_rows = 10;
            bootstrap(
                &mut harness.state,
                &mut harness.runtime,
                &mut harness.view_data,
                &harness.tx,
            );
            harness.pump();
            harness
        }

        fn pump(&mut self) {
            process_internal_events(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                &self.rx,
            );
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            let quit = handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, modifiers),
            );
            self.pump();
            quit
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn inventory(&self) -> &MemoryInventory {
            &self.runtime.inventory
        }

        fn status(&self) -> &str {
            self.state.status_line.as_deref().unwrap_or_default()
        }
    }

    fn shop_categories() -> Vec<Category> {
        vec![
            Category {
                id: CategoryId::new(1),
                name: "Shirts".to_owned(),
            },
            Category {
                id: CategoryId::new(2),
                name: "Pants".to_owned(),
            },
        ]
    }

    #[test]
    fn startup_loads_categories_and_first_page() {
        let harness = Harness::start(MemoryInventory::seeded(1, 100));

        assert_eq!(harness.view_data.cache.len(), 20);
        assert_eq!(harness.view_data.categories.len(), 8);
        assert_eq!(
            harness.inventory().calls(),
            vec![
                ApiCall::FetchCategories,
                ApiCall::FetchItems { take: 20, cursor: 0 },
            ]
        );
    }

    #[test]
    fn reaching_the_end_requests_the_next_page() {
        let mut harness = Harness::start(MemoryInventory::seeded(1, 100));

        for _ in 0..6 {
            harness.press(KeyCode::Char('j'));
        }
        assert_eq!(harness.inventory().calls_of(CallKind::FetchItems).len(), 1);

        harness.press(KeyCode::Char('G'));
        assert_eq!(harness.view_data.cache.len(), 40);
        assert_eq!(
            harness.inventory().calls_of(CallKind::FetchItems).last(),
            Some(&ApiCall::FetchItems {
                take: 20,
                cursor: 20
            })
        );
    }

    #[test]
    fn short_inventory_does_not_page_past_the_end() {
        let harness = Harness::start(MemoryInventory::new(sample_items(), Vec::new()));

        assert_eq!(harness.view_data.cache.len(), 2);
        assert!(!harness.view_data.cache.has_more());
        assert_eq!(harness.inventory().calls_of(CallKind::FetchItems).len(), 1);
    }

    #[test]
    fn page_with_nothing_new_does_not_chain_requests() {
        let mut harness = Harness::start(MemoryInventory::seeded(1, 100));
        harness.runtime.repeat_first_page = true;

        harness.press(KeyCode::Char('G'));

        assert_eq!(harness.view_data.cache.len(), 20);
        assert!(!harness.view_data.cache.is_loading());
        assert_eq!(harness.inventory().calls_of(CallKind::FetchItems).len(), 2);
    }

    #[test]
    fn unknown_status_renders_its_raw_text() -> Result<()> {
        let mut items = sample_items();
        items[1].status = StatusValue::Other("discontinued".to_owned());
        let mut harness = Harness::start(MemoryInventory::new(items, Vec::new()));
        set_viewport_rows(&mut harness.view_data, 12);

        let mut terminal = Terminal::new(TestBackend::new(100, 12))?;
        terminal.draw(|frame| render(frame, &harness.state, &harness.view_data))?;
        let text = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>();
        assert!(text.contains("discontinued"));
        assert!(text.contains("in stock"));
        assert_eq!(
            status_color(&harness.view_data.cache.items()[1].status),
            Color::Reset
        );
        Ok(())
    }

    #[test]
    fn cursor_follows_its_item_across_eviction() -> Result<()> {
        let cache = ItemCache::new(CacheConfig {
            page_size: 20,
            max_items: 40,
            max_load_failures: 3,
        })?;
        let mut harness = Harness::start_with_cache(MemoryInventory::seeded(2, 200), cache);

        harness.press(KeyCode::Char('G'));
        harness.press(KeyCode::Char('G'));

        assert_eq!(harness.view_data.cache.len(), 40);
        let focused = harness.view_data.cache.items()[harness.view_data.table.selected_row].id;
        assert_eq!(focused, ItemId::new(41));
        assert_eq!(harness.inventory().calls_of(CallKind::FetchItems).len(), 3);
        Ok(())
    }

    #[test]
    fn space_toggles_and_x_clears_selection() {
        let mut harness = Harness::start(MemoryInventory::seeded(1, 30));

        harness.press(KeyCode::Char(' '));
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Char(' '));
        assert_eq!(
            harness.view_data.selection.ids(),
            vec![ItemId::new(1), ItemId::new(2)]
        );

        harness.press(KeyCode::Char(' '));
        assert_eq!(harness.view_data.selection.ids(), vec![ItemId::new(1)]);

        harness.press(KeyCode::Char('x'));
        assert!(harness.view_data.selection.is_empty());
    }

    #[test]
    fn inline_name_edit_saves_and_updates_row() {
        let mut harness = Harness::start(MemoryInventory::new(sample_items(), Vec::new()));
        harness.inventory().clear_calls();

        harness.press(KeyCode::Char('l'));
        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.mode, AppMode::Edit);

        harness.press_with(KeyCode::Char('u'), KeyModifiers::CONTROL);
        harness.type_text("New Value");
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.mode, AppMode::Nav);
        assert!(harness.view_data.editor.is_none());
        assert_eq!(
            harness.inventory().calls(),
            vec![ApiCall::UpdateItem {
                id: ItemId::new(1),
                patch: ItemPatch {
                    name: Some("New Value".to_owned()),
                    ..ItemPatch::default()
                },
            }]
        );
        assert_eq!(harness.view_data.cache.items()[0].name, "New Value");
        assert!(harness.status().contains("saved name"));
    }

    #[test]
    fn invalid_price_cancels_without_request() {
        let mut harness = Harness::start(MemoryInventory::new(sample_items(), Vec::new()));
        harness.inventory().clear_calls();

        for _ in 0..6 {
            harness.press(KeyCode::Char('l'));
        }
        harness.press(KeyCode::Char('e'));
        harness.press_with(KeyCode::Char('u'), KeyModifiers::CONTROL);
        harness.type_text("abc");
        harness.press(KeyCode::Enter);

        assert!(harness.inventory().calls().is_empty());
        assert_eq!(harness.view_data.cache.items()[0].price, 100.0);
        assert!(harness.status().contains("price must be a number"));
    }

    #[test]
    fn escape_discards_the_edit() {
        let mut harness = Harness::start(MemoryInventory::new(sample_items(), Vec::new()));
        harness.inventory().clear_calls();

        harness.press(KeyCode::Char('l'));
        harness.press(KeyCode::Enter);
        harness.type_text("zzz");
        harness.press(KeyCode::Esc);

        assert_eq!(harness.state.mode, AppMode::Nav);
        assert!(harness.inventory().calls().is_empty());
        assert_eq!(harness.view_data.cache.items()[0].name, "Item 1");
    }

    #[test]
    fn status_choice_cycles_with_l() {
        let mut harness = Harness::start(MemoryInventory::new(sample_items(), Vec::new()));
        harness.inventory().clear_calls();

        harness.press(KeyCode::Char('$'));
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Char('l'));
        harness.press(KeyCode::Char('l'));
        harness.press(KeyCode::Enter);

        assert_eq!(
            harness.view_data.cache.items()[0].status,
            ItemStatus::OutOfStock
        );
        assert_eq!(harness.inventory().calls_of(CallKind::UpdateItem).len(), 1);
    }

    #[test]
    fn category_edit_without_categories_reports_status() {
        let mut harness = Harness::start(MemoryInventory::new(sample_items(), Vec::new()));

        for _ in 0..5 {
            harness.press(KeyCode::Char('l'));
        }
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.mode, AppMode::Nav);
        assert!(harness.status().contains("no categories"));
    }

    #[test]
    fn category_edit_picks_from_loaded_categories() {
        let mut harness = Harness::start(MemoryInventory::new(sample_items(), shop_categories()));

        for _ in 0..5 {
            harness.press(KeyCode::Char('l'));
        }
        harness.press(KeyCode::Enter);
        harness.press(KeyCode::Tab);
        harness.press(KeyCode::Enter);

        let row = &harness.view_data.cache.items()[0];
        assert_eq!(row.category_id, CategoryId::new(2));
        assert_eq!(row.category, "Pants");
    }

    #[test]
    fn failed_category_fetch_still_loads_items() {
        let inventory = MemoryInventory::seeded(3, 30);
        inventory.fail_next(CallKind::FetchCategories, 1);
        let harness = Harness::start(inventory);

        assert!(harness.view_data.categories.is_empty());
        assert_eq!(harness.view_data.cache.len(), 20);
        assert!(harness.status().contains("categories unavailable"));
    }

    #[test]
    fn bulk_requires_a_selection() {
        let mut harness = Harness::start(MemoryInventory::seeded(1, 30));

        harness.press(KeyCode::Char('b'));

        assert_eq!(harness.state.mode, AppMode::Nav);
        assert!(!harness.view_data.bulk.is_open());
        assert!(harness.status().contains("select rows"));
        assert!(
            harness
                .inventory()
                .calls_of(CallKind::BulkUpdateStatus)
                .is_empty()
        );
    }

    #[test]
    fn bulk_update_applies_status_and_reloads() {
        let mut harness = Harness::start(MemoryInventory::new(sample_items(), Vec::new()));
        harness.inventory().clear_calls();

        harness.press(KeyCode::Char(' '));
        harness.press(KeyCode::Char('j'));
        harness.press(KeyCode::Char(' '));
        harness.press(KeyCode::Char('b'));
        assert_eq!(harness.state.mode, AppMode::Bulk);
        harness.press(KeyCode::Char('l'));
        harness.press(KeyCode::Char('l'));
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.mode, AppMode::Nav);
        assert!(harness.view_data.selection.is_empty());
        assert_eq!(
            harness.inventory().calls(),
            vec![
                ApiCall::BulkUpdateStatus {
                    ids: vec![ItemId::new(1), ItemId::new(2)],
                    status: ItemStatus::OutOfStock,
                },
                ApiCall::FetchItems { take: 20, cursor: 0 },
            ]
        );
        assert!(
            harness
                .view_data
                .cache
                .items()
                .iter()
                .all(|item| item.status == ItemStatus::OutOfStock)
        );
        assert!(harness.status().contains("2 items set to out of stock"));
    }

    #[test]
    fn bulk_failure_keeps_modal_and_selection() {
        let mut harness = Harness::start(MemoryInventory::new(sample_items(), Vec::new()));
        harness.inventory().fail_next(CallKind::BulkUpdateStatus, 1);

        harness.press(KeyCode::Char(' '));
        harness.press(KeyCode::Char('b'));
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.mode, AppMode::Bulk);
        assert!(harness.view_data.bulk.is_open());
        assert_eq!(harness.view_data.selection.ids(), vec![ItemId::new(1)]);
        assert!(harness.status().contains("bulk update failed"));
    }

    #[test]
    fn reload_supersedes_pending_page() {
        let mut harness = Harness::start(MemoryInventory::seeded(4, 100));
        harness.runtime.defer_pages = true;

        harness.press(KeyCode::Char('G'));
        harness.press(KeyCode::Char('r'));
        let deferred = std::mem::take(&mut harness.runtime.deferred);
        assert_eq!(deferred.len(), 2);
        assert_eq!(deferred[0].kind, LoadKind::More);
        assert_eq!(deferred[1].kind, LoadKind::Initial);

        harness.runtime.deliver(&harness.tx, deferred[0]);
        harness.pump();
        assert_eq!(harness.view_data.cache.len(), 20);
        assert!(harness.view_data.cache.is_loading());

        harness.runtime.deliver(&harness.tx, deferred[1]);
        harness.pump();
        assert_eq!(harness.view_data.cache.len(), 20);
        // The cursor still sits at the bottom, so the fresh first page is
        // followed by a new next-page request from the first cursor.
        let next = std::mem::take(&mut harness.runtime.deferred);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].kind, LoadKind::More);
        assert_eq!(next[0].cursor, 20);
    }

    #[test]
    fn initial_load_failure_is_shown() {
        let inventory = MemoryInventory::seeded(1, 30);
        inventory.fail_next(CallKind::FetchItems, 1);
        let mut harness = Harness::start(inventory);

        assert!(harness.view_data.cache.is_empty());
        assert!(harness.status().contains("load failed"));
        assert!(harness.status().contains("press r"));

        harness.press(KeyCode::Char('r'));
        assert_eq!(harness.view_data.cache.len(), 20);
    }

    #[test]
    fn quit_keys_exit() {
        let mut harness = Harness::start(MemoryInventory::seeded(1, 5));
        assert!(harness.press(KeyCode::Char('q')));
        assert!(harness.press_with(KeyCode::Char('q'), KeyModifiers::CONTROL));
    }

    #[test]
    fn q_types_into_an_open_editor() {
        let mut harness = Harness::start(MemoryInventory::new(sample_items(), Vec::new()));
        harness.press(KeyCode::Char('l'));
        harness.press(KeyCode::Enter);

        assert!(!harness.press(KeyCode::Char('q')));
        let editor = harness.view_data.editor.as_ref().expect("editor open");
        assert_eq!(editor.display(), "Item 1q");
    }

    #[test]
    fn help_overlay_swallows_keys() {
        let mut harness = Harness::start(MemoryInventory::seeded(1, 30));
        harness.press(KeyCode::Char('?'));
        assert!(harness.view_data.help_visible);
        assert!(status_text(&harness.state, &harness.view_data).is_empty());

        harness.press(KeyCode::Char('j'));
        assert_eq!(harness.view_data.table.selected_row, 0);

        harness.press(KeyCode::Esc);
        assert!(!harness.view_data.help_visible);
    }

    #[test]
    fn status_text_shows_mode_badge() {
        let mut harness = Harness::start(MemoryInventory::seeded(1, 5));
        assert!(status_text(&harness.state, &harness.view_data).starts_with("NAV"));

        harness.press(KeyCode::Char('l'));
        harness.press(KeyCode::Enter);
        assert!(status_text(&harness.state, &harness.view_data).starts_with("EDIT"));
    }

    #[test]
    fn only_visible_rows_are_rendered() -> Result<()> {
        let mut harness = Harness::start(MemoryInventory::seeded(1, 100));
        assert!(set_viewport_rows(&mut harness.view_data, 20));
        assert_eq!(visible_range(&harness.view_data), 0..14);

        let mut terminal = Terminal::new(TestBackend::new(100, 20))?;
        terminal.draw(|frame| render(frame, &harness.state, &harness.view_data))?;
        let text = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>();
        assert!(text.contains("20 loaded"));
        assert_eq!(text.matches("[ ]").count(), 14);
        assert!(text.contains("NAV"));
        Ok(())
    }

    #[test]
    fn title_shows_when_the_first_page_arrived() {
        let harness = Harness::start(MemoryInventory::seeded(1, 5));
        let title = table_title(&harness.view_data);
        assert!(title.starts_with("stockroom | 5 loaded | 0 selected | end"));
        assert!(title.contains(" | loaded "), "{title}");
        assert!(title.ends_with(" UTC"), "{title}");
    }

    #[test]
    fn money_formats_with_two_decimals() {
        assert_eq!(format_money(price_cents(49.9)), "$49.90");
        assert_eq!(format_money(price_cents(150.0)), "$150.00");
        assert_eq!(format_money(-5), "-$0.05");
    }
}
