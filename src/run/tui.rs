use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

use crate::db::Database;
use crate::ui::app::{App, InputMode, PendingAction, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

pub(crate) fn as_tui(db: &mut Database) -> Result<()> {
    let mut app = App::new(super::today());
    app.refresh_all(db)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, db);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "tui exited with error");
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    db: &mut Database,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| {
            // Tab bar, status bar, command bar, table border and header
            let content_height = f.area().height.saturating_sub(6) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.show_help {
                app.show_help = false;
                continue;
            }
            match app.input_mode {
                InputMode::Normal => handle_normal_input(key, app, db)?,
                InputMode::Command => handle_command_input(key, app, db)?,
                InputMode::Confirm => handle_confirm_input(key, app, db)?,
            }
        }
    }
    Ok(())
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.running = false;
        }
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.visible_rows / 2 {
                handle_move_down(app);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.visible_rows / 2 {
                handle_move_up(app);
            }
        }
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('1') => switch_screen(app, db, Screen::Dashboard)?,
        KeyCode::Char('2') => switch_screen(app, db, Screen::Expenses)?,
        KeyCode::Char('3') => switch_screen(app, db, Screen::Recurring)?,
        KeyCode::Tab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let next = (idx + 1) % screens.len();
            switch_screen(app, db, screens[next])?;
        }
        KeyCode::BackTab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let prev = if idx == 0 { screens.len() - 1 } else { idx - 1 };
            switch_screen(app, db, screens[prev])?;
        }
        KeyCode::Char('H') => run_command("prev-month", app, db)?,
        KeyCode::Char('L') => run_command("next-month", app, db)?,
        KeyCode::Char('T') => run_command("today", app, db)?,
        KeyCode::Char('D') if app.screen != Screen::Dashboard => {
            run_command("delete", app, db)?;
        }
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Esc => app.set_status(""),
        _ => {}
    }
    Ok(())
}

fn handle_command_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            run_command(&input, app, db)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

/// Run a command line, reporting user errors in the status bar instead of
/// leaving the TUI.
fn run_command(input: &str, app: &mut App, db: &mut Database) -> Result<()> {
    if let Err(e) = commands::handle_command(input, app, db) {
        tracing::warn!(command = input, error = %e, "command failed");
        app.set_status(format!("Error: {e:#}"));
    }
    Ok(())
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            if let Some(action) = app.pending_action.take() {
                match action {
                    PendingAction::DeleteExpense { id, label } => {
                        if db.delete_expense(id)? {
                            tracing::info!(id, "expense deleted");
                            app.set_status(format!("Deleted {label}"));
                        } else {
                            app.set_status(format!("Expense #{id} was already gone"));
                        }
                        app.refresh_expenses(db)?;
                        app.refresh_dashboard(db)?;
                    }
                    PendingAction::DeleteBill { id, name } => {
                        if db.delete_recurring(id)? {
                            tracing::info!(id, "recurring bill deleted");
                            app.set_status(format!("Deleted bill: {name}"));
                        } else {
                            app.set_status(format!("Bill '{name}' was already gone"));
                        }
                        app.refresh_bills(db)?;
                    }
                }
            }
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            app.set_status("Cancelled");
        }
        _ => {}
    }
    Ok(())
}

// ── Navigation helpers ───────────────────────────────────────

fn switch_screen(app: &mut App, db: &mut Database, screen: Screen) -> Result<()> {
    app.screen = screen;
    match screen {
        Screen::Dashboard => app.refresh_dashboard(db)?,
        Screen::Expenses => app.refresh_expenses(db)?,
        Screen::Recurring => app.refresh_bills(db)?,
    }
    app.set_status(format!("{screen}"));
    Ok(())
}

/// The bill table shares its screen with the three-line "This Month" panel.
fn bill_page(page: usize) -> usize {
    page.saturating_sub(3).max(1)
}

fn handle_move_down(app: &mut App) {
    let page = app.visible_rows;
    match app.screen {
        Screen::Expenses => scroll_down(
            &mut app.expense_index,
            &mut app.expense_scroll,
            app.expenses.len(),
            page,
        ),
        Screen::Recurring => scroll_down(
            &mut app.bill_index,
            &mut app.bill_scroll,
            app.bills.len(),
            bill_page(page),
        ),
        Screen::Dashboard => {}
    }
}

fn handle_move_up(app: &mut App) {
    match app.screen {
        Screen::Expenses => scroll_up(&mut app.expense_index, &mut app.expense_scroll),
        Screen::Recurring => scroll_up(&mut app.bill_index, &mut app.bill_scroll),
        Screen::Dashboard => {}
    }
}

fn handle_goto_top(app: &mut App) {
    match app.screen {
        Screen::Expenses => scroll_to_top(&mut app.expense_index, &mut app.expense_scroll),
        Screen::Recurring => scroll_to_top(&mut app.bill_index, &mut app.bill_scroll),
        Screen::Dashboard => {}
    }
}

fn handle_goto_bottom(app: &mut App) {
    let page = app.visible_rows;
    match app.screen {
        Screen::Expenses => scroll_to_bottom(
            &mut app.expense_index,
            &mut app.expense_scroll,
            app.expenses.len(),
            page,
        ),
        Screen::Recurring => scroll_to_bottom(
            &mut app.bill_index,
            &mut app.bill_scroll,
            app.bills.len(),
            bill_page(page),
        ),
        Screen::Dashboard => {}
    }
}
