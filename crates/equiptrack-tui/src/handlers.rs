//! Keyboard event handling.

use crate::app::{App, AppState, FormField, InputMode, LoginField};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Handle a key event. Returns true if the app should quit.
pub fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    // Ctrl+C quits from anywhere
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.state = AppState::Quit;
        return true;
    }

    match app.input_mode {
        InputMode::Login => handle_login_key(app, key),
        InputMode::Normal => handle_normal_key(app, key),
        InputMode::Search => handle_search_key(app, key),
        InputMode::Form => handle_form_key(app, key),
        InputMode::ConfirmDelete => handle_confirm_key(app, key),
        InputMode::LoadPath => handle_load_path_key(app, key),
    }
}

fn login_buffer(app: &mut App) -> &mut String {
    match app.login_field {
        LoginField::Username => &mut app.username_input,
        LoginField::Password => &mut app.password_input,
    }
}

fn handle_login_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter => {
            if app.login_field == LoginField::Username {
                app.login_field = LoginField::Password;
            } else {
                app.try_login();
            }
            false
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.login_field = match app.login_field {
                LoginField::Username => LoginField::Password,
                LoginField::Password => LoginField::Username,
            };
            false
        }
        KeyCode::Char(c) => {
            login_buffer(app).push(c);
            false
        }
        KeyCode::Backspace => {
            login_buffer(app).pop();
            false
        }
        KeyCode::Esc => {
            app.state = AppState::Quit;
            true
        }
        _ => false,
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::Quit;
            true
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.move_down();
            false
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.move_up();
            false
        }
        KeyCode::Char('/') => {
            app.start_search();
            false
        }
        KeyCode::Char('a') => {
            app.start_add();
            false
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            app.start_edit();
            false
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            app.request_delete();
            false
        }
        KeyCode::Char('s') => {
            app.save();
            false
        }
        KeyCode::Char('l') => {
            app.start_load();
            false
        }
        KeyCode::Esc => {
            app.status_message = None;
            false
        }
        _ => false,
    }
}

fn handle_search_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.exit_search();
            false
        }
        KeyCode::Enter => {
            app.finish_search();
            false
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            app.perform_search();
            false
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            app.perform_search();
            false
        }
        _ => false,
    }
}

fn handle_form_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => app.cancel_form(),
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab | KeyCode::Down => app.form.focus = app.form.focus.next(),
        KeyCode::BackTab | KeyCode::Up => app.form.focus = app.form.focus.prev(),
        KeyCode::Left | KeyCode::Right if app.form.focus == FormField::Material => {
            let materials = app.materials();
            app.form.cycle_material(&materials, key.code == KeyCode::Right);
        }
        KeyCode::Char(c) => app.form.push_char(c),
        KeyCode::Backspace => app.form.pop_char(),
        _ => {}
    }
    false
}

fn handle_confirm_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(true),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.confirm_delete(false),
        _ => {}
    }
    false
}

fn handle_load_path_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => app.cancel_load(),
        KeyCode::Enter => app.load_from_path(),
        KeyCode::Char(c) => app.load_path.push(c),
        KeyCode::Backspace => {
            app.load_path.pop();
        }
        _ => {}
    }
    false
}
