use crate::app::{App, MenuItem};
use crate::state::app_state::{AdminFocus, Form};
use crate::state::messages::NetworkRequest;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tourneyfund_api::purchase::PurchaseFlow;

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;

    if let (Char('c'), KeyModifiers::CONTROL) = (key_event.code, key_event.modifiers) {
        crate::cleanup_terminal();
        std::process::exit(0);
    }

    let requests = if guard.state.confirm.is_some() {
        handle_confirm(&mut guard, key_event).into_iter().collect()
    } else if guard.state.purchase.is_open() {
        handle_purchase(&mut guard, key_event).into_iter().collect()
    } else if guard.state.input_captured() {
        handle_text_input(&mut guard, key_event).into_iter().collect()
    } else {
        handle_shortcuts(&mut guard, key_event)
    };

    drop(guard);
    for request in requests {
        let _ = network_requests.send(request).await;
    }
}

fn handle_confirm(app: &mut App, key_event: KeyEvent) -> Option<NetworkRequest> {
    match key_event.code {
        Char('y') | Char('Y') => app.resolve_confirm(true),
        Char('n') | Char('N') | KeyCode::Esc => app.resolve_confirm(false),
        _ => None,
    }
}

fn handle_purchase(app: &mut App, key_event: KeyEvent) -> Option<NetworkRequest> {
    let flow = &app.state.purchase;
    if matches!(flow, PurchaseFlow::Redirecting { .. } | PurchaseFlow::Completed { .. }) {
        if matches!(key_event.code, KeyCode::Enter | KeyCode::Esc) {
            app.state.purchase.close();
        }
        return None;
    }
    if flow.is_submitting() {
        return None;
    }

    match key_event.code {
        KeyCode::Esc | Char('q') => app.state.purchase.close(),
        KeyCode::Enter => return app.submit_purchase(),
        code => {
            let order = app.state.purchase.order_mut()?;
            match code {
                KeyCode::Right | Char('l') => order.teams_per_ticket = order.teams_per_ticket.next(),
                KeyCode::Left | Char('h') => order.teams_per_ticket = order.teams_per_ticket.prev(),
                KeyCode::Up | Char('k') | Char('+') => order.increment_quantity(),
                KeyCode::Down | Char('j') | Char('-') => order.decrement_quantity(),
                Char('m') => order.method = order.method.next(),
                Char('c') => order.category = order.category.toggle(),
                _ => {}
            }
        }
    }
    None
}

fn edit_form(form: &mut Form, key_event: KeyEvent) {
    match key_event.code {
        KeyCode::Tab | KeyCode::Down => form.next_field(),
        KeyCode::BackTab | KeyCode::Up => form.prev_field(),
        KeyCode::Backspace => form.pop_char(),
        Char(c) => form.push_char(c),
        _ => {}
    }
}

fn handle_text_input(app: &mut App, key_event: KeyEvent) -> Option<NetworkRequest> {
    match app.state.active_tab {
        MenuItem::Account => match key_event.code {
            KeyCode::Esc => app.state.auth.form.editing = false,
            KeyCode::Enter => return app.submit_auth(),
            _ => edit_form(&mut app.state.auth.form, key_event),
        },
        MenuItem::Tournaments => match key_event.code {
            KeyCode::Esc => app.cancel_editor(),
            KeyCode::Enter => return app.save_editor(),
            _ => {
                if let Some(editor) = app.state.tournaments.editor.as_mut() {
                    edit_form(&mut editor.form, key_event);
                }
            }
        },
        _ => {
            let table = app.state.active_table()?;
            match key_event.code {
                KeyCode::Esc | KeyCode::Enter => table.set_searching(false),
                KeyCode::Backspace => table.pop_query(),
                Char(c) => table.push_query(c),
                _ => {}
            }
        }
    }
    None
}

fn handle_shortcuts(app: &mut App, key_event: KeyEvent) -> Vec<NetworkRequest> {
    let mut requests = Vec::new();

    match (app.state.active_tab, key_event.code) {
        (_, Char('q')) => {
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1')) => requests = app.update_tab(MenuItem::Home),
        (_, Char('2')) => requests = app.update_tab(MenuItem::HowItWorks),
        (_, Char('3')) => requests = app.update_tab(MenuItem::BuyTickets),
        (_, Char('4')) => requests = app.update_tab(MenuItem::MyTickets),
        (_, Char('5')) => requests = app.update_tab(MenuItem::Leaderboard),
        (_, Char('6')) => requests = app.update_tab(MenuItem::Account),
        (_, Char('7')) => requests = app.update_tab(MenuItem::Dashboard),
        (_, Char('8')) => requests = app.update_tab(MenuItem::Tournaments),
        (_, Char('9')) => requests = app.update_tab(MenuItem::Tickets),
        (_, Char('0')) => requests = app.update_tab(MenuItem::Payments),
        (_, Char('-')) => requests = app.update_tab(MenuItem::Users),
        (_, Char('?')) => requests = app.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc) => app.exit_help(),

        // Buy tickets
        (MenuItem::BuyTickets, KeyCode::Enter | Char('b')) => app.open_purchase(),

        // Leaderboard
        (MenuItem::Leaderboard, KeyCode::Right | Char('l') | Char('t')) => {
            requests.extend(app.cycle_leaderboard(true));
        }
        (MenuItem::Leaderboard, KeyCode::Left | Char('h')) => {
            requests.extend(app.cycle_leaderboard(false));
        }

        // Account
        (MenuItem::Account, KeyCode::Enter | Char('i')) => {
            if !app.session.is_authenticated() {
                app.state.auth.form.editing = true;
            }
        }
        (MenuItem::Account, Char('m')) => app.state.auth.toggle_mode(),
        (MenuItem::Account, Char('a')) => app.state.auth.toggle_admin(),

        // Tournament admin
        (MenuItem::Tournaments, KeyCode::Tab) => app.state.tournaments.toggle_focus(),
        (MenuItem::Tournaments, Char('j') | KeyCode::Down) => {
            requests.extend(app.move_tournament_cursor(true));
        }
        (MenuItem::Tournaments, Char('k') | KeyCode::Up) => {
            requests.extend(app.move_tournament_cursor(false));
        }
        (MenuItem::Tournaments, Char('n')) => app.open_editor(true),
        (MenuItem::Tournaments, Char('e') | KeyCode::Enter) => {
            if app.state.tournaments.editor.is_some() {
                requests.extend(app.save_editor());
            } else {
                app.open_editor(false);
            }
        }
        (MenuItem::Tournaments, Char('s')) => {
            if app.state.tournaments.focus == AdminFocus::Teams {
                app.open_score_editor();
            }
        }
        (MenuItem::Tournaments, KeyCode::Esc) if app.state.tournaments.editor.is_some() => {
            app.cancel_editor();
        }
        (MenuItem::Tournaments, Char('d')) => app.request_delete(),

        // Tables
        (MenuItem::Tickets, Char('t')) => requests = app.cycle_ticket_filter(),
        (MenuItem::Tickets | MenuItem::Users, Char('d')) => app.request_delete(),
        (MenuItem::Payments, Char('x')) => app.request_refund(),
        (
            MenuItem::MyTickets | MenuItem::Tickets | MenuItem::Payments | MenuItem::Users,
            code,
        ) if is_table_key(code) => {
            if let Some(table) = app.state.active_table() {
                match code {
                    Char('j') | KeyCode::Down => table.select_next(),
                    Char('k') | KeyCode::Up => table.select_prev(),
                    Char('n') | KeyCode::Right | KeyCode::PageDown => table.next_page(),
                    Char('p') | KeyCode::Left | KeyCode::PageUp => table.prev_page(),
                    Char('/') => table.set_searching(true),
                    _ => {}
                }
            }
        }

        // Global
        (_, Char('r')) => requests = app.enter_requests(),
        (_, Char('L')) => {
            if app.session.is_authenticated() {
                requests = app.logout();
            }
        }
        (_, Char('f')) => app.toggle_full_screen(),
        (_, Char('"')) => app.toggle_show_logs(),
        (_, KeyCode::Esc) => app.dismiss_banner(),

        _ => {}
    }

    requests
}

fn is_table_key(code: KeyCode) -> bool {
    matches!(
        code,
        Char('j' | 'k' | 'n' | 'p' | '/')
            | KeyCode::Down
            | KeyCode::Up
            | KeyCode::Right
            | KeyCode::Left
            | KeyCode::PageDown
            | KeyCode::PageUp
    )
}
