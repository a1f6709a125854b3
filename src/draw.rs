use log::error;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Flex, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::state::app_state::{
    AdminFocus, AuthMode, BannerKind, Form, Paged, Searchable, TournamentAdminState,
};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::ui::layout::LayoutAreas;
use tourneyfund_api::purchase::{MAX_QUANTITY, MIN_QUANTITY, PurchaseFlow, PurchaseOrder, price};
use tourneyfund_api::scoring::standings;
use tourneyfund_api::{TeamsPerTicket, TicketRow, Tournament};

const SELECTED: Style = Style::new().fg(Color::Black).bg(Color::Cyan);
const HEADER: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);
const DIM: Style = Style::new().fg(Color::DarkGray);

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(
            f.area(),
            app.settings.full_screen,
            app.state.banner.is_some(),
            app.state.show_logs,
        );

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }
        draw_banner(f, layout.banner, app);

        match app.state.active_tab {
            MenuItem::Home => draw_home(f, layout.main, app),
            MenuItem::HowItWorks => draw_how_it_works(f, layout.main),
            MenuItem::BuyTickets => draw_buy_tickets(f, layout.main, app),
            MenuItem::MyTickets => draw_ticket_table(f, layout.main, " My Tickets ", &app.state.my_tickets, None),
            MenuItem::Leaderboard => draw_leaderboard(f, layout.main, app),
            MenuItem::Account => draw_account(f, layout.main, app),
            MenuItem::Dashboard => draw_dashboard(f, layout.main, app),
            MenuItem::Tournaments => draw_tournaments(f, layout.main, &app.state.tournaments),
            MenuItem::Tickets => {
                let filter = ticket_filter_label(app);
                draw_ticket_table(f, layout.main, " Tickets ", &app.state.tickets.table, Some(&filter))
            }
            MenuItem::Payments => draw_payments(f, layout.main, app),
            MenuItem::Users => draw_users(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if app.state.active_tab == MenuItem::BuyTickets && app.state.purchase.is_open() {
            draw_purchase_modal(f, layout.main, &app.state.purchase);
        }
        if let Some(action) = app.state.confirm.as_ref() {
            draw_confirm(f, layout.main, &action.prompt());
        }
        if let Some(area) = layout.logs {
            draw_logs(f, area);
        }

        draw_loading_spinner(f, f.area(), app, loading);
    });

    if let Err(e) = result {
        error!("failed to draw frame: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center).areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width)]).flex(Flex::Center).areas(row);
    cell
}

fn tab_key(tab: MenuItem) -> &'static str {
    match tab {
        MenuItem::Home => "1",
        MenuItem::HowItWorks => "2",
        MenuItem::BuyTickets => "3",
        MenuItem::MyTickets => "4",
        MenuItem::Leaderboard => "5",
        MenuItem::Account => "6",
        MenuItem::Dashboard => "7",
        MenuItem::Tournaments => "8",
        MenuItem::Tickets => "9",
        MenuItem::Payments => "0",
        MenuItem::Users => "-",
        MenuItem::Help => "?",
    }
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tabs = app.visible_tabs();
    let titles: Vec<Line> = tabs
        .iter()
        .map(|t| Line::from(format!("{} {}", tab_key(*t), t.title())))
        .collect();
    let tab_index = tabs.iter().position(|t| *t == app.state.active_tab);

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let who = match app.session.identity() {
        Some(identity) if app.is_admin() => format!("{} (admin)  ? help ", identity.name),
        Some(identity) => format!("{}  ? help ", identity.name),
        None => "Signed out  ? help ".to_string(),
    };
    let help = Paragraph::new(who)
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn draw_banner(f: &mut Frame, area: Rect, app: &App) {
    let Some(banner) = app.state.banner.as_ref() else {
        return;
    };
    let style = match banner.kind {
        BannerKind::Info => Style::default().fg(Color::Black).bg(Color::Green),
        BannerKind::Error => Style::default().fg(Color::White).bg(Color::Red),
    };
    f.render_widget(
        Paragraph::new(format!(" {}  (Esc to dismiss)", banner.message)).style(style),
        area,
    );
}

fn format_date(tournament: &Tournament) -> String {
    tournament
        .announcement_date
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| "TBA".to_string())
}

fn price_lines() -> Vec<Line<'static>> {
    TeamsPerTicket::ALL
        .iter()
        .map(|t| Line::from(format!("  {t} teams per ticket    ${}", price(*t))))
        .collect()
}

fn draw_home(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Tournament Fundraiser ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = vec![
        Line::from(Span::styled("Back your bracket, fund the cause.", HEADER)),
        Line::from(""),
    ];
    match app.state.catalog.active_tournament() {
        Some(t) => {
            lines.push(Line::from(vec![Span::styled("Now selling: ", DIM), Span::raw(t.name.clone())]));
            lines.push(Line::from(format!(
                "  {} rounds  |  {} teams per ticket  |  teams announced {}",
                t.rounds,
                t.teams_per_ticket,
                format_date(t)
            )));
        }
        None if app.state.catalog.loaded => lines.push(Line::from("No tournament is open yet.")),
        None => lines.push(Line::from("Loading tournaments...")),
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Ticket prices", HEADER)));
    lines.extend(price_lines());
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "3 = buy tickets   5 = leaderboard   6 = sign in",
        DIM,
    )));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_how_it_works(f: &mut Frame, area: Rect) {
    let block = default_border(Color::White).title(" How It Works ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = vec![
        Line::from(Span::styled("1. Buy a ticket", HEADER)),
        Line::from("   Pick how many teams each ticket holds. More teams cost more."),
        Line::from(""),
        Line::from(Span::styled("2. Get your teams", HEADER)),
        Line::from("   Teams are drawn for every ticket when the field is announced."),
        Line::from(""),
        Line::from(Span::styled("3. Score every round", HEADER)),
        Line::from("   Each team earns points per round until it is eliminated."),
        Line::from("   A ticket's score is the sum of its teams' points."),
        Line::from(""),
        Line::from(Span::styled("4. Climb the leaderboard", HEADER)),
        Line::from("   The highest scoring tickets win. Proceeds go to the fundraiser."),
        Line::from(""),
        Line::from(Span::styled("Prices", HEADER)),
    ];
    lines.extend(price_lines());

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_buy_tickets(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Buy Tickets ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = Vec::new();
    match app.state.catalog.active_tournament() {
        Some(t) => {
            lines.push(Line::from(Span::styled(t.name.clone(), HEADER)));
            lines.push(Line::from(format!("Teams announced {}", format_date(t))));
        }
        None if app.state.catalog.loaded => {
            lines.push(Line::from("No tournament is selling tickets right now."));
        }
        None => lines.push(Line::from("Loading tournaments...")),
    }
    lines.push(Line::from(""));
    lines.extend(price_lines());
    lines.push(Line::from(""));
    let hint = if app.session.is_authenticated() {
        "Enter = start a purchase"
    } else {
        "Sign in (6) to buy tickets"
    };
    lines.push(Line::from(Span::styled(hint, DIM)));

    f.render_widget(Paragraph::new(lines), inner);
}

fn order_lines(order: &PurchaseOrder) -> Vec<Line<'static>> {
    vec![
        Line::from(format!("Teams per ticket   < {} >", order.teams_per_ticket)),
        Line::from(format!(
            "Quantity           {}  ({MIN_QUANTITY}-{MAX_QUANTITY})",
            order.quantity
        )),
        Line::from(format!("Payment method     {}", order.method.label())),
        Line::from(format!("Category           {}", order.category.label())),
        Line::from(format!("Price per ticket   ${}", order.unit_price())),
        Line::from(Span::styled(format!("Total              ${}", order.amount_due()), HEADER)),
    ]
}

fn draw_purchase_modal(f: &mut Frame, area: Rect, flow: &PurchaseFlow) {
    let popup = centered(area, 56.min(area.width), 14.min(area.height));
    f.render_widget(Clear, popup);
    let block = default_border(Color::Cyan).title(" Checkout ");
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines = Vec::new();
    match flow {
        PurchaseFlow::Idle => return,
        PurchaseFlow::Configuring(order) => {
            lines.extend(order_lines(order));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "←/→ teams  ↑/↓ quantity  m method  c category  Enter pay  Esc close",
                DIM,
            )));
        }
        PurchaseFlow::Submitting(order) => {
            lines.extend(order_lines(order));
            lines.push(Line::from(""));
            lines.push(Line::from("Processing payment..."));
        }
        PurchaseFlow::Failed { order, message } => {
            lines.extend(order_lines(order));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))));
            lines.push(Line::from(Span::styled("Enter to retry  Esc close", DIM)));
        }
        PurchaseFlow::Redirecting { url } => {
            lines.push(Line::from("Continue checkout in your browser:"));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(url.clone(), Style::default().fg(Color::Cyan))));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Enter to close", DIM)));
        }
        PurchaseFlow::Completed { tickets } => {
            lines.push(Line::from(Span::styled(
                format!("Purchase complete: {} ticket(s)", tickets.len().max(1)),
                Style::default().fg(Color::Green),
            )));
            lines.push(Line::from("Find them under My Tickets (4)."));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Enter to close", DIM)));
        }
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_confirm(f: &mut Frame, area: Rect, prompt: &str) {
    let popup = centered(area, 50.min(area.width), 5.min(area.height));
    f.render_widget(Clear, popup);
    let block = default_border(Color::Red).title(" Confirm ");
    let inner = block.inner(popup);
    f.render_widget(block, popup);
    f.render_widget(
        Paragraph::new(vec![Line::from(prompt.to_string()), Line::from(Span::styled("y = yes   n = no", DIM))])
            .alignment(Alignment::Center),
        inner,
    );
}

/// Shared table renderer. `selected` is the highlighted row on this page.
fn draw_rows(
    f: &mut Frame,
    area: Rect,
    block: Block,
    columns: &[(&'static str, Constraint)],
    rows: Vec<Vec<String>>,
    selected: Option<usize>,
    footer: String,
) {
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [table_area, footer_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);

    let rows: Vec<Row> = rows
        .into_iter()
        .enumerate()
        .map(|(i, cells)| {
            let row = Row::new(cells.into_iter().map(Cell::from));
            if Some(i) == selected { row.style(SELECTED) } else { row }
        })
        .collect();
    let widths: Vec<Constraint> = columns.iter().map(|(_, width)| *width).collect();
    let table = Table::new(rows, widths)
        .header(Row::new(columns.iter().map(|(name, _)| Cell::from(*name))).style(HEADER));
    f.render_widget(table, table_area);
    f.render_widget(Paragraph::new(footer).style(DIM), footer_area);
}

fn titled(title: &str) -> Block<'static> {
    default_border(Color::White).title(title.to_string())
}

fn paged_footer<T: Searchable>(table: &Paged<T>, hint: &str) -> String {
    let search = if table.searching {
        format!("search: {}_", table.query)
    } else if table.query.is_empty() {
        "/ search".to_string()
    } else {
        format!("search: {}", table.query)
    };
    format!(
        "page {}/{}  {} of {}  {search}  {hint}",
        table.page() + 1,
        table.page_count(),
        table.filtered().len(),
        table.total()
    )
}

fn empty_or_loading(f: &mut Frame, area: Rect, title: &str, loaded: bool, empty: &str) {
    let block = default_border(Color::White).title(title.to_string());
    let inner = block.inner(area);
    f.render_widget(block, area);
    let msg = if loaded { empty } else { "Loading..." };
    f.render_widget(Paragraph::new(msg).style(DIM).alignment(Alignment::Center), inner);
}

fn ticket_filter_label(app: &App) -> String {
    let name = app
        .state
        .tickets
        .tournament_filter
        .as_deref()
        .map(|id| {
            app.state
                .catalog
                .tournaments
                .iter()
                .find(|t| t.id == id)
                .map_or_else(|| id.to_string(), |t| t.name.clone())
        })
        .unwrap_or_else(|| "all tournaments".to_string());
    format!("t filter: {name}  d delete")
}

fn draw_ticket_table(f: &mut Frame, area: Rect, title: &str, table: &Paged<TicketRow>, hint: Option<&str>) {
    if !table.loaded || table.total() == 0 {
        return empty_or_loading(f, area, title, table.loaded, "No tickets yet.");
    }
    let rows = table
        .page_items()
        .into_iter()
        .map(|t| {
            vec![
                t.number.clone(),
                t.tournament.clone(),
                t.owner.clone(),
                t.teams.join(", "),
                t.kind.label().to_string(),
                t.status.clone(),
                format!("{:.0}", t.total_points),
                t.exchanges_left.to_string(),
            ]
        })
        .collect();
    draw_rows(
        f,
        area,
        titled(title),
        &[
            ("Ticket", Constraint::Length(10)),
            ("Tournament", Constraint::Fill(1)),
            ("Owner", Constraint::Fill(1)),
            ("Teams", Constraint::Fill(2)),
            ("Type", Constraint::Length(8)),
            ("Status", Constraint::Length(10)),
            ("Points", Constraint::Length(6)),
            ("Swaps", Constraint::Length(5)),
        ],
        rows,
        Some(table.selected_index()),
        paged_footer(table, hint.unwrap_or("")),
    );
}

fn draw_leaderboard(f: &mut Frame, area: Rect, app: &App) {
    let board = &app.state.leaderboard;
    let title = match board.selected_tournament() {
        Some(t) => format!(" Leaderboard: {}  (←/→) ", t.name),
        None => " Leaderboard ".to_string(),
    };
    if board.entries.is_empty() {
        let empty = if board.tournaments.is_empty() { "No tournaments yet." } else { "No scores yet." };
        let loaded = board.loaded || (board.tournaments.is_empty() && app.state.catalog.loaded);
        return empty_or_loading(f, area, &title, loaded, empty);
    }
    let rows = board
        .entries
        .iter()
        .map(|e| {
            vec![
                e.position.to_string(),
                e.ticket.clone(),
                e.player.clone(),
                e.total_points.to_string(),
            ]
        })
        .collect();
    draw_rows(
        f,
        area,
        titled(&title),
        &[
            ("#", Constraint::Length(4)),
            ("Ticket", Constraint::Length(12)),
            ("Player", Constraint::Fill(1)),
            ("Points", Constraint::Length(8)),
        ],
        rows,
        None,
        format!("{} tickets", board.entries.len()),
    )
}

fn form_lines(form: &Form) -> Vec<Line<'static>> {
    form.fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let value = if field.secret { "*".repeat(field.value.chars().count()) } else { field.value.clone() };
            let focused = form.editing && i == form.focus;
            let cursor = if focused { "_" } else { "" };
            let style = if focused { Style::default().fg(Color::Cyan) } else { Style::default() };
            Line::from(vec![
                Span::styled(format!("{:>26}: ", field.label), DIM),
                Span::styled(format!("{value}{cursor}"), style),
            ])
        })
        .collect()
}

fn draw_account(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Account ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if let Some(identity) = app.session.identity() {
        let lines = vec![
            Line::from(Span::styled(format!("Signed in as {}", identity.name), HEADER)),
            Line::from(format!("Email: {}", identity.email)),
            Line::from(format!("Role:  {}", identity.role.as_str())),
            Line::from(""),
            Line::from(Span::styled("L = log out", DIM)),
        ];
        f.render_widget(Paragraph::new(lines), inner);
        return;
    }

    let auth = &app.state.auth;
    let heading = match (auth.mode, auth.as_admin) {
        (AuthMode::Login, false) => "Player login",
        (AuthMode::Login, true) => "Admin login",
        (AuthMode::Register, false) => "Create a player account",
        (AuthMode::Register, true) => "Create an admin account",
    };
    let mut lines = vec![Line::from(Span::styled(heading, HEADER)), Line::from("")];
    lines.extend(form_lines(&auth.form));
    lines.push(Line::from(""));
    if let Some(message) = auth.message.as_ref() {
        lines.push(Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))));
    }
    let hint = if auth.form.editing {
        "Tab next field  Enter submit  Esc stop editing"
    } else {
        "Enter edit  m login/register  a player/admin"
    };
    lines.push(Line::from(Span::styled(hint, DIM)));

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let dashboard = &app.state.dashboard;
    if !dashboard.loaded {
        return empty_or_loading(f, area, " Dashboard ", false, "");
    }

    let [players_area, tournaments_area, tickets_area] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
    ])
    .areas(area);

    let players = dashboard
        .players
        .iter()
        .map(|u| vec![u.name.clone(), u.email.clone(), u.tickets.to_string(), u.joined.clone()])
        .collect();
    draw_rows(
        f,
        players_area,
        titled(" Recent Players "),
        &[
            ("Name", Constraint::Fill(1)),
            ("Email", Constraint::Fill(1)),
            ("Tickets", Constraint::Length(8)),
            ("Joined", Constraint::Length(12)),
        ],
        players,
        None,
        format!("{} shown", dashboard.players.len()),
    );

    let tournaments = dashboard
        .tournaments
        .iter()
        .map(|t| {
            vec![
                t.name.clone(),
                t.rounds.to_string(),
                t.teams_per_ticket.to_string(),
                if t.is_active { "active".into() } else { "inactive".into() },
            ]
        })
        .collect();
    draw_rows(
        f,
        tournaments_area,
        titled(" Recent Tournaments "),
        &[
            ("Name", Constraint::Fill(1)),
            ("Rounds", Constraint::Length(8)),
            ("Teams/ticket", Constraint::Length(13)),
            ("Status", Constraint::Length(10)),
        ],
        tournaments,
        None,
        format!("{} shown", dashboard.tournaments.len()),
    );

    let tickets = dashboard
        .tickets
        .iter()
        .map(|t| vec![t.number.clone(), t.owner.clone(), t.status.clone(), t.created.clone()])
        .collect();
    draw_rows(
        f,
        tickets_area,
        titled(" Recent Tickets "),
        &[
            ("Ticket", Constraint::Length(10)),
            ("Owner", Constraint::Fill(1)),
            ("Status", Constraint::Length(10)),
            ("Created", Constraint::Length(12)),
        ],
        tickets,
        None,
        format!("{} shown", dashboard.tickets.len()),
    );
}

fn draw_tournaments(f: &mut Frame, area: Rect, admin: &TournamentAdminState) {
    if !admin.loaded {
        return empty_or_loading(f, area, " Tournaments ", false, "");
    }

    let [list_area, teams_area] =
        Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)]).areas(area);

    let focus_color = |focus: AdminFocus| if admin.focus == focus { Color::Cyan } else { Color::White };

    let lines: Vec<Line> = admin
        .tournaments
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let marker = if t.is_active { "*" } else { " " };
            let text = format!("{marker} {} ({} rounds)", t.name, t.rounds);
            if i == admin.selected { Line::styled(text, SELECTED) } else { Line::from(text) }
        })
        .collect();
    let block = default_border(focus_color(AdminFocus::Tournaments)).title(" Tournaments ");
    let body = if lines.is_empty() { vec![Line::styled("No tournaments. n = new", DIM)] } else { lines };
    f.render_widget(Paragraph::new(body).block(block), list_area);

    let title = admin
        .selected_tournament()
        .map_or_else(|| " Teams ".to_string(), |t| format!(" Teams: {} ", t.name));
    let rows: Vec<Vec<String>> = standings(&admin.teams, &admin.scores)
        .into_iter()
        .map(|s| {
            vec![
                s.seed,
                s.label,
                s.points.to_string(),
                if s.eliminated { "out".into() } else { String::new() },
            ]
        })
        .collect();
    let selected_team = admin
        .selected_team()
        .and_then(|team| standings(&admin.teams, &admin.scores).iter().position(|s| s.team_id == team.id));
    draw_rows(
        f,
        teams_area,
        default_border(focus_color(AdminFocus::Teams)).title(title),
        &[
            ("Seed", Constraint::Length(6)),
            ("Team", Constraint::Fill(1)),
            ("Points", Constraint::Length(8)),
            ("", Constraint::Length(4)),
        ],
        rows,
        selected_team,
        "Tab focus  n new  e edit  d delete  s score".to_string(),
    );

    if let Some(editor) = admin.editor.as_ref() {
        let height = (editor.form.fields.len() as u16 + 5).min(area.height);
        let popup = centered(area, 60.min(area.width), height);
        f.render_widget(Clear, popup);
        let block = default_border(Color::Cyan).title(format!(" {} ", editor.title()));
        let inner = block.inner(popup);
        f.render_widget(block, popup);
        let mut lines = form_lines(&editor.form);
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Tab next field  Enter save  Esc cancel", DIM)));
        f.render_widget(Paragraph::new(lines), inner);
    }
}

fn draw_payments(f: &mut Frame, area: Rect, app: &App) {
    let table = &app.state.payments;
    if !table.loaded || table.total() == 0 {
        return empty_or_loading(f, area, " Payments ", table.loaded, "No payments yet.");
    }
    let rows = table
        .page_items()
        .into_iter()
        .map(|p| {
            vec![
                p.transaction_id.clone(),
                p.user.clone(),
                format!("${:.2}", p.amount),
                p.method.clone(),
                p.status.clone(),
                p.date.clone(),
            ]
        })
        .collect();
    draw_rows(
        f,
        area,
        titled(" Payments "),
        &[
            ("Transaction", Constraint::Fill(1)),
            ("User", Constraint::Fill(1)),
            ("Amount", Constraint::Length(10)),
            ("Method", Constraint::Length(8)),
            ("Status", Constraint::Length(10)),
            ("Date", Constraint::Length(12)),
        ],
        rows,
        Some(table.selected_index()),
        paged_footer(table, "x refund"),
    );
}

fn draw_users(f: &mut Frame, area: Rect, app: &App) {
    let table = &app.state.users;
    if !table.loaded || table.total() == 0 {
        return empty_or_loading(f, area, " Users ", table.loaded, "No users yet.");
    }
    let rows = table
        .page_items()
        .into_iter()
        .map(|u| {
            vec![
                u.name.clone(),
                u.email.clone(),
                u.phone.clone(),
                u.tickets.to_string(),
                u.status.clone(),
                u.joined.clone(),
            ]
        })
        .collect();
    draw_rows(
        f,
        area,
        titled(" Users "),
        &[
            ("Name", Constraint::Fill(1)),
            ("Email", Constraint::Fill(1)),
            ("Phone", Constraint::Length(14)),
            ("Tickets", Constraint::Length(8)),
            ("Status", Constraint::Length(10)),
            ("Joined", Constraint::Length(12)),
        ],
        rows,
        Some(table.selected_index()),
        paged_footer(table, "d delete"),
    );
}

fn draw_help(f: &mut Frame, area: Rect) {
    draw_placeholder(
        f,
        area,
        "q quit  1-6 pages  7 8 9 0 - admin pages  r refresh  L log out  \" logs  f full screen\n\n\
         tables: j/k move  n/p page  / search\n\
         buy: Enter checkout  ←/→ teams  ↑/↓ quantity  m method  c category\n\
         account: Enter edit  m login/register  a player/admin\n\
         tournaments: Tab focus  n new  e edit  d delete  s score\n\n\
         Esc to go back",
    );
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let widget = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray));
    f.render_widget(widget, area);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        inner,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(3), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
