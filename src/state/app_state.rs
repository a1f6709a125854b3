use crate::app::MenuItem;
use crate::state::messages::NetworkRequest;
use chrono::{DateTime, NaiveDate, Utc};
use tourneyfund_api::purchase::PurchaseFlow;
use tourneyfund_api::scoring::standings;
use tourneyfund_api::services::auth::Registration;
use tourneyfund_api::services::tournaments::{TeamDraft, TournamentDraft};
use tourneyfund_api::{
    LeaderboardEntry, PaymentRow, Score, Team, TeamsPerTicket, TicketRow, Tournament, UserRow,
};

pub const PAGE_SIZE: usize = 10;

// ---------------------------------------------------------------------------
// Stale response guard
// ---------------------------------------------------------------------------

/// Identifies which screen visit and which selection a fetch was made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub screen: MenuItem,
    pub generation: u64,
    pub selection: Option<String>,
}

/// Leaving a screen bumps the generation; anything tagged with an older one
/// (or with a selection the user has since moved away from) is dropped.
#[derive(Debug, Default)]
pub struct RequestGuard {
    generation: u64,
}

impl RequestGuard {
    pub fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn tag(&self, screen: MenuItem, selection: Option<&str>) -> RequestTag {
        RequestTag {
            screen,
            generation: self.generation,
            selection: selection.map(ToOwned::to_owned),
        }
    }

    pub fn is_current(&self, tag: &RequestTag, screen: MenuItem, selection: Option<&str>) -> bool {
        tag.generation == self.generation
            && tag.screen == screen
            && tag.selection.as_deref() == selection
    }
}

// ---------------------------------------------------------------------------
// Filterable, paginated tables
// ---------------------------------------------------------------------------

pub trait Searchable {
    /// `needle` is already lowercased and non-empty.
    fn matches(&self, needle: &str) -> bool;
}

fn any_contains(fields: &[&str], needle: &str) -> bool {
    fields.iter().any(|f| f.to_lowercase().contains(needle))
}

impl Searchable for TicketRow {
    fn matches(&self, needle: &str) -> bool {
        any_contains(
            &[
                self.number.as_str(),
                self.owner.as_str(),
                self.status.as_str(),
                self.tournament.as_str(),
                self.kind.label(),
            ],
            needle,
        ) || self.teams.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

impl Searchable for PaymentRow {
    fn matches(&self, needle: &str) -> bool {
        any_contains(
            &[
                self.transaction_id.as_str(),
                self.user.as_str(),
                self.method.as_str(),
                self.status.as_str(),
            ],
            needle,
        )
    }
}

impl Searchable for UserRow {
    fn matches(&self, needle: &str) -> bool {
        any_contains(
            &[
                self.name.as_str(),
                self.email.as_str(),
                self.phone.as_str(),
                self.status.as_str(),
                self.role.as_str(),
            ],
            needle,
        )
    }
}

#[derive(Debug)]
pub struct Paged<T> {
    items: Vec<T>,
    pub query: String,
    /// The search box has keyboard focus.
    pub searching: bool,
    pub loaded: bool,
    page: usize,
    selected: usize,
}

impl<T> Default for Paged<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            query: String::new(),
            searching: false,
            loaded: false,
            page: 0,
            selected: 0,
        }
    }
}

impl<T: Searchable> Paged<T> {
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.loaded = true;
        self.clamp();
    }

    /// Empty state after a failed fetch.
    pub fn reset(&mut self) {
        self.items.clear();
        self.loaded = true;
        self.page = 0;
        self.selected = 0;
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn filtered(&self) -> Vec<&T> {
        let needle = self.query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|item| needle.is_empty() || item.matches(&needle))
            .collect()
    }

    pub fn page_count(&self) -> usize {
        self.filtered().len().div_ceil(PAGE_SIZE).max(1)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_items(&self) -> Vec<&T> {
        self.filtered()
            .into_iter()
            .skip(self.page * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&T> {
        self.page_items().get(self.selected).copied()
    }

    pub fn next_page(&mut self) {
        if self.page + 1 < self.page_count() {
            self.page += 1;
            self.selected = 0;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 0 {
            self.page -= 1;
            self.selected = 0;
        }
    }

    pub fn select_next(&mut self) {
        let len = self.page_items().len();
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn push_query(&mut self, c: char) {
        self.query.push(c);
        self.page = 0;
        self.selected = 0;
    }

    pub fn pop_query(&mut self) {
        self.query.pop();
        self.page = 0;
        self.selected = 0;
    }

    fn clamp(&mut self) {
        self.page = self.page.min(self.page_count() - 1);
        self.selected = self.selected.min(self.page_items().len().saturating_sub(1));
    }
}

/// Keyboard view of a table, whatever its row type.
pub trait TableNav {
    fn select_next(&mut self);
    fn select_prev(&mut self);
    fn next_page(&mut self);
    fn prev_page(&mut self);
    fn push_query(&mut self, c: char);
    fn pop_query(&mut self);
    fn set_searching(&mut self, searching: bool);
}

impl<T: Searchable> TableNav for Paged<T> {
    fn select_next(&mut self) {
        Paged::select_next(self)
    }

    fn select_prev(&mut self) {
        Paged::select_prev(self)
    }

    fn next_page(&mut self) {
        Paged::next_page(self)
    }

    fn prev_page(&mut self) {
        Paged::prev_page(self)
    }

    fn push_query(&mut self, c: char) {
        Paged::push_query(self, c)
    }

    fn pop_query(&mut self) {
        Paged::pop_query(self)
    }

    fn set_searching(&mut self, searching: bool) {
        self.searching = searching;
    }
}

// ---------------------------------------------------------------------------
// Text forms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub secret: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub focus: usize,
    pub editing: bool,
}

impl Form {
    pub fn new(labels: &[&'static str]) -> Self {
        Self {
            fields: labels
                .iter()
                .map(|label| FormField { label: *label, ..Default::default() })
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_secret(mut self, label: &str) -> Self {
        if let Some(field) = self.fields.iter_mut().find(|f| f.label == label) {
            field.secret = true;
        }
        self
    }

    pub fn with_value(mut self, label: &str, value: impl Into<String>) -> Self {
        self.set(label, value);
        self
    }

    pub fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.trim())
            .unwrap_or_default()
    }

    pub fn set(&mut self, label: &str, value: impl Into<String>) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.label == label) {
            field.value = value.into();
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn prev_field(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "y" | "yes" | "true" | "1")
}

fn flag(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

// ---------------------------------------------------------------------------
// Sign-in / registration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

#[derive(Debug, Clone)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub as_admin: bool,
    pub form: Form,
    pub message: Option<String>,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self {
            mode: AuthMode::Login,
            as_admin: false,
            form: Self::login_fields(),
            message: None,
        }
    }
}

impl AuthForm {
    fn login_fields() -> Form {
        Form::new(&["Email", "Password"]).with_secret("Password")
    }

    fn register_fields() -> Form {
        Form::new(&["Name", "Email", "Phone", "Password"]).with_secret("Password")
    }

    pub fn toggle_mode(&mut self) {
        let email = self.form.value("Email").to_owned();
        let (mode, form) = match self.mode {
            AuthMode::Login => (AuthMode::Register, Self::register_fields()),
            AuthMode::Register => (AuthMode::Login, Self::login_fields()),
        };
        self.mode = mode;
        self.form = form.with_value("Email", email);
        self.message = None;
    }

    pub fn toggle_admin(&mut self) {
        self.as_admin = !self.as_admin;
    }

    /// Validate locally and build the request, or say what is missing.
    pub fn to_request(&self) -> Result<NetworkRequest, String> {
        let email = self.form.value("Email");
        let password = self.form.value("Password");
        if email.is_empty() || !email.contains('@') {
            return Err("Enter a valid email address".into());
        }
        if password.is_empty() {
            return Err("Enter your password".into());
        }
        match self.mode {
            AuthMode::Login => Ok(NetworkRequest::Login {
                email: email.to_owned(),
                password: password.to_owned(),
                as_admin: self.as_admin,
            }),
            AuthMode::Register => {
                let name = self.form.value("Name");
                if name.is_empty() {
                    return Err("Enter your name".into());
                }
                let phone = self.form.value("Phone");
                Ok(NetworkRequest::Register {
                    registration: Registration {
                        name: name.to_owned(),
                        email: email.to_owned(),
                        password: password.to_owned(),
                        phone: (!phone.is_empty()).then(|| phone.to_owned()),
                    },
                    as_admin: self.as_admin,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Admin editors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorKind {
    Tournament { id: Option<String> },
    Team { id: Option<String> },
    Score { team_id: String },
}

#[derive(Debug, Clone)]
pub struct Editor {
    pub kind: EditorKind,
    pub form: Form,
}

impl Editor {
    pub fn tournament(existing: Option<&Tournament>) -> Self {
        let draft = existing.map(TournamentDraft::from).unwrap_or_else(|| TournamentDraft {
            rounds: 1,
            is_active: true,
            ..Default::default()
        });
        let form = Form::new(&["Name", "Rounds", "Teams per ticket", "Announcement (YYYY-MM-DD)", "Active"])
            .with_value("Name", draft.name)
            .with_value("Rounds", draft.rounds.to_string())
            .with_value("Teams per ticket", draft.teams_per_ticket.to_string())
            .with_value(
                "Announcement (YYYY-MM-DD)",
                draft
                    .announcement_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            )
            .with_value("Active", flag(draft.is_active));
        Self {
            kind: EditorKind::Tournament { id: existing.map(|t| t.id.clone()) },
            form: Form { editing: true, ..form },
        }
    }

    pub fn team(existing: Option<&Team>) -> Self {
        let form = Form::new(&["Seed", "Name", "Conference"])
            .with_value("Seed", existing.map(|t| t.seed_number.clone()).unwrap_or_default())
            .with_value("Name", existing.and_then(|t| t.team_name.clone()).unwrap_or_default())
            .with_value("Conference", existing.map(|t| t.conference.clone()).unwrap_or_default());
        Self {
            kind: EditorKind::Team { id: existing.map(|t| t.id.clone()) },
            form: Form { editing: true, ..form },
        }
    }

    pub fn score(team: &Team, latest: Option<&Score>) -> Self {
        let next_round = latest.map(|s| s.round_number).unwrap_or(1);
        let form = Form::new(&["Round", "Points", "Eliminated"])
            .with_value("Round", next_round.to_string())
            .with_value("Points", latest.map(|s| s.points).unwrap_or_default().to_string())
            .with_value("Eliminated", flag(latest.is_some_and(|s| s.eliminated)));
        Self {
            kind: EditorKind::Score { team_id: team.id.clone() },
            form: Form { editing: true, ..form },
        }
    }

    pub fn title(&self) -> &'static str {
        match &self.kind {
            EditorKind::Tournament { id: None } => "New tournament",
            EditorKind::Tournament { .. } => "Edit tournament",
            EditorKind::Team { id: None } => "New team",
            EditorKind::Team { .. } => "Edit team",
            EditorKind::Score { .. } => "Record score",
        }
    }

    pub fn tournament_draft(&self) -> Result<TournamentDraft, String> {
        let rounds = self
            .form
            .value("Rounds")
            .parse::<u32>()
            .map_err(|_| "Rounds must be a whole number".to_string())?;
        let teams_per_ticket = self
            .form
            .value("Teams per ticket")
            .parse::<u8>()
            .ok()
            .and_then(TeamsPerTicket::new)
            .ok_or_else(|| "Teams per ticket must be between 3 and 6".to_string())?;
        let announcement_date = parse_date(self.form.value("Announcement (YYYY-MM-DD)"))?;
        let draft = TournamentDraft {
            name: self.form.value("Name").to_owned(),
            rounds,
            teams_per_ticket,
            announcement_date,
            is_active: parse_flag(self.form.value("Active")),
        };
        draft.validate().map_err(|e| e.message())?;
        Ok(draft)
    }

    pub fn team_draft(&self, existing: &[Team]) -> Result<TeamDraft, String> {
        let name = self.form.value("Name");
        let draft = TeamDraft {
            seed_number: self.form.value("Seed").to_owned(),
            team_name: (!name.is_empty()).then(|| name.to_owned()),
            conference: self.form.value("Conference").to_owned(),
        };
        let editing = match &self.kind {
            EditorKind::Team { id } => id.as_deref(),
            _ => None,
        };
        draft.validate(existing, editing).map_err(|e| e.message())?;
        Ok(draft)
    }

    pub fn score_entry(&self, tournament_id: &str) -> Result<Score, String> {
        let EditorKind::Score { team_id } = &self.kind else {
            return Err("Not a score editor".into());
        };
        let round_number = self
            .form
            .value("Round")
            .parse::<u32>()
            .ok()
            .filter(|r| *r > 0)
            .ok_or_else(|| "Round must be 1 or higher".to_string())?;
        let points = self
            .form
            .value("Points")
            .parse::<u32>()
            .map_err(|_| "Points must be a whole number of 0 or more".to_string())?;
        Ok(Score {
            tournament_id: tournament_id.to_owned(),
            team_id: team_id.clone(),
            round_number,
            points,
            eliminated: parse_flag(self.form.value("Eliminated")),
        })
    }
}

fn parse_date(value: &str) -> Result<Option<DateTime<Utc>>, String> {
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Some(dt.and_utc()))
        .ok_or_else(|| format!("Could not read date {value:?}; use YYYY-MM-DD"))
}

// ---------------------------------------------------------------------------
// Per-screen state
// ---------------------------------------------------------------------------

/// Tournaments shown on the public pages and used to scope purchases.
#[derive(Debug, Default)]
pub struct CatalogState {
    pub tournaments: Vec<Tournament>,
    pub loaded: bool,
}

impl CatalogState {
    /// The tournament currently selling tickets.
    pub fn active_tournament(&self) -> Option<&Tournament> {
        self.tournaments
            .iter()
            .find(|t| t.is_active)
            .or_else(|| self.tournaments.first())
    }
}

#[derive(Debug, Default)]
pub struct LeaderboardState {
    pub tournaments: Vec<Tournament>,
    pub selected: usize,
    pub entries: Vec<LeaderboardEntry>,
    pub loaded: bool,
}

impl LeaderboardState {
    pub fn set_tournaments(&mut self, tournaments: Vec<Tournament>) {
        self.selected = tournaments.iter().position(|t| t.is_active).unwrap_or(0);
        self.tournaments = tournaments;
        self.entries.clear();
        self.loaded = false;
    }

    pub fn selected_tournament(&self) -> Option<&Tournament> {
        self.tournaments.get(self.selected)
    }

    pub fn cycle(&mut self, forward: bool) {
        let len = self.tournaments.len();
        if len == 0 {
            return;
        }
        self.selected = if forward { (self.selected + 1) % len } else { (self.selected + len - 1) % len };
        self.entries.clear();
        self.loaded = false;
    }
}

#[derive(Debug, Default)]
pub struct DashboardState {
    pub players: Vec<UserRow>,
    pub tournaments: Vec<Tournament>,
    pub tickets: Vec<TicketRow>,
    pub loaded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdminFocus {
    #[default]
    Tournaments,
    Teams,
}

#[derive(Debug, Default)]
pub struct TournamentAdminState {
    pub tournaments: Vec<Tournament>,
    pub selected: usize,
    pub teams: Vec<Team>,
    pub scores: Vec<Score>,
    pub selected_team: usize,
    pub focus: AdminFocus,
    pub editor: Option<Editor>,
    pub loaded: bool,
}

impl TournamentAdminState {
    pub fn set_tournaments(&mut self, tournaments: Vec<Tournament>) {
        self.tournaments = tournaments;
        self.selected = self.selected.min(self.tournaments.len().saturating_sub(1));
        self.loaded = true;
        self.clear_detail();
    }

    pub fn selected_tournament(&self) -> Option<&Tournament> {
        self.tournaments.get(self.selected)
    }

    pub fn selected_team(&self) -> Option<&Team> {
        self.teams.get(self.selected_team)
    }

    pub fn clear_detail(&mut self) {
        self.teams.clear();
        self.scores.clear();
        self.selected_team = 0;
    }

    /// Move the cursor in the focused list. Returns true when the selected
    /// tournament changed, which invalidates the team/score detail.
    pub fn move_cursor(&mut self, down: bool) -> bool {
        let (cursor, len) = match self.focus {
            AdminFocus::Tournaments => (&mut self.selected, self.tournaments.len()),
            AdminFocus::Teams => (&mut self.selected_team, self.teams.len()),
        };
        let before = *cursor;
        *cursor = if down { (*cursor + 1).min(len.saturating_sub(1)) } else { cursor.saturating_sub(1) };
        let changed = *cursor != before && self.focus == AdminFocus::Tournaments;
        if changed {
            self.clear_detail();
        }
        changed
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            AdminFocus::Tournaments => AdminFocus::Teams,
            AdminFocus::Teams => AdminFocus::Tournaments,
        };
    }

    /// Keep the team list in standings order so the cursor follows the table.
    pub fn sort_teams(&mut self) {
        let selected = self.selected_team().map(|t| t.id.clone());
        let order: Vec<String> =
            standings(&self.teams, &self.scores).into_iter().map(|s| s.team_id).collect();
        self.teams.sort_by_key(|t| order.iter().position(|id| *id == t.id));
        if let Some(id) = selected {
            self.selected_team = self.teams.iter().position(|t| t.id == id).unwrap_or(0);
        }
    }

    /// Most recent round recorded for a team.
    pub fn latest_score(&self, team_id: &str) -> Option<&Score> {
        self.scores
            .iter()
            .filter(|s| s.team_id == team_id)
            .max_by_key(|s| s.round_number)
    }
}

#[derive(Debug, Default)]
pub struct TicketAdminState {
    pub table: Paged<TicketRow>,
    /// Tournament id the listing is scoped to.
    pub tournament_filter: Option<String>,
}

impl TicketAdminState {
    /// Step through "all tournaments" and each known tournament.
    pub fn cycle_filter(&mut self, tournaments: &[Tournament]) {
        let current = self
            .tournament_filter
            .as_deref()
            .and_then(|id| tournaments.iter().position(|t| t.id == id));
        self.tournament_filter = match current {
            None => tournaments.first().map(|t| t.id.clone()),
            Some(i) => tournaments.get(i + 1).map(|t| t.id.clone()),
        };
    }
}

// ---------------------------------------------------------------------------
// Banner and confirmations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: BannerKind::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: BannerKind::Error, message: message.into() }
    }
}

/// Destructive actions wait for a `y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    DeleteTournament { id: String, name: String },
    DeleteTeam { id: String, label: String },
    DeleteTicket { id: String, number: String },
    RefundPayment { id: String, transaction_id: String },
    DeleteUser { id: String, name: String },
}

impl PendingAction {
    pub fn prompt(&self) -> String {
        match self {
            PendingAction::DeleteTournament { name, .. } => format!("Delete tournament {name}?"),
            PendingAction::DeleteTeam { label, .. } => format!("Delete team {label}?"),
            PendingAction::DeleteTicket { number, .. } => format!("Delete ticket {number}?"),
            PendingAction::RefundPayment { transaction_id, .. } => {
                format!("Refund payment {transaction_id}?")
            }
            PendingAction::DeleteUser { name, .. } => format!("Delete user {name}?"),
        }
    }

    pub fn into_request(self) -> NetworkRequest {
        match self {
            PendingAction::DeleteTournament { id, .. } => NetworkRequest::DeleteTournament { id },
            PendingAction::DeleteTeam { id, .. } => NetworkRequest::DeleteTeam { id },
            PendingAction::DeleteTicket { id, .. } => NetworkRequest::DeleteTicket { id },
            PendingAction::RefundPayment { id, .. } => NetworkRequest::RefundPayment { id },
            PendingAction::DeleteUser { id, .. } => NetworkRequest::DeleteUser { id },
        }
    }
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub banner: Option<Banner>,
    pub confirm: Option<PendingAction>,
    pub guard: RequestGuard,
    pub catalog: CatalogState,
    pub purchase: PurchaseFlow,
    pub my_tickets: Paged<TicketRow>,
    pub leaderboard: LeaderboardState,
    pub auth: AuthForm,
    pub dashboard: DashboardState,
    pub tournaments: TournamentAdminState,
    pub tickets: TicketAdminState,
    pub payments: Paged<PaymentRow>,
    pub users: Paged<UserRow>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The searchable table on the current screen, if it has one.
    pub fn active_table(&mut self) -> Option<&mut dyn TableNav> {
        match self.active_tab {
            MenuItem::MyTickets => Some(&mut self.my_tickets),
            MenuItem::Tickets => Some(&mut self.tickets.table),
            MenuItem::Payments => Some(&mut self.payments),
            MenuItem::Users => Some(&mut self.users),
            _ => None,
        }
    }

    /// True while keystrokes belong to a text field rather than shortcuts.
    pub fn input_captured(&self) -> bool {
        match self.active_tab {
            MenuItem::Account => self.auth.form.editing,
            MenuItem::Tournaments => self.tournaments.editor.as_ref().is_some_and(|e| e.form.editing),
            MenuItem::MyTickets => self.my_tickets.searching,
            MenuItem::Tickets => self.tickets.table.searching,
            MenuItem::Payments => self.payments.searching,
            MenuItem::Users => self.users.searching,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(number: &str, owner: &str) -> TicketRow {
        TicketRow { number: number.into(), owner: owner.into(), ..Default::default() }
    }

    #[test]
    fn guard_drops_results_from_a_previous_visit() {
        let mut guard = RequestGuard::default();
        let tag = guard.tag(MenuItem::Leaderboard, Some("t1"));
        assert!(guard.is_current(&tag, MenuItem::Leaderboard, Some("t1")));

        guard.bump();
        assert!(!guard.is_current(&tag, MenuItem::Leaderboard, Some("t1")));
    }

    #[test]
    fn guard_drops_results_for_another_selection() {
        let guard = RequestGuard::default();
        let tag = guard.tag(MenuItem::Tournaments, Some("t1"));
        assert!(!guard.is_current(&tag, MenuItem::Tournaments, Some("t2")));
        assert!(!guard.is_current(&tag, MenuItem::Leaderboard, Some("t1")));
    }

    #[test]
    fn paging_walks_filtered_rows() {
        let mut table = Paged::default();
        table.set_items((0..25).map(|i| ticket(&format!("T-{i}"), "ann")).collect());
        assert_eq!(table.page_count(), 3);
        assert_eq!(table.page_items().len(), PAGE_SIZE);

        table.next_page();
        table.next_page();
        table.next_page();
        assert_eq!(table.page(), 2);
        assert_eq!(table.page_items().len(), 5);

        table.select_next();
        table.select_next();
        assert_eq!(table.selected().map(|t| t.number.as_str()), Some("T-22"));

        table.prev_page();
        assert_eq!(table.page(), 1);
        assert_eq!(table.selected_index(), 0);
    }

    #[test]
    fn search_resets_to_first_page() {
        let mut table = Paged::default();
        let mut rows: Vec<TicketRow> = (0..15).map(|i| ticket(&format!("T-{i}"), "ann")).collect();
        rows.push(ticket("T-99", "Bob"));
        table.set_items(rows);
        table.next_page();

        for c in "bob".chars() {
            table.push_query(c);
        }
        assert_eq!(table.page(), 0);
        assert_eq!(table.filtered().len(), 1);
        assert_eq!(table.page_count(), 1);
        assert_eq!(table.total(), 16);
    }

    #[test]
    fn shrinking_list_clamps_cursor() {
        let mut table = Paged::default();
        table.set_items((0..25).map(|i| ticket(&format!("T-{i}"), "ann")).collect());
        table.next_page();
        table.next_page();
        table.set_items(vec![ticket("T-1", "ann")]);
        assert_eq!(table.page(), 0);
        assert!(table.selected().is_some());

        table.reset();
        assert!(table.selected().is_none());
        assert_eq!(table.page_count(), 1);
    }

    #[test]
    fn login_form_validates_before_sending() {
        let mut auth = AuthForm::default();
        assert!(auth.to_request().is_err());
        auth.form.set("Email", "a@x.io");
        assert!(auth.to_request().is_err());
        auth.form.set("Password", "pw");
        auth.toggle_admin();
        match auth.to_request() {
            Ok(NetworkRequest::Login { email, as_admin, .. }) => {
                assert_eq!(email, "a@x.io");
                assert!(as_admin);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn register_mode_keeps_email_and_needs_name() {
        let mut auth = AuthForm::default();
        auth.form.set("Email", "p@x.io");
        auth.toggle_mode();
        assert_eq!(auth.mode, AuthMode::Register);
        assert_eq!(auth.form.value("Email"), "p@x.io");

        auth.form.set("Password", "pw");
        assert!(auth.to_request().is_err());
        auth.form.set("Name", "Pat");
        match auth.to_request() {
            Ok(NetworkRequest::Register { registration, .. }) => {
                assert_eq!(registration.name, "Pat");
                assert_eq!(registration.phone, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn form_focus_wraps() {
        let mut form = Form::new(&["A", "B"]);
        form.prev_field();
        assert_eq!(form.focus, 1);
        form.push_char('x');
        form.next_field();
        form.push_char('y');
        form.pop_char();
        assert_eq!(form.value("B"), "x");
        assert_eq!(form.value("A"), "");
    }

    #[test]
    fn tournament_editor_builds_draft() {
        let mut editor = Editor::tournament(None);
        editor.form.set("Name", "Spring Fund");
        editor.form.set("Rounds", "6");
        editor.form.set("Teams per ticket", "4");
        editor.form.set("Announcement (YYYY-MM-DD)", "2026-03-15");
        let draft = editor.tournament_draft().unwrap();
        assert_eq!(draft.rounds, 6);
        assert_eq!(draft.teams_per_ticket.get(), 4);
        assert!(draft.is_active);
        assert_eq!(
            draft.announcement_date.map(|d| d.format("%Y-%m-%d").to_string()).as_deref(),
            Some("2026-03-15")
        );

        editor.form.set("Teams per ticket", "9");
        assert!(editor.tournament_draft().is_err());
        editor.form.set("Teams per ticket", "4");
        editor.form.set("Announcement (YYYY-MM-DD)", "next week");
        assert!(editor.tournament_draft().is_err());
    }

    #[test]
    fn team_editor_rejects_duplicate_seed() {
        let existing = vec![Team { id: "a".into(), seed_number: "1".into(), ..Default::default() }];
        let mut editor = Editor::team(None);
        editor.form.set("Seed", "1");
        assert!(editor.team_draft(&existing).is_err());

        let mut editing = Editor::team(existing.first());
        editing.form.set("Name", "Owls");
        let draft = editing.team_draft(&existing).unwrap();
        assert_eq!(draft.team_name.as_deref(), Some("Owls"));
    }

    #[test]
    fn score_editor_reads_round_points_and_elimination() {
        let team = Team { id: "a".into(), seed_number: "1".into(), ..Default::default() };
        let mut editor = Editor::score(&team, None);
        editor.form.set("Points", "12");
        editor.form.set("Eliminated", "y");
        let score = editor.score_entry("t1").unwrap();
        assert_eq!(score.round_number, 1);
        assert_eq!(score.points, 12);
        assert!(score.eliminated);

        editor.form.set("Round", "0");
        assert!(editor.score_entry("t1").is_err());
    }

    #[test]
    fn catalog_prefers_active_tournament() {
        let catalog = CatalogState {
            tournaments: vec![
                Tournament { id: "old".into(), ..Default::default() },
                Tournament { id: "live".into(), is_active: true, ..Default::default() },
            ],
            loaded: true,
        };
        assert_eq!(catalog.active_tournament().map(|t| t.id.as_str()), Some("live"));
    }

    #[test]
    fn moving_tournament_cursor_clears_detail() {
        let mut admin = TournamentAdminState::default();
        admin.set_tournaments(vec![
            Tournament { id: "a".into(), ..Default::default() },
            Tournament { id: "b".into(), ..Default::default() },
        ]);
        admin.teams.push(Team::default());
        assert!(admin.move_cursor(true));
        assert!(admin.teams.is_empty());
        assert!(!admin.move_cursor(true));
    }

    #[test]
    fn ticket_filter_cycles_through_tournaments_and_back_to_all() {
        let tournaments = vec![
            Tournament { id: "a".into(), ..Default::default() },
            Tournament { id: "b".into(), ..Default::default() },
        ];
        let mut tickets = TicketAdminState::default();
        tickets.cycle_filter(&tournaments);
        assert_eq!(tickets.tournament_filter.as_deref(), Some("a"));
        tickets.cycle_filter(&tournaments);
        assert_eq!(tickets.tournament_filter.as_deref(), Some("b"));
        tickets.cycle_filter(&tournaments);
        assert_eq!(tickets.tournament_filter, None);
    }

    #[test]
    fn pending_action_maps_to_request() {
        let action = PendingAction::RefundPayment { id: "p1".into(), transaction_id: "TXN-1".into() };
        assert_eq!(action.prompt(), "Refund payment TXN-1?");
        assert!(matches!(action.into_request(), NetworkRequest::RefundPayment { id } if id == "p1"));
    }
}
