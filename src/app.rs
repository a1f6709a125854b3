use crate::state::app_settings::AppSettings;
use crate::state::app_state::{AdminFocus, AppState, Banner, Editor, EditorKind, PendingAction, RequestTag};
use crate::state::messages::NetworkRequest;
use log::{debug, info};
use tourneyfund_api::client::{ApiError, ApiResult};
use tourneyfund_api::envelope::AuthPayload;
use tourneyfund_api::purchase::{PurchaseContext, PurchaseError, PurchaseFlow, PurchaseOutcome};
use tourneyfund_api::scoring::upsert_score;
use tourneyfund_api::session::Session;
use tourneyfund_api::{
    LeaderboardEntry, PaymentRow, Score, Team, TicketRow, Tournament, UserRow,
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MenuItem {
    #[default]
    Home,
    HowItWorks,
    BuyTickets,
    MyTickets,
    Leaderboard,
    Account,
    Dashboard,
    Tournaments,
    Tickets,
    Payments,
    Users,
    Help,
}

impl MenuItem {
    pub const PLAYER_TABS: [MenuItem; 6] = [
        MenuItem::Home,
        MenuItem::HowItWorks,
        MenuItem::BuyTickets,
        MenuItem::MyTickets,
        MenuItem::Leaderboard,
        MenuItem::Account,
    ];
    pub const ADMIN_TABS: [MenuItem; 5] = [
        MenuItem::Dashboard,
        MenuItem::Tournaments,
        MenuItem::Tickets,
        MenuItem::Payments,
        MenuItem::Users,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            MenuItem::Home => "Home",
            MenuItem::HowItWorks => "How It Works",
            MenuItem::BuyTickets => "Buy Tickets",
            MenuItem::MyTickets => "My Tickets",
            MenuItem::Leaderboard => "Leaderboard",
            MenuItem::Account => "Account",
            MenuItem::Dashboard => "Dashboard",
            MenuItem::Tournaments => "Tournaments",
            MenuItem::Tickets => "Tickets",
            MenuItem::Payments => "Payments",
            MenuItem::Users => "Users",
            MenuItem::Help => "Help",
        }
    }

    pub fn is_admin_only(&self) -> bool {
        Self::ADMIN_TABS.contains(self)
    }

    /// Name stored in the session file for the remembered admin tab.
    pub fn key(&self) -> &'static str {
        match self {
            MenuItem::Dashboard => "dashboard",
            MenuItem::Tournaments => "tournaments",
            MenuItem::Tickets => "tickets",
            MenuItem::Payments => "payments",
            MenuItem::Users => "users",
            _ => "home",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ADMIN_TABS.into_iter().find(|tab| tab.key() == key)
    }
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    pub session: Session,
}

impl App {
    /// `session` must already be hydrated.
    pub fn new(settings: AppSettings, session: Session) -> Self {
        let mut app = Self { state: AppState::new(), settings, session };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app.state.active_tab = app.initial_tab();
        app
    }

    fn initial_tab(&self) -> MenuItem {
        if !self.session.is_admin() {
            return MenuItem::Home;
        }
        self.session
            .remembered_tab()
            .and_then(|key| MenuItem::from_key(&key))
            .unwrap_or(MenuItem::Dashboard)
    }

    pub fn is_admin(&self) -> bool {
        self.session.is_admin()
    }

    pub fn visible_tabs(&self) -> Vec<MenuItem> {
        let mut tabs = MenuItem::PLAYER_TABS.to_vec();
        if self.is_admin() {
            tabs.extend(MenuItem::ADMIN_TABS);
        }
        tabs
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    /// Switch tabs and return the fetches the new screen needs.
    pub fn update_tab(&mut self, next: MenuItem) -> Vec<NetworkRequest> {
        if next.is_admin_only() && !self.is_admin() {
            self.require_sign_in("Admin access required. Sign in with an admin account.", true);
            return Vec::new();
        }
        if next == MenuItem::MyTickets && !self.session.is_authenticated() {
            self.require_sign_in("Sign in to see your tickets.", false);
            return Vec::new();
        }
        if self.state.active_tab == next {
            return Vec::new();
        }

        self.state.guard.bump();
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
        self.state.confirm = None;
        self.state.purchase.close();
        if next.is_admin_only() {
            self.session.remember_tab(next.key());
        }
        self.enter_requests()
    }

    fn require_sign_in(&mut self, message: &str, as_admin: bool) {
        self.state.banner = Some(Banner::error(message));
        self.state.auth.as_admin = as_admin;
        if self.state.active_tab != MenuItem::Account {
            self.state.guard.bump();
            self.state.previous_tab = self.state.active_tab;
            self.state.active_tab = MenuItem::Account;
        }
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn dismiss_banner(&mut self) {
        self.state.banner = None;
    }

    fn tag(&self, selection: Option<&str>) -> RequestTag {
        self.state.guard.tag(self.state.active_tab, selection)
    }

    fn accepts(&self, tag: &RequestTag, selection: Option<&str>) -> bool {
        self.state.guard.is_current(tag, self.state.active_tab, selection)
    }

    /// The tournament a screen is currently showing, if it tracks one.
    fn current_selection(&self, screen: MenuItem) -> Option<String> {
        match screen {
            MenuItem::Leaderboard => self.state.leaderboard.selected_tournament().map(|t| t.id.clone()),
            MenuItem::Tournaments => self.state.tournaments.selected_tournament().map(|t| t.id.clone()),
            _ => None,
        }
    }

    /// Fetches for the current screen. Every visit re-fetches.
    pub fn enter_requests(&mut self) -> Vec<NetworkRequest> {
        let tag = self.tag(None);
        match self.state.active_tab {
            MenuItem::Home | MenuItem::HowItWorks | MenuItem::BuyTickets => {
                vec![NetworkRequest::LoadTournaments { tag }]
            }
            MenuItem::MyTickets => match self.session.identity() {
                Some(identity) => {
                    self.state.my_tickets.loaded = false;
                    vec![NetworkRequest::LoadMyTickets { tag, player_id: identity.id.clone() }]
                }
                None => Vec::new(),
            },
            MenuItem::Leaderboard => {
                self.state.leaderboard.loaded = false;
                vec![NetworkRequest::LoadTournaments { tag }]
            }
            MenuItem::Dashboard => {
                self.state.dashboard.loaded = false;
                vec![NetworkRequest::LoadDashboard { tag }]
            }
            MenuItem::Tournaments => {
                self.state.tournaments.loaded = false;
                self.state.tournaments.editor = None;
                vec![NetworkRequest::LoadTournaments { tag }]
            }
            MenuItem::Tickets => {
                self.state.tickets.table.loaded = false;
                vec![
                    NetworkRequest::LoadTournaments { tag: tag.clone() },
                    NetworkRequest::LoadTickets {
                        tag,
                        tournament_id: self.state.tickets.tournament_filter.clone(),
                    },
                ]
            }
            MenuItem::Payments => {
                self.state.payments.loaded = false;
                vec![NetworkRequest::LoadPayments { tag }]
            }
            MenuItem::Users => {
                self.state.users.loaded = false;
                vec![NetworkRequest::LoadUsers { tag }]
            }
            MenuItem::Account | MenuItem::Help => Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_tournaments_loaded(&mut self, tag: RequestTag, tournaments: Vec<Tournament>) -> Vec<NetworkRequest> {
        self.state.catalog.tournaments = tournaments.clone();
        self.state.catalog.loaded = true;

        if !self.accepts(&tag, None) {
            return Vec::new();
        }
        match tag.screen {
            MenuItem::Leaderboard => {
                self.state.leaderboard.set_tournaments(tournaments);
                self.leaderboard_request().into_iter().collect()
            }
            MenuItem::Tournaments => {
                self.state.tournaments.set_tournaments(tournaments);
                self.tournament_detail_request().into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn leaderboard_request(&self) -> Option<NetworkRequest> {
        let tournament_id = self.state.leaderboard.selected_tournament()?.id.clone();
        let tag = self.tag(Some(&tournament_id));
        Some(NetworkRequest::LoadLeaderboard { tag, tournament_id })
    }

    pub fn on_leaderboard_loaded(&mut self, tag: RequestTag, entries: Vec<LeaderboardEntry>) {
        let selected = self.current_selection(MenuItem::Leaderboard);
        if !self.accepts(&tag, selected.as_deref()) {
            debug!("dropping stale leaderboard for {:?}", tag.selection);
            return;
        }
        self.state.leaderboard.entries = entries;
        self.state.leaderboard.loaded = true;
    }

    pub fn tournament_detail_request(&self) -> Option<NetworkRequest> {
        let tournament_id = self.state.tournaments.selected_tournament()?.id.clone();
        let tag = self.tag(Some(&tournament_id));
        Some(NetworkRequest::LoadTournamentDetail { tag, tournament_id })
    }

    pub fn on_tournament_detail_loaded(&mut self, tag: RequestTag, teams: Vec<Team>, scores: Vec<Score>) {
        let selected = self.current_selection(MenuItem::Tournaments);
        if !self.accepts(&tag, selected.as_deref()) {
            debug!("dropping stale team list for {:?}", tag.selection);
            return;
        }
        let admin = &mut self.state.tournaments;
        admin.teams = teams;
        admin.scores = scores;
        admin.selected_team = admin.selected_team.min(admin.teams.len().saturating_sub(1));
        admin.sort_teams();
    }

    pub fn on_tickets_loaded(&mut self, tag: RequestTag, tickets: Vec<TicketRow>) {
        if !self.accepts(&tag, None) {
            return;
        }
        match tag.screen {
            MenuItem::MyTickets => self.state.my_tickets.set_items(tickets),
            MenuItem::Tickets => self.state.tickets.table.set_items(tickets),
            _ => {}
        }
    }

    pub fn on_dashboard_loaded(
        &mut self,
        tag: RequestTag,
        players: Vec<UserRow>,
        tournaments: Vec<Tournament>,
        tickets: Vec<TicketRow>,
    ) {
        if !self.accepts(&tag, None) {
            return;
        }
        let dashboard = &mut self.state.dashboard;
        dashboard.players = players;
        dashboard.tournaments = tournaments;
        dashboard.tickets = tickets;
        dashboard.loaded = true;
    }

    pub fn on_payments_loaded(&mut self, tag: RequestTag, payments: Vec<PaymentRow>) {
        if self.accepts(&tag, None) {
            self.state.payments.set_items(payments);
        }
    }

    pub fn on_users_loaded(&mut self, tag: RequestTag, users: Vec<UserRow>) {
        if self.accepts(&tag, None) {
            self.state.users.set_items(users);
        }
    }

    /// A failed request. Unauthorized sends the user to sign in; anything
    /// else becomes a banner and an empty screen.
    pub fn on_error(&mut self, tag: Option<RequestTag>, error: ApiError) {
        if let ApiError::Unauthorized { .. } = error {
            info!("session rejected by the server, signing out");
            self.session.on_unauthorized();
            self.state.purchase = PurchaseFlow::Idle;
            self.require_sign_in(&error.message(), self.state.auth.as_admin);
            return;
        }

        if let Some(tag) = tag.as_ref() {
            let selected = tag.selection.as_ref().and_then(|_| self.current_selection(tag.screen));
            if !self.accepts(tag, selected.as_deref()) {
                debug!("dropping stale error: {error}");
                return;
            }
            self.show_empty_state(tag.screen);
        } else if let Some(editor) = self.state.tournaments.editor.as_mut() {
            editor.form.editing = true;
        }
        self.state.banner = Some(Banner::error(error.message()));
    }

    fn show_empty_state(&mut self, screen: MenuItem) {
        match screen {
            MenuItem::MyTickets => self.state.my_tickets.reset(),
            MenuItem::Tickets => self.state.tickets.table.reset(),
            MenuItem::Payments => self.state.payments.reset(),
            MenuItem::Users => self.state.users.reset(),
            MenuItem::Leaderboard => {
                self.state.leaderboard.entries.clear();
                self.state.leaderboard.loaded = true;
            }
            MenuItem::Dashboard => self.state.dashboard.loaded = true,
            MenuItem::Tournaments => self.state.tournaments.loaded = true,
            _ => self.state.catalog.loaded = true,
        }
    }

    // -----------------------------------------------------------------------
    // Account
    // -----------------------------------------------------------------------

    /// Validate the sign-in form and hand back the request to send.
    pub fn submit_auth(&mut self) -> Option<NetworkRequest> {
        match self.state.auth.to_request() {
            Ok(request) => {
                self.session.begin_authenticating();
                self.state.auth.form.editing = false;
                self.state.auth.message = None;
                Some(request)
            }
            Err(message) => {
                self.state.auth.message = Some(message);
                None
            }
        }
    }

    pub fn on_sign_in_finished(
        &mut self,
        result: ApiResult<AuthPayload>,
        as_admin: bool,
        registering: bool,
    ) -> Vec<NetworkRequest> {
        let identity = match self.session.finish_sign_in(result, as_admin, registering) {
            Ok(identity) => identity,
            Err(message) => {
                self.state.auth.message = Some(message);
                return Vec::new();
            }
        };
        let name = if identity.name.is_empty() { identity.email.clone() } else { identity.name.clone() };
        self.state.auth = Default::default();
        self.state.banner = Some(Banner::info(format!("Welcome, {name}")));
        let landing = if self.is_admin() { MenuItem::Dashboard } else { MenuItem::MyTickets };
        self.update_tab(landing)
    }

    pub fn logout(&mut self) -> Vec<NetworkRequest> {
        self.session.logout();
        self.state.purchase = PurchaseFlow::Idle;
        self.state.my_tickets = Default::default();
        self.state.banner = Some(Banner::info("Signed out"));
        self.update_tab(MenuItem::Home)
    }

    // -----------------------------------------------------------------------
    // Purchase
    // -----------------------------------------------------------------------

    pub fn open_purchase(&mut self) {
        if !self.session.is_authenticated() {
            self.require_sign_in("Sign in to buy tickets.", false);
            return;
        }
        if self.state.catalog.active_tournament().is_none() {
            self.state.banner = Some(Banner::error("No tournament is selling tickets right now."));
            return;
        }
        self.state.purchase = PurchaseFlow::open();
    }

    pub fn submit_purchase(&mut self) -> Option<NetworkRequest> {
        let player_id = self.session.identity()?.id.clone();
        let tournament_id = self.state.catalog.active_tournament()?.id.clone();
        match self.state.purchase.begin_submit() {
            Ok(order) => Some(NetworkRequest::SubmitPurchase {
                order,
                context: PurchaseContext { player_id, tournament_id },
            }),
            Err(e) => {
                debug!("purchase not submitted: {e}");
                None
            }
        }
    }

    pub fn on_purchase_finished(&mut self, result: Result<PurchaseOutcome, PurchaseError>) {
        let result = match result {
            Err(PurchaseError::Api(error @ ApiError::Unauthorized { .. })) => {
                return self.on_error(None, error);
            }
            other => other,
        };
        match &result {
            Ok(PurchaseOutcome::Redirect { url }) => info!("checkout redirect to {url}"),
            Ok(PurchaseOutcome::Completed { tickets }) => {
                self.state.banner = Some(Banner::info(format!("{} ticket(s) created", tickets.len().max(1))));
                self.state.my_tickets.loaded = false;
            }
            Err(e) => info!("purchase failed: {e}"),
        }
        self.state.purchase.finish(result);
    }

    // -----------------------------------------------------------------------
    // Admin actions
    // -----------------------------------------------------------------------

    pub fn cycle_leaderboard(&mut self, forward: bool) -> Option<NetworkRequest> {
        self.state.leaderboard.cycle(forward);
        self.leaderboard_request()
    }

    pub fn move_tournament_cursor(&mut self, down: bool) -> Option<NetworkRequest> {
        if self.state.tournaments.move_cursor(down) {
            return self.tournament_detail_request();
        }
        None
    }

    pub fn open_editor(&mut self, new: bool) {
        let admin = &mut self.state.tournaments;
        admin.editor = match (admin.focus, new) {
            (AdminFocus::Tournaments, true) => Some(Editor::tournament(None)),
            (AdminFocus::Tournaments, false) => admin.selected_tournament().map(|t| Editor::tournament(Some(t))),
            (AdminFocus::Teams, _) if admin.selected_tournament().is_none() => None,
            (AdminFocus::Teams, true) => Some(Editor::team(None)),
            (AdminFocus::Teams, false) => admin.selected_team().map(|t| Editor::team(Some(t))),
        };
    }

    pub fn open_score_editor(&mut self) {
        let admin = &mut self.state.tournaments;
        if admin.focus != AdminFocus::Teams {
            return;
        }
        admin.editor = admin
            .selected_team()
            .map(|team| Editor::score(team, admin.latest_score(&team.id)));
    }

    pub fn save_editor(&mut self) -> Option<NetworkRequest> {
        let admin = &mut self.state.tournaments;
        let editor = admin.editor.as_mut()?;
        let tournament_id = admin.tournaments.get(admin.selected).map(|t| t.id.clone());

        let request = match &editor.kind {
            EditorKind::Tournament { id } => editor
                .tournament_draft()
                .map(|draft| NetworkRequest::SaveTournament { id: id.clone(), draft }),
            EditorKind::Team { id } => match tournament_id {
                Some(tournament_id) => editor
                    .team_draft(&admin.teams)
                    .map(|draft| NetworkRequest::SaveTeam { tournament_id, id: id.clone(), draft }),
                None => Err("Select a tournament first".into()),
            },
            EditorKind::Score { .. } => match tournament_id {
                Some(tournament_id) => editor
                    .score_entry(&tournament_id)
                    .map(|score| NetworkRequest::SaveScore { score }),
                None => Err("Select a tournament first".into()),
            },
        };

        match request {
            Ok(request) => {
                editor.form.editing = false;
                Some(request)
            }
            Err(message) => {
                self.state.banner = Some(Banner::error(message));
                None
            }
        }
    }

    pub fn cancel_editor(&mut self) {
        self.state.tournaments.editor = None;
    }

    pub fn on_score_saved(&mut self, score: Score) {
        let admin = &mut self.state.tournaments;
        let belongs = admin.selected_tournament().is_some_and(|t| t.id == score.tournament_id)
            || score.tournament_id.is_empty();
        let round = score.round_number;
        if belongs {
            upsert_score(&mut admin.scores, score);
            admin.sort_teams();
        }
        admin.editor = None;
        self.state.banner = Some(Banner::info(format!("Saved round {round} score")));
    }

    /// A mutation succeeded: close the editor and re-fetch the screen.
    pub fn on_mutated(&mut self, message: String) -> Vec<NetworkRequest> {
        self.state.tournaments.editor = None;
        self.state.banner = Some(Banner::info(message));
        self.enter_requests()
    }

    pub fn request_delete(&mut self) {
        let action = match self.state.active_tab {
            MenuItem::Tournaments => {
                let admin = &self.state.tournaments;
                match admin.focus {
                    AdminFocus::Tournaments => admin.selected_tournament().map(|t| {
                        PendingAction::DeleteTournament { id: t.id.clone(), name: t.name.clone() }
                    }),
                    AdminFocus::Teams => admin
                        .selected_team()
                        .map(|t| PendingAction::DeleteTeam { id: t.id.clone(), label: t.label() }),
                }
            }
            MenuItem::Tickets => self.state.tickets.table.selected().map(|t| PendingAction::DeleteTicket {
                id: t.id.clone(),
                number: t.number.clone(),
            }),
            MenuItem::Users => self
                .state
                .users
                .selected()
                .map(|u| PendingAction::DeleteUser { id: u.id.clone(), name: u.name.clone() }),
            _ => None,
        };
        self.state.confirm = action;
    }

    pub fn request_refund(&mut self) {
        let Some(payment) = self.state.payments.selected() else {
            return;
        };
        if !payment.is_refundable() {
            let reason = if payment.amount <= 0.0 {
                "Free tickets have nothing to refund."
            } else {
                "Only completed payments can be refunded."
            };
            self.state.banner = Some(Banner::error(reason));
            return;
        }
        self.state.confirm = Some(PendingAction::RefundPayment {
            id: payment.id.clone(),
            transaction_id: payment.transaction_id.clone(),
        });
    }

    pub fn resolve_confirm(&mut self, accepted: bool) -> Option<NetworkRequest> {
        let action = self.state.confirm.take()?;
        accepted.then(|| action.into_request())
    }

    pub fn cycle_ticket_filter(&mut self) -> Vec<NetworkRequest> {
        let tournaments = self.state.catalog.tournaments.clone();
        self.state.tickets.cycle_filter(&tournaments);
        self.state.guard.bump();
        self.enter_requests()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourneyfund_api::client::FundApi;
    use tourneyfund_api::storage::SessionStorage;
    use tourneyfund_api::{Identity, Role};

    fn app(name: &str) -> App {
        let path = std::env::temp_dir().join(format!("tourneyfund-app-{name}-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let mut session = Session::init(FundApi::new("http://127.0.0.1:9", SessionStorage::new(path)));
        session.hydrate();
        App::new(AppSettings::default(), session)
    }

    fn sign_in(app: &mut App, role: Role) -> Vec<NetworkRequest> {
        let identity = Identity { id: "u1".into(), name: "Pat".into(), email: "p@x.io".into(), role };
        app.on_sign_in_finished(Ok(AuthPayload { identity, token: Some("tok".into()) }), role == Role::Admin, false)
    }

    fn tournament(id: &str, active: bool) -> Tournament {
        Tournament { id: id.into(), name: id.to_uppercase(), is_active: active, ..Default::default() }
    }

    #[test]
    fn admin_tabs_need_admin_session() {
        let mut app = app("admin-gate");
        assert!(app.update_tab(MenuItem::Payments).is_empty());
        assert_eq!(app.state.active_tab, MenuItem::Account);
        assert!(app.state.auth.as_admin);
        assert!(app.state.banner.is_some());
        assert!(!app.visible_tabs().contains(&MenuItem::Payments));
    }

    #[test]
    fn admin_sign_in_lands_on_dashboard_and_remembers_tab() {
        let mut app = app("admin-land");
        let requests = sign_in(&mut app, Role::Admin);
        assert_eq!(app.state.active_tab, MenuItem::Dashboard);
        assert!(matches!(requests.as_slice(), [NetworkRequest::LoadDashboard { .. }]));

        app.update_tab(MenuItem::Payments);
        assert_eq!(app.session.remembered_tab().as_deref(), Some("payments"));

        let mut session = app.session.clone();
        session.hydrate();
        let reopened = App::new(AppSettings::default(), session);
        assert_eq!(reopened.state.active_tab, MenuItem::Payments);
    }

    #[test]
    fn player_sign_in_lands_on_my_tickets() {
        let mut app = app("player-land");
        let requests = sign_in(&mut app, Role::Player);
        assert_eq!(app.state.active_tab, MenuItem::MyTickets);
        assert!(matches!(
            requests.as_slice(),
            [NetworkRequest::LoadMyTickets { player_id, .. }] if player_id == "u1"
        ));
    }

    #[test]
    fn failed_sign_in_stays_on_account_with_message() {
        let mut app = app("sign-in-failed");
        app.update_tab(MenuItem::Account);
        let error = ApiError::Api { status: 400, message: Some("Invalid credentials".into()), url: "/auth".into() };
        assert!(app.on_sign_in_finished(Err(error), false, false).is_empty());
        assert!(!app.session.is_authenticated());
        assert_eq!(app.state.active_tab, MenuItem::Account);
        assert_eq!(app.state.auth.message.as_deref(), Some("Invalid credentials"));

        let parsing = ApiError::Parsing("no identity".into(), "/auth".into());
        app.on_sign_in_finished(Err(parsing), false, true);
        assert_eq!(app.state.auth.message.as_deref(), Some("Registration failed. Please try again."));
    }

    #[test]
    fn leaving_a_tab_drops_its_late_results() {
        let mut app = app("stale-tab");
        sign_in(&mut app, Role::Admin);
        app.update_tab(MenuItem::Leaderboard);
        let tag = app.state.guard.tag(MenuItem::Leaderboard, None);
        app.update_tab(MenuItem::Home);

        let follow_up = app.on_tournaments_loaded(tag, vec![tournament("t1", true)]);
        assert!(follow_up.is_empty());
        assert!(app.state.leaderboard.tournaments.is_empty());
        assert_eq!(app.state.catalog.tournaments.len(), 1);
    }

    #[test]
    fn leaderboard_ignores_result_for_previous_selection() {
        let mut app = app("stale-selection");
        app.update_tab(MenuItem::Leaderboard);
        let tag = app.state.guard.tag(MenuItem::Leaderboard, None);
        let follow_up = app.on_tournaments_loaded(tag, vec![tournament("t1", true), tournament("t2", false)]);
        let Some(NetworkRequest::LoadLeaderboard { tag: first, .. }) = follow_up.into_iter().next() else {
            panic!("expected a leaderboard fetch");
        };

        let Some(NetworkRequest::LoadLeaderboard { tag: second, tournament_id }) = app.cycle_leaderboard(true) else {
            panic!("expected a leaderboard fetch");
        };
        assert_eq!(tournament_id, "t2");

        let entry = LeaderboardEntry { position: 1, ticket: "T-1".into(), ..Default::default() };
        app.on_leaderboard_loaded(first, vec![entry.clone()]);
        assert!(app.state.leaderboard.entries.is_empty());
        app.on_leaderboard_loaded(second, vec![entry]);
        assert_eq!(app.state.leaderboard.entries.len(), 1);
    }

    #[test]
    fn late_error_for_previous_selection_keeps_current_leaderboard() {
        let mut app = app("stale-error");
        app.update_tab(MenuItem::Leaderboard);
        let tag = app.state.guard.tag(MenuItem::Leaderboard, None);
        let follow_up = app.on_tournaments_loaded(tag, vec![tournament("t1", true), tournament("t2", false)]);
        let Some(NetworkRequest::LoadLeaderboard { tag: first, .. }) = follow_up.into_iter().next() else {
            panic!("expected a leaderboard fetch");
        };
        let Some(NetworkRequest::LoadLeaderboard { tag: second, .. }) = app.cycle_leaderboard(true) else {
            panic!("expected a leaderboard fetch");
        };
        let entry = LeaderboardEntry { position: 1, ticket: "T-1".into(), ..Default::default() };
        app.on_leaderboard_loaded(second.clone(), vec![entry]);

        app.on_error(Some(first), ApiError::Api { status: 500, message: Some("t1 failed".into()), url: "/scores".into() });
        assert_eq!(app.state.leaderboard.entries.len(), 1);
        assert!(app.state.banner.is_none());

        app.on_error(Some(second), ApiError::Api { status: 500, message: Some("t2 failed".into()), url: "/scores".into() });
        assert!(app.state.leaderboard.entries.is_empty());
        assert_eq!(app.state.banner.as_ref().map(|b| b.message.as_str()), Some("t2 failed"));
    }

    #[test]
    fn unauthorized_error_signs_out_and_routes_to_account() {
        let mut app = app("unauthorized");
        sign_in(&mut app, Role::Player);
        let tag = app.state.guard.tag(MenuItem::MyTickets, None);
        app.on_error(Some(tag), ApiError::Unauthorized { message: None, url: "/tickets".into() });
        assert!(!app.session.is_authenticated());
        assert_eq!(app.state.active_tab, MenuItem::Account);
    }

    #[test]
    fn failed_fetch_shows_empty_state_and_banner() {
        let mut app = app("failed-fetch");
        sign_in(&mut app, Role::Admin);
        app.update_tab(MenuItem::Users);
        let tag = app.state.guard.tag(MenuItem::Users, None);
        app.on_error(
            Some(tag),
            ApiError::Api { status: 500, message: None, url: "/users".into() },
        );
        assert!(app.state.users.loaded);
        assert_eq!(app.state.users.total(), 0);
        assert_eq!(
            app.state.banner.as_ref().map(|b| b.message.as_str()),
            Some("Request failed with status code 500")
        );
    }

    #[test]
    fn purchase_needs_sign_in_and_active_tournament() {
        let mut app = app("purchase-gate");
        app.open_purchase();
        assert_eq!(app.state.active_tab, MenuItem::Account);
        assert!(!app.state.purchase.is_open());

        sign_in(&mut app, Role::Player);
        app.update_tab(MenuItem::BuyTickets);
        app.open_purchase();
        assert!(!app.state.purchase.is_open());

        app.state.catalog.tournaments = vec![tournament("t1", true)];
        app.open_purchase();
        let Some(NetworkRequest::SubmitPurchase { context, .. }) = app.submit_purchase() else {
            panic!("expected a purchase request");
        };
        assert_eq!(context.tournament_id, "t1");
        assert_eq!(context.player_id, "u1");
        assert!(app.submit_purchase().is_none(), "second submit while in flight");
    }

    #[test]
    fn rejected_purchase_session_routes_to_sign_in() {
        let mut app = app("purchase-401");
        sign_in(&mut app, Role::Player);
        app.update_tab(MenuItem::BuyTickets);
        app.state.catalog.tournaments = vec![tournament("t1", true)];
        app.open_purchase();
        assert!(app.submit_purchase().is_some());

        app.on_purchase_finished(Err(PurchaseError::Api(ApiError::Unauthorized {
            message: None,
            url: "/tickets".into(),
        })));
        assert_eq!(app.state.purchase, PurchaseFlow::Idle);
        assert_eq!(app.state.active_tab, MenuItem::Account);
        assert!(!app.session.is_authenticated());
    }

    #[test]
    fn completed_purchase_closes_on_acknowledge() {
        let mut app = app("purchase-ok");
        sign_in(&mut app, Role::Player);
        app.update_tab(MenuItem::BuyTickets);
        app.state.catalog.tournaments = vec![tournament("t1", true)];
        app.open_purchase();
        app.submit_purchase();
        app.on_purchase_finished(Ok(PurchaseOutcome::Completed { tickets: Vec::new() }));
        assert!(matches!(app.state.purchase, PurchaseFlow::Completed { .. }));
        assert!(!app.state.my_tickets.loaded);
    }

    #[test]
    fn refund_refused_for_free_payment() {
        let mut app = app("refund-free");
        app.state.payments.set_items(vec![PaymentRow {
            id: "p1".into(),
            amount: 0.0,
            status: "completed".into(),
            method: "Free".into(),
            ..Default::default()
        }]);
        app.request_refund();
        assert!(app.state.confirm.is_none());
        assert!(app.state.banner.is_some());
    }

    #[test]
    fn confirm_yields_request_only_when_accepted() {
        let mut app = app("confirm");
        app.state.confirm = Some(PendingAction::DeleteUser { id: "u9".into(), name: "Sam".into() });
        assert!(app.resolve_confirm(false).is_none());
        assert!(app.state.confirm.is_none());

        app.state.confirm = Some(PendingAction::DeleteUser { id: "u9".into(), name: "Sam".into() });
        assert!(matches!(app.resolve_confirm(true), Some(NetworkRequest::DeleteUser { id }) if id == "u9"));
    }

    #[test]
    fn saved_score_replaces_same_round() {
        let mut app = app("score-upsert");
        app.state.tournaments.set_tournaments(vec![tournament("t1", true)]);
        let score = |points| Score {
            tournament_id: "t1".into(),
            team_id: "a".into(),
            round_number: 2,
            points,
            eliminated: false,
        };
        app.on_score_saved(score(5));
        app.on_score_saved(score(9));
        assert_eq!(app.state.tournaments.scores.len(), 1);
        assert_eq!(app.state.tournaments.scores[0].points, 9);
    }

    #[test]
    fn logout_returns_home() {
        let mut app = app("logout");
        sign_in(&mut app, Role::Player);
        app.logout();
        assert_eq!(app.state.active_tab, MenuItem::Home);
        assert!(!app.session.is_authenticated());
    }
}
