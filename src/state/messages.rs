use crate::state::app_state::RequestTag;
use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use tourneyfund_api::client::{ApiError, ApiResult};
use tourneyfund_api::envelope::AuthPayload;
use tourneyfund_api::purchase::{PurchaseContext, PurchaseError, PurchaseOrder, PurchaseOutcome};
use tourneyfund_api::services::auth::Registration;
use tourneyfund_api::services::tournaments::{TeamDraft, TournamentDraft};
use tourneyfund_api::{
    LeaderboardEntry, PaymentRow, Score, Team, TicketRow, Tournament, UserRow,
};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    Login { email: String, password: String, as_admin: bool },
    Register { registration: Registration, as_admin: bool },

    LoadTournaments { tag: RequestTag },
    LoadMyTickets { tag: RequestTag, player_id: String },
    LoadLeaderboard { tag: RequestTag, tournament_id: String },
    LoadDashboard { tag: RequestTag },
    /// Teams and scores of one tournament.
    LoadTournamentDetail { tag: RequestTag, tournament_id: String },
    LoadTickets { tag: RequestTag, tournament_id: Option<String> },
    LoadPayments { tag: RequestTag },
    LoadUsers { tag: RequestTag },

    SubmitPurchase { order: PurchaseOrder, context: PurchaseContext },

    SaveTournament { id: Option<String>, draft: TournamentDraft },
    DeleteTournament { id: String },
    SaveTeam { tournament_id: String, id: Option<String>, draft: TeamDraft },
    DeleteTeam { id: String },
    SaveScore { score: Score },
    DeleteTicket { id: String },
    RefundPayment { id: String },
    DeleteUser { id: String },
}

impl NetworkRequest {
    pub fn tag(&self) -> Option<RequestTag> {
        match self {
            NetworkRequest::LoadTournaments { tag }
            | NetworkRequest::LoadMyTickets { tag, .. }
            | NetworkRequest::LoadLeaderboard { tag, .. }
            | NetworkRequest::LoadDashboard { tag }
            | NetworkRequest::LoadTournamentDetail { tag, .. }
            | NetworkRequest::LoadTickets { tag, .. }
            | NetworkRequest::LoadPayments { tag }
            | NetworkRequest::LoadUsers { tag } => Some(tag.clone()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },

    SignInFinished { result: ApiResult<AuthPayload>, as_admin: bool, registering: bool },

    TournamentsLoaded { tag: RequestTag, tournaments: Vec<Tournament> },
    TicketsLoaded { tag: RequestTag, tickets: Vec<TicketRow> },
    LeaderboardLoaded { tag: RequestTag, entries: Vec<LeaderboardEntry> },
    DashboardLoaded {
        tag: RequestTag,
        players: Vec<UserRow>,
        tournaments: Vec<Tournament>,
        tickets: Vec<TicketRow>,
    },
    TournamentDetailLoaded { tag: RequestTag, teams: Vec<Team>, scores: Vec<Score> },
    PaymentsLoaded { tag: RequestTag, payments: Vec<PaymentRow> },
    UsersLoaded { tag: RequestTag, users: Vec<UserRow> },

    PurchaseFinished { result: Result<PurchaseOutcome, PurchaseError> },
    ScoreSaved { score: Score },
    /// A create/update/delete went through; the screen should re-fetch.
    Mutated { message: String },

    Error { tag: Option<RequestTag>, error: ApiError },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
}
