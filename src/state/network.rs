use crate::state::app_state::RequestTag;
use crate::state::messages::{NetworkRequest, NetworkResponse};
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tourneyfund_api::client::{ApiError, FundApi};
use tourneyfund_api::normalize::{normalize_payments, normalize_tickets, normalize_users};
use tourneyfund_api::purchase::submit_purchase;
use tourneyfund_api::services::tickets::TicketFilter;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

type WorkerResult = Result<NetworkResponse, ApiError>;

/// Runs requests one at a time against the backend.
pub struct NetworkWorker {
    client: FundApi,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        client: FundApi,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let tag = request.tag();
            let response = match self.handle(request).await {
                Ok(response) => {
                    self.stop_loading_animation(true).await;
                    response
                }
                Err(error) => {
                    self.stop_loading_animation(false).await;
                    NetworkResponse::Error { tag, error }
                }
            };
            debug!("network request complete");

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle(&self, request: NetworkRequest) -> WorkerResult {
        match request {
            NetworkRequest::Login { email, password, as_admin } => {
                debug!("signing in as {email}");
                let result = self.client.login(&email, &password, as_admin).await;
                Ok(NetworkResponse::SignInFinished { result, as_admin, registering: false })
            }
            NetworkRequest::Register { registration, as_admin } => {
                debug!("registering {}", registration.email);
                let result = self.client.register(&registration, as_admin).await;
                Ok(NetworkResponse::SignInFinished { result, as_admin, registering: true })
            }

            NetworkRequest::LoadTournaments { tag } => {
                let tournaments = self.client.list_tournaments().await?;
                Ok(NetworkResponse::TournamentsLoaded { tag, tournaments })
            }
            NetworkRequest::LoadMyTickets { tag, player_id } => {
                let raw = self.client.list_tickets(&TicketFilter::for_player(player_id)).await?;
                Ok(NetworkResponse::TicketsLoaded { tag, tickets: normalize_tickets(&raw) })
            }
            NetworkRequest::LoadLeaderboard { tag, tournament_id } => {
                let entries = self.client.leaderboard(&tournament_id).await?;
                Ok(NetworkResponse::LeaderboardLoaded { tag, entries })
            }
            NetworkRequest::LoadDashboard { tag } => self.handle_load_dashboard(tag).await,
            NetworkRequest::LoadTournamentDetail { tag, tournament_id } => {
                let teams = self.client.list_teams(&tournament_id).await?;
                let scores = self.client.list_scores(&tournament_id).await?;
                Ok(NetworkResponse::TournamentDetailLoaded { tag, teams, scores })
            }
            NetworkRequest::LoadTickets { tag, tournament_id } => {
                let filter = TicketFilter { tournament_id, ..Default::default() };
                let raw = self.client.list_tickets(&filter).await?;
                Ok(NetworkResponse::TicketsLoaded { tag, tickets: normalize_tickets(&raw) })
            }
            NetworkRequest::LoadPayments { tag } => {
                let raw = self.client.list_payments().await?;
                Ok(NetworkResponse::PaymentsLoaded { tag, payments: normalize_payments(&raw) })
            }
            NetworkRequest::LoadUsers { tag } => {
                let raw = self.client.list_users().await?;
                Ok(NetworkResponse::UsersLoaded { tag, users: normalize_users(&raw) })
            }

            NetworkRequest::SubmitPurchase { order, context } => {
                debug!("submitting purchase of {} ticket(s)", order.quantity);
                let result = submit_purchase(&self.client, &order, &context).await;
                Ok(NetworkResponse::PurchaseFinished { result })
            }

            NetworkRequest::SaveTournament { id, draft } => {
                let saved = match id.as_deref() {
                    Some(id) => self.client.update_tournament(id, &draft).await?,
                    None => self.client.create_tournament(&draft).await?,
                };
                Ok(mutated(format!("Saved tournament {}", saved.name)))
            }
            NetworkRequest::DeleteTournament { id } => {
                self.client.delete_tournament(&id).await?;
                Ok(mutated("Tournament deleted"))
            }
            NetworkRequest::SaveTeam { tournament_id, id, draft } => {
                let saved = match id.as_deref() {
                    Some(id) => self.client.update_team(id, &draft).await?,
                    None => self.client.create_team(&tournament_id, &draft).await?,
                };
                Ok(mutated(format!("Saved team {}", saved.label())))
            }
            NetworkRequest::DeleteTeam { id } => {
                self.client.delete_team(&id).await?;
                Ok(mutated("Team deleted"))
            }
            NetworkRequest::SaveScore { score } => {
                let score = self.client.save_score(&score).await?;
                Ok(NetworkResponse::ScoreSaved { score })
            }
            NetworkRequest::DeleteTicket { id } => {
                self.client.delete_ticket(&id).await?;
                Ok(mutated("Ticket deleted"))
            }
            NetworkRequest::RefundPayment { id } => {
                self.client.refund_payment(&id).await?;
                Ok(mutated("Payment refunded"))
            }
            NetworkRequest::DeleteUser { id } => {
                self.client.delete_user(&id).await?;
                Ok(mutated("User deleted"))
            }
        }
    }

    async fn handle_load_dashboard(&self, tag: RequestTag) -> WorkerResult {
        debug!("loading dashboard");
        let players = self.client.recent_players().await?;
        let tournaments = self.client.recent_tournaments().await?;
        let tickets = self.client.recent_tickets().await?;
        Ok(NetworkResponse::DashboardLoaded {
            tag,
            players: normalize_users(&players),
            tournaments,
            tickets: normalize_tickets(&tickets),
        })
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}

fn mutated(message: impl Into<String>) -> NetworkResponse {
    NetworkResponse::Mutated { message: message.into() }
}
