//! Ticket purchase orchestration: option selection, price, and the three
//! payment paths (free ticket creation, Stripe checkout, PayPal checkout).

use crate::TeamsPerTicket;
use crate::client::{ApiError, ApiResult, FundApi};
use log::{info, warn};
use serde_json::{Value, json};
use std::fmt;

pub const MIN_QUANTITY: u8 = 1;
pub const MAX_QUANTITY: u8 = 20;
pub const STRIPE_CURRENCY: &str = "usd";
pub const PAYPAL_CURRENCY: &str = "USD";

/// Price of one ticket in whole currency units.
pub fn price(teams: TeamsPerTicket) -> u32 {
    match teams.get() {
        3 => 25,
        4 => 35,
        5 => 45,
        _ => 55,
    }
}

pub fn total(teams: TeamsPerTicket, quantity: u8) -> u32 {
    price(teams) * u32::from(quantity)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentMethod {
    #[default]
    Stripe,
    Paypal,
    Free,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Stripe => "Card (Stripe)",
            PaymentMethod::Paypal => "PayPal",
            PaymentMethod::Free => "Free ticket",
        }
    }

    pub fn next(self) -> Self {
        match self {
            PaymentMethod::Stripe => PaymentMethod::Paypal,
            PaymentMethod::Paypal => PaymentMethod::Free,
            PaymentMethod::Free => PaymentMethod::Stripe,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TicketCategory {
    #[default]
    Standard,
    Free,
}

impl TicketCategory {
    pub fn label(&self) -> &'static str {
        match self {
            TicketCategory::Standard => "Standard",
            TicketCategory::Free => "Free",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            TicketCategory::Standard => TicketCategory::Free,
            TicketCategory::Free => TicketCategory::Standard,
        }
    }
}

/// Which request a submission turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentPath {
    FreeTicket,
    StripeCheckout,
    PaypalCheckout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseOrder {
    pub teams_per_ticket: TeamsPerTicket,
    pub quantity: u8,
    pub method: PaymentMethod,
    pub category: TicketCategory,
}

impl Default for PurchaseOrder {
    fn default() -> Self {
        Self {
            teams_per_ticket: TeamsPerTicket::default(),
            quantity: MIN_QUANTITY,
            method: PaymentMethod::default(),
            category: TicketCategory::default(),
        }
    }
}

impl PurchaseOrder {
    pub fn new(
        teams_per_ticket: TeamsPerTicket,
        quantity: u8,
        method: PaymentMethod,
    ) -> Result<Self, PurchaseError> {
        if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
            return Err(PurchaseError::InvalidOrder(format!(
                "Quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}"
            )));
        }
        Ok(Self { teams_per_ticket, quantity, method, category: TicketCategory::Standard })
    }

    pub fn unit_price(&self) -> u32 {
        price(self.teams_per_ticket)
    }

    pub fn total(&self) -> u32 {
        total(self.teams_per_ticket, self.quantity)
    }

    /// What the buyer is charged: nothing on the free path.
    pub fn amount_due(&self) -> u32 {
        match self.path() {
            PaymentPath::FreeTicket => 0,
            _ => self.total(),
        }
    }

    pub fn total_minor_units(&self) -> u64 {
        u64::from(self.total()) * 100
    }

    pub fn paypal_amount(&self) -> String {
        format!("{:.2}", f64::from(self.total()))
    }

    pub fn path(&self) -> PaymentPath {
        if self.category == TicketCategory::Free
            || self.total() == 0
            || self.method == PaymentMethod::Free
        {
            return PaymentPath::FreeTicket;
        }
        match self.method {
            PaymentMethod::Paypal => PaymentPath::PaypalCheckout,
            _ => PaymentPath::StripeCheckout,
        }
    }

    pub fn set_quantity(&mut self, quantity: u8) {
        self.quantity = quantity.clamp(MIN_QUANTITY, MAX_QUANTITY);
    }

    pub fn increment_quantity(&mut self) {
        self.set_quantity(self.quantity.saturating_add(1));
    }

    pub fn decrement_quantity(&mut self) {
        self.set_quantity(self.quantity.saturating_sub(1));
    }
}

/// Who is buying, for which tournament.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseContext {
    pub player_id: String,
    pub tournament_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PurchaseOutcome {
    /// Hosted checkout page; control leaves the application until the user
    /// comes back.
    Redirect { url: String },
    Completed { tickets: Vec<Value> },
}

#[derive(Debug)]
pub enum PurchaseError {
    InvalidOrder(String),
    AlreadySubmitting,
    IntegrationIncomplete { provider: &'static str },
    Unhandled,
    Api(ApiError),
}

impl PurchaseError {
    pub fn message(&self) -> String {
        match self {
            PurchaseError::Api(e) => e.message(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for PurchaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseError::InvalidOrder(msg) => write!(f, "{msg}"),
            PurchaseError::AlreadySubmitting => write!(f, "A purchase is already being submitted"),
            PurchaseError::IntegrationIncomplete { provider } => write!(
                f,
                "{provider} returned an in-app confirmation token, which this client cannot complete yet. Please choose another payment method."
            ),
            PurchaseError::Unhandled => {
                write!(f, "Payment could not be started. Please try another method.")
            }
            PurchaseError::Api(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PurchaseError {}

impl From<ApiError> for PurchaseError {
    fn from(e: ApiError) -> Self {
        PurchaseError::Api(e)
    }
}

/// The requests the orchestrator needs. [`FundApi`] is the real one.
#[allow(async_fn_in_trait)]
pub trait PurchaseBackend {
    async fn create_tickets(&self, payload: &Value) -> ApiResult<Vec<Value>>;

    async fn create_stripe_intent(&self, amount_minor: u64, currency: &str) -> ApiResult<Value>;

    async fn create_paypal_order(&self, amount: &str, currency: &str) -> ApiResult<Value>;
}

impl PurchaseBackend for FundApi {
    async fn create_tickets(&self, payload: &Value) -> ApiResult<Vec<Value>> {
        FundApi::create_tickets(self, payload).await
    }

    async fn create_stripe_intent(&self, amount_minor: u64, currency: &str) -> ApiResult<Value> {
        FundApi::create_stripe_intent(self, amount_minor, currency).await
    }

    async fn create_paypal_order(&self, amount: &str, currency: &str) -> ApiResult<Value> {
        FundApi::create_paypal_order(self, amount, currency).await
    }
}

// ---------------------------------------------------------------------------
// Ticket creation payload adapters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRequest {
    pub player_id: String,
    pub tournament_id: String,
    pub teams_per_ticket: u8,
    pub quantity: u8,
}

impl TicketRequest {
    pub fn new(order: &PurchaseOrder, ctx: &PurchaseContext) -> Self {
        Self {
            player_id: ctx.player_id.clone(),
            tournament_id: ctx.tournament_id.clone(),
            teams_per_ticket: order.teams_per_ticket.get(),
            quantity: order.quantity,
        }
    }
}

/// One request body shape for `/tickets/create`.
pub struct TicketPayloadAdapter {
    pub name: &'static str,
    build: fn(&TicketRequest) -> Value,
}

impl TicketPayloadAdapter {
    pub fn build(&self, request: &TicketRequest) -> Value {
        (self.build)(request)
    }
}

fn primary_payload(r: &TicketRequest) -> Value {
    json!({
        "playerId": r.player_id,
        "tournamentId": r.tournament_id,
        "teamsPerTicket": r.teams_per_ticket,
        "quantity": r.quantity,
    })
}

fn wrapped_payload(r: &TicketRequest) -> Value {
    json!({ "ticket": primary_payload(r) })
}

fn renamed_payload(r: &TicketRequest) -> Value {
    json!({
        "userId": r.player_id,
        "tournament": r.tournament_id,
        "numberOfTeams": r.teams_per_ticket,
        "count": r.quantity,
    })
}

/// Tried in order; the backend contract for ticket creation is not stable.
pub const TICKET_ADAPTERS: [TicketPayloadAdapter; 3] = [
    TicketPayloadAdapter { name: "primary", build: primary_payload },
    TicketPayloadAdapter { name: "wrapped", build: wrapped_payload },
    TicketPayloadAdapter { name: "renamed", build: renamed_payload },
];

/// Create tickets, walking [`TICKET_ADAPTERS`] until one shape is accepted.
/// At most one attempt per adapter; the last failure is returned. A 401 ends
/// the walk since no other shape will get past it.
pub async fn create_tickets_with_fallback<B: PurchaseBackend>(
    backend: &B,
    request: &TicketRequest,
) -> ApiResult<Vec<Value>> {
    let mut last_error = None;
    for adapter in TICKET_ADAPTERS.iter() {
        match backend.create_tickets(&adapter.build(request)).await {
            Ok(tickets) => {
                info!("ticket creation accepted the {} payload", adapter.name);
                return Ok(tickets);
            }
            Err(e) => {
                warn!("ticket creation with the {} payload failed: {e}", adapter.name);
                let stop = matches!(e, ApiError::Unauthorized { .. });
                last_error = Some(e);
                if stop {
                    break;
                }
            }
        }
    }
    Err(last_error.unwrap_or_else(|| ApiError::Other("no ticket payload adapters".into())))
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

const REDIRECT_KEYS: [&str; 6] =
    ["checkoutUrl", "url", "sessionUrl", "approvalUrl", "approveUrl", "redirectUrl"];
const STRIPE_TOKEN_KEYS: [&str; 2] = ["clientSecret", "client_secret"];
const PAYPAL_TOKEN_KEYS: [&str; 3] = ["orderId", "orderID", "id"];

pub async fn submit_purchase<B: PurchaseBackend>(
    backend: &B,
    order: &PurchaseOrder,
    ctx: &PurchaseContext,
) -> Result<PurchaseOutcome, PurchaseError> {
    if ctx.tournament_id.trim().is_empty() {
        return Err(PurchaseError::InvalidOrder(
            "No active tournament is open for ticket sales".into(),
        ));
    }

    match order.path() {
        PaymentPath::FreeTicket => {
            let tickets = create_tickets_with_fallback(backend, &TicketRequest::new(order, ctx)).await?;
            Ok(PurchaseOutcome::Completed { tickets })
        }
        PaymentPath::StripeCheckout => {
            let response = backend
                .create_stripe_intent(order.total_minor_units(), STRIPE_CURRENCY)
                .await?;
            interpret_checkout(&response, "Stripe", &STRIPE_TOKEN_KEYS)
        }
        PaymentPath::PaypalCheckout => {
            let response = backend
                .create_paypal_order(&order.paypal_amount(), PAYPAL_CURRENCY)
                .await?;
            interpret_checkout(&response, "PayPal", &PAYPAL_TOKEN_KEYS)
        }
    }
}

fn interpret_checkout(
    response: &Value,
    provider: &'static str,
    token_keys: &[&str],
) -> Result<PurchaseOutcome, PurchaseError> {
    if let Some(url) = redirect_url(response) {
        info!("{provider} checkout ready, redirecting");
        return Ok(PurchaseOutcome::Redirect { url });
    }
    let has_token = token_keys
        .iter()
        .any(|key| response.get(*key).and_then(Value::as_str).is_some_and(|t| !t.is_empty()));
    if has_token {
        return Err(PurchaseError::IntegrationIncomplete { provider });
    }
    Err(PurchaseError::Unhandled)
}

fn redirect_url(response: &Value) -> Option<String> {
    let direct = REDIRECT_KEYS
        .iter()
        .find_map(|key| response.get(*key).and_then(Value::as_str));
    let approve_link = || {
        response
            .get("links")?
            .as_array()?
            .iter()
            .find(|link| link.get("rel").and_then(Value::as_str) == Some("approve"))?
            .get("href")?
            .as_str()
    };
    direct
        .or_else(approve_link)
        .map(str::trim)
        .filter(|url| url.starts_with("http://") || url.starts_with("https://"))
        .map(ToOwned::to_owned)
}

// ---------------------------------------------------------------------------
// Purchase flow state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PurchaseFlow {
    #[default]
    Idle,
    Configuring(PurchaseOrder),
    Submitting(PurchaseOrder),
    Redirecting { url: String },
    Completed { tickets: Vec<Value> },
    Failed { order: PurchaseOrder, message: String },
}

impl PurchaseFlow {
    pub fn open() -> Self {
        PurchaseFlow::Configuring(PurchaseOrder::default())
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, PurchaseFlow::Idle)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, PurchaseFlow::Submitting(_))
    }

    /// The order being edited. A failed order becomes editable again.
    pub fn order_mut(&mut self) -> Option<&mut PurchaseOrder> {
        if let PurchaseFlow::Failed { order, .. } = self {
            *self = PurchaseFlow::Configuring(order.clone());
        }
        match self {
            PurchaseFlow::Configuring(order) => Some(order),
            _ => None,
        }
    }

    pub fn order(&self) -> Option<&PurchaseOrder> {
        match self {
            PurchaseFlow::Configuring(order)
            | PurchaseFlow::Submitting(order)
            | PurchaseFlow::Failed { order, .. } => Some(order),
            _ => None,
        }
    }

    /// Move to `Submitting`. Only one submission may be in flight.
    pub fn begin_submit(&mut self) -> Result<PurchaseOrder, PurchaseError> {
        match self {
            PurchaseFlow::Submitting(_) => Err(PurchaseError::AlreadySubmitting),
            PurchaseFlow::Configuring(order) | PurchaseFlow::Failed { order, .. } => {
                let order = order.clone();
                *self = PurchaseFlow::Submitting(order.clone());
                Ok(order)
            }
            _ => Err(PurchaseError::InvalidOrder("Open the purchase form first".into())),
        }
    }

    pub fn finish(&mut self, result: Result<PurchaseOutcome, PurchaseError>) {
        let PurchaseFlow::Submitting(order) = self else {
            return;
        };
        *self = match result {
            Ok(PurchaseOutcome::Redirect { url }) => PurchaseFlow::Redirecting { url },
            Ok(PurchaseOutcome::Completed { tickets }) => PurchaseFlow::Completed { tickets },
            Err(e) => PurchaseFlow::Failed { order: order.clone(), message: e.message() },
        };
    }

    /// Close the modal. Ignored while a submission is in flight.
    pub fn close(&mut self) {
        if !self.is_submitting() {
            *self = PurchaseFlow::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted backend recording every call.
    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<String>>,
        ticket_payloads: Mutex<Vec<Value>>,
        ticket_results: Mutex<Vec<ApiResult<Vec<Value>>>>,
        checkout_response: Value,
    }

    impl FakeBackend {
        fn with_checkout(response: Value) -> Self {
            Self { checkout_response: response, ..Default::default() }
        }

        fn with_ticket_results(results: Vec<ApiResult<Vec<Value>>>) -> Self {
            Self { ticket_results: Mutex::new(results), ..Default::default() }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PurchaseBackend for FakeBackend {
        async fn create_tickets(&self, payload: &Value) -> ApiResult<Vec<Value>> {
            self.calls.lock().unwrap().push("tickets".into());
            self.ticket_payloads.lock().unwrap().push(payload.clone());
            let mut results = self.ticket_results.lock().unwrap();
            if results.is_empty() {
                Ok(vec![json!({"_id": "new"})])
            } else {
                results.remove(0)
            }
        }

        async fn create_stripe_intent(&self, amount_minor: u64, currency: &str) -> ApiResult<Value> {
            self.calls.lock().unwrap().push(format!("stripe:{amount_minor}:{currency}"));
            Ok(self.checkout_response.clone())
        }

        async fn create_paypal_order(&self, amount: &str, currency: &str) -> ApiResult<Value> {
            self.calls.lock().unwrap().push(format!("paypal:{amount}:{currency}"));
            Ok(self.checkout_response.clone())
        }
    }

    fn ctx() -> PurchaseContext {
        PurchaseContext { player_id: "u1".into(), tournament_id: "t1".into() }
    }

    fn teams(n: u8) -> TeamsPerTicket {
        TeamsPerTicket::new(n).unwrap()
    }

    fn failure(msg: &str) -> ApiResult<Vec<Value>> {
        Err(ApiError::Api { status: 400, message: Some(msg.into()), url: "/tickets/create".into() })
    }

    #[test]
    fn price_table_is_monotonic() {
        let prices: Vec<u32> = TeamsPerTicket::ALL.iter().map(|t| price(*t)).collect();
        assert_eq!(prices, vec![25, 35, 45, 55]);
        assert!(prices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn total_is_price_times_quantity() {
        assert_eq!(total(teams(4), 2), 70);
        for t in TeamsPerTicket::ALL {
            for qty in MIN_QUANTITY..=MAX_QUANTITY {
                assert_eq!(total(t, qty), price(t) * u32::from(qty));
            }
        }
    }

    #[test]
    fn quantity_outside_range_is_rejected_and_clamped() {
        assert!(PurchaseOrder::new(teams(3), 0, PaymentMethod::Stripe).is_err());
        assert!(PurchaseOrder::new(teams(3), 21, PaymentMethod::Stripe).is_err());

        let mut order = PurchaseOrder::default();
        order.decrement_quantity();
        assert_eq!(order.quantity, 1);
        order.set_quantity(50);
        assert_eq!(order.quantity, 20);
        order.increment_quantity();
        assert_eq!(order.quantity, 20);
    }

    #[test]
    fn amounts_sent_to_providers() {
        let order = PurchaseOrder::new(teams(4), 2, PaymentMethod::Paypal).unwrap();
        assert_eq!(order.total_minor_units(), 7000);
        assert_eq!(order.paypal_amount(), "70.00");
    }

    #[test]
    fn free_path_selection() {
        let mut order = PurchaseOrder::default();
        assert_eq!(order.path(), PaymentPath::StripeCheckout);
        order.method = PaymentMethod::Paypal;
        assert_eq!(order.path(), PaymentPath::PaypalCheckout);
        assert_eq!(order.amount_due(), order.total());
        order.category = order.category.toggle();
        assert_eq!(order.category, TicketCategory::Free);
        assert_eq!(order.path(), PaymentPath::FreeTicket);
        assert_eq!(order.amount_due(), 0);
        order.category = order.category.toggle();
        order.method = PaymentMethod::Free;
        assert_eq!(order.path(), PaymentPath::FreeTicket);
    }

    #[tokio::test]
    async fn free_orders_never_touch_payment_endpoints() {
        for t in TeamsPerTicket::ALL {
            for qty in [1, 7, 20] {
                let backend = FakeBackend::default();
                let order = PurchaseOrder::new(t, qty, PaymentMethod::Free).unwrap();
                let outcome = submit_purchase(&backend, &order, &ctx()).await.unwrap();
                assert!(matches!(outcome, PurchaseOutcome::Completed { .. }));
                assert_eq!(backend.calls(), vec!["tickets"]);
            }
        }
    }

    #[tokio::test]
    async fn free_ticket_payload_carries_order() {
        let backend = FakeBackend::default();
        let order = PurchaseOrder::new(teams(5), 3, PaymentMethod::Free).unwrap();
        submit_purchase(&backend, &order, &ctx()).await.unwrap();
        let payloads = backend.ticket_payloads.lock().unwrap();
        assert_eq!(
            payloads[0],
            json!({"playerId": "u1", "tournamentId": "t1", "teamsPerTicket": 5, "quantity": 3})
        );
    }

    #[tokio::test]
    async fn stripe_checkout_url_redirects_without_creating_tickets() {
        let backend = FakeBackend::with_checkout(json!({"checkoutUrl": "https://pay/x"}));
        let order = PurchaseOrder::new(teams(4), 2, PaymentMethod::Stripe).unwrap();
        let outcome = submit_purchase(&backend, &order, &ctx()).await.unwrap();
        assert_eq!(outcome, PurchaseOutcome::Redirect { url: "https://pay/x".into() });
        assert_eq!(backend.calls(), vec!["stripe:7000:usd"]);
    }

    #[tokio::test]
    async fn stripe_client_secret_is_integration_incomplete() {
        let backend = FakeBackend::with_checkout(json!({"clientSecret": "pi_1_secret_2"}));
        let order = PurchaseOrder::default();
        let err = submit_purchase(&backend, &order, &ctx()).await.unwrap_err();
        assert!(matches!(err, PurchaseError::IntegrationIncomplete { provider: "Stripe" }));
    }

    #[tokio::test]
    async fn paypal_approve_link_redirects() {
        let backend = FakeBackend::with_checkout(json!({
            "id": "ORDER-1",
            "links": [
                {"rel": "self", "href": "https://api.paypal/x"},
                {"rel": "approve", "href": "https://paypal/approve/ORDER-1"}
            ]
        }));
        let order = PurchaseOrder::new(teams(6), 1, PaymentMethod::Paypal).unwrap();
        let outcome = submit_purchase(&backend, &order, &ctx()).await.unwrap();
        assert_eq!(outcome, PurchaseOutcome::Redirect { url: "https://paypal/approve/ORDER-1".into() });
        assert_eq!(backend.calls(), vec!["paypal:55.00:USD"]);
    }

    #[tokio::test]
    async fn paypal_order_id_only_is_integration_incomplete() {
        let backend = FakeBackend::with_checkout(json!({"orderId": "ORDER-2"}));
        let order = PurchaseOrder::new(teams(3), 1, PaymentMethod::Paypal).unwrap();
        let err = submit_purchase(&backend, &order, &ctx()).await.unwrap_err();
        assert!(matches!(err, PurchaseError::IntegrationIncomplete { provider: "PayPal" }));
    }

    #[tokio::test]
    async fn unrecognised_checkout_response_asks_for_another_method() {
        let backend = FakeBackend::with_checkout(json!({"ok": true}));
        let err = submit_purchase(&backend, &PurchaseOrder::default(), &ctx()).await.unwrap_err();
        assert!(matches!(err, PurchaseError::Unhandled));
        assert!(err.message().contains("another method"));
    }

    #[tokio::test]
    async fn missing_tournament_is_rejected_up_front() {
        let backend = FakeBackend::default();
        let ctx = PurchaseContext { player_id: "u1".into(), tournament_id: String::new() };
        let order = PurchaseOrder::new(teams(3), 1, PaymentMethod::Free).unwrap();
        assert!(submit_purchase(&backend, &order, &ctx).await.is_err());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn ticket_creation_walks_adapters_until_success() {
        let backend = FakeBackend::with_ticket_results(vec![
            failure("bad shape"),
            Ok(vec![json!({"_id": "a"})]),
        ]);
        let request = TicketRequest::new(&PurchaseOrder::default(), &ctx());
        let tickets = create_tickets_with_fallback(&backend, &request).await.unwrap();
        assert_eq!(tickets, vec![json!({"_id": "a"})]);

        let payloads = backend.ticket_payloads.lock().unwrap();
        assert_eq!(payloads.len(), 2);
        assert!(payloads[1].get("ticket").is_some());
    }

    #[tokio::test]
    async fn ticket_creation_gives_up_after_three_shapes_with_last_error() {
        let backend = FakeBackend::with_ticket_results(vec![
            failure("first"),
            failure("second"),
            failure("third"),
            failure("never sent"),
        ]);
        let request = TicketRequest::new(&PurchaseOrder::default(), &ctx());
        let err = create_tickets_with_fallback(&backend, &request).await.unwrap_err();
        assert_eq!(err.message(), "third");

        let payloads = backend.ticket_payloads.lock().unwrap();
        assert_eq!(payloads.len(), 3);
        assert_ne!(payloads[0], payloads[1]);
        assert_ne!(payloads[1], payloads[2]);
        assert_ne!(payloads[0], payloads[2]);
    }

    #[tokio::test]
    async fn ticket_creation_stops_on_unauthorized() {
        let backend = FakeBackend::with_ticket_results(vec![Err(ApiError::Unauthorized {
            message: None,
            url: "/tickets/create".into(),
        })]);
        let request = TicketRequest::new(&PurchaseOrder::default(), &ctx());
        assert!(create_tickets_with_fallback(&backend, &request).await.is_err());
        assert_eq!(backend.calls().len(), 1);
    }

    #[test]
    fn flow_allows_one_submission_in_flight() {
        let mut flow = PurchaseFlow::open();
        let order = flow.begin_submit().unwrap();
        assert_eq!(order, PurchaseOrder::default());
        assert!(flow.is_submitting());
        assert!(matches!(flow.begin_submit(), Err(PurchaseError::AlreadySubmitting)));

        flow.close();
        assert!(flow.is_submitting(), "closing mid-submission is ignored");
        assert!(flow.order_mut().is_none());
    }

    #[test]
    fn flow_failure_keeps_order_for_retry() {
        let mut flow = PurchaseFlow::open();
        flow.order_mut().unwrap().set_quantity(4);
        flow.begin_submit().unwrap();
        flow.finish(Err(PurchaseError::Unhandled));

        let PurchaseFlow::Failed { order, message } = &flow else {
            panic!("expected Failed, got {flow:?}");
        };
        assert_eq!(order.quantity, 4);
        assert!(message.contains("another method"));

        flow.order_mut().unwrap().increment_quantity();
        assert_eq!(flow.begin_submit().unwrap().quantity, 5);
    }

    #[test]
    fn flow_outcomes() {
        let mut flow = PurchaseFlow::open();
        flow.begin_submit().unwrap();
        flow.finish(Ok(PurchaseOutcome::Redirect { url: "https://pay/x".into() }));
        assert_eq!(flow, PurchaseFlow::Redirecting { url: "https://pay/x".into() });

        flow.finish(Ok(PurchaseOutcome::Completed { tickets: vec![] }));
        assert!(matches!(flow, PurchaseFlow::Redirecting { .. }), "finish outside Submitting is ignored");

        flow.close();
        assert!(!flow.is_open());
    }
}
