//! # REST + JSON-RPC API
//!
//! Builds the axum router that exposes the node's HTTP interface. All
//! endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                          | Description                  |
//! |--------|-------------------------------|------------------------------|
//! | GET    | `/health`                     | Liveness probe               |
//! | GET    | `/status`                     | Node status summary          |
//! | GET    | `/token`                      | Metadata, supply, owner      |
//! | GET    | `/accounts/:address`          | Account balance              |
//! | GET    | `/allowances/:owner/:spender` | Remaining allowance          |
//! | POST   | `/rpc`                        | JSON-RPC 2.0 gateway         |
//!
//! Amounts are always decimal strings. The caller of a mutating operation
//! is named in the request; authenticating that claim is the job of
//! whatever sits in front of this node.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tally_ledger::amount::serde_decimal;
use tally_ledger::{Address, Amount, LedgerError, Operation, Receipt, SharedLedger};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone. Everything is reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The ledger being served.
    pub ledger: SharedLedger,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/token", get(token_handler))
        .route("/accounts/:address", get(account_handler))
        .route("/allowances/:owner/:spender", get(allowance_handler))
        .route("/rpc", post(rpc_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// JSON-RPC Types
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version. Must be "2.0".
    pub jsonrpc: String,
    /// The method to invoke.
    pub method: String,
    /// Method parameters (positional or named).
    pub params: Option<serde_json::Value>,
    /// Request identifier. Echoed back in the response.
    #[serde(default)]
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Protocol version. Always "2.0".
    pub jsonrpc: String,
    /// The result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// The error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    /// Request identifier, echoed from the request.
    pub id: serde_json::Value,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Numeric error code.
    pub code: i32,
    /// Short human-readable error description.
    pub message: String,
    /// Optional structured error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, format!("Invalid params: {}", message.into()))
    }
}

impl From<LedgerError> for JsonRpcError {
    fn from(e: LedgerError) -> Self {
        Self {
            code: ledger_error_code(&e),
            message: e.to_string(),
            data: Some(serde_json::json!({ "kind": e.kind() })),
        }
    }
}

const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

/// Application error codes, one per ledger failure kind.
pub fn ledger_error_code(e: &LedgerError) -> i32 {
    match e {
        LedgerError::InsufficientBalance { .. } => -32010,
        LedgerError::InvalidSpender => -32011,
        LedgerError::AllowanceExceeded { .. } => -32012,
        LedgerError::AllowanceBelowZero { .. } => -32013,
        LedgerError::AllowanceOverflow { .. } => -32014,
        LedgerError::InvalidRecipient => -32015,
        LedgerError::InvalidSource => -32016,
        LedgerError::Unauthorized { .. } => -32017,
        LedgerError::SupplyOverflow { .. } => -32018,
        LedgerError::BalanceOverflow { .. } => -32019,
    }
}

/// Named parameters for `ledger_submit`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitParams {
    /// Account the operation runs as.
    pub caller: Address,
    /// The operation itself, e.g. `{"op":"transfer","to":"0x…","amount":"5"}`.
    pub operation: Operation,
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Token symbol.
    pub symbol: String,
    /// Sequence number of the last committed operation.
    pub sequence: u64,
    /// Whether an owner still holds the mint/burn privilege.
    pub owned: bool,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Response payload for `GET /token`.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(with = "serde_decimal")]
    pub total_supply: Amount,
    /// Owner account; the zero address once renounced.
    pub owner: Address,
}

/// Response payload for `GET /accounts/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub address: Address,
    #[serde(with = "serde_decimal")]
    pub balance: Amount,
}

/// Response payload for `GET /allowances/:owner/:spender`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AllowanceResponse {
    pub owner: Address,
    pub spender: Address,
    #[serde(with = "serde_decimal")]
    pub amount: Amount,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message })).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`: returns node status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (symbol, owned, sequence) = state
        .ledger
        .read_at(|l, seq| (l.symbol().to_string(), l.is_owned(), seq));

    Json(StatusResponse {
        version: state.version.clone(),
        symbol,
        sequence,
        owned,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `GET /token`: token metadata, total supply and owner.
async fn token_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.ledger.read(token_response))
}

fn token_response(l: &tally_ledger::Ledger) -> TokenResponse {
    TokenResponse {
        name: l.name().to_string(),
        symbol: l.symbol().to_string(),
        decimals: l.decimals(),
        total_supply: l.total_supply(),
        owner: l.owner(),
    }
}

/// `GET /accounts/:address`: balance of an account, zero if unknown.
async fn account_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let address: Address = match address.parse() {
        Ok(a) => a,
        Err(e) => return bad_request(format!("{}", e)),
    };

    let balance = state.ledger.read(|l| l.balance_of(&address));
    Json(AccountResponse { address, balance }).into_response()
}

/// `GET /allowances/:owner/:spender`: remaining allowance.
async fn allowance_handler(
    Path((owner, spender)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Response {
    let (owner, spender): (Address, Address) = match (owner.parse(), spender.parse()) {
        (Ok(o), Ok(s)) => (o, s),
        (Err(e), _) | (_, Err(e)) => return bad_request(format!("{}", e)),
    };

    let amount = state.ledger.read(|l| l.allowance(&owner, &spender));
    Json(AllowanceResponse {
        owner,
        spender,
        amount,
    })
    .into_response()
}

/// `POST /rpc`: JSON-RPC 2.0 gateway.
///
/// Routes method calls to internal handlers. Unknown methods return
/// error code -32601 (Method not found).
async fn rpc_handler(
    State(state): State<AppState>,
    Json(req): Json<JsonRpcRequest>,
) -> impl IntoResponse {
    if req.jsonrpc != "2.0" {
        return Json(JsonRpcResponse {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(JsonRpcError::new(
                INVALID_REQUEST,
                "Invalid Request: jsonrpc must be \"2.0\"",
            )),
            id: req.id,
        });
    }

    let outcome = dispatch(&state, &req.method, req.params.as_ref());
    let (result, error) = match outcome {
        Ok(value) => (Some(value), None),
        Err(e) => (None, Some(e)),
    };

    Json(JsonRpcResponse {
        jsonrpc: "2.0".into(),
        result,
        error,
        id: req.id,
    })
}

type RpcOutcome = Result<serde_json::Value, JsonRpcError>;

fn dispatch(state: &AppState, method: &str, params: Option<&serde_json::Value>) -> RpcOutcome {
    let ledger = &state.ledger;
    match method {
        "ledger_name" => Ok(ledger.read(|l| l.name().into())),
        "ledger_symbol" => Ok(ledger.read(|l| l.symbol().into())),
        "ledger_decimals" => Ok(ledger.read(|l| l.decimals().into())),
        "ledger_totalSupply" => Ok(ledger.read(|l| l.total_supply().to_string().into())),
        "ledger_owner" => Ok(ledger.read(|l| l.owner().to_hex().into())),
        "ledger_balanceOf" => {
            let account = address_param(params, 0, "account")?;
            Ok(ledger.read(|l| l.balance_of(&account).to_string().into()))
        }
        "ledger_allowance" => {
            let owner = address_param(params, 0, "owner")?;
            let spender = address_param(params, 1, "spender")?;
            Ok(ledger.read(|l| l.allowance(&owner, &spender).to_string().into()))
        }
        "ledger_submit" => {
            let params: SubmitParams = params
                .cloned()
                .ok_or_else(|| JsonRpcError::invalid_params("expected {caller, operation}"))
                .and_then(|p| {
                    serde_json::from_value(p)
                        .map_err(|e| JsonRpcError::invalid_params(e.to_string()))
                })?;
            let receipt = submit(state, params)?;
            serde_json::to_value(receipt)
                .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Internal error: {}", e)))
        }
        _ => Err(JsonRpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )),
    }
}

/// Submits an operation and records the outcome in metrics.
fn submit(state: &AppState, params: SubmitParams) -> Result<Receipt, JsonRpcError> {
    let op_name = params.operation.name();
    let timer = state.metrics.operation_latency_seconds.start_timer();
    let result = state.ledger.submit(params.caller, params.operation);
    timer.observe_duration();

    match result {
        Ok(receipt) => {
            state
                .metrics
                .operations_committed_total
                .with_label_values(&[op_name])
                .inc();
            // Set under the ledger lock so the gauge never moves backwards.
            state
                .ledger
                .read_at(|_, seq| state.metrics.ledger_sequence.set(seq as i64));
            Ok(receipt)
        }
        Err(e) => {
            state
                .metrics
                .operations_rejected_total
                .with_label_values(&[e.kind()])
                .inc();
            Err(e.into())
        }
    }
}

/// Reads positional parameter `idx` as an address.
fn address_param(
    params: Option<&serde_json::Value>,
    idx: usize,
    name: &str,
) -> Result<Address, JsonRpcError> {
    let raw = params
        .and_then(|p| p.as_array())
        .and_then(|arr| arr.get(idx))
        .and_then(|v| v.as_str())
        .ok_or_else(|| JsonRpcError::invalid_params(format!("expected {} at position {}", name, idx)))?;

    raw.parse()
        .map_err(|e| JsonRpcError::invalid_params(format!("{}: {}", name, e)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tally_ledger::Ledger;
    use tower::ServiceExt;

    fn owner() -> Address {
        Address::from_low_u64(1)
    }

    fn alice() -> Address {
        Address::from_low_u64(2)
    }

    fn bob() -> Address {
        Address::from_low_u64(3)
    }

    /// Creates a test AppState with 1,000 base units credited to `owner()`.
    fn test_app_state() -> AppState {
        let ledger = Ledger::new("Tally Token", "TLY", 18, Amount::from(1_000u64), owner());
        AppState {
            version: "0.1.0-test".into(),
            ledger: SharedLedger::new(ledger),
            metrics: Arc::new(crate::metrics::NodeMetrics::new()),
        }
    }

    /// Sends a GET request and returns the (status, body_bytes).
    async fn get(router: &Router, path: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder().uri(path).body(Body::empty()).unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        (status, body)
    }

    /// Sends a JSON-RPC request and returns the decoded response.
    async fn rpc(router: &Router, method: &str, params: serde_json::Value) -> JsonRpcResponse {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1,
        });
        let req = Request::builder()
            .method("POST")
            .uri("/rpc")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn submit_op(router: &Router, caller: Address, op: serde_json::Value) -> JsonRpcResponse {
        rpc(
            router,
            "ledger_submit",
            serde_json::json!({ "caller": caller, "operation": op }),
        )
        .await
    }

    // -- REST ----------------------------------------------------------------

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn token_endpoint_reports_metadata() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/token").await;

        assert_eq!(status, StatusCode::OK);
        let resp: TokenResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.symbol, "TLY");
        assert_eq!(resp.decimals, 18);
        assert_eq!(resp.total_supply, Amount::from(1_000u64));
        assert_eq!(resp.owner, owner());
    }

    #[tokio::test]
    async fn account_endpoint_returns_zero_for_unknown() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, &format!("/accounts/{}", alice())).await;

        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["balance"], "0");
    }

    #[tokio::test]
    async fn account_endpoint_rejects_bad_address() {
        let router = create_router(test_app_state());
        let (status, body) = get(&router, "/accounts/not-an-address").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let resp: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert!(resp.error.contains("0x"));
    }

    #[tokio::test]
    async fn status_tracks_sequence() {
        let state = test_app_state();
        let router = create_router(state.clone());
        submit_op(
            &router,
            owner(),
            serde_json::json!({ "op": "transfer", "to": alice(), "amount": "5" }),
        )
        .await;

        let (status, body) = get(&router, "/status").await;
        assert_eq!(status, StatusCode::OK);
        let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.sequence, 1);
        assert_eq!(resp.symbol, "TLY");
        assert!(resp.owned);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sequence_gauge_matches_ledger_after_concurrent_submits() {
        let state = test_app_state();
        let handles: Vec<_> = (0..4u64)
            .map(|i| {
                let state = state.clone();
                tokio::task::spawn_blocking(move || {
                    for _ in 0..50 {
                        let params = SubmitParams {
                            caller: owner(),
                            operation: Operation::Transfer {
                                to: Address::from_low_u64(10 + i),
                                amount: Amount::from(1u64),
                            },
                        };
                        submit(&state, params).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(state.ledger.sequence(), 200);
        assert_eq!(state.metrics.ledger_sequence.get(), 200);
    }

    #[tokio::test]
    async fn status_reports_one_consistent_view() {
        let state = test_app_state();
        let router = create_router(state.clone());
        submit_op(&router, owner(), serde_json::json!({ "op": "renounce_ownership" })).await;

        let (_, body) = get(&router, "/status").await;
        let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.sequence, 1);
        assert!(!resp.owned);
    }

    // -- JSON-RPC ------------------------------------------------------------

    #[tokio::test]
    async fn rpc_submit_transfer_updates_balances() {
        let router = create_router(test_app_state());
        let resp = submit_op(
            &router,
            owner(),
            serde_json::json!({ "op": "transfer", "to": alice(), "amount": "50" }),
        )
        .await;
        assert!(resp.error.is_none());
        let receipt: Receipt = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert_eq!(receipt.sequence, 1);
        assert_eq!(receipt.caller, owner());

        let resp = rpc(&router, "ledger_balanceOf", serde_json::json!([alice()])).await;
        assert_eq!(resp.result.unwrap(), "50");
    }

    #[tokio::test]
    async fn rpc_allowance_flow() {
        let router = create_router(test_app_state());
        submit_op(
            &router,
            owner(),
            serde_json::json!({ "op": "approve", "spender": alice(), "amount": "100" }),
        )
        .await;

        let resp = submit_op(
            &router,
            alice(),
            serde_json::json!({ "op": "transfer_from", "from": owner(), "to": bob(), "amount": "200" }),
        )
        .await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32012);
        assert_eq!(err.data.unwrap()["kind"], "AllowanceExceeded");

        let resp = submit_op(
            &router,
            alice(),
            serde_json::json!({ "op": "transfer_from", "from": owner(), "to": bob(), "amount": "60" }),
        )
        .await;
        assert!(resp.error.is_none());

        let resp = rpc(&router, "ledger_allowance", serde_json::json!([owner(), alice()])).await;
        assert_eq!(resp.result.unwrap(), "40");

        let (_, body) = get(&router, &format!("/allowances/{}/{}", owner(), alice())).await;
        let allowance: AllowanceResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(allowance.amount, Amount::from(40u64));
    }

    #[tokio::test]
    async fn rpc_unauthorized_mint_is_reported_and_counted() {
        let state = test_app_state();
        let router = create_router(state.clone());

        let resp = submit_op(
            &router,
            alice(),
            serde_json::json!({ "op": "mint", "to": alice(), "amount": "1" }),
        )
        .await;
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32017);
        assert_eq!(err.data.unwrap()["kind"], "Unauthorized");

        let text = state.metrics.encode().unwrap();
        assert!(text.contains("tally_operations_rejected_total{kind=\"Unauthorized\"} 1"));
        assert_eq!(state.ledger.sequence(), 0);
    }

    #[tokio::test]
    async fn rpc_renounce_then_privileged_calls_fail() {
        let router = create_router(test_app_state());
        let resp = submit_op(&router, owner(), serde_json::json!({ "op": "renounce_ownership" })).await;
        assert!(resp.error.is_none());

        let resp = rpc(&router, "ledger_owner", serde_json::json!([])).await;
        assert_eq!(resp.result.unwrap(), Address::ZERO.to_hex());

        let resp = submit_op(
            &router,
            Address::ZERO,
            serde_json::json!({ "op": "transfer_ownership", "new_owner": alice() }),
        )
        .await;
        assert_eq!(resp.error.unwrap().code, -32017);
    }

    #[tokio::test]
    async fn rpc_metadata_methods() {
        let router = create_router(test_app_state());
        assert_eq!(
            rpc(&router, "ledger_name", serde_json::json!([])).await.result.unwrap(),
            "Tally Token"
        );
        assert_eq!(
            rpc(&router, "ledger_decimals", serde_json::json!([])).await.result.unwrap(),
            18
        );
        assert_eq!(
            rpc(&router, "ledger_totalSupply", serde_json::json!([])).await.result.unwrap(),
            "1000"
        );
    }

    #[tokio::test]
    async fn rpc_bad_params_and_unknown_method() {
        let router = create_router(test_app_state());

        let resp = rpc(&router, "ledger_balanceOf", serde_json::json!(["0x12"])).await;
        assert_eq!(resp.error.unwrap().code, -32602);

        let resp = submit_op(&router, owner(), serde_json::json!({ "op": "transfer", "to": bob(), "amount": "-3" })).await;
        assert_eq!(resp.error.unwrap().code, -32602);

        let resp = rpc(&router, "ledger_selfDestruct", serde_json::json!([])).await;
        assert_eq!(resp.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn rpc_invalid_version_returns_error() {
        let router = create_router(test_app_state());
        let body = serde_json::json!({ "jsonrpc": "1.0", "method": "ledger_name", "id": 7 });
        let req = Request::builder()
            .method("POST")
            .uri("/rpc")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let resp: JsonRpcResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(resp.error.unwrap().code, -32600);
        assert_eq!(resp.id, 7);
    }
}
