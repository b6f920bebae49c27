// 🌐 HTTP Gateway
// Routes + request binding onto the five ledger functions.
//
// The gateway owns the store handle (no global session) and the event polling
// endpoint. It holds no ledger logic of its own.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::chaincode::{execute, Function};
use crate::config::{GatewayConfig, SharedStore};
use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::ledger::LedgerInfo;
use crate::records::{CollateralInfo, RecordType};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(store: SharedStore, config: GatewayConfig) -> Self {
        AppState {
            store,
            config: Arc::new(config),
        }
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
            code: None,
        }
    }
}

/// LedgerError → HTTP status + JSON error body
pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::Encoding(_) | LedgerError::Decoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = ApiResponse {
            success: false,
            data: serde_json::Value::Null,
            error: Some(self.0.to_string()),
            code: Some(self.0.code()),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerForm {
    pub name: String,
    pub id: String,
    pub code: String,
    #[serde(rename = "type")]
    pub customer_type: String,
    pub registered_capital: String,
    pub legal_person: String,
    pub founded_date: String,
    pub business_term_date: String,
    pub approval_date: String,
    pub industry: String,
}

/// Single collateral item (form posts carry one pair)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollateralForm {
    pub name: String,
    pub collateral_id: String,
    pub collateral_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectForm {
    pub name: String,
    pub project_name: String,
    pub project_id: String,
    #[serde(rename = "type")]
    pub project_type: String,
    pub industry: String,
    pub approval_date: String,
    pub approved: String,
    pub has_limited_partner: String,
    pub has_own_funds_investment: String,
    pub bond_amount: String,
    pub investee_company_type: String,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    #[serde(default)]
    pub after: i64,
    pub customer: Option<String>,
}

/// Write acknowledgement
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Submitted {
    tx_id: String,
    event: Option<LedgerEvent>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChainInfo {
    channel: String,
    chaincode: String,
    ledger: LedgerInfo,
}

// ============================================================================
// Invocation helpers
// ============================================================================

fn submit(state: &AppState, function: Function, args: Vec<String>) -> ApiResult<Submitted> {
    let response = execute(state.store.as_ref(), function, &args)?;
    tracing::info!(function = %function, tx_id = %response.tx_id, "transaction submitted");
    Ok(Json(ApiResponse::ok(Submitted {
        tx_id: response.tx_id,
        event: response.event,
    })))
}

fn query(state: &AppState, function: Function, args: Vec<String>) -> ApiResult<serde_json::Value> {
    let response = execute(state.store.as_ref(), function, &args)?;
    Ok(Json(ApiResponse::ok(response.payload_json()?)))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /getChainInfo - ledger height and latest transaction
async fn chain_info(State(state): State<AppState>) -> ApiResult<ChainInfo> {
    let ledger = state.store.info()?;
    Ok(Json(ApiResponse::ok(ChainInfo {
        channel: state.config.ledger.channel.clone(),
        chaincode: state.config.ledger.chaincode.clone(),
        ledger,
    })))
}

/// POST /addCustomerInfo
async fn add_customer(State(state): State<AppState>, Form(req): Form<CustomerForm>) -> ApiResult<Submitted> {
    submit(
        &state,
        Function::AddCustomerInfo,
        vec![
            req.name,
            req.id,
            req.code,
            req.customer_type,
            req.registered_capital,
            req.legal_person,
            req.founded_date,
            req.business_term_date,
            req.approval_date,
            req.industry,
        ],
    )
}

/// POST /addCollateralInfo - replaces the collateral list with this single item
async fn add_collateral(
    State(state): State<AppState>,
    Form(req): Form<CollateralForm>,
) -> ApiResult<Submitted> {
    submit(
        &state,
        Function::AddCollateralInfo,
        vec![req.name, req.collateral_id, req.collateral_name],
    )
}

/// POST /api/customers/:name/collaterals - full collateral set as JSON
async fn put_collaterals(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(items): Json<Vec<CollateralInfo>>,
) -> ApiResult<Submitted> {
    let mut args = Vec::with_capacity(1 + items.len() * 2);
    args.push(name);
    for item in items {
        args.push(item.collateral_id);
        args.push(item.collateral_name);
    }
    submit(&state, Function::AddCollateralInfo, args)
}

/// POST /addProjectInfo
async fn add_project(State(state): State<AppState>, Form(req): Form<ProjectForm>) -> ApiResult<Submitted> {
    submit(
        &state,
        Function::AddProjectInfo,
        vec![
            req.name,
            req.project_name,
            req.project_id,
            req.project_type,
            req.industry,
            req.approval_date,
            req.approved,
            req.has_limited_partner,
            req.has_own_funds_investment,
            req.bond_amount,
            req.investee_company_type,
        ],
    )
}

/// GET /getCustomerInfo?name=
async fn get_customer(State(state): State<AppState>, Query(q): Query<NameQuery>) -> ApiResult<serde_json::Value> {
    query(&state, Function::GetCustomerInfo, vec![q.name])
}

/// GET /api/customers/:name
async fn get_customer_by_path(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<serde_json::Value> {
    query(&state, Function::GetCustomerInfo, vec![name])
}

async fn history_customer(State(state): State<AppState>, Query(q): Query<NameQuery>) -> ApiResult<serde_json::Value> {
    query(&state, Function::GetHistoryCustomerInfo, vec![q.name])
}

async fn history_collateral(
    State(state): State<AppState>,
    Query(q): Query<NameQuery>,
) -> ApiResult<serde_json::Value> {
    query(&state, Function::GetHistoryCollateralInfo, vec![q.name])
}

async fn history_project(State(state): State<AppState>, Query(q): Query<NameQuery>) -> ApiResult<serde_json::Value> {
    query(&state, Function::GetHistoryProjectInfo, vec![q.name])
}

/// GET /api/customers/:name/history/:record (record: customer | collateral | project)
async fn history_by_path(
    State(state): State<AppState>,
    Path((name, record)): Path<(String, String)>,
) -> ApiResult<serde_json::Value> {
    let record_type = record.parse::<RecordType>()?;
    let function = Function::ALL
        .into_iter()
        .find(|f| f.history_of() == Some(record_type))
        .ok_or_else(|| LedgerError::validation(format!("no history function for {}", record_type)))?;
    query(&state, function, vec![name])
}

/// GET /api/events?after=<seq>&customer=<name> - poll committed transactions
async fn poll_events(State(state): State<AppState>, Query(q): Query<EventQuery>) -> ApiResult<Vec<LedgerEvent>> {
    let events = state
        .store
        .events_after(q.after, q.customer.as_deref(), state.config.event_page_size)?;
    Ok(Json(ApiResponse::ok(events)))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/events", get(poll_events))
        .route("/customers/:name", get(get_customer_by_path))
        .route("/customers/:name/collaterals", post(put_collaterals))
        .route("/customers/:name/history/:record", get(history_by_path))
        .with_state(state.clone());

    // Function-named routes kept for existing clients
    Router::new()
        .route("/getChainInfo", get(chain_info))
        .route("/addCustomerInfo", post(add_customer))
        .route("/addCollateralInfo", post(add_collateral))
        .route("/addProjectInfo", post(add_project))
        .route("/getCustomerInfo", get(get_customer))
        .route("/getHistoryCustomerInfo", get(history_customer))
        .route("/getHistoryCollateralInfo", get(history_collateral))
        .route("/getHistoryProjectInfo", get(history_project))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const CUSTOMER_FORM: &str = "name=Acme&id=CUST-001&code=9131A&type=LLC&registeredCapital=5000000\
        &legalPerson=Li%20Wei&foundedDate=2012-04-01&businessTermDate=2042-03-31\
        &approvalDate=2019-06-18&industry=Manufacturing";

    fn app() -> Router {
        router(AppState::new(Arc::new(MemoryStore::new()), GatewayConfig::default()))
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), get_req("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_add_and_get_customer() {
        let app = app();
        let (status, body) = send(&app, form("/addCustomerInfo", CUSTOMER_FORM)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["txId"].is_string());
        assert_eq!(body["data"]["event"]["function"], "addCustomerInfo");

        let (status, body) = send(&app, get_req("/getCustomerInfo?name=Acme")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Acme");
        assert_eq!(body["data"]["customerInfo"]["legalPerson"], "Li Wei");
        assert_eq!(body["data"]["collateralInfo"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let app = app();

        let (status, body) = send(&app, get_req("/getCustomerInfo?name=Ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, body) = send(&app, get_req("/getCustomerInfo")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(&app, form("/addCollateralInfo", "name=Ghost&collateralId=C1&collateralName=Land")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_collateral_replacement_and_history() {
        let app = app();
        send(&app, form("/addCustomerInfo", CUSTOMER_FORM)).await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/customers/Acme/collaterals")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"[{"collateralId":"C1","collateralName":"Land"},{"collateralId":"C2","collateralName":"Building"}]"#,
            ))
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, form("/addCollateralInfo", "name=Acme&collateralId=C3&collateralName=Equipment")).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, get_req("/api/customers/Acme")).await;
        assert_eq!(body["data"]["collateralInfo"].as_array().unwrap().len(), 1);

        let (_, body) = send(&app, get_req("/getHistoryCollateralInfo?name=Acme")).await;
        let history = body["data"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["value"][0]["collateralId"], "C3");
        assert_eq!(history[1]["value"][1]["collateralName"], "Building");

        let (_, same) = send(&app, get_req("/api/customers/Acme/history/collateral")).await;
        assert_eq!(same["data"], body["data"]);
    }

    #[tokio::test]
    async fn test_chain_info_and_events() {
        let app = app();
        send(&app, form("/addCustomerInfo", CUSTOMER_FORM)).await;
        send(&app, form("/addCustomerInfo", &CUSTOMER_FORM.replace("name=Acme", "name=Globex"))).await;

        let (_, body) = send(&app, get_req("/getChainInfo")).await;
        assert_eq!(body["data"]["ledger"]["height"], 2);
        assert_eq!(body["data"]["chaincode"], "assetscc");

        let (_, body) = send(&app, get_req("/api/events?after=0")).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, get_req("/api/events?after=0&customer=Globex")).await;
        let events = body["data"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["sequence"], 2);

        let (_, body) = send(&app, get_req("/api/events?after=2")).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_customer_events_reachable_past_a_full_page() {
        let config = GatewayConfig {
            event_page_size: 2,
            ..GatewayConfig::default()
        };
        let app = router(AppState::new(Arc::new(MemoryStore::new()), config));
        for name in ["A1", "A2", "A3", "Globex"] {
            let body = CUSTOMER_FORM.replace("name=Acme", &format!("name={}", name));
            let (status, _) = send(&app, form("/addCustomerInfo", &body)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = send(&app, get_req("/api/events?after=0")).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (_, body) = send(&app, get_req("/api/events?after=0&customer=Globex")).await;
        let events = body["data"].as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["sequence"], 4);
        assert_eq!(events[0]["keys"][0], "CustomerInfo/Globex");
    }

    #[tokio::test]
    async fn test_history_by_path_matches_function_routes() {
        let app = app();
        send(&app, form("/addCustomerInfo", CUSTOMER_FORM)).await;

        let (status, by_path) = send(&app, get_req("/api/customers/Acme/history/customer")).await;
        assert_eq!(status, StatusCode::OK);
        let (_, by_function) = send(&app, get_req("/getHistoryCustomerInfo?name=Acme")).await;
        assert_eq!(by_path["data"], by_function["data"]);
        assert_eq!(by_path["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_history_record_type() {
        let (status, _) = send(&app(), get_req("/api/customers/Acme/history/loans")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
