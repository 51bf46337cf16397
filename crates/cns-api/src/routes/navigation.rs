//! Routes for content navigation.

use axum::extract::{Query, State};
use axum::{
    Json, Router,
    routing::{get, post},
};
use cns_session::application::command_handlers::NavigationOutcome;
use cns_session::application::query_handlers;
use cns_session::domain::commands::{NavigationCommand, NavigationKind};
use cns_structure::domain::node::ContentNode;
use cns_structure::domain::structure::{ContentStructure, SequenceBoundary};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for the per-kind endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRequest {
    /// The process to navigate.
    pub process_id: String,
    /// The learner's session.
    pub session_id: String,
    /// Caller token, echoed in the content-seen notification.
    pub token: String,
}

/// Request body for POST /dispatch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    /// The process to navigate.
    pub process_id: String,
    /// The learner's session.
    pub session_id: String,
    /// Caller token, echoed in the content-seen notification.
    pub token: String,
    /// What to do.
    pub kind: NavigationKind,
}

/// Query parameters for GET /structure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureQuery {
    /// The learner's session.
    pub session_id: String,
    /// The process to inspect.
    pub process_id: String,
}

/// Response body for a request that delivered a node.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    /// Content id of the delivered node.
    pub content_id: String,
    /// Title of the delivered node.
    pub title: String,
    /// Index of the node in its structure.
    pub position: usize,
    /// Set when the request hit an end of the chain.
    pub boundary: Option<SequenceBoundary>,
    /// ID of the published content-seen notification.
    pub event_id: Uuid,
}

/// Response body for a finish request.
#[derive(Debug, Serialize)]
pub struct FinishResponse {
    /// Whether a structure was registered for the key.
    pub removed: bool,
}

/// Response body of any navigation request.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum NavigationResponse {
    /// start, forward, backward, first.
    Content(ContentResponse),
    /// finish.
    Finished(FinishResponse),
}

impl From<NavigationOutcome> for NavigationResponse {
    fn from(outcome: NavigationOutcome) -> Self {
        match outcome {
            NavigationOutcome::Delivered(node) => Self::Content(ContentResponse {
                content_id: node.content_id,
                title: node.title,
                position: node.position.index(),
                boundary: node.boundary,
                event_id: node.event_id,
            }),
            NavigationOutcome::Finished { removed } => Self::Finished(FinishResponse { removed }),
        }
    }
}

/// One node in a structure snapshot.
#[derive(Debug, Serialize)]
pub struct NodeView {
    /// Content id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Whether the node has been left through forward navigation.
    pub visited: bool,
}

impl From<&ContentNode> for NodeView {
    fn from(node: &ContentNode) -> Self {
        Self {
            id: node.id().to_owned(),
            title: node.title().to_owned(),
            visited: node.visited(),
        }
    }
}

/// Response body for GET /structure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureResponse {
    /// The process the structure was built for.
    pub process_id: String,
    /// Index of the current node.
    pub current: Option<usize>,
    /// All nodes in navigation order.
    pub nodes: Vec<NodeView>,
}

impl From<&ContentStructure> for StructureResponse {
    fn from(structure: &ContentStructure) -> Self {
        Self {
            process_id: structure.process_id().to_owned(),
            current: structure.current().map(|node_ref| node_ref.index()),
            nodes: structure.nodes().iter().map(NodeView::from).collect(),
        }
    }
}

async fn run(
    state: &AppState,
    kind: NavigationKind,
    request: NavigationRequest,
) -> Result<Json<NavigationResponse>, ApiError> {
    let command = NavigationCommand::new(
        kind,
        request.session_id,
        request.process_id,
        request.token,
    );

    info!(correlation_id = %command.correlation_id, ?kind, "handling navigation request");

    let outcome = state.engine.handle(&command).await?;

    Ok(Json(outcome.into()))
}

/// POST /start
#[instrument(skip(state, request), fields(session_id = %request.session_id, process_id = %request.process_id))]
async fn start(
    State(state): State<AppState>,
    Json(request): Json<NavigationRequest>,
) -> Result<Json<NavigationResponse>, ApiError> {
    run(&state, NavigationKind::Start, request).await
}

/// POST /forward
#[instrument(skip(state, request), fields(session_id = %request.session_id, process_id = %request.process_id))]
async fn forward(
    State(state): State<AppState>,
    Json(request): Json<NavigationRequest>,
) -> Result<Json<NavigationResponse>, ApiError> {
    run(&state, NavigationKind::Forward, request).await
}

/// POST /backward
#[instrument(skip(state, request), fields(session_id = %request.session_id, process_id = %request.process_id))]
async fn backward(
    State(state): State<AppState>,
    Json(request): Json<NavigationRequest>,
) -> Result<Json<NavigationResponse>, ApiError> {
    run(&state, NavigationKind::Backward, request).await
}

/// POST /first
#[instrument(skip(state, request), fields(session_id = %request.session_id, process_id = %request.process_id))]
async fn first(
    State(state): State<AppState>,
    Json(request): Json<NavigationRequest>,
) -> Result<Json<NavigationResponse>, ApiError> {
    run(&state, NavigationKind::First, request).await
}

/// POST /finish
#[instrument(skip(state, request), fields(session_id = %request.session_id, process_id = %request.process_id))]
async fn finish(
    State(state): State<AppState>,
    Json(request): Json<NavigationRequest>,
) -> Result<Json<NavigationResponse>, ApiError> {
    run(&state, NavigationKind::Finish, request).await
}

/// POST /dispatch
#[instrument(skip(state, request), fields(session_id = %request.session_id, process_id = %request.process_id))]
async fn dispatch(
    State(state): State<AppState>,
    Json(request): Json<DispatchRequest>,
) -> Result<Json<NavigationResponse>, ApiError> {
    let DispatchRequest {
        process_id,
        session_id,
        token,
        kind,
    } = request;
    run(
        &state,
        kind,
        NavigationRequest {
            process_id,
            session_id,
            token,
        },
    )
    .await
}

/// GET /structure
#[instrument(skip(state, query), fields(session_id = %query.session_id, process_id = %query.process_id))]
async fn structure(
    State(state): State<AppState>,
    Query(query): Query<StructureQuery>,
) -> Result<Json<StructureResponse>, ApiError> {
    let structure = query_handlers::get_structure(
        state.engine.registry(),
        &query.session_id,
        &query.process_id,
    )
    .await?;

    Ok(Json(StructureResponse::from(&structure)))
}

/// Returns the router for content navigation.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start))
        .route("/forward", post(forward))
        .route("/backward", post(backward))
        .route("/first", post(first))
        .route("/finish", post(finish))
        .route("/dispatch", post(dispatch))
        .route("/structure", get(structure))
}
