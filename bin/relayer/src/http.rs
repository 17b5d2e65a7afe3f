//! HTTP ingress: a thin warp layer over the lifecycle API.

use std::convert::Infallible;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tbtc_relayer_db::types::{AuditEventType, AuditFilter};
use tbtc_relayer_lifecycle::reveal::RevealRequest;
use tbtc_relayer_lifecycle::{LifecycleApi, LifecycleError};
use tracing::warn;
use warp::http::StatusCode;
use warp::{Filter, Reply};

/// Assembles all routes.
pub(crate) fn routes(
    api: Arc<LifecycleApi>,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let reveal = warp::path!("api" / String / "reveal")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_api(api.clone()))
        .and_then(handle_reveal);

    let deposit_status = warp::path!("api" / String / "deposit" / String)
        .and(warp::get())
        .and(with_api(api.clone()))
        .and_then(handle_deposit_status);

    let audit_logs = warp::path!("api" / String / "audit-logs")
        .and(warp::get())
        .and(warp::query::<AuditQuery>())
        .and(with_api(api))
        .and_then(handle_audit_logs);

    let health = warp::path!("status")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "status": "ok" })));

    reveal.or(deposit_status).or(audit_logs).or(health)
}

fn with_api(
    api: Arc<LifecycleApi>,
) -> impl Filter<Extract = (Arc<LifecycleApi>,), Error = Infallible> + Clone {
    warp::any().map(move || api.clone())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuditQuery {
    event_type: Option<String>,
    deposit_id: Option<String>,
}

fn error_reply(status: StatusCode, body: serde_json::Value) -> warp::reply::Response {
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

fn lifecycle_error_reply(error: LifecycleError) -> warp::reply::Response {
    match error {
        LifecycleError::Validation(fields) => error_reply(
            StatusCode::BAD_REQUEST,
            json!({
                "success": false,
                "error": "validation failed",
                "details": fields,
            }),
        ),
        LifecycleError::UnknownChain(chain) => error_reply(
            StatusCode::NOT_FOUND,
            json!({
                "success": false,
                "error": format!("unknown chain {chain}"),
            }),
        ),
        LifecycleError::Handler(e) => {
            warn!(err = %e, "handler failure surfaced to API");
            error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "success": false,
                    "error": e.to_string(),
                }),
            )
        }
        LifecycleError::Db(e) => {
            warn!(err = %e, "store failure surfaced to API");
            error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "success": false,
                    "error": "internal storage error",
                }),
            )
        }
    }
}

async fn handle_reveal(
    chain_name: String,
    request: RevealRequest,
    api: Arc<LifecycleApi>,
) -> Result<warp::reply::Response, Infallible> {
    api.record_api_request(&chain_name, "reveal", None);

    Ok(match api.reveal_deposit(&chain_name, request).await {
        Ok(outcome) => warp::reply::json(&json!({
            "success": true,
            "depositId": outcome.deposit_id,
            "message": "deposit initialized",
            "receipt": outcome.receipt,
        }))
        .into_response(),
        Err(e) => lifecycle_error_reply(e),
    })
}

async fn handle_deposit_status(
    chain_name: String,
    deposit_id: String,
    api: Arc<LifecycleApi>,
) -> Result<warp::reply::Response, Infallible> {
    api.record_api_request(&chain_name, "deposit-status", Some(deposit_id.as_str()));

    Ok(match api.get_deposit_status(&chain_name, &deposit_id) {
        Ok(Some(status)) => warp::reply::json(&json!({
            "success": true,
            "depositId": deposit_id,
            "status": status,
        }))
        .into_response(),
        Ok(None) => error_reply(
            StatusCode::NOT_FOUND,
            json!({
                "success": false,
                "error": format!("deposit {deposit_id} not found on {chain_name}"),
            }),
        ),
        Err(e) => lifecycle_error_reply(e),
    })
}

async fn handle_audit_logs(
    chain_or_all: String,
    query: AuditQuery,
    api: Arc<LifecycleApi>,
) -> Result<warp::reply::Response, Infallible> {
    let event_type = match &query.event_type {
        Some(raw) => {
            match serde_json::from_value::<AuditEventType>(serde_json::Value::String(
                raw.clone(),
            )) {
                Ok(ty) => Some(ty),
                Err(_) => {
                    return Ok(error_reply(
                        StatusCode::BAD_REQUEST,
                        json!({
                            "success": false,
                            "error": format!("unknown event type {raw}"),
                        }),
                    ));
                }
            }
        }
        None => None,
    };

    let filter = AuditFilter {
        chain_name: (chain_or_all != "all").then_some(chain_or_all),
        deposit_id: query.deposit_id,
        event_type,
    };

    Ok(match api.get_audit_events(&filter) {
        Ok(events) => warp::reply::json(&json!({
            "success": true,
            "events": events,
        }))
        .into_response(),
        Err(e) => lifecycle_error_reply(e),
    })
}
