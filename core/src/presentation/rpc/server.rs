// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Binary RPC transport.
//!
//! One length-prefixed frame per request and per response, carrying a JSON
//! envelope: `{op, token, body}` in, `{ok, body}` or `{ok, error{kind,
//! message}}` out. Operations mirror the HTTP surface one-to-one through
//! the shared facade.

use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use crate::application::listing_service::ListTarget;
use crate::domain::error::ServiceError;
use crate::domain::principal::Principal;
use crate::presentation::api::AppState;
use crate::presentation::auth::principal_from_token;
use crate::presentation::dto::PageQuery;
use crate::presentation::ops;
use crate::presentation::rpc::framing::{FrameCodec, FrameError};

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub op: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub body: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct RpcErrorBody {
    pub kind: String,
    pub message: String,
}

impl RpcResponse {
    fn success(body: Value) -> Self {
        Self {
            ok: true,
            body: Some(body),
            error: None,
        }
    }

    fn failure(err: &ServiceError) -> Self {
        Self {
            ok: false,
            body: None,
            error: Some(RpcErrorBody {
                kind: err.code().to_string(),
                message: err.to_string(),
            }),
        }
    }
}

/// Accept loop; one detached task per connection.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "binary RPC listening");
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!(?peer, "rpc connection accepted");
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, state).await {
                warn!(?peer, %err, "rpc connection closed with error");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, state: Arc<AppState>) -> Result<(), FrameError> {
    let mut framed = Framed::new(stream, FrameCodec::new());

    while let Some(frame) = framed.next().await {
        let frame = frame?;
        let response = handle_frame(&state, &frame).await;
        let payload = serde_json::to_vec(&response)
            .unwrap_or_else(|_| br#"{"ok":false,"error":{"kind":"INTERNAL","message":"encode failure"}}"#.to_vec());
        framed.send(Bytes::from(payload)).await?;
    }
    Ok(())
}

async fn handle_frame(state: &AppState, frame: &[u8]) -> RpcResponse {
    let request: RpcRequest = match serde_json::from_slice(frame) {
        Ok(request) => request,
        Err(err) => {
            return RpcResponse::failure(&ServiceError::InvalidArguments(format!(
                "undecodable request envelope: {err}"
            )))
        }
    };

    match dispatch(state, request).await {
        Ok(body) => RpcResponse::success(body),
        Err(err) => RpcResponse::failure(&err),
    }
}

fn authenticate(token: Option<&str>) -> Result<Principal, ServiceError> {
    let token =
        token.ok_or_else(|| ServiceError::Unauthorized("missing bearer token".to_string()))?;
    principal_from_token(token)
}

fn decode_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ServiceError> {
    serde_json::from_value(body)
        .map_err(|err| ServiceError::InvalidArguments(format!("bad request body: {err}")))
}

fn encode<T: Serialize>(value: T) -> Result<Value, ServiceError> {
    serde_json::to_value(value)
        .map_err(|err| ServiceError::Internal(format!("failed to encode response: {err}")))
}

/// Listing envelope for the paged ops: the target is a string and parses
/// into a [`ListTarget`] or fails with `INVALID_TARGET`.
#[derive(Deserialize)]
struct ListBody {
    #[serde(default)]
    target: String,
    #[serde(with = "crate::presentation::dto::id_string")]
    id: i64,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    size: Option<u32>,
}

impl ListBody {
    fn page_query(&self) -> PageQuery {
        let defaults = PageQuery::default();
        PageQuery {
            page: self.page.unwrap_or(defaults.page),
            size: self.size.unwrap_or(defaults.size),
        }
    }
}

#[derive(Deserialize)]
struct GetReviewBody {
    #[serde(with = "crate::presentation::dto::id_string")]
    review_id: i64,
}

async fn dispatch(state: &AppState, request: RpcRequest) -> Result<Value, ServiceError> {
    let principal = authenticate(request.token.as_deref())?;

    match request.op.as_str() {
        "review.create" => {
            let body = decode_body(request.body)?;
            encode(ops::create_review(state, &principal, body).await?)
        }
        "review.get" => {
            let body: GetReviewBody = decode_body(request.body)?;
            encode(ops::get_review(state, body.review_id).await?)
        }
        "review.list" => {
            let body: ListBody = decode_body(request.body)?;
            let target: ListTarget = body.target.parse()?;
            let page = body.page_query();
            match target {
                // Status listings stay operations-only.
                ListTarget::Status => encode(
                    ops::list_reviews_by_status(state, &principal, body.id as i16, page).await?,
                ),
                other => encode(ops::list_reviews(state, other, body.id, page).await?),
            }
        }
        "review.reply" => {
            let body = decode_body(request.body)?;
            encode(ops::reply_review(state, &principal, body).await?)
        }
        "review.audit" => {
            let body = decode_body(request.body)?;
            encode(ops::audit_review(state, &principal, body).await?)
        }
        "review.appeal" => {
            let body = decode_body(request.body)?;
            encode(ops::appeal_review(state, &principal, body).await?)
        }
        "appeal.audit" => {
            let body = decode_body(request.body)?;
            encode(ops::audit_appeal(state, &principal, body).await?)
        }
        "appeal.list_by_status" => {
            let body: ListBody = decode_body(request.body)?;
            encode(
                ops::list_appeals_by_status(state, &principal, body.id as i16, body.page_query())
                    .await?,
            )
        }
        "agent.process" => {
            let body = decode_body(request.body)?;
            encode(ops::agent_process(state, &principal, body).await?)
        }
        "agent.call_tool" => {
            let body = decode_body(request.body)?;
            encode(ops::agent_call_tool(state, &principal, body).await?)
        }
        other => Err(ServiceError::NotFound(format!("unknown rpc op: {other}"))),
    }
}
