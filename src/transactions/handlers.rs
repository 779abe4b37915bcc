use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::Json;
use crate::middleware::CurrentUser;
use crate::state::AppState;
use crate::transactions::dto::{
    total_pages, ListRequest, NewTransactionRequest, TransactionPage, UpdateTransactionRequest,
    WriteAck,
};
use crate::transactions::repo;

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", post(add_transaction))
        .route("/transactions/list", post(list_transactions))
        .route(
            "/transactions/:id",
            get(get_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
}

#[instrument(skip(state, payload))]
pub async fn add_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<NewTransactionRequest>,
) -> AppResult<(StatusCode, Json<WriteAck>)> {
    let id = repo::insert(&state.db, user.user_id, &payload).await?;
    info!(user_id = %user.user_id, transaction_id = %id, "transaction added");
    Ok((
        StatusCode::CREATED,
        Json(WriteAck {
            acknowledged: true,
            inserted_id: Some(id),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> AppResult<Json<WriteAck>> {
    repo::update(&state.db, user.user_id, id, &payload).await?;
    info!(user_id = %user.user_id, transaction_id = %id, "transaction updated");
    Ok(Json(WriteAck {
        acknowledged: true,
        inserted_id: Some(id),
    }))
}

#[instrument(skip(state))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WriteAck>> {
    repo::delete(&state.db, user.user_id, id).await?;
    info!(user_id = %user.user_id, transaction_id = %id, "transaction deleted");
    Ok(Json(WriteAck {
        acknowledged: true,
        inserted_id: None,
    }))
}

#[instrument(skip(state))]
pub async fn get_transaction(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<repo::Transaction>> {
    let transaction = repo::find_one(&state.db, user.user_id, id).await?;
    Ok(Json(transaction))
}

#[instrument(skip(state, payload))]
pub async fn list_transactions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ListRequest>,
) -> AppResult<Json<TransactionPage>> {
    payload.validate()?;

    let (transactions, total_count) = repo::list(&state.db, user.user_id, &payload).await?;
    Ok(Json(TransactionPage {
        transactions,
        total_count,
        page: payload.pagination.page,
        page_size: payload.pagination.page_size,
        total_pages: total_pages(total_count, payload.pagination.page_size),
    }))
}
