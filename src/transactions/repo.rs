use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::transactions::dto::{ListRequest, NewTransactionRequest, UpdateTransactionRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub category: Vec<String>,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Every query below is scoped by `user_id`. A row owned by another user
/// is indistinguishable from a missing row.
pub async fn insert(db: &PgPool, owner_id: Uuid, input: &NewTransactionRequest) -> AppResult<Uuid> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO transactions (user_id, type, amount, category, description, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING id
        "#,
    )
    .bind(owner_id)
    .bind(input.kind)
    .bind(input.amount)
    .bind(&input.category)
    .bind(&input.description)
    .bind(input.date)
    .fetch_one(db)
    .await?;
    Ok(id)
}

pub async fn update(
    db: &PgPool,
    owner_id: Uuid,
    id: Uuid,
    patch: &UpdateTransactionRequest,
) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET type = COALESCE($3::transaction_type, type),
            amount = COALESCE($4::numeric, amount),
            category = COALESCE($5::text[], category),
            description = COALESCE($6::text, description),
            created_at = COALESCE($7::timestamptz, created_at),
            updated_at = now()
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(patch.kind)
    .bind(patch.amount)
    .bind(patch.category.clone())
    .bind(patch.description.clone())
    .bind(patch.date)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("transaction"));
    }
    Ok(())
}

pub async fn delete(db: &PgPool, owner_id: Uuid, id: Uuid) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM transactions
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("transaction"));
    }
    Ok(())
}

pub async fn find_one(db: &PgPool, owner_id: Uuid, id: Uuid) -> AppResult<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, user_id, type, amount, category, description, created_at, updated_at
        FROM transactions
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound("transaction"))
}

/// One page of matching rows, ordered by creation time ascending, plus
/// the total match count for the same filters.
pub async fn list(
    db: &PgPool,
    owner_id: Uuid,
    filter: &ListRequest,
) -> AppResult<(Vec<Transaction>, i64)> {
    let total_count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM transactions
        WHERE user_id = $1
          AND ($2::transaction_type IS NULL OR type = $2)
          AND ($3::text[] IS NULL OR category = $3)
          AND ($4::timestamptz IS NULL OR created_at = $4)
        "#,
    )
    .bind(owner_id)
    .bind(filter.kind)
    .bind(filter.category.clone())
    .bind(filter.created_at)
    .fetch_one(db)
    .await?;

    let offset = (filter.pagination.page - 1) * filter.pagination.page_size;
    let transactions = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, user_id, type, amount, category, description, created_at, updated_at
        FROM transactions
        WHERE user_id = $1
          AND ($2::transaction_type IS NULL OR type = $2)
          AND ($3::text[] IS NULL OR category = $3)
          AND ($4::timestamptz IS NULL OR created_at = $4)
        ORDER BY created_at ASC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(owner_id)
    .bind(filter.kind)
    .bind(filter.category.clone())
    .bind(filter.created_at)
    .bind(filter.pagination.page_size)
    .bind(offset)
    .fetch_all(db)
    .await?;

    Ok((transactions, total_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_type_wire_format_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Income).unwrap(),
            r#""income""#
        );
        assert_eq!(
            serde_json::from_str::<TransactionType>(r#""expense""#).unwrap(),
            TransactionType::Expense
        );
    }

    #[test]
    fn transaction_serializes_with_camel_case_and_type_key() {
        let t = Transaction {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            kind: TransactionType::Income,
            amount: Decimal::new(4250, 2),
            category: vec!["salary".into()],
            description: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "income");
        assert!(json.get("userId").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("kind").is_none());
    }
}
