use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use tally_core::clock::{Clock, SystemClock};
use tally_core::domain::member::{CounterKind, Member, MemberCounters, MemberId, NewMember};
use tally_core::domain::period::MonthPeriod;
use tally_core::domain::reaction::ReactionDelta;
use tally_core::errors::StoreError;
use tally_core::stats::store::MemberStore;

use super::RepositoryError;
use crate::DbPool;

const MEMBER_COLUMNS: &str =
    "id, slack_uid, period, received_likes, received_dislikes, created_at, updated_at";

pub struct SqlMemberRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl SqlMemberRepository {
    pub fn new(pool: DbPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    async fn fetch_by_id<'e, E>(executor: E, id: MemberId) -> Result<Member, StoreError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row = sqlx::query(&format!("SELECT {MEMBER_COLUMNS} FROM member WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(executor)
            .await
            .map_err(RepositoryError::from)?;

        match row {
            Some(ref row) => Ok(row_to_member(row)?),
            None => Err(StoreError::NotFound(format!("member id {}", id.0))),
        }
    }
}

fn decode_err(error: sqlx::Error) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

fn decode_counter(row: &SqliteRow, column: &str) -> Result<u32, RepositoryError> {
    let raw: i64 = row.try_get(column).map_err(decode_err)?;
    u32::try_from(raw)
        .map_err(|_| RepositoryError::Decode(format!("{column} out of range: {raw}")))
}

fn decode_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, RepositoryError> {
    let raw: String = row.try_get(column).map_err(decode_err)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("{column} `{raw}`: {error}")))
}

fn row_to_member(row: &SqliteRow) -> Result<Member, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(decode_err)?;
    let slack_uid: String = row.try_get("slack_uid").map_err(decode_err)?;
    let period_str: String = row.try_get("period").map_err(decode_err)?;
    let period = period_str
        .parse::<MonthPeriod>()
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;

    Ok(Member {
        id: MemberId(id),
        slack_uid,
        period,
        received_likes: decode_counter(row, "received_likes")?,
        received_dislikes: decode_counter(row, "received_dislikes")?,
        created_at: decode_timestamp(row, "created_at")?,
        updated_at: decode_timestamp(row, "updated_at")?,
    })
}

#[async_trait]
impl MemberStore for SqlMemberRepository {
    async fn find_by_id(&self, id: MemberId) -> Result<Member, StoreError> {
        Self::fetch_by_id(&self.pool, id).await
    }

    async fn find_by_identity(
        &self,
        slack_uid: &str,
        period: &MonthPeriod,
    ) -> Result<Member, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM member WHERE slack_uid = ? AND period = ?"
        ))
        .bind(slack_uid)
        .bind(period.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        match row {
            Some(ref row) => Ok(row_to_member(row)?),
            None => Err(StoreError::NotFound(format!("member {slack_uid} in {period}"))),
        }
    }

    async fn create(&self, member: NewMember) -> Result<Member, StoreError> {
        member.validate().map_err(|error| StoreError::Invalid(error.to_string()))?;

        let now = self.clock.now().to_rfc3339();
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let inserted = sqlx::query(
            "INSERT INTO member (slack_uid, period, received_likes, received_dislikes,
                                 created_at, updated_at)
             VALUES (?, ?, 0, 0, ?, ?)",
        )
        .bind(&member.slack_uid)
        .bind(member.period.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        let created = Self::fetch_by_id(&mut *tx, MemberId(inserted.last_insert_rowid())).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        debug!(
            event_name = "db.member.created",
            member_id = created.id.0,
            slack_uid = %created.slack_uid,
            period = %created.period,
            "member record created"
        );
        Ok(created)
    }

    async fn update(&self, id: MemberId, counters: MemberCounters) -> Result<Member, StoreError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let result = sqlx::query(
            "UPDATE member
             SET received_likes = ?, received_dislikes = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(i64::from(counters.received_likes))
        .bind(i64::from(counters.received_dislikes))
        .bind(self.clock.now().to_rfc3339())
        .bind(id.0)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("member id {}", id.0)));
        }

        let updated = Self::fetch_by_id(&mut *tx, id).await?;
        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(updated)
    }

    async fn apply_delta(&self, id: MemberId, delta: ReactionDelta) -> Result<Member, StoreError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        // Claim the write lock before the counters are read.
        let claimed = sqlx::query("UPDATE member SET updated_at = ? WHERE id = ?")
            .bind(self.clock.now().to_rfc3339())
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;
        if claimed.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("member id {}", id.0)));
        }

        let current = Self::fetch_by_id(&mut *tx, id).await?;
        let counters = delta.apply(current.counters());
        sqlx::query("UPDATE member SET received_likes = ?, received_dislikes = ? WHERE id = ?")
            .bind(i64::from(counters.received_likes))
            .bind(i64::from(counters.received_dislikes))
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

        let updated = Self::fetch_by_id(&mut *tx, id).await?;
        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(updated)
    }

    async fn max_by_counter(
        &self,
        period: &MonthPeriod,
        counter: CounterKind,
    ) -> Result<Vec<Member>, StoreError> {
        // Column name comes from a closed enum, never from input.
        let column = counter.as_str();
        let rows: Vec<SqliteRow> = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM member
             WHERE period = ?
               AND {column} = (SELECT MAX({column}) FROM member WHERE period = ?)
             ORDER BY id ASC"
        ))
        .bind(period.to_string())
        .bind(period.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.iter()
            .map(|row| row_to_member(row).map_err(StoreError::from))
            .collect::<Result<Vec<_>, _>>()
    }

    async fn delete(&self, id: MemberId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let result = sqlx::query("DELETE FROM member WHERE id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("member id {}", id.0)));
        }

        tx.commit().await.map_err(RepositoryError::from)?;
        debug!(event_name = "db.member.deleted", member_id = id.0, "member record deleted");
        Ok(())
    }
}
