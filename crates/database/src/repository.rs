use crate::DbError;
use crate::store::{CalculationStore, SignalStateStore, ThresholdCalculation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{Crossover, Position, SignalRecord, SignalState, SignalType};
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::{Row, Transaction};
use std::str::FromStr;
use uuid::Uuid;

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: SqlitePool,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fetches the singleton state row, inserting the default first if the
    /// table is still empty.
    pub async fn load_state(&self) -> Result<SignalState, DbError> {
        sqlx::query("INSERT OR IGNORE INTO signal_state (id, last_n_above_v) VALUES (1, 0)")
            .execute(&self.pool)
            .await?;

        let row = sqlx::query(
            r#"
            SELECT last_n_above_v, last_check_time, last_active_signal, last_signal_time
            FROM signal_state
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let last_active_signal = row
            .try_get::<Option<String>, _>("last_active_signal")?
            .map(|raw| Position::from_str(&raw))
            .transpose()?;

        Ok(SignalState {
            last_n_above_v: row.try_get("last_n_above_v")?,
            last_check_time: row.try_get("last_check_time")?,
            last_active_signal,
            last_signal_time: row.try_get("last_signal_time")?,
        })
    }

    /// Writes the state row and the optional signal record within a single
    /// transaction for atomicity.
    pub async fn save_state(
        &self,
        state: &SignalState,
        record: Option<&SignalRecord>,
    ) -> Result<(), DbError> {
        let mut tx: Transaction<Sqlite> = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO signal_state (id, last_n_above_v, last_check_time, last_active_signal, last_signal_time)
            VALUES (1, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                last_n_above_v = excluded.last_n_above_v,
                last_check_time = excluded.last_check_time,
                last_active_signal = excluded.last_active_signal,
                last_signal_time = excluded.last_signal_time
            "#,
        )
        .bind(state.last_n_above_v)
        .bind(state.last_check_time)
        .bind(state.last_active_signal.map(|p| p.as_str()))
        .bind(state.last_signal_time)
        .execute(&mut *tx) // Note: must use the transaction object `tx` here
        .await?;

        if let Some(record) = record {
            sqlx::query(
                r#"
                INSERT INTO signal_log (
                    signal_id, signal_type, from_position, to_position, reason,
                    ratio, threshold, crossover, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(record.signal_id.to_string())
            .bind(record.signal_type.as_str())
            .bind(record.from.as_str())
            .bind(record.to.as_str())
            .bind(&record.reason)
            .bind(record.ratio)
            .bind(record.threshold)
            .bind(record.crossover.as_str())
            .bind(record.timestamp)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(
            position = %state.current_position(),
            logged = record.is_some(),
            "Signal state committed"
        );
        Ok(())
    }

    /// Fetches the last `limit` logged signals, newest first.
    pub async fn get_recent_signals(&self, limit: u32) -> Result<Vec<SignalRecord>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT signal_id, signal_type, from_position, to_position, reason,
                   ratio, threshold, crossover, created_at
            FROM signal_log
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(signal_from_row).collect()
    }

    pub async fn insert_calculation(&self, calculation: &ThresholdCalculation) -> Result<(), DbError> {
        let window = i64::try_from(calculation.window)
            .map_err(|_| DbError::CorruptRow(format!("window {} too large", calculation.window)))?;

        sqlx::query(
            "INSERT INTO calculations (n_values, v_value, window_size, last_updated) VALUES (?, ?, ?, ?)",
        )
        .bind(serde_json::to_string(&calculation.n_values)?)
        .bind(calculation.v_value)
        .bind(window)
        .bind(calculation.last_updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The most recent threshold calculation, if any was ever stored.
    pub async fn get_latest_calculation(&self) -> Result<Option<ThresholdCalculation>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT n_values, v_value, window_size, last_updated
            FROM calculations
            ORDER BY last_updated DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let n_values: String = row.try_get("n_values")?;
        let window: i64 = row.try_get("window_size")?;
        let last_updated: DateTime<Utc> = row.try_get("last_updated")?;
        Ok(Some(ThresholdCalculation {
            n_values: serde_json::from_str(&n_values)?,
            v_value: row.try_get("v_value")?,
            window: usize::try_from(window)
                .map_err(|_| DbError::CorruptRow(format!("negative window {window}")))?,
            last_updated,
        }))
    }
}

fn signal_from_row(row: &SqliteRow) -> Result<SignalRecord, DbError> {
    let signal_id: String = row.try_get("signal_id")?;
    let signal_type: String = row.try_get("signal_type")?;
    let from: String = row.try_get("from_position")?;
    let to: String = row.try_get("to_position")?;
    let crossover: String = row.try_get("crossover")?;

    Ok(SignalRecord {
        signal_id: Uuid::parse_str(&signal_id)
            .map_err(|e| DbError::CorruptRow(format!("signal_id '{signal_id}': {e}")))?,
        signal_type: SignalType::from_str(&signal_type)?,
        from: Position::from_str(&from)?,
        to: Position::from_str(&to)?,
        reason: row.try_get("reason")?,
        ratio: row.try_get("ratio")?,
        threshold: row.try_get("threshold")?,
        crossover: Crossover::from_str(&crossover)?,
        timestamp: row.try_get("created_at")?,
    })
}

#[async_trait]
impl SignalStateStore for DbRepository {
    async fn load(&self) -> Result<SignalState, DbError> {
        self.load_state().await
    }

    async fn save(&self, state: &SignalState, record: Option<&SignalRecord>) -> Result<(), DbError> {
        self.save_state(state, record).await
    }

    async fn reset(&self) -> Result<SignalState, DbError> {
        let state = SignalState::default();
        self.save_state(&state, None).await?;
        tracing::info!("Signal state reset to default");
        Ok(state)
    }

    async fn recent_signals(&self, limit: u32) -> Result<Vec<SignalRecord>, DbError> {
        self.get_recent_signals(limit).await
    }
}

#[async_trait]
impl CalculationStore for DbRepository {
    async fn save_calculation(&self, calculation: &ThresholdCalculation) -> Result<(), DbError> {
        self.insert_calculation(calculation).await
    }

    async fn latest_calculation(&self) -> Result<Option<ThresholdCalculation>, DbError> {
        self.get_latest_calculation().await
    }
}
