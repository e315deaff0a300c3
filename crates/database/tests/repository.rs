use chrono::{DateTime, Duration, TimeZone, Utc};
use configuration::DatabaseSettings;
use core_types::{Crossover, Position, RatioObservation, SignalRecord, SignalState, SignalType};
use database::{CalculationStore, DbRepository, SignalStateStore, ThresholdCalculation};

async fn repository(url: &str) -> DbRepository {
    let settings = DatabaseSettings {
        url: url.to_string(),
        max_connections: 1,
    };
    let pool = database::connect(&settings).await.unwrap();
    database::run_migrations(&pool).await.unwrap();
    DbRepository::new(pool)
}

fn at(hour: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap() + Duration::hours(hour)
}

fn entry(hour: i64) -> (SignalState, SignalRecord) {
    let observation = RatioObservation::new(at(hour), 1.08, 1.02);
    let mut state = SignalState::default();
    state.observe(true, at(hour));
    state.hold(Position::Qqq, at(hour));
    let record = SignalRecord::new(
        SignalType::Entry,
        Position::Cash,
        Position::Qqq,
        "N crossed above V, buying QQQ",
        Crossover::Up,
        &observation,
    );
    (state, record)
}

#[tokio::test]
async fn first_load_persists_default_state() {
    let repo = repository("sqlite::memory:").await;

    let state = repo.load().await.unwrap();
    assert_eq!(state, SignalState::default());

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM signal_state")
        .fetch_one(repo.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn save_round_trips_state_and_logs_record() {
    let repo = repository("sqlite::memory:").await;
    let (state, record) = entry(1);

    repo.save(&state, Some(&record)).await.unwrap();

    assert_eq!(repo.load().await.unwrap(), state);
    let history = repo.recent_signals(10).await.unwrap();
    assert_eq!(history, vec![record]);
}

#[tokio::test]
async fn state_table_holds_a_single_row() {
    let repo = repository("sqlite::memory:").await;
    repo.load().await.unwrap();

    let second = sqlx::query("INSERT INTO signal_state (id, last_n_above_v) VALUES (2, 0)")
        .execute(repo.pool())
        .await;
    assert!(second.is_err());
}

#[tokio::test]
async fn failed_log_insert_rolls_back_state() {
    let repo = repository("sqlite::memory:").await;
    let (state, record) = entry(1);
    repo.save(&state, Some(&record)).await.unwrap();

    // Re-using the signal id violates the primary key after the state row has
    // already been written inside the transaction.
    let mut later = state;
    later.observe(false, at(2));
    later.hold(Position::Cash, at(2));
    assert!(repo.save(&later, Some(&record)).await.is_err());

    assert_eq!(repo.load().await.unwrap(), state);
    assert_eq!(repo.recent_signals(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn recent_signals_are_newest_first_and_limited() {
    let repo = repository("sqlite::memory:").await;
    let mut ids = Vec::new();
    for hour in 1..=3 {
        let (state, record) = entry(hour);
        ids.push(record.signal_id);
        repo.save(&state, Some(&record)).await.unwrap();
    }

    let history = repo.recent_signals(2).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].signal_id, ids[2]);
    assert_eq!(history[1].signal_id, ids[1]);
}

#[tokio::test]
async fn reset_restores_default_but_keeps_history() {
    let repo = repository("sqlite::memory:").await;
    let (state, record) = entry(1);
    repo.save(&state, Some(&record)).await.unwrap();

    let reset = repo.reset().await.unwrap();
    assert_eq!(reset, SignalState::default());
    assert_eq!(repo.load().await.unwrap(), SignalState::default());
    assert_eq!(repo.recent_signals(5).await.unwrap().len(), 1);
}

#[tokio::test]
async fn latest_calculation_wins() {
    let repo = repository("sqlite::memory:").await;
    assert!(repo.latest_calculation().await.unwrap().is_none());

    let older = ThresholdCalculation {
        n_values: vec![1.0, 1.1],
        v_value: 1.05,
        window: 2,
        last_updated: at(1),
    };
    let newer = ThresholdCalculation {
        n_values: vec![1.1, 1.2, 1.3],
        v_value: 1.2,
        window: 3,
        last_updated: at(5),
    };
    repo.save_calculation(&newer).await.unwrap();
    repo.save_calculation(&older).await.unwrap();

    assert_eq!(repo.latest_calculation().await.unwrap(), Some(newer));
}

#[tokio::test]
async fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("state.db").display());
    let (state, record) = entry(1);

    {
        let repo = repository(&url).await;
        repo.save(&state, Some(&record)).await.unwrap();
        repo.pool().close().await;
    }

    let reopened = repository(&url).await;
    assert_eq!(reopened.load().await.unwrap(), state);
    assert_eq!(reopened.recent_signals(1).await.unwrap()[0].signal_id, record.signal_id);
}
