use std::collections::BTreeMap;
use std::sync::Arc;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{error, info};

use records_core::app::OkResponse;
use records_core::observability::{RecordCounts, init_tracing};
use records_core::{
    Config, InMemoryRecordRepo, Record, RecordError, RecordId, RecordService, ServiceBuilder,
    Status, UpdateRecordParams, seed,
};

/// Hammer an in-memory record service from many concurrent workers and
/// print what is left.
#[derive(Debug, Parser)]
#[command(name = "records", version)]
struct Args {
    /// Number of concurrent workers.
    #[arg(long, default_value_t = 8)]
    workers: usize,

    /// Operations per worker.
    #[arg(long, default_value_t = 200)]
    ops: usize,

    /// Row/creation lock wait limit in seconds.
    #[arg(long, env = "RECORDS_LOCK_WAIT_SECS")]
    lock_wait_secs: Option<u64>,

    /// Total tries for a timed-out operation (1 = no retry).
    #[arg(long, env = "RECORDS_RETRY_MAX_ATTEMPTS")]
    retry_max_attempts: Option<u32>,

    /// Delay before the first retry, in milliseconds.
    #[arg(long, env = "RECORDS_RETRY_BASE_DELAY_MS")]
    retry_base_delay_ms: Option<u64>,

    /// Backoff multiplier between retries.
    #[arg(long, env = "RECORDS_RETRY_MULTIPLIER")]
    retry_multiplier: Option<f64>,

    /// Upper bound for a single retry delay, in milliseconds.
    #[arg(long, env = "RECORDS_RETRY_MAX_DELAY_MS")]
    retry_max_delay_ms: Option<u64>,

    /// RNG seed; worker i uses seed + i.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, env = "RECORDS_LOG", default_value = "info")]
    log: String,
}

impl Args {
    /// Defaults overlaid with whatever flags (or their env vars) were given.
    fn config(&self) -> Config {
        let mut config = Config::default();
        if let Some(secs) = self.lock_wait_secs {
            config.lock_wait_secs = secs;
        }
        if let Some(attempts) = self.retry_max_attempts {
            config.retry.max_attempts = attempts;
        }
        if let Some(ms) = self.retry_base_delay_ms {
            config.retry.base_delay_ms = ms;
        }
        if let Some(multiplier) = self.retry_multiplier {
            config.retry.multiplier = multiplier;
        }
        if let Some(ms) = self.retry_max_delay_ms {
            config.retry.max_delay_ms = ms;
        }
        config
    }
}

type Service = RecordService<InMemoryRecordRepo>;

/// worker ごとの結果集計
#[derive(Debug, Default, Serialize)]
struct Tally {
    created: usize,
    updated: usize,
    deleted: usize,
    not_found: usize,
    timed_out: usize,
    rejected: usize,
}

impl Tally {
    fn record<T>(&mut self, result: &Result<T, RecordError>, on_ok: fn(&mut Tally)) {
        match result {
            Ok(_) => on_ok(self),
            Err(RecordError::NotFound(_)) => self.not_found += 1,
            Err(RecordError::LockTimeout(_)) => self.timed_out += 1,
            Err(RecordError::ParamInvalid(_)) => self.rejected += 1,
        }
    }

    fn merge(&mut self, other: Tally) {
        self.created += other.created;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.not_found += other.not_found;
        self.timed_out += other.timed_out;
        self.rejected += other.rejected;
    }
}

#[derive(Debug, Serialize)]
struct Report {
    records: Vec<Record>,
    counts: RecordCounts,
    outcomes: Tally,
    panicked_workers: usize,
}

/// worker：ランダムに create / update / delete を投げ続ける
async fn worker_loop(worker_id: usize, service: Arc<Service>, ops: usize, seed: u64) -> Tally {
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(worker_id as u64));
    let mut tally = Tally::default();

    for op in 0..ops {
        // 既存 id の少し先まで狙う（NotFound も発生させる）
        let upper = service
            .repository()
            .last_issued_id()
            .map_or(1, |id| id.get() + 2);
        let id = RecordId::new(rng.gen_range(1..=upper));

        match rng.gen_range(0..10) {
            0 | 1 => {
                let status = if rng.gen_bool(0.5) {
                    Status::Completed
                } else {
                    Status::Incomplete
                };
                let result = service
                    .create(format!("w{worker_id}-op{op}"), status)
                    .await;
                tally.record(&result, |t| t.created += 1);
            }
            2 => {
                let result = service.delete(id).await;
                tally.record(&result, |t| t.deleted += 1);
            }
            _ => {
                let mut params = UpdateRecordParams::new(id);
                if rng.gen_bool(0.5) {
                    params = params.name(format!("w{worker_id}-op{op}"));
                }
                if rng.gen_bool(0.5) {
                    params = params.status(Status::Completed);
                }
                let result = service.update(params).await;
                tally.record(&result, |t| t.updated += 1);
            }
        }
    }

    tally
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&args.log)?;

    // (A) 設定: デフォルト ← フラグ（未指定なら RECORDS_* 環境変数）
    let config = args.config();
    info!(?config, workers = args.workers, ops = args.ops, "starting");

    // (B) サービスを構築して seed を投入
    let service = Arc::new(ServiceBuilder::new().config(config).build()?);
    for new in seed::records() {
        service.create_record(new).await?;
    }

    // (C) worker を起動
    let mut joins = Vec::with_capacity(args.workers);
    for worker_id in 0..args.workers {
        joins.push(tokio::spawn(worker_loop(
            worker_id,
            Arc::clone(&service),
            args.ops,
            args.seed,
        )));
    }

    // (D) 全 worker の終了を待つ（panic した worker は記録して続行）
    let mut outcomes = Tally::default();
    let mut panicked_workers = 0;
    for (worker_id, join) in joins.into_iter().enumerate() {
        match join.await {
            Ok(tally) => outcomes.merge(tally),
            Err(err) => {
                panicked_workers += 1;
                error!(worker_id, error = %err, "worker did not finish");
            }
        }
    }

    // (E) 最終状態を出力
    let mut records = service.list().await;
    records.sort_by_key(|record| record.id);
    let report = Report {
        counts: service.counts().await,
        records,
        outcomes,
        panicked_workers,
    };
    let by_status: BTreeMap<&str, usize> = BTreeMap::from([
        (Status::Incomplete.as_str(), report.counts.incomplete),
        (Status::Completed.as_str(), report.counts.completed),
    ]);
    info!(?by_status, "finished");

    println!("{}", serde_json::to_string_pretty(&OkResponse::new(report))?);
    Ok(())
}
