//! InMemoryRecordRepo - プロセス内メモリのレコード保持
//!
//! # 構成
//! - `KeyedStore`: id → Record の並行マップ（読み取りはロック不要）
//! - `RowLockManager<RecordId>`: update / delete を id 単位で直列化
//! - `IdAllocator`: create を作成ロックで直列化し、単調増加の id を発番
//!
//! # 制御フロー
//! - create: 作成ロック → 発番 → store → 作成ロック解放
//! - update: row lock → 読み出し → 部分適用 → 書き戻し → row lock 解放
//! - delete: row lock → remove-if-present → row lock 解放
//! - list / get: ロックなし
//!
//! row lock はガードで保持するので、NotFound を含むどの経路でも必ず解放される。

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{NewRecord, Record, RecordError, RecordId, UpdateRecordParams};
use crate::lock::{IdAllocator, RowLockManager};
use crate::observability::RecordCounts;
use crate::ports::RecordRepository;
use crate::store::KeyedStore;

/// InMemoryRecordRepo は RecordRepository のインメモリ実装
///
/// グローバル状態は持たない。インスタンスごとに独立した
/// ストア・ロック表・カウンタを持つ（テストごとに作り直せる）。
pub struct InMemoryRecordRepo {
    records: KeyedStore,
    row_locks: RowLockManager<RecordId>,
    ids: IdAllocator,
}

impl InMemoryRecordRepo {
    /// `lock_wait` は row lock と作成ロックの待ち時間上限
    pub fn new(lock_wait: Duration) -> Self {
        Self {
            records: KeyedStore::new(),
            row_locks: RowLockManager::new(lock_wait),
            ids: IdAllocator::new(lock_wait),
        }
    }

    pub fn lock_wait(&self) -> Duration {
        self.row_locks.wait_limit()
    }

    /// Row lock registry (introspection / tests).
    pub fn row_locks(&self) -> &RowLockManager<RecordId> {
        &self.row_locks
    }

    pub fn last_issued_id(&self) -> Option<RecordId> {
        self.ids.last_issued()
    }
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepo {
    async fn list(&self) -> Vec<Record> {
        self.records.snapshot()
    }

    async fn get(&self, id: RecordId) -> Result<Record, RecordError> {
        self.records.get(id).ok_or(RecordError::NotFound(id))
    }

    async fn create(&self, new: NewRecord) -> Result<Record, RecordError> {
        new.validate()?;

        let mut allocation = self.ids.lock().await?;
        let id = allocation.next_id();
        let record = Record::new(id, new.name, new.status);
        self.records.store(record.clone());
        drop(allocation);

        debug!(id = %id, "record stored");
        Ok(record)
    }

    async fn update(&self, params: UpdateRecordParams) -> Result<Record, RecordError> {
        params.validate()?;

        let _row = self.row_locks.lock(params.id).await?;
        self.records
            .update_with(params.id, |record| record.apply(&params.patch))
            .ok_or(RecordError::NotFound(params.id))
    }

    async fn delete(&self, id: RecordId) -> Result<(), RecordError> {
        if id.is_unset() {
            return Err(RecordError::ParamInvalid("id is required".to_string()));
        }

        let _row = self.row_locks.lock(id).await?;
        if !self.records.delete(id) {
            return Err(RecordError::NotFound(id));
        }
        debug!(id = %id, "record removed");
        Ok(())
    }

    async fn counts(&self) -> RecordCounts {
        self.records.counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;
    use crate::seed;
    use rstest::rstest;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio::time::Instant;

    fn repo() -> Arc<InMemoryRecordRepo> {
        Arc::new(InMemoryRecordRepo::new(Duration::from_secs(5)))
    }

    async fn seeded() -> Arc<InMemoryRecordRepo> {
        let repo = repo();
        for new in seed::records() {
            repo.create(new).await.unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn list_returns_every_seeded_record() {
        let repo = seeded().await;
        let records = repo.list().await;
        assert_eq!(records.len(), 5);

        let names: HashSet<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            HashSet::from(["task1", "task2", "task3", "task4", "task5"])
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_get_distinct_ids() {
        let repo = repo();

        let mut joins = Vec::new();
        for i in 0..50 {
            let repo = Arc::clone(&repo);
            joins.push(tokio::spawn(async move {
                repo.create(NewRecord::new(format!("r{i}"), Status::Incomplete))
                    .await
                    .unwrap()
                    .id
            }));
        }

        let mut ids = HashSet::new();
        for join in joins {
            assert!(ids.insert(join.await.unwrap()));
        }
        assert_eq!(ids.len(), 50);
        assert_eq!(repo.list().await.len(), 50);
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = repo();
        let a = repo.create(NewRecord::new("a", Status::Incomplete)).await.unwrap();
        let b = repo.create(NewRecord::new("b", Status::Incomplete)).await.unwrap();
        let c = repo.create(NewRecord::new("c", Status::Incomplete)).await.unwrap();

        repo.delete(b.id).await.unwrap();
        let d = repo.create(NewRecord::new("d", Status::Incomplete)).await.unwrap();

        assert_eq!(d.id, RecordId::new(4));
        assert_ne!(d.id, c.id);
        assert_eq!(repo.get(c.id).await.unwrap().name, "c");
        assert_eq!(repo.get(a.id).await.unwrap().name, "a");
        assert_eq!(repo.last_issued_id(), Some(RecordId::new(4)));
    }

    #[tokio::test]
    async fn create_rejects_blank_name_without_issuing_an_id() {
        let repo = repo();
        let err = repo
            .create(NewRecord::new("  ", Status::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::ParamInvalid(_)));
        assert_eq!(repo.last_issued_id(), None);
    }

    #[tokio::test]
    async fn create_times_out_while_creation_lock_is_held() {
        let repo = InMemoryRecordRepo::new(Duration::from_millis(50));
        let _held = repo.ids.lock().await.unwrap();

        let err = repo
            .create(NewRecord::new("late", Status::Incomplete))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(repo.list().await.is_empty());
    }

    #[tokio::test]
    async fn update_is_partial() {
        let repo = seeded().await;
        let id = RecordId::new(2);

        let updated = repo
            .update(UpdateRecordParams::new(id).name("renamed"))
            .await
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.status, Status::Completed);

        let updated = repo
            .update(UpdateRecordParams::new(id).status(Status::Incomplete))
            .await
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.status, Status::Incomplete);

        assert_eq!(repo.get(id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_with_empty_patch_is_a_no_op() {
        let repo = seeded().await;
        let before = repo.get(RecordId::new(1)).await.unwrap();
        let after = repo.update(UpdateRecordParams::new(RecordId::new(1))).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn update_and_delete_reject_unset_id() {
        let repo = seeded().await;

        let err = repo
            .update(UpdateRecordParams::new(RecordId::new(0)).name("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::ParamInvalid(_)));

        let err = repo.delete(RecordId::new(0)).await.unwrap_err();
        assert!(matches!(err, RecordError::ParamInvalid(_)));

        // no lock was ever created for the bogus id
        assert!(repo.row_locks().is_empty());
    }

    #[tokio::test]
    async fn update_of_missing_id_releases_the_row_lock() {
        let repo = seeded().await;
        let missing = RecordId::new(99);

        let err = repo
            .update(UpdateRecordParams::new(missing).name("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::NotFound(id) if id == missing));
        assert!(!repo.row_locks().is_locked(&missing));
    }

    #[tokio::test]
    async fn update_times_out_while_row_is_held() {
        let repo = InMemoryRecordRepo::new(Duration::from_millis(50));
        let record = repo.create(NewRecord::new("a", Status::Incomplete)).await.unwrap();
        let held = repo.row_locks().lock(record.id).await.unwrap();

        let start = Instant::now();
        let err = repo
            .update(UpdateRecordParams::new(record.id).name("b"))
            .await
            .unwrap_err();
        assert!(start.elapsed() >= Duration::from_millis(50));
        assert!(matches!(err, RecordError::LockTimeout(_)));
        assert_eq!(err.http_status(), 500);

        let err = repo.delete(record.id).await.unwrap_err();
        assert!(err.is_retryable());

        drop(held);
        assert_eq!(repo.get(record.id).await.unwrap().name, "a");
        repo.update(UpdateRecordParams::new(record.id).name("b")).await.unwrap();
    }

    #[tokio::test]
    async fn delete_is_terminal() {
        let repo = seeded().await;
        let id = RecordId::new(3);

        repo.delete(id).await.unwrap();

        assert!(matches!(repo.delete(id).await, Err(RecordError::NotFound(_))));
        assert!(matches!(
            repo.update(UpdateRecordParams::new(id).name("back")).await,
            Err(RecordError::NotFound(_))
        ));
        assert!(matches!(repo.get(id).await, Err(RecordError::NotFound(_))));
        // the lock entry stays behind, unheld
        assert_eq!(repo.row_locks().len(), 1);
        assert!(!repo.row_locks().is_locked(&id));
    }

    #[rstest]
    #[case(2)]
    #[case(10)]
    #[case(50)]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_on_one_id_are_serialized(#[case] n: usize) {
        let repo = repo();
        let record = repo
            .create(NewRecord::new("start", Status::Incomplete))
            .await
            .unwrap();
        let id = record.id;

        let markers: Vec<String> = (0..n).map(|i| format!("marker-{i}")).collect();
        let mut joins = Vec::with_capacity(n);
        for (i, marker) in markers.iter().cloned().enumerate() {
            let repo = Arc::clone(&repo);
            let status = if i % 2 == 0 {
                Status::Completed
            } else {
                Status::Incomplete
            };
            joins.push(tokio::spawn(async move {
                repo.update(UpdateRecordParams::new(id).name(marker).status(status))
                    .await
                    .unwrap()
            }));
        }
        for join in joins {
            join.await.unwrap();
        }

        let last = repo.get(id).await.unwrap();
        let winner = markers
            .iter()
            .position(|m| *m == last.name)
            .expect("final name must be one of the markers");
        // name and status always come from the same writer
        let expected_status = if winner % 2 == 0 {
            Status::Completed
        } else {
            Status::Incomplete
        };
        assert_eq!(last.status, expected_status);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn held_row_does_not_stall_other_rows() {
        let repo = InMemoryRecordRepo::new(Duration::from_secs(5));
        let a = repo.create(NewRecord::new("a", Status::Incomplete)).await.unwrap();
        let b = repo.create(NewRecord::new("b", Status::Incomplete)).await.unwrap();
        let _held = repo.row_locks().lock(a.id).await.unwrap();

        let start = Instant::now();
        repo.update(UpdateRecordParams::new(b.id).status(Status::Completed))
            .await
            .unwrap();
        repo.delete(b.id).await.unwrap();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn delete_update_race_has_exactly_two_outcomes() {
        for _ in 0..50 {
            let repo = repo();
            let record = repo
                .create(NewRecord::new("x", Status::Incomplete))
                .await
                .unwrap();
            let id = record.id;

            let deleter = tokio::spawn({
                let repo = Arc::clone(&repo);
                async move { repo.delete(id).await }
            });
            let updater = tokio::spawn({
                let repo = Arc::clone(&repo);
                async move {
                    repo.update(UpdateRecordParams::new(id).name("z"))
                        .await
                }
            });

            let deleted = deleter.await.unwrap();
            let updated = updater.await.unwrap();

            // the row is gone either way; the only question is who won
            assert!(deleted.is_ok());
            assert!(repo.list().await.is_empty());
            match updated {
                Ok(record) => assert_eq!(record.name, "z"),
                Err(err) => assert!(matches!(err, RecordError::NotFound(_))),
            }
        }
    }

    #[tokio::test]
    async fn counts_follow_mutations() {
        let repo = seeded().await;
        let counts = repo.counts().await;
        assert_eq!(counts.incomplete, 3);
        assert_eq!(counts.completed, 2);

        repo.update(UpdateRecordParams::new(RecordId::new(1)).status(Status::Completed))
            .await
            .unwrap();
        repo.delete(RecordId::new(2)).await.unwrap();

        let counts = repo.counts().await;
        assert_eq!(counts.incomplete, 2);
        assert_eq!(counts.completed, 2);
    }
}
