//! Pack lock coordination.
//!
//! Packs are locked against edits. Migration unlocks a pack, runs its work,
//! then puts the original lock state back whether or not the work succeeded.
//! A panic inside the work is caught long enough to restore the lock, then
//! resumed.

use std::future::Future;
use std::panic::{resume_unwind, AssertUnwindSafe};
use std::sync::Arc;

use coc7_domain::PackMetadata;
use futures_util::FutureExt;

use crate::infrastructure::ports::{PackRepo, RepoError};

/// Result of work run against an unlocked pack.
#[derive(Debug)]
pub struct Unlocked<T> {
    pub value: T,
    pub was_locked: bool,
    /// Set when the original lock state could not be put back.
    pub restore_error: Option<RepoError>,
}

pub struct PackLockCoordinator {
    packs: Arc<dyn PackRepo>,
}

impl PackLockCoordinator {
    pub fn new(packs: Arc<dyn PackRepo>) -> Self {
        Self { packs }
    }

    /// Unlock `pack`, run `work`, and restore the captured lock state.
    ///
    /// Fails without running `work` when the pack cannot be unlocked.
    pub async fn with_unlocked<F, Fut, T>(
        &self,
        pack: &PackMetadata,
        work: F,
    ) -> Result<Unlocked<T>, RepoError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let was_locked = pack.locked;
        self.packs.set_locked(&pack.collection, false).await?;

        let value = AssertUnwindSafe(work()).catch_unwind().await;

        let restore_error = match self.packs.set_locked(&pack.collection, was_locked).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    pack = %pack.collection,
                    was_locked,
                    error = %e,
                    "Failed to restore pack lock state"
                );
                Some(e)
            }
        };

        let value = match value {
            Ok(value) => value,
            Err(panic) => resume_unwind(panic),
        };

        Ok(Unlocked {
            value,
            was_locked,
            restore_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryWorld;
    use crate::infrastructure::ports::MockPackRepo;
    use crate::test_fixtures::pack as fixture_pack;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn pack(locked: bool) -> PackMetadata {
        PackMetadata {
            collection: "mod.items".to_string(),
            label: "Items".to_string(),
            package: "mod".to_string(),
            entity: "Item".to_string(),
            locked,
        }
    }

    #[tokio::test]
    async fn test_locked_pack_is_relocked() {
        let mut repo = MockPackRepo::new();
        let mut seq = Sequence::new();
        repo.expect_set_locked()
            .with(eq("mod.items"), eq(false))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        repo.expect_set_locked()
            .with(eq("mod.items"), eq(true))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let coordinator = PackLockCoordinator::new(Arc::new(repo));
        let out = coordinator.with_unlocked(&pack(true), || async { 7 }).await.unwrap();
        assert_eq!(out.value, 7);
        assert!(out.was_locked);
        assert!(out.restore_error.is_none());
    }

    #[tokio::test]
    async fn test_unlocked_pack_stays_unlocked() {
        let mut repo = MockPackRepo::new();
        repo.expect_set_locked()
            .with(eq("mod.items"), eq(false))
            .times(2)
            .returning(|_, _| Ok(()));

        let coordinator = PackLockCoordinator::new(Arc::new(repo));
        let out = coordinator.with_unlocked(&pack(false), || async {}).await.unwrap();
        assert!(!out.was_locked);
    }

    #[tokio::test]
    async fn test_lock_is_restored_after_failed_work() {
        let mut repo = MockPackRepo::new();
        repo.expect_set_locked().times(2).returning(|_, _| Ok(()));

        let coordinator = PackLockCoordinator::new(Arc::new(repo));
        let out = coordinator
            .with_unlocked(&pack(true), || async {
                Err::<(), _>(RepoError::rejected("schema"))
            })
            .await
            .unwrap();
        assert!(out.value.is_err());
    }

    #[tokio::test]
    async fn test_lock_is_restored_when_work_panics() {
        let world = Arc::new(InMemoryWorld::new());
        world.add_pack(fixture_pack("mod.items", "mod", "Item", true, vec![])).await;
        let coordinator = PackLockCoordinator::new(world.clone());

        let task = tokio::spawn(async move {
            coordinator
                .with_unlocked(&pack(true), || async {
                    panic!("rule blew up");
                })
                .await
        });

        let err = task.await.unwrap_err();
        assert!(err.is_panic());
        assert_eq!(world.pack_locked("mod.items").await, Some(true));
    }

    #[tokio::test]
    async fn test_unlock_failure_skips_work() {
        let mut repo = MockPackRepo::new();
        repo.expect_set_locked()
            .times(1)
            .returning(|_, _| Err(RepoError::io("set_locked", "read-only")));

        let coordinator = PackLockCoordinator::new(Arc::new(repo));
        let mut ran = false;
        let result = coordinator
            .with_unlocked(&pack(true), || async {
                ran = true;
            })
            .await;
        assert!(result.is_err());
        assert!(!ran);
    }

    #[tokio::test]
    async fn test_restore_failure_is_reported() {
        let mut repo = MockPackRepo::new();
        let mut seq = Sequence::new();
        repo.expect_set_locked()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        repo.expect_set_locked()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(RepoError::io("set_locked", "disk full")));

        let coordinator = PackLockCoordinator::new(Arc::new(repo));
        let out = coordinator.with_unlocked(&pack(true), || async {}).await.unwrap();
        assert!(out.restore_error.is_some());
    }
}
