//! File-backed continuation store.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    checkout::CheckoutKey,
    continuations::{
        errors::ContinuationStoreError, models::CheckoutContinuation, store::ContinuationStore,
    },
};

/// Stores one JSON document per checkout key in a directory.
///
/// Writes go to a temporary file that is flushed to disk and then renamed over the previous
/// document, so a reader sees either the old continuation or the new one in full.
#[derive(Debug, Clone)]
pub struct FileContinuationStore {
    dir: PathBuf,
    max_age: SignedDuration,
}

impl FileContinuationStore {
    pub fn new(dir: impl Into<PathBuf>, max_age: SignedDuration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    fn path_for(&self, key: &CheckoutKey) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn remove(path: &Path) -> Result<(), ContinuationStoreError> {
        match fs::remove_file(path).await {
            Err(error) if error.kind() != ErrorKind::NotFound => Err(error.into()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ContinuationStore for FileContinuationStore {
    #[tracing::instrument(
        name = "continuations.file.save",
        skip(self, continuation),
        fields(checkout_key = %continuation.key),
        err
    )]
    async fn save(
        &self,
        continuation: &CheckoutContinuation,
    ) -> Result<(), ContinuationStoreError> {
        fs::create_dir_all(&self.dir).await?;

        let bytes = serde_json::to_vec(continuation)?;
        let path = self.path_for(&continuation.key);
        let tmp = self.dir.join(format!(
            ".{}.{}.tmp",
            continuation.key,
            Uuid::now_v7().simple()
        ));

        let written = async {
            let mut file = fs::File::create(&tmp).await?;

            file.write_all(&bytes).await?;
            file.sync_all().await?;

            fs::rename(&tmp, &path).await
        }
        .await;

        if let Err(error) = written {
            Self::remove(&tmp).await?;

            return Err(error.into());
        }

        Ok(())
    }

    #[tracing::instrument(
        name = "continuations.file.load",
        skip(self),
        fields(checkout_key = %key, found = tracing::field::Empty),
        err
    )]
    async fn load(
        &self,
        key: &CheckoutKey,
    ) -> Result<Option<CheckoutContinuation>, ContinuationStoreError> {
        let path = self.path_for(key);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::Span::current().record("found", false);

                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };

        let continuation: CheckoutContinuation = match serde_json::from_slice(&bytes) {
            Ok(continuation) => continuation,
            Err(error) => {
                warn!(checkout_key = %key, %error, "discarding unreadable continuation");

                Self::remove(&path).await?;

                return Ok(None);
            }
        };

        let age = Timestamp::now().duration_since(continuation.created_at);

        if age > self.max_age {
            info!(checkout_key = %key, age = %age, "discarding expired continuation");

            Self::remove(&path).await?;

            return Ok(None);
        }

        tracing::Span::current().record("found", true);

        Ok(Some(continuation))
    }

    #[tracing::instrument(
        name = "continuations.file.clear",
        skip(self),
        fields(checkout_key = %key),
        err
    )]
    async fn clear(&self, key: &CheckoutKey) -> Result<(), ContinuationStoreError> {
        Self::remove(&self.path_for(key)).await
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{domain::payments::models::IntentId, test::fixtures};

    use super::*;

    fn continuation(key: &CheckoutKey, created_at: Timestamp) -> CheckoutContinuation {
        CheckoutContinuation {
            key: key.clone(),
            intent_id: IntentId::new("pi_1"),
            customer_name: "Ada Lovelace".to_string(),
            address: fixtures::address(),
            cart: fixtures::cart(),
            coupon_code: None,
            total: 60_00,
            currency: "GBP".to_string(),
            created_at,
        }
    }

    #[tokio::test]
    async fn save_then_load_returns_continuation() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileContinuationStore::new(dir.path(), SignedDuration::from_hours(24));
        let key: CheckoutKey = "chk_1".parse()?;
        let saved = continuation(&key, Timestamp::now());

        store.save(&saved).await?;

        assert_eq!(store.load(&key).await?, Some(saved));

        Ok(())
    }

    #[tokio::test]
    async fn save_leaves_no_temporary_files() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileContinuationStore::new(dir.path(), SignedDuration::from_hours(24));
        let key: CheckoutKey = "chk_1".parse()?;

        store.save(&continuation(&key, Timestamp::now())).await?;
        store.save(&continuation(&key, Timestamp::now())).await?;

        let names = std::fs::read_dir(dir.path())?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<Result<Vec<_>, _>>()?;

        assert_eq!(names, vec!["chk_1.json".to_string()]);

        Ok(())
    }

    #[tokio::test]
    async fn load_missing_returns_none() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileContinuationStore::new(dir.path(), SignedDuration::from_hours(24));

        assert_eq!(store.load(&"chk_missing".parse()?).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_continuation_and_is_idempotent() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileContinuationStore::new(dir.path(), SignedDuration::from_hours(24));
        let key: CheckoutKey = "chk_1".parse()?;

        store.save(&continuation(&key, Timestamp::now())).await?;
        store.clear(&key).await?;
        store.clear(&key).await?;

        assert_eq!(store.load(&key).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn expired_continuation_is_discarded() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileContinuationStore::new(dir.path(), SignedDuration::from_hours(24));
        let key: CheckoutKey = "chk_1".parse()?;
        let created_at = Timestamp::now() - SignedDuration::from_hours(25);

        store.save(&continuation(&key, created_at)).await?;

        assert_eq!(store.load(&key).await?, None);
        assert!(
            !dir.path().join("chk_1.json").exists(),
            "expired continuation should be removed"
        );

        Ok(())
    }

    #[tokio::test]
    async fn corrupt_continuation_is_discarded() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileContinuationStore::new(dir.path(), SignedDuration::from_hours(24));

        std::fs::write(dir.path().join("chk_1.json"), b"{not json")?;

        assert_eq!(store.load(&"chk_1".parse()?).await?, None);

        Ok(())
    }
}
