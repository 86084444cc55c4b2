//! Folder Provisioner
//!
//! Materializes a chain of nested folders on the CI server, creating the
//! missing ones parent before child. Concurrent requests for the same folder
//! are serialized so that each folder is created at most once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use gantry_client::{CiServer, FolderRef};
use tokio::sync::OwnedMutexGuard;

use crate::error::{Result, ServiceError};
use crate::retry::{RetryPolicy, retry};

/// Attempts for one folder creation
pub const FOLDER_CREATE_ATTEMPTS: u32 = 4;

/// Pause between two folder creation attempts
pub const FOLDER_CREATE_DELAY: Duration = Duration::from_millis(300);

/// Split a path into its folder chain
///
/// Empty segments are dropped and the first segment is upper-cased.
pub fn folder_chain(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(index, segment)| {
            if index == 0 {
                segment.to_uppercase()
            } else {
                segment.to_string()
            }
        })
        .collect()
}

/// One async mutex per key
///
/// A key's entry lives while someone holds or waits for its lock. Idle
/// entries are dropped on the next call to `lock`, so the map stays as large
/// as the number of folders being provisioned at once.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Guards and waiters hold a clone; the map's own reference alone means idle
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct FolderProvisioner {
    server: Arc<dyn CiServer>,
    locks: Arc<KeyedLocks>,
    policy: RetryPolicy,
}

impl FolderProvisioner {
    pub fn new(server: Arc<dyn CiServer>, locks: Arc<KeyedLocks>) -> Self {
        Self {
            server,
            locks,
            policy: RetryPolicy::fixed(FOLDER_CREATE_ATTEMPTS, FOLDER_CREATE_DELAY),
        }
    }

    /// Handle to the deepest folder of `folders`, creating missing ones
    ///
    /// An empty chain resolves to the server root.
    pub async fn ensure_chain(&self, folders: &[String]) -> Result<FolderRef> {
        let mut current = FolderRef::root();
        for name in folders {
            current = self.ensure_folder(&current, name).await?;
        }
        Ok(current)
    }

    /// Get or create folder `name` under `parent`
    pub async fn ensure_folder(&self, parent: &FolderRef, name: &str) -> Result<FolderRef> {
        let key = parent.child(name).path();
        let _guard = self.locks.lock(&key).await;

        if let Some(folder) = self.server.get_folder(parent, name).await? {
            return Ok(folder);
        }

        tracing::info!("Creating folder {}", key);
        retry(
            &self.policy,
            "create_folder",
            ServiceError::is_retryable,
            || self.create_and_fetch(parent, name),
        )
        .await
    }

    async fn create_and_fetch(&self, parent: &FolderRef, name: &str) -> Result<FolderRef> {
        if let Err(err) = self.server.create_folder(parent, name).await {
            // Another writer may have won the race
            return match self.server.get_folder(parent, name).await? {
                Some(folder) => Ok(folder),
                None => Err(err.into()),
            };
        }

        self.server.get_folder(parent, name).await?.ok_or_else(|| {
            ServiceError::State(format!(
                "Folder {} was created but cannot be found",
                parent.child(name)
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::FakeCiServer;
    use gantry_client::{ClientError, MockCiServer};

    #[test]
    fn test_folder_chain() {
        assert_eq!(folder_chain("g1/g2/g3"), vec!["G1", "g2", "g3"]);
        assert_eq!(folder_chain("/team//sub/"), vec!["TEAM", "sub"]);
        assert!(folder_chain("").is_empty());
    }

    #[tokio::test]
    async fn test_keyed_locks_drop_idle_entries() {
        let locks = KeyedLocks::new();
        assert!(locks.is_empty());

        drop(locks.lock("G1").await);
        let held = locks.lock("G1/a").await;
        assert_eq!(locks.len(), 1);

        drop(locks.lock("G1/b").await);
        assert_eq!(locks.len(), 2);

        drop(held);
        drop(locks.lock("G2").await);
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_keyed_locks_keep_entry_while_held() {
        let locks = KeyedLocks::new();
        let guard = locks.lock("G1").await;

        // A second locker must wait on the same mutex rather than a fresh one
        let second = tokio::time::timeout(Duration::from_millis(10), locks.lock("G1")).await;
        assert!(second.is_err());

        drop(guard);
        let second = tokio::time::timeout(Duration::from_millis(10), locks.lock("G1")).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_creates_missing_folders_in_order() {
        let server = Arc::new(FakeCiServer::new());
        server.add_folder("G1");
        let provisioner = FolderProvisioner::new(server.clone(), Arc::new(KeyedLocks::new()));

        let folder = provisioner
            .ensure_chain(&folder_chain("g1/g2/g3"))
            .await
            .unwrap();

        assert_eq!(folder.path(), "G1/g2/g3");
        assert_eq!(server.folder_creations(), vec!["G1/g2", "G1/g2/g3"]);
    }

    #[tokio::test]
    async fn test_concurrent_requests_create_once() {
        let server = Arc::new(FakeCiServer::new());
        let locks = Arc::new(KeyedLocks::new());
        let first = FolderProvisioner::new(server.clone(), locks.clone());
        let second = FolderProvisioner::new(server.clone(), locks);
        let chain = folder_chain("g1/g2");

        let (a, b) = tokio::join!(first.ensure_chain(&chain), second.ensure_chain(&chain));

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(server.folder_creations(), vec!["G1", "G1/g2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_creation_failure_is_surfaced_after_retries() {
        let mut server = MockCiServer::new();
        server.expect_get_folder().returning(|_, _| Ok(None));
        server
            .expect_create_folder()
            .times(FOLDER_CREATE_ATTEMPTS as usize)
            .returning(|_, _| Err(ClientError::api_error(500, "boom")));

        let provisioner = FolderProvisioner::new(Arc::new(server), Arc::new(KeyedLocks::new()));
        let result = provisioner.ensure_folder(&FolderRef::root(), "G1").await;

        match result {
            Err(ServiceError::Remote(err)) => assert_eq!(err.status(), Some(500)),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_create_with_existing_folder_succeeds() {
        let mut server = MockCiServer::new();
        let mut lookups = 0;
        server.expect_get_folder().returning(move |parent, name| {
            lookups += 1;
            // Absent on the first check, present once the create has failed
            Ok((lookups > 1).then(|| parent.child(name)))
        });
        server
            .expect_create_folder()
            .times(1)
            .returning(|_, _| Err(ClientError::api_error(400, "A job already exists with the name")));

        let provisioner = FolderProvisioner::new(Arc::new(server), Arc::new(KeyedLocks::new()));
        let folder = provisioner.ensure_folder(&FolderRef::root(), "G1").await.unwrap();

        assert_eq!(folder.path(), "G1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_forbidden_creation_is_not_retried() {
        let mut server = MockCiServer::new();
        server.expect_get_folder().returning(|_, _| Ok(None));
        server
            .expect_create_folder()
            .times(1)
            .returning(|_, _| Err(ClientError::api_error(403, "Forbidden")));

        let provisioner = FolderProvisioner::new(Arc::new(server), Arc::new(KeyedLocks::new()));
        let result = provisioner.ensure_folder(&FolderRef::root(), "G1").await;

        assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
    }
}
