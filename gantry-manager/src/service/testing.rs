//! In-memory CI server for service tests
//!
//! Item lookups ignore case, like the real server. Every mutating call is
//! recorded so tests can assert on what was sent.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use gantry_client::{
    BuildDetails, BuildRef, CiServer, ClientError, FolderRef, JobDetails, JobRef, QueueReference,
    Result, SshCredential,
};

const FOLDER_CONFIG: &str = r#"<?xml version='1.1' encoding='UTF-8'?>
<com.cloudbees.hudson.plugins.folder.Folder plugin="cloudbees-folder">
  <properties/>
  <folderViews/>
</com.cloudbees.hudson.plugins.folder.Folder>"#;

struct FakeItem {
    name: String,
    path: String,
    is_folder: bool,
    config: String,
    /// Newest first
    builds: Vec<BuildDetails>,
}

#[derive(Default)]
struct FakeState {
    items: BTreeMap<String, FakeItem>,
    pending: Vec<(String, BuildDetails, u32)>,
    next_result: Option<String>,
    build_delay: u32,
    keep_deleted: bool,
    folder_creations: Vec<String>,
    job_creations: Vec<(String, String)>,
    config_updates: Vec<(String, String)>,
    deletions: Vec<String>,
    triggers: Vec<(String, Option<HashMap<String, String>>)>,
    credentials: Vec<(String, SshCredential)>,
}

impl FakeState {
    fn item(&self, path: &str) -> Result<&FakeItem> {
        self.items
            .get(&key(path))
            .ok_or_else(|| ClientError::api_error(404, "Not Found"))
    }

    fn item_mut(&mut self, path: &str) -> Result<&mut FakeItem> {
        self.items
            .get_mut(&key(path))
            .ok_or_else(|| ClientError::api_error(404, "Not Found"))
    }

    fn job_ref(&self, path: &str) -> Option<JobRef> {
        let item = self.items.get(&key(path))?;
        Some(JobRef {
            name: item.name.clone(),
            path: normalize(path),
            url: format!("http://ci.test/job/{}/", item.path.replace('/', "/job/")),
            is_folder: item.is_folder,
        })
    }

    fn insert(&mut self, path: &str, is_folder: bool, config: &str) {
        let path = normalize(path);
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        self.items.insert(
            key(&path),
            FakeItem {
                name,
                path,
                is_folder,
                config: config.to_string(),
                builds: Vec::new(),
            },
        );
    }

    /// Refuse to create `path` when it exists or its parent folder does not
    fn check_creatable(&self, parent: &FolderRef, path: &str) -> Result<()> {
        if !parent.is_root() && !self.items.contains_key(&key(&parent.path())) {
            return Err(ClientError::api_error(404, "Not Found"));
        }
        if self.items.contains_key(&key(path)) {
            return Err(ClientError::api_error(
                400,
                format!("A job already exists with the name {}", path),
            ));
        }
        Ok(())
    }

    fn next_build_number(&self, path: &str) -> u32 {
        let job_key = key(path);
        let recorded = self
            .items
            .get(&job_key)
            .and_then(|item| item.builds.first())
            .map(|build| build.number)
            .unwrap_or(0);
        let pending = self
            .pending
            .iter()
            .filter(|(pending_key, _, _)| *pending_key == job_key)
            .map(|(_, build, _)| build.number)
            .max()
            .unwrap_or(0);
        recorded.max(pending) + 1
    }

    /// Advance queued builds of `path` by one poll
    fn tick(&mut self, path: &str) {
        let job_key = key(path);
        let mut ready = Vec::new();
        self.pending.retain_mut(|(pending_key, build, remaining)| {
            if *pending_key != job_key {
                return true;
            }
            if *remaining > 0 {
                *remaining -= 1;
            }
            if *remaining == 0 {
                ready.push(build.clone());
                return false;
            }
            true
        });

        if let Some(item) = self.items.get_mut(&job_key) {
            for build in ready {
                item.builds.insert(0, build);
            }
        }
    }
}

fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn key(path: &str) -> String {
    normalize(path).to_lowercase()
}

#[derive(Default)]
pub struct FakeCiServer {
    state: Mutex<FakeState>,
}

impl FakeCiServer {
    pub fn new() -> Self {
        Self::default()
    }

    // =============================================================================
    // Setup
    // =============================================================================

    pub fn add_folder(&self, path: &str) {
        self.add_folder_with_config(path, FOLDER_CONFIG);
    }

    pub fn add_folder_with_config(&self, path: &str, config: &str) {
        self.state.lock().unwrap().insert(path, true, config);
    }

    pub fn add_job(&self, path: &str) {
        self.state
            .lock()
            .unwrap()
            .insert(path, false, "<flow-definition/>");
    }

    /// Record a finished build, newest last added
    pub fn add_build(&self, job_path: &str, build: BuildDetails) {
        let mut state = self.state.lock().unwrap();
        let item = state.item_mut(job_path).unwrap();
        item.builds.insert(0, build);
    }

    /// Result code of builds triggered from now on, `None` for still running
    pub fn set_next_result(&self, result: Option<&str>) {
        self.state.lock().unwrap().next_result = result.map(str::to_string);
    }

    /// Number of job polls before a triggered build shows up
    pub fn set_build_delay(&self, polls: u32) {
        self.state.lock().unwrap().build_delay = polls;
    }

    /// Make deletions report success without removing anything
    pub fn keep_deleted_items(&self) {
        self.state.lock().unwrap().keep_deleted = true;
    }

    // =============================================================================
    // Inspection
    // =============================================================================

    pub fn contains(&self, path: &str) -> bool {
        self.state.lock().unwrap().items.contains_key(&key(path))
    }

    pub fn config_of(&self, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.items.get(&key(path)).map(|item| item.config.clone())
    }

    pub fn folder_creations(&self) -> Vec<String> {
        self.state.lock().unwrap().folder_creations.clone()
    }

    pub fn job_creations(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().job_creations.clone()
    }

    pub fn config_updates(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().config_updates.clone()
    }

    pub fn deletions(&self) -> Vec<String> {
        self.state.lock().unwrap().deletions.clone()
    }

    pub fn triggers(&self) -> Vec<(String, Option<HashMap<String, String>>)> {
        self.state.lock().unwrap().triggers.clone()
    }

    pub fn credentials(&self) -> Vec<(String, SshCredential)> {
        self.state.lock().unwrap().credentials.clone()
    }
}

#[async_trait]
impl CiServer for FakeCiServer {
    async fn get_folder(&self, parent: &FolderRef, name: &str) -> Result<Option<FolderRef>> {
        tokio::task::yield_now().await;
        let folder = parent.child(name);
        let state = self.state.lock().unwrap();
        Ok(state
            .items
            .get(&key(&folder.path()))
            .filter(|item| item.is_folder)
            .map(|_| folder))
    }

    async fn create_folder(&self, parent: &FolderRef, name: &str) -> Result<()> {
        tokio::task::yield_now().await;
        let path = parent.child(name).path();
        let mut state = self.state.lock().unwrap();
        state.check_creatable(parent, &path)?;
        state.insert(&path, true, FOLDER_CONFIG);
        state.folder_creations.push(path);
        Ok(())
    }

    async fn get_job(&self, path: &str) -> Result<Option<JobRef>> {
        if normalize(path).is_empty() {
            return Ok(None);
        }
        Ok(self.state.lock().unwrap().job_ref(path))
    }

    async fn get_job_in(&self, folder: &FolderRef, name: &str) -> Result<Option<JobRef>> {
        Ok(self.state.lock().unwrap().job_ref(&folder.child(name).path()))
    }

    async fn create_job(&self, folder: &FolderRef, name: &str, definition: &str) -> Result<()> {
        let path = folder.child(name).path();
        let mut state = self.state.lock().unwrap();
        state.check_creatable(folder, &path)?;
        state.insert(&path, false, definition);
        state.job_creations.push((path, definition.to_string()));
        Ok(())
    }

    async fn delete_job(&self, folder: &FolderRef, name: &str, force: bool) -> Result<()> {
        let path = folder.child(name).path();
        let mut state = self.state.lock().unwrap();
        state.item(&path)?;

        let item_key = key(&path);
        let prefix = format!("{}/", item_key);
        let has_children = state.items.keys().any(|k| k.starts_with(&prefix));
        if has_children && !force {
            return Err(ClientError::InvalidRequest(format!(
                "'{}' still contains items, deletion requires force",
                path
            )));
        }

        if !state.keep_deleted {
            state
                .items
                .retain(|k, _| *k != item_key && !k.starts_with(&prefix));
        }
        state.deletions.push(path);
        Ok(())
    }

    async fn get_job_config(&self, path: &str) -> Result<String> {
        let state = self.state.lock().unwrap();
        Ok(state.item(path)?.config.clone())
    }

    async fn update_job_config(&self, path: &str, document: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.item_mut(path)?.config = document.to_string();
        state
            .config_updates
            .push((normalize(path), document.to_string()));
        Ok(())
    }

    async fn trigger_build(
        &self,
        job: &JobRef,
        params: Option<HashMap<String, String>>,
    ) -> Result<QueueReference> {
        let mut state = self.state.lock().unwrap();
        state.item(&job.path)?;

        let number = state.next_build_number(&job.path);
        let result = state.next_result.clone();
        let build = BuildDetails {
            number,
            building: result.is_none(),
            console_output: Some(format!(
                "Started by user gantry\nFinished: {}\n",
                result.as_deref().unwrap_or("PENDING")
            )),
            result,
            duration: 1500,
            timestamp: 1_600_000_000_000 + i64::from(number),
            parameters: params.clone().unwrap_or_default(),
        };

        let delay = state.build_delay;
        state.pending.push((key(&job.path), build, delay));
        if delay == 0 {
            state.tick(&job.path);
        }
        state.triggers.push((job.path.clone(), params));

        Ok(QueueReference {
            location: format!("http://ci.test/queue/item/{}/", number),
        })
    }

    async fn get_job_details(&self, job: &JobRef) -> Result<JobDetails> {
        let mut state = self.state.lock().unwrap();
        state.item(&job.path)?;
        state.tick(&job.path);

        let item = state.item(&job.path)?;
        let builds: Vec<BuildRef> = item
            .builds
            .iter()
            .map(|build| BuildRef {
                number: build.number,
                url: format!("{}{}/", job.url, build.number),
            })
            .collect();

        Ok(JobDetails {
            name: item.name.clone(),
            url: job.url.clone(),
            last_build: builds.first().cloned(),
            builds,
        })
    }

    async fn get_build_details(&self, job: &JobRef, number: u32) -> Result<Option<BuildDetails>> {
        let state = self.state.lock().unwrap();
        let item = state.item(&job.path)?;
        Ok(item.builds.iter().find(|build| build.number == number).cloned())
    }

    async fn create_credential(&self, folder_path: &str, credential: &SshCredential) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.item(folder_path)?;
        state
            .credentials
            .push((normalize(folder_path), credential.clone()));
        Ok(())
    }
}
