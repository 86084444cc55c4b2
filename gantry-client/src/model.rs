//! Types exchanged with the CI server
//!
//! These mirror the server's native model (folders, jobs, builds) rather
//! than the neutral domain in `gantry-core`.

use std::collections::HashMap;

/// Handle to a folder on the CI server
///
/// The root of the server is the folder with no segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FolderRef {
    segments: Vec<String>,
}

impl FolderRef {
    /// The server root, parent of top-level folders
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Folder named `name` directly under this one
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, `None` for the root
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Slash-delimited path, empty for the root
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

impl std::fmt::Display for FolderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            write!(f, "<root>")
        } else {
            f.write_str(&self.path())
        }
    }
}

/// Handle to any item (job or folder) on the CI server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRef {
    pub name: String,
    /// Slash-delimited full path of the item
    pub path: String,
    pub url: String,
    pub is_folder: bool,
}

impl JobRef {
    pub fn segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }
}

/// Opaque handle returned when a build is queued
///
/// Carries the queue item location only, never a build number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueReference {
    pub location: String,
}

/// Build identity as listed on a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRef {
    pub number: u32,
    pub url: String,
}

/// Job state relevant to build tracking
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDetails {
    pub name: String,
    pub url: String,
    pub last_build: Option<BuildRef>,
    /// Build history in the order the server lists it
    pub builds: Vec<BuildRef>,
}

/// Full record of one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildDetails {
    pub number: u32,
    /// Raw result code (`SUCCESS`, `FAILURE`, ...), `None` while running
    pub result: Option<String>,
    pub building: bool,
    /// Milliseconds
    pub duration: i64,
    /// Start time, epoch milliseconds
    pub timestamp: i64,
    pub parameters: HashMap<String, String>,
    /// `None` when the console could not be fetched
    pub console_output: Option<String>,
}

/// SSH username/private-key credential to register in a folder store
#[derive(Clone, PartialEq, Eq)]
pub struct SshCredential {
    pub id: String,
    pub username: String,
    pub private_key: String,
    pub description: String,
}

impl std::fmt::Debug for SshCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshCredential")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
