//! Project directory discovery
//!
//! A cleaver project is any directory containing a `.cleaver/` subdirectory
//! holding the SQLite database and the identity file for the acting party.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::session::{Principal, StaticSession};

const PROJECT_DIR: &str = ".cleaver";
const DB_FILE: &str = "cleaver.db";
const IDENTITY_FILE: &str = "identity.yaml";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not inside a cleaver project (no {PROJECT_DIR}/ found). Run 'cleaver init' first")]
    NotFound,

    #[error("Already a cleaver project: {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Cannot read identity file {path}: {message}")]
    Identity { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to a discovered or freshly initialized project
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Initialize a new project at the given directory
    ///
    /// Creates `.cleaver/` with an identity stub the user fills in.
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let dir = path.join(PROJECT_DIR);
        if dir.exists() {
            return Err(ProjectError::AlreadyInitialized(path.to_path_buf()));
        }
        std::fs::create_dir_all(&dir)?;

        let identity = dir.join(IDENTITY_FILE);
        std::fs::write(
            &identity,
            "# Who is acting in this project.\n\
             # organization_type is one of: producer, processor\n\
             user_id: usr_example\n\
             organization_id: org_example\n\
             organization_type: producer\n",
        )?;

        Ok(Self {
            root: path.to_path_buf(),
        })
    }

    /// Discover the project by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    /// Discover the project by walking up from `start`
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut dir = start;
        loop {
            if dir.join(PROJECT_DIR).is_dir() {
                return Ok(Self {
                    root: dir.to_path_buf(),
                });
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => return Err(ProjectError::NotFound),
            }
        }
    }

    /// Open an existing project rooted exactly at `path`
    pub fn open(path: &Path) -> Result<Self, ProjectError> {
        if path.join(PROJECT_DIR).is_dir() {
            Ok(Self {
                root: path.to_path_buf(),
            })
        } else {
            Err(ProjectError::NotFound)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join(DB_FILE)
    }

    pub fn identity_path(&self) -> PathBuf {
        self.root.join(PROJECT_DIR).join(IDENTITY_FILE)
    }

    /// Load the acting principal from the identity file
    pub fn load_identity(&self) -> Result<Principal, ProjectError> {
        let path = self.identity_path();
        let content = std::fs::read_to_string(&path).map_err(|e| ProjectError::Identity {
            path: path.clone(),
            message: e.to_string(),
        })?;
        serde_yml::from_str(&content).map_err(|e| ProjectError::Identity {
            path,
            message: e.to_string(),
        })
    }

    /// Build a session from the identity file
    pub fn session(&self) -> Result<StaticSession, ProjectError> {
        Ok(StaticSession::new(self.load_identity()?))
    }
}
