//! Process lifecycle collaborators: single-instance enforcement and start-at-boot registration.
//!
//! Both run before monitoring starts. Their failures are reported as warnings and never stop the
//! poll loop.

use std::path::PathBuf;

/// Outcome of a single-instance check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceReport {
    /// Pids of earlier instances that were terminated.
    pub terminated: Vec<u32>,
}

/// Outcome of startup registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    Updated,
    Unchanged,
}

/// Ensures this process is the only running agent.
pub trait InstanceGuard: Send + Sync {
    fn ensure_single_instance(&self) -> Result<InstanceReport, LifecycleError>;
}

/// Configures the OS to launch the agent at boot. Must be idempotent.
pub trait StartupRegistrar: Send + Sync {
    fn register(&self, executable: &std::path::Path) -> Result<Registration, LifecycleError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("lifecycle error: {0}")]
    Other(String),
}

impl LifecycleError {
    /// Wrap an io error, singling out permission failures.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            LifecycleError::PermissionDenied(path)
        } else {
            LifecycleError::Io { path, source }
        }
    }
}
