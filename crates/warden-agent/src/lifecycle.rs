//! Host lifecycle collaborators: single-instance guard and XDG autostart registration.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use warden_types::{
    InstanceGuard, InstanceReport, LifecycleError, Registration, StartupRegistrar,
};

/// Read-only view of running processes plus the ability to stop one.
pub trait ProcessTable: Send + Sync {
    /// Pids of all live processes.
    fn pids(&self) -> Vec<u32>;

    /// Executable name of a live process, `None` if it is not running.
    fn name_of(&self, pid: u32) -> Option<String>;

    fn terminate(&self, pid: u32) -> std::io::Result<()>;
}

/// Processes of the local host, read from `/proc`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostProcesses;

impl ProcessTable for HostProcesses {
    #[cfg(target_os = "linux")]
    fn pids(&self) -> Vec<u32> {
        match std::fs::read_dir("/proc") {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().to_str().and_then(|n| n.parse::<u32>().ok()))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "cannot list /proc");
                Vec::new()
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn pids(&self) -> Vec<u32> {
        Vec::new()
    }

    #[cfg(target_os = "linux")]
    fn name_of(&self, pid: u32) -> Option<String> {
        std::fs::read_to_string(format!("/proc/{}/comm", pid))
            .ok()
            .map(|s| s.trim_end().to_string())
    }

    #[cfg(not(target_os = "linux"))]
    fn name_of(&self, _pid: u32) -> Option<String> {
        None
    }

    fn terminate(&self, pid: u32) -> std::io::Result<()> {
        let status = std::process::Command::new("kill")
            .arg("-TERM")
            .arg(pid.to_string())
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(std::io::Error::other(format!("kill {} exited with {}", pid, status)))
        }
    }
}

/// Newest instance wins: every other live process running the same executable is terminated,
/// then this process records its pid in the pid file. The pid file is a marker; the pid it names
/// from an earlier run is checked too, in case the process table cannot be listed.
pub struct PidFileGuard<P = HostProcesses> {
    path: PathBuf,
    executable_name: String,
    own_pid: u32,
    processes: P,
}

impl PidFileGuard<HostProcesses> {
    pub fn new(path: impl AsRef<Path>, executable_name: impl Into<String>) -> Self {
        Self::with_processes(path, executable_name, std::process::id(), HostProcesses)
    }
}

impl<P: ProcessTable> PidFileGuard<P> {
    pub fn with_processes(
        path: impl AsRef<Path>,
        executable_name: impl Into<String>,
        own_pid: u32,
        processes: P,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            executable_name: executable_name.into(),
            own_pid,
            processes,
        }
    }

    // /proc/<pid>/comm holds at most 15 bytes of the name.
    fn same_executable(&self, name: &str) -> bool {
        let ours = self.executable_name.as_bytes();
        let theirs = name.as_bytes();
        theirs == ours || (theirs.len() == 15 && ours.starts_with(theirs))
    }

    fn previous_pid(&self) -> Option<u32> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => s.trim().parse::<u32>().ok(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read pid file");
                None
            }
        }
    }
}

impl<P: ProcessTable> InstanceGuard for PidFileGuard<P> {
    fn ensure_single_instance(&self) -> Result<InstanceReport, LifecycleError> {
        let mut candidates: BTreeSet<u32> = self.processes.pids().into_iter().collect();
        candidates.extend(self.previous_pid());
        candidates.remove(&self.own_pid);

        let mut report = InstanceReport::default();
        let mut failures = Vec::new();
        for pid in candidates {
            match self.processes.name_of(pid) {
                Some(name) if self.same_executable(&name) => match self.processes.terminate(pid) {
                    Ok(()) => {
                        tracing::info!(pid, "stopped another agent instance");
                        report.terminated.push(pid);
                    }
                    Err(e) => failures.push(format!("pid {}: {}", pid, e)),
                },
                _ => {}
            }
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LifecycleError::io(parent, e))?;
        }
        std::fs::write(&self.path, format!("{}\n", self.own_pid))
            .map_err(|e| LifecycleError::io(&self.path, e))?;

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(LifecycleError::Other(format!(
                "cannot stop other instances: {}",
                failures.join(", ")
            )))
        }
    }
}

/// Writes `<dir>/<name>.desktop` so the session starts the agent at login/boot.
pub struct AutostartRegistrar {
    dir: PathBuf,
    name: String,
}

impl AutostartRegistrar {
    pub fn new(dir: impl AsRef<Path>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            name: name.into(),
        }
    }

    pub fn entry_path(&self) -> PathBuf {
        self.dir.join(format!("{}.desktop", self.name))
    }

    fn entry(&self, executable: &Path) -> String {
        format!(
            "[Desktop Entry]\nType=Application\nName={}\nExec=\"{}\"\nNoDisplay=true\nTerminal=false\nX-GNOME-Autostart-enabled=true\n",
            self.name,
            executable.display()
        )
    }
}

impl StartupRegistrar for AutostartRegistrar {
    fn register(&self, executable: &Path) -> Result<Registration, LifecycleError> {
        let path = self.entry_path();
        let wanted = self.entry(executable);
        let outcome = match std::fs::read_to_string(&path) {
            Ok(existing) if existing == wanted => return Ok(Registration::Unchanged),
            Ok(_) => Registration::Updated,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Registration::Created,
            Err(e) => return Err(LifecycleError::io(&path, e)),
        };
        std::fs::create_dir_all(&self.dir).map_err(|e| LifecycleError::io(&self.dir, e))?;
        std::fs::write(&path, wanted).map_err(|e| LifecycleError::io(&path, e))?;
        Ok(outcome)
    }
}
