//! Test doubles shared by the unit tests in this crate.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use luau_watch_types::RawSettings;
use tokio::sync::oneshot;

use crate::error::LaunchError;
use crate::host::{ConfigSource, Notifier, PickItem, Picker, StateStore, TypeInstaller, Workspace};
use crate::process::{LaunchFut, ProcessLauncher, ProcessOutput};

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub command: String,
    pub args: Vec<String>,
}

pub(crate) enum Reply {
    Output(ProcessOutput),
    LaunchFailure,
    Deferred(oneshot::Receiver<ProcessOutput>),
}

impl Reply {
    pub fn output(status: Option<i32>, stdout: &str, stderr: &str) -> Self {
        Self::Output(ProcessOutput {
            status,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        })
    }
}

/// Replays queued replies in launch order; empty output once the queue runs dry.
#[derive(Default)]
pub(crate) struct ScriptedLauncher {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<VecDeque<Reply>>,
    working_dir: Option<PathBuf>,
}

impl ScriptedLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Queue a reply that resolves only when the returned sender fires.
    pub fn deferred(&self) -> oneshot::Sender<ProcessOutput> {
        let (tx, rx) = oneshot::channel();
        self.push(Reply::Deferred(rx));
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessLauncher for ScriptedLauncher {
    fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    fn launch(&self, command: &str, args: Vec<String>) -> LaunchFut {
        self.calls.lock().unwrap().push(Call {
            command: command.to_string(),
            args,
        });
        let reply = self.replies.lock().unwrap().pop_front();
        let command = command.to_string();

        Box::pin(async move {
            match reply {
                None => Ok(ProcessOutput::default()),
                Some(Reply::Output(output)) => Ok(output),
                Some(Reply::LaunchFailure) => Err(LaunchError::Spawn {
                    command,
                    source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
                }),
                Some(Reply::Deferred(rx)) => Ok(rx.await.unwrap_or_default()),
            }
        })
    }
}

pub(crate) fn gnu_line(path: &str, line: u32, category: &str, message: &str) -> String {
    format!("{path}:{line}.1-{line}.5: {category}: {message}")
}

pub(crate) fn stdout(text: &str) -> ProcessOutput {
    ProcessOutput {
        status: Some(0),
        stdout: text.to_string(),
        stderr: String::new(),
    }
}

/// In-memory host that records everything shown to the user.
#[derive(Default)]
pub(crate) struct FakeHost {
    pub roots: Vec<PathBuf>,
    pub state: HashMap<String, PathBuf>,
    pub state_writes: usize,
    pub raw_settings: RawSettings,
    pub config_error: Option<String>,
    pub persisted_commands: Vec<String>,
    pub errors: Vec<String>,
    pub documents: Vec<(String, String)>,
    /// Scripted prompt answers, consumed in order. Empty means dismissed.
    pub picks: VecDeque<Option<usize>>,
    pub prompts: Vec<Vec<PickItem>>,
    pub install_result: Option<PathBuf>,
}

impl FakeHost {
    pub fn with_roots(roots: &[&Path]) -> Self {
        Self {
            roots: roots.iter().map(|r| r.to_path_buf()).collect(),
            ..Self::default()
        }
    }
}

impl Workspace for FakeHost {
    fn roots(&self) -> Vec<PathBuf> {
        self.roots.clone()
    }
}

impl Picker for FakeHost {
    fn pick(&mut self, _title: &str, items: &[PickItem]) -> Option<usize> {
        self.prompts.push(items.to_vec());
        self.picks.pop_front().flatten()
    }
}

impl StateStore for FakeHost {
    fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.state.get(key).cloned()
    }

    fn set_path(&mut self, key: &str, value: Option<&Path>) -> anyhow::Result<()> {
        self.state_writes += 1;
        match value {
            Some(path) => self.state.insert(key.to_string(), path.to_path_buf()),
            None => self.state.remove(key),
        };
        Ok(())
    }
}

impl ConfigSource for FakeHost {
    fn load_settings(&self) -> anyhow::Result<RawSettings> {
        match &self.config_error {
            Some(msg) => Err(anyhow::anyhow!("{msg}")),
            None => Ok(self.raw_settings.clone()),
        }
    }

    fn persist_analyzer_command(&mut self, command: &str) -> anyhow::Result<()> {
        self.persisted_commands.push(command.to_string());
        self.raw_settings.command = Some(command.to_string());
        Ok(())
    }
}

impl Notifier for FakeHost {
    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn show_document(&mut self, language: &str, content: &str) {
        self.documents
            .push((language.to_string(), content.to_string()));
    }
}

impl TypeInstaller for FakeHost {
    fn install_types(&mut self, _roots: &[PathBuf]) -> anyhow::Result<PathBuf> {
        self.install_result
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no type definitions available"))
    }
}
