//! Update executor: turns planned renames into directory calls.

use std::io::{BufRead, Write};

use enrollname_directory::DirectoryClient;
use enrollname_recon::{SimulateOnly, UpdateAction, UpdateOutcome};
use tracing::{info, warn};

/// How pending updates are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Send every update.
    Apply,
    /// Send nothing; every pending update is reported as simulated.
    Simulate,
    /// Ask before each update; a declined prompt counts as simulated.
    Confirm,
}

/// Answers a per-device confirmation prompt.
pub trait Confirmer {
    fn confirm(&mut self, device_id: &str, current_name: &str, desired_name: &str) -> bool;
}

/// Prompts on stderr and reads the answer from a line reader (stdin in the binary).
pub struct PromptConfirmer<R> {
    input: R,
    /// Set by answering `a`: accept every remaining prompt.
    accept_all: bool,
    /// Set by answering `q` or on end of input: decline every remaining prompt.
    decline_rest: bool,
}

impl<R: BufRead> PromptConfirmer<R> {
    pub fn new(input: R) -> Self {
        Self { input, accept_all: false, decline_rest: false }
    }
}

impl<R: BufRead> Confirmer for PromptConfirmer<R> {
    fn confirm(&mut self, device_id: &str, current_name: &str, desired_name: &str) -> bool {
        if self.accept_all {
            return true;
        }
        if self.decline_rest {
            return false;
        }

        let shown = if current_name.trim().is_empty() { "<unnamed>" } else { current_name.trim() };
        eprint!("rename {} ({} -> {})? [y/N/a/q] ", device_id, shown, desired_name);
        let _ = std::io::stderr().flush();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                eprintln!();
                self.decline_rest = true;
                false
            }
            Ok(_) => match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => true,
                "a" | "all" => {
                    self.accept_all = true;
                    true
                }
                "q" | "quit" => {
                    self.decline_rest = true;
                    false
                }
                _ => false,
            },
        }
    }
}

/// Anything that can set a display name. [`DirectoryClient`] in the binary.
pub trait NameUpdater {
    fn set_display_name(&self, device_id: &str, display_name: &str) -> Result<(), String>;
}

impl NameUpdater for DirectoryClient {
    fn set_display_name(&self, device_id: &str, display_name: &str) -> Result<(), String> {
        self.update_display_name(device_id, display_name)
            .map_err(|e| e.to_string())
    }
}

/// [`UpdateAction`] backed by the directory.
pub struct DirectoryExecutor<'a> {
    updater: &'a dyn NameUpdater,
    mode: ExecMode,
    confirmer: Option<Box<dyn Confirmer + 'a>>,
    simulated: SimulateOnly,
    /// Current names by device id, shown in confirmation prompts.
    current_names: std::collections::HashMap<&'a str, &'a str>,
}

impl<'a> DirectoryExecutor<'a> {
    pub fn new(updater: &'a dyn NameUpdater, mode: ExecMode) -> Self {
        Self {
            updater,
            mode,
            confirmer: None,
            simulated: SimulateOnly::default(),
            current_names: Default::default(),
        }
    }

    /// Prompt source for [`ExecMode::Confirm`]. Without one, every prompt is declined.
    pub fn with_confirmer(mut self, confirmer: Box<dyn Confirmer + 'a>) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    /// Device snapshot used to show the current name in prompts.
    pub fn with_devices(mut self, devices: &'a [enrollname_recon::RemoteDevice]) -> Self {
        self.current_names = devices
            .iter()
            .map(|d| (d.id.as_str(), d.current_name.as_str()))
            .collect();
        self
    }

    /// `(device_id, desired_name)` pairs held back in simulate mode.
    pub fn would_apply(&self) -> &[(String, String)] {
        &self.simulated.would_apply
    }

    fn send(&self, device_id: &str, desired_name: &str) -> UpdateOutcome {
        match self.updater.set_display_name(device_id, desired_name) {
            Ok(()) => {
                info!("renamed {} to {}", device_id, desired_name);
                UpdateOutcome::Applied
            }
            Err(msg) => {
                warn!("update of {} failed: {}", device_id, msg);
                UpdateOutcome::Failed(msg)
            }
        }
    }
}

impl UpdateAction for DirectoryExecutor<'_> {
    fn apply_name(&mut self, device_id: &str, desired_name: &str) -> UpdateOutcome {
        match self.mode {
            ExecMode::Apply => self.send(device_id, desired_name),
            ExecMode::Simulate => self.simulated.apply_name(device_id, desired_name),
            ExecMode::Confirm => {
                let current = self.current_names.get(device_id).copied().unwrap_or("");
                let accepted = self
                    .confirmer
                    .as_mut()
                    .is_some_and(|c| c.confirm(device_id, current, desired_name));
                if accepted {
                    self.send(device_id, desired_name)
                } else {
                    UpdateOutcome::NotApplied
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<(String, String)>>,
        fail_on: Option<&'static str>,
    }

    impl NameUpdater for Recorder {
        fn set_display_name(&self, device_id: &str, display_name: &str) -> Result<(), String> {
            self.calls
                .borrow_mut()
                .push((device_id.to_string(), display_name.to_string()));
            if self.fail_on == Some(device_id) {
                Err("HTTP 500: boom".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn apply_mode_sends() {
        let rec = Recorder { fail_on: Some("bad"), ..Recorder::default() };
        let mut exec = DirectoryExecutor::new(&rec, ExecMode::Apply);
        assert_eq!(exec.apply_name("ok", "PC-1"), UpdateOutcome::Applied);
        assert_eq!(
            exec.apply_name("bad", "PC-2"),
            UpdateOutcome::Failed("HTTP 500: boom".into())
        );
        assert_eq!(rec.calls.borrow().len(), 2);
    }

    #[test]
    fn simulate_mode_sends_nothing() {
        let rec = Recorder::default();
        let mut exec = DirectoryExecutor::new(&rec, ExecMode::Simulate);
        assert_eq!(exec.apply_name("dev", "PC-1"), UpdateOutcome::NotApplied);
        assert!(rec.calls.borrow().is_empty());
        assert_eq!(exec.would_apply(), [("dev".to_string(), "PC-1".to_string())]);
    }

    #[test]
    fn confirm_mode_follows_answers() {
        let rec = Recorder::default();
        let answers = std::io::Cursor::new("y\nn\nyes\n");
        let mut exec = DirectoryExecutor::new(&rec, ExecMode::Confirm)
            .with_confirmer(Box::new(PromptConfirmer::new(answers)));

        assert_eq!(exec.apply_name("d1", "PC-1"), UpdateOutcome::Applied);
        assert_eq!(exec.apply_name("d2", "PC-2"), UpdateOutcome::NotApplied);
        assert_eq!(exec.apply_name("d3", "PC-3"), UpdateOutcome::Applied);
        // End of input declines the rest
        assert_eq!(exec.apply_name("d4", "PC-4"), UpdateOutcome::NotApplied);

        let sent: Vec<String> = rec.calls.borrow().iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(sent, vec!["d1", "d3"]);
    }

    #[test]
    fn accept_all_and_quit() {
        let mut all = PromptConfirmer::new(std::io::Cursor::new("a\n"));
        assert!(all.confirm("d1", "", "PC-1"));
        assert!(all.confirm("d2", "", "PC-2"));

        let mut quit = PromptConfirmer::new(std::io::Cursor::new("q\ny\n"));
        assert!(!quit.confirm("d1", "", "PC-1"));
        assert!(!quit.confirm("d2", "", "PC-2"));
    }

    #[test]
    fn confirm_without_prompt_declines() {
        let rec = Recorder::default();
        let mut exec = DirectoryExecutor::new(&rec, ExecMode::Confirm);
        assert_eq!(exec.apply_name("d1", "PC-1"), UpdateOutcome::NotApplied);
        assert!(rec.calls.borrow().is_empty());
    }
}
