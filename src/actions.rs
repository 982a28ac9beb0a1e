//! Actions hosted by the overlay buttons
//!
//! What an action actually does is up to the user: each one maps to an
//! external command line from the config. The runner only spawns it and
//! reports whether the overlay should collapse afterwards.

use std::process::{Child, Command};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchAction {
    Left,
    Right,
    MissionControl,
}

/// Command bound to one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCommand {
    /// argv, first element is the program
    pub command: Vec<String>,
    /// Collapse the overlay right after spawning
    #[serde(default)]
    pub hide_after: bool,
}

impl ActionCommand {
    fn new(argv: &[&str], hide_after: bool) -> Self {
        Self {
            command: argv.iter().map(|s| s.to_string()).collect(),
            hide_after,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionBindings {
    pub left: ActionCommand,
    pub right: ActionCommand,
    pub mission_control: ActionCommand,
}

impl Default for ActionBindings {
    fn default() -> Self {
        Self {
            left: ActionCommand::new(&["xdotool", "key", "ctrl+alt+Left"], false),
            right: ActionCommand::new(&["xdotool", "key", "ctrl+alt+Right"], false),
            mission_control: ActionCommand::new(&["xdotool", "key", "super"], true),
        }
    }
}

impl ActionBindings {
    pub fn get(&self, action: SwitchAction) -> &ActionCommand {
        match action {
            SwitchAction::Left => &self.left,
            SwitchAction::Right => &self.right,
            SwitchAction::MissionControl => &self.mission_control,
        }
    }
}

/// Spawns bound commands without blocking the event loop
#[derive(Debug, Default)]
pub struct ActionRunner {
    bindings: ActionBindings,
    children: Vec<Child>,
}

impl ActionRunner {
    pub fn new(bindings: ActionBindings) -> Self {
        Self {
            bindings,
            children: Vec::new(),
        }
    }

    pub fn set_bindings(&mut self, bindings: ActionBindings) {
        self.bindings = bindings;
    }

    /// Spawn the command bound to `action`.
    /// Returns whether the overlay should be hidden afterwards.
    pub fn run(&mut self, action: SwitchAction) -> Result<bool> {
        let binding = self.bindings.get(action).clone();
        let Some((program, args)) = binding.command.split_first() else {
            warn!(action = ?action, "no command bound to action");
            return Ok(binding.hide_after);
        };

        info!(action = ?action, program = %program, "running action");
        let child = Command::new(program)
            .args(args)
            .spawn()
            .with_context(|| format!("Failed to spawn '{}' for {:?}", program, action))?;
        self.children.push(child);
        Ok(binding.hide_after)
    }

    /// Collect finished children so they do not linger as zombies
    pub fn reap(&mut self) {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = child.id(), status = %status, "action command finished");
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(pid = child.id(), error = %e, "failed to poll action command");
                false
            }
        });
    }

    pub fn running(&self) -> usize {
        self.children.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings_collapse_only_on_mission_control() {
        let bindings = ActionBindings::default();
        assert!(!bindings.get(SwitchAction::Left).hide_after);
        assert!(!bindings.get(SwitchAction::Right).hide_after);
        assert!(bindings.get(SwitchAction::MissionControl).hide_after);
    }

    #[test]
    fn test_empty_command_is_not_an_error() {
        let mut runner = ActionRunner::new(ActionBindings {
            left: ActionCommand {
                command: vec![],
                hide_after: true,
            },
            ..ActionBindings::default()
        });
        assert!(runner.run(SwitchAction::Left).unwrap());
        assert_eq!(runner.running(), 0);
    }

    #[test]
    fn test_missing_program_reports_error() {
        let mut runner = ActionRunner::new(ActionBindings {
            right: ActionCommand {
                command: vec!["/nonexistent/notch-switch-test-binary".to_string()],
                hide_after: false,
            },
            ..ActionBindings::default()
        });
        assert!(runner.run(SwitchAction::Right).is_err());
    }

    #[test]
    fn test_spawned_commands_are_reaped() {
        let mut runner = ActionRunner::new(ActionBindings {
            left: ActionCommand {
                command: vec!["true".to_string()],
                hide_after: false,
            },
            ..ActionBindings::default()
        });
        assert!(!runner.run(SwitchAction::Left).unwrap());
        assert_eq!(runner.running(), 1);

        for _ in 0..200 {
            runner.reap();
            if runner.running() == 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(runner.running(), 0);
    }

    #[test]
    fn test_bindings_parse_from_json() {
        let json = r#"{ "left": { "command": ["wmctrl", "-s", "0"] } }"#;
        let bindings: ActionBindings = serde_json::from_str(json).unwrap();
        assert_eq!(bindings.left.command, vec!["wmctrl", "-s", "0"]);
        assert!(!bindings.left.hide_after);
        assert_eq!(bindings.mission_control, ActionBindings::default().mission_control);
    }
}
