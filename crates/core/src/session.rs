//! JSON session files: app info, the command log and the undo cursor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::{AppInfo, CommandList, CommandRegistry};
use crate::error::{Result, SessionError};

pub const SESSION_VERSION: u32 = 1;

fn default_version() -> u32 {
    SESSION_VERSION
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default = "default_version")]
    version: u32,
    app_info: Option<AppInfo>,
    #[serde(default)]
    commands: Vec<Value>,
    #[serde(default)]
    current_index: usize,
}

/// Parses a session and builds its commands with `registry`. The result is
/// validated but not executed; hand it to
/// [`CommandManager::process_command_list`](crate::command::CommandManager::process_command_list).
pub fn read_session(registry: &CommandRegistry, data: &[u8]) -> Result<CommandList> {
    let file: SessionFile = serde_json::from_slice(data)?;
    if file.version > SESSION_VERSION {
        return Err(SessionError::UnsupportedVersion {
            found: file.version,
            latest: SESSION_VERSION,
        });
    }
    let app_info = file.app_info.ok_or(SessionError::MissingAppInfo)?;

    let mut list = CommandList::new();
    list.set_app_info(app_info);
    for (index, value) in file.commands.into_iter().enumerate() {
        list.add_command(registry.create(index, value)?);
    }
    let count = list.command_count();
    if file.current_index > count {
        return Err(SessionError::InvalidCurrentIndex {
            index: file.current_index,
            count,
        });
    }
    list.set_current_index(file.current_index);
    list.validate()?;
    tracing::info!(
        "read session with {count} command(s), current index {}",
        file.current_index
    );
    Ok(list)
}

pub fn read_session_str(registry: &CommandRegistry, text: &str) -> Result<CommandList> {
    read_session(registry, text.as_bytes())
}

/// Serializes `list` in the format [`read_session`] accepts.
pub fn write_session(list: &CommandList) -> Result<String> {
    let commands = list
        .commands()
        .map(CommandRegistry::to_value)
        .collect::<Result<Vec<_>>>()?;
    let file = SessionFile {
        version: SESSION_VERSION,
        app_info: Some(list.app_info().cloned().unwrap_or_default()),
        commands,
        current_index: list.current_index(),
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::command::testing::{label, recording_manager, test_registry, TestCommand};
    use crate::command::TranslateCommand;

    fn labels(list: &CommandList) -> Vec<String> {
        list.commands().map(label).collect()
    }

    #[test]
    fn reads_commands_and_cursor() {
        let text = json!({
            "app_info": {
                "version": "0.1.0",
                "session_state": { "edge_target_visible": true, "hidden_models": ["A"] }
            },
            "commands": [
                { "type": "TestCommand", "label": "TC0" },
                {
                    "type": "TestCommand",
                    "label": "TC1",
                    "orphaned_commands": [{ "type": "TestCommand", "label": "Old", "is_orphan": true }]
                }
            ],
            "current_index": 1
        })
        .to_string();

        let list = read_session_str(&test_registry(), &text).expect("session");
        assert_eq!(labels(&list), vec!["TC0", "TC1"]);
        assert_eq!(list.current_index(), 1);
        assert_eq!(list.command(1).base().orphaned_commands().len(), 1);
        let state = list.session_state().expect("state");
        assert!(state.edge_target_visible);
        assert!(!state.point_target_visible);
        assert_eq!(state.hidden_models, vec!["A".to_string()]);
    }

    #[test]
    fn written_session_reads_back() {
        let mut list = CommandList::new();
        list.reset();
        list.session_state_mut().axis_aligned = true;
        list.add_command(TestCommand::boxed("A"));
        list.add_command(Box::new(TranslateCommand::new(
            vec!["Box".to_string()],
            glam::Vec3::new(1.0, 0.0, 0.0),
        )));
        list.set_current_index(1);

        let text = write_session(&list).expect("write");
        let value: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(value["version"], SESSION_VERSION);
        assert_eq!(value["commands"][1]["type"], "TranslateCommand");
        assert_eq!(value["current_index"], 1);

        let read = read_session_str(&test_registry(), &text).expect("read");
        assert_eq!(read.command_count(), 2);
        assert_eq!(read.current_index(), 1);
        assert!(read.session_state().expect("state").axis_aligned);
        let translate = read
            .command(1)
            .downcast_ref::<TranslateCommand>()
            .expect("translate");
        assert_eq!(translate.translation, glam::Vec3::X);
    }

    #[test]
    fn read_session_replays_through_manager() {
        let text = json!({
            "app_info": { "version": "0.1.0" },
            "commands": [
                { "type": "TestCommand", "label": "A" },
                { "type": "TestCommand", "label": "B" }
            ],
            "current_index": 1
        })
        .to_string();
        let list = read_session_str(&test_registry(), &text).expect("session");
        let (mut manager, log) = recording_manager();
        manager.process_command_list(list).expect("replay");
        assert_eq!(log.borrow_mut().take(), vec!["do(A)", "do(B)", "undo(B)"]);
        assert!(manager.can_redo());
    }

    #[test]
    fn rejects_bad_sessions() {
        let registry = test_registry();

        let err = read_session_str(&registry, r#"{ "commands": [] }"#).unwrap_err();
        assert!(matches!(err, SessionError::MissingAppInfo));

        let err = read_session_str(&registry, r#"{ "version": 9, "app_info": { "version": "x" } }"#)
            .unwrap_err();
        assert!(matches!(err, SessionError::UnsupportedVersion { found: 9, latest: 1 }));

        let err = read_session_str(
            &registry,
            r#"{ "app_info": { "version": "x" }, "commands": [], "current_index": 2 }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::InvalidCurrentIndex { index: 2, count: 0 }));

        let err = read_session_str(
            &registry,
            r#"{ "app_info": { "version": "x" }, "commands": [{ "type": "Nope" }] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::UnknownCommand(name) if name == "Nope"));

        let err = read_session_str(&registry, "not json").unwrap_err();
        assert!(matches!(err, SessionError::Json(_)));
    }
}
