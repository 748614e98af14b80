use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{
    ChangeCylinderCommand, ChangeEdgeTargetCommand, ChangePlaneCommand, ChangePointTargetCommand,
    ChangeSpinCommand, ChangeTorusCommand, Command, PlaneCommandKind, RotateCommand, ScaleCommand,
    SpinCommandKind, TranslateCommand,
};
use crate::error::{Result, SessionError};

type Factory = Box<dyn Fn(Value) -> serde_json::Result<Box<dyn Command>>>;

const TYPE_KEY: &str = "type";
const ORPHANS_KEY: &str = "orphaned_commands";

/// Creates commands from their JSON form by type name.
pub struct CommandRegistry {
    factories: HashMap<String, Factory>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtin_commands()
    }
}

impl CommandRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn with_builtin_commands() -> Self {
        let mut registry = Self::empty();
        registry.add_factory("ChangeClipCommand", |value| {
            let mut command: ChangePlaneCommand = serde_json::from_value(value)?;
            command.set_kind(PlaneCommandKind::Clip);
            Ok(Box::new(command))
        });
        registry.add_factory("ChangeMirrorCommand", |value| {
            let mut command: ChangePlaneCommand = serde_json::from_value(value)?;
            command.set_kind(PlaneCommandKind::Mirror);
            Ok(Box::new(command))
        });
        registry.add_factory("ChangeTwistCommand", |value| {
            let mut command: ChangeSpinCommand = serde_json::from_value(value)?;
            command.set_kind(SpinCommandKind::Twist);
            Ok(Box::new(command))
        });
        registry.add_factory("ChangeBendCommand", |value| {
            let mut command: ChangeSpinCommand = serde_json::from_value(value)?;
            command.set_kind(SpinCommandKind::Bend);
            Ok(Box::new(command))
        });
        registry.add_type::<ScaleCommand>("ScaleCommand");
        registry.add_type::<RotateCommand>("RotateCommand");
        registry.add_type::<TranslateCommand>("TranslateCommand");
        registry.add_type::<ChangeCylinderCommand>("ChangeCylinderCommand");
        registry.add_type::<ChangeTorusCommand>("ChangeTorusCommand");
        registry.add_type::<ChangePointTargetCommand>("ChangePointTargetCommand");
        registry.add_type::<ChangeEdgeTargetCommand>("ChangeEdgeTargetCommand");
        registry
    }

    pub fn add_type<T: Command + DeserializeOwned>(&mut self, type_name: &str) {
        self.add_factory(type_name, |value| {
            let command: T = serde_json::from_value(value)?;
            Ok(Box::new(command))
        });
    }

    pub fn add_factory(
        &mut self,
        type_name: &str,
        factory: impl Fn(Value) -> serde_json::Result<Box<dyn Command>> + 'static,
    ) {
        assert!(
            !self.factories.contains_key(type_name),
            "command type {type_name} registered twice"
        );
        self.factories
            .insert(type_name.to_string(), Box::new(factory));
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Builds and validates a command, including its orphaned commands.
    /// `index` is only used for error messages.
    pub fn create(&self, index: usize, value: Value) -> Result<Box<dyn Command>> {
        let Value::Object(mut fields) = value else {
            return Err(SessionError::MissingType { index });
        };
        let type_name = match fields.remove(TYPE_KEY) {
            Some(Value::String(name)) => name,
            _ => return Err(SessionError::MissingType { index }),
        };
        let factory = self
            .factories
            .get(&type_name)
            .ok_or_else(|| SessionError::UnknownCommand(type_name.clone()))?;

        let orphans = match fields.remove(ORPHANS_KEY) {
            Some(Value::Array(values)) => values
                .into_iter()
                .map(|value| self.create(index, value))
                .collect::<Result<Vec<_>>>()?,
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                return Err(SessionError::InvalidCommand {
                    type_name,
                    details: format!("{ORPHANS_KEY} must be an array, got {other}"),
                })
            }
        };

        let mut command = factory(Value::Object(fields)).map_err(|err| {
            SessionError::InvalidCommand {
                type_name: type_name.clone(),
                details: err.to_string(),
            }
        })?;
        command
            .validate()
            .map_err(|details| SessionError::InvalidCommand {
                type_name: type_name.clone(),
                details,
            })?;
        command.base_mut().add_orphaned_commands(orphans);
        Ok(command)
    }

    /// JSON form of a command: its fields plus the type name and any
    /// orphaned commands.
    pub fn to_value(command: &dyn Command) -> Result<Value> {
        let mut fields = match command.to_json()? {
            Value::Object(fields) => fields,
            Value::Null => Map::new(),
            other => {
                let mut fields = Map::new();
                fields.insert("value".to_string(), other);
                fields
            }
        };
        fields.insert(
            TYPE_KEY.to_string(),
            Value::String(command.type_name().to_string()),
        );
        let orphans = command.base().orphaned_commands();
        if !orphans.is_empty() {
            let values = orphans
                .iter()
                .map(|orphan| Self::to_value(&**orphan))
                .collect::<Result<Vec<_>>>()?;
            fields.insert(ORPHANS_KEY.to_string(), Value::Array(values));
        }
        Ok(Value::Object(fields))
    }
}
