// src/editor/commands.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EditorError;

/// Formatting commands understood by an editing surface. Names follow the
/// browser command identifiers so clients can send them unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandKind {
    Bold,
    Italic,
    Underline,
    ForeColor,
    FontName,
    FontSize,
    JustifyLeft,
    JustifyCenter,
    JustifyRight,
    JustifyFull,
    InsertUnorderedList,
    InsertOrderedList,
    RemoveFormat,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Bold => "bold",
            CommandKind::Italic => "italic",
            CommandKind::Underline => "underline",
            CommandKind::ForeColor => "foreColor",
            CommandKind::FontName => "fontName",
            CommandKind::FontSize => "fontSize",
            CommandKind::JustifyLeft => "justifyLeft",
            CommandKind::JustifyCenter => "justifyCenter",
            CommandKind::JustifyRight => "justifyRight",
            CommandKind::JustifyFull => "justifyFull",
            CommandKind::InsertUnorderedList => "insertUnorderedList",
            CommandKind::InsertOrderedList => "insertOrderedList",
            CommandKind::RemoveFormat => "removeFormat",
        }
    }

    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            CommandKind::ForeColor | CommandKind::FontName | CommandKind::FontSize
        )
    }

    /// Text alignment keyword for the justify commands
    pub fn alignment(&self) -> Option<&'static str> {
        match self {
            CommandKind::JustifyLeft => Some("left"),
            CommandKind::JustifyCenter => Some("center"),
            CommandKind::JustifyRight => Some("right"),
            CommandKind::JustifyFull => Some("justify"),
            _ => None,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim() {
            "bold" => CommandKind::Bold,
            "italic" => CommandKind::Italic,
            "underline" => CommandKind::Underline,
            "foreColor" => CommandKind::ForeColor,
            "fontName" => CommandKind::FontName,
            "fontSize" => CommandKind::FontSize,
            "justifyLeft" => CommandKind::JustifyLeft,
            "justifyCenter" => CommandKind::JustifyCenter,
            "justifyRight" => CommandKind::JustifyRight,
            "justifyFull" => CommandKind::JustifyFull,
            "insertUnorderedList" => CommandKind::InsertUnorderedList,
            "insertOrderedList" => CommandKind::InsertOrderedList,
            "removeFormat" => CommandKind::RemoveFormat,
            other => return Err(EditorError::UnknownCommand(other.to_string())),
        };
        Ok(kind)
    }
}

/// `{kind, value}` pair sent to an editing surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorCommand {
    pub kind: CommandKind,
    #[serde(default)]
    pub value: Option<String>,
}

impl EditorCommand {
    pub fn new(kind: CommandKind) -> Self {
        Self { kind, value: None }
    }

    pub fn with_value(kind: CommandKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: Some(value.into()),
        }
    }

    /// The command value, required for commands such as `fontSize`
    pub fn required_value(&self) -> Result<&str, EditorError> {
        self.value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(EditorError::MissingValue(self.kind.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_names() {
        assert_eq!("bold".parse::<CommandKind>().unwrap(), CommandKind::Bold);
        assert_eq!(
            "insertOrderedList".parse::<CommandKind>().unwrap(),
            CommandKind::InsertOrderedList
        );
        assert!(matches!(
            "explode".parse::<CommandKind>(),
            Err(EditorError::UnknownCommand(name)) if name == "explode"
        ));
    }

    #[test]
    fn test_command_json_shape() {
        let command: EditorCommand =
            serde_json::from_str(r#"{"kind":"fontSize","value":"14"}"#).unwrap();
        assert_eq!(command, EditorCommand::with_value(CommandKind::FontSize, "14"));

        let bare: EditorCommand = serde_json::from_str(r#"{"kind":"justifyCenter"}"#).unwrap();
        assert_eq!(bare.kind.alignment(), Some("center"));
        assert!(bare.value.is_none());
    }

    #[test]
    fn test_required_value() {
        let command = EditorCommand::with_value(CommandKind::ForeColor, "  ");
        assert!(matches!(
            command.required_value(),
            Err(EditorError::MissingValue("foreColor"))
        ));
        assert!(CommandKind::FontName.requires_value());
        assert!(!CommandKind::Bold.requires_value());
    }
}
