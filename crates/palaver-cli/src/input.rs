use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use palaver::models::content::ImageContent;

/// What the user typed at the prompt, after command parsing.
#[derive(Debug, PartialEq)]
pub enum SessionInput {
    Message(String),
    Attach(PathBuf),
    NewChat,
    ListChats,
    SwitchChat(usize),
    DeleteChat(usize),
    Exit,
    Empty,
    Unknown(String),
}

pub fn parse(line: &str) -> SessionInput {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return SessionInput::Empty;
    }

    if !trimmed.starts_with('/') {
        return SessionInput::Message(trimmed.to_string());
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let argument = parts.next().map(str::trim).unwrap_or_default();

    match command {
        "/exit" | "/quit" => SessionInput::Exit,
        "/new" => SessionInput::NewChat,
        "/chats" => SessionInput::ListChats,
        "/switch" => match argument.parse::<usize>() {
            Ok(index) => SessionInput::SwitchChat(index),
            Err(_) => SessionInput::Unknown(trimmed.to_string()),
        },
        "/delete" => match argument.parse::<usize>() {
            Ok(index) => SessionInput::DeleteChat(index),
            Err(_) => SessionInput::Unknown(trimmed.to_string()),
        },
        "/attach" if !argument.is_empty() => SessionInput::Attach(PathBuf::from(argument)),
        _ => SessionInput::Unknown(trimmed.to_string()),
    }
}

/// Inline a local image file as a `data:` URI locator, so the multimodal
/// path works without an object-storage upload.
pub fn encode_attachment(path: &Path) -> Result<ImageContent> {
    let data = fs::read(path)
        .with_context(|| format!("could not read attachment {}", path.display()))?;
    let mime = mime_guess::from_path(path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(ImageContent::from_data(&data, &mime))
}
