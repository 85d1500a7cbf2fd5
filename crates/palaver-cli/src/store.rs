use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use palaver::client::Conversation;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One saved chat thread. Exactly one chat in the store is selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    pub conversation: Conversation,
    pub is_selected: bool,
}

impl Chat {
    fn new() -> Self {
        Chat {
            id: Uuid::new_v4().to_string(),
            conversation: Conversation::new(),
            is_selected: true,
        }
    }
}

/// Persisted chat state. Loaded from and saved to one JSON document through
/// an explicit boundary; nothing here is global.
pub struct ChatStore {
    path: PathBuf,
    chats: Vec<Chat>,
}

pub fn default_store_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine the data directory"))?;
    Ok(data_dir.join("palaver").join("chats.json"))
}

impl ChatStore {
    /// Load the store, starting with a single fresh chat if the file does
    /// not exist yet.
    pub fn load(path: PathBuf) -> Result<Self> {
        let chats = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut chats: Vec<Chat> = serde_json::from_str(&content)?;
            if chats.is_empty() {
                chats.push(Chat::new());
            }
            if !chats.iter().any(|chat| chat.is_selected) {
                if let Some(last) = chats.last_mut() {
                    last.is_selected = true;
                }
            }
            chats
        } else {
            vec![Chat::new()]
        };

        Ok(ChatStore { path, chats })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.chats)?)?;
        Ok(())
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn selected(&self) -> &Chat {
        self.chats
            .iter()
            .find(|chat| chat.is_selected)
            .unwrap_or_else(|| &self.chats[0])
    }

    pub fn selected_mut(&mut self) -> &mut Chat {
        let index = self
            .chats
            .iter()
            .position(|chat| chat.is_selected)
            .unwrap_or(0);
        &mut self.chats[index]
    }

    /// Start a fresh chat and select it.
    pub fn add_chat(&mut self) -> &Chat {
        for chat in &mut self.chats {
            chat.is_selected = false;
        }
        self.chats.push(Chat::new());
        self.selected()
    }

    /// Select the chat at `index` (as shown by `chats()`).
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.chats.len() {
            return false;
        }
        for (i, chat) in self.chats.iter_mut().enumerate() {
            chat.is_selected = i == index;
        }
        true
    }

    /// Delete the chat at `index`. Deleting the only chat replaces it with a
    /// fresh one; otherwise selection moves to the last remaining chat.
    pub fn delete(&mut self, index: usize) -> bool {
        if index >= self.chats.len() {
            return false;
        }

        if self.chats.len() == 1 {
            self.chats = vec![Chat::new()];
            return true;
        }

        self.chats.remove(index);
        let last = self.chats.len() - 1;
        for (i, chat) in self.chats.iter_mut().enumerate() {
            chat.is_selected = i == last;
        }
        true
    }
}
