use std::io::{self, Write};

use anyhow::Result;
use console::style;
use palaver::client::{RelayClient, StreamSession};
use palaver::completion::RequestContext;
use palaver::models::content::{ImageContent, MessageContent};
use palaver::models::message::Message;
use palaver::models::role::Role;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::input::{self, SessionInput};
use crate::store::ChatStore;

const PROMPT: &str = "\x1b[1m\x1b[38;5;36m(you)> \x1b[0m";

pub struct Session {
    client: RelayClient,
    store: ChatStore,
    ctx: RequestContext,
    /// Images queued with /attach, consumed by the next send.
    attachments: Vec<ImageContent>,
}

impl Session {
    pub fn new(client: RelayClient, store: ChatStore, ctx: RequestContext) -> Self {
        Session {
            client,
            store,
            ctx,
            attachments: Vec::new(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        println!(
            "palaver session {} {}",
            style(format!("({})", self.ctx.model)).dim(),
            style("- /exit to quit, /attach <path> to add an image").dim()
        );
        self.render_selected_history();

        let mut editor = DefaultEditor::new()?;

        loop {
            let line = match editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            };
            let _ = editor.add_history_entry(&line);

            match input::parse(&line) {
                SessionInput::Message(text) => self.send(text).await?,
                SessionInput::Attach(path) => match input::encode_attachment(&path) {
                    Ok(image) => {
                        self.attachments.push(image);
                        println!(
                            "{}",
                            style(format!("attached {} for the next message", path.display()))
                                .dim()
                        );
                    }
                    Err(err) => eprintln!("{}", style(err).red()),
                },
                SessionInput::NewChat => {
                    self.store.add_chat();
                    self.store.save()?;
                    println!("{}", style("started a new chat").dim());
                }
                SessionInput::ListChats => self.render_chat_list(),
                SessionInput::SwitchChat(index) => {
                    if self.store.select(index) {
                        self.store.save()?;
                        self.render_selected_history();
                    } else {
                        eprintln!("{}", style("no chat with that number").red());
                    }
                }
                SessionInput::DeleteChat(index) => {
                    if self.store.delete(index) {
                        self.store.save()?;
                        println!("{}", style("chat deleted").dim());
                    } else {
                        eprintln!("{}", style("no chat with that number").red());
                    }
                }
                SessionInput::Exit => break,
                SessionInput::Empty => continue,
                SessionInput::Unknown(command) => {
                    eprintln!("{}", style(format!("unknown command: {}", command)).red());
                }
            }
        }

        self.store.save()?;
        Ok(())
    }

    async fn send(&mut self, text: String) -> Result<()> {
        let mut message = Message::user().with_text(text);
        for image in self.attachments.drain(..) {
            message = message.with_content(MessageContent::Image(image));
        }

        let session = StreamSession::new();
        let stopper = session.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stopper.stop();
            }
        });

        print!("{}", style("(assistant)> ").bold().green());
        io::stdout().flush()?;

        let chat = self.store.selected_mut();
        let mut printed = 0;
        let result = self
            .client
            .append_with(
                &mut chat.conversation,
                message,
                &self.ctx,
                &session,
                |text| {
                    // the reply only ever grows, so the unprinted tail is a
                    // plain byte suffix
                    print!("{}", &text[printed..]);
                    let _ = io::stdout().flush();
                    printed = text.len();
                },
            )
            .await;
        watcher.abort();
        println!();

        if session.is_stopped() {
            println!("{}", style("(stopped)").dim());
        }
        if let Some(error) = chat.conversation.error.clone() {
            eprintln!("{}", style(error).red());
        } else if let Err(err) = result {
            eprintln!("{}", style(err).red());
        }

        self.store.save()?;
        Ok(())
    }

    fn render_selected_history(&self) {
        for message in &self.store.selected().conversation.messages {
            render_message(message);
        }
    }

    fn render_chat_list(&self) {
        for (index, chat) in self.store.chats().iter().enumerate() {
            let title = chat
                .conversation
                .messages
                .first()
                .map(|m| m.text())
                .unwrap_or_default();
            let marker = if chat.is_selected { "*" } else { " " };
            println!("{} [{}] {}", marker, index, truncate(&title, 60));
        }
    }
}

fn render_message(message: &Message) {
    let prefix = match message.role {
        Role::User => style("(you)> ").bold().cyan(),
        Role::Assistant => style("(assistant)> ").bold().green(),
        Role::System => style("(system)> ").bold().dim(),
    };

    let mut rendered = message.text();
    let images = message
        .content
        .iter()
        .filter(|part| part.as_image().is_some())
        .count();
    if images > 0 {
        rendered.push_str(&format!(" [{} image(s)]", images));
    }

    println!("{}{}", prefix, rendered);
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let prefix: String = text.chars().take(max_chars).collect();
        format!("{}…", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 60), "short");
        assert_eq!(truncate("ábcdef", 3), "ábc…");
    }
}
