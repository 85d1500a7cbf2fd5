mod input;
mod session;
mod store;

use std::env;
use std::io::{self, Write};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use palaver::client::{Conversation, RelayClient, StreamSession};
use palaver::completion::RequestContext;
use palaver::models::message::Message;

use crate::session::Session;
use crate::store::{default_store_path, ChatStore};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Relay server URL
    #[arg(short, long, default_value = "http://127.0.0.1:3000")]
    server: String,

    /// Model to use
    #[arg(short, long, default_value = "gpt-4.1")]
    model: String,

    /// System role text sent with every exchange
    #[arg(long, default_value = "")]
    role: String,

    /// API key (can also be set via OPENAI_API_KEY environment variable;
    /// when absent, the relay falls back to its own configured key)
    #[arg(long)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive chat session (the default)
    Session,
    /// Send one prompt and print the reply
    Ask { prompt: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let api_key = cli
        .api_key
        .clone()
        .or_else(|| env::var("OPENAI_API_KEY").ok())
        .unwrap_or_default();

    let ctx = RequestContext {
        model: cli.model.clone(),
        role: cli.role.clone(),
        api_key,
    };

    let client = RelayClient::new(cli.server.clone())?;

    match cli.command.unwrap_or(Command::Session) {
        Command::Session => {
            let store = ChatStore::load(default_store_path()?)?;
            Session::new(client, store, ctx).run().await
        }
        Command::Ask { prompt } => ask(&client, &ctx, prompt).await,
    }
}

async fn ask(client: &RelayClient, ctx: &RequestContext, prompt: String) -> Result<()> {
    let mut conversation = Conversation::new();
    let session = StreamSession::new();

    let mut printed = 0;
    let result = client
        .append_with(
            &mut conversation,
            Message::user().with_text(prompt),
            ctx,
            &session,
            |text| {
                print!("{}", &text[printed..]);
                let _ = io::stdout().flush();
                printed = text.len();
            },
        )
        .await;
    println!();

    if let Some(error) = conversation.error {
        bail!(error);
    }
    result?;
    Ok(())
}
