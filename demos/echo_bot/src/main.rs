//! Echo Bot Example
//!
//! Connects to a gateway, logs every received message and answers a few
//! commands through the command client:
//!
//! - `/echo <text>` replies with `<text>`
//! - `/ping` replies with `Pong!`
//!
//! # Usage
//!
//! ```bash
//! EMI_GATEWAY__ACCESS_TOKEN=secret cargo run --package echo-bot -- --config emi.toml
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use emi::core::model::MessageScene;
use emi::core::model::api::{SendGroupMessageRequest, SendPrivateMessageRequest};
use emi::prelude::*;
use emi::runtime::ConfigLoader;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(about = "Echo bot for an emi gateway")]
struct Args {
    /// Configuration file; searched for in the usual places when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, overriding EMI_PROFILE.
    #[arg(short, long)]
    profile: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn logging_handler(ctx: EventContext<MessageReceiveEvent>) {
    info!(
        scene = ?ctx.message_scene,
        peer_id = ctx.peer_id,
        sender_id = ctx.sender_id,
        "{}",
        ctx.plain_text()
    );
}

async fn command_handler(ctx: EventContext<MessageReceiveEvent>) {
    let text = ctx.plain_text();
    let reply = if let Some(content) = text.strip_prefix("/echo ") {
        content.to_string()
    } else if text.trim() == "/ping" {
        "Pong!".to_string()
    } else {
        return;
    };

    if let Err(e) = send_reply(&ctx, reply).await {
        error!(error = %e, peer_id = ctx.peer_id, "Failed to send reply");
    }
}

async fn send_reply(ctx: &EventContext<MessageReceiveEvent>, text: String) -> Result<()> {
    let cancel = CancellationToken::new();
    let message = vec![Segment::text(text)];
    let commands = ctx.bot.commands();

    match ctx.message_scene {
        MessageScene::Group => {
            let request = SendGroupMessageRequest {
                group_id: ctx.peer_id,
                message,
            };
            commands.send_group_message(&cancel, &request).await?;
        }
        MessageScene::Friend | MessageScene::Temp => {
            let request = SendPrivateMessageRequest {
                user_id: ctx.peer_id,
                message,
            };
            commands.send_private_message(&cancel, &request).await?;
        }
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(profile) = &args.profile {
        loader = loader.profile(profile);
    }
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let config = loader.load()?;
    init_logging(&config.logging)?;

    let bot = BotBuilder::from_config(&config)?
        .with_default_events()
        .on(logging_handler)
        .on(command_handler)
        .build();

    match bot.commands().get_login_info(&CancellationToken::new()).await {
        Ok(login) => info!(uin = login.uin, nickname = %login.nickname, "Logged in"),
        Err(e) => error!(error = %e, "Failed to fetch login info"),
    }

    let supervisor = Supervisor::from_config(bot, &config.stream);
    let shutdown = supervisor.shutdown_token();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.cancel();
    });

    supervisor.run().await?;
    info!("Echo bot stopped");
    Ok(())
}
