use std::path::PathBuf;

use anyhow::{Context, Result};
use arena_core::{ArenaConfig, ConversationTurn, IntakeClient, TurnRole};
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct IntakeArgs {
    #[arg(long, help = "Resume an existing session instead of starting a new one")]
    pub session: Option<String>,

    #[arg(short, long, help = "Message to send (repeatable, sent in order)")]
    pub message: Vec<String>,

    #[arg(long, help = "Audio clip to send as a voice turn")]
    pub voice: Option<PathBuf>,

    #[arg(long, default_value = "audio/webm", help = "MIME type of the voice clip")]
    pub voice_mime: String,

    #[arg(long, help = "Finalize the requirements document")]
    pub finalize: bool,

    #[arg(short, long, help = "Write the finalized markdown to this file")]
    pub output: Option<PathBuf>,
}

fn print_turn(turn: &ConversationTurn) {
    match turn.role {
        TurnRole::User => println!("  {} {}", "you:".bold(), turn.content),
        TurnRole::Assistant => println!("  {} {}", "ai:".cyan().bold(), turn.content),
    }
}

pub async fn cmd_intake(config: &ArenaConfig, args: IntakeArgs) -> Result<()> {
    let base_url = config.backend.public_url();
    let client = match args.session {
        Some(session) => IntakeClient::with_session(base_url, session),
        None => IntakeClient::new(base_url),
    };

    println!("{}", "Requirements Intake".cyan().bold());
    println!("  {} Session: {}", "→".blue(), client.session_id().yellow());
    println!();

    let history = client.start_session().await?;
    for turn in &history {
        print_turn(turn);
    }

    for message in &args.message {
        print_turn(&ConversationTurn::user(message.as_str()));
        let reply = client.send_text(message).await?;
        print_turn(&ConversationTurn::assistant(reply.reply));
    }

    if let Some(path) = &args.voice {
        let audio = std::fs::read(path)
            .with_context(|| format!("Failed to read audio file {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "recording.webm".to_string());

        let turn = client.send_voice(audio, &file_name, &args.voice_mime).await?;
        print_turn(&ConversationTurn::user(turn.transcript));
        print_turn(&ConversationTurn::assistant(turn.reply));
        if turn.audio_b64.is_some() {
            println!("    {}", "(spoken reply available)".dimmed());
        }
    }

    if args.finalize {
        let doc = client.finalize().await?;
        match &args.output {
            Some(path) => {
                std::fs::write(path, &doc.markdown)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!();
                println!(
                    "{} Requirements written to {}",
                    "✓".green().bold(),
                    path.display()
                );
            }
            None => {
                println!();
                println!("{}", doc.markdown);
            }
        }
    }

    Ok(())
}
