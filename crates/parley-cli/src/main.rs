//! parley - parse and run chat command arguments from the terminal.
//!
//! `parley parse` shows how a piece of text splits into phrases and flags.
//! `parley run` loads a command description and runs it, asking for missing
//! arguments on stdout and reading the answers from stdin.

use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use parley_args::{ChannelConversation, CommandConfig, Flag, Handler, Message, Outcome};
use parley_parser::{ContentParser, ParseResult};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Parse and run chat command arguments")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split text into phrases, flags and option flags
    Parse {
        /// A flag word, may be repeated
        #[arg(long = "flag", value_name = "WORD")]
        flags: Vec<String>,

        /// An option flag word, may be repeated
        #[arg(long = "option", value_name = "WORD")]
        options: Vec<String>,

        /// Split arguments on this separator instead of whitespace
        #[arg(long)]
        separator: Option<String>,

        /// Treat quotes as ordinary characters
        #[arg(long)]
        no_quotes: bool,

        /// Print the parse result as JSON
        #[arg(long)]
        json: bool,

        /// Text to parse
        #[arg(default_value = "")]
        text: String,
    },

    /// Run a command description against text, prompting on stdin
    Run {
        /// Command description (JSON)
        #[arg(long, value_name = "FILE")]
        command: PathBuf,

        /// Author id for the invoking message
        #[arg(long, default_value = "user")]
        user: String,

        /// Channel id for the invoking message
        #[arg(long, default_value = "terminal")]
        channel: String,

        /// Replies starting with this prefix break out of a prompt
        #[arg(long, default_value = "!")]
        prefix: String,

        /// Command input
        #[arg(default_value = "")]
        text: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let result = match args.command {
        Commands::Parse {
            flags,
            options,
            separator,
            no_quotes,
            json,
            text,
        } => {
            let parser = ContentParser::new()
                .flag_words(flags)
                .option_flag_words(options)
                .separator(separator)
                .quoted(!no_quotes);
            print_parse(&parser.parse(&text), json)
        }
        Commands::Run {
            command,
            user,
            channel,
            prefix,
            text,
        } => run(command, user, channel, prefix, text).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn print_parse(result: &ParseResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    for (i, entry) in result.all.iter().enumerate() {
        println!(
            "{:>3}  {:<10} {:<12} {:<20} {:?}",
            i,
            format!("{:?}", entry.kind),
            entry.key(),
            entry.value.as_deref().unwrap_or(""),
            entry.raw
        );
    }
    Ok(())
}

async fn run(
    path: PathBuf,
    user: String,
    channel: String,
    prefix: String,
    text: String,
) -> anyhow::Result<()> {
    let command = CommandConfig::from_path(&path)
        .and_then(CommandConfig::into_command)
        .with_context(|| format!("Failed to load command from {}", path.display()))?;
    tracing::debug!(command = %command.id, "loaded command");

    let (conversation, replies, mut sent) = ChannelConversation::new("parley");

    let printer = tokio::spawn(async move {
        while let Some(message) = sent.recv().await {
            println!("{}", message.content);
        }
    });

    // A plain thread, so a pending read never holds up runtime shutdown.
    let reply_channel = channel.clone();
    let reply_user = user.clone();
    std::thread::spawn(move || {
        for line in io::stdin().lines() {
            match line {
                Ok(line) => {
                    let reply = Message::new(reply_channel.as_str(), reply_user.as_str(), line);
                    if replies.send(reply).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });

    let handler = Handler::new(Arc::new(conversation))
        .with_detector(move |message: &Message| message.content.starts_with(prefix.as_str()));
    let message = Message::new(channel, user, text.clone());
    let outcome = command.parse(&handler, &message, &text).await;

    // Dropping the handler closes the outgoing channel so the printer drains.
    drop(handler);
    printer.await.context("Prompt printer failed")?;

    match outcome? {
        Outcome::Value(value) => println!("{}", value.to_json()),
        Outcome::Flag(flag) => println!("{}", describe_flag(&flag)),
    }
    Ok(())
}

fn describe_flag(flag: &Flag) -> String {
    match flag {
        Flag::Cancel => "cancelled".to_string(),
        Flag::Retry(message) => format!("retry with new command: {}", message.content),
        Flag::Fail(reason) => format!("failed: {}", reason.to_json()),
        Flag::Continue {
            command,
            ignore_checks,
            rest,
        } => format!(
            "continue to {} with {:?}{}",
            command,
            rest.as_deref().unwrap_or(""),
            if *ignore_checks { " (ignoring checks)" } else { "" }
        ),
    }
}
