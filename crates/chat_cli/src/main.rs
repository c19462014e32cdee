use std::future::Future;
use std::io::{self, Write};

use chat_api::ChatApiClient;
use chat_cli::commands::{parse_input, Input, SlashCommand, HELP_TEXT};
use chat_cli::printer::TranscriptPrinter;
use stream_transcript::{
    logging, Conversation, EnvConfig, SendError, SessionReport, TranscriptEvent,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

type Printer = TranscriptPrinter<io::Stdout>;

#[tokio::main]
async fn main() -> io::Result<()> {
    let config = EnvConfig::from_env();
    logging::init(&config);

    let client = ChatApiClient::new(config.api_config()).map_err(io::Error::other)?;
    let mut conversation = Conversation::new(client);
    let mut events = conversation.subscribe();
    let mut printer = TranscriptPrinter::new(io::stdout());

    println!("Connected to {} (type /help for commands)", config.base_url);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            Input::Empty => {}
            Input::Prompt(text) => {
                let turn = conversation.send(&text);
                let result = stream_turn(turn, &mut events, &mut printer).await?;
                report_send(result);
            }
            Input::Command(SlashCommand::Doc(question)) => {
                let turn = conversation.send_with_document(&question);
                let result = stream_turn(turn, &mut events, &mut printer).await?;
                report_send(result);
            }
            Input::Command(SlashCommand::Upload(path)) => {
                let outcome = conversation.transport().upload_document(&path).await;
                let recorded = match outcome {
                    Ok(receipt) => conversation.record_upload(&receipt),
                    Err(error) => conversation.record_upload_failure(&error.to_string()),
                };
                if let Err(error) = recorded {
                    warn!(%error, "could not record upload outcome");
                }
                flush_events(&mut events, &mut printer)?;
            }
            Input::Command(SlashCommand::History) => {
                match conversation.transport().history().await {
                    Ok(messages) if messages.is_empty() => println!("(history is empty)"),
                    Ok(messages) => {
                        for message in messages {
                            println!("{}> {}", message.role, message.content);
                        }
                    }
                    Err(error) => println!("[error] could not load history: {error}"),
                }
            }
            Input::Command(SlashCommand::Clear) => {
                match conversation.transport().clear_history().await {
                    Ok(()) => println!("Backend history cleared."),
                    Err(error) => println!("[error] could not clear history: {error}"),
                }
            }
            Input::Command(SlashCommand::Help) => println!("{HELP_TEXT}"),
            Input::Command(SlashCommand::Quit) => break,
            Input::Command(SlashCommand::MissingArgument(usage)) => println!("usage: {usage}"),
            Input::Command(SlashCommand::Unknown(command)) => {
                println!("Unknown command: {command}. Type /help for commands.")
            }
        }
    }

    Ok(())
}

/// Drive one turn while printing transcript changes as they arrive.
async fn stream_turn<F>(
    turn: F,
    events: &mut UnboundedReceiver<TranscriptEvent>,
    printer: &mut Printer,
) -> io::Result<F::Output>
where
    F: Future,
{
    tokio::pin!(turn);
    let output = loop {
        tokio::select! {
            biased;
            Some(event) = events.recv() => printer.handle(&event)?,
            output = &mut turn => break output,
        }
    };
    flush_events(events, printer)?;
    Ok(output)
}

fn flush_events(
    events: &mut UnboundedReceiver<TranscriptEvent>,
    printer: &mut Printer,
) -> io::Result<()> {
    while let Ok(event) = events.try_recv() {
        printer.handle(&event)?;
    }
    Ok(())
}

fn report_send(result: Result<SessionReport, SendError>) {
    match result {
        Ok(report) => debug!(
            state = ?report.state,
            parse_failures = report.parse_failures,
            "turn finished"
        ),
        Err(SendError::NoDocument) => println!("Upload a document first with /upload <path>."),
        Err(error) => println!("[error] {error}"),
    }
}

fn prompt() -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()
}
