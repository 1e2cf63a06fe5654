//! Competition Watch - terminal chat.
//!
//! One line in, one answer out. Ctrl-C cancels the running turn; an empty line or
//! `exit` quits.

use std::io::Write;

use competition_watch::{agent::Agent, config::Config, conversation::Conversation};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "competition_watch=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    let agent = Agent::from_config(&config)?;
    let mut conversation = Conversation::new();

    println!("Competition Watch AI Agent ({})", agent.settings().model);
    println!("What would you like me to do?");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() || line == "exit" {
            break;
        }

        println!("Thinking...");

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        let result = agent
            .submit_with_cancel(&mut conversation, line, &cancel)
            .await;
        interrupt.abort();

        match result {
            Ok(reply) => println!("\n{}\n", reply),
            Err(e) => println!("\nError: {}\n", e),
        }
    }

    Ok(())
}
