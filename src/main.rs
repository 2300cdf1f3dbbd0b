use anyhow::Result;
use clap::Parser;
use rcon_relay::cli::{Cli, Commands};
use rcon_relay::{RconConnection, RconDispatcher};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Exec {
            command,
            priority,
            connection,
        } => {
            let config = connection.resolve()?;
            let dispatcher = RconDispatcher::new(config);
            let command = command.join(" ");

            let response = dispatcher
                .send_with_priority(&command, priority.into())
                .await?;
            if response.is_empty() {
                info!("command accepted with no response payload");
            } else {
                println!("{}", response);
            }
            dispatcher.shutdown().await;
        }
        Commands::Ping { connection } => {
            let config = connection.resolve()?;
            let connection =
                RconConnection::new(&config.host, config.port, &config.password).with_retry_limit(1);

            let response = connection.send_command("list").await?;
            info!(%response, "server reachable and password accepted");
            connection.close().await;
            println!("ok");
        }
    }

    Ok(())
}
