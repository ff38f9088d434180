use clap::Parser;

use ivy_chat_web::CliArgs;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(args.log_filter())
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Ivy chat v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = ivy_chat_web::run(args).await {
        eprintln!("Error: {}", e);
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}
