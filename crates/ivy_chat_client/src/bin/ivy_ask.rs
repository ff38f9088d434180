//! ivy-ask: ask the QA service one question from the terminal.
//! Reads config and `MCM_URL`, takes the question from the positional
//! argument or the first stdin line, prints the answer to stdout.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;
use ivy_chat_client::{config, QaClient, QaSettings};

#[derive(Parser, Debug)]
#[command(name = "ivy-ask", version, about = "Ask the Ivy QA service a question")]
struct Args {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// API key sent with the question (overrides config).
    #[arg(long = "api-key")]
    api_key: Option<String>,

    /// Request timeout in seconds (5-300, snapped to 5 s steps).
    #[arg(short = 't', long = "timeout")]
    timeout: Option<u64>,

    /// The question. Read from stdin when omitted.
    question: Option<String>,
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    process::exit(1);
}

fn main() {
    let args = Args::parse();

    let url = config::required_qa_url().unwrap_or_else(|e| fail(e));

    let cfg = match config::resolve_config_path(args.config.as_deref()) {
        Some(path) => config::load_or_default(&path).unwrap_or_else(|e| {
            fail(format!("failed to load config from {}: {}", path.display(), e))
        }),
        None => config::Config::default(),
    };

    let mut settings = QaSettings::from_config(url, &cfg);
    if let Some(key) = args.api_key {
        settings.api_key = key;
    }
    if let Some(secs) = args.timeout {
        settings = settings.with_timeout_secs(secs);
    }

    let question = match args.question {
        Some(q) => q.trim().to_string(),
        None => {
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .unwrap_or_else(|e| fail(format!("cannot read stdin: {}", e)));
            line.trim().to_string()
        }
    };
    if question.is_empty() {
        fail("no question provided (argument or stdin)");
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail(format!("failed to create runtime: {}", e)));

    let answer = rt
        .block_on(QaClient::new().ask(&question, &settings))
        .unwrap_or_else(|e| fail(e));

    let stdout = io::stdout();
    if let Err(e) = write_answer(&mut stdout.lock(), &answer) {
        fail(format!("cannot write answer: {}", e));
    }
}

fn write_answer(out: &mut impl Write, answer: &str) -> io::Result<()> {
    writeln!(out, "{}", answer)?;
    out.flush()
}
