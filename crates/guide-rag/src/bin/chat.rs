//! Terminal chat over the skincare guide
//!
//! Run with: cargo run -p guide-rag --bin guide-rag-chat -- --pdf OTC.pdf

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use console::style;
use guide_rag::{Answer, Error, GuideConfig, GuideSession};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Ask questions about a PDF skincare guide
#[derive(Parser, Debug)]
#[command(name = "guide-rag-chat", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Guide PDF (overrides document.pdf_path)
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Directory for extracted images (overrides document.image_dir)
    #[arg(long)]
    image_dir: Option<PathBuf>,

    /// Answer a single question and exit
    #[arg(short, long)]
    question: Option<String>,
}

fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

/// Exit status for a session that failed to start
fn startup_exit_code(error: &Error) -> u8 {
    if error.is_startup_blocking() {
        2
    } else {
        1
    }
}

fn print_answer(answer: &Answer) {
    println!("{} {}", style("Bot:").bold().green(), answer.text.trim_end());
    for image in &answer.images {
        println!(
            "     {} {}",
            style(image.caption()).italic().magenta(),
            style(image.path.display()).dim()
        );
    }
    println!();
}

async fn ask(session: &GuideSession, question: &str) -> anyhow::Result<()> {
    println!("{} {}", style("You:").bold().cyan(), question);

    let pb = spinner("Thinking...")?;
    let result = session.ask(question).await;
    pb.finish_and_clear();

    match result {
        Ok(answer) => print_answer(&answer),
        Err(e) if e.is_service() => eprintln!(
            "{} {}\n{}\n",
            style("Service error:").bold().red(),
            e,
            style("The guide is still loaded; ask again to retry.").dim()
        ),
        Err(e) => eprintln!("{} {}\n", style("Error:").bold().red(), e),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // A missing .env is fine; the variable may come from the environment
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "guide_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = match GuideConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", style("Cannot proceed:").bold().red(), e);
            return Ok(ExitCode::from(startup_exit_code(&e)));
        }
    };
    if let Some(pdf) = args.pdf {
        config.document.pdf_path = pdf;
    }
    if let Some(image_dir) = args.image_dir {
        config.document.image_dir = image_dir;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("  - Guide: {}", config.document.pdf_path.display());
    tracing::info!("  - Chat model: {}", config.llm.chat_model);
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let pb = spinner("Loading guide...")?;
    let started = GuideSession::start(config).await;
    pb.finish_and_clear();

    let session = match started {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{} {}", style("Cannot proceed:").bold().red(), e);
            return Ok(ExitCode::from(startup_exit_code(&e)));
        }
    };

    println!(
        "{} {} pages, {} images, {} linked keywords\n",
        style("Loaded").bold(),
        session.document().total_pages,
        session.document().images.len(),
        session.keyword_map().len()
    );

    if let Some(question) = args.question {
        ask(&session, &question).await?;
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "{}",
        style("Ask a question about acne or skincare (exit or quit to leave)").dim()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }
        ask(&session, question).await?;
    }

    Ok(ExitCode::SUCCESS)
}
