use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use research_assistant::{
    config::Config,
    document::{self, ExtractedDocument},
    logging,
    processing::AssistantService,
};

#[derive(Parser)]
#[command(
    name = "research-cli",
    about = "Summarize documents and quiz yourself on their contents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a .pdf or .txt document.
    Summarize {
        path: PathBuf,
        #[arg(long)]
        max_length: Option<usize>,
    },
    /// Ask a question about a document.
    Ask {
        path: PathBuf,
        #[arg(long)]
        question: String,
    },
    /// Generate comprehension questions about a document.
    Questions {
        path: PathBuf,
        #[arg(long)]
        count: Option<usize>,
    },
    /// Evaluate an answer to a comprehension question.
    Evaluate {
        path: PathBuf,
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
    },
}

#[tokio::main]
async fn main() {
    logging::init_cli_tracing();
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("failed to load configuration")?;
    let service = AssistantService::from_config(&config);

    match cli.command {
        Command::Summarize { path, max_length } => {
            let document = load(&path)?;
            let outcome = service.summarize(document.text, max_length).await?;
            println!("{}", outcome.text());
        }
        Command::Ask { path, question } => {
            let document = load(&path)?;
            let answer = service.ask_question(document.text, question).await?;
            println!("{answer}");
        }
        Command::Questions { path, count } => {
            let document = load(&path)?;
            let questions = service.generate_questions(document.text, count).await?;
            for (index, question) in questions.iter().enumerate() {
                println!("{}. {question}", index + 1);
            }
        }
        Command::Evaluate {
            path,
            question,
            answer,
        } => {
            let document = load(&path)?;
            let evaluation = service
                .evaluate_answer(question, answer, document.text)
                .await?;
            println!("{}", evaluation.feedback);
            println!("Reference: {}", evaluation.reference_label());
        }
    }
    Ok(())
}

fn load(path: &Path) -> Result<ExtractedDocument> {
    let document = document::load_document(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    tracing::info!(
        filename = %document.filename,
        chars = document.text.len(),
        "Loaded document"
    );
    Ok(document)
}
