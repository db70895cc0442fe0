//! MedCompanion command-line front end.
//!
//! Usage:
//!   medcompanion consult "I have a headache and feel tired"
//!   medcompanion stream "What helps with a sore throat?"
//!   medcompanion scan prescription.jpg
//!   medcompanion chat
//!
//! `--offline` answers from canned payloads without contacting a provider.
//! `--stable-images` keys medication pictures on the drug name.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use medcompanion_config::CompanionConfig;
use medcompanion_contracts::{
    call::CallOptions,
    error::{CompanionError, CompanionResult},
    model::{ConditionCard, MedicalConsultationResult, MedicationEntry},
};
use medcompanion_session::ChatSession;
use medcompanion_services::{
    check_upload, imagery::DigestImagePicker, mock_data::ScriptedTransport, Companion,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// MedCompanion: AI symptom consultation and prescription reading.
///
/// Replies are general information only and never replace professional
/// medical advice.
#[derive(Parser)]
#[command(name = "medcompanion", about = "MedCompanion AI integration demo")]
struct Cli {
    /// TOML config file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use canned replies instead of calling the provider.
    #[arg(long, global = true)]
    offline: bool,

    /// Per-call deadline in seconds.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Pick medication images by name so a drug keeps the same picture.
    #[arg(long, global = true)]
    stable_images: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Structured consultation: a reply plus condition cards.
    Consult { text: String },
    /// Streamed free-text consultation.
    Stream { text: String },
    /// Read medication lines from a prescription image (PDF, JPEG, PNG).
    Scan { path: PathBuf },
    /// Interactive symptom-checker session. Type `quit` to finish.
    Chat,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    dotenvy::dotenv().ok();

    // RUST_LOG=debug for pipeline detail.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("medcompanion: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CompanionResult<()> {
    let config = match &cli.config {
        Some(path) => CompanionConfig::from_file(path)?,
        None => CompanionConfig::default(),
    }
    .with_env_overrides()?;

    let companion = if cli.offline {
        debug!("offline mode: using scripted transport");
        Companion::with_transport(&config, Arc::new(ScriptedTransport::offline()))
    } else {
        Companion::from_config(&config)?
    };
    let companion = if cli.stable_images {
        companion.with_image_picker(Arc::new(DigestImagePicker))
    } else {
        companion
    };

    let options = match cli.timeout_secs {
        Some(secs) => CallOptions::with_timeout(Duration::from_secs(secs)),
        None => CallOptions::default(),
    };

    match cli.command {
        Command::Consult { text } => {
            let result = companion.consultation.consult_with(&text, &options);
            if cli.json {
                print_json(&result)?;
            } else {
                print_consultation(&result);
            }
        }
        Command::Stream { text } => {
            let mut stdout = io::stdout();
            companion
                .streaming
                .consult_streaming_with(&text, &options, &mut |chunk| {
                    print!("{chunk}");
                    let _ = stdout.flush();
                });
            println!();
        }
        Command::Scan { path } => {
            let bytes = std::fs::read(&path).map_err(|e| CompanionError::Io {
                reason: format!("cannot read '{}': {}", path.display(), e),
            })?;
            let mime = check_upload(&bytes)?;
            debug!(%mime, bytes = bytes.len(), "upload accepted");

            let result = companion.extraction.extract_result_with(&bytes, &options);
            if cli.json {
                print_json(&result)?;
            } else {
                print_medications(&result.medications);
                if !result.extraction_notes.is_empty() {
                    println!("Notes: {}", result.extraction_notes);
                }
            }
        }
        Command::Chat => run_chat(&companion, &options, cli.json)?,
    }
    Ok(())
}

// ── Chat loop ─────────────────────────────────────────────────────────────────

fn run_chat(companion: &Companion, options: &CallOptions, json: bool) -> CompanionResult<()> {
    let session = ChatSession::new();
    if let Some(welcome) = session.turns().first() {
        println!("{}\n", welcome.message);
    }

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).map_err(|e| CompanionError::Io {
            reason: format!("failed to read from stdin: {e}"),
        })?;
        let text = line.trim();
        if read == 0 || text.eq_ignore_ascii_case("quit") || text.eq_ignore_ascii_case("exit") {
            break;
        }
        if text.is_empty() {
            continue;
        }

        match session.submit_with(text, |t| companion.consultation.consult_with(t, options)) {
            Ok(turn) => {
                println!("\n{}\n", turn.message);
                for card in &turn.condition_cards {
                    print_card(card);
                }
            }
            Err(e) => warn!(error = %e, "message not sent"),
        }
    }

    let stats = session.stats();
    println!(
        "\nSession {}: {} messages, {} conditions discussed, {}",
        session.session_id(),
        stats.message_count,
        stats.conditions_discussed,
        stats.duration
    );
    if json && stats.message_count > 0 {
        print_json(&session.snapshot())?;
    }
    Ok(())
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn print_json<T: serde::Serialize>(value: &T) -> CompanionResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CompanionError::Io {
        reason: format!("failed to render JSON: {e}"),
    })?;
    println!("{text}");
    Ok(())
}

fn print_consultation(result: &MedicalConsultationResult) {
    println!("{}\n", result.response);
    for card in &result.condition_cards {
        print_card(card);
    }
}

fn print_card(card: &ConditionCard) {
    println!(
        "  {} [{:?}, {}% match, onset: {}]",
        card.name, card.severity, card.match_percentage, card.onset
    );
    println!("    {}", card.description);
    if !card.symptoms.is_empty() {
        println!("    Symptoms: {}", card.symptoms.join(", "));
    }
    for rec in &card.recommendations {
        println!("    - {rec}");
    }
    println!();
}

fn print_medications(entries: &[MedicationEntry]) {
    for entry in entries {
        println!("  {}. {} ({:?} confidence)", entry.id, entry.name, entry.confidence);
        println!("     Dosage:    {}", entry.dosage);
        println!("     Frequency: {}", entry.frequency);
        println!("     Duration:  {}", entry.duration);
        println!("     {}", entry.instructions);
    }
}
