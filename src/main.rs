//! AOTA.EXE - Entry Point
//!
//! Runs the exhibit headless on a terminal: each stdin line is an audience
//! impression (or a command), battles fire on the hourly schedule, and the
//! character sheet and battle transcripts are printed to stdout.

use aota_engine::battle::transcript::BattleResult;
use aota_engine::core::calendar::format_countdown;
use aota_engine::core::clock::{Clock, SystemClock};
use aota_engine::core::config::ExhibitConfig;
use aota_engine::core::error::{AotaError, Result};
use aota_engine::exhibit::{Exhibit, PendingSubmission, Snapshot, SubmissionOutcome};
use aota_engine::llm::client::LlmClient;
use aota_engine::llm::context::ImpressionContext;
use aota_engine::llm::parser::{analyze_impression, fallback_analysis};
use aota_engine::persistence::JsonFileStore;
use aota_engine::progression::analysis::AnalysisResult;

use chrono::{Local, Timelike};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

/// AOTA.EXE exhibit engine
#[derive(Parser, Debug)]
#[command(name = "aota")]
#[command(about = "Grow a character from audience impressions and let it battle every hour")]
struct Args {
    /// Exhibit configuration (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save file for the progression state
    #[arg(long, default_value = "data/aota_state.json")]
    state: PathBuf,

    /// Random seed for reproducible battles
    #[arg(long)]
    seed: Option<u64>,

    /// Never call the LLM; every impression gets the fallback analysis
    #[arg(long)]
    offline: bool,
}

type AnalysisDone = (PendingSubmission, Result<AnalysisResult>);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aota_engine=info,aota=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ExhibitConfig::load(path)?,
        None => ExhibitConfig::default(),
    };
    config.validate()?;

    let rt = Runtime::new()?;
    rt.block_on(run(args, config))
}

async fn run(args: Args, config: ExhibitConfig) -> Result<()> {
    tracing::info!("AOTA.EXE starting...");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backend = Box::new(JsonFileStore::new(&args.state));
    let mut exhibit = match args.seed {
        Some(seed) => Exhibit::with_seed(config.clone(), backend, seed),
        None => Exhibit::open(config.clone(), backend),
    };

    let client = if args.offline {
        None
    } else {
        match LlmClient::from_env(&config.llm) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("{} - running offline", e);
                None
            }
        }
    };

    let mut scheduler = exhibit.scheduler(clock.now());

    println!("\n=== AOTA.EXE ===");
    println!("Type an impression of the character and press enter.");
    println!();
    println!("Commands:");
    println!("  status / s   - Show the character sheet");
    println!("  battle / b   - Fight a battle now");
    println!("  history / h  - Show recent battles");
    println!("  reset        - Start over from a fresh character");
    println!("  quit / q     - Exit");
    println!();
    print_snapshot(&exhibit.snapshot(today(clock.as_ref())));

    let (analysis_tx, mut analysis_rx) = mpsc::unbounded_channel::<AnalysisDone>();
    let (image_tx, mut image_rx) = mpsc::unbounded_channel::<Result<String>>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let wait = (scheduler.next_deadline() - clock.now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let input = line.trim();
                match input {
                    "" => continue,
                    "quit" | "q" => break,
                    "status" | "s" => {
                        print_snapshot(&exhibit.snapshot(today(clock.as_ref())));
                        let hour = clock.now().with_timezone(&Local).hour();
                        let open = if config.exhibition_hours.contains(hour) { "OPEN" } else { "CLOSED" };
                        println!(
                            "[{}] Next battle in {}",
                            open,
                            format_countdown(scheduler.time_until_next(clock.now()))
                        );
                    }
                    "battle" | "b" => run_battle(&mut exhibit, clock.now()),
                    "history" | "h" => print_history(&exhibit),
                    "reset" => match exhibit.reset() {
                        Ok(()) => {
                            scheduler = exhibit.scheduler(clock.now());
                            println!("The character has been reset.");
                        }
                        Err(e) => {
                            tracing::error!("Reset failed: {}", e);
                            println!("[error] reset could not be saved");
                        }
                    },
                    text => {
                        let pending = match exhibit.begin_submission(text) {
                            Ok(pending) => pending,
                            Err(AotaError::Rejected(rejection)) => {
                                println!("[rejected] {}", rejection);
                                continue;
                            }
                            Err(e) => {
                                tracing::error!("Submission failed: {}", e);
                                continue;
                            }
                        };
                        println!("ANALYZING...");

                        let context = ImpressionContext::from_state(exhibit.state());
                        match &client {
                            Some(client) => {
                                let client = Arc::clone(client);
                                let tx = analysis_tx.clone();
                                tokio::spawn(async move {
                                    let result =
                                        analyze_impression(&client, pending.text(), &context).await;
                                    let _ = tx.send((pending, result));
                                });
                            }
                            None => {
                                let _ = analysis_tx.send((pending, Ok(fallback_analysis(&context))));
                            }
                        }
                    }
                }
            }

            Some((pending, result)) = analysis_rx.recv() => {
                let analysis = match result {
                    Ok(analysis) => analysis,
                    Err(e) => {
                        // Dropping `pending` releases the submission guard
                        tracing::error!("Analysis failed: {}", e);
                        println!("[error] analysis failed, impression not counted");
                        continue;
                    }
                };

                let outcome = match exhibit.complete_submission(pending, analysis, clock.now()) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!("Submission could not be saved: {}", e);
                        println!("[error] could not save, impression not counted");
                        continue;
                    }
                };
                print_outcome(&outcome);
                print_snapshot(&exhibit.snapshot(today(clock.as_ref())));

                if outcome.wants_image {
                    if let Some(client) = client.as_ref().filter(|c| c.supports_images()) {
                        let client = Arc::clone(client);
                        let prompt = ImpressionContext::from_state(exhibit.state())
                            .image_prompt(&outcome.image_prompt_hint);
                        let tx = image_tx.clone();
                        tokio::spawn(async move {
                            let _ = tx.send(client.generate_image(&prompt).await);
                        });
                    }
                }
            }

            Some(result) = image_rx.recv() => {
                match result {
                    Ok(payload) => match exhibit.set_image(payload) {
                        Ok(()) => println!("[portrait updated]"),
                        Err(e) => tracing::error!("Portrait could not be saved: {}", e),
                    },
                    // The previous portrait stays
                    Err(e) => tracing::warn!("Image generation failed: {}", e),
                }
            }

            _ = tokio::time::sleep(wait) => {
                let now = clock.now();
                scheduler.fire_due(now, |fire, _| {
                    tracing::info!(?fire, "Scheduled battle");
                    run_battle(&mut exhibit, now);
                });
            }
        }
    }

    tracing::info!("AOTA.EXE shutting down");
    Ok(())
}

fn today(clock: &dyn Clock) -> chrono::NaiveDate {
    clock.now().with_timezone(&Local).date_naive()
}

fn run_battle(exhibit: &mut Exhibit, now: chrono::DateTime<chrono::Utc>) {
    match exhibit.trigger_battle(now) {
        Ok(Some(result)) => print_battle(&result),
        Ok(None) => println!("(no battle)"),
        Err(e) => tracing::error!("Battle failed: {}", e),
    }
}

fn print_snapshot(snapshot: &Snapshot) {
    println!();
    println!(
        "[{}] INPUTS:{}  STAGE {} {}",
        snapshot.day_label(),
        snapshot.total_input_count,
        snapshot.stage.ordinal(),
        snapshot.stage.name()
    );
    if !snapshot.epithet.is_empty() {
        println!("  「{}」", snapshot.epithet);
    }
    println!("  JOB: {} - {}", snapshot.job.name, snapshot.job.description);
    for (code, value) in snapshot.stats.iter() {
        let filled = (value as usize * 20) / 99;
        println!("  {} {:>2} {}", code, value, "|".repeat(filled));
    }
    if !snapshot.traits.is_empty() {
        println!("  TRAITS: {}", snapshot.traits.join(" / "));
    }
    println!(
        "  EVOLUTION {} {}",
        snapshot.evolution.bar(),
        snapshot.evolution.label()
    );
    println!();
}

fn print_outcome(outcome: &SubmissionOutcome) {
    let cue = if outcome.net_change >= 0 { "UP" } else { "DOWN" };
    println!("[{}] {}", cue, outcome.narrative);
    for added in &outcome.traits_added {
        println!("  new trait: {}", added);
    }
    if outcome.evolved() {
        println!(
            "*** EVOLUTION: {} -> {} ***",
            outcome.stage_before.name(),
            outcome.stage_after.name()
        );
    }
}

fn print_battle(result: &BattleResult) {
    println!();
    println!("=== BATTLE vs {} ===", result.adversary);
    for line in result.log.lines() {
        println!("  {}", line.text);
    }
    println!(
        "  HP {}/{}  vs  {}/{}  ({} rounds)",
        result.player_hp,
        result.player_max_hp,
        result.adversary_hp,
        result.adversary_max_hp,
        result.rounds
    );
    println!();
}

fn print_history(exhibit: &Exhibit) {
    let history = &exhibit.state().battle_history;
    if history.is_empty() {
        println!("No battles yet.");
        return;
    }
    for record in history.iter().take(5) {
        println!(
            "  {}  {:<16} {}",
            record.resolved_at.with_timezone(&Local).format("%m/%d %H:%M"),
            record.adversary,
            if record.won { "WIN" } else { "LOSE" }
        );
    }
}
