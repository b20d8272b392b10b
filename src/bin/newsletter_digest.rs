use anyhow::{Result, anyhow};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;

use newsletter_digest::auth::{authenticate, token_manager::TokenManager, token_store};
use newsletter_digest::config::{Config, config_dir, load_config, load_env_file};
use newsletter_digest::domain::email::EmailCollection;
use newsletter_digest::export;
use newsletter_digest::llm::OpenAiClient;
use newsletter_digest::mail::gmail::GmailClient;
use newsletter_digest::pipeline::{DateRange, DigestPipeline, MailCollector, RunReport, RunRequest};
use newsletter_digest::terminal::{run_tui, state::AppState};

#[derive(Parser)]
#[command(name = "newsletter_digest")]
#[command(about = "Classify newsletters in a Gmail inbox and build a ranked digest", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch, clean, classify and rank emails in a date range
    Run {
        /// First day of the range (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Last day of the range, inclusive (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        #[arg(long)]
        max_results: Option<u32>,

        /// Write the classified table here (defaults to `csv_path` from the config)
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Fetch and clean emails without calling the model
    Fetch {
        #[arg(long)]
        max_results: Option<u32>,

        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Interactive control panel
    Tui,

    /// Store the OAuth client secret in keyring
    SetClientSecret {
        #[arg(long)]
        client_id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(matches!(cli.cmd, Command::Tui));
    load_env_file();

    match cli.cmd {
        Command::SetClientSecret { client_id } => {
            eprintln!("Paste client secret (end with Ctrl-D):");
            let mut secret = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut secret)?;
            let secret = secret.trim();
            token_store::save_client_secret(&client_id, secret)?;
            println!("Saved client secret for client_id {}", client_id);
            Ok(())
        }

        Command::Fetch { max_results, csv } => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            let token_mgr = TokenManager::from_config(&cfg)?;
            authenticate(&token_mgr)?;
            let gmail = GmailClient::new(cfg.gmail.api_base.clone(), &token_mgr);

            let emails = MailCollector::from_config(&cfg, &gmail).collect(&RunRequest {
                max_results: max_results.unwrap_or(cfg.gmail.max_results),
                range: None,
            });

            print_table(&emails);
            export_if_requested(&cfg, csv, &emails)
        }

        Command::Run {
            from,
            to,
            max_results,
            csv,
        } => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            let token_mgr = TokenManager::from_config(&cfg)?;
            authenticate(&token_mgr)?;
            let gmail = GmailClient::new(cfg.gmail.api_base.clone(), &token_mgr);
            let llm = OpenAiClient::new(&cfg.llm.api_base, cfg.llm_api_key()?, &cfg.llm.model);
            let pipeline = DigestPipeline::from_config(&cfg, &gmail, &llm);

            let range = match (from, to) {
                (Some(f), Some(t)) if f > t => {
                    return Err(anyhow!("--from {f} is after --to {t}"));
                }
                (Some(f), Some(t)) => {
                    Some(DateRange::from_days(f, t).ok_or_else(|| anyhow!("invalid date range"))?)
                }
                _ => None,
            };
            let request = RunRequest {
                max_results: max_results.unwrap_or(cfg.gmail.max_results),
                range,
            };

            match pipeline.run(&request)? {
                report @ RunReport::NothingInRange { .. } => {
                    if let Some(notice) = report.notice() {
                        println!("{notice}");
                    }
                    Ok(())
                }
                RunReport::Completed { emails, digest } => {
                    print_table(&emails);
                    println!();
                    match digest {
                        Some(d) => {
                            println!("Digest ({} newsletters):", d.source_count);
                            println!("{}", d.text);
                        }
                        None => println!("No newsletters in this range."),
                    }
                    export_if_requested(&cfg, csv, &emails)
                }
            }
        }

        Command::Tui => {
            let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
            let mut state = AppState::new(cfg.gmail.max_results, Utc::now().date_naive());

            // browser consent has to happen before the terminal goes raw
            let token_mgr = TokenManager::from_config(&cfg)?;
            if let Err(e) = authenticate(&token_mgr) {
                state.apply_error(format!("{e:#}"));
            }
            let token_mgr = token_mgr.without_consent();

            let gmail = GmailClient::new(cfg.gmail.api_base.clone(), &token_mgr);
            let llm = OpenAiClient::new(&cfg.llm.api_base, cfg.llm_api_key()?, &cfg.llm.model);
            let pipeline = DigestPipeline::from_config(&cfg, &gmail, &llm);

            run_tui(state, |request| {
                authenticate(&token_mgr)?;
                pipeline.run(request)
            })
            .map_err(|e| anyhow!("{e:?}"))
        }
    }
}

/// The TUI owns the screen, so its log output goes to a file next to the config.
fn init_logging(tui: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if tui {
        let file = config_dir().and_then(|dir| {
            std::fs::create_dir_all(&dir)?;
            Ok(OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("tui.log"))?)
        });
        match file {
            Ok(f) => {
                builder.target(env_logger::Target::Pipe(Box::new(f)));
            }
            Err(_) => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }
    builder.init();
}

fn print_table(emails: &EmailCollection) {
    for e in emails {
        let date = e
            .date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let kind = match &e.classification {
            Some(c) if c.is_newsletter() => "newsletter",
            Some(_) => "no",
            None => "-",
        };
        println!(
            "{date:<16}  {kind:<10}  {}  |  {}",
            e.sender.as_deref().unwrap_or("-"),
            e.subject.as_deref().unwrap_or("(no subject)")
        );
    }
    println!("{} emails", emails.len());
}

fn export_if_requested(cfg: &Config, csv: Option<PathBuf>, emails: &EmailCollection) -> Result<()> {
    let Some(path) = csv.or_else(|| cfg.csv_path.as_ref().map(PathBuf::from)) else {
        return Ok(());
    };
    export::write_csv(emails, &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
