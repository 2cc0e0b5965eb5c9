use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reading_plan::{
    api::{AppState, router},
    config::Config,
    fetcher::ContentFetcher,
    progress::ProgressStore,
    schedule::{DAYS_IN_PLAN, ScheduleStore},
    utils::init_log,
};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the schedule document
    #[arg(short, long)]
    schedule: Option<PathBuf>,

    /// Path to the progress document
    #[arg(short, long)]
    progress: Option<PathBuf>,

    #[arg(short = 'H', long)]
    host: Option<String>,

    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Directory for log files, stdout when unset
    #[arg(short, long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server (default)
    Serve,
    /// Print the current progress and the next reading
    Status,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(Config, Command)> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(schedule) = self.schedule {
            config.schedule_path = schedule;
        }
        if let Some(progress) = self.progress {
            config.progress_path = progress;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.log_dir.is_some() {
            config.log_dir = self.log_dir;
        }
        Ok((config, self.command.unwrap_or(Command::Serve)))
    }
}

async fn status(config: &Config) -> anyhow::Result<()> {
    let progress = ProgressStore::new(&config.progress_path).load().await?;
    let schedule = ScheduleStore::new(&config.schedule_path).load().await?;
    println!(
        "{} of {} days done ({:.2}%)",
        progress.last_completed_day,
        DAYS_IN_PLAN,
        progress.percentage()
    );
    match progress.today().and_then(|day| schedule.get(day).map(|e| (day, e))) {
        Some((day, entry)) => println!("Next: day {} - {} {}", day, entry.book, entry.chapter),
        None => println!("The plan is finished."),
    }
    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(
        ScheduleStore::new(&config.schedule_path),
        ProgressStore::new(&config.progress_path),
        ContentFetcher::from_config(&config.fetcher),
    );
    // fail early on a broken schedule instead of on the first request
    state.schedule.load().await?;
    info!(
        "schedule at {}, progress at {}",
        state.schedule.path().display(),
        state.progress.path().display()
    );

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let (config, command) = Cli::parse().into_config()?;
    match command {
        Command::Status => status(&config).await,
        Command::Serve => {
            let _guard = init_log(config.log_dir.clone())?;
            serve(config).await
        }
    }
}
