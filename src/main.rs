mod action;
mod app;
mod auth;
mod config;
mod error;
mod event;
mod github;
mod query;
mod source;
mod store;
mod tui;
mod types;
mod ui;

use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::{Config, Repository};
use crate::error::TriageError;
use crate::event::Event;
use crate::github::GitHubClient;
use crate::source::IssueSource;

#[derive(Debug, Parser)]
#[command(name = "triage", about = "Browse and search the GitHub issues of one repository")]
struct Args {
    /// Repository to browse, as owner/name (overrides config)
    #[arg(long)]
    repo: Option<String>,

    /// Jump straight to an issue by number
    #[arg(long)]
    issue: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::load();

    let repo = match &args.repo {
        Some(spec) => Repository::parse(spec)
            .ok_or_else(|| TriageError::Api(format!("invalid repository spec '{}'", spec)))?,
        None => config.repository.clone(),
    };

    let token = auth::load_token(&config).map_err(TriageError::Auth)?;
    let client = GitHubClient::new(token, repo.owner.clone(), repo.name.clone())?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let result = run(Arc::new(client), repo, config.page_size, args.issue).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(
    source: Arc<dyn IssueSource>,
    repo: Repository,
    page_size: u32,
    initial_issue: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize terminal
    let mut terminal = tui::init()?;

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Create app state
    let mut app = App::new(source, repo, page_size, initial_issue, action_tx.clone());

    // Create event handler
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = tui::EventHandler::new(render_rate);

    // Main loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
