//! `roster`: terminal client for the subscriber directory service.
//!
//! # Usage
//!
//! ```
//! roster login --username admin            # prints a bearer token
//! roster --token $TOKEN                    # interactive TUI
//! roster list --query gmail
//! roster months
//! roster show 42
//! roster add --first-name Ann --last-name Lee --email ann@example.com
//! roster --config ~/.config/roster/config.toml
//! ```

mod app;
mod config;
mod ui;

use std::{
  fs::File,
  io::{self, BufRead, Write},
  path::{Path, PathBuf},
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context, Result, anyhow};
use app::{App, SIGNED_OUT_HINT};
use clap::{Parser, Subcommand};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use roster_core::{
  directory::Directory,
  record::{NewSubscriber, SubscriberId, SubscriberRecord},
  session::Session,
};
use roster_http::{ApiClient, ApiConfig};
use secrecy::SecretString;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "roster", version, about = "Terminal client for the subscriber directory")]
struct Args {
  /// Path to a TOML config file (url, token, username, timeout_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the subscriber service (default: http://localhost:8080).
  #[arg(long, env = "ROSTER_URL")]
  url: Option<String>,

  /// Bearer token issued by `roster login`.
  #[arg(long, env = "ROSTER_TOKEN", hide_env_values = true)]
  token: Option<String>,

  /// Name shown for the signed-in operator.
  #[arg(long, env = "ROSTER_USER")]
  user: Option<String>,

  /// Seconds to wait for each request before giving up.
  #[arg(long, value_name = "SECS")]
  timeout_secs: Option<u64>,

  /// Write logs to this file while the TUI is running.
  #[arg(long, value_name = "FILE")]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print subscribers, optionally narrowed by a search query.
  List {
    #[arg(short, long)]
    query: Option<String>,
  },
  /// Print the number of sign-ups per month.
  Months,
  /// Print one subscriber fetched from the service.
  Show { id: SubscriberId },
  /// Register a new subscriber.
  Add {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name:  String,
    #[arg(long)]
    email:      String,
    #[arg(long, default_value = "")]
    phone:      String,
  },
  /// Exchange a username and password (read from stdin) for a token.
  Login {
    #[arg(long)]
    username: String,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  init_tracing(args.command.is_none(), args.log_file.as_deref())?;

  let file_cfg = config::load_file(args.config.as_deref())?;
  let settings = config::resolve(
    config::Overrides {
      url:          args.url,
      token:        args.token,
      user:         args.user,
      timeout_secs: args.timeout_secs,
    },
    file_cfg,
  );

  let client = ApiClient::new(ApiConfig {
    base_url: settings.base_url,
    timeout:  settings.timeout,
  })?;
  let directory = Directory::with_timeout(client, settings.timeout);
  let session = settings.session;

  match args.command {
    None => run_tui(directory, session).await,
    Some(Command::List { query }) => list(&directory, &session, query).await,
    Some(Command::Months) => months(&directory, &session).await,
    Some(Command::Show { id }) => show(&directory, &session, &id).await,
    Some(Command::Add { first_name, last_name, email, phone }) => {
      let subscriber = NewSubscriber::parse(&first_name, &last_name, &email, &phone)?;
      let credential = session.credential().map_err(explain)?;
      directory
        .source()
        .add_subscriber(credential, &subscriber)
        .await
        .context("adding subscriber")?;
      println!("added {} {}", subscriber.first_name, subscriber.last_name);
      Ok(())
    }
    Some(Command::Login { username }) => {
      let password = SecretString::new(read_password()?);
      let credential = directory
        .source()
        .login(&username, &password)
        .await
        .context("signing in")?;
      eprintln!("signed in as {}", credential.identity());
      println!("{}", credential.bearer());
      Ok(())
    }
  }
}

/// Subcommands log to stderr. The TUI owns the terminal, so it only logs when
/// given a file.
fn init_tracing(tui: bool, log_file: Option<&Path>) -> Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  match log_file {
    Some(path) => {
      let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    }
    None if !tui => {
      tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    }
    None => {}
  }
  Ok(())
}

/// Turn a missing credential into something the user can act on.
fn explain(e: roster_core::Error) -> anyhow::Error {
  match e {
    roster_core::Error::Unauthorized => anyhow!(SIGNED_OUT_HINT),
    other => other.into(),
  }
}

fn read_password() -> Result<String> {
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

// ─── Subcommands ──────────────────────────────────────────────────────────────

async fn list(
  directory: &Directory<ApiClient>,
  session: &Session,
  query: Option<String>,
) -> Result<()> {
  directory.refresh(session).await.map_err(explain)?;
  if let Some(query) = query {
    directory.set_query(query);
  }

  let filtered = directory.filtered();
  for record in filtered.iter() {
    println!(
      "{:<8} {:<28} {:<32} {:<16} {}",
      record.id,
      record.display_name(),
      record.email,
      record.phone.as_deref().unwrap_or("-"),
      record.created_at.as_deref().unwrap_or("-"),
    );
  }
  eprintln!("{} of {} subscribers", filtered.len(), directory.records().len());
  Ok(())
}

async fn months(directory: &Directory<ApiClient>, session: &Session) -> Result<()> {
  directory.refresh(session).await.map_err(explain)?;
  for bucket in directory.months().iter() {
    println!("{}  {}", bucket.month, bucket.count);
  }
  Ok(())
}

async fn show(
  directory: &Directory<ApiClient>,
  session: &Session,
  id: &SubscriberId,
) -> Result<()> {
  directory.view_detail(session, id).await.map_err(explain)?;
  let record = directory
    .detail()
    .ok_or_else(|| anyhow!("subscriber {id} was not loaded"))?;
  print_record(&record);
  Ok(())
}

fn print_record(record: &SubscriberRecord) {
  println!("id          {}", record.id);
  println!("name        {}", record.display_name());
  println!("first name  {}", record.first_name);
  println!("last name   {}", record.last_name);
  println!("email       {}", record.email);
  println!("phone       {}", record.phone.as_deref().unwrap_or("-"));
  println!("created     {}", record.created_at.as_deref().unwrap_or("-"));
}

// ─── TUI ──────────────────────────────────────────────────────────────────────

async fn run_tui(directory: Directory<ApiClient>, session: Session) -> Result<()> {
  let mut app = App::new(Arc::new(directory), session);
  app.spawn_refresh();

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let run_result = run_event_loop(&mut terminal, &mut app);

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<ApiClient>,
) -> Result<()> {
  loop {
    app.sync();
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, letting spawned fetches run on other workers.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key) {
          break;
        }
      }
      // Resize and everything else: redraw on the next iteration.
      _ => {}
    }
  }

  Ok(())
}
