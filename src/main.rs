//! # Monthly
//!
//! A personal monthly-task checklist for the terminal.
//!
//! Define reusable task templates once, generate a fresh checklist from them
//! every month, tick tasks off, keep short notes, and get a daily reminder for
//! whatever is still pending.
//!
//! ## Usage
//!
//! ```bash
//! monthly signup me@example.com hunter22
//! monthly signin me@example.com hunter22
//!
//! monthly template add "Pay rent" --category payment
//! monthly template add "Renew bus pass" --category errand
//! monthly generate            # creates this month's tasks, skipping existing ones
//! monthly list
//! monthly complete 1a2b3c4d
//! monthly notes 1a2b3c4d "paid by transfer"
//!
//! monthly remind --at 08:30   # one daily reminder per pending task
//! monthly reminders list
//! monthly reminders clear
//! ```
//!
//! Reminders are delivered by `monthly reminders fire`, which prints what is
//! due at the current minute; run it from cron:
//!
//! ```text
//! * * * * * monthly reminders fire | while read -r line; do notify-send "$line"; done
//! ```
//!
//! ## Data Storage
//!
//! Data is saved in your local data directory:
//! *   Linux: `~/.local/share/monthly/`
//! *   macOS: `~/Library/Application Support/monthly/`
//! *   Windows: `%APPDATA%\monthly\`
//!
//! You can override this by setting the `MONTHLY_DATA_DIR` environment
//! variable. An optional `config.toml` in that directory sets the log level
//! and reminder options.

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing::{error, info};

use monthly::commands::*;
use monthly::config::Config;
use monthly::models::{Category, Period, ReminderTime};
use monthly::storage::data_dir;
use monthly::AppError;

#[derive(Parser)]
#[command(name = "monthly")]
#[command(about = "Monthly task checklist with daily reminders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup {
        email: String,
        password: String,
    },
    /// Sign in
    Signin {
        email: String,
        password: String,
    },
    /// Sign out
    Signout,
    /// Print the signed-in account
    Whoami,
    /// Manage task templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Create this month's tasks from your templates
    Generate {
        /// Month (1-12), defaults to the current one
        #[arg(short, long)]
        month: Option<u32>,
        /// Year, defaults to the current one
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// List the tasks of a month
    List {
        #[arg(short, long)]
        month: Option<u32>,
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Toggle a task between done and pending
    Complete {
        id: String,
    },
    /// Set the notes of a task (max 50 characters)
    Notes {
        id: String,
        notes: String,
    },
    /// Remove a task
    Remove {
        id: String,
    },
    /// Schedule daily reminders for this month's pending tasks
    Remind {
        /// Time of day in HH:MM, defaults to the last one used
        #[arg(short, long)]
        at: Option<ReminderTime>,
    },
    /// Inspect or cancel reminders
    Reminders {
        #[command(subcommand)]
        command: ReminderCommands,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Add a new template
    Add {
        /// Template title
        title: String,
        #[arg(short, long, value_enum, default_value_t = Category::Payment)]
        category: Category,
    },
    /// List templates
    List,
    /// Edit a template
    Edit {
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New category
        #[arg(short, long, value_enum)]
        category: Option<Category>,
    },
    /// Remove a template
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
enum ReminderCommands {
    /// Show the active schedule
    List,
    /// Cancel all reminders
    Clear,
    /// Print reminders due now
    Fire {
        /// Check a given HH:MM instead of the current time
        #[arg(short, long)]
        at: Option<ReminderTime>,
    },
}

fn init_logging(config: &Config) {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.level)),
        )
        .init();
}

fn run(command: Commands) -> Result<(), AppError> {
    let dir = data_dir();
    let config = Config::load(&dir)?;
    init_logging(&config);
    if Config::path(&dir).exists() {
        info!("loaded config from {}", Config::path(&dir).display());
    } else {
        info!("no config at {}, using defaults", Config::path(&dir).display());
    }
    let app = App::with_config(&dir, config)?;

    match command {
        Commands::Signup { email, password } => cmd_signup(&app, &email, &password, false),
        Commands::Signin { email, password } => cmd_signin(&app, &email, &password, false),
        Commands::Signout => cmd_signout(&app, false),
        Commands::Whoami => cmd_whoami(&app),
        Commands::Template { command } => match command {
            TemplateCommands::Add { title, category } => cmd_template_add(&app, &title, category, false),
            TemplateCommands::List => cmd_template_list(&app),
            TemplateCommands::Edit { id, title, category } => cmd_template_edit(&app, &id, title.as_deref(), category, false),
            TemplateCommands::Remove { id } => cmd_template_remove(&app, &id, false),
        },
        Commands::Generate { month, year } => cmd_generate(&app, Period::current_or(month, year)?, false),
        Commands::List { month, year } => cmd_list(&app, Period::current_or(month, year)?),
        Commands::Complete { id } => cmd_complete(&app, &id, false),
        Commands::Notes { id, notes } => cmd_notes(&app, &id, &notes, false),
        Commands::Remove { id } => cmd_remove(&app, &id, false),
        Commands::Remind { at } => cmd_remind(&app, at, false),
        Commands::Reminders { command } => match command {
            ReminderCommands::List => cmd_reminders_list(&app),
            ReminderCommands::Clear => cmd_reminders_clear(&app, false),
            ReminderCommands::Fire { at } => cmd_reminders_fire(&app, at),
        },
        Commands::Completions { .. } => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        let shell_enum = match shell.as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "powershell" => Shell::PowerShell,
            "elvish" => Shell::Elvish,
            _ => {
                eprintln!("Unsupported shell: {}", shell);
                return ExitCode::FAILURE;
            }
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "monthly", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_informational() => {
            println!("{}", e);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
