//! ptwit - command-line client for a social-network API
//!
//! Manages accounts and settings in the ptwit config file and renders API
//! records read from stdin through the configured templates.

use std::io::{BufRead, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use libptwit::config::{
    resolve_config_path, validate_account_name, validate_option_name, ConfigStore,
};
use libptwit::credentials::{self, Authorizer, ConsumerPair, TokenPair};
use libptwit::logging::LoggingConfig;
use libptwit::output::{format_records, parse_records, template_for, OutputFormat, RecordKind};
use libptwit::PtwitError;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "ptwit")]
#[command(version, about = "A simple command line client for the social web")]
#[command(long_about = r#"A simple command line client for the social web.

Settings live in one INI file with a [general] section and one section per
account. Options set on an account override the same option in [general].

EXAMPLES:
    # Log into an account and make it current
    ptwit login ptpt

    # List accounts (* marks the current one)
    ptwit accounts

    # Change how tweets are printed for the current account
    ptwit config set tweet_format '%user.screen_name%: %text% (%H%:%M%)'

    # Same, but for every account
    ptwit config set tweet_format '%user.screen_name%: %text%' --global

    # Render records fetched elsewhere
    curl -s ... | ptwit render --kind tweet
    cat users.json | ptwit render --kind user --format json

TEMPLATES:
    %key%        value of a record field, dotted for nesting (%user.name%)
    %Y% %m% ...  part of the record's created_at, strftime letters
    %%           a literal percent sign
    Unknown fields are printed as written.

ENVIRONMENT:
    PTWIT_CONFIG       config file (default: <config dir>/ptwit/ptwit.conf)
    PTWIT_LOG_FORMAT   text, json or pretty
    PTWIT_LOG_LEVEL    log level when RUST_LOG is unset
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this account instead of the current one
    #[arg(short, long, global = true, value_name = "ACCOUNT")]
    account: Option<String>,

    /// Config file to use
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all accounts
    Accounts,

    /// Log into an account and make it current
    Login {
        /// Account name
        account: String,
    },

    /// Remove an account and its settings
    Logout {
        /// Account name
        account: String,
    },

    /// Read and change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Render records read from stdin (JSON array, object, or JSON lines)
    Render {
        /// Kind of record, selects the default template
        #[arg(short, long, default_value = "tweet", value_name = "KIND")]
        #[arg(value_parser = ["tweet", "message", "user"])]
        kind: String,

        /// Template to use instead of the configured one
        #[arg(short, long, value_name = "TEMPLATE")]
        template: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text", value_name = "FORMAT")]
        #[arg(value_parser = ["text", "json"])]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the value of an option
    Get {
        option: String,
        /// Read the [general] section
        #[arg(short, long)]
        global: bool,
    },

    /// Set an option
    Set {
        option: String,
        value: String,
        /// Write the [general] section
        #[arg(short, long)]
        global: bool,
    },

    /// Remove an option
    Unset {
        option: String,
        /// Write the [general] section
        #[arg(short, long)]
        global: bool,
    },

    /// Print all options of a section
    List {
        /// List the [general] section
        #[arg(short, long)]
        global: bool,
    },
}

/// Reads missing credentials from the terminal
///
/// The browser authorization is done by the user; ptwit only asks for the
/// resulting access token.
struct TerminalAuthorizer;

impl TerminalAuthorizer {
    fn require_tty(what: &str) -> libptwit::Result<()> {
        if atty::is(atty::Stream::Stdin) {
            Ok(())
        } else {
            Err(PtwitError::Auth(format!(
                "{} is required but stdin is not a terminal",
                what
            )))
        }
    }

    fn read_line(prompt: &str) -> libptwit::Result<String> {
        eprint!("{}", prompt);
        std::io::stderr()
            .flush()
            .map_err(|e| PtwitError::Auth(e.to_string()))?;
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| PtwitError::Auth(e.to_string()))?;
        Ok(line.trim().to_string())
    }

    fn read_secret(prompt: &str) -> libptwit::Result<String> {
        rpassword::prompt_password(prompt)
            .map(|s| s.trim().to_string())
            .map_err(|e| PtwitError::Auth(e.to_string()))
    }
}

impl Authorizer for TerminalAuthorizer {
    fn prompt_consumer(&self) -> libptwit::Result<ConsumerPair> {
        Self::require_tty("A consumer key")?;
        Ok(ConsumerPair {
            key: Self::read_line("Consumer key: ")?,
            secret: Self::read_secret("Consumer secret: ")?,
        })
    }

    fn authorize(&self, _consumer: &ConsumerPair) -> libptwit::Result<TokenPair> {
        Self::require_tty("An access token")?;
        eprintln!("Authorize ptwit in your browser, then paste the access token.");
        let token = TokenPair {
            key: Self::read_line("Access token: ")?,
            secret: Self::read_secret("Access token secret: ")?,
        };
        if token.key.is_empty() || token.secret.is_empty() {
            return Err(PtwitError::Auth("No access token entered".to_string()));
        }
        Ok(token)
    }
}

fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();
    debug!("ptwit started with args: {:?}", cli);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<PtwitError>()
            .map(PtwitError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let path = match cli.config {
        Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string()),
        None => resolve_config_path().context("Failed to locate config file")?,
    };
    let mut store = ConfigStore::open(path);

    let account = cli
        .account
        .or_else(|| store.current_account().map(str::to_string));

    match cli.command {
        Commands::Accounts => list_accounts(&store),
        Commands::Login { account } => login(&mut store, &account),
        Commands::Logout { account } => logout(&mut store, &account),
        Commands::Config { action } => run_config(&mut store, account.as_deref(), action),
        Commands::Render {
            kind,
            template,
            format,
        } => render(&store, account.as_deref(), &kind, template, &format),
    }
}

fn list_accounts(store: &ConfigStore) -> Result<()> {
    let current = store.current_account();
    let mut accounts = store.list_scopes();
    accounts.sort_unstable();

    for account in accounts {
        if Some(account) == current {
            println!("* {}", account);
        } else {
            println!("  {}", account);
        }
    }
    Ok(())
}

fn login(store: &mut ConfigStore, account: &str) -> Result<()> {
    credentials::login(store, account, &TerminalAuthorizer)?;
    println!("Switched to account \"{}\"", account);
    Ok(())
}

fn logout(store: &mut ConfigStore, account: &str) -> Result<()> {
    if !credentials::logout(store, account)? {
        bail!("Account \"{}\" doesn't exist", account);
    }
    println!("Removed account \"{}\"", account);
    Ok(())
}

/// Scope written by a config action, checked before anything is stored
fn writable_scope<'a>(account: Option<&'a str>, option: &str) -> Result<Option<&'a str>> {
    validate_option_name(option)?;
    if let Some(account) = account {
        validate_account_name(account)?;
    }
    Ok(account)
}

fn run_config(store: &mut ConfigStore, account: Option<&str>, action: ConfigAction) -> Result<()> {
    let scope = |global: bool| if global { None } else { account };

    match action {
        ConfigAction::Get { option, global } => match store.get(&option, scope(global)) {
            Some(value) => println!("{}", value),
            None => bail!("\"{}\" is not set", option),
        },
        ConfigAction::Set {
            option,
            value,
            global,
        } => {
            let scope = writable_scope(scope(global), &option)?;
            store.set(&option, value, scope).save()?;
        }
        ConfigAction::Unset { option, global } => {
            let scope = writable_scope(scope(global), &option)?;
            store.unset(&option, scope).save()?;
        }
        ConfigAction::List { global } => {
            for (option, value) in store.options(scope(global)) {
                println!("{} = {}", option, value);
            }
        }
    }
    Ok(())
}

fn render(
    store: &ConfigStore,
    account: Option<&str>,
    kind: &str,
    template: Option<String>,
    format: &str,
) -> Result<()> {
    let kind: RecordKind = kind.parse().map_err(anyhow::Error::msg)?;
    let format: OutputFormat = format.parse().map_err(anyhow::Error::msg)?;
    let template = template.unwrap_or_else(|| template_for(store, account, kind));

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read records from stdin")?;

    let records = parse_records(&input)?;
    debug!("Rendering {} {} record(s)", records.len(), kind);
    if records.is_empty() {
        return Ok(());
    }

    let outputs = format_records(&records, &template, format, chrono::Utc::now())?;
    println!("{}", outputs.join("\n"));
    Ok(())
}
