use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use hearth_account::{Account, AccountForum, AccountPlayer, ForumRegistry};
use hearth_db::Database;
use hearth_types::{ACCOUNT_FLAGS, Flags};

/// Offline account administration against the hearth store.
#[derive(Parser)]
#[command(name = "hearth-admin", version)]
struct Cli {
    /// SQLite file holding the account store
    #[arg(long, env = "HEARTH_DB_PATH", default_value = "hearth.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every stored account
    List,
    /// Create an account; the password must already be encrypted
    Create {
        login: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        password: String,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        timezone: i32,
    },
    /// Show an account with its roster and board state
    Show {
        login: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete an account and everything linked to it
    Delete { login: String },
    /// Set or clear an account flag by name
    Flag {
        login: String,
        name: String,
        #[arg(long)]
        clear: bool,
    },
}

#[derive(Serialize)]
struct AccountReport<'a> {
    id: Option<i64>,
    login: &'a str,
    email: &'a str,
    timezone: i32,
    autologin_id: Option<i64>,
    flags: String,
    forum: &'a str,
    players: &'a [AccountPlayer],
    forums: Vec<&'a AccountForum>,
}

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = Database::open(&cli.db)
        .with_context(|| format!("opening account store {}", cli.db.display()))?;
    let boards = ForumRegistry::default();

    match cli.command {
        Command::List => {
            for row in db.list_accounts()? {
                println!("{:>6}  {}", row.id, row.login);
            }
        }
        Command::Create {
            login,
            email,
            password,
            timezone,
        } => {
            let mut account = Account::with_login(None, &boards, login);
            account.email = email;
            account.password = password;
            account.timezone = timezone;
            let id = account.save(&db)?;
            println!("created {} ({})", account.login(), id);
        }
        Command::Show { login, json } => {
            let mut account = load(&db, &boards, &login)?;
            account.load_players(&db)?;
            account.load_forums(&db)?;
            print_account(&account, &boards, json)?;
        }
        Command::Delete { login } => {
            let mut account = load(&db, &boards, &login)?;
            account.delete(&db)?;
            println!("deleted {login}");
        }
        Command::Flag { login, name, clear } => {
            let mut account = load(&db, &boards, &login)?;
            if account.set_flag_by_name(&name, !clear)? {
                account.save(&db)?;
            }
            info!("Flags for {} now '{}'", login, account.flags.to_names(ACCOUNT_FLAGS));
        }
    }

    Ok(())
}

/// Standalone load: no connection is attached.
fn load(db: &Database, boards: &ForumRegistry, login: &str) -> anyhow::Result<Account> {
    let mut account = Account::new(None, boards);
    account.load(db, boards, login)?;
    Ok(account)
}

fn print_account(account: &Account, boards: &ForumRegistry, json: bool) -> anyhow::Result<()> {
    let players = account.cached_players().unwrap_or_default();
    let forums: Vec<&AccountForum> = account
        .cached_forums()
        .map(|f| f.iter().collect())
        .unwrap_or_default();
    let forum = boards
        .get(account.forum())
        .map_or("?", |f| f.name.as_str());

    if json {
        let report = AccountReport {
            id: account.id().map(|id| id.get()),
            login: account.login(),
            email: &account.email,
            timezone: account.timezone,
            autologin_id: account.autologin_id.map(|id| id.get()),
            flags: account.flags.to_names(ACCOUNT_FLAGS),
            forum,
            players,
            forums,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("login:     {}", account.login());
    println!("email:     {}", account.email);
    println!("timezone:  {}", account.timezone);
    println!("flags:     {}", display_flags(account.flags));
    println!("forum:     {forum}");
    println!("players:");
    for p in players {
        let marker = if account.autologin_id == Some(p.char_id) { "*" } else { " " };
        println!("  {marker} {:<20} level {:>3}", p.name, p.level);
    }
    println!("forums:");
    for f in forums {
        let name = boards.get(f.forum_id).map_or("?", |b| b.name.as_str());
        println!(
            "    {:<20} last {}  {}",
            name,
            f.last_note.format("%Y-%m-%d %H:%M"),
            if f.unsubscribed { "unsubscribed" } else { "subscribed" }
        );
    }
    Ok(())
}

fn display_flags(flags: Flags) -> String {
    if flags.is_empty() {
        "none".into()
    } else {
        flags.to_names(ACCOUNT_FLAGS)
    }
}
