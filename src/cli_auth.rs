use anyhow::{bail, Result};
use clap::{CommandFactory, Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};

use parkinghub_server::{
    user::{Account, NewAccount},
    ParkingManager, Role, SqliteParkingStore, SqliteUserStore, UserManager,
};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Account administration for a ParkingHub database directory.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding user.db and parking.db.
    #[clap(value_parser = parse_path)]
    pub db_dir: PathBuf,
}

#[derive(Parser)]
#[command(name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Creates an account. This is the only way to create an admin.
    AddUser {
        email: String,
        name: String,
        password: String,
        #[clap(long, default_value = "user")]
        role: String,
        #[clap(long)]
        phone: Option<String>,
    },

    /// Replaces the password of an account.
    SetPassword { email: String, password: String },

    /// Changes the role of an account (user, owner or admin).
    SetRole { email: String, role: String },

    /// Lists all accounts.
    ListUsers,

    /// Shows an account and its auth tokens.
    Show { email: String },

    /// Deletes an account with its bookings and spots.
    DeleteUser { email: String },

    /// Verifies the password of an account without issuing a token.
    CheckPassword { email: String, password: String },

    /// Shows the path of the current database directory.
    Where,

    /// Close this program.
    Exit,
}

enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const PROMPT: &str = ">> ";

struct Managers {
    user_manager: UserManager,
    parking_manager: ParkingManager,
}

fn parse_role(role: &str) -> Result<Role> {
    match Role::from_str(role) {
        Some(role) => Ok(role),
        None => bail!("Unknown role {}, expected one of user, owner, admin", role),
    }
}

fn find_account(user_manager: &UserManager, email: &str) -> Result<Account> {
    match user_manager.get_account_by_email(email)? {
        Some(account) => Ok(account),
        None => bail!("No account with email {}", email),
    }
}

fn run_command(command: InnerCommand, managers: &Managers, db_dir: &str) -> Result<bool> {
    let user_manager = &managers.user_manager;
    match command {
        InnerCommand::AddUser {
            email,
            name,
            password,
            role,
            phone,
        } => {
            let account = user_manager.create_account(NewAccount {
                name,
                email,
                password,
                role: parse_role(&role)?,
                phone,
            })?;
            println!("Created account {} ({})", account.id, account.role);
        }
        InnerCommand::SetPassword { email, password } => {
            let account = find_account(user_manager, &email)?;
            user_manager.set_password(account.id, &password)?;
            println!("Password updated.");
        }
        InnerCommand::SetRole { email, role } => {
            let account = find_account(user_manager, &email)?;
            let account = user_manager.set_role(account.id, parse_role(&role)?)?;
            println!("{} is now {}", account.email, account.role);
        }
        InnerCommand::ListUsers => {
            for account in user_manager.list_accounts()? {
                println!(
                    "{:>5}  {:<6}  {}  <{}>",
                    account.id,
                    account.role.as_str(),
                    account.name,
                    account.email
                );
            }
        }
        InnerCommand::Show { email } => {
            let account = find_account(user_manager, &email)?;
            println!("Account:");
            println!("{:#?}", account);

            println!("\nAuth Tokens:");
            for token in user_manager.get_user_tokens(account.id)?.iter() {
                println!("{:#?}", token);
            }

            println!("\nCapabilities:");
            for capability in account.role.capabilities() {
                println!("  - {:?}", capability);
            }
        }
        InnerCommand::DeleteUser { email } => {
            let account = find_account(user_manager, &email)?;
            let purged = managers.parking_manager.purge_account(account.id)?;
            user_manager.delete_account(account.id)?;
            println!(
                "Deleted {} with {} bookings and {} spots",
                account.email, purged.bookings, purged.spots
            );
        }
        InnerCommand::CheckPassword { email, password } => {
            let msg = match user_manager.check_password(&email, &password)? {
                Some(account) => format!("The password is correct for user {}", account.id),
                None => "The email or the password is wrong".to_string(),
            };
            println!("{}", msg);
        }
        InnerCommand::Where => {
            println!("{}", db_dir);
        }
        InnerCommand::Exit => return Ok(false),
    }
    Ok(true)
}

fn execute_command(line: String, managers: &Managers, db_dir: &str) -> CommandExecutionResult {
    if line.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let args =
        shlex::split(&line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect());

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => {
            println!("{} {}", PROMPT, &line);
            match run_command(cli.command, managers, db_dir) {
                Ok(true) => CommandExecutionResult::Ok,
                Ok(false) => CommandExecutionResult::Exit,
                Err(err) => CommandExecutionResult::Error(format!("{:#}", err)),
            }
        }
        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
            CommandExecutionResult::Ok
        }
    }
}

#[derive(rustyline_derive::Hinter)]
struct CommandHelper {
    commands_names: Vec<String>,
}

impl CommandHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        CommandHelper { commands_names }
    }
}

impl Completer for CommandHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .cloned()
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for CommandHelper {}
impl Validator for CommandHelper {}
impl Helper for CommandHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    if !cli_args.db_dir.is_dir() {
        bail!("{:?} is not a directory", cli_args.db_dir);
    }
    let user_store = SqliteUserStore::new(cli_args.db_dir.join("user.db"))?;
    let parking_store = SqliteParkingStore::new(cli_args.db_dir.join("parking.db"))?;
    let managers = Managers {
        user_manager: UserManager::new(Arc::new(user_store)),
        parking_manager: ParkingManager::new(Arc::new(parking_store)),
    };
    let db_dir = cli_args.db_dir.display().to_string();

    InnerCli::command().print_long_help()?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<CommandHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(CommandHelper::new()));

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(line, &managers, &db_dir) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => break,
                    CommandExecutionResult::Error(err) => {
                        eprintln!("Error: {}", err);
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}
