use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use tripsnatch::{
    ApiError, ClientConfig, ConfigError, CreateHolidayTrack, Credentials, DraftError, RegistrationDraft, SessionError,
    SessionManager, TransportError, UserUpdate,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("request failed: {}", describe_api_error(.0))]
    Api(#[from] ApiError),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("not signed in; run `tripsnatch login` first")]
    NotSignedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl CliError {
    /// Follow-up suggestion printed under the error, if any.
    fn hint(&self) -> Option<String> {
        match self {
            Self::Session(SessionError::Unverified { email, .. }) => Some(match email {
                Some(email) => format!("check your inbox, or run `tripsnatch resend {email}`"),
                None => "check your inbox, or run `tripsnatch resend <email>`".to_owned(),
            }),
            Self::Api(err) if err.status() == Some(401) => Some("session expired; run `tripsnatch login`".to_owned()),
            Self::Session(err) if err.retryable() => Some("the backend may be unavailable; try again".to_owned()),
            _ => None,
        }
    }
}

fn describe_api_error(err: &ApiError) -> String {
    match err.message() {
        Some(message) => format!("{err}: {message}"),
        None => err.to_string(),
    }
}

#[derive(Parser, Debug)]
#[command(name = "tripsnatch", about = "Trip Snatchers holiday price-tracking CLI")]
struct Cli {
    #[arg(long, env = "TRIPSNATCH_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "TRIPSNATCH_DATA_DIR", help = "Directory holding the persisted session token")]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TRIPSNATCH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account. Sign in after verifying the emailed link.
    Register(RegisterArgs),
    /// Forget the local session.
    Logout,
    /// Show session status and the signed-in user.
    Whoami,
    /// Consume an email verification token.
    Verify { token: String },
    /// Send another verification email.
    Resend { email: String },
    Profile(ProfileCommand),
    Holidays(HolidaysCommand),
    Deals(DealsCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long, help = "First and last name, e.g. \"Ada Lovelace\"")]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    country: String,
    #[arg(long, env = "TRIPSNATCH_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    confirm_password: Option<String>,
    #[arg(long)]
    age: Option<u32>,
    #[arg(long)]
    gender: Option<String>,
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long)]
        gender: Option<String>,
    },
    Stats,
}

#[derive(Args, Debug)]
struct HolidaysCommand {
    #[command(subcommand)]
    command: HolidaysSubcommand,
}

#[derive(Subcommand, Debug)]
enum HolidaysSubcommand {
    List,
    Track {
        url: String,
        #[arg(long)]
        target: f64,
        #[arg(long)]
        current: Option<f64>,
    },
    Stop {
        id: i64,
    },
    /// Change the target price of a tracked holiday.
    Target {
        id: i64,
        price: f64,
    },
    /// Record a manually observed current price.
    Price {
        id: i64,
        price: f64,
    },
}

#[derive(Args, Debug)]
struct DealsCommand {
    #[command(subcommand)]
    command: DealsSubcommand,
}

#[derive(Subcommand, Debug)]
enum DealsSubcommand {
    List,
    Get { id: i64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if let Some(hint) = err.hint() {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ClientConfig::from_lookup(|key| match key {
        "TRIPSNATCH_API_URL" => cli.api_url.clone(),
        "TRIPSNATCH_DATA_DIR" => cli.data_dir.clone(),
        _ => std::env::var(key).ok(),
    })?;
    let session = SessionManager::from_config(&config)?;

    // Nothing auth-dependent runs until the persisted session has settled.
    let status = session.restore().await;
    tracing::debug!(?status, "session restored");

    match cli.command {
        Command::Login { email, password } => {
            let user = session.login(Credentials::new(email, password)).await?;
            println!("signed in as {} <{}>", user.full_name(), user.email);
            Ok(())
        }
        Command::Register(args) => run_register(&session, args).await,
        Command::Logout => {
            session.logout();
            println!("signed out");
            Ok(())
        }
        Command::Whoami => print_json(&json!({
            "status": session.status(),
            "user": session.current_user(),
        })),
        Command::Verify { token } => {
            let message = session.verify_email(&token).await?;
            println!("{}", message.as_deref().unwrap_or("email verified"));
            Ok(())
        }
        Command::Resend { email } => {
            let message = session.resend_verification(&email).await?;
            println!("{}", message.as_deref().unwrap_or("verification email sent"));
            Ok(())
        }
        Command::Profile(profile) => run_profile(&session, profile).await,
        Command::Holidays(holidays) => run_holidays(&session, holidays).await,
        Command::Deals(deals) => run_deals(&session, deals).await,
    }
}

async fn run_register(session: &SessionManager, args: RegisterArgs) -> Result<(), CliError> {
    let mut draft = RegistrationDraft::from_full_name(&args.name, args.email, args.phone, args.country, args.password)?;
    if let Some(confirmation) = &args.confirm_password {
        draft.check_password_confirmation(confirmation)?;
    }
    draft.age = args.age;
    draft.gender = args.gender;

    let outcome = session.register(&draft).await?;
    match outcome.message() {
        Some(message) => println!("{message}"),
        None => println!("registered; check your email to verify your account"),
    }
    Ok(())
}

async fn run_profile(session: &SessionManager, profile: ProfileCommand) -> Result<(), CliError> {
    require_session(session)?;
    match profile.command {
        ProfileSubcommand::Show => print_json(&session.refresh_user().await?),
        ProfileSubcommand::Update {
            first_name,
            last_name,
            phone,
            country,
            age,
            gender,
        } => {
            let update = UserUpdate {
                first_name,
                last_name,
                phone,
                country,
                age,
                gender,
            };
            print_json(&session.update_profile(&update).await?)
        }
        ProfileSubcommand::Stats => print_json(&session.api().users().stats().await?),
    }
}

async fn run_holidays(session: &SessionManager, holidays: HolidaysCommand) -> Result<(), CliError> {
    require_session(session)?;
    let api = session.api().holidays();
    match holidays.command {
        HolidaysSubcommand::List => print_json(&api.list().await?),
        HolidaysSubcommand::Track {
            url,
            target,
            current,
        } => {
            let request = CreateHolidayTrack {
                url,
                target_price: target,
                current_price: current,
            };
            print_json(&api.track(&request).await?)
        }
        HolidaysSubcommand::Stop { id } => {
            api.stop(id).await?;
            println!("stopped tracking {id}");
            Ok(())
        }
        HolidaysSubcommand::Target { id, price } => print_json(&api.update_target_price(id, price).await?),
        HolidaysSubcommand::Price { id, price } => print_json(&api.update_current_price(id, price).await?),
    }
}

async fn run_deals(session: &SessionManager, deals: DealsCommand) -> Result<(), CliError> {
    require_session(session)?;
    let api = session.api().snatched();
    match deals.command {
        DealsSubcommand::List => print_json(&api.list().await?),
        DealsSubcommand::Get { id } => print_json(&api.get(id).await?),
    }
}

fn require_session(session: &SessionManager) -> Result<(), CliError> {
    if session.is_authenticated() {
        Ok(())
    } else {
        Err(CliError::NotSignedIn)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
