use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use signage_console::api::types::ResetPasswordRequest;
use signage_console::commands;
use signage_console::config::{ClientConfig, CredentialPlacement};
use signage_console::session::{FileStore, KeychainStore, MemoryStore, SessionStore};
use signage_console::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "signage-console", version, about = "Signage admin console API client")]
struct Args {
    /// Backend base URL (overrides SIGNAGE_API_URL / DEVELOP_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where the session credential is kept
    #[arg(long, value_enum, default_value_t = StoreKind::File, global = true)]
    store: StoreKind,

    /// Session file path for the file store
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Send the credential as `Authorization: Bearer` instead of `access-token`
    #[arg(long, global = true)]
    bearer: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    File,
    Keychain,
    Memory,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session credential
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SIGNAGE_PASSWORD")]
        password: String,
    },
    /// Clear the stored session
    Logout,
    /// Show the local session state
    Status,
    /// Fetch the logged-in user's profile
    Profile,
    /// Request a password-reset code
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Validate a one-time password
    ValidateOtp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        otp: String,
    },
    /// Set a new password
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SIGNAGE_NEW_PASSWORD")]
        password: String,
        #[arg(long)]
        otp: Option<String>,
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Send an arbitrary request (e.g. `request get screens`)
    Request {
        method: String,
        path: String,
        /// JSON request body
        #[arg(long)]
        data: Option<String>,
    },
}

fn open_store(args: &Args) -> Result<Arc<dyn SessionStore>, String> {
    let store: Arc<dyn SessionStore> = match args.store {
        StoreKind::File => {
            let path = args
                .session_file
                .clone()
                .or_else(FileStore::default_path)
                .ok_or("No config directory available; pass --session-file")?;
            log::debug!("Using session file {}", path.display());
            Arc::new(FileStore::new(path))
        }
        StoreKind::Keychain => Arc::new(KeychainStore::new()),
        StoreKind::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

async fn run(args: Args) -> Result<(), String> {
    let mut config = ClientConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(url) = &args.api_url {
        config.base_address = url.clone();
    }
    if args.bearer {
        config.credential_placement = CredentialPlacement::Bearer;
    }

    let store = open_store(&args)?;
    let state = AppState::new(&config, store).map_err(|e| e.to_string())?;
    log::debug!("API base URL: {}", config.base_address);

    match args.command {
        Command::Login { email, password } => commands::login(&state, email, password).await,
        Command::Logout => commands::logout(&state).await,
        Command::Status => commands::status(&state),
        Command::Profile => commands::profile(&state).await,
        Command::ForgotPassword { email } => commands::forgot_password(&state, email).await,
        Command::ValidateOtp { email, otp } => commands::validate_otp(&state, email, otp).await,
        Command::ResetPassword {
            email,
            password,
            otp,
            confirm_password,
        } => {
            let request = ResetPasswordRequest {
                email,
                password,
                otp,
                confirm_password,
            };
            commands::reset_password(&state, request).await
        }
        Command::Request { method, path, data } => {
            commands::raw_request(&state, &method, &path, data.as_deref()).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Shares DEVELOP_BASE_URL and SIGNAGE_* settings with the web build's .env
    let _ = dotenvy::dotenv();

    env_logger::init();
    log::debug!("signage-console starting");

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
