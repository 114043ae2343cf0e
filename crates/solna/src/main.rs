#![forbid(unsafe_code)]

//! Solna CLI: sign, send and verify risk analysis requests.

use clap::{Parser, Subcommand};
use solna_core::Error;
use solna_dm::{Config, DecisionClient, RiskAnalysisRequest};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "solna",
    about = "Solna: signed SOAP risk analysis (WS-Security, exclusive C14N, RSA-SHA256)",
    version
)]
struct Cli {
    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign and send a risk analysis request, print the outcome as JSON
    Analyze {
        /// Request JSON file
        request: PathBuf,

        /// Deadline in seconds (default: CYBS_DM_TIMEOUT_SECS or 30)
        #[arg(long)]
        deadline: Option<u64>,

        /// Print the raw response body instead of JSON
        #[arg(long)]
        raw: bool,

        /// Read settings from this file instead of ./.env
        #[arg(long = "env-file")]
        env_file: Option<PathBuf>,
    },

    /// Build and sign a request without sending it
    Sign {
        /// Request JSON file
        request: PathBuf,

        /// Merchant identifier (default: CYBS_DM_MERCHANT_ID)
        #[arg(long = "merchant-id")]
        merchant_id: Option<String>,

        /// PEM bundle with private key and certificates (default: CYBS_DM_CREDENTIAL_PATH)
        #[arg(short = 'k', long)]
        credential: Option<PathBuf>,

        /// Password for an encrypted private key
        #[arg(long)]
        password: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify the signature of a signed envelope
    Verify {
        /// Signed envelope
        file: PathBuf,
    },

    /// Show the detected brand and type code of a card number
    Card {
        number: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Analyze {
            request,
            deadline,
            raw,
            env_file,
        } => cmd_analyze(&request, deadline, raw, env_file.as_deref()),

        Commands::Sign {
            request,
            merchant_id,
            credential,
            password,
            output,
        } => cmd_sign(&request, merchant_id, credential, password, output),

        Commands::Verify { file } => cmd_verify(&file),

        Commands::Card { number } => cmd_card(&number),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_analyze(
    request_path: &Path,
    deadline: Option<u64>,
    raw: bool,
    env_file: Option<&Path>,
) -> Result<(), Error> {
    let request = read_request(request_path)?;
    let config = match env_file {
        Some(path) => Config::from_dotenv_path(path)?,
        None => Config::from_dotenv()?,
    };
    let deadline = deadline.map(Duration::from_secs).unwrap_or(config.timeout);
    let client = DecisionClient::from_config(config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let response = runtime.block_on(client.analyze_risk_with_deadline(&request, deadline))?;

    if raw {
        return write_output(None, &response.body);
    }
    let json = serde_json::json!({
        "status": response.status,
        "outcome": response.outcome,
    });
    let text = serde_json::to_string_pretty(&json).map_err(std::io::Error::from)?;
    println!("{text}");
    Ok(())
}

fn cmd_sign(
    request_path: &Path,
    merchant_id: Option<String>,
    credential: Option<PathBuf>,
    password: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Error> {
    let request = read_request(request_path)?;

    let mut config = Config::from_dotenv()?;
    if let Some(merchant_id) = merchant_id {
        config.merchant_id = merchant_id;
    }
    if let Some(path) = credential {
        config = config.with_credential_path(path);
    }
    if let Some(password) = password {
        config = config.with_password(password);
    }
    config.validate()?;

    let credential = config.credential_store()?.load()?;

    let document = solna_dm::builder::build(&request, &config.merchant_id)?;
    let signed = solna_dsig::sign(document, &credential)?;
    tracing::info!(bytes = signed.as_bytes().len(), "request signed");
    write_output(output, signed.as_bytes())
}

fn cmd_verify(file: &Path) -> Result<(), Error> {
    let xml = std::fs::read(file)
        .map_err(|e| Error::Io(std::io::Error::new(e.kind(), format!("{}: {e}", file.display()))))?;
    match solna_dsig::verify(&xml)? {
        solna_dsig::VerifyResult::Valid => {
            println!("OK");
            Ok(())
        }
        solna_dsig::VerifyResult::Invalid { reason } => {
            eprintln!("INVALID: {reason}");
            process::exit(1);
        }
    }
}

fn cmd_card(number: &str) -> Result<(), Error> {
    let number: String = number.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    match solna_dm::classify(&number) {
        Some(brand) => println!("{brand} {}", brand.code()),
        None => println!("unknown"),
    }
    Ok(())
}

// ── Utility functions ────────────────────────────────────────────────

fn read_request(path: &Path) -> Result<RiskAnalysisRequest, Error> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Io(std::io::Error::new(e.kind(), format!("{}: {e}", path.display()))))?;
    serde_json::from_str(&text).map_err(|e| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{}: {e}", path.display()),
        ))
    })
}

fn write_output(path: Option<PathBuf>, data: &[u8]) -> Result<(), Error> {
    match path {
        Some(p) => std::fs::write(&p, data)
            .map_err(|e| Error::Io(std::io::Error::new(e.kind(), format!("{}: {e}", p.display())))),
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout();
            stdout.write_all(data)?;
            stdout.flush()?;
            Ok(())
        }
    }
}
