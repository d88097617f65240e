//! S/MIME envelope CLI
//!
//! Encrypts messages for X.509 recipients, converts certificates between
//! PEM and DER and manages the configuration file.

use clap::{Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};
use smime_envelope::{
    get_certificate, pem_encode, pem_to_der,
    infra::config::{EngineKind, ExportFormat},
    pipelines::encrypt::{render, EncryptJob, EncryptWorkflow},
    ConfigManager, EnvelopeConfiguration,
};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "smime-envelope")]
#[command(about = "Encrypt mail bodies as S/MIME enveloped data")]
#[command(long_about = "
S/MIME Envelope - PKCS#7 enveloped-data encryption for mail bodies

EXAMPLES:
    # Encrypt a message read from stdin for one recipient
    echo 'hello' | smime-envelope encrypt --cert alice.pem --headers 'Subject: hi'

    # Encrypt for several recipients with the openssl command-line tool
    smime-envelope encrypt --cert alice.pem --cert bob.der -m body.txt --engine command

    # Print a DER certificate as PEM
    smime-envelope pem recipient.der

    # Strip PEM armour
    smime-envelope der recipient.pem -o recipient.der

    # Prefer AES-128 and allow the legacy 3DES fallback
    smime-envelope config set cipher.preferred aes-128-cbc
    smime-envelope config set cipher.allow_legacy_fallback true

ENVIRONMENT VARIABLES:
    SMIME_ENVELOPE_CONFIG   Configuration file path override
    RUST_LOG                Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, global = true, env = "SMIME_ENVELOPE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a message for one or more recipient certificates
    Encrypt {
        /// Recipient certificate (PEM or DER); repeat for several recipients
        #[arg(short, long = "cert", value_name = "CERT_FILE", required = true)]
        certs: Vec<PathBuf>,

        /// MIME headers, newline separated (Content-Type lines are dropped)
        #[arg(long, value_name = "HEADERS", default_value = "")]
        headers: String,

        /// Message body file (defaults to stdin)
        #[arg(short, long, value_name = "MESSAGE_FILE")]
        message: Option<PathBuf>,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: Option<PathBuf>,

        /// Encryption engine (overrides config)
        #[arg(long, value_enum)]
        engine: Option<EngineArg>,
    },

    /// Print a certificate as PEM
    Pem {
        /// Certificate file (PEM or DER)
        #[arg(value_name = "CERT_FILE")]
        cert: PathBuf,
    },

    /// Convert a PEM file to DER
    Der {
        /// PEM file
        #[arg(value_name = "PEM_FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "OUTPUT_FILE")]
        output: PathBuf,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Create default configuration file
    Init,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Export configuration
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ExportFormatArg,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the configuration file path
    Path,
}

#[derive(ValueEnum, Clone, Copy)]
enum EngineArg {
    Library,
    Command,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Library => EngineKind::Library,
            EngineArg::Command => EngineKind::Command,
        }
    }
}

#[derive(ValueEnum, Clone)]
enum ExportFormatArg {
    Toml,
    Json,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Toml => ExportFormat::Toml,
            ExportFormatArg::Json => ExportFormat::Json,
        }
    }
}

/// Parameters for the encrypt command
struct EncryptCommandArgs {
    certs: Vec<PathBuf>,
    headers: String,
    message: Option<PathBuf>,
    output: Option<PathBuf>,
    engine: Option<EngineArg>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };

    match cli.command {
        Commands::Encrypt {
            certs,
            headers,
            message,
            output,
            engine,
        } => {
            let args = EncryptCommandArgs {
                certs,
                headers,
                message,
                output,
                engine,
            };
            handle_encrypt_command(&config_manager, args)?;
        }

        Commands::Pem { cert } => handle_pem_command(cert)?,

        Commands::Der { input, output } => handle_der_command(input, output)?,

        Commands::Config(config_cmd) => handle_config_command(&config_manager, config_cmd)?,
    }

    Ok(())
}

fn handle_encrypt_command(config_manager: &ConfigManager, args: EncryptCommandArgs) -> Result<()> {
    let mut config = config_manager.load_or_default()?;
    if let Some(engine) = args.engine {
        config.engine.kind = engine.into();
    }

    let message = match &args.message {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read message from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .into_diagnostic()
                .wrap_err("Failed to read message from stdin")?;
            buffer
        }
    };

    let workflow = EncryptWorkflow::new(config);
    log::info!("Using {} engine", workflow.engine_name());

    let job = EncryptJob {
        recipients: args.certs,
        message,
        headers: args.headers,
    };

    match &args.output {
        Some(path) => {
            workflow.run_to_file(&job, path)?;
            eprintln!("✅ Encrypted message written to {}", path.display());
        }
        None => {
            let envelope = workflow.run(&job)?;
            println!("{}", render(&envelope));
        }
    }
    Ok(())
}

fn handle_pem_command(cert: PathBuf) -> Result<()> {
    let certificate = get_certificate(cert.as_path())?;
    log::info!(
        "{} (sha256 {})",
        certificate.subject(),
        certificate.fingerprint()
    );
    print!("{}", pem_encode(&certificate)?);
    Ok(())
}

fn handle_der_command(input: PathBuf, output: PathBuf) -> Result<()> {
    let pem = std::fs::read_to_string(&input)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", input.display()))?;
    let der = pem_to_der(&pem)?;
    std::fs::write(&output, &der)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write {}", output.display()))?;
    println!("✅ Wrote {} DER bytes to {}", der.len(), output.display());
    Ok(())
}

fn handle_config_command(config_manager: &ConfigManager, config_cmd: ConfigCommands) -> Result<()> {
    match config_cmd {
        ConfigCommands::Show => match config_manager.load() {
            Ok(config) => print_config(&config, config_manager),
            Err(_) => {
                println!("📋 No configuration file found. Use 'config init' to create one.");
            }
        },

        ConfigCommands::Init => {
            let _config = config_manager.load_or_create_default()?;
            println!(
                "✅ Configuration initialized: {}",
                config_manager.config_path().display()
            );
        }

        ConfigCommands::Set { key, value } => {
            config_manager.update_value(&key, &value)?;
            println!("✅ Set {key} = {value}");
        }

        ConfigCommands::Export { format, output } => {
            let exported = config_manager.export_config(format.into())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, exported)
                        .into_diagnostic()
                        .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
                    println!("✅ Configuration exported to {}", path.display());
                }
                None => println!("{exported}"),
            }
        }

        ConfigCommands::Path => println!("{}", config_manager.config_path().display()),
    }
    Ok(())
}

fn print_config(config: &EnvelopeConfiguration, config_manager: &ConfigManager) {
    println!("📋 Current Configuration:");
    println!("  Preferred cipher: {}", config.cipher.preferred);
    println!(
        "  Legacy 3DES fallback: {}",
        config.cipher.allow_legacy_fallback
    );
    println!("  Scratch directory: {}", config.scratch_dir().display());
    println!("  Engine: {:?}", config.engine.kind);
    println!("  OpenSSL binary: {}", config.engine.openssl_binary);
    println!("  Engine timeout: {}s", config.engine.timeout_seconds);
    println!(
        "  Configuration file: {}",
        config_manager.config_path().display()
    );
}
