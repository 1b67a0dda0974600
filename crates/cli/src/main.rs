use clap::{Parser, Subcommand};
use kandar::reply;

#[derive(Parser)]
#[command(name = "kandar")]
#[command(about = "Kandar CLI: WhatsApp keyword auto-responder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config.json (placeholders for credentials).
    Init {
        /// Config file path (default: KANDAR_CONFIG_PATH or ~/.kandar/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the webhook gateway. PORT, WHATSAPP_TOKEN, PHONE_NUMBER_ID, VERIFY_TOKEN and WHATSAPP_API_URL override the config file.
    Gateway {
        /// Config file path (default: KANDAR_CONFIG_PATH or ~/.kandar/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from PORT, config, or 3000)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Preview the keyword reply for a message without sending anything. Reads lines from stdin when TEXT is omitted.
    Reply {
        /// Message text to match.
        text: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = dotenv {
        if !e.not_found() {
            log::warn!("reading .env failed: {}", e);
        }
    }

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("kandar {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Reply { text }) => {
            if let Err(e) = run_reply(text) {
                log::error!("reply failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(kandar::config::default_config_path);
    if kandar::config::write_default_config(&path)? {
        println!("initialized configuration at {}", path.display());
    } else {
        println!("configuration already exists at {}", path.display());
    }
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = kandar::config::load_config(config_path)?;
    kandar::config::apply_env_overrides(&mut config)?;
    if let Some(p) = port {
        config.server.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.server.bind,
        config.server.port,
        path.display()
    );
    kandar::gateway::run_gateway(config).await
}

fn print_reply(text: &str) {
    let rule = reply::match_rule(text);
    println!("[{}]", rule.name());
    println!("{}", rule.reply());
}

fn run_reply(text: Option<String>) -> anyhow::Result<()> {
    use std::io::{self, Write};

    if let Some(text) = text {
        print_reply(&text);
        return Ok(());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }
        print_reply(input);
        println!();
    }
    Ok(())
}
