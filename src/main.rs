use clap::{Arg, ArgAction, Command};
use codedawn::config::Config;
use codedawn::console::{self, FileDocument, LineSelection};
use codedawn::dispatcher::Dispatcher;
use codedawn::line_editor::CrlfWriter;
use codedawn::http_client::ReqwestHttpClient;
use codedawn::providers::ProviderKind;
use codedawn::pseudo_terminal::SessionMode;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("dawn")
        .about("CodeDawn - turn plain-language requests into code and shell commands")
        .long_about(
            "CodeDawn sends your request to Gemini or Groq and either rewrites the selected \
             lines of a file or suggests a shell command.",
        )
        .arg(
            Arg::new("set-gemini-key")
                .long("set-gemini-key")
                .help("Save the Gemini API key")
                .value_name("API_KEY")
                .num_args(1),
        )
        .arg(
            Arg::new("set-groq-key")
                .long("set-groq-key")
                .help("Save the Groq API key")
                .value_name("API_KEY")
                .num_args(1),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Show configuration information")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("ask")
                .about("Ask once; prompts for the request when none is given")
                .arg(
                    Arg::new("prompt")
                        .help("What you want CodeDawn to do")
                        .num_args(1..),
                )
                .arg(
                    Arg::new("file")
                        .long("file")
                        .short('f')
                        .help("File to treat as the active document")
                        .value_name("PATH"),
                )
                .arg(
                    Arg::new("selection")
                        .long("selection")
                        .short('s')
                        .help("Selected lines of the file, START:END (1-based, inclusive)")
                        .value_name("RANGE")
                        .requires("file"),
                )
                .arg(
                    Arg::new("language")
                        .long("language")
                        .help("Language tag of the file (default: from its extension)")
                        .value_name("TAG")
                        .requires("file"),
                ),
        )
        .subcommand(
            Command::new("term")
                .about("Open the interactive CodeDawn terminal")
                .arg(
                    Arg::new("file")
                        .long("file")
                        .short('f')
                        .help("File to treat as the active document")
                        .value_name("PATH"),
                )
                .arg(
                    Arg::new("single-shot")
                        .long("single-shot")
                        .help("Close after the first command")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("prefix")
                        .long("prefix")
                        .help("Word every command must start with")
                        .value_name("WORD")
                        .conflicts_with("no-prefix"),
                )
                .arg(
                    Arg::new("no-prefix")
                        .long("no-prefix")
                        .help("Treat every line as a request")
                        .action(ArgAction::SetTrue),
                ),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CODEDAWN_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        // `dawn term` shares the screen with logs while in raw mode
        .with_writer(|| CrlfWriter::new(std::io::stderr()))
        .init();

    let matches = cli().get_matches();

    // Handle configuration commands
    for (flag, provider) in [
        ("set-gemini-key", ProviderKind::Gemini),
        ("set-groq-key", ProviderKind::Groq),
    ] {
        if let Some(api_key) = matches.get_one::<String>(flag) {
            let path = Config::get_config_path()?;
            let mut config = Config::load_from_path(&path)?;
            config.set_api_key(provider, api_key.clone())?;
            println!("✅ {} API key saved successfully", provider);
            return Ok(());
        }
    }

    if matches.get_flag("config") {
        Config::show_config_info()?;
        return Ok(());
    }

    let config = Config::load()?;
    let http = Arc::new(ReqwestHttpClient::new());

    match matches.subcommand() {
        Some(("ask", args)) => {
            let document = match args.get_one::<String>("file") {
                Some(file) => {
                    let selection = args
                        .get_one::<String>("selection")
                        .map(|s| LineSelection::parse(s.as_str()))
                        .transpose()?;
                    let language = args.get_one::<String>("language").cloned();
                    Some(FileDocument::new(PathBuf::from(file), language, selection))
                }
                None => None,
            };
            let prompt = args
                .get_many::<String>("prompt")
                .map(|words| words.cloned().collect::<Vec<_>>().join(" "));

            let host = console::host_surfaces(config, document);
            let notifier = host.notifier.clone();
            let dispatcher = Dispatcher::new(http, host);
            if let Some(outcome) = console::run_modal(&dispatcher, notifier.as_ref(), prompt).await? {
                info!("Request finished as {:?}", outcome.state());
                if !outcome.is_success() {
                    std::process::exit(1);
                }
            }
        }
        Some(("term", args)) => {
            let mut session = config.terminal.clone();
            if args.get_flag("single-shot") {
                session.mode = SessionMode::SingleShot;
            }
            if let Some(prefix) = args.get_one::<String>("prefix") {
                session.command_prefix = Some(prefix.clone());
            }
            if args.get_flag("no-prefix") {
                session.command_prefix = None;
            }
            let document = args
                .get_one::<String>("file")
                .map(|file| FileDocument::new(PathBuf::from(file), None, None));

            let host = console::host_surfaces(config, document);
            let dispatcher = Dispatcher::new(http, host);
            console::run_pseudo_terminal(&dispatcher, session).await?;
        }
        _ => {
            cli().print_help()?;
        }
    }

    Ok(())
}
