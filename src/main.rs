use clap::{Args, Parser, Subcommand};
use rgenimg::{
    compose_prompt,
    logger::{self, LogLevel, LoggerConfig},
    GenerationError, GenerationRequest, HuggingFaceClient, HuggingFaceConfig, PromptSelection,
    RetryPolicy, SessionId, SessionStore, Style, EXAMPLE_PROMPTS,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "rgenimg", version, about = "Styled text-to-image generation via Hugging Face")]
struct Cli {
    /// trace, debug, info, warn or error
    #[arg(long, env = "RGENIMG_LOG", default_value = "info")]
    log_level: String,

    /// Emit JSON log lines instead of colored text
    #[arg(long)]
    json_logs: bool,

    /// Override HUGGINGFACE_MODEL_ID
    #[arg(long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one image and save it as PNG
    Generate(GenerateArgs),
    /// Pick style and prompt step by step, generate as often as you like
    Interactive(RetryArgs),
    /// List the built-in styles
    Styles,
    /// List the example prompts
    Examples,
}

#[derive(Args)]
struct GenerateArgs {
    /// Preset name or free-form style text
    #[arg(long, short, default_value = "cartoon")]
    style: Style,

    /// Your own idea; wins over --example
    #[arg(long, short)]
    prompt: Option<String>,

    /// 1-based index into the example prompts; random when neither is given
    #[arg(long, short)]
    example: Option<usize>,

    #[arg(long, short, default_value = "generated.png")]
    output: PathBuf,

    #[command(flatten)]
    retry: RetryArgs,
}

#[derive(Args)]
struct RetryArgs {
    /// Attempts while the model is loading (503)
    #[arg(long)]
    max_retries: Option<u32>,

    /// Seconds between attempts
    #[arg(long)]
    retry_delay: Option<f64>,
}

impl RetryArgs {
    fn apply(&self, config: HuggingFaceConfig) -> HuggingFaceConfig {
        let max_retries = self.max_retries.unwrap_or(config.retry.max_retries);
        let retry_delay = self
            .retry_delay
            .unwrap_or(config.retry.retry_delay.as_secs_f64());
        config.with_retry(RetryPolicy::from_secs_f64(max_retries, retry_delay))
    }
}

#[derive(Debug, PartialEq)]
enum ReplCommand {
    Help,
    Styles,
    Examples,
    Style(String),
    Prompt(String),
    Example(usize),
    Random,
    Show,
    Generate,
    Save(PathBuf),
    Quit,
    Unknown(String),
}

impl ReplCommand {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match (word.to_lowercase().as_str(), rest) {
            ("help" | "?", _) => ReplCommand::Help,
            ("styles", _) => ReplCommand::Styles,
            ("examples", _) => ReplCommand::Examples,
            ("style", text) if !text.is_empty() => ReplCommand::Style(text.to_string()),
            ("prompt", text) => ReplCommand::Prompt(text.to_string()),
            ("example", n) => match n.parse::<usize>() {
                Ok(index) if index >= 1 => ReplCommand::Example(index),
                _ => ReplCommand::Unknown(line.to_string()),
            },
            ("random", _) => ReplCommand::Random,
            ("show", _) => ReplCommand::Show,
            ("generate" | "go", _) => ReplCommand::Generate,
            ("save", path) => ReplCommand::Save(PathBuf::from(if path.is_empty() {
                "generated.png"
            } else {
                path
            })),
            ("quit" | "exit", _) => ReplCommand::Quit,
            _ => ReplCommand::Unknown(line.to_string()),
        };
        Some(command)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let level = LogLevel::parse(&cli.log_level).unwrap_or(LogLevel::Info);
    let logger_config = if cli.json_logs {
        LoggerConfig::production()
    } else {
        LoggerConfig::new()
    };
    logger::init_with_config(logger_config.with_level(level))?;
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    let mut config = HuggingFaceConfig::from_env();
    if let Some(model) = &cli.model {
        config = config.with_model(model.as_str());
    }

    match cli.command {
        Command::Styles => print_styles(),
        Command::Examples => print_examples(),
        Command::Generate(args) => {
            let client = build_client(args.retry.apply(config))?;
            run_generate(&client, args).await?;
        }
        Command::Interactive(retry) => {
            let client = build_client(retry.apply(config))?;
            run_interactive(&client).await?;
        }
    }

    Ok(())
}

fn build_client(config: HuggingFaceConfig) -> rgenimg::Result<HuggingFaceClient> {
    logger::log_config_info(&config);
    match HuggingFaceClient::new(config) {
        Ok(client) => {
            log::info!("✅ Hugging Face client initialized");
            Ok(client)
        }
        Err(e) => {
            log::error!("❌ Failed to initialize Hugging Face client: {}", e);
            Err(e)
        }
    }
}

async fn run_generate(client: &HuggingFaceClient, args: GenerateArgs) -> rgenimg::Result<()> {
    let selection = match (args.prompt, args.example) {
        (Some(text), _) => PromptSelection::Custom(text),
        (None, Some(index)) => PromptSelection::Example(index.saturating_sub(1)),
        (None, None) => PromptSelection::Random,
    };
    let subject = selection.resolve(&mut rand::thread_rng()).ok_or_else(|| {
        GenerationError::ConfigError(format!(
            "--example must be between 1 and {}",
            EXAMPLE_PROMPTS.len()
        ))
    })?;
    if subject.trim().is_empty() {
        log::warn!("Please select or enter a prompt.");
        return Err(GenerationError::InvalidPrompt);
    }

    let request = GenerationRequest::new(compose_prompt(&args.style, &subject))?;
    log::info!("🎨 Generating: {}", subject);

    let image = client.image().generate_image(&request).await?;
    println!(
        "Generated {}x{} {:?} image for \"{}\"",
        image.width(),
        image.height(),
        image.format(),
        subject
    );
    image.save_png(&args.output)?;
    println!("Saved to {}", args.output.display());
    Ok(())
}

async fn run_interactive(client: &HuggingFaceClient) -> rgenimg::Result<()> {
    let store = SessionStore::new();
    let session = store.create();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("🖼️  AI Image Generator (via Hugging Face). Type `help` for commands.");
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = ReplCommand::parse(&line) else {
            continue;
        };
        if command == ReplCommand::Quit {
            break;
        }
        if let Err(e) = handle_command(client, &store, session, command).await {
            println!("Generation failed: {}", e);
        }
    }

    store.remove(session);
    Ok(())
}

async fn handle_command(
    client: &HuggingFaceClient,
    store: &SessionStore,
    session: SessionId,
    command: ReplCommand,
) -> rgenimg::Result<()> {
    match command {
        ReplCommand::Help => print_help(),
        ReplCommand::Styles => print_styles(),
        ReplCommand::Examples => print_examples(),
        ReplCommand::Style(text) => {
            let style: Style = text.parse().map_err(GenerationError::ConfigError)?;
            println!("Style set to {}", style);
            store.update(session, |state| state.style = style)?;
        }
        ReplCommand::Prompt(text) => {
            store.update(session, |state| state.subject = text)?;
        }
        ReplCommand::Example(index) => {
            let subject = PromptSelection::Example(index - 1)
                .resolve(&mut rand::thread_rng())
                .ok_or_else(|| {
                    GenerationError::ConfigError(format!(
                        "example must be between 1 and {}",
                        EXAMPLE_PROMPTS.len()
                    ))
                })?;
            println!("Prompt: {}", subject);
            store.update(session, |state| state.subject = subject)?;
        }
        ReplCommand::Random => {
            let subject = PromptSelection::Random
                .resolve(&mut rand::thread_rng())
                .unwrap_or_default();
            println!("Prompt: {}", subject);
            store.update(session, |state| state.subject = subject)?;
        }
        ReplCommand::Show => {
            let state = store
                .get(session)
                .ok_or(GenerationError::SessionNotFound(session))?;
            println!("Style:  {}", state.style);
            println!("Prompt: {}", state.prompt());
            match &state.last_image {
                Some(image) => println!("Last image: {}x{}", image.width(), image.height()),
                None => println!("Last image: none"),
            }
        }
        ReplCommand::Generate => {
            let state = store
                .get(session)
                .ok_or(GenerationError::SessionNotFound(session))?;
            let request = match state.request() {
                Ok(request) => request,
                Err(GenerationError::InvalidPrompt) => {
                    println!("Please select or enter a prompt.");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
            println!("Generating: {}", state.subject.trim());
            let image = client.image().generate_image(&request).await?;
            println!(
                "Generated {}x{} {:?} image",
                image.width(),
                image.height(),
                image.format()
            );
            store.set_image(session, image)?;
        }
        ReplCommand::Save(path) => {
            let state = store
                .get(session)
                .ok_or(GenerationError::SessionNotFound(session))?;
            match state.last_image {
                Some(image) => {
                    image.save_png(&path)?;
                    println!("Saved to {}", path.display());
                }
                None => println!("No image generated yet."),
            }
        }
        ReplCommand::Quit => {}
        ReplCommand::Unknown(line) => println!("Unknown command: {} (try `help`)", line),
    }
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  style <name|text>   pick a preset or type your own style");
    println!("  prompt <text>       write your own idea");
    println!("  example <n>         use example prompt n");
    println!("  random              use a random example prompt");
    println!("  show                show the current style and prompt");
    println!("  generate            generate an image");
    println!("  save [path]         save the last image as PNG");
    println!("  styles | examples   list presets / example prompts");
    println!("  quit");
}

fn print_styles() {
    for style in Style::presets() {
        println!("{:<14} {}", style.name(), style.text());
    }
}

fn print_examples() {
    for (i, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
        println!("{:>2}. {}", i + 1, prompt);
    }
}
