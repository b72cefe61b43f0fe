use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use voicechat_gateway::{
    ApiServerBuilder, Config, Conversation, Session, SpeechSynthesizer, TextToSpeech,
};

/// Voicechat - conversation backend for browser voice chat
#[derive(Parser)]
#[command(name = "voicechat", version, about)]
struct Cli {
    /// Path to a TOML config file (defaults to the user config dir)
    #[arg(short, long, env = "VOICECHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Load and print the effective configuration
    CheckConfig,
    /// Send one utterance to the language model
    TestLlm {
        /// Text to send
        #[arg(default_value = "Hello! Who am I talking to?")]
        text: String,
    },
    /// Synthesize speech and write it to an MP3 file
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
        /// Voice id (defaults to the configured voice)
        #[arg(long)]
        voice: Option<String>,
        /// Output file
        #[arg(short, long, default_value = "voicechat-tts-test.mp3")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity; RUST_LOG wins when set
    let filter = match cli.verbose {
        0 => "info,voicechat_gateway=info",
        1 => "info,voicechat_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.api_server.port = port;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CheckConfig => check_config(&config),
        Command::TestLlm { text } => test_llm(config, &text).await,
        Command::TestTts { text, voice, output } => test_tts(config, &text, voice, &output).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let server_config = config.api_server.clone();
    tracing::info!(
        persona = %config.persona.id,
        model = %config.llm.model,
        port = server_config.port,
        "starting voicechat gateway"
    );

    let conversation = Conversation::from_config(config)?;

    ApiServerBuilder::new(std::sync::Arc::new(conversation), server_config.port)
        .cors_origin(server_config.cors_origin)
        .static_dir(server_config.static_dir)
        .rate_limit(server_config.rate_limit_per_minute)
        .build()
        .run()
        .await?;

    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn check_config(config: &Config) -> anyhow::Result<()> {
    let set = |present: bool| if present { "set" } else { "missing" };

    println!("Persona:        {} ({})", config.persona.name, config.persona.id);
    let missing = config.persona.missing_placeholders();
    if !missing.is_empty() {
        println!("  missing placeholders: {}", missing.join(", "));
    }
    println!("LLM endpoint:   {}", config.llm.base_url);
    println!("LLM model:      {}", config.llm.model);
    let llm_key_set = config
        .llm
        .api_key
        .as_ref()
        .is_some_and(|k| !k.expose_secret().is_empty());
    println!("LLM API key:    {}", set(llm_key_set));
    println!("TTS provider:   {:?}", config.voice.provider);
    println!("TTS voice:      {}", config.voice.default_voice);
    println!("TTS API key:    {}", set(config.voice.api_key.is_some()));
    let voice_output = if config.voice_available() {
        "enabled"
    } else {
        "disabled"
    };
    println!("Voice output:   {voice_output}");
    println!("Max history:    {}", config.max_history);
    println!("Port:           {}", config.api_server.port);
    println!(
        "CORS origin:    {}",
        config.api_server.cors_origin.as_deref().unwrap_or("*")
    );
    if let Some(dir) = &config.api_server.static_dir {
        println!("Static dir:     {}", dir.display());
    }
    if let Some(rpm) = config.api_server.rate_limit_per_minute {
        println!("Rate limit:     {rpm}/min");
    }

    match config.validate() {
        Ok(()) => println!("\nConfiguration OK"),
        Err(e) => println!("\nConfiguration incomplete: {e}"),
    }
    Ok(())
}

async fn test_llm(config: Config, text: &str) -> anyhow::Result<()> {
    println!("Testing language model with text: \"{text}\"\n");

    let conversation = Conversation::from_config(config)?;
    let prompt = conversation.prompts().build_prompt(&Session::default(), text)?;
    println!("System prompt:\n{}\n", prompt.system);

    println!("Asking {}...", conversation.model());
    let reply = conversation.respond(Some("cli"), text).await?;
    println!("Reply: {}", reply.text);

    Ok(())
}

async fn test_tts(
    config: Config,
    text: &str,
    voice: Option<String>,
    output: &std::path::Path,
) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let key = config
        .voice
        .api_key
        .ok_or_else(|| anyhow::anyhow!("no API key for {:?} TTS", config.voice.provider))?;
    let tts = TextToSpeech::new(
        config.voice.provider,
        key,
        config.voice.model,
        config.voice.base_url,
        config.voice.speed,
    )?;
    let voice = voice.unwrap_or(config.voice.default_voice);

    println!("Synthesizing speech with voice {voice}...");
    let mp3_data = tts.synthesize(text, &voice).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    // Check MP3 header
    if mp3_data.len() > 3 {
        println!(
            "First 4 bytes: {:02x} {:02x} {:02x} {:02x}",
            mp3_data[0], mp3_data[1], mp3_data[2], mp3_data[3]
        );
    }

    tokio::fs::write(output, &mp3_data).await?;
    println!("Wrote {}", output.display());

    Ok(())
}
