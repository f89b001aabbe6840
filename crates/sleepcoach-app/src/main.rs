//! Sleep coach binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Load the knowledge base (file override or built-in)
//! 4. Wire the utterance source (microphone + whisper, or typed stdin)
//!    and the speech synthesizer
//! 5. Run the conversation loop until an exit phrase or end of input

mod cli;

use std::path::Path;

use clap::Parser;

use sleepcoach_audio::{MicrophoneCapture, RecordingStore};
use sleepcoach_core::config::SleepCoachConfig;
use sleepcoach_core::error::CoachError;
use sleepcoach_core::knowledge::KnowledgeBase;
use sleepcoach_dialogue::{ConversationLoop, DialogueManager};
use sleepcoach_speech::{
    CommandSynthesizer, SilentSynthesizer, SpeechSynthesizer, TypedInput, UtteranceSource,
    VoiceInput, WhisperService,
};

use cli::CliArgs;

/// Synthesizer chosen at startup.
enum Voice {
    Command(CommandSynthesizer),
    Silent(SilentSynthesizer),
}

impl Voice {
    fn from_config(config: &SleepCoachConfig, text_mode: bool) -> Self {
        if text_mode || config.voice.command.trim().is_empty() {
            Voice::Silent(SilentSynthesizer)
        } else {
            Voice::Command(CommandSynthesizer::from_config(&config.voice))
        }
    }
}

impl SpeechSynthesizer for Voice {
    async fn speak(&self, text: &str) -> Result<(), CoachError> {
        match self {
            Voice::Command(synth) => synth.speak(text).await,
            Voice::Silent(synth) => synth.speak(text).await,
        }
    }
}

fn load_knowledge(config: &SleepCoachConfig) -> Result<KnowledgeBase, CoachError> {
    match config.knowledge.path.as_deref() {
        Some(path) => KnowledgeBase::load(Path::new(path)),
        None => Ok(KnowledgeBase::builtin()),
    }
}

fn print_topics(kb: &KnowledgeBase, json: bool) -> Result<(), CoachError> {
    if json {
        println!("{}", serde_json::to_string_pretty(kb)?);
        return Ok(());
    }

    println!("Sleep stages:");
    for (stage, description) in kb.stages() {
        println!("  {stage}: {description}");
    }
    println!("Sleep hygiene:");
    for tip in kb.hygiene_tips() {
        println!("  - {tip}");
    }
    println!("Common issues:");
    for issue in kb.issues() {
        println!("  {}: {}", issue.key, issue.description);
    }
    Ok(())
}

/// Voice mode needs both a capture backend and a recogniser compiled in.
fn check_voice_backends(microphone: bool, whisper: bool) -> Result<(), CoachError> {
    if !microphone {
        return Err(CoachError::Audio(
            "no microphone available; rebuild with --features microphone or rerun with --text"
                .to_string(),
        ));
    }
    if !whisper {
        return Err(CoachError::Transcription(
            "no speech recogniser available; rebuild with --features whisper or rerun with --text"
                .to_string(),
        ));
    }
    Ok(())
}

async fn converse<S: UtteranceSource>(
    conversation: &mut ConversationLoop,
    source: &mut S,
    voice: &Voice,
) -> Result<(), CoachError> {
    conversation.run(source, voice).await?;
    tracing::info!(
        session_id = %conversation.session_id(),
        turns = conversation.log().len(),
        "Session finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Configuration.
    let config_file = args.resolve_config_path();
    let mut config = SleepCoachConfig::load_or_default(&config_file);
    args.apply_overrides(&mut config);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(args.resolve_log_filter(&config.general.log_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(path = %config_file.display(), "Configuration loaded");
    config.validate()?;

    let knowledge = load_knowledge(&config)?;

    if args.list_topics {
        print_topics(&knowledge, args.json)?;
        return Ok(());
    }

    let voice = Voice::from_config(&config, args.text);
    let mut conversation = ConversationLoop::new(DialogueManager::new(knowledge))
        .with_echo(config.general.echo_transcript || args.text);

    if args.text {
        tracing::info!("Typed input mode");
        let mut input = TypedInput::stdin();
        converse(&mut conversation, &mut input, &voice).await?;
        return Ok(());
    }

    let capture = MicrophoneCapture::new();
    check_voice_backends(capture.is_available(), WhisperService::is_available())?;

    let transcriber = WhisperService::new(config.speech.clone())?;
    let mut input = VoiceInput::new(
        capture,
        transcriber,
        config.audio.duration_secs,
        config.audio.sample_rate,
    )
    .with_recordings(RecordingStore::new(
        &config.audio.recordings_dir,
        config.audio.keep_recordings,
    ));

    tracing::info!(
        duration_secs = config.audio.duration_secs,
        sample_rate = config.audio.sample_rate,
        "Voice input mode"
    );
    converse(&mut conversation, &mut input, &voice).await?;
    Ok(())
}
