use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use iris_assistant::camera::{CameraRig, PreviewSampler};
use iris_assistant::command::CameraId;
use iris_assistant::voice::{
    AudioCapture, AudioPlayback, PLAYBACK_SAMPLE_RATE, Recorder, RecorderEvent, SpeechManager,
    SpeechToText, Synthesizer, TextToSpeech, rms,
};
use iris_assistant::{
    Backend, Config, ConversationOrchestrator, HttpAdapterFactory, SharedStatus, StatusSink,
};

/// Iris - voice and camera assistant for chat models
#[derive(Parser)]
#[command(name = "iris", version, about)]
struct Cli {
    /// Backend to start with (chatgpt, claude, gemini, grok, perplexity)
    #[arg(short, long, env = "IRIS_BACKEND")]
    backend: Option<String>,

    /// Number of attached cameras (0, 1 or 2)
    #[arg(long, env = "IRIS_CAMERAS")]
    cameras: Option<usize>,

    /// Disable speech output and recording
    #[arg(long, env = "IRIS_DISABLE_VOICE")]
    disable_voice: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Ask a single question and print the answer
    Ask {
        /// Question text
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
        /// Voice to use
        #[arg(long, default_value = "nova")]
        voice: String,
    },
    /// Test a camera: preview frames, analysis image and a full photo
    TestCamera {
        /// Camera number (1 or 2)
        #[arg(default_value = "1")]
        camera: u8,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Quiet by default so logs stay out of the conversation
    let filter = match cli.verbose {
        0 => "warn,iris_assistant=warn",
        1 => "info,iris_assistant=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(name) = &cli.backend {
        config.backend = name.parse()?;
    }
    if let Some(count) = cli.cameras {
        config.camera.count = count.min(2);
    }
    if cli.disable_voice {
        config.voice.enabled = false;
    }
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Ask { text } => ask(config, &text.join(" ")).await,
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker(),
            Command::TestTts { text, voice } => test_tts(&config, &text, &voice).await,
            Command::TestCamera { camera } => test_camera(config, camera).await,
        };
    }

    interactive(config).await
}

/// Build the orchestrator, plus a recorder when voice is enabled
fn assemble(config: &Config) -> anyhow::Result<(Arc<ConversationOrchestrator>, Option<Recorder>)> {
    let cameras = Arc::new(CameraRig::detect(&config.camera));
    let factory = Arc::new(HttpAdapterFactory::new(
        config.api_keys.clone(),
        config.models.clone(),
    ));

    let mut orchestrator =
        ConversationOrchestrator::new(config.backend, factory, cameras, config.models.clone())?;

    let mut recorder = None;
    if config.voice.enabled {
        match voice_clients(config) {
            Ok((tts, stt)) => {
                let speaker = SpeechManager::new(Arc::new(tts));
                orchestrator = orchestrator.with_speaker(Arc::new(speaker));
                recorder = Some(Recorder::new(Arc::new(stt)));
            }
            Err(e) => tracing::warn!(error = %e, "voice disabled"),
        }
    }

    Ok((Arc::new(orchestrator), recorder))
}

fn voice_clients(config: &Config) -> iris_assistant::Result<(TextToSpeech, SpeechToText)> {
    let key = config.api_keys.require("openai")?.to_string();
    let tts = TextToSpeech::new(key.clone(), config.voice.tts_model.clone(), config.voice.tts_speed)?;
    let stt = SpeechToText::new(key, config.voice.stt_model.clone())?;
    Ok((tts, stt))
}

fn status_line() -> SharedStatus {
    Arc::new(|message: &str| {
        if !message.is_empty() {
            eprintln!("[{message}]");
        }
    })
}

/// Interactive terminal session
#[allow(clippy::future_not_send)]
async fn interactive(config: Config) -> anyhow::Result<()> {
    let (orchestrator, mut recorder) = assemble(&config)?;
    let status = status_line();

    println!(
        "Iris ready on {}. Commands: /model [name], /clear, /stop, /record, quit",
        config.backend.display_name()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_lowercase().as_str() {
            "quit" | "exit" | "bye" => break,
            "/clear" => {
                orchestrator.clear_history().await;
                println!("History cleared.");
            }
            "/stop" => orchestrator.stop_speech(),
            "/record" => {
                let Some(recorder) = recorder.as_mut() else {
                    println!("Voice input is disabled.");
                    continue;
                };
                if !recorder.is_recording() {
                    status.status("Recording audio...");
                }
                match recorder.toggle().await {
                    Ok(RecorderEvent::Started) => println!("Recording... enter /record again to stop."),
                    Ok(RecorderEvent::Transcribed(text)) => {
                        status.status("");
                        println!("You: {text}");
                        answer(&orchestrator, &text, &status).await;
                    }
                    Ok(RecorderEvent::Empty) => {
                        status.status("");
                        println!("(nothing heard)");
                    }
                    Err(e) => {
                        status.status("");
                        eprintln!("Recording error: {e}");
                    }
                }
            }
            command if command == "/model" || command.starts_with("/model ") => {
                let name = input["/model".len()..].trim();
                switch_model(&orchestrator, name).await;
            }
            _ => answer(&orchestrator, input, &status).await,
        }
    }

    orchestrator.stop_speech();
    println!("Goodbye!");
    Ok(())
}

async fn answer(orchestrator: &ConversationOrchestrator, text: &str, status: &SharedStatus) {
    let reply = orchestrator.respond(text, Arc::clone(status)).await;
    let backend = orchestrator.backend().await;
    println!("{}: {reply}", backend.display_name());
}

async fn switch_model(orchestrator: &ConversationOrchestrator, name: &str) {
    let backend = if name.is_empty() {
        match pick_backend(orchestrator.backend().await).await {
            Ok(backend) => backend,
            Err(e) => {
                eprintln!("Model selection failed: {e}");
                return;
            }
        }
    } else {
        match name.parse::<Backend>() {
            Ok(backend) => backend,
            Err(e) => {
                eprintln!("Error: {e}");
                return;
            }
        }
    };

    match orchestrator.switch_backend(backend).await {
        Ok(()) => println!("Switched to {}.", backend.display_name()),
        Err(e) => eprintln!("Error switching to {}: {e}", backend.display_name()),
    }
}

async fn pick_backend(current: Backend) -> anyhow::Result<Backend> {
    tokio::task::spawn_blocking(move || {
        let labels: Vec<&str> = Backend::ALL.iter().map(|b| b.display_name()).collect();
        let default = Backend::ALL.iter().position(|b| *b == current).unwrap_or(0);
        let index = dialoguer::Select::new()
            .with_prompt("Select a model")
            .items(&labels)
            .default(default)
            .interact()?;
        Ok::<_, anyhow::Error>(Backend::ALL[index])
    })
    .await?
}

/// Answer one question without speech
async fn ask(mut config: Config, text: &str) -> anyhow::Result<()> {
    config.voice.enabled = false;
    let (orchestrator, _) = assemble(&config)?;
    let reply = orchestrator.respond(text, status_line()).await;
    println!("{reply}");
    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_samples();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: arecord -l (to list devices)");
    println!("  3. Try: alsamixer (to check capture levels)");

    Ok(())
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new()?;

    let frequency = 440.0_f32;
    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..PLAYBACK_SAMPLE_RATE * 2)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples at {PLAYBACK_SAMPLE_RATE} Hz...", samples.len());
    playback.play(samples, &AtomicBool::new(false))?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: aplay -l (to list devices)");
    println!("  2. Try: alsamixer (to check output levels)");

    Ok(())
}

/// Test TTS output
async fn test_tts(config: &Config, text: &str, voice: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let key = config.api_keys.require("openai")?.to_string();
    let tts = TextToSpeech::new(key, config.voice.tts_model.clone(), config.voice.tts_speed)?;

    println!("Synthesizing speech...");
    let mp3 = tts.synthesize(text, voice).await?;
    println!("Got {} bytes of audio data", mp3.len());

    println!("Playing audio...");
    tokio::task::spawn_blocking(move || {
        AudioPlayback::new()?.play_mp3(&mp3, &AtomicBool::new(false))
    })
    .await??;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}

/// Test a camera end to end
async fn test_camera(mut config: Config, number: u8) -> anyhow::Result<()> {
    let id = CameraId::from_number(number)
        .ok_or_else(|| anyhow::anyhow!("camera must be 1 or 2, got {number}"))?;
    config.camera.count = config.camera.count.max(usize::from(number));

    let rig = CameraRig::detect(&config.camera);
    let camera = rig
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("camera {number} not initialized"))?;

    println!("Testing camera {number} ({})...", camera.label());

    let (sampler, mut feed) = PreviewSampler::spawn(Arc::clone(camera));
    let mut frames = 0;
    for _ in 0..20 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if feed.latest().is_some() {
            frames += 1;
        }
    }
    sampler.stop();
    println!("Preview: {frames} fresh frames in 2 seconds");

    match camera.capture_and_convert().await {
        Some(path) => println!("Analysis image: {}", path.display()),
        None => println!("Analysis capture failed"),
    }
    match camera.capture_high_res().await {
        Some(path) => println!("Photo saved to: {}", path.display()),
        None => println!("High resolution capture failed"),
    }

    Ok(())
}
