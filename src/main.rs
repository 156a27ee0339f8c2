use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use voice_drop::{
    CaptureSource, Config, FileCapture, HttpUploadSink, RecordingController, SessionSummary,
    TerminalView,
};

/// Record audio and upload it to the server
#[derive(Debug, Parser)]
#[command(name = "voice-drop", version)]
struct Args {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/voice-drop")]
    config: String,

    /// Server base URL, overrides the config file
    #[arg(long)]
    server: Option<String>,

    /// Replay this WAV file instead of a live device
    #[arg(long)]
    input: Option<PathBuf>,

    /// Emit file fragments at this period (milliseconds)
    #[arg(long)]
    timeslice_ms: Option<u64>,

    /// Capture from the default microphone
    #[cfg(feature = "microphone")]
    #[arg(long, conflicts_with = "input")]
    mic: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let base_url = args.server.clone().unwrap_or_else(|| cfg.upload.base_url.clone());
    let timeslice = args
        .timeslice_ms
        .map(Duration::from_millis)
        .or_else(|| cfg.timeslice());

    let source = capture_source(&args, timeslice)?;
    let sink = HttpUploadSink::new(&base_url, &cfg.upload.path).context("Invalid upload target")?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Capture source: {}", source.name());
    info!("Uploading to {}", sink.url());

    let view = Arc::new(TerminalView::new());
    let controller = RecordingController::new(source, Arc::new(sink), view.clone(), cfg.session());

    println!("{}", view.prompt());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut sessions: Vec<JoinHandle<()>> = Vec::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match line.trim() {
                    "r" | "record" => {
                        if !view.start_enabled() {
                            println!("{}", view.prompt());
                            continue;
                        }
                        if let Some(handle) = controller.start() {
                            track_session(&mut sessions, tokio::spawn(report(handle)));
                        }
                    }
                    "s" | "stop" => {
                        controller.stop();
                        println!("{}", view.prompt());
                    }
                    "q" | "quit" => break,
                    "" => println!("{}", view.prompt()),
                    other => println!("Unknown command {:?}. {}", other, view.prompt()),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    // Let an in-flight recording finish uploading before exiting.
    controller.stop();
    for handle in sessions {
        let _ = handle.await;
    }

    info!("Uploaded {} recording(s)", view.uploads());

    Ok(())
}

async fn report(handle: JoinHandle<SessionSummary>) {
    match handle.await {
        Ok(summary) => match serde_json::to_string(&summary) {
            Ok(json) => info!("Session summary: {}", json),
            Err(e) => error!("Failed to serialize session summary: {}", e),
        },
        Err(e) => error!("Session task panicked: {}", e),
    }
}

/// Keep the reporter for a new session, dropping those already done
fn track_session(sessions: &mut Vec<JoinHandle<()>>, reporter: JoinHandle<()>) {
    sessions.retain(|handle| !handle.is_finished());
    sessions.push(reporter);
}

fn capture_source(args: &Args, timeslice: Option<Duration>) -> Result<Arc<dyn CaptureSource>> {
    #[cfg(feature = "microphone")]
    {
        if args.mic {
            return Ok(Arc::new(voice_drop::MicrophoneCapture::new()));
        }
    }

    match &args.input {
        Some(path) => Ok(Arc::new(FileCapture::new(path.clone(), timeslice))),
        None => bail!("No capture source: pass --input <file.wav>{}", mic_hint()),
    }
}

fn mic_hint() -> &'static str {
    if cfg!(feature = "microphone") {
        " or --mic"
    } else {
        " (build with --features microphone for live capture)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finished_reporters_are_dropped_when_tracking_a_new_one() {
        let mut sessions = Vec::new();

        let done = tokio::spawn(async {});
        while !done.is_finished() {
            tokio::task::yield_now().await;
        }
        track_session(&mut sessions, done);
        track_session(&mut sessions, tokio::spawn(std::future::pending::<()>()));
        assert_eq!(sessions.len(), 2);

        track_session(&mut sessions, tokio::spawn(std::future::pending::<()>()));
        assert_eq!(sessions.len(), 2, "finished reporter was pruned");

        for handle in sessions {
            handle.abort();
        }
    }
}
