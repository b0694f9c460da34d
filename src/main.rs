//! Dermacap - skin-lesion capture and risk-screening pipeline
//!
//! Guides a capture session from the command line: live camera ingestion
//! into a single-slot holder, freeze-and-crop on capture, PNG persistence
//! with path handoff, and upload of the saved image to a remote inference
//! endpoint.

use anyhow::Result;
use clap::Parser;
use dermacap_capture::{CameraSource, FramePacer};
use dermacap_core::Config;
use dermacap_pipeline::{CaptureController, CaptureState, FrameSlot};
use dermacap_store::{handoff_channel, HandoffReceiver, ImageStore};
use dermacap_upload::{InferenceClient, ScreeningResult, MODELS};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Dermacap - capture, crop and screen skin-lesion images
#[derive(Parser, Debug)]
#[command(name = "dermacap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Preferred capture width in pixels
    #[arg(short = 'W', long, default_value = "640")]
    width: u32,

    /// Preferred capture height in pixels
    #[arg(short = 'H', long, default_value = "480")]
    height: u32,

    /// Frame delivery cap
    #[arg(short, long, default_value = "30")]
    fps: u32,

    /// Camera device index
    #[arg(short, long, default_value = "0")]
    camera: u32,

    /// Study folder key (images land under study_<key>)
    #[arg(long, default_value = "default")]
    folder: String,

    /// Base name for saved images
    #[arg(long, default_value = "capture")]
    name: String,

    /// Inference endpoint URL
    #[arg(short, long, default_value = "http://localhost:8000/predict")]
    endpoint: String,

    /// Model name sent with screening requests
    #[arg(short, long, default_value = MODELS[0])]
    model: String,

    /// Override the store root (defaults to the documents directory)
    #[arg(long)]
    store_root: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Control messages for the camera thread.
enum CameraCommand {
    Zoom(f32),
    Torch,
    Flip,
    Focus(f32, f32),
    Stop,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!("Dermacap v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::new()
        .with_width(args.width)
        .with_height(args.height)
        .with_fps(args.fps)
        .with_camera_index(args.camera)
        .with_folder_key(args.folder)
        .with_base_name(args.name)
        .with_endpoint(args.endpoint)
        .with_model(args.model);

    let store = match args.store_root {
        Some(root) => ImageStore::with_root(root),
        None => ImageStore::new()?,
    };
    info!("Saving captures under {}", store.root().display());

    let (handoff_tx, mut handoff_rx) = handoff_channel();
    let slot = Arc::new(FrameSlot::new());
    let mut controller =
        CaptureController::new(slot.clone(), config.capture_region(), config.viewport());
    let client = InferenceClient::new(config.endpoint.clone());

    // Camera ingestion runs on a dedicated thread: the device handle does
    // not move across await points, and frame pulls are blocking.
    let (cmd_tx, cmd_rx) = std::sync::mpsc::channel::<CameraCommand>();
    let capture_slot = slot.clone();
    let capture_config = config.clone();
    let capture_thread = std::thread::spawn(move || {
        let mut source = match CameraSource::open(&capture_config) {
            Ok(source) => source,
            Err(e) => {
                warn!("Camera configuration failed: {}", e);
                return;
            }
        };
        if let Err(e) = source.start() {
            warn!("Camera failed to start: {}", e);
            return;
        }

        let (width, height) = source.dimensions();
        info!("Camera streaming at {}x{}", width, height);

        let mut pacer = FramePacer::new(capture_config.fps);
        let frame_interval = Duration::from_micros(capture_config.frame_interval_us().max(1));

        loop {
            while let Ok(command) = cmd_rx.try_recv() {
                match command {
                    CameraCommand::Zoom(scale) => {
                        let factor = source.update_zoom(scale);
                        info!("Zoom factor now {:.2}", factor);
                    }
                    CameraCommand::Torch => {
                        source.toggle_torch();
                    }
                    CameraCommand::Flip => {
                        source.flip_camera();
                        pacer.reset();
                    }
                    CameraCommand::Focus(x, y) => source.focus_at(x, y),
                    CameraCommand::Stop => {
                        source.stop();
                        return;
                    }
                }
            }

            let start = std::time::Instant::now();
            match source.capture() {
                Ok(frame) => {
                    if pacer.should_emit(frame.timestamp_us) {
                        capture_slot.publish(frame);
                    }
                }
                Err(e) => {
                    warn!("Capture error: {}", e);
                }
            }

            // Maintain frame rate
            let elapsed = start.elapsed();
            if elapsed < frame_interval {
                std::thread::sleep(frame_interval - elapsed);
            }
        }
    });

    print_help();

    // The path delivered by the most recent save; screening uploads this.
    let mut standard_image_path: Option<PathBuf> = None;
    // The last successful screening stays in place across failed uploads.
    let mut last_result: Option<ScreeningResult> = None;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
        };
        let Some(line) = line else { break };
        let mut parts = line.split_whitespace();

        match parts.next() {
            Some("capture") => match controller.capture() {
                Ok(still) => info!("Captured {}x{} still", still.width, still.height),
                Err(e) => warn!("{}", e),
            },
            Some("restart") => {
                controller.restart();
                info!("Session live again");
            }
            Some("save") => match controller.still() {
                Some(still) => {
                    match store.save_with_handoff(
                        still,
                        &config.folder_key,
                        &config.base_name,
                        &handoff_tx,
                    ) {
                        Ok(path) => {
                            info!("Image saved successfully at path: {}", path.display());
                            receive_saved_path(&mut handoff_rx, &mut standard_image_path);
                        }
                        Err(e) => warn!("Error saving image: {}", e),
                    }
                }
                None => warn!("No detected image available. Capture the image first."),
            },
            Some("run") => {
                let Some(path) = standard_image_path.as_deref() else {
                    warn!("No saved image to screen; save a capture first");
                    continue;
                };
                match client.screen_image(&config.model, path).await {
                    Ok(result) => {
                        println!(
                            "Predicted risk: {}\nProbability: {}",
                            result.output,
                            result.rounded_probability()
                        );
                        last_result = Some(result);
                    }
                    Err(e) => {
                        // The previously rendered result stays untouched.
                        warn!("Screening failed: {}", e);
                    }
                }
            }
            Some("zoom") => match parts.next().and_then(|s| s.parse::<f32>().ok()) {
                Some(scale) => {
                    let _ = cmd_tx.send(CameraCommand::Zoom(scale));
                }
                None => warn!("Usage: zoom <scale>"),
            },
            Some("torch") => {
                let _ = cmd_tx.send(CameraCommand::Torch);
            }
            Some("flip") => {
                let _ = cmd_tx.send(CameraCommand::Flip);
            }
            Some("focus") => {
                let x = parts.next().and_then(|s| s.parse::<f32>().ok());
                let y = parts.next().and_then(|s| s.parse::<f32>().ok());
                match (x, y) {
                    (Some(x), Some(y)) => {
                        let _ = cmd_tx.send(CameraCommand::Focus(x, y));
                    }
                    _ => warn!("Usage: focus <x> <y>"),
                }
            }
            Some("status") => {
                let state = match controller.state() {
                    CaptureState::Live => "live",
                    CaptureState::Frozen => "frozen",
                };
                println!("session: {state}");
                if let Some(path) = &standard_image_path {
                    println!("saved image: {}", path.display());
                }
                if let Some(result) = &last_result {
                    println!(
                        "last screening: {} ({})",
                        result.output,
                        result.rounded_probability()
                    );
                }
            }
            Some("help") => print_help(),
            Some("quit") | Some("exit") => break,
            Some(other) => warn!("Unknown command: {}", other),
            None => {}
        }
    }

    let _ = cmd_tx.send(CameraCommand::Stop);
    if capture_thread.join().is_err() {
        warn!("Camera thread exited abnormally");
    }

    info!("Goodbye!");
    Ok(())
}

/// Drain the handoff and remember the delivered path, exactly as the
/// consuming screen would.
fn receive_saved_path(rx: &mut HandoffReceiver, slot: &mut Option<PathBuf>) {
    while let Ok(event) = rx.try_recv() {
        *slot = Some(event.path);
    }
}

fn print_help() {
    println!("Commands:");
    println!("  capture        freeze the session and crop the current frame");
    println!("  restart        discard the capture and resume live frames");
    println!("  save           persist the capture and hand its path off");
    println!("  run            upload the saved image for risk screening");
    println!("  zoom <scale>   apply an incremental zoom factor");
    println!("  torch          toggle the torch (where supported)");
    println!("  flip           switch to the other camera");
    println!("  focus <x> <y>  nudge focus toward a preview point");
    println!("  status         show session state");
    println!("  quit           exit");
}
