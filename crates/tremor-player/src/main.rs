//! Tremor player - audify seismic waveform data in real time
//!
//! Loads a waveform (WAV file or built-in linear sweep), feeds it to the
//! renderer in timed chunks to simulate progressive network arrival, and
//! drives transport from stdin while logging renderer events.
//!
//! ## Command line
//!
//! ```text
//! tremor-player [FILE.wav] [--speed N] [--chunk-ms N] [--rate-factor N]
//!               [--sweep-secs N] [--list-devices]
//! ```
//!
//! With no file argument a synthetic linear sweep is played. At the
//! prompt: `pause`, `resume`, `speed <n>`, `quit`.

mod config;
mod feeder;
mod source;

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use tremor_core::audio::{get_output_devices, start_audio_system};
use tremor_core::engine::{RendererCommand, RendererEvent};

use feeder::Feeder;

/// Parsed command line
struct CliArgs {
    file: Option<PathBuf>,
    speed: Option<f64>,
    chunk_ms: Option<u64>,
    rate_factor: Option<f64>,
    sweep_secs: f64,
    list_devices: bool,
}

/// Messages from the stdin reader to the main loop
enum ControlMsg {
    Transport(RendererCommand),
    Quit,
}

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args().context("Failed to parse command line arguments")?;

    if args.list_devices {
        return list_devices();
    }

    log::info!("tremor-player starting up");

    let config_path = config::default_config_path();
    let mut cfg = config::load_config(&config_path);

    // First run: write the defaults out so there is a template to edit
    if !config_path.exists() {
        if let Err(e) = config::save_config(&cfg, &config_path) {
            log::warn!("Could not write default config: {:#}", e);
        }
    }

    // CLI flags override the config file
    if let Some(speed) = args.speed {
        cfg.session = cfg.session.with_speed(speed);
    }
    if let Some(chunk_ms) = args.chunk_ms {
        cfg.feeder.chunk_ms = chunk_ms;
    }
    if let Some(rate_factor) = args.rate_factor {
        cfg.feeder.rate_factor = rate_factor;
    }

    let mut audio = start_audio_system(&cfg.audio, &cfg.session)
        .context("Failed to start audio output (try --list-devices)")?;

    println!(
        "Audio running: {} Hz, {} frames (~{:.1}ms latency)",
        audio.sample_rate, audio.buffer_size, audio.latency_ms
    );

    let src = match &args.file {
        Some(path) => source::load_wav(path)?,
        None => {
            let count = (args.sweep_secs * audio.sample_rate as f64) as usize;
            log::info!("No input file given, playing a {:.1}s linear sweep", args.sweep_secs);
            source::linear_sweep(count, audio.sample_rate)
        }
    };

    println!(
        "Playing {} ({:.1}s of samples at {} Hz, speed {:.3})",
        src.label,
        src.duration_secs(),
        src.sample_rate,
        cfg.session.speed
    );
    println!("Transport: pause | resume | speed <n> | quit");

    // The command queue is single-producer; the feeder owns the sender
    // and relays our transport commands
    let (transport_tx, transport_rx) = mpsc::channel();
    let feeder = Feeder::spawn(src, cfg.feeder.clone(), audio.command_sender, transport_rx);

    // Stdin reader thread: parses lines into control messages
    let (control_tx, control_rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match parse_transport(&line) {
                    Some(msg) => {
                        let quit = matches!(msg, ControlMsg::Quit);
                        if control_tx.send(msg).is_err() || quit {
                            break;
                        }
                    }
                    None => {
                        if !line.trim().is_empty() {
                            println!("Unknown command: {}", line.trim());
                        }
                    }
                }
            }
        })
        .context("Failed to spawn stdin reader thread")?;

    // Main loop: forward transport, log renderer events, exit on Finished
    loop {
        match control_rx.try_recv() {
            Ok(ControlMsg::Transport(cmd)) => {
                log::info!("Transport: {:?}", cmd);
                if transport_tx.send(cmd).is_err() {
                    bail!("Feeder thread exited unexpectedly");
                }
            }
            Ok(ControlMsg::Quit) => {
                println!("Quit requested");
                break;
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {}
        }

        let mut finished = false;
        while let Some(event) = audio.event_receiver.try_recv() {
            match event {
                RendererEvent::Started => {
                    println!("Playback started (pre-roll reached)");
                }
                RendererEvent::Underrun { buffered } => {
                    log::warn!("Underrun: {} samples buffered", buffered);
                }
                RendererEvent::Status { buffered, underruns } => {
                    log::debug!(
                        "Status: {} samples buffered ({:.1}s), {} underruns",
                        buffered,
                        buffered as f64 / audio.sample_rate as f64,
                        underruns
                    );
                }
                RendererEvent::Finished => {
                    println!(
                        "Playback finished ({} underruns total)",
                        audio.atomics.underruns()
                    );
                    finished = true;
                }
            }
        }
        if finished {
            break;
        }

        std::thread::sleep(Duration::from_millis(50));
    }

    // Hang up the transport channel so the feeder can exit, then stop audio
    drop(transport_tx);
    feeder.join();
    drop(audio.handle);

    log::info!("tremor-player shut down");
    Ok(())
}

/// Parse command line arguments (no positional flags beyond the file path)
fn parse_args() -> Result<CliArgs> {
    let mut args = CliArgs {
        file: None,
        speed: None,
        chunk_ms: None,
        rate_factor: None,
        sweep_secs: 10.0,
        list_devices: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--list-devices" => args.list_devices = true,
            "--speed" => args.speed = Some(parse_value(&arg, iter.next())?),
            "--chunk-ms" => args.chunk_ms = Some(parse_value(&arg, iter.next())?),
            "--rate-factor" => args.rate_factor = Some(parse_value(&arg, iter.next())?),
            "--sweep-secs" => args.sweep_secs = parse_value(&arg, iter.next())?,
            other if other.starts_with("--") => bail!("Unknown flag: {}", other),
            other => args.file = Some(PathBuf::from(other)),
        }
    }

    Ok(args)
}

/// Parse the value following a flag
fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = value.with_context(|| format!("{} requires a value", flag))?;
    value
        .parse()
        .with_context(|| format!("Invalid value for {}: {}", flag, value))
}

/// Parse a stdin line into a control message
fn parse_transport(line: &str) -> Option<ControlMsg> {
    let mut parts = line.trim().split_whitespace();
    match parts.next()? {
        "pause" => Some(ControlMsg::Transport(RendererCommand::Pause)),
        "resume" | "play" => Some(ControlMsg::Transport(RendererCommand::Resume)),
        "speed" => {
            let value: f64 = parts.next()?.parse().ok()?;
            Some(ControlMsg::Transport(RendererCommand::SetSpeed(value)))
        }
        "quit" | "exit" => Some(ControlMsg::Quit),
        _ => None,
    }
}

/// Print the available audio output devices and exit
fn list_devices() -> Result<()> {
    let devices = get_output_devices().context("Failed to enumerate audio devices")?;
    println!("Available output devices:");
    for device in &devices {
        let marker = if device.is_default { " (default)" } else { "" };
        println!("  {}{}", device, marker);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transport() {
        assert!(matches!(
            parse_transport("pause"),
            Some(ControlMsg::Transport(RendererCommand::Pause))
        ));
        assert!(matches!(
            parse_transport("  resume  "),
            Some(ControlMsg::Transport(RendererCommand::Resume))
        ));
        assert!(matches!(
            parse_transport("speed 2.5"),
            Some(ControlMsg::Transport(RendererCommand::SetSpeed(s))) if s == 2.5
        ));
        assert!(matches!(parse_transport("quit"), Some(ControlMsg::Quit)));
        assert!(parse_transport("speed").is_none());
        assert!(parse_transport("jump 3").is_none());
    }
}
