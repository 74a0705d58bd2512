//! batty - randomly introduce typos to an open tty
//!
//! Hooks a terminal device, then runs until `q` is typed on our own stdin,
//! Ctrl-C is pressed, or the hooked device goes away.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use batty::Config;

#[derive(Debug, Parser)]
#[command(
    name = "batty",
    version,
    about = "Make ttys drive people batty",
    long_about = "Randomly introduce typos to an open tty on the same device"
)]
struct Cli {
    /// Terminal device to hook, e.g. /dev/pts/3
    device: PathBuf,

    /// Typo induction rate for alphabetical characters [default: 0.1]
    #[arg(short, long)]
    rate: Option<f64>,

    /// Keyboard layout to generate typos for: qwerty, qwertz, azerty,
    /// dvorak, colemak or auto [default: qwerty]
    #[arg(short, long)]
    layout: Option<String>,

    /// Number of worker threads [default: 5]
    #[arg(short, long)]
    workers: Option<usize>,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Command line flags win over the config file
    fn apply(&self, config: &mut Config) {
        if let Some(rate) = self.rate {
            config.typo.rate = rate;
        }
        if let Some(layout) = &self.layout {
            config.typo.layout = layout.clone();
        }
        if let Some(workers) = self.workers {
            config.engine.workers = workers;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    run(cli)
}

#[cfg(unix)]
fn run(cli: Cli) -> Result<()> {
    use anyhow::{anyhow, Context};
    use batty::keyboard::{KeyboardLayout, TypoMap};
    use batty::tty::{Engine, TerminalChannel};
    use batty::TypoGenerator;
    use crossbeam_channel::select;
    use std::sync::Arc;

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            log::warn!("ignoring config file: {}", e);
            Config::default()
        }),
    };
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let layout = KeyboardLayout::from_name(&config.typo.layout)
        .context("failed to get keyboard map for layout")?;
    log::info!("generating {} typos at rate {}", layout, config.typo.rate);
    let generator = TypoGenerator::new(TypoMap::new(layout), config.typo.rate);

    let channel =
        TerminalChannel::open(&cli.device).context("failed to get tty for read/write")?;
    let handle = Engine::new(config.engine.clone())
        .hook_channel(channel, Arc::new(generator))
        .context("failed to start engine")?;

    let quit = quit_signal()?;
    println!("TTY hooked, press q to exit");

    let captured = select! {
        recv(quit) -> _ => None,
        recv(handle.done()) -> result => Some(result),
    };

    match captured {
        // The capture thread is still blocked on the device; leave it to exit.
        None => {
            println!("{}", handle.stats());
            Ok(())
        }
        Some(Ok(Ok(()))) => {
            log::info!("{} closed", cli.device.display());
            println!("{}", handle.finish(Ok(()))?);
            Ok(())
        }
        Some(Ok(Err(e))) => {
            println!("{}", handle.stats());
            Err(e).context("capture failed")
        }
        Some(Err(_)) => {
            println!("{}", handle.stats());
            Err(anyhow!("capture thread exited unexpectedly"))
        }
    }
}

#[cfg(not(unix))]
fn run(_cli: Cli) -> Result<()> {
    anyhow::bail!("batty needs a unix terminal device")
}

/// Fires once `q` is read from stdin, stdin closes, or Ctrl-C is pressed
#[cfg(unix)]
fn quit_signal() -> Result<crossbeam_channel::Receiver<()>> {
    use anyhow::Context;
    use std::io::{self, Read};
    use std::thread;

    let (tx, rx) = crossbeam_channel::bounded(1);

    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.try_send(());
    })
    .context("failed to install Ctrl-C handler")?;

    thread::Builder::new()
        .name("batty-stdin".to_string())
        .spawn(move || {
            for byte in io::stdin().lock().bytes() {
                match byte {
                    Ok(b'q') => break,
                    Ok(_) => {}
                    Err(e) => {
                        log::warn!("reading stdin failed: {}", e);
                        break;
                    }
                }
            }
            let _ = tx.try_send(());
        })
        .context("failed to spawn stdin reader")?;

    Ok(rx)
}
