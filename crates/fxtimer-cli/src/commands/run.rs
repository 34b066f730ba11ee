use std::io::IsTerminal;
use std::time::Duration;

use fxtimer_core::audio::SilentCuePlayer;
use fxtimer_core::{Command, Config, CuePlayer, RunnerHandle, RunnerOptions, Session};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::args::WorkoutArgs;
use crate::terminal::{TerminalBell, TerminalRenderer};

const KEYS: &str = "keys: s start/resume, p pause, n next, b back, r restart, q quit (then Enter)";

/// Map one line of input to a runner command.
pub fn parse_key(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "s" | "start" | "resume" => Some(Command::Start),
        "p" | "pause" => Some(Command::Pause),
        "n" | "next" | "skip" => Some(Command::Skip),
        "b" | "back" | "prev" => Some(Command::Prev),
        "r" | "restart" => Some(Command::Restart),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

async fn read_commands(commands: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Some(command) = parse_key(&line) else {
            eprintln!("{KEYS}");
            continue;
        };
        let quit = matches!(command, Command::Quit);
        if commands.send(command).await.is_err() || quit {
            break;
        }
    }
    debug!("stdin closed");
}

pub fn run(args: &WorkoutArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let source = args.data.load(&config)?;
    let request = args.request(&config);

    let mut sound = config.sound;
    if args.no_sound {
        sound.enabled = false;
    }
    let player: Box<dyn CuePlayer> = if sound.enabled && std::io::stderr().is_terminal() {
        Box::new(TerminalBell)
    } else {
        Box::new(SilentCuePlayer)
    };

    let mut session = Session::new(player, Box::new(TerminalRenderer::new())).with_sound(sound);
    if let Some(seed) = args.seed(&config) {
        session = session.with_seed(seed);
    }
    session.load(&source)?;
    session.build(&request)?;

    let options = RunnerOptions {
        tick_interval: Duration::from_millis(config.tick_interval_ms),
        exit_when_done: true,
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(async {
        let handle = RunnerHandle::spawn(session, options);
        eprintln!("{KEYS}");
        handle.send(Command::Start).await;
        tokio::spawn(read_commands(handle.sender()));
        handle.join().await
    });
    rt.shutdown_background();

    let session = result?;
    println!();
    println!("{}", session.view().remaining_label());
    Ok(())
}
