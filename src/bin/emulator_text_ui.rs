use clap::Parser;
use crossbeam_channel::{bounded, Receiver, Sender};
use cursive::{event::Key, view::Nameable, views::Dialog, CbSink, Cursive};
use log::LevelFilter;
use std::fs::File;
use std::time::{Duration, Instant};

use chip_8_vm::chip::{
    chip8::{
        constants::CHIP8_DEFAULT_CYCLES_PER_SECOND,
        cursive_display::{Display, DISPLAY_NAME},
        Chip8,
    },
    clock::{Clock, ClockConfig, Pace, MAX_FREQUENCY},
    Chip, ChipWithCursiveDisplay, CycleOutcome, LoadProgramError,
};

/// How much the cycle rate changes per speed up or slow down.
const PACE_STEP: u32 = 100;

/// Name of the dialog layer shown while the chip is halted.
const HALT_DIALOG_NAME: &str = "halt-dialog";

/// Runs a CHIP-8 program in the terminal.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Path to the program to load.
    rom: String,

    /// Instruction cycles per second; 0 runs as fast as possible.
    #[arg(
        long,
        default_value_t = CHIP8_DEFAULT_CYCLES_PER_SECOND,
        value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_FREQUENCY))
    )]
    cycles_per_second: u32,

    /// Write log output to this file. Without it logging is disabled,
    /// since it would scramble the terminal UI.
    #[arg(long)]
    log_file: Option<String>,
}

/// Error type for errors that occur before the UI is up.
#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("could not open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    InvalidProgram(#[from] LoadProgramError),
}

/// Represents an event to be processed by the event loop. It is generic
/// over the type representing the pressed key.
enum Event<T> {
    /// Occurs when the key passed in the enum value was pressed.
    Key(T),

    /// Indicates that all keys are released. Note that this is a
    /// hack because terminals only report key presses, not releases.
    /// To get around this we assign one key to trigger releasing all keys.
    KeyRelease,

    /// Raises the cycle rate.
    SpeedUp,

    /// Lowers the cycle rate.
    SlowDown,

    /// Power cycles the chip and loads the program again.
    Reset,

    /// Shut down.
    Quit,
}

/// Represents the channels available to the event loop. It is generic
/// over the type representing the pressed keys.
struct EventLoopChannels<T> {
    /// The channel to send the UI refresh messages to.
    gfx_sender: CbSink,

    /// The channel on which the Events are received.
    key_receiver: Receiver<Event<T>>,

    /// A channel to report that the thread has completed
    /// shutdown.
    shutdown_sender: Sender<()>,
}

fn faster(pace: Pace) -> Pace {
    match pace {
        Pace::Capped(hz) => Pace::Capped(hz.saturating_add(PACE_STEP).min(MAX_FREQUENCY)),
        Pace::Unlimited => Pace::Unlimited,
    }
}

fn slower(pace: Pace) -> Pace {
    match pace {
        Pace::Capped(hz) => Pace::Capped(hz.saturating_sub(PACE_STEP).max(PACE_STEP)),
        Pace::Unlimited => Pace::Unlimited,
    }
}

/// Registers a global callback sending the event built by `event` to the event loop.
fn send_on<E: Into<cursive::event::Event>>(
    siv: &mut Cursive,
    sender: &Sender<Event<u8>>,
    trigger: E,
    event: fn() -> Event<u8>,
) {
    let sender = sender.clone();
    siv.add_global_callback(trigger, move |_s| {
        if sender.send(event()).is_err() {
            log::debug!("event loop is gone, dropping input");
        }
    });
}

fn show_halt(s: &mut Cursive, message: String) {
    s.add_layer(
        Dialog::info(message)
            .title("Halted")
            .with_name(HALT_DIALOG_NAME),
    );
}

/// Removes every halt dialog that is still open.
fn dismiss_halt(s: &mut Cursive) {
    let screen = s.screen_mut();
    while let Some(position) = screen.find_layer_from_name(HALT_DIALOG_NAME) {
        screen.remove_layer(position);
    }
}

fn send_to_ui(gfx_sender: &CbSink, f: impl FnOnce(&mut Cursive) + Send + 'static) {
    if gfx_sender.send(Box::new(f)).is_err() {
        log::debug!("UI update dropped, the UI is gone");
    }
}

/// Shows the fault that halted the chip on top of the display.
fn report_halt(gfx_sender: &CbSink, message: String) {
    send_to_ui(gfx_sender, move |s| show_halt(s, message));
}

/// Power cycles `chip` and loads `rom` again. On error the chip is left
/// with blank memory and must not run.
fn restart<T: Chip>(chip: &mut T, rom: &str) -> Result<(), LoadProgramError> {
    chip.reset();
    let size = chip.load_program(rom)?;
    log::info!("reloaded {} ({} bytes)", rom, size);
    Ok(())
}

/// The event loop. Constantly loops over (1) process pending events.
/// (2) Let the clock tell how many cycles, timer ticks and refreshes are due
/// and run them. (3) Sleep for a millisecond. (4) Start over.
fn event_loop<T, P>(
    mut chip: T,
    rom: String,
    mut config: ClockConfig,
    io_channels: EventLoopChannels<P>,
) where
    T: Chip<PinAddress = P> + ChipWithCursiveDisplay,
{
    let mut clock = Clock::new(config);
    let mut last_advance = Instant::now();
    let mut halted = false;
    let mut tone = false;

    loop {
        while let Ok(event) = io_channels.key_receiver.try_recv() {
            match event {
                Event::Key(key) => chip.set_input_pin(key, true),
                Event::KeyRelease => chip.reset_input_pins(),
                Event::SpeedUp => {
                    config.pace = faster(config.pace);
                    log::info!("pace is now {:?}", config.pace);
                    clock = Clock::new(config);
                }
                Event::SlowDown => {
                    config.pace = slower(config.pace);
                    log::info!("pace is now {:?}", config.pace);
                    clock = Clock::new(config);
                }
                Event::Reset => {
                    send_to_ui(&io_channels.gfx_sender, dismiss_halt);
                    match restart(&mut chip, &rom) {
                        Ok(()) => halted = false,
                        Err(e) => {
                            // memory is blank now, so running it makes no sense
                            log::error!("could not reload program: {}", e);
                            report_halt(&io_channels.gfx_sender, e.to_string());
                            halted = true;
                        }
                    }
                    clock = Clock::new(config);
                }
                Event::Quit => {
                    if io_channels.shutdown_sender.send(()).is_err() {
                        log::debug!("nobody is waiting for the shutdown");
                    }
                    return;
                }
            }
        }

        let now = Instant::now();
        let ticks = clock.advance(now - last_advance);
        last_advance = now;

        if !halted {
            for _ in 0..ticks.cycles {
                match chip.cycle() {
                    Ok(CycleOutcome::Executed) | Ok(CycleOutcome::SkippedUnknown(_)) => {}
                    // the same instruction would only run again until a key changes
                    Ok(CycleOutcome::AwaitingInput) => break,
                    Err(fault) => {
                        log::error!("halted: {}", fault);
                        report_halt(&io_channels.gfx_sender, fault.to_string());
                        halted = true;
                        break;
                    }
                }
            }
        }

        for _ in 0..ticks.timer_ticks {
            chip.tick_timers();
        }
        if chip.tone_active() != tone {
            tone = chip.tone_active();
            log::debug!("tone {}", if tone { "on" } else { "off" });
        }

        if ticks.refresh {
            chip.update_ui(&io_channels.gfx_sender);
        }

        std::thread::sleep(Duration::from_millis(1));
    }
}

fn init_logging(log_file: Option<&str>) -> Result<(), Error> {
    let mut builder = env_logger::Builder::new();
    match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| Error::LogFile {
                path: path.to_string(),
                source,
            })?;
            builder
                .filter_level(LevelFilter::Info)
                .parse_default_env()
                .target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(LevelFilter::Off);
        }
    }
    builder.init();
    Ok(())
}

/// Constructs the UI and spawns the event loop and the UI thread.
fn run(args: Args) -> Result<(), Error> {
    init_logging(args.log_file.as_deref())?;

    let mut chip8 = Chip8::new();
    let size = chip8.load_program(&args.rom)?;
    log::info!("loaded {} ({} bytes)", args.rom, size);

    let config = ClockConfig {
        pace: match args.cycles_per_second {
            0 => Pace::Unlimited,
            hz => Pace::Capped(hz),
        },
        ..ClockConfig::default()
    };

    let mut siv = cursive::default();
    siv.add_layer(Display::new(chip8.read_output_pins()).with_name(DISPLAY_NAME));

    let cb_sink = siv.cb_sink().clone();
    let (key_sender, key_receiver) = bounded::<Event<u8>>(10);
    let (shutdown_sender, shutdown_receiver) = bounded::<()>(1);

    let rom = args.rom;
    std::thread::spawn(move || {
        event_loop(
            chip8,
            rom,
            config,
            EventLoopChannels {
                gfx_sender: cb_sink,
                key_receiver,
                shutdown_sender,
            },
        );
    });

    let sender = key_sender.clone();
    siv.add_global_callback(Key::Esc, move |s| {
        if sender.send(Event::Quit).is_ok() && shutdown_receiver.recv().is_err() {
            log::warn!("event loop went away before confirming shutdown");
        }
        s.quit();
    });

    for (i, j) in [
        ('1', 0x1),
        ('2', 0x2),
        ('3', 0x3),
        ('4', 0xC),
        ('q', 0x4),
        ('w', 0x5),
        ('e', 0x6),
        ('r', 0xD),
        ('a', 0x7),
        ('s', 0x8),
        ('d', 0x9),
        ('f', 0xE),
        ('z', 0xA),
        ('x', 0x0),
        ('c', 0xB),
        ('v', 0xF),
    ] {
        let sender = key_sender.clone();
        siv.add_global_callback(i, move |_s| {
            if sender.send(Event::Key(j)).is_err() {
                log::debug!("event loop is gone, dropping key {:X}", j);
            }
        });
    }

    send_on(&mut siv, &key_sender, ' ', || Event::KeyRelease);
    send_on(&mut siv, &key_sender, Key::Up, || Event::SpeedUp);
    send_on(&mut siv, &key_sender, Key::Down, || Event::SlowDown);
    send_on(&mut siv, &key_sender, Key::F5, || Event::Reset);

    siv.run();
    Ok(())
}

fn main() {
    if let Err(e) = run(Args::parse()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
