//! Prefixed, colored lines for the `relocator` binary.
//! Info/ok lines go to stdout, warnings and failures to stderr; each stream is
//! colored only when it is a terminal.

use atty::Stream;
use owo_colors::OwoColorize;

#[derive(Clone, Copy)]
enum Tone {
    Info,
    Warn,
    Error,
    Ok,
}

impl Tone {
    fn label(self) -> &'static str {
        match self {
            Tone::Info => "info:",
            Tone::Warn => "warn:",
            Tone::Error => "error:",
            Tone::Ok => "ok:",
        }
    }

    fn stream(self) -> Stream {
        match self {
            Tone::Warn | Tone::Error => Stream::Stderr,
            Tone::Info | Tone::Ok => Stream::Stdout,
        }
    }
}

fn render(tone: Tone, msg: &str) -> String {
    let label = tone.label();
    if !atty::is(tone.stream()) {
        return format!("{label} {msg}");
    }
    match tone {
        Tone::Info => format!("{} {msg}", label.cyan().bold()),
        Tone::Warn => format!("{} {msg}", label.yellow().bold()),
        Tone::Error => format!("{} {msg}", label.red().bold()),
        Tone::Ok => format!("{} {msg}", label.green().bold()),
    }
}

fn emit(tone: Tone, msg: &str) {
    let line = render(tone, msg);
    match tone.stream() {
        Stream::Stderr => eprintln!("{line}"),
        _ => println!("{line}"),
    }
}

pub fn print_info(msg: &str) {
    emit(Tone::Info, msg);
}

pub fn print_warn(msg: &str) {
    emit(Tone::Warn, msg);
}

/// Used for recorded failures as well as fatal errors.
pub fn print_error(msg: &str) {
    emit(Tone::Error, msg);
}

pub fn print_success(msg: &str) {
    emit(Tone::Ok, msg);
}

/// Unprefixed line on stdout, for results scripts may read (e.g. rendered config XML).
pub fn print_user(msg: &str) {
    println!("{msg}");
}
