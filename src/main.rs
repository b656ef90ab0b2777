use attitude_indicator::{AttitudeIndicator, IndicatorCommand, IndicatorConfig};
use log::{info, warn};
use rand::Rng;
use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

const FONT_ENV: &str = "ATTITUDE_FONT";

const SYSTEM_FONTS: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Default)]
struct Options {
    title: Option<String>,
    font: Option<PathBuf>,
    no_supersample: bool,
    wander: bool,
    stdin: bool,
}

fn parse_args() -> Options {
    let mut options = Options::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--title" => options.title = args.next(),
            "--font" => options.font = args.next().map(PathBuf::from),
            "--no-supersample" => options.no_supersample = true,
            "--wander" => options.wander = true,
            "--stdin" => options.stdin = true,
            other => warn!("ignoring unknown argument {other}"),
        }
    }
    options
}

/// Explicit flag first, then the environment, then well-known system fonts.
fn resolve_font(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit
        .or_else(|| env::var_os(FONT_ENV).map(PathBuf::from))
        .or_else(|| {
            SYSTEM_FONTS
                .iter()
                .map(PathBuf::from)
                .find(|path| path.is_file())
        })
}

/// Parses `roll pitch yaw`, separated by whitespace or commas.
fn parse_attitude(line: &str) -> Option<IndicatorCommand> {
    let mut values = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(str::parse::<f64>);
    match (values.next(), values.next(), values.next(), values.next()) {
        (Some(Ok(roll)), Some(Ok(pitch)), Some(Ok(yaw)), None) => {
            Some(IndicatorCommand::SetAttitude(roll, pitch, yaw))
        }
        _ => None,
    }
}

fn spawn_stdin_reader(sender: Sender<IndicatorCommand>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines().map_while(Result::ok) {
            match parse_attitude(&line) {
                Some(command) => {
                    if sender.send(command).is_err() {
                        break;
                    }
                }
                None => warn!("expected `roll pitch yaw`, got {line:?}"),
            }
        }
    });
}

fn spawn_wanderer(sender: Sender<IndicatorCommand>) {
    thread::spawn(move || {
        let mut rng = rand::rng();
        loop {
            let commands = [
                IndicatorCommand::RollBy(rng.random_range(-1.5..1.5)),
                IndicatorCommand::PitchBy(rng.random_range(-0.5..0.5)),
                IndicatorCommand::YawBy(rng.random_range(-1.0..1.0)),
            ];
            if commands.into_iter().any(|cmd| sender.send(cmd).is_err()) {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
    });
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let options = parse_args();

    let font_path = resolve_font(options.font);
    match &font_path {
        Some(path) => info!("labels use {}", path.display()),
        None => warn!("no font found, set {FONT_ENV} or pass --font"),
    }

    let config = IndicatorConfig::builder()
        .title(options.title.unwrap_or_else(|| "Attitude Indicator".to_string()))
        .supersample(!options.no_supersample)
        .maybe_font_path(font_path)
        .build();
    let mut indicator = AttitudeIndicator::new(config)?;

    if !options.wander && !options.stdin {
        println!("Arrows: roll and pitch, Shift+Left/Right: heading, S: supersampling, Esc: quit");
        indicator.show()?;
        return Ok(());
    }

    let (sender, receiver) = mpsc::channel();
    if options.stdin {
        spawn_stdin_reader(sender.clone());
    }
    if options.wander {
        spawn_wanderer(sender);
    }
    indicator.show_with_commands(receiver)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attitude_lines_accept_spaces_and_commas() {
        assert_eq!(
            parse_attitude("10 -5.5 270"),
            Some(IndicatorCommand::SetAttitude(10.0, -5.5, 270.0))
        );
        assert_eq!(
            parse_attitude(" 1,2, 3 "),
            Some(IndicatorCommand::SetAttitude(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn malformed_attitude_lines_are_rejected() {
        assert_eq!(parse_attitude(""), None);
        assert_eq!(parse_attitude("1 2"), None);
        assert_eq!(parse_attitude("1 2 3 4"), None);
        assert_eq!(parse_attitude("roll 2 3"), None);
    }

    #[test]
    fn explicit_font_wins() {
        let path = PathBuf::from("/nonexistent/label.ttf");
        assert_eq!(resolve_font(Some(path.clone())), Some(path));
    }
}
