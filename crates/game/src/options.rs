//! Command-line options, fixed for the duration of a run.

/// Run configuration. Parsed once at startup, immutable thereafter.
#[derive(Debug, Clone)]
pub struct GameOptions {
    /// Gate every audio call.
    pub enable_music: bool,
    /// Derive the pad from the ball instead of pointer input.
    pub enable_autoplay: bool,
    /// Where in the track (seconds) the game and music start.
    pub start_offset: f64,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            enable_music: true,
            enable_autoplay: false,
            start_offset: 0.0,
        }
    }
}

fn print_usage() {
    eprintln!("BeatBounce: keep the pad under the ball");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --no-music           Disable music playback");
    eprintln!("  --autoplay           Pad follows the ball automatically");
    eprintln!("  --start-offset <s>   Start this far into the track (seconds)");
    eprintln!("  --help               Show this help");
}

impl GameOptions {
    /// Parse process arguments; prints usage and exits on `--help` or error.
    pub fn parse() -> Self {
        match Self::from_args(std::env::args().skip(1)) {
            Ok(Some(options)) => options,
            Ok(None) => {
                print_usage();
                std::process::exit(0);
            }
            Err(msg) => {
                eprintln!("{msg}");
                print_usage();
                std::process::exit(1);
            }
        }
    }

    /// Returns `Ok(None)` when help was requested.
    fn from_args(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, String> {
        let mut options = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--no-music" => options.enable_music = false,
                "--autoplay" => options.enable_autoplay = true,
                "--start-offset" => {
                    let value = args
                        .next()
                        .ok_or("--start-offset requires a value".to_string())?;
                    options.start_offset = value
                        .parse::<f64>()
                        .map_err(|_| format!("Invalid start offset: {value}"))?;
                    if options.start_offset < 0.0 {
                        return Err("Start offset must be non-negative".to_string());
                    }
                }
                "--help" | "-h" => return Ok(None),
                other => return Err(format!("Unknown option: {other}")),
            }
        }
        Ok(Some(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<GameOptions>, String> {
        GameOptions::from_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_defaults() {
        let options = parse(&[]).unwrap().unwrap();
        assert!(options.enable_music);
        assert!(!options.enable_autoplay);
        assert_eq!(options.start_offset, 0.0);
    }

    #[test]
    fn test_flags() {
        let options = parse(&["--no-music", "--autoplay", "--start-offset", "12.5"])
            .unwrap()
            .unwrap();
        assert!(!options.enable_music);
        assert!(options.enable_autoplay);
        assert_eq!(options.start_offset, 12.5);
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(parse(&["--frobnicate"]).is_err());
    }

    #[test]
    fn test_negative_offset_rejected() {
        assert!(parse(&["--start-offset", "-3"]).is_err());
    }

    #[test]
    fn test_help_short_circuits() {
        assert!(parse(&["--help"]).unwrap().is_none());
    }
}
