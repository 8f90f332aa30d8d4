//! the command-line interface.

use {
    crate::{
        config::{Config, DEFAULT_TOP, MAX_TOP},
        meter::Style,
    },
    clap::Parser,
};

#[derive(Parser, Debug)]
#[command(
    name = "iotach",
    version,
    about = "a compact disk i/o monitor",
    long_about = "shows the processes doing the most disk i/o, with a short history of each.\n\n\
                  while running: +/- lengthens or shortens the sampling interval, s switches \
                  sparkline styles, and q quits."
)]
pub struct Cli {
    /// show the <TOP> busiest processes (values above 20 are treated as 20)
    #[arg(
        long,
        short = 'n',
        value_name = "TOP",
        default_value_t = DEFAULT_TOP as u64,
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    pub top: u64,

    /// how sparklines are drawn
    #[arg(long, value_enum, default_value_t = Style::Braille)]
    pub style: Style,

    /// show the repository and license, then exit
    #[arg(long, short = 'i')]
    pub info: bool,
}

// === impl Cli ===

impl Cli {
    /// the text printed by `--info`.
    pub fn info() -> String {
        format!(
            "{} repo: {}\nlicense: {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_REPOSITORY"),
            env!("CARGO_PKG_LICENSE"),
        )
    }

    /// returns the session configuration these arguments describe.
    pub fn config(&self) -> Config {
        let Self { top, style, .. } = self;
        let top = usize::try_from(*top).unwrap_or(MAX_TOP);

        Config::default().with_top(top).with_style(*style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("iotach").chain(args.iter().copied()))
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap().config();
        assert_eq!(config, Config::default());
        assert_eq!(config.top, DEFAULT_TOP);
    }

    #[test]
    fn top() {
        assert_eq!(parse(&["--top", "12"]).unwrap().config().top, 12);
        assert_eq!(parse(&["--top=3"]).unwrap().config().top, 3);
        assert_eq!(parse(&["-n", "1"]).unwrap().config().top, 1);
    }

    #[test]
    fn top_is_capped() {
        assert_eq!(parse(&["--top", "500"]).unwrap().config().top, MAX_TOP);
    }

    #[test]
    fn top_must_be_positive() {
        assert!(parse(&["--top", "0"]).is_err());
        assert!(parse(&["--top", "-4"]).is_err());
        assert!(parse(&["--top", "many"]).is_err());
    }

    #[test]
    fn style() {
        let config = parse(&["--style", "blocks"]).unwrap().config();
        assert_eq!(config.style, Style::Blocks);
        assert!(parse(&["--style", "dots"]).is_err());
    }

    #[test]
    fn info() {
        assert!(parse(&["--info"]).unwrap().info);
        assert!(Cli::info().contains("MIT"));
    }

    #[test]
    fn help_and_version_exit_cleanly() {
        use clap::error::ErrorKind;

        let help = parse(&["--help"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);
        assert_eq!(help.exit_code(), 0);

        let version = parse(&["--version"]).unwrap_err();
        assert_eq!(version.kind(), ErrorKind::DisplayVersion);
        assert_eq!(version.exit_code(), 0);
    }

    #[test]
    fn verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
