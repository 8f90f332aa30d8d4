//! a compact disk i/o monitor.

use {
    clap::Parser,
    iotach::{App, cli::Cli, window::Screen},
};

type Error = Box<dyn std::error::Error>;

fn main() -> Result<(), Error> {
    // NB: the dashboard owns the terminal, so logs are off unless asked for. redirect stderr to
    // keep them from drawing over the screen, e.g. `RUST_LOG=debug iotach 2>iotach.log`.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let cli = Cli::parse();
    if cli.info {
        println!("{}", Cli::info());
        return Ok(());
    }

    let app = App::new(cli.config());
    let mut screen = Screen::acquire()?;
    app.run(&mut screen)?;

    Ok(())
}
