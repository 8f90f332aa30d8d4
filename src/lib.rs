//! a compact disk i/o monitor.

use {
    self::{
        config::{Config, Interval, POLL_GRANULARITY},
        history::History,
        meter::Style,
        rate::{Rate, rank},
        sentinel::Sentinel,
        source::{Clock, Keys, Probe, ProcFs, SystemClock, TerminalKeys},
    },
    crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    std::{
        io::{self, Write},
        time::Instant,
    },
};

pub mod cli;
pub mod config;
pub mod history;
pub mod meter;
/// process and block device statistics.
///
/// this module provides tools to interact with `/proc/<pid>/io` and `/proc/diskstats`.
pub mod proc;
pub mod rate;
pub mod sentinel;
pub mod source;
pub mod window;

/// a monitoring session, wired to its sources of input.
pub struct App<P = ProcFs, C = SystemClock, K = TerminalKeys> {
    sentinel: Sentinel<P>,
    clock: C,
    keys: K,
    session: Session,
}

/// the mutable state of a monitoring session.
///
/// this is only touched from the control loop.
pub struct Session {
    config: Config,
    history: History,
    state: State,
    /// the busiest processes of the latest cycle.
    ranked: Vec<Rate>,
    /// the queue depth of the latest cycle.
    depth: f64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    Running,
    Terminated,
}

/// an action requested from the keyboard.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    /// sample less often.
    Slower,
    /// sample more often.
    Faster,
    /// switch sparkline styles.
    Restyle,
    Quit,
}

/// what the control loop must do after a command is applied.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Effect {
    Nothing,
    /// the interval changed; the next tick must be rescheduled.
    Reschedule,
    /// the screen must be redrawn.
    Redraw,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not take control of the terminal")]
    Terminal(#[source] io::Error),
    #[error("could not draw to the terminal")]
    Draw(#[from] io::Error),
}

// === impl App ===

impl App {
    /// initializes a new application, observing this machine.
    pub fn new(config: Config) -> Self {
        Self::with(ProcFs::default(), SystemClock, TerminalKeys, config)
    }
}

impl<P, C, K> App<P, C, K>
where
    P: Probe,
    C: Clock,
    K: Keys,
{
    /// initializes a new application with the given sources.
    pub fn with(probe: P, clock: C, keys: K, config: Config) -> Self {
        Self {
            sentinel: Sentinel::new(probe),
            clock,
            keys,
            session: Session::new(config),
        }
    }

    /// runs the application until it is asked to quit.
    ///
    /// sampling happens once per interval. in between, the keyboard is polled, never waiting
    /// past the next scheduled sample.
    pub fn run(self, out: &mut impl Write) -> Result<Session, Error> {
        let Self {
            mut sentinel,
            clock,
            mut keys,
            mut session,
        } = self;

        log::info!("starting; sampling every {}", session.interval());
        let mut next = clock.now();

        while session.is_running() {
            let now = clock.now();
            if now >= next {
                session.cycle(&mut sentinel, now);
                session.draw(out)?;
                next = Self::reschedule(next, now, session.interval());
            }

            let wait = next
                .saturating_duration_since(clock.now())
                .min(POLL_GRANULARITY);
            let key = match keys.poll(wait) {
                Ok(key) => key,
                Err(error) => {
                    log::warn!("could not poll the keyboard: {error}");
                    std::thread::sleep(wait);
                    None
                }
            };

            let Some(command) = key.as_ref().and_then(Command::from_key) else {
                continue;
            };
            match session.apply(command) {
                Effect::Reschedule => next = clock.now() + session.interval().duration(),
                Effect::Redraw => session.draw(out)?,
                Effect::Nothing => {}
            }
        }

        log::info!("stopping");
        Ok(session)
    }

    /// returns when the tick after the one scheduled at `scheduled` is due.
    ///
    /// ticks missed because a cycle ran long are skipped rather than run back to back.
    fn reschedule(scheduled: Instant, now: Instant, interval: Interval) -> Instant {
        let next = scheduled + interval.duration();
        if next > now {
            next
        } else {
            now + interval.duration()
        }
    }
}

// === impl Session ===

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            history: History::new(&config),
            config,
            state: State::Running,
            ranked: Vec::new(),
            depth: 0.0,
        }
    }

    /// samples, ranks, and records one cycle.
    pub fn cycle<P: Probe>(&mut self, sentinel: &mut Sentinel<P>, now: Instant) {
        let Self {
            config,
            history,
            ranked,
            depth,
            ..
        } = self;

        *depth = sentinel.queue_depth();
        let rates = sentinel.observe(now).unwrap_or_else(|error| {
            log::warn!("skipping a cycle: {error}");
            Vec::new()
        });
        let active = rates.len();

        *ranked = rank(rates, config.top);
        history.update(ranked, config.style.levels(), now);
        let evicted = history.evict(now);

        log::debug!(
            "cycle: {active} active, {} ranked, {} tracked, {evicted} evicted, depth {depth:.2}",
            ranked.len(),
            history.len(),
        );
    }

    /// applies a command.
    pub fn apply(&mut self, command: Command) -> Effect {
        let Self { config, state, .. } = self;

        match command {
            Command::Slower | Command::Faster => {
                let interval = match command {
                    Command::Slower => config.interval.slower(),
                    _ => config.interval.faster(),
                };
                if interval == config.interval {
                    return Effect::Nothing;
                }
                log::info!("sampling every {interval}");
                config.interval = interval;
                Effect::Reschedule
            }
            Command::Restyle => {
                config.style = config.style.toggle();
                log::info!("drawing with {}", config.style);
                Effect::Redraw
            }
            Command::Quit => {
                *state = State::Terminated;
                Effect::Nothing
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn interval(&self) -> Interval {
        self.config.interval
    }

    pub fn style(&self) -> Style {
        self.config.style
    }

    pub fn ranked(&self) -> &[Rate] {
        &self.ranked
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}

// === impl Command ===

impl Command {
    /// maps a key press to a command.
    ///
    /// only presses are recognized. where the terminal reports them, repeats from a held key and
    /// releases are ignored, so each physical press acts once.
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        let KeyEvent {
            code,
            modifiers,
            kind,
            ..
        } = key;

        if *kind != KeyEventKind::Press {
            return None;
        }

        match code {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Self::Quit),
            KeyCode::Char('+' | '=') => Some(Self::Slower),
            KeyCode::Char('-' | '_') => Some(Self::Faster),
            KeyCode::Char('s' | 'S') => Some(Self::Restyle),
            KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(Self::Quit),
            _ => None,
        }
    }
}
