use {
    crate::{
        Error, Session,
        config::{METER_WIDTH, NAME_WIDTH},
        history::Ring,
        meter::{Meter, Style},
    },
    crossterm::{
        ExecutableCommand, QueueableCommand, cursor,
        event::{
            KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
        },
        style::{Color, Print, PrintStyledContent, Stylize},
        terminal,
    },
    std::io::{self, Stdout, Write},
};

/// exclusive control of the terminal.
///
/// the terminal is put back the way it was found when this is dropped, whether the session
/// ended normally, returned an error, or panicked.
pub struct Screen {
    out: Stdout,
    /// whether key event kinds were requested from the terminal.
    enhanced: bool,
}

const TITLE: Color = Color::AnsiValue(33);
const SEPARATOR: &str = " │ ";

// === impl Screen ===

impl Screen {
    /// takes control of the terminal.
    pub fn acquire() -> Result<Self, Error> {
        terminal::enable_raw_mode().map_err(Error::Terminal)?;

        // from here on, an early return restores the terminal.
        let mut screen = Self {
            out: io::stdout(),
            enhanced: false,
        };
        screen.setup().map_err(Error::Terminal)?;

        Ok(screen)
    }

    fn setup(&mut self) -> io::Result<()> {
        let Self { out, enhanced } = self;

        out.execute(terminal::EnterAlternateScreen)?
            .execute(cursor::Hide)?;

        // ask for press, repeat, and release events, so a held key can be told apart.
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            out.execute(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
            ))?;
            *enhanced = true;
        } else {
            log::debug!("terminal does not report key releases; held keys may repeat");
        }

        Ok(())
    }
}

impl Write for Screen {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let Self { out, enhanced } = self;

        if *enhanced {
            let _ = out.execute(PopKeyboardEnhancementFlags);
        }
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = out.flush();
    }
}

// === impl Session ===

impl Session {
    /// draws the latest cycle.
    pub fn draw(&self, out: &mut impl Write) -> io::Result<()> {
        let Self {
            config, history, ranked, depth, ..
        } = self;
        let style = config.style;

        out.queue(terminal::Clear(terminal::ClearType::All))?
            .queue(cursor::MoveTo(0, 0))?;

        // print the title.
        let title = format!("〘{}〙 {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        out.queue(PrintStyledContent(title.with(TITLE)))?;
        Self::newline(out, 2)?;

        // print the disk pressure meter.
        Meter {
            name: "disk pressure",
            value: *depth,
            max: config.queue_saturation,
            width: METER_WIDTH,
        }
        .draw(out)?;
        Self::newline(out, 2)?;

        // print the table.
        let width = config.history_width;
        let header = [
            format!("{:<5}", "PID"),
            format!("{:<NAME_WIDTH$}", "Name"),
            format!("{:<width$}", "Read"),
            format!("{:<width$}", "Write"),
        ]
        .join(SEPARATOR);
        out.queue(PrintStyledContent(header.with(TITLE)))?;
        Self::newline(out, 1)?;

        for rate in ranked {
            let Some(trend) = history.get(&rate.pid) else {
                continue;
            };
            let name = truncate(&rate.name, NAME_WIDTH);
            out.queue(Print(format!(
                "{:<5}{SEPARATOR}{name:<NAME_WIDTH$}{SEPARATOR}",
                rate.pid
            )))?;
            Self::sparkline(out, &trend.read, style)?;
            out.queue(Print(SEPARATOR))?;
            Self::sparkline(out, &trend.write, style)?;
            Self::newline(out, 1)?;
        }

        // print the footer.
        Self::newline(out, 1)?;
        let footer = format!(
            "Interval: {}  |  Style: {style}  |  +/- to adjust, s to restyle, q to quit",
            config.interval
        );
        out.queue(PrintStyledContent(footer.with(TITLE)))?;

        out.flush()
    }

    fn sparkline(out: &mut impl Write, ring: &Ring, style: Style) -> io::Result<()> {
        for cell in ring.iter() {
            let glyph = style.glyph(cell).with(cell.intensity().color());
            out.queue(PrintStyledContent(glyph))?;
        }

        Ok(())
    }

    // NB: raw mode does not return the carriage on a line feed.
    fn newline(out: &mut impl Write, lines: u16) -> io::Result<()> {
        out.queue(cursor::MoveToNextLine(lines)).map(drop)
    }
}

/// shortens `name` to at most `width` characters, marking any cut with an ellipsis.
pub fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_owned();
    }

    name.chars()
        .take(width.saturating_sub(1))
        .chain(Some('…'))
        .collect()
}
