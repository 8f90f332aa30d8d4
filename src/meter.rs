//! quantizing rates into sparkline cells, and drawing meters.

use {
    crossterm::{
        QueueableCommand,
        style::{Color, PrintStyledContent, Stylize},
    },
    std::{
        fmt::{self, Display},
        io::{self, Write},
        iter::{repeat, repeat_n},
    },
};

/// how sparklines are drawn.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum Style {
    /// fine-grained braille dots.
    #[default]
    Braille,
    /// coarse block elements.
    Blocks,
}

/// how hot a cell is, relative to its trend's scale.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd)]
pub enum Intensity {
    #[default]
    Calm,
    Low,
    Moderate,
    High,
    /// the value exceeded the scale it was drawn against.
    Hot,
}

/// a quantized point in a sparkline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cell {
    /// the level of this cell, in `0..levels`.
    level: usize,
    /// the number of levels this cell was quantized into.
    levels: usize,
    intensity: Intensity,
}

/// a horizontal gauge.
pub struct Meter {
    pub name: &'static str,
    pub value: f64,
    /// the value at which the meter is full.
    pub max: f64,
    pub width: usize,
}

/// maps `value` onto one of `levels` levels, relative to `max`.
///
/// values at or above `max` take the top level. a non-positive `max` yields level 0.
pub fn quantize(value: f64, max: f64, levels: usize) -> usize {
    if max.is_nan() || max <= 0.0 || levels == 0 {
        return 0;
    }

    let top = (levels - 1) as f64;
    let level = (value / max * top).round();
    // NB: a nan level saturates to zero.
    level.clamp(0.0, top) as usize
}

// === impl Style ===

impl Style {
    const BRAILLE: [char; 9] = [
        '\u{2800}', '\u{2801}', '\u{2803}', '\u{2807}', '\u{2817}', '\u{2837}', '\u{2877}',
        '\u{28F7}', '\u{28FF}',
    ];
    const BLOCKS: [char; 5] = [' ', '▂', '▄', '▆', '█'];

    /// the glyphs of this style, from lowest level to highest.
    pub fn glyphs(&self) -> &'static [char] {
        match self {
            Self::Braille => &Self::BRAILLE,
            Self::Blocks => &Self::BLOCKS,
        }
    }

    /// the number of levels this style can show.
    pub fn levels(&self) -> usize {
        self.glyphs().len()
    }

    /// returns the other style.
    pub fn toggle(self) -> Self {
        match self {
            Self::Braille => Self::Blocks,
            Self::Blocks => Self::Braille,
        }
    }

    /// returns the glyph used to draw `cell`.
    pub fn glyph(&self, cell: &Cell) -> char {
        self.glyphs()[cell.level_in(self.levels())]
    }
}

impl Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Braille => f.write_str("braille"),
            Self::Blocks => f.write_str("blocks"),
        }
    }
}

// === impl Intensity ===

impl Intensity {
    /// classifies the ratio of a value to its scale.
    pub fn of(ratio: f64) -> Self {
        match ratio {
            r if r > 1.0 => Self::Hot,
            r if r > 0.75 => Self::High,
            r if r > 0.5 => Self::Moderate,
            r if r > 0.25 => Self::Low,
            _ => Self::Calm,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Hot => Color::AnsiValue(160),
            Self::High => Color::AnsiValue(166),
            Self::Moderate => Color::AnsiValue(136),
            Self::Low => Color::AnsiValue(64),
            Self::Calm => Color::AnsiValue(250),
        }
    }
}

// === impl Cell ===

impl Default for Cell {
    /// an empty cell.
    fn default() -> Self {
        Self {
            level: 0,
            levels: 1,
            intensity: Intensity::Calm,
        }
    }
}

impl Cell {
    /// quantizes `value` against `max` into one of `levels` levels.
    pub fn new(value: f64, max: f64, levels: usize) -> Self {
        let ratio = if max > 0.0 { value / max } else { 0.0 };
        Self {
            level: quantize(value, max, levels),
            levels: levels.max(1),
            intensity: Intensity::of(ratio),
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn intensity(&self) -> Intensity {
        self.intensity
    }

    /// returns this cell's level, rescaled to `levels` levels.
    ///
    /// cells keep the granularity they were quantized with, so that a change of style does not
    /// index past the end of a shorter glyph table.
    pub fn level_in(&self, levels: usize) -> usize {
        let Self {
            level,
            levels: from,
            ..
        } = *self;

        if levels == from {
            return level;
        }

        quantize(level as f64, (from - 1) as f64, levels)
    }
}

// === impl Meter ===

impl Meter {
    /// the number of filled segments.
    pub fn filled(&self) -> usize {
        let Self {
            value, max, width, ..
        } = self;

        if max.is_nan() || *max <= 0.0 {
            return 0;
        }

        let ratio = (value / max).clamp(0.0, 1.0);
        ((ratio * *width as f64) as usize).min(*width)
    }

    pub fn draw(&self, writer: &mut impl Write) -> io::Result<()> {
        const SEGMENT: char = '█';
        const ACTIVE: Color = Color::AnsiValue(160);
        const IDLE: Color = Color::AnsiValue(234);
        const LABEL: Color = Color::AnsiValue(33);

        let Self {
            name,
            value,
            max,
            width,
        } = self;
        let filled = self.filled();

        // print the label.
        writer.queue(PrintStyledContent(format!("{name}:").with(LABEL)))?;
        writer.queue(PrintStyledContent(" ".reset()))?;

        // print the meter.
        let active = repeat_n(SEGMENT, filled).collect::<String>();
        let idle = repeat(SEGMENT).take(width - filled).collect::<String>();
        writer.queue(PrintStyledContent(active.with(ACTIVE)))?;
        writer.queue(PrintStyledContent(idle.with(IDLE)))?;

        // print the reading.
        writer.queue(PrintStyledContent(format!(" {value:.2}/{max:.1}").reset()))?;

        Ok(())
    }
}
