//! Terminal renderer using crossterm
//!
//! Draws effect frames to the console, one colored run per segment.

use std::io::{self, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::trace;
use unicode_width::UnicodeWidthChar;

use super::segments::{Frame, Segment};
use crate::core::color::Rgb;

/// Terminal renderer
pub struct Renderer {
    /// Whether the terminal has been initialized
    initialized: bool,
    /// Rows drawn by the previous frame, cleared when the frame shrinks
    last_rows: u16,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            initialized: false,
            last_rows: 0,
        }
    }

    /// Terminal size as (cols, rows)
    pub fn size() -> io::Result<(u16, u16)> {
        terminal::size()
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            DisableLineWrap,
            Hide,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;

        self.initialized = true;
        Ok(())
    }

    /// Cleanup the terminal
    pub fn cleanup(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        let mut stdout = io::stdout();

        // Reset all attributes first
        let _ = execute!(stdout, ResetColor, SetAttribute(Attribute::Reset));
        let _ = execute!(stdout, Show, EnableLineWrap, LeaveAlternateScreen);
        let _ = stdout.flush();

        // Disable raw mode - this is the most important part
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Draw a frame at the top-left corner, clipped to `cols` x `rows`.
    /// The last terminal row is reserved for `status`.
    pub fn render(&mut self, frame: &Frame, status: &str, cols: u16, rows: u16) -> io::Result<()> {
        let stdout = io::stdout();
        let mut stdout = io::BufWriter::with_capacity(65536, stdout.lock());

        // Begin synchronized update (reduces flicker)
        write!(stdout, "\x1b[?2026h")?;

        let body_rows = rows.saturating_sub(1);
        let mut drawn: u16 = 0;
        for (row_idx, row) in frame.iter().take(body_rows as usize).enumerate() {
            queue!(stdout, MoveTo(0, row_idx as u16), Clear(ClearType::CurrentLine))?;
            write_row(&mut stdout, row, cols as usize)?;
            drawn += 1;
        }
        for row_idx in drawn..self.last_rows.min(body_rows) {
            queue!(stdout, MoveTo(0, row_idx), Clear(ClearType::CurrentLine))?;
        }
        self.last_rows = drawn;

        if rows > 0 {
            queue!(
                stdout,
                MoveTo(0, rows - 1),
                Clear(ClearType::CurrentLine),
                SetAttribute(Attribute::Reverse),
                Print(clip(status, cols as usize).0),
                SetAttribute(Attribute::Reset)
            )?;
        }

        // End synchronized update
        write!(stdout, "\x1b[?2026l")?;
        stdout.flush()?;
        trace!("Rendered {} row(s)", drawn);
        Ok(())
    }

    /// Wipe the screen, e.g. before switching effects
    pub fn clear(&mut self) -> io::Result<()> {
        self.last_rows = 0;
        execute!(io::stdout(), Clear(ClearType::All))
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn write_row<W: Write>(out: &mut W, row: &[Segment], max_width: usize) -> io::Result<()> {
    let mut remaining = max_width;
    for segment in row {
        if remaining == 0 {
            break;
        }
        let (text, width) = clip(&segment.text, remaining);
        remaining -= width;

        // Malformed colors render with the default foreground
        match segment.color.as_deref().map(Rgb::parse_hex) {
            Some(Ok(rgb)) => queue!(out, SetForegroundColor(rgb.to_crossterm()), Print(text), ResetColor)?,
            _ => queue!(out, Print(text))?,
        }
    }
    Ok(())
}

/// Longest prefix of `text` fitting in `max_width` columns, and its width
fn clip(text: &str, max_width: usize) -> (&str, usize) {
    let mut width = 0;
    for (idx, ch) in text.char_indices() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width {
            return (&text[..idx], width);
        }
        width += w;
    }
    (text, width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_ascii() {
        assert_eq!(clip("HELLO", 3), ("HEL", 3));
        assert_eq!(clip("HI", 10), ("HI", 2));
        assert_eq!(clip("", 4), ("", 0));
    }

    #[test]
    fn test_clip_wide_chars() {
        // Each CJK glyph takes two columns
        assert_eq!(clip("日本語", 5), ("日本", 4));
    }

    #[test]
    fn test_write_row_skips_bad_colors() {
        let row = vec![
            Segment::new("AB", Some("#ff0000".to_string())),
            Segment::new("CD", Some("broken".to_string())),
            Segment::new("EF", None),
        ];
        let mut out = Vec::new();
        write_row(&mut out, &row, 5).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("AB"));
        assert!(text.contains("CD"));
        assert!(text.contains('E'));
        assert!(!text.contains("EF"));
    }
}
