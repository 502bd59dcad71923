//! Terminal display width helpers.
//!
//! Used when sizing a column to its content: cell text may carry ANSI styling
//! and wide glyphs, neither of which map one-to-one onto cells.

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Widest line across all `cells`, in display units.
pub fn widest<'a, I>(cells: I) -> usize
where
    I: IntoIterator<Item = &'a str>,
{
    cells
        .into_iter()
        .flat_map(|cell| cell.split('\n'))
        .map(display_width)
        .max()
        .unwrap_or(0)
}
