//! Transfer progress rendering on stderr.

use std::io::{self, Write};

const BAR_WIDTH: usize = 30;

/// A redrawing single-line progress bar.
///
/// With a known total: `Uploading: [=====     ] 50.0% 5.0 MiB/10.0 MiB`.
/// Without one, only the running byte count is shown. Call [`finish`]
/// (or drop the carriage return yourself) before printing anything else.
///
/// [`finish`]: ProgressBar::finish
pub struct ProgressBar {
    label: &'static str,
    total: Option<u64>,
    current: u64,
}

impl ProgressBar {
    pub fn new(label: &'static str, total: Option<u64>) -> Self {
        Self {
            label,
            total: total.filter(|&t| t > 0),
            current: 0,
        }
    }

    /// Account `n` more transferred bytes and redraw.
    pub fn advance(&mut self, n: u64) {
        self.current += n;
        self.draw();
    }

    fn draw(&self) {
        let mut stderr = io::stderr();
        match self.total {
            Some(total) => {
                let pct = self.current as f64 / total as f64 * 100.0;
                let filled = ((pct / 100.0) * BAR_WIDTH as f64) as usize;
                let filled = filled.min(BAR_WIDTH);
                let _ = write!(
                    stderr,
                    "\r{}: [{}{}] {:.1}% {}/{}",
                    self.label,
                    "=".repeat(filled),
                    " ".repeat(BAR_WIDTH - filled),
                    pct,
                    format_bytes(self.current),
                    format_bytes(total),
                );
            }
            None => {
                let _ = write!(stderr, "\r{}: {}", self.label, format_bytes(self.current));
            }
        }
        let _ = stderr.flush();
    }

    /// Terminate the progress line.
    pub fn finish(&self) {
        eprintln!();
    }
}

/// Human-readable byte count in binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let units = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    format!("{:.1} {}", bytes as f64 / div as f64, units[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_counts_are_plain_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1023), "1023 B");
    }

    #[test]
    fn binary_units_scale() {
        assert_eq!(format_bytes(1024), "1.0 KiB");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }

    #[test]
    fn progress_accumulates() {
        let mut bar = ProgressBar::new("Testing", Some(100));
        bar.advance(40);
        bar.advance(25);
        assert_eq!(bar.current, 65);
    }

    #[test]
    fn zero_total_is_treated_as_unknown() {
        let bar = ProgressBar::new("Testing", Some(0));
        assert!(bar.total.is_none());
    }
}
