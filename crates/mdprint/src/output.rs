//! Status lines on stderr, styled with `console`.
//!
//! Lines read `   Converted docs/a.md -> docs/a.pdf`: a right-aligned,
//! colored verb followed by the details.

use console::{Style, Term};

/// Width the status verb is right-aligned to.
const VERB_WIDTH: usize = 12;

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    ok: Style,
    warn: Style,
    fail: Style,
    note: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            ok: Style::new().green().bold(),
            warn: Style::new().yellow().bold(),
            fail: Style::new().red().bold(),
            note: Style::new().cyan().bold(),
        }
    }

    fn status(&self, style: &Style, verb: &str, msg: &str) {
        let verb = format!("{verb:>VERB_WIDTH$}");
        let _ = self
            .term
            .write_line(&format!("{} {msg}", style.apply_to(verb)));
    }

    /// Plain line.
    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Green status, e.g. `Converted`.
    pub(crate) fn success(&self, verb: &str, msg: &str) {
        self.status(&self.ok, verb, msg);
    }

    /// Cyan status, e.g. `Watching`.
    pub(crate) fn highlight(&self, verb: &str, msg: &str) {
        self.status(&self.note, verb, msg);
    }

    /// Yellow `warning` status.
    pub(crate) fn warning(&self, msg: &str) {
        self.status(&self.warn, "warning", msg);
    }

    /// Red `error` status.
    pub(crate) fn error(&self, msg: &str) {
        self.status(&self.fail, "error", msg);
    }
}
