use inner_search_core::{
    format_keyword_hits, history_text, ChatView, Document, Mode, RenderError, Turn,
};
use std::io::{self, Write};

/// Plain-text chat rendering for a terminal.
pub struct TerminalView<W: Write> {
    out: W,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn print_banner(&mut self, mode: Mode) -> io::Result<()> {
        writeln!(self.out, "Internal document search")?;
        writeln!(
            self.out,
            "Ask about company documents. mode: {mode} (/mode to switch, /history, /quit)"
        )?;
        self.out.flush()
    }

    pub fn print_history(&mut self, history: &[Turn]) -> io::Result<()> {
        for turn in history {
            writeln!(self.out, "[{}] {}", turn.role.as_str(), history_text(turn))?;
        }
        self.out.flush()
    }

    pub fn print_notice(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChatView for TerminalView<W> {
    fn render_user_message(&mut self, text: &str) -> Result<(), RenderError> {
        writeln!(self.out, "\nyou> {text}")?;
        Ok(())
    }

    fn render_assistant_message(
        &mut self,
        text: &str,
        keyword_hits: &[Document],
    ) -> Result<(), RenderError> {
        if !keyword_hits.is_empty() {
            writeln!(self.out, "keyword matches:")?;
            writeln!(self.out, "{}", format_keyword_hits(keyword_hits))?;
        }
        if !text.is_empty() {
            if !keyword_hits.is_empty() {
                writeln!(self.out)?;
            }
            writeln!(self.out, "assistant> {text}")?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn render_error(&mut self, message: &str) {
        // Output errors have nowhere else to go.
        let _ = writeln!(self.out, "error> {message}");
        let _ = self.out.flush();
    }

    fn render_fallback_listing(&mut self, label: &str, documents: &[Document]) {
        let _ = writeln!(self.out, "{label}:");
        if documents.is_empty() {
            let _ = writeln!(self.out, "(no records found)");
        } else {
            let _ = writeln!(self.out, "{}", format_keyword_hits(documents));
        }
        let _ = self.out.flush();
    }
}
