use crate::domain::ports::Presenter;
use crate::utils::error::Result;
use crate::utils::validation::validate_file_extension;
use std::io::{BufRead, Write};

/// 以行為單位的終端機呈現層
pub struct TerminalPresenter<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl TerminalPresenter<std::io::StdinLock<'static>, std::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPresenter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// EOF 回傳 None
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl<R: BufRead, W: Write> Presenter for TerminalPresenter<R, W> {
    fn render_heading(&mut self, text: &str) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "== {} ==", text)?;
        Ok(())
    }

    fn render_text(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{}", text.trim_end())?;
        Ok(())
    }

    fn render_list(&mut self, items: &[String]) -> Result<()> {
        for item in items {
            writeln!(self.output, "  {}", item)?;
        }
        Ok(())
    }

    fn capture_text(&mut self, label: &str) -> Result<Option<String>> {
        writeln!(self.output, "{} (finish with an empty line):", label)?;
        self.output.flush()?;

        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            if line.trim().is_empty() {
                break;
            }
            lines.push(line);
        }

        if lines.is_empty() {
            Ok(None)
        } else {
            Ok(Some(lines.join("\n")))
        }
    }

    fn capture_audio(&mut self, label: &str) -> Result<Option<Vec<u8>>> {
        write!(self.output, "{} (path to a .wav recording, empty to skip): ", label)?;
        self.output.flush()?;

        let Some(path) = self.read_line()? else {
            return Ok(None);
        };
        let path = path.trim();
        if path.is_empty() {
            return Ok(None);
        }

        validate_file_extension("audio", path, &["wav"])?;
        let bytes = std::fs::read(path)?;
        tracing::debug!("Loaded recording {} ({} bytes)", path, bytes.len());
        Ok(Some(bytes))
    }

    fn on_action(&mut self, label: &str) -> Result<bool> {
        write!(self.output, "{}? [y/N] ", label)?;
        self.output.flush()?;

        Ok(matches!(
            self.read_line()?.as_deref().map(|s| s.trim().to_ascii_lowercase()),
            Some(answer) if answer == "y" || answer == "yes"
        ))
    }

    fn reveal(&mut self, label: &str, content: &str) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "--- {} ---", label)?;
        writeln!(self.output, "{}", content.trim_end())?;
        writeln!(self.output, "---")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn presenter(input: &str) -> TerminalPresenter<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPresenter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_capture_text_until_blank_line() {
        let mut p = presenter("Hello Sarah,\nhow long have you felt tired?\n\nignored\n");
        let text = p.capture_text("Task i").unwrap();
        assert_eq!(
            text.as_deref(),
            Some("Hello Sarah,\nhow long have you felt tired?")
        );
    }

    #[test]
    fn test_capture_text_nothing_entered() {
        let mut p = presenter("\n");
        assert_eq!(p.capture_text("Task i").unwrap(), None);
        let mut p = presenter("");
        assert_eq!(p.capture_text("Task i").unwrap(), None);
    }

    #[test]
    fn test_on_action() {
        assert!(presenter("y\n").on_action("Submit").unwrap());
        assert!(presenter("YES\n").on_action("Submit").unwrap());
        assert!(!presenter("n\n").on_action("Submit").unwrap());
        assert!(!presenter("").on_action("Submit").unwrap());
    }

    #[test]
    fn test_capture_audio_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("answer.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let mut p = presenter(&format!("{}\n", path.display()));
        assert_eq!(p.capture_audio("Record").unwrap(), Some(b"RIFF".to_vec()));

        let mut p = presenter("\n");
        assert_eq!(p.capture_audio("Record").unwrap(), None);

        let mut p = presenter("answer.mp3\n");
        assert!(p.capture_audio("Record").is_err());
    }

    #[test]
    fn test_render_and_reveal() {
        let mut p = presenter("");
        p.render_heading("Tasks").unwrap();
        p.render_list(&["i. Take a focused history.".to_string()]).unwrap();
        p.reveal("Official Rubric", "Diagnosis: Anemia").unwrap();

        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("== Tasks =="));
        assert!(out.contains("  i. Take a focused history."));
        assert!(out.contains("--- Official Rubric ---\nDiagnosis: Anemia\n---"));
    }
}
