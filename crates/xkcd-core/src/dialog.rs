//! `Speaker: text` dialog files.

use thiserror::Error;

/// One utterance of a dialog.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpokenLine {
    pub speaker: String,
    pub text: String,
}

impl SpokenLine {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }

    /// Number of space characters, used to pace reading time.
    pub fn space_count(&self) -> usize {
        self.text.chars().filter(|c| *c == ' ').count()
    }
}

/// A parsed dialog, identified by the stem of the file it was read from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dialog {
    pub id: String,
    pub lines: Vec<SpokenLine>,
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum DialogError {
    #[error("line {line} has no `speaker: text` separator")]
    MissingSeparator { line: usize },
    #[error("wrong number of speakers: {found}")]
    SpeakerCount { found: usize },
}

/// Splits raw dialog text into spoken lines.
///
/// The whole text and each field are trimmed. Only the first colon separates
/// speaker from text. Blank lines are skipped; `line` in errors is 1-based.
pub fn parse_dialog(raw: &str) -> Result<Vec<SpokenLine>, DialogError> {
    raw.trim()
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let (speaker, text) = line
                .split_once(':')
                .ok_or(DialogError::MissingSeparator { line: index + 1 })?;
            Ok(SpokenLine::new(speaker.trim(), text.trim()))
        })
        .collect()
}

impl Dialog {
    pub fn parse(id: impl Into<String>, raw: &str) -> Result<Self, DialogError> {
        Ok(Self {
            id: id.into(),
            lines: parse_dialog(raw)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_colon_and_trims_fields() {
        let raw = "\n  Cueball 1:  You're flying! How?\nMegan: Time: 5pm  \n\n";
        let lines = parse_dialog(raw).unwrap();
        assert_eq!(
            lines,
            vec![
                SpokenLine::new("Cueball 1", "You're flying! How?"),
                SpokenLine::new("Megan", "Time: 5pm"),
            ]
        );
    }

    #[test]
    fn blank_lines_inside_dialog_are_skipped() {
        let lines = parse_dialog("A: one\n   \nB: two").unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn line_without_colon_is_rejected() {
        assert_eq!(
            parse_dialog("A: one\nno separator here"),
            Err(DialogError::MissingSeparator { line: 2 })
        );
    }

    #[test]
    fn empty_file_has_no_lines() {
        assert_eq!(parse_dialog(" \n\t\n"), Ok(Vec::new()));
    }

    #[test]
    fn counts_spaces_for_pacing() {
        assert_eq!(SpokenLine::new("x", "I learned it last night!").space_count(), 4);
        assert_eq!(SpokenLine::new("x", "Python!").space_count(), 0);
    }
}
