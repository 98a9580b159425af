use std::{
    fmt::Display,
    path::PathBuf,
};

use ansi_term::{
    Colour,
    Colour::{Blue, Red, White, Yellow},
};

pub mod ext;

#[derive(Debug, Clone)]
pub struct ExeError {
    // Required
    level: ErrorLevel,
    message: String,

    // Optional
    path: Option<PathBuf>,
    notes: Vec<String>,
}

impl ExeError {
    pub fn new(level: ErrorLevel, message: impl Display) -> Self {
        Self {
            level,
            message: message.to_string(),
            path: None,
            notes: Vec::new(),
        }
    }

    pub fn level(&self) -> ErrorLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn get_path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn get_notes(&self) -> &Vec<String> {
        self.notes.as_ref()
    }
}

impl std::fmt::Display for ExeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const HIGHLIGHT_COLOUR: Colour = Blue;

        // Write Message
        writeln!(f, "{}: {}", self.level(), self.message())?;

        if let Some(path) = self.get_path() {
            writeln!(
                f,
                " {} {}",
                HIGHLIGHT_COLOUR.paint("-->"),
                path.display()
            )?;
        }

        for note in &self.notes {
            writeln!(f, "   {} {}", HIGHLIGHT_COLOUR.paint("= Note:"), note)?;
        }

        Ok(())
    }
}

impl std::error::Error for ExeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorLevel {
    Error,
    Warning,
    Note,
}

impl ErrorLevel {
    /// Only `Error` stops an image from being built
    pub fn is_fatal(&self) -> bool {
        *self == ErrorLevel::Error
    }

    fn style(&self) -> (&'static str, Colour) {
        match self {
            ErrorLevel::Error => ("Error", Red),
            ErrorLevel::Warning => ("Warning", Yellow),
            ErrorLevel::Note => ("Note", White),
        }
    }
}

impl std::fmt::Display for ErrorLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (label, colour) = self.style();
        write!(f, "{}", colour.paint(label))
    }
}
