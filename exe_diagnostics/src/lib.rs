use std::io::Write;

use ansi_term::Colour::{Green, Red};
use exe_error::ExeError;
use log::debug;

/// Errors grouped by pipeline stage. A stage containing an `Error`
/// level entry stops the build once it is finished.
#[derive(Debug)]
pub struct Diagnostics {
    stages: Vec<Vec<ExeError>>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            stages: vec![Vec::new()],
        }
    }

    pub fn push_error(&mut self, error: impl Into<ExeError>) {
        let error = error.into();
        debug!("Diagnostic pushed: {}", error.message());
        if let Some(stage) = self.stages.last_mut() {
            stage.push(error);
        }
    }

    pub fn total_fatal(&self) -> usize {
        self.stages
            .iter()
            .flatten()
            .filter(|e| e.level().is_fatal())
            .count()
    }

    fn stage_is_fatal(&self) -> bool {
        self.stages
            .last()
            .map(|stage| stage.iter().any(|e| e.level().is_fatal()))
            .unwrap_or(false)
    }

    /// Close the current stage, printing everything collected so far to
    /// stderr if it contained a fatal error
    pub fn finish_stage(&mut self) -> Result<(), ()> {
        if self.stage_is_fatal() {
            let stderr = std::io::stderr();
            _ = self.render(&mut stderr.lock());
            Err(())
        } else {
            self.stages.push(Vec::new());
            Ok(())
        }
    }

    /// Write every collected diagnostic followed by a summary line,
    /// draining the stages
    pub fn render(&mut self, f: &mut impl Write) -> std::io::Result<()> {
        let total_fatal = self.total_fatal();

        for stage in self.stages.iter_mut() {
            for err in stage.drain(..) {
                writeln!(f, "{}", err)?;
            }
        }

        if total_fatal > 0 {
            writeln!(
                f,
                "{}: Failed to build image due to {} error{}",
                Red.paint("Error"),
                total_fatal,
                if total_fatal > 1 { "s" } else { "" }
            )?;
        } else {
            writeln!(f, "{}: No errors", Green.paint("Finished"))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Diagnostics;
    use exe_error::{ErrorLevel, ExeError};

    #[test]
    fn notes_are_not_fatal() {
        let mut diag = Diagnostics::new();
        diag.push_error(ExeError::new(ErrorLevel::Note, "Test Success"));
        diag.push_error(ExeError::new(ErrorLevel::Warning, "Odd CONF key"));
        assert!(diag.finish_stage().is_ok());
        assert_eq!(diag.total_fatal(), 0);
    }

    #[test]
    fn error_fails_the_stage() {
        let mut diag = Diagnostics::new();
        diag.push_error(ExeError::new(ErrorLevel::Error, "Invalid format"));
        diag.push_error(ExeError::new(ErrorLevel::Error, "Config incomplete"));
        assert_eq!(diag.total_fatal(), 2);

        let mut out = Vec::new();
        diag.render(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Invalid format"));
        assert!(out.contains("Config incomplete"));
        assert!(out.contains("due to 2 errors"));

        // Rendering drains the stages
        assert_eq!(diag.total_fatal(), 0);
    }
}
