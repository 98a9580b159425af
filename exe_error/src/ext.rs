use std::path::PathBuf;

use crate::ExeError;

/// Trait Extension of `Result<T, ExeError>` and `ExeError` to add info
pub trait ExeErrorExt<T> {
    fn with_path(self, path: impl Fn(&ExeError) -> PathBuf) -> T;
    fn with_note(self, note: impl Fn(&ExeError) -> String) -> T;
}

impl<T> ExeErrorExt<Result<T, ExeError>> for Result<T, ExeError> {
    fn with_path(self, path: impl Fn(&ExeError) -> PathBuf) -> Result<T, ExeError> {
        self.map_err(|e| e.with_path(path))
    }

    fn with_note(self, note: impl Fn(&ExeError) -> String) -> Result<T, ExeError> {
        self.map_err(|e| e.with_note(note))
    }
}

impl ExeErrorExt<ExeError> for ExeError {
    fn with_path(mut self, path: impl Fn(&ExeError) -> PathBuf) -> ExeError {
        self.path = Some(path(&self));
        self
    }

    fn with_note(mut self, note: impl Fn(&ExeError) -> String) -> ExeError {
        let note = note(&self);
        self.notes.push(note);
        self
    }
}
