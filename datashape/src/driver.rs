use codespan_reporting::diagnostic::{Diagnostic, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{BufferedStandardStream, ColorChoice, WriteColor};
use std::cell::RefCell;
use std::io::{Read, Write};
use std::path::Path;

use crate::core::DataShape;
use crate::source::MAX_SOURCE_LEN;
use crate::surface::elaboration;

pub type FileId = usize;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Error => 1,
        }
    }
}

/// Parses named sources, rendering any failures as diagnostics.
pub struct Driver {
    files: SimpleFiles<String, String>,
    options: elaboration::Options,

    seen_errors: RefCell<bool>,
    codespan_config: codespan_reporting::term::Config,
    diagnostic_writer: RefCell<Box<dyn WriteColor>>,
    emit_writer: RefCell<Box<dyn WriteColor>>,
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            files: SimpleFiles::new(),
            options: elaboration::Options::default(),

            seen_errors: RefCell::new(false),
            codespan_config: codespan_reporting::term::Config::default(),
            diagnostic_writer: RefCell::new(Box::new(BufferedStandardStream::stderr(
                if atty::is(atty::Stream::Stderr) {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                },
            ))),
            emit_writer: RefCell::new(Box::new(BufferedStandardStream::stdout(
                if atty::is(atty::Stream::Stdout) {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                },
            ))),
        }
    }

    /// Set the writer to use when rendering diagnostics
    pub fn set_diagnostic_writer(&mut self, stream: impl 'static + WriteColor) {
        self.diagnostic_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Set the writer to use when emitting parsed shapes
    pub fn set_emit_writer(&mut self, stream: impl 'static + WriteColor) {
        self.emit_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Set the configuration used when rendering diagnostics
    pub fn set_codespan_config(&mut self, config: codespan_reporting::term::Config) {
        self.codespan_config = config;
    }

    /// Set to false to accept `Var` operands with a lower bound greater than
    /// their upper bound
    pub fn set_validate_var_bounds(&mut self, validate_var_bounds: bool) {
        self.options.validate_var_bounds = validate_var_bounds;
    }

    /// Set to true to accept records that repeat a field label
    pub fn set_allow_duplicate_fields(&mut self, allow_duplicate_fields: bool) {
        self.options.allow_duplicate_fields = allow_duplicate_fields;
    }

    pub fn options(&self) -> elaboration::Options {
        self.options
    }

    /// The status of the driver, based on the diagnostics emitted so far.
    pub fn status(&self) -> Status {
        match *self.seen_errors.borrow() {
            true => Status::Error,
            false => Status::Ok,
        }
    }

    /// Load a source string into the file database.
    pub fn load_source_string(&mut self, name: String, source: String) -> FileId {
        tracing::debug!(%name, len = source.len(), "loading source");
        self.files.add(name, source)
    }

    /// Load a source file into the file database using a reader.
    pub fn load_source(&mut self, name: String, mut reader: impl Read) -> Option<FileId> {
        let mut source = String::new();
        match reader.read_to_string(&mut source) {
            Ok(_) => Some(self.load_source_string(name, source)),
            Err(error) => {
                self.emit_read_diagnostic(name, error);
                None
            }
        }
    }

    /// Load a source file into the file database from the given path.
    pub fn load_source_path(&mut self, path: &Path) -> Option<FileId> {
        match std::fs::File::open(path) {
            Ok(file) => self.load_source(path.display().to_string(), file),
            Err(error) => {
                self.emit_read_diagnostic(path.display(), error);
                None
            }
        }
    }

    /// Parse a previously loaded source, emitting a diagnostic on failure.
    pub fn parse_shape(&self, file_id: FileId) -> Option<DataShape> {
        let source = match self.files.get(file_id) {
            Ok(file) => file.source(),
            Err(error) => {
                self.emit_diagnostic(Diagnostic::bug().with_message(error.to_string()));
                return None;
            }
        };

        if source.len() > MAX_SOURCE_LEN {
            self.emit_diagnostic(
                Diagnostic::error()
                    .with_message("source is too large")
                    .with_notes(vec![format!(
                        "sources must be at most {MAX_SOURCE_LEN} bytes long"
                    )]),
            );
            return None;
        }

        tracing::debug!(file_id, "parsing source");
        match crate::parse_with_options(source, self.options) {
            Ok(shape) => Some(shape),
            Err(error) => {
                self.emit_diagnostic(error.to_diagnostic(file_id));
                None
            }
        }
    }

    /// Parse a previously loaded source, writing the shape to the emit writer.
    pub fn parse_and_emit_shape(&self, file_id: FileId) -> Status {
        match self.parse_shape(file_id) {
            Some(shape) => {
                self.emit_shape(&shape);
                Status::Ok
            }
            None => Status::Error,
        }
    }

    fn emit_shape(&self, shape: &DataShape) {
        let mut emit_writer = self.emit_writer.borrow_mut();
        if let Err(error) = writeln!(emit_writer, "{shape}").and_then(|()| emit_writer.flush()) {
            tracing::error!(%error, "failed to emit shape");
        }
    }

    pub fn emit_diagnostic(&self, diagnostic: Diagnostic<FileId>) {
        let mut writer = self.diagnostic_writer.borrow_mut();
        let config = &self.codespan_config;

        let result = codespan_reporting::term::emit(&mut *writer, config, &self.files, &diagnostic);
        if let Err(error) = result {
            tracing::error!(%error, "failed to render diagnostic");
        }
        if let Err(error) = writer.flush() {
            tracing::error!(%error, "failed to flush diagnostics");
        }

        if diagnostic.severity >= Severity::Error {
            *self.seen_errors.borrow_mut() = true;
        }
    }

    fn emit_read_diagnostic(&self, name: impl std::fmt::Display, error: std::io::Error) {
        let diagnostic =
            Diagnostic::error().with_message(format!("couldn't read `{name}`: {error}"));
        self.emit_diagnostic(diagnostic);
    }
}

impl Default for Driver {
    fn default() -> Driver {
        Driver::new()
    }
}
