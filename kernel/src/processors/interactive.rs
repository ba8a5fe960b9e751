//! Asking the user about unresolved chunks.

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use textdiff::{Location, PreferredAction, split_lines};
use tracing::debug;

use crate::error::ProcessError;
use crate::pipeline::{Phase, Processor, ProcessorDescriptor};
use crate::tree::{DiffPayload, Node, NodeKind};

use super::read_text;

/// One chunk presented to a [`ConflictResolver`].
#[derive(Debug, Clone, Copy)]
pub struct ConflictRequest<'a> {
    /// File the chunk belongs to, relative to the roots.
    pub path: &'a Path,
    /// 1-based position among the chunks asked about in this file.
    pub index: usize,
    /// Number of chunks asked about in this file.
    pub total: usize,
    /// Base lines of the chunk; `None` in two-way mode.
    pub base: Option<&'a [&'a str]>,
    /// Local lines of the chunk.
    pub local: &'a [&'a str],
    /// Remote lines of the chunk.
    pub remote: &'a [&'a str],
}

/// Source of decisions for unresolved chunks.
pub trait ConflictResolver: Send + Sync {
    /// Picks an action for `request`, or `None` to leave the chunk unresolved.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Resolver`] if no answer can be obtained.
    fn resolve(&self, request: &ConflictRequest<'_>) -> Result<Option<PreferredAction>, ProcessError>;
}

/// Prompts on a text console.
///
/// Answers are `l` (local), `r` (remote), `b` (base, three-way only),
/// `a` (local then remote) and `s` (skip). End of input skips.
#[derive(Debug)]
pub struct ConsoleResolver<R, W> {
    io: Mutex<(R, W)>,
    local_label: String,
    remote_label: String,
}

impl ConsoleResolver<BufReader<Stdin>, Stdout> {
    /// Resolver on the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> ConsoleResolver<R, W> {
    /// Resolver reading answers from `input` and writing prompts to `output`.
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Mutex::new((input, output)),
            local_label: "local".to_string(),
            remote_label: "remote".to_string(),
        }
    }

    /// Labels shown on the two sides of a chunk.
    #[must_use]
    pub fn with_labels(mut self, local: impl Into<String>, remote: impl Into<String>) -> Self {
        self.local_label = local.into();
        self.remote_label = remote.into();
        self
    }

    /// Returns the reader and writer.
    pub fn into_inner(self) -> (R, W) {
        self.io.into_inner()
    }

    fn prompt(&self, request: &ConflictRequest<'_>) -> io::Result<Option<PreferredAction>> {
        let mut guard = self.io.lock();
        let (input, output) = &mut *guard;
        writeln!(
            output,
            "Conflict {}/{} in {}",
            request.index,
            request.total,
            request.path.display()
        )?;
        writeln!(output, "<<<<<<< {}", self.local_label)?;
        write_lines(output, request.local)?;
        if let Some(base) = request.base {
            writeln!(output, "||||||| base")?;
            write_lines(output, base)?;
        }
        writeln!(output, "=======")?;
        write_lines(output, request.remote)?;
        writeln!(output, ">>>>>>> {}", self.remote_label)?;

        let choices = if request.base.is_some() {
            "[l]ocal, [r]emote, [b]ase, [a]ll, [s]kip? "
        } else {
            "[l]ocal, [r]emote, [a]ll, [s]kip? "
        };
        let mut answer = String::new();
        loop {
            write!(output, "{choices}")?;
            output.flush()?;
            answer.clear();
            if input.read_line(&mut answer)? == 0 {
                return Ok(None);
            }
            let action = match answer.trim() {
                "l" | "local" => Some(PreferredAction::Local),
                "r" | "remote" => Some(PreferredAction::Remote),
                "b" | "base" if request.base.is_some() => Some(PreferredAction::Base),
                "a" | "all" => Some(PreferredAction::LocalThenRemote),
                "s" | "skip" => return Ok(None),
                _ => None,
            };
            if action.is_some() {
                return Ok(action);
            }
        }
    }
}

fn write_lines(output: &mut impl Write, lines: &[&str]) -> io::Result<()> {
    for line in lines {
        writeln!(output, "{line}")?;
    }
    Ok(())
}

impl<R, W> ConflictResolver for ConsoleResolver<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn resolve(&self, request: &ConflictRequest<'_>) -> Result<Option<PreferredAction>, ProcessError> {
        self.prompt(request)
            .map_err(|e| ProcessError::Resolver(e.to_string()))
    }
}

/// Collects decisions for unresolved chunks of text files.
///
/// Three-way: every conflicting chunk without a preference. Two-way: every
/// chunk without a preference.
pub struct InteractiveProcessor {
    resolver: Arc<dyn ConflictResolver>,
}

impl std::fmt::Debug for InteractiveProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractiveProcessor").finish_non_exhaustive()
    }
}

impl InteractiveProcessor {
    /// Asks `resolver` about each chunk.
    #[must_use]
    pub fn new(resolver: Arc<dyn ConflictResolver>) -> Self {
        Self { resolver }
    }
}

fn slice<'a>(lines: &'a [&'a str], start: usize, len: usize) -> &'a [&'a str] {
    lines.get(start..start + len).unwrap_or_default()
}

impl Processor for InteractiveProcessor {
    fn descriptor(&self) -> ProcessorDescriptor {
        ProcessorDescriptor::new("interactive", Phase::Interactive, 10)
    }

    fn process_file(&self, node: &mut Node) -> Result<(), ProcessError> {
        let pending = match node.payload() {
            Some(DiffPayload::ThreeWay(items)) => items
                .iter()
                .filter(|i| i.is_conflict() && i.preferred_action == PreferredAction::Default)
                .count(),
            Some(DiffPayload::TwoWay(items)) => items
                .iter()
                .filter(|i| i.preferred_action == PreferredAction::Default)
                .count(),
            Some(DiffPayload::Empty) | None => 0,
        };
        if pending == 0 {
            return Ok(());
        }

        let text = |location| match node.file(location) {
            Some(path) => read_text(path),
            None => Ok(String::new()),
        };
        let base_text = text(Location::Base)?;
        let local_text = text(Location::Local)?;
        let remote_text = text(Location::Remote)?;
        let base = split_lines(&base_text);
        let local = split_lines(&local_text);
        let remote = split_lines(&remote_text);
        let path = node.relative_path().to_path_buf();

        let NodeKind::DiffFile(payload) = &mut node.kind else {
            return Ok(());
        };
        let mut index = 0;
        match payload {
            DiffPayload::ThreeWay(items) => {
                for item in items
                    .iter_mut()
                    .filter(|i| i.is_conflict() && i.preferred_action == PreferredAction::Default)
                {
                    index += 1;
                    let request = ConflictRequest {
                        path: &path,
                        index,
                        total: pending,
                        base: Some(slice(&base, item.base_start, item.base_affected)),
                        local: slice(&local, item.local_start, item.local_affected),
                        remote: slice(&remote, item.remote_start, item.remote_affected),
                    };
                    if let Some(action) = self.resolver.resolve(&request)? {
                        item.preferred_action = action;
                    }
                }
            }
            DiffPayload::TwoWay(items) => {
                for item in items
                    .iter_mut()
                    .filter(|i| i.preferred_action == PreferredAction::Default)
                {
                    index += 1;
                    let request = ConflictRequest {
                        path: &path,
                        index,
                        total: pending,
                        base: None,
                        local: slice(&local, item.local_start, item.local_affected),
                        remote: slice(&remote, item.remote_start, item.remote_affected),
                    };
                    if let Some(action) = self.resolver.resolve(&request)? {
                        item.preferred_action = action;
                    }
                }
            }
            DiffPayload::Empty => {}
        }
        debug!(path = %path.display(), asked = index, "Collected conflict decisions");
        Ok(())
    }
}
