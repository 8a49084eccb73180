//! The save-event watcher.
//!
//! For each save the watcher picks a formatter by extension, opens the
//! window, hands both to [`reformat::reformat`], and then decides whether to
//! run the after-save hook. Events are handled one at a time.

pub mod guard;
pub mod reformat;
pub mod replay;

use crate::config::{Config, HookConfig};
use crate::document::{AcmeWindow, Document, DocumentError};
use crate::services::events::{EventError, EventSource, LogEvent};
use crate::services::formatter::{run_for_output, FormatterRegistry};
use anyhow::Context;
use reformat::{reformat, ReformatError, ReformatOutcome};
use std::path::Path;

/// Opens the document for a window id.
pub type WindowOpener = Box<dyn FnMut(u32) -> Result<Box<dyn Document>, DocumentError>>;

/// What the watcher did for one save event.
#[derive(Debug)]
pub struct EventReport {
    pub result: Result<ReformatOutcome, ReformatError>,
    /// The file went through the fallback formatter
    pub fallback: bool,
    pub hook_ran: bool,
}

impl EventReport {
    pub fn modified(&self) -> bool {
        self.result.as_ref().is_ok_and(ReformatOutcome::modified)
    }
}

pub struct Watcher {
    registry: FormatterRegistry,
    after_save: Option<HookConfig>,
    open_window: WindowOpener,
    dry_run: bool,
}

impl Watcher {
    pub fn new(
        registry: FormatterRegistry,
        after_save: Option<HookConfig>,
        open_window: WindowOpener,
    ) -> Self {
        Self {
            registry,
            after_save,
            open_window,
            dry_run: false,
        }
    }

    /// Watcher for a running acme, configured from `config`.
    pub fn for_acme(config: &Config) -> Self {
        let nine_p = config.acme.nine_p.clone();
        let open_window: WindowOpener =
            Box::new(move |id| -> Result<Box<dyn Document>, DocumentError> {
                let window = AcmeWindow::open(id, nine_p.as_str())?;
                Ok(Box::new(window))
            });
        Self::new(
            FormatterRegistry::from_config(config),
            config.after_save.clone(),
            open_window,
        )
    }

    /// Report edits instead of writing them; the hook is not run.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Handle one event. Returns `None` for events that are not saves.
    pub fn handle_event(&mut self, event: &LogEvent) -> Option<EventReport> {
        if !event.is_save() {
            return None;
        }
        let path = Path::new(&event.name);
        let selection = self.registry.select(path);
        tracing::debug!(
            "window {} saved {} (formatter {})",
            event.window_id,
            path.display(),
            selection.name
        );

        let result = match (self.open_window)(event.window_id) {
            Ok(mut doc) => reformat(doc.as_mut(), path, selection.formatter, self.dry_run),
            Err(e) => Err(ReformatError::Document(e)),
        };
        if let Err(e) = &result {
            tracing::warn!("{}: {}", path.display(), e);
        }

        let mut report = EventReport {
            result,
            fallback: selection.fallback,
            hook_ran: false,
        };
        if let Some(hook) = &self.after_save {
            if !self.dry_run && (hook.always || report.fallback || !report.modified()) {
                run_hook(hook, path);
                report.hook_ran = true;
            }
        }
        Some(report)
    }

    /// Handle events until the source closes.
    ///
    /// Malformed log lines are skipped; a read error ends the loop.
    pub fn run(&mut self, source: &mut dyn EventSource) -> anyhow::Result<()> {
        loop {
            match source.next_event() {
                Ok(event) => {
                    self.handle_event(&event);
                }
                Err(EventError::Malformed(line)) => {
                    tracing::warn!("ignoring malformed log line {:?}", line);
                }
                Err(EventError::Closed) => {
                    tracing::info!("event log closed");
                    return Ok(());
                }
                Err(EventError::Io(e)) => {
                    return Err(e).context("reading window events");
                }
            }
        }
    }
}

/// Run the after-save hook and log what it printed.
fn run_hook(hook: &HookConfig, path: &Path) {
    match run_for_output(&hook.command_spec(), path) {
        Ok(output) if !output.trim().is_empty() => {
            tracing::info!("{} {}:\n{}", hook.command, path.display(), output.trim_end());
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("after-save hook {} failed: {}", hook.command, e),
    }
}
