use crate::models::CodeSections;
use std::time::{Duration, Instant};

/// How long the "Copied" acknowledgment stays visible.
pub const COPY_ACK_WINDOW: Duration = Duration::from_secs(2);

/// One generation cycle. A new submission clears the viewer and restarts
/// the cycle; there is no explicit reset transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
    Streaming,
    Displaying,
    Error,
}

/// Destination for the copy action.
pub trait Clipboard {
    fn set_text(&mut self, text: &str);
}

#[derive(Debug, Default)]
pub struct LocalClipboard {
    pub contents: String,
}

impl Clipboard for LocalClipboard {
    fn set_text(&mut self, text: &str) {
        self.contents = text.to_string();
    }
}

/// Tab state over the generated sections: one tab per top-level
/// string-valued key, first key active by default.
pub struct CodeViewer {
    phase: Phase,
    sections: Vec<(String, String)>,
    active: Option<usize>,
    copied_at: Option<Instant>,
    copy_window: Duration,
}

impl Default for CodeViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeViewer {
    pub fn new() -> Self {
        Self::with_copy_window(COPY_ACK_WINDOW)
    }

    pub fn with_copy_window(copy_window: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            sections: Vec::new(),
            active: None,
            copied_at: None,
            copy_window,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Clears previous results and restarts the cycle.
    pub fn begin_submission(&mut self) {
        self.sections.clear();
        self.active = None;
        self.copied_at = None;
        self.phase = Phase::Submitting;
    }

    pub fn note_first_chunk(&mut self) {
        if self.phase == Phase::Submitting {
            self.phase = Phase::Streaming;
        }
    }

    /// Replaces the tabs with the parsed sections. Non-string values are
    /// dropped (partial tabs). The current selection survives when its
    /// label is still present; otherwise the first key becomes active.
    pub fn present(&mut self, sections: &CodeSections) {
        let selected = self.active_tab().map(str::to_string);
        self.sections = sections
            .iter()
            .filter_map(|(label, value)| value.as_str().map(|text| (label.clone(), text.to_string())))
            .collect();
        self.active = selected
            .and_then(|label| self.sections.iter().position(|(l, _)| *l == label))
            .or(if self.sections.is_empty() { None } else { Some(0) });
    }

    pub fn finish(&mut self) {
        self.phase = Phase::Displaying;
    }

    /// Single synthetic tab carrying the failure message.
    pub fn show_error(&mut self, message: &str) {
        self.sections = vec![("Error".to_string(), message.to_string())];
        self.active = Some(0);
        self.phase = Phase::Error;
    }

    pub fn tabs(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(label, _)| label.as_str())
    }

    pub fn active_tab(&self) -> Option<&str> {
        self.active.map(|index| self.sections[index].0.as_str())
    }

    pub fn active_source(&self) -> Option<&str> {
        self.active.map(|index| self.sections[index].1.as_str())
    }

    pub fn select_tab(&mut self, label: &str) -> bool {
        match self.sections.iter().position(|(l, _)| l == label) {
            Some(index) => {
                self.active = Some(index);
                true
            }
            None => false,
        }
    }

    /// Copies the active section's exact text and arms the transient
    /// acknowledgment.
    pub fn copy_active(&mut self, clipboard: &mut dyn Clipboard) -> bool {
        let Some(index) = self.active else {
            return false;
        };
        clipboard.set_text(&self.sections[index].1);
        self.copied_at = Some(Instant::now());
        true
    }

    pub fn copy_acknowledged(&self) -> bool {
        self.copied_at
            .map(|at| at.elapsed() < self.copy_window)
            .unwrap_or(false)
    }
}
