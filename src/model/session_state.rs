use crate::model::history_entry::HistoryEntry;

/// Per-session state. Lives inside the engine worker and is cloned
/// out to the UI after every command; nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub history: Vec<HistoryEntry>,
    pub current: Option<HistoryEntry>,
    pub edit_mode: bool,
}

impl SessionState {
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    /// The entry edits apply to, if the session is in edit mode.
    pub fn editing(&self) -> Option<&HistoryEntry> {
        if self.edit_mode {
            self.current.as_ref()
        } else {
            None
        }
    }

    /// Append and make it current. Returns the stored entry.
    pub(crate) fn record(&mut self, entry: HistoryEntry) -> &HistoryEntry {
        self.current = Some(entry.clone());
        self.history.push(entry);
        &self.history[self.history.len() - 1]
    }
}
