use std::collections::VecDeque;

use chrono::DateTime;
use rand::Rng;

use crate::endpoints::SaveKind;
use crate::form::{FormMode, ResultForm};
use crate::history::{
    HistoryError, HistorySource, HistoryStore, MatchRecord, MergeStrategy, RecordDraft,
};
use crate::layout::{LayoutConfig, MatchLayout, layout_match};
use crate::match_data::MatchInfo;
use crate::persist::LocalStorage;
use crate::session::{AuthConfig, GateDecision, GatedAction, SessionGate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Pitch,
    History,
    Stats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Login {
        password: String,
        error: Option<String>,
    },
    ResultForm(ResultForm),
    ConfirmDelete {
        id: i64,
    },
    ConfirmDuplicate {
        draft: RecordDraft,
        existing_id: i64,
    },
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub match_info: MatchInfo,
    pub layout_config: LayoutConfig,
    pub layout: MatchLayout,
    pub history: HistoryStore,
    pub gate: SessionGate,
    pub overlay: Option<Overlay>,
    pub help_overlay: bool,
    pub selected: usize,
    pub logs: VecDeque<String>,
    pub needs_redraw: bool,
    pub merge: MergeStrategy,
    pub storage: Option<LocalStorage>,
    pub outbox: Vec<ProviderCommand>,
    match_seq: u64,
    history_seq: u64,
    has_local_history: bool,
    /// Admin badge as last drawn.
    admin_shown: bool,
}

impl AppState {
    pub fn new(merge: MergeStrategy, storage: Option<LocalStorage>) -> Self {
        let match_info = MatchInfo::default();
        let layout_config = LayoutConfig::default();
        let layout = layout_match(&match_info, &layout_config);
        Self {
            screen: Screen::Pitch,
            match_info,
            layout_config,
            layout,
            history: HistoryStore::default(),
            gate: SessionGate::new(AuthConfig::default()),
            overlay: None,
            help_overlay: false,
            selected: 0,
            logs: VecDeque::new(),
            needs_redraw: true,
            merge,
            storage,
            outbox: Vec::new(),
            match_seq: 0,
            history_seq: 0,
            has_local_history: false,
            admin_shown: false,
        }
    }

    /// Pick up the stored session and cached history before the first fetch lands.
    pub fn load_local(&mut self, now_ms: i64) {
        let Some(storage) = self.storage.clone() else {
            return;
        };
        let stored = storage.load_session();
        if self.gate.restore(stored, now_ms) {
            self.push_log("[INFO] Admin session restored");
        } else if stored.is_some() {
            self.push_log("[INFO] Stored admin session expired");
            self.clear_stored_session();
        }
        if let Some(records) = storage.load_history() {
            self.push_log(format!("[INFO] Loaded {} cached matches", records.len()));
            self.history = HistoryStore::new(records);
            self.has_local_history = true;
        }
        self.needs_redraw = true;
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
        self.needs_redraw = true;
    }

    pub fn set_screen(&mut self, screen: Screen) {
        if self.screen != screen {
            self.screen = screen;
            self.needs_redraw = true;
        }
    }

    pub fn display_records(&self) -> Vec<&MatchRecord> {
        self.history.sorted_for_display()
    }

    pub fn selected_record(&self) -> Option<&MatchRecord> {
        self.display_records().get(self.selected).copied()
    }

    pub fn select_next(&mut self) {
        let total = self.history.len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1).min(total - 1);
        self.needs_redraw = true;
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.needs_redraw = true;
    }

    pub fn clamp_selection(&mut self) {
        let total = self.history.len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn is_admin(&self, now_ms: i64) -> bool {
        self.gate.is_authenticated(now_ms)
    }

    /// Called on every UI tick. A session that expires with no input still
    /// changes the header.
    pub fn tick(&mut self, now_ms: i64) {
        let admin = self.is_admin(now_ms);
        if admin != self.admin_shown {
            self.admin_shown = admin;
            self.needs_redraw = true;
        }
    }

    /// Drain the commands queued for the provider thread.
    pub fn take_outbox(&mut self) -> Vec<ProviderCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn request_add(&mut self, now_ms: i64) {
        self.gated(GatedAction::AddResult, now_ms);
    }

    pub fn request_edit(&mut self, now_ms: i64) {
        let Some(id) = self.selected_record().map(|r| r.id) else {
            self.push_log("[INFO] No match selected to edit");
            return;
        };
        self.gated(GatedAction::EditResult { id }, now_ms);
    }

    pub fn request_delete(&mut self, now_ms: i64) {
        let Some(id) = self.selected_record().map(|r| r.id) else {
            self.push_log("[INFO] No match selected to delete");
            return;
        };
        self.gated(GatedAction::DeleteResult { id }, now_ms);
    }

    pub fn request_login(&mut self, now_ms: i64) {
        if self.gate.is_authenticated(now_ms) {
            self.push_log("[INFO] Already logged in as admin");
            return;
        }
        self.open_login();
    }

    fn gated(&mut self, action: GatedAction, now_ms: i64) {
        match self.gate.check(action, now_ms) {
            GateDecision::Proceed => self.open_action(action, now_ms),
            GateDecision::PromptLogin => {
                self.clear_stored_session();
                self.open_login();
            }
        }
    }

    fn open_login(&mut self) {
        self.overlay = Some(Overlay::Login {
            password: String::new(),
            error: None,
        });
        self.needs_redraw = true;
    }

    fn open_action(&mut self, action: GatedAction, now_ms: i64) {
        match action {
            GatedAction::AddResult => {
                let form = ResultForm::for_add(&today(now_ms), &self.match_info);
                self.overlay = Some(Overlay::ResultForm(form));
            }
            GatedAction::EditResult { id } => match self.history.get(id) {
                Some(record) => {
                    self.overlay = Some(Overlay::ResultForm(ResultForm::for_edit(record)));
                }
                None => {
                    self.overlay = None;
                    self.push_log(format!("[WARN] Match {id} no longer exists"));
                }
            },
            GatedAction::DeleteResult { id } => {
                self.overlay = if self.history.get(id).is_some() {
                    Some(Overlay::ConfirmDelete { id })
                } else {
                    None
                };
            }
        }
        self.needs_redraw = true;
    }

    /// Check the typed password. On success the remembered action, if any, is resumed.
    pub fn submit_login(&mut self, now_ms: i64) {
        let Some(Overlay::Login { password, .. }) = &self.overlay else {
            return;
        };
        let password = password.clone();
        match self.gate.login(&password, now_ms) {
            Ok(pending) => {
                self.overlay = None;
                if let (Some(storage), Some(token)) = (&self.storage, self.gate.token())
                    && let Err(err) = storage.save_session(token)
                {
                    self.push_log(format!("[WARN] Session not stored: {err:#}"));
                }
                self.push_log("[INFO] Admin logged in");
                if let Some(action) = pending {
                    self.open_action(action, now_ms);
                }
            }
            Err(err) => {
                self.overlay = Some(Overlay::Login {
                    password: String::new(),
                    error: Some(err.to_string()),
                });
            }
        }
        self.needs_redraw = true;
    }

    pub fn logout(&mut self) {
        self.gate.logout();
        self.clear_stored_session();
        self.push_log("[INFO] Admin logged out");
    }

    fn clear_stored_session(&mut self) {
        if let Some(storage) = &self.storage
            && let Err(err) = storage.clear_session()
        {
            self.push_log(format!("[WARN] Session not cleared: {err:#}"));
        }
    }

    /// Close any overlay, forgetting an intent that was waiting on a login.
    pub fn dismiss_overlay(&mut self) {
        if matches!(self.overlay, Some(Overlay::Login { .. })) {
            self.gate.cancel_pending();
        }
        self.overlay = None;
        self.needs_redraw = true;
    }

    pub fn submit_form<R: Rng>(&mut self, now_ms: i64, rng: &mut R) {
        let Some(Overlay::ResultForm(form)) = self.overlay.clone() else {
            return;
        };
        let action = match form.mode {
            FormMode::Add => GatedAction::AddResult,
            FormMode::Edit { id } => GatedAction::EditResult { id },
        };
        if !self.gate.is_authenticated(now_ms) {
            self.push_log("[WARN] Admin session expired; log in again");
            self.gated(action, now_ms);
            return;
        }

        match form.mode {
            FormMode::Add => match form.to_draft(&self.match_info) {
                Ok(draft) => self.add_draft(draft, false, now_ms, rng),
                Err(err) => self.set_form_error(form, err.to_string()),
            },
            FormMode::Edit { id } => {
                let patch = match form.to_patch() {
                    Ok(patch) => patch,
                    Err(err) => {
                        self.set_form_error(form, err.to_string());
                        return;
                    }
                };
                match self.history.edit(id, patch) {
                    Ok(_) => {
                        self.overlay = None;
                        self.push_log(format!("[INFO] Match {id} updated"));
                        self.persist_history();
                    }
                    Err(err) => self.set_form_error(form, err.to_string()),
                }
            }
        }
        self.needs_redraw = true;
    }

    /// The user accepted the duplicate warning.
    pub fn confirm_duplicate<R: Rng>(&mut self, now_ms: i64, rng: &mut R) {
        let Some(Overlay::ConfirmDuplicate { draft, .. }) = self.overlay.clone() else {
            return;
        };
        if self.gate.check(GatedAction::AddResult, now_ms) != GateDecision::Proceed {
            self.open_login();
            return;
        }
        self.add_draft(draft, true, now_ms, rng);
    }

    pub fn confirm_delete(&mut self, now_ms: i64) {
        let Some(Overlay::ConfirmDelete { id }) = self.overlay.clone() else {
            return;
        };
        if self.gate.check(GatedAction::DeleteResult { id }, now_ms) != GateDecision::Proceed {
            self.open_login();
            return;
        }
        self.overlay = None;
        match self.history.remove(id) {
            Ok(removed) => {
                self.push_log(format!("[INFO] Deleted match of {}", removed.date));
                self.clamp_selection();
                self.persist_history();
            }
            Err(err) => self.push_log(format!("[WARN] {err}")),
        }
        self.needs_redraw = true;
    }

    fn add_draft<R: Rng>(
        &mut self,
        draft: RecordDraft,
        override_duplicate: bool,
        now_ms: i64,
        rng: &mut R,
    ) {
        match self.history.add(draft.clone(), override_duplicate, now_ms, rng) {
            Ok(outcome) => {
                self.overlay = None;
                match outcome.replaced {
                    Some(old) => self.push_log(format!("[INFO] Replaced match {old}")),
                    None => self.push_log("[INFO] Result saved"),
                }
                // The result endpoint appends, so a replacement goes out as the full collection.
                match (outcome.replaced, self.history.get(outcome.id).cloned()) {
                    (None, Some(record)) => {
                        self.save_local_history();
                        self.outbox.push(ProviderCommand::PushResult(record));
                    }
                    _ => self.persist_history(),
                }
            }
            Err(HistoryError::Duplicate { existing_id, .. }) => {
                self.overlay = Some(Overlay::ConfirmDuplicate { draft, existing_id });
            }
            Err(err) => {
                if let Some(Overlay::ResultForm(form)) = self.overlay.clone() {
                    self.set_form_error(form, err.to_string());
                } else {
                    self.push_log(format!("[WARN] {err}"));
                }
            }
        }
        self.needs_redraw = true;
    }

    fn set_form_error(&mut self, mut form: ResultForm, message: String) {
        form.error = Some(message);
        self.overlay = Some(Overlay::ResultForm(form));
        self.needs_redraw = true;
    }

    /// Write the collection locally, then queue the remote push.
    pub fn persist_history(&mut self) {
        self.save_local_history();
        self.outbox
            .push(ProviderCommand::PushHistory(self.history.records().to_vec()));
    }

    fn save_local_history(&mut self) {
        if let Some(storage) = self.storage.clone() {
            match storage.save_history(self.history.records()) {
                Ok(()) => self.has_local_history = true,
                Err(err) => self.push_log(format!("[WARN] Local save failed: {err:#}")),
            }
        } else {
            self.has_local_history = true;
        }
    }
}

fn today(now_ms: i64) -> String {
    DateTime::from_timestamp_millis(now_ms)
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetMatchInfo { seq: u64, info: MatchInfo },
    SetRemoteHistory { seq: u64, records: Vec<MatchRecord> },
    SetAuthConfig(AuthConfig),
    SaveFinished {
        kind: SaveKind,
        result: Result<String, String>,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    FetchMatchData,
    FetchHistory,
    FetchAuthConfig,
    PushResult(MatchRecord),
    PushHistory(Vec<MatchRecord>),
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetMatchInfo { seq, info } => {
            if seq <= state.match_seq {
                return;
            }
            state.match_seq = seq;
            if info == state.match_info {
                return;
            }
            state.layout = layout_match(&info, &state.layout_config);
            state.match_info = info;
            state.needs_redraw = true;
        }
        Delta::SetRemoteHistory { seq, records } => {
            if seq <= state.history_seq {
                return;
            }
            state.history_seq = seq;
            let local = state
                .has_local_history
                .then(|| state.history.records().to_vec());
            let (store, source) = HistoryStore::reconcile(records, local, state.merge);
            if store == state.history {
                return;
            }
            let note = match source {
                HistorySource::Remote => "server",
                HistorySource::Local => "local copy",
                HistorySource::Merged => "merged",
            };
            state.history = store;
            state.clamp_selection();
            state.push_log(format!(
                "[INFO] History updated ({} matches, {note})",
                state.history.len()
            ));
        }
        Delta::SetAuthConfig(config) => {
            if *state.gate.config() != config {
                state.gate.set_config(config);
                state.push_log("[INFO] Admin settings loaded");
            }
        }
        Delta::SaveFinished { kind, result } => match result {
            Ok(url) => state.push_log(format!("[INFO] Saved {} to {url}", kind.label())),
            Err(err) => state.push_log(format!(
                "[WARN] {err}; changes are only stored locally and may not survive a reload"
            )),
        },
        Delta::Log(msg) => state.push_log(msg),
    }
}
