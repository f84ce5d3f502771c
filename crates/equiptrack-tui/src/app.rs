//! Application state management.

use crate::config::Credentials;
use chrono::{Local, NaiveDate};
use equiptrack_core::{
    BackendKind, CsvRepository, EquipmentRecord, EquipmentStore, Evaluation, LoadReport,
    RecordDraft, RecordId, SaveOutcome, StoreError,
};
use std::path::PathBuf;

/// Application state.
#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    /// Waiting for username and password.
    Locked,
    /// Record view is open.
    Unlocked,
    /// Application should quit.
    Quit,
}

/// Input mode for the application.
#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    /// Login form.
    Login,
    /// Table navigation.
    Normal,
    /// Typing a search term.
    Search,
    /// Add/edit form is open.
    Form,
    /// Waiting for y/n on a delete.
    ConfirmDelete,
    /// Typing the CSV file to load.
    LoadPath,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginField {
    Username,
    Password,
}

/// Fields of the add/edit form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Name,
    Material,
    Quantity,
    FirstDate,
    LastDate,
}

impl FormField {
    const ORDER: [FormField; 5] = [
        FormField::Name,
        FormField::Material,
        FormField::Quantity,
        FormField::FirstDate,
        FormField::LastDate,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Material => "Material",
            FormField::Quantity => "Quantity",
            FormField::FirstDate => "First Date",
            FormField::LastDate => "Last Issue Date",
        }
    }
}

/// Text typed into the add/edit form.
#[derive(Debug, Clone)]
pub struct RecordForm {
    /// Record being edited, `None` when adding.
    pub editing: Option<RecordId>,
    pub focus: FormField,
    pub name: String,
    pub material: String,
    pub quantity: String,
    pub first_date: String,
    pub last_date: String,
}

const FORM_DATE_FORMAT: &str = "%Y-%m-%d";

impl RecordForm {
    /// Empty form with both dates set to `today`.
    pub fn blank(material: String, today: NaiveDate) -> Self {
        let today = today.format(FORM_DATE_FORMAT).to_string();
        Self {
            editing: None,
            focus: FormField::Name,
            name: String::new(),
            material,
            quantity: String::new(),
            first_date: today.clone(),
            last_date: today,
        }
    }

    pub fn for_record(record: &EquipmentRecord) -> Self {
        Self {
            editing: Some(record.id),
            focus: FormField::Name,
            name: record.name.clone(),
            material: record.material.clone(),
            quantity: record.quantity.to_string(),
            first_date: record.first_issue_date.format(FORM_DATE_FORMAT).to_string(),
            last_date: record.last_issue_date.format(FORM_DATE_FORMAT).to_string(),
        }
    }

    /// The text buffer behind the focused field, if it takes typed input.
    pub fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Name => Some(&mut self.name),
            FormField::Material => None,
            FormField::Quantity => Some(&mut self.quantity),
            FormField::FirstDate => Some(&mut self.first_date),
            FormField::LastDate => Some(&mut self.last_date),
        }
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Material => &self.material,
            FormField::Quantity => &self.quantity,
            FormField::FirstDate => &self.first_date,
            FormField::LastDate => &self.last_date,
        }
    }

    /// Type a character into the focused field.
    ///
    /// Quantity only takes digits.
    pub fn push_char(&mut self, c: char) {
        if self.focus == FormField::Quantity && !c.is_ascii_digit() {
            return;
        }
        if let Some(text) = self.focused_text() {
            text.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let Some(text) = self.focused_text() {
            text.pop();
        }
    }

    /// Step the material through `materials`, wrapping around.
    pub fn cycle_material(&mut self, materials: &[String], forward: bool) {
        if materials.is_empty() {
            return;
        }
        let next = match materials.iter().position(|m| *m == self.material) {
            Some(i) if forward => (i + 1) % materials.len(),
            Some(i) => (i + materials.len() - 1) % materials.len(),
            None => 0,
        };
        self.material = materials[next].clone();
    }

    fn parse_dates(&self) -> Result<(NaiveDate, NaiveDate), String> {
        let parse = |label: &str, text: &str| {
            NaiveDate::parse_from_str(text.trim(), FORM_DATE_FORMAT)
                .map_err(|_| format!("{label} must be YYYY-MM-DD"))
        };
        Ok((
            parse("First Date", &self.first_date)?,
            parse("Last Issue Date", &self.last_date)?,
        ))
    }

    pub fn to_draft(&self) -> Result<RecordDraft, String> {
        let (first, last) = self.parse_dates()?;
        Ok(RecordDraft::new(
            self.name.clone(),
            self.material.clone(),
            self.quantity.clone(),
            first,
            last,
        ))
    }
}

/// One line of feedback under the table.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Main application model.
pub struct App {
    /// Current application state.
    pub state: AppState,
    /// Current input mode.
    pub input_mode: InputMode,
    /// Records and their persistence.
    pub store: EquipmentStore,
    credentials: Credentials,

    // Login state
    pub username_input: String,
    pub password_input: String,
    pub login_field: LoginField,
    /// Error shown on the login screen.
    pub error_message: Option<String>,

    // Record view state
    /// Index into the visible records.
    pub selected_index: usize,
    pub search_query: String,
    pub form: RecordForm,
    pub status_message: Option<StatusMessage>,
    /// CSV file offered by the load prompt.
    pub load_path: String,
}

impl App {
    /// Create a new application instance.
    pub fn new(store: EquipmentStore, credentials: Credentials) -> Self {
        let form = RecordForm::blank(String::new(), today());
        let mut app = Self {
            state: AppState::Locked,
            input_mode: InputMode::Login,
            store,
            credentials,
            username_input: String::new(),
            password_input: String::new(),
            login_field: LoginField::Username,
            error_message: None,
            selected_index: 0,
            search_query: String::new(),
            form,
            status_message: None,
            load_path: String::new(),
        };
        app.form = app.blank_form();
        app
    }

    /// Prefill the load prompt with `path`.
    pub fn with_load_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_path = path.into().display().to_string();
        self
    }

    /// Material names offered by the form.
    pub fn materials(&self) -> Vec<String> {
        self.store
            .evaluator()
            .policy()
            .material_names()
            .map(str::to_string)
            .collect()
    }

    fn blank_form(&self) -> RecordForm {
        let material = self.materials().into_iter().next().unwrap_or_default();
        RecordForm::blank(material, today())
    }

    /// Check the typed credentials and open the record view on success.
    pub fn try_login(&mut self) -> bool {
        if self
            .credentials
            .authenticate(&self.username_input, &self.password_input)
        {
            tracing::info!("Login accepted for {}", self.username_input);
            self.state = AppState::Unlocked;
            self.input_mode = InputMode::Normal;
            self.error_message = None;
            self.password_input.clear();
            // The database holds the current records; a CSV is only read on request.
            if self.store.backend() == BackendKind::Database {
                self.load();
            }
            true
        } else {
            tracing::warn!("Login denied for {}", self.username_input);
            self.error_message = Some("Access Denied.".to_string());
            self.password_input.clear();
            self.login_field = LoginField::Password;
            false
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }

    /// Records passing the current search term.
    pub fn visible_records(&self) -> Vec<&EquipmentRecord> {
        self.store.visible()
    }

    pub fn selected_record(&self) -> Option<&EquipmentRecord> {
        self.visible_records().get(self.selected_index).copied()
    }

    fn clamp_selection(&mut self) {
        let count = self.visible_records().len();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }

    pub fn move_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.selected_index + 1 < self.visible_records().len() {
            self.selected_index += 1;
        }
    }

    /// Start search mode, keeping any existing term.
    pub fn start_search(&mut self) {
        self.input_mode = InputMode::Search;
    }

    /// Apply the typed term as the live filter.
    pub fn perform_search(&mut self) {
        self.store.set_filter(Some(self.search_query.as_str()));
        self.selected_index = 0;
    }

    /// Leave search mode, keeping the filter.
    pub fn finish_search(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Leave search mode and show everything again.
    pub fn exit_search(&mut self) {
        self.search_query.clear();
        self.perform_search();
        self.input_mode = InputMode::Normal;
    }

    pub fn start_add(&mut self) {
        self.form = self.blank_form();
        self.input_mode = InputMode::Form;
    }

    /// Open the form prefilled with the selected record.
    pub fn start_edit(&mut self) {
        match self.selected_record().map(RecordForm::for_record) {
            Some(form) => {
                self.form = form;
                self.input_mode = InputMode::Form;
            }
            None => self.set_error("Please select a row first"),
        }
    }

    pub fn cancel_form(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Status the form's current values would get, if its dates parse.
    pub fn form_preview(&self) -> Option<Evaluation> {
        let draft = self.form.to_draft().ok()?;
        Some(self.store.evaluator().evaluate(
            &draft.material,
            draft.first_issue_date,
            draft.last_issue_date,
        ))
    }

    /// Add or update from the form. The form stays open on failure.
    pub fn submit_form(&mut self) {
        let draft = match self.form.to_draft() {
            Ok(draft) => draft,
            Err(message) => {
                self.set_error(message);
                return;
            }
        };

        let result = match self.form.editing {
            Some(id) => self
                .store
                .update(id, &draft)
                .map(|r| format!("Updated {} ({})", r.name, r.status)),
            None => self
                .store
                .add(&draft)
                .map(|r| format!("Added {} ({})", r.name, r.status)),
        };

        match result {
            Ok(message) => {
                self.set_status(message);
                self.form = self.blank_form();
                self.input_mode = InputMode::Normal;
                self.clamp_selection();
            }
            Err(e) => self.set_error(format!("Error: {e}")),
        }
    }

    pub fn request_delete(&mut self) {
        if self.selected_record().is_some() {
            self.input_mode = InputMode::ConfirmDelete;
        } else {
            self.set_error("Please select a row first");
        }
    }

    /// Answer the delete confirmation.
    pub fn confirm_delete(&mut self, confirmed: bool) {
        self.input_mode = InputMode::Normal;
        if !confirmed {
            return;
        }
        let Some(id) = self.selected_record().map(|r| r.id) else {
            return;
        };
        match self.store.delete(id) {
            Ok(removed) => {
                self.set_status(format!("Deleted {}", removed.name));
                self.clamp_selection();
            }
            Err(e) => self.set_error(format!("Error: {e}")),
        }
    }

    pub fn save(&mut self) {
        match self.store.save_all() {
            Ok(SaveOutcome::Written(count)) => self.set_status(format!("Saved {count} records")),
            Ok(SaveOutcome::AlreadyPersisted) => {
                self.set_status("All changes are already saved to the database")
            }
            Err(e) => self.set_error(format!("Error: {e}")),
        }
    }

    /// Reload from the current repository.
    pub fn load(&mut self) {
        let result = self.store.load_all();
        self.report_load(result);
    }

    /// Ask for a CSV file on the file backend; reload directly otherwise.
    pub fn start_load(&mut self) {
        match self.store.backend() {
            BackendKind::File => self.input_mode = InputMode::LoadPath,
            BackendKind::Database => self.load(),
        }
    }

    pub fn cancel_load(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Load the file named in the prompt. Later saves go to the same file.
    pub fn load_from_path(&mut self) {
        let path = self.load_path.trim().to_string();
        if path.is_empty() {
            self.set_error("Enter a file to load");
            return;
        }
        self.input_mode = InputMode::Normal;
        tracing::info!("Loading records from {}", path);
        let result = self.store.load_from(Box::new(CsvRepository::new(&path)));
        self.load_path = path;
        self.report_load(result);
    }

    fn report_load(&mut self, result: Result<LoadReport, StoreError>) {
        match result {
            Ok(report) if report.skipped.is_empty() => {
                self.set_status(format!("Loaded {} records", report.loaded))
            }
            Ok(report) => self.set_status(format!(
                "Loaded {} records, skipped {} unreadable rows",
                report.loaded,
                report.skipped.len()
            )),
            Err(e) => self.set_error(format!("Error: {e}")),
        }
        self.selected_index = 0;
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
