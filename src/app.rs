use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clipboard::{self, ClipboardSink};
use crate::config::AppConfig;
use crate::utm::presets::{presets_for, Preset};
use crate::utm::{compose, InvalidBaseUrl, ParameterSet, UtmParam};

/// Status messages disappear after this long
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    BaseUrl,
    Param(UtmParam),
}

impl Field {
    /// Focus order, top to bottom
    pub const ALL: [Field; 6] = [
        Field::BaseUrl,
        Field::Param(UtmParam::Source),
        Field::Param(UtmParam::Medium),
        Field::Param(UtmParam::Campaign),
        Field::Param(UtmParam::Term),
        Field::Param(UtmParam::Content),
    ];

    fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::BaseUrl => "Base URL",
            Field::Param(UtmParam::Source) => "Source",
            Field::Param(UtmParam::Medium) => "Medium",
            Field::Param(UtmParam::Campaign) => "Campaign",
            Field::Param(UtmParam::Term) => "Term",
            Field::Param(UtmParam::Content) => "Content",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Field::BaseUrl => "https://example.com",
            Field::Param(UtmParam::Source) => "google, newsletter...",
            Field::Param(UtmParam::Medium) => "cpc, social...",
            Field::Param(UtmParam::Campaign) => "spring_sale",
            Field::Param(UtmParam::Term) => "running shoes",
            Field::Param(UtmParam::Content) => "banner_top",
        }
    }

    /// Base URL and utm_source are the fields the form marks as required
    pub fn is_required(self) -> bool {
        matches!(self, Field::BaseUrl | Field::Param(UtmParam::Source))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Suggestions,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

pub struct App {
    pub field: Field,
    pub popup: Popup,

    // Form values, as typed
    pub base_url: String,
    pub params: [String; 5],

    pub config: AppConfig,

    // Suggestion picker for the focused field
    pub picker: Vec<Preset>,
    pub picker_selected: usize,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_kind: StatusKind,
    pub status_message_time: Option<Instant>,
    pub status_timeout: Duration,

    pub should_quit: bool,

    clipboard: Arc<dyn ClipboardSink>,
}

impl App {
    pub fn new(config: AppConfig, clipboard: Arc<dyn ClipboardSink>) -> Self {
        Self {
            field: Field::BaseUrl,
            popup: Popup::None,

            base_url: config.default_base_url.clone(),
            params: Default::default(),

            config,

            picker: Vec::new(),
            picker_selected: 0,

            status_message: None,
            status_kind: StatusKind::Info,
            status_message_time: None,
            status_timeout: STATUS_TIMEOUT,

            should_quit: false,

            clipboard,
        }
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, kind: StatusKind, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_kind = kind;
        self.status_message_time = Some(Instant::now());
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::BaseUrl => &self.base_url,
            Field::Param(p) => &self.params[p as usize],
        }
    }

    fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::BaseUrl => &mut self.base_url,
            Field::Param(p) => &mut self.params[p as usize],
        }
    }

    /// Snapshot of the parameter fields
    pub fn parameter_set(&self) -> ParameterSet {
        UtmParam::ALL
            .into_iter()
            .map(|p| (p, self.params[p as usize].as_str()))
            .collect()
    }

    /// Recompute the URL from the current field values
    pub fn composed(&self) -> Result<String, InvalidBaseUrl> {
        compose(&self.base_url, &self.parameter_set())
    }

    /// Suggestions available for a field (built-ins plus config extras)
    pub fn suggestions(&self, field: Field) -> Vec<Preset> {
        match field {
            Field::BaseUrl => Vec::new(),
            Field::Param(p) => presets_for(p, self.config.extra_presets(p)),
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle popups first
        match self.popup {
            Popup::None => self.handle_form_key(key).await,
            Popup::Suggestions => {
                self.handle_picker_key(key);
                Ok(())
            }
            Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Enter | KeyCode::Char('?')) {
                    self.popup = Popup::None;
                }
                Ok(())
            }
        }
    }

    async fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        // AltGr arrives as Ctrl+Alt on Windows terminals and must still type
        let shortcut = key.modifiers.contains(KeyModifiers::CONTROL)
            && !key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => self.should_quit = true,

            // Navigation between fields
            KeyCode::Tab | KeyCode::Down => self.field = self.field.next(),
            KeyCode::BackTab | KeyCode::Up => self.field = self.field.prev(),

            KeyCode::Enter => self.copy_url().await?,
            KeyCode::Char('y') if shortcut => self.copy_url().await?,

            KeyCode::Char('r') if shortcut => self.reset_form(),
            KeyCode::Char('u') if shortcut => self.value_mut(self.field).clear(),
            KeyCode::Char(' ') if shortcut => self.open_picker(),
            KeyCode::F(4) => self.open_picker(),
            KeyCode::F(1) => self.popup = Popup::Help,

            KeyCode::Backspace => {
                self.value_mut(self.field).pop();
            }
            KeyCode::Char(c) if !shortcut => {
                if !c.is_control() {
                    self.value_mut(self.field).push(c);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn open_picker(&mut self) {
        let suggestions = self.suggestions(self.field);
        if suggestions.is_empty() {
            self.set_status(StatusKind::Info, format!("No suggestions for {}", self.field.label()));
            return;
        }

        // Start on the current value if it is one of the suggestions
        let current = self.value(self.field);
        self.picker_selected = suggestions
            .iter()
            .position(|p| p.value == current)
            .unwrap_or(0);
        self.picker = suggestions;
        self.popup = Popup::Suggestions;
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.close_picker(),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                if !self.picker.is_empty() {
                    self.picker_selected = (self.picker_selected + 1) % self.picker.len();
                }
            }
            KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => {
                if !self.picker.is_empty() {
                    self.picker_selected =
                        (self.picker_selected + self.picker.len() - 1) % self.picker.len();
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.apply_suggestion(),
            _ => {}
        }
    }

    /// Pre-fill the focused field with the selected suggestion
    fn apply_suggestion(&mut self) {
        if let Some(preset) = self.picker.get(self.picker_selected).cloned() {
            *self.value_mut(self.field) = preset.value;
        }
        self.close_picker();
    }

    fn close_picker(&mut self) {
        self.popup = Popup::None;
        self.picker.clear();
        self.picker_selected = 0;
    }

    /// Copy the composed URL. Nothing touches the clipboard when the base URL
    /// does not parse.
    pub async fn copy_url(&mut self) -> Result<()> {
        let url = match self.composed() {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Copy refused: {}", e);
                self.set_status(StatusKind::Error, "Check the base URL, e.g. https://example.com");
                return Ok(());
            }
        };

        match clipboard::copy(self.clipboard.clone(), url.clone()).await {
            Ok(()) => {
                tracing::info!("Copied {}", url);
                self.set_status(StatusKind::Success, "Copied to clipboard");
                if self.config.notifications {
                    tokio::task::spawn_blocking(move || {
                        crate::notify::notify_quiet("UTM link copied", &url)
                    });
                }
            }
            Err(e) => self.set_status(StatusKind::Error, format!("Could not copy: {}", e)),
        }
        Ok(())
    }

    /// Back to the configured base URL with every parameter cleared
    pub fn reset_form(&mut self) {
        self.base_url = self.config.default_base_url.clone();
        self.params = Default::default();
        self.field = Field::BaseUrl;
        self.set_status(StatusKind::Info, "Form cleared");
    }

    /// Expire the status message
    pub fn tick(&mut self) {
        if let Some(since) = self.status_message_time {
            if since.elapsed() >= self.status_timeout {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::testing::FakeClipboard;

    fn quiet_config() -> AppConfig {
        AppConfig {
            notifications: false,
            ..AppConfig::default()
        }
    }

    fn app_with(clipboard: Arc<FakeClipboard>) -> App {
        App::new(quiet_config(), clipboard)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_typing_into_fields() {
        let mut app = app_with(Arc::new(FakeClipboard::default()));
        assert_eq!(app.composed().unwrap(), "https://example.com/");

        app.handle_key(key(KeyCode::Tab)).await.unwrap();
        type_text(&mut app, "google").await;
        app.handle_key(key(KeyCode::Down)).await.unwrap();
        type_text(&mut app, "cpx").await;
        app.handle_key(key(KeyCode::Backspace)).await.unwrap();
        type_text(&mut app, "c").await;

        assert_eq!(
            app.composed().unwrap(),
            "https://example.com/?utm_source=google&utm_medium=cpc"
        );
    }

    #[tokio::test]
    async fn test_focus_wraps() {
        let mut app = app_with(Arc::new(FakeClipboard::default()));
        app.handle_key(key(KeyCode::BackTab)).await.unwrap();
        assert_eq!(app.field, Field::Param(UtmParam::Content));
        app.handle_key(key(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.field, Field::BaseUrl);
    }

    #[tokio::test]
    async fn test_copy_writes_composed_url() {
        let fake = Arc::new(FakeClipboard::default());
        let mut app = app_with(fake.clone());
        app.params[UtmParam::Campaign as usize] = "spring_sale".to_string();

        app.handle_key(key(KeyCode::Enter)).await.unwrap();

        assert_eq!(fake.writes(), vec!["https://example.com/?utm_campaign=spring_sale".to_string()]);
        assert_eq!(app.status_kind, StatusKind::Success);
    }

    #[tokio::test]
    async fn test_invalid_url_never_reaches_clipboard() {
        let fake = Arc::new(FakeClipboard::default());
        let mut app = app_with(fake.clone());
        app.handle_key(ctrl('u')).await.unwrap();
        type_text(&mut app, "not a url").await;

        assert!(app.composed().is_err());
        app.handle_key(ctrl('y')).await.unwrap();

        assert!(fake.writes().is_empty());
        assert_eq!(app.status_kind, StatusKind::Error);

        // Fixing the input makes copy work again
        app.handle_key(ctrl('u')).await.unwrap();
        type_text(&mut app, "https://shop.example.com").await;
        app.copy_url().await.unwrap();
        assert_eq!(fake.writes(), vec!["https://shop.example.com/".to_string()]);
    }

    #[tokio::test]
    async fn test_clipboard_failure_keeps_url() {
        let mut app = app_with(Arc::new(FakeClipboard::failing()));
        app.params[UtmParam::Source as usize] = "vk".to_string();

        app.copy_url().await.unwrap();

        assert_eq!(app.status_kind, StatusKind::Error);
        assert!(app.status_message.as_deref().unwrap_or("").contains("no display"));
        assert_eq!(app.composed().unwrap(), "https://example.com/?utm_source=vk");
    }

    #[tokio::test]
    async fn test_suggestion_prefills_field() {
        let mut app = app_with(Arc::new(FakeClipboard::default()));
        app.handle_key(key(KeyCode::Tab)).await.unwrap();
        app.handle_key(key(KeyCode::F(4))).await.unwrap();
        assert_eq!(app.popup, Popup::Suggestions);

        app.handle_key(key(KeyCode::Down)).await.unwrap();
        app.handle_key(key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.popup, Popup::None);
        assert_eq!(app.value(app.field), "yandex");

        // Still editable after pre-fill
        type_text(&mut app, "_direct").await;
        assert_eq!(app.value(Field::Param(UtmParam::Source)), "yandex_direct");
    }

    #[tokio::test]
    async fn test_picker_includes_config_extras() {
        let mut config = quiet_config();
        config.extra_campaigns.push(Preset {
            value: "summer".to_string(),
            label: "Summer".to_string(),
        });
        let app = App::new(config, Arc::new(FakeClipboard::default()));

        let campaigns = app.suggestions(Field::Param(UtmParam::Campaign));
        assert_eq!(campaigns.last().map(|p| p.value.as_str()), Some("summer"));
        assert!(app.suggestions(Field::BaseUrl).is_empty());
    }

    #[tokio::test]
    async fn test_no_picker_for_term() {
        let mut app = app_with(Arc::new(FakeClipboard::default()));
        app.field = Field::Param(UtmParam::Term);
        app.handle_key(ctrl(' ')).await.unwrap();
        assert_eq!(app.popup, Popup::None);
        assert_eq!(app.status_kind, StatusKind::Info);
    }

    #[tokio::test]
    async fn test_reset_form() {
        let mut app = app_with(Arc::new(FakeClipboard::default()));
        app.base_url = "https://other.example".to_string();
        app.params[UtmParam::Term as usize] = "shoes".to_string();
        app.field = Field::Param(UtmParam::Term);

        app.handle_key(ctrl('r')).await.unwrap();

        assert_eq!(app.base_url, "https://example.com");
        assert!(app.parameter_set().is_empty());
        assert_eq!(app.field, Field::BaseUrl);
    }

    #[tokio::test]
    async fn test_help_and_quit() {
        let mut app = app_with(Arc::new(FakeClipboard::default()));
        app.handle_key(key(KeyCode::F(1))).await.unwrap();
        assert_eq!(app.popup, Popup::Help);

        // Esc closes the popup before it quits
        app.handle_key(key(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.popup, Popup::None);
        assert!(!app.should_quit);

        app.handle_key(key(KeyCode::Esc)).await.unwrap();
        assert!(app.should_quit);
    }

    #[test]
    fn test_status_expires() {
        let mut app = app_with(Arc::new(FakeClipboard::default()));
        app.set_status(StatusKind::Info, "hello");
        app.tick();
        assert!(app.status_message.is_some());

        app.status_timeout = Duration::ZERO;
        app.tick();
        assert!(app.status_message.is_none());
        assert!(app.status_message_time.is_none());
    }

    #[tokio::test]
    async fn test_altgr_characters_are_typed() {
        let mut app = app_with(Arc::new(FakeClipboard::default()));
        app.handle_key(ctrl('u')).await.unwrap();
        type_text(&mut app, "https://user").await;

        let altgr = KeyModifiers::CONTROL | KeyModifiers::ALT;
        app.handle_key(KeyEvent::new(KeyCode::Char('@'), altgr)).await.unwrap();
        type_text(&mut app, "example.com").await;

        assert_eq!(app.base_url, "https://user@example.com");
        assert_eq!(app.composed().unwrap(), "https://example.com/");

        // Ctrl+Alt+U types a character rather than clearing the field
        app.handle_key(KeyEvent::new(KeyCode::Char('u'), altgr)).await.unwrap();
        assert_eq!(app.base_url, "https://user@example.comu");
    }
}
