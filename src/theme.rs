use crate::config::ThemePolicy;
use crate::error::AppError;
use crate::models::ThemeResponse;
use crate::preferences::PreferenceStore;
use std::sync::Arc;
use tracing::{info, warn};

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn from_dark(dark: bool) -> Self {
        if dark { Theme::Dark } else { Theme::Light }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }
}

pub struct ThemeController {
    store: Arc<dyn PreferenceStore>,
    policy: ThemePolicy,
    current: Theme,
    stored: Option<Theme>,
}

impl ThemeController {
    /// Resolves the starting theme: a stored choice beats the OS preference.
    pub async fn init(store: Arc<dyn PreferenceStore>, policy: ThemePolicy, os_dark: bool) -> Result<Self, AppError> {
        let stored = match store.get(THEME_KEY).await? {
            Some(value) => {
                let parsed = Theme::parse(&value);
                if parsed.is_none() {
                    warn!("ignoring unknown stored theme {:?}", value);
                }
                parsed
            }
            None => None,
        };
        let current = stored.unwrap_or(Theme::from_dark(os_dark));
        info!("theme {} (os dark: {}, stored: {:?})", current.as_str(), os_dark, stored);
        Ok(Self {
            store,
            policy,
            current,
            stored,
        })
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn response(&self) -> ThemeResponse {
        ThemeResponse {
            theme: self.current.as_str(),
            dark: self.current.is_dark(),
        }
    }

    pub async fn toggle(&mut self) -> Result<Theme, AppError> {
        let next = Theme::from_dark(!self.current.is_dark());
        self.store.set(THEME_KEY, next.as_str()).await?;
        self.current = next;
        self.stored = Some(next);
        Ok(next)
    }

    pub fn on_os_preference_change(&mut self, dark: bool) -> Theme {
        let apply = match self.policy {
            ThemePolicy::FollowOs => true,
            ThemePolicy::PersistedOverrideWins => self.stored.is_none(),
        };
        if apply {
            self.current = Theme::from_dark(dark);
        }
        self.current
    }
}
