use serde::{Deserialize, Serialize};

/// Keys of the persisted client store.
pub mod keys {
    pub const USER: &str = "user";
    pub const USERNAME: &str = "username";
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const THEME: &str = "theme";
    pub const LANGUAGE: &str = "language";
    pub const LIKED_ARTICLES: &str = "likedArticles";
    pub const ONBOARDING_PREFIX: &str = "onboarding:";

    pub fn onboarding(page: &str) -> String {
        format!("{}{}", ONBOARDING_PREFIX, page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    Ru,
}
