use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of locales the floor applications ship dictionaries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    Pl,
    De,
    En,
    Tl,
    Uk,
    Be,
}

impl Locale {
    pub const ALL: [Locale; 6] = [
        Locale::Pl,
        Locale::De,
        Locale::En,
        Locale::Tl,
        Locale::Uk,
        Locale::Be,
    ];

    /// Resolves a locale code, falling back to the default locale for
    /// anything outside the supported set.
    pub fn resolve(code: &str) -> Self {
        let code = code.trim().to_ascii_lowercase();
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        Self::ALL
            .into_iter()
            .find(|locale| locale.code() == primary)
            .unwrap_or_default()
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Pl => "pl",
            Self::De => "de",
            Self::En => "en",
            Self::Tl => "tl",
            Self::Uk => "uk",
            Self::Be => "be",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
