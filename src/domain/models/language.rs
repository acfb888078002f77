#[cfg(test)]
#[path = "language_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

/// Application-wide language selection, serialized as the short code the
/// reply backend expects (`en`, `ta`, ...).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    EnumVariantNames,
    strum::Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Ta,
    Te,
    Kn,
    Ml,
    Bn,
    Gu,
    Mr,
    Ur,
}

impl Language {
    pub fn parse(text: &str) -> Option<Language> {
        let code = text.trim().to_lowercase();
        return Language::iter().find(|e| return e.to_string() == code);
    }

    /// BCP-47 tag consumed by speech capture and synthesis.
    pub fn locale(&self) -> &'static str {
        match self {
            Language::En => return "en-IN",
            Language::Hi => return "hi-IN",
            Language::Ta => return "ta-IN",
            Language::Te => return "te-IN",
            Language::Kn => return "kn-IN",
            Language::Ml => return "ml-IN",
            Language::Bn => return "bn-IN",
            Language::Gu => return "gu-IN",
            Language::Mr => return "mr-IN",
            Language::Ur => return "ur-IN",
        }
    }

    pub fn native_name(&self) -> &'static str {
        match self {
            Language::En => return "English",
            Language::Hi => return "हिंदी",
            Language::Ta => return "தமிழ்",
            Language::Te => return "తెలుగు",
            Language::Kn => return "ಕನ್ನಡ",
            Language::Ml => return "മലയാളം",
            Language::Bn => return "বাংলা",
            Language::Gu => return "ગુજરાતી",
            Language::Mr => return "मराठी",
            Language::Ur => return "اردو",
        }
    }
}

/// Maps any application language code to a locale tag. Unknown codes degrade
/// to `en-IN` so an unsupported dialect never blocks capture or playback.
pub fn resolve_locale(app_language: &str) -> &'static str {
    return Language::parse(app_language)
        .unwrap_or_default()
        .locale();
}
