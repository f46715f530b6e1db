//! Static language catalog

use serde::Serialize;

use crate::core::models::AUTO_DETECT;

/// A catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
}

/// Every language the client offers, in display order
pub const LANGUAGES: &[Language] = &[
    Language { code: "en", name: "English" },
    Language { code: "es", name: "Spanish" },
    Language { code: "fr", name: "French" },
    Language { code: "de", name: "German" },
    Language { code: "it", name: "Italian" },
    Language { code: "pt", name: "Portuguese" },
    Language { code: "ru", name: "Russian" },
    Language { code: "ja", name: "Japanese" },
    Language { code: "ko", name: "Korean" },
    Language { code: "zh", name: "Chinese (Simplified)" },
    Language { code: "zh-TW", name: "Chinese (Traditional)" },
    Language { code: "ar", name: "Arabic" },
    Language { code: "hi", name: "Hindi" },
    Language { code: "ta", name: "Tamil" },
    Language { code: "te", name: "Telugu" },
    Language { code: "ml", name: "Malayalam" },
    Language { code: "kn", name: "Kannada" },
    Language { code: "bn", name: "Bengali" },
    Language { code: "th", name: "Thai" },
    Language { code: "vi", name: "Vietnamese" },
    Language { code: "tr", name: "Turkish" },
    Language { code: "nl", name: "Dutch" },
    Language { code: "pl", name: "Polish" },
    Language { code: "uk", name: "Ukrainian" },
    Language { code: "he", name: "Hebrew" },
    Language { code: "fa", name: "Persian" },
];

/// Targets offered as one-keystroke shortcuts
pub const QUICK_TARGETS: &[&str] = &["es", "fr", "de", "zh", "ja", "hi", "ta", "ar"];

/// Recognition language used when the source is auto-detect
const DEFAULT_RECOGNITION_LANG: &str = "en-US";

/// Find a catalog entry by code
pub fn find(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code == code)
}

/// Display name for a code, falling back to the code itself
pub fn display_name(code: &str) -> &str {
    if code == AUTO_DETECT {
        return "Auto Detect";
    }
    find(code).map(|l| l.name).unwrap_or(code)
}

/// Whether `code` may be used as a translation target
pub fn is_valid_target(code: &str) -> bool {
    find(code).is_some()
}

/// Whether `code` may be used as a translation source
pub fn is_valid_source(code: &str) -> bool {
    code == AUTO_DETECT || find(code).is_some()
}

/// Short uppercase label for a quick-pick target, e.g. `TAM` for Tamil
pub fn quick_label(code: &str) -> Option<String> {
    find(code).map(|l| l.name.chars().take(3).collect::<String>().to_uppercase())
}

/// Language hint handed to speech synthesis
pub fn speech_lang_hint(target: &str) -> &str {
    match target {
        "zh" => "zh-CN",
        other => other,
    }
}

/// Language hint handed to speech recognition
pub fn recognition_lang(source: &str) -> &str {
    if source == AUTO_DETECT {
        DEFAULT_RECOGNITION_LANG
    } else {
        source
    }
}
