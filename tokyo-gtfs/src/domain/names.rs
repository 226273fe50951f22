//! Multi-language display text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Languages carried by the exported feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "zh-Hans")]
    SimplifiedChinese,
    #[serde(rename = "zh-Hant")]
    TraditionalChinese,
}

impl Language {
    /// All languages, in export order.
    pub const ALL: [Language; 5] = [
        Language::Japanese,
        Language::English,
        Language::Korean,
        Language::SimplifiedChinese,
        Language::TraditionalChinese,
    ];

    /// BCP 47 code as used by GTFS translations.
    pub fn code(self) -> &'static str {
        match self {
            Language::Japanese => "ja",
            Language::English => "en",
            Language::Korean => "ko",
            Language::SimplifiedChinese => "zh-Hans",
            Language::TraditionalChinese => "zh-Hant",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A name given in several languages.
///
/// Missing languages are empty strings, matching how the sources omit
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Names {
    #[serde(default)]
    pub ja: String,
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub ko: String,
    #[serde(default, rename = "zh-Hans")]
    pub zh_hans: String,
    #[serde(default, rename = "zh-Hant")]
    pub zh_hant: String,
}

impl Names {
    /// Names with only Japanese and English set.
    pub fn ja_en(ja: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            ja: ja.into(),
            en: en.into(),
            ..Self::default()
        }
    }

    /// Returns the text for a language.
    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::Japanese => &self.ja,
            Language::English => &self.en,
            Language::Korean => &self.ko,
            Language::SimplifiedChinese => &self.zh_hans,
            Language::TraditionalChinese => &self.zh_hant,
        }
    }

    /// Sets the text for a language.
    pub fn set(&mut self, lang: Language, text: impl Into<String>) {
        let slot = match lang {
            Language::Japanese => &mut self.ja,
            Language::English => &mut self.en,
            Language::Korean => &mut self.ko,
            Language::SimplifiedChinese => &mut self.zh_hans,
            Language::TraditionalChinese => &mut self.zh_hant,
        };
        *slot = text.into();
    }

    /// Feed-level name: Japanese followed by English.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokyo_gtfs::domain::Names;
    ///
    /// assert_eq!(Names::ja_en("東京", "Tokyo").default_name(), "東京 Tokyo");
    /// assert_eq!(Names::ja_en("東京", "").default_name(), "東京");
    /// ```
    pub fn default_name(&self) -> String {
        if self.en.is_empty() {
            self.ja.clone()
        } else {
            format!("{} {}", self.ja, self.en)
        }
    }

    /// Languages with non-empty text.
    pub fn present(&self) -> impl Iterator<Item = (Language, &str)> {
        Language::ALL
            .into_iter()
            .map(|lang| (lang, self.get(lang)))
            .filter(|(_, text)| !text.is_empty())
    }
}
