//! Static metadata for the model variants and languages the client knows about.

use loqui_api_models::ModelVariant;

/// Longest prompt the generate form accepts, in characters.
pub const MAX_TEXT_LENGTH: usize = 5_000;

/// Variant selected before the first poll reports anything.
pub const DEFAULT_VARIANT: &str = "turbo-4bit";

/// Language used when an entry carries none.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Display facts for one model variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariantInfo {
    /// Backend identifier.
    pub id: &'static str,
    /// Short label.
    pub label: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Approximate download size.
    pub size: &'static str,
    /// Whether a language can be chosen for this variant.
    pub supports_language: bool,
    /// Whether generation needs a reference voice clip.
    pub requires_reference: bool,
}

/// Variants offered by the backend, in display order.
pub const VARIANTS: &[VariantInfo] = &[
    VariantInfo {
        id: "turbo-fp16",
        label: "Turbo FP16",
        description: "Best quality English",
        size: "~4GB",
        supports_language: false,
        requires_reference: false,
    },
    VariantInfo {
        id: "turbo-8bit",
        label: "Turbo 8-bit",
        description: "Good quality, faster",
        size: "~2GB",
        supports_language: false,
        requires_reference: false,
    },
    VariantInfo {
        id: "turbo-4bit",
        label: "Turbo 4-bit",
        description: "Fastest, smallest",
        size: "~1GB",
        supports_language: false,
        requires_reference: false,
    },
    VariantInfo {
        id: "multilingual",
        label: "Multilingual",
        description: "23 languages, requires ref audio",
        size: "~1GB",
        supports_language: true,
        requires_reference: true,
    },
    VariantInfo {
        id: "qwen-1.7b",
        label: "Qwen 1.7B",
        description: "Expressive multilingual voice",
        size: "~3.5GB",
        supports_language: true,
        requires_reference: false,
    },
];

/// Language codes and display names accepted by multilingual variants.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("ar", "Arabic"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("es", "Spanish"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("ms", "Malay"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("sv", "Swedish"),
    ("sw", "Swahili"),
    ("tr", "Turkish"),
    ("zh", "Chinese"),
];

/// Look up display facts for a variant.
#[must_use]
pub fn variant_info(variant: &ModelVariant) -> Option<&'static VariantInfo> {
    VARIANTS.iter().find(|info| info.id == variant.as_str())
}

/// Label for a variant, falling back to its identifier.
#[must_use]
pub fn variant_label(variant: &ModelVariant) -> String {
    variant_info(variant).map_or_else(|| variant.to_string(), |info| info.label.to_string())
}

/// Every catalogued variant, in display order.
#[must_use]
pub fn known_variants() -> Vec<ModelVariant> {
    VARIANTS.iter().map(|info| ModelVariant::from(info.id)).collect()
}

/// Display name for a language code.
#[must_use]
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, name)| *name)
}

/// Whether the variant takes a language parameter. Unknown variants do not.
#[must_use]
pub fn supports_language(variant: &ModelVariant) -> bool {
    variant_info(variant).is_some_and(|info| info.supports_language)
}

/// Whether the variant needs a reference clip. Unknown variants do not.
#[must_use]
pub fn requires_reference(variant: &ModelVariant) -> bool {
    variant_info(variant).is_some_and(|info| info.requires_reference)
}
