//! Fluent-based translations for bot messages (English and French).

use anyhow::Result;
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::Arc;
use unic_langid::LanguageIdentifier;

const DEFAULT_LANGUAGE: &str = "en";

/// Bundled translation resources, one per supported language
const RESOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/main.ftl")),
    ("fr", include_str!("../locales/fr/main.ftl")),
];

/// The bundle type shared between tokio worker threads
type Bundle = FluentBundle<FluentResource>;

/// Localization manager for the scanner bot
pub struct LocalizationManager {
    bundles: HashMap<String, Bundle>,
}

impl LocalizationManager {
    /// Create a new localization manager with every bundled language
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (locale_str, source) in RESOURCES {
            let locale: LanguageIdentifier = locale_str.parse()?;
            let bundle = Self::create_bundle(&locale, source)?;
            bundles.insert(locale_str.to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    fn create_bundle(locale: &LanguageIdentifier, source: &str) -> Result<Bundle> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Telegram renders the Unicode isolation marks as garbage
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow::anyhow!("Invalid {} resource: {:?}", locale, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("Duplicate {} messages: {:?}", locale, errors))?;

        Ok(bundle)
    }

    /// Get a localized message in a specific language
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = match self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        {
            Some(bundle) => bundle,
            None => return format!("Missing translation: {}", key),
        };

        let Some(msg) = bundle.get_message(key) else {
            return format!("Missing translation: {}", key);
        };
        let Some(pattern) = msg.value() else {
            return format!("Missing value for key: {}", key);
        };

        let fluent_args = args.map(|args| {
            FluentArgs::from_iter(args.iter().map(|(k, v)| (*k, FluentValue::from(*v))))
        });

        let mut errors = vec![];
        bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors)
            .into_owned()
    }

    /// Get a localized message with arguments in a specific language
    pub fn get_message_with_args_in_language(
        &self,
        key: &str,
        language: &str,
        args: &[(&str, &str)],
    ) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }

    /// Pick the bundle for a Telegram language code ("fr-FR" -> "fr"), English otherwise
    pub fn detect_language(&self, language_code: Option<&str>) -> String {
        language_code
            .and_then(|code| code.split(['-', '_']).next())
            .map(str::to_ascii_lowercase)
            .filter(|lang| self.is_language_supported(lang))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }
}

/// Build the shared manager used by all handlers
pub fn create_localization_manager() -> Result<Arc<LocalizationManager>> {
    Ok(Arc::new(LocalizationManager::new()?))
}

/// Localized message in the user's language
pub fn t_lang(manager: &LocalizationManager, key: &str, language_code: Option<&str>) -> String {
    let language = manager.detect_language(language_code);
    manager.get_message_in_language(key, &language, None)
}

/// Localized message with arguments in the user's language
pub fn t_args_lang(
    manager: &LocalizationManager,
    key: &str,
    args: &[(&str, &str)],
    language_code: Option<&str>,
) -> String {
    let language = manager.detect_language(language_code);
    manager.get_message_with_args_in_language(key, &language, args)
}
