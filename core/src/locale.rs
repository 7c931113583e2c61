//! Locales and localized error messages.
//!
//! # Design
//! Message lookup walks a preference list built from the per-call override,
//! the client locale, then `es` and `en`, with duplicates removed keeping the
//! first occurrence. For each locale the caller's overrides are consulted
//! before the built-in table. Only `es` and `en` ship built-in tables and
//! generic templates; other locales rely on overrides and fall back to them.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
    Pt,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Es => "es",
            Locale::En => "en",
            Locale::Pt => "pt",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" => Ok(Locale::Es),
            "en" => Ok(Locale::En),
            "pt" => Ok(Locale::Pt),
            _ => Err(ConfigError::UnknownLocale(s.to_string())),
        }
    }
}

/// Per-locale status-message overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMessages {
    by_locale: HashMap<Locale, HashMap<u16, String>>,
}

impl ErrorMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, locale: Locale, status: u16, message: impl Into<String>) {
        self.by_locale
            .entry(locale)
            .or_default()
            .insert(status, message.into());
    }

    pub fn get(&self, locale: Locale, status: u16) -> Option<&str> {
        self.by_locale
            .get(&locale)
            .and_then(|messages| messages.get(&status))
            .map(String::as_str)
    }

    /// Overlay `other` on top of `self`.
    pub fn extend(&mut self, other: ErrorMessages) {
        for (locale, messages) in other.by_locale {
            self.by_locale.entry(locale).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_locale.values().all(HashMap::is_empty)
    }
}

/// Built-in message for `status`, if the locale ships a table.
pub fn default_message(locale: Locale, status: u16) -> Option<&'static str> {
    match locale {
        Locale::Es => spanish(status),
        Locale::En => english(status),
        Locale::Pt => None,
    }
}

fn spanish(status: u16) -> Option<&'static str> {
    let message = match status {
        400 => "La solicitud no es válida.",
        401 => "No autorizado. Inicia sesión nuevamente.",
        403 => "No tienes permisos para realizar esta acción.",
        404 => "El recurso solicitado no fue encontrado.",
        405 => "Método no permitido.",
        408 => "La solicitud tardó demasiado en responder.",
        409 => "Conflicto con el estado actual del recurso.",
        410 => "El recurso ya no está disponible.",
        413 => "La solicitud es demasiado grande.",
        415 => "Tipo de contenido no soportado.",
        422 => "Los datos enviados no son válidos.",
        429 => "Demasiadas solicitudes. Intenta de nuevo más tarde.",
        500 => "Error interno del servidor.",
        502 => "Puerta de enlace inválida.",
        503 => "Servicio no disponible.",
        504 => "Tiempo de espera de la puerta de enlace agotado.",
        _ => return None,
    };
    Some(message)
}

fn english(status: u16) -> Option<&'static str> {
    let message = match status {
        400 => "Bad request.",
        401 => "Unauthorized.",
        403 => "Forbidden.",
        404 => "Resource not found.",
        405 => "Method not allowed.",
        408 => "Request timed out.",
        409 => "Conflict.",
        410 => "Resource no longer available.",
        413 => "Payload too large.",
        415 => "Unsupported media type.",
        422 => "Unprocessable entity.",
        429 => "Too many requests.",
        500 => "Internal server error.",
        502 => "Bad gateway.",
        503 => "Service unavailable.",
        504 => "Gateway timeout.",
        _ => return None,
    };
    Some(message)
}

fn generic_template(locale: Locale) -> Option<&'static str> {
    match locale {
        Locale::Es => Some("Error de red ({status} {status_text})"),
        Locale::En => Some("Network error ({status} {status_text})"),
        Locale::Pt => None,
    }
}

/// Ordered, de-duplicated locales consulted for a message.
pub fn preference_list(call_locale: Option<Locale>, client_locale: Locale) -> Vec<Locale> {
    let mut seen = HashSet::new();
    call_locale
        .into_iter()
        .chain([client_locale, Locale::Es, Locale::En])
        .filter(|locale| seen.insert(*locale))
        .collect()
}

/// Resolve the user-facing message for a failed response.
pub fn resolve_message(
    status: u16,
    status_text: &str,
    call_locale: Option<Locale>,
    client_locale: Locale,
    overrides: &ErrorMessages,
) -> String {
    for locale in preference_list(call_locale, client_locale) {
        if let Some(message) = overrides
            .get(locale, status)
            .or_else(|| default_message(locale, status))
        {
            return message.to_string();
        }
    }

    let template = generic_template(client_locale)
        .or_else(|| generic_template(Locale::Es))
        .unwrap_or("{status} {status_text}");
    template
        .replace("{status}", &status.to_string())
        .replace("{status_text}", status_text)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_list_dedups_keeping_first() {
        assert_eq!(
            preference_list(Some(Locale::En), Locale::Es),
            vec![Locale::En, Locale::Es]
        );
        assert_eq!(preference_list(None, Locale::Es), vec![Locale::Es, Locale::En]);
        assert_eq!(
            preference_list(Some(Locale::Pt), Locale::En),
            vec![Locale::Pt, Locale::En, Locale::Es]
        );
    }

    #[test]
    fn builtin_messages_per_locale() {
        let none = ErrorMessages::new();
        assert_eq!(
            resolve_message(404, "Not Found", None, Locale::Es, &none),
            "El recurso solicitado no fue encontrado."
        );
        assert_eq!(
            resolve_message(404, "Not Found", None, Locale::En, &none),
            "Resource not found."
        );
    }

    #[test]
    fn call_locale_beats_client_locale() {
        let none = ErrorMessages::new();
        assert_eq!(
            resolve_message(404, "Not Found", Some(Locale::En), Locale::Es, &none),
            "Resource not found."
        );
    }

    #[test]
    fn override_beats_builtin() {
        let mut overrides = ErrorMessages::new();
        overrides.insert(Locale::Es, 404, "No existe.");
        assert_eq!(
            resolve_message(404, "Not Found", None, Locale::Es, &overrides),
            "No existe."
        );
        // other locales still use the built-in table
        assert_eq!(
            resolve_message(404, "Not Found", Some(Locale::En), Locale::Es, &overrides),
            "Resource not found."
        );
    }

    #[test]
    fn unlisted_locale_falls_back_to_spanish() {
        let none = ErrorMessages::new();
        assert_eq!(
            resolve_message(500, "Internal Server Error", None, Locale::Pt, &none),
            "Error interno del servidor."
        );
    }

    #[test]
    fn pt_override_is_used_first() {
        let mut overrides = ErrorMessages::new();
        overrides.insert(Locale::Pt, 404, "Recurso não encontrado.");
        assert_eq!(
            resolve_message(404, "Not Found", None, Locale::Pt, &overrides),
            "Recurso não encontrado."
        );
    }

    #[test]
    fn generic_template_uses_client_locale() {
        let none = ErrorMessages::new();
        assert_eq!(
            resolve_message(418, "I'm a teapot", Some(Locale::Es), Locale::En, &none),
            "Network error (418 I'm a teapot)"
        );
        assert_eq!(
            resolve_message(418, "I'm a teapot", None, Locale::Es, &none),
            "Error de red (418 I'm a teapot)"
        );
    }

    #[test]
    fn generic_template_defaults_to_spanish() {
        let none = ErrorMessages::new();
        assert_eq!(
            resolve_message(599, "", None, Locale::Pt, &none),
            "Error de red (599 )"
        );
    }

    #[test]
    fn locale_parses_case_insensitively() {
        assert_eq!("EN".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().is_err());
    }

    #[test]
    fn error_messages_deserialize_from_json() {
        let messages: ErrorMessages =
            serde_json::from_str(r#"{"en": {"404": "Nope."}}"#).unwrap();
        assert_eq!(messages.get(Locale::En, 404), Some("Nope."));
    }
}
