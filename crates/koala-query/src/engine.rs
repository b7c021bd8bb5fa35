//! Selector engines addressable with a `name=` prefix.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// A selector engine.
///
/// The set is closed: a part of a selector chain names one of these with a
/// `name=` prefix, or gets the configured default (normally [`Engine::Css`]).
/// Each engine comes in a piercing and a light flavour; only the piercing
/// flavour descends into open shadow roots.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
pub enum Engine {
    /// `css=`: CSS selectors, piercing open shadow roots.
    #[default]
    #[strum(serialize = "css")]
    #[serde(rename = "css")]
    Css,

    /// `css:light=`: CSS selectors over the light tree only.
    #[strum(serialize = "css:light")]
    #[serde(rename = "css:light")]
    CssLight,

    /// `text=`: elements by their own text, piercing open shadow roots.
    #[strum(serialize = "text")]
    #[serde(rename = "text")]
    Text,

    /// `text:light=`: elements by their own text, light tree only.
    #[strum(serialize = "text:light")]
    #[serde(rename = "text:light")]
    TextLight,
}

impl Engine {
    /// Whether matching descends into open shadow roots.
    #[must_use]
    pub const fn pierces_shadow(self) -> bool {
        matches!(self, Self::Css | Self::Text)
    }

    /// Whether the clause is text rather than a CSS selector list.
    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text | Self::TextLight)
    }
}
