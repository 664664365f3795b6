use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// How the user arrived at a page, ignoring qualifiers.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TransitionCore {
    Link,
    Typed,
    AutoBookmark,
    AutoSubframe,
    ManualSubframe,
    Generated,
    AutoToplevel,
    FormSubmit,
    Reload,
    Keyword,
    KeywordGenerated,
}

impl TransitionCore {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionCore::Link => "link",
            TransitionCore::Typed => "typed",
            TransitionCore::AutoBookmark => "auto_bookmark",
            TransitionCore::AutoSubframe => "auto_subframe",
            TransitionCore::ManualSubframe => "manual_subframe",
            TransitionCore::Generated => "generated",
            TransitionCore::AutoToplevel => "auto_toplevel",
            TransitionCore::FormSubmit => "form_submit",
            TransitionCore::Reload => "reload",
            TransitionCore::Keyword => "keyword",
            TransitionCore::KeywordGenerated => "keyword_generated",
        }
    }
}

/// Core transition type plus qualifier bits.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct PageTransition {
    core: TransitionCore,
    qualifiers: u32,
}

impl PageTransition {
    pub const FORWARD_BACK: u32 = 0x0100_0000;
    pub const FROM_ADDRESS_BAR: u32 = 0x0200_0000;
    pub const HOME_PAGE: u32 = 0x0400_0000;
    pub const FROM_API: u32 = 0x0800_0000;
    pub const CHAIN_START: u32 = 0x1000_0000;
    pub const CHAIN_END: u32 = 0x2000_0000;
    pub const CLIENT_REDIRECT: u32 = 0x4000_0000;
    pub const SERVER_REDIRECT: u32 = 0x8000_0000;

    const ALL_QUALIFIERS: u32 = 0xFF00_0000;

    pub const fn new(core: TransitionCore) -> Self {
        Self { core, qualifiers: 0 }
    }

    pub fn core(&self) -> TransitionCore {
        self.core
    }

    pub fn qualifiers(&self) -> u32 {
        self.qualifiers
    }

    pub fn with_qualifier(mut self, qualifier: u32) -> Self {
        self.qualifiers |= qualifier & Self::ALL_QUALIFIERS;
        self
    }

    pub fn has_qualifier(&self, qualifier: u32) -> bool {
        self.qualifiers & qualifier == qualifier
    }

    pub fn is_back_forward(&self) -> bool {
        self.has_qualifier(Self::FORWARD_BACK)
    }

    pub fn is_redirect(&self) -> bool {
        self.qualifiers & (Self::CLIENT_REDIRECT | Self::SERVER_REDIRECT) != 0
    }

    pub fn is_main_frame(&self) -> bool {
        !matches!(
            self.core,
            TransitionCore::AutoSubframe | TransitionCore::ManualSubframe
        )
    }
}

impl Default for PageTransition {
    fn default() -> Self {
        Self::new(TransitionCore::Link)
    }
}

impl From<TransitionCore> for PageTransition {
    fn from(core: TransitionCore) -> Self {
        Self::new(core)
    }
}

impl fmt::Display for PageTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.core.as_str())?;
        const NAMES: [(u32, &str); 8] = [
            (PageTransition::FORWARD_BACK, "back_forward"),
            (PageTransition::FROM_ADDRESS_BAR, "from_address_bar"),
            (PageTransition::HOME_PAGE, "home_page"),
            (PageTransition::FROM_API, "from_api"),
            (PageTransition::CHAIN_START, "chain_start"),
            (PageTransition::CHAIN_END, "chain_end"),
            (PageTransition::CLIENT_REDIRECT, "client_redirect"),
            (PageTransition::SERVER_REDIRECT, "server_redirect"),
        ];
        for (bit, name) in NAMES {
            if self.has_qualifier(bit) {
                write!(f, "|{name}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for PageTransition {
    type Err = CoreError;

    /// Accepts a core name, optionally followed by `|qualifier` segments.
    /// `back_forward` alone is shorthand for `link|back_forward`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.split('|').map(|part| part.trim().to_ascii_lowercase());
        let head = parts
            .next()
            .filter(|part| !part.is_empty())
            .ok_or_else(|| CoreError::new("empty page transition"))?;

        let mut transition = match head.as_str() {
            "back_forward" => {
                PageTransition::new(TransitionCore::Link).with_qualifier(Self::FORWARD_BACK)
            }
            other => PageTransition::new(parse_core(other)?),
        };

        for qualifier in parts {
            let bit = match qualifier.as_str() {
                "back_forward" => Self::FORWARD_BACK,
                "from_address_bar" => Self::FROM_ADDRESS_BAR,
                "home_page" => Self::HOME_PAGE,
                "from_api" => Self::FROM_API,
                "chain_start" => Self::CHAIN_START,
                "chain_end" => Self::CHAIN_END,
                "client_redirect" => Self::CLIENT_REDIRECT,
                "server_redirect" => Self::SERVER_REDIRECT,
                other => {
                    return Err(CoreError::new(format!(
                        "unknown transition qualifier: {other}"
                    )))
                }
            };
            transition = transition.with_qualifier(bit);
        }
        Ok(transition)
    }
}

fn parse_core(raw: &str) -> Result<TransitionCore, CoreError> {
    let core = match raw {
        "link" => TransitionCore::Link,
        "typed" => TransitionCore::Typed,
        "auto_bookmark" => TransitionCore::AutoBookmark,
        "auto_subframe" => TransitionCore::AutoSubframe,
        "manual_subframe" => TransitionCore::ManualSubframe,
        "generated" => TransitionCore::Generated,
        "auto_toplevel" => TransitionCore::AutoToplevel,
        "form_submit" => TransitionCore::FormSubmit,
        "reload" => TransitionCore::Reload,
        "keyword" => TransitionCore::Keyword,
        "keyword_generated" => TransitionCore::KeywordGenerated,
        other => return Err(CoreError::new(format!("unknown page transition: {other}"))),
    };
    Ok(core)
}
