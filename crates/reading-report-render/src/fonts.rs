//! Font identities and declarative fallback chains.

use serde::{Deserialize, Serialize};

use reading_report::LangMode;

/// Logical font faces used by the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontId {
    /// Arabic body face.
    NaskhRegular,
    /// Arabic heading face.
    NaskhBold,
    /// Latin body face.
    SansRegular,
    /// Latin heading face.
    SansBold,
}

impl FontId {
    pub const ALL: [FontId; 4] = [
        FontId::NaskhRegular,
        FontId::NaskhBold,
        FontId::SansRegular,
        FontId::SansBold,
    ];

    /// Stable name used on the command line and in previews.
    pub fn name(self) -> &'static str {
        match self {
            Self::NaskhRegular => "naskh",
            Self::NaskhBold => "naskh-bold",
            Self::SansRegular => "sans",
            Self::SansBold => "sans-bold",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|font| font.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn is_bold(self) -> bool {
        matches!(self, Self::NaskhBold | Self::SansBold)
    }
}

/// Candidate lists tried in order when a requested face is unavailable.
///
/// The last candidate is used unconditionally when nothing earlier resolves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontFallbacks {
    chains: Vec<(FontId, Vec<FontId>)>,
}

impl Default for FontFallbacks {
    fn default() -> Self {
        Self {
            chains: vec![
                (
                    FontId::NaskhBold,
                    vec![FontId::NaskhBold, FontId::NaskhRegular, FontId::SansBold],
                ),
                (
                    FontId::NaskhRegular,
                    vec![FontId::NaskhRegular, FontId::SansRegular],
                ),
                (FontId::SansBold, vec![FontId::SansBold, FontId::SansRegular]),
                (FontId::SansRegular, vec![FontId::SansRegular]),
            ],
        }
    }
}

impl FontFallbacks {
    /// Replace the candidate chain for `requested`.
    pub fn with_chain(mut self, requested: FontId, candidates: Vec<FontId>) -> Self {
        self.chains.retain(|(font, _)| *font != requested);
        self.chains.push((requested, candidates));
        self
    }

    pub fn candidates(&self, requested: FontId) -> &[FontId] {
        self.chains
            .iter()
            .find(|(font, _)| *font == requested)
            .map(|(_, chain)| chain.as_slice())
            .unwrap_or(&[FontId::SansRegular])
    }

    /// First candidate for which `is_available` holds.
    pub fn resolve(&self, requested: FontId, is_available: impl Fn(FontId) -> bool) -> FontId {
        let chain = self.candidates(requested);
        if let Some(font) = chain.iter().copied().find(|font| is_available(*font)) {
            log::debug!("font {:?} resolved to {:?}", requested, font);
            return font;
        }
        let last = chain.last().copied().unwrap_or(requested);
        log::warn!(
            "no candidate for font {:?} is available, using {:?}",
            requested,
            last
        );
        last
    }
}

/// Body and heading faces for one language mode after fallback resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedFonts {
    pub regular: FontId,
    pub bold: FontId,
}

impl ResolvedFonts {
    pub(crate) fn resolve(
        fallbacks: &FontFallbacks,
        mode: LangMode,
        is_available: impl Fn(FontId) -> bool,
    ) -> Self {
        let (regular, bold) = match mode {
            LangMode::Arabic => (FontId::NaskhRegular, FontId::NaskhBold),
            LangMode::English => (FontId::SansRegular, FontId::SansBold),
        };
        Self {
            regular: fallbacks.resolve(regular, &is_available),
            bold: fallbacks.resolve(bold, &is_available),
        }
    }
}
