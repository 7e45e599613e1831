use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const EXAMPLE_PROMPTS: [&str; 5] = [
    "of a whale leaping over the moon",
    "a majestic lion with a flowing mane, digital art",
    "landscape with a waterfall and mountains, fantasy art",
    "a princess watching a cruise ship in the distance, fantasy art",
    "colforful frosted cupcake sitting on a bakery counter",
];

/// Visual style prepended to every subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Cartoon,
    Watercolor,
    PixelArt,
    Photographic,
    Custom(String),
}

impl Default for Style {
    fn default() -> Self {
        Style::Cartoon
    }
}

impl Style {
    pub fn presets() -> [Style; 4] {
        [
            Style::Cartoon,
            Style::Watercolor,
            Style::PixelArt,
            Style::Photographic,
        ]
    }

    pub fn name(&self) -> &str {
        match self {
            Style::Cartoon => "cartoon",
            Style::Watercolor => "watercolor",
            Style::PixelArt => "pixel-art",
            Style::Photographic => "photographic",
            Style::Custom(_) => "custom",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Style::Cartoon => {
                "simple animation cartoon with a white outline utilizing earthy tones, yellow, and orange"
            }
            Style::Watercolor => "soft watercolor painting with loose brush strokes and pastel colors",
            Style::PixelArt => "retro 16-bit pixel art with a limited color palette",
            Style::Photographic => "high detail photograph with natural lighting and shallow depth of field",
            Style::Custom(text) => text,
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Style {
    type Err = String;

    /// Unknown names are taken as free-form style text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("style must not be empty".to_string());
        }
        let style = match trimmed.to_lowercase().as_str() {
            "cartoon" => Style::Cartoon,
            "watercolor" => Style::Watercolor,
            "pixel-art" | "pixelart" | "pixel" => Style::PixelArt,
            "photographic" | "photo" => Style::Photographic,
            _ => Style::Custom(trimmed.to_string()),
        };
        Ok(style)
    }
}

/// Where the subject of a prompt comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSelection {
    Random,
    Example(usize),
    Custom(String),
}

impl PromptSelection {
    /// Resolves to a subject. Out-of-range examples resolve to `None`.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        match self {
            PromptSelection::Random => Some(random_example(rng).to_string()),
            PromptSelection::Example(index) => EXAMPLE_PROMPTS.get(*index).map(|s| s.to_string()),
            PromptSelection::Custom(text) => Some(text.trim().to_string()),
        }
    }
}

/// Picks the custom text when it is non-blank, otherwise the chosen example.
pub fn choose_subject(custom: Option<&str>, base: Option<&str>) -> String {
    match custom.map(str::trim).filter(|c| !c.is_empty()) {
        Some(custom) => custom.to_string(),
        None => base.map(str::trim).unwrap_or_default().to_string(),
    }
}

pub fn random_example<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    EXAMPLE_PROMPTS.choose(rng).copied().unwrap_or(EXAMPLE_PROMPTS[0])
}

pub fn compose_prompt(style: &Style, subject: &str) -> String {
    format!("{} {}", style.text(), subject.trim())
}
