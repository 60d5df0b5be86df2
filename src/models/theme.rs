use serde::Serialize;

/// Cosmetic descriptor for a group. Carries no access-control meaning.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GroupTheme {
    pub themed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Palette>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<ThemeImages>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Palette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
    pub background: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ThemeImages {
    pub hero: &'static str,
    pub pattern: &'static str,
    pub monogram: &'static str,
}
