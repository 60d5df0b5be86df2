use serde::Serialize;

/// Dress-code advice for one display tile (a single event or a merged pair).
#[derive(Debug, Clone)]
pub struct OutfitGuide {
    pub id: &'static str,
    pub title: &'static str,
    pub recommendation: &'static str,
    pub colors: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutfitTile {
    pub id: String,
    pub title: String,
    pub recommendation: String,
    pub colors: Vec<String>,
    /// Catalog events folded into this tile.
    pub events: Vec<String>,
}
