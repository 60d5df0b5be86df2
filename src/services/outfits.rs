//! Consolidates a group's events into outfit-guidance tiles.
//!
//! Some ceremonies run back to back without a change of clothes, so they share
//! one tile. Which pairs fold together depends on the audience; the rules live
//! in `MERGE_RULES` rather than in per-group branches.

use crate::models::{
    event::Event,
    group::AccessGroup::{self, Bride, Friends, Groom, Guests, Invitees},
    outfit::{OutfitGuide, OutfitTile},
};

struct MergeRule {
    groups: &'static [AccessGroup],
    /// All of these must be present for the rule to fire.
    requires: &'static [&'static str],
    /// Folded into the tile as well, when present.
    absorbs: &'static [&'static str],
    tile: &'static str,
}

const MERGE_RULES: &[MergeRule] = &[
    MergeRule {
        groups: &[Bride],
        requires: &["baraat-welcome", "family-reception"],
        absorbs: &["phere"],
        tile: "baraat-welcome-phere",
    },
    MergeRule {
        groups: &[Groom],
        requires: &["baraat", "family-reception"],
        absorbs: &["phere"],
        tile: "baraat-phere",
    },
    MergeRule {
        groups: &[Friends, Invitees, Guests],
        requires: &["baraat", "phere"],
        absorbs: &[],
        tile: "baraat-phere",
    },
];

const RECEPTION_LAST: &[AccessGroup] = &[Friends, Guests];
const RECEPTION_ID: &str = "reception";

const GUIDES: &[OutfitGuide] = &[
    OutfitGuide {
        id: "haldi",
        title: "Haldi",
        recommendation: "Yellow or white cotton you are happy to throw away afterwards. Skip the silk.",
        colors: &["Marigold yellow", "White", "Saffron"],
    },
    OutfitGuide {
        id: "mehndi",
        title: "Mehndi",
        recommendation: "Light, flowy outfits in greens and pastels. Short sleeves make henna easier.",
        colors: &["Leaf green", "Mint", "Blush pink"],
    },
    OutfitGuide {
        id: "sangeet",
        title: "Sangeet",
        recommendation: "Dress to dance. Sequins, shimmer and anything that twirls.",
        colors: &["Royal blue", "Silver", "Fuchsia"],
    },
    OutfitGuide {
        id: "baraat-welcome-phere",
        title: "Baraat Welcome & Phere",
        recommendation: "One outfit carries you from the gate to the mandap. Heavier silk or brocade works well for the evening.",
        colors: &["Red", "Maroon", "Gold"],
    },
    OutfitGuide {
        id: "baraat-phere",
        title: "Baraat & Phere",
        recommendation: "Festive traditional wear that can handle an hour of dancing before a long ceremony.",
        colors: &["Jewel tones", "Emerald", "Gold"],
    },
    OutfitGuide {
        id: "family-reception",
        title: "Family Lunch",
        recommendation: "Smart casual Indian wear. Daytime fabrics, lighter colours.",
        colors: &["Peach", "Ivory"],
    },
    OutfitGuide {
        id: "reception",
        title: "Reception",
        recommendation: "Cocktail or Indo-western. This is the one night for a gown or a suit.",
        colors: &["Black", "Champagne", "Navy"],
    },
];

pub fn guide(id: &str) -> Option<&'static OutfitGuide> {
    GUIDES.iter().find(|g| g.id == id)
}

/// Tile ids with the catalog events each one covers, in display order.
pub fn merge_events(events: &[&Event], group: AccessGroup) -> Vec<(String, Vec<String>)> {
    let mut slots: Vec<(String, Vec<String>)> = events
        .iter()
        .map(|e| (e.id.clone(), vec![e.id.clone()]))
        .collect();

    for rule in MERGE_RULES.iter().filter(|r| r.groups.contains(&group)) {
        let present = |id: &str| slots.iter().any(|(slot, _)| slot == id);
        if !rule.requires.iter().all(|id| present(*id)) {
            continue;
        }
        let folded: Vec<&str> = rule
            .requires
            .iter()
            .chain(rule.absorbs)
            .copied()
            .filter(|id| present(*id))
            .collect();

        let mut merged = Vec::with_capacity(slots.len());
        let mut inserted = false;
        let mut covered = Vec::new();
        for (slot, _) in &slots {
            if folded.contains(&slot.as_str()) {
                covered.push(slot.clone());
            }
        }
        for (slot, sources) in slots {
            if folded.contains(&slot.as_str()) {
                if !inserted {
                    merged.push((rule.tile.to_string(), covered.clone()));
                    inserted = true;
                }
            } else {
                merged.push((slot, sources));
            }
        }
        slots = merged;
    }

    if RECEPTION_LAST.contains(&group) {
        if let Some(pos) = slots.iter().position(|(slot, _)| slot == RECEPTION_ID) {
            let reception = slots.remove(pos);
            slots.push(reception);
        }
    }

    slots
}

/// Merged tiles with their guidance. Tiles without a guide are not shown.
pub fn outfit_tiles(events: &[&Event], group: AccessGroup) -> Vec<OutfitTile> {
    merge_events(events, group)
        .into_iter()
        .filter_map(|(id, sources)| {
            let guide = guide(&id)?;
            Some(OutfitTile {
                id,
                title: guide.title.to_string(),
                recommendation: guide.recommendation.to_string(),
                colors: guide.colors.iter().map(|c| c.to_string()).collect(),
                events: sources,
            })
        })
        .collect()
}
