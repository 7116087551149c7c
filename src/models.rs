use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single card as the backend serves it. Snapshot data: never mutated
/// locally, only filtered and grouped for display.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MtgCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub cmc: Option<f64>,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default)]
    pub color_identity: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub type_line: String,
    #[serde(default)]
    pub supertypes: Option<Vec<String>>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub subtypes: Option<Vec<String>>,
    pub rarity: String,
    pub set: String,
    #[serde(default)]
    pub set_name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub power: Option<String>,
    #[serde(default)]
    pub toughness: Option<String>,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub multiverseid: Option<i64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// An expansion. `cards` is only populated by the `/with-cards` endpoints;
/// a fetch always replaces the whole set, there is no partial merge.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MtgSet {
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub set_type: String,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub gatherer_code: Option<String>,
    #[serde(default)]
    pub magic_cards_info_code: Option<String>,
    #[serde(default)]
    pub border: Option<String>,
    #[serde(default)]
    pub online_only: bool,
    #[serde(default)]
    pub cards: Option<Vec<MtgCard>>,
}

/// The uniform reply shape of every `/api/mtg` endpoint. The client unwraps
/// `data` and drops the rest.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Aggregate counters from `/admin/stats`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    #[serde(default)]
    pub total_cards: u64,
    #[serde(default)]
    pub total_sets: u64,
    #[serde(default)]
    pub synced_sets: u64,
    #[serde(default)]
    pub distinct_artists: u64,
    #[serde(default)]
    pub image_stats: AdminImageStats,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AdminImageStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub downloaded: u64,
    #[serde(default)]
    pub percentage: f64,
}

/// Sync and image status for one set. `/admin/set-status/{code}` fills every
/// field; the entries of `/admin/all-sets-status` carry the `images_count` /
/// `completion_percentage` pair instead, so everything past the name is
/// optional or defaulted.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SetStatus {
    pub code: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub set_type: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub cards_synced: Option<bool>,
    #[serde(default)]
    pub cards_count: u64,
    #[serde(default)]
    pub images_downloaded: u64,
    #[serde(default)]
    pub images_percentage: f64,
    #[serde(default)]
    pub images_count: u64,
    #[serde(default)]
    pub completion_percentage: f64,
    #[serde(default)]
    pub rarity_stats: HashMap<String, u64>,
    #[serde(default)]
    pub last_sync_at: Option<String>,
}

/// Progress counters from `/api/images/stats`. The image API predates the
/// response envelope and returns this body directly.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageDownloadStats {
    #[serde(default)]
    pub total_cards: u64,
    #[serde(default)]
    pub downloaded_cards: u64,
    #[serde(default)]
    pub pending_cards: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_decodes_camel_case_fields() {
        let json = r#"{
            "id": "abc-123",
            "name": "Lightning Bolt",
            "manaCost": "{R}",
            "cmc": 1.0,
            "colors": ["R"],
            "type": "Instant",
            "rarity": "Common",
            "set": "LEA",
            "setName": "Limited Edition Alpha",
            "text": "Lightning Bolt deals 3 damage to any target.",
            "artist": "Christopher Rush",
            "imageUrl": "http://example.com/bolt.png"
        }"#;

        let card: MtgCard = serde_json::from_str(json).unwrap();
        assert_eq!(card.name, "Lightning Bolt");
        assert_eq!(card.mana_cost.as_deref(), Some("{R}"));
        assert_eq!(card.type_line, "Instant");
        assert_eq!(card.image_url.as_deref(), Some("http://example.com/bolt.png"));
        assert!(card.power.is_none());
    }

    #[test]
    fn set_decodes_without_cards() {
        let json = r#"{
            "code": "FIN",
            "name": "Magic: The Gathering—FINAL FANTASY",
            "type": "expansion",
            "releaseDate": "2025-06-13",
            "onlineOnly": false
        }"#;

        let set: MtgSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.code, "FIN");
        assert_eq!(set.release_date.as_deref(), Some("2025-06-13"));
        assert!(set.cards.is_none());
        assert!(!set.online_only);
    }

    #[test]
    fn envelope_decodes_success_and_error() {
        let ok: ApiResponse<Vec<String>> = serde_json::from_str(
            r#"{"success": true, "data": ["a"], "timestamp": "2025-06-13T10:00:00"}"#,
        )
        .unwrap();
        assert!(ok.success);
        assert_eq!(ok.data.unwrap(), vec!["a".to_string()]);

        let err: ApiResponse<Vec<String>> = serde_json::from_str(
            r#"{"success": false, "data": null, "message": "Erreur : boom"}"#,
        )
        .unwrap();
        assert!(!err.success);
        assert!(err.data.is_none());
        assert_eq!(err.message.as_deref(), Some("Erreur : boom"));
    }

    #[test]
    fn set_status_accepts_both_admin_shapes() {
        let single: SetStatus = serde_json::from_str(
            r#"{
                "code": "FIN", "name": "Final Fantasy", "type": "expansion",
                "cardsSynced": true, "cardsCount": 300,
                "imagesDownloaded": 150, "imagesPercentage": 50.0,
                "rarityStats": {"Rare": 60, "Common": 101}
            }"#,
        )
        .unwrap();
        assert_eq!(single.cards_count, 300);
        assert_eq!(single.rarity_stats.get("Rare"), Some(&60));

        let listed: SetStatus = serde_json::from_str(
            r#"{
                "code": "FIN", "name": "Final Fantasy", "type": "expansion",
                "cardsCount": 300, "imagesCount": 150, "completionPercentage": 50.0
            }"#,
        )
        .unwrap();
        assert_eq!(listed.images_count, 150);
        assert!(listed.rarity_stats.is_empty());
    }
}
