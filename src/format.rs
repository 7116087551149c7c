use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::MtgCard;

/// Display color for a rarity. Unknown rarities fall back to gray.
pub fn rarity_color(rarity: &str) -> &'static str {
    match rarity {
        "Common" => "#1a1a1a",
        "Uncommon" => "#c0c0c0",
        "Rare" => "#ffd700",
        "Mythic Rare" => "#ff4500",
        "Special" => "#800080",
        "Basic Land" => "#228b22",
        _ => "#666666",
    }
}

/// Display color for a type line. Substring checks in a fixed order, first
/// match wins ("Artifact Creature" is a creature).
pub fn type_color(type_line: &str) -> &'static str {
    if type_line.contains("Creature") {
        "#2ecc71"
    } else if type_line.contains("Sorcery") || type_line.contains("Instant") {
        "#e74c3c"
    } else if type_line.contains("Enchantment") {
        "#9b59b6"
    } else if type_line.contains("Artifact") {
        "#95a5a6"
    } else if type_line.contains("Land") {
        "#8b4513"
    } else if type_line.contains("Planeswalker") {
        "#f39c12"
    } else {
        "#34495e"
    }
}

/// Human-readable mana cost: drops the brace delimiters and swaps the
/// single-letter color codes for glyphs. Single pass over the input, so a
/// substituted glyph is never re-scanned.
pub fn format_mana_cost(mana_cost: Option<&str>) -> String {
    let Some(cost) = mana_cost else {
        return String::new();
    };

    cost.chars()
        .filter(|&c| c != '{' && c != '}')
        .map(|c| match c {
            'W' => '⚪',
            'U' => '🔵',
            'B' => '⚫',
            'R' => '🔴',
            'G' => '🟢',
            'C' => '◇',
            other => other,
        })
        .collect()
}

/// Case-insensitive substring filter over name, type, rarity, and (when
/// present) rules text and artist. A blank search term is the identity.
pub fn filter_cards(cards: &[MtgCard], search: &str) -> Vec<MtgCard> {
    let term = search.trim().to_lowercase();
    if term.is_empty() {
        return cards.to_vec();
    }

    cards
        .iter()
        .filter(|card| {
            card.name.to_lowercase().contains(&term)
                || card.type_line.to_lowercase().contains(&term)
                || card.rarity.to_lowercase().contains(&term)
                || card
                    .text
                    .as_ref()
                    .is_some_and(|t| t.to_lowercase().contains(&term))
                || card
                    .artist
                    .as_ref()
                    .is_some_and(|a| a.to_lowercase().contains(&term))
        })
        .cloned()
        .collect()
}

/// Buckets cards by rarity, keeping encounter order within each bucket.
/// Cards without a rarity land under "Unknown".
pub fn group_by_rarity(cards: &[MtgCard]) -> HashMap<String, Vec<MtgCard>> {
    let mut groups: HashMap<String, Vec<MtgCard>> = HashMap::new();
    for card in cards {
        let rarity = if card.rarity.is_empty() {
            "Unknown".to_owned()
        } else {
            card.rarity.clone()
        };
        groups.entry(rarity).or_default().push(card.clone());
    }
    groups
}

/// Renders a backend `YYYY-MM-DD` date as `DD/MM/YYYY`. Anything that does
/// not parse is returned unchanged.
pub fn format_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%d/%m/%Y").to_string(),
        Err(_) => date.to_owned(),
    }
}

/// Rounds to the nearest whole number and appends a percent sign.
pub fn format_percentage(value: f64) -> String {
    format!("{}%", value.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(name: &str, type_line: &str, rarity: &str) -> MtgCard {
        MtgCard {
            id: name.to_owned(),
            name: name.to_owned(),
            mana_cost: None,
            cmc: None,
            colors: None,
            color_identity: None,
            type_line: type_line.to_owned(),
            supertypes: None,
            types: None,
            subtypes: None,
            rarity: rarity.to_owned(),
            set: "TST".to_owned(),
            set_name: None,
            text: None,
            artist: None,
            number: None,
            power: None,
            toughness: None,
            layout: None,
            multiverseid: None,
            image_url: None,
        }
    }

    #[test]
    fn rarity_colors() {
        assert_eq!(rarity_color("Mythic Rare"), "#ff4500");
        assert_eq!(rarity_color("Common"), "#1a1a1a");
        assert_eq!(rarity_color("Nonexistent"), "#666666");
    }

    #[test]
    fn type_color_first_match_wins() {
        assert_eq!(type_color("Artifact Creature — Golem"), "#2ecc71");
        assert_eq!(type_color("Artifact"), "#95a5a6");
        assert_eq!(type_color("Basic Land — Island"), "#8b4513");
        assert_eq!(type_color("Tribal Instant"), "#e74c3c");
        assert_eq!(type_color("Conspiracy"), "#34495e");
    }

    #[test]
    fn mana_cost_strips_braces_and_substitutes_once() {
        assert_eq!(format_mana_cost(Some("{2}{W}{W}")), "2⚪⚪");
        assert_eq!(format_mana_cost(Some("{W/U}")), "⚪/🔵");
        assert_eq!(format_mana_cost(Some("{X}{B}{R}")), "X⚫🔴");
        assert_eq!(format_mana_cost(None), "");
    }

    #[test]
    fn blank_search_is_identity() {
        let cards = vec![card("Bolt", "Instant", "Common"), card("Bear", "Creature", "Common")];
        assert_eq!(filter_cards(&cards, ""), cards);
        assert_eq!(filter_cards(&cards, "   "), cards);
    }

    #[test]
    fn search_matches_all_text_fields() {
        let mut with_text = card("Counterspell", "Instant", "Common");
        with_text.text = Some("Counter target spell.".to_owned());
        with_text.artist = Some("Mark Poole".to_owned());
        let cards = vec![
            card("Grizzly Bears", "Creature — Bear", "Common"),
            with_text.clone(),
        ];

        assert_eq!(filter_cards(&cards, "BEAR").len(), 1);
        assert_eq!(filter_cards(&cards, "instant"), vec![with_text.clone()]);
        assert_eq!(filter_cards(&cards, "poole"), vec![with_text.clone()]);
        assert_eq!(filter_cards(&cards, "target spell"), vec![with_text]);
        assert_eq!(filter_cards(&cards, "common").len(), 2);
        assert!(filter_cards(&cards, "planeswalker").is_empty());
    }

    #[test]
    fn grouping_partitions_without_loss() {
        let cards = vec![
            card("a", "Instant", "Common"),
            card("b", "Creature", "Rare"),
            card("c", "Sorcery", "Common"),
            card("d", "Land", ""),
        ];
        let groups = group_by_rarity(&cards);

        let total: usize = groups.values().map(Vec::len).sum();
        assert_eq!(total, cards.len());
        assert_eq!(
            groups["Common"].iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
        assert_eq!(groups["Unknown"].len(), 1);
        assert_eq!(groups["Unknown"][0].name, "d");
    }

    #[test]
    fn date_formatting_recovers_on_bad_input() {
        assert_eq!(format_date("2025-06-13"), "13/06/2025");
        assert_eq!(format_date("not-a-date"), "not-a-date");
        assert_eq!(format_date(""), "");
    }

    #[test]
    fn percentage_rounds_to_whole() {
        assert_eq!(format_percentage(49.6), "50%");
        assert_eq!(format_percentage(0.0), "0%");
        assert_eq!(format_percentage(100.0), "100%");
    }
}
