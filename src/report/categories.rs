use std::collections::HashSet;

pub const FALLBACK_CATEGORY: &str = "Altro";

const ANTICIPAZIONI: &str = "anticipazioni";
const IN_SALA: &str = "in-sala";

/// Ordered mapping from editorial category to the path segments that
/// identify it. The first category with a matching segment wins.
#[derive(Debug, Clone)]
pub struct CategoryMap {
    entries: Vec<(String, HashSet<String>)>,
}

/// Production keyword table, in match priority order.
const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    ("News", &["latest-news", "focus-italia"]),
    (
        "Recensioni",
        &[
            "review",
            "netflix-film",
            "sky-film",
            "disney-film",
            "mubi",
            "mubi-film",
            "live-streaming-on-demand",
            "approfondimenti",
            "streaming",
        ],
    ),
    ("In Sala", &["in-sala"]),
    ("Cult Movies", &["cult-movie"]),
    ("Animazione", &["animazione"]),
    ("Approfondimento", &["approfondimento"]),
    ("Festival di Cinema", &["festival-di-cinema"]),
    ("Trailers", &["trailers"]),
    (
        "Serie TV",
        &[
            "serie-tv",
            "netflix-serie-tv",
            "prime-video-serietv",
            "sky-serie-tv",
            "disney-serietv",
            "paramount-serie-tv",
            "appletv-serietv",
            "tim-vision-serie-tv",
        ],
    ),
    ("Guide e Film da Vedere", &["film-da-vedere"]),
    ("Speciali e Magazine", &["magazine-2", "taxidrivers-magazine"]),
    ("Rubriche", &["rubriche"]),
    ("Interviste", &["interviews"]),
];

impl Default for CategoryMap {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES)
    }
}

impl CategoryMap {
    pub fn new(entries: &[(&str, &[&str])]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|(name, keywords)| {
                    (
                        name.to_string(),
                        keywords.iter().map(|k| k.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maps a URL or path to its editorial category.
    ///
    /// An `anticipazioni` segment overrides any matched category, and
    /// reviews or trailers whose path mentions `in-sala` anywhere get a
    /// combined label. A whole `in-sala` segment already matches `In Sala`,
    /// which is checked before `Trailers`.
    pub fn map_category(&self, path: &str) -> String {
        let segments: HashSet<&str> = path.split('/').collect();

        for (category, keywords) in &self.entries {
            if !keywords.iter().any(|k| segments.contains(k.as_str())) {
                continue;
            }
            if segments.contains(ANTICIPAZIONI) {
                return "Anticipazioni".to_string();
            }
            match category.as_str() {
                "Recensioni" if path.contains(IN_SALA) => {
                    return "Recensioni / In Sala".to_string();
                }
                "Trailers" if path.contains(IN_SALA) => {
                    return "Trailers / In Sala".to_string();
                }
                _ => return category.clone(),
            }
        }

        FALLBACK_CATEGORY.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_category_simple_match() {
        let map = CategoryMap::default();
        assert_eq!(map.map_category("/latest-news/some-article"), "News");
        assert_eq!(map.map_category("https://example.com/serie-tv/show/"), "Serie TV");
    }

    #[test]
    fn test_map_category_unknown_is_altro() {
        let map = CategoryMap::default();
        assert_eq!(map.map_category("/about-us"), FALLBACK_CATEGORY);
        assert_eq!(map.map_category(""), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_map_category_anticipazioni_overrides() {
        let map = CategoryMap::default();
        assert_eq!(
            map.map_category("/latest-news/anticipazioni/film"),
            "Anticipazioni"
        );
    }

    #[test]
    fn test_map_category_in_sala_combinations() {
        let map = CategoryMap::default();
        assert_eq!(
            map.map_category("/review/in-sala/film"),
            "Recensioni / In Sala"
        );
        assert_eq!(
            map.map_category("/trailers/film-in-sala-oggi"),
            "Trailers / In Sala"
        );
        assert_eq!(map.map_category("/in-sala/film"), "In Sala");
    }

    #[test]
    fn test_in_sala_segment_wins_over_trailers() {
        let map = CategoryMap::default();
        assert_eq!(map.map_category("/trailers/in-sala/film"), "In Sala");
    }

    #[test]
    fn test_map_category_first_match_in_order_wins() {
        let map = CategoryMap::default();
        assert_eq!(map.map_category("/interviews/latest-news/x"), "News");
    }

    #[test]
    fn test_segment_match_is_exact() {
        let map = CategoryMap::default();
        assert_eq!(map.map_category("/reviews-archive/x"), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_custom_map() {
        let entries: &[(&str, &[&str])] = &[("Docs", &["docs"])];
        let map = CategoryMap::new(entries);
        assert_eq!(map.len(), 1);
        assert_eq!(map.map_category("/docs/intro"), "Docs");
        assert_eq!(map.map_category("/latest-news/x"), FALLBACK_CATEGORY);
    }
}
