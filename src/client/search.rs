use std::str::FromStr;

use crate::models::{QrRecord, QrType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Name,
    /// Match against the URLs of a record's links.
    Url,
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(SearchMode::Name),
            "url" => Ok(SearchMode::Url),
            other => Err(format!("unknown search mode '{other}' (expected name or url)")),
        }
    }
}

/// Case-insensitive substring filter. An empty query keeps every record.
///
/// Static records carry no links and so never match in [`SearchMode::Url`].
pub fn search<'a>(records: &'a [QrRecord], query: &str, mode: SearchMode) -> Vec<&'a QrRecord> {
    if query.is_empty() {
        return records.iter().collect();
    }

    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| match mode {
            SearchMode::Name => record.name.to_lowercase().contains(&needle),
            SearchMode::Url => {
                record.kind == QrType::Dynamic
                    && record
                        .links()
                        .iter()
                        .any(|link| link.url.to_lowercase().contains(&needle))
            }
        })
        .collect()
}

/// Records split by type for display. Order within each side is preserved.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub statics: Vec<&'a QrRecord>,
    pub dynamics: Vec<&'a QrRecord>,
}

impl<'a> Partition<'a> {
    pub fn of(records: &'a [QrRecord]) -> Self {
        let (dynamics, statics) = records.iter().partition(|r| r.kind == QrType::Dynamic);
        Self { statics, dynamics }
    }

    pub fn get(&self, kind: QrType) -> &[&'a QrRecord] {
        match kind {
            QrType::Static => &self.statics,
            QrType::Dynamic => &self.dynamics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkEntry;
    use chrono::Utc;

    fn record(id: &str, name: &str, kind: QrType, links: &[(&str, &str)]) -> QrRecord {
        QrRecord {
            id: id.into(),
            short_id: format!("short-{id}"),
            owner_id: "user_1".into(),
            name: name.into(),
            kind,
            url: None,
            original_url: (kind == QrType::Static).then(|| "https://static.example".to_string()),
            links: (kind == QrType::Dynamic).then(|| {
                links
                    .iter()
                    .map(|(title, url)| LinkEntry::new(*title, *url))
                    .collect()
            }),
            qr_image: String::new(),
            scans: 0,
            created_at: Utc::now(),
        }
    }

    fn fixtures() -> Vec<QrRecord> {
        vec![
            record("1", "Team Page", QrType::Dynamic, &[("Site", "https://Team.example")]),
            record("2", "Menu", QrType::Static, &[]),
            record("3", "Conference", QrType::Dynamic, &[("A", "https://a.example"), ("B", "https://menu.example")]),
        ]
    }

    #[test]
    fn empty_query_returns_everything_in_any_mode() {
        let records = fixtures();
        for mode in [SearchMode::Name, SearchMode::Url] {
            let found: Vec<_> = search(&records, "", mode).into_iter().cloned().collect();
            assert_eq!(found, records);
        }
    }

    #[test]
    fn name_mode_is_case_insensitive() {
        let records = fixtures();
        let found = search(&records, "team", SearchMode::Name);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");
    }

    #[test]
    fn url_mode_matches_any_link_and_skips_static_records() {
        let records = fixtures();
        let found: Vec<_> = search(&records, "MENU", SearchMode::Url)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(found, ["3"]);

        for query in ["https", "static", "e"] {
            assert!(search(&records, query, SearchMode::Url)
                .iter()
                .all(|r| r.kind == QrType::Dynamic));
        }
    }

    #[test]
    fn url_mode_ignores_links_on_static_records() {
        let mut stray = record("4", "Flyer", QrType::Static, &[]);
        stray.links = Some(vec![LinkEntry::new("Old", "https://flyer.example")]);
        let records = vec![stray];
        assert!(search(&records, "flyer", SearchMode::Url).is_empty());
        assert_eq!(search(&records, "flyer", SearchMode::Name).len(), 1);
    }

    #[test]
    fn partition_splits_by_type() {
        let records = fixtures();
        let partition = Partition::of(&records);
        assert_eq!(partition.get(QrType::Dynamic).len(), 2);
        assert_eq!(partition.get(QrType::Static)[0].name, "Menu");
    }
}
