use indexmap::{IndexMap, IndexSet};

use super::types::{Dataset, Row};

const SNIPPET_PREFIX: &str = "snippet.";

/// Stable external names for the columns downstream tooling relies on.
const RENAMES: &[(&str, &str)] = &[
    ("id.videoId", "yt_id"),
    ("channelTitle", "channel_name"),
    ("channelId", "channel_id"),
    ("publishedAt", "publish_date"),
];

/// External name for one flattened column.
pub fn external_column_name(name: &str) -> String {
    let stripped = name.trim_start_matches(SNIPPET_PREFIX);
    RENAMES
        .iter()
        .find(|(from, _)| *from == stripped)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or_else(|| stripped.to_string())
}

/// Strip `snippet.` prefixes and apply the fixed renames.
///
/// Columns that are absent are simply not renamed. If two columns land on the
/// same name, the first non-null value in each row wins.
pub fn rename_columns(data: Dataset) -> Dataset {
    let (columns, rows) = data.into_parts();

    let mapping: IndexMap<String, String> = columns
        .iter()
        .map(|name| (name.clone(), external_column_name(name)))
        .collect();
    let renamed: IndexSet<String> = mapping.values().cloned().collect();

    let rows = rows
        .into_iter()
        .map(|row| {
            let mut out = Row::with_capacity(row.len());
            for (name, cell) in row {
                let target = mapping
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(|| external_column_name(&name));
                match out.get_mut(&target) {
                    Some(existing) if existing.is_null() => *existing = cell,
                    Some(_) => {}
                    None => {
                        out.insert(target, cell);
                    }
                }
            }
            out
        })
        .collect::<Vec<Row>>();

    Dataset::from_parts(renamed, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::types::Cell;

    fn dataset(rows: Vec<Vec<(&str, Cell)>>) -> Dataset {
        let mut data = Dataset::new();
        for pairs in rows {
            data.push_row(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect());
        }
        data
    }

    #[test]
    fn strips_prefix_and_applies_renames() {
        let data = dataset(vec![vec![
            ("kind", Cell::from("youtube#searchResult")),
            ("id.videoId", Cell::from("abc123")),
            ("snippet.channelTitle", Cell::from("Chan")),
            ("snippet.channelId", Cell::from("UC1")),
            ("snippet.publishedAt", Cell::from("2024-01-01T00:00:00Z")),
            ("snippet.thumbnails.default.url", Cell::from("http://x")),
        ]]);
        let renamed = rename_columns(data);
        assert_eq!(
            renamed.columns().collect::<Vec<_>>(),
            vec![
                "kind",
                "yt_id",
                "channel_name",
                "channel_id",
                "publish_date",
                "thumbnails.default.url"
            ]
        );
        assert_eq!(renamed.get(0, "yt_id").as_str(), Some("abc123"));
        assert_eq!(renamed.get(0, "thumbnails.default.url").as_str(), Some("http://x"));
    }

    #[test]
    fn missing_columns_are_a_no_op() {
        let data = dataset(vec![vec![("title", Cell::from("t"))]]);
        let renamed = rename_columns(data.clone());
        assert_eq!(renamed, data);
    }

    #[test]
    fn renaming_is_idempotent() {
        let data = dataset(vec![
            vec![
                ("id.videoId", Cell::from("a")),
                ("snippet.title", Cell::from("A")),
                ("snippet.snippet.odd", Cell::Int(1)),
            ],
            vec![("id.channelId", Cell::from("c")), ("snippet.publishedAt", Cell::from("p"))],
        ]);
        let once = rename_columns(data);
        let twice = rename_columns(once.clone());
        assert_eq!(once, twice);
        assert_eq!(
            once.columns().collect::<Vec<_>>(),
            twice.columns().collect::<Vec<_>>()
        );
        assert_eq!(
            twice.columns().collect::<Vec<_>>(),
            vec!["yt_id", "title", "odd", "id.channelId", "publish_date"]
        );
        assert!(once.has_column("odd"));
    }

    #[test]
    fn collapsed_columns_keep_first_non_null() {
        let data = dataset(vec![
            vec![("title", Cell::Null), ("snippet.title", Cell::from("from snippet"))],
            vec![("title", Cell::from("top")), ("snippet.title", Cell::from("ignored"))],
        ]);
        let renamed = rename_columns(data);
        assert_eq!(renamed.columns().collect::<Vec<_>>(), vec!["title"]);
        assert_eq!(renamed.get(0, "title").as_str(), Some("from snippet"));
        assert_eq!(renamed.get(1, "title").as_str(), Some("top"));
    }
}
