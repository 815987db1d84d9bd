use chrono::{Days, NaiveDate};
use compact_str::{CompactString, format_compact};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Commit totals for one week, as returned by GitHub
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyBucket {
    /// Start of the week, unix seconds
    #[serde(default)]
    pub w: i64,
    /// Additions
    #[serde(default)]
    pub a: u64,
    /// Deletions
    #[serde(default)]
    pub d: u64,
    /// Commits
    #[serde(default)]
    pub c: u64,
}

/// Per-author commit statistics exposed by the contributor stats endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorStat {
    pub author: Option<CompactString>,
    pub total_commits: u64,
    pub weeks: Vec<WeeklyBucket>,
}

#[derive(Debug, Deserialize)]
struct ContributorStatDto {
    #[serde(default)]
    author: Option<AuthorDto>,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    weeks: Vec<WeeklyBucket>,
}

#[derive(Debug, Deserialize)]
struct AuthorDto {
    login: Option<CompactString>,
}

impl From<ContributorStatDto> for ContributorStat {
    fn from(dto: ContributorStatDto) -> Self {
        Self {
            author: dto.author.and_then(|a| a.login),
            total_commits: dto.total,
            weeks: dto.weeks,
        }
    }
}

impl ContributorStat {
    /// Has an author and at least one commit
    pub fn is_active(&self) -> bool {
        self.total_commits > 0 && self.author.as_ref().is_some_and(|a| !a.is_empty())
    }
}

/// Keep only active contributors, preserving order
pub fn retain_active(stats: Vec<ContributorStat>) -> Vec<ContributorStat> {
    stats.into_iter().filter(ContributorStat::is_active).collect()
}

/// Project GitHub's `/stats/contributors` payload onto active contributors.
///
/// Entries that do not match the expected shape are skipped; a payload that
/// is not an array yields no contributors.
pub fn contributor_stats_from_payload(payload: Value) -> Vec<ContributorStat> {
    let Value::Array(entries) = payload else {
        return Vec::new();
    };

    let total = entries.len();
    let stats = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<ContributorStatDto>(entry) {
            Ok(dto) => Some(ContributorStat::from(dto)),
            Err(e) => {
                debug!(error = %e, "Skipping malformed contributor stat");
                None
            },
        })
        .collect();

    let active = retain_active(stats);
    debug!(total, active = active.len(), "Filtered contributor stats");
    active
}

/// Dependabot alerts wrapper; alerts are passed through untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityAlertList {
    pub alerts: Vec<Value>,
}

impl SecurityAlertList {
    /// Alerts from a 200 payload; anything but an array counts as none
    pub fn from_payload(payload: Value) -> Self {
        match payload {
            Value::Array(alerts) => Self { alerts },
            _ => Self::default(),
        }
    }
}

/// Search qualifier string for repositories created in the year before `today`
pub fn popular_repos_query(today: NaiveDate, language: Option<&str>) -> CompactString {
    let since = today.checked_sub_days(Days::new(365)).unwrap_or(today);
    let mut query = format_compact!("created:>={}", since.format("%Y-%m-%d"));

    if let Some(language) = language.map(str::trim).filter(|l| !l.is_empty()) {
        query.push_str(&format_compact!(" language:{}", language));
    }

    query
}

/// `items` of a search response, or empty when absent
pub fn search_items(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) => match map.remove("items") {
            Some(items @ Value::Array(_)) => items,
            _ => Value::Array(Vec::new()),
        },
        _ => Value::Array(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn stat(author: Option<&str>, total: u64) -> ContributorStat {
        ContributorStat {
            author: author.map(Into::into),
            total_commits: total,
            weeks: Vec::new(),
        }
    }

    #[test]
    fn drops_contributors_without_author_or_commits() {
        let payload = json!([
            {"author": {"login": "octocat"}, "total": 12, "weeks": [{"w": 1, "a": 2, "d": 3, "c": 4}]},
            {"author": null, "total": 5, "weeks": []},
            {"author": {"login": "ghost"}, "total": 0, "weeks": []},
            {"total": 3},
            {"author": {"login": "hubot"}, "total": 1}
        ]);

        let stats = contributor_stats_from_payload(payload);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].author.as_deref(), Some("octocat"));
        assert_eq!(stats[0].total_commits, 12);
        assert_eq!(stats[0].weeks, vec![WeeklyBucket { w: 1, a: 2, d: 3, c: 4 }]);
        assert_eq!(stats[1].author.as_deref(), Some("hubot"));
        assert!(stats.iter().all(|s| s.total_commits > 0 && s.author.is_some()));
    }

    #[test]
    fn filtering_is_idempotent() {
        let stats = vec![
            stat(Some("a"), 3),
            stat(None, 9),
            stat(Some("b"), 0),
            stat(Some(""), 2),
            stat(Some("c"), 1),
        ];

        let once = retain_active(stats);
        let twice = retain_active(once.clone());

        assert_eq!(once, twice);
        assert_eq!(once, vec![stat(Some("a"), 3), stat(Some("c"), 1)]);
    }

    #[test]
    fn non_array_payload_yields_no_contributors() {
        assert!(contributor_stats_from_payload(json!({})).is_empty());
        assert!(contributor_stats_from_payload(Value::Null).is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let payload = json!([
            {"author": {"login": "octocat"}, "total": "many"},
            {"author": {"login": "hubot"}, "total": 2}
        ]);

        let stats = contributor_stats_from_payload(payload);
        assert_eq!(stats, vec![stat(Some("hubot"), 2)]);
    }

    #[test]
    fn stat_serializes_with_public_field_names() {
        let value = serde_json::to_value(stat(Some("octocat"), 2)).unwrap();
        assert_eq!(value, json!({"author": "octocat", "total_commits": 2, "weeks": []}));
    }

    #[test]
    fn popular_query_covers_the_last_year() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(popular_repos_query(today, None), "created:>=2023-03-02");
    }

    #[test]
    fn popular_query_appends_language_only_when_given() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        assert_eq!(
            popular_repos_query(today, Some("Rust")),
            "created:>=2024-06-15 language:Rust"
        );
        assert_eq!(popular_repos_query(today, Some("  ")), "created:>=2024-06-15");
    }

    #[test]
    fn security_alerts_keep_array_payload_only() {
        let alerts = SecurityAlertList::from_payload(json!([{"number": 1}]));
        assert_eq!(alerts.alerts, vec![json!({"number": 1})]);
        assert!(SecurityAlertList::from_payload(json!({"message": "x"})).alerts.is_empty());
        assert_eq!(
            serde_json::to_value(SecurityAlertList::default()).unwrap(),
            json!({"alerts": []})
        );
    }

    #[test]
    fn search_items_defaults_to_empty() {
        assert_eq!(search_items(json!({"items": [{"id": 1}]})), json!([{"id": 1}]));
        assert_eq!(search_items(json!({"total_count": 0})), json!([]));
        assert_eq!(search_items(json!([])), json!([]));
    }
}
