//! Wire types for the Woodpecker JSON API and the backend seam.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleSet {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: i64,
    pub fen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_move: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub puzzle_set_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moves_count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub puzzle_set_id: i64,
}

/// Response of `POST /api/sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStart {
    pub id: String,
    pub puzzle: Puzzle,
    pub score: i64,
    pub elapsed_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(rename = "move")]
    pub uci: String,
}

/// Server verdict on a submitted move. The server is trusted: the client does
/// not replay the solution to double-check `correct` or `puzzle_solved`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveVerdict {
    pub correct: bool,
    pub score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_move: Option<String>,
    #[serde(default)]
    pub puzzle_solved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub square: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Up,
    Down,
}

impl Rating {
    pub fn value(self) -> i8 {
        match self {
            Rating::Up => 1,
            Rating::Down => -1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRequest {
    pub value: i8,
}

impl From<Rating> for RatingRequest {
    fn from(rating: Rating) -> Self {
        Self {
            value: rating.value(),
        }
    }
}

/// End-of-set summary from `GET /api/sessions/{id}/summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub score: i64,
    pub elapsed_seconds: u64,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub previous_score: Option<i64>,
    #[serde(default)]
    pub previous_elapsed_seconds: Option<u64>,
    #[serde(default, deserialize_with = "optional_record_id")]
    pub performance_id: Option<String>,
}

impl Summary {
    pub fn score_delta(&self) -> Option<i64> {
        self.previous_score.map(|prev| self.score - prev)
    }

    /// Negative when this attempt was faster than the previous one.
    pub fn elapsed_delta(&self) -> Option<i64> {
        self.previous_elapsed_seconds
            .map(|prev| self.elapsed_seconds as i64 - prev as i64)
    }
}

/// One past attempt at a set, from `GET /api/performances`.
///
/// Record ids are treated as opaque text (unlike puzzle ids, which are
/// integers); a numeric id from the server is kept as its decimal string.
/// Dates are read as naive local timestamps; RFC 3339 values are converted to
/// UTC and a bare date means midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    #[serde(deserialize_with = "record_id")]
    pub id: String,
    #[serde(deserialize_with = "record_date")]
    pub date: NaiveDateTime,
    pub puzzle_set: String,
    pub score: i64,
    pub elapsed_seconds: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Text(text) => text,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn record_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_record_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn record_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
    let text = String::deserialize(deserializer)?;
    parse_record_date(&text).ok_or_else(|| de::Error::custom(format!("unrecognized date '{text}'")))
}

/// Accepts `2025-03-01T18:30:05[.ffffff]`, the same with a space separator,
/// RFC 3339 (`...Z` or an offset) and a bare `2025-03-01`.
pub fn parse_record_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// The backend puzzle bank / scorer, seen from the client.
#[allow(async_fn_in_trait)]
pub trait PuzzleApi {
    async fn puzzle_sets(&self) -> Result<Vec<PuzzleSet>, ClientError>;

    async fn start_session(&self, puzzle_set_id: i64) -> Result<SessionStart, ClientError>;

    /// `Ok(None)` means the set is exhausted.
    async fn next_puzzle(&self, session_id: &str) -> Result<Option<Puzzle>, ClientError>;

    async fn summary(&self, session_id: &str) -> Result<Summary, ClientError>;

    async fn submit_move(&self, session_id: &str, uci: &str) -> Result<MoveVerdict, ClientError>;

    async fn hint(&self, session_id: &str) -> Result<Hint, ClientError>;

    async fn rate(&self, puzzle_id: i64, rating: Rating) -> Result<(), ClientError>;

    async fn performances(&self) -> Result<Vec<PerformanceRecord>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_verdict_defaults() {
        let verdict: MoveVerdict = serde_json::from_str(r#"{"correct": true, "score": 3}"#).unwrap();
        assert!(verdict.correct);
        assert!(!verdict.puzzle_solved);
        assert!(verdict.solution.is_none());
        assert!(verdict.next_move.is_none());
    }

    #[test]
    fn test_move_request_uses_move_key() {
        let body = serde_json::to_value(MoveRequest { uci: "e7e8q".into() }).unwrap();
        assert_eq!(body, serde_json::json!({ "move": "e7e8q" }));
    }

    #[test]
    fn test_summary_deltas() {
        let summary = Summary {
            score: 8,
            elapsed_seconds: 300,
            attempts: 2,
            previous_score: Some(5),
            previous_elapsed_seconds: Some(420),
            performance_id: Some("p2".into()),
        };
        assert_eq!(summary.score_delta(), Some(3));
        assert_eq!(summary.elapsed_delta(), Some(-120));

        let first = Summary {
            previous_score: None,
            previous_elapsed_seconds: None,
            ..summary
        };
        assert_eq!(first.score_delta(), None);
        assert_eq!(first.elapsed_delta(), None);
    }

    #[test]
    fn test_performance_record_parses_naive_timestamp() {
        let record: PerformanceRecord = serde_json::from_str(
            r#"{"id":"p1","date":"2025-03-01T18:30:05.123456","puzzle_set":"Intro","score":4,"elapsed_seconds":95}"#,
        )
        .unwrap();
        assert_eq!(record.puzzle_set, "Intro");
        assert_eq!(record.date.format("%Y-%m-%d").to_string(), "2025-03-01");
    }

    #[test]
    fn test_performance_record_accepts_other_date_shapes() {
        let parse = |date: &str| {
            let body = format!(
                r#"{{"id":"p1","date":"{date}","puzzle_set":"Intro","score":4,"elapsed_seconds":95}}"#
            );
            serde_json::from_str::<PerformanceRecord>(&body).map(|r| r.date.to_string())
        };

        assert_eq!(parse("2025-03-01").unwrap(), "2025-03-01 00:00:00");
        assert_eq!(parse("2025-03-01T18:30:05Z").unwrap(), "2025-03-01 18:30:05");
        assert_eq!(parse("2025-03-01T20:30:05+02:00").unwrap(), "2025-03-01 18:30:05");
        assert_eq!(parse("2025-03-01 18:30:05").unwrap(), "2025-03-01 18:30:05");
        assert!(parse("last tuesday").is_err());
    }

    #[test]
    fn test_numeric_record_ids_are_kept_as_text() {
        let record: PerformanceRecord = serde_json::from_str(
            r#"{"id":17,"date":"2025-03-01","puzzle_set":"Intro","score":4,"elapsed_seconds":95}"#,
        )
        .unwrap();
        assert_eq!(record.id, "17");

        let summary: Summary = serde_json::from_str(
            r#"{"score":4,"elapsed_seconds":95,"performance_id":17}"#,
        )
        .unwrap();
        assert_eq!(summary.performance_id.as_deref(), Some("17"));

        let summary: Summary = serde_json::from_str(r#"{"score":4,"elapsed_seconds":95}"#).unwrap();
        assert!(summary.performance_id.is_none());
    }

    #[test]
    fn test_rating_values() {
        assert_eq!(RatingRequest::from(Rating::Up).value, 1);
        assert_eq!(RatingRequest::from(Rating::Down).value, -1);
    }
}
