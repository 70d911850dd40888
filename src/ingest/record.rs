use serde::Deserialize;
use serde_json::Value;

use super::error::IngestError;

/// Top-level shape of the scraped-movie document and of the bulk-insert
/// request body: `{ "movies": [ { country, movie: {..}, rank }, .. ] }`.
#[derive(Debug, Deserialize)]
pub struct RawBatch {
    #[serde(default)]
    pub movies: Vec<RawEntry>,
}

/// One import entry as scraped. The nested movie payload stays a raw JSON
/// value until normalization so an empty `{}` can be rejected explicitly.
#[derive(Debug, Deserialize)]
pub struct RawEntry {
    pub country: String,
    #[serde(default)]
    pub movie: Value,
    #[serde(default)]
    pub rank: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawMovie {
    title: Option<String>,
    release_year: Option<String>,
    #[serde(default)]
    score: Value,
    summary: Option<String>,
    image_url: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    actors: Vec<String>,
}

/// Typed, validated import record ready for reference resolution.
#[derive(Debug, Clone)]
pub struct NormalizedRecord {
    pub country: String,
    pub title: Option<String>,
    pub release_year: Option<String>,
    pub score: f64,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    pub rank: Option<i64>,
}

/// Validate and coerce one raw entry. Pure transformation, no side effects.
pub fn normalize(entry: &RawEntry) -> Result<NormalizedRecord, IngestError> {
    let payload = match &entry.movie {
        Value::Object(map) if !map.is_empty() => map,
        _ => {
            return Err(IngestError::MalformedRecord(format!(
                "movie payload missing or empty for country '{}'",
                entry.country
            )))
        }
    };

    let movie: RawMovie = serde_json::from_value(Value::Object(payload.clone())).map_err(|e| {
        IngestError::MalformedRecord(format!(
            "movie payload for country '{}' does not match the expected shape: {e}",
            entry.country
        ))
    })?;

    let score = coerce_score(&movie.score)?;

    Ok(NormalizedRecord {
        country: entry.country.clone(),
        title: movie.title,
        release_year: movie.release_year,
        score,
        summary: movie.summary,
        image_url: movie.image_url,
        genres: keep_named(movie.genres),
        actors: keep_named(movie.actors),
        rank: entry.rank,
    })
}

fn keep_named(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

/// Score coercion: missing/falsy/"null" becomes 0.0, numbers and numeric
/// strings parse, anything else is a malformed record. The stored value is
/// always a finite non-negative float.
fn coerce_score(raw: &Value) -> Result<f64, IngestError> {
    let parsed = match raw {
        Value::Null => 0.0,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                0.0
            } else {
                trimmed.parse::<f64>().map_err(|_| {
                    IngestError::MalformedRecord(format!("score '{trimmed}' is not numeric"))
                })?
            }
        }
        other => {
            return Err(IngestError::MalformedRecord(format!(
                "score has unsupported JSON type: {other}"
            )))
        }
    };

    if parsed.is_finite() && parsed >= 0.0 {
        Ok(parsed)
    } else {
        Ok(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(country: &str, movie: Value) -> RawEntry {
        RawEntry {
            country: country.to_string(),
            movie,
            rank: Some(1),
        }
    }

    #[test]
    fn rejects_missing_movie_payload() {
        let err = normalize(&entry("US", Value::Null)).unwrap_err();
        assert!(matches!(err, IngestError::MalformedRecord(_)));
    }

    #[test]
    fn rejects_empty_movie_payload() {
        let err = normalize(&entry("US", json!({}))).unwrap_err();
        assert!(matches!(err, IngestError::MalformedRecord(_)));
    }

    #[test]
    fn coerces_null_string_score_to_zero() {
        let rec = normalize(&entry("KR", json!({"title": "A", "score": "null"}))).unwrap();
        assert_eq!(rec.score, 0.0);
    }

    #[test]
    fn coerces_missing_score_to_zero() {
        let rec = normalize(&entry("KR", json!({"title": "A"}))).unwrap();
        assert_eq!(rec.score, 0.0);
    }

    #[test]
    fn passes_numeric_score_through() {
        let rec = normalize(&entry("KR", json!({"title": "A", "score": 7.5}))).unwrap();
        assert_eq!(rec.score, 7.5);

        let rec = normalize(&entry("KR", json!({"title": "A", "score": "8.1"}))).unwrap();
        assert_eq!(rec.score, 8.1);
    }

    #[test]
    fn rejects_non_numeric_score() {
        let err = normalize(&entry("KR", json!({"title": "A", "score": "great"}))).unwrap_err();
        assert!(matches!(err, IngestError::MalformedRecord(_)));
    }

    #[test]
    fn negative_score_coerces_to_zero() {
        let rec = normalize(&entry("KR", json!({"title": "A", "score": -3.0}))).unwrap();
        assert_eq!(rec.score, 0.0);
    }

    #[test]
    fn optional_text_passes_through() {
        let rec = normalize(&entry(
            "South Korea",
            json!({
                "title": "A",
                "release_year": "2020",
                "score": "null",
                "summary": "s",
                "image_url": "u",
                "genres": ["Drama", ""],
                "actors": ["X"]
            }),
        ))
        .unwrap();
        assert_eq!(rec.title.as_deref(), Some("A"));
        assert_eq!(rec.release_year.as_deref(), Some("2020"));
        assert_eq!(rec.summary.as_deref(), Some("s"));
        assert_eq!(rec.image_url.as_deref(), Some("u"));
        // empty genre names are dropped
        assert_eq!(rec.genres, vec!["Drama".to_string()]);
        assert_eq!(rec.actors, vec!["X".to_string()]);
        assert_eq!(rec.rank, Some(1));
    }
}
