use crate::errors::DomainError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// サーバーが返す ISO-8601 日時文字列
///
/// 受け取った文字列はそのまま保持する（永続化したユーザー情報を
/// サーバー応答と完全に一致させるため）。解釈は `parse` で行う。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn from_string(value: String) -> Self {
        Self(value)
    }

    /// `toISOString()` と同じ形式（ミリ秒 + `Z`）で生成
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// RFC 3339 またはオフセットなしの日時として解釈する
    /// オフセットなしの値は UTC とみなす
    pub fn parse(&self) -> Result<DateTime<Utc>, DomainError> {
        parse_datetime(&self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from_datetime(value)
    }
}

/// 期限日などのユーザー入力を解釈する
/// `YYYY-MM-DD` のみの場合はその日の 00:00 (UTC) とする
pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>, DomainError> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(DomainError::InvalidTimestamp(input.to_string()))
}

/// `YYYY-MM-DD` 形式の日付を解釈する
pub fn parse_date(input: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_parse_rfc3339() {
        let ts = Timestamp::from_string("2024-01-01T00:00:00Z".to_string());
        let parsed = ts.parse().unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_local_datetime_without_offset() {
        let ts = Timestamp::from_string("2024-03-05T10:15:30.123456".to_string());
        let parsed = ts.parse().unwrap();
        assert_eq!(parsed.day(), 5);
        assert_eq!(parsed.hour(), 10);
        assert_eq!(parsed.minute(), 15);
    }

    #[test]
    fn test_parse_offset_is_normalized_to_utc() {
        let parsed = parse_datetime("2024-01-01T09:00:00+09:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_date_only_input() {
        let parsed = parse_datetime("2024-12-24").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 12, 24, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_from_datetime_matches_iso_string() {
        let dt = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            Timestamp::from_datetime(dt).as_str(),
            "2024-05-01T12:00:00.000Z"
        );
    }

    #[test]
    fn test_invalid_timestamp() {
        let ts = Timestamp::from_string("yesterday".to_string());
        assert!(matches!(ts.parse(), Err(DomainError::InvalidTimestamp(_))));
        assert!(parse_date("2024/01/01").is_err());
    }

    #[test]
    fn test_value_is_kept_verbatim() {
        let json = "\"2024-01-01T10:00:00\"";
        let ts: Timestamp = serde_json::from_str(json).unwrap();
        assert_eq!(serde_json::to_string(&ts).unwrap(), json);
    }
}
