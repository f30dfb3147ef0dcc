use crate::error::AppError;
use base64::Engine;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod auth;
pub mod conversations;
pub mod health;
pub mod messaging;
pub mod notifications;
pub mod users;

/// Encodes a keyset pagination cursor as an opaque token.
#[must_use]
pub(crate) fn encode_cursor(created_at: OffsetDateTime, id: Uuid) -> String {
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(format!("{}:{}", created_at.unix_timestamp_nanos(), id))
}

pub(crate) fn decode_cursor(raw: &str) -> Result<(OffsetDateTime, Uuid), AppError> {
    let invalid = || AppError::BadRequest("Invalid cursor".to_string());

    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid())?;
    let decoded = String::from_utf8(bytes).map_err(|_| invalid())?;
    let (nanos, id) = decoded.split_once(':').ok_or_else(invalid)?;

    let nanos: i128 = nanos.parse().map_err(|_| invalid())?;
    let created_at = OffsetDateTime::from_unix_timestamp_nanos(nanos).map_err(|_| invalid())?;
    let id: Uuid = id.parse().map_err(|_| invalid())?;

    Ok((created_at, id))
}

pub(crate) fn parse_cursor(raw: Option<&str>) -> Result<Option<(OffsetDateTime, Uuid)>, AppError> {
    raw.map(decode_cursor).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let ts = OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("timestamp");
        let id = Uuid::new_v4();

        let encoded = encode_cursor(ts, id);
        assert_eq!(decode_cursor(&encoded).expect("decode"), (ts, id));
    }

    #[test]
    fn test_garbage_cursor_is_rejected() {
        assert!(decode_cursor("not a cursor").is_err());
        assert!(decode_cursor("bm90OmN1cnNvcg").is_err());
    }
}
