use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body for POST /api/checkin. Photo and signature are data URIs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    #[serde(alias = "participant_id")]
    pub participant_id: Option<i64>,
    pub photo: Option<String>,
    pub signature: Option<String>,
    #[serde(alias = "checkin_by")]
    pub checkin_by: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub participant_id: i64,
    pub checkin_at: DateTime<Utc>,
    pub photo_key: String,
    pub signature_key: String,
}

/// Values written to a participant row when checking in.
#[derive(Debug, Clone)]
pub struct CheckInRecord<'a> {
    pub checkin_by: &'a str,
    pub note: Option<&'a str>,
    pub photo_key: &'a str,
    pub signature_key: &'a str,
}
