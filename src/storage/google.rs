//! Google Sheets and Drive backend
//!
//! Authenticates as a service account (RS256-signed JWT exchanged for an
//! OAuth access token), locates the spreadsheet by name through Drive, and
//! appends rows through the Sheets values API. Payment proofs are stored in
//! Drive with a resumable upload.
//!
//! A handle carries the access token it was created with and reports the
//! token's expiry (less a safety margin), so a cached handle is replaced
//! before its token is rejected.

use crate::config::{Secrets, ServiceAccountKey};
use crate::core::error::{ConnectivityError, ServiceKind, UploadError};
use crate::core::row::CellValue;
use crate::core::service::{BlobStore, NewObject, ServiceConnector, SheetError, Spreadsheet};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{StatusCode, Url, header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: u64 = 3600;
/// Handles are retired this long before their token expires
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DRIVE_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Errors raised while talking to the Google APIs
#[derive(Debug, Error)]
pub enum GoogleApiError {
    #[error("invalid service-account key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("spreadsheet '{0}' not found or not shared with the service account")]
    SpreadsheetNotFound(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Bearer token and the instant it should no longer be used
#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Deadline for a token requested at `requested_at`
fn token_deadline(requested_at: Instant, expires_in: Option<u64>) -> Instant {
    let lifetime = expires_in
        .unwrap_or(TOKEN_LIFETIME_SECS)
        .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);
    requested_at + Duration::from_secs(lifetime)
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

/// Acquires spreadsheet and Drive handles for a service account
#[derive(Clone)]
pub struct GoogleConnector {
    client: reqwest::Client,
    account: ServiceAccountKey,
    signing_key: EncodingKey,
    spreadsheet_name: String,
}

impl GoogleConnector {
    /// Create a connector; fails when the private key cannot be parsed
    pub fn new(secrets: &Secrets) -> Result<Self, GoogleApiError> {
        let account = secrets.gcp_service_account.clone();
        let signing_key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())?;

        Ok(Self {
            client: reqwest::Client::new(),
            account,
            signing_key,
            spreadsheet_name: secrets.spreadsheet_name.clone(),
        })
    }

    fn assertion(&self) -> Result<String, GoogleApiError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let claims = Claims {
            iss: &self.account.client_email,
            scope: SCOPES,
            aud: &self.account.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.signing_key,
        )?)
    }

    async fn access_token(&self) -> Result<AccessToken, GoogleApiError> {
        let assertion = self.assertion()?;
        let requested_at = Instant::now();
        let response = self
            .client
            .post(&self.account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let token: TokenResponse = check(response).await?.json().await?;
        debug!(expires_in = ?token.expires_in, "access token acquired");
        Ok(AccessToken {
            value: token.access_token,
            expires_at: token_deadline(requested_at, token.expires_in),
        })
    }

    async fn find_spreadsheet(&self, token: &str) -> Result<String, GoogleApiError> {
        let query = spreadsheet_query(&self.spreadsheet_name);
        let response = self
            .client
            .get(DRIVE_FILES_URL)
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;
        let list: FileList = check(response).await?.json().await?;

        list.files
            .into_iter()
            .next()
            .map(|file| file.id)
            .ok_or_else(|| GoogleApiError::SpreadsheetNotFound(self.spreadsheet_name.clone()))
    }

    async fn worksheet_titles(
        &self,
        token: &str,
        spreadsheet_id: &str,
    ) -> Result<HashSet<String>, GoogleApiError> {
        let response = self
            .client
            .get(format!("{}/{}", SHEETS_URL, spreadsheet_id))
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties.title")])
            .send()
            .await?;
        let meta: SpreadsheetMeta = check(response).await?.json().await?;

        Ok(meta
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }

    async fn open_spreadsheet(&self) -> Result<GoogleSpreadsheet, GoogleApiError> {
        let token = self.access_token().await?;
        let spreadsheet_id = self.find_spreadsheet(&token.value).await?;
        let worksheets = self.worksheet_titles(&token.value, &spreadsheet_id).await?;
        debug!(
            spreadsheet = %self.spreadsheet_name,
            worksheets = worksheets.len(),
            "spreadsheet opened"
        );

        Ok(GoogleSpreadsheet {
            client: self.client.clone(),
            token,
            spreadsheet_id,
            worksheets,
        })
    }
}

#[async_trait]
impl ServiceConnector for GoogleConnector {
    async fn connect_spreadsheet(&self) -> Result<Arc<dyn Spreadsheet>, ConnectivityError> {
        let sheet = self
            .open_spreadsheet()
            .await
            .map_err(|e| ConnectivityError::new(ServiceKind::Spreadsheet, e.to_string()))?;
        Ok(Arc::new(sheet))
    }

    async fn connect_blob_store(&self) -> Result<Arc<dyn BlobStore>, ConnectivityError> {
        let token = self
            .access_token()
            .await
            .map_err(|e| ConnectivityError::new(ServiceKind::BlobStore, e.to_string()))?;
        Ok(Arc::new(GoogleDrive {
            client: self.client.clone(),
            token,
        }))
    }
}

/// An opened spreadsheet
pub struct GoogleSpreadsheet {
    client: reqwest::Client,
    token: AccessToken,
    spreadsheet_id: String,
    worksheets: HashSet<String>,
}

#[async_trait]
impl Spreadsheet for GoogleSpreadsheet {
    async fn append_row(&self, worksheet: &str, cells: Vec<CellValue>) -> Result<(), SheetError> {
        if !self.worksheets.contains(worksheet) {
            return Err(SheetError::WorksheetNotFound);
        }

        let url = append_url(&self.spreadsheet_id, worksheet)
            .map_err(|e| SheetError::Failed(e.to_string()))?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token.value)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&json!({ "values": [cells] }))
            .send()
            .await
            .map_err(|e| SheetError::Failed(e.to_string()))?;

        match check(response).await {
            Ok(_) => Ok(()),
            Err(GoogleApiError::Status { status, body })
                if status == StatusCode::BAD_REQUEST && body.contains("Unable to parse range") =>
            {
                Err(SheetError::WorksheetNotFound)
            }
            Err(e) => Err(SheetError::Failed(e.to_string())),
        }
    }

    fn expires_at(&self) -> Option<Instant> {
        Some(self.token.expires_at)
    }
}

/// Drive folder access
pub struct GoogleDrive {
    client: reqwest::Client,
    token: AccessToken,
}

impl GoogleDrive {
    async fn upload(&self, object: &NewObject) -> Result<String, GoogleApiError> {
        let metadata = json!({
            "name": object.name,
            "parents": [object.parent],
            "mimeType": object.mime_type,
        });

        let session = self
            .client
            .post(DRIVE_UPLOAD_URL)
            .bearer_auth(&self.token.value)
            .query(&[("uploadType", "resumable"), ("supportsAllDrives", "true")])
            .header("X-Upload-Content-Type", object.mime_type.as_str())
            .json(&metadata)
            .send()
            .await?;
        let session = check(session).await?;

        let location = session
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| GoogleApiError::Malformed("upload session has no Location".into()))?
            .to_string();

        let response = self
            .client
            .put(location)
            .bearer_auth(&self.token.value)
            .header(header::CONTENT_TYPE, object.mime_type.as_str())
            .body(object.content.clone())
            .send()
            .await?;
        let file: FileEntry = check(response).await?.json().await?;
        Ok(file.id)
    }
}

#[async_trait]
impl BlobStore for GoogleDrive {
    async fn create_object(&self, object: NewObject) -> Result<String, UploadError> {
        self.upload(&object).await.map_err(|e| UploadError {
            object_name: object.name.clone(),
            message: e.to_string(),
        })
    }

    fn expires_at(&self) -> Option<Instant> {
        Some(self.token.expires_at)
    }
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, GoogleApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GoogleApiError::Status { status, body })
}

/// Drive search query matching a spreadsheet by exact name
fn spreadsheet_query(name: &str) -> String {
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escape_query_literal(name),
        SPREADSHEET_MIME
    )
}

fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// A1 range naming a whole worksheet
fn quote_range(worksheet: &str) -> String {
    format!("'{}'", worksheet.replace('\'', "''"))
}

fn append_url(spreadsheet_id: &str, worksheet: &str) -> Result<Url, GoogleApiError> {
    let mut url = Url::parse(SHEETS_URL).map_err(|e| GoogleApiError::Malformed(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| GoogleApiError::Malformed("base URL cannot have a path".into()))?
        .push(spreadsheet_id)
        .push("values")
        .push(&format!("{}:append", quote_range(worksheet)));
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IntakeConfig;

    #[test]
    fn test_query_escapes_quotes() {
        assert_eq!(
            spreadsheet_query("Pesanan O'Neil"),
            "name = 'Pesanan O\\'Neil' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
        );
    }

    #[test]
    fn test_token_deadline_keeps_a_margin() {
        let now = Instant::now();

        assert_eq!(token_deadline(now, Some(3599)), now + Duration::from_secs(3539));
        assert_eq!(token_deadline(now, None), now + Duration::from_secs(3540));
        assert_eq!(token_deadline(now, Some(30)), now);
    }

    #[test]
    fn test_range_doubles_single_quotes() {
        assert_eq!(quote_range("Rekap"), "'Rekap'");
        assert_eq!(quote_range("Ani's"), "'Ani''s'");
    }

    #[test]
    fn test_append_url_encodes_worksheet() {
        let url = append_url("abc123", "Detail Order").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'Detail%20Order':append"
        );
    }

    #[test]
    fn test_invalid_private_key_is_rejected() {
        let config = IntakeConfig::default_config();
        let result = GoogleConnector::new(&config.secrets);
        assert!(matches!(result, Err(GoogleApiError::InvalidKey(_))));
    }
}
