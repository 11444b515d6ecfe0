use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::domain::entities::record::{CellValue, RowIndex, RowMap};
use crate::domain::entities::target::SheetTarget;
use crate::infra::gsheets::a1::{cell_range, quote_title};
use crate::infra::gsheets::values::{
    delete_row_request, drive_name_query, error_message, records_from_values, DriveFileList,
    SheetProperties, SpreadsheetMeta, ValueRange,
};
use crate::usecase::ports::store::{Connector, Spreadsheet, StoreError, Worksheet};

pub const SHEETS_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DRIVE_FILES: &str = "https://www.googleapis.com/drive/v3/files";

/// An already-issued access token and the account it belongs to.
#[derive(Clone)]
pub struct ServiceAccount {
    pub client_email: String,
    pub access_token: String,
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("access_token", &"***")
            .finish()
    }
}

struct Api {
    http: Client,
    token: String,
    sheets_base: Url,
    drive_files: Url,
}

fn transport_err(err: reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

impl Api {
    fn spreadsheet_url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.sheets_base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport(format!("invalid base url: {}", self.sheets_base)))?
            .extend(segments);
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(transport_err)?;
        let status = response.status();
        debug!(%status, url = %response.url(), "sheets api response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = error_message(&body);
        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::PermissionDenied(message),
            _ => StoreError::Http {
                status: status.as_u16(),
                message,
            },
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, StoreError> {
        self.send(self.http.get(url))?
            .json::<T>()
            .map_err(|err| StoreError::Decode(err.to_string()))
    }

    fn metadata(&self, spreadsheet_id: &str) -> Result<SpreadsheetMeta, StoreError> {
        let mut url = self.spreadsheet_url(&[spreadsheet_id])?;
        url.query_pairs_mut().append_pair(
            "fields",
            "spreadsheetId,properties.title,sheets.properties(sheetId,title)",
        );
        self.get_json(url)
    }

    fn find_by_name(&self, name: &str) -> Result<String, StoreError> {
        let mut url = self.drive_files.clone();
        url.query_pairs_mut()
            .append_pair("q", &drive_name_query(name))
            .append_pair("fields", "files(id,name)")
            .append_pair("pageSize", "1")
            .append_pair("supportsAllDrives", "true")
            .append_pair("includeItemsFromAllDrives", "true");
        let listing: DriveFileList = self.get_json(url)?;
        listing
            .files
            .into_iter()
            .next()
            .map(|file| {
                debug!(id = %file.id, name = %file.name, "resolved spreadsheet by name");
                file.id
            })
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }
}

pub struct GoogleConnector {
    account: ServiceAccount,
    api: Arc<Api>,
}

impl GoogleConnector {
    pub fn new(account: ServiceAccount, timeout: Duration) -> Result<Self, StoreError> {
        Self::with_endpoints(account, timeout, SHEETS_BASE, DRIVE_FILES)
    }

    pub fn with_endpoints(
        account: ServiceAccount,
        timeout: Duration,
        sheets_base: &str,
        drive_files: &str,
    ) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport_err)?;
        Self::with_client(account, http, sheets_base, drive_files)
    }

    fn with_client(
        account: ServiceAccount,
        http: Client,
        sheets_base: &str,
        drive_files: &str,
    ) -> Result<Self, StoreError> {
        let parse = |raw: &str| {
            Url::parse(raw).map_err(|err| StoreError::Transport(format!("invalid url {raw}: {err}")))
        };
        let api = Api {
            http,
            token: account.access_token.clone(),
            sheets_base: parse(sheets_base)?,
            drive_files: parse(drive_files)?,
        };
        Ok(Self {
            account,
            api: Arc::new(api),
        })
    }
}

impl Connector for GoogleConnector {
    fn identity(&self) -> String {
        self.account.client_email.clone()
    }

    fn open(&self, target: &SheetTarget) -> Result<Box<dyn Spreadsheet>, StoreError> {
        let spreadsheet_id = match target {
            SheetTarget::Url(url) => target
                .spreadsheet_key()
                .map(str::to_string)
                .ok_or_else(|| StoreError::NotFound(format!("無法從網址取得試算表 ID：{url}")))?,
            SheetTarget::Name(name) => self.api.find_by_name(name)?,
        };

        let meta = self.api.metadata(&spreadsheet_id)?;
        Ok(Box::new(GoogleSpreadsheet {
            api: self.api.clone(),
            id: meta.spreadsheet_id,
            title: meta.properties.title,
            sheets: meta.sheets.into_iter().map(|entry| entry.properties).collect(),
        }))
    }
}

pub struct GoogleSpreadsheet {
    api: Arc<Api>,
    id: String,
    title: String,
    sheets: Vec<SheetProperties>,
}

impl Spreadsheet for GoogleSpreadsheet {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn worksheet(&self, name: &str) -> Result<Arc<dyn Worksheet>, StoreError> {
        let sheet = self
            .sheets
            .iter()
            .find(|sheet| sheet.title == name)
            .cloned()
            .ok_or_else(|| {
                let known = self
                    .sheets
                    .iter()
                    .map(|sheet| sheet.title.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                StoreError::NotFound(format!("{name}（現有工作表：{known}）"))
            })?;

        Ok(Arc::new(GoogleWorksheet {
            api: self.api.clone(),
            spreadsheet_id: self.id.clone(),
            sheet,
        }))
    }
}

pub struct GoogleWorksheet {
    api: Arc<Api>,
    spreadsheet_id: String,
    sheet: SheetProperties,
}

impl Worksheet for GoogleWorksheet {
    fn title(&self) -> String {
        self.sheet.title.clone()
    }

    fn get_all_records(&self) -> Result<Vec<RowMap>, StoreError> {
        let range = quote_title(&self.sheet.title);
        let mut url = self
            .api
            .spreadsheet_url(&[self.spreadsheet_id.as_str(), "values", range.as_str()])?;
        url.query_pairs_mut()
            .append_pair("valueRenderOption", "UNFORMATTED_VALUE")
            .append_pair("majorDimension", "ROWS");
        let body: ValueRange = self.api.get_json(url)?;
        records_from_values(&body.values)
    }

    fn append_row(&self, values: &[CellValue]) -> Result<(), StoreError> {
        let range = format!("{}!A1", quote_title(&self.sheet.title));
        let append_segment = format!("{range}:append");
        let mut url = self.api.spreadsheet_url(&[
            self.spreadsheet_id.as_str(),
            "values",
            append_segment.as_str(),
        ])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let body = ValueRange::single_row(None, values);
        self.api.send(self.api.http.post(url).json(&body))?;
        Ok(())
    }

    fn update_cell(&self, row: RowIndex, col: u32, value: CellValue) -> Result<(), StoreError> {
        if row.0 == 0 || col == 0 {
            return Err(StoreError::RowOutOfRange(row.0));
        }
        let range = cell_range(&self.sheet.title, row.0, col);
        let mut url = self
            .api
            .spreadsheet_url(&[self.spreadsheet_id.as_str(), "values", range.as_str()])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        let body = ValueRange::single_row(Some(range), &[value]);
        self.api.send(self.api.http.put(url).json(&body))?;
        Ok(())
    }

    fn delete_rows(&self, row: RowIndex) -> Result<(), StoreError> {
        if row.0 == 0 {
            return Err(StoreError::RowOutOfRange(row.0));
        }
        let batch_segment = format!("{}:batchUpdate", self.spreadsheet_id);
        let url = self.api.spreadsheet_url(&[batch_segment.as_str()])?;
        let body = delete_row_request(self.sheet.sheet_id, row.0);
        self.api.send(self.api.http.post(url).json(&body))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    use serde_json::{json, Value};

    use super::*;
    use crate::usecase::services::connection::ConnectionCache;

    const SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/abc/edit#gid=0";

    /// What the local server saw of the single request it answered.
    struct Exchange {
        request_line: String,
        body: String,
    }

    /// Answers one request on a loopback port with `status` and `reply`.
    fn serve_once(status: &'static str, reply: &'static str) -> (String, mpsc::Receiver<Exchange>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("should bind loopback listener");
        let base = format!(
            "http://{}",
            listener.local_addr().expect("listener should have an address")
        );
        let (sender, receiver) = mpsc::channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().expect("should accept connection");
            let mut reader = BufReader::new(&stream);

            let mut request_line = String::new();
            reader
                .read_line(&mut request_line)
                .expect("should read request line");
            let mut content_length: usize = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("should read header line");
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().expect("content-length should parse");
                    }
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).expect("should read request body");

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{reply}",
                reply.len()
            );
            (&stream)
                .write_all(response.as_bytes())
                .expect("should write response");
            let _ = sender.send(Exchange {
                request_line: request_line.trim_end().to_string(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        });

        (base, receiver)
    }

    fn connector_at(base: &str) -> GoogleConnector {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .no_proxy()
            .build()
            .expect("http client should build");
        GoogleConnector::with_client(
            ServiceAccount {
                client_email: "svc@demo.iam.gserviceaccount.com".to_string(),
                access_token: "secret-token".to_string(),
            },
            http,
            &format!("{base}/v4/spreadsheets"),
            &format!("{base}/drive/v3/files"),
        )
        .expect("connector should build")
    }

    fn worksheet_at(base: &str) -> GoogleWorksheet {
        GoogleWorksheet {
            api: connector_at(base).api.clone(),
            spreadsheet_id: "abc".to_string(),
            sheet: SheetProperties {
                sheet_id: 7,
                title: "工作表1".to_string(),
            },
        }
    }

    fn received(receiver: &mpsc::Receiver<Exchange>) -> Exchange {
        receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("server should have seen a request")
    }

    fn connector() -> GoogleConnector {
        GoogleConnector::new(
            ServiceAccount {
                client_email: "svc@demo.iam.gserviceaccount.com".to_string(),
                access_token: "secret-token".to_string(),
            },
            Duration::from_secs(5),
        )
        .expect("connector should build")
    }

    #[test]
    fn identity_is_service_account_email() {
        assert_eq!(connector().identity(), "svc@demo.iam.gserviceaccount.com");
    }

    #[test]
    fn debug_output_hides_access_token() {
        let rendered = format!("{:?}", connector().account);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("svc@demo.iam.gserviceaccount.com"));
    }

    #[test]
    fn spreadsheet_urls_encode_ranges_as_one_segment() {
        let connector = connector();
        let api = &connector.api;
        let url = api
            .spreadsheet_url(&["abc", "values", "'工作表1'!B5"])
            .expect("url should build");
        assert!(url
            .as_str()
            .starts_with("https://sheets.googleapis.com/v4/spreadsheets/abc/values/"));
        assert!(!url.path().ends_with("/B5"), "range must stay in a single segment");

        let batch = api
            .spreadsheet_url(&["abc:batchUpdate"])
            .expect("url should build");
        assert_eq!(
            batch.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc:batchUpdate"
        );
    }

    #[test]
    fn url_target_without_key_is_not_found() {
        let result = connector().open(&SheetTarget::parse("https://example.com/nothing"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn forbidden_open_is_permission_denied_and_names_identity() {
        let (base, receiver) = serve_once(
            "403 Forbidden",
            r#"{"error":{"code":403,"message":"The caller does not have permission","status":"PERMISSION_DENIED"}}"#,
        );
        let cache = ConnectionCache::new(
            Box::new(connector_at(&base)),
            SheetTarget::parse(SHEET_URL),
            "工作表1",
        );

        let err = match cache.worksheet() {
            Ok(_) => panic!("forbidden spreadsheet should not open"),
            Err(err) => err,
        };

        assert_eq!(
            err.source,
            StoreError::PermissionDenied("The caller does not have permission".to_string())
        );
        assert!(err.to_string().contains("svc@demo.iam.gserviceaccount.com"));
        assert!(received(&receiver)
            .request_line
            .starts_with("GET /v4/spreadsheets/abc?fields="));
    }

    #[test]
    fn missing_spreadsheet_is_not_found() {
        let (base, _receiver) = serve_once(
            "404 Not Found",
            r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#,
        );

        let result = connector_at(&base).open(&SheetTarget::parse(SHEET_URL));

        assert!(matches!(
            result,
            Err(StoreError::NotFound(message)) if message == "Requested entity was not found."
        ));
    }

    #[test]
    fn other_failures_keep_status_code() {
        let (base, _receiver) = serve_once("500 Internal Server Error", "backend down");

        let result = worksheet_at(&base).get_all_records();

        assert_eq!(
            result,
            Err(StoreError::Http {
                status: 500,
                message: "backend down".to_string()
            })
        );
    }

    #[test]
    fn get_all_records_reads_unformatted_values() {
        let (base, receiver) = serve_once(
            "200 OK",
            r#"{"range":"'工作表1'!A1:B2","majorDimension":"ROWS","values":[["姓名","數量"],["Alice","3"]]}"#,
        );

        let records = worksheet_at(&base)
            .get_all_records()
            .expect("records should load");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["數量"], CellValue::Int(3));
        let request_line = received(&receiver).request_line;
        assert!(request_line.starts_with("GET /v4/spreadsheets/abc/values/"));
        assert!(request_line.contains("valueRenderOption=UNFORMATTED_VALUE"));
    }

    #[test]
    fn update_cell_puts_single_user_entered_cell() {
        let (base, receiver) = serve_once("200 OK", "{}");

        worksheet_at(&base)
            .update_cell(RowIndex(5), 2, CellValue::Int(5))
            .expect("update should succeed");

        let exchange = received(&receiver);
        assert!(exchange.request_line.starts_with(
            "PUT /v4/spreadsheets/abc/values/'%E5%B7%A5%E4%BD%9C%E8%A1%A81'!B5?valueInputOption=USER_ENTERED "
        ));
        let body: Value = serde_json::from_str(&exchange.body).expect("body should be json");
        assert_eq!(body["range"], json!("'工作表1'!B5"));
        assert_eq!(body["values"], json!([[5]]));
    }

    #[test]
    fn append_row_posts_raw_insert_rows() {
        let (base, receiver) = serve_once("200 OK", "{}");

        worksheet_at(&base)
            .append_row(&[CellValue::from("Alice"), CellValue::Int(3)])
            .expect("append should succeed");

        let exchange = received(&receiver);
        assert!(exchange.request_line.starts_with("POST /v4/spreadsheets/abc/values/"));
        assert!(exchange.request_line.contains(":append?"));
        assert!(exchange.request_line.contains("valueInputOption=RAW"));
        assert!(exchange.request_line.contains("insertDataOption=INSERT_ROWS"));
        let body: Value = serde_json::from_str(&exchange.body).expect("body should be json");
        assert_eq!(body["values"], json!([["Alice", 3]]));
    }

    #[test]
    fn delete_rows_sends_one_row_delete_dimension() {
        let (base, receiver) = serve_once("200 OK", "{}");

        worksheet_at(&base)
            .delete_rows(RowIndex(4))
            .expect("delete should succeed");

        let exchange = received(&receiver);
        assert!(exchange
            .request_line
            .starts_with("POST /v4/spreadsheets/abc:batchUpdate "));
        let body: Value = serde_json::from_str(&exchange.body).expect("body should be json");
        let range = &body["requests"][0]["deleteDimension"]["range"];
        assert_eq!(range["sheetId"], json!(7));
        assert_eq!(range["startIndex"], json!(3));
        assert_eq!(range["endIndex"], json!(4));
    }
}
