// API client module: a small blocking HTTP client for the umbrella
// reservation REST service. Each call sends one request and turns the
// status code and body into an outcome enum; the interpretation step is
// kept in plain functions so it can be tested without a server.

use crate::domain::{
    parse_date, Email, NewReservation, NumberOfSeats, Password, Price, Reservation,
    ReservationId, ReservationPeriod, ReservedUmbrellaId, Username,
};
use crate::error::ValidationError;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const API_SERVER_ENV: &str = "BEACH_API_SERVER";
pub const DEFAULT_API_SERVER: &str = "http://127.0.0.1:8000/api/v1";

/// Blocking API client: holds the reqwest client, the base URL of the
/// service and the session token once the user is logged in.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Login form payload.
#[derive(Serialize)]
pub struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Registration form payload. The password is sent twice, the server
/// checks both copies match.
#[derive(Serialize)]
pub struct RegistrationRequest<'a> {
    pub username: &'a str,
    pub password1: &'a str,
    pub password2: &'a str,
    pub email: &'a str,
}

impl<'a> RegistrationRequest<'a> {
    pub fn new(
        username: &'a Username,
        password: &'a Password,
        repeated_password: &'a Password,
        email: &'a Email,
    ) -> Self {
        RegistrationRequest {
            username: username.value(),
            password1: password.value(),
            password2: repeated_password.value(),
            email: email.value(),
        }
    }
}

#[derive(Serialize, Debug, PartialEq, Eq)]
struct NewReservationRequest {
    reserved_umbrella_id: u8,
    number_of_seats: u8,
    reservation_start_date: NaiveDate,
    reservation_end_date: NaiveDate,
}

impl From<&NewReservation> for NewReservationRequest {
    fn from(r: &NewReservation) -> Self {
        NewReservationRequest {
            reserved_umbrella_id: r.umbrella_id.value(),
            number_of_seats: r.number_of_seats.value(),
            reservation_start_date: r.period.start(),
            reservation_end_date: r.period.end(),
        }
    }
}

/// Body returned by the login and registration endpoints.
#[derive(Deserialize, Debug)]
struct TokenResponse {
    key: Option<String>,
}

/// Prices arrive either as JSON numbers or as decimal strings.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum PriceField {
    Number(f64),
    Text(String),
}

/// A reservation exactly as the server sends it. Convert it with
/// `Reservation::try_from` to get validated values.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ReservationRecord {
    pub id: i64,
    pub reserved_umbrella_id: i64,
    pub number_of_seats: i64,
    pub reservation_start_date: String,
    pub reservation_end_date: String,
    pub reservation_price: PriceField,
}

impl TryFrom<&ReservationRecord> for Reservation {
    type Error = ValidationError;

    fn try_from(record: &ReservationRecord) -> Result<Self, Self::Error> {
        let start = parse_date(&record.reservation_start_date)?;
        let end = parse_date(&record.reservation_end_date)?;
        let price = match &record.reservation_price {
            PriceField::Number(n) => Price::parse(&format!("{:.2}", n))?,
            PriceField::Text(s) => Price::parse(s.trim())?,
        };
        Ok(Reservation {
            id: ReservationId::new(record.id)?,
            umbrella_id: ReservedUmbrellaId::new(record.reserved_umbrella_id)?,
            number_of_seats: NumberOfSeats::new(record.number_of_seats)?,
            period: ReservationPeriod::new(start, end)?,
            price,
        })
    }
}

/// Per-field error messages from a rejected request, with
/// `non_field_errors` first and the remaining fields in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(String, Vec<String>)>);

impl FieldErrors {
    pub fn from_body(body: &str) -> Self {
        let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body)
        else {
            return FieldErrors::default();
        };
        let mut fields: Vec<(String, Vec<String>)> = map
            .into_iter()
            .map(|(field, value)| {
                let messages = match value {
                    serde_json::Value::Array(items) => items
                        .into_iter()
                        .map(|v| match v {
                            serde_json::Value::String(s) => s,
                            other => other.to_string(),
                        })
                        .collect(),
                    serde_json::Value::String(s) => vec![s],
                    other => vec![other.to_string()],
                };
                (field, messages)
            })
            .collect();
        fields.sort_by(|(a, _), (b, _)| {
            (a != "non_field_errors", a).cmp(&(b != "non_field_errors", b))
        });
        FieldErrors(fields)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|(_, messages)| messages.is_empty())
    }

    /// Every message, in display order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .flat_map(|(_, messages)| messages.iter().map(String::as_str))
    }
}

/// Result of a login or registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(String),
    Rejected(FieldErrors),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListOutcome {
    Listed(Vec<ReservationRecord>),
    Failed(StatusCode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    Rejected(FieldErrors),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    Failed(StatusCode),
}

fn auth_outcome(status: StatusCode, expected: StatusCode, body: &str) -> AuthOutcome {
    if status != expected {
        return AuthOutcome::Rejected(FieldErrors::from_body(body));
    }
    match serde_json::from_str::<TokenResponse>(body) {
        Ok(TokenResponse { key: Some(key) }) => AuthOutcome::Authenticated(key),
        Ok(TokenResponse { key: None }) => AuthOutcome::Rejected(FieldErrors::default()),
        Err(e) => {
            warn!(error = %e, "token response is not valid json");
            AuthOutcome::Rejected(FieldErrors::default())
        }
    }
}

fn list_outcome(status: StatusCode, body: &str) -> Result<ListOutcome> {
    if status != StatusCode::OK {
        return Ok(ListOutcome::Failed(status));
    }
    let records: Vec<ReservationRecord> =
        serde_json::from_str(body).context("Parsing reservation list json")?;
    Ok(ListOutcome::Listed(records))
}

fn create_outcome(status: StatusCode, body: &str) -> CreateOutcome {
    if status == StatusCode::CREATED {
        CreateOutcome::Created
    } else {
        CreateOutcome::Rejected(FieldErrors::from_body(body))
    }
}

fn delete_outcome(status: StatusCode) -> DeleteOutcome {
    match status {
        StatusCode::OK | StatusCode::ACCEPTED | StatusCode::NO_CONTENT => DeleteOutcome::Deleted,
        StatusCode::NOT_FOUND => DeleteOutcome::NotFound,
        other => DeleteOutcome::Failed(other),
    }
}

/// Splits a response into status and body text. A body that cannot be
/// read is treated as empty.
fn read_response(res: Response) -> (StatusCode, String) {
    let status = res.status();
    let body = res.text().unwrap_or_else(|_| "".into());
    (status, body)
}

impl ApiClient {
    /// Create an ApiClient configured from the environment variable
    /// `BEACH_API_SERVER` or fall back to `DEFAULT_API_SERVER`.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var(API_SERVER_ENV).unwrap_or_else(|_| DEFAULT_API_SERVER.into());
        ApiClient::new(&base_url)
    }

    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Store the session token for subsequent authenticated requests.
    pub fn set_token(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authorization header map; empty when no token is set.
    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(t) = &self.token {
            let val = format!("Token {}", t);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&val).context("Session token is not a valid header")?,
            );
        }
        Ok(headers)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<AuthOutcome> {
        let url = self.url("/auth/login/");
        debug!(%url, "sending login request");
        let res = self
            .client
            .post(&url)
            .form(&AuthRequest { username, password })
            .send()
            .context("Failed to send login request")?;
        let (status, body) = read_response(res);
        debug!(%status, "login response");
        Ok(auth_outcome(status, StatusCode::OK, &body))
    }

    pub fn register(&self, req: &RegistrationRequest) -> Result<AuthOutcome> {
        let url = self.url("/auth/registration/");
        debug!(%url, "sending registration request");
        let res = self
            .client
            .post(&url)
            .form(req)
            .send()
            .context("Failed to send registration request")?;
        let (status, body) = read_response(res);
        debug!(%status, "registration response");
        Ok(auth_outcome(status, StatusCode::CREATED, &body))
    }

    /// Ends the server session. Returns whether the server accepted it.
    pub fn logout(&self) -> Result<bool> {
        let url = self.url("/auth/logout/");
        debug!(%url, "sending logout request");
        let res = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .send()
            .context("Failed to send logout request")?;
        debug!(status = %res.status(), "logout response");
        Ok(res.status() == StatusCode::OK)
    }

    pub fn list_reservations(&self) -> Result<ListOutcome> {
        let url = self.url("/beachreservation/");
        debug!(%url, "retrieving reservations");
        let res = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .context("Failed to send reservation list request")?;
        let (status, body) = read_response(res);
        debug!(%status, "reservation list response");
        list_outcome(status, &body)
    }

    pub fn create_reservation(&self, reservation: &NewReservation) -> Result<CreateOutcome> {
        let url = self.url("/beachreservation/");
        debug!(%url, ?reservation, "creating reservation");
        let res = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .json(&NewReservationRequest::from(reservation))
            .send()
            .context("Failed to send reservation create request")?;
        let (status, body) = read_response(res);
        debug!(%status, "reservation create response");
        Ok(create_outcome(status, &body))
    }

    pub fn delete_reservation(&self, id: ReservationId) -> Result<DeleteOutcome> {
        let url = self.url(&format!("/beachreservation/{}/", id));
        debug!(%url, "deleting reservation");
        let res = self
            .client
            .delete(&url)
            .headers(self.auth_headers()?)
            .send()
            .context("Failed to send reservation delete request")?;
        debug!(status = %res.status(), "reservation delete response");
        Ok(delete_outcome(res.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_json() -> &'static str {
        r#"[{"id": 7, "reserved_umbrella_id": 12, "number_of_seats": 3,
             "reservation_start_date": "2024-07-15", "reservation_end_date": "2024-07-20",
             "reservation_price": 42.5}]"#
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let api = ApiClient::new("http://localhost:8000/api/v1/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000/api/v1");
        assert_eq!(
            api.url("/auth/login/"),
            "http://localhost:8000/api/v1/auth/login/"
        );
    }

    #[test]
    fn test_auth_headers_follow_token() {
        let mut api = ApiClient::new(DEFAULT_API_SERVER).unwrap();
        assert!(api.auth_headers().unwrap().is_empty());
        api.set_token("abc");
        assert!(api.has_token());
        assert_eq!(api.auth_headers().unwrap()[AUTHORIZATION], "Token abc");
        api.clear_token();
        assert!(!api.has_token());
    }

    #[test]
    fn test_auth_outcome() {
        assert_eq!(
            auth_outcome(StatusCode::OK, StatusCode::OK, r#"{"key": "abc"}"#),
            AuthOutcome::Authenticated("abc".into())
        );
        assert_eq!(
            auth_outcome(StatusCode::OK, StatusCode::OK, r#"{"key": null}"#),
            AuthOutcome::Rejected(FieldErrors::default())
        );
        // Registration answers 201, so a plain 200 does not count.
        assert!(matches!(
            auth_outcome(StatusCode::OK, StatusCode::CREATED, r#"{"key": "abc"}"#),
            AuthOutcome::Rejected(_)
        ));
        assert_eq!(
            auth_outcome(StatusCode::CREATED, StatusCode::CREATED, "not json"),
            AuthOutcome::Rejected(FieldErrors::default())
        );
    }

    #[test]
    fn test_field_errors_order() {
        let body = r#"{"username": ["A user with that username already exists."],
                       "email": ["Enter a valid email address."],
                       "non_field_errors": ["The two password fields didn't match."]}"#;
        let AuthOutcome::Rejected(errors) =
            auth_outcome(StatusCode::BAD_REQUEST, StatusCode::CREATED, body)
        else {
            panic!("expected rejection");
        };
        let messages: Vec<_> = errors.messages().collect();
        assert_eq!(
            messages,
            [
                "The two password fields didn't match.",
                "Enter a valid email address.",
                "A user with that username already exists.",
            ]
        );
        assert!(FieldErrors::from_body("<html>").is_empty());
        assert_eq!(
            FieldErrors::from_body(r#"{"detail": "Not found."}"#)
                .messages()
                .collect::<Vec<_>>(),
            ["Not found."]
        );
    }

    #[test]
    fn test_list_outcome() {
        let ListOutcome::Listed(records) = list_outcome(StatusCode::OK, record_json()).unwrap()
        else {
            panic!("expected records");
        };
        assert_eq!(records.len(), 1);
        let reservation = Reservation::try_from(&records[0]).unwrap();
        assert_eq!(reservation.id.value(), 7);
        assert_eq!(reservation.umbrella_id.value(), 12);
        assert_eq!(reservation.number_of_seats.value(), 3);
        assert_eq!(reservation.price.to_string(), "42.50");

        assert_eq!(
            list_outcome(StatusCode::UNAUTHORIZED, "").unwrap(),
            ListOutcome::Failed(StatusCode::UNAUTHORIZED)
        );
        assert!(list_outcome(StatusCode::OK, "{").is_err());
    }

    #[test]
    fn test_record_with_invalid_values_is_rejected() {
        let mut record: Vec<ReservationRecord> = serde_json::from_str(record_json()).unwrap();
        let mut record = record.remove(0);
        record.number_of_seats = 9;
        assert!(Reservation::try_from(&record).is_err());

        record.number_of_seats = 2;
        record.reservation_end_date = "2024-07-01".into();
        assert!(Reservation::try_from(&record).is_err());

        record.reservation_end_date = "2024-07-16".into();
        record.reservation_price = PriceField::Text("12.30".into());
        assert_eq!(
            Reservation::try_from(&record).unwrap().price,
            Price::create(12, 30).unwrap()
        );
    }

    #[test]
    fn test_create_and_delete_outcomes() {
        assert_eq!(create_outcome(StatusCode::CREATED, ""), CreateOutcome::Created);
        assert!(matches!(
            create_outcome(StatusCode::BAD_REQUEST, r#"{"reserved_umbrella_id": ["taken"]}"#),
            CreateOutcome::Rejected(e) if e.messages().eq(["taken"])
        ));
        assert_eq!(delete_outcome(StatusCode::OK), DeleteOutcome::Deleted);
        assert_eq!(delete_outcome(StatusCode::ACCEPTED), DeleteOutcome::Deleted);
        assert_eq!(delete_outcome(StatusCode::NO_CONTENT), DeleteOutcome::Deleted);
        assert_eq!(delete_outcome(StatusCode::NOT_FOUND), DeleteOutcome::NotFound);
        assert_eq!(
            delete_outcome(StatusCode::INTERNAL_SERVER_ERROR),
            DeleteOutcome::Failed(StatusCode::INTERNAL_SERVER_ERROR)
        );
    }

    #[test]
    fn test_new_reservation_request_body() {
        let start = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 7, 18).unwrap();
        let reservation = NewReservation::new(
            ReservedUmbrellaId::new(4).unwrap(),
            NumberOfSeats::new(2).unwrap(),
            ReservationPeriod::new(start, end).unwrap(),
        );
        let body = serde_json::to_value(NewReservationRequest::from(&reservation)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "reserved_umbrella_id": 4,
                "number_of_seats": 2,
                "reservation_start_date": "2024-07-15",
                "reservation_end_date": "2024-07-18",
            })
        );
    }
}
