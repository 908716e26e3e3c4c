// Domain value types.
//
// Every type here checks its rules once, in its constructor, and exposes
// no way to change the wrapped value afterwards. Holding one of these is
// proof the data is valid.

use crate::error::ValidationError;
use chrono::{DateTime, Months, NaiveDate};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub const MIN_NUMBER_OF_SEATS: i64 = 2;
pub const MAX_NUMBER_OF_SEATS: i64 = 4;

pub const MIN_UMBRELLA_ID: i64 = 0;
pub const MAX_UMBRELLA_ID: i64 = 50;

pub const MAX_RESERVATION_MONTHS: u32 = 1;

pub const MAX_USERNAME_LEN: usize = 150;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 150;
pub const MAX_EMAIL_LEN: usize = 200;

/// Largest amount a `Price` can hold, in cents.
pub const MAX_PRICE_CENTS: u64 = 10_000_000_000 - 1;
pub const MAX_PRICE_EUROS: u64 = MAX_PRICE_CENTS / 100;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const NUMBER_OF_SEATS_HELP: &str = "The number of seats must be between 2 and 4";
const UMBRELLA_ID_HELP: &str = "The umbrella id must be between 0 and 50";
const RESERVATION_ID_HELP: &str = "The reservation id must be a number greater or equal to 0";
const USERNAME_HELP: &str = "Username cannot be empty, it can contain only letters, numbers and \
                             these special chars @.+_-";
const PASSWORD_HELP: &str = "Password cannot be empty, it must be at least 8 characters, and can \
                             contain numbers, letters and these special chars: @$!%*?&";
const EMAIL_HELP: &str = "Email must be in the right format, for example: example@domain.com";
const PRICE_HELP: &str = "Price must be written as euros with up to two decimals, for example: 12.50";
const PRICE_RANGE_HELP: &str = "Price euros must be between 0 and 99999999 and cents between 0 and 99";
const END_DATE_BEFORE_START_HELP: &str =
    "Is not possible to put as End date a date before the Start date";
const END_DATE_TOO_FAR_HELP: &str =
    "The End date cannot be more than one month after the Start date";
const DATE_HELP: &str = "Dates must be written as YYYY-MM-DD, for example: 2024-07-15";

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9@.+_-]+$").expect("username pattern is valid"));
static PASSWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9@$!%*?&]+$").expect("password pattern is valid"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9]+[._-])*[A-Za-z0-9]+@[A-Za-z0-9-]+(\.[A-Za-z]{2,})+$")
        .expect("email pattern is valid")
});
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<euros>[0-9]{0,11})(?:\.(?P<cents>[0-9]{1,2}))?$")
        .expect("price pattern is valid")
});

fn check_range(value: i64, min: i64, max: i64, help: &str) -> Result<i64, ValidationError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::new(help))
    }
}

fn parse_integer(text: &str, help: &str) -> Result<i64, ValidationError> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::new(help))
}

fn check_text(
    value: &str,
    min_len: usize,
    max_len: usize,
    pattern: &Regex,
    help: &str,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min_len || len > max_len || !pattern.is_match(value) {
        return Err(ValidationError::new(help));
    }
    Ok(())
}

/// How many people a reservation is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumberOfSeats(u8);

impl NumberOfSeats {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        let value = check_range(
            value,
            MIN_NUMBER_OF_SEATS,
            MAX_NUMBER_OF_SEATS,
            NUMBER_OF_SEATS_HELP,
        )?;
        Ok(NumberOfSeats(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl FromStr for NumberOfSeats {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NumberOfSeats::new(parse_integer(s, NUMBER_OF_SEATS_HELP)?)
    }
}

impl fmt::Display for NumberOfSeats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an umbrella on the beach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReservedUmbrellaId(u8);

impl ReservedUmbrellaId {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        let value = check_range(value, MIN_UMBRELLA_ID, MAX_UMBRELLA_ID, UMBRELLA_ID_HELP)?;
        Ok(ReservedUmbrellaId(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl FromStr for ReservedUmbrellaId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReservedUmbrellaId::new(parse_integer(s, UMBRELLA_ID_HELP)?)
    }
}

impl fmt::Display for ReservedUmbrellaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned reservation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReservationId(u64);

impl ReservationId {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        let value = check_range(value, 0, i64::MAX, RESERVATION_ID_HELP)?;
        Ok(ReservationId(value as u64))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl FromStr for ReservationId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReservationId::new(parse_integer(s, RESERVATION_ID_HELP)?)
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Username(String);

impl Username {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        check_text(&value, 1, MAX_USERNAME_LEN, &USERNAME_RE, USERNAME_HELP)?;
        Ok(Username(value))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A password accepted by the registration rules. `Debug` never prints
/// the secret itself.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Password(String);

impl Password {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        check_text(
            &value,
            MIN_PASSWORD_LEN,
            MAX_PASSWORD_LEN,
            &PASSWORD_RE,
            PASSWORD_HELP,
        )?;
        Ok(Password(value))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Email(String);

impl Email {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        check_text(&value, 0, MAX_EMAIL_LEN, &EMAIL_RE, EMAIL_HELP)?;
        Ok(Email(value))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An amount of money stored as whole cents.
///
/// The field is private: a `Price` only comes out of [`Price::create`]
/// or [`Price::parse`], so the range check cannot be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    cents: u64,
}

impl Price {
    pub fn create(euros: i64, cents: i64) -> Result<Self, ValidationError> {
        let euros = check_range(euros, 0, MAX_PRICE_EUROS as i64, PRICE_RANGE_HELP)?;
        let cents = check_range(cents, 0, 99, PRICE_RANGE_HELP)?;
        Ok(Price {
            cents: euros as u64 * 100 + cents as u64,
        })
    }

    /// Parses `"12"`, `"12.5"` or `"12.50"`. A single decimal digit counts
    /// as tenths, so `"1.6"` is one euro and sixty cents.
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let caps = PRICE_RE
            .captures(text)
            .ok_or_else(|| ValidationError::new(PRICE_HELP))?;
        let euro_digits = caps.name("euros").map_or("", |m| m.as_str());
        let cent_digits = caps.name("cents").map_or("", |m| m.as_str());
        if euro_digits.is_empty() && cent_digits.is_empty() {
            return Err(ValidationError::new(PRICE_HELP));
        }

        let euros = if euro_digits.is_empty() {
            0
        } else {
            parse_integer(euro_digits, PRICE_HELP)?
        };
        let cents = match cent_digits.len() {
            0 => 0,
            1 => parse_integer(cent_digits, PRICE_HELP)? * 10,
            _ => parse_integer(cent_digits, PRICE_HELP)?,
        };
        Price::create(euros, cents)
    }

    pub fn euros(&self) -> u64 {
        self.cents / 100
    }

    pub fn cents(&self) -> u8 {
        (self.cents % 100) as u8
    }

    pub fn total_cents(&self) -> u64 {
        self.cents
    }
}

impl FromStr for Price {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Price::parse(s)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.euros(), self.cents())
    }
}

/// Parses a date typed by the user or sent by the server: either
/// `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(text: &str) -> Result<NaiveDate, ValidationError> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.date_naive()))
        .map_err(|_| ValidationError::new(DATE_HELP))
}

/// Start and end day of a reservation. The end may be the start day
/// itself and at most one calendar month later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReservationPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReservationPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::new(END_DATE_BEFORE_START_HELP));
        }
        let latest = start
            .checked_add_months(Months::new(MAX_RESERVATION_MONTHS))
            .ok_or_else(|| ValidationError::new(END_DATE_TOO_FAR_HELP))?;
        if end > latest {
            return Err(ValidationError::new(END_DATE_TOO_FAR_HELP));
        }
        Ok(ReservationPeriod { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// A reservation the user is about to send to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NewReservation {
    pub umbrella_id: ReservedUmbrellaId,
    pub number_of_seats: NumberOfSeats,
    pub period: ReservationPeriod,
}

impl NewReservation {
    pub fn new(
        umbrella_id: ReservedUmbrellaId,
        number_of_seats: NumberOfSeats,
        period: ReservationPeriod,
    ) -> Self {
        NewReservation {
            umbrella_id,
            number_of_seats,
            period,
        }
    }
}

/// A reservation as stored by the server, with its id and price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reservation {
    pub id: ReservationId,
    pub umbrella_id: ReservedUmbrellaId,
    pub number_of_seats: NumberOfSeats,
    pub period: ReservationPeriod,
    pub price: Price,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_number_of_seats_bounds() {
        for n in [-1, 0, 1, 5, 6, 1000] {
            assert!(NumberOfSeats::new(n).is_err(), "{n} should be rejected");
        }
        for n in [2, 3, 4] {
            assert_eq!(NumberOfSeats::new(n).unwrap().value() as i64, n);
        }
    }

    #[test]
    fn test_umbrella_id_bounds() {
        for n in [-100, -2, -1, 51, 52, 100, 1000] {
            assert!(ReservedUmbrellaId::new(n).is_err());
        }
        for n in [0, 1, 2, 49, 50] {
            assert_eq!(ReservedUmbrellaId::new(n).unwrap().value() as i64, n);
        }
    }

    #[test]
    fn test_integer_types_from_text() {
        assert_eq!(
            " 3 ".parse::<NumberOfSeats>().unwrap(),
            NumberOfSeats::new(3).unwrap()
        );
        let err = "three".parse::<NumberOfSeats>().unwrap_err();
        assert_eq!(err.help_msg(), NUMBER_OF_SEATS_HELP);
        assert!("-4".parse::<ReservationId>().is_err());
        assert_eq!("12".parse::<ReservationId>().unwrap().value(), 12);
    }

    #[test]
    fn test_username() {
        assert!(Username::new("").is_err());
        assert!(Username::new("john doe").is_err());
        assert!(Username::new("a".repeat(151)).is_err());
        let username = Username::new("john_22").unwrap();
        assert_eq!(username.value(), "john_22");
        assert!(Username::new("a+b.c@d-e").is_ok());
    }

    #[test]
    fn test_password() {
        assert!(Password::new("").is_err());
        assert!(Password::new("short1!").is_err());
        assert!(Password::new("with space1").is_err());
        assert!(Password::new("p".repeat(151)).is_err());
        let password = Password::new("Secret1!").unwrap();
        assert_eq!(password.value(), "Secret1!");
        assert_eq!(format!("{password:?}"), "Password(***)");
    }

    #[test]
    fn test_email() {
        assert!(Email::new("plaintext").is_err());
        assert!(Email::new("a@b").is_err());
        assert!(Email::new("a@b.c").is_err());
        assert!(Email::new("a@b.co").is_ok());
        assert!(Email::new("first.last@my-domain.example.com").is_ok());
        let long_local = "a".repeat(195);
        assert!(Email::new(format!("{long_local}@b.com")).is_err());
    }

    #[test]
    fn test_price_create() {
        let price = Price::create(12, 5).unwrap();
        assert_eq!(price.euros(), 12);
        assert_eq!(price.cents(), 5);
        assert_eq!(price.to_string(), "12.05");
        assert!(Price::create(-1, 0).is_err());
        assert!(Price::create(0, 100).is_err());
        assert!(Price::create(0, -1).is_err());
        assert!(Price::create(MAX_PRICE_EUROS as i64 + 1, 0).is_err());
        assert_eq!(
            Price::create(MAX_PRICE_EUROS as i64, 99).unwrap().total_cents(),
            MAX_PRICE_CENTS
        );
    }

    #[test]
    fn test_price_parse() {
        assert_eq!(Price::parse("1.6").unwrap(), Price::create(1, 60).unwrap());
        assert_eq!(Price::parse("1.06").unwrap(), Price::create(1, 6).unwrap());
        assert_eq!(Price::parse("7").unwrap(), Price::create(7, 0).unwrap());
        assert_eq!(Price::parse(".5").unwrap(), Price::create(0, 50).unwrap());
        assert!(Price::parse("").is_err());
        assert!(Price::parse("1.234").is_err());
        assert!(Price::parse("1,50").is_err());
        assert!(Price::parse("-3").is_err());
        assert!(Price::parse("99999999999").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-07-15").unwrap(), date(2024, 7, 15));
        assert_eq!(
            parse_date("2024-07-15T10:00:00+02:00").unwrap(),
            date(2024, 7, 15)
        );
        assert!(parse_date("15/07/2024").is_err());
    }

    #[test]
    fn test_reservation_period() {
        let start = date(2024, 7, 15);
        assert!(ReservationPeriod::new(start, start).is_ok());
        assert!(ReservationPeriod::new(start, date(2024, 7, 16)).is_ok());
        assert!(ReservationPeriod::new(start, date(2024, 8, 15)).is_ok());

        let err = ReservationPeriod::new(start, date(2024, 7, 14)).unwrap_err();
        assert_eq!(err.help_msg(), END_DATE_BEFORE_START_HELP);
        let err = ReservationPeriod::new(start, date(2024, 8, 16)).unwrap_err();
        assert_eq!(err.help_msg(), END_DATE_TOO_FAR_HELP);
        assert!(ReservationPeriod::new(start, date(2025, 7, 15)).is_err());
        assert!(ReservationPeriod::new(start, date(2024, 6, 15)).is_err());
    }

    #[test]
    fn test_reservation_period_uses_calendar_months() {
        // Jan 31 + 1 month lands on the last day of February.
        let start = date(2024, 1, 31);
        assert!(ReservationPeriod::new(start, date(2024, 2, 29)).is_ok());
        assert!(ReservationPeriod::new(start, date(2024, 3, 1)).is_err());

        let start = date(2023, 1, 31);
        assert!(ReservationPeriod::new(start, date(2023, 2, 28)).is_ok());
        assert!(ReservationPeriod::new(start, date(2023, 3, 1)).is_err());
    }
}
