use beach_umbrella_cli::domain::{
    NumberOfSeats, Price, ReservationId, ReservationPeriod, ReservedUmbrellaId, MAX_PRICE_EUROS,
};
use chrono::{Days, Months, NaiveDate};
use proptest::prelude::*;

fn any_date() -> impl Strategy<Value = NaiveDate> {
    // 2000-01-01 plus up to ~60 years of days.
    (0u64..22_000).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + Days::new(offset)
    })
}

proptest! {
    #[test]
    fn test_number_of_seats_accepts_only_two_to_four(n in -1_000i64..1_000) {
        prop_assert_eq!(NumberOfSeats::new(n).is_ok(), (2..=4).contains(&n));
    }

    #[test]
    fn test_umbrella_id_accepts_only_zero_to_fifty(n in -1_000i64..1_000) {
        prop_assert_eq!(ReservedUmbrellaId::new(n).is_ok(), (0..=50).contains(&n));
    }

    #[test]
    fn test_reservation_id_accepts_only_non_negative(n in any::<i64>()) {
        prop_assert_eq!(ReservationId::new(n).is_ok(), n >= 0);
    }

    #[test]
    fn test_period_accepts_end_within_one_calendar_month(
        start in any_date(),
        delta in -60i64..90,
    ) {
        let end = if delta >= 0 {
            start + Days::new(delta as u64)
        } else {
            start - Days::new(delta.unsigned_abs())
        };
        let latest = start.checked_add_months(Months::new(1)).unwrap();
        let expected = start <= end && end <= latest;
        prop_assert_eq!(ReservationPeriod::new(start, end).is_ok(), expected);
    }

    #[test]
    fn test_price_display_parses_back(euros in 0..=MAX_PRICE_EUROS as i64, cents in 0i64..=99) {
        let price = Price::create(euros, cents).unwrap();
        let parsed = Price::parse(&price.to_string()).unwrap();
        prop_assert_eq!(parsed, price);
        prop_assert_eq!(parsed.euros() as i64, euros);
        prop_assert_eq!(parsed.cents() as i64, cents);
    }
}
