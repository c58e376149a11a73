use talaga_terminal::match_data::MatchInfo;
use talaga_terminal::title::{
    format_date, format_field, format_match_title, format_time, match_title,
};

#[test]
fn formats_a_confirmed_match() {
    assert_eq!(
        format_match_title("2025-06-15", "20:00", "3"),
        "Match Sunday 15 de June - 20:00 hrs - Field 3"
    );
}

#[test]
fn unconfirmed_match_passes_sentinels_through() {
    assert_eq!(
        match_title(&MatchInfo::default()),
        "Match unconfirmed - unconfirmed - unconfirmed"
    );
}

#[test]
fn leaves_unparseable_dates_alone() {
    assert_eq!(format_date("15/06/2025"), "15/06/2025");
    assert_eq!(format_date("2025-02-30"), "2025-02-30");
    assert_eq!(format_date("2025-06-01"), "Sunday 1 de June");
}

#[test]
fn does_not_double_the_hours_suffix() {
    assert_eq!(format_time("20:00 hrs"), "20:00 hrs");
    assert_eq!(format_time("21:30"), "21:30 hrs");
    assert_eq!(format_time(""), "");
}

#[test]
fn prefixes_only_numeric_fields() {
    assert_eq!(format_field(" 3 "), "Field 3");
    assert_eq!(format_field("Cancha Norte"), "Cancha Norte");
    assert_eq!(format_field("3B"), "3B");
}
