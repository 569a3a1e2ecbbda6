use chrono::{Datelike, NaiveDateTime};

/// Label a timestamp relative to `now`: just the time for today,
/// "Yesterday" for the day before, month and day within the current year,
/// and the full date otherwise.
pub fn format_depending_on_day(at: NaiveDateTime, now: NaiveDateTime) -> String {
    let today = now.date();
    let day = at.date();
    let time = at.format("%H:%M");

    if day == today {
        time.to_string()
    } else if today.pred_opt() == Some(day) {
        format!("Yesterday, {}", time)
    } else if day.year() == today.year() {
        format!("{}, {}", at.format("%b %-d"), time)
    } else {
        format!("{}, {}", at.format("%b %-d %Y"), time)
    }
}
