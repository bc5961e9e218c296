//! Rolling window of bookable visit dates.
//!
//! The window is regenerated from "today" every time the checkout is mounted
//! and is never persisted. One fixed weekday is the park's closure day: those
//! slots are shown but can never become the active selection.

use crate::types::Language;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Default number of days offered for booking
pub const DEFAULT_WINDOW_DAYS: usize = 14;

/// Default weekly closure day
pub const DEFAULT_CLOSURE_DAY: Weekday = Weekday::Mon;

const WEEKDAYS_EN: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const WEEKDAYS_HI: [&str; 7] = ["सोम", "मंगल", "बुध", "गुरु", "शुक्र", "शनि", "रवि"];
const MONTHS_EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTHS_HI: [&str; 12] = [
    "जन", "फ़र", "मार्च", "अप्रैल", "मई", "जून", "जुल", "अग", "सितं", "अक्टू", "नवं", "दिसं",
];

/// One bookable (or closed) day in the window
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSlot {
    /// Calendar date
    pub date: NaiveDate,
    /// Whether the park is closed on this date
    pub closed: bool,
    /// Localized short weekday name
    pub weekday_label: String,
    /// Day of month
    pub day: u32,
    /// Localized short month name
    pub month_label: String,
}

impl DateSlot {
    fn new(date: NaiveDate, closure_day: Weekday, language: Language) -> Self {
        let weekday = date.weekday().num_days_from_monday() as usize;
        let month = date.month0() as usize;
        let (weekdays, months) = match language {
            Language::English => (&WEEKDAYS_EN, &MONTHS_EN),
            Language::Hindi => (&WEEKDAYS_HI, &MONTHS_HI),
        };

        Self {
            date,
            closed: date.weekday() == closure_day,
            weekday_label: weekdays[weekday].to_string(),
            day: date.day(),
            month_label: months[month].to_string(),
        }
    }

    /// ISO day key (`YYYY-MM-DD`)
    #[must_use]
    pub fn key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Builds `window_len` consecutive slots starting at `today`.
///
/// Deterministic: the same inputs always yield the same sequence.
#[must_use]
pub fn generate_window(
    window_len: usize,
    today: NaiveDate,
    closure_day: Weekday,
    language: Language,
) -> Vec<DateSlot> {
    (0..window_len)
        .map_while(|offset| today.checked_add_days(Days::new(offset as u64)))
        .map(|date| DateSlot::new(date, closure_day, language))
        .collect()
}

/// Outcome of [`DateAvailability::select_date`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateSelection {
    /// The slot became the active selection
    Selected(NaiveDate),
    /// The slot is a closure day; the selection did not change
    Closed(NaiveDate),
    /// No slot at that index; the selection did not change
    OutOfRange,
}

/// The date strip of one checkout session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateAvailability {
    window_len: usize,
    closure_day: Weekday,
    language: Language,
    slots: Vec<DateSlot>,
    active: usize,
    closed_notice: Option<NaiveDate>,
}

impl DateAvailability {
    /// Creates an unmounted date strip
    #[must_use]
    pub const fn new(window_len: usize, closure_day: Weekday, language: Language) -> Self {
        Self {
            window_len,
            closure_day,
            language,
            slots: Vec::new(),
            active: 0,
            closed_notice: None,
        }
    }

    /// Regenerates the window from `today` and picks the first open slot.
    ///
    /// If every slot is closed the active index stays at 0 and no notice is
    /// raised until the visitor interacts.
    pub fn mount(&mut self, today: NaiveDate) {
        self.slots = generate_window(self.window_len, today, self.closure_day, self.language);
        self.active = self.slots.iter().position(|slot| !slot.closed).unwrap_or(0);
        self.closed_notice = None;

        tracing::debug!(
            %today,
            window = self.slots.len(),
            active = self.active,
            "Mounted date window"
        );
    }

    /// Makes slot `index` the active selection unless it is closed.
    ///
    /// Selecting a closed slot leaves the active index untouched and raises
    /// the closed-day notice instead.
    pub fn select_date(&mut self, index: usize) -> DateSelection {
        let Some(slot) = self.slots.get(index) else {
            return DateSelection::OutOfRange;
        };

        if slot.closed {
            self.closed_notice = Some(slot.date);
            return DateSelection::Closed(slot.date);
        }

        self.active = index;
        self.closed_notice = None;
        DateSelection::Selected(slot.date)
    }

    /// Re-localizes the slot labels, keeping dates and selection
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        for slot in &mut self.slots {
            *slot = DateSlot::new(slot.date, self.closure_day, language);
        }
    }

    /// All slots in the window
    #[must_use]
    pub fn slots(&self) -> &[DateSlot] {
        &self.slots
    }

    /// Index of the active slot
    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.active
    }

    /// The active slot, only if it is open
    #[must_use]
    pub fn active_slot(&self) -> Option<&DateSlot> {
        self.slots.get(self.active).filter(|slot| !slot.closed)
    }

    /// Date of the last closed slot the visitor tried to select
    #[must_use]
    pub const fn closed_notice(&self) -> Option<NaiveDate> {
        self.closed_notice
    }

    /// Hides the closed-day notice
    pub fn dismiss_notice(&mut self) {
        self.closed_notice = None;
    }

    /// The configured closure weekday
    #[must_use]
    pub const fn closure_day(&self) -> Weekday {
        self.closure_day
    }

    /// The active language
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }
}

impl Default for DateAvailability {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS, DEFAULT_CLOSURE_DAY, Language::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_is_fixed_length_and_deterministic() {
        let today = date(2025, 1, 10);
        let first = generate_window(14, today, Weekday::Mon, Language::English);
        let second = generate_window(14, today, Weekday::Mon, Language::English);

        assert_eq!(first.len(), 14);
        assert_eq!(first, second);
        assert_eq!(first[0].key(), "2025-01-10");
        assert_eq!(first[13].key(), "2025-01-23");
    }

    #[test]
    fn only_the_closure_weekday_is_closed() {
        let slots = generate_window(14, date(2025, 1, 10), Weekday::Mon, Language::English);
        let closed: Vec<String> = slots.iter().filter(|s| s.closed).map(DateSlot::key).collect();
        assert_eq!(closed, ["2025-01-13", "2025-01-20"]);
    }

    #[test]
    fn labels_follow_language() {
        let english = generate_window(1, date(2025, 1, 10), Weekday::Mon, Language::English);
        assert_eq!(english[0].weekday_label, "Fri");
        assert_eq!(english[0].month_label, "Jan");
        assert_eq!(english[0].day, 10);

        let hindi = generate_window(1, date(2025, 1, 10), Weekday::Mon, Language::Hindi);
        assert_eq!(hindi[0].weekday_label, "शुक्र");
        assert_eq!(hindi[0].month_label, "जन");
    }

    #[test]
    fn mount_on_closure_day_advances_to_first_open_slot() {
        let mut calendar = DateAvailability::default();
        calendar.mount(date(2025, 1, 13)); // Monday

        assert_eq!(calendar.active_index(), 1);
        assert_eq!(calendar.active_slot().unwrap().key(), "2025-01-14");
        assert_eq!(calendar.closed_notice(), None);
    }

    #[test]
    fn mount_with_no_open_slot_defaults_to_first_without_notice() {
        let mut calendar = DateAvailability::new(1, Weekday::Mon, Language::English);
        calendar.mount(date(2025, 1, 13));

        assert_eq!(calendar.active_index(), 0);
        assert!(calendar.active_slot().is_none());
        assert_eq!(calendar.closed_notice(), None);
    }

    #[test]
    fn selecting_closed_slot_keeps_active_index_and_raises_notice() {
        let mut calendar = DateAvailability::default();
        calendar.mount(date(2025, 1, 10));
        assert_eq!(calendar.select_date(2), DateSelection::Selected(date(2025, 1, 12)));

        assert_eq!(calendar.select_date(3), DateSelection::Closed(date(2025, 1, 13)));
        assert_eq!(calendar.active_index(), 2);
        assert_eq!(calendar.closed_notice(), Some(date(2025, 1, 13)));

        calendar.select_date(4);
        assert_eq!(calendar.closed_notice(), None);
    }

    #[test]
    fn out_of_range_selection_is_a_no_op() {
        let mut calendar = DateAvailability::default();
        calendar.mount(date(2025, 1, 10));
        assert_eq!(calendar.select_date(99), DateSelection::OutOfRange);
        assert_eq!(calendar.active_index(), 0);
    }

    #[test]
    fn unmounted_calendar_has_no_active_slot() {
        assert!(DateAvailability::default().active_slot().is_none());
    }

    #[test]
    fn relocalizing_keeps_selection() {
        let mut calendar = DateAvailability::default();
        calendar.mount(date(2025, 1, 10));
        calendar.select_date(1);
        calendar.set_language(Language::Hindi);

        assert_eq!(calendar.active_index(), 1);
        assert_eq!(calendar.active_slot().unwrap().weekday_label, "शनि");
    }
}
