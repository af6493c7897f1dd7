/*
 * Stride
 * Copyright (c) 2026  The Stride Developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 *
 */

//! Day index plus weekday/holiday predicates (component B).

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::custom_types::Day;

#[derive(Clone, Debug)]
pub struct Calendar {
    start_date: NaiveDate,
    day_index: Day,
    holidays: Vec<NaiveDate>,
    school_holidays: Vec<NaiveDate>,
}

impl Calendar {
    /// `holidays` and `school_holidays` are `(year, month, day)` triples,
    /// read once from configuration (§4.2).
    pub fn new(start_year: i32, start_month: u32, start_day: u32, holidays: Vec<(i32, u32, u32)>, school_holidays: Vec<(i32, u32, u32)>) -> Calendar {
        let start_date = NaiveDate::from_ymd(start_year, start_month, start_day);
        let mut holidays: Vec<NaiveDate> = holidays.into_iter().map(|(y, m, d)| NaiveDate::from_ymd(y, m, d)).collect();
        holidays.sort();
        let mut school_holidays: Vec<NaiveDate> = school_holidays.into_iter().map(|(y, m, d)| NaiveDate::from_ymd(y, m, d)).collect();
        school_holidays.sort();

        Calendar { start_date, day_index: 0, holidays, school_holidays }
    }

    pub fn day_index(&self) -> Day {
        self.day_index
    }

    pub fn current_date(&self) -> NaiveDate {
        self.start_date + Duration::days(i64::from(self.day_index))
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self.current_date().weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_holiday(&self) -> bool {
        self.holidays.binary_search(&self.current_date()).is_ok()
    }

    pub fn is_school_holiday(&self) -> bool {
        self.school_holidays.binary_search(&self.current_date()).is_ok()
    }

    pub fn advance(&mut self) {
        self.day_index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_monotonically() {
        let mut calendar = Calendar::new(2024, 1, 1, vec![], vec![]);
        assert_eq!(calendar.day_index(), 0);
        calendar.advance();
        calendar.advance();
        assert_eq!(calendar.day_index(), 2);
    }

    #[test]
    fn weekend_detection() {
        // 2024-01-06 is a Saturday.
        let mut calendar = Calendar::new(2024, 1, 1, vec![], vec![]);
        for _ in 0..5 {
            calendar.advance();
        }
        assert!(calendar.is_weekend());
    }

    #[test]
    fn holiday_set_is_read_once_and_queried_by_date() {
        let calendar = Calendar::new(2024, 1, 1, vec![(2024, 1, 1)], vec![]);
        assert!(calendar.is_holiday());
    }
}
