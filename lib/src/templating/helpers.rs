//! Functions available in every template.

use std::fmt::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use minijinja::value::{from_args, Enumerator, Object, Value};
use minijinja::{Environment, Error, ErrorKind, State};

use crate::sort::{self, Order};

/// Layouts tried, in order, by [`parse_date()`] after RFC 3339.
pub const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_ONLY_LAYOUT: &str = "%Y-%m-%d";

pub fn register(env: &mut Environment<'_>) {
    env.add_function("split", split);
    env.add_function("contains", contains);
    env.add_function("sort", sort);
    env.add_function("parseDate", parse_date_value);
    env.add_function("dateFormat", date_format);
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

/// Parses a date string. Inputs without a zone are taken to be UTC.
pub fn parse_date(input: &str) -> crate::error::Result<DateTime<FixedOffset>> {
    if input.is_empty() {
        return err!("blank date/time");
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(input) {
        return Ok(datetime);
    }

    for layout in DATE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, layout) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, DATE_ONLY_LAYOUT) {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    err!(format!("unrecognised date/time: '{input}'"))
}

/// Formats `datetime` with the strftime-style `layout`.
pub fn format_date(datetime: &DateTime<FixedOffset>, layout: &str) -> crate::error::Result<String> {
    let mut output = String::new();
    match write!(output, "{}", datetime.format(layout)) {
        Ok(()) => Ok(output),
        Err(_) => err!(format!("invalid date layout: '{layout}'")),
    }
}

fn split(string: &str, delimiter: &str) -> Vec<String> {
    if delimiter.is_empty() {
        return string.chars().map(String::from).collect();
    }

    string.split(delimiter).map(String::from).collect()
}

fn contains(haystack: Value, needle: &str) -> bool {
    use minijinja::value::ValueKind;

    match haystack.kind() {
        ValueKind::String => haystack.as_str().map_or(false, |s| s.contains(needle)),
        ValueKind::Seq | ValueKind::Iterable => haystack.try_iter()
            .map_or(false, |mut items| items.any(|item| item.as_str() == Some(needle))),
        _ => false,
    }
}

fn sort(collection: Value, field: Option<&str>, order: Option<&str>) -> Result<Value, Error> {
    let order = match order {
        Some(order) => order.parse::<Order>().map_err(|e| invalid(e.to_string()))?,
        None => Order::default(),
    };

    let sorted = sort::sort(&collection, field, order).map_err(|e| invalid(e.to_string()))?;
    Ok(Value::from(sorted))
}

fn parse_date_value(input: &str) -> Result<Value, Error> {
    let datetime = parse_date(input).map_err(|e| invalid(e.message()))?;
    Ok(Value::from_object(Date(datetime)))
}

fn date_format(layout: &str, input: &str) -> Result<String, Error> {
    let datetime = parse_date(input).map_err(|e| invalid(e.message()))?;
    format_date(&datetime, layout).map_err(|e| invalid(e.message()))
}

/// A parsed date, as seen by templates.
#[derive(Debug)]
pub struct Date(pub DateTime<FixedOffset>);

impl Object for Date {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let dt = &self.0;
        let value = match key.as_str()? {
            "year" => Value::from(dt.year()),
            "month" => Value::from(dt.month()),
            "day" => Value::from(dt.day()),
            "hour" => Value::from(dt.hour()),
            "minute" => Value::from(dt.minute()),
            "second" => Value::from(dt.second()),
            "weekday" => Value::from(weekday_name(dt.weekday())),
            "unix" => Value::from(dt.timestamp()),
            _ => return None,
        };

        Some(value)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["year", "month", "day", "hour", "minute", "second", "weekday", "unix"])
    }

    fn call_method(
        self: &Arc<Self>,
        _: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "format" => {
                let (layout,): (&str,) = from_args(args)?;
                format_date(&self.0, layout)
                    .map(Value::from)
                    .map_err(|e| invalid(e.message()))
            }
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

fn weekday_name(weekday: chrono::Weekday) -> &'static str {
    use chrono::Weekday::*;

    match weekday {
        Mon => "Monday",
        Tue => "Tuesday",
        Wed => "Wednesday",
        Thu => "Thursday",
        Fri => "Friday",
        Sat => "Saturday",
        Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    fn render(source: &str) -> Result<String, Error> {
        let mut env = Environment::new();
        register(&mut env);
        env.render_str(source, context! {
            words => vec!["a", "b"],
            people => vec![
                context! { name => "bob", age => 30 },
                context! { name => "al", age => 4 },
            ],
        })
    }

    #[test]
    fn date_layouts() {
        let utc = |s: &str| parse_date(s).unwrap().to_rfc3339();
        assert_eq!(utc("2024-03-05T10:20:30+02:00"), "2024-03-05T10:20:30+02:00");
        assert_eq!(utc("2024-03-05T10:20:30"), "2024-03-05T10:20:30+00:00");
        assert_eq!(utc("2024-03-05 10:20:30"), "2024-03-05T10:20:30+00:00");
        assert_eq!(utc("2024-03-05T10:20"), "2024-03-05T10:20:00+00:00");
        assert_eq!(utc("2024-03-05 10:20"), "2024-03-05T10:20:00+00:00");
        assert_eq!(utc("2024-03-05"), "2024-03-05T00:00:00+00:00");
    }

    #[test]
    fn bad_dates() {
        assert_eq!(parse_date("").unwrap_err().message(), "blank date/time");
        assert_eq!(parse_date("March 5th").unwrap_err().message(), "unrecognised date/time: 'March 5th'");
        assert_eq!(parse_date("2024-13-01").unwrap_err().message(), "unrecognised date/time: '2024-13-01'");
    }

    #[test]
    fn template_helpers() {
        assert_eq!(render("{{ split('a,b,c', ',') | join('|') }}").unwrap(), "a|b|c");
        let yes_no = "{% for hit in [contains('hello', 'ell'), contains(words, 'b'), contains(words, 'z'), contains(3, '3')] %}{{ 'y' if hit else 'n' }}{% endfor %}";
        assert_eq!(render(yes_no).unwrap(), "yynn");
        assert_eq!(render("{% for p in sort(people, 'age') %}{{ p.name }} {% endfor %}").unwrap(), "al bob ");
        assert_eq!(render("{% for p in sort(people, 'name', 'desc') %}{{ p.name }} {% endfor %}").unwrap(), "bob al ");
        assert_eq!(render("{{ dateFormat('%d/%m/%Y', '2024-03-05') }}").unwrap(), "05/03/2024");
    }

    #[test]
    fn date_object() {
        let out = render("{% set d = parseDate('2024-03-05T10:20:30Z') %}{{ d.year }}-{{ d.month }}-{{ d.day }} {{ d.weekday }} {{ d.unix }}").unwrap();
        assert_eq!(out, "2024-3-5 Tuesday 1709634030");

        let out = render("{{ parseDate('2024-03-05').format('%B %-d, %Y') }}").unwrap();
        assert_eq!(out, "March 5, 2024");

        let out = render("{{ parseDate('2024-03-05') }}").unwrap();
        assert_eq!(out, "2024-03-05T00:00:00+00:00");
    }

    #[test]
    fn helper_errors_fail_rendering() {
        assert!(render("{{ dateFormat('%Y', '') }}").is_err());
        assert!(render("{{ sort(words, '', 'sideways') }}").is_err());
        assert!(render("{{ sort(people, 'height') }}").is_err());
        assert!(render("{{ sort(true) }}").is_err());
        assert!(render("{{ dateFormat('%Q', '2024-01-01') }}").is_err());
    }
}
