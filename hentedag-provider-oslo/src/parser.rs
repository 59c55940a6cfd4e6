//! Parser for the caption-anchored schedule table of the Oslo pickup page.

use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use hentedag_core::{
    model::{PickupRecord, Schedule},
    ports::PortError,
};

const DATE_FORMAT: &str = "%d.%m.%Y";

static CAPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("caption").expect("invalid selector: caption"));

/// Parse the schedule table whose caption equals `address`.
///
/// The caption is matched case-insensitively against the whole address. Every
/// body row must read `[category, date description, frequency]`; a single bad
/// row rejects the whole table.
///
/// # Errors
///
/// Returns [`PortError::AddressNotFound`] when no caption matches,
/// [`PortError::EmptyTable`] when the table has no rows, and
/// [`PortError::MalformedRow`] or [`PortError::InvalidDate`] for the first
/// row that cannot be read. Tables nested inside cells are not part of the
/// schedule.
pub fn parse_schedule(html: &str, address: &str) -> Result<Schedule, PortError> {
    let document = Html::parse_document(html);
    let wanted = address.trim().to_lowercase();

    let table = document
        .select(&CAPTION)
        .filter(|caption| elem_text(*caption).to_lowercase() == wanted)
        .find_map(enclosing_table)
        .ok_or_else(|| PortError::AddressNotFound(address.to_owned()))?;

    let records = child_elements(table, "tbody")
        .flat_map(|body| child_elements(body, "tr"))
        .enumerate()
        .map(|(row, element)| parse_row(row, element))
        .collect::<Result<Vec<_>, _>>()?;

    if records.is_empty() {
        return Err(PortError::EmptyTable(address.to_owned()));
    }

    Ok(Schedule::from_records(records))
}

/// Extract the pickup date from a description such as `"Hentes 05.03.2024"`.
///
/// The date is the second whitespace-separated token, written `DD.MM.YYYY`.
#[must_use]
pub fn parse_pickup_date(description: &str) -> Option<NaiveDate> {
    date_token(description).and_then(parse_date_token)
}

fn parse_row(row: usize, element: ElementRef<'_>) -> Result<PickupRecord, PortError> {
    let cells: Vec<String> = child_elements(element, "td").map(elem_text).collect();

    let [category, description, frequency, ..] = cells.as_slice() else {
        return Err(PortError::MalformedRow {
            row,
            reason: format!("expected at least 3 cells, found {}", cells.len()),
        });
    };

    if category.is_empty() {
        return Err(PortError::MalformedRow {
            row,
            reason: "empty category".to_owned(),
        });
    }

    let token = date_token(description).ok_or_else(|| PortError::MalformedRow {
        row,
        reason: format!("no date in {description:?}"),
    })?;

    let date = parse_date_token(token).ok_or_else(|| PortError::InvalidDate {
        row,
        token: token.to_owned(),
    })?;

    Ok(PickupRecord {
        category: category.clone(),
        date,
        frequency: frequency.clone(),
    })
}

fn date_token(description: &str) -> Option<&str> {
    description.split_whitespace().nth(1)
}

// Zero-padded day and month, four-digit year.
fn parse_date_token(token: &str) -> Option<NaiveDate> {
    let well_formed = token.len() == 10
        && token.bytes().enumerate().all(|(idx, byte)| match idx {
            2 | 5 => byte == b'.',
            _ => byte.is_ascii_digit(),
        });

    if !well_formed {
        return None;
    }

    NaiveDate::parse_from_str(token, DATE_FORMAT).ok()
}

fn enclosing_table(caption: ElementRef<'_>) -> Option<ElementRef<'_>> {
    caption
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "table")
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

fn elem_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}
