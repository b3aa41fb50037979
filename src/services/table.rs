//! Plain ASCII table rendering for the console.

use crate::services::departures::{Bucket, DepartureRecord, StopDepartures};

const DATETIME_FORMAT: &str = "%d.%m.%Y %H:%M";

/// A bordered ASCII table with the title spliced into the top border
pub struct AsciiTable {
    title: String,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl AsciiTable {
    pub fn new(title: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            title: title.into(),
            header,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        let widths = self.column_widths();

        let mut out = String::new();
        out.push_str(&self.top_border(&widths));
        out.push('\n');
        out.push_str(&Self::format_row(&self.header, &widths));
        out.push('\n');
        out.push_str(&Self::plain_border(&widths));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&Self::format_row(row, &widths));
            out.push('\n');
        }
        out.push_str(&Self::plain_border(&widths));
        out
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .header
            .iter()
            .map(|cell| cell.chars().count())
            .collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }
        widths
    }

    /// Top border with the title embedded, e.g. `+Perkerhof---+-----+`
    fn top_border(&self, widths: &[usize]) -> String {
        let plain = Self::plain_border(widths);
        let total = plain.chars().count();
        let title: String = self.title.chars().take(total.saturating_sub(2)).collect();
        let title_width = title.chars().count();

        let mut border = String::from("+");
        border.push_str(&title);
        border.extend(plain.chars().skip(1 + title_width));
        border
    }

    fn plain_border(widths: &[usize]) -> String {
        let mut border = String::from("+");
        for width in widths {
            border.push_str(&"-".repeat(width + 2));
            border.push('+');
        }
        border
    }

    fn format_row(cells: &[String], widths: &[usize]) -> String {
        let mut line = String::from("|");
        for (i, width) in widths.iter().enumerate() {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            let pad = width - cell.chars().count();
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(pad + 1));
            line.push('|');
        }
        line
    }
}

/// Render normalized departures as a console table titled with the stop name
pub fn departure_table(stop: &StopDepartures) -> String {
    let header = ["line", "destination", "platform", "departure", "delay", "countdown"]
        .map(String::from)
        .to_vec();

    let mut table = AsciiTable::new(stop.stop_name.clone(), header);
    for record in &stop.departures {
        table.push_row(departure_row(record));
    }
    table.render()
}

fn departure_row(record: &DepartureRecord) -> Vec<String> {
    let countdown = match record.bucket {
        Bucket::Immediate => "now".to_string(),
        Bucket::Soon => format!("in: {} min", record.countdown),
        Bucket::Later => String::new(),
    };

    vec![
        record.line.clone(),
        record.destination.clone(),
        record.platform.clone(),
        record.departure.format(DATETIME_FORMAT).to_string(),
        record.delay.clone().unwrap_or_else(|| "0".to_string()),
        countdown,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Berlin;

    fn record(bucket: Bucket, countdown: i64, delay: Option<&str>) -> DepartureRecord {
        DepartureRecord {
            line: "U11".to_string(),
            destination: "Düsseldorf Hbf".to_string(),
            platform: "Gl. 2".to_string(),
            departure: Berlin.with_ymd_and_hms(2024, 3, 5, 9, 5, 0).unwrap(),
            delay: delay.map(String::from),
            countdown,
            bucket,
        }
    }

    #[test]
    fn soon_row_formats_countdown_label() {
        let row = departure_row(&record(Bucket::Soon, 3, None));
        assert_eq!(
            row,
            vec!["U11", "Düsseldorf Hbf", "Gl. 2", "05.03.2024 09:05", "0", "in: 3 min"]
        );
    }

    #[test]
    fn immediate_row_is_labelled_now() {
        let row = departure_row(&record(Bucket::Immediate, 0, None));
        assert_eq!(row[5], "now");
    }

    #[test]
    fn later_row_has_empty_countdown_cell() {
        let row = departure_row(&record(Bucket::Later, 119, None));
        assert_eq!(row[5], "");
    }

    #[test]
    fn reported_delay_is_shown_verbatim() {
        let row = departure_row(&record(Bucket::Soon, 7, Some("4")));
        assert_eq!(row[4], "4");
    }

    #[test]
    fn table_embeds_title_in_top_border() {
        let stop = StopDepartures {
            stop_name: "Perkerhof".to_string(),
            departures: vec![record(Bucket::Soon, 3, None)],
        };
        let rendered = departure_table(&stop);
        let first_line = rendered.lines().next().unwrap();
        assert!(first_line.starts_with("+Perkerhof-"));
        assert!(rendered.contains("| U11 "));
        assert!(rendered.contains("| destination "));
    }

    #[test]
    fn columns_are_padded_to_widest_cell() {
        let mut table = AsciiTable::new("t", vec!["a".to_string(), "bb".to_string()]);
        table.push_row(vec!["xxx".to_string(), "y".to_string()]);
        let rendered = table.render();
        assert!(rendered.contains("| a   | bb |"));
        assert!(rendered.contains("| xxx | y  |"));
    }
}
