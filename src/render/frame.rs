//! Frame composition.
//!
//! [`render_frame`] maps the renderer state onto three logical rows
//! (station, status, line fields), flows them onto the panel's text lines,
//! and rasterizes those into a pixel buffer.

use std::time::Duration;

use chrono::{DateTime, Local, Utc};

use super::font::{self, ADVANCE, GLYPH_HEIGHT, LINE_PITCH};
use super::layout::{fit_row, flow_fields, Segment, TextRow};
use super::palette::{Palette, Rgb, DIM_PERCENT};
use crate::renderer::{DisplayState, RendererState};
use crate::status::StatusRecord;

/// Logical row holding the station name.
pub const STATION_ROW: usize = 0;
/// Logical row holding the period label or error headline.
pub const STATUS_ROW: usize = 1;
/// Logical row holding the line fields, or the failure reason in ERROR.
pub const LINES_ROW: usize = 2;

/// Panel size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            width: 64,
            height: 32,
        }
    }
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn chars_per_line(&self) -> usize {
        font::chars_per_line(self.width)
    }

    pub fn text_lines(&self) -> usize {
        font::text_lines(self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Layout policy knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub geometry: Geometry,
    /// Percent of full intensity, 1..=100.
    pub brightness: u8,
    /// NORMAL data older than this is marked stale.
    pub stale_after: Duration,
    /// Show `@HH:MM` of the last success instead of the period while recovering.
    pub show_last_success: bool,
    /// Station name shown before any status has arrived.
    pub title: String,
    pub palette: Palette,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            brightness: 100,
            stale_after: Duration::from_secs(90),
            show_last_success: false,
            title: String::new(),
            palette: Palette::standard(),
        }
    }
}

/// One fully specified panel frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub geometry: Geometry,
    pub state: DisplayState,
    /// Station, status and line rows, before wrapping.
    pub rows: Vec<TextRow>,
    /// What is drawn, one entry per text line from the top.
    pub text_lines: Vec<TextRow>,
    /// Shown data may be out of date.
    pub stale: bool,
    /// Final frame after the producer went away.
    pub offline: bool,
    pixels: Vec<Rgb>,
}

impl Frame {
    /// Text of a logical row; empty when the row is blank or absent.
    pub fn row_text(&self, row: usize) -> String {
        self.rows.get(row).map(TextRow::text).unwrap_or_default()
    }

    pub fn row(&self, row: usize) -> Option<&TextRow> {
        self.rows.get(row)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if !self.geometry.contains(x, y) {
            return None;
        }
        self.pixels
            .get(y as usize * self.geometry.width as usize + x as usize)
            .copied()
    }

    /// Every pixel as `(x, y, color)`, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, Rgb)> + '_ {
        let width = self.geometry.width.max(1);
        self.pixels
            .iter()
            .enumerate()
            .map(move |(i, color)| (i as u32 % width, i as u32 / width, *color))
    }

    pub fn lit_pixels(&self) -> usize {
        self.pixels.iter().filter(|c| c.is_lit()).count()
    }

    fn set(&mut self, x: u32, y: u32, color: Rgb) {
        if self.geometry.contains(x, y) {
            let index = y as usize * self.geometry.width as usize + x as usize;
            self.pixels[index] = color;
        }
    }
}

struct Layout {
    station: TextRow,
    status: TextRow,
    /// Line fields already flowed onto text lines, or a single reason row.
    body: Vec<TextRow>,
    stale: bool,
    offline: bool,
}

/// Compose the frame for `state` as of `now`.
pub fn render_frame(
    state: &RendererState,
    options: &LayoutOptions,
    now: DateTime<Utc>,
) -> Frame {
    let layout = match (state.current, &state.last_good) {
        (DisplayState::ShuttingDown, Some(record)) => Layout {
            offline: true,
            stale: false,
            ..status_layout(record, state.current, options, now)
        },
        (DisplayState::ShuttingDown, None) => offline_layout(options),
        (DisplayState::Normal | DisplayState::Recovering, Some(record)) => {
            status_layout(record, state.current, options, now)
        }
        _ => error_layout(state, options),
    };

    let lines_row = TextRow {
        segments: layout
            .body
            .iter()
            .flat_map(|row| row.segments.iter().cloned())
            .collect(),
    };

    let mut text_lines = vec![layout.station.clone(), layout.status.clone()];
    text_lines.extend(layout.body);
    text_lines.truncate(options.geometry.text_lines());

    let mut frame = Frame {
        geometry: options.geometry,
        state: state.current,
        rows: vec![layout.station, layout.status, lines_row],
        text_lines,
        stale: layout.stale,
        offline: layout.offline,
        pixels: vec![Rgb::BLACK; options.geometry.pixel_count()],
    };
    rasterize(&mut frame, options);
    frame
}

fn status_layout(
    record: &StatusRecord,
    current: DisplayState,
    options: &LayoutOptions,
    now: DateTime<Utc>,
) -> Layout {
    let budget = options.geometry.chars_per_line();
    let palette = &options.palette;

    let status = if current == DisplayState::Recovering && options.show_last_success {
        let at = record.fetched_at.with_timezone(&Local);
        format!("@{}", at.format("%H:%M"))
    } else {
        record.period_label.clone()
    };

    let fields = record
        .lines
        .iter()
        .map(|line| Segment::new(line.field_text(), palette.level_color(line.service_level)))
        .collect();
    let field_rows = options.geometry.text_lines().saturating_sub(2);

    let too_old = (now - record.fetched_at)
        .to_std()
        .map(|age| age > options.stale_after)
        .unwrap_or(false);

    Layout {
        station: fit_row(&record.station_name, palette.text, budget),
        status: fit_row(&status, palette.text, budget),
        body: flow_fields(fields, budget, field_rows),
        stale: current == DisplayState::Recovering || too_old,
        offline: false,
    }
}

fn error_layout(state: &RendererState, options: &LayoutOptions) -> Layout {
    let budget = options.geometry.chars_per_line();
    let palette = &options.palette;

    let station = state
        .last_good
        .as_ref()
        .map_or(options.title.as_str(), |record| record.station_name.as_str());
    let headline = if state.is_connecting() {
        "Connecting"
    } else {
        "No status"
    };
    let reason = state
        .last_failure
        .map(|marker| fit_row(marker.reason.label(), palette.amber, budget))
        .into_iter()
        .filter(|row| !row.is_empty())
        .collect();

    Layout {
        station: fit_row(station, palette.amber, budget),
        status: fit_row(headline, palette.alert, budget),
        body: reason,
        stale: false,
        offline: false,
    }
}

fn offline_layout(options: &LayoutOptions) -> Layout {
    let budget = options.geometry.chars_per_line();
    Layout {
        station: fit_row(&options.title, options.palette.amber, budget),
        status: fit_row("Offline", options.palette.alert, budget),
        body: Vec::new(),
        stale: false,
        offline: true,
    }
}

fn rasterize(frame: &mut Frame, options: &LayoutOptions) {
    let dimmed = frame.stale || frame.offline;
    let shade = |color: Rgb| {
        let color = color.scale(options.brightness);
        if dimmed {
            color.scale(DIM_PERCENT)
        } else {
            color
        }
    };

    let lines = std::mem::take(&mut frame.text_lines);
    for (line, row) in lines.iter().enumerate() {
        let top = line as u32 * LINE_PITCH;
        for (col, (c, color)) in row.cells().into_iter().enumerate() {
            let left = col as u32 * ADVANCE;
            let color = shade(color);
            for (dx, bits) in font::glyph(c).iter().enumerate() {
                for dy in 0..GLYPH_HEIGHT {
                    if bits >> dy & 1 == 1 {
                        frame.set(left + dx as u32, top + dy, color);
                    }
                }
            }
        }
    }
    frame.text_lines = lines;

    // Corner markers stay at full panel brightness
    let right = frame.geometry.width.saturating_sub(1);
    if frame.offline {
        let red = options.palette.alert.scale(options.brightness);
        let left = right.saturating_sub(1);
        for (x, y) in [(right, 0), (left, 0), (right, 1), (left, 1)] {
            frame.set(x, y, red);
        }
    } else if frame.stale {
        frame.set(right, 0, options.palette.amber.scale(options.brightness));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{
        FailureMarker, FailureReason, FrequencyRange, LineStatus, Message, ServiceLevel,
    };

    fn line(code: &str, min: u16, max: u16, level: ServiceLevel) -> LineStatus {
        LineStatus::new(code, FrequencyRange::new(min, max).unwrap(), level)
    }

    fn record(lines: Vec<LineStatus>, fetched_at: DateTime<Utc>) -> StatusRecord {
        StatusRecord {
            station_name: "BERRI-UQAM".to_string(),
            period_label: "Weekend".to_string(),
            lines,
            fetched_at,
        }
    }

    fn failure(now: DateTime<Utc>) -> Message {
        Message::Failure(FailureMarker::new(FailureReason::Network, now))
    }

    fn options() -> LayoutOptions {
        LayoutOptions {
            title: "Berri-UQAM".to_string(),
            ..LayoutOptions::default()
        }
    }

    /// Read `<code>:<min>-<max>m <abbrev>` back out of a line field.
    fn decode_field(text: &str) -> Option<(String, u16, u16, String)> {
        let (code, rest) = text.split_once(':')?;
        let (range, abbrev) = rest.split_once("m ")?;
        let (min, max) = range.split_once('-')?;
        Some((
            code.to_string(),
            min.parse().ok()?,
            max.parse().ok()?,
            abbrev.to_string(),
        ))
    }

    #[test]
    fn test_weekend_scenario() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        state.apply(Message::Status(record(
            vec![
                line("G", 4, 8, ServiceLevel::Normal),
                line("O", 4, 8, ServiceLevel::Normal),
            ],
            now,
        )));

        let frame = render_frame(&state, &options(), now);
        let green = Palette::standard().normal;

        assert_eq!(frame.row_text(STATION_ROW), "BERRI-UQAM");
        assert_eq!(frame.row_text(STATUS_ROW), "Weekend");
        assert_eq!(frame.row_text(LINES_ROW), "G:4-8m N O:4-8m N");
        let fields = &frame.row(LINES_ROW).unwrap().segments;
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().all(|f| f.color == green));
        assert!(!frame.stale);

        // Two 8-character fields need a text line each on a 10-character panel
        assert_eq!(frame.text_lines.len(), 4);
        assert_eq!(frame.text_lines[2].text(), "G:4-8m N");
        assert_eq!(frame.text_lines[3].text(), "O:4-8m N");
    }

    #[test]
    fn test_line_field_reads_back() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        state.apply(Message::Status(record(
            vec![line("A", 4, 8, ServiceLevel::Normal)],
            now,
        )));

        let frame = render_frame(&state, &options(), now);
        assert_eq!(frame.row_text(LINES_ROW), "A:4-8m N");
        assert_eq!(
            decode_field(&frame.row_text(LINES_ROW)),
            Some(("A".to_string(), 4, 8, "N".to_string()))
        );
    }

    #[test]
    fn test_empty_lines_keep_header_rows() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        state.apply(Message::Status(record(Vec::new(), now)));

        let frame = render_frame(&state, &options(), now);
        assert_eq!(frame.row_text(STATION_ROW), "BERRI-UQAM");
        assert_eq!(frame.row_text(STATUS_ROW), "Weekend");
        assert_eq!(frame.row_text(LINES_ROW), "");
        assert_eq!(frame.text_lines.len(), 2);
        // Nothing drawn below the second text line
        assert!(frame
            .pixels()
            .filter(|(_, y, _)| *y >= 2 * LINE_PITCH)
            .all(|(_, _, c)| !c.is_lit()));
    }

    #[test]
    fn test_level_colors_and_alert_indicator() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        state.apply(Message::Status(record(
            vec![
                line("G", 4, 8, ServiceLevel::Reduced),
                line("O", 0, 0, ServiceLevel::Alert),
            ],
            now,
        )));

        let frame = render_frame(&state, &options(), now);
        let palette = Palette::standard();
        let fields = &frame.row(LINES_ROW).unwrap().segments;
        assert_eq!(fields[0].text, "G:4-8m W");
        assert_eq!(fields[0].color, palette.reduced);
        assert!(fields[1].text.ends_with('!'));
        assert_eq!(fields[1].color, palette.alert);
    }

    #[test]
    fn test_overflowing_fields_are_dropped_whole() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        state.apply(Message::Status(record(
            vec![
                line("G", 2, 4, ServiceLevel::Normal),
                line("O", 2, 4, ServiceLevel::Normal),
                line("Y", 3, 5, ServiceLevel::Normal),
            ],
            now,
        )));

        let frame = render_frame(&state, &options(), now);
        assert_eq!(frame.row_text(LINES_ROW), "G:2-4m N O:2-4m N");
    }

    #[test]
    fn test_station_name_truncated_without_ellipsis() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        let mut long = record(Vec::new(), now);
        long.station_name = "Lionel-Groulx".to_string();
        state.apply(Message::Status(long));

        let frame = render_frame(&state, &options(), now);
        assert_eq!(frame.row_text(STATION_ROW), "Lionel-Gro");
    }

    #[test]
    fn test_error_frame_has_no_line_data() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        state.apply(Message::Status(record(
            vec![line("G", 4, 8, ServiceLevel::Normal)],
            now,
        )));
        for _ in 0..4 {
            state.apply(failure(now));
        }
        assert_eq!(state.current, DisplayState::Error);

        let frame = render_frame(&state, &options(), now);
        let palette = Palette::standard();
        assert_eq!(frame.row_text(STATION_ROW), "BERRI-UQAM");
        assert_eq!(frame.row_text(STATUS_ROW), "No status");
        assert_eq!(frame.row_text(LINES_ROW), "NETWORK");
        assert!(!frame.row_text(LINES_ROW).contains("G:"));
        assert_eq!(frame.row(STATUS_ROW).unwrap().segments[0].color, palette.alert);
    }

    #[test]
    fn test_connecting_frame() {
        let frame = render_frame(&RendererState::new(3), &options(), Utc::now());
        assert_eq!(frame.state, DisplayState::Error);
        assert_eq!(frame.row_text(STATION_ROW), "Berri-UQAM");
        assert_eq!(frame.row_text(STATUS_ROW), "Connecting");
        assert_eq!(frame.row_text(LINES_ROW), "");
    }

    #[test]
    fn test_recovering_is_dimmed_and_marked() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        state.apply(Message::Status(record(
            vec![line("G", 4, 8, ServiceLevel::Normal)],
            now,
        )));
        let fresh = render_frame(&state, &options(), now);
        state.apply(failure(now));
        let stale = render_frame(&state, &options(), now);

        assert!(stale.stale);
        assert_eq!(stale.row_text(LINES_ROW), "G:4-8m N");
        assert_eq!(stale.pixel(63, 0), Some(Palette::standard().amber));
        assert_eq!(fresh.pixel(63, 0), Some(Rgb::BLACK));

        let brightest = |frame: &Frame| frame.pixels().map(|(_, _, c)| c.g).max();
        assert_eq!(brightest(&fresh), Some(255));
        assert!(brightest(&stale) < Some(255));
    }

    #[test]
    fn test_old_normal_data_is_stale() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        state.apply(Message::Status(record(Vec::new(), now - chrono::Duration::minutes(5))));

        let frame = render_frame(&state, &options(), now);
        assert_eq!(frame.state, DisplayState::Normal);
        assert!(frame.stale);
    }

    #[test]
    fn test_show_last_success_while_recovering() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        state.apply(Message::Status(record(Vec::new(), now)));
        state.apply(failure(now));

        let opts = LayoutOptions {
            show_last_success: true,
            ..options()
        };
        let expected = format!("@{}", now.with_timezone(&Local).format("%H:%M"));
        assert_eq!(render_frame(&state, &opts, now).row_text(STATUS_ROW), expected);
    }

    #[test]
    fn test_offline_final_frame() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        state.apply(Message::Status(record(
            vec![line("G", 4, 8, ServiceLevel::Normal)],
            now,
        )));
        state.shut_down();

        let frame = render_frame(&state, &options(), now);
        assert!(frame.offline);
        assert_eq!(frame.row_text(LINES_ROW), "G:4-8m N");
        assert_eq!(frame.pixel(63, 0), Some(Palette::standard().alert));
        assert_eq!(frame.pixel(62, 1), Some(Palette::standard().alert));

        let empty = render_frame(
            &{
                let mut s = RendererState::new(3);
                s.shut_down();
                s
            },
            &options(),
            now,
        );
        assert_eq!(empty.row_text(STATUS_ROW), "Offline");
    }

    #[test]
    fn test_brightness_scales_pixels_not_rows() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        state.apply(Message::Status(record(
            vec![line("G", 4, 8, ServiceLevel::Normal)],
            now,
        )));
        let opts = LayoutOptions {
            brightness: 50,
            ..options()
        };

        let frame = render_frame(&state, &opts, now);
        let green = Palette::standard().normal;
        assert_eq!(frame.row(LINES_ROW).unwrap().segments[0].color, green);
        assert!(frame.pixels().all(|(_, _, c)| c.g <= 127));
        assert!(frame.lit_pixels() > 0);
    }

    #[test]
    fn test_pixels_stay_in_bounds_on_small_panel() {
        let now = Utc::now();
        let mut state = RendererState::new(3);
        state.apply(Message::Status(record(
            vec![line("G", 4, 8, ServiceLevel::Normal)],
            now,
        )));
        let opts = LayoutOptions {
            geometry: Geometry::new(32, 16),
            ..options()
        };

        let frame = render_frame(&state, &opts, now);
        assert_eq!(frame.pixels().count(), 32 * 16);
        assert_eq!(frame.row_text(STATION_ROW), "BERRI");
        assert_eq!(frame.text_lines.len(), 2);
        assert_eq!(frame.pixel(32, 0), None);
    }
}
