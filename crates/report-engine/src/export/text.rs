//! Text extraction from a laid-out document
//!
//! Word-processor formats are rebuilt from the text of each page: glyph runs
//! are collected with their positions, grouped into lines by baseline and
//! ordered left to right.

use typst::layout::{Frame, FrameItem, Point};
use typst::model::Document;

/// Baselines closer than this belong to the same line
const LINE_TOLERANCE_PT: f64 = 2.0;

/// Horizontal gap that counts as a word space
const WORD_GAP_PT: f64 = 1.0;

/// Text of one page, top to bottom
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageText {
    pub lines: Vec<String>,
}

#[derive(Debug)]
struct Run {
    x: f64,
    y: f64,
    width: f64,
    size: f64,
    text: String,
}

/// Extract the text of every page
pub fn document_text(document: &Document) -> Vec<PageText> {
    document
        .pages
        .iter()
        .map(|page| {
            let mut runs = Vec::new();
            collect_runs(&page.frame, Point::zero(), &mut runs);
            PageText {
                lines: group_lines(runs),
            }
        })
        .collect()
}

fn collect_runs(frame: &Frame, offset: Point, runs: &mut Vec<Run>) {
    for (pos, item) in frame.items() {
        let origin = offset + *pos;
        match item {
            FrameItem::Group(group) => {
                let shifted = origin + Point::new(group.transform.tx, group.transform.ty);
                collect_runs(&group.frame, shifted, runs);
            }
            FrameItem::Text(text) => runs.push(Run {
                x: origin.x.to_pt(),
                y: origin.y.to_pt(),
                width: text.width().to_pt(),
                size: text.size.to_pt(),
                text: text.text.to_string(),
            }),
            _ => {}
        }
    }
}

fn group_lines(mut runs: Vec<Run>) -> Vec<String> {
    runs.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Vec<Run>> = Vec::new();
    for run in runs {
        match lines.last_mut() {
            Some(line) if (line[0].y - run.y).abs() <= LINE_TOLERANCE_PT => line.push(run),
            _ => lines.push(vec![run]),
        }
    }

    lines.into_iter().map(join_line).collect()
}

fn join_line(mut runs: Vec<Run>) -> String {
    runs.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut line = String::new();
    let mut end: Option<f64> = None;
    for run in runs {
        if let Some(end) = end {
            let gap = run.x - end;
            // Wide gaps separate table cells
            if gap > run.size * 2.0 {
                line.push('\t');
            } else if gap > WORD_GAP_PT && !line.ends_with(' ') {
                line.push(' ');
            }
        }
        line.push_str(&run.text);
        end = Some(run.x + run.width);
    }
    line.trim_end().to_string()
}
