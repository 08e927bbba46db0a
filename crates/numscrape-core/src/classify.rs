//! Per-message classification for the two scrape modes.
//!
//! The modes are deliberately asymmetric: `NotFound` scans the whole message
//! once its marker shows up anywhere, while `Found` only scans the individual
//! SIM lines that are not annotated as "Not Found".

use crate::{
    domain::Mode,
    extract::{extract_candidates, Candidate},
};

pub const NOT_FOUND_MARKER: &str = "Not Found";
pub const SIM_MARKER: &str = "SIM";

/// Candidates attributable to `mode` for a single message.
pub fn classify(text: Option<&str>, mode: Mode) -> Vec<Candidate> {
    let Some(text) = text else {
        return Vec::new();
    };

    match mode {
        Mode::NotFound => classify_not_found(text),
        Mode::Found => classify_found(text),
    }
}

fn classify_not_found(text: &str) -> Vec<Candidate> {
    if !text.contains(NOT_FOUND_MARKER) {
        return Vec::new();
    }
    // Includes every number in the message, not only the annotated line.
    extract_candidates(text)
}

fn classify_found(text: &str) -> Vec<Candidate> {
    if !text.contains(SIM_MARKER) {
        return Vec::new();
    }

    text.lines()
        .filter(|line| line.contains(SIM_MARKER) && !line.contains(NOT_FOUND_MARKER))
        .flat_map(extract_candidates)
        .collect()
}
