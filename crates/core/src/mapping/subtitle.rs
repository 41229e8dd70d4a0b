//! Subtitle ranking.
//!
//! Prefers plain English subtitles over English SDH (hearing impaired) ones,
//! and both over anything without a recognisable language word. Matching is
//! done on whole words of the base name, so `engineer.srt` is not English.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::download::DownloadFile;

use super::classify::file_name;

/// Rank of a plain English subtitle.
pub const RANK_ENGLISH: u32 = 100;
/// Rank of an English subtitle for the deaf and hard of hearing.
pub const RANK_ENGLISH_SDH: u32 = 90;
/// Rank of any other subtitle.
pub const RANK_OTHER: u32 = 80;

static ENGLISH_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(english|eng|en)\b").expect("valid english pattern"));

static SDH_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsdh\b").expect("valid sdh pattern"));

/// A subtitle file considered for sidecar placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtitleCandidate<'a> {
    pub source_directory: &'a str,
    pub file: &'a DownloadFile,
}

impl<'a> SubtitleCandidate<'a> {
    pub fn new(source_directory: &'a str, file: &'a DownloadFile) -> Self {
        Self {
            source_directory,
            file,
        }
    }

    pub fn relative_path(&self) -> &'a str {
        &self.file.relative_path
    }
}

/// A candidate paired with its computed rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedSubtitle<'a> {
    pub candidate: SubtitleCandidate<'a>,
    pub rank: u32,
}

/// Rank a subtitle by the words in its base name. Higher is better.
pub fn rank(subtitle_path: &str) -> u32 {
    let name = file_name(subtitle_path);
    match (ENGLISH_WORD.is_match(name), SDH_WORD.is_match(name)) {
        (true, true) => RANK_ENGLISH_SDH,
        (true, false) => RANK_ENGLISH,
        (false, _) => RANK_OTHER,
    }
}

/// Rank every candidate, best first.
///
/// The sort is stable so equally ranked candidates keep enumeration order.
pub fn rank_candidates<'a>(candidates: &[SubtitleCandidate<'a>]) -> Vec<RankedSubtitle<'a>> {
    let mut ranked: Vec<RankedSubtitle<'a>> = candidates
        .iter()
        .map(|candidate| RankedSubtitle {
            candidate: *candidate,
            rank: rank(candidate.relative_path()),
        })
        .collect();
    ranked.sort_by(|a, b| b.rank.cmp(&a.rank));
    ranked
}

/// The single most preferred candidate, if any.
pub fn best_subtitle<'a>(candidates: &[SubtitleCandidate<'a>]) -> Option<SubtitleCandidate<'a>> {
    rank_candidates(candidates)
        .into_iter()
        .next()
        .map(|ranked| ranked.candidate)
}
