use colored::{ColoredString, Colorize};

use crate::matchmaking::MatchQuality;
use crate::pairing::Pairing;
use crate::rating::Tier;
use crate::season::{DecayReport, SeasonArchive};
use crate::services::{ProcessingReport, SimulationReport};
use crate::tournament::{RankedCompetitor, StandingRow};

/// Padded before colouring so escape codes stay out of the column width.
pub fn tier_label(tier: Tier) -> ColoredString {
    let padded = format!("{:<12}", tier.as_str());
    let label = padded.as_str();
    match tier {
        Tier::Bronze => label.truecolor(205, 127, 50),
        Tier::Silver => label.white(),
        Tier::Gold => label.yellow(),
        Tier::Platinum => label.cyan(),
        Tier::Diamond => label.bright_blue(),
        Tier::Master => label.magenta(),
        Tier::Grandmaster => label.red(),
        Tier::Mythic => label.bright_red().bold(),
    }
}

pub fn ladder(standings: &[RankedCompetitor]) -> String {
    let mut lines = vec![format!(
        "{:>4}  {:<20} {:>8} {:>8} {:>8}  {:<12} {:>7}",
        "#", "competitor", "rating", "mean", "dev", "tier", "played"
    )
    .as_str()
    .bold()
    .to_string()];
    for entry in standings {
        let rating = &entry.rating;
        lines.push(format!(
            "{:>4}  {:<20} {:>8.1} {:>8.1} {:>8.1}  {} {:>7}",
            entry.rank,
            rating.id,
            rating.conservative_estimate(),
            rating.mean(),
            rating.deviation(),
            tier_label(rating.tier()),
            rating.matches_played
        ));
    }
    lines.join("\n")
}

pub fn score_table(rows: &[StandingRow]) -> String {
    let mut lines = vec![format!(
        "{:>4}  {:<20} {:>4} {:>3} {:>3} {:>3} {:>6} {:>6} {:>6}",
        "#", "competitor", "pts", "w", "l", "d", "omw%", "gw%", "ogw%"
    )
    .as_str()
    .bold()
    .to_string()];
    for row in rows {
        lines.push(format!(
            "{:>4}  {:<20} {:>4} {:>3} {:>3} {:>3} {:>6.1} {:>6.1} {:>6.1}",
            row.rank,
            row.competitor_id,
            row.points,
            row.wins,
            row.losses,
            row.draws,
            row.opponent_match_win * 100.0,
            row.game_win * 100.0,
            row.opponent_game_win * 100.0
        ));
    }
    lines.join("\n")
}

pub fn pairings(round: usize, pairings: &[Pairing]) -> String {
    let mut lines = vec![format!("Round {round}").as_str().bold().to_string()];
    for pairing in pairings {
        let line = match &pairing.player2 {
            Some(opponent) => format!(
                "  table {:>2}  {} vs {}  (quality {:.2})",
                pairing.table,
                pairing.player1,
                opponent,
                pairing.quality.unwrap_or_default()
            ),
            None => format!("  {}  {}", "bye".dimmed(), pairing.player1),
        };
        lines.push(line);
    }
    lines.join("\n")
}

pub fn quality(a: &str, b: &str, quality: &MatchQuality) -> String {
    let shown = format!("{:.3}", quality.score);
    let score = shown.as_str();
    let score = if quality.score >= 0.7 {
        score.green()
    } else if quality.score >= 0.4 {
        score.yellow()
    } else {
        score.red()
    };
    let parts = &quality.breakdown;
    [
        format!("{} vs {}: quality {}", a.bold(), b.bold(), score),
        format!(
            "  win probability {:.1}%, skill difference {:.1}",
            quality.win_probability * 100.0,
            quality.skill_difference
        ),
        format!(
            "  skill {:.2}  uncertainty {:.2}  archetype {:.2}  history {:.2}  playstyle {:.2}  preferences {:.2}  time x{:.2}",
            parts.skill,
            parts.uncertainty,
            parts.archetype,
            parts.history,
            parts.playstyle,
            parts.preferences,
            parts.time_factor
        ),
    ]
    .join("\n")
}

pub fn processing(report: &ProcessingReport) -> String {
    format!(
        "{} {} matches rated, {} upsets",
        "Done:".green().bold(),
        report.processed,
        report.upsets
    )
}

pub fn archive(archive: &SeasonArchive) -> String {
    let mut lines = vec![format!(
        "Season {} closed: {} competitors, {} matches, average surprise {:.3}",
        archive.season,
        archive.ratings.len(),
        archive.analytics.matches_processed,
        archive.analytics.average_surprise()
    )
    .as_str()
    .bold()
    .to_string()];
    for entry in &archive.ratings {
        lines.push(format!(
            "  {:<20} {} {:>6} currency {:>3} packs",
            entry.competitor_id,
            tier_label(entry.tier),
            entry.reward.currency,
            entry.reward.packs
        ));
    }
    lines.join("\n")
}

pub fn decay(reports: &[DecayReport]) -> String {
    if reports.is_empty() {
        return "No inactive competitors".dimmed().to_string();
    }
    reports
        .iter()
        .map(|report| {
            format!(
                "  {:<20} {} weeks  mean {:.1} -> {:.1}  dev {:.1} -> {:.1}",
                report.competitor_id,
                report.weeks_charged,
                report.mean_before,
                report.mean_after,
                report.deviation_before,
                report.deviation_after
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn simulation(report: &SimulationReport) -> String {
    let mut sections: Vec<String> = report
        .rounds
        .iter()
        .enumerate()
        .map(|(index, round)| pairings(index + 1, round))
        .collect();
    sections.push(score_table(&report.table));
    sections.push(ladder(&report.standings));
    sections.join("\n\n")
}
