// Colored terminal output for the `report` command.
//
// This module handles all terminal-specific formatting. main.rs loads the
// data and delegates here.

use colored::Colorize;

use crate::analytics::{AnalyticsSnapshot, UserPreferences, VariantType};
use crate::profiles::TrackedProfile;

use super::truncate_chars;

/// Display a user's engagement snapshot.
pub fn display_snapshot(user_id: &str, snapshot: &AnalyticsSnapshot, prefs: &UserPreferences) {
    println!("\n{}", format!("=== Engagement Report: {user_id} ===").bold());
    println!();

    let week = format!(
        "{}/{}",
        snapshot.total_approved_this_week, snapshot.weekly_goal
    );
    let week = if snapshot.total_approved_this_week >= snapshot.weekly_goal {
        week.green().bold()
    } else {
        week.normal()
    };
    println!(
        "  This week:      {week} approved ({:.0}%)",
        snapshot.weekly_progress() * 100.0
    );
    println!(
        "  Approval rate:  {:.0}% ({} approved, {} skipped)",
        snapshot.approval_rate * 100.0,
        snapshot.approved_total,
        snapshot.skipped_total
    );
    match snapshot.avg_time_to_comment_minutes {
        Some(avg) => println!("  Time to comment: {avg:.1} min average"),
        None => println!("  Time to comment: {}", "no timed approvals yet".dimmed()),
    }

    let streak = snapshot.daily_streak.to_string();
    let streak = if snapshot.daily_streak > 0 {
        streak.yellow().bold()
    } else {
        streak.normal()
    };
    println!("  Daily streak:   {streak} day(s)");
    println!(
        "  Timezone:       UTC{:+03}:{:02}",
        prefs.timezone_offset_minutes / 60,
        (prefs.timezone_offset_minutes % 60).abs()
    );

    println!();
    println!(
        "  {:<4} {:<11} {:>5}  {}",
        "Day".dimmed(),
        "Date".dimmed(),
        "Count".dimmed(),
        "Goal".dimmed()
    );
    println!("  {}", "-".repeat(40).dimmed());
    for day in &snapshot.weekly_series {
        let bar = "#".repeat(day.approved_count.min(30) as usize);
        let bar = if day.goal_met() {
            bar.green()
        } else {
            bar.bright_black()
        };
        println!(
            "  {:<4} {:<11} {:>5}  /{}  {bar}",
            day.label(),
            day.day.format("%Y-%m-%d").to_string(),
            day.approved_count,
            day.goal_for_day,
        );
    }
    println!(
        "  Goal met on {:.0}% of days",
        snapshot.goal_completion() * 100.0
    );

    println!();
    println!("  {}", "Comment mix".bold());
    for variant in VariantType::ALL {
        let pct = snapshot
            .type_distribution
            .get(&variant)
            .copied()
            .unwrap_or(0);
        println!("    {:<11} {:>3}%", variant.as_str(), pct);
    }
    println!();
}

/// Display the user's tracked profiles.
pub fn display_profiles(profiles: &[TrackedProfile]) {
    if profiles.is_empty() {
        println!("  {}", "No tracked profiles.".dimmed());
        return;
    }

    println!("  {}", format!("Tracked profiles ({})", profiles.len()).bold());
    for profile in profiles {
        println!(
            "    [{}] {:<24} {}",
            profile.initials.cyan(),
            truncate_chars(&profile.name, 24),
            truncate_chars(&profile.url, 60).dimmed()
        );
    }
    println!();
}
