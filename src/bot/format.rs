//! Message texts.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::due::{self, DueBucket};
use crate::models::*;

/// Dates are shown to people as DD-MM-YYYY.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

pub fn help() -> &'static str {
    "👋 Household Chore Bot\n\n\
     Setup:\n\
     /setpeople Wife Husband\n\n\
     Chores:\n\
     /add (wizard)\n\
     /cancel\n\
     /list [category]\n\
     /today\n\
     /done <id> [who]\n\
     /skip <id>\n\
     /remove <id>\n\n\
     Review:\n\
     /history [days|name|person]\n\
     /summary [days]\n\
     /stats\n"
}

/// `due today (21:00)` or `due 08-01-2024 (21:00)`.
pub fn due_label(chore: &Chore, today: NaiveDate) -> String {
    let time = chore.time.format("%H:%M");
    let due_date = due::next_due_date(chore, today);
    if due_date == today {
        format!("due today ({})", time)
    } else {
        format!("due {} ({})", format_date(due_date), time)
    }
}

pub fn people_set(person1: &str, person2: &str) -> String {
    format!("✅ Household people set:\n1) {}\n2) {}", person1, person2)
}

/// Chores grouped by due bucket, then category, then assignee.
pub fn chore_list(chores: &[Chore], today: NaiveDate) -> String {
    let mut buckets: BTreeMap<DueBucket, Vec<&Chore>> = BTreeMap::new();
    for chore in chores {
        buckets
            .entry(due::bucket(chore, today))
            .or_default()
            .push(chore);
    }

    let mut blocks = Vec::new();
    for bucket in DueBucket::ALL {
        let Some(items) = buckets.get(&bucket) else {
            continue;
        };

        let mut grouped: BTreeMap<Category, BTreeMap<&str, Vec<&Chore>>> = BTreeMap::new();
        for chore in items {
            grouped
                .entry(chore.category_or_default())
                .or_default()
                .entry(chore.assignee.as_str())
                .or_default()
                .push(chore);
        }

        let mut lines = vec![format!("{} ({})", bucket.title(), items.len())];
        for (category, by_person) in &grouped {
            let count: usize = by_person.values().map(Vec::len).sum();
            lines.push(format!("  {} ({})", category.label(), count));
            for (person, chores) in by_person {
                lines.push(format!("    👤 {} ({})", person, chores.len()));
                for chore in chores {
                    lines.push(format!(
                        "      {}) {} — {}",
                        chore.id,
                        chore.name,
                        due_label(chore, today)
                    ));
                }
            }
        }
        blocks.push(lines.join("\n"));
    }

    blocks.join("\n\n")
}

/// One `/today` entry; sent with the reminder keyboard.
pub fn due_now(chore: &Chore, today: NaiveDate) -> String {
    let status = if due::days_until_due(chore, today) < 0 {
        "⛔ Overdue"
    } else {
        "📌 Due today"
    };
    format!(
        "{}\n{}) {}\n{}\n👤 {}\n{}",
        status,
        chore.id,
        chore.name,
        chore.category_or_default().label(),
        chore.assignee,
        due_label(chore, today)
    )
}

pub fn reminder(chore: &Chore, today: NaiveDate) -> String {
    format!(
        "🔔 Chore due: {}\nCategory: {}\nAssigned to: {}\n({})\nMark done: /done {}  (or use buttons)",
        chore.name,
        chore.category_or_default().label(),
        chore.assignee,
        due_label(chore, today),
        chore.id
    )
}

/// Chores due today and in the next three days, skipping those skipped today.
pub fn digest(chores: &[Chore], today: NaiveDate) -> String {
    let mut due_today = Vec::new();
    let mut upcoming = Vec::new();

    for chore in chores {
        if due::is_skipped_today(chore, today) {
            continue;
        }
        match due::days_until_due(chore, today) {
            0 => due_today.push(chore),
            days @ 1..=3 => upcoming.push((chore, days)),
            _ => {}
        }
    }

    let mut lines = vec!["☀️ Daily Chore Update\n".to_string()];

    if due_today.is_empty() {
        lines.push("📌 Due today: None 🎉".to_string());
    } else {
        lines.push("📌 Due today:".to_string());
        for chore in due_today {
            lines.push(format!(
                "• {} — {} ({}) @ {}",
                chore.name,
                chore.assignee,
                chore.category_or_default().label(),
                chore.time.format("%H:%M")
            ));
        }
    }

    if upcoming.is_empty() {
        lines.push("\n🔜 Due in next 3 days: None".to_string());
    } else {
        lines.push("\n🔜 Due in next 3 days:".to_string());
        for (chore, days) in upcoming {
            lines.push(format!(
                "• {} — {} ({}) in {}d",
                chore.name,
                chore.assignee,
                chore.category_or_default().label(),
                days
            ));
        }
    }

    lines.join("\n")
}

pub fn completion(receipt: &CompletionReceipt) -> String {
    let c = &receipt.completion;
    if c.is_cover() {
        format!(
            "✅ {} marked done.\nAssigned to: {}\nCompleted by: {}\nNext due in {} day(s).",
            c.chore_name, c.assigned_to, c.completed_by, receipt.interval_days
        )
    } else {
        format!(
            "🎉 {} marked done! Next due in {} day(s).",
            c.chore_name, receipt.interval_days
        )
    }
}

pub fn chore_added(chore: &Chore) -> String {
    let starts = chore
        .start_date
        .map(format_date)
        .unwrap_or_else(|| "today".to_string());
    format!(
        "✅ Chore added!\nName: {}\nCategory: {}\nAssigned to: {} ({})\nRepeat: every {} day(s)\nStarts: {}\nReminder: {}\n\nUse /list to view chores.",
        chore.name,
        chore.category_or_default().label(),
        chore.assignee,
        chore.mode.as_str(),
        chore.interval_days,
        starts,
        chore.time.format("%H:%M")
    )
}

pub fn history(completions: &[Completion]) -> String {
    if completions.is_empty() {
        return "📜 No matching history yet.".to_string();
    }

    let mut lines = vec!["📜 History (most recent first):\n".to_string()];
    for c in completions {
        let when = format_date(c.completed_on);
        if c.is_cover() {
            lines.push(format!(
                "• {} — assigned to {}, completed by {} on {}",
                c.chore_name, c.assigned_to, c.completed_by, when
            ));
        } else {
            lines.push(format!("• {} — {} on {}", c.chore_name, c.completed_by, when));
        }
    }
    lines.join("\n")
}

pub fn summary(summary: &PeriodSummary) -> String {
    let mut lines = vec![format!("📈 Summary (last {} days):\n", summary.days)];

    if summary.by_completer.is_empty() {
        lines.push("No completions in this period.".to_string());
    } else {
        lines.push("✅ Completed (by who did it):".to_string());
        lines.extend(person_lines(&summary.by_completer));
    }

    if !summary.covers.is_empty() {
        lines.push("\n🤝 Covers (assigned → completed by):".to_string());
        for cover in &summary.covers {
            lines.push(format!(
                "• {} → {}: {}",
                cover.assigned_to, cover.completed_by, cover.count
            ));
        }
    }

    lines.join("\n")
}

pub fn stats(stats: &LifetimeStats) -> String {
    let mut lines = vec!["📊 Lifetime stats:\n".to_string()];

    if !stats.by_completer.is_empty() {
        lines.push("✅ Completed (who did it):".to_string());
        lines.extend(person_lines(&stats.by_completer));
    }

    if !stats.by_assignee.is_empty() {
        lines.push("\n🎯 Responsibility (assigned to):".to_string());
        lines.extend(person_lines(&stats.by_assignee));
    }

    lines.push(format!("\n🤝 Total covers: {}", stats.total_covers));
    lines.join("\n")
}

fn person_lines(counts: &[PersonCount]) -> impl Iterator<Item = String> + '_ {
    counts
        .iter()
        .map(|pc| format!("• {}: {}", pc.person, pc.count))
}
