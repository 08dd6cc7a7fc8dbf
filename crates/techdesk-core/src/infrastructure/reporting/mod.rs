//! Plain-text completion report

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::Write;

use crate::application::dto::TicketView;
use crate::domain::aggregates::TicketStatus;
use crate::domain::value_objects::Period;
use crate::ports::outbound::{ReportError, ReportGenerator};

const UNASSIGNED: &str = "(unassigned)";

#[derive(Debug, Default, Clone, Copy)]
pub struct TextReportGenerator;

impl TextReportGenerator {
    pub fn new() -> Self {
        Self
    }

    fn write_report(
        out: &mut String,
        tickets: &[TicketView],
        period: Period,
        generated_at: DateTime<Utc>,
    ) -> std::fmt::Result {
        let completed: Vec<&TicketView> = tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Completed)
            .collect();

        writeln!(out, "Completed tickets report")?;
        writeln!(out, "Period: {period}")?;
        writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M UTC"))?;
        writeln!(out, "Total completed: {}", completed.len())?;
        writeln!(out)?;

        let mut per_tech: HashMap<&str, usize> = HashMap::new();
        for t in &completed {
            let name = t.assignee.as_ref().map_or(UNASSIGNED, |a| a.name.as_str());
            *per_tech.entry(name).or_default() += 1;
        }
        let mut per_tech: Vec<(&str, usize)> = per_tech.into_iter().collect();
        per_tech.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        writeln!(out, "By technician:")?;
        for (name, count) in &per_tech {
            writeln!(out, "  {name:<24} {count}")?;
        }
        writeln!(out)?;

        writeln!(out, "Tickets:")?;
        for t in &completed {
            let done = t
                .completed_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            let tech = t.assignee.as_ref().map_or(UNASSIGNED, |a| a.name.as_str());
            write!(out, "  {done} | {} | {} | {tech}", t.title, t.priority)?;
            if let Some(comments) = t.comments.as_deref().filter(|c| !c.is_empty()) {
                write!(out, " | {comments}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl ReportGenerator for TextReportGenerator {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn render(
        &self,
        tickets: &[TicketView],
        period: Period,
        generated_at: DateTime<Utc>,
    ) -> Result<Vec<u8>, ReportError> {
        let mut out = String::new();
        Self::write_report(&mut out, tickets, period, generated_at)
            .map_err(|e| ReportError(e.to_string()))?;
        Ok(out.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::UserRef;
    use crate::domain::value_objects::{Priority, Role, TicketId, UserId};

    fn view(title: &str, status: TicketStatus, tech: Option<&str>) -> TicketView {
        let now = Utc::now();
        let person = |name: &str, role| UserRef {
            id: UserId::new(),
            name: name.to_string(),
            role,
        };
        TicketView {
            id: TicketId::new(),
            title: title.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            status,
            creator: person("Mila", Role::Manager),
            assignee: tech.map(|n| person(n, Role::Technician)),
            assigned_by: None,
            created_at: now,
            updated_at: now,
            completed_at: (status == TicketStatus::Completed).then_some(now),
            deadline_at: None,
            estimated_completion_at: None,
            comments: None,
            photos: vec![],
        }
    }

    #[test]
    fn test_counts_completed_per_technician() {
        let tickets = vec![
            view("Fix pump", TicketStatus::Completed, Some("Ivan")),
            view("Swap filter", TicketStatus::Completed, Some("Olga")),
            view("Check valve", TicketStatus::Completed, Some("Ivan")),
            view("Open one", TicketStatus::InProgress, Some("Olga")),
        ];
        let body = TextReportGenerator::new()
            .render(&tickets, Period::Day, Utc::now())
            .unwrap();
        let text = String::from_utf8(body).unwrap();

        assert!(text.contains("Period: day"));
        assert!(text.contains("Total completed: 3"));
        let ivan = text.find("  Ivan").unwrap();
        let olga = text.find("  Olga").unwrap();
        assert!(ivan < olga);
        assert!(!text.contains("Open one"));
    }
}
