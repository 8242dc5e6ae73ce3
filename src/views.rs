#![cfg(not(tarpaulin_include))]

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;

use crate::error::{GpaError, Result};
use crate::login::{FinalResults, Flash};
use crate::session::SemesterSummary;
use crate::store::SavedRecord;

/// Handlebars pages served by the web app
pub struct Views {
    registry: Handlebars<'static>,
}

#[derive(Serialize)]
struct SummaryRow {
    part: String,
    semester: String,
    gpa: String,
}

impl SummaryRow {
    fn rows(summary: &[SemesterSummary]) -> Vec<SummaryRow> {
        summary
            .iter()
            .map(|s| SummaryRow {
                part: s.part.clone(),
                semester: s.semester.clone(),
                gpa: format_gpa(s.gpa),
            })
            .collect()
    }
}

#[derive(Serialize)]
struct RecordRow {
    record_id: String,
    short_id: String,
    timestamp: String,
    semester_count: usize,
    cumulative_gpa: String,
    total_units_taken: u32,
    total_credit_points: u32,
}

/// GPAs are always shown with two decimals
pub fn format_gpa(gpa: f64) -> String {
    format!("{:.2}", gpa)
}

impl Views {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        for (name, source) in [
            ("index", include_str!("../templates/index.hbs")),
            ("results", include_str!("../templates/results.hbs")),
            ("admin", include_str!("../templates/admin.hbs")),
            ("admin_login", include_str!("../templates/admin_login.hbs")),
        ] {
            registry
                .register_template_string(name, source)
                .map_err(|e| GpaError::Render(e.to_string()))?;
        }
        Ok(Views { registry })
    }

    fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        self.registry
            .render(name, data)
            .map_err(|e| GpaError::Render(e.to_string()))
    }

    pub fn index(
        &self,
        semester_parts: &[(String, String)],
        cumulative_gpa: f64,
        summary: &[SemesterSummary],
        flashes: &[Flash],
    ) -> Result<String> {
        let mut parts: Vec<&str> = Vec::new();
        let mut semesters: Vec<&str> = Vec::new();
        for (part, semester) in semester_parts {
            if !parts.contains(&part.as_str()) {
                parts.push(part);
            }
            if !semesters.contains(&semester.as_str()) {
                semesters.push(semester);
            }
        }

        self.render(
            "index",
            &json!({
                "parts": parts,
                "semesters": semesters,
                "initial_cgpa": format_gpa(cumulative_gpa),
                "summary": SummaryRow::rows(summary),
                "flashes": flashes,
            }),
        )
    }

    pub fn results(&self, results: &FinalResults) -> Result<String> {
        self.render(
            "results",
            &json!({
                "cumulative_gpa": format_gpa(results.cumulative_gpa),
                "semester_gpas": SummaryRow::rows(&results.semester_gpas),
                "total_units_taken": results.total_units_taken,
                "total_credit_points": results.total_credit_points,
                "total_courses": results.total_courses,
            }),
        )
    }

    pub fn admin(&self, records: &[SavedRecord], flashes: &[Flash]) -> Result<String> {
        let rows: Vec<RecordRow> = records
            .iter()
            .map(|r| {
                let record_id = r.record_id.to_string();
                RecordRow {
                    short_id: record_id.chars().take(8).collect(),
                    record_id,
                    timestamp: r.formatted_timestamp(),
                    semester_count: r.semesters.len(),
                    cumulative_gpa: format_gpa(r.results.cumulative_gpa),
                    total_units_taken: r.results.total_units_taken,
                    total_credit_points: r.results.total_credit_points,
                }
            })
            .collect();

        self.render("admin", &json!({ "records": rows, "flashes": flashes }))
    }

    pub fn admin_login(&self, flashes: &[Flash]) -> Result<String> {
        self.render("admin_login", &json!({ "flashes": flashes }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Vec<SemesterSummary> {
        vec![SemesterSummary {
            part: "1".to_string(),
            semester: "Harmattan".to_string(),
            gpa: 2.5,
        }]
    }

    #[test]
    fn test_format_gpa() {
        assert_eq!(format_gpa(2.5), "2.50");
        assert_eq!(format_gpa(0.0), "0.00");
        assert_eq!(format_gpa(3.91), "3.91");
    }

    #[test]
    fn test_index_lists_selectors_and_summary() {
        let views = Views::new().unwrap();
        let parts = vec![
            ("1".to_string(), "Harmattan".to_string()),
            ("1".to_string(), "Rain".to_string()),
            ("2".to_string(), "Harmattan".to_string()),
        ];
        let page = views
            .index(&parts, 2.5, &summary(), &[Flash::new("success", "Loaded")])
            .unwrap();

        assert!(page.contains(r#"<option value="2">Part 2</option>"#));
        assert!(page.contains(r#"<option value="Rain">Rain</option>"#));
        assert!(page.contains("Part 1 Harmattan - GPA: 2.50"));
        assert!(page.contains(r#"id="cgpa-display">2.50<"#));
        assert!(page.contains("Loaded"));
    }

    #[test]
    fn test_results_page() {
        let views = Views::new().unwrap();
        let results = FinalResults {
            cumulative_gpa: 3.5,
            semester_gpas: summary(),
            total_units_taken: 12,
            total_credit_points: 42,
            total_courses: 6,
        };
        let page = views.results(&results).unwrap();
        assert!(page.contains("3.50"));
        assert!(page.contains("Part 1 Harmattan"));
        assert!(page.contains("42"));
    }

    #[test]
    fn test_admin_login_escapes_flash() {
        let views = Views::new().unwrap();
        let page = views
            .admin_login(&[Flash::new("error", "<b>Invalid PIN.</b>")])
            .unwrap();
        assert!(page.contains("&lt;b&gt;Invalid PIN.&lt;/b&gt;"));
    }

    #[test]
    fn test_admin_without_records() {
        let views = Views::new().unwrap();
        let page = views.admin(&[], &[]).unwrap();
        assert!(page.contains("No saved calculations"));
    }
}
