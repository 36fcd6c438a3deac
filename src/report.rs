use std::fmt::Write;

use crate::models::{AttendanceReport, SubjectStat};

/// Minimum attendance most institutions require.
pub const REQUIRED_PERCENTAGE: f64 = 75.0;

/// Subjects sorted weakest first.
pub fn rank_subjects(subjects: &[SubjectStat]) -> Vec<&SubjectStat> {
    let mut ranked: Vec<&SubjectStat> = subjects.iter().collect();
    ranked.sort_by(|a, b| {
        a.percentage
            .partial_cmp(&b.percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked
}

pub fn build_report(user: &str, report: &AttendanceReport) -> String {
    let mut output = String::new();
    let ranked = rank_subjects(&report.subjects);

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(output, "Generated for {}", user);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall");
    let _ = writeln!(
        output,
        "- {:.2}% ({} of {} sessions attended)",
        report.global.percentage, report.global.attended, report.global.conducted
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Subjects");

    if ranked.is_empty() {
        let _ = writeln!(output, "No attendance recorded yet.");
    } else {
        let _ = writeln!(output, "| Subject | Type | Attended | Conducted | % |");
        let _ = writeln!(output, "| --- | --- | ---: | ---: | ---: |");
        for subject in ranked.iter() {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {:.2} |",
                subject.name,
                subject.kind,
                subject.attended,
                subject.conducted,
                subject.percentage
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Below {:.0}%", REQUIRED_PERCENTAGE);

    let at_risk: Vec<_> = ranked
        .iter()
        .filter(|subject| subject.conducted > 0 && subject.percentage < REQUIRED_PERCENTAGE)
        .collect();

    if at_risk.is_empty() {
        let _ = writeln!(output, "Every subject meets the requirement.");
    } else {
        for subject in at_risk {
            let _ = writeln!(
                output,
                "- {} at {:.2}%",
                subject.name, subject.percentage
            );
        }
    }

    output
}
