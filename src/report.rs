use std::fmt::Write;

use crate::models::Summary;

/// Plain-text report for the event. Renders numbers the stats stage already
/// computed; nothing is recalculated here, so identical inputs reproduce an
/// identical report.
pub fn render(summary: &Summary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "ESTADÍSTICAS: MUJERES TITULADAS (8M)");
    let _ = writeln!(output, "{}", "=".repeat(50));
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Total titulados/as (Licenciatura): {}",
        summary.totals.total_graduates
    );
    let _ = writeln!(
        output,
        "Total mujeres tituladas: {}",
        summary.totals.total_female
    );
    let _ = writeln!(
        output,
        "Porcentaje de mujeres tituladas: {:.2}%",
        summary.totals.female_percentage
    );
    let _ = writeln!(
        output,
        "Carreras con titulados/as: {}",
        summary.totals.active_programs
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "Top 10 carreras por porcentaje de mujeres tituladas:");
    if summary.ranking.is_empty() {
        let _ = writeln!(output, "  (sin carreras con titulados/as)");
    } else {
        for (i, row) in summary.ranking.iter().take(10).enumerate() {
            let _ = writeln!(
                output,
                "  {}. {}: {:.2}% ({} de {})",
                i + 1,
                row.program,
                row.percentage,
                row.female,
                row.total
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Top 5 carreras por número de mujeres tituladas:");
    let mut by_female: Vec<_> = summary.ranking.iter().collect();
    by_female.sort_by(|a, b| b.female.cmp(&a.female).then_with(|| a.program.cmp(&b.program)));
    if by_female.is_empty() {
        let _ = writeln!(output, "  (sin carreras con titulados/as)");
    } else {
        for (i, row) in by_female.iter().take(5).enumerate() {
            let _ = writeln!(output, "  {}. {}: {} mujeres", i + 1, row.program, row.female);
        }
    }

    if !summary.missing_subsets.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "ADVERTENCIA: carreras sin tabla de mujeres (excluidas de las cifras):"
        );
        for program in &summary.missing_subsets {
            let _ = writeln!(output, "  - {program}");
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProgramStats, Totals};

    fn summary() -> Summary {
        let row = ProgramStats {
            program: "ACTUARÍA".to_string(),
            total: 10,
            female: 4,
            percentage: 40.0,
        };
        Summary {
            totals: Totals {
                total_graduates: 10,
                total_female: 4,
                female_percentage: 40.0,
                active_programs: 1,
            },
            per_program: vec![row.clone()],
            ranking: vec![row],
            per_year: Vec::new(),
            missing_subsets: Vec::new(),
        }
    }

    #[test]
    fn renders_totals_and_ranking() {
        let report = render(&summary());
        assert!(report.contains("Total titulados/as (Licenciatura): 10"));
        assert!(report.contains("Porcentaje de mujeres tituladas: 40.00%"));
        assert!(report.contains("1. ACTUARÍA: 40.00% (4 de 10)"));
        assert!(!report.contains("ADVERTENCIA"));
    }

    #[test]
    fn flags_missing_subsets() {
        let mut summary = summary();
        summary.missing_subsets.push("ECONOMÍA".to_string());
        let report = render(&summary);
        assert!(report.contains("ADVERTENCIA"));
        assert!(report.contains("- ECONOMÍA"));
    }

    #[test]
    fn handles_empty_ranking() {
        let mut summary = summary();
        summary.ranking.clear();
        let report = render(&summary);
        assert!(report.contains("(sin carreras con titulados/as)"));
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(render(&summary()), render(&summary()));
    }
}
