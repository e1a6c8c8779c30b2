use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use log::{info, warn};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::fetch::DocumentFetcher;
use crate::models::GraduateRecord;
use crate::store;

fn selector(css: &str) -> Selector {
    // Static selectors only; parse cannot fail.
    Selector::parse(css).unwrap()
}

/// Positional decomposition of a full name, Mexican convention: two surname
/// tokens, then one or two given names. Best effort, never rejects.
/// Returns (paternal, maternal, first, second).
pub fn split_full_name(full_name: &str) -> (String, String, String, String) {
    let tokens: Vec<&str> = full_name.split_whitespace().collect();
    match tokens.len() {
        0 => (String::new(), String::new(), String::new(), String::new()),
        1 => (
            tokens[0].to_string(),
            String::new(),
            String::new(),
            String::new(),
        ),
        2 => (
            tokens[0].to_string(),
            String::new(),
            tokens[1].to_string(),
            String::new(),
        ),
        3 => (
            tokens[0].to_string(),
            tokens[1].to_string(),
            tokens[2].to_string(),
            String::new(),
        ),
        _ => (
            tokens[0].to_string(),
            tokens[1].to_string(),
            tokens[2].to_string(),
            tokens[3..].join(" "),
        ),
    }
}

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Parse the program index page into (program name, listing url) pairs.
///
/// The page is nested tables; a section table is one whose first row has
/// exactly one cell. Programs are the links of the LICENCIATURA section;
/// scanning stops at the DOCTORADO section.
pub fn parse_program_index(html: &str, base_url: &Url) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let table_sel = selector("table");
    let row_sel = selector("tr");
    let cell_sel = selector("th, td");
    let link_sel = selector("a[href]");

    let mut programs = Vec::new();
    for table in document.select(&table_sel) {
        let first_row = match table.select(&row_sel).next() {
            Some(row) => row,
            None => continue,
        };
        let cells: Vec<_> = first_row.select(&cell_sel).collect();
        if cells.len() != 1 {
            continue;
        }
        let section = cell_text(cells[0]).to_uppercase();
        if section == "DOCTORADO" {
            break;
        }
        if section != "LICENCIATURA" {
            continue;
        }

        for link in table.select(&link_sel) {
            let href = link.value().attr("href").unwrap_or("").trim();
            if !href.contains("titulados.asp") || !href.contains("prog=") {
                continue;
            }
            let name = cell_text(link);
            if name.is_empty() {
                continue;
            }
            match base_url.join(href) {
                Ok(resolved) => programs.push((name, resolved.to_string())),
                Err(e) => warn!("skipping unresolvable link {href:?}: {e}"),
            }
        }
    }
    programs
}

/// Parse one listing page into (full name, year string) rows. The listing is
/// the first table whose header mentions the student-name and
/// graduation-year columns; the match is substring-based so it survives the
/// source's inconsistent accent encoding.
pub fn parse_listing(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let table_sel = selector("table");
    let row_sel = selector("tr");
    let cell_sel = selector("th, td");

    for table in document.select(&table_sel) {
        let mut rows = table.select(&row_sel);
        let header = match rows.next() {
            Some(row) => row,
            None => continue,
        };
        let header_text = header
            .select(&cell_sel)
            .map(cell_text)
            .collect::<Vec<_>>()
            .join(" ");
        let has_name = header_text.contains("Nombre") && header_text.contains("alumno");
        let has_year = header_text.contains("titulaci");
        if !(has_name && has_year) {
            continue;
        }

        let mut parsed = Vec::new();
        for row in rows {
            let cells: Vec<_> = row.select(&cell_sel).collect();
            if cells.len() < 2 {
                continue;
            }
            let name = cell_text(cells[0]);
            let year = cell_text(cells[1]);
            if !name.is_empty() || !year.is_empty() {
                parsed.push((name, year));
            }
        }
        return parsed;
    }
    Vec::new()
}

/// Decompose parsed rows into records for one program. Rows whose year cell
/// is not an integer are dropped with a warning; atypical names are kept
/// with best-guess field assignment.
pub fn build_records(program: &str, rows: &[(String, String)]) -> Vec<GraduateRecord> {
    let mut records = Vec::with_capacity(rows.len());
    for (full_name, year) in rows {
        let graduation_year = match year.trim().parse::<i32>() {
            Ok(y) => y,
            Err(_) => {
                warn!("{program}: dropping row with non-numeric year {year:?} ({full_name})");
                continue;
            }
        };
        let (paternal, maternal, first, second) = split_full_name(full_name);
        records.push(GraduateRecord {
            program: program.to_string(),
            full_name: full_name.clone(),
            paternal_surname: paternal,
            maternal_surname: maternal,
            first_given_name: first,
            second_given_name: second,
            graduation_year,
        });
    }
    records
}

/// Fetch and parse one program's listing. Pure with respect to the disk;
/// the caller decides where the table lands.
pub fn collect_program(
    fetcher: &dyn DocumentFetcher,
    program: &str,
    url: &str,
) -> anyhow::Result<Vec<GraduateRecord>> {
    let html = fetcher.fetch(url)?;
    let rows = parse_listing(&html);
    Ok(build_records(program, &rows))
}

/// Collector stage: discover programs from the index, scrape each listing
/// into `{program}.csv`. A failing program is skipped and logged; an
/// unusable index is fatal.
pub fn run(fetcher: &dyn DocumentFetcher, index_url: &str, out_dir: &Path) -> anyhow::Result<()> {
    let base_url = Url::parse(index_url).context("invalid index URL")?;
    let html = fetcher
        .fetch(index_url)
        .context("failed to fetch program index")?;
    let programs = parse_program_index(&html, &base_url);
    if programs.is_empty() {
        bail!("no programs found at {index_url}; check page structure or URL");
    }
    info!("found {} programs", programs.len());

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create output directory {}", out_dir.display()))?;

    let mut collected = 0usize;
    let mut total_rows = 0usize;
    for (program, url) in &programs {
        match collect_program(fetcher, program, url) {
            Ok(records) => {
                let path = store::table_path(out_dir, program);
                store::write_table(&path, &records)?;
                info!("{program}: {} rows -> {}", records.len(), path.display());
                collected += 1;
                total_rows += records.len();
            }
            Err(e) => {
                warn!("skipping program {program}: {e:#}");
            }
        }
    }
    info!(
        "collected {collected}/{} programs, {total_rows} rows total",
        programs.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_four_or_more_tokens() {
        let (pat, mat, first, second) = split_full_name("García López María José");
        assert_eq!(pat, "García");
        assert_eq!(mat, "López");
        assert_eq!(first, "María");
        assert_eq!(second, "José");

        let (_, _, first, second) = split_full_name("García López María José Guadalupe");
        assert_eq!(first, "María");
        assert_eq!(second, "José Guadalupe");
    }

    #[test]
    fn splits_short_names_best_effort() {
        assert_eq!(
            split_full_name("García López Ana"),
            (
                "García".to_string(),
                "López".to_string(),
                "Ana".to_string(),
                String::new()
            )
        );
        assert_eq!(
            split_full_name("García Ana"),
            (
                "García".to_string(),
                String::new(),
                "Ana".to_string(),
                String::new()
            )
        );
        assert_eq!(
            split_full_name("García"),
            (
                "García".to_string(),
                String::new(),
                String::new(),
                String::new()
            )
        );
        assert_eq!(
            split_full_name("  "),
            (String::new(), String::new(), String::new(), String::new())
        );
    }

    #[test]
    fn index_parser_takes_licenciatura_and_stops_at_doctorado() {
        let html = r#"
            <html><body>
            <table><tr><td>LICENCIATURA</td></tr>
                <tr><td><a href="titulados.asp?prog=11">ACTUARÍA</a></td></tr>
                <tr><td><a href="titulados.asp?prog=12">DERECHO</a></td></tr>
                <tr><td><a href="otra.asp">no programa</a></td></tr>
            </table>
            <table><tr><td>DOCTORADO</td></tr>
                <tr><td><a href="titulados.asp?prog=99">DOCTORADO X</a></td></tr>
            </table>
            </body></html>
        "#;
        let base = Url::parse("https://example.edu/titulacion/programas.asp").unwrap();
        let programs = parse_program_index(html, &base);
        assert_eq!(programs.len(), 2);
        assert_eq!(programs[0].0, "ACTUARÍA");
        assert_eq!(
            programs[0].1,
            "https://example.edu/titulacion/titulados.asp?prog=11"
        );
        assert_eq!(programs[1].0, "DERECHO");
    }

    #[test]
    fn index_parser_ignores_multi_cell_header_tables() {
        let html = r#"
            <table><tr><td>a</td><td>b</td></tr>
                <tr><td><a href="titulados.asp?prog=1">X</a></td></tr>
            </table>
        "#;
        let base = Url::parse("https://example.edu/t/").unwrap();
        assert!(parse_program_index(html, &base).is_empty());
    }

    #[test]
    fn listing_parser_matches_header_and_skips_decoys() {
        let html = r#"
            <table><tr><td>menu</td><td>links</td></tr></table>
            <table>
                <tr><th>Nombre del alumno</th><th>Año de titulación</th></tr>
                <tr><td>García López María José</td><td>2020</td></tr>
                <tr><td>Pérez Ruiz Juan</td><td>2021</td></tr>
            </table>
        "#;
        let rows = parse_listing(html);
        assert_eq!(
            rows,
            vec![
                ("García López María José".to_string(), "2020".to_string()),
                ("Pérez Ruiz Juan".to_string(), "2021".to_string()),
            ]
        );
    }

    #[test]
    fn listing_parser_returns_empty_without_matching_table() {
        assert!(parse_listing("<table><tr><td>nada</td></tr></table>").is_empty());
    }

    #[test]
    fn build_records_drops_non_numeric_years_only() {
        let rows = vec![
            ("García López Ana".to_string(), "2020".to_string()),
            ("Pérez Ruiz Juan".to_string(), "n/a".to_string()),
            ("Sosa Díaz María".to_string(), " 2021 ".to_string()),
        ];
        let records = build_records("ACTUARÍA", &rows);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].first_given_name, "Ana");
        assert_eq!(records[0].graduation_year, 2020);
        assert_eq!(records[1].graduation_year, 2021);
        assert_eq!(records[1].program, "ACTUARÍA");
    }
}
