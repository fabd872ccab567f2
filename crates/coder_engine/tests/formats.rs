use coder_core::{Candidate, Job, JobId};
use coder_engine::formats::{
    parse_jobs, render_jobs, FileFormat, FormatError, FIXED_WIDTHS, NULL_SENTINEL,
};
use pretty_assertions::assert_eq;

fn fixed_row(id: &str, description: &str, tail: &str) -> String {
    format!("{id:<7}{description:<42}{tail}")
}

#[test]
fn fixed_width_rows_split_on_columns() {
    let text = format!(
        "{}\n\n{}\n",
        fixed_row("1000001", "Primary school librarian", ""),
        fixed_row("1000002", "Welder, shipyard", "EXTRA 42"),
    );

    let jobs = parse_jobs(&text, FileFormat::FixedWidth).unwrap();

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id, JobId::from("1000001"));
    assert_eq!(jobs[0].description, "Primary school librarian");
    assert_eq!(jobs[0].description_orig, "Primary school librarian");
    assert_eq!(jobs[0].excess, None);
    assert_eq!(jobs[1].excess.as_deref(), Some("EXTRA 42"));
}

#[test]
fn fixed_width_row_without_id_is_rejected() {
    let text = format!("{}\n", fixed_row("", "Orphan description", ""));
    assert_eq!(
        parse_jobs(&text, FileFormat::FixedWidth),
        Err(FormatError::MissingField { line: 1, field: "id" })
    );
}

#[test]
fn delimited_rows_keep_extra_columns() {
    let text = "id;description\n7;\"Cook; night shift\";A;B\n8;Driver\n";
    let format = FileFormat::Delimited {
        delimiter: ';',
        has_header: true,
    };

    let jobs = parse_jobs(text, format).unwrap();

    assert_eq!(jobs[0].description, "Cook; night shift");
    assert_eq!(jobs[0].excess.as_deref(), Some("A;B"));
    assert_eq!(jobs[1].id, JobId::from("8"));
    assert_eq!(
        parse_jobs("9\n", FileFormat::csv()),
        Err(FormatError::MissingField {
            line: 1,
            field: "description"
        })
    );
}

#[test]
fn fixed_width_egress_pads_columns_and_marks_nulls() {
    let mut coded = Job::new(1, "Nurse");
    coded.assign(&Candidate::new("2221", "Nursing professional", 0.1234, 1));
    let uncoded = Job::new(2, "Unknown");

    let out = render_jobs(&[coded, uncoded], FileFormat::FixedWidth);
    let lines: Vec<&str> = out.lines().collect();

    let width = FIXED_WIDTHS.id
        + FIXED_WIDTHS.description
        + FIXED_WIDTHS.code
        + FIXED_WIDTHS.code_description
        + FIXED_WIDTHS.code_score
        + FIXED_WIDTHS.code_rank;
    assert!(lines.iter().all(|line| line.chars().count() == width));

    let coded_line = lines[0];
    assert!(coded_line.starts_with("1      Nurse"));
    assert!(coded_line.contains("2221Nursing professional"));
    assert!(coded_line.contains("0.12341   "));

    let uncoded_line = lines[1];
    let code_start = FIXED_WIDTHS.id + FIXED_WIDTHS.description;
    assert_eq!(&uncoded_line[code_start..code_start + 4], NULL_SENTINEL);
    assert!(uncoded_line.trim_end().ends_with(NULL_SENTINEL));
}

#[test]
fn delimited_egress_quotes_fields_that_need_it() {
    let mut job = Job::new(3, "Chef, pastry");
    job.assign(&Candidate::new("3434", "Chef", 0.5, 2));

    let out = render_jobs(
        &[job],
        FileFormat::Delimited {
            delimiter: ',',
            has_header: true,
        },
    );

    assert_eq!(
        out,
        "id,description,description_orig,code,code_description,code_score,code_rank\n\
         3,\"Chef, pastry\",\"Chef, pastry\",3434,Chef,0.5,2\n"
    );
}
