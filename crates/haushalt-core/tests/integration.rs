//! End-to-end tests: raw documents in, per-layout records and CSV files out.
//!
//! Most tests use a MockLoader that returns pre-built documents, so no
//! `.docx` container has to be produced. One test writes a real container
//! to check the loader and the pipeline together.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use haushalt_core::convert_files;
use haushalt_core::error::HaushaltError;
use haushalt_core::export::write_outputs;
use haushalt_core::extraction::{Block, DocumentLoader, RawDocument, RawTable};
use haushalt_core::layouts::builtin::load_builtin;
use haushalt_core::model::{LayoutTag, OutputRecord, ValueKind};
use haushalt_core::pipeline::{convert_documents, process_document, Accumulator, RunReport};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

struct MockLoader {
    doc: RawDocument,
}

impl DocumentLoader for MockLoader {
    fn load(&self, _path: &Path) -> Result<RawDocument, HaushaltError> {
        Ok(self.doc.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

fn table(rows: &[&[&str]]) -> Block {
    Block::Table(RawTable::new(
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect(),
    ))
}

fn document(name: &str, blocks: Vec<Block>) -> RawDocument {
    MockLoader {
        doc: RawDocument {
            name: name.into(),
            blocks,
        },
    }
    .load(Path::new(name))
    .unwrap()
}

type Row<'a> = (&'a str, &'a str, i32, ValueKind, Decimal);

fn rows(records: &[OutputRecord]) -> Vec<Row<'_>> {
    records
        .iter()
        .map(|r| {
            (
                r.position_code.as_str(),
                r.position_label.as_str(),
                r.year,
                r.value_kind,
                r.amount,
            )
        })
        .collect()
}

fn total_result_budget() -> Block {
    table(&[
        &["Nr.", "", "Gesamtergebnishaushalt", "Ergebnis 2015 EUR", "Ansatz 2016 EUR", "Ansatz 2017 EUR"],
        &["1", "2", "3", "4", "5", "6"],
        &["1", "+", "Steuern und ähnliche Abgaben", "9.100,00", "9.500,00", "10.000,00"],
        &["2", "+", "Zuwendungen und allgemeine Umlagen", "2.000", "", "2.100"],
        &["10", "=", "Ordentliche Erträge", "11.100,00", "9.500,00", "12.100,00"],
        &["11", "-", "Personalaufwendungen", "4.000", "4.100", "4.200"],
        &["", "", "", "", "", ""],
        &["17", "=", "Ordentliches Ergebnis", "7.100", "5.400", "7.900"],
    ])
}

fn partial_result_budget() -> Block {
    table(&[
        &["Nr.", "Kto.\nGr.", "", "Teilergebnishaushalt", "Ansatz 2016 EUR", "Ansatz 2017 EUR", "Planung 2018 EUR"],
        &["1", "2", "3", "4", "5", "6", "7"],
        &["2", "", "+", "Zuwendungen und allgemeine Umlagen", "70", "75", "80"],
        &["", "414", "", "Zuweisungen vom Land", "50", "50", "50"],
        &["", "416", "", "Zuweisungen von Gemeinden", "20", "25", "30"],
        &["13", "", "-", "Aufwendungen für Sach- und Dienstleistungen", "1.500,50", "", "1.600"],
    ])
}

fn total_cash_flow_budget() -> Block {
    table(&[
        &["Nr.", "", "Gesamtfinanzhaushalt", "Ergebnis 2015 EUR", "Ansatz 2016 EUR"],
        &["1", "2", "3", "4", "5"],
        &["1", "+", "Steuern und ähnliche Abgaben", "8.950,25", "9.500"],
        &["9", "-", "Auszahlungen für Sach- und Dienstleistungen", "(1.200)", "1.300"],
        &["17", "=", "Saldo aus laufender Verwaltungstätigkeit", "7.750,25", "8.200"],
    ])
}

fn partial_cash_flow_budget() -> Block {
    table(&[
        &["Nr.", "", "Teilfinanzhaushalt 1", "Ansatz 2016 EUR", "Ansatz 2017 EUR"],
        &["1", "2", "3", "4", "5"],
        &["18", "+", "Einzahlungen aus Investitionszuwendungen", "./.", "300"],
        &["24", "-", "Auszahlungen für Baumaßnahmen", "1.000", "-"],
        &["24.1", "-", "Hochbau", "600", ""],
        &["24.2", "-", "Tiefbau", "400", ""],
    ])
}

fn investment_overview() -> Block {
    table(&[
        &["Nr.", "", "Investitionsübersicht", "Ansatz 2017 EUR", "VE 2017 EUR", "Planung 2018 EUR"],
        &["1", "2", "3", "4", "5", "6"],
        &["7.365000.001: Neubau Kita Am Park"; 6],
        &["1", "+", "Investitionszuwendungen", "250.000", "", ""],
        &["4", "-", "Baumaßnahmen", "800.000", "200.000", "100.000"],
    ])
}

#[test]
fn parent_and_child_yield_only_the_child() {
    let layouts = load_builtin().unwrap();
    let doc = document(
        "gesamt.docx",
        vec![table(&[
            &["Nr.", "", "Gesamtergebnishaushalt", "Ansatz 2017 EUR"],
            &["1", "2", "3", "4"],
            &["10", "+", "Erträge", ""],
            &["10.1", "+", "Steuern", "1.234,56"],
        ])],
    );
    let (acc, _) = convert_documents(&[doc], &layouts).unwrap();
    assert_eq!(
        rows(acc.records(LayoutTag::TotalResultBudget)),
        vec![("10.1", "Erträge: Steuern", 2017, ValueKind::Planned, dec!(1234.56))]
    );
}

#[test]
fn total_result_budget_records() {
    let layouts = load_builtin().unwrap();
    let doc = document("gesamt.docx", vec![total_result_budget()]);
    let (acc, report) = convert_documents(&[doc], &layouts).unwrap();
    assert!(report.skipped.is_empty());
    assert_eq!(
        rows(acc.records(LayoutTag::TotalResultBudget)),
        vec![
            ("1", "Steuern und ähnliche Abgaben", 2015, ValueKind::Actual, dec!(9100)),
            ("1", "Steuern und ähnliche Abgaben", 2016, ValueKind::Planned, dec!(9500)),
            ("1", "Steuern und ähnliche Abgaben", 2017, ValueKind::Planned, dec!(10000)),
            ("2", "Zuwendungen und allgemeine Umlagen", 2015, ValueKind::Actual, dec!(2000)),
            ("2", "Zuwendungen und allgemeine Umlagen", 2017, ValueKind::Planned, dec!(2100)),
            ("11", "Personalaufwendungen", 2015, ValueKind::Actual, dec!(-4000)),
            ("11", "Personalaufwendungen", 2016, ValueKind::Planned, dec!(-4100)),
            ("11", "Personalaufwendungen", 2017, ValueKind::Planned, dec!(-4200)),
        ]
    );
}

#[test]
fn partial_result_budget_records() {
    let layouts = load_builtin().unwrap();
    let doc = document(
        "teil.docx",
        vec![
            Block::Paragraph("THH1 Innere Verwaltung".into()),
            partial_result_budget(),
        ],
    );
    let (acc, _) = convert_documents(&[doc], &layouts).unwrap();
    let records = acc.records(LayoutTag::PartialResultBudgets);
    let land = "Zuwendungen und allgemeine Umlagen: Zuweisungen vom Land";
    let gemeinden = "Zuwendungen und allgemeine Umlagen: Zuweisungen von Gemeinden";
    let sach = "Aufwendungen für Sach- und Dienstleistungen";
    assert_eq!(
        rows(records),
        vec![
            ("2.414", land, 2016, ValueKind::Planned, dec!(50)),
            ("2.414", land, 2017, ValueKind::Planned, dec!(50)),
            ("2.414", land, 2018, ValueKind::Forecast, dec!(50)),
            ("2.416", gemeinden, 2016, ValueKind::Planned, dec!(20)),
            ("2.416", gemeinden, 2017, ValueKind::Planned, dec!(25)),
            ("2.416", gemeinden, 2018, ValueKind::Forecast, dec!(30)),
            ("13", sach, 2016, ValueKind::Planned, dec!(-1500.50)),
            ("13", sach, 2018, ValueKind::Forecast, dec!(-1600)),
        ]
    );
    assert!(records.iter().all(|r| r.context.budget_unit.as_deref() == Some("1")));
}

#[test]
fn total_cash_flow_budget_records() {
    let layouts = load_builtin().unwrap();
    let doc = document("gesamt.docx", vec![total_cash_flow_budget()]);
    let (acc, _) = convert_documents(&[doc], &layouts).unwrap();
    assert_eq!(
        rows(acc.records(LayoutTag::TotalCashFlowBudget)),
        vec![
            ("1", "Steuern und ähnliche Abgaben", 2015, ValueKind::Actual, dec!(8950.25)),
            ("1", "Steuern und ähnliche Abgaben", 2016, ValueKind::Planned, dec!(9500)),
            ("9", "Auszahlungen für Sach- und Dienstleistungen", 2015, ValueKind::Actual, dec!(-1200)),
            ("9", "Auszahlungen für Sach- und Dienstleistungen", 2016, ValueKind::Planned, dec!(-1300)),
        ]
    );
}

#[test]
fn partial_cash_flow_budget_records() {
    let layouts = load_builtin().unwrap();
    let doc = document("teil.docx", vec![partial_cash_flow_budget()]);
    let (acc, report) = convert_documents(&[doc], &layouts).unwrap();
    assert_eq!(report.rollup_mismatches, 0);
    assert_eq!(
        rows(acc.records(LayoutTag::PartialCashFlowBudgets)),
        vec![
            ("18", "Einzahlungen aus Investitionszuwendungen", 2017, ValueKind::Planned, dec!(300)),
            ("24.1", "Auszahlungen für Baumaßnahmen: Hochbau", 2016, ValueKind::Planned, dec!(-600)),
            ("24.2", "Auszahlungen für Baumaßnahmen: Tiefbau", 2016, ValueKind::Planned, dec!(-400)),
        ]
    );
}

#[test]
fn investment_overview_records() {
    let layouts = load_builtin().unwrap();
    let doc = document("invest.docx", vec![investment_overview()]);
    let (acc, _) = convert_documents(&[doc], &layouts).unwrap();
    let zuw = "Neubau Kita Am Park: Investitionszuwendungen";
    let bau = "Neubau Kita Am Park: Baumaßnahmen";
    assert_eq!(
        rows(acc.records(LayoutTag::InvestmentOverview)),
        vec![
            ("7.365000.001/1", zuw, 2017, ValueKind::Planned, dec!(250000)),
            ("7.365000.001/4", bau, 2017, ValueKind::Planned, dec!(-800000)),
            ("7.365000.001/4", bau, 2017, ValueKind::Commitment, dec!(-200000)),
            ("7.365000.001/4", bau, 2018, ValueKind::Forecast, dec!(-100000)),
        ]
    );
}

fn all_layouts_documents() -> Vec<RawDocument> {
    vec![
        document(
            "haushalt-1.docx",
            vec![
                Block::Paragraph("Gesamthaushalt".into()),
                total_result_budget(),
                total_cash_flow_budget(),
                table(&[&["Inhaltsverzeichnis", "Seite"], &["Vorbericht", "3"]]),
            ],
        ),
        document(
            "haushalt-2.docx",
            vec![
                Block::Paragraph("THH1 Innere Verwaltung".into()),
                partial_result_budget(),
                partial_cash_flow_budget(),
                investment_overview(),
            ],
        ),
    ]
}

#[test]
fn no_aggregate_or_duplicate_in_output() {
    let layouts = load_builtin().unwrap();
    let docs = all_layouts_documents();

    let mut aggregate_codes: HashSet<(LayoutTag, String)> = HashSet::new();
    for doc in &docs {
        for outcome in haushalt_core::pipeline::analyze_document(doc, &layouts) {
            let Ok(converted) = outcome.result else {
                continue;
            };
            let t = &converted.table;
            for p in t.positions.iter().filter(|p| p.is_aggregate) {
                aggregate_codes.insert((t.layout, p.code.clone()));
            }
        }
    }
    assert!(!aggregate_codes.is_empty());

    let (acc, report) = convert_documents(&docs, &layouts).unwrap();
    assert_eq!(report.tables_converted, 5);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(acc.layouts().count(), 5);

    for (tag, records) in acc.iter() {
        let mut seen = HashSet::new();
        for r in records {
            assert!(
                !aggregate_codes.contains(&(tag, r.position_code.clone())),
                "aggregate {} exported in {}",
                r.position_code,
                tag
            );
            assert!(
                seen.insert((r.position_code.clone(), r.year, r.value_kind)),
                "duplicate {} {} {} in {}",
                r.position_code,
                r.year,
                r.value_kind,
                tag
            );
        }
    }
}

#[test]
fn missing_slots_are_omitted_not_zero() {
    let layouts = load_builtin().unwrap();
    let doc = document("gesamt.docx", vec![total_result_budget()]);
    let (acc, _) = convert_documents(&[doc], &layouts).unwrap();
    let records = acc.records(LayoutTag::TotalResultBudget);
    assert!(!records
        .iter()
        .any(|r| r.position_code == "2" && r.year == 2016));
    assert!(records.iter().all(|r| r.amount != Decimal::ZERO));
}

const RESULT_HEADER: &[&str] = &["Nr.", "", "Gesamtergebnishaushalt", "Ansatz 2017 EUR"];
const NUMBERING: &[&str] = &["1", "2", "3", "4"];

#[test]
fn repeated_code_after_another_position_is_exported_once() {
    let layouts = load_builtin().unwrap();
    let doc = document(
        "gesamt.docx",
        vec![table(&[
            RESULT_HEADER,
            NUMBERING,
            &["1", "+", "A", ""],
            &["1.1", "+", "A1", "10"],
            &["2", "+", "B", ""],
            &["1.1", "+", "A1 (Forts.)", "10"],
            &["2.1", "+", "B1", "5"],
        ])],
    );
    let (acc, report) = convert_documents(&[doc], &layouts).unwrap();
    assert_eq!(report.tables_converted, 1);
    assert_eq!(
        rows(acc.records(LayoutTag::TotalResultBudget)),
        vec![
            ("1.1", "A: A1 A1 (Forts.)", 2017, ValueKind::Planned, dec!(10)),
            ("2.1", "B: B1", 2017, ValueKind::Planned, dec!(5)),
        ]
    );
}

#[test]
fn rollup_sum_beyond_decimal_range_does_not_abort() {
    let layouts = load_builtin().unwrap();
    let huge = "50.000.000.000.000.000.000.000.000.000";
    let doc = document(
        "gesamt.docx",
        vec![table(&[
            RESULT_HEADER,
            NUMBERING,
            &["1", "+", "Steuern", "1"],
            &["", "", "Grundsteuer", huge],
            &["", "", "Gewerbesteuer", huge],
        ])],
    );
    let (acc, report) = convert_documents(&[doc], &layouts).unwrap();
    assert_eq!(report.rollup_mismatches, 0);
    let records = acc.records(LayoutTag::TotalResultBudget);
    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|r| r.amount == dec!(50000000000000000000000000000)));
}

#[test]
fn failing_continuation_table_skips_its_overview() {
    let layouts = load_builtin().unwrap();
    let doc = document(
        "invest.docx",
        vec![
            investment_overview(),
            table(&[
                &["7.365000.002: Sanierung Rathaus"; 6],
                &["1", "-", "Baumaßnahmen", "12O", "", ""],
            ]),
            total_result_budget(),
        ],
    );
    let (acc, report) = convert_documents(&[doc], &layouts).unwrap();
    assert_eq!(report.tables_seen, 3);
    assert_eq!(report.tables_converted, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].table_index, 1);
    assert!(report.skipped[0].reason.contains("12O"));
    assert_eq!(
        acc.layouts().collect::<Vec<_>>(),
        vec![LayoutTag::TotalResultBudget]
    );
}

#[test]
fn unknown_sign_marker_keeps_printed_amount() {
    let layouts = load_builtin().unwrap();
    let doc = document(
        "gesamt.docx",
        vec![table(&[
            RESULT_HEADER,
            NUMBERING,
            &["1", "±", "Sonstige ordentliche Erträge", "100"],
            &["2", "-", "Sonstige ordentliche Aufwendungen", "50"],
        ])],
    );
    let (acc, report) = convert_documents(&[doc], &layouts).unwrap();
    assert!(report.skipped.is_empty());
    assert_eq!(
        rows(acc.records(LayoutTag::TotalResultBudget)),
        vec![
            ("1", "Sonstige ordentliche Erträge", 2017, ValueKind::Planned, dec!(100)),
            ("2", "Sonstige ordentliche Aufwendungen", 2017, ValueKind::Planned, dec!(-50)),
        ]
    );
}

#[test]
fn documents_merge_in_input_order() {
    let layouts = load_builtin().unwrap();
    let first = document("a.docx", vec![total_cash_flow_budget()]);
    let second = document(
        "b.docx",
        vec![table(&[
            &["Nr.", "", "Gesamtfinanzhaushalt", "Ansatz 2016 EUR"],
            &["1", "2", "3", "4"],
            &["30", "+", "Einzahlungen aus Krediten", "500"],
        ])],
    );

    let mut acc = Accumulator::new();
    let mut report = RunReport::default();
    process_document(&first, &layouts, &mut acc, &mut report).unwrap();
    process_document(&second, &layouts, &mut acc, &mut report).unwrap();
    assert_eq!(report.documents, 2);

    let codes: Vec<&str> = acc
        .records(LayoutTag::TotalCashFlowBudget)
        .iter()
        .map(|r| r.position_code.as_str())
        .collect();
    assert_eq!(codes, vec!["1", "1", "9", "9", "30"]);
}

#[test]
fn repeated_runs_write_identical_files() {
    let layouts = load_builtin().unwrap();
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    for dir in [&first, &second] {
        let (acc, _) = convert_documents(&all_layouts_documents(), &layouts).unwrap();
        write_outputs(&acc, &layouts, dir.path(), true).unwrap();
    }

    for profile in &layouts.layouts {
        let a = std::fs::read(first.path().join(&profile.output_file)).unwrap();
        let b = std::fs::read(second.path().join(&profile.output_file)).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b, "{} differs between runs", profile.output_file);
    }
}

#[test]
fn csv_file_contents() {
    let layouts = load_builtin().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let doc = document("teil.docx", vec![partial_cash_flow_budget()]);
    let (acc, _) = convert_documents(&[doc], &layouts).unwrap();
    write_outputs(&acc, &layouts, dir.path(), false).unwrap();

    let csv = std::fs::read_to_string(dir.path().join("teilfinanzhaushalte.csv")).unwrap();
    assert_eq!(
        csv,
        "\"position_code\",\"position_label\",\"year\",\"value_kind\",\"amount\"\n\
         \"18\",\"Einzahlungen aus Investitionszuwendungen\",2017,\"planned\",300.00\n\
         \"24.1\",\"Auszahlungen für Baumaßnahmen: Hochbau\",2016,\"planned\",-600.00\n\
         \"24.2\",\"Auszahlungen für Baumaßnahmen: Tiefbau\",2016,\"planned\",-400.00\n"
    );
}

#[test]
fn nothing_classifiable_is_an_error() {
    let layouts = load_builtin().unwrap();
    let doc = document(
        "anlage.docx",
        vec![
            Block::Paragraph("Stellenplan".into()),
            table(&[&["Besoldungsgruppe", "Stellen 2017", "Stellen 2016"], &["A 13", "2", "2"]]),
        ],
    );
    let err = convert_documents(&[doc], &layouts).unwrap_err();
    assert!(matches!(err, HaushaltError::NoClassifiableTables { tables: 1 }));
}

// ---------------------------------------------------------------------------
// Loading from files
// ---------------------------------------------------------------------------

fn cell(text: &str) -> String {
    format!("<w:tc><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:tc>")
}

fn xml_row(cells: &[&str]) -> String {
    format!(
        "<w:tr>{}</w:tr>",
        cells.iter().map(|c| cell(c)).collect::<String>()
    )
}

fn write_docx(path: &Path, body: &str) {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap();
}

#[test]
fn docx_file_end_to_end() {
    let layouts = load_builtin().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("haushalt.docx");

    let body = format!(
        "<w:p><w:r><w:t>THH1 Innere Verwaltung</w:t></w:r></w:p>\
         <w:p><w:r><w:t>11 Innere Verwaltung</w:t></w:r></w:p>\
         <w:tbl>{}{}{}{}</w:tbl>",
        xml_row(&["Nr.", "", "Teilergebnishaushalt", "Ansatz 2017 EUR"]),
        xml_row(&["1", "2", "3", "4"]),
        xml_row(&["4", "+", "Öffentlich-rechtliche Leistungsentgelte", ""]),
        xml_row(&["", "", "Verwaltungsgebühren &amp; Auslagen", "12.345,67"]),
    );
    write_docx(&path, &body);

    let (acc, report) = convert_files(&[&path], &layouts).unwrap();
    assert_eq!(report.documents, 1);
    let records = acc.records(LayoutTag::PartialResultBudgets);
    assert_eq!(
        rows(records),
        vec![(
            "4.1",
            "Öffentlich-rechtliche Leistungsentgelte: Verwaltungsgebühren & Auslagen",
            2017,
            ValueKind::Planned,
            dec!(12345.67)
        )]
    );
    assert_eq!(records[0].context.product_area.as_deref(), Some("11"));
}

#[test]
fn json_document_end_to_end() {
    let layouts = load_builtin().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.json");
    std::fs::write(
        &path,
        r#"{"blocks": [
            {"paragraph": "Investitionen"},
            {"table": {"rows": [
                ["Nr.", "", "Investitionsübersicht", "Ansatz 2017 EUR"],
                ["1", "2", "3", "4"],
                ["5.1: Feuerwehrhaus", "5.1: Feuerwehrhaus", "5.1: Feuerwehrhaus", "5.1: Feuerwehrhaus"],
                ["2", "-", "Erwerb von Grundstücken", "75.000"]
            ]}}
        ]}"#,
    )
    .unwrap();

    let (acc, _) = convert_files(&[&path], &layouts).unwrap();
    assert_eq!(
        rows(acc.records(LayoutTag::InvestmentOverview)),
        vec![(
            "5.1/2",
            "Feuerwehrhaus: Erwerb von Grundstücken",
            2017,
            ValueKind::Planned,
            dec!(-75000)
        )]
    );
}

#[test]
fn unsupported_file_type_is_fatal() {
    let layouts = load_builtin().unwrap();
    let err = convert_files(&[Path::new("haushalt.pdf")], &layouts).unwrap_err();
    assert!(matches!(err, HaushaltError::Document { .. }));
}
