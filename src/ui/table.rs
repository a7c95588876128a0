use tabled::{Table, Tabled, settings::Style};

use crate::model::{Document, Named};
use crate::storage::RepairReport;

#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Type")]
    kind: String,
}

#[derive(Tabled)]
struct NamedRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct RepairRow {
    #[tabled(rename = "Table")]
    table: String,
    #[tabled(rename = "Column")]
    column: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Action")]
    action: String,
}

fn render<T: Tabled>(rows: Vec<T>) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn documents_table(documents: &[Document]) -> String {
    render(
        documents
            .iter()
            .map(|d| DocumentRow {
                id: d.id,
                title: d.title.clone().unwrap_or_default(),
                year: d.year.map(|y| y.to_string()).unwrap_or_default(),
                kind: d.kind.clone().unwrap_or_default(),
            })
            .collect(),
    )
}

pub fn named_table(items: &[Named]) -> String {
    render(
        items
            .iter()
            .map(|n| NamedRow { id: n.id, name: n.name.clone() })
            .collect(),
    )
}

/// One row per issued update and per value left alone
pub fn repair_table(report: &RepairReport) -> String {
    let repaired = report.repairs().map(|(table, r)| RepairRow {
        table: table.to_string(),
        column: r.column.clone(),
        value: format!("{:?}", r.literal),
        action: format!("→ {} ({} row(s))", r.replacement, r.rows_updated),
    });
    let skipped = report.unrepairable().flat_map(|a| {
        a.values.iter().map(move |v| RepairRow {
            table: a.table.clone(),
            column: a.column.clone(),
            value: format!("{:?}", v),
            action: "left unchanged".to_string(),
        })
    });
    render(repaired.chain(skipped).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Anomaly, Repair, TableReport};

    #[test]
    fn test_empty_tables_render_nothing() {
        assert!(documents_table(&[]).is_empty());
        assert!(repair_table(&RepairReport::default()).is_empty());
    }

    #[test]
    fn test_repair_table_lists_both_kinds() {
        let report = RepairReport {
            tables: vec![TableReport {
                table: "Documents".to_string(),
                rows_scanned: 3,
                repairs: vec![Repair {
                    column: "deletionPending".to_string(),
                    literal: "true".to_string(),
                    replacement: 1,
                    rows_updated: 2,
                }],
                anomalies: vec![Anomaly {
                    table: "Documents".to_string(),
                    column: "favourite".to_string(),
                    values: vec!["yes".to_string()],
                }],
            }],
        };
        let rendered = repair_table(&report);
        assert!(rendered.contains("deletionPending"));
        assert!(rendered.contains("2 row(s)"));
        assert!(rendered.contains("left unchanged"));
    }

    #[test]
    fn test_named_table() {
        let rendered = named_table(&[Named { id: 4, name: "Thesis".to_string() }]);
        assert!(rendered.contains("Thesis"));
    }
}
