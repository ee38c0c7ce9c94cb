use crate::models::AvailabilityRecord;
use anyhow::{Context, Result};
use dashmap::DashMap;
use std::path::Path;

/// Availability rows grouped by hostel name. Safe to append from many tasks,
/// including the first insert of a key.
#[derive(Debug, Default)]
pub struct ResultTable {
    by_hostel: DashMap<String, Vec<AvailabilityRecord>>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, hostel_name: &str, records: Vec<AvailabilityRecord>) {
        if records.is_empty() {
            return;
        }
        self.by_hostel
            .entry(hostel_name.to_string())
            .or_default()
            .extend(records);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.by_hostel.iter().map(|entry| entry.value().len()).sum()
    }

    /// All rows, hostels in name order, rows in insertion order
    pub fn rows(&self) -> Vec<AvailabilityRecord> {
        let mut hostels: Vec<(String, Vec<AvailabilityRecord>)> = self
            .by_hostel
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        hostels.sort_by(|a, b| a.0.cmp(&b.0));
        hostels.into_iter().flat_map(|(_, rows)| rows).collect()
    }

    /// Write every row with a `Hostel Name,Room Name,Date,Unit,Price` header
    pub fn write_csv(&self, path: &Path) -> Result<usize> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        wtr.write_record(AvailabilityRecord::CSV_HEADER)?;

        let rows = self.rows();
        for row in &rows {
            wtr.write_record(row.to_csv_record())?;
        }
        wtr.flush()?;
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DayAvailability;
    use serde_json::json;
    use std::sync::Arc;

    fn record(hostel: &str, room: &str, date: &str) -> AvailabilityRecord {
        AvailabilityRecord::new(
            hostel,
            room,
            DayAvailability {
                date: date.into(),
                unit: json!(1),
                price: json!(100),
            },
        )
    }

    #[test]
    fn rows_are_grouped_by_hostel() {
        let table = ResultTable::new();
        table.append("Zeta", vec![record("Zeta", "Dorm", "2024-01-01")]);
        table.append("Alpha", vec![record("Alpha", "Dorm", "2024-01-01")]);
        table.append("Zeta", vec![record("Zeta", "Dorm", "2024-01-02")]);
        table.append("Empty", vec![]);

        let rows = table.rows();
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.hostel_name.as_str(), r.date.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Alpha", "2024-01-01"),
                ("Zeta", "2024-01-01"),
                ("Zeta", "2024-01-02")
            ]
        );
        assert_eq!(table.len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_keep_every_row() {
        let table = Arc::new(ResultTable::new());
        let mut handles = Vec::new();
        for task in 0..16 {
            let table = Arc::clone(&table);
            handles.push(tokio::spawn(async move {
                // half the tasks share one key to race on its first insert
                let hostel = if task % 2 == 0 { "Shared".to_string() } else { format!("H{}", task) };
                for day in 0..25 {
                    table.append(&hostel, vec![record(&hostel, "Dorm", &day.to_string())]);
                    tokio::task::yield_now().await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(table.len(), 16 * 25);
        assert!(table.rows().iter().all(|r| r.hostel_name == "Shared" || r.hostel_name.starts_with('H')));
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("room_data.csv");
        let table = ResultTable::new();
        table.append(
            "Hostel, Goa",
            vec![record("Hostel, Goa", "Dorm", "2024-01-01")],
        );

        assert_eq!(table.write_csv(&path).unwrap(), 1);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "Hostel Name,Room Name,Date,Unit,Price",
                "\"Hostel, Goa\",Dorm,2024-01-01,1,100"
            ]
        );
    }

    #[test]
    fn empty_table_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room_data.csv");

        assert_eq!(ResultTable::new().write_csv(&path).unwrap(), 0);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["Hostel Name,Room Name,Date,Unit,Price"]);
    }
}
