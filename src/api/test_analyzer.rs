//! Implements the `Analyzer` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without an analyzer server.

use crate::api::{Analyzer, PagedRecords, UploadOutcome};
use crate::model::{
    Amount, Archdeaconry, Congregation, Dashboard, Filters, Hierarchy, HierarchyId, Overview,
    PageSize, Parish, Record, RecordId,
};
use crate::upload::WorkbookFile;
use crate::Result;
use anyhow::{anyhow, bail, Context};
use chrono::{Datelike, Months, NaiveDate};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// An implementation of the `Analyzer` trait that serves seeded records, filtering and paging
/// them the way the server does.
pub struct TestAnalyzer {
    hierarchy: Hierarchy,
    records: Vec<SeededRecord>,
    uploaded: Mutex<BTreeSet<String>>,
    fail: AtomicBool,
}

/// A record and the congregation it belongs to, which the filters match against.
#[derive(Debug, Clone)]
struct SeededRecord {
    congregation: HierarchyId,
    record: Record,
}

impl TestAnalyzer {
    fn new(hierarchy: Hierarchy, records: Vec<SeededRecord>) -> Self {
        Self {
            hierarchy,
            records,
            uploaded: Mutex::new(BTreeSet::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// The number of seeded records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// While set, every request fails the way an unreachable server would.
    pub fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("Connection refused (test analyzer is failing requests)")
        }
        Ok(())
    }

    fn matches(&self, seeded: &SeededRecord, filters: &Filters) -> bool {
        let congregation = self.hierarchy.congregation(seeded.congregation);
        let parish = congregation.and_then(|c| self.hierarchy.parish(c.parish));

        if filters.congregation().is_some_and(|id| id != seeded.congregation) {
            return false;
        }
        if filters
            .parish()
            .is_some_and(|id| congregation.map(|c| c.parish) != Some(id))
        {
            return false;
        }
        if filters
            .archdeaconry()
            .is_some_and(|id| parish.map(|p| p.archdeaconry) != Some(id))
        {
            return false;
        }
        let date = seeded.record.sunday_date;
        if filters.start_date().is_some_and(|start| date < start) {
            return false;
        }
        if filters.end_date().is_some_and(|end| date > end) {
            return false;
        }
        true
    }

    fn filtered(&self, filters: &Filters) -> Vec<Record> {
        self.records
            .iter()
            .filter(|seeded| self.matches(seeded, filters))
            .map(|seeded| seeded.record.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Analyzer for TestAnalyzer {
    async fn fetch_paged_records(
        &self,
        filters: &Filters,
        page: u32,
        page_size: PageSize,
    ) -> Result<PagedRecords> {
        self.check_reachable()?;
        let matching = self.filtered(filters);
        let size = page_size.get() as usize;
        let skip = (page.max(1) as usize - 1) * size;
        Ok(PagedRecords {
            total: matching.len() as u64,
            records: matching.into_iter().skip(skip).take(size).collect(),
        })
    }

    async fn fetch_all_records(&self, filters: &Filters) -> Result<Vec<Record>> {
        self.check_reachable()?;
        Ok(self.filtered(filters))
    }

    async fn fetch_hierarchy(&self) -> Result<Hierarchy> {
        self.check_reachable()?;
        Ok(self.hierarchy.clone())
    }

    async fn fetch_dashboard(&self, filters: &Filters) -> Result<Option<Dashboard>> {
        self.check_reachable()?;
        let matching = self.filtered(filters);
        if matching.is_empty() {
            return Ok(None);
        }
        Ok(Some(Dashboard {
            overall: overview(&matching),
        }))
    }

    async fn upload_workbooks(&self, files: Vec<WorkbookFile>) -> Result<Vec<UploadOutcome>> {
        self.check_reachable()?;
        let mut uploaded = self
            .uploaded
            .lock()
            .map_err(|_| anyhow!("The test analyzer upload lock is poisoned"))?;
        Ok(files
            .into_iter()
            .map(|file| {
                let new_upload = uploaded.insert(file.name().to_string());
                match file.preflight() {
                    Ok(_) => UploadOutcome {
                        file: file.name().to_string(),
                        new_upload,
                        processed: true,
                        errors: Vec::new(),
                    },
                    Err(e) => UploadOutcome {
                        file: file.name().to_string(),
                        new_upload,
                        processed: false,
                        errors: vec![format!("{e:#}")],
                    },
                }
            })
            .collect())
    }
}

/// Computes the dashboard figures the way the server does:
/// - attendance is summed per Sunday and averaged over the twelve months up to the latest Sunday
/// - growth compares the average Sunday of the latest calendar quarter with the one before it
fn overview(records: &[Record]) -> Overview {
    let mut weekly: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for record in records {
        *weekly.entry(record.sunday_date).or_default() += u64::from(record.total_attendance);
    }

    let avg_weekly_attendance = weekly.keys().next_back().map(|latest| {
        let since = latest
            .checked_sub_months(Months::new(12))
            .unwrap_or(NaiveDate::MIN);
        let recent: Vec<u64> = weekly
            .iter()
            .filter(|(date, _)| **date > since)
            .map(|(_, total)| *total)
            .collect();
        average(&recent)
    });

    let mut quarters: BTreeMap<(i32, u32), Vec<u64>> = BTreeMap::new();
    for (date, total) in &weekly {
        quarters
            .entry((date.year(), date.month0() / 3))
            .or_default()
            .push(*total);
    }
    let mut latest_first = quarters.values().rev().map(|totals| average(totals));
    let growth_rate = match (latest_first.next(), latest_first.next()) {
        (Some(latest), Some(previous)) if previous > 0.0 => (latest - previous) / previous * 100.0,
        _ => 0.0,
    };

    let total_collection: Amount = records.iter().map(|r| r.total_collection).sum();
    let banked: Amount = records.iter().map(|r| r.banked).sum();
    let banked_percentage = if total_collection.is_zero() {
        0.0
    } else {
        banked.to_f64() / total_collection.to_f64() * 100.0
    };

    Overview {
        total_collection,
        avg_weekly_attendance,
        growth_rate: Some(growth_rate),
        banked_percentage: Some(banked_percentage),
    }
}

fn average(values: &[u64]) -> f64 {
    match values.len() {
        0 => 0.0,
        n => values.iter().sum::<u64>() as f64 / n as f64,
    }
}

impl Default for TestAnalyzer {
    /// Loads seed data from this module.
    fn default() -> Self {
        // The seed data is a constant in this module, so failing to parse it is a bug.
        match load_seed() {
            Ok((hierarchy, records)) => Self::new(hierarchy, records),
            Err(e) => panic!("Invalid test analyzer seed data: {e:#}"),
        }
    }
}

fn load_seed() -> Result<(Hierarchy, Vec<SeededRecord>)> {
    let hierarchy = Hierarchy {
        archdeaconries: load_csv(ARCHDEACONRY_DATA)?,
        parishes: load_csv(PARISH_DATA)?,
        congregations: load_csv(CONGREGATION_DATA)?,
    };
    let rows: Vec<SeedRow> = load_csv(RECORD_DATA)?;
    let records = rows
        .into_iter()
        .map(|row| row.into_seeded(&hierarchy))
        .collect::<Result<Vec<_>>>()?;
    Ok((hierarchy, records))
}

/// Loads rows of type `T` from a CSV-formatted string with a header line.
fn load_csv<T>(csv_data: &str) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));
    rdr.deserialize()
        .map(|row| row.context("Bad seed row"))
        .collect()
}

#[derive(Debug, Deserialize)]
struct SeedRow {
    id: u64,
    sunday_date: NaiveDate,
    congregation: HierarchyId,
    sunday_school: u32,
    adults: u32,
    youth: u32,
    diff_abled: u32,
    total_attendance: u32,
    total_collection: String,
    banked: String,
    unbanked: String,
    remarks: Option<String>,
}

impl SeedRow {
    fn into_seeded(self, hierarchy: &Hierarchy) -> Result<SeededRecord> {
        let congregation = hierarchy
            .congregation(self.congregation)
            .with_context(|| format!("Unknown congregation {}", self.congregation))?;
        let parish = hierarchy
            .parish(congregation.parish)
            .with_context(|| format!("Unknown parish {}", congregation.parish))?;
        let archdeaconry = hierarchy
            .archdeaconry(parish.archdeaconry)
            .with_context(|| format!("Unknown archdeaconry {}", parish.archdeaconry))?;
        let record = Record {
            id: RecordId::from(self.id),
            sunday_date: self.sunday_date,
            archdeaconry_name: archdeaconry.name.clone(),
            parish_name: parish.name.clone(),
            congregation_name: congregation.name.clone(),
            sunday_school: self.sunday_school,
            adults: self.adults,
            youth: self.youth,
            diff_abled: self.diff_abled,
            total_attendance: self.total_attendance,
            total_collection: Amount::from_str(&self.total_collection)?,
            banked: Amount::from_str(&self.banked)?,
            unbanked: Amount::from_str(&self.unbanked)?,
            remarks: self.remarks.filter(|r| !r.is_empty()),
        };
        Ok(SeededRecord {
            congregation: congregation.id,
            record,
        })
    }
}

/// Seed record `i` with placeholder values, for tests that only need some records.
#[cfg(test)]
pub(crate) fn sample_record(i: u64) -> Record {
    Record {
        id: RecordId::from(i),
        sunday_date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        archdeaconry_name: "Nambale".to_string(),
        parish_name: "Bujumba".to_string(),
        congregation_name: format!("Congregation {i}"),
        sunday_school: 1,
        adults: 1,
        youth: 1,
        diff_abled: 0,
        total_attendance: 3,
        total_collection: Amount::from_str("100").unwrap(),
        banked: Amount::from_str("100").unwrap(),
        unbanked: Amount::ZERO,
        remarks: None,
    }
}

const ARCHDEACONRY_DATA: &str = r##"id,name
1,Nambale
2,Busia
"##;

const PARISH_DATA: &str = r##"id,name,archdeaconry
1,Bujumba,1
2,Amukura,1
3,Chakol,2
4,Butula,2
"##;

const CONGREGATION_DATA: &str = r##"id,name,parish
1,St. Peter's,1
2,St. Mark's,1
3,Emmanuel,2
4,St. Paul's,3
5,Good Shepherd,4
6,St. John's,4
"##;

/// Six Sundays of records for each of the six congregations.
const RECORD_DATA: &str = r##"id,sunday_date,congregation,sunday_school,adults,youth,diff_abled,total_attendance,total_collection,banked,unbanked,remarks
1,2024-01-07,1,15,41,10,3,69,1137.00,1047.00,90.00,
2,2024-01-07,2,22,52,15,2,91,1274.00,1094.00,180.00,
3,2024-01-07,3,14,63,8,1,86,1411.00,1141.00,270.00,
4,2024-01-07,4,21,34,13,0,68,1598.00,1238.00,360.00,
5,2024-01-07,5,13,45,6,3,67,1685.00,1235.00,450.00,Visiting preacher
6,2024-01-07,6,20,56,11,2,89,1822.00,1282.00,540.00,
7,2024-01-14,1,12,67,16,1,96,1959.00,1929.00,30.00,
8,2024-01-14,2,19,38,9,0,66,2146.00,2026.00,120.00,
9,2024-01-14,3,11,49,14,3,77,2233.00,2023.00,210.00,
10,2024-01-14,4,18,60,7,2,87,2370.00,2070.00,300.00,Harvest Sunday
11,2024-01-14,5,10,31,12,1,54,2507.00,2117.00,390.00,
12,2024-01-14,6,17,42,5,0,64,2694.00,2214.00,480.00,
13,2024-01-21,1,9,53,10,3,75,2781.00,2211.00,570.00,
14,2024-01-21,2,16,64,15,2,97,2918.00,2858.00,60.00,
15,2024-01-21,3,8,35,8,1,52,3055.00,2905.00,150.00,Visiting preacher
16,2024-01-21,4,15,46,13,0,74,3242.00,3002.00,240.00,
17,2024-01-21,5,22,57,6,3,88,3329.00,2999.00,330.00,
18,2024-01-21,6,14,68,11,2,95,3466.00,3046.00,420.00,
19,2024-01-28,1,21,39,16,1,77,1103.00,593.00,510.00,
20,2024-01-28,2,13,50,9,0,72,1290.00,1290.00,0.00,Harvest Sunday
21,2024-01-28,3,20,61,14,3,98,1377.00,1287.00,90.00,
22,2024-01-28,4,12,32,7,2,53,1514.00,1334.00,180.00,
23,2024-01-28,5,19,43,12,1,75,1651.00,1381.00,270.00,
24,2024-01-28,6,11,54,5,0,70,1838.00,1478.00,360.00,
25,2024-02-04,1,18,65,10,3,96,1925.00,1475.00,450.00,Visiting preacher
26,2024-02-04,2,10,36,15,2,63,2062.00,1522.00,540.00,
27,2024-02-04,3,17,47,8,1,73,2199.00,2169.00,30.00,
28,2024-02-04,4,9,58,13,0,80,2386.00,2266.00,120.00,
29,2024-02-04,5,16,69,6,3,94,2473.00,2263.00,210.00,
30,2024-02-04,6,8,40,11,2,61,2610.00,2310.00,300.00,Harvest Sunday
31,2024-02-11,1,15,51,16,1,83,2747.00,2357.00,390.00,
32,2024-02-11,2,22,62,9,0,93,2934.00,2454.00,480.00,
33,2024-02-11,3,14,33,14,3,64,3021.00,2451.00,570.00,
34,2024-02-11,4,21,44,7,2,74,3158.00,3098.00,60.00,
35,2024-02-11,5,13,55,12,1,81,3295.00,3145.00,150.00,Visiting preacher
36,2024-02-11,6,20,66,5,0,91,3482.00,3242.00,240.00,
"##;
