//! CSV input and output of the command line
use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use segmenta::{CustomerRecord, CustomerTable, Feature};
use segmenta_segments::SegmentationReport;

/// Separator of the actions of a segment in a single cell
const ACTION_SEPARATOR: &str = " | ";

/// A CSV table rendered in memory, waiting to be written
#[derive(Debug, Clone)]
pub(crate) struct RenderedTable {
    pub(crate) name: &'static str,
    pub(crate) contents: Vec<u8>,
}

/// Reads a customer CSV file. Columns are matched by name, extra columns are ignored.
pub(crate) fn read_customers(path: &Path) -> anyhow::Result<CustomerTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize::<CustomerRecord>()
        .enumerate()
        .map(|(row, record)| record.with_context(|| format!("malformed row {}", row + 1)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(CustomerTable::from_records(&records)?)
}

pub(crate) fn write_customers(path: &Path, customers: &[CustomerRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for customer in customers {
        writer.serialize(customer)?;
    }
    writer.flush()?;
    Ok(())
}

fn to_csv(header: Vec<String>, rows: impl IntoIterator<Item = Vec<String>>) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

/// Renders the five output tables of a segmentation of `table`
pub(crate) fn render(
    table: &CustomerTable,
    report: &SegmentationReport,
) -> anyhow::Result<Vec<RenderedTable>> {
    let profiles = report.profiles();
    let mapping = report.mapping();

    let mut header: Vec<String> = vec!["customer_id".into()];
    header.extend(Feature::ALL.iter().map(|f| f.column_name().to_string()));
    header.extend(["defaulted", "churned", "cluster", "segment"].map(String::from));
    if report.risk().is_some() {
        header.extend(["default_probability", "risk_band"].map(String::from));
    }
    let rows = table.records().enumerate().map(|(row, record)| {
        let mut line = vec![record.customer_id.to_string()];
        line.extend(record.features().iter().map(|v| v.to_string()));
        line.extend(record.outcomes().iter().map(|v| v.to_string()));
        line.push(report.memberships()[row].to_string());
        line.push(report.segment_of_row(row).unwrap_or_default().to_string());
        if let Some(risk) = report.risk() {
            line.push(risk.probabilities()[row].to_string());
            line.push(risk.bands()[row].to_string());
        }
        line
    });
    let customers = to_csv(header, rows)?;

    let mut header: Vec<String> = vec!["cluster".into(), "customers".into()];
    header.extend(profiles.features().iter().map(|f| f.column_name().to_string()));
    header.extend(profiles.outcomes().iter().map(|o| format!("{}_rate", o)));
    let rows = profiles.iter().map(|profile| {
        let mut line = vec![profile.cluster().to_string(), profile.count().to_string()];
        line.extend(profile.feature_means().values().map(|v| format!("{:.4}", v)));
        line.extend(profile.outcome_rates().values().map(|v| format!("{:.4}", v)));
        line
    });
    let profile = to_csv(header, rows)?;

    let counts = to_csv(
        vec!["cluster".into(), "customers".into()],
        profiles
            .counts()
            .into_iter()
            .map(|(cluster, count)| vec![cluster.to_string(), count.to_string()]),
    )?;

    let mut header: Vec<String> = vec!["cluster".into()];
    header.extend(profiles.features().iter().map(|f| format!("avg_{}", f)));
    header.extend(profiles.outcomes().iter().map(|o| format!("{}_rate", o)));
    header.push("suggested_segment".into());
    let rows = mapping.clusters().iter().map(|mapped| {
        let mut line = vec![mapped.cluster().to_string()];
        line.extend(mapped.profile().feature_means().values().map(|v| format!("{:.2}", v)));
        line.extend(mapped.profile().outcome_rates().values().map(|v| format!("{:.2}", v)));
        line.push(mapped.segment().to_string());
        line
    });
    let cluster_mapping = to_csv(header, rows)?;

    let recommendations = to_csv(
        vec!["segment".into(), "recommended_actions".into()],
        mapping
            .recommendations()
            .iter()
            .map(|segment| vec![segment.name.clone(), segment.actions.join(ACTION_SEPARATOR)]),
    )?;

    Ok(vec![
        RenderedTable {
            name: "customers_with_clusters.csv",
            contents: customers,
        },
        RenderedTable {
            name: "cluster_profile.csv",
            contents: profile,
        },
        RenderedTable {
            name: "cluster_counts.csv",
            contents: counts,
        },
        RenderedTable {
            name: "cluster_mapping.csv",
            contents: cluster_mapping,
        },
        RenderedTable {
            name: "segment_recommendations.csv",
            contents: recommendations,
        },
    ])
}

/// Writes every table into `dir`. Tables are first written next to their destination, then
/// renamed. When any step fails, the files already produced by this call are removed again, so
/// either every table lands in `dir` or none of them does.
pub(crate) fn write_all(dir: &Path, tables: &[RenderedTable]) -> anyhow::Result<()> {
    fs::create_dir_all(dir)?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(tables.len());
    for table in tables {
        let target = dir.join(table.name);
        let staging = dir.join(format!(".{}.partial", table.name));
        if let Err(err) = fs::write(&staging, &table.contents) {
            discard(staged.iter().map(|(staging, _)| staging));
            return Err(err).with_context(|| format!("failed to write {}", staging.display()));
        }
        staged.push((staging, target));
    }

    for (done, (staging, target)) in staged.iter().enumerate() {
        if let Err(err) = fs::rename(staging, target) {
            discard(staged[..done].iter().map(|(_, target)| target));
            discard(staged[done..].iter().map(|(staging, _)| staging));
            return Err(err).with_context(|| format!("failed to move {}", target.display()));
        }
    }
    Ok(())
}

fn discard<'a>(paths: impl Iterator<Item = &'a PathBuf>) {
    for path in paths {
        if let Err(err) = fs::remove_file(path) {
            log::warn!("could not remove {}: {}", path.display(), err);
        }
    }
}
