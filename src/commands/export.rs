use crate::api::{self, Mode};
use crate::args::ExportArgs;
use crate::commands::{page_store, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::Hierarchy;
use crate::report::{build_export, ExportContext, ExportScope};
use crate::{Config, Result};
use std::path::PathBuf;
use tracing::debug;

pub(crate) const NOTHING_TO_EXPORT: &str = "No records to export";

/// Exports the current page, or every record matching the filters, to an `.xlsx` workbook in the
/// exports directory. Records are written in the requested sort order. When nothing matches, no
/// file is written.
///
/// # Errors
/// - Returns an error if the records or the hierarchy cannot be fetched, or if the workbook cannot
///   be written.
pub async fn export(config: &Config, mode: Mode, args: &ExportArgs) -> Result<Out<PathBuf>> {
    let analyzer = api::analyzer(config, mode).pub_result(ErrorType::Fetch)?;
    let filters = args.filters().filters();
    let mut store = page_store(config, args.page());

    let status = match args.scope() {
        ExportScope::CurrentPage => store.refresh_page(analyzer.as_ref(), &filters).await,
        ExportScope::AllPages => store.refresh_full(analyzer.as_ref(), &filters).await,
    };
    status.into_result().pub_result(ErrorType::Fetch)?;

    let records = match args.scope() {
        ExportScope::CurrentPage => store.sorted_page(),
        ExportScope::AllPages => store.sorted_full(),
    };
    if records.is_empty() {
        return Ok(NOTHING_TO_EXPORT.into());
    }

    // Names are only needed for the levels that are filtered on.
    let hierarchy = if filters.archdeaconry().is_some()
        || filters.parish().is_some()
        || filters.congregation().is_some()
    {
        analyzer
            .fetch_hierarchy()
            .await
            .pub_result(ErrorType::Fetch)?
    } else {
        Hierarchy::default()
    };

    let context = ExportContext {
        archdeaconry_label: hierarchy.archdeaconry_label(filters.archdeaconry()),
        parish_label: hierarchy.parish_label(filters.parish()),
        congregation_label: hierarchy.congregation_label(filters.congregation()),
        start_date: filters.start_date(),
        end_date: filters.end_date(),
        scope: args.scope(),
        current_page: store.pagination().current_page(),
    };
    let Some(artifact) = build_export(&records, &context) else {
        return Ok(NOTHING_TO_EXPORT.into());
    };
    debug!("Exporting '{}'", artifact.title());

    let dir = args
        .out_dir()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.exports_dir());
    let path = artifact.save(&dir).await.pub_result(ErrorType::Export)?;

    Ok(Out::new(
        format!(
            "Exported {} records to {}",
            artifact.data_rows().len(),
            path.display()
        ),
        path,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{FilterArgs, PageArgs};
    use crate::model::{PageSize, RecordField};
    use crate::test::TestEnv;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_export_current_page() {
        let env = TestEnv::new().await;
        let args = ExportArgs::new(
            FilterArgs::default(),
            PageArgs::new(2, None, vec![]),
            ExportScope::CurrentPage,
            None,
        );
        let out = export(&env.config(), Mode::Test, &args).await.unwrap();
        let path = out.structure().unwrap();
        assert!(path.starts_with(env.config().exports_dir()));
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "ARCHDEACONRY_ALL ARCHDEACONRIES_PARISH_ALL PARISHES_CONGREGATION_ALL CONGREGATIONS_ALL_ALL.xlsx"
        );

        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        let range = workbook.worksheet_range("Attendance").unwrap();
        // title, header, ten records, summary
        assert_eq!(range.height(), 13);
        assert_eq!(
            range.get_value((12, 0)),
            Some(&Data::String("SUMMARY".to_string()))
        );
    }

    #[tokio::test]
    async fn test_export_all_pages_with_labels_and_sort() {
        let env = TestEnv::new().await;
        let filters = FilterArgs::new(
            Some(1),
            Some(1),
            None,
            NaiveDate::from_ymd_opt(2024, 1, 1),
            None,
        );
        let page = PageArgs::new(1, Some(PageSize::Ten), vec![RecordField::TotalCollection]);
        let out_dir = env.scratch();
        let args = ExportArgs::new(filters, page, ExportScope::AllPages, Some(out_dir.clone()));
        let out = export(&env.config(), Mode::Test, &args).await.unwrap();

        let path = out.structure().unwrap();
        assert!(path.starts_with(&out_dir));
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "ARCHDEACONRY_NAMBALE_PARISH_BUJUMBA_CONGREGATION_ALL CONGREGATIONS_2024-01-01_ALL.xlsx"
        );

        let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
        let range = workbook.worksheet_range("Attendance").unwrap();
        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String(
                "ATTENDANCE AND COLLECTION DATA FOR ARCHDEACONRY-NAMBALE PARISH-BUJUMBA \
                CONGREGATION-ALL CONGREGATIONS FROM-2024-01-01 TO-ALL(ALL PAGES)"
                    .to_string()
            ))
        );
        // Bujumba parish has two congregations with six Sundays each
        assert_eq!(range.height(), 15);
        let collections: Vec<f64> = (2..14)
            .map(|row| match range.get_value((row, 9)) {
                Some(Data::Float(v)) => *v,
                other => panic!("unexpected cell {other:?}"),
            })
            .collect();
        assert!(collections.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_export_nothing() {
        let env = TestEnv::new().await;
        let args = ExportArgs::new(
            FilterArgs::new(Some(77), None, None, None, None),
            PageArgs::new(1, None, vec![]),
            ExportScope::AllPages,
            None,
        );
        let out = export(&env.config(), Mode::Test, &args).await.unwrap();
        assert_eq!(out.message(), NOTHING_TO_EXPORT);
        assert!(out.structure().is_none());
        let mut entries = std::fs::read_dir(env.config().exports_dir()).unwrap();
        assert!(entries.next().is_none());
    }
}
