use crate::api::{self, Mode, UploadOutcome};
use crate::args::UploadArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::upload::WorkbookFile;
use crate::{Config, Result};
use tracing::{debug, warn};

/// Reads and checks each workbook, then uploads them together and reports what the server did
/// with each one.
///
/// Every file must be an `.xlsx` or `.xls` workbook that can be opened; otherwise nothing is
/// uploaded. Sheets that are not named as `dd-mm-yy` dates only produce warnings because the server
/// skips them.
pub async fn upload(config: &Config, mode: Mode, args: &UploadArgs) -> Result<Out<Vec<UploadOutcome>>> {
    let mut files = Vec::with_capacity(args.files().len());
    for path in args.files() {
        let file = WorkbookFile::load(path).await.pub_result(ErrorType::Upload)?;
        for warning in file.preflight().pub_result(ErrorType::Upload)? {
            warn!("{warning}");
        }
        debug!("Read '{}' ({} bytes)", file.name(), file.len());
        files.push(file);
    }

    let analyzer = api::analyzer(config, mode).pub_result(ErrorType::Upload)?;
    let outcomes = analyzer
        .upload_workbooks(files)
        .await
        .pub_result(ErrorType::Upload)?;

    let lines: Vec<String> = outcomes.iter().map(describe).collect();
    let failed = outcomes.iter().filter(|o| !o.processed).count();
    let mut message = lines.join("\n");
    if failed > 0 {
        warn!("{failed} of {} workbooks were not processed", outcomes.len());
    } else {
        message.push_str(&format!("\nUploaded {} workbooks", outcomes.len()));
    }
    Ok(Out::new(message, outcomes))
}

fn describe(outcome: &UploadOutcome) -> String {
    match (outcome.processed, outcome.new_upload) {
        (true, true) => format!("{}: uploaded", outcome.file),
        (true, false) => format!("{}: re-uploaded", outcome.file),
        (false, _) if outcome.errors.is_empty() => format!("{}: not processed", outcome.file),
        (false, _) => format!("{}: failed: {}", outcome.file, outcome.errors.join("; ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use crate::test::TestEnv;
    use rust_xlsxwriter::Workbook;

    fn write_workbook(path: &std::path::Path, sheets: &[&str]) {
        let mut workbook = Workbook::new();
        for name in sheets {
            workbook.add_worksheet().set_name(*name).unwrap();
        }
        workbook.save(path).unwrap();
    }

    #[tokio::test]
    async fn test_upload() {
        let env = TestEnv::new().await;
        let dir = env.scratch();
        let a = dir.join("jan.xlsx");
        let b = dir.join("feb.xlsx");
        write_workbook(&a, &["07-01-24", "14-01-24"]);
        write_workbook(&b, &["04-02-24", "Totals"]);

        let args = UploadArgs::new(vec![a, b]);
        let out = upload(&env.config(), Mode::Test, &args).await.unwrap();
        let outcomes = out.structure().unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.processed && o.new_upload));
        assert_eq!(
            out.message(),
            "jan.xlsx: uploaded\nfeb.xlsx: uploaded\nUploaded 2 workbooks"
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_non_workbooks() {
        let env = TestEnv::new().await;
        let path = env.scratch().join("notes.csv");
        std::fs::write(&path, "a,b").unwrap();
        let e = upload(&env.config(), Mode::Test, &UploadArgs::new(vec![path]))
            .await
            .unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Upload));
    }

    #[test]
    fn test_describe() {
        let outcome = UploadOutcome {
            file: "x.xlsx".to_string(),
            new_upload: false,
            processed: false,
            errors: vec!["Row 3: bad date".to_string(), "Row 9: bad total".to_string()],
        };
        assert_eq!(
            describe(&outcome),
            "x.xlsx: failed: Row 3: bad date; Row 9: bad total"
        );
    }
}
