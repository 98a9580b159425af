use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use exe_assembler::view::ImageView;
use exe_diagnostics::Diagnostics;
use exe_driver::{BuildOptions, Driver};
use exe_error::{ext::ExeErrorExt, ErrorLevel, ExeError};
use glob::glob;
use log::{info, warn};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../exe_tests");

fn main() -> anyhow::Result<ExitCode> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("exe_test_runner", log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    info!("EXE Test Runner");

    let out_dir = std::env::temp_dir().join(format!("exe_test_runner-{}", std::process::id()));
    std::fs::create_dir_all(&out_dir)?;

    let mut diag = Diagnostics::new();
    let mut total = 0;

    for (expect_pass, pattern) in [(true, "pass/*"), (false, "fail/*")] {
        for entry in glob(&format!("{}/{}", FIXTURES, pattern))? {
            let fixture = entry?;
            if !fixture.is_dir() {
                continue;
            }
            total += 1;

            let name = fixture
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let output = out_dir.join(&name);

            let result = run_fixture(&fixture, &output, expect_pass);
            let error = match result {
                Ok(()) => ExeError::new(ErrorLevel::Note, "Test Success"),
                Err(e) => ExeError::new(ErrorLevel::Error, "Failed Test")
                    .with_note(|_| format!("{:#}", e)),
            };
            diag.push_error(error.with_path(|_| fixture.clone()));
        }
    }

    std::fs::remove_dir_all(&out_dir)?;

    if total == 0 {
        warn!("No fixtures found in {}", FIXTURES);
    }

    let failed = diag.total_fatal();
    diag.render(&mut std::io::stdout().lock())?;
    info!("{} fixtures, {} failed", total, failed);

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_fixture(fixture: &Path, output: &Path, expect_pass: bool) -> anyhow::Result<()> {
    let options = BuildOptions {
        source: PathBuf::from(fixture),
        output: output.to_path_buf(),
        order: Default::default(),
    };

    match (Driver::build(&options), expect_pass) {
        (Ok(path), true) => {
            let bytes = std::fs::read(&path).context("reading built image")?;
            let view = ImageView::parse(&bytes)?;
            if view.entries_total_size() != view.header.data_sz as u64 {
                bail!(
                    "DATA_SZ {:#x} does not match entry sizes {:#x}",
                    view.header.data_sz,
                    view.entries_total_size()
                );
            }
            Ok(())
        }
        (Ok(_), false) => bail!("fixture was expected to be rejected"),
        (Err(e), true) => bail!("fixture was expected to build: {}", e),
        (Err(e), false) => {
            if output.exists() {
                bail!("rejected with \"{}\" but an output file was written", e);
            }
            info!("{} rejected: {}", fixture.display(), e);
            Ok(())
        }
    }
}
